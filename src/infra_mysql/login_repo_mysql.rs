use super::util::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlLoginRepo {
    pool: MySqlPool,
}

impl MySqlLoginRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlLoginRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<LoginRecord, StoreError> {
        let get_err = |e: sqlx::Error| StoreError::Backend(e.to_string());

        let raw_id: String = row.try_get("ID").map_err(get_err)?;
        let id = raw_id
            .trim()
            .parse()
            .map_err(|_| StoreError::Backend(format!("non-numeric LoginUsers.ID {:?}", raw_id)))?;
        let tax_id: Option<String> = row.try_get("UserID").map_err(get_err)?;
        let user_name: Option<String> = row.try_get("UserName").map_err(get_err)?;
        let password: Option<String> = row.try_get("Password").map_err(get_err)?;
        let status: Option<String> = row.try_get("IsActive").map_err(get_err)?;
        let last_login = row.try_get("LastLogin").map_err(get_err)?;
        let created_on = row.try_get("CreatedOn").map_err(get_err)?;
        let person: Option<String> = row.try_get("Pessoa").map_err(get_err)?;

        Ok(LoginRecord {
            id,
            tax_id: tax_id.unwrap_or_default(),
            user_name: user_name.unwrap_or_default(),
            password: password.unwrap_or_default(),
            status: AccountStatus::from_code(status.as_deref().unwrap_or_default()),
            last_login: utc(last_login),
            created_on: utc(created_on),
            person: legacy_id(person),
        })
    }
}

#[async_trait::async_trait]
impl LoginRepo for MySqlLoginRepo {
    async fn find_by_tax_id(&self, cpf: &Cpf) -> Result<Option<LoginRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT ID, UserID, UserName, Password, IsActive, LastLogin, CreatedOn, Pessoa
FROM LoginUsers
WHERE UserID = ?
   OR REPLACE(REPLACE(REPLACE(UserID, '.', ''), '-', ''), '/', '') = ?
LIMIT 1
"#,
        )
        .bind(cpf.formatted())
        .bind(cpf.digits())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn find_by_id(&self, id: LegacyId) -> Result<Option<LoginRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT ID, UserID, UserName, Password, IsActive, LastLogin, CreatedOn, Pessoa
FROM LoginUsers
WHERE ID = ?
"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn user_name_exists(&self, user_name: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM LoginUsers WHERE UserName = ? LIMIT 1")
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.is_some())
    }

    async fn insert(&self, user: &NewLoginUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO LoginUsers (
    ID, UserID, UserName, Password, IsActive, PassNeverExpires,
    CreatedBy, CreatedOn, PasswordUpdatedOn
)
VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)
"#,
        )
        .bind(user.id.to_string())
        .bind(&user.tax_id)
        .bind(&user.user_name)
        .bind(&user.password)
        .bind(AccountStatus::ACTIVE_CODE)
        .bind(user.created_by.to_string())
        .bind(user.created_on.naive_utc())
        .bind(user.created_on.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn touch_last_login(&self, id: LegacyId, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE LoginUsers SET LastLogin = ? WHERE ID = ?")
            .bind(at.naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn link_person(&self, id: LegacyId, person: LegacyId) -> Result<(), StoreError> {
        sqlx::query("UPDATE LoginUsers SET Pessoa = ? WHERE ID = ?")
            .bind(person.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
