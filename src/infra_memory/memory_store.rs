use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A `LoginUsers` row as the legacy table holds it: text id, raw status code.
#[derive(Debug, Clone)]
pub struct LoginUserRow {
    pub id: String,
    pub tax_id: String,
    pub user_name: String,
    pub password: String,
    pub status_code: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_on: Option<DateTime<Utc>>,
    pub created_by: String,
    pub person: Option<LegacyId>,
}

impl LoginUserRow {
    pub fn new(id: &str, tax_id: &str, user_name: &str, password: &str) -> Self {
        LoginUserRow {
            id: id.to_string(),
            tax_id: tax_id.to_string(),
            user_name: user_name.to_string(),
            password: password.to_string(),
            status_code: AccountStatus::ACTIVE_CODE.to_string(),
            last_login: None,
            created_on: None,
            created_by: LegacyId::SEED.to_string(),
            person: None,
        }
    }

    pub fn status(mut self, code: &str) -> Self {
        self.status_code = code.to_string();
        self
    }

    pub fn created_on(mut self, at: DateTime<Utc>) -> Self {
        self.created_on = Some(at);
        self
    }

    fn to_record(&self) -> Result<LoginRecord, StoreError> {
        let id = self
            .id
            .parse()
            .map_err(|_| StoreError::Backend(format!("non-numeric LoginUsers.ID {:?}", self.id)))?;
        Ok(LoginRecord {
            id,
            tax_id: self.tax_id.clone(),
            user_name: self.user_name.clone(),
            password: self.password.clone(),
            status: AccountStatus::from_code(&self.status_code),
            last_login: self.last_login,
            created_on: self.created_on,
            person: self.person,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PersonRow {
    pub id: String,
    pub tax_id_digits: String,
    pub created_on: Option<DateTime<Utc>>,
    /// Full row when it came through [`PersonRepo::insert`].
    pub person: Option<NewPerson>,
}

#[derive(Default)]
struct Tables {
    login_users: Vec<LoginUserRow>,
    persons: Vec<PersonRow>,
    zip_codes: Vec<ZipCodeRecord>,
    states: Vec<State>,
    municipalities: Vec<Municipality>,
}

impl Tables {
    fn ids(&self, table: SequenceTable) -> Vec<(&str, Option<DateTime<Utc>>)> {
        if table == SequenceTable::PERSON {
            self.persons
                .iter()
                .map(|p| (p.id.as_str(), p.created_on))
                .collect()
        } else {
            self.login_users
                .iter()
                .map(|u| (u.id.as_str(), u.created_on))
                .collect()
        }
    }

    fn numeric_ids(&self, table: SequenceTable) -> Vec<(i64, Option<DateTime<Utc>>)> {
        self.ids(table)
            .into_iter()
            .filter_map(|(id, ts)| numeric_id(id).map(|n| (n, ts)))
            .collect()
    }
}

/// Same test the SQL side applies: non-empty and made of ASCII digits only.
fn numeric_id(id: &str) -> Option<i64> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        id.parse().ok()
    } else {
        None
    }
}

/// In-process stand-in for the legacy database, used by the `fake` store
/// backend and by tests. It enforces unique text ids like the real tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_last_login: AtomicBool,
    race_next_login_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".to_string()))
    }

    pub fn add_login_user(&self, row: LoginUserRow) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.login_users.iter().any(|u| u.id == row.id) {
            return Err(StoreError::DuplicateKey(format!("LoginUsers.ID {}", row.id)));
        }
        tables.login_users.push(row);
        Ok(())
    }

    pub fn add_person_row(
        &self,
        id: &str,
        tax_id_digits: &str,
        created_on: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.persons.iter().any(|p| p.id == id) {
            return Err(StoreError::DuplicateKey(format!("Pessoa.ID {}", id)));
        }
        tables.persons.push(PersonRow {
            id: id.to_string(),
            tax_id_digits: tax_id_digits.to_string(),
            created_on,
            person: None,
        });
        Ok(())
    }

    pub fn add_zip_code(&self, record: ZipCodeRecord) -> Result<(), StoreError> {
        self.lock()?.zip_codes.push(record);
        Ok(())
    }

    pub fn add_state(&self, state: State) -> Result<(), StoreError> {
        self.lock()?.states.push(state);
        Ok(())
    }

    pub fn add_municipality(&self, municipality: Municipality) -> Result<(), StoreError> {
        self.lock()?.municipalities.push(municipality);
        Ok(())
    }

    pub fn login_user(&self, id: LegacyId) -> Option<LoginUserRow> {
        let tables = self.lock().ok()?;
        let id = id.to_string();
        tables.login_users.iter().find(|u| u.id == id).cloned()
    }

    pub fn person(&self, id: LegacyId) -> Option<PersonRow> {
        let tables = self.lock().ok()?;
        let id = id.to_string();
        tables.persons.iter().find(|p| p.id == id).cloned()
    }

    /// Makes every last-login update fail.
    pub fn fail_last_login(&self, fail: bool) {
        self.fail_last_login.store(fail, Ordering::SeqCst);
    }

    /// The next credential insert finds its id already taken, as if a
    /// concurrent registration committed first.
    pub fn race_next_login_insert(&self) {
        self.race_next_login_insert.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl LoginRepo for MemoryStore {
    async fn find_by_tax_id(&self, cpf: &Cpf) -> Result<Option<LoginRecord>, StoreError> {
        let tables = self.lock()?;
        let formatted = cpf.formatted();
        tables
            .login_users
            .iter()
            .find(|u| u.tax_id == formatted || digits_only(&u.tax_id) == cpf.digits())
            .map(LoginUserRow::to_record)
            .transpose()
    }

    async fn find_by_id(&self, id: LegacyId) -> Result<Option<LoginRecord>, StoreError> {
        let tables = self.lock()?;
        let id = id.to_string();
        tables
            .login_users
            .iter()
            .find(|u| u.id == id)
            .map(LoginUserRow::to_record)
            .transpose()
    }

    async fn user_name_exists(&self, user_name: &str) -> Result<bool, StoreError> {
        let tables = self.lock()?;
        Ok(tables.login_users.iter().any(|u| u.user_name == user_name))
    }

    async fn insert(&self, user: &NewLoginUser) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let id = user.id.to_string();
        if self.race_next_login_insert.swap(false, Ordering::SeqCst) {
            let mut winner = LoginUserRow::new(&id, "", "concurrent", "");
            winner.created_on = Some(user.created_on);
            tables.login_users.push(winner);
        }
        if tables.login_users.iter().any(|u| u.id == id) {
            return Err(StoreError::DuplicateKey(format!("LoginUsers.ID {}", id)));
        }
        tables.login_users.push(LoginUserRow {
            id,
            tax_id: user.tax_id.clone(),
            user_name: user.user_name.clone(),
            password: user.password.clone(),
            status_code: AccountStatus::ACTIVE_CODE.to_string(),
            last_login: None,
            created_on: Some(user.created_on),
            created_by: user.created_by.to_string(),
            person: None,
        });
        Ok(())
    }

    async fn touch_last_login(&self, id: LegacyId, at: DateTime<Utc>) -> Result<(), StoreError> {
        if self.fail_last_login.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("last login update refused".to_string()));
        }
        let mut tables = self.lock()?;
        let id = id.to_string();
        if let Some(row) = tables.login_users.iter_mut().find(|u| u.id == id) {
            row.last_login = Some(at);
        }
        Ok(())
    }

    async fn link_person(&self, id: LegacyId, person: LegacyId) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let id = id.to_string();
        if let Some(row) = tables.login_users.iter_mut().find(|u| u.id == id) {
            row.person = Some(person);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PersonRepo for MemoryStore {
    async fn tax_id_exists(&self, tax_id_digits: &str) -> Result<bool, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .persons
            .iter()
            .any(|p| p.tax_id_digits == tax_id_digits))
    }

    async fn insert(&self, person: &NewPerson) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let id = person.id.to_string();
        if tables.persons.iter().any(|p| p.id == id) {
            return Err(StoreError::DuplicateKey(format!("Pessoa.ID {}", id)));
        }
        tables.persons.push(PersonRow {
            id,
            tax_id_digits: person.tax_id_digits.clone(),
            created_on: Some(person.created_on),
            person: Some(person.clone()),
        });
        Ok(())
    }
}

#[async_trait::async_trait]
impl SequenceSource for MemoryStore {
    async fn last_by_creation(
        &self,
        table: SequenceTable,
    ) -> Result<Option<LegacyId>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .numeric_ids(table)
            .into_iter()
            .filter_map(|(n, ts)| ts.map(|ts| (n, ts)))
            .max_by_key(|(_, ts)| *ts)
            .map(|(n, _)| LegacyId(n)))
    }

    async fn id_exists(&self, table: SequenceTable, id: LegacyId) -> Result<bool, StoreError> {
        let tables = self.lock()?;
        let id = id.to_string();
        Ok(tables.ids(table).iter().any(|(row, _)| *row == id))
    }

    async fn max_numeric_id(
        &self,
        table: SequenceTable,
        excluding: Option<LegacyId>,
    ) -> Result<Option<LegacyId>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .numeric_ids(table)
            .into_iter()
            .map(|(n, _)| LegacyId(n))
            .filter(|id| Some(*id) != excluding)
            .max())
    }

    async fn top_numeric_id(&self, table: SequenceTable) -> Result<Option<LegacyId>, StoreError> {
        self.max_numeric_id(table, None).await
    }
}

#[async_trait::async_trait]
impl AddressRepo for MemoryStore {
    async fn find_zip_code(&self, digits: &str) -> Result<Option<ZipCodeRecord>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .zip_codes
            .iter()
            .find(|z| z.zip_code == digits)
            .cloned())
    }

    async fn find_state_by_code(&self, code: &str) -> Result<Option<State>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .states
            .iter()
            .find(|s| s.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn municipalities(
        &self,
        state_id: Option<i64>,
    ) -> Result<Vec<Municipality>, StoreError> {
        let tables = self.lock()?;
        let mut list: Vec<Municipality> = tables
            .municipalities
            .iter()
            .filter(|m| state_id.is_none() || m.state_id == state_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }
}

#[async_trait::async_trait]
impl StoreProbe for MemoryStore {
    async fn ping(&self) -> Result<String, StoreError> {
        let _tables = self.lock()?;
        Ok("memory".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn last_by_creation_breaks_ties_with_latest_insert() {
        let store = MemoryStore::new();
        store.add_person_row("4", "1", Some(at(100))).unwrap();
        store.add_person_row("2", "2", Some(at(100))).unwrap();
        store.add_person_row("X9", "3", Some(at(500))).unwrap();
        store.add_person_row("9", "4", None).unwrap();

        let last = store.last_by_creation(SequenceTable::PERSON).await.unwrap();
        assert_eq!(last, Some(LegacyId(2)));
        let max = store
            .max_numeric_id(SequenceTable::PERSON, None)
            .await
            .unwrap();
        assert_eq!(max, Some(LegacyId(9)));
    }

    #[tokio::test]
    async fn tax_id_lookup_matches_either_format() {
        let store = MemoryStore::new();
        store
            .add_login_user(LoginUserRow::new("3", "11144477735", "jdoe", "0"))
            .unwrap();
        let cpf = Cpf::parse("111.444.777-35").unwrap();
        let found = store.find_by_tax_id(&cpf).await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(LegacyId(3)));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = MemoryStore::new();
        store
            .add_login_user(LoginUserRow::new("1", "", "admin", ""))
            .unwrap();
        let user = NewLoginUser {
            id: LegacyId(1),
            tax_id: "111.444.777-35".into(),
            user_name: "jdoe".into(),
            password: "0".into(),
            created_by: LegacyId::SEED,
            created_on: at(0),
        };
        assert!(matches!(
            LoginRepo::insert(&store, &user).await,
            Err(StoreError::DuplicateKey(_))
        ));
    }
}
