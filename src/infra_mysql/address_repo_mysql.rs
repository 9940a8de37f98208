use super::util::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlAddressRepo {
    pool: MySqlPool,
}

impl MySqlAddressRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAddressRepo { pool }
    }

    fn row_to_municipality(row: MySqlRow) -> Result<Municipality, StoreError> {
        let get_err = |e: sqlx::Error| StoreError::Backend(e.to_string());
        let name: Option<String> = row.try_get("Descricao").map_err(get_err)?;
        Ok(Municipality {
            id: row.try_get("ID").map_err(get_err)?,
            name: name.unwrap_or_default(),
            state_id: row.try_get("Estado").map_err(get_err)?,
            ibge_code: row.try_get("CodigoIBGE").map_err(get_err)?,
        })
    }
}

#[async_trait::async_trait]
impl AddressRepo for MySqlAddressRepo {
    async fn find_zip_code(&self, digits: &str) -> Result<Option<ZipCodeRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT C.CEPP, C.CEP, C.Logradouro, C.Bairro, C.Cidade, C.Estado,
       C.MunicipioLookup, C.EstadoLookup, M.Descricao AS MunicipioNome
FROM CEP C
LEFT JOIN Municipio M ON M.ID = C.MunicipioLookup
WHERE C.CEPP = ? OR REPLACE(C.CEP, '-', '') = ? OR C.CEP = ?
LIMIT 1
"#,
        )
        .bind(digits)
        .bind(digits)
        .bind(digits)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        let Some(row) = row_opt else {
            return Ok(None);
        };
        let get_err = |e: sqlx::Error| StoreError::Backend(e.to_string());
        let plain: Option<String> = row.try_get("CEPP").map_err(get_err)?;
        let city: Option<String> = row.try_get("Cidade").map_err(get_err)?;
        let municipality_name: Option<String> = row.try_get("MunicipioNome").map_err(get_err)?;

        Ok(Some(ZipCodeRecord {
            zip_code: plain.unwrap_or_else(|| digits.to_string()),
            street: row.try_get("Logradouro").map_err(get_err)?,
            district: row.try_get("Bairro").map_err(get_err)?,
            municipality_name: municipality_name.or_else(|| city.clone()),
            city,
            state_code: row.try_get("Estado").map_err(get_err)?,
            municipality_id: row.try_get("MunicipioLookup").map_err(get_err)?,
            state_id: row.try_get("EstadoLookup").map_err(get_err)?,
        }))
    }

    async fn find_state_by_code(&self, code: &str) -> Result<Option<State>, StoreError> {
        let row_opt: Option<MySqlRow> =
            sqlx::query("SELECT ID, Sigla, Descricao FROM Estado WHERE Sigla = ? LIMIT 1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        row_opt
            .map(|row| {
                let get_err = |e: sqlx::Error| StoreError::Backend(e.to_string());
                Ok(State {
                    id: row.try_get("ID").map_err(get_err)?,
                    code: row.try_get("Sigla").map_err(get_err)?,
                    name: row.try_get("Descricao").map_err(get_err)?,
                })
            })
            .transpose()
    }

    async fn municipalities(
        &self,
        state_id: Option<i64>,
    ) -> Result<Vec<Municipality>, StoreError> {
        let rows = match state_id {
            Some(state_id) => {
                sqlx::query(
                    r#"
SELECT ID, Descricao, Estado, CAST(CodigoIBGE AS CHAR) AS CodigoIBGE
FROM Municipio
WHERE Estado = ?
ORDER BY Descricao
"#,
                )
                .bind(state_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
SELECT ID, Descricao, Estado, CAST(CodigoIBGE AS CHAR) AS CodigoIBGE
FROM Municipio
ORDER BY Descricao
"#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(store_error)?;

        rows.into_iter().map(Self::row_to_municipality).collect()
    }
}

pub struct MySqlStoreProbe {
    pool: MySqlPool,
}

impl MySqlStoreProbe {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlStoreProbe { pool }
    }
}

#[async_trait::async_trait]
impl StoreProbe for MySqlStoreProbe {
    async fn ping(&self) -> Result<String, StoreError> {
        let row = sqlx::query("SELECT 1, DATABASE()")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        let name: Option<String> = row
            .try_get(1)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(name.unwrap_or_default())
    }
}
