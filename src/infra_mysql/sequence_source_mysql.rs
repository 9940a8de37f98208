use super::util::*;
use crate::domain_model::LegacyId;
use crate::domain_port::*;
use sqlx::{MySqlPool, Row};

/// Runs the id scans with table and column names from a [`SequenceTable`].
/// Those names are compile-time constants; every value is bound.
pub struct MySqlSequenceSource {
    pool: MySqlPool,
}

impl MySqlSequenceSource {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSequenceSource { pool }
    }

    async fn fetch_id(&self, sql: &str, bind: Option<String>) -> Result<Option<LegacyId>, StoreError> {
        let mut query = sqlx::query(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        match row {
            Some(row) => {
                let id: Option<i64> = row
                    .try_get(0)
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(id.map(LegacyId))
            }
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl SequenceSource for MySqlSequenceSource {
    async fn last_by_creation(
        &self,
        table: SequenceTable,
    ) -> Result<Option<LegacyId>, StoreError> {
        let SequenceTable {
            table,
            id_column: id,
            created_column: created,
        } = table;
        let sql = format!(
            r#"
SELECT CAST({id} AS SIGNED)
FROM {table}
WHERE {id} REGEXP '^[0-9]+$'
  AND {created} IS NOT NULL
ORDER BY {created} DESC
LIMIT 1
"#
        );
        self.fetch_id(&sql, None).await
    }

    async fn id_exists(&self, table: SequenceTable, id: LegacyId) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ? LIMIT 1",
            table.table, table.id_column
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.is_some())
    }

    async fn max_numeric_id(
        &self,
        table: SequenceTable,
        excluding: Option<LegacyId>,
    ) -> Result<Option<LegacyId>, StoreError> {
        let SequenceTable {
            table,
            id_column: id,
            ..
        } = table;
        let exclusion = if excluding.is_some() {
            format!("AND {id} <> ?")
        } else {
            String::new()
        };
        let sql = format!(
            r#"
SELECT MAX(CAST({id} AS SIGNED))
FROM {table}
WHERE {id} REGEXP '^[0-9]+$' {exclusion}
"#
        );
        self.fetch_id(&sql, excluding.map(|e| e.to_string())).await
    }

    async fn top_numeric_id(&self, table: SequenceTable) -> Result<Option<LegacyId>, StoreError> {
        let SequenceTable {
            table,
            id_column: id,
            ..
        } = table;
        let sql = format!(
            r#"
SELECT CAST({id} AS SIGNED)
FROM {table}
WHERE {id} REGEXP '^[0-9]+$'
ORDER BY CAST({id} AS SIGNED) DESC
LIMIT 1
"#
        );
        self.fetch_id(&sql, None).await
    }
}
