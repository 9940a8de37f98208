use super::StoreError;
use crate::domain_model::LegacyId;

/// Names of a table keyed by a text column holding sequential integers.
/// Always a compile-time constant, never built from request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTable {
    pub table: &'static str,
    pub id_column: &'static str,
    pub created_column: &'static str,
}

impl SequenceTable {
    pub const LOGIN_USERS: SequenceTable = SequenceTable {
        table: "LoginUsers",
        id_column: "ID",
        created_column: "CreatedOn",
    };

    pub const PERSON: SequenceTable = SequenceTable {
        table: "Pessoa",
        id_column: "ID",
        created_column: "CreatedOn",
    };
}

/// Read side of the sequential id scheme. Rows whose id is not an integer are ignored.
#[async_trait::async_trait]
pub trait SequenceSource: Send + Sync {
    /// Id of the most recently created row that has a creation timestamp.
    async fn last_by_creation(&self, table: SequenceTable)
    -> Result<Option<LegacyId>, StoreError>;

    async fn id_exists(&self, table: SequenceTable, id: LegacyId) -> Result<bool, StoreError>;

    async fn max_numeric_id(
        &self,
        table: SequenceTable,
        excluding: Option<LegacyId>,
    ) -> Result<Option<LegacyId>, StoreError>;

    /// First row when ordered by numeric id, descending.
    async fn top_numeric_id(&self, table: SequenceTable) -> Result<Option<LegacyId>, StoreError>;
}
