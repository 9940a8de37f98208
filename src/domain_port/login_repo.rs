use super::StoreError;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// A `LoginUsers` row as read for authentication and profile display.
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub id: LegacyId,
    pub tax_id: String,
    pub user_name: String,
    pub password: String,
    pub status: AccountStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_on: Option<DateTime<Utc>>,
    pub person: Option<LegacyId>,
}

#[derive(Debug, Clone)]
pub struct NewLoginUser {
    pub id: LegacyId,
    pub tax_id: String,
    pub user_name: String,
    pub password: String,
    pub created_by: LegacyId,
    pub created_on: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait LoginRepo: Send + Sync {
    /// Matches either the formatted tax id or its digits with punctuation removed.
    async fn find_by_tax_id(&self, cpf: &Cpf) -> Result<Option<LoginRecord>, StoreError>;

    async fn find_by_id(&self, id: LegacyId) -> Result<Option<LoginRecord>, StoreError>;

    async fn user_name_exists(&self, user_name: &str) -> Result<bool, StoreError>;

    /// Inserts an active row that never expires its password.
    async fn insert(&self, user: &NewLoginUser) -> Result<(), StoreError>;

    async fn touch_last_login(&self, id: LegacyId, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn link_person(&self, id: LegacyId, person: LegacyId) -> Result<(), StoreError>;
}
