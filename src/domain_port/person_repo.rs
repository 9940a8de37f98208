use super::StoreError;
use crate::domain_model::*;
use chrono::{DateTime, NaiveDate, Utc};

/// A `Pessoa` row to insert. Optional fields left `None` are written as NULL.
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub id: LegacyId,
    pub name: String,
    pub social_name: Option<String>,
    pub person_type: PersonType,
    pub tax_id_digits: String,
    pub sex: Sex,
    pub marital_status: Option<MaritalStatus>,
    pub birth_date: Option<NaiveDate>,
    pub mother_name: Option<String>,
    pub father_name: Option<String>,
    pub municipality: Option<i64>,
    pub residential: Address,
    pub commercial: Address,
    pub created_by: LegacyId,
    pub created_on: DateTime<Utc>,
    pub login_user: LegacyId,
}

#[async_trait::async_trait]
pub trait PersonRepo: Send + Sync {
    async fn tax_id_exists(&self, tax_id_digits: &str) -> Result<bool, StoreError>;

    async fn insert(&self, person: &NewPerson) -> Result<(), StoreError>;
}
