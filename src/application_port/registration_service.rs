use crate::domain_model::*;
use crate::domain_port::StoreError;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Validation(String),
    #[error("CPF already registered")]
    TaxIdTaken,
    #[error("username already in use")]
    UserNameTaken,
    #[error("id {id} already in use in {table}")]
    IdInUse { table: &'static str, id: LegacyId },
    #[error("registration conflict, retry")]
    Conflict,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey(_) => RegistrationError::Conflict,
            StoreError::Backend(e) => RegistrationError::Store(e),
        }
    }
}

/// The optional part of the person row, filled by the full registration form.
#[derive(Debug, Clone, Default)]
pub struct PersonProfile {
    pub social_name: Option<String>,
    pub marital_status: Option<MaritalStatus>,
    pub birth_date: Option<NaiveDate>,
    pub mother_name: Option<String>,
    pub father_name: Option<String>,
    pub municipality: Option<i64>,
    pub residential: Address,
    pub commercial: Address,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub name: String,
    pub cpf: String,
    pub user_name: String,
    pub password: String,
    pub sex: Option<Sex>,
    pub profile: Option<PersonProfile>,
    /// Credential row of the operator creating the account, if any.
    pub created_by: Option<LegacyId>,
    /// Ids chosen by the caller; `None` lets the allocator pick.
    pub login_id: Option<LegacyId>,
    pub person_id: Option<LegacyId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub login_id: LegacyId,
    pub person_id: LegacyId,
    pub cpf: String,
    pub user_name: String,
    pub name: String,
}

#[async_trait::async_trait]
pub trait RegistrationService: Send + Sync {
    async fn register(&self, request: RegisterInput)
    -> Result<RegistrationResult, RegistrationError>;
    async fn tax_id_exists(&self, cpf: &str) -> Result<bool, RegistrationError>;
    async fn user_name_exists(&self, user_name: &str) -> Result<bool, RegistrationError>;
}
