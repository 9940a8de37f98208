use crate::domain_model::*;
use crate::domain_port::StoreError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for LookupError {
    fn from(e: StoreError) -> Self {
        LookupError::Store(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MunicipalityListing {
    pub municipalities: Vec<Municipality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: String,
}

#[async_trait::async_trait]
pub trait LookupService: Send + Sync {
    async fn zip_code(&self, zip_code: &str) -> Result<ZipCodeRecord, LookupError>;
    async fn municipalities(
        &self,
        filter: MunicipalityFilter,
    ) -> Result<MunicipalityListing, LookupError>;
    async fn health(&self) -> Result<HealthStatus, LookupError>;
}
