use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealLookupService {
    address_repo: Arc<dyn AddressRepo>,
    probe: Arc<dyn StoreProbe>,
}

impl RealLookupService {
    pub fn new(address_repo: Arc<dyn AddressRepo>, probe: Arc<dyn StoreProbe>) -> Self {
        Self {
            address_repo,
            probe,
        }
    }
}

#[async_trait::async_trait]
impl LookupService for RealLookupService {
    async fn zip_code(&self, zip_code: &str) -> Result<ZipCodeRecord, LookupError> {
        let digits = digits_only(zip_code);
        if digits.len() != 8 {
            return Err(LookupError::Validation(
                "CEP must contain 8 digits".to_string(),
            ));
        }
        self.address_repo
            .find_zip_code(&digits)
            .await?
            .ok_or_else(|| LookupError::NotFound("CEP not found".to_string()))
    }

    async fn municipalities(
        &self,
        filter: MunicipalityFilter,
    ) -> Result<MunicipalityListing, LookupError> {
        let state_id = match filter {
            MunicipalityFilter::All => None,
            MunicipalityFilter::StateId(id) => Some(id),
            MunicipalityFilter::StateCode(code) => {
                match self.address_repo.find_state_by_code(&code).await? {
                    Some(state) => Some(state.id),
                    None => {
                        return Ok(MunicipalityListing {
                            municipalities: Vec::new(),
                            message: Some(format!("state {} not found", code)),
                        });
                    }
                }
            }
        };

        let municipalities = self.address_repo.municipalities(state_id).await?;
        Ok(MunicipalityListing {
            municipalities,
            message: None,
        })
    }

    async fn health(&self) -> Result<HealthStatus, LookupError> {
        let database = self.probe.ping().await?;
        Ok(HealthStatus {
            status: "ok",
            database,
        })
    }
}
