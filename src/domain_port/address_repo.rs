use super::StoreError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait AddressRepo: Send + Sync {
    async fn find_zip_code(&self, digits: &str) -> Result<Option<ZipCodeRecord>, StoreError>;

    async fn find_state_by_code(&self, code: &str) -> Result<Option<State>, StoreError>;

    /// Ordered by name. `None` lists every municipality.
    async fn municipalities(&self, state_id: Option<i64>)
    -> Result<Vec<Municipality>, StoreError>;
}
