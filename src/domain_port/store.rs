#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The insert hit a unique key (another writer took the id first).
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("store backend: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait StoreProbe: Send + Sync {
    /// Round-trips the store and returns the name of the current database.
    async fn ping(&self) -> Result<String, StoreError>;
}
