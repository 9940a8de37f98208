use crate::api::{self, RateLimiter};
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::{self, Settings};
use anyhow::anyhow;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;

const JWT_SECRET_ENV: &str = "JWT_SECRET";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const DEV_SIGNING_KEY: &str = "portal-auth-development-signing-key";
const MIN_SECRET_LEN: usize = 32;

/// Every repository the services need, backed by one store.
pub struct StoreHandles {
    pub login_repo: Arc<dyn LoginRepo>,
    pub person_repo: Arc<dyn PersonRepo>,
    pub sequence_source: Arc<dyn SequenceSource>,
    pub address_repo: Arc<dyn AddressRepo>,
    pub probe: Arc<dyn StoreProbe>,
    pub pool: Option<MySqlPool>,
}

impl StoreHandles {
    pub async fn connect(store: &settings::Store) -> anyhow::Result<Self> {
        let url = std::env::var(DATABASE_URL_ENV)
            .ok()
            .or_else(|| store.url.clone())
            .ok_or_else(|| anyhow!("store.url or {} is required", DATABASE_URL_ENV))?;

        let pool = MySqlPoolOptions::new()
            .max_connections(store.max_connections)
            .idle_timeout(Duration::from_secs(store.idle_timeout_secs))
            .acquire_timeout(Duration::from_secs(store.acquire_timeout_secs))
            .connect(&url)
            .await?;

        Ok(Self {
            login_repo: Arc::new(MySqlLoginRepo::new(pool.clone())),
            person_repo: Arc::new(MySqlPersonRepo::new(pool.clone())),
            sequence_source: Arc::new(MySqlSequenceSource::new(pool.clone())),
            address_repo: Arc::new(MySqlAddressRepo::new(pool.clone())),
            probe: Arc::new(MySqlStoreProbe::new(pool.clone())),
            pool: Some(pool),
        })
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            login_repo: store.clone(),
            person_repo: store.clone(),
            sequence_source: store.clone(),
            address_repo: store.clone(),
            probe: store,
            pool: None,
        }
    }
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub registration_service: Arc<dyn RegistrationService>,
    pub lookup_service: Arc<dyn LookupService>,
    pub login_limiter: Arc<RateLimiter>,
    pub global_limiter: Arc<RateLimiter>,
    pub expose_error_details: bool,
    pub body_limit_bytes: u64,
    pub cors_origins: Vec<String>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let signing_key = signing_key(
            std::env::var(JWT_SECRET_ENV).ok(),
            settings.app.is_production(),
        )?;

        let handles = match settings.store.backend.as_str() {
            "fake" => {
                let store = Arc::new(MemoryStore::new());
                // The legacy tables always carry the system row.
                store.add_login_user(LoginUserRow::new("1", "", "SISTEMA", ""))?;
                StoreHandles::memory(store)
            }
            "real" => StoreHandles::connect(&settings.store).await?,
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let server = Self::assemble(settings, handles, signing_key)?;
        info!(backend = %settings.store.backend, "server started");
        Ok(server)
    }

    pub fn assemble(
        settings: &Settings,
        handles: StoreHandles,
        signing_key: Vec<u8>,
    ) -> anyhow::Result<Self> {
        for origin in &settings.http.cors_origins {
            api::validate_origin(origin)?;
        }

        let scheme: PasswordScheme = settings
            .auth
            .password_scheme
            .parse()
            .map_err(|e: String| anyhow!(e))?;
        let credential_hasher: Arc<dyn CredentialHasher> =
            Arc::new(MigratingPasswordHasher::new(scheme));
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            access_ttl: Duration::from_secs(settings.auth.token_ttl_secs),
            signing_key,
        }));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            handles.login_repo.clone(),
            credential_hasher.clone(),
            token_codec,
        ));
        let registration_service: Arc<dyn RegistrationService> =
            Arc::new(RealRegistrationService::new(
                handles.login_repo.clone(),
                handles.person_repo.clone(),
                handles.sequence_source.clone(),
                credential_hasher,
            ));
        let lookup_service: Arc<dyn LookupService> = Arc::new(RealLookupService::new(
            handles.address_repo.clone(),
            handles.probe.clone(),
        ));

        Ok(Self {
            auth_service,
            registration_service,
            lookup_service,
            login_limiter: Arc::new(RateLimiter::from(settings.auth.login_rate_limit)),
            global_limiter: Arc::new(RateLimiter::from(settings.auth.global_rate_limit)),
            expose_error_details: !settings.app.is_production(),
            body_limit_bytes: settings.http.body_limit_bytes,
            cors_origins: settings.http.cors_origins.clone(),
            pool: handles.pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// A missing secret is fatal in production and replaced by a fixed key elsewhere.
pub fn signing_key(secret: Option<String>, production: bool) -> anyhow::Result<Vec<u8>> {
    let secret = match secret.filter(|s| !s.is_empty()) {
        Some(secret) => secret,
        None if production => {
            return Err(anyhow!("{} must be set in production", JWT_SECRET_ENV));
        }
        None => {
            warn!("{} not set, using the development signing key", JWT_SECRET_ENV);
            DEV_SIGNING_KEY.to_string()
        }
    };

    if secret.chars().count() < MIN_SECRET_LEN {
        warn!(
            "{} is shorter than {} characters, tokens are easy to forge",
            JWT_SECRET_ENV, MIN_SECRET_LEN
        );
    }
    Ok(secret.into_bytes())
}
