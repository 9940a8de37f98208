use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;

pub struct RealAuthService {
    login_repo: Arc<dyn LoginRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
}

impl RealAuthService {
    pub fn new(
        login_repo: Arc<dyn LoginRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            login_repo,
            credential_hasher,
            token_codec,
        }
    }

    fn validate_login(cpf: &str, password: &str) -> Result<Cpf, AuthError> {
        if cpf.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "CPF and password are required".to_string(),
            ));
        }
        Cpf::parse(cpf).map_err(|e| AuthError::Validation(e.to_string()))
    }

    /// Best effort: a failed update is logged and the login proceeds.
    async fn touch_last_login(&self, id: LegacyId) {
        if let Err(e) = self.login_repo.touch_last_login(id, Utc::now()).await {
            warn!(user_id = %id, "could not update last login: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { cpf, password } = request;
        let cpf = Self::validate_login(&cpf, &password)?;

        let Some(rec) = self.login_repo.find_by_tax_id(&cpf).await? else {
            info!(cpf = %cpf.masked(), "login rejected: unknown CPF");
            return Err(AuthError::InvalidCredentials);
        };

        if rec.password.trim().is_empty() {
            warn!(user_id = %rec.id, "login rejected: no stored password");
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password)
            .await?;
        if !ok {
            info!(user_id = %rec.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        match &rec.status {
            AccountStatus::Active => {}
            AccountStatus::Inactive => {
                info!(user_id = %rec.id, "login rejected: account inactive");
                return Err(AuthError::AccountInactive);
            }
            AccountStatus::Unknown(code) => {
                warn!(user_id = %rec.id, status = %code, "login rejected: unknown status code");
                return Err(AuthError::InvalidCredentials);
            }
        }

        self.touch_last_login(rec.id).await;

        let identity = Identity {
            user_id: rec.id,
            cpf: cpf.formatted(),
            name: rec.user_name.clone(),
            active: true,
        };
        let (token, expires_at) = self.token_codec.issue_access_token(&identity).await?;

        info!(user_id = %rec.id, cpf = %cpf.masked(), "login succeeded");

        Ok(LoginResult {
            token,
            expires_at,
            user: UserSummary {
                id: rec.id,
                cpf: identity.cpf,
                name: identity.name,
                active: true,
                last_login: rec.last_login,
            },
        })
    }

    async fn verify_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await
    }

    async fn profile(&self, user_id: LegacyId) -> Result<UserProfile, AuthError> {
        let rec = self
            .login_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserProfile {
            id: rec.id,
            cpf: rec.tax_id,
            name: rec.user_name,
            active: rec.status.is_active(),
            last_login: rec.last_login,
            created_on: rec.created_on,
        })
    }
}
