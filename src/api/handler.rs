use super::error::*;
use super::rate_limit::RateLimiter;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            details: None,
        }
    }

    pub fn err(code: &ApiErrorCode) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(code.to_string()),
            code: Some(code.code()),
            details: None,
        }
    }
}

// region auth

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "cpf")]
    pub cpf_cnpj: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: AccessToken,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

pub async fn login(
    client: String,
    limiter: Arc<RateLimiter>,
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        cpf: body.cpf_cnpj.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    limiter.release(&client);

    let login_response = LoginResponse {
        token: login_result.token,
        expires_at: login_result.expires_at,
        user: login_result.user,
    };
    Ok(warp::reply::json(&ApiResponse::ok(login_response)))
}

pub async fn verify(token: VerifiedToken) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(token)))
}

pub async fn profile(
    token: VerifiedToken,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = auth_service
        .profile(token.identity.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(token: VerifiedToken) -> Result<impl warp::Reply, warp::Rejection> {
    info!(user_id = %token.identity.user_id, "logout");
    Ok(warp::reply::json(&ApiResponse::ok(MessageResponse {
        message: "logged out",
    })))
}

pub async fn health(
    lookup_service: Arc<dyn LookupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = lookup_service
        .health()
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(status)))
}

// endregion

// region registration

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimpleRegisterRequest {
    #[serde(rename = "nome")]
    pub name: String,
    pub cpf: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "sexo")]
    pub sex: Option<Sex>,
}

impl SimpleRegisterRequest {
    fn into_input(self) -> RegisterInput {
        RegisterInput {
            name: self.name,
            cpf: self.cpf,
            user_name: self.username,
            password: self.password,
            sex: self.sex,
            ..RegisterInput::default()
        }
    }
}

pub async fn register_simple(
    body: SimpleRegisterRequest,
    registration_service: Arc<dyn RegistrationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    register(body.into_input(), registration_service).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ManualIdRegisterRequest {
    #[serde(flatten)]
    pub base: SimpleRegisterRequest,
    #[serde(rename = "loginId")]
    pub login_id: Option<LegacyId>,
    #[serde(rename = "pessoaId")]
    pub person_id: Option<LegacyId>,
}

pub async fn register_with_ids(
    body: ManualIdRegisterRequest,
    registration_service: Arc<dyn RegistrationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let mut input = body.base.into_input();
    input.login_id = body.login_id;
    input.person_id = body.person_id;
    register(input, registration_service).await
}

/// The full registration form, field names as the legacy front end sends them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompleteRegisterRequest {
    pub nome: String,
    pub cpf: String,
    pub username: String,
    pub password: String,
    pub nome_social: Option<String>,
    pub sexo: Option<Sex>,
    pub estado_civil: Option<MaritalStatus>,
    pub data_nascimento: Option<NaiveDate>,
    pub nome_mae: Option<String>,
    pub nome_pai: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub municipio: Option<i64>,

    pub cep_residencial: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub pais_residencial: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub estado_residencial: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub municipio_residencial: Option<i64>,
    pub bairro_residencial: Option<String>,
    pub numero_residencial: Option<String>,
    pub logradouro_residencial: Option<String>,
    pub complemento_residencial: Option<String>,
    pub email_residencial: Option<String>,
    pub telefone_celular: Option<String>,
    pub telefone_residencial: Option<String>,
    pub correspondencia_residencial: Option<String>,

    pub cep_comercial: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub pais_comercial: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub estado_comercial: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub municipio_comercial: Option<i64>,
    pub bairro_comercial: Option<String>,
    pub numero_comercial: Option<String>,
    pub logradouro_comercial: Option<String>,
    pub complemento_comercial: Option<String>,
    pub email_comercial: Option<String>,
    pub telefone2_comercial: Option<String>,
    pub telefone_comercial: Option<String>,
    pub correspondencia_comercial: Option<String>,
}

impl CompleteRegisterRequest {
    fn into_input(self, created_by: LegacyId) -> RegisterInput {
        let residential = Address {
            zip_code: self.cep_residencial,
            country: self.pais_residencial,
            state: self.estado_residencial,
            municipality: self.municipio_residencial,
            district: self.bairro_residencial,
            number: self.numero_residencial,
            street: self.logradouro_residencial,
            complement: self.complemento_residencial,
            email: self.email_residencial,
            phone: self.telefone_residencial,
            mobile: self.telefone_celular,
            mailing: yes_no(self.correspondencia_residencial.as_deref()),
        };
        let commercial = Address {
            zip_code: self.cep_comercial,
            country: self.pais_comercial,
            state: self.estado_comercial,
            municipality: self.municipio_comercial,
            district: self.bairro_comercial,
            number: self.numero_comercial,
            street: self.logradouro_comercial,
            complement: self.complemento_comercial,
            email: self.email_comercial,
            phone: self.telefone_comercial,
            mobile: self.telefone2_comercial,
            mailing: yes_no(self.correspondencia_comercial.as_deref()),
        };

        RegisterInput {
            name: self.nome,
            cpf: self.cpf,
            user_name: self.username,
            password: self.password,
            sex: self.sexo,
            profile: Some(PersonProfile {
                social_name: self.nome_social,
                marital_status: self.estado_civil,
                birth_date: self.data_nascimento,
                mother_name: self.nome_mae,
                father_name: self.nome_pai,
                municipality: self.municipio,
                residential,
                commercial,
            }),
            created_by: Some(created_by),
            ..RegisterInput::default()
        }
    }
}

fn yes_no(flag: Option<&str>) -> Option<bool> {
    match flag.map(str::trim) {
        Some("S") | Some("s") => Some(true),
        Some("N") | Some("n") => Some(false),
        _ => None,
    }
}

/// Select boxes post ids as strings; blanks mean "not chosen".
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

pub async fn register_complete(
    token: VerifiedToken,
    body: CompleteRegisterRequest,
    registration_service: Arc<dyn RegistrationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    register(body.into_input(token.identity.user_id), registration_service).await
}

async fn register(
    input: RegisterInput,
    registration_service: Arc<dyn RegistrationService>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection> {
    let result = registration_service
        .register(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(result)),
        warp::http::StatusCode::CREATED,
    ))
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

pub async fn tax_id_exists(
    cpf: String,
    registration_service: Arc<dyn RegistrationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let exists = registration_service
        .tax_id_exists(&cpf)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(ExistsResponse { exists })))
}

pub async fn user_name_exists(
    user_name: String,
    registration_service: Arc<dyn RegistrationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let exists = registration_service
        .user_name_exists(&user_name)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(ExistsResponse { exists })))
}

// endregion

// region lookups

pub async fn zip_code(
    zip_code: String,
    lookup_service: Arc<dyn LookupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let record = lookup_service
        .zip_code(&zip_code)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(record)))
}

#[derive(Debug, Deserialize)]
pub struct MunicipalityQuery {
    pub estado: Option<String>,
}

pub async fn municipalities(
    query: MunicipalityQuery,
    lookup_service: Arc<dyn LookupService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let filter = MunicipalityFilter::parse(query.estado.as_deref());
    let listing = lookup_service
        .municipalities(filter)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    Ok(warp::reply::json(&ApiResponse::ok(listing)))
}

pub fn options(items: Vec<OptionItem>) -> impl warp::Reply {
    warp::reply::json(&ApiResponse::ok(items))
}

// endregion
