use super::error::*;
use super::handler;
use super::rate_limit::RateLimiter;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use crate::server::*;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let body_limit = server.body_limit_bytes;

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_rate_limit(server.login_limiter.clone()))
        .and(with(server.login_limiter.clone()))
        .and(json_body(body_limit))
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let verify = warp::path("verify")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and_then(handler::verify);

    let profile = warp::path("profile")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.auth_service.clone()))
        .and_then(handler::profile);

    let logout = warp::path("logout")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_verification(server.auth_service.clone()))
        .and_then(handler::logout);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with(server.lookup_service.clone()))
        .and_then(handler::health);

    let auth = login.or(verify).or(profile).or(logout).or(health);

    let register = warp::path("register")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body(body_limit))
        .and(with(server.registration_service.clone()))
        .and_then(handler::register_simple);

    auth.or(register).or(cadastro_routes(server))
}

fn cadastro_routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let body_limit = server.body_limit_bytes;

    let simple = warp::path!("cadastro" / "simples")
        .and(warp::post())
        .and(json_body(body_limit))
        .and(with(server.registration_service.clone()))
        .and_then(handler::register_simple);

    let complete = warp::path!("cadastro" / "completo")
        .and(warp::post())
        .and(with_verification(server.auth_service.clone()))
        .and(json_body(body_limit))
        .and(with(server.registration_service.clone()))
        .and_then(handler::register_complete);

    let manual = warp::path!("cadastro" / "com-id-manual")
        .and(warp::post())
        .and(json_body(body_limit))
        .and(with(server.registration_service.clone()))
        .and_then(handler::register_with_ids);

    let cpf_exists = warp::path!("cadastro" / "verificar" / "cpf" / String)
        .and(warp::get())
        .and(with(server.registration_service.clone()))
        .and_then(handler::tax_id_exists);

    let user_name_exists = warp::path!("cadastro" / "verificar" / "username" / String)
        .and(warp::get())
        .and(with(server.registration_service.clone()))
        .and_then(handler::user_name_exists);

    let zip_code = warp::path!("cadastro" / "cep" / String)
        .and(warp::get())
        .and(with(server.lookup_service.clone()))
        .and_then(handler::zip_code);

    let municipalities = warp::path!("cadastro" / "municipios")
        .and(warp::get())
        .and(warp::query::<handler::MunicipalityQuery>())
        .and(with(server.lookup_service.clone()))
        .and_then(handler::municipalities);

    let marital_status = warp::path!("cadastro" / "estado-civil")
        .and(warp::get())
        .map(|| handler::options(marital_status_options()));

    let sex = warp::path!("cadastro" / "sexo")
        .and(warp::get())
        .map(|| handler::options(sex_options()));

    let person_type = warp::path!("cadastro" / "tipo-pessoa")
        .and(warp::get())
        .map(|| handler::options(person_type_options()));

    simple
        .or(complete)
        .or(manual)
        .or(cpf_exists)
        .or(user_name_exists)
        .or(zip_code)
        .or(municipalities)
        .or(marital_status)
        .or(sex)
        .or(person_type)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>(limit: u64) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: DeserializeOwned + Send,
{
    warp::body::content_length_limit(limit).and(warp::body::json())
}

/// Counts the request against `limiter` and extracts the client key.
pub(super) fn with_rate_limit(
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::addr::remote().and_then(move |addr: Option<SocketAddr>| {
        let limiter = limiter.clone();
        async move {
            let client = addr
                .map(|a| a.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            match limiter.try_acquire(&client) {
                Ok(()) => Ok(client),
                Err(retry_after_secs) => {
                    warn!(%client, retry_after_secs, "rate limit exceeded");
                    Err(reject::custom(ApiErrorCode::TooManyRequests { retry_after_secs }))
                }
            }
        }
    })
}

fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (VerifiedToken,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        move |header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let header = header.ok_or_else(|| reject::custom(ApiErrorCode::MissingToken))?;
                let token = bearer_token(&header)
                    .ok_or_else(|| reject::custom(ApiErrorCode::MalformedAuthorization))?;
                let verified = auth_service
                    .verify_token(token)
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok::<_, warp::Rejection>(verified)
            }
        },
    )
}
