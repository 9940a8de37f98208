// Shared setup for the HTTP-level tests: a server over the in-memory store,
// driven through `warp::test` without binding a socket.
#![allow(dead_code)]

use portal_auth::api;
use portal_auth::infra_memory::{LoginUserRow, MemoryStore};
use portal_auth::server::{Server, StoreHandles};
use portal_auth::settings::parse_settings_str;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;

pub const SIGNING_KEY: &[u8] = b"integration-test-signing-key-0123456789";
pub const CPF: &str = "111.444.777-35";
pub const OTHER_CPF: &str = "529.982.247-25";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub server: Arc<Server>,
}

/// Development settings with the system row already present, as in the legacy tables.
pub fn app() -> TestApp {
    app_with_settings(include_str!("../../settings/dev.toml"))
}

pub fn app_with_settings(toml: &str) -> TestApp {
    let settings = parse_settings_str(toml).expect("settings parse");
    let store = Arc::new(MemoryStore::new());
    store
        .add_login_user(LoginUserRow::new("1", "", "SISTEMA", ""))
        .expect("seed system row");
    let server = Server::assemble(
        &settings,
        StoreHandles::memory(store.clone()),
        SIGNING_KEY.to_vec(),
    )
    .expect("server assembles");
    TestApp {
        store,
        server: Arc::new(server),
    }
}

pub fn client(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, last_octet], 40000))
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub headers: warp::http::HeaderMap,
}

impl TestApp {
    pub async fn send(&self, request: warp::test::RequestBuilder) -> Reply {
        let filter = api::service(self.server.clone());
        let response = request.reply(&filter).await;
        let body = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
        Reply {
            status: response.status(),
            headers: response.headers().clone(),
            body,
        }
    }

    pub async fn get(&self, path: &str) -> Reply {
        self.send(warp::test::request().method("GET").path(path).remote_addr(client(1)))
            .await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> Reply {
        self.send(
            warp::test::request()
                .method("GET")
                .path(path)
                .remote_addr(client(1))
                .header("authorization", format!("Bearer {}", token)),
        )
        .await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Reply {
        self.post_from(client(1), path, body).await
    }

    pub async fn post_from(&self, from: SocketAddr, path: &str, body: &Value) -> Reply {
        self.send(
            warp::test::request()
                .method("POST")
                .path(path)
                .remote_addr(from)
                .json(body),
        )
        .await
    }

    pub async fn register(&self, cpf: &str, username: &str, password: &str) -> Reply {
        self.post(
            "/api/register",
            &serde_json::json!({
                "nome": "João da Silva",
                "cpf": cpf,
                "username": username,
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, cpf: &str, password: &str) -> Reply {
        self.post_from(
            client(1),
            "/api/login",
            &serde_json::json!({ "cpfCnpj": cpf, "password": password }),
        )
        .await
    }

    /// Registers `CPF` and returns a token for it.
    pub async fn registered_token(&self) -> String {
        let reply = self.register(CPF, "jdoe", "pass123").await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let reply = self.login(CPF, "pass123").await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.body["data"]["token"]
            .as_str()
            .expect("token string")
            .to_string()
    }
}
