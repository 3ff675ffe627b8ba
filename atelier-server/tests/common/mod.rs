#![allow(dead_code)]

use atelier_sdk::Client;
use atelier_types::auth::{Role, SessionToken};
use tokio::sync::oneshot;

pub const SESSION_SECRET: &str = "integration-test-secret";

pub fn test_config(port_tx: oneshot::Sender<u16>) -> atelier_server::Config {
    atelier_server::Config {
        port: 0,
        port_tx: Some(port_tx),
        database_url: ":memory:".into(),
        session_secret: SESSION_SECRET.into(),
        handler_timeout_ms: 10_000,
        cascade_delete: true,
    }
}

pub async fn setup_with(config_fn: impl FnOnce(&mut atelier_server::Config)) -> Client {
    let (port_tx, port_rx) = oneshot::channel();
    let mut config = test_config(port_tx);
    config_fn(&mut config);

    tokio::spawn(async move {
        if let Err(err) = atelier_server::start(config, std::future::pending()).await {
            panic!("server error: {err}");
        }
    });

    let port = port_rx.await.expect("server should report its port");
    Client::new(format!("http://localhost:{port}"))
}

pub async fn setup() -> Client {
    setup_with(|_| {}).await
}

/// A client already authenticated as `user_id`.
pub async fn setup_as(user_id: &str) -> Client {
    let client = setup().await;
    client.set_token(Some(token_for(user_id))).await;
    client
}

pub fn token_for(user_id: &str) -> String {
    SessionToken::new(user_id, Role::User).sign(SESSION_SECRET)
}

pub fn admin_token_for(user_id: &str) -> String {
    SessionToken::new(user_id, Role::Admin).sign(SESSION_SECRET)
}
