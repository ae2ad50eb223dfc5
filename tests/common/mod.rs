#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

/// Signing secret the spawned server and token-crafting tests share.
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

// Demo principals seeded by the server in development mode.
pub const ADMIN_EMAIL: &str = "admin@bazaar.dev";
pub const ADMIN_PASSWORD: &str = "admin-dev-password";
pub const SELLER_EMAIL: &str = "seller@bazaar.dev";
pub const SELLER_PASSWORD: &str = "seller-dev-password";
pub const SHOPPER_EMAIL: &str = "shopper@bazaar.dev";
pub const SHOPPER_PASSWORD: &str = "shopper-dev-password";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Cargo builds the server binary before running integration tests
        // and exports its path
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bazaar-auth-api"));
        cmd.env("BAZAAR_AUTH_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Log a seeded principal in; returns (token, user object from the response).
pub async fn login(base_url: &str, email: &str, password: &str) -> Result<(String, serde_json::Value)> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    let token = body["data"]["token"]
        .as_str()
        .context("login response missing token")?
        .to_string();
    Ok((token, body["data"]["user"].clone()))
}
