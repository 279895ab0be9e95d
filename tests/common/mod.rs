use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

/// Shared secret the spawned server and the tests both use to mint/verify
/// bearer tokens.
pub const TEST_JWT_SECRET: &str = "scout-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/scout-api");
        cmd.env("SCOUT_API_PORT", port.to_string())
            .env("SCOUT_JWT_SECRET", TEST_JWT_SECRET)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit the rest of the environment so the server sees DATABASE_URL
        // from .env when a database is available
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
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
                // Ready on either health outcome; degraded just means no database
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
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

/// Mint a bearer token the way the auth provider would.
#[allow(dead_code)]
pub fn bearer_token(sub: &str, name: &str, email: &str) -> String {
    let claims = scout_api::auth::Claims::new(
        sub.to_string(),
        Some(name.to_string()),
        Some(email.to_string()),
        None,
        1,
    );
    scout_api::auth::generate_jwt(&claims, TEST_JWT_SECRET).expect("token generation")
}

/// True when a database is configured for this test run; DB-backed flows skip
/// themselves otherwise.
#[allow(dead_code)]
pub fn database_available() -> bool {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL").is_ok()
}

/// Apply the schema once per test binary. Idempotent on the database side.
#[allow(dead_code)]
pub fn ensure_schema() -> Result<()> {
    static SCHEMA: OnceLock<()> = OnceLock::new();
    if SCHEMA.get().is_some() {
        return Ok(());
    }

    let status = Command::new("target/debug/scout-api")
        .arg("init-db")
        .status()
        .context("failed to run init-db")?;
    anyhow::ensure!(status.success(), "init-db exited with {}", status);

    let _ = SCHEMA.set(());
    Ok(())
}
