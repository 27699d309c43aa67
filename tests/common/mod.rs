#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use multicab_inventory::config::config;
use multicab_inventory::database::DatabaseManager;
use multicab_inventory::routes::app;
use multicab_inventory::state::AppState;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// The app served in-process on its own runtime thread. It lives exactly as
/// long as the test binary, so nothing outlives `cargo test`.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = TcpListener::bind(("127.0.0.1", port)).context("failed to bind test port")?;
        listener.set_nonblocking(true)?;
        let database_url = DatabaseManager::database_url()?;

        // Each #[tokio::test] owns a short-lived runtime; the server needs one that outlasts them
        std::thread::Builder::new()
            .name("test-server".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        eprintln!("test server runtime failed: {}", e);
                        return;
                    }
                };
                if let Err(e) = runtime.block_on(serve(listener, database_url)) {
                    eprintln!("test server stopped: {:#}", e);
                }
            })
            .context("failed to start server thread")?;

        Ok(Self { port, base_url })
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
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// `None` when no database is configured; callers return early
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return Ok(None);
    }
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to start test server"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

async fn serve(listener: TcpListener, database_url: String) -> Result<()> {
    let config = config();
    let pool = DatabaseManager::connect(&database_url, &config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    let listener = tokio::net::TcpListener::from_std(listener)?;
    axum::serve(listener, app(AppState::new(pool), config)).await?;
    Ok(())
}

/// Email unique to this test run
pub fn unique_email(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}@multicab.test", prefix, nanos)
}

/// Register a fresh staff account and return (token, user)
pub async fn register(server: &TestServer, client: &reqwest::Client, email: &str, password: &str) -> Result<(String, Value)> {
    let res = client
        .post(server.url("/api/users/register"))
        .json(&json!({ "fullName": "Test Staff", "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
    let body: Value = res.json().await?;
    let token = body["data"]["token"].as_str().context("token missing")?.to_string();
    Ok((token, body["data"]["user"].clone()))
}
