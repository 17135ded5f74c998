//! Walks through a session against a live DeployR server: log in, open a
//! session, run some R code, read back an R object, close the session.
//!
//! Configure with `DEPLOYR_URL`, `DEPLOYR_USER` and `DEPLOYR_PASSWORD`.
//! Run with: `cargo run -p session-demo`

use deployr::DEFAULT_BASE_URL;
use deployr::prelude::*;
use tokio::sync::oneshot;

/// Logs every transaction the client runs.
struct LogEvents;

impl TransactionEvents for LogEvents {
    fn start(&self, id: TransactionId) {
        tracing::debug!(transaction = %id, "start");
    }

    fn complete(&self, id: TransactionId, status: &Status) {
        tracing::debug!(transaction = %id, %status, "complete");
    }

    fn abort(&self, id: TransactionId) {
        tracing::warn!(transaction = %id, "timed out");
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let url = env_or("DEPLOYR_URL", DEFAULT_BASE_URL);
    let user = env_or("DEPLOYR_USER", "testuser");
    let password = env_or("DEPLOYR_PASSWORD", "changeme");

    let client = DeployrClient::builder().base_url(&url).build()?;
    client.subscribe_events(LogEvents);
    tracing::info!(%url, %user, "connecting");

    // Log in and open a session in one go.
    let (session_tx, session_rx) = oneshot::channel();
    client
        .login_create_session(
            &user,
            &password,
            false,
            Callback::new().on_success(move |reply: Reply<String>| {
                let _ = session_tx.send(reply.into_brief().unwrap_or_default());
            }),
        )
        .await?
        .wait()
        .await;
    let session = session_rx.await?;
    tracing::info!(%session, "session created");

    // Run code and ask for `x` back.
    let (result_tx, result_rx) = oneshot::channel();
    client
        .execute_code(
            &session,
            "x <- round(rnorm(5), 2)",
            &ExecOptions::new().robjects(["x"]),
            Callback::new()
                .on_success(move |response: Response| {
                    let x = response
                        .field("workspace")
                        .and_then(|workspace| workspace.get("objects"))
                        .and_then(|objects| objects.as_array())
                        .and_then(|objects| objects.first())
                        .map(decode_wire);
                    let _ = result_tx.send(x);
                })
                .on_failure(|failure| tracing::error!(%failure, "code failed")),
        )?
        .wait()
        .await;
    if let Ok(Some(x)) = result_rx.await {
        tracing::info!(%x, "x");
    }

    // Console output, narrowed to the `console` field.
    client
        .session_output(
            &session,
            Callback::new().on_success(|reply: Reply<serde_json::Value>| {
                if let Some(console) = reply.brief() {
                    tracing::info!(%console, "console");
                }
            }),
        )?
        .wait()
        .await;

    client
        .close_session(
            &session,
            Callback::new()
                .on_failure(|failure| tracing::error!(%failure, "close failed"))
                .on_notify(|_| tracing::info!("session closed")),
        )?
        .wait()
        .await;

    Ok(())
}
