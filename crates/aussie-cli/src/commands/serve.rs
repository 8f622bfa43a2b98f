//! `aussie serve` - the bridge over newline-delimited JSON on stdio.
//!
//! Each input line is either a bare bridge request, taken to come from the
//! configured origin, or a message envelope naming its origin:
//!
//! ```json
//! {"origin": "http://localhost", "data": {"source": "web-os", "id": 1, "action": "windows.list"}}
//! ```
//!
//! Each addressed request produces exactly one response line. Requests are
//! handled concurrently, so responses may arrive out of order; match them
//! by `id`.

use anyhow::Result;
use aussie_kernel::Bridge;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::boot::Runtime;

/// Run the bridge until stdin closes or Ctrl-C.
///
/// # Errors
///
/// Fails if stdin/stdout break or the final flush fails.
pub(crate) async fn run_serve(rt: Runtime, origin: String, start_scheduler: bool) -> Result<()> {
    let bridge = Bridge::new(rt.kernel.clone(), origin);
    let ticker = start_scheduler.then(|| rt.scheduler.start());
    info!(origin = %bridge.origin(), scheduler = start_scheduler, "Serving bridge on stdio");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                warn!("stdout closed, dropping responses");
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                let bridge = bridge.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(response) = handle_line(&bridge, &line).await {
                        deliver(&tx, response);
                    }
                });
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            },
        }
    }

    if let Some(ticker) = ticker {
        ticker.stop();
    }
    drop(tx);
    // In-flight requests still hold senders; the writer ends when they finish.
    let _ = writer.await;
    rt.shutdown().await?;
    info!("Bridge stopped");
    Ok(())
}

/// Queue a response for stdout. Returns `false` once the writer is gone.
fn deliver(tx: &mpsc::UnboundedSender<String>, response: String) -> bool {
    match tx.send(response) {
        Ok(()) => true,
        Err(mpsc::error::SendError(lost)) => {
            debug!(bytes = lost.len(), "Writer gone, response dropped");
            false
        },
    }
}

/// Answer one input line. `None` for blank, unparseable, or unaddressed
/// lines.
pub(crate) async fn handle_line(bridge: &Bridge, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Ignoring line that is not JSON");
            return None;
        },
    };

    let (origin, message) = match (value.get("origin").and_then(Value::as_str), value.get("data")) {
        (Some(origin), Some(data)) => (origin.to_owned(), data.clone()),
        _ => (bridge.origin().to_owned(), value),
    };

    let response = bridge.handle(&origin, &message).await?;
    match serde_json::to_string(&response) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "Failed to encode bridge response");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use aussie_config::Config;

    use super::*;
    use crate::boot::boot;

    async fn bridge() -> Bridge {
        let mut cfg = Config::default();
        cfg.storage.backend = "memory".to_owned();
        let rt = boot(&cfg).await.unwrap();
        Bridge::new(rt.kernel, "http://localhost")
    }

    #[tokio::test]
    async fn test_bare_request_uses_own_origin() {
        let bridge = bridge().await;
        let line = r#"{"source":"web-os","id":1,"action":"fs.write","payload":{"path":"/a.txt","content":"hi"}}"#;
        let out: Value = serde_json::from_str(&handle_line(&bridge, line).await.unwrap()).unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["source"], "aussie-kernel");

        let line = r#"{"source":"web-os","id":2,"action":"fs.read","payload":{"path":"/a.txt"}}"#;
        let out: Value = serde_json::from_str(&handle_line(&bridge, line).await.unwrap()).unwrap();
        assert_eq!(out["result"], "hi");
    }

    #[tokio::test]
    async fn test_envelope_origin_is_checked() {
        let bridge = bridge().await;
        let foreign = r#"{"origin":"https://evil.example","data":{"source":"web-os","id":1,"action":"windows.list"}}"#;
        assert!(handle_line(&bridge, foreign).await.is_none());

        let own = r#"{"origin":"http://localhost","data":{"source":"web-os","id":1,"action":"windows.list"}}"#;
        let out: Value = serde_json::from_str(&handle_line(&bridge, own).await.unwrap()).unwrap();
        assert_eq!(out["result"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_deliver_reports_closed_writer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(deliver(&tx, "first".to_owned()));
        assert_eq!(rx.recv().await.as_deref(), Some("first"));

        drop(rx);
        assert!(!deliver(&tx, "second".to_owned()));
    }

    #[tokio::test]
    async fn test_noise_is_ignored() {
        let bridge = bridge().await;
        assert!(handle_line(&bridge, "   ").await.is_none());
        assert!(handle_line(&bridge, "not json").await.is_none());
        assert!(handle_line(&bridge, r#"{"source":"other"}"#).await.is_none());
    }
}
