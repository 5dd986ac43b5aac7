// Inbound line sequencing: FIFO queue, single worker, one-in one-out.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::error::{RelayError, RelayResult};
use crate::proxy::protocol::{RpcError, RpcMessage, RpcResponse, RPC_INTERNAL_ERROR};
use crate::proxy::trace::CallTrace;
use crate::proxy::transport::Relay;

/// Drive the relay: enqueue inbound lines as they arrive, drain them with a
/// single worker, and write correlated responses in arrival order.
///
/// Returns once the input closes and every already-queued item has been
/// processed. Per-item failures become error responses (or are dropped when
/// no id can be salvaged) and never abort the queue.
pub async fn run<R, W>(relay: &mut Relay, input: R, output: &mut W) -> RelayResult<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Arrival only enqueues; draining happens on the worker below.
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(input).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    tracing::debug!(
                        "queued: {}...",
                        line.chars().take(60).collect::<String>()
                    );
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    // Single worker: at most one item in flight, strict FIFO output.
    while let Some(line) = rx.recv().await {
        if let Some(response) = process_line(relay, &line).await {
            let text = serde_json::to_string(&response)?;
            output.write_all(text.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
    }

    let _ = reader.await;
    tracing::info!("input closed, queue drained");
    Ok(())
}

/// Process one dequeued line; the returned response (if any) goes to the
/// caller. Notifications and uncorrelatable failures produce nothing.
async fn process_line(relay: &mut Relay, line: &str) -> Option<RpcResponse> {
    match serde_json::from_str::<RpcMessage>(line) {
        Ok(msg) => {
            let caller_id = msg.correlation_id();
            let method = msg.method;
            let mut trace = CallTrace::new();

            match relay.dispatch(&method, msg.params, &mut trace).await {
                Ok(Some(payload)) => caller_id.map(|id| correlate(id, payload)),
                Ok(None) => None,
                Err(err) => {
                    tracing::error!("relay error for {}: {}", method, err);
                    caller_id.map(|id| {
                        RpcResponse::error(
                            id,
                            RpcError::new(RPC_INTERNAL_ERROR, error_report(&err, &trace)),
                        )
                    })
                }
            }
        }
        Err(parse_err) => {
            let err = RelayError::Malformed(parse_err.to_string());
            tracing::warn!("{}", err);
            // Without an id there is nothing to correlate: drop the line.
            salvage_id(line)
                .map(|id| RpcResponse::error(id, RpcError::new(RPC_INTERNAL_ERROR, err.to_string())))
        }
    }
}

/// Re-correlate the decoded remote payload with the caller's id.
fn correlate(id: Value, payload: Value) -> RpcResponse {
    match payload.as_object() {
        Some(obj) if obj.contains_key("error") => {
            let code = obj["error"]["code"]
                .as_i64()
                .map(|c| c as i32)
                .unwrap_or(RPC_INTERNAL_ERROR);
            let message = obj["error"]["message"]
                .as_str()
                .unwrap_or("remote error")
                .to_string();
            RpcResponse::error(id, RpcError::new(code, message))
        }
        Some(obj) if obj.contains_key("result") => RpcResponse::ok(id, obj["result"].clone()),
        // Not an envelope: pass the payload through as the result
        _ => RpcResponse::ok(id, payload),
    }
}

fn error_report(err: &RelayError, trace: &CallTrace) -> String {
    if trace.is_empty() {
        err.to_string()
    } else {
        format!("{}\n\n--- debug trace ---\n{}", err, trace.report())
    }
}

/// An error response can only be emitted when an id survives in the raw text.
fn salvage_id(line: &str) -> Option<Value> {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("id").cloned())
        .filter(|v| !v.is_null())
}
