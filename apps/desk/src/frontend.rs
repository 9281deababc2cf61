//! # Line Front End
//!
//! One JSON request per input line, one JSON reply per output line.
//!
//! ```text
//! stdin  ─► {"seq": 7, "command": "lowStock"}
//! stdout ◄─ {"seq":7,"ok":true,"data":[...]}
//!
//! stdin  ─► {"seq": 8, "command":
//! stdout ◄─ {"seq":null,"ok":false,"error":{"code":"VALIDATION_ERROR",...}}
//! ```
//!
//! `seq` is optional and echoed back untouched. Logging goes to stderr so it
//! never interleaves with replies.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::commands::{Command, CommandBus};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    seq: Option<Value>,
    #[serde(flatten)]
    command: Command,
}

/// One reply line.
#[derive(Debug, Serialize)]
pub struct Reply {
    pub seq: Option<Value>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Reply {
    fn new(seq: Option<Value>, result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(data) => Reply {
                seq,
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Reply {
                seq,
                ok: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

/// Serves requests until the input ends or `shutdown` resolves.
pub async fn serve<R, W, S>(
    bus: &CommandBus,
    reader: R,
    writer: &mut W,
    shutdown: S,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let reply = handle_line(bus, &line).await;
                let mut encoded = serde_json::to_vec(&reply)?;
                encoded.push(b'\n');
                writer.write_all(&encoded).await?;
                writer.flush().await?;
            }
        }
    }

    Ok(())
}

async fn handle_line(bus: &CommandBus, line: &str) -> Reply {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Unreadable request");
            return Reply::new(
                None,
                Err(ApiError::validation(format!("Invalid request: {}", e))),
            );
        }
    };

    debug!(command = request.command.name(), "Request received");
    let result = bus.send(request.command).await;
    Reply::new(request.seq, result)
}
