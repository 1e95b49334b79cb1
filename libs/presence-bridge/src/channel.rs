//! Request/response channel to the native persona backend
//!
//! Each call is one newline-delimited JSON request answered by one JSON
//! response line on the backend's Unix socket. The connection is opened
//! lazily and dropped after any transport error so the next call reconnects.

use async_trait::async_trait;
use presence_core::{PresenceError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Command names understood by the native backend
pub mod commands {
    pub const INITIALIZE: &str = "persona_initialize";
    pub const GET_STATE: &str = "persona_get_state";
    pub const UPDATE: &str = "persona_update";
    pub const REACT: &str = "persona_react";
    pub const RESET: &str = "persona_reset";
    pub const GET_MULTIPLIERS: &str = "persona_get_multipliers";
}

/// One command invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Correlation ID
    pub id: Uuid,
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, args: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.into(),
            args,
        }
    }
}

/// Backend reply to a [`CommandRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub request_id: Uuid,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl CommandResponse {
    pub fn success(request_id: Uuid, data: Value) -> Self {
        Self {
            request_id,
            success: true,
            error: None,
            data,
        }
    }

    pub fn error(request_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            error: Some(message.into()),
            data: Value::Null,
        }
    }
}

/// Black-box command surface of the native backend
#[async_trait]
pub trait PersonaChannel: Send + Sync {
    /// Invoke `command` with named `args`, returning the raw reply payload
    async fn invoke(&self, command: &str, args: Value) -> Result<Value>;
}

/// [`PersonaChannel`] over the backend's Unix socket
pub struct SocketChannel {
    socket_path: PathBuf,
    timeout: Duration,
    stream: Mutex<Option<BufReader<UnixStream>>>,
}

impl SocketChannel {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
            stream: Mutex::new(None),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn connect(&self) -> Result<BufReader<UnixStream>> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PresenceError::Unavailable(format!("{:?}", self.socket_path))
            } else {
                PresenceError::Channel(format!(
                    "Failed to connect to {:?}: {}",
                    self.socket_path, e
                ))
            }
        })?;

        debug!("Connected to persona backend at {:?}", self.socket_path);
        Ok(BufReader::new(stream))
    }

    async fn roundtrip(
        stream: &mut BufReader<UnixStream>,
        request: &CommandRequest,
    ) -> Result<CommandResponse> {
        let request_json = serde_json::to_string(request)
            .map_err(|e| PresenceError::Channel(e.to_string()))?;

        stream.get_mut().write_all(request_json.as_bytes()).await?;
        stream.get_mut().write_all(b"\n").await?;
        stream.get_mut().flush().await?;

        let mut line = String::new();
        if stream.read_line(&mut line).await? == 0 {
            return Err(PresenceError::Channel("Connection closed by backend".into()));
        }

        serde_json::from_str(&line)
            .map_err(|e| PresenceError::Channel(format!("Invalid response frame: {}", e)))
    }
}

#[async_trait]
impl PersonaChannel for SocketChannel {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value> {
        let request = CommandRequest::new(command, args);
        let mut guard = self.stream.lock().await;

        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        let stream = guard
            .as_mut()
            .ok_or_else(|| PresenceError::Unavailable(format!("{:?}", self.socket_path)))?;

        let response = match tokio::time::timeout(self.timeout, Self::roundtrip(stream, &request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                *guard = None;
                return Err(e);
            }
            Err(_) => {
                *guard = None;
                return Err(PresenceError::Timeout(command.to_string()));
            }
        };

        if response.request_id != request.id {
            *guard = None;
            return Err(PresenceError::Channel(format!(
                "Response for {} does not match request {}",
                response.request_id, request.id
            )));
        }

        if response.success {
            Ok(response.data)
        } else {
            Err(PresenceError::Channel(
                response.error.unwrap_or_else(|| format!("{} failed", command)),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::UnixListener;

    /// Serve one connection, answering each request with `reply(request)`
    fn serve<F>(listener: UnixListener, reply: F) -> tokio::task::JoinHandle<()>
    where
        F: Fn(CommandRequest) -> Option<CommandResponse> + Send + 'static,
    {
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            while reader.read_line(&mut line).await.unwrap() > 0 {
                let request: CommandRequest = serde_json::from_str(&line).unwrap();
                match reply(request) {
                    Some(response) => {
                        let json = serde_json::to_string(&response).unwrap();
                        writer.write_all(json.as_bytes()).await.unwrap();
                        writer.write_all(b"\n").await.unwrap();
                    }
                    None => tokio::time::sleep(Duration::from_secs(60)).await,
                }
                line.clear();
            }
        })
    }

    #[tokio::test]
    async fn test_invoke_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("persona.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        let _server = serve(listener, |request| {
            assert_eq!(request.command, commands::REACT);
            assert_eq!(request.args["reactionType"], "error");
            Some(CommandResponse::success(request.id, json!({ "ok": true })))
        });

        let channel = SocketChannel::new(&socket, Duration::from_secs(1));
        let data = channel
            .invoke(commands::REACT, json!({ "reactionType": "error" }))
            .await
            .unwrap();
        assert_eq!(data["ok"], true);

        // Connection is reused for the next call
        let data = channel
            .invoke(commands::REACT, json!({ "reactionType": "error" }))
            .await
            .unwrap();
        assert_eq!(data["ok"], true);
    }

    #[tokio::test]
    async fn test_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("persona.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        let _server = serve(listener, |request| {
            Some(CommandResponse::error(request.id, "engine not initialized"))
        });

        let channel = SocketChannel::new(&socket, Duration::from_secs(1));
        let err = channel
            .invoke(commands::GET_STATE, Value::Null)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("engine not initialized"));
    }

    #[tokio::test]
    async fn test_missing_socket_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let channel = SocketChannel::new(dir.path().join("absent.sock"), Duration::from_secs(1));

        let err = channel
            .invoke(commands::INITIALIZE, Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::Unavailable(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_silent_backend_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("persona.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        let _server = serve(listener, |_| None);

        let channel = SocketChannel::new(&socket, Duration::from_millis(50));
        let err = channel
            .invoke(commands::GET_STATE, Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, PresenceError::Timeout(_)));
    }
}
