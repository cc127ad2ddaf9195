/*! Client-side error types. */

use thiserror::Error;

/// Errors surfaced by the client transport.
#[derive(Error, Debug)]
pub enum ClientError {
  /// Connection-level failure.
  #[error("Failed to connect to daemon: {0}")]
  Io(#[from] std::io::Error),

  /// Request/response encoding failure.
  #[error("Failed to encode request: {0}")]
  Json(#[from] serde_json::Error),

  /// Protocol/transport fault reported by the daemon (any code other
  /// than the reserved execution-error code).
  #[error("RPC fault ({code}): {message}")]
  Rpc {
    /// Numeric fault code.
    code: i32,
    /// Daemon-supplied message.
    message: String,
  },

  /// The daemon executed the call and it failed at the application
  /// level; carries the remote message.
  #[error("Remote execution error: {0}")]
  RemoteExecution(String),

  /// The endpoint refused the connection and the one permitted
  /// spawn-and-retry was exhausted.
  #[error("Daemon unreachable after spawn and retry")]
  DaemonUnavailable,

  /// The daemon answered with something that is not a response.
  #[error("Invalid response from daemon")]
  InvalidResponse,
}
