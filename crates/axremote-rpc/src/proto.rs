/*!
Wire protocol: synchronous call/response pairs, one call per round trip.

Requests are newline-delimited JSON addressed by method name with a flat
positional argument list. Error responses carry a numeric code and
message; [`codes::EXECUTION_ERROR`] is the one reserved code meaning
"application-level execution error" - everything else is a
protocol/transport fault.
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default daemon host. The auto-spawn path only ever applies to a
/// loopback target.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default daemon port.
pub const DEFAULT_PORT: u16 = 4118;

/// Environment variable overriding the daemon host.
pub const HOST_ENV: &str = "AXREMOTE_HOST";

/// Environment variable overriding the daemon port.
pub const PORT_ENV: &str = "AXREMOTE_PORT";

/// Daemon endpoint from the environment, falling back to the defaults.
pub fn endpoint_from_env() -> (String, u16) {
  let host = std::env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
  let port = std::env::var(PORT_ENV)
    .ok()
    .and_then(|p| p.parse().ok())
    .unwrap_or(DEFAULT_PORT);
  (host, port)
}

/// Numeric fault codes.
pub mod codes {
  /// Request line was not valid JSON.
  pub const PARSE_ERROR: i32 = -32700;
  /// Request shape was wrong (missing method, non-array params).
  pub const INVALID_REQUEST: i32 = -32600;
  /// No such method.
  pub const METHOD_NOT_FOUND: i32 = -32601;
  /// Positional arguments did not decode.
  pub const INVALID_PARAMS: i32 = -32602;
  /// Reserved: the daemon executed the call and it failed at the
  /// application level. Re-raised client-side as `RemoteExecution`.
  pub const EXECUTION_ERROR: i32 = -32000;
}

/// One call.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
  /// Caller-chosen correlation id, echoed in the response.
  pub id: u64,
  /// Method name.
  pub method: String,
  /// Flat positional argument list.
  #[serde(default)]
  pub params: Vec<Value>,
}

/// One response: exactly one of `result`/`error` is present.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
  /// Correlation id echoed from the request.
  pub id: u64,
  /// Successful result.
  #[serde(skip_serializing_if = "Option::is_none", default, deserialize_with = "deserialize_present")]
  pub result: Option<Value>,
  /// Fault.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<Fault>,
}

/// An error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fault {
  /// Numeric code (see [`codes`]).
  pub code: i32,
  /// Human-readable message.
  pub message: String,
}

/// Deserialize a field that is present into `Some`, preserving an explicit
/// JSON `null` as `Some(Value::Null)` rather than collapsing it to `None`.
/// A `null` result (a void method's success) must stay distinct from an
/// absent result (a fault response).
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Value::deserialize(deserializer).map(Some)
}

impl Response {
  /// Successful response.
  pub const fn ok(id: u64, result: Value) -> Self {
    Self {
      id,
      result: Some(result),
      error: None,
    }
  }

  /// Fault response.
  pub fn fault(id: u64, code: i32, message: impl Into<String>) -> Self {
    Self {
      id,
      result: None,
      error: Some(Fault {
        code,
        message: message.into(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_round_trips_with_positional_params() {
    let req = Request {
      id: 7,
      method: "resolve_object".to_string(),
      params: vec!["Preferences*".into(), "btn*Save".into()],
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains(r#""method":"resolve_object""#));
    assert!(json.contains(r#""params":["Preferences*","btn*Save"]"#));
    let back: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(back.params.len(), 2);
  }

  #[test]
  fn params_default_to_empty() {
    let req: Request = serde_json::from_str(r#"{"id":1,"method":"alive"}"#).unwrap();
    assert!(req.params.is_empty());
  }

  #[test]
  fn fault_responses_omit_result() {
    let resp = Response::fault(3, codes::METHOD_NOT_FOUND, "no such method");
    let json = serde_json::to_string(&resp).unwrap();
    assert!(!json.contains("result"));
    let back: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(back.error.unwrap().code, codes::METHOD_NOT_FOUND);
  }

  #[test]
  fn env_defaults_are_loopback() {
    assert_eq!(DEFAULT_HOST, "127.0.0.1");
    assert_eq!(DEFAULT_PORT, 4118);
  }
}
