/*!
Daemon: TCP accept loop and method dispatch.

Connections are served one at a time and each connection's calls are
dispatched strictly in order - a single-writer path into the session's
caches. Requests and responses are newline-delimited JSON.
*/

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::{json, Value};

use axremote::a11y::{Action, Notification, Role, Value as AxValue};
use axremote::backend::Backend;
use axremote::input::MouseButton;
use axremote::{AxRemoteResult, Session, Timeouts};

use crate::proto::{codes, Fault, Request, Response};

/// The automation daemon: dispatches RPC calls against one session.
pub struct Daemon<B: Backend> {
  session: Session<B>,
}

impl<B: Backend> std::fmt::Debug for Daemon<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Daemon").finish_non_exhaustive()
  }
}

impl<B: Backend> Daemon<B> {
  /// Wrap a session for serving.
  pub const fn new(session: Session<B>) -> Self {
    Self { session }
  }

  /// Accept and serve connections forever.
  pub fn serve(&self, listener: TcpListener) {
    if let Ok(addr) = listener.local_addr() {
      info!("axremote daemon listening on {addr}");
    }
    for stream in listener.incoming() {
      match stream {
        Ok(stream) => {
          if let Err(e) = self.handle_connection(stream) {
            debug!("connection ended: {e}");
          }
        }
        Err(e) => warn!("accept failed: {e}"),
      }
    }
  }

  fn handle_connection(&self, stream: TcpStream) -> std::io::Result<()> {
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      let response = self.handle_line(&line);
      let encoded = serde_json::to_string(&response)
        .unwrap_or_else(|e| format!(r#"{{"id":0,"error":{{"code":{},"message":"{e}"}}}}"#, codes::PARSE_ERROR));
      writeln!(writer, "{encoded}")?;
      writer.flush()?;
    }
    Ok(())
  }

  fn handle_line(&self, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
      Ok(request) => request,
      Err(e) => return Response::fault(0, codes::PARSE_ERROR, e.to_string()),
    };
    let id = request.id;
    debug!("dispatch {} ({} args)", request.method, request.params.len());
    match self.dispatch(&request.method, &request.params) {
      Ok(result) => Response::ok(id, result),
      Err(fault) => Response::fault(id, fault.code, fault.message),
    }
  }

  #[allow(clippy::too_many_lines)]
  fn dispatch(&self, method: &str, params: &[Value]) -> Result<Value, Fault> {
    let session = &self.session;
    match method {
      "alive" => Ok(json!(true)),

      "resolve_window" => {
        let pattern: String = arg(params, 0)?;
        let wait = opt_arg(params, 1)?.unwrap_or(true);
        to_json(session.resolve_window(&pattern, wait))
      }

      "resolve_object" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        let wait = opt_arg(params, 2)?.unwrap_or(true);
        let role: Option<Role> = opt_arg(params, 3)?;
        match role {
          Some(role) => to_json(session.resolve_object_of_role(&window, &object, role, wait)),
          None => to_json(session.resolve_object(&window, &object, wait)),
        }
      }

      "list_windows" => Ok(json!(session.list_windows())),

      "list_objects" => {
        let window: String = arg(params, 0)?;
        to_json(session.list_objects(&window))
      }

      "children_of" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        to_json(session.children_of(&window, &object))
      }

      "remap" => {
        let window: String = arg(params, 0)?;
        to_json(session.remap(&window))
      }

      "set_timeouts" => {
        let window_secs: u64 = arg(params, 0)?;
        let object_secs: u64 = arg(params, 1)?;
        session.set_timeouts(
          Timeouts::default()
            .with_window_wait_secs(window_secs)
            .with_object_wait_secs(object_secs),
        );
        Ok(Value::Null)
      }

      "click" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        to_json(session.click(&window, &object))
      }

      "perform_action" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        let action: Action = arg(params, 2)?;
        to_json(session.perform_action(&window, &object, action))
      }

      "get_value" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        to_json(session.get_value(&window, &object))
      }

      "set_value" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        let value: AxValue = arg(params, 2)?;
        to_json(session.set_value(&window, &object, &value))
      }

      "window_exists" => {
        let window: String = arg(params, 0)?;
        to_json(session.window_exists(&window))
      }

      "object_exists" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        to_json(session.object_exists(&window, &object))
      }

      "verify_enabled" => {
        let window: String = arg(params, 0)?;
        let object: String = arg(params, 1)?;
        to_json(session.verify_enabled(&window, &object))
      }

      "generate_key_events" => {
        let combo: String = arg(params, 0)?;
        to_json(session.generate_key_events(&combo))
      }

      "press_modifiers" => {
        let names: Vec<String> = arg(params, 0)?;
        to_json(session.press_modifiers(&names))
      }

      "release_modifiers" => {
        let names: Vec<String> = arg(params, 0)?;
        to_json(session.release_modifiers(&names))
      }

      "mouse_click" | "mouse_double_click" => {
        let x: f64 = arg(params, 0)?;
        let y: f64 = arg(params, 1)?;
        let button = mouse_button(params, 2)?;
        if method == "mouse_click" {
          to_json(session.mouse_click(x, y, button))
        } else {
          to_json(session.mouse_double_click(x, y, button))
        }
      }

      "mouse_drag" => {
        let x1: f64 = arg(params, 0)?;
        let y1: f64 = arg(params, 1)?;
        let x2: f64 = arg(params, 2)?;
        let y2: f64 = arg(params, 3)?;
        to_json(session.mouse_drag((x1, y1), (x2, y2)))
      }

      "wait_for_notification" => {
        let window: String = arg(params, 0)?;
        let kind: String = arg(params, 1)?;
        let element: String = arg(params, 2)?;
        let timeout_secs: f64 = arg(params, 3)?;
        let kind = Notification::parse(&kind).ok_or_else(|| Fault {
          code: codes::INVALID_PARAMS,
          message: format!("unknown notification kind {kind:?}"),
        })?;
        to_json(session.wait_for_notification(
          &window,
          kind,
          &element,
          Duration::from_secs_f64(timeout_secs),
        ))
      }

      other => Err(Fault {
        code: codes::METHOD_NOT_FOUND,
        message: format!("no such method {other:?}"),
      }),
    }
  }
}

/// Decode one required positional argument.
fn arg<T: serde::de::DeserializeOwned>(params: &[Value], idx: usize) -> Result<T, Fault> {
  let value = params.get(idx).ok_or_else(|| Fault {
    code: codes::INVALID_PARAMS,
    message: format!("missing argument {idx}"),
  })?;
  serde_json::from_value(value.clone()).map_err(|e| Fault {
    code: codes::INVALID_PARAMS,
    message: format!("argument {idx}: {e}"),
  })
}

/// Decode one optional positional argument.
fn opt_arg<T: serde::de::DeserializeOwned>(
  params: &[Value],
  idx: usize,
) -> Result<Option<T>, Fault> {
  match params.get(idx) {
    None | Some(Value::Null) => Ok(None),
    Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| Fault {
      code: codes::INVALID_PARAMS,
      message: format!("argument {idx}: {e}"),
    }),
  }
}

fn mouse_button(params: &[Value], idx: usize) -> Result<MouseButton, Fault> {
  let name: Option<String> = opt_arg(params, idx)?;
  match name.as_deref() {
    None | Some("left") => Ok(MouseButton::Left),
    Some("right") => Ok(MouseButton::Right),
    Some(other) => Err(Fault {
      code: codes::INVALID_PARAMS,
      message: format!("unknown mouse button {other:?}"),
    }),
  }
}

/// Serialize an engine result, folding failures into the reserved
/// application-level execution error code.
fn to_json<T: serde::Serialize>(result: AxRemoteResult<T>) -> Result<Value, Fault> {
  match result {
    Ok(value) => serde_json::to_value(value).map_err(|e| Fault {
      code: codes::INVALID_REQUEST,
      message: e.to_string(),
    }),
    Err(e) => Err(Fault {
      code: codes::EXECUTION_ERROR,
      message: e.to_string(),
    }),
  }
}
