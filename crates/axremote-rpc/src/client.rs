/*!
Client transport - owns the daemon's process lifecycle.

Calls are synchronous request/response over TCP. A connection refused
against a loopback endpoint (and only a loopback endpoint) spawns the
daemon, blocks on a ready-channel with a fixed timeout, and retries the
original call exactly once; a second refusal is fatal. Dropping the
client signals termination to the daemon process it spawned - a daemon
it did not spawn is left untouched.
*/

use std::io::{BufRead, BufReader, Write};
use std::net::{IpAddr, TcpStream, ToSocketAddrs};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::{json, Value};

use axremote::{ObjectNode, WindowRecord};

use crate::error::ClientError;
use crate::proto::{self, codes, Request, Response};

/// How long the transport waits for a spawned daemon to become ready.
pub const DAEMON_READY_TIMEOUT: Duration = Duration::from_secs(15);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable naming the daemon executable to spawn.
pub const DAEMON_ENV: &str = "AXREMOTE_DAEMON";

/// Spawns the daemon process on demand.
///
/// Pluggable so tests can stand up an in-process daemon; the default
/// implementation execs the `axremoted` binary.
pub trait DaemonLauncher: Send + Sync {
  /// Start the daemon. Returns the child process when one was spawned
  /// (the transport signals it to terminate on drop).
  fn launch(&self) -> std::io::Result<Option<Child>>;
}

/// Default launcher: exec the daemon binary with the target endpoint in
/// its environment.
#[derive(Debug, Clone)]
pub struct ExecLauncher {
  program: String,
  host: String,
  port: u16,
}

impl ExecLauncher {
  /// Launcher for an endpoint; the program comes from `AXREMOTE_DAEMON`
  /// or defaults to `axremoted` on the PATH.
  pub fn new(host: &str, port: u16) -> Self {
    Self {
      program: std::env::var(DAEMON_ENV).unwrap_or_else(|_| "axremoted".to_string()),
      host: host.to_string(),
      port,
    }
  }
}

impl DaemonLauncher for ExecLauncher {
  fn launch(&self) -> std::io::Result<Option<Child>> {
    info!("spawning daemon: {} on {}:{}", self.program, self.host, self.port);
    let child = Command::new(&self.program)
      .env(proto::HOST_ENV, &self.host)
      .env(proto::PORT_ENV, self.port.to_string())
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .spawn()?;
    Ok(Some(child))
  }
}

/// Synchronous RPC client.
pub struct Client {
  host: String,
  port: u16,
  next_id: AtomicU64,
  ready_timeout: Duration,
  launcher: Box<dyn DaemonLauncher>,
  spawned: Mutex<Option<Child>>,
}

impl std::fmt::Debug for Client {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Client")
      .field("host", &self.host)
      .field("port", &self.port)
      .finish_non_exhaustive()
  }
}

impl Client {
  /// Client against the environment-configured endpoint.
  pub fn new() -> Self {
    let (host, port) = proto::endpoint_from_env();
    Self::connect_to(&host, port)
  }

  /// Client against an explicit endpoint with the default launcher.
  pub fn connect_to(host: &str, port: u16) -> Self {
    let launcher = ExecLauncher::new(host, port);
    Self::with_launcher(host, port, Box::new(launcher))
  }

  /// Client with a custom daemon launcher.
  pub fn with_launcher(host: &str, port: u16, launcher: Box<dyn DaemonLauncher>) -> Self {
    Self {
      host: host.to_string(),
      port,
      next_id: AtomicU64::new(1),
      ready_timeout: DAEMON_READY_TIMEOUT,
      launcher,
      spawned: Mutex::new(None),
    }
  }

  /// Override the daemon-ready handshake timeout.
  #[must_use]
  pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
    self.ready_timeout = timeout;
    self
  }

  /// Issue one call.
  ///
  /// State machine: dispatched, then success, remote fault, or
  /// connection refused. Only a refused loopback connection triggers the
  /// spawn-and-retry path, and only once.
  pub fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
    match self.call_once(method, &params) {
      Err(ClientError::Io(e))
        if e.kind() == std::io::ErrorKind::ConnectionRefused && self.is_loopback() =>
      {
        debug!("daemon endpoint refused; spawning");
        *self.spawned.lock() = self.launcher.launch()?;
        if !self.await_ready() {
          return Err(ClientError::DaemonUnavailable);
        }
        // Retry the original call exactly once.
        self.call_once(method, &params).map_err(|e| match e {
          ClientError::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
            ClientError::DaemonUnavailable
          }
          other => other,
        })
      }
      other => other,
    }
  }

  fn call_once(&self, method: &str, params: &[Value]) -> Result<Value, ClientError> {
    let mut stream = TcpStream::connect((self.host.as_str(), self.port))?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

    let request = Request {
      id: self.next_id.fetch_add(1, Ordering::SeqCst),
      method: method.to_string(),
      params: params.to_vec(),
    };
    let encoded = serde_json::to_string(&request)?;
    writeln!(stream, "{encoded}")?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let response: Response = serde_json::from_str(&line)?;
    if let Some(fault) = response.error {
      if fault.code == codes::EXECUTION_ERROR {
        return Err(ClientError::RemoteExecution(fault.message));
      }
      return Err(ClientError::Rpc {
        code: fault.code,
        message: fault.message,
      });
    }
    response.result.ok_or(ClientError::InvalidResponse)
  }

  /// Auto-spawn applies to loopback targets only, never a remote host.
  fn is_loopback(&self) -> bool {
    if self.host == "localhost" {
      return true;
    }
    if let Ok(ip) = self.host.parse::<IpAddr>() {
      return ip.is_loopback();
    }
    false
  }

  /// Block until the endpoint accepts a connection or the ready timeout
  /// elapses. A poller thread signals readiness over a channel; the
  /// receive-with-timeout replaces the original's signal/alarm race.
  fn await_ready(&self) -> bool {
    let (tx, rx) = crossbeam_channel::bounded::<()>(1);
    let host = self.host.clone();
    let port = self.port;
    let deadline = Instant::now() + self.ready_timeout;
    std::thread::spawn(move || {
      while Instant::now() < deadline {
        let connected = (host.as_str(), port)
          .to_socket_addrs()
          .ok()
          .and_then(|mut addrs| addrs.next())
          .and_then(|addr| TcpStream::connect_timeout(&addr, READY_POLL_INTERVAL).ok());
        if let Some(stream) = connected {
          drop(stream);
          drop(tx.send(()));
          return;
        }
        std::thread::sleep(READY_POLL_INTERVAL);
      }
    });
    rx.recv_timeout(self.ready_timeout).is_ok()
  }

  // === Typed convenience surface ===

  /// Liveness probe.
  pub fn alive(&self) -> bool {
    matches!(self.call("alive", vec![]), Ok(Value::Bool(true)))
  }

  /// Resolve a window by pattern.
  pub fn resolve_window(&self, pattern: &str, wait: bool) -> Result<WindowRecord, ClientError> {
    let value = self.call("resolve_window", vec![json!(pattern), json!(wait)])?;
    Ok(serde_json::from_value(value)?)
  }

  /// Resolve an object inside a window.
  pub fn resolve_object(
    &self,
    window: &str,
    object: &str,
    wait: bool,
  ) -> Result<ObjectNode, ClientError> {
    let value = self.call(
      "resolve_object",
      vec![json!(window), json!(object), json!(wait)],
    )?;
    Ok(serde_json::from_value(value)?)
  }

  /// All currently known windows.
  pub fn list_windows(&self) -> Result<Vec<WindowRecord>, ClientError> {
    let value = self.call("list_windows", vec![])?;
    Ok(serde_json::from_value(value)?)
  }

  /// All objects of a window, in traversal order.
  pub fn list_objects(&self, window: &str) -> Result<Vec<ObjectNode>, ClientError> {
    let value = self.call("list_objects", vec![json!(window)])?;
    Ok(serde_json::from_value(value)?)
  }

  /// Click an object.
  pub fn click(&self, window: &str, object: &str) -> Result<(), ClientError> {
    self.call("click", vec![json!(window), json!(object)])?;
    Ok(())
  }

  /// Does a window matching the pattern exist right now?
  pub fn window_exists(&self, window: &str) -> Result<bool, ClientError> {
    let value = self.call("window_exists", vec![json!(window)])?;
    Ok(value.as_bool().unwrap_or(false))
  }

  /// Does an object matching the pattern exist in the window?
  pub fn object_exists(&self, window: &str, object: &str) -> Result<bool, ClientError> {
    let value = self.call("object_exists", vec![json!(window), json!(object)])?;
    Ok(value.as_bool().unwrap_or(false))
  }

  /// Synthesize a key combo.
  pub fn generate_key_events(&self, combo: &str) -> Result<(), ClientError> {
    self.call("generate_key_events", vec![json!(combo)])?;
    Ok(())
  }
}

impl Default for Client {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for Client {
  /// Signal termination to the daemon this client spawned. A daemon the
  /// client merely connected to is left untouched.
  fn drop(&mut self) {
    if let Some(mut child) = self.spawned.lock().take() {
      if let Err(e) = child.kill() {
        warn!("failed to signal spawned daemon: {e}");
      }
      drop(child.wait());
    }
  }
}
