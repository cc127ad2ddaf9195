//! Client/daemon integration: wire round trips, fault mapping, and the
//! auto-spawn handshake, all against an in-process daemon over a fake
//! accessibility tree.

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;

use axremote::a11y::{Action, Role};
use axremote::backend::fake::FakeBackend;
use axremote::{Session, Timeouts};
use axremote_rpc::{Client, ClientError, Daemon, DaemonLauncher};

fn fixture_backend() -> Arc<FakeBackend> {
  let backend = Arc::new(FakeBackend::new());
  backend.add_app("Editor", 10);
  let win = backend.add_window("Editor", "Preferences — General");
  backend.add_child(&win, Role::Button, Some("Save"));
  backend.add_child(&win, Role::TextField, Some("Name"));
  let frozen = backend.add_child(&win, Role::Button, Some("Frozen"));
  backend.set_node_enabled(&frozen, false);
  backend
}

fn fast_session(backend: &Arc<FakeBackend>) -> Session<FakeBackend> {
  let session = Session::new(Arc::clone(backend)).expect("fake backend always permitted");
  session.set_timeouts(Timeouts {
    window_wait: Duration::from_millis(100),
    object_wait: Duration::from_millis(100),
    poll_interval: Duration::from_millis(10),
  });
  session
}

/// Serve a daemon over `backend` on an ephemeral port; returns the port.
fn start_daemon(backend: &Arc<FakeBackend>) -> u16 {
  let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral");
  let port = listener.local_addr().expect("local addr").port();
  let daemon = Daemon::new(fast_session(backend));
  thread::spawn(move || daemon.serve(listener));
  port
}

/// A port that was free a moment ago.
fn free_port() -> u16 {
  TcpListener::bind("127.0.0.1:0")
    .expect("bind ephemeral")
    .local_addr()
    .expect("local addr")
    .port()
}

/// Launcher that never starts anything.
struct NoopLauncher;

impl DaemonLauncher for NoopLauncher {
  fn launch(&self) -> std::io::Result<Option<std::process::Child>> {
    Ok(None)
  }
}

/// Launcher that brings up an in-process daemon after a delay, the way a
/// spawned process would.
struct ThreadLauncher {
  port: u16,
  backend: Arc<FakeBackend>,
  delay: Duration,
}

impl DaemonLauncher for ThreadLauncher {
  fn launch(&self) -> std::io::Result<Option<std::process::Child>> {
    let port = self.port;
    let backend = Arc::clone(&self.backend);
    let delay = self.delay;
    thread::spawn(move || {
      thread::sleep(delay);
      let listener = TcpListener::bind(("127.0.0.1", port)).expect("bind reserved port");
      let daemon = Daemon::new(fast_session(&backend));
      daemon.serve(listener);
    });
    Ok(None)
  }
}

#[test]
fn resolve_and_click_end_to_end() {
  let backend = fixture_backend();
  let port = start_daemon(&backend);
  let client = Client::connect_to("127.0.0.1", port);

  assert!(client.alive());

  let window = client.resolve_window("Preferences*", true).unwrap();
  assert_eq!(window.raw_title, "Preferences — General");
  assert_eq!(window.app_name, "Editor");

  let object = client.resolve_object(&window.name, "btn*Save", true).unwrap();
  assert_eq!(object.name, "btnSave");

  client.click(&window.name, "btnSave").unwrap();
  assert_eq!(backend.performed(), vec![(Role::Button, Action::Press)]);

  assert!(client.window_exists("Preferences*").unwrap());
  assert!(!client.window_exists("frmNowhere").unwrap());
  assert!(client.object_exists(&window.name, "txtName").unwrap());
}

#[test]
fn list_objects_returns_traversal_order() {
  let backend = fixture_backend();
  let port = start_daemon(&backend);
  let client = Client::connect_to("127.0.0.1", port);

  let objects = client.list_objects("Preferences*").unwrap();
  // Window root first, then its children in platform order.
  assert_eq!(objects[0].role, Role::Window);
  let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
  assert!(names.contains(&"btnSave"));
  assert!(names.contains(&"txtName"));
}

#[test]
fn engine_failures_surface_as_remote_execution_errors() {
  let backend = fixture_backend();
  let port = start_daemon(&backend);
  let client = Client::connect_to("127.0.0.1", port);

  // Lookup timeout -> NotFound on the daemon side -> reserved code.
  let err = client.click("Preferences*", "btnNope").unwrap_err();
  assert!(matches!(err, ClientError::RemoteExecution(_)));

  // Disabled control fails fast remotely, same channel.
  let err = client.click("Preferences*", "btnFrozen").unwrap_err();
  let ClientError::RemoteExecution(message) = err else {
    panic!("expected RemoteExecution");
  };
  assert!(message.contains("disabled"), "unexpected message: {message}");
}

#[test]
fn protocol_faults_are_not_execution_errors() {
  let backend = fixture_backend();
  let port = start_daemon(&backend);
  let client = Client::connect_to("127.0.0.1", port);

  let err = client.call("warp_reality", vec![]).unwrap_err();
  assert!(matches!(err, ClientError::Rpc { code: -32601, .. }));

  let err = client.call("resolve_window", vec![json!(42)]).unwrap_err();
  assert!(matches!(err, ClientError::Rpc { code: -32602, .. }));
}

#[test]
fn key_events_synthesize_through_the_wire() {
  let backend = fixture_backend();
  let port = start_daemon(&backend);
  let client = Client::connect_to("127.0.0.1", port);

  client.generate_key_events("<command>s").unwrap();
  assert_eq!(backend.posted().len(), 4);

  let err = client.generate_key_events("<warpdrive>").unwrap_err();
  assert!(matches!(err, ClientError::RemoteExecution(_)));
}

#[test]
fn auto_spawn_completes_the_original_call() {
  let backend = fixture_backend();
  let port = free_port();
  let client = Client::with_launcher(
    "127.0.0.1",
    port,
    Box::new(ThreadLauncher {
      port,
      backend: Arc::clone(&backend),
      delay: Duration::from_millis(150),
    }),
  )
  .with_ready_timeout(Duration::from_secs(5));

  // First connect is refused; the spawned daemon comes up within the
  // handshake window and the retried call succeeds.
  let window = client.resolve_window("Preferences*", true).unwrap();
  assert_eq!(window.raw_title, "Preferences — General");
}

#[test]
fn unreachable_daemon_fails_after_the_single_retry() {
  let port = free_port();
  let client = Client::with_launcher("127.0.0.1", port, Box::new(NoopLauncher))
    .with_ready_timeout(Duration::from_millis(200));

  let err = client.resolve_window("Preferences*", true).unwrap_err();
  assert!(matches!(err, ClientError::DaemonUnavailable));
}

/// Launcher that records whether it was ever invoked.
struct RecordingLauncher(Arc<std::sync::atomic::AtomicBool>);

impl DaemonLauncher for RecordingLauncher {
  fn launch(&self) -> std::io::Result<Option<std::process::Child>> {
    self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    Ok(None)
  }
}

#[test]
fn unreachable_remote_host_does_not_spawn() {
  // A non-loopback target must never trigger the spawn path.
  let launched = Arc::new(std::sync::atomic::AtomicBool::new(false));
  let client = Client::with_launcher(
    "axremote-daemon.invalid",
    9,
    Box::new(RecordingLauncher(Arc::clone(&launched))),
  )
  .with_ready_timeout(Duration::from_millis(100));

  let err = client.call("alive", vec![]).unwrap_err();
  assert!(matches!(err, ClientError::Io(_)));
  assert!(!launched.load(std::sync::atomic::Ordering::SeqCst));
}
