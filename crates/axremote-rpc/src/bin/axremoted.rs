//! The automation daemon binary.
//!
//! Binds the environment-configured endpoint (default loopback:4118),
//! serves RPC from a worker thread and keeps the main thread in the
//! notification run loop so accessibility observers fire.

#[cfg(target_os = "macos")]
fn main() {
  use std::net::TcpListener;
  use std::sync::Arc;

  use axremote::backend::macos::MacosBackend;
  use axremote::Session;
  use axremote_rpc::proto;
  use axremote_rpc::Daemon;

  env_logger::init();

  let backend = Arc::new(MacosBackend::new());
  let session = match Session::new(backend) {
    Ok(session) => session,
    Err(e) => {
      eprintln!("axremoted: {e}");
      std::process::exit(1);
    }
  };

  let (host, port) = proto::endpoint_from_env();
  let listener = match TcpListener::bind((host.as_str(), port)) {
    Ok(listener) => listener,
    Err(e) => {
      eprintln!("axremoted: failed to bind {host}:{port}: {e}");
      std::process::exit(1);
    }
  };

  let daemon = Daemon::new(session);
  std::thread::spawn(move || daemon.serve(listener));

  // Blocks forever servicing accessibility notification callbacks.
  MacosBackend::run_notification_loop();
}

#[cfg(not(target_os = "macos"))]
fn main() {
  eprintln!("axremoted requires the macOS accessibility stack");
  std::process::exit(1);
}
