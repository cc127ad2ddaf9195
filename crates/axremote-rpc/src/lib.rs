/*!
axremote-rpc - wire protocol, daemon and client transport for axremote.

The daemon ([`Daemon`]) serves the automation session over a synchronous
newline-delimited JSON protocol on a loopback TCP endpoint. The client
([`Client`]) issues calls, auto-spawns the daemon on first connection
failure, and re-raises remote application failures as
[`ClientError::RemoteExecution`].

```ignore
use axremote_rpc::Client;

let client = Client::new(); // spawns axremoted on demand
let window = client.resolve_window("Preferences*", true)?;
client.click(&window.name, "btn*Save")?;
```
*/

mod client;
mod error;
mod server;

pub mod proto;

pub use client::{Client, DaemonLauncher, ExecLauncher, DAEMON_ENV, DAEMON_READY_TIMEOUT};
pub use error::ClientError;
pub use server::Daemon;
