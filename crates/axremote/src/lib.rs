/*!
axremote - scriptable UI automation over the accessibility tree.

Exposes the on-screen accessibility hierarchy of running applications as
an addressable object space: a window and a control inside it are
addressed by short generated names (`frmPreferences`, `btnSave`) without
the caller ever touching raw platform handles.

```ignore
use axremote::{Session, backend};

let backend = std::sync::Arc::new(backend::macos::MacosBackend::new());
let session = Session::new(backend)?;

// Address a window and a control by generated name or glob
let window = session.resolve_window("Preferences*", true)?;
session.click(&window.name, "btn*Save")?;

// Synthesize input
session.generate_key_events("<command>s")?;
```

Generated names are deterministic within one traversal but NOT stable
across rebuilds; scripts re-resolve names per session rather than
persisting them.
*/

pub mod a11y;
pub mod backend;
pub mod input;
pub mod naming;
pub mod registry;
pub mod wait;

mod session;
mod types;

pub use session::Session;
pub use types::*;
