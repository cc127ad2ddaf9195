/*! Window records - pure data snapshots of resolved top-level windows. */

use serde::{Deserialize, Serialize};

use super::ProcessId;

/// A resolved top-level window.
///
/// Created only when the window registry is rebuilt by enumerating all
/// running applications; replaced wholesale on the next rebuild, never
/// mutated in place. The generated `name` is deterministic within one
/// rebuild but NOT stable across rebuilds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
  /// Generated name, e.g. `frmPreferencesGeneral`.
  pub name: String,
  /// The window title exactly as the application reports it.
  pub raw_title: String,
  /// Name of the owning application.
  pub app_name: String,
  /// Process ID of the owning application.
  pub pid: ProcessId,
}
