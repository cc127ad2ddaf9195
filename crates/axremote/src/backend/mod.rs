/*!
Platform abstraction for the native accessibility layer.

These traits define the contract between core code and the host OS
assistive-technology interface: per-element attribute get/set, child
enumeration, action dispatch, change-notification registration and
hardware event posting. Core code only uses these traits - never
platform-specific types directly.

Every call is treated as capable of failing with [`BackendError::Stale`]
(the backing control was destroyed) or [`BackendError::Unsupported`]
(the element does not offer the attribute/action); the core never
assumes success.
*/

use crossbeam_channel::Sender;

use crate::a11y::{Action, Notification, Role, Value};
use crate::input::{KeyEvent, MouseEvent};
use crate::types::ProcessId;

#[cfg(any(test, feature = "fake-backend"))]
pub mod fake;

#[cfg(target_os = "macos")]
pub mod macos;

/// Errors reported by the native accessibility boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
  /// The handle's backing UI control has been destroyed or replaced.
  #[error("invalid (stale) accessibility element")]
  Stale,

  /// The element does not offer this attribute or action.
  #[error("attribute or action not supported: {0}")]
  Unsupported(String),

  /// Any other failure from the accessibility layer.
  #[error("accessibility failure: {0}")]
  Failure(String),
}

/// Result type at the backend boundary.
pub type BackendResult<T> = Result<T, BackendError>;

/// Opaque reference to one live UI element. Clone is cheap.
///
/// Handles are owned by the operating system and can go stale at any time;
/// the registry never assumes a handle survives a cache rebuild.
pub trait ElementHandle: Clone + Send + Sync + 'static {
  /// Process ID of the owning application.
  fn pid(&self) -> u32;

  /// Semantic role plus the raw platform role string (for diagnostics).
  fn role(&self) -> BackendResult<(Role, String)>;

  /// The element's title attribute.
  fn title(&self) -> BackendResult<String>;

  /// The element's current typed value.
  fn value(&self) -> BackendResult<Value>;

  /// Write a typed value to the element.
  fn set_value(&self, value: &Value) -> BackendResult<()>;

  /// The element's description attribute.
  fn description(&self) -> BackendResult<String>;

  /// Human-readable role description supplied by the platform.
  fn role_description(&self) -> BackendResult<String>;

  /// Whether the element is enabled for interaction.
  fn enabled(&self) -> BackendResult<bool>;

  /// Child elements in platform order.
  fn children(&self) -> BackendResult<Vec<Self>>;

  /// Perform an action on this element.
  fn perform(&self, action: Action) -> BackendResult<()>;
}

/// One running application with its root accessibility element.
#[derive(Debug, Clone)]
pub struct Application<H> {
  /// Localized application name.
  pub name: String,
  /// Process ID.
  pub pid: ProcessId,
  /// Root accessibility element for the application.
  pub handle: H,
}

/// Token returned by [`Backend::observe`]; passed back to
/// [`Backend::unobserve`] to drop the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(pub(crate) u64);

/// Platform-global operations.
pub trait Backend: Send + Sync + 'static {
  /// Element handle type for this platform.
  type Handle: ElementHandle;

  /// Check if assistive access is granted to this process.
  fn has_permissions(&self) -> bool;

  /// Enumerate running applications that expose accessibility trees.
  fn applications(&self) -> Vec<Application<Self::Handle>>;

  /// Top-level windows of one application, in platform order.
  fn windows(&self, app: &Application<Self::Handle>) -> BackendResult<Vec<Self::Handle>>;

  /// Register for change notifications below `scope`. Notified element
  /// handles are delivered on `sink` until [`Backend::unobserve`] is called.
  fn observe(
    &self,
    scope: &Self::Handle,
    kind: Notification,
    sink: Sender<Self::Handle>,
  ) -> BackendResult<ObserverToken>;

  /// Drop a notification registration. Unknown tokens are ignored.
  fn unobserve(&self, token: ObserverToken);

  /// Post one hardware keyboard event, globally or to one process.
  fn post_key(&self, event: &KeyEvent, target: Option<ProcessId>) -> BackendResult<()>;

  /// Post one hardware mouse event, globally or to one process.
  fn post_mouse(&self, event: &MouseEvent, target: Option<ProcessId>) -> BackendResult<()>;
}
