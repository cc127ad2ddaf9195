/*! Error types for axremote operations. */

/// Errors that can occur during automation operations.
#[derive(Debug, thiserror::Error)]
pub enum AxRemoteError {
  /// A window or object lookup exhausted its timeout.
  #[error("Not found: {0}")]
  NotFound(String),

  /// A handle was invalidated by the live UI between resolution and use.
  ///
  /// Callers never see this directly unless the rebuild-and-retry path
  /// also fails; the registry treats it as a discard-and-rebuild trigger.
  #[error("Stale accessibility element")]
  Stale,

  /// The element exists but its enabled attribute is false.
  #[error("Object is disabled: {0}")]
  Disabled(String),

  /// The element does not offer the requested attribute or action.
  #[error("Operation not supported: {0}")]
  Unsupported(String),

  /// The event codec cannot translate a key name or character.
  #[error("Unsupported key: {0}")]
  UnsupportedKey(String),

  /// The event codec cannot translate a modifier name.
  #[error("Unsupported modifier: {0}")]
  UnsupportedModifier(String),

  /// Accessibility permissions not granted.
  #[error("Accessibility permissions not granted")]
  PermissionDenied,

  /// Any other failure reported by the platform accessibility layer.
  #[error("Accessibility operation failed: {0}")]
  Platform(String),
}

/// Result type for axremote operations.
pub type AxRemoteResult<T> = Result<T, AxRemoteError>;
