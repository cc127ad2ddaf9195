/*! Process-wide lookup timeouts. */

use std::time::Duration;

const DEFAULT_WINDOW_WAIT_SECS: u64 = 30;
const DEFAULT_OBJECT_WAIT_SECS: u64 = 5;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Bounded-polling deadlines used by the registry.
///
/// Both waits are caller-configurable process-wide via
/// [`Session::set_timeouts`](crate::Session::set_timeouts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
  /// How long a window lookup may poll before failing with `NotFound`.
  pub window_wait: Duration,
  /// How long an object lookup may poll before failing with `NotFound`.
  pub object_wait: Duration,
  /// Delay between registry re-enumeration attempts.
  pub poll_interval: Duration,
}

impl Default for Timeouts {
  fn default() -> Self {
    Self {
      window_wait: Duration::from_secs(DEFAULT_WINDOW_WAIT_SECS),
      object_wait: Duration::from_secs(DEFAULT_OBJECT_WAIT_SECS),
      poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
    }
  }
}

impl Timeouts {
  /// Set the window wait in whole seconds.
  pub const fn with_window_wait_secs(mut self, secs: u64) -> Self {
    self.window_wait = Duration::from_secs(secs);
    self
  }

  /// Set the object wait in whole seconds.
  pub const fn with_object_wait_secs(mut self, secs: u64) -> Self {
    self.object_wait = Duration::from_secs(secs);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_values() {
    let t = Timeouts::default();
    assert_eq!(t.window_wait, Duration::from_secs(30));
    assert_eq!(t.object_wait, Duration::from_secs(5));
    assert_eq!(t.poll_interval, Duration::from_millis(1000));
  }

  #[test]
  fn builder_setters_override() {
    let t = Timeouts::default()
      .with_window_wait_secs(2)
      .with_object_wait_secs(1);
    assert_eq!(t.window_wait, Duration::from_secs(2));
    assert_eq!(t.object_wait, Duration::from_secs(1));
  }
}
