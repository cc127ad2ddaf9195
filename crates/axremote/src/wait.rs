/*!
Asynchronous change-notification wait.

Registers a one-shot callback on the accessibility layer's notification
channel and blocks the caller until a notified element satisfies the
predicate or the timeout elapses. The registration is always dropped on
exit - match, timeout or panic - so no subscription ever leaks.

The blocking receive is a channel `recv_timeout`; the original signal
race this replaces had the same semantics without the reentrancy hazard.
*/

use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;

use crate::a11y::Notification;
use crate::backend::{Backend, ObserverToken};
use crate::naming::{map_backend, name_parts, NamePattern};
use crate::types::{AxRemoteError, AxRemoteResult};

/// Unregisters the notification subscription when dropped.
struct UnobserveGuard<'a, B: Backend> {
  backend: &'a B,
  token: ObserverToken,
}

impl<B: Backend> Drop for UnobserveGuard<'_, B> {
  fn drop(&mut self) {
    self.backend.unobserve(self.token);
  }
}

/// Block until an element below `scope` fires `kind` and satisfies
/// `predicate`, or `timeout` elapses.
///
/// Deliveries that fail the predicate are discarded and the wait
/// continues against the remaining deadline.
pub fn wait_for<B, P>(
  backend: &B,
  scope: &B::Handle,
  kind: Notification,
  predicate: P,
  timeout: Duration,
) -> AxRemoteResult<B::Handle>
where
  B: Backend,
  P: Fn(&B::Handle) -> bool,
{
  let (tx, rx) = crossbeam_channel::unbounded();
  let token = map_backend(backend.observe(scope, kind, tx))?;
  let _guard = UnobserveGuard { backend, token };

  let deadline = Instant::now() + timeout;
  loop {
    let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
      return Err(timed_out(kind));
    };
    match rx.recv_timeout(remaining) {
      Ok(handle) => {
        if predicate(&handle) {
          return Ok(handle);
        }
      }
      Err(RecvTimeoutError::Timeout) => return Err(timed_out(kind)),
      Err(RecvTimeoutError::Disconnected) => {
        return Err(AxRemoteError::Platform(
          "notification channel closed".to_string(),
        ));
      }
    }
  }
}

fn timed_out(kind: Notification) -> AxRemoteError {
  AxRemoteError::NotFound(format!("no {} notification before timeout", kind.as_str()))
}

/// Predicate matching a notified element's label against a name pattern.
///
/// Notified elements live outside any committed map, so only their label
/// forms participate; elements whose attributes cannot be read do not
/// match.
pub fn label_predicate<H: crate::backend::ElementHandle>(
  pattern: NamePattern,
) -> impl Fn(&H) -> bool {
  move |handle| {
    name_parts(handle)
      .map(|parts| pattern.matches("", &parts.raw_label, &parts.stripped_label))
      .unwrap_or(false)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::thread;

  use super::*;
  use crate::a11y::Role;
  use crate::backend::fake::FakeBackend;
  use crate::backend::ElementHandle;

  #[test]
  fn returns_matching_element() {
    let backend = Arc::new(FakeBackend::new());
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    let dialog = backend.add_child(&win, Role::Dialog, Some("Confirm"));

    let notifier = {
      let backend = Arc::clone(&backend);
      let dialog = dialog.clone();
      thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        backend.notify(Notification::Created, &dialog);
      })
    };

    let found = wait_for(
      &*backend,
      &win,
      Notification::Created,
      label_predicate(NamePattern::new("Confirm")),
      Duration::from_millis(500),
    )
    .unwrap();
    assert_eq!(found.pid(), 1);
    notifier.join().unwrap();
    assert_eq!(backend.active_observers(), 0, "subscription leaked");
  }

  #[test]
  fn non_matching_deliveries_are_discarded() {
    let backend = Arc::new(FakeBackend::new());
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    let other = backend.add_child(&win, Role::Dialog, Some("Other"));
    let confirm = backend.add_child(&win, Role::Dialog, Some("Confirm"));

    let notifier = {
      let backend = Arc::clone(&backend);
      thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        backend.notify(Notification::Created, &other);
        thread::sleep(Duration::from_millis(5));
        backend.notify(Notification::Created, &confirm);
      })
    };

    let found = wait_for(
      &*backend,
      &win,
      Notification::Created,
      label_predicate(NamePattern::new("Confirm")),
      Duration::from_millis(500),
    )
    .unwrap();
    assert!(label_predicate::<crate::backend::fake::FakeHandle>(NamePattern::new("Confirm"))(
      &found
    ));
    notifier.join().unwrap();
  }

  #[test]
  fn timeout_unregisters_and_reports_not_found() {
    let backend = Arc::new(FakeBackend::new());
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");

    let err = wait_for(
      &*backend,
      &win,
      Notification::ValueChanged,
      |_| true,
      Duration::from_millis(20),
    )
    .unwrap_err();
    assert!(matches!(err, AxRemoteError::NotFound(_)));
    assert_eq!(backend.active_observers(), 0, "subscription leaked on timeout");
  }
}
