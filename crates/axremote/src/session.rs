/*!
Session facade - owns the registry store and the event queue.

One `Session` is what the daemon dispatches against (and what embedders
drive directly). The store sits behind a single mutex so there is exactly
one writer per rebuild; stale faults observed while acting on an object
trigger one discard-and-rebuild retry before surfacing.
*/

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::a11y::{Action, Notification, Value};
use crate::backend::{Backend, ElementHandle};
use crate::input::{parse_combo, EventQueue, Modifier, MouseButton, DEFAULT_EVENT_INTERVAL};
use crate::naming::{self, NamePattern};
use crate::registry::RegistryStore;
use crate::types::{AxRemoteError, AxRemoteResult, ObjectNode, Timeouts, WindowRecord};
use crate::wait;

/// High-level automation session over one backend.
pub struct Session<B: Backend> {
  backend: Arc<B>,
  store: Mutex<RegistryStore<B>>,
  queue: Mutex<EventQueue<B>>,
}

impl<B: Backend> std::fmt::Debug for Session<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Session").finish_non_exhaustive()
  }
}

impl<B: Backend> Session<B> {
  /// Create a session. Fails if assistive access is not granted.
  pub fn new(backend: Arc<B>) -> AxRemoteResult<Self> {
    if !backend.has_permissions() {
      return Err(AxRemoteError::PermissionDenied);
    }
    Ok(Self {
      store: Mutex::new(RegistryStore::new(Arc::clone(&backend))),
      queue: Mutex::new(EventQueue::new(Arc::clone(&backend))),
      backend,
    })
  }

  /// Replace the process-wide lookup timeouts.
  pub fn set_timeouts(&self, timeouts: Timeouts) {
    self.store.lock().set_timeouts(timeouts);
  }

  /// Current process-wide lookup timeouts.
  pub fn timeouts(&self) -> Timeouts {
    self.store.lock().timeouts()
  }

  // === Resolution & enumeration ===

  /// Resolve a window by pattern, polling up to the window timeout.
  pub fn resolve_window(&self, window: &str, wait: bool) -> AxRemoteResult<WindowRecord> {
    self
      .store
      .lock()
      .resolve_window(&NamePattern::new(window), wait)
  }

  /// Resolve an object inside a window, polling up to the object timeout.
  pub fn resolve_object(&self, window: &str, object: &str, wait: bool) -> AxRemoteResult<ObjectNode> {
    self.store.lock().resolve_object(
      &NamePattern::new(window),
      &NamePattern::new(object),
      None,
      wait,
      false,
    )
  }

  /// Resolve an object of a specific role.
  pub fn resolve_object_of_role(
    &self,
    window: &str,
    object: &str,
    role: crate::a11y::Role,
    wait: bool,
  ) -> AxRemoteResult<ObjectNode> {
    self.store.lock().resolve_object(
      &NamePattern::new(window),
      &NamePattern::new(object),
      Some(role),
      wait,
      false,
    )
  }

  /// All currently known windows.
  pub fn list_windows(&self) -> Vec<WindowRecord> {
    self.store.lock().list_windows()
  }

  /// All objects of a window, in traversal order.
  pub fn list_objects(&self, window: &str) -> AxRemoteResult<Vec<ObjectNode>> {
    self
      .store
      .lock()
      .list_objects(&NamePattern::new(window), true)
  }

  /// Generated names of an object's direct children, in order.
  pub fn children_of(&self, window: &str, object: &str) -> AxRemoteResult<Vec<String>> {
    Ok(self.resolve_object(window, object, true)?.children)
  }

  /// Drop a window's memoized object map; the next lookup rebuilds it.
  pub fn remap(&self, window: &str) -> AxRemoteResult<()> {
    self.store.lock().remap(&NamePattern::new(window))
  }

  // === Object actions ===

  /// Click an object (its primary press action).
  ///
  /// The enabled attribute is checked first: a disabled control fails
  /// fast with [`AxRemoteError::Disabled`] and no action is posted.
  pub fn click(&self, window: &str, object: &str) -> AxRemoteResult<()> {
    self.perform_action(window, object, Action::Press)
  }

  /// Perform a named action on an object, with the enabled check.
  pub fn perform_action(&self, window: &str, object: &str, action: Action) -> AxRemoteResult<()> {
    self.with_object(window, object, |handle, node| {
      if !naming::map_backend(handle.enabled())? {
        return Err(AxRemoteError::Disabled(node.name.clone()));
      }
      naming::map_backend(handle.perform(action))
    })
  }

  /// Read an object's current typed value.
  pub fn get_value(&self, window: &str, object: &str) -> AxRemoteResult<Value> {
    self.with_object(window, object, |handle, _| {
      naming::map_backend(handle.value())
    })
  }

  /// Write a typed value to an object, with the enabled check.
  pub fn set_value(&self, window: &str, object: &str, value: &Value) -> AxRemoteResult<()> {
    self.with_object(window, object, |handle, node| {
      if !naming::map_backend(handle.enabled())? {
        return Err(AxRemoteError::Disabled(node.name.clone()));
      }
      naming::map_backend(handle.set_value(value))
    })
  }

  // === Verify family (boolean boundary) ===

  /// Does a window matching the pattern currently exist?
  ///
  /// `NotFound` is folded into `false`; any other failure propagates.
  pub fn window_exists(&self, window: &str) -> AxRemoteResult<bool> {
    fold_not_found(self.resolve_window(window, false).map(|_| ()))
  }

  /// Does an object matching the pattern exist in the window?
  pub fn object_exists(&self, window: &str, object: &str) -> AxRemoteResult<bool> {
    fold_not_found(self.resolve_object(window, object, false).map(|_| ()))
  }

  /// Is the object present and enabled?
  ///
  /// `NotFound` and `Disabled` both fold into `false`.
  pub fn verify_enabled(&self, window: &str, object: &str) -> AxRemoteResult<bool> {
    let checked = self.with_object(window, object, |handle, node| {
      if naming::map_backend(handle.enabled())? {
        Ok(())
      } else {
        Err(AxRemoteError::Disabled(node.name.clone()))
      }
    });
    match checked {
      Ok(()) => Ok(true),
      Err(AxRemoteError::NotFound(_) | AxRemoteError::Disabled(_)) => Ok(false),
      Err(other) => Err(other),
    }
  }

  // === Input synthesis ===

  /// Parse a combo string, queue it and flush with default pacing.
  pub fn generate_key_events(&self, combo: &str) -> AxRemoteResult<()> {
    // Parse first so an unsupported key fails before anything posts.
    let events = parse_combo(combo)?;
    let mut queue = self.queue.lock();
    for event in events {
      queue.queue_key(event);
    }
    queue.flush_keys(DEFAULT_EVENT_INTERVAL)
  }

  /// Press and hold modifiers (posted immediately).
  pub fn press_modifiers(&self, names: &[String]) -> AxRemoteResult<()> {
    let modifiers = parse_modifier_names(names)?;
    let mut queue = self.queue.lock();
    queue.press_modifiers(&modifiers);
    queue.flush_keys(DEFAULT_EVENT_INTERVAL)
  }

  /// Release held modifiers in reverse order (posted immediately).
  pub fn release_modifiers(&self, names: &[String]) -> AxRemoteResult<()> {
    let modifiers = parse_modifier_names(names)?;
    let mut queue = self.queue.lock();
    queue.release_modifiers(&modifiers);
    queue.flush_keys(DEFAULT_EVENT_INTERVAL)
  }

  /// Synthesize a click at a screen coordinate.
  pub fn mouse_click(&self, x: f64, y: f64, button: MouseButton) -> AxRemoteResult<()> {
    let mut queue = self.queue.lock();
    queue.click(x, y, button);
    queue.flush_mouse(DEFAULT_EVENT_INTERVAL)
  }

  /// Synthesize a double-click at a screen coordinate.
  pub fn mouse_double_click(&self, x: f64, y: f64, button: MouseButton) -> AxRemoteResult<()> {
    let mut queue = self.queue.lock();
    queue.double_click(x, y, button);
    queue.flush_mouse(DEFAULT_EVENT_INTERVAL)
  }

  /// Synthesize a drag between two screen coordinates.
  pub fn mouse_drag(&self, from: (f64, f64), to: (f64, f64)) -> AxRemoteResult<()> {
    let mut queue = self.queue.lock();
    queue.drag(from, to, MouseButton::Left);
    queue.flush_mouse(DEFAULT_EVENT_INTERVAL)
  }

  // === Notification wait ===

  /// Block until an element matching `element` fires `kind` under the
  /// window, or the timeout elapses. Returns the matched element's label.
  pub fn wait_for_notification(
    &self,
    window: &str,
    kind: Notification,
    element: &str,
    timeout: Duration,
  ) -> AxRemoteResult<String> {
    // Clone the scope handle out so the store is not locked for the
    // whole wait.
    let scope = {
      let mut store = self.store.lock();
      let record = store.resolve_window(&NamePattern::new(window), true)?;
      store.with_window_handle(&record.name, Clone::clone)?
    };

    let matched = wait::wait_for(
      &*self.backend,
      &scope,
      kind,
      wait::label_predicate(NamePattern::new(element)),
      timeout,
    )?;
    let parts = naming::name_parts(&matched)?;
    Ok(parts.raw_label)
  }

  // === Internals ===

  /// Resolve an object and run `f` on its live handle.
  ///
  /// A stale fault discards the window's cache and retries exactly once
  /// against a fresh map; a second fault surfaces.
  fn with_object<R>(
    &self,
    window: &str,
    object: &str,
    f: impl Fn(&B::Handle, &ObjectNode) -> AxRemoteResult<R>,
  ) -> AxRemoteResult<R> {
    let window_pattern = NamePattern::new(window);
    let object_pattern = NamePattern::new(object);
    let mut retried = false;
    loop {
      let mut store = self.store.lock();
      let window_record = store.resolve_window(&window_pattern, true)?;
      let node = store.resolve_object(&window_pattern, &object_pattern, None, true, false)?;
      let result =
        store.with_object_handle(&window_record.name, &node.name, |handle| f(handle, &node))?;
      match result {
        Err(AxRemoteError::Stale) if !retried => {
          store.discard_window(&window_record.name);
          retried = true;
        }
        other => return other,
      }
    }
  }
}

/// Fold `NotFound` into `false` for the verify boundary.
fn fold_not_found(result: AxRemoteResult<()>) -> AxRemoteResult<bool> {
  match result {
    Ok(()) => Ok(true),
    Err(AxRemoteError::NotFound(_)) => Ok(false),
    Err(other) => Err(other),
  }
}

/// Parse modifier names, failing hard on unknown ones.
fn parse_modifier_names(names: &[String]) -> AxRemoteResult<Vec<Modifier>> {
  names
    .iter()
    .map(|name| {
      Modifier::parse(name).ok_or_else(|| AxRemoteError::UnsupportedModifier(name.clone()))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::a11y::Role;
  use crate::backend::fake::{FakeBackend, PostedEvent};

  fn session() -> (Arc<FakeBackend>, Session<FakeBackend>) {
    let backend = Arc::new(FakeBackend::new());
    let session = Session::new(Arc::clone(&backend)).unwrap();
    session.set_timeouts(Timeouts {
      window_wait: Duration::from_millis(50),
      object_wait: Duration::from_millis(50),
      poll_interval: Duration::from_millis(5),
    });
    (backend, session)
  }

  #[test]
  fn click_presses_the_button() {
    let (backend, session) = session();
    backend.add_app("Editor", 10);
    let win = backend.add_window("Editor", "Main");
    backend.add_child(&win, Role::Button, Some("Save"));

    session.click("Main", "btnSave").unwrap();
    assert_eq!(backend.performed(), vec![(Role::Button, Action::Press)]);
  }

  #[test]
  fn click_on_disabled_control_fails_fast() {
    let (backend, session) = session();
    backend.add_app("Editor", 10);
    let win = backend.add_window("Editor", "Main");
    let save = backend.add_child(&win, Role::Button, Some("Save"));
    backend.set_node_enabled(&save, false);

    let err = session.click("Main", "btnSave").unwrap_err();
    assert!(matches!(err, AxRemoteError::Disabled(_)));
    assert!(backend.performed().is_empty(), "action posted despite disabled");
  }

  #[test]
  fn stale_object_is_retried_against_a_fresh_map() {
    let (backend, session) = session();
    backend.add_app("Editor", 10);
    let win = backend.add_window("Editor", "Main");
    let save = backend.add_child(&win, Role::Button, Some("Save"));

    // Resolve once so the handle is memoized, then invalidate it.
    assert!(session.object_exists("Main", "btnSave").unwrap());
    backend.invalidate(&save);

    // The memoized handle is stale; the rebuilt map fails too, so the
    // lookup exhausts its deadline as NotFound.
    let err = session.click("Main", "btnSave").unwrap_err();
    assert!(matches!(err, AxRemoteError::NotFound(_)));

    // Once the UI recovers the same call succeeds end-to-end.
    backend.revive(&save);
    session.click("Main", "btnSave").unwrap();
    assert_eq!(backend.performed(), vec![(Role::Button, Action::Press)]);
  }

  #[test]
  fn get_and_set_value_round_trip() {
    let (backend, session) = session();
    backend.add_app("Editor", 10);
    let win = backend.add_window("Editor", "Main");
    backend.add_child(&win, Role::TextField, Some("Name"));

    session
      .set_value("Main", "txtName", &Value::String("hello".into()))
      .unwrap();
    // The field's value is now its label source; address it by role name.
    let value = session.get_value("Main", "txt*").unwrap();
    assert_eq!(value.as_str(), Some("hello"));
  }

  #[test]
  fn verify_family_returns_booleans() {
    let (backend, session) = session();
    backend.add_app("Editor", 10);
    let win = backend.add_window("Editor", "Main");
    let save = backend.add_child(&win, Role::Button, Some("Save"));

    assert!(session.window_exists("Main").unwrap());
    assert!(!session.window_exists("Gone").unwrap());
    assert!(session.object_exists("Main", "btnSave").unwrap());
    assert!(!session.object_exists("Main", "btnNope").unwrap());
    assert!(session.verify_enabled("Main", "btnSave").unwrap());

    backend.set_node_enabled(&save, false);
    session.remap("Main").unwrap();
    assert!(!session.verify_enabled("Main", "btnSave").unwrap());
  }

  #[test]
  fn generate_key_events_posts_in_order() {
    let (backend, session) = session();
    session.generate_key_events("<command>s").unwrap();

    let posted = backend.posted();
    assert_eq!(posted.len(), 4);
    assert!(matches!(posted[0], PostedEvent::Key(e, _) if e.down));
    assert!(matches!(posted[3], PostedEvent::Key(e, _) if !e.down));
  }

  #[test]
  fn unsupported_key_posts_nothing() {
    let (backend, session) = session();
    let err = session.generate_key_events("<warpdrive>").unwrap_err();
    assert!(matches!(err, AxRemoteError::UnsupportedKey(_)));
    assert!(backend.posted().is_empty());
  }

  #[test]
  fn unsupported_modifier_is_a_hard_failure() {
    let (_, session) = session();
    let err = session
      .press_modifiers(&["hyper".to_string()])
      .unwrap_err();
    assert!(matches!(err, AxRemoteError::UnsupportedModifier(_)));
  }

  #[test]
  fn wait_for_notification_matches_by_label() {
    let (backend, session) = session();
    backend.add_app("Editor", 10);
    let win = backend.add_window("Editor", "Main");

    let notifier = {
      let backend = Arc::clone(&backend);
      let win = win.clone();
      std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        let sheet = backend.add_child(&win, Role::Sheet, Some("Save changes?"));
        backend.notify(Notification::Created, &sheet);
      })
    };

    let label = session
      .wait_for_notification(
        "Main",
        Notification::Created,
        "Save changes?",
        Duration::from_millis(500),
      )
      .unwrap();
    assert_eq!(label, "Save changes?");
    notifier.join().unwrap();
  }
}
