/*!
In-memory scripted accessibility tree.

Test double for the native boundary: tests build a tree of fake elements,
mark handles stale, fire notifications and inspect posted hardware events.
Enabled with the `fake-backend` feature (always available to this crate's
own tests).
*/

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use super::{Application, Backend, BackendError, BackendResult, ElementHandle, ObserverToken};
use crate::a11y::{Action, Notification, Role, Value};
use crate::input::{KeyEvent, MouseEvent};
use crate::types::ProcessId;

/// A hardware event recorded by the fake posting primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum PostedEvent {
  /// Keyboard event and its target.
  Key(KeyEvent, Option<ProcessId>),
  /// Mouse event and its target.
  Mouse(MouseEvent, Option<ProcessId>),
}

#[derive(Debug, Clone)]
struct Node {
  role: Role,
  raw_role: String,
  pid: u32,
  title: Option<String>,
  value: Option<Value>,
  description: Option<String>,
  role_description: Option<String>,
  enabled: bool,
  children: Vec<u64>,
}

struct AppEntry {
  name: String,
  pid: u32,
  windows: Vec<u64>,
}

struct Observer {
  kind: Notification,
  sink: Sender<FakeHandle>,
}

#[derive(Default)]
struct State {
  apps: Vec<AppEntry>,
  nodes: HashMap<u64, Node>,
  stale: HashSet<u64>,
  observers: HashMap<u64, Observer>,
  performed: Vec<(u64, Action)>,
  posted: Vec<PostedEvent>,
  next_node: u64,
  next_token: u64,
}

/// Scripted in-memory backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
  state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for FakeBackend {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FakeBackend").finish_non_exhaustive()
  }
}

/// Handle into the fake tree.
#[derive(Clone)]
pub struct FakeHandle {
  id: u64,
  state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for FakeHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FakeHandle").field("id", &self.id).finish()
  }
}

impl FakeBackend {
  /// Empty backend with no applications.
  pub fn new() -> Self {
    Self::default()
  }

  fn handle(&self, id: u64) -> FakeHandle {
    FakeHandle {
      id,
      state: Arc::clone(&self.state),
    }
  }

  /// Register a running application.
  pub fn add_app(&self, name: &str, pid: u32) {
    self.state.lock().apps.push(AppEntry {
      name: name.to_string(),
      pid,
      windows: Vec::new(),
    });
  }

  /// Add a top-level window to a registered application.
  pub fn add_window(&self, app_name: &str, title: &str) -> FakeHandle {
    let mut state = self.state.lock();
    let pid = state
      .apps
      .iter()
      .find(|a| a.name == app_name)
      .map(|a| a.pid)
      .unwrap();
    let id = state.next_node;
    state.next_node += 1;
    state.nodes.insert(
      id,
      Node {
        role: Role::Window,
        raw_role: "AXWindow".to_string(),
        pid,
        title: Some(title.to_string()),
        value: None,
        description: None,
        role_description: None,
        enabled: true,
        children: Vec::new(),
      },
    );
    let app = state.apps.iter_mut().find(|a| a.name == app_name).unwrap();
    app.windows.push(id);
    drop(state);
    self.handle(id)
  }

  /// Add a child element under `parent`.
  pub fn add_child(&self, parent: &FakeHandle, role: Role, title: Option<&str>) -> FakeHandle {
    let mut state = self.state.lock();
    let pid = state.nodes.get(&parent.id).map(|n| n.pid).unwrap();
    let id = state.next_node;
    state.next_node += 1;
    state.nodes.insert(
      id,
      Node {
        role,
        raw_role: format!("{role:?}"),
        pid,
        title: title.map(str::to_string),
        value: None,
        description: None,
        role_description: None,
        enabled: true,
        children: Vec::new(),
      },
    );
    state
      .nodes
      .get_mut(&parent.id)
      .unwrap()
      .children
      .push(id);
    drop(state);
    self.handle(id)
  }

  /// Overwrite the element's value.
  pub fn set_node_value(&self, handle: &FakeHandle, value: Value) {
    self.state.lock().nodes.get_mut(&handle.id).unwrap().value = Some(value);
  }

  /// Overwrite the element's description.
  pub fn set_node_description(&self, handle: &FakeHandle, description: &str) {
    self.state.lock().nodes.get_mut(&handle.id).unwrap().description =
      Some(description.to_string());
  }

  /// Flip the element's enabled attribute.
  pub fn set_node_enabled(&self, handle: &FakeHandle, enabled: bool) {
    self.state.lock().nodes.get_mut(&handle.id).unwrap().enabled = enabled;
  }

  /// Overwrite the element's title.
  pub fn set_node_title(&self, handle: &FakeHandle, title: &str) {
    self.state.lock().nodes.get_mut(&handle.id).unwrap().title = Some(title.to_string());
  }

  /// Mark a handle stale: every subsequent call through it fails.
  pub fn invalidate(&self, handle: &FakeHandle) {
    self.state.lock().stale.insert(handle.id);
  }

  /// Clear a previous [`FakeBackend::invalidate`].
  pub fn revive(&self, handle: &FakeHandle) {
    self.state.lock().stale.remove(&handle.id);
  }

  /// Remove a window from its application (simulates the UI closing it).
  pub fn remove_window(&self, handle: &FakeHandle) {
    let mut state = self.state.lock();
    for app in &mut state.apps {
      app.windows.retain(|&id| id != handle.id);
    }
    state.stale.insert(handle.id);
  }

  /// Deliver a notification to every live registration of `kind`.
  pub fn notify(&self, kind: Notification, element: &FakeHandle) {
    let sinks: Vec<Sender<FakeHandle>> = self
      .state
      .lock()
      .observers
      .values()
      .filter(|o| o.kind == kind)
      .map(|o| o.sink.clone())
      .collect();
    for sink in sinks {
      drop(sink.send(element.clone()));
    }
  }

  /// Number of live notification registrations.
  pub fn active_observers(&self) -> usize {
    self.state.lock().observers.len()
  }

  /// Actions performed through [`ElementHandle::perform`], in order.
  pub fn performed(&self) -> Vec<(Role, Action)> {
    let state = self.state.lock();
    state
      .performed
      .iter()
      .map(|(id, action)| (state.nodes.get(id).map(|n| n.role).unwrap_or_default(), *action))
      .collect()
  }

  /// Hardware events recorded by the posting primitive, in order.
  pub fn posted(&self) -> Vec<PostedEvent> {
    self.state.lock().posted.clone()
  }
}

impl FakeHandle {
  fn read<R>(&self, f: impl FnOnce(&Node) -> R) -> BackendResult<R> {
    let state = self.state.lock();
    if state.stale.contains(&self.id) {
      return Err(BackendError::Stale);
    }
    state
      .nodes
      .get(&self.id)
      .map(f)
      .ok_or(BackendError::Stale)
  }
}

impl ElementHandle for FakeHandle {
  fn pid(&self) -> u32 {
    self.state.lock().nodes.get(&self.id).map_or(0, |n| n.pid)
  }

  fn role(&self) -> BackendResult<(Role, String)> {
    self.read(|n| (n.role, n.raw_role.clone()))
  }

  fn title(&self) -> BackendResult<String> {
    self.read(|n| n.title.clone())?.ok_or_else(|| {
      BackendError::Unsupported("AXTitle".to_string())
    })
  }

  fn value(&self) -> BackendResult<Value> {
    self.read(|n| n.value.clone())?.ok_or_else(|| {
      BackendError::Unsupported("AXValue".to_string())
    })
  }

  fn set_value(&self, value: &Value) -> BackendResult<()> {
    let state = &mut *self.state.lock();
    if state.stale.contains(&self.id) {
      return Err(BackendError::Stale);
    }
    let node = state.nodes.get_mut(&self.id).ok_or(BackendError::Stale)?;
    node.value = Some(value.clone());
    Ok(())
  }

  fn description(&self) -> BackendResult<String> {
    self.read(|n| n.description.clone())?.ok_or_else(|| {
      BackendError::Unsupported("AXDescription".to_string())
    })
  }

  fn role_description(&self) -> BackendResult<String> {
    self.read(|n| n.role_description.clone())?.ok_or_else(|| {
      BackendError::Unsupported("AXRoleDescription".to_string())
    })
  }

  fn enabled(&self) -> BackendResult<bool> {
    self.read(|n| n.enabled)
  }

  fn children(&self) -> BackendResult<Vec<Self>> {
    let ids = self.read(|n| n.children.clone())?;
    Ok(
      ids
        .into_iter()
        .map(|id| FakeHandle {
          id,
          state: Arc::clone(&self.state),
        })
        .collect(),
    )
  }

  fn perform(&self, action: Action) -> BackendResult<()> {
    let state = &mut *self.state.lock();
    if state.stale.contains(&self.id) {
      return Err(BackendError::Stale);
    }
    if !state.nodes.contains_key(&self.id) {
      return Err(BackendError::Stale);
    }
    state.performed.push((self.id, action));
    Ok(())
  }
}

impl Backend for FakeBackend {
  type Handle = FakeHandle;

  fn has_permissions(&self) -> bool {
    true
  }

  fn applications(&self) -> Vec<Application<FakeHandle>> {
    let state = self.state.lock();
    state
      .apps
      .iter()
      .map(|app| {
        // The application "root" handle is synthetic; window enumeration
        // goes through `windows`, so an inert placeholder id is enough.
        Application {
          name: app.name.clone(),
          pid: ProcessId(app.pid),
          handle: FakeHandle {
            id: u64::MAX - u64::from(app.pid),
            state: Arc::clone(&self.state),
          },
        }
      })
      .collect()
  }

  fn windows(&self, app: &Application<FakeHandle>) -> BackendResult<Vec<FakeHandle>> {
    let state = self.state.lock();
    let entry = state
      .apps
      .iter()
      .find(|a| a.pid == app.pid.as_u32())
      .ok_or(BackendError::Stale)?;
    Ok(
      entry
        .windows
        .iter()
        .map(|&id| FakeHandle {
          id,
          state: Arc::clone(&self.state),
        })
        .collect(),
    )
  }

  fn observe(
    &self,
    _scope: &FakeHandle,
    kind: Notification,
    sink: Sender<FakeHandle>,
  ) -> BackendResult<ObserverToken> {
    let mut state = self.state.lock();
    let token = state.next_token;
    state.next_token += 1;
    state.observers.insert(token, Observer { kind, sink });
    Ok(ObserverToken(token))
  }

  fn unobserve(&self, token: ObserverToken) {
    self.state.lock().observers.remove(&token.0);
  }

  fn post_key(&self, event: &KeyEvent, target: Option<ProcessId>) -> BackendResult<()> {
    self.state.lock().posted.push(PostedEvent::Key(*event, target));
    Ok(())
  }

  fn post_mouse(&self, event: &MouseEvent, target: Option<ProcessId>) -> BackendResult<()> {
    self
      .state
      .lock()
      .posted
      .push(PostedEvent::Mouse(*event, target));
    Ok(())
  }
}
