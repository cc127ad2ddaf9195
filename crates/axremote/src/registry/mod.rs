/*!
Window & object registry - the tree cache.

Two process-wide caches with explicit, coarse invalidation: a window
table (generated name -> live handle) and, per window, a fully-traversed
object map. All fields are private; mutations go through methods that
maintain the invariants:

- a window rebuild replaces the table wholesale, never in place
- an object map is committed only when a traversal completes; a stale
  fault mid-walk discards the whole affected window's cache and restarts
  resolution, so a partial map is never reachable
- successful resolutions are memoized until a caller forces a remap or a
  stale fault is observed
*/

mod iter;
mod objects;
mod windows;

pub use iter::{Children, Descendants};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::Backend;
use crate::naming::NamePattern;
use crate::types::{AxRemoteError, AxRemoteResult, ObjectNode, Timeouts, WindowRecord};

/// One cached window: pure record plus the borrowed platform handle.
pub(crate) struct WindowEntry<H> {
  pub(crate) record: WindowRecord,
  pub(crate) handle: H,
  /// Stripped title used by the matcher (windows strip whitespace only).
  pub(crate) stripped_title: String,
}

/// One cached object: pure record plus the borrowed platform handle.
pub(crate) struct ObjectEntry<H> {
  pub(crate) record: ObjectNode,
  pub(crate) handle: H,
  pub(crate) stripped_label: String,
}

/// A window's fully-traversed object map.
pub(crate) struct ObjectMap<H> {
  pub(crate) nodes: HashMap<String, ObjectEntry<H>>,
  /// Generated names in traversal (pre-)order.
  pub(crate) order: Vec<String>,
}

impl<H> ObjectMap<H> {
  pub(crate) fn new() -> Self {
    Self {
      nodes: HashMap::new(),
      order: Vec::new(),
    }
  }
}

/// The registry store. Owned by the session facade and passed by
/// reference into the dispatch path - never a module-level singleton.
pub struct RegistryStore<B: Backend> {
  pub(crate) backend: Arc<B>,
  timeouts: Timeouts,
  windows: HashMap<String, WindowEntry<B::Handle>>,
  window_order: Vec<String>,
  maps: HashMap<String, ObjectMap<B::Handle>>,
}

impl<B: Backend> std::fmt::Debug for RegistryStore<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RegistryStore")
      .field("windows", &self.window_order)
      .field("mapped", &self.maps.len())
      .finish_non_exhaustive()
  }
}

impl<B: Backend> RegistryStore<B> {
  /// Empty store over a backend.
  pub fn new(backend: Arc<B>) -> Self {
    Self {
      backend,
      timeouts: Timeouts::default(),
      windows: HashMap::new(),
      window_order: Vec::new(),
      maps: HashMap::new(),
    }
  }

  /// Current process-wide timeouts.
  pub const fn timeouts(&self) -> Timeouts {
    self.timeouts
  }

  /// Replace the process-wide timeouts.
  pub fn set_timeouts(&mut self, timeouts: Timeouts) {
    self.timeouts = timeouts;
  }

  /// Resolve a window by pattern.
  ///
  /// Checks the memoized table first; on a miss the registry re-enumerates
  /// all applications' top-level windows once per poll interval until the
  /// window timeout elapses (`wait = false` limits this to one rebuild).
  pub fn resolve_window(
    &mut self,
    pattern: &NamePattern,
    wait: bool,
  ) -> AxRemoteResult<WindowRecord> {
    if let Some(name) = self.find_cached_window(pattern) {
      // `self.windows` owns the entry; the borrow in find ended.
      if let Some(entry) = self.windows.get(&name) {
        return Ok(entry.record.clone());
      }
    }

    let deadline = Instant::now() + if wait { self.timeouts.window_wait } else { Duration::ZERO };
    loop {
      self.rebuild_windows();
      if let Some(name) = self.find_cached_window(pattern) {
        if let Some(entry) = self.windows.get(&name) {
          return Ok(entry.record.clone());
        }
      }
      if Instant::now() >= deadline {
        return Err(AxRemoteError::NotFound(format!(
          "window matching {:?}",
          pattern.as_str()
        )));
      }
      std::thread::sleep(self.timeouts.poll_interval);
    }
  }

  /// Resolve an object inside a window.
  ///
  /// Builds (or reuses) the window's object map and applies the matcher
  /// in traversal order. A stale fault observed while building discards
  /// the whole window cache and restarts resolution within the same
  /// deadline. `force_remap` bypasses the memoized map for this lookup.
  pub fn resolve_object(
    &mut self,
    window: &NamePattern,
    object: &NamePattern,
    role_filter: Option<crate::a11y::Role>,
    wait: bool,
    force_remap: bool,
  ) -> AxRemoteResult<ObjectNode> {
    let deadline = Instant::now() + if wait { self.timeouts.object_wait } else { Duration::ZERO };
    let mut force = force_remap;
    loop {
      let window_record = self.resolve_window(window, wait)?;
      let window_name = window_record.name;

      match self.ensure_map(&window_name, force) {
        Ok(()) => {
          force = false;
          if let Some(node) = self.find_in_map(&window_name, object, role_filter) {
            return Ok(node);
          }
        }
        Err(AxRemoteError::Stale) => {
          // Whole-window discard; next iteration re-resolves from scratch.
          self.discard_window(&window_name);
          force = false;
        }
        Err(other) => return Err(other),
      }

      if Instant::now() >= deadline {
        return Err(AxRemoteError::NotFound(format!(
          "object matching {:?} in window {window_name:?}",
          object.as_str()
        )));
      }
      std::thread::sleep(self.timeouts.poll_interval);
      // The UI may have changed while we slept; rebuild the map on the
      // next pass rather than re-searching the memo.
      self.maps.remove(&window_name);
    }
  }

  /// All currently cached windows (rebuilds if the table is empty).
  pub fn list_windows(&mut self) -> Vec<WindowRecord> {
    if self.windows.is_empty() {
      self.rebuild_windows();
    }
    self
      .window_order
      .iter()
      .filter_map(|name| self.windows.get(name).map(|e| e.record.clone()))
      .collect()
  }

  /// All object records of a window, in traversal order.
  pub fn list_objects(
    &mut self,
    window: &NamePattern,
    wait: bool,
  ) -> AxRemoteResult<Vec<ObjectNode>> {
    let deadline = Instant::now() + if wait { self.timeouts.object_wait } else { Duration::ZERO };
    loop {
      let record = self.resolve_window(window, wait)?;
      let window_name = record.name;
      match self.ensure_map(&window_name, false) {
        Ok(()) => {
          let map = self
            .maps
            .get(&window_name)
            .ok_or_else(|| AxRemoteError::NotFound(window_name.clone()))?;
          return Ok(
            map
              .order
              .iter()
              .filter_map(|n| map.nodes.get(n).map(|e| e.record.clone()))
              .collect(),
          );
        }
        Err(AxRemoteError::Stale) => {
          self.discard_window(&window_name);
          if Instant::now() >= deadline {
            return Err(AxRemoteError::NotFound(format!(
              "window {window_name:?} kept going stale"
            )));
          }
          std::thread::sleep(self.timeouts.poll_interval);
        }
        Err(other) => return Err(other),
      }
    }
  }

  /// Drop a window's memoized object map so the next lookup rebuilds it.
  pub fn remap(&mut self, window: &NamePattern) -> AxRemoteResult<()> {
    let record = self.resolve_window(window, false)?;
    self.maps.remove(&record.name);
    Ok(())
  }

  /// Discard one window's entire cache (record, handle and object map).
  pub(crate) fn discard_window(&mut self, window_name: &str) {
    self.windows.remove(window_name);
    self.window_order.retain(|n| n != window_name);
    self.maps.remove(window_name);
  }

  /// Run `f` with the live handle of a resolved object.
  pub(crate) fn with_object_handle<R>(
    &mut self,
    window_name: &str,
    object_name: &str,
    f: impl FnOnce(&B::Handle) -> R,
  ) -> AxRemoteResult<R> {
    self
      .maps
      .get(window_name)
      .and_then(|map| map.nodes.get(object_name))
      .map(|entry| f(&entry.handle))
      .ok_or_else(|| AxRemoteError::NotFound(format!("{window_name}/{object_name}")))
  }

  /// Run `f` with the live handle of a resolved window.
  pub(crate) fn with_window_handle<R>(
    &mut self,
    window_name: &str,
    f: impl FnOnce(&B::Handle) -> R,
  ) -> AxRemoteResult<R> {
    self
      .windows
      .get(window_name)
      .map(|entry| f(&entry.handle))
      .ok_or_else(|| AxRemoteError::NotFound(window_name.to_string()))
  }
}
