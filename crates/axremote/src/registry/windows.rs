/*!
Window table maintenance: enumeration, naming, matching.

A rebuild enumerates every running application's top-level windows and
replaces the table wholesale. Window records are never mutated in place;
generated window names are deterministic within one rebuild only.
*/

use std::collections::HashMap;

use log::debug;

use super::{RegistryStore, WindowEntry};
use crate::backend::{Backend, ElementHandle};
use crate::naming::{name_parts, NameAllocator, NamePattern};
use crate::types::WindowRecord;

impl<B: Backend> RegistryStore<B> {
  /// Replace the window table by enumerating all applications.
  ///
  /// Individual applications or windows that fail to enumerate (stale
  /// mid-rebuild, no accessibility) are skipped; the rebuild itself never
  /// fails. Object maps are kept only for window names that survive the
  /// rebuild.
  pub(crate) fn rebuild_windows(&mut self) {
    let mut windows = HashMap::new();
    let mut order = Vec::new();
    let mut alloc = NameAllocator::new();

    for app in self.backend.applications() {
      let handles = match self.backend.windows(&app) {
        Ok(handles) => handles,
        Err(e) => {
          debug!("skipping windows of {}: {e}", app.name);
          continue;
        }
      };
      for handle in handles {
        let parts = match name_parts(&handle) {
          Ok(parts) => parts,
          Err(e) => {
            debug!("skipping a window of {}: {e}", app.name);
            continue;
          }
        };
        let raw_title = match crate::naming::map_backend(handle.title()) {
          Ok(title) => title,
          // Untitled windows are addressable by generated name only.
          Err(_) => String::new(),
        };
        let name = alloc.assign(&parts);
        let record = WindowRecord {
          name: name.clone(),
          raw_title,
          app_name: app.name.clone(),
          pid: app.pid,
        };
        order.push(name.clone());
        windows.insert(
          name,
          WindowEntry {
            record,
            handle,
            stripped_title: parts.stripped_label,
          },
        );
      }
    }

    debug!("window registry rebuilt: {} windows", order.len());

    // Wholesale replacement; drop object maps whose window disappeared.
    self.maps.retain(|name, _| windows.contains_key(name));
    self.windows = windows;
    self.window_order = order;
  }

  /// Match a pattern against the cached window table.
  ///
  /// Tries the generated name, the raw title and the stripped title in
  /// registry order, returning the first hit.
  pub(crate) fn find_cached_window(&self, pattern: &NamePattern) -> Option<String> {
    for name in &self.window_order {
      let entry = self.windows.get(name)?;
      if pattern.matches(name, &entry.record.raw_title, &entry.stripped_title) {
        return Some(name.clone());
      }
    }
    None
  }
}
