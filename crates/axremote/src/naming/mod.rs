/*!
Object naming engine.

Converts a raw accessibility element into the short role-prefixed
identifier scripts address it by, and disambiguates duplicate labels
with per-map counters.

Disambiguation rule: the first occurrence of a `(role-abbrev, label)`
pair gets no suffix (`btnSave`); the k-th duplicate gets suffix `k`
(`btnSave1`, `btnSave2`, ...). The duplicate counter is global to one
window's map, never reset per parent. Unlabeled elements get a
per-abbrev counter starting at 0 (`btn0`, `btn1`).
*/

mod pattern;

pub use pattern::NamePattern;

use std::collections::HashMap;

use log::warn;

use crate::a11y::Role;
use crate::backend::{BackendError, ElementHandle};
use crate::types::{AxRemoteError, AxRemoteResult};

/// The pieces a generated name is assembled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts {
  /// Semantic role of the element.
  pub role: Role,
  /// Label text exactly as derived from the element (empty if none).
  pub raw_label: String,
  /// Label with the role's strip-charset removed.
  pub stripped_label: String,
}

impl NameParts {
  /// Role abbreviation prefix.
  pub const fn abbrev(&self) -> &'static str {
    self.role.abbrev()
  }
}

/// Remove the role's strip-charset from a label.
pub fn strip_label(role: Role, label: &str) -> String {
  let charset = role.strip_charset();
  label.chars().filter(|c| !charset.contains(c)).collect()
}

/// Derive the naming parts for one element.
///
/// The label comes from a priority chain - value, title, description,
/// role description - skipping attributes the element does not support.
/// Unknown roles are surfaced in the log rather than silently swallowed.
pub fn name_parts<H: ElementHandle>(handle: &H) -> AxRemoteResult<NameParts> {
  let (role, raw_role) = map_backend(handle.role())?;
  if role == Role::Unknown {
    warn!("unmapped platform role {raw_role:?}; naming as '{}'", role.abbrev());
  }

  let raw_label = derive_label(handle)?.unwrap_or_default();
  let stripped_label = strip_label(role, &raw_label);

  Ok(NameParts {
    role,
    raw_label,
    stripped_label,
  })
}

/// Label priority chain: value, title, description, role description.
fn derive_label<H: ElementHandle>(handle: &H) -> AxRemoteResult<Option<String>> {
  if let Some(value) = skip_unsupported(handle.value())? {
    if let Some(s) = value.as_str() {
      if !s.is_empty() {
        return Ok(Some(s.to_string()));
      }
    }
  }
  for fetched in [
    skip_unsupported(handle.title())?,
    skip_unsupported(handle.description())?,
    skip_unsupported(handle.role_description())?,
  ] {
    if let Some(text) = fetched {
      if !text.is_empty() {
        return Ok(Some(text));
      }
    }
  }
  Ok(None)
}

/// Treat `Unsupported` as absence; propagate stale and hard failures.
fn skip_unsupported<T>(result: Result<T, BackendError>) -> AxRemoteResult<Option<T>> {
  match result {
    Ok(v) => Ok(Some(v)),
    Err(BackendError::Unsupported(_)) => Ok(None),
    Err(BackendError::Stale) => Err(AxRemoteError::Stale),
    Err(BackendError::Failure(msg)) => Err(AxRemoteError::Platform(msg)),
  }
}

/// Map a backend result into the core error taxonomy.
pub(crate) fn map_backend<T>(result: Result<T, BackendError>) -> AxRemoteResult<T> {
  result.map_err(|e| match e {
    BackendError::Stale => AxRemoteError::Stale,
    BackendError::Unsupported(what) => AxRemoteError::Unsupported(what),
    BackendError::Failure(msg) => AxRemoteError::Platform(msg),
  })
}

/// Hands out unique generated names within one window map.
#[derive(Debug, Default)]
pub struct NameAllocator {
  labeled: HashMap<(&'static str, String), usize>,
  unlabeled: HashMap<&'static str, usize>,
  used: std::collections::HashSet<String>,
}

impl NameAllocator {
  /// Fresh allocator for a new traversal.
  pub fn new() -> Self {
    Self::default()
  }

  /// Assign the next unique name for these parts.
  ///
  /// The counters make names deterministic; the used-set closes the gap
  /// where a literal label (`"Save1"`) collides with a suffixed duplicate
  /// (`"Save"` seen twice).
  pub fn assign(&mut self, parts: &NameParts) -> String {
    let abbrev = parts.abbrev();
    if parts.stripped_label.is_empty() {
      loop {
        let counter = self.unlabeled.entry(abbrev).or_insert(0);
        let name = format!("{abbrev}{counter}");
        *counter += 1;
        if self.used.insert(name.clone()) {
          return name;
        }
      }
    }
    let key = (abbrev, parts.stripped_label.clone());
    loop {
      let seen = self.labeled.entry(key.clone()).or_insert(0);
      let name = if *seen == 0 {
        format!("{abbrev}{}", parts.stripped_label)
      } else {
        format!("{abbrev}{}{seen}", parts.stripped_label)
      };
      *seen += 1;
      if self.used.insert(name.clone()) {
        return name;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::a11y::Value;
  use crate::backend::fake::FakeBackend;

  fn parts(role: Role, label: &str) -> NameParts {
    NameParts {
      role,
      raw_label: label.to_string(),
      stripped_label: strip_label(role, label),
    }
  }

  #[test]
  fn strip_is_role_dependent() {
    assert_eq!(strip_label(Role::Button, "Save As:"), "SaveAs");
    assert_eq!(strip_label(Role::Window, "Save As:"), "SaveAs:");
    assert_eq!(strip_label(Role::TextField, "user_name"), "username");
  }

  #[test]
  fn first_labeled_occurrence_has_no_suffix() {
    let mut alloc = NameAllocator::new();
    assert_eq!(alloc.assign(&parts(Role::Button, "Save")), "btnSave");
    assert_eq!(alloc.assign(&parts(Role::Button, "Save")), "btnSave1");
    assert_eq!(alloc.assign(&parts(Role::Button, "Save")), "btnSave2");
  }

  #[test]
  fn unlabeled_counter_starts_at_zero() {
    let mut alloc = NameAllocator::new();
    assert_eq!(alloc.assign(&parts(Role::Button, "")), "btn0");
    assert_eq!(alloc.assign(&parts(Role::Button, "")), "btn1");
    assert_eq!(alloc.assign(&parts(Role::Group, "")), "grp0");
  }

  #[test]
  fn literal_label_colliding_with_suffix_stays_unique() {
    let mut alloc = NameAllocator::new();
    assert_eq!(alloc.assign(&parts(Role::Button, "Save1")), "btnSave1");
    assert_eq!(alloc.assign(&parts(Role::Button, "Save")), "btnSave");
    // The duplicate of "Save" would be btnSave1, which is taken.
    assert_eq!(alloc.assign(&parts(Role::Button, "Save")), "btnSave2");
  }

  #[test]
  fn same_label_different_role_does_not_collide() {
    let mut alloc = NameAllocator::new();
    assert_eq!(alloc.assign(&parts(Role::Button, "Save")), "btnSave");
    assert_eq!(alloc.assign(&parts(Role::MenuItem, "Save")), "mniSave");
  }

  #[test]
  fn label_chain_prefers_string_value() {
    let backend = FakeBackend::new();
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    let field = backend.add_child(&win, Role::TextField, Some("Address"));
    backend.set_node_value(&field, Value::String("10 Downing St".into()));

    let np = name_parts(&field).unwrap();
    assert_eq!(np.raw_label, "10 Downing St");
  }

  #[test]
  fn label_chain_falls_back_to_title_then_description() {
    let backend = FakeBackend::new();
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");

    let titled = backend.add_child(&win, Role::Button, Some("Save"));
    assert_eq!(name_parts(&titled).unwrap().raw_label, "Save");

    let untitled = backend.add_child(&win, Role::Button, None);
    backend.set_node_description(&untitled, "close drawer");
    assert_eq!(name_parts(&untitled).unwrap().raw_label, "close drawer");
  }

  #[test]
  fn stale_handle_surfaces_as_stale() {
    let backend = FakeBackend::new();
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    let button = backend.add_child(&win, Role::Button, Some("Save"));
    backend.invalidate(&button);
    assert!(matches!(name_parts(&button), Err(AxRemoteError::Stale)));
  }
}

#[cfg(test)]
mod proptests {
  use super::*;
  use proptest::prelude::*;

  proptest! {
    // Every name handed out within one allocator is unique, whatever the
    // mix of roles and labels.
    #[test]
    fn assigned_names_are_unique(labels in proptest::collection::vec("[a-zA-Z0-9 ]{0,8}", 0..64)) {
      let mut alloc = NameAllocator::new();
      let mut seen = std::collections::HashSet::new();
      for (i, label) in labels.iter().enumerate() {
        let role = if i % 3 == 0 { Role::Button } else if i % 3 == 1 { Role::StaticText } else { Role::TextField };
        let parts = NameParts {
          role,
          raw_label: label.clone(),
          stripped_label: strip_label(role, label),
        };
        let name = alloc.assign(&parts);
        prop_assert!(seen.insert(name));
      }
    }
  }
}
