/*!
Lazy depth-first producers for enumeration-only callers.

These iterate live handles directly instead of committing a map. They are
finite and not restartable: elements may change between passes, so a
second pass must request a fresh traversal.
*/

use crate::backend::ElementHandle;
use crate::naming::map_backend;
use crate::types::AxRemoteResult;

/// Direct children of one element, yielded lazily.
#[derive(Debug)]
pub struct Children<H> {
  fetched: Option<std::vec::IntoIter<H>>,
  source: Option<H>,
}

impl<H: ElementHandle> Children<H> {
  /// Lazy child iterator; the child list is fetched on first `next`.
  pub fn of(handle: &H) -> Self {
    Self {
      fetched: None,
      source: Some(handle.clone()),
    }
  }
}

impl<H: ElementHandle> Iterator for Children<H> {
  type Item = AxRemoteResult<H>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.fetched.is_none() {
      let source = self.source.take()?;
      match map_backend(source.children()) {
        Ok(children) => self.fetched = Some(children.into_iter()),
        Err(e) => return Some(Err(e)),
      }
    }
    self.fetched.as_mut()?.next().map(Ok)
  }
}

/// All descendants of one element in depth-first pre-order, yielded
/// lazily. A stale fault ends the traversal after yielding the error.
#[derive(Debug)]
pub struct Descendants<H> {
  stack: Vec<H>,
  dead: bool,
}

impl<H: ElementHandle> Descendants<H> {
  /// Lazy descendant iterator rooted at (but not yielding) `handle`.
  pub fn of(handle: &H) -> Self {
    let stack = match handle.children() {
      Ok(mut children) => {
        children.reverse();
        children
      }
      Err(_) => Vec::new(),
    };
    Self { stack, dead: false }
  }
}

impl<H: ElementHandle> Iterator for Descendants<H> {
  type Item = AxRemoteResult<H>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.dead {
      return None;
    }
    let current = self.stack.pop()?;
    match map_backend(current.children()) {
      Ok(children) => {
        for child in children.into_iter().rev() {
          self.stack.push(child);
        }
        Some(Ok(current))
      }
      Err(e) => {
        self.dead = true;
        Some(Err(e))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::a11y::Role;
  use crate::backend::fake::FakeBackend;

  #[test]
  fn descendants_walk_in_preorder() {
    let backend = FakeBackend::new();
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    let group = backend.add_child(&win, Role::Group, Some("G"));
    backend.add_child(&group, Role::Button, Some("A"));
    backend.add_child(&group, Role::Button, Some("B"));
    backend.add_child(&win, Role::Button, Some("C"));

    let labels: Vec<String> = Descendants::of(&win)
      .map(|h| h.unwrap().title().unwrap_or_default())
      .collect();
    assert_eq!(labels, vec!["G", "A", "B", "C"]);
  }

  #[test]
  fn traversal_is_finite_and_not_restartable() {
    let backend = FakeBackend::new();
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    backend.add_child(&win, Role::Button, Some("A"));

    let mut iter = Descendants::of(&win);
    assert!(iter.next().is_some());
    assert!(iter.next().is_none());
    // Exhausted for good.
    assert!(iter.next().is_none());
  }

  #[test]
  fn stale_fault_ends_the_walk() {
    let backend = FakeBackend::new();
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    let group = backend.add_child(&win, Role::Group, Some("G"));
    backend.add_child(&group, Role::Button, Some("A"));
    backend.invalidate(&group);

    let mut iter = Descendants::of(&win);
    assert!(iter.next().unwrap().is_err());
    assert!(iter.next().is_none());
  }

  #[test]
  fn children_yields_one_level_only() {
    let backend = FakeBackend::new();
    backend.add_app("App", 1);
    let win = backend.add_window("App", "Main");
    let group = backend.add_child(&win, Role::Group, Some("G"));
    backend.add_child(&group, Role::Button, Some("A"));

    let count = Children::of(&win).count();
    assert_eq!(count, 1);
  }
}
