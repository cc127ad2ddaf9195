/*!
Object map construction and lookup.

One depth-first pre-order pass over a resolved window's live subtree
builds the whole map: every node is inserted exactly once through the
naming engine, children are named at discovery in platform order, and
the map is committed only when the walk completes. A stale fault at any
point abandons the local map, so a partially-populated map is never
reachable by later lookups.
*/

use log::debug;

use super::{ObjectEntry, ObjectMap, RegistryStore};
use crate::a11y::Role;
use crate::backend::{Backend, ElementHandle};
use crate::naming::{self, name_parts, NameAllocator, NamePattern};
use crate::types::{AxRemoteResult, ObjectNode};

struct Pending<H> {
  handle: H,
  name: String,
  parts: crate::naming::NameParts,
  parent: Option<String>,
  child_index: usize,
}

impl<B: Backend> RegistryStore<B> {
  /// Make sure `window_name` has a committed object map.
  pub(crate) fn ensure_map(&mut self, window_name: &str, force: bool) -> AxRemoteResult<()> {
    if force {
      self.maps.remove(window_name);
    }
    if self.maps.contains_key(window_name) {
      return Ok(());
    }
    let map = self.build_map(window_name)?;
    debug!("object map built for {window_name:?}: {} nodes", map.order.len());
    self.maps.insert(window_name.to_string(), map);
    Ok(())
  }

  fn build_map(&mut self, window_name: &str) -> AxRemoteResult<ObjectMap<B::Handle>> {
    let root = self.with_window_handle(window_name, Clone::clone)?;

    let mut map = ObjectMap::new();
    let mut alloc = NameAllocator::new();

    let root_parts = name_parts(&root)?;
    let root_name = alloc.assign(&root_parts);
    let mut stack = vec![Pending {
      handle: root,
      name: root_name,
      parts: root_parts,
      parent: None,
      child_index: 0,
    }];

    while let Some(node) = stack.pop() {
      let children = naming::map_backend(node.handle.children())?;

      // Name children at discovery so sibling order is the platform order.
      let mut named = Vec::with_capacity(children.len());
      for (child_index, child) in children.into_iter().enumerate() {
        let parts = name_parts(&child)?;
        let name = alloc.assign(&parts);
        named.push(Pending {
          handle: child,
          name,
          parts,
          parent: Some(node.name.clone()),
          child_index,
        });
      }

      let record = ObjectNode {
        name: node.name.clone(),
        role: node.parts.role,
        label: node.parts.raw_label.clone(),
        parent: node.parent,
        children: named.iter().map(|c| c.name.clone()).collect(),
        child_index: node.child_index,
        map_index: map.order.len(),
      };
      map.order.push(node.name.clone());
      map.nodes.insert(
        node.name,
        ObjectEntry {
          record,
          handle: node.handle,
          stripped_label: node.parts.stripped_label,
        },
      );

      // Reverse push keeps pre-order: first child's subtree walks first.
      for pending in named.into_iter().rev() {
        stack.push(pending);
      }
    }

    Ok(map)
  }

  /// Match an object pattern against a committed map in traversal order.
  pub(crate) fn find_in_map(
    &self,
    window_name: &str,
    pattern: &NamePattern,
    role_filter: Option<Role>,
  ) -> Option<ObjectNode> {
    let map = self.maps.get(window_name)?;
    for name in &map.order {
      let entry = map.nodes.get(name)?;
      if let Some(role) = role_filter {
        if entry.record.role != role {
          continue;
        }
      }
      if pattern.matches(name, &entry.record.label, &entry.stripped_label) {
        return Some(entry.record.clone());
      }
    }
    None
  }
}
