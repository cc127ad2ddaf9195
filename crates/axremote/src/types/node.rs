/*! Object node records - one entry per element in a window's object map. */

use serde::{Deserialize, Serialize};

use crate::a11y::Role;

/// One node in a window's fully-traversed object map.
///
/// Invariants maintained by the registry:
/// - `name` is unique within one window's map
/// - `children` is ordered and mirrors the live subtree at capture time
/// - `parent` links form a tree rooted at the window (no cycles); the map
///   is the sole owner of node records, handles are borrowed from the OS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectNode {
  /// Generated name, e.g. `btnSave` or `btnSave1` for a duplicate label.
  pub name: String,
  /// Semantic role of the element.
  pub role: Role,
  /// Raw label text the name was derived from (empty if unlabeled).
  pub label: String,
  /// Generated name of the parent node; `None` for the window root.
  pub parent: Option<String>,
  /// Generated names of direct children, in traversal order.
  pub children: Vec<String>,
  /// Position among the parent's children (0-based).
  pub child_index: usize,
  /// Insertion position in the map's traversal order (0-based).
  pub map_index: usize,
}
