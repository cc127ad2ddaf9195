/*!
Semantic UI roles and the naming contract attached to them.

Roles describe what an element *is* in the UI hierarchy. Platform-specific
role strings are mapped in `backend/macos/mapping.rs`. The abbreviation
table here is the prefix every generated object name starts with.
*/

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Semantic UI role.
///
/// Platform mappings (macOS `AXRole` strings) are handled by the backend
/// layer; the core only ever sees this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  // === Structural / Containers ===
  Application,
  Window,
  Dialog,
  Sheet,
  Group,
  ScrollArea,
  Toolbar,

  // === Navigation ===
  Menu,
  MenuBar,
  MenuItem,
  Tab,
  TabList,

  // === Collections ===
  List,
  ListItem,
  Table,
  Row,
  Cell,
  Tree,
  TreeItem,

  // === Interactive ===
  Button,
  Link,
  TextField,
  TextArea,
  SearchField,
  ComboBox,
  Checkbox,
  RadioButton,
  Slider,
  Stepper,
  ProgressBar,

  // === Static content ===
  StaticText,
  Image,
  Separator,

  // === Fallback ===
  /// Platform role didn't map to anything known. Generated names for these
  /// carry the `ukn` prefix; the mapping layer logs the raw role string so
  /// the gap is visible in diagnostics.
  #[default]
  Unknown,
}

impl Role {
  /// Role abbreviation used as the generated-name prefix.
  pub const fn abbrev(self) -> &'static str {
    match self {
      Self::Application => "app",
      Self::Window => "frm",
      Self::Dialog | Self::Sheet => "dlg",
      Self::Group => "grp",
      Self::ScrollArea => "scr",
      Self::Toolbar => "tbar",
      Self::Menu => "mnu",
      Self::MenuBar => "mbr",
      Self::MenuItem => "mni",
      Self::Tab => "ptab",
      Self::TabList => "ptl",
      Self::List => "lst",
      Self::ListItem => "lsti",
      Self::Table => "tbl",
      Self::Row => "row",
      Self::Cell => "cell",
      Self::Tree => "tree",
      Self::TreeItem => "tri",
      Self::Button => "btn",
      Self::Link => "lnk",
      Self::TextField | Self::TextArea | Self::SearchField => "txt",
      Self::ComboBox => "cbo",
      Self::Checkbox => "chk",
      Self::RadioButton => "rdo",
      Self::Slider => "sldr",
      Self::Stepper => "spn",
      Self::ProgressBar => "pbar",
      Self::StaticText => "lbl",
      Self::Image => "img",
      Self::Separator => "sep",
      Self::Unknown => "ukn",
    }
  }

  /// Is this a top-level window-like role?
  pub const fn is_window(self) -> bool {
    matches!(self, Self::Window | Self::Dialog | Self::Sheet)
  }

  /// Characters stripped from label text when generating names.
  ///
  /// Window titles keep their punctuation (only whitespace is dropped);
  /// every other role additionally drops `:`, `.` and `_` so a label like
  /// `"Name:"` yields the same name as `"Name"`.
  pub const fn strip_charset(self) -> &'static [char] {
    if self.is_window() {
      &[' ', '\t', '\n', '\r']
    } else {
      &[' ', '\t', '\n', '\r', ':', '.', '_']
    }
  }

  /// Can this element hold a caller-visible text value?
  pub const fn is_text_input(self) -> bool {
    matches!(
      self,
      Self::TextField | Self::TextArea | Self::SearchField | Self::ComboBox
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn window_roles_share_frame_prefix() {
    assert_eq!(Role::Window.abbrev(), "frm");
    assert_eq!(Role::Dialog.abbrev(), "dlg");
    assert_eq!(Role::Sheet.abbrev(), "dlg");
  }

  #[test]
  fn text_roles_collapse_to_txt() {
    assert_eq!(Role::TextField.abbrev(), "txt");
    assert_eq!(Role::TextArea.abbrev(), "txt");
    assert_eq!(Role::SearchField.abbrev(), "txt");
  }

  #[test]
  fn windows_strip_whitespace_only() {
    assert!(!Role::Window.strip_charset().contains(&':'));
    assert!(Role::Button.strip_charset().contains(&':'));
    assert!(Role::Button.strip_charset().contains(&'.'));
    assert!(Role::Button.strip_charset().contains(&'_'));
  }

  #[test]
  fn unknown_role_has_a_prefix() {
    assert_eq!(Role::Unknown.abbrev(), "ukn");
  }
}
