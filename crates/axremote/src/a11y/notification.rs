/*!
Accessibility notifications.

Notifications are events the system fires when UI elements change.
Platform-specific notification strings are mapped in `backend/macos/mapping.rs`.
*/

use serde::{Deserialize, Serialize};

/// Notification kinds the wait mechanism can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
  /// A new element appeared in the observed scope.
  Created,

  /// An element was destroyed and its handle is no longer valid.
  Destroyed,

  /// An element's value changed (text content, slider position, check state).
  ValueChanged,

  /// An element's title/label changed.
  TitleChanged,

  /// Focus moved to an element in the observed scope.
  FocusChanged,

  /// An element's children changed (added/removed).
  ChildrenChanged,
}

impl Notification {
  /// Stable string form used on the wire and in log lines.
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::Destroyed => "destroyed",
      Self::ValueChanged => "value_changed",
      Self::TitleChanged => "title_changed",
      Self::FocusChanged => "focus_changed",
      Self::ChildrenChanged => "children_changed",
    }
  }

  /// Parse the wire form back into a kind.
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "created" => Some(Self::Created),
      "destroyed" => Some(Self::Destroyed),
      "value_changed" => Some(Self::ValueChanged),
      "title_changed" => Some(Self::TitleChanged),
      "focus_changed" => Some(Self::FocusChanged),
      "children_changed" => Some(Self::ChildrenChanged),
      _ => None,
    }
  }
}
