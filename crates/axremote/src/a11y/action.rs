/*!
Accessibility actions.

Actions are operations that can be performed on UI elements.
Platform-specific action strings are mapped in `backend/macos/mapping.rs`.
*/

use serde::{Deserialize, Serialize};

/// Platform-agnostic action that can be performed on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  /// Primary activation (click, press).
  Press,

  /// Show context menu or dropdown.
  ShowMenu,

  /// Increase value (slider, stepper).
  Increment,

  /// Decrease value (slider, stepper).
  Decrement,

  /// Confirm/submit action.
  Confirm,

  /// Cancel operation.
  Cancel,

  /// Bring element to front / give focus.
  Raise,
}
