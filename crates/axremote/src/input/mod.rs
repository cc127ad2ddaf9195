/*!
Hardware event synthesis: key/mouse codec, combo grammar, replay queue.

The codec translates printable characters and symbolic key names into the
virtual key codes the event-posting primitive expects; the queue batches
events and replays them in order with inter-event pacing.
*/

mod combo;
mod keymap;
mod queue;

pub use combo::parse_combo;
pub use keymap::{lookup_char, lookup_symbolic, KeyCode, KeyStroke, Modifier, ModifierFlags};
pub use queue::{EventQueue, DEFAULT_EVENT_INTERVAL};

/// One hardware keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  /// Virtual key code.
  pub code: KeyCode,
  /// Key-down (true) or key-up (false).
  pub down: bool,
  /// Modifier-flag bitmask active while this event posts.
  pub flags: ModifierFlags,
}

/// Mouse buttons the synthesizer can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
  /// Primary button.
  Left,
  /// Secondary button.
  Right,
}

/// Phase of a synthesized mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MousePhase {
  /// Button pressed.
  Down,
  /// Button released.
  Up,
  /// Pointer moved while the button is held (drag step).
  Moved,
}

/// One hardware mouse-button event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
  /// Which button.
  pub button: MouseButton,
  /// Down, up or drag-move.
  pub phase: MousePhase,
  /// Screen X coordinate.
  pub x: f64,
  /// Screen Y coordinate.
  pub y: f64,
  /// Click count recorded on the event so the host OS can distinguish
  /// single/double/triple clicks posted at the same coordinate.
  pub click_count: u8,
  /// Modifier-flag bitmask active while this event posts.
  pub flags: ModifierFlags,
}
