/*!
Key codec: characters and symbolic key names to virtual key codes.

The layout table is the US ANSI layout of the host accessibility model.
Characters that require shift on this layout are rewritten internally as
`(base character, +shift)` rather than failing.
*/

use std::ops::{BitOr, BitOrAssign};

use crate::types::{AxRemoteError, AxRemoteResult};

/// Virtual key code understood by the event-posting primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

/// Modifier-flag bitmask carried on synthesized events.
///
/// Bit values mirror the host's hardware event flags so the mask can be
/// handed to the posting primitive unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierFlags(pub u64);

impl ModifierFlags {
  /// Empty mask.
  pub const NONE: Self = Self(0);
  /// Shift held.
  pub const SHIFT: Self = Self(0x0002_0000);
  /// Control held.
  pub const CONTROL: Self = Self(0x0004_0000);
  /// Option/Alt held.
  pub const OPTION: Self = Self(0x0008_0000);
  /// Command held.
  pub const COMMAND: Self = Self(0x0010_0000);

  /// True if every bit of `other` is set in `self`.
  pub const fn contains(self, other: Self) -> bool {
    self.0 & other.0 == other.0
  }

  /// True if no modifier is held.
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// Remove the bits of `other`.
  #[must_use]
  pub const fn without(self, other: Self) -> Self {
    Self(self.0 & !other.0)
  }
}

impl BitOr for ModifierFlags {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    Self(self.0 | rhs.0)
  }
}

impl BitOrAssign for ModifierFlags {
  fn bitor_assign(&mut self, rhs: Self) {
    self.0 |= rhs.0;
  }
}

/// A modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
  /// Shift.
  Shift,
  /// Control.
  Control,
  /// Option (Alt).
  Option,
  /// Command.
  Command,
}

impl Modifier {
  /// The key code posted when this modifier is pressed as a key.
  pub const fn key_code(self) -> KeyCode {
    match self {
      Self::Shift => KeyCode(0x38),
      Self::Control => KeyCode(0x3B),
      Self::Option => KeyCode(0x3A),
      Self::Command => KeyCode(0x37),
    }
  }

  /// The flag bit this modifier contributes while held.
  pub const fn flag(self) -> ModifierFlags {
    match self {
      Self::Shift => ModifierFlags::SHIFT,
      Self::Control => ModifierFlags::CONTROL,
      Self::Option => ModifierFlags::OPTION,
      Self::Command => ModifierFlags::COMMAND,
    }
  }

  /// Parse a symbolic modifier name. Accepts the common aliases.
  pub fn parse(name: &str) -> Option<Self> {
    match name {
      "shift" | "shft" => Some(Self::Shift),
      "ctrl" | "control" => Some(Self::Control),
      "alt" | "option" | "opt" => Some(Self::Option),
      "command" | "cmd" | "meta" => Some(Self::Command),
      _ => None,
    }
  }
}

/// A character resolved against the layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
  /// Base key code.
  pub code: KeyCode,
  /// Whether the layout requires shift to produce the character.
  pub shifted: bool,
}

/// Resolve a printable character to its key code on the US layout.
///
/// Shifted characters (uppercase letters, shifted symbols) come back as
/// the base key plus `shifted = true`.
pub fn lookup_char(c: char) -> AxRemoteResult<KeyStroke> {
  let (code, shifted) = match c {
    'a' => (0x00, false),
    's' => (0x01, false),
    'd' => (0x02, false),
    'f' => (0x03, false),
    'h' => (0x04, false),
    'g' => (0x05, false),
    'z' => (0x06, false),
    'x' => (0x07, false),
    'c' => (0x08, false),
    'v' => (0x09, false),
    'b' => (0x0B, false),
    'q' => (0x0C, false),
    'w' => (0x0D, false),
    'e' => (0x0E, false),
    'r' => (0x0F, false),
    'y' => (0x10, false),
    't' => (0x11, false),
    '1' => (0x12, false),
    '2' => (0x13, false),
    '3' => (0x14, false),
    '4' => (0x15, false),
    '6' => (0x16, false),
    '5' => (0x17, false),
    '=' => (0x18, false),
    '9' => (0x19, false),
    '7' => (0x1A, false),
    '-' => (0x1B, false),
    '8' => (0x1C, false),
    '0' => (0x1D, false),
    ']' => (0x1E, false),
    'o' => (0x1F, false),
    'u' => (0x20, false),
    '[' => (0x21, false),
    'i' => (0x22, false),
    'p' => (0x23, false),
    'l' => (0x25, false),
    'j' => (0x26, false),
    '\'' => (0x27, false),
    'k' => (0x28, false),
    ';' => (0x29, false),
    '\\' => (0x2A, false),
    ',' => (0x2B, false),
    '/' => (0x2C, false),
    'n' => (0x2D, false),
    'm' => (0x2E, false),
    '.' => (0x2F, false),
    '`' => (0x32, false),
    ' ' => (0x31, false),
    '\t' => (0x30, false),
    '\n' => (0x24, false),

    // Shifted symbols on the US layout.
    '!' => (0x12, true),
    '@' => (0x13, true),
    '#' => (0x14, true),
    '$' => (0x15, true),
    '%' => (0x17, true),
    '^' => (0x16, true),
    '&' => (0x1A, true),
    '*' => (0x1C, true),
    '(' => (0x19, true),
    ')' => (0x1D, true),
    '_' => (0x1B, true),
    '+' => (0x18, true),
    '{' => (0x21, true),
    '}' => (0x1E, true),
    '|' => (0x2A, true),
    ':' => (0x29, true),
    '"' => (0x27, true),
    '<' => (0x2B, true),
    '>' => (0x2F, true),
    '?' => (0x2C, true),
    '~' => (0x32, true),

    c if c.is_ascii_uppercase() => {
      let lower = c.to_ascii_lowercase();
      let base = lookup_char(lower)?;
      (base.code.0, true)
    }

    other => {
      return Err(AxRemoteError::UnsupportedKey(other.to_string()));
    }
  };

  Ok(KeyStroke {
    code: KeyCode(code),
    shifted,
  })
}

/// Resolve a symbolic key name (the part between `<` and `>` in a combo).
///
/// Modifier names are handled separately by [`Modifier::parse`]; this table
/// covers the non-modifier specials. Unknown names are a hard failure -
/// an unintended key omission in a GUI test must not pass silently.
pub fn lookup_symbolic(name: &str) -> AxRemoteResult<KeyCode> {
  let code = match name {
    "return" | "enter" => 0x24,
    "tab" => 0x30,
    "space" => 0x31,
    "backspace" | "bksp" => 0x33,
    "escape" | "esc" => 0x35,
    "delete" | "del" => 0x75,
    "home" => 0x73,
    "end" => 0x77,
    "pageup" | "pgup" => 0x74,
    "pagedown" | "pgdown" => 0x79,
    "left" => 0x7B,
    "right" => 0x7C,
    "down" => 0x7D,
    "up" => 0x7E,
    "capslock" => 0x39,
    "f1" => 0x7A,
    "f2" => 0x78,
    "f3" => 0x63,
    "f4" => 0x76,
    "f5" => 0x60,
    "f6" => 0x61,
    "f7" => 0x62,
    "f8" => 0x64,
    "f9" => 0x65,
    "f10" => 0x6D,
    "f11" => 0x67,
    "f12" => 0x6F,
    other => {
      return Err(AxRemoteError::UnsupportedKey(format!("<{other}>")));
    }
  };
  Ok(KeyCode(code))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_characters_resolve_unshifted() {
    let k = lookup_char('a').unwrap();
    assert_eq!(k.code, KeyCode(0x00));
    assert!(!k.shifted);
  }

  #[test]
  fn uppercase_rewrites_as_base_plus_shift() {
    let lower = lookup_char('c').unwrap();
    let upper = lookup_char('C').unwrap();
    assert_eq!(lower.code, upper.code);
    assert!(!lower.shifted);
    assert!(upper.shifted);
  }

  #[test]
  fn shifted_symbols_share_base_codes() {
    assert_eq!(lookup_char('!').unwrap().code, lookup_char('1').unwrap().code);
    assert_eq!(lookup_char('?').unwrap().code, lookup_char('/').unwrap().code);
    assert!(lookup_char('!').unwrap().shifted);
  }

  #[test]
  fn unsupported_character_is_a_hard_failure() {
    assert!(matches!(
      lookup_char('é'),
      Err(AxRemoteError::UnsupportedKey(_))
    ));
  }

  #[test]
  fn symbolic_names_resolve() {
    assert_eq!(lookup_symbolic("return").unwrap(), KeyCode(0x24));
    assert_eq!(lookup_symbolic("esc").unwrap(), KeyCode(0x35));
    assert!(matches!(
      lookup_symbolic("hyperkey"),
      Err(AxRemoteError::UnsupportedKey(_))
    ));
  }

  #[test]
  fn modifier_aliases_parse() {
    assert_eq!(Modifier::parse("cmd"), Some(Modifier::Command));
    assert_eq!(Modifier::parse("command"), Some(Modifier::Command));
    assert_eq!(Modifier::parse("ctrl"), Some(Modifier::Control));
    assert_eq!(Modifier::parse("windows"), None);
  }

  #[test]
  fn flag_mask_operations() {
    let mut flags = ModifierFlags::NONE;
    flags |= ModifierFlags::SHIFT;
    flags |= ModifierFlags::COMMAND;
    assert!(flags.contains(ModifierFlags::SHIFT));
    assert!(!flags.contains(ModifierFlags::CONTROL));
    let released = flags.without(ModifierFlags::SHIFT);
    assert!(!released.contains(ModifierFlags::SHIFT));
    assert!(released.contains(ModifierFlags::COMMAND));
  }
}
