/*!
Key-combination grammar.

A combo string is a sequence of literal characters and `<tag>` tokens.
A tag is either a modifier name (`<command>`, `<shift>`, ...) or a
symbolic key (`<return>`, `<f5>`, ...). Modifiers are pressed when
encountered, held across every following key in the string, and released
in reverse order at the end, mirroring physical key ordering:

`"<command><shift>t"` becomes
command-down, shift-down, t-down, t-up, shift-up, command-up.
*/

use super::keymap::{lookup_char, lookup_symbolic, Modifier, ModifierFlags};
use super::KeyEvent;
use crate::types::{AxRemoteError, AxRemoteResult};

/// Decompose a combo string into press/release steps.
///
/// Unknown tags and untranslatable characters fail with
/// [`AxRemoteError::UnsupportedKey`]; nothing is posted for a combo that
/// does not parse completely.
pub fn parse_combo(combo: &str) -> AxRemoteResult<Vec<KeyEvent>> {
  let mut events = Vec::new();
  let mut held: Vec<Modifier> = Vec::new();
  let mut flags = ModifierFlags::NONE;

  let mut chars = combo.chars();
  while let Some(c) = chars.next() {
    if c == '<' {
      let mut tag = String::new();
      let mut closed = false;
      for t in chars.by_ref() {
        if t == '>' {
          closed = true;
          break;
        }
        tag.push(t);
      }
      if !closed {
        return Err(AxRemoteError::UnsupportedKey(format!("<{tag}")));
      }

      if let Some(modifier) = Modifier::parse(&tag) {
        if !held.contains(&modifier) {
          flags |= modifier.flag();
          events.push(KeyEvent {
            code: modifier.key_code(),
            down: true,
            flags,
          });
          held.push(modifier);
        }
        continue;
      }

      // Not a modifier: must be a symbolic key.
      let code = lookup_symbolic(&tag)?;
      events.push(KeyEvent {
        code,
        down: true,
        flags,
      });
      events.push(KeyEvent {
        code,
        down: false,
        flags,
      });
      continue;
    }

    let stroke = lookup_char(c)?;
    let key_flags = if stroke.shifted {
      flags | ModifierFlags::SHIFT
    } else {
      flags
    };
    events.push(KeyEvent {
      code: stroke.code,
      down: true,
      flags: key_flags,
    });
    events.push(KeyEvent {
      code: stroke.code,
      down: false,
      flags: key_flags,
    });
  }

  // Release held modifiers in reverse order of press.
  for modifier in held.iter().rev() {
    flags = flags.without(modifier.flag());
    events.push(KeyEvent {
      code: modifier.key_code(),
      down: false,
      flags,
    });
  }

  Ok(events)
}
