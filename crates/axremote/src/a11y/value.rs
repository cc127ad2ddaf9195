/*!
Element values.

Values represent the current state of interactive elements:
text content, numeric positions, boolean states.
*/

use serde::{Deserialize, Serialize};

/// Typed value for an accessibility element.
///
/// Number is unified f64 for JSON compatibility; integer-valued elements
/// (steppers) store whole floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
#[serde(rename_all = "lowercase")]
pub enum Value {
  /// Text content (text fields, labels).
  String(String),

  /// Numeric value (sliders, steppers, progress bars).
  Number(f64),

  /// Boolean state (checkboxes, radio buttons).
  Boolean(bool),
}

impl Value {
  /// Get as string reference if this is a String value.
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(s) => Some(s),
      Self::Number(_) | Self::Boolean(_) => None,
    }
  }

  /// Render for display and label derivation.
  #[allow(clippy::cast_possible_truncation)] // whole floats display as integers
  pub fn to_display_string(&self) -> String {
    match self {
      Self::String(s) => s.clone(),
      Self::Number(n) => {
        if n.fract() == 0.0 && n.is_finite() {
          format!("{}", *n as i64)
        } else {
          format!("{n}")
        }
      }
      Self::Boolean(b) => b.to_string(),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Self::String(s.to_string())
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Self::Boolean(b)
  }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self {
    Self::Number(n)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn whole_numbers_display_without_fraction() {
    assert_eq!(Value::Number(3.0).to_display_string(), "3");
    assert_eq!(Value::Number(3.5).to_display_string(), "3.5");
  }

  #[test]
  fn serde_shape_is_tagged() {
    let v = Value::String("hello".into());
    let json = serde_json::to_string(&v).unwrap();
    assert_eq!(json, r#"{"type":"string","value":"hello"}"#);
  }
}
