/*!
Caller-supplied name patterns.

Scripts may address an object by generated id (`btnSave`), exact label
(`Save`), glob (`btn*Save`) or normalized label (`SaveAs` for a control
labeled `"Save As:"`) interchangeably; matching tries each in turn.
*/

use glob::Pattern;

use crate::a11y::Role;

/// A compiled caller pattern.
///
/// Matching is total: a string that does not compile as a glob falls back
/// to literal comparison instead of failing.
#[derive(Debug, Clone)]
pub struct NamePattern {
  raw: String,
  glob: Option<Pattern>,
  stripped_raw: String,
  stripped_glob: Option<Pattern>,
}

impl NamePattern {
  /// Compile a caller pattern.
  pub fn new(pattern: &str) -> Self {
    // The stripped form uses the generic (non-window) charset so
    // "Save As:" and "SaveAs" address the same control.
    let stripped_raw = super::strip_label(Role::Button, pattern);
    Self {
      raw: pattern.to_string(),
      glob: Pattern::new(pattern).ok(),
      stripped_glob: Pattern::new(&stripped_raw).ok(),
      stripped_raw,
    }
  }

  /// The original pattern text.
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  fn hit(glob: Option<&Pattern>, raw: &str, candidate: &str) -> bool {
    match glob {
      Some(p) => p.matches(candidate),
      None => raw == candidate,
    }
  }

  /// Test against a generated name, the raw label and the stripped label,
  /// in that order, short-circuiting on the first hit. The final fallback
  /// is punctuation-insensitive: the stripped pattern against the
  /// stripped label.
  pub fn matches(&self, generated: &str, raw_label: &str, stripped_label: &str) -> bool {
    if Self::hit(self.glob.as_ref(), &self.raw, generated) {
      return true;
    }
    if !raw_label.is_empty() && Self::hit(self.glob.as_ref(), &self.raw, raw_label) {
      return true;
    }
    if !stripped_label.is_empty() {
      if Self::hit(self.glob.as_ref(), &self.raw, stripped_label) {
        return true;
      }
      if Self::hit(self.stripped_glob.as_ref(), &self.stripped_raw, stripped_label) {
        return true;
      }
    }
    false
  }
}

impl From<&str> for NamePattern {
  fn from(s: &str) -> Self {
    Self::new(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exact_generated_name_matches() {
    let p = NamePattern::new("btnSave");
    assert!(p.matches("btnSave", "Save", "Save"));
  }

  #[test]
  fn exact_raw_label_matches() {
    let p = NamePattern::new("Save");
    assert!(p.matches("btnSave", "Save", "Save"));
  }

  #[test]
  fn glob_matches_generated_name() {
    let p = NamePattern::new("btn*Save");
    assert!(p.matches("btnDialogSave", "Save file", "Savefile"));
    assert!(!p.matches("btnCancel", "Cancel", "Cancel"));
  }

  #[test]
  fn punctuation_insensitive_fallback() {
    // Caller writes the label with its punctuation; the map stores the
    // stripped form.
    let p = NamePattern::new("Save As:");
    assert!(p.matches("btnSaveAs", "Save As:", "SaveAs"));
    let q = NamePattern::new("user_name");
    assert!(q.matches("txtusername", "user_name", "username"));
  }

  #[test]
  fn invalid_glob_degrades_to_literal() {
    let p = NamePattern::new("btn[Save");
    assert!(p.matches("btn[Save", "", ""));
    assert!(!p.matches("btnSave", "Save", "Save"));
  }

  #[test]
  fn empty_labels_do_not_match_everything() {
    let p = NamePattern::new("*");
    // `*` legitimately matches any generated name...
    assert!(p.matches("btn0", "", ""));
    let q = NamePattern::new("Save");
    // ...but an unlabeled element only matches through its generated name.
    assert!(!q.matches("btn0", "", ""));
  }

  #[test]
  fn question_mark_wildcard() {
    let p = NamePattern::new("btnSave?");
    assert!(p.matches("btnSave1", "Save", "Save"));
    assert!(!p.matches("btnSave", "x", "x"));
  }
}

#[cfg(test)]
mod proptests {
  use super::*;
  use proptest::prelude::*;

  proptest! {
    // Matching is reflexive for the exact generated name and raw label.
    #[test]
    fn reflexive_on_name_and_label(
      name in "[a-z][a-zA-Z0-9]{0,12}",
      label in "[a-zA-Z0-9 ]{1,12}",
    ) {
      let stripped = label.replace(' ', "");
      prop_assert!(NamePattern::new(&name).matches(&name, &label, &stripped));
      prop_assert!(NamePattern::new(&label).matches(&name, &label, &stripped));
    }
  }
}
