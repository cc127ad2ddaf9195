/*! Branded ID types for type-safe entity references. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Process ID - branded type to distinguish from other u32 values.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
pub struct ProcessId(pub u32);

impl ProcessId {
  /// The raw OS process identifier.
  pub const fn as_u32(self) -> u32 {
    self.0
  }
}
