/*! Core types for axremote. */

#![allow(missing_docs)]

mod error;
mod ids;
mod node;
mod timeouts;
mod window;

pub use error::{AxRemoteError, AxRemoteResult};
pub use ids::ProcessId;
pub use node::ObjectNode;
pub use timeouts::Timeouts;
pub use window::WindowRecord;
