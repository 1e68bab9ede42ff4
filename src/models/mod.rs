//! Data models for the coastal alert backend.
//!
//! Field names are camelCase on the wire.

mod alert;
mod dispatch;
mod recipient;
mod report;
mod user;

pub use alert::*;
pub use dispatch::*;
pub use recipient::*;
pub use report::*;
pub use user::*;
