mod diff;
pub mod hook;

pub use diff::DiffClient;
pub use hook::{Hook, Push, EVENT_HEADER};
