mod client;
mod dispatch;

pub use client::JenkinsClient;
pub use dispatch::{Dispatcher, TriggerOutcome};
