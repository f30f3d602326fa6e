pub mod coordinator;
#[cfg(feature = "web")]
pub mod web;
