pub mod assessment;
pub mod config;
pub mod error;
pub mod platform;
pub mod scoring;
pub mod server;
pub mod webhook;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
