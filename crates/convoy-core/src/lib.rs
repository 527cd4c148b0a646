pub mod cascade;
pub mod config;
pub mod differ;
pub mod env_file;
pub mod error;
pub mod image;
pub mod inventory;
pub mod invalidation;
pub mod paths;
pub mod platform;
pub mod reconcile;
pub mod report;
pub mod republish;
pub mod settings;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConvoyError, Result};
