pub mod config;
pub mod deploy;
pub mod invalidate;
pub mod status;
