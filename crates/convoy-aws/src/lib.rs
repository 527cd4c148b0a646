//! `convoy-aws` drives the `aws` and `docker` command-line tools to
//! implement the `convoy-core` platform traits.
//!
//! ```text
//! AwsCli     ControlPlane (ecs) + Registry (ecr) + EdgeCache (cloudfront)
//! DockerCli  ContainerRuntime
//! ```
//!
//! Every call is a subprocess: `aws <service> <operation> --cli-input-json`
//! with JSON output decoded into the core types. Failures surface as
//! [`AwsError`] and convert into `ConvoyError::Platform` at the trait
//! boundary.

pub mod cloudfront;
pub mod docker;
pub mod ecr;
pub mod ecs;
pub mod error;

pub(crate) mod process;

pub use docker::DockerCli;
pub use error::AwsError;
pub use process::AwsCli;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AwsError>;
