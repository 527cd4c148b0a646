use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvoyError {
    #[error("no environment selected: pass --env or set default_env in ~/.convoy.yaml")]
    NoEnvironment,

    #[error("fleet config for environment '{env}' not found (looked in {searched})")]
    ConfigNotFound { env: String, searched: String },

    #[error("no services selected")]
    NoServicesSelected,

    #[error("tag already defined in image reference '{0}'")]
    AmbiguousImageReference(String),

    #[error("no image to deploy for service '{0}': declare a registry or pass --container-image")]
    NoImageSource(String),

    #[error(
        "nothing to deploy: pass --container-image or --tag, or confirm a redeploy with --force"
    )]
    NothingToDeploy,

    #[error("invalid env file line {line}: {reason}")]
    EnvFile { line: usize, reason: String },

    #[error("invalid registry authorization token: {0}")]
    RegistryToken(String),

    #[error("error while registering task definition '{family}': {detail}")]
    Registration { family: String, detail: String },

    #[error("error while updating service '{service}': {detail}")]
    Activation { service: String, detail: String },

    #[error("republish to '{target}' failed: {detail}")]
    Republish { target: String, detail: String },

    #[error("child task '{child}' not updated: {detail}")]
    Cascade { child: String, detail: String },

    #[error("{0}")]
    Platform(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ConvoyError {
    /// Activation, republish and cascade failures are reported per service
    /// and the run moves on. Everything else stops the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ConvoyError::Activation { .. }
                | ConvoyError::Republish { .. }
                | ConvoyError::Cascade { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvoyError>;
