use convoy_core::ConvoyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("'{0}' executable not found on PATH")]
    BinaryNotFound(&'static str),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to parse {context} output: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response is missing {0}")]
    MissingField(&'static str),

    #[error("output is not UTF-8: {0}")]
    Decode(String),
}

impl From<AwsError> for ConvoyError {
    fn from(e: AwsError) -> Self {
        ConvoyError::Platform(e.to_string())
    }
}
