use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServeError>;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid model URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Could not download s3://{bucket}/{key}: {reason}")]
    Download {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("index->name JSON mapping error: {0}")]
    LabelMapping(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed image payload: {0}")]
    Payload(String),

    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Could not create image from raw data: {0}")]
    Image(#[from] image::ImageError),

    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    #[error("Label mapping failed: {0}")]
    Mapping(String),
}

impl ServeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn label_mapping(msg: impl Into<String>) -> Self {
        Self::LabelMapping(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }
}
