use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    Http { status: u16, url: String, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing configuration: {key}")]
    MissingConfig { key: String },

    #[error("Template placeholder '{{{placeholder}}}' has no value")]
    Template { placeholder: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        DeskError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
