use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalloutError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Expected a file at '{0}' but found a folder")]
    NotAFile(String),

    #[error("Expected a folder at '{0}' but found a file")]
    NotAFolder(String),

    #[error("Callout type '{0}' is not tracked")]
    UnknownType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl CalloutError {
    /// Setup collisions: a master document or folder path is occupied by the
    /// wrong kind of entry. These stay broken until the user fixes the vault.
    pub fn is_setup(&self) -> bool {
        matches!(self, CalloutError::NotAFile(_) | CalloutError::NotAFolder(_))
    }

    /// The path a setup error refers to, if any.
    pub fn setup_path(&self) -> Option<&str> {
        match self {
            CalloutError::NotAFile(path) | CalloutError::NotAFolder(path) => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CalloutError>;
