use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShipnoteError {
    #[error("event not found: {0}")]
    EventNotFound(u64),

    #[error("status not found: {0}")]
    StatusNotFound(String),

    #[error("no template available for kind '{0}': neither a custom override nor a built-in default")]
    TemplateUnresolved(String),

    #[error("unknown template kind: {0}")]
    UnknownTemplateKind(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ShipnoteError>;
