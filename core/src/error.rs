use thiserror::Error;

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Message catalog is empty, no fortune can be drawn")]
    EmptyCatalog,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed string tables: {0}")]
    Strings(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CookieError>;
