use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuestListError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Client-side validation failure, raised before any request is sent.
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response; `message` comes from the `error` field of the body.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The signed-in host may not perform this action right now.
    #[error("{0}")]
    Forbidden(String),

    #[error("Guest {0} is not on this list")]
    NotFound(i64),
}

impl serde::Serialize for GuestListError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GuestListError>;
