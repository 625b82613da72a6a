use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
