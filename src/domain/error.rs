use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    CommandMalformed(String),
    #[error("{0}")]
    Unexpected(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Unexpected(value.to_string())
    }
}
impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        Self::Unexpected(value.to_string())
    }
}
impl From<sqlx::migrate::MigrateError> for Error {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::Unexpected(format!("Failed to run migrations: {value}"))
    }
}
impl From<lapin::Error> for Error {
    fn from(value: lapin::Error) -> Self {
        Self::Unexpected(format!("Failed to talk to the task broker: {value}"))
    }
}
