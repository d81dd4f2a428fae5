use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid recurrence spec: {0}")]
    InvalidSpec(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Local time {0} does not exist in the target timezone")]
    InvalidLocalTime(String),

    #[error("Malformed schedule expression: {0}")]
    MalformedExpression(String),

    #[error("Schedule can never fire: {0}")]
    UnsatisfiableSchedule(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
