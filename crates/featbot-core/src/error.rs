use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("field must not be empty: {0}")]
    EmptyField(&'static str),
}
