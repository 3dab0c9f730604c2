use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Cannot instantiate: {0}")]
    CannotInstantiate(String),

    #[error("Invalid call: {0}")]
    InvalidCall(String),

    #[error(
        "Too few arguments to function {function}(), {passed} passed and {} {expected} expected",
        arity_qualifier(.open_ended)
    )]
    TooFewArguments {
        function: String,
        passed: usize,
        expected: usize,
        open_ended: bool,
    },

    #[error("{function}(): argument #{index} must be of type {expected}")]
    Argument {
        function: String,
        index: usize,
        expected: String,
    },

    #[error("failed to read config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl KernelError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

fn arity_qualifier(open_ended: &bool) -> &'static str {
    if *open_ended { "at least" } else { "exactly" }
}

pub type Result<T> = std::result::Result<T, KernelError>;
