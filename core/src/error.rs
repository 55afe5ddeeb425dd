use crate::RecipeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("recipe {0} not found")]
    NotFound(RecipeId),

    #[error("recommendation model is not trained")]
    NotTrained,

    /// An index was consulted against a corpus generation it was not built for.
    #[error("stale index: built for generation {found}, corpus is generation {expected}")]
    StaleIndex { expected: u64, found: u64 },

    #[error("duplicate recipe id {0} in corpus")]
    DuplicateRecipe(RecipeId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model persistence failed: {0}")]
    Persistence(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self { Error::Persistence(e.to_string()) }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self { Error::Persistence(e.to_string()) }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self { Error::Persistence(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
