use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("graph query failed: {0}")]
    Query(String),

    #[error("Neo4j connection failed: {0}")]
    Connection(String),

    #[error("Invalid graph request: {0}")]
    Validation(String),

    #[error("Graph store unavailable: {0}")]
    Unavailable(String),
}

impl GraphError {
    /// Raw cause, without the variant prefix
    pub fn cause(&self) -> &str {
        match self {
            GraphError::Query(msg)
            | GraphError::Connection(msg)
            | GraphError::Validation(msg)
            | GraphError::Unavailable(msg) => msg,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
