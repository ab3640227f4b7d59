#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("position has been deleted")]
    InvalidNode,

    #[error("the base position carries no value")]
    SentinelAccess,

    #[error("pre position does not precede post position")]
    InvalidInterval,

    #[error("list already holds the maximum of {limit} positions")]
    CapacityExceeded { limit: usize },

    #[error("relationships form a cycle through {element}")]
    Cycle { element: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
