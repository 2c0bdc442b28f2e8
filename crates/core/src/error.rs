#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("order routing failed: {0}")]
    Routing(#[from] olr_tables::TableError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
