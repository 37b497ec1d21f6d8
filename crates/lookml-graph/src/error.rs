use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Lookml(#[from] lookml_core::LookmlError),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),
}
