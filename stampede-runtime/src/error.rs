use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Run failed: {0}")]
    Run(#[from] stampede::RunError),

    #[error("Unable to render report: {0}")]
    Report(#[from] serde_json::Error),
}
