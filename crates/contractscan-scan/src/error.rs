use contractscan_core::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no file supplied: upload is empty")]
    EmptyUpload,

    #[error("failed to create preview: {0}")]
    Preview(#[from] std::io::Error),

    #[error("failed to persist preview: {0}")]
    Persist(#[from] tempfile::PathPersistError),

    #[error("cannot express {} as a file URL", .0.display())]
    FileUrl(std::path::PathBuf),

    #[error("preview already released")]
    PreviewReleased,

    #[error(transparent)]
    Session(#[from] SessionError),
}
