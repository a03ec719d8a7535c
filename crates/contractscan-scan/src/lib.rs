//! Scan orchestration: step sequencing, the effective-date gate, and the
//! lifetime of the local preview copy.

mod error;
pub mod observer;
pub mod pacing;
pub mod preview;
mod scanner;

pub use error::ScanError;
pub use observer::ScanObserver;
pub use pacing::Pacing;
pub use preview::{PreviewHandle, file_url};
pub use scanner::{ActiveScan, Completion, Scanner};
