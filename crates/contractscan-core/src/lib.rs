pub mod gate;
pub mod progress;
pub mod session;
pub mod step;
pub mod upload;

pub use gate::DateGate;
pub use progress::{Connector, Marker, ProgressView, StepLine, Tone, render_progress};
pub use session::{Failure, ScanSession, ScanSnapshot, SessionError};
pub use step::{STEP_ORDER, ScanStep, StepId, StepStatus};
pub use upload::Upload;
