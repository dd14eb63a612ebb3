pub mod intake;
pub mod orchestrator;
pub mod state;

pub use intake::PendingFile;
pub use orchestrator::{SubmitOutcome, Uploader};
pub use state::{CheckSession, UPLOAD_ERROR_MESSAGE};
