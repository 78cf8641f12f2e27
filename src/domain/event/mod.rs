//! Events exchanged between the pipeline and its neighbours

mod dead_letter;
mod evaluation;
mod upload;

pub use dead_letter::{DeadLetterRecord, ProcessingStage};
pub use evaluation::EvaluationRequest;
pub use upload::UploadNotification;
