use std::future::Future;
use std::path::PathBuf;
use uuid::Uuid;

use crate::job::Operation;

/// Input materialized for a converter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    /// Downloaded file, with the name the user knows it by
    File { path: PathBuf, file_name: String },
    /// Text payload: pending text, a link or a magnet URI
    Text { text: String },
}

/// Everything a converter needs to run one job and deliver the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub job_id: Uuid,
    pub operation: Operation,
    pub input: JobInput,
    /// Per-job scratch directory; removed by the runner afterwards
    pub work_dir: PathBuf,
    pub chat_id: i64,
    pub reply_to: i32,
}

impl ConversionRequest {
    pub fn target_ext(&self) -> Option<&str> {
        self.operation.target_ext()
    }
}

/// Pluggable converters keyed by operation.
///
/// A registry owns delivery of its results: when `run` returns `Ok` the
/// artifact is already in the chat.
pub trait ConverterRegistry: Send + Sync + Clone + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn run(&self, request: ConversionRequest) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
