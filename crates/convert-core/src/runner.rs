//! Job runner
//!
//! Each dispatched job gets its own tokio task. The caller only waits for the
//! initial status message; downloading, converting and cleaning up happen in
//! the background. A failing or panicking job ends in exactly one failure
//! message and never affects other jobs.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use convert_types::PayloadSource;

use crate::error::JobError;
use crate::gateway::{Markup, MessageRef, MessagingGateway, OutgoingText};
use crate::job::{Job, JobOutcome, JobReport};
use crate::registry::{ConversionRequest, ConverterRegistry, JobInput};

#[derive(Clone)]
pub struct JobRunner<G, R> {
    gateway: G,
    registry: R,
    work_dir: PathBuf,
    reports: Option<mpsc::UnboundedSender<JobReport>>,
}

impl<G, R> JobRunner<G, R>
where
    G: MessagingGateway,
    R: ConverterRegistry,
{
    /// Jobs get a scratch directory named after their id under `work_dir`.
    pub fn new(gateway: G, registry: R, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            registry,
            work_dir: work_dir.into(),
            reports: None,
        }
    }

    /// Send a [`JobReport`] for every finished job to `reports`.
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<JobReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Announce the job and start it in the background.
    ///
    /// Returns once the status message is sent (or failed to send); the job
    /// itself is still running.
    pub async fn dispatch(&self, job: Job) -> Uuid {
        let status = match job.operation.status_text() {
            Some(text) => {
                let message = OutgoingText::new(job.status_sink.chat_id, text)
                    .reply_to(job.status_sink.reply_to)
                    .markup(Markup::RemoveKeyboard);
                match self.gateway.reply(message).await {
                    Ok(sent) => Some(sent),
                    Err(e) => {
                        warn!(job_id = %job.id, error = %e, "Failed to send status message");
                        None
                    }
                }
            }
            None => None,
        };

        info!(
            job_id = %job.id,
            owner = %job.owner,
            operation = job.operation.key(),
            "Dispatching job"
        );

        let job_id = job.id;
        let runner = self.clone();
        tokio::spawn(async move {
            runner.run(job, status).await;
        });
        job_id
    }

    async fn run(self, job: Job, status: Option<MessageRef>) {
        let started = Instant::now();
        let job_dir = self.work_dir.join(job.id.to_string());

        let result = match AssertUnwindSafe(self.execute(&job, &job_dir))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(JobError::Panicked(panic_message(panic.as_ref()))),
        };

        if let Err(e) = tokio::fs::remove_dir_all(&job_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(job_id = %job.id, error = %e, "Failed to remove job directory");
            }
        }

        if let Some(status) = status {
            if let Err(e) = self.gateway.delete(status).await {
                debug!(job_id = %job.id, error = %e, "Failed to delete status message");
            }
        }

        let outcome = match result {
            Ok(()) => {
                info!(
                    job_id = %job.id,
                    operation = job.operation.key(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job succeeded"
                );
                JobOutcome::Succeeded
            }
            Err(e) => {
                error!(
                    job_id = %job.id,
                    operation = job.operation.key(),
                    error = %e,
                    "Job failed"
                );
                let message = OutgoingText::new(job.status_sink.chat_id, e.user_message())
                    .reply_to(job.status_sink.reply_to);
                if let Err(send_err) = self.gateway.reply(message).await {
                    warn!(job_id = %job.id, error = %send_err, "Failed to send failure message");
                }
                JobOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        if let Some(reports) = &self.reports {
            let report = JobReport {
                job_id: job.id,
                owner: job.owner.clone(),
                operation: job.operation.key(),
                outcome,
                elapsed: started.elapsed(),
            };
            if reports.send(report).is_err() {
                debug!(job_id = %job.id, "Report receiver dropped");
            }
        }
    }

    async fn execute(&self, job: &Job, job_dir: &Path) -> Result<(), JobError> {
        tokio::fs::create_dir_all(job_dir).await?;

        let input = match (&job.input.source, job.input.source.file_id()) {
            (PayloadSource::Text { text }, _) => JobInput::Text { text: text.clone() },
            (source, Some(file_id)) => {
                let file_name = source
                    .file_name()
                    .unwrap_or_else(|| "input".to_string());
                let dest = job_dir.join(safe_file_name(&file_name));
                debug!(job_id = %job.id, file_id, dest = %dest.display(), "Downloading input");
                let path = self
                    .gateway
                    .download(file_id.to_string(), dest)
                    .await
                    .map_err(|e| JobError::Download(e.to_string()))?;
                JobInput::File { path, file_name }
            }
            (_, None) => return Err(JobError::Download("payload carries no file".to_string())),
        };

        let request = ConversionRequest {
            job_id: job.id,
            operation: job.operation.clone(),
            input,
            work_dir: job_dir.to_path_buf(),
            chat_id: job.status_sink.chat_id,
            reply_to: job.status_sink.reply_to,
        };

        self.registry
            .run(request)
            .await
            .map_err(|e| JobError::Converter(e.to_string()))
    }
}

/// Last path component of a user-supplied name
fn safe_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("input")
        .to_string()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
