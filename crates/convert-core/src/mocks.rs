//! Mock implementations for testing the router and runner without Telegram.
//!
//! Enabled with the `test-support` feature:
//!
//! ```toml
//! [dev-dependencies]
//! convert-core = { path = "...", features = ["test-support"] }
//! ```

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, AtomicI32, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::clock::Clock;
use crate::gateway::{MessageRef, MessagingGateway, OutgoingFile, OutgoingText};
use crate::registry::{ConversionRequest, ConverterRegistry};

// ── MockGateway ───────────────────────────────────────────────────────────────

/// Every call made against [`MockGateway`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Reply(OutgoingText),
    Download { file_id: String, dest: PathBuf },
    Delete(MessageRef),
    Upload(OutgoingFile),
}

/// Records outbound traffic. Downloads write a small placeholder file.
#[derive(Clone)]
pub struct MockGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    next_message_id: Arc<AtomicI32>,
    fail_replies: Arc<AtomicBool>,
    fail_downloads: Arc<AtomicBool>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            next_message_id: Arc::new(AtomicI32::new(1000)),
            fail_replies: Arc::new(AtomicBool::new(false)),
            fail_downloads: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<OutgoingText> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Reply(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies().into_iter().map(|m| m.text).collect()
    }

    pub fn last_reply(&self) -> Option<OutgoingText> {
        self.replies().pop()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Download { file_id, .. } => Some(file_id),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Delete(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<OutgoingFile> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::Upload(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make `reply` fail until re-enabled.
    pub fn fail_replies(&self, fail: bool) {
        self.fail_replies.store(fail, Ordering::SeqCst);
    }

    /// Make `download` fail until re-enabled.
    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_ref(&self, chat_id: i64) -> MessageRef {
        MessageRef::new(chat_id, self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Debug)]
pub struct MockGatewayError(pub String);

impl std::fmt::Display for MockGatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockGatewayError {}

impl MessagingGateway for MockGateway {
    type Error = MockGatewayError;

    async fn reply(&self, message: OutgoingText) -> Result<MessageRef, MockGatewayError> {
        let chat_id = message.chat_id;
        self.record(GatewayCall::Reply(message));
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(MockGatewayError("reply rejected".to_string()));
        }
        Ok(self.next_ref(chat_id))
    }

    async fn download(&self, file_id: String, dest: PathBuf) -> Result<PathBuf, MockGatewayError> {
        self.record(GatewayCall::Download {
            file_id: file_id.clone(),
            dest: dest.clone(),
        });
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(MockGatewayError(format!("download of {} failed", file_id)));
        }
        tokio::fs::write(&dest, file_id.as_bytes())
            .await
            .map_err(|e| MockGatewayError(e.to_string()))?;
        Ok(dest)
    }

    async fn delete(&self, message: MessageRef) -> Result<(), MockGatewayError> {
        self.record(GatewayCall::Delete(message));
        Ok(())
    }

    async fn upload(&self, file: OutgoingFile) -> Result<MessageRef, MockGatewayError> {
        let chat_id = file.chat_id;
        self.record(GatewayCall::Upload(file));
        Ok(self.next_ref(chat_id))
    }
}

// ── MockRegistry ──────────────────────────────────────────────────────────────

/// Records conversion requests; can be told to fail, panic or hold jobs.
#[derive(Clone, Default)]
pub struct MockRegistry {
    requests: Arc<Mutex<Vec<ConversionRequest>>>,
    failure: Arc<Mutex<Option<String>>>,
    panic_on_run: Arc<AtomicBool>,
    gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Fail every subsequent run with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    pub fn panic_on_run(&self) {
        self.panic_on_run.store(true, Ordering::SeqCst);
    }

    /// Block runs until permits are added to the returned semaphore, one per job.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[derive(Debug)]
pub struct MockConverterError(pub String);

impl std::fmt::Display for MockConverterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockConverterError {}

impl ConverterRegistry for MockRegistry {
    type Error = MockConverterError;

    async fn run(&self, request: ConversionRequest) -> Result<(), MockConverterError> {
        self.requests.lock().unwrap().push(request);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| MockConverterError(e.to_string()))?
                .forget();
        }

        if self.panic_on_run.load(Ordering::SeqCst) {
            panic!("mock converter panicked");
        }
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(reason) => Err(MockConverterError(reason)),
            None => Ok(()),
        }
    }
}

// ── MockClock ─────────────────────────────────────────────────────────────────

/// Manually advanced clock.
#[derive(Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc::now())),
        }
    }
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap();
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
