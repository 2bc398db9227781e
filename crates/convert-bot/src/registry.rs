//! Converter registry backed by in-process handlers and external commands
//!
//! Re-sending a file in another form, `/make` and `/rename` are handled here
//! directly. Every other operation key is looked up in the configured command
//! table and run as a child process inside the job's scratch directory; the
//! files it leaves behind are uploaded as documents.

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use convert_core::{
    ConversionRequest, ConverterError, ConverterRegistry, JobInput, MessagingGateway, Operation,
    OutgoingFile, UploadKind,
};
use convert_types::SpecialOp;

use crate::config::ConverterConfig;

/// Longest stderr excerpt carried into a failure message
const STDERR_TAIL: usize = 300;

#[derive(Clone)]
pub struct ProcessRegistry<G> {
    gateway: G,
    commands: Arc<HashMap<String, String>>,
    timeout: Duration,
}

impl<G: MessagingGateway> ProcessRegistry<G> {
    pub fn new(gateway: G, config: &ConverterConfig) -> Self {
        Self {
            gateway,
            commands: Arc::new(config.commands.clone()),
            timeout: config.timeout(),
        }
    }

    /// Operation keys with a configured command
    pub fn configured(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    async fn deliver(
        &self,
        request: &ConversionRequest,
        path: PathBuf,
        kind: UploadKind,
    ) -> Result<(), ConverterError> {
        let file = OutgoingFile {
            chat_id: request.chat_id,
            reply_to: Some(request.reply_to),
            path,
            kind,
            caption: None,
        };
        self.gateway
            .upload(file)
            .await
            .map_err(|e| ConverterError::Delivery(e.to_string()))?;
        Ok(())
    }

    async fn resend(&self, request: &ConversionRequest, kind: UploadKind) -> Result<(), ConverterError> {
        let (path, _) = file_input(request)?;
        self.deliver(request, path.to_path_buf(), kind).await
    }

    async fn make(&self, request: &ConversionRequest) -> Result<(), ConverterError> {
        let text = match &request.input {
            JobInput::Text { text } => text,
            JobInput::File { .. } => {
                return Err(ConverterError::Failed("/make needs a text message".to_string()))
            }
        };
        let (name, body) = split_make_text(text);
        let path = request.work_dir.join(&name);
        tokio::fs::write(&path, body).await?;
        debug!(job_id = %request.job_id, file = %name, "Made file from text");
        self.deliver(request, path, UploadKind::Document).await
    }

    async fn rename(&self, request: &ConversionRequest, name: &str) -> Result<(), ConverterError> {
        let (path, _) = file_input(request)?;
        let target = request.work_dir.join(sanitize_file_name(name));
        if target != path {
            tokio::fs::copy(path, &target).await?;
        }
        self.deliver(request, target, UploadKind::Document).await
    }

    async fn external(&self, request: &ConversionRequest) -> Result<(), ConverterError> {
        let key = request.operation.key();
        let template = self
            .commands
            .get(key)
            .ok_or_else(|| ConverterError::Unavailable {
                operation: key.to_string(),
            })?;

        let vars = TemplateVars::for_request(request);
        let argv = render_command(template, &vars);
        let Some((program, args)) = argv.split_first() else {
            return Err(ConverterError::Unavailable {
                operation: key.to_string(),
            });
        };

        info!(job_id = %request.job_id, operation = key, program = %program, "Running converter");
        let before = list_files(&request.work_dir).await?;

        let child = Command::new(program)
            .args(args)
            .current_dir(&request.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(job_id = %request.job_id, operation = key, "Converter timed out");
                return Err(ConverterError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr_tail(&stderr)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} exited with {}", program, output.status));
            return Err(ConverterError::Failed(reason));
        }

        let produced = match vars.output.filter(|p| p.is_file()) {
            Some(output) => vec![output],
            None => {
                let after = list_files(&request.work_dir).await?;
                after.into_iter().filter(|p| !before.contains(p)).collect()
            }
        };
        if produced.is_empty() {
            return Err(ConverterError::Failed("no output was produced".to_string()));
        }

        for path in produced {
            self.deliver(request, path, UploadKind::Document).await?;
        }
        Ok(())
    }
}

impl<G: MessagingGateway> ConverterRegistry for ProcessRegistry<G> {
    type Error = ConverterError;

    async fn run(&self, request: ConversionRequest) -> Result<(), ConverterError> {
        match &request.operation {
            Operation::Special { op: SpecialOp::SendPhoto } => {
                self.resend(&request, UploadKind::Photo).await
            }
            Operation::Special { op: SpecialOp::SendDoc } => {
                self.resend(&request, UploadKind::Document).await
            }
            Operation::Special { op: SpecialOp::SendVid } => {
                self.resend(&request, UploadKind::Video).await
            }
            Operation::Make => self.make(&request).await,
            Operation::Rename { name } => self.rename(&request, name).await,
            _ => self.external(&request).await,
        }
    }
}

fn file_input(request: &ConversionRequest) -> Result<(&Path, &str), ConverterError> {
    match &request.input {
        JobInput::File { path, file_name } => Ok((path.as_path(), file_name.as_str())),
        JobInput::Text { .. } => Err(ConverterError::Failed(format!(
            "'{}' needs a file",
            request.operation.key()
        ))),
    }
}

/// Values substituted into a command template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub ext: String,
    pub url: String,
    pub dir: PathBuf,
    pub name: String,
}

impl TemplateVars {
    pub fn for_request(request: &ConversionRequest) -> Self {
        let dir = request.work_dir.clone();
        match &request.input {
            JobInput::File { path, file_name } => {
                let stem = Path::new(file_name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output")
                    .to_string();
                let ext = request.target_ext().unwrap_or_default().to_string();
                let output = (!ext.is_empty()).then(|| dir.join(format!("{}.{}", stem, ext)));
                Self {
                    input: Some(path.clone()),
                    output,
                    ext,
                    url: String::new(),
                    dir,
                    name: stem,
                }
            }
            JobInput::Text { text } => Self {
                input: None,
                output: None,
                ext: String::new(),
                url: text.trim().to_string(),
                dir,
                name: String::new(),
            },
        }
    }
}

/// Split `template` on whitespace and substitute placeholders per argument.
pub fn render_command(template: &str, vars: &TemplateVars) -> Vec<String> {
    let input = vars
        .input
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let output = vars
        .output
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let dir = vars.dir.display().to_string();

    template
        .split_whitespace()
        .map(|arg| {
            arg.replace("{input}", &input)
                .replace("{output}", &output)
                .replace("{ext}", &vars.ext)
                .replace("{url}", &vars.url)
                .replace("{dir}", &dir)
                .replace("{name}", &vars.name)
        })
        .collect()
}

/// First line names the file, the rest is its content.
pub fn split_make_text(text: &str) -> (String, String) {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let mut name = sanitize_file_name(first);
    if Path::new(&name).extension().is_none() {
        name.push_str(".txt");
    }
    (name, rest.to_string())
}

/// Make a user-supplied name safe to create inside the scratch directory
pub fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn stderr_tail(stderr: &str) -> Option<&str> {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut start = trimmed.len().saturating_sub(STDERR_TAIL);
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    Some(&trimmed[start..])
}

async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
