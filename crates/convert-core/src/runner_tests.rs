use super::*;
use crate::job::Operation;
use crate::mocks::{MockGateway, MockRegistry};
use convert_types::{OwnerId, PayloadRef, SpecialOp};
use std::time::Duration;

struct Harness {
    gateway: MockGateway,
    registry: MockRegistry,
    runner: JobRunner<MockGateway, MockRegistry>,
    reports: mpsc::UnboundedReceiver<JobReport>,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new();
    let registry = MockRegistry::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let runner = JobRunner::new(gateway.clone(), registry.clone(), dir.path()).with_reports(tx);
    Harness {
        gateway,
        registry,
        runner,
        reports: rx,
        _dir: dir,
    }
}

async fn next_report(rx: &mut mpsc::UnboundedReceiver<JobReport>) -> JobReport {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for job report")
        .expect("report channel closed")
}

fn docx_job() -> Job {
    let input = PayloadRef::new(
        10,
        5,
        PayloadSource::Document {
            file_id: "doc-1".into(),
            file_name: Some("report.docx".into()),
        },
    );
    Job::new(
        OwnerId::private(10),
        Operation::Convert {
            from: "docx".into(),
            to: "pdf".into(),
        },
        input,
    )
}

#[tokio::test]
async fn test_dispatch_sends_status_before_returning() {
    let h = harness();
    let gate = h.registry.hold();

    h.runner.dispatch(docx_job()).await;

    let status = h.gateway.last_reply().expect("status message");
    assert_eq!(status.text, "Converting from DOCX to PDF");
    assert_eq!(status.reply_to, Some(5));
    assert_eq!(status.markup, Some(Markup::RemoveKeyboard));
    gate.add_permits(1);
}

#[tokio::test]
async fn test_success_downloads_runs_and_deletes_status() {
    let mut h = harness();

    let id = h.runner.dispatch(docx_job()).await;
    let report = next_report(&mut h.reports).await;

    assert_eq!(report.job_id, id);
    assert_eq!(report.operation, "convert");
    assert!(report.outcome.is_success());

    assert_eq!(h.gateway.downloads(), vec!["doc-1".to_string()]);
    let requests = h.registry.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target_ext(), Some("pdf"));
    match &requests[0].input {
        JobInput::File { file_name, path } => {
            assert_eq!(file_name, "report.docx");
            assert!(path.ends_with("report.docx"));
        }
        other => panic!("expected file input, got {:?}", other),
    }

    assert_eq!(h.gateway.deleted().len(), 1);
    assert_eq!(h.gateway.reply_texts().len(), 1);
}

#[tokio::test]
async fn test_job_directory_is_removed_afterwards() {
    let mut h = harness();
    let id = h.runner.dispatch(docx_job()).await;
    next_report(&mut h.reports).await;

    assert!(!h.runner.work_dir().join(id.to_string()).exists());
}

#[tokio::test]
async fn test_converter_failure_sends_one_failure_message() {
    let mut h = harness();
    h.registry.fail_with("operation 'convert' is not available");

    h.runner.dispatch(docx_job()).await;
    let report = next_report(&mut h.reports).await;

    assert!(!report.outcome.is_success());
    let texts = h.gateway.reply_texts();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[1], "Operation failed: operation 'convert' is not available");
    assert_eq!(h.gateway.deleted().len(), 1);
}

#[tokio::test]
async fn test_download_failure_skips_converter() {
    let mut h = harness();
    h.gateway.fail_downloads(true);

    h.runner.dispatch(docx_job()).await;
    let report = next_report(&mut h.reports).await;

    assert!(matches!(report.outcome, JobOutcome::Failed { .. }));
    assert_eq!(h.registry.request_count(), 0);
    assert!(h
        .gateway
        .last_reply()
        .is_some_and(|m| m.text.contains("Could not download")));
}

#[tokio::test]
async fn test_panicking_converter_is_contained() {
    let mut h = harness();
    h.registry.panic_on_run();

    h.runner.dispatch(docx_job()).await;
    let report = next_report(&mut h.reports).await;

    match report.outcome {
        JobOutcome::Failed { error } => assert!(error.contains("mock converter panicked")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(
        h.gateway.last_reply().map(|m| m.text),
        Some("An error occurred during conversion.".to_string())
    );
}

#[tokio::test]
async fn test_text_input_is_not_downloaded() {
    let mut h = harness();
    let input = PayloadRef::new(
        10,
        8,
        PayloadSource::Text {
            text: "https://t.me/channel/42".into(),
        },
    );
    let job = Job::new(OwnerId::private(10), Operation::FetchLink, input);

    h.runner.dispatch(job).await;
    next_report(&mut h.reports).await;

    assert!(h.gateway.downloads().is_empty());
    // FetchLink has no status line, so nothing to reply or delete
    assert!(h.gateway.replies().is_empty());
    assert!(h.gateway.deleted().is_empty());
    assert_eq!(
        h.registry.requests()[0].input,
        JobInput::Text {
            text: "https://t.me/channel/42".into()
        }
    );
}

#[tokio::test]
async fn test_status_failure_does_not_stop_job() {
    let mut h = harness();
    h.gateway.fail_replies(true);

    h.runner.dispatch(docx_job()).await;
    let report = next_report(&mut h.reports).await;

    assert!(report.outcome.is_success());
    assert!(h.gateway.deleted().is_empty());
}

#[tokio::test]
async fn test_jobs_run_concurrently() {
    let mut h = harness();
    let gate = h.registry.hold();

    let photo = PayloadRef::new(20, 1, PayloadSource::Photo { file_id: "p".into() });
    let slow = Job::new(OwnerId::private(20), Operation::Special { op: SpecialOp::Upscale }, photo);
    h.runner.dispatch(slow).await;
    h.runner.dispatch(docx_job()).await;

    // Both requests reach the registry while neither has finished
    tokio::time::timeout(Duration::from_secs(5), async {
        while h.registry.request_count() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("both jobs should be in flight");
    assert!(h.reports.try_recv().is_err());

    gate.add_permits(2);
    next_report(&mut h.reports).await;
    next_report(&mut h.reports).await;
}

#[test]
fn test_safe_file_name_strips_directories() {
    assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
    assert_eq!(safe_file_name("report.docx"), "report.docx");
    assert_eq!(safe_file_name(".."), "input");
    assert_eq!(safe_file_name(""), "input");
}
