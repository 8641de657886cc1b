#![cfg(unix)]

use std::{path::PathBuf, sync::Arc};

use executors::{resolver::ScriptResolver, runner::ScriptRunner};
use serde_json::json;
use services::services::execution::{ExecutionService, ExecutionServiceError};
use utils::{router::LogRouter, stream_event::StreamEvent};

fn setup(script_body: Option<&str>) -> (tempfile::TempDir, Arc<LogRouter>, ExecutionService) {
    let tmp = tempfile::tempdir().unwrap();
    let bundled = tmp.path().join("bundled");
    std::fs::create_dir_all(&bundled).unwrap();
    if let Some(body) = script_body {
        std::fs::write(bundled.join("step.sh"), body).unwrap();
    }
    let router = Arc::new(LogRouter::new());
    let resolver = ScriptResolver::new(bundled, tmp.path().join("overlay"));
    let runner = ScriptRunner::new(PathBuf::from("/bin/sh"), vec![], router.clone());
    let service = ExecutionService::new(resolver, runner, router.clone());
    (tmp, router, service)
}

#[tokio::test]
async fn run_is_bracketed_by_start_and_complete_events() {
    let (_tmp, router, service) = setup(Some("echo \"[LOG:SUCCESS] Done\"\n"));
    let (_handle, mut rx) = router.subscribe();

    let body = service
        .run_script("step.sh", &["C".to_string(), "MyClass".to_string()])
        .await
        .unwrap();
    assert_eq!(body["success"], json!(true));

    assert_eq!(rx.recv().await, Some(StreamEvent::Connected));
    assert_eq!(
        rx.recv().await,
        Some(StreamEvent::ProcessStarted {
            endpoint: "scripts/run".into(),
            context: "step.sh C".into()
        })
    );
    // one log line, then the closing bracket
    assert!(matches!(rx.recv().await, Some(StreamEvent::Log(_))));
    assert_eq!(
        rx.recv().await,
        Some(StreamEvent::ProcessComplete {
            endpoint: "scripts/run".into(),
            success: true,
            context: "step.sh C".into()
        })
    );
}

#[tokio::test]
async fn resolution_failure_still_closes_the_bracket() {
    let (_tmp, router, service) = setup(None);
    let (_handle, mut rx) = router.subscribe();

    let err = service.run_script("missing.sh", &[]).await.unwrap_err();
    assert!(matches!(err, ExecutionServiceError::Resolve(_)));

    assert_eq!(rx.recv().await, Some(StreamEvent::Connected));
    assert!(matches!(
        rx.recv().await,
        Some(StreamEvent::ProcessStarted { .. })
    ));
    assert_eq!(
        rx.recv().await,
        Some(StreamEvent::ProcessComplete {
            endpoint: "scripts/run".into(),
            success: false,
            context: "missing.sh".into()
        })
    );
}

#[tokio::test]
async fn failing_script_reports_failure_in_complete_event() {
    let (_tmp, router, service) =
        setup(Some("echo \"[LOG:ERROR] nope\"\nexit 1\n"));
    let (_handle, mut rx) = router.subscribe();

    let body = service.run_script("step.sh", &[]).await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());

    assert_eq!(rx.recv().await, Some(StreamEvent::Connected));
    assert!(matches!(rx.recv().await, Some(StreamEvent::ProcessStarted { .. })));
    assert!(matches!(rx.recv().await, Some(StreamEvent::Log(_))));
    assert!(matches!(
        rx.recv().await,
        Some(StreamEvent::ProcessComplete { success: false, .. })
    ));
}
