use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use lockdesk_core::{AppError, AppResult, ClientToken, TokenSource};
use lockdesk_domain::{
    AccountRef, CandidateRow, IdentifierQuoting, LockReceipt, LockRequest, LockRow,
    VERSION_NOT_FOUND_MESSAGE, VersionToken, WorkerCount,
};

use crate::AccountDirectory;

use super::LockBatchService;

#[derive(Clone)]
enum LookupScript {
    Version(Value),
    Missing,
    Fails(u16),
    Panics,
}

#[derive(Clone)]
enum LockScript {
    Accepts(u16, &'static str),
    Rejects(u16, &'static str),
    Unreachable,
}

struct FakeAccountDirectory {
    lookups: HashMap<String, LookupScript>,
    default_lookup: LookupScript,
    lock_script: LockScript,
    lookup_delay: Duration,
    seen_segments: Mutex<Vec<String>>,
    submitted: Mutex<Vec<(String, LockRequest)>>,
    lock_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeAccountDirectory {
    fn new(default_lookup: LookupScript, lock_script: LockScript) -> Self {
        Self {
            lookups: HashMap::new(),
            default_lookup,
            lock_script,
            lookup_delay: Duration::ZERO,
            seen_segments: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            lock_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_lookup(mut self, userid: &str, script: LookupScript) -> Self {
        self.lookups.insert(userid.to_owned(), script);
        self
    }

    fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }
}

#[async_trait]
impl AccountDirectory for FakeAccountDirectory {
    async fn fetch_version(
        &self,
        _token: &ClientToken,
        account: &AccountRef,
    ) -> AppResult<Option<VersionToken>> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        self.seen_segments
            .lock()
            .await
            .push(account.path_segment.clone());

        if !self.lookup_delay.is_zero() {
            tokio::time::sleep(self.lookup_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let script = self
            .lookups
            .get(account.userid.as_str())
            .cloned()
            .unwrap_or_else(|| self.default_lookup.clone());
        match script {
            LookupScript::Version(value) => Ok(VersionToken::from_value(value)),
            LookupScript::Missing => Ok(None),
            LookupScript::Fails(status) => Err(AppError::Upstream {
                status: Some(status),
                message: "lookup refused".to_owned(),
            }),
            LookupScript::Panics => panic!("directory exploded"),
        }
    }

    async fn submit_lock(
        &self,
        _token: &ClientToken,
        account: &AccountRef,
        request: &LockRequest,
    ) -> AppResult<LockReceipt> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .await
            .push((account.path_segment.clone(), request.clone()));

        match self.lock_script {
            LockScript::Accepts(status_code, body) => Ok(LockReceipt {
                status_code,
                body: body.to_owned(),
            }),
            LockScript::Rejects(status, body) => Err(AppError::Upstream {
                status: Some(status),
                message: body.to_owned(),
            }),
            LockScript::Unreachable => Err(AppError::Upstream {
                status: None,
                message: "connection refused".to_owned(),
            }),
        }
    }
}

fn build_service(directory: Arc<FakeAccountDirectory>) -> LockBatchService {
    LockBatchService::new(directory, IdentifierQuoting::default())
}

fn row(userid: &str, comment: &str) -> LockRow {
    LockRow::new(userid, Some(comment.to_owned())).unwrap_or_else(|_| unreachable!())
}

fn candidate(line: usize, userid: Option<&str>) -> CandidateRow {
    CandidateRow {
        line,
        userid: userid.map(str::to_owned),
        comment: Some("fraud".to_owned()),
        raw: format!("{},fraud", userid.unwrap_or_default()),
    }
}

fn token() -> ClientToken {
    ClientToken::new("test-token", TokenSource::Form).unwrap_or_else(|_| unreachable!())
}

fn workers(count: usize) -> WorkerCount {
    WorkerCount::new(count).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn row_is_locked_with_looked_up_version() {
    let directory = Arc::new(FakeAccountDirectory::new(
        LookupScript::Version(json!("5")),
        LockScript::Accepts(200, "{\"ok\":true}"),
    ));
    let service = build_service(directory.clone());

    let processed = service.process_row(&token(), &row("123", "fraud")).await;

    assert!(processed.diagnostic.is_none());
    assert_eq!(processed.outcome.userid, "123");
    assert!(processed.outcome.success);
    assert_eq!(processed.outcome.status_code, Some(200));
    assert_eq!(processed.outcome.message, "{\"ok\":true}");

    let submitted = directory.submitted.lock().await;
    assert_eq!(submitted.len(), 1);
    let (segment, request) = &submitted[0];
    assert_eq!(segment, "'123");
    assert_eq!(request.version.as_value(), &json!("5"));
    assert_eq!(request.custom_values.blocked_features_note, "fraud");
    assert_eq!(request.custom_values.frozen, "true");
}

#[tokio::test]
async fn missing_version_skips_lock_call() {
    let directory = Arc::new(FakeAccountDirectory::new(
        LookupScript::Missing,
        LockScript::Accepts(200, "ok"),
    ));
    let service = build_service(directory.clone());

    let processed = service.process_row(&token(), &row("123", "fraud")).await;

    assert!(!processed.outcome.success);
    assert_eq!(processed.outcome.status_code, None);
    assert_eq!(processed.outcome.message, VERSION_NOT_FOUND_MESSAGE);
    assert_eq!(directory.lock_calls.load(Ordering::SeqCst), 0);
    let Some(diagnostic) = processed.diagnostic else {
        panic!("expected a lookup diagnostic");
    };
    assert_eq!(diagnostic.status, None);
    assert_eq!(
        diagnostic.detail,
        "GET users/'123/data-for-edit: response has no user.version"
    );
}

#[tokio::test]
async fn failed_lookup_is_reported_as_missing_version_with_diagnostic() {
    let directory = Arc::new(FakeAccountDirectory::new(
        LookupScript::Fails(404),
        LockScript::Accepts(200, "ok"),
    ));
    let service = build_service(directory.clone());

    let processed = service.process_row(&token(), &row("77", "")).await;

    assert_eq!(processed.outcome.message, VERSION_NOT_FOUND_MESSAGE);
    assert_eq!(directory.lock_calls.load(Ordering::SeqCst), 0);
    let Some(diagnostic) = processed.diagnostic else {
        panic!("expected a lookup diagnostic");
    };
    assert_eq!(diagnostic.userid, "77");
    assert_eq!(diagnostic.status, Some(404));
    assert!(diagnostic.detail.contains("lookup refused"));
}

#[tokio::test]
async fn conflicting_lock_keeps_status_and_message() {
    let directory = Arc::new(FakeAccountDirectory::new(
        LookupScript::Version(json!("v1")),
        LockScript::Rejects(409, "version conflict"),
    ));
    let service = build_service(directory);

    let processed = service.process_row(&token(), &row("123", "fraud")).await;

    assert!(!processed.outcome.success);
    assert_eq!(processed.outcome.status_code, Some(409));
    assert!(!processed.outcome.message.is_empty());
    assert!(processed.outcome.message.contains("version conflict"));
}

#[tokio::test]
async fn transport_failure_on_lock_has_no_status() {
    let directory = Arc::new(FakeAccountDirectory::new(
        LookupScript::Version(json!(3)),
        LockScript::Unreachable,
    ));
    let service = build_service(directory);

    let processed = service.process_row(&token(), &row("123", "fraud")).await;

    assert!(!processed.outcome.success);
    assert_eq!(processed.outcome.status_code, None);
    assert!(processed.outcome.message.contains("connection refused"));
}

#[tokio::test]
async fn batch_sets_aside_rows_without_userid() {
    let directory = Arc::new(FakeAccountDirectory::new(
        LookupScript::Version(json!("1")),
        LockScript::Accepts(200, "ok"),
    ));
    let service = build_service(directory);

    let report = service
        .run_batch(
            &token(),
            vec![
                candidate(1, Some("1")),
                candidate(2, None),
                candidate(3, Some("  ")),
                candidate(4, Some("4")),
            ],
            WorkerCount::default(),
        )
        .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.rejections.len(), 2);
    assert_eq!(
        report
            .rejections
            .iter()
            .map(|rejection| rejection.line)
            .collect::<Vec<_>>(),
        vec![2, 3]
    );
    assert_eq!(report.succeeded_count(), 2);
    assert_eq!(report.failed_count(), 0);
}

#[tokio::test]
async fn batch_emits_one_outcome_per_row_for_every_worker_count() {
    let userids = (0..25).map(|index| format!("{}", 1000 + index)).collect::<Vec<_>>();

    for worker_count in 1..=20 {
        let directory = Arc::new(
            FakeAccountDirectory::new(
                LookupScript::Version(json!("v1")),
                LockScript::Accepts(200, "ok"),
            )
            .with_lookup("1003", LookupScript::Missing),
        );
        let service = build_service(directory);
        let rows = userids
            .iter()
            .enumerate()
            .map(|(line, userid)| candidate(line + 1, Some(userid.as_str())))
            .collect::<Vec<_>>();

        let report = service
            .run_batch(&token(), rows, workers(worker_count))
            .await;

        let mut seen = report
            .outcomes
            .iter()
            .map(|outcome| outcome.userid.clone())
            .collect::<Vec<_>>();
        seen.sort();
        assert_eq!(seen, userids, "worker count {worker_count}");
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.diagnostics.len(), 1);
    }
}

#[tokio::test]
async fn batch_never_exceeds_worker_count() {
    let directory = Arc::new(
        FakeAccountDirectory::new(
            LookupScript::Version(json!("v1")),
            LockScript::Accepts(200, "ok"),
        )
        .with_lookup_delay(Duration::from_millis(20)),
    );
    let service = build_service(directory.clone());
    let rows = (1..=12)
        .map(|index| candidate(index, Some(index.to_string().as_str())))
        .collect::<Vec<_>>();

    let report = service.run_batch(&token(), rows, workers(3)).await;

    assert_eq!(report.outcomes.len(), 12);
    let max_in_flight = directory.max_in_flight.load(Ordering::SeqCst);
    assert!(max_in_flight <= 3, "saw {max_in_flight} rows in flight");
    assert!(max_in_flight >= 1);
}

#[tokio::test]
async fn panicking_row_still_produces_failed_outcome() {
    let directory = Arc::new(
        FakeAccountDirectory::new(
            LookupScript::Version(json!("v1")),
            LockScript::Accepts(200, "ok"),
        )
        .with_lookup("666", LookupScript::Panics),
    );
    let service = build_service(directory);

    let report = service
        .run_batch(
            &token(),
            vec![candidate(1, Some("1")), candidate(2, Some("666"))],
            workers(2),
        )
        .await;

    assert_eq!(report.outcomes.len(), 2);
    let Some(faulted) = report
        .outcomes
        .iter()
        .find(|outcome| outcome.userid == "666")
    else {
        panic!("expected an outcome for the panicking row");
    };
    assert!(!faulted.success);
    assert_eq!(faulted.status_code, None);
    assert_eq!(faulted.duration, Duration::ZERO);
    assert!(faulted.message.contains("directory exploded"));
}

#[tokio::test]
async fn example_row_from_fraud_report_is_locked() {
    let directory = Arc::new(FakeAccountDirectory::new(
        LookupScript::Version(json!("5")),
        LockScript::Accepts(200, "{\"status\":\"ok\"}"),
    ));
    let service = build_service(directory.clone());

    let report = service
        .run_batch(
            &token(),
            vec![candidate(1, Some("123"))],
            WorkerCount::default(),
        )
        .await;

    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.userid, "123");
    assert!(outcome.success);
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.message, "{\"status\":\"ok\"}");
    assert_eq!(
        *directory.seen_segments.lock().await,
        vec!["'123".to_owned()]
    );
}
