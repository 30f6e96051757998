mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{next_event, MockService, POLL_INTERVAL};
use smartsheet_client::SubmitRequest;
use smartsheet_core::{GridSize, GridStore, SheetError};
use smartsheet_engine::{EngineConfig, EngineError, OrchestratorEvent, RunState, Session};

fn session(service: &Arc<MockService>) -> Session {
    Session::new(service.clone(), GridStore::create(5, 4).unwrap(), POLL_INTERVAL)
}

// ---------------------------------------------------------------------------
// Label submissions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn label_submission_reads_trimmed_non_blank_labels() {
    let service = Arc::new(
        MockService::new()
            .accept("autofill_1", 2)
            .respond(&[(0, 0, "1.2M"), (1, 0, "0.9M")]),
    );
    let session = session(&service);
    session.load_csv(",Revenue\n Q1 \nQ2\n").unwrap();
    let mut events = session.orchestrator().subscribe();

    session.submit_labels().await.unwrap();

    assert_eq!(
        service.submitted.lock().unwrap()[0],
        SubmitRequest::Labels {
            rows: vec!["Q1".into(), "Q2".into()],
            cols: vec!["Revenue".into()],
        }
    );

    next_event(&mut events, |e| matches!(e, OrchestratorEvent::Completed { .. })).await;
    let grid = session.grid();
    assert_eq!(grid.get_cell(1, 1).unwrap(), "1.2M");
    assert_eq!(grid.get_cell(2, 1).unwrap(), "0.9M");
}

#[tokio::test(start_paused = true)]
async fn empty_sheet_fails_validation() {
    let service = Arc::new(MockService::new());
    let session = session(&service);

    let err = session.submit_labels().await.unwrap_err();

    assert_matches!(err, EngineError::Sheet(SheetError::Validation(_)));
    assert_eq!(session.orchestrator().state(), RunState::Idle);
}

// ---------------------------------------------------------------------------
// Table submissions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn table_submission_sends_populated_rows_under_a_sheet_id() {
    let service = Arc::new(
        MockService::new()
            .accept("sheet_1_abc", 1)
            .respond(&[(0, 0, "Paris")]),
    );
    let session = session(&service);
    session.load_csv("Country,Capital\nFrance,\n").unwrap();
    let mut events = session.orchestrator().subscribe();

    session.submit_table().await.unwrap();

    let submitted = service.submitted.lock().unwrap().clone();
    assert_matches!(
        &submitted[0],
        SubmitRequest::Table { sheet_id, table }
            if sheet_id.as_str().starts_with("sheet_") && table.len() == 2 && table[1][0] == "France"
    );

    next_event(&mut events, |e| matches!(e, OrchestratorEvent::Completed { .. })).await;
    assert_eq!(session.grid().get_cell(1, 1).unwrap(), "Paris");
}

#[tokio::test(start_paused = true)]
async fn header_only_table_fails_validation() {
    let service = Arc::new(MockService::new());
    let session = session(&service);
    session.load_csv("Country,Capital\n").unwrap();

    let err = session.submit_table().await.unwrap_err();

    assert_matches!(err, EngineError::Sheet(SheetError::Validation(_)));
}

// ---------------------------------------------------------------------------
// Grid operations while a batch runs
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn clearing_mid_batch_drops_results_that_no_longer_fit() {
    let service = Arc::new(
        MockService::new()
            .accept("autofill_1", 2)
            .respond(&[(0, 0, "a"), (6, 0, "far")]),
    );
    let session = Session::new(
        service.clone(),
        GridStore::with_size(GridSize::new(3, 3).unwrap()),
        POLL_INTERVAL,
    );
    session
        .load_csv(",attr\nr1\nr2\nr3\nr4\nr5\nr6\nr7\n")
        .unwrap();
    let mut events = session.orchestrator().subscribe();

    session.submit_labels().await.unwrap();
    session.clear();
    assert_eq!(session.grid().rows(), 3);

    next_event(&mut events, |e| matches!(e, OrchestratorEvent::Completed { .. })).await;
    assert_eq!(session.grid().get_cell(1, 1).unwrap(), "a");
    assert_eq!(session.grid().rows(), 3);
    assert_eq!(session.orchestrator().batch().unwrap().results().len(), 2);
}

#[test]
fn paste_into_label_column_is_rejected() {
    let service = Arc::new(MockService::new());
    let session = session(&service);

    let err = session.paste(1, 0, "Q1").unwrap_err();

    assert_matches!(err, SheetError::InvalidTarget { row: 1, col: 0 });
    assert_eq!(session.grid().get_cell(1, 0).unwrap(), "");
}

#[tokio::test]
async fn paste_and_export_round_trip_through_the_session() {
    let service = Arc::new(MockService::new());
    let session = session(&service);

    let area = session.paste(2, 3, "a\tb\nc\td").unwrap();
    assert_eq!((area.rows, area.cols), (2, 2));

    let csv = session.export_csv().unwrap();
    assert!(csv.lines().nth(2).unwrap().ends_with("\"a\",\"b\""));
    assert!(session.export_results_json().unwrap().is_none());

    session.clear();
    assert_eq!(session.grid().size().rows, 101);
}

// ---------------------------------------------------------------------------
// Health and construction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_reports_service_state() {
    let healthy = Arc::new(MockService::new());
    assert!(session(&healthy).check_health().await);

    let down = Arc::new(MockService {
        healthy: false,
        ..MockService::new()
    });
    assert!(!session(&down).check_health().await);
}

#[tokio::test]
async fn connect_uses_configured_grid_size() {
    let config = EngineConfig::from_lookup(|key| match key {
        "GRID_ROWS" => Some("7".into()),
        "GRID_COLS" => Some("3".into()),
        _ => None,
    })
    .unwrap();

    let session = Session::connect(&config).unwrap();

    assert_eq!(session.grid().rows(), 7);
    assert_eq!(session.grid().cols(), 3);
    assert_eq!(session.orchestrator().poll_interval(), config.poll_interval);
}
