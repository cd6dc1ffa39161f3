//! Tests for run disposition.

use super::*;
use crate::test_support::{Call, MockRunQueueClient};
use tracing_test::traced_test;

fn waiting_run(id: &str, status: RunStatus) -> Run {
    Run {
        id: id.to_string(),
        status,
    }
}

fn stalled_workspace(name: &str, auto_apply: bool, runs: Vec<Run>) -> Workspace {
    Workspace {
        id: format!("ws-{name}"),
        name: name.to_string(),
        auto_apply,
        runs,
    }
}

fn settled_statuses() -> Vec<RunStatus> {
    vec![
        RunStatus::Applied,
        RunStatus::Planning,
        RunStatus::PlannedAndFinished,
        RunStatus::Discarded,
        RunStatus::Canceled,
        RunStatus::Errored,
        RunStatus::Other("mystery".to_string()),
    ]
}

// --- Decision table ---

#[test]
fn test_current_cost_estimated_run_applied_only_with_auto_apply() {
    assert_eq!(
        Disposition::decide(0, &RunStatus::CostEstimated, true),
        Disposition::Apply
    );
    assert_eq!(
        Disposition::decide(0, &RunStatus::CostEstimated, false),
        Disposition::NoAction
    );
}

#[test]
fn test_current_pending_run_is_skipped() {
    assert_eq!(Disposition::decide(0, &RunStatus::Pending, true), Disposition::Skip);
    assert_eq!(Disposition::decide(0, &RunStatus::Pending, false), Disposition::Skip);
}

#[test]
fn test_queued_runs_are_discarded_or_canceled() {
    for position in [1, 2, 17] {
        for auto_apply in [true, false] {
            assert_eq!(
                Disposition::decide(position, &RunStatus::CostEstimated, auto_apply),
                Disposition::Discard
            );
            assert_eq!(
                Disposition::decide(position, &RunStatus::Pending, auto_apply),
                Disposition::Cancel
            );
        }
    }
}

#[test]
fn test_other_statuses_need_no_action() {
    for status in settled_statuses() {
        for position in [0, 1, 5] {
            for auto_apply in [true, false] {
                assert_eq!(
                    Disposition::decide(position, &status, auto_apply),
                    Disposition::NoAction,
                    "position {position}, status {status}, auto_apply {auto_apply}"
                );
            }
        }
    }
}

#[test]
fn test_disposition_names_and_comments() {
    assert_eq!(Disposition::Apply.to_string(), "apply");
    assert_eq!(Disposition::NoAction.to_string(), "noaction");
    assert_eq!(Disposition::Apply.comment(), Some("Applying run automatically"));
    assert_eq!(Disposition::Discard.comment(), Some("Discarding run automatically"));
    assert_eq!(Disposition::Cancel.comment(), Some("Canceling run automatically"));
    assert_eq!(Disposition::Skip.comment(), None);
    assert_eq!(Disposition::NoAction.comment(), None);
}

// --- Dispatch ---

#[tokio::test]
#[traced_test]
async fn test_dispose_dispatches_in_queue_order() {
    let client = MockRunQueueClient::new();
    let workspaces = vec![stalled_workspace(
        "W1",
        true,
        vec![
            waiting_run("R1", RunStatus::CostEstimated),
            waiting_run("R2", RunStatus::Pending),
            waiting_run("R3", RunStatus::CostEstimated),
        ],
    )];

    let report = dispose(&client, &workspaces, false).await;

    assert_eq!(
        client.action_calls(),
        vec![
            Call::Apply {
                run_id: "R1".to_string(),
                comment: "Applying run automatically".to_string(),
            },
            Call::Cancel {
                run_id: "R2".to_string(),
                comment: "Canceling run automatically".to_string(),
            },
            Call::Discard {
                run_id: "R3".to_string(),
                comment: "Discarding run automatically".to_string(),
            },
        ]
    );
    assert_eq!(report.dispatched_count(), 3);
    assert_eq!(report.failed_count(), 0);
    assert!(logs_contain("run_id=R1,workspace_name=W1,action=apply"));
    assert!(logs_contain("run_id=R2,workspace_name=W1,action=cancel"));
    assert!(logs_contain("run_id=R3,workspace_name=W1,action=discard"));
}

#[tokio::test]
#[traced_test]
async fn test_skip_is_logged_but_not_dispatched() {
    let client = MockRunQueueClient::new();
    let workspaces = vec![stalled_workspace(
        "W1",
        true,
        vec![waiting_run("R1", RunStatus::Pending)],
    )];

    let report = dispose(&client, &workspaces, false).await;

    assert!(client.action_calls().is_empty());
    assert_eq!(report.records[0].disposition, Disposition::Skip);
    assert_eq!(report.records[0].outcome, Outcome::NotRequired);
    assert!(logs_contain("run_id=R1,workspace_name=W1,action=skip"));
}

#[tokio::test]
async fn test_noop_decides_identically_without_dispatching() {
    let workspaces = vec![
        stalled_workspace(
            "W1",
            true,
            vec![
                waiting_run("R1", RunStatus::CostEstimated),
                waiting_run("R2", RunStatus::Pending),
            ],
        ),
        stalled_workspace(
            "W2",
            false,
            vec![
                waiting_run("R3", RunStatus::CostEstimated),
                waiting_run("R4", RunStatus::CostEstimated),
            ],
        ),
    ];

    let live_client = MockRunQueueClient::new();
    let live = dispose(&live_client, &workspaces, false).await;

    let noop_client = MockRunQueueClient::new();
    let noop = dispose(&noop_client, &workspaces, true).await;

    let decisions = |report: &DisposalReport| {
        report
            .records
            .iter()
            .map(|r| (r.run_id.clone(), r.workspace_name.clone(), r.disposition))
            .collect::<Vec<_>>()
    };
    assert_eq!(decisions(&live), decisions(&noop));
    assert!(noop_client.calls().is_empty());
    assert_eq!(noop.suppressed_count(), 3);
    assert_eq!(noop.dispatched_count(), 0);
    assert_eq!(live.dispatched_count(), 3);
}

#[tokio::test]
#[traced_test]
async fn test_noop_still_logs_every_decision() {
    let client = MockRunQueueClient::new();
    let workspaces = vec![stalled_workspace(
        "W1",
        true,
        vec![
            waiting_run("R1", RunStatus::CostEstimated),
            waiting_run("R2", RunStatus::CostEstimated),
        ],
    )];

    dispose(&client, &workspaces, true).await;

    assert!(client.calls().is_empty());
    assert!(logs_contain("run_id=R1,workspace_name=W1,action=apply"));
    assert!(logs_contain("run_id=R2,workspace_name=W1,action=discard"));
}

#[tokio::test]
#[traced_test]
async fn test_failed_dispatch_does_not_stop_the_sweep() {
    let client = MockRunQueueClient::new().failing_actions_for("R1");
    let workspaces = vec![
        stalled_workspace(
            "W1",
            true,
            vec![
                waiting_run("R1", RunStatus::CostEstimated),
                waiting_run("R2", RunStatus::Pending),
            ],
        ),
        stalled_workspace(
            "W2",
            false,
            vec![
                waiting_run("R3", RunStatus::Pending),
                waiting_run("R4", RunStatus::Pending),
            ],
        ),
    ];

    let report = dispose(&client, &workspaces, false).await;

    assert_eq!(client.action_calls().len(), 3);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.dispatched_count(), 2);
    assert!(matches!(
        &report.records[0].outcome,
        Outcome::Failed(message) if message.contains("409")
    ));
    assert!(logs_contain("Failed to dispatch run action"));
}

#[tokio::test]
async fn test_no_action_current_run_is_recorded() {
    let client = MockRunQueueClient::new();
    let workspaces = vec![stalled_workspace(
        "W2",
        false,
        vec![waiting_run("R4", RunStatus::CostEstimated)],
    )];

    let report = dispose(&client, &workspaces, false).await;

    assert!(client.calls().is_empty());
    assert_eq!(
        report.records,
        vec![DisposalRecord {
            run_id: "R4".to_string(),
            workspace_name: "W2".to_string(),
            disposition: Disposition::NoAction,
            outcome: Outcome::NotRequired,
        }]
    );
}
