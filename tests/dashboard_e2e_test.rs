//! End-to-end: the production adapter wiring against one mocked server
//! standing in for GitHub, Travis and a Taskcluster deployment.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{setup_test_logging, wait_for_summary};
use mockito::{Mock, Server, ServerGuard};
use pipewatch::cli::output::{CommandOutput, DashboardReport};
use pipewatch::domain::models::{Config, GitHubConfig, PollConfig, RateLimitConfig, TravisConfig};
use pipewatch::services::NodeState;
use pipewatch::{Dashboard, DashboardView, ManualScheduler, TaskState};
use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;

const TRAVIS_CONTEXT: &str = "continuous-integration/travis-ci/push";
const TC_CONTEXT: &str = "Taskcluster (push)";

fn sha(i: usize) -> String {
    format!("{i:040x}")
}

fn config(server: &Server, commit_limit: usize) -> Config {
    Config {
        github: GitHubConfig {
            api_base: server.url(),
            owner: "org".to_string(),
            repo: "images".to_string(),
            token: Some("ghp_test".to_string()),
        },
        travis: TravisConfig {
            api_base: server.url(),
            repo_slug: "org/images".to_string(),
            contexts: vec![TRAVIS_CONTEXT.to_string()],
        },
        poll: PollConfig {
            commit_limit,
            fetch_timeout_secs: 5,
            ..Default::default()
        },
        rate_limit: RateLimitConfig {
            requests_per_second: 500.0,
            burst_size: 100,
        },
        ..Default::default()
    }
}

async fn json_mock(server: &mut ServerGuard, path: &str, body: serde_json::Value) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Five commits. The newest carries a Travis build, the second a
/// Taskcluster task group with two tasks, reported twice (a failure and a
/// later success from a rerun). With `build_up` false the build API
/// answers 502.
async fn mount_upstream(server: &mut ServerGuard, build_up: bool) -> Vec<Mock> {
    let url = server.url();
    let commits: Vec<serde_json::Value> = (1..=5)
        .map(|i| {
            json!({
                "sha": sha(i),
                "html_url": format!("https://github.com/org/images/commit/{}", sha(i)),
                "commit": {
                    "author": { "name": "Dev", "email": "dev@example.com", "date": "2024-03-01T10:00:00Z" },
                    "committer": { "name": "Dev", "email": "dev@example.com", "date": "2024-03-01T10:00:00Z" },
                    "message": format!("change {i}")
                }
            })
        })
        .collect();

    let mut mocks = vec![
        server
            .mock("GET", "/repos/org/images/commits")
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::Value::Array(commits).to_string())
            .create_async()
            .await,
        json_mock(
            server,
            &format!("/repos/org/images/commits/{}/statuses", sha(1)),
            json!([{
                "id": 101, "context": TRAVIS_CONTEXT, "state": "failure",
                "target_url": "https://travis-ci.org/org/images/builds/4242"
            }]),
        )
        .await,
        json_mock(
            server,
            &format!("/repos/org/images/commits/{}/statuses", sha(2)),
            json!([
                {
                    "id": 202, "context": TC_CONTEXT, "state": "success",
                    "updated_at": "2024-03-01T11:30:00Z",
                    "target_url": format!("{url}/tasks/groups/G1")
                },
                {
                    "id": 201, "context": TC_CONTEXT, "state": "failure",
                    "updated_at": "2024-03-01T11:10:00Z",
                    "target_url": format!("{url}/tasks/groups/G1")
                }
            ]),
        )
        .await,
        json_mock(
            server,
            "/api/queue/v1/task-group/G1/list",
            json!({ "tasks": [
                {
                    "status": { "taskId": "t1", "state": "completed",
                        "runs": [{ "runId": 0, "state": "completed", "resolved": "2024-03-01T11:00:00Z" }] },
                    "task": { "metadata": { "name": "01 :: win10-64" } }
                },
                {
                    "status": { "taskId": "t2", "state": "failed",
                        "runs": [{ "runId": 0, "state": "failed", "resolved": "2024-03-01T11:05:00Z" }] },
                    "task": { "metadata": { "name": "02 :: win2012" } }
                }
            ]}),
        )
        .await,
    ];

    if build_up {
        mocks.push(
            json_mock(
                server,
                "/repos/org/images/builds/4242",
                json!({ "matrix": [
                    { "id": 1, "result": 0, "finished_at": "2024-03-01T10:00:00Z" },
                    { "id": 2, "result": 1, "finished_at": "2024-03-01T10:30:00Z" },
                    { "id": 3, "result": null }
                ]}),
            )
            .await,
        );
    } else {
        mocks.push(
            server
                .mock("GET", "/repos/org/images/builds/4242")
                .with_status(502)
                .create_async()
                .await,
        );
    }

    for (task, state) in [("t1", "completed"), ("t2", "failed")] {
        mocks.push(
            json_mock(
                server,
                &format!("/api/queue/v1/task/{task}/status"),
                json!({ "status": { "taskId": task, "state": state,
                    "runs": [{ "runId": 0, "state": state }] } }),
            )
            .await,
        );
    }
    mocks.push(
        json_mock(
            server,
            "/api/queue/v1/task/t1/runs/0/artifacts",
            json!({ "artifacts": [
                { "name": "public/instance-logs/worker.log", "contentType": "text/plain" },
                { "name": "public/launch.json", "contentType": "application/json" }
            ]}),
        )
        .await,
    );
    mocks.push(
        json_mock(
            server,
            "/api/queue/v1/task/t1/runs/0/artifacts/public/launch.json",
            json!({ "launchConfigs": [
                { "storageProfile": { "imageReference": { "id": "east-us-2-gecko-t-win10-64-abc1234-def5678" } } },
                { "storageProfile": { "imageReference": { "id": "eastus-win10-64-abc1234-def5678" } } }
            ]}),
        )
        .await,
    );
    mocks.push(
        json_mock(
            server,
            "/api/queue/v1/task/t2/runs/0/artifacts",
            json!({ "artifacts": [] }),
        )
        .await,
    );
    mocks
}

#[tokio::test]
async fn test_dashboard_rolls_up_every_upstream() {
    setup_test_logging();
    let mut server = Server::new_async().await;
    let _mocks = mount_upstream(&mut server, true).await;
    let untouched = server
        .mock("GET", format!("/repos/org/images/commits/{}/statuses", sha(3)).as_str())
        .expect(0)
        .create_async()
        .await;

    let scheduler = Arc::new(ManualScheduler::new());
    let mut dashboard = Dashboard::from_config(&config(&server, 2), scheduler).unwrap();
    let mut snapshots = dashboard.subscribe();
    let mut summary_rx = dashboard.summary();
    dashboard.start();

    let summary = wait_for_summary(
        &mut summary_rx,
        |s| s.total() == 5 && s.image_count("gecko-t/win10-64") == 1,
        10_000,
    )
    .await
    .expect("tree did not converge");

    assert_eq!(summary.count(TaskState::Completed), 2);
    assert_eq!(summary.count(TaskState::Failed), 2);
    assert_eq!(summary.count(TaskState::Pending), 1);
    assert_eq!(summary.images().len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let mut view = DashboardView::new();
    loop {
        match snapshots.try_recv() {
            Ok(snapshot) => view.apply(snapshot),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    let rows = view.commits();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].commit.sha, sha(1));
    assert_eq!(rows[0].summary.total(), 3);
    assert_eq!(rows[0].summary.count(TaskState::Failed), 1);
    assert!(rows[0].summary.images().is_empty());
    assert_eq!(rows[1].summary.total(), 2);
    assert_eq!(rows[1].summary.image_count("gecko-t/win10-64"), 1);
    assert_eq!(rows[1].state, Some(NodeState::Idle));
    assert_eq!(view.stale_count(), 0);

    // Both reports stay visible, but the group is expanded once.
    let context_path: Vec<String> = ["dashboard".to_string(), sha(2), TC_CONTEXT.to_string()].into();
    let context = view.node(&context_path).expect("context node");
    assert_eq!(context.records.len(), 2);
    assert_eq!(context.children, 1);
    let mut status_path = context_path.clone();
    status_path.push("202".to_string());
    assert!(view.node(&status_path).is_some());
    assert_eq!(dashboard.current().image_count("gecko-t/win10-64"), 1);
    assert_eq!(dashboard.current().total(), 5);

    let report = DashboardReport::new(&view, &summary);
    let rendered = report.to_json();
    assert_eq!(rendered["commits"].as_array().unwrap().len(), 2);

    dashboard.shutdown().await;
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_upstream_leaves_branch_stale() {
    setup_test_logging();
    let mut server = Server::new_async().await;
    // The build API is down; everything else still rolls up.
    let _mocks = mount_upstream(&mut server, false).await;

    let mut dashboard =
        Dashboard::from_config(&config(&server, 2), Arc::new(ManualScheduler::new())).unwrap();
    let mut snapshots = dashboard.subscribe();
    let mut summary_rx = dashboard.summary();
    dashboard.start();

    let summary = wait_for_summary(
        &mut summary_rx,
        |s| s.total() == 2 && s.image_count("gecko-t/win10-64") == 1,
        10_000,
    )
    .await
    .expect("task group branch did not converge");
    assert_eq!(summary.count(TaskState::Pending), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let mut view = DashboardView::new();
    while let Ok(snapshot) = snapshots.try_recv() {
        view.apply(snapshot);
    }
    let rows = view.commits();
    assert_eq!(rows[0].stale, 1);
    assert!(rows[0].summary.is_empty());
    assert_eq!(rows[1].stale, 0);

    dashboard.shutdown().await;
}
