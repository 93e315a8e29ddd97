//! Client behavior tests against a scripted transport

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_test::assert_ok;

use lastmile_sdk::client::{DeployClient, ListOptions, PollOptions};
use lastmile_sdk::config::ClientConfig;
use lastmile_sdk::errors::SdkError;
use lastmile_sdk::events::{Event, EventKind};
use lastmile_sdk::http::Transport;
use lastmile_sdk::types::{DeployRequest, DeploymentStatus};

/// Scripted transport: pops one canned result per call and counts calls
#[derive(Default)]
struct StubTransport {
    calls: AtomicU32,
    paths: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<Result<Value, SdkError>>>,
}

impl StubTransport {
    fn new(responses: Vec<Result<Value, SdkError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            paths: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    fn next(&self, path: &str) -> Result<Value, SdkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, path: &str) -> Result<Value, SdkError> {
        self.next(path)
    }

    async fn post(&self, path: &str, _body: &Value) -> Result<Value, SdkError> {
        self.next(path)
    }

    async fn delete(&self, path: &str) -> Result<Value, SdkError> {
        self.next(path)
    }
}

fn client_over(transport: Arc<StubTransport>) -> DeployClient {
    DeployClient::with_transport(ClientConfig::new("lm_test_abc456"), transport).unwrap()
}

fn deploy_request(project: &str) -> DeployRequest {
    DeployRequest {
        code: "console.log(1)".to_string(),
        project_name: project.to_string(),
        ..Default::default()
    }
}

fn queued_response() -> Value {
    json!({
        "deploymentId": "dep-1",
        "projectName": "demo",
        "status": "queued",
        "message": "Deployment queued for demo",
        "createdAt": "2026-08-01T12:00:00Z",
        "url": null
    })
}

fn detail(status: &str, url: Option<&str>) -> Value {
    json!({
        "deploymentId": "dep-1",
        "projectName": "demo",
        "framework": "auto-detect",
        "status": status,
        "url": url,
        "error": null,
        "createdAt": "2026-08-01T12:00:00Z",
        "updatedAt": "2026-08-01T12:00:08Z"
    })
}

#[test]
fn missing_api_key_is_a_config_error() {
    let result = DeployClient::new(ClientConfig::default());
    assert!(matches!(result, Err(SdkError::Config(_))));
}

#[test]
fn bad_base_url_is_a_config_error() {
    let config = ClientConfig {
        base_url: "not a url".to_string(),
        ..ClientConfig::new("lm_test_abc456")
    };
    assert!(matches!(
        DeployClient::new(config),
        Err(SdkError::Config(_))
    ));
}

#[tokio::test]
async fn submit_validates_before_any_transport_call() {
    let transport = StubTransport::new(vec![]);
    let client = client_over(transport.clone());

    let missing_name = client
        .submit(DeployRequest {
            code: "console.log(1)".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(missing_name, Err(SdkError::Validation(_))));

    let missing_code = client
        .submit(DeployRequest {
            project_name: "demo".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(missing_code, Err(SdkError::Validation(_))));

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn submit_emits_start_then_success() {
    let transport = StubTransport::new(vec![Ok(queued_response())]);
    let client = client_over(transport.clone());

    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = seen.clone();
        client.on(EventKind::DeployStart, move |event| {
            if let Event::DeployStart { project_name } = event {
                seen.lock().unwrap().push(format!("start:{}", project_name));
            }
        });
    }
    {
        let seen = seen.clone();
        client.on(EventKind::DeploySuccess, move |event| {
            if let Event::DeploySuccess(response) = event {
                seen.lock()
                    .unwrap()
                    .push(format!("success:{}", response.deployment_id));
            }
        });
    }

    let response = assert_ok!(client.submit(deploy_request("demo")).await);
    assert_eq!(response.status, DeploymentStatus::Queued);
    assert!(response.url.is_none());

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["start:demo".to_string(), "success:dep-1".to_string()]
    );

    let last = client.last_deployment_status().unwrap();
    assert_eq!(last.deployment_id, "dep-1");
}

#[tokio::test]
async fn submit_failure_emits_deploy_error_and_propagates() {
    let transport = StubTransport::new(vec![Err(SdkError::Transport {
        status: 500,
        message: "boom".to_string(),
    })]);
    let client = client_over(transport);

    let message = Arc::new(Mutex::new(None));
    {
        let message = message.clone();
        client.on(EventKind::DeployError, move |event| {
            if let Event::DeployError { message: m } = event {
                *message.lock().unwrap() = Some(m.clone());
            }
        });
    }

    let result = client.submit(deploy_request("demo")).await;
    assert!(matches!(result, Err(SdkError::Transport { status: 500, .. })));
    assert!(message.lock().unwrap().as_deref().unwrap().contains("boom"));
    assert!(client.last_deployment_status().is_none());
}

#[tokio::test]
async fn fetch_status_requires_an_id() {
    let transport = StubTransport::new(vec![]);
    let client = client_over(transport.clone());

    let result = client.fetch_status("").await;
    assert!(matches!(result, Err(SdkError::Validation(_))));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn fetch_status_emits_status_update() {
    let transport = StubTransport::new(vec![Ok(detail("building", None))]);
    let client = client_over(transport);

    let seen = Arc::new(Mutex::new(None));
    {
        let seen = seen.clone();
        client.on(EventKind::StatusUpdate, move |event| {
            if let Event::StatusUpdate(detail) = event {
                *seen.lock().unwrap() = Some(detail.status);
            }
        });
    }

    let result = assert_ok!(client.fetch_status("dep-1").await);
    assert_eq!(result.status, DeploymentStatus::Building);
    assert_eq!(*seen.lock().unwrap(), Some(DeploymentStatus::Building));
}

#[tokio::test(start_paused = true)]
async fn poll_runs_until_a_terminal_status() {
    let transport = StubTransport::new(vec![
        Ok(detail("queued", None)),
        Ok(detail("building", None)),
        Ok(detail("completed", Some("https://demo.lastmile.app"))),
    ]);
    let client = client_over(transport.clone());

    let result = client
        .poll_status("dep-1", PollOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, DeploymentStatus::Completed);
    assert_eq!(result.url.as_deref(), Some("https://demo.lastmile.app"));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn poll_times_out_after_max_attempts() {
    let transport = StubTransport::new(vec![
        Ok(detail("queued", None)),
        Ok(detail("queued", None)),
        Ok(detail("queued", None)),
    ]);
    let client = client_over(transport.clone());

    let options = PollOptions {
        interval: Duration::from_secs(2),
        max_attempts: 3,
    };
    let result = client.poll_status("dep-1", options).await;

    assert!(matches!(
        result,
        Err(SdkError::PollTimeout { attempts: 3 })
    ));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn poll_aborts_on_transport_error() {
    let transport = StubTransport::new(vec![
        Ok(detail("queued", None)),
        Err(SdkError::Transport {
            status: 502,
            message: "bad gateway".to_string(),
        }),
    ]);
    let client = client_over(transport.clone());

    let result = client.poll_status("dep-1", PollOptions::default()).await;

    assert!(matches!(result, Err(SdkError::Transport { status: 502, .. })));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn list_builds_the_query_string() {
    let transport = StubTransport::new(vec![Ok(json!({
        "deployments": [],
        "total": 0,
        "limit": 1,
        "offset": 0
    }))]);
    let client = client_over(transport.clone());

    let listing = assert_ok!(
        client
            .list_deployments(ListOptions {
                limit: Some(1),
                offset: Some(0),
            })
            .await
    );

    assert_eq!(listing.total, 0);
    assert_eq!(transport.paths(), vec!["/v1/deployments?limit=1&offset=0"]);
}

#[tokio::test]
async fn delete_emits_deployment_deleted() {
    let transport = StubTransport::new(vec![Ok(json!({
        "message": "Deployment dep-1 deleted",
        "deploymentId": "dep-1"
    }))]);
    let client = client_over(transport);

    let seen = Arc::new(Mutex::new(None));
    {
        let seen = seen.clone();
        client.on(EventKind::DeploymentDeleted, move |event| {
            if let Event::DeploymentDeleted { deployment_id } = event {
                *seen.lock().unwrap() = Some(deployment_id.clone());
            }
        });
    }

    let response = assert_ok!(client.delete_deployment("dep-1").await);
    assert_eq!(response.deployment_id, "dep-1");
    assert_eq!(seen.lock().unwrap().as_deref(), Some("dep-1"));
}

#[tokio::test]
async fn validate_key_returns_account_metadata() {
    let transport = StubTransport::new(vec![Ok(json!({
        "valid": true,
        "account": "test",
        "tier": "free"
    }))]);
    let client = client_over(transport.clone());

    let check = assert_ok!(client.validate_key().await);
    assert!(check.valid);
    assert_eq!(check.account, "test");
    assert_eq!(transport.paths(), vec!["/v1/validate"]);
}

#[tokio::test]
async fn panicking_callback_does_not_fail_the_operation() {
    let transport = StubTransport::new(vec![Ok(queued_response())]);
    let client = client_over(transport);

    client.on(EventKind::DeploySuccess, |_| panic!("subscriber bug"));

    let survived = Arc::new(Mutex::new(false));
    {
        let survived = survived.clone();
        client.on(EventKind::DeploySuccess, move |_| {
            *survived.lock().unwrap() = true;
        });
    }

    assert_ok!(client.submit(deploy_request("demo")).await);
    assert!(*survived.lock().unwrap());
}

#[tokio::test]
async fn off_removes_callbacks() {
    let transport = StubTransport::new(vec![
        Ok(detail("queued", None)),
        Ok(detail("queued", None)),
    ]);
    let client = client_over(transport);

    let counter = Arc::new(AtomicU32::new(0));
    let id = {
        let counter = counter.clone();
        client.on(EventKind::StatusUpdate, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    };

    client.off(EventKind::StatusUpdate, Some(id));
    assert_ok!(client.fetch_status("dep-1").await);
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    {
        let counter = counter.clone();
        client.on(EventKind::StatusUpdate, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    client.off(EventKind::StatusUpdate, None);
    assert_ok!(client.fetch_status("dep-1").await);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}
