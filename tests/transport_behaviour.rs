//! HTTP behaviour of the transport executor and completion tracking.

#[path = "common/arrivals.rs"]
mod arrivals;
#[path = "common/mock_api.rs"]
mod mock_api;
#[path = "common/sequence.rs"]
mod sequence;
#[path = "common/test_constants.rs"]
mod test_constants;

use std::time::Duration;

use gscloud::commands::{Console, request};
use gscloud::objects::{ServerCreateRequest, ServerOperations};
use gscloud::render::OutputOptions;
use gscloud::{ApiError, CallContext, ClientConfig};
use rstest::{fixture, rstest};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arrivals::Arrivals;
use mock_api::{DELAY, client_for};
use sequence::{Sequence, status_body};
use test_constants::{REQUEST_ID, SERVER_ID, TOKEN, USER_ID};

#[fixture]
fn ctx() -> CallContext {
    CallContext::background()
}

fn accepted() -> ResponseTemplate {
    ResponseTemplate::new(202)
        .insert_header("X-Request-Id", REQUEST_ID)
        .set_body_json(serde_json::json!({ "object_uuid": SERVER_ID }))
}

fn poll(status: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(status_body(REQUEST_ID, status, message))
}

fn create_request() -> ServerCreateRequest {
    ServerCreateRequest {
        name: "x".to_owned(),
        memory: 1,
        cores: 1,
        ..ServerCreateRequest::default()
    }
}

async fn requests_to(server: &MockServer, target: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == target)
        .count()
}

#[rstest]
#[tokio::test]
async fn listing_decodes_records_without_polling(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects/servers"))
        .and(header("X-Auth-UserID", USER_ID))
        .and(header("X-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": {
                SERVER_ID: {
                    "object_uuid": SERVER_ID,
                    "name": "web",
                    "cores": 2,
                    "memory": 4,
                    "power": true,
                    "change_time": "2024-03-01T10:00:00Z",
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 2);

    let servers = client
        .list_servers(&ctx)
        .await
        .unwrap_or_else(|err| panic!("list should succeed: {err}"));

    assert_eq!(servers.len(), 1);
    let first = servers.first().unwrap_or_else(|| panic!("one server"));
    assert_eq!(first.object_uuid, SERVER_ID);
    assert_eq!((first.name.as_str(), first.cores, first.memory), ("web", 2, 4));
    assert!(first.power);
    assert_eq!(requests_to(&server, "/requests/req-1").await, 0);
}

#[rstest]
#[tokio::test]
async fn create_waits_until_the_request_is_done(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/objects/servers"))
        .and(body_json(serde_json::json!({ "name": "x", "memory": 1, "cores": 1 })))
        .respond_with(accepted())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/req-1"))
        .respond_with(Sequence::new(vec![
            poll("pending", ""),
            poll("pending", ""),
            poll("done", ""),
        ]))
        .expect(3)
        .mount(&server)
        .await;
    let client = client_for(&server, 2);

    let created = client
        .create_server(&ctx, create_request())
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(created.object_uuid, SERVER_ID);
    assert_eq!(created.server_uuid, SERVER_ID);
}

#[rstest]
#[tokio::test]
async fn create_reports_a_failed_request(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/objects/servers"))
        .respond_with(accepted())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/req-1"))
        .respond_with(Sequence::new(vec![
            poll("pending", ""),
            poll("pending", ""),
            poll("failed", "quota exceeded"),
        ]))
        .expect(3)
        .mount(&server)
        .await;
    let client = client_for(&server, 2);

    let err = client
        .create_server(&ctx, create_request())
        .await
        .err()
        .unwrap_or_else(|| panic!("create should fail"));

    let message = err.to_string();
    assert!(message.contains(REQUEST_ID), "message: {message}");
    assert!(message.contains("quota exceeded"), "message: {message}");
}

#[rstest]
#[tokio::test]
async fn asynchronous_mode_skips_polling(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/objects/servers"))
        .respond_with(accepted())
        .expect(1)
        .mount(&server)
        .await;
    let config = ClientConfig::new(USER_ID, TOKEN)
        .base_url(server.uri())
        .synchronous(false);
    let client = gscloud::Client::new(config).unwrap_or_else(|err| panic!("client: {err}"));

    client
        .create_server(&ctx, create_request())
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(requests_to(&server, "/requests/req-1").await, 0);
}

#[rstest]
#[tokio::test]
async fn transient_failures_are_retried_with_linear_backoff(ctx: CallContext) {
    let delay = Duration::from_millis(100);
    let server = MockServer::start().await;
    let arrivals = Arrivals::default();
    Mock::given(method("GET"))
        .and(path("/objects/servers"))
        .respond_with(arrivals.record(Sequence::new(vec![
            ResponseTemplate::new(503),
            ResponseTemplate::new(503),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "servers": {} })),
        ])))
        .expect(3)
        .mount(&server)
        .await;
    let config = ClientConfig::new(USER_ID, TOKEN)
        .base_url(server.uri())
        .delay_interval(delay)
        .max_retries(2);
    let client = gscloud::Client::new(config).unwrap_or_else(|err| panic!("client: {err}"));

    let servers = client
        .list_servers(&ctx)
        .await
        .unwrap_or_else(|err| panic!("list should succeed after retries: {err}"));

    assert!(servers.is_empty());
    let gaps = arrivals.gaps();
    let [first, second] = gaps.as_slice() else {
        panic!("expected three attempts, gaps {gaps:?}");
    };
    assert!(
        (delay..delay * 2).contains(first),
        "first retry should wait D, waited {first:?}"
    );
    assert!(
        (delay * 2..delay * 3).contains(second),
        "second retry should wait 2D, waited {second:?}"
    );
}

#[rstest]
#[tokio::test]
async fn client_errors_fail_after_one_attempt(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/objects/servers/{SERVER_ID}")))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("X-Request-Id", "req-404")
                .set_body_json(serde_json::json!({
                    "title": "Not found",
                    "description": "The requested object does not exist",
                })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 5);

    let err = client
        .get_server(&ctx, SERVER_ID)
        .await
        .err()
        .unwrap_or_else(|| panic!("lookup should fail"));

    let ApiError::Request(request) = &err else {
        panic!("expected a request error, got {err:?}");
    };
    assert_eq!(request.status_code, 404);
    assert_eq!(request.request_id, "req-404");
    assert_eq!(request.description, "The requested object does not exist");
}

#[rstest]
#[tokio::test]
async fn exhausted_retries_are_distinguishable(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects/servers"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    let client = client_for(&server, 2);

    let err = client
        .list_servers(&ctx)
        .await
        .err()
        .unwrap_or_else(|| panic!("list should fail"));

    assert!(err.is_exhausted(), "got {err:?}");
    assert_eq!(err.status_code(), Some(500));
    assert!(
        err.to_string()
            .starts_with("maximum number of trials has been exhausted with error: "),
        "message: {err}"
    );
}

#[rstest]
#[tokio::test]
async fn timed_out_writes_are_not_retried(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/objects/servers"))
        .respond_with(accepted().set_delay(Duration::from_millis(500)))
        .expect(1)
        .mount(&server)
        .await;
    let config = ClientConfig::new(USER_ID, TOKEN)
        .base_url(server.uri())
        .delay_interval(DELAY)
        .max_retries(3)
        .request_timeout(Duration::from_millis(100));
    let client = gscloud::Client::new(config).unwrap_or_else(|err| panic!("client: {err}"));

    let err = client
        .create_server(&ctx, create_request())
        .await
        .err()
        .unwrap_or_else(|| panic!("create should time out"));

    assert!(
        matches!(err, ApiError::Network { timeout: true, .. }),
        "got {err:?}"
    );
}

#[rstest]
#[tokio::test]
async fn timed_out_reads_are_retried(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects/servers"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "servers": {} }))
                .set_delay(Duration::from_millis(500)),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "servers": {} })),
        ]))
        .expect(2)
        .mount(&server)
        .await;
    let config = ClientConfig::new(USER_ID, TOKEN)
        .base_url(server.uri())
        .delay_interval(DELAY)
        .max_retries(3)
        .request_timeout(Duration::from_millis(100));
    let client = gscloud::Client::new(config).unwrap_or_else(|err| panic!("client: {err}"));

    client
        .list_servers(&ctx)
        .await
        .unwrap_or_else(|err| panic!("second attempt should succeed: {err}"));
}

#[rstest]
#[tokio::test]
async fn invalid_identifiers_never_reach_the_network(ctx: CallContext) {
    let server = MockServer::start().await;
    let client = client_for(&server, 2);

    let err = client
        .get_server(&ctx, "not-a-uuid")
        .await
        .err()
        .unwrap_or_else(|| panic!("lookup should be rejected"));

    assert_eq!(err, ApiError::InvalidArgument("'id' is invalid".to_owned()));
    assert_eq!(
        server.received_requests().await.unwrap_or_default().len(),
        0
    );
}

#[rstest]
#[tokio::test]
async fn cancelled_contexts_stop_before_sending() {
    let server = MockServer::start().await;
    let client = client_for(&server, 2);
    let cancelled = CallContext::background();
    cancelled.cancel();

    let err = client
        .list_servers(&cancelled)
        .await
        .err()
        .unwrap_or_else(|| panic!("call should be cancelled"));

    assert!(matches!(err, ApiError::Context(_)), "got {err:?}");
    assert_eq!(
        server.received_requests().await.unwrap_or_default().len(),
        0
    );
}

fn server_with_power(power: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "server": { "object_uuid": SERVER_ID, "name": "web", "power": power }
    }))
}

#[rstest]
#[tokio::test]
async fn starting_a_running_server_sends_nothing(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/objects/servers/{SERVER_ID}")))
        .respond_with(server_with_power(true))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 2);

    client
        .start_server(&ctx, SERVER_ID)
        .await
        .unwrap_or_else(|err| panic!("start should succeed: {err}"));

    assert_eq!(
        requests_to(&server, &format!("/objects/servers/{SERVER_ID}/power")).await,
        0
    );
}

#[rstest]
#[tokio::test]
async fn starting_a_stopped_server_waits_for_power(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/objects/servers/{SERVER_ID}")))
        .respond_with(Sequence::new(vec![
            server_with_power(false),
            server_with_power(false),
            server_with_power(true),
        ]))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/objects/servers/{SERVER_ID}/power")))
        .and(body_json(serde_json::json!({ "power": true })))
        .respond_with(ResponseTemplate::new(204).insert_header("X-Request-Id", REQUEST_ID))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/req-1"))
        .respond_with(poll("done", ""))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 2);

    client
        .start_server(&ctx, SERVER_ID)
        .await
        .unwrap_or_else(|err| panic!("start should succeed: {err}"));
}

#[rstest]
#[tokio::test]
async fn power_polling_outlasts_failed_lookups(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/objects/servers/{SERVER_ID}")))
        .respond_with(Sequence::new(vec![
            server_with_power(false),
            ResponseTemplate::new(404),
            ResponseTemplate::new(500),
            server_with_power(true),
        ]))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/objects/servers/{SERVER_ID}/power")))
        .respond_with(ResponseTemplate::new(204).insert_header("X-Request-Id", REQUEST_ID))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/req-1"))
        .respond_with(poll("done", ""))
        .mount(&server)
        .await;
    let client = client_for(&server, 0);

    client
        .start_server(&ctx, SERVER_ID)
        .await
        .unwrap_or_else(|err| panic!("start should survive failed polls: {err}"));

    assert_eq!(
        requests_to(&server, &format!("/objects/servers/{SERVER_ID}")).await,
        4
    );
}

#[rstest]
#[tokio::test]
async fn power_polling_stops_at_the_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/objects/servers/{SERVER_ID}")))
        .respond_with(Sequence::new(vec![
            server_with_power(false),
            ResponseTemplate::new(404),
        ]))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/objects/servers/{SERVER_ID}/power")))
        .respond_with(ResponseTemplate::new(204).insert_header("X-Request-Id", REQUEST_ID))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/requests/req-1"))
        .respond_with(poll("done", ""))
        .mount(&server)
        .await;
    let client = client_for(&server, 0);
    let ctx = CallContext::with_timeout(DELAY * 10);

    let err = client
        .start_server(&ctx, SERVER_ID)
        .await
        .err()
        .unwrap_or_else(|| panic!("start should time out"));

    assert!(matches!(err, ApiError::Context(_)), "{err:?}");
}

#[rstest]
#[tokio::test]
async fn listing_tolerates_unknown_hardware_profiles(ctx: CallContext) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/objects/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": {
                SERVER_ID: {
                    "object_uuid": SERVER_ID,
                    "name": "uefi",
                    "hardware_profile": "q35_uefi",
                    "power": false,
                }
            }
        })))
        .mount(&server)
        .await;
    let client = client_for(&server, 0);

    let servers = client
        .list_servers(&ctx)
        .await
        .unwrap_or_else(|err| panic!("listing should tolerate new profiles: {err}"));

    let [only] = servers.as_slice() else {
        panic!("expected one server, got {servers:?}");
    };
    assert_eq!(only.name, "uefi");
    assert_eq!(only.hardware_profile, None);
}

#[rstest]
#[tokio::test]
async fn request_wait_command_polls_until_done() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/requests/req-1"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ REQUEST_ID: { "status": null } })),
            poll("pending", ""),
            poll("done", ""),
        ]))
        .expect(3)
        .mount(&server)
        .await;
    let client = client_for(&server, 0);
    let mut console = Console::new(Vec::new(), Vec::new(), OutputOptions::default());

    request::wait(&client, &mut console, REQUEST_ID, Some(Duration::from_secs(5)))
        .await
        .unwrap_or_else(|err| panic!("wait should succeed: {err}"));

    let (_, notes) = console.into_parts();
    assert_eq!(String::from_utf8_lossy(&notes), "Request req-1 done\n");
}

#[rstest]
#[tokio::test]
async fn standalone_wait_reports_failed_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/requests/req-1"))
        .respond_with(poll("failed", "image download failed"))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 0);

    let err = client
        .wait_for_request_standalone(REQUEST_ID)
        .await
        .err()
        .unwrap_or_else(|| panic!("failed request should surface"));

    assert!(
        matches!(err, ApiError::RequestFailed { ref message, .. } if message == "image download failed"),
        "{err:?}"
    );
}
