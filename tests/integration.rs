use pulsecheck::{
    CancellationToken, CheckOutcome, Checker, CheckerConfig, CheckerError, LivenessProbe,
    MockHttpClient, NormalizedId, ProgressSnapshot, ReqwestHttpClient, RunState, ScheduleStrategy,
};
use std::sync::Arc;

const LIVE_URL: &str = "https://scontent.example.net/v/t1.30497-1/84628273_n.jpg";
const DEAD_URL: &str = "https://static.xx.example.net/rsrc.php/v1/yh/r/C5yt7Cqf3zU.jpg";

fn id(s: &str) -> NormalizedId {
    s.parse().unwrap()
}

fn mock_checker(
    concurrency: usize,
    strategy: ScheduleStrategy,
) -> (Arc<MockHttpClient>, Checker<MockHttpClient>) {
    let http_client = Arc::new(MockHttpClient::new());
    let config = CheckerConfig {
        concurrency_bound: concurrency,
        remote_endpoint_base: "https://graph.example.com".to_string(),
        strategy,
        ..Default::default()
    };
    let checker = Checker::with_client(http_client.clone(), config).expect("valid config");
    (http_client, checker)
}

#[test_log::test(tokio::test)]
async fn test_same_account_in_three_formats_is_probed_once() {
    let (http_client, checker) = mock_checker(10, ScheduleStrategy::Chunked);
    http_client.add_resolved(&id("10001234567890"), LIVE_URL);

    let input = "100012345678901\nuser_100012345678901\nhttps://x.com/100012345678901";
    let parsed = checker.prepare(input);
    assert_eq!(parsed.ids.len(), 1);

    let snapshot = checker
        .check(&RunState::new(), input, &CancellationToken::new(), |_| {})
        .await
        .expect("run should succeed");

    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.live, vec![id("10001234567890")]);
    assert_eq!(http_client.call_count(), 1);
}

#[tokio::test]
async fn test_input_without_ids_is_rejected_before_probing() {
    let (http_client, checker) = mock_checker(10, ScheduleStrategy::Chunked);

    let result = checker
        .check(&RunState::new(), "12345\nabc\n", &CancellationToken::new(), |_| {})
        .await;

    assert!(matches!(result, Err(CheckerError::NoValidIds)));
    assert_eq!(http_client.call_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_three_ids_with_bound_two_report_twice() {
    let (http_client, checker) = mock_checker(2, ScheduleStrategy::Chunked);
    http_client.add_resolved(&id("11111111111111"), LIVE_URL);
    http_client.add_resolved(&id("22222222222222"), DEAD_URL);
    http_client.add_resolved(&id("33333333333333"), LIVE_URL);

    let mut reports: Vec<ProgressSnapshot> = Vec::new();
    let snapshot = checker
        .check(
            &RunState::new(),
            "11111111111111\n22222222222222\n33333333333333\n",
            &CancellationToken::new(),
            |s| reports.push(s),
        )
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].processed, 2);
    assert_eq!(reports[0].live, vec![id("11111111111111")]);
    assert_eq!(reports[0].dead, vec![id("22222222222222")]);
    assert_eq!(snapshot.processed, 3);
    assert_eq!(snapshot.live, vec![id("11111111111111"), id("33333333333333")]);
    assert_eq!(snapshot.dead, vec![id("22222222222222")]);
    assert!(http_client.peak_in_flight() <= 2);
}

#[tokio::test]
async fn test_transport_failure_is_dead_and_not_a_run_error() {
    for strategy in [ScheduleStrategy::Chunked, ScheduleStrategy::Pool] {
        let (http_client, checker) = mock_checker(4, strategy);
        http_client.add_resolved(&id("11111111111111"), LIVE_URL);
        // 22222222222222 has no configured response: the mock fails the request.

        let snapshot = checker
            .check(
                &RunState::new(),
                "11111111111111\n22222222222222",
                &CancellationToken::new(),
                |_| {},
            )
            .await
            .expect("probe failures must not fail the run");

        assert_eq!(snapshot.dead, vec![id("22222222222222")]);
        assert!(!snapshot.live.contains(&id("22222222222222")));
    }
}

#[tokio::test]
async fn test_large_batch_respects_bound_in_pool_mode() {
    let (http_client, checker) = mock_checker(16, ScheduleStrategy::Pool);
    let input: String = (0..500u64)
        .map(|i| format!("user_{:014}\n", 10_000_000_000_000 + i))
        .collect();
    for i in 0..500u64 {
        if i % 2 == 0 {
            http_client.add_resolved(&id(&format!("{:014}", 10_000_000_000_000 + i)), LIVE_URL);
        }
    }

    let mut last_processed = 0;
    let snapshot = checker
        .check(&RunState::new(), &input, &CancellationToken::new(), |s| {
            assert!(s.processed >= last_processed);
            last_processed = s.processed;
        })
        .await
        .unwrap();

    assert_eq!(snapshot.processed, 500);
    assert_eq!(snapshot.live.len(), 250);
    assert_eq!(snapshot.dead.len(), 250);
    assert!(http_client.peak_in_flight() <= 16);
}

#[tokio::test]
async fn test_line_cap_truncates_input() {
    let http_client = Arc::new(MockHttpClient::new());
    let config = CheckerConfig {
        max_ids_per_run: 2,
        ..Default::default()
    };
    let checker = Checker::with_client(http_client.clone(), config).unwrap();

    let snapshot = checker
        .check(
            &RunState::new(),
            "11111111111111\n22222222222222\n33333333333333",
            &CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(snapshot.total, 2);
    assert_eq!(http_client.call_count(), 2);
}

// ============================================================================
// Real HTTP against a local picture server
// ============================================================================

mod picture_server {
    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Redirect, Response};
    use axum::routing::get;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Ids starting with 1 redirect to a real photo, 2 to the placeholder,
    /// 3 answer slowly, anything else fails with 500.
    async fn picture(
        Path(id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Response {
        if query.get("type").map(String::as_str) != Some("normal") {
            return StatusCode::BAD_REQUEST.into_response();
        }
        match id.chars().next() {
            Some('1') => Redirect::temporary(&format!("/cdn/{}.jpg", id)).into_response(),
            Some('2') => Redirect::temporary("/static/placeholder.gif").into_response(),
            Some('3') => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Redirect::temporary("/cdn/slow.jpg").into_response()
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    pub async fn spawn() -> String {
        let app = Router::new()
            .route("/{id}/picture", get(picture))
            .route("/cdn/{file}", get(|| async { "jpeg bytes" }))
            .route("/static/placeholder.gif", get(|| async { "gif bytes" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

fn reqwest_probe(endpoint: &str, distinguish_unreachable: bool) -> LivenessProbe<ReqwestHttpClient> {
    let config = CheckerConfig {
        remote_endpoint_base: endpoint.to_string(),
        timeout_ms: 300,
        distinguish_unreachable,
        ..Default::default()
    };
    LivenessProbe::new(Arc::new(ReqwestHttpClient::new()), &config)
}

#[test_log::test(tokio::test)]
async fn test_reqwest_probe_follows_redirects() {
    let endpoint = picture_server::spawn().await;
    let probe = reqwest_probe(&endpoint, false);

    assert_eq!(probe.probe(&id("11111111111111")).await, CheckOutcome::Live);
    assert_eq!(probe.probe(&id("22222222222222")).await, CheckOutcome::Dead);
    assert_eq!(probe.probe(&id("99999999999999")).await, CheckOutcome::Dead);
}

#[tokio::test]
async fn test_reqwest_probe_timeout_is_dead_or_unreachable() {
    let endpoint = picture_server::spawn().await;

    let slow = id("33333333333333");
    assert_eq!(reqwest_probe(&endpoint, false).probe(&slow).await, CheckOutcome::Dead);
    assert_eq!(
        reqwest_probe(&endpoint, true).probe(&slow).await,
        CheckOutcome::Unreachable
    );
}

#[tokio::test]
async fn test_reqwest_probe_connection_refused() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let target = id("11111111111111");
    assert_eq!(reqwest_probe(&endpoint, false).probe(&target).await, CheckOutcome::Dead);
    assert_eq!(
        reqwest_probe(&endpoint, true).probe(&target).await,
        CheckOutcome::Unreachable
    );
}

#[test_log::test(tokio::test)]
async fn test_checker_end_to_end_over_http() {
    let endpoint = picture_server::spawn().await;
    let config = CheckerConfig {
        concurrency_bound: 2,
        remote_endpoint_base: endpoint,
        timeout_ms: 2_000,
        ..Default::default()
    };
    let checker = Checker::new(config).unwrap();
    let state = RunState::new();

    let snapshot = checker
        .check(
            &state,
            "https://x.com/11111111111111\nuser_22222222222222\n11111111111111\n12222222222222",
            &CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(snapshot.total, 3);
    assert_eq!(snapshot.live, vec![id("11111111111111"), id("12222222222222")]);
    assert_eq!(snapshot.dead, vec![id("22222222222222")]);
    assert_eq!(state.snapshot(), snapshot);
}
