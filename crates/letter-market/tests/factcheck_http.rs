mod common;

use common::fast_retry;
use httpmock::Method::POST;
use httpmock::MockServer;
use letter_market::api::{FactChecker, MiniCheckClient, Verdict, assess};
use letter_market::{NewsletterConfig, NewsletterError};

const PATH: &str = "/v0/argus/minicheck/factcheck";

fn client(server: &MockServer) -> MiniCheckClient {
    MiniCheckClient::new("bespoke-test")
        .unwrap()
        .with_base_url(server.base_url())
        .with_retry_policy(fast_retry())
}

fn mock_prob<'a>(server: &'a MockServer, body: &str) -> httpmock::Mock<'a> {
    let body = body.to_string();
    server.mock(move |when, then| {
        when.method(POST).path(PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

#[tokio::test]
async fn support_probability_maps_to_verdicts() {
    let cases = [
        (0.8, Verdict::Supported, 80.0),
        (0.799_99, Verdict::PartiallySupported, 80.0),
        (0.5, Verdict::PartiallySupported, 50.0),
        (0.499, Verdict::Unsupported, 49.9),
    ];

    for (prob, verdict, percent) in cases {
        let server = MockServer::start();
        let mock = mock_prob(&server, &format!(r#"{{"support_prob": {prob}}}"#));

        let report = assess(&client(&server), "Stocks rallied.", "NVDA rose 4%.")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(report.verdict, verdict, "prob {prob}");
        assert_eq!(report.score_percent, percent, "prob {prob}");
    }
}

#[tokio::test]
async fn out_of_range_probability_is_rejected() {
    let server = MockServer::start();
    mock_prob(&server, r#"{"support_prob": 1.2}"#);

    let result = client(&server).check("claim", "context").await;
    assert!(matches!(result, Err(NewsletterError::FactCheck(_))));
}

#[tokio::test]
async fn missing_probability_is_missing_key() {
    let server = MockServer::start();
    mock_prob(&server, r#"{"detail": "ok"}"#);

    let result = client(&server).check("claim", "context").await;
    assert!(matches!(result, Err(NewsletterError::MissingKey { ref key, .. }) if key == "support_prob"));
}

#[tokio::test]
async fn empty_input_makes_no_request() {
    let server = MockServer::start();
    let mock = mock_prob(&server, r#"{"support_prob": 0.9}"#);

    let checker = client(&server);
    assert!(matches!(
        checker.check("", "context").await,
        Err(NewsletterError::Validation(_))
    ));
    assert!(matches!(
        checker.check("claim", "   ").await,
        Err(NewsletterError::Validation(_))
    ));
    mock.assert_hits(0);
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(401).body(r#"{"detail": "Invalid API key"}"#);
    });

    let result = client(&server).check("claim", "context").await;

    assert!(matches!(result, Err(NewsletterError::Status { status: 401, .. })));
    mock.assert_hits(1);
}

#[test]
fn client_is_optional_without_key() {
    let config = NewsletterConfig::default();
    assert!(MiniCheckClient::from_config(&config).unwrap().is_none());

    let config = NewsletterConfig::builder()
        .bespoke_api_key("bespoke-test")
        .build()
        .unwrap();
    assert!(MiniCheckClient::from_config(&config).unwrap().is_some());
}
