//! Tests for the comparison engine against a mock Blockspan server

use chrono::{DateTime, TimeZone, Utc};
use collection_tracker::tracker::{
    BlockspanClient, Comparison, ComparisonError, RequestState, SnapshotComparator, TrackerBuilder,
};
use collection_tracker::{Chain, Timeframe};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;

const API_KEY: &str = "test-key";
const CONTRACT: &str = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, 20, 18, 0, 0).unwrap()
}

fn comparator_for(base_url: &str) -> SnapshotComparator {
    let config = TrackerBuilder::new()
        .with_api_key(API_KEY)
        .with_base_url(base_url)
        .build_config();
    let client = BlockspanClient::new(reqwest::Client::new(), &config).expect("client");
    SnapshotComparator::new(Arc::new(client))
}

fn sales_body(total_sales: u64, avg_price: &str) -> Value {
    json!({
        "total_sales": total_sales,
        "total_unique_tokens": total_sales,
        "avg_price_usd": avg_price,
        "max_price_usd": "1000",
        "total_sales_volume_usd": "25000.5",
    })
}

/// Mock one snapshot request, matched on every query parameter.
async fn mock_snapshot(
    server: &mut ServerGuard,
    timestamp_end: &str,
    status: usize,
    body: String,
) -> Mock {
    server
        .mock("GET", "/v1/nfts/nfthistory")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("contract_address".into(), CONTRACT.into()),
            Matcher::UrlEncoded("chain".into(), "eth-main".into()),
            Matcher::UrlEncoded("timeframe".into(), "7_DAYS".into()),
            Matcher::UrlEncoded("bin_size".into(), "1_DAY".into()),
            Matcher::UrlEncoded("timestamp_end".into(), timestamp_end.into()),
        ]))
        .match_header("x-api-key", API_KEY)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

const CURRENT_END: &str = "2023-05-20T18:00:00.000Z";
const PRIOR_END: &str = "2023-05-13T18:00:00.000Z";

#[tokio::test]
async fn test_success_issues_both_requests() {
    let mut server = mockito::Server::new_async().await;
    let current = mock_snapshot(&mut server, CURRENT_END, 200, sales_body(120, "3.5").to_string()).await;
    let prior = mock_snapshot(&mut server, PRIOR_END, 200, sales_body(100, "2.8").to_string()).await;

    let result = comparator_for(&server.url())
        .compare(CONTRACT, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    current.assert_async().await;
    prior.assert_async().await;

    let report = match result {
        Ok(Comparison::Success(report)) => report,
        other => panic!("expected success, got {:?}", other),
    };
    let rows = report.rows();
    assert_eq!(rows[0].prior_formatted, "100");
    assert_eq!(rows[0].current_formatted, "120");
    assert_eq!(rows[0].percent_change.unwrap().signed(), "+20.00");
    assert_eq!(rows[2].prior_formatted, "2.80");
    assert_eq!(rows[2].current_formatted, "3.50");
    assert_eq!(rows[2].percent_change.unwrap().signed(), "+25.00");
    assert_eq!(rows[4].current_formatted, "25000.50");
}

#[tokio::test]
async fn test_address_is_trimmed_before_sending() {
    let mut server = mockito::Server::new_async().await;
    let current = mock_snapshot(&mut server, CURRENT_END, 200, sales_body(1, "1").to_string()).await;
    let prior = mock_snapshot(&mut server, PRIOR_END, 200, sales_body(1, "1").to_string()).await;

    let padded = format!("  {}\n", CONTRACT);
    let result = comparator_for(&server.url())
        .compare(&padded, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    current.assert_async().await;
    prior.assert_async().await;
    assert!(matches!(result, Ok(Comparison::Success(_))));
}

#[tokio::test]
async fn test_blank_address_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let any_request = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = comparator_for(&server.url())
        .compare("   ", Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    assert_eq!(result, Err(ComparisonError::Validation));
    any_request.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _current = mock_snapshot(&mut server, CURRENT_END, 200, sales_body(5, "1").to_string()).await;
    let _prior = mock_snapshot(
        &mut server,
        PRIOR_END,
        401,
        json!({ "message": "Unauthorized" }).to_string(),
    )
    .await;

    let result = comparator_for(&server.url())
        .compare(CONTRACT, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    assert_eq!(result, Err(ComparisonError::Auth));
}

#[tokio::test]
async fn test_server_error_is_query_error() {
    let mut server = mockito::Server::new_async().await;
    let _current = mock_snapshot(&mut server, CURRENT_END, 400, "{}".to_string()).await;
    let _prior = mock_snapshot(&mut server, PRIOR_END, 200, sales_body(5, "1").to_string()).await;

    let result = comparator_for(&server.url())
        .compare(CONTRACT, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    assert_eq!(result, Err(ComparisonError::Query));
}

#[tokio::test]
async fn test_undecodable_body_is_query_error() {
    let mut server = mockito::Server::new_async().await;
    let _current = mock_snapshot(&mut server, CURRENT_END, 200, "<html>".to_string()).await;
    let _prior = mock_snapshot(&mut server, PRIOR_END, 200, sales_body(5, "1").to_string()).await;

    let result = comparator_for(&server.url())
        .compare(CONTRACT, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    assert_eq!(result, Err(ComparisonError::Query));
}

#[tokio::test]
async fn test_unreachable_host_is_query_error() {
    let result = comparator_for("http://127.0.0.1:1")
        .compare(CONTRACT, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    assert_eq!(result, Err(ComparisonError::Query));
}

#[tokio::test]
async fn test_zero_sales_is_no_data() {
    let mut server = mockito::Server::new_async().await;
    let _current = mock_snapshot(&mut server, CURRENT_END, 200, sales_body(0, "0").to_string()).await;
    let _prior = mock_snapshot(&mut server, PRIOR_END, 200, sales_body(0, "0").to_string()).await;

    let result = comparator_for(&server.url())
        .compare(CONTRACT, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;

    assert!(matches!(result, Ok(Comparison::NoData { .. })));
}

#[tokio::test]
async fn test_session_clears_slots_on_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _current = mock_snapshot(&mut server, CURRENT_END, 401, "{}".to_string()).await;
    let _prior = mock_snapshot(&mut server, PRIOR_END, 200, sales_body(5, "1").to_string()).await;

    let session = TrackerBuilder::new()
        .with_api_key(API_KEY)
        .with_base_url(server.url())
        .build()
        .expect("session");

    let submission = session
        .submit(CONTRACT, Chain::EthMain, Timeframe::SevenDays, fixed_now())
        .await;
    assert_eq!(submission.result, Err(ComparisonError::Auth));

    let view = session.view().await;
    assert_eq!(view.state, RequestState::Error);
    assert!(view.current.is_none());
    assert!(view.prior.is_none());
}
