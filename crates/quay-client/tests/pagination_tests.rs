//! Integration tests for offset and date pagination.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;

use common::{int_page, table_payload, test_config};
use quay_client::error::{ClientError, FetchError, PaginationError};
use quay_client::transport::ReqwestHttp;
use quay_client::{Client, Pagination, Query, Value};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, page_size: usize) -> Client {
    Client::with_transport(
        test_config(&server.uri(), page_size),
        Arc::new(ReqwestHttp::new()),
    )
    .unwrap()
}

/// A short page signals exhaustion.
///
/// - 303 logical rows served as pages of 100, 100, 100, 3
/// - Exactly 4 page requests, offsets 0, 100, 200, 300
/// - Merged table has all 303 rows in delivery order
#[tokio::test]
async fn test_offset_pagination_runs_to_exhaustion() {
    let server = MockServer::start().await;

    for (offset, count) in [(0, 100), (100, 100), (200, 100), (300, 3)] {
        Mock::given(method("GET"))
            .and(path("/iss/history.json"))
            .and(query_param("start", offset.to_string()))
            .and(query_param("limit", "100"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(int_page("history", offset, count)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let table = client(&server, 100)
        .query_table(
            &Query::new("iss/history"),
            "history",
            &Pagination::Offset,
            None,
        )
        .await
        .unwrap();

    assert_eq!(table.row_count(), 303);
    assert_eq!(table.get_value(0, "ID"), Some(&Value::Int(0)));
    assert_eq!(table.get_value(302, "ID"), Some(&Value::Int(302)));
}

/// An empty page also terminates pagination.
#[tokio::test]
async fn test_zero_row_page_terminates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/iss/history.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(int_page("history", 0, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let table = client(&server, 100)
        .query_table(
            &Query::new("iss/history"),
            "history",
            &Pagination::Offset,
            None,
        )
        .await
        .unwrap();

    assert!(table.is_empty());
    assert_eq!(table.schema().len(), 1);
}

/// A server that never returns a short page hits the page ceiling instead of
/// looping forever.
#[tokio::test]
async fn test_page_ceiling_bounds_a_misbehaving_server() {
    let server = MockServer::start().await;

    // Always a full page, whatever the offset.
    Mock::given(method("GET"))
        .and(path("/iss/history.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(int_page("history", 0, 100)))
        .expect(10)
        .mount(&server)
        .await;

    let error = client(&server, 100)
        .query_table(
            &Query::new("iss/history"),
            "history",
            &Pagination::Offset,
            None,
        )
        .await
        .unwrap_err();

    match error {
        ClientError::TableFetchFailed {
            source: FetchError::Pagination(PaginationError::CeilingExceeded { pages }),
            ..
        } => assert_eq!(pages, 10),
        other => panic!("unexpected error: {other:?}"),
    }
}

/// A row limit stops pagination early and truncates the final page.
///
/// - Limit 150 over full pages of 100 issues exactly 2 page requests
#[tokio::test]
async fn test_row_limit_stops_early() {
    let server = MockServer::start().await;

    for offset in [0, 100] {
        Mock::given(method("GET"))
            .and(path("/iss/history.json"))
            .and(query_param("start", offset.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(int_page("history", offset, 100)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let table = client(&server, 100)
        .query_table(
            &Query::new("iss/history"),
            "history",
            &Pagination::Offset,
            Some(150),
        )
        .await
        .unwrap();

    assert_eq!(table.row_count(), 150);
    assert_eq!(table.get_value(149, "ID"), Some(&Value::Int(149)));
}

/// A zero limit is rejected before any request.
#[tokio::test]
async fn test_zero_limit_is_invalid() {
    let server = MockServer::start().await;

    let error = client(&server, 100)
        .query_table(
            &Query::new("iss/history"),
            "history",
            &Pagination::Offset,
            Some(0),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::InvalidQuery(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

fn date_page(rows: serde_json::Value) -> serde_json::Value {
    table_payload(
        "history",
        json!([
            {"name": "TRADEDATE", "type": "date"},
            {"name": "ID", "type": "int64"},
        ]),
        rows,
    )
}

/// Date pagination advances the boundary one day past each page's maximum
/// date and stops on an empty page.
#[tokio::test]
async fn test_date_pagination_advances_boundary() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/iss/history.json"))
        .and(query_param_is_missing("from"))
        .respond_with(ResponseTemplate::new(200).set_body_json(date_page(json!([
            ["2024-06-10", 1],
            ["2024-06-11", 2],
        ]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/iss/history.json"))
        .and(query_param("from", "2024-06-12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(date_page(json!([["2024-06-12", 3]]))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/iss/history.json"))
        .and(query_param("from", "2024-06-13"))
        .respond_with(ResponseTemplate::new(200).set_body_json(date_page(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let table = client(&server, 100)
        .query_table(
            &Query::new("iss/history"),
            "history",
            &Pagination::Date {
                column: "TRADEDATE".to_string(),
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(table.row_count(), 3);
    assert_eq!(table.get_value(2, "ID"), Some(&Value::Int(3)));
}

/// A date-paginated table without the date column fails that table.
#[tokio::test]
async fn test_date_pagination_requires_date_column() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/iss/history.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(int_page("history", 0, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let error = client(&server, 100)
        .query_table(
            &Query::new("iss/history"),
            "history",
            &Pagination::Date {
                column: "TRADEDATE".to_string(),
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ClientError::TableFetchFailed {
            source: FetchError::Pagination(PaginationError::BadDateColumn { .. }),
            ..
        }
    ));
}
