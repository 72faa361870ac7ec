//! Shared helpers for client integration tests.

use quay_client::config::{ClientConfig, FixedRetryStrategy, RetryStrategy};
use serde_json::{json, Value as Json};

/// Client settings pointed at a mock server: small page sizes, a low page
/// ceiling, and instant retries so suites stay fast.
pub fn test_config(base_url: &str, page_size: usize) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        page_size,
        page_ceiling: 10,
        max_concurrent_requests: 4,
        attempt_timeout_secs: 5,
        request_deadline_secs: 5,
        retry: RetryStrategy::Fixed(FixedRetryStrategy {
            max_count: 3,
            delay_secs: 0,
        }),
    }
}

/// A one-table response envelope.
#[allow(dead_code)]
pub fn table_payload(table: &str, columns: Json, data: Json) -> Json {
    json!({ table: { "columns": columns, "data": data } })
}

/// A one-column `ID: int64` table holding `count` sequential values starting
/// at `start`.
#[allow(dead_code)]
pub fn int_page(table: &str, start: i64, count: i64) -> Json {
    table_payload(
        table,
        json!([{"name": "ID", "type": "int64"}]),
        Json::Array((start..start + count).map(|i| json!([i])).collect()),
    )
}
