use chrono::NaiveDate;
use log::debug;

use crate::error::{FetchError, PaginationError, PaginationResult, ResponseError};
use crate::query::Query;
use crate::response::ResultSet;
use crate::table::Table;
use crate::transport::Transport;
use crate::value::{Value, DATE_FORMAT};

pub(crate) const PARAM_START: &str = "start";
pub(crate) const PARAM_LIMIT: &str = "limit";
pub(crate) const PARAM_ONLY: &str = "iss.only";
pub(crate) const PARAM_FROM: &str = "from";

/// How a single table is driven to exhaustion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Pagination {
    /// One request, no cursor.
    None,
    /// Offset/limit cursor (`start`/`limit` parameters).
    #[default]
    Offset,
    /// Date-boundary cursor (`from` parameter) windowing on a date column.
    Date { column: String },
}

// Internal to one logical-table fetch; never exposed to callers.
struct PageCursor {
    offset: u64,
    page_size: u64,
}

/// Fetches one logical table to completion even though the server returns it
/// in bounded-size pages. Pagination is per-table: each page request
/// restricts the response to the table being fetched, and exhaustion is
/// evaluated for that table alone.
pub(crate) struct Paginator<'a> {
    transport: &'a Transport,
    page_size: usize,
    page_ceiling: usize,
}

impl<'a> Paginator<'a> {
    pub fn new(transport: &'a Transport, page_size: usize, page_ceiling: usize) -> Self {
        Self {
            transport,
            page_size,
            page_ceiling,
        }
    }

    /// Fetches `table` according to `mode`, optionally capped at `limit` rows.
    /// Rows keep server-delivery order; pages are merged in arrival order.
    pub async fn fetch_table(
        &self,
        query: &Query,
        table: &str,
        mode: &Pagination,
        limit: Option<usize>,
    ) -> Result<Table, FetchError> {
        match mode {
            Pagination::None => self.fetch_single(query, table, limit).await,
            Pagination::Offset => self.fetch_offset(query, table, limit).await,
            Pagination::Date { column } => self.fetch_date(query, table, column, limit).await,
        }
    }

    async fn fetch_single(
        &self,
        query: &Query,
        table: &str,
        limit: Option<usize>,
    ) -> Result<Table, FetchError> {
        let mut result = self.fetch_page(query, table, &[]).await?;
        if let Some(cap) = limit {
            result.truncate(cap);
        }
        Ok(result)
    }

    async fn fetch_offset(
        &self,
        query: &Query,
        table: &str,
        limit: Option<usize>,
    ) -> Result<Table, FetchError> {
        let mut cursor = PageCursor {
            offset: 0,
            page_size: self.page_size as u64,
        };
        let mut merged: Option<Table> = None;
        let mut remaining = limit;
        let mut exhausted = false;

        for page_index in 0..self.page_ceiling {
            let extra = [
                (PARAM_START.to_string(), cursor.offset.to_string()),
                (PARAM_LIMIT.to_string(), cursor.page_size.to_string()),
            ];
            let mut page = self.fetch_page(query, table, &extra).await?;
            let page_rows = page.row_count();
            debug!(
                "table '{table}': page {page_index} returned {page_rows} rows at offset {}",
                cursor.offset
            );

            if let Some(cap) = remaining {
                if page_rows > cap {
                    page.truncate(cap);
                }
            }
            merge_page(&mut merged, page, table)?;

            if let Some(cap) = remaining {
                let left = cap.saturating_sub(page_rows);
                if left == 0 {
                    exhausted = true;
                    break;
                }
                remaining = Some(left);
            }

            // A short or empty page signals exhaustion.
            if page_rows == 0 || (page_rows as u64) < cursor.page_size {
                exhausted = true;
                break;
            }
            cursor.offset += cursor.page_size;
        }

        finish(merged, exhausted, self.page_ceiling)
    }

    async fn fetch_date(
        &self,
        query: &Query,
        table: &str,
        column: &str,
        limit: Option<usize>,
    ) -> Result<Table, FetchError> {
        let mut boundary: Option<NaiveDate> = None;
        let mut merged: Option<Table> = None;
        let mut remaining = limit;
        let mut exhausted = false;

        for page_index in 0..self.page_ceiling {
            let mut extra = Vec::new();
            if let Some(from) = boundary {
                extra.push((PARAM_FROM.to_string(), from.format(DATE_FORMAT).to_string()));
            }
            let mut page = self.fetch_page(query, table, &extra).await?;
            let page_rows = page.row_count();
            debug!("table '{table}': date page {page_index} returned {page_rows} rows");

            if page_rows == 0 {
                // Seed an empty table with the page's schema when nothing
                // was fetched at all.
                if merged.is_none() {
                    merged = Some(page);
                }
                exhausted = true;
                break;
            }

            let max_date = max_page_date(&page, column)?;

            if let Some(cap) = remaining {
                if page_rows > cap {
                    page.truncate(cap);
                }
            }
            merge_page(&mut merged, page, table)?;

            if let Some(cap) = remaining {
                let left = cap.saturating_sub(page_rows);
                if left == 0 {
                    exhausted = true;
                    break;
                }
                remaining = Some(left);
            }

            let next = max_date
                .succ_opt()
                .ok_or(PaginationError::CursorStalled)?;
            if let Some(previous) = boundary {
                if next <= previous {
                    return Err(PaginationError::CursorStalled.into());
                }
            }
            boundary = Some(next);
        }

        finish(merged, exhausted, self.page_ceiling)
    }

    /// One page request: caller filters, the table restriction, and the
    /// cursor parameters for this page.
    async fn fetch_page(
        &self,
        query: &Query,
        table: &str,
        extra: &[(String, String)],
    ) -> Result<Table, FetchError> {
        let mut params: Vec<(String, String)> = query
            .filters()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        params.push((PARAM_ONLY.to_string(), table.to_string()));
        params.extend_from_slice(extra);

        let body = self.transport.send(query.endpoint(), &params).await?;
        let mut set = ResultSet::decode(&body)?;
        match set.take_entry(table) {
            Some(entry) => entry,
            None => Err(ResponseError::MissingTable {
                table: table.to_string(),
            }
            .into()),
        }
    }
}

fn merge_page(merged: &mut Option<Table>, page: Table, table: &str) -> PaginationResult<()> {
    match merged {
        Some(accumulated) => {
            if accumulated.schema() != page.schema() {
                return Err(PaginationError::PageSchemaMismatch {
                    table: table.to_string(),
                });
            }
            accumulated.extend_rows(page.into_rows());
            Ok(())
        }
        None => {
            *merged = Some(page);
            Ok(())
        }
    }
}

fn finish(
    merged: Option<Table>,
    exhausted: bool,
    page_ceiling: usize,
) -> Result<Table, FetchError> {
    match merged {
        Some(table) if exhausted => Ok(table),
        _ => Err(PaginationError::CeilingExceeded {
            pages: page_ceiling,
        }
        .into()),
    }
}

fn max_page_date(page: &Table, column: &str) -> PaginationResult<NaiveDate> {
    let position = page
        .column_position(column)
        .ok_or_else(|| PaginationError::BadDateColumn {
            column: column.to_string(),
            reason: "no such column".to_string(),
        })?;

    let mut max_date: Option<NaiveDate> = None;
    for row in page.rows() {
        match &row[position] {
            Value::Null => continue,
            Value::Date(date) => {
                max_date = Some(max_date.map_or(*date, |current| current.max(*date)));
            }
            _ => {
                return Err(PaginationError::BadDateColumn {
                    column: column.to_string(),
                    reason: "column does not contain date values".to_string(),
                })
            }
        }
    }

    max_date.ok_or_else(|| PaginationError::BadDateColumn {
        column: column.to_string(),
        reason: "column contains no date values".to_string(),
    })
}
