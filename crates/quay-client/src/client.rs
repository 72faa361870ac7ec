use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, FetchError};
use crate::paginate::{Paginator, Pagination, PARAM_FROM};
use crate::query::{Query, TableSelection};
use crate::response::ResultSet;
use crate::table::Table;
use crate::transport::{HttpSend, ReqwestHttp, Transport};

/// Public facade: executes logical queries against the service and returns
/// fully paginated, typed result sets.
///
/// A call returns a [`ResultSet`] even if some requested tables individually
/// failed; inspect per-table entries. The call as a whole fails only on
/// query validation, cancellation, or total transport unavailability.
pub struct Client {
    config: ClientConfig,
    transport: Transport,
}

impl Client {
    /// Builds a client with the production HTTP transport.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        Self::with_transport(config, Arc::new(ReqwestHttp::new()))
    }

    /// Builds a client over a caller-supplied socket boundary. Tests use
    /// this to substitute fake transports.
    pub fn with_transport(config: ClientConfig, http: Arc<dyn HttpSend>) -> ClientResult<Self> {
        config.validate()?;
        let transport =
            Transport::new(&config, http).map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Executes a query: fetches every requested table to completion,
    /// concurrently, and returns one result set in deterministic order
    /// (requested order, or server-delivery order for
    /// [`TableSelection::All`]).
    pub async fn query(&self, query: &Query) -> ClientResult<ResultSet> {
        query.validate(&[])?;
        match query.tables() {
            TableSelection::Named(names) => self.fetch_named(query, names).await,
            TableSelection::All => self.fetch_all(query).await,
        }
    }

    /// Like [`Client::query`], bounded by a caller deadline. On expiry every
    /// in-flight page request is aborted and the call fails with
    /// [`ClientError::Cancelled`]; no partial results are returned.
    pub async fn query_with_deadline(
        &self,
        query: &Query,
        deadline: Duration,
    ) -> ClientResult<ResultSet> {
        match tokio::time::timeout(deadline, self.query(query)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Cancelled),
        }
    }

    /// Fetches a single table with an explicit pagination mode and an
    /// optional cap on the number of rows.
    pub async fn query_table(
        &self,
        query: &Query,
        table: &str,
        mode: &Pagination,
        limit: Option<usize>,
    ) -> ClientResult<Table> {
        let reserved: &[&str] = match mode {
            Pagination::Date { .. } => &[PARAM_FROM],
            _ => &[],
        };
        query.validate(reserved)?;
        if table.trim().is_empty() {
            return Err(ClientError::invalid_query("table name must not be empty"));
        }
        if limit == Some(0) {
            return Err(ClientError::invalid_query("limit must be a positive integer"));
        }

        self.paginator()
            .fetch_table(query, table, mode, limit)
            .await
            .map_err(|source| ClientError::TableFetchFailed {
                table: table.to_string(),
                source,
            })
    }

    fn paginator(&self) -> Paginator<'_> {
        Paginator::new(
            &self.transport,
            self.config.page_size,
            self.config.page_ceiling,
        )
    }

    async fn fetch_named(&self, query: &Query, names: &[String]) -> ClientResult<ResultSet> {
        let paginator = self.paginator();
        let tasks = names.iter().map(|name| {
            let paginator = &paginator;
            async move {
                let entry = paginator
                    .fetch_table(query, name, &Pagination::Offset, None)
                    .await;
                (name.clone(), entry)
            }
        });

        // join_all keeps enumeration order, so the result set order does not
        // depend on which table's fetch completes first.
        let mut set = ResultSet::new();
        for (name, entry) in join_all(tasks).await {
            if let Err(e) = &entry {
                debug!("table '{name}' failed: {e}");
            }
            set.push(name, entry);
        }

        if let Some(reason) = totally_unavailable(&set) {
            return Err(ClientError::TotalUnavailable(reason));
        }
        Ok(set)
    }

    async fn fetch_all(&self, query: &Query) -> ClientResult<ResultSet> {
        // One discovery request, without cursor parameters, determines the
        // table-name set and their server-delivery order.
        let params: Vec<(String, String)> = query.filters().to_vec();
        let body = self
            .transport
            .send(query.endpoint(), &params)
            .await
            .map_err(|e| ClientError::TotalUnavailable(e.to_string()))?;
        let discovered =
            ResultSet::decode(&body).map_err(|e| ClientError::BadDiscovery(e.to_string()))?;

        let names: Vec<String> = discovered.names().map(str::to_string).collect();
        debug!("discovered {} table(s): {names:?}", names.len());
        if names.is_empty() {
            return Ok(discovered);
        }
        self.fetch_named(query, &names).await
    }
}

/// A call fails as a whole only when nothing was fetched at all: every entry
/// failed in transport, before any table data arrived.
fn totally_unavailable(set: &ResultSet) -> Option<String> {
    if set.is_empty() {
        return None;
    }
    let mut reason = None;
    for (_, entry) in set.iter() {
        match entry {
            Err(FetchError::Transport(e)) => {
                reason.get_or_insert_with(|| e.to_string());
            }
            _ => return None,
        }
    }
    reason
}
