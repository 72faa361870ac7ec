use std::collections::HashSet;

use crate::error::{ClientError, ClientResult};
use crate::paginate::{PARAM_LIMIT, PARAM_ONLY, PARAM_START};

/// Which tables of the response a query asks for.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TableSelection {
    /// Every table the server returns for the endpoint.
    #[default]
    All,
    /// An explicit, ordered, duplicate-free set of table names.
    Named(Vec<String>),
}

/// A logical query: endpoint path, user filters and the requested tables.
/// Immutable once constructed; request parameters for every page are derived
/// from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    endpoint: String,
    filters: Vec<(String, String)>,
    tables: TableSelection,
}

impl Query {
    /// Creates a query for `endpoint` (the service path without the `.json`
    /// suffix), selecting all tables and carrying no filters.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            filters: Vec::new(),
            tables: TableSelection::All,
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn with_tables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = TableSelection::Named(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn tables(&self) -> &TableSelection {
        &self.tables
    }

    /// Validates the query before any request is issued.
    ///
    /// `extra_reserved` names parameters claimed by the active pagination
    /// mode in addition to the always-reserved cursor keys.
    pub(crate) fn validate(&self, extra_reserved: &[&str]) -> ClientResult<()> {
        if self.endpoint.trim_matches('/').trim().is_empty() {
            return Err(ClientError::invalid_query("endpoint must not be empty"));
        }

        let mut keys = HashSet::new();
        for (key, _) in &self.filters {
            if key.trim().is_empty() {
                return Err(ClientError::invalid_query("filter keys must not be empty"));
            }
            if RESERVED_KEYS.contains(&key.as_str()) || extra_reserved.contains(&key.as_str()) {
                return Err(ClientError::invalid_query(format!(
                    "filter key '{key}' is reserved for pagination"
                )));
            }
            if !keys.insert(key.as_str()) {
                return Err(ClientError::invalid_query(format!(
                    "duplicate filter key '{key}'"
                )));
            }
        }

        if let TableSelection::Named(names) = &self.tables {
            if names.is_empty() {
                return Err(ClientError::invalid_query(
                    "table selection must name at least one table",
                ));
            }
            let mut seen = HashSet::new();
            for name in names {
                if name.trim().is_empty() {
                    return Err(ClientError::invalid_query("table names must not be empty"));
                }
                if !seen.insert(name.as_str()) {
                    return Err(ClientError::invalid_query(format!(
                        "duplicate table '{name}' in selection"
                    )));
                }
            }
        }

        Ok(())
    }
}

const RESERVED_KEYS: [&str; 3] = [PARAM_START, PARAM_LIMIT, PARAM_ONLY];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_query_passes() {
        let query = Query::new("iss/securities")
            .with_filter("q", "GAZP")
            .with_tables(["securities", "marketdata"]);
        assert!(query.validate(&[]).is_ok());
    }

    #[test]
    fn test_empty_endpoint_is_invalid() {
        for endpoint in ["", "  ", "///"] {
            assert!(matches!(
                Query::new(endpoint).validate(&[]),
                Err(ClientError::InvalidQuery(_))
            ));
        }
    }

    #[test]
    fn test_reserved_filter_keys_are_rejected() {
        for key in ["start", "limit", "iss.only"] {
            let query = Query::new("iss/securities").with_filter(key, "1");
            assert!(matches!(
                query.validate(&[]),
                Err(ClientError::InvalidQuery(_))
            ));
        }
        // `from` is only reserved when date pagination claims it.
        let query = Query::new("iss/securities").with_filter("from", "2024-01-01");
        assert!(query.validate(&[]).is_ok());
        assert!(query.validate(&["from"]).is_err());
    }

    #[test]
    fn test_duplicate_tables_are_rejected() {
        let query = Query::new("iss/securities").with_tables(["securities", "securities"]);
        assert!(matches!(
            query.validate(&[]),
            Err(ClientError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let query = Query::new("iss/securities").with_tables(Vec::<String>::new());
        assert!(matches!(
            query.validate(&[]),
            Err(ClientError::InvalidQuery(_))
        ));
    }
}
