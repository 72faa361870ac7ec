use serde_json::Value as Json;

use crate::error::{FetchError, ResponseError, ResponseResult, TableError};
use crate::table::{RawTable, Table};

/// Outcome of fetching one table: the decoded table, or why it failed.
pub type TableEntry = Result<Table, FetchError>;

/// All tables (or their failures) returned for one logical query.
///
/// Entry order is the server-delivery order of the response envelope, or the
/// requested-table order for an explicit selection. Per-table failures are
/// entries, not call failures.
#[derive(Debug, Default)]
pub struct ResultSet {
    entries: Vec<(String, TableEntry)>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw response body into a result set.
    ///
    /// Every top-level key is decoded as a table, independently; a failure in
    /// one table becomes that table's entry and never aborts its siblings.
    /// A body that is not a JSON object fails as a whole.
    pub fn decode(body: &str) -> ResponseResult<ResultSet> {
        let parsed: Json = serde_json::from_str(body)
            .map_err(|e| ResponseError::MalformedEnvelope(e.to_string()))?;
        let Json::Object(map) = parsed else {
            return Err(ResponseError::MalformedEnvelope(
                "top-level value is not an object".to_string(),
            ));
        };

        let mut set = ResultSet::new();
        for (name, value) in map {
            let entry = decode_table(value);
            set.entries.push((name, entry));
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Table names in entry order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn get(&self, name: &str) -> Option<&TableEntry> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, entry)| entry)
    }

    /// The successfully decoded table under `name`, if any.
    pub fn table(&self, name: &str) -> Option<&Table> {
        match self.get(name) {
            Some(Ok(table)) => Some(table),
            _ => None,
        }
    }

    pub(crate) fn push(&mut self, name: String, entry: TableEntry) {
        self.entries.push((name, entry));
    }

    /// Removes and returns the entry for `name`.
    pub(crate) fn take_entry(&mut self, name: &str) -> Option<TableEntry> {
        let position = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(position).1)
    }
}

fn decode_table(value: Json) -> TableEntry {
    let raw: RawTable = serde_json::from_value(value)
        .map_err(|e| TableError::MalformedSchema(format!("not a table object: {e}")))?;
    Ok(Table::decode(&raw)?)
}
