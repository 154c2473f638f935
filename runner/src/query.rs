use crate::config::ConfigErrors;
use std::{fmt, fs, path::Path};
use tracing::{debug, warn};

/// One input item, handed unchanged to a single invocation of the user command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// last path component, trailing separators ignored
    pub fn file_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');

        match trimmed.rsplit_once('/') {
            Some((_, name)) => name,
            None if !trimmed.is_empty() => trimmed,
            None => &self.0,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// parse a query list, one query per line, blank lines are skipped
pub fn parse_query_list(content: &str) -> Vec<Query> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Query::new)
        .collect()
}

/// read a query list from `path`
pub fn read_query_file(path: &Path) -> Result<Vec<Query>, ConfigErrors> {
    let content = fs::read_to_string(path).map_err(|error| ConfigErrors::QueryFile {
        path: path.to_path_buf(),
        source: error,
    })?;
    let queries = parse_query_list(&content);

    if queries.is_empty() {
        warn!(path = ?path, "Query file does not contain any queries");
    } else {
        debug!(path = ?path, "Read {} queries", queries.len());
    }

    Ok(queries)
}
