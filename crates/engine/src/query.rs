// SPDX-License-Identifier: MIT

//! Pattern queries over a root's file table.
//!
//! This is the thin end of the contract with the external query
//! compiler: name patterns (compiled as globs) plus an optional "since"
//! clock spec. A pattern containing `/` matches the whole relative name;
//! otherwise it matches the basename.

use glob::Pattern;
use serde_json::Value;
use thiserror::Error;

use vigil_core::{ClockError, ClockSpec};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid pattern {pattern}: {source}")]
    BadPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("expected the query to be an object")]
    NotAnObject,

    #[error("patterns must be an array of strings")]
    BadPatterns,

    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// A compiled set of name patterns. Empty matches everything.
#[derive(Debug, Clone, Default)]
pub struct Query {
    patterns: Vec<Pattern>,
}

impl Query {
    pub fn match_all() -> Self {
        Query::default()
    }

    pub fn from_patterns(patterns: &[String]) -> Result<Self, QueryError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| QueryError::BadPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Query { patterns })
    }

    /// Whether a relative file name matches this query.
    pub fn matches(&self, name: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let basename = name.rsplit('/').next().unwrap_or(name);
        self.patterns.iter().any(|p| {
            if p.as_str().contains('/') {
                p.matches(name)
            } else {
                p.matches(basename)
            }
        })
    }
}

/// A parsed `query`/`subscribe` argument: patterns plus optional since.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub query: Query,
    pub since: Option<ClockSpec>,
}

impl QuerySpec {
    pub fn match_all() -> Self {
        QuerySpec {
            query: Query::match_all(),
            since: None,
        }
    }
}

/// Parse a wire query spec: an object with optional `patterns` (array of
/// strings) and `since` (clock spec).
pub fn parse_query_spec(value: &Value) -> Result<QuerySpec, QueryError> {
    let obj = value.as_object().ok_or(QueryError::NotAnObject)?;

    let query = match obj.get("patterns") {
        None => Query::match_all(),
        Some(patterns) => {
            let raw = patterns
                .as_array()
                .ok_or(QueryError::BadPatterns)?
                .iter()
                .map(|p| p.as_str().map(str::to_string).ok_or(QueryError::BadPatterns))
                .collect::<Result<Vec<_>, _>>()?;
            Query::from_patterns(&raw)?
        }
    };

    let since = obj.get("since").map(ClockSpec::parse).transpose()?;

    Ok(QuerySpec { query, since })
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
