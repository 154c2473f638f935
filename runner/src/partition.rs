use crate::query::Query;
use itertools::Itertools;
use std::num::NonZeroUsize;

/// Queries that share one scheduler job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// position of the batch in submission order
    pub index: usize,
    queries: Vec<Query>,
}

impl Batch {
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// batches are never empty, see `partition`
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn first(&self) -> &Query {
        &self.queries[0]
    }

    /// quoted, comma separated list of all queries for log lines and confirmations
    pub fn names(&self) -> String {
        self.queries
            .iter()
            .map(|query| format!("'{query}'"))
            .join(", ")
    }
}

/// Split `queries` into consecutive runs of `stack` queries, keeping the input order.
///
/// The last batch holds the remainder, no queries means no batches.
pub fn partition(queries: &[Query], stack: NonZeroUsize) -> Vec<Batch> {
    queries
        .chunks(stack.get())
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            queries: chunk.to_vec(),
        })
        .collect_vec()
}
