//! Redirect edge extraction and partitioning

use super::RedirectError;
use crate::types::{ArticleRecord, RedirectEdge};

/// Pull the redirect edge out of a record, if it is a redirect.
///
/// A redirect record with no recoverable target still yields an edge (with an
/// empty target) so that it is counted as malformed when the index is built.
pub fn edge_from_record(record: &ArticleRecord) -> Option<RedirectEdge> {
    if !record.is_redirect() {
        return None;
    }

    Some(RedirectEdge::new(
        record.title.clone(),
        record.redirect_target.clone().unwrap_or_default(),
    ))
}

/// Collect the redirect edges from a set of records, in record order
pub fn extract_edges<'a, I>(records: I) -> Vec<RedirectEdge>
where
    I: IntoIterator<Item = &'a ArticleRecord>,
{
    records.into_iter().filter_map(edge_from_record).collect()
}

/// Reject edges with an empty source or target
pub fn validate_edge(edge: &RedirectEdge) -> Result<&RedirectEdge, RedirectError> {
    if edge.is_malformed() {
        return Err(RedirectError::MalformedEdge(format!(
            "{:?} -> {:?}",
            edge.source, edge.target
        )));
    }
    Ok(edge)
}

/// Split edges into `partitions` contiguous chunks of near-equal size.
///
/// Order is preserved: concatenating the partitions gives back the input, so
/// last-write-wins over partitions matches last-write-wins over the stream.
pub fn partition_edges(edges: Vec<RedirectEdge>, partitions: usize) -> Vec<Vec<RedirectEdge>> {
    let partitions = partitions.max(1);
    if edges.is_empty() {
        return vec![Vec::new()];
    }

    let chunk_size = edges.len().div_ceil(partitions);
    let mut result = Vec::with_capacity(partitions);
    let mut iter = edges.into_iter().peekable();

    while iter.peek().is_some() {
        result.push(iter.by_ref().take(chunk_size).collect());
    }

    result
}
