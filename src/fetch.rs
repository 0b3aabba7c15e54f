//! Fetch flow: probe the endpoint, query trust lines, build the graph.
//!
//! Nothing here knows about the UI. Every failure comes back as a
//! [`FetchError`] whose `Display` is the message shown to the user.

use crate::api::{trust_lines_query, GraphQlTransport, TransportError, META_QUERY};
use crate::graph::{build_graph, GraphData, TrustLine};
use serde_json::Value;
use thiserror::Error;

/// How many trust lines the payload query asks for
pub const DEFAULT_TRUST_LINE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    pub limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TRUST_LINE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("GraphQL endpoint is not responding correctly")]
    EndpointNotResponding,

    /// Error list from the response, serialized as JSON
    #[error("GraphQL Errors: {0}")]
    GraphQl(String),

    #[error("No trust lines data in response")]
    NoData,

    #[error("No trust lines found in the data")]
    NoRecords,

    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    /// An empty result is reported, but it is not a malfunction
    pub fn is_informational(&self) -> bool {
        matches!(self, FetchError::NoRecords)
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Liveness check. Any failure is logged and reported as `false`.
pub fn probe_endpoint<T: GraphQlTransport + ?Sized>(transport: &T) -> bool {
    tracing::info!("Testing GraphQL endpoint...");

    match transport.execute(META_QUERY) {
        Ok(resp) => {
            let block = resp
                .data
                .as_ref()
                .and_then(|d| d.pointer("/_meta/block/number"))
                .and_then(Value::as_u64);
            match block {
                Some(number) => tracing::info!(block = number, "Endpoint reachable"),
                None => tracing::info!("Endpoint reachable, no block height reported"),
            }
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Test query failed");
            false
        }
    }
}

/// Run the payload query and pull out the trust line records.
///
/// A missing payload wins over an error list; an error list wins over an
/// empty result.
pub fn fetch_trust_lines<T: GraphQlTransport + ?Sized>(
    transport: &T,
    limit: usize,
) -> Result<Vec<TrustLine>, FetchError> {
    tracing::info!(limit, "Fetching trust lines data...");
    let resp = transport.execute(&trust_lines_query(limit))?;
    tracing::debug!(?resp, "GraphQL response");

    let lines = resp
        .data
        .as_ref()
        .and_then(|d| d.get("trustLines"))
        .and_then(Value::as_array)
        .ok_or(FetchError::NoData)?;

    if let Some(errors) = resp.error_list() {
        return Err(FetchError::GraphQl(Value::from(errors.to_vec()).to_string()));
    }

    if lines.is_empty() {
        return Err(FetchError::NoRecords);
    }

    // Entries that are not even objects become empty records; the builder skips them
    let records = lines
        .iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value::<TrustLine>(v.clone()).unwrap_or_else(|e| {
                tracing::warn!(index = i, error = %e, "Undecodable trust line");
                TrustLine::default()
            })
        })
        .collect();

    Ok(records)
}

/// The whole flow, start to finish. Strictly sequential: the payload query
/// is only sent once the probe has come back healthy.
pub fn fetch_graph<T: GraphQlTransport + ?Sized>(
    transport: &T,
    config: &FetchConfig,
) -> Result<GraphData, FetchError> {
    tracing::info!("Starting data fetch process...");

    if !probe_endpoint(transport) {
        return Err(FetchError::EndpointNotResponding);
    }

    let records = fetch_trust_lines(transport, config.limit)?;
    let graph = build_graph(&records);

    if graph.edges.is_empty() {
        tracing::warn!(records = records.len(), "Every trust line was malformed");
        return Err(FetchError::NoRecords);
    }

    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Creating visualization"
    );
    Ok(graph)
}
