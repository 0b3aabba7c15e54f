//! GraphQL client for the Union trust line subgraph.

mod client;
mod error;

pub use client::{trust_lines_query, ApiClient, GraphQlTransport, META_QUERY};
#[cfg(test)]
pub use client::GraphQlResponse;
pub use error::TransportError;
