//! Turns a flat list of trust lines into a deduplicated node set and an edge list.

use super::types::{GraphData, NodeShape, ParticipantNode, RelationshipEdge, TrustLine};
use std::collections::HashSet;

/// Characters of the address kept in a node label
pub const LABEL_CHARS: usize = 8;

/// Default dot radius for participants
pub const NODE_SIZE: f32 = 15.0;

/// Short display label: the first 8 characters followed by "...".
/// Shorter addresses are kept whole.
pub fn node_label(address: &str) -> String {
    let prefix: String = address.chars().take(LABEL_CHARS).collect();
    format!("{}...", prefix)
}

/// Build the graph for a batch of trust lines.
///
/// Nodes come out in order of first appearance. Every well-formed record
/// yields one edge, so two records between the same pair give two edges.
/// Records missing a staker or borrower are skipped.
pub fn build_graph(records: &[TrustLine]) -> GraphData {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let Some((staker, borrower)) = record.endpoints() else {
            tracing::warn!(index = i, id = ?record.id, "Skipping trust line without staker or borrower");
            continue;
        };

        for address in [staker, borrower] {
            if seen.insert(address) {
                nodes.push(ParticipantNode {
                    id: address.to_string(),
                    label: node_label(address),
                    shape: NodeShape::Dot,
                    size: NODE_SIZE,
                });
            }
        }

        edges.push(RelationshipEdge {
            from: staker.to_string(),
            to: borrower.to_string(),
            arrow_to: true,
        });
    }

    tracing::debug!(records = records.len(), nodes = nodes.len(), edges = edges.len(), "Built trust line graph");

    GraphData { nodes, edges }
}
