//! Graph data types matching the subgraph response.

use egui::{Pos2, Rect, Vec2};
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;

/// Spread used when the caller hands us a degenerate seeding area
const FALLBACK_SPREAD: f32 = 400.0;

/// A single staker-vouches-for-borrower record.
///
/// Fields are optional because the endpoint is not trusted to send
/// complete records; the builder decides what to do with gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrustLine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub staker: Option<String>,
    #[serde(default)]
    pub borrower: Option<String>,
}

impl TrustLine {
    /// `(staker, borrower)` when both are present
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        Some((self.staker.as_deref()?, self.borrower.as_deref()?))
    }
}

/// How a participant is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeShape {
    #[default]
    Dot,
}

/// One address taking part in at least one trust line
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    /// Radius in graph units
    pub size: f32,
}

/// Directed staker -> borrower edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEdge {
    pub from: String,
    pub to: String,
    /// Draw an arrowhead at `to`
    pub arrow_to: bool,
}

/// Nodes and edges handed to the renderer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphData {
    pub nodes: Vec<ParticipantNode>,
    pub edges: Vec<RelationshipEdge>,
}

/// Runtime graph state with positions
pub struct GraphState {
    /// The underlying data
    pub data: GraphData,
    /// Node index lookup (id -> index in data.nodes)
    pub node_index: HashMap<String, usize>,
    /// Edge endpoints resolved to node indices, parallel to data.edges
    pub edge_endpoints: Vec<(usize, usize)>,
    /// Node positions in graph space, parallel to data.nodes
    pub positions: Vec<Pos2>,
    /// Node velocities for physics simulation
    pub velocities: Vec<Vec2>,
    /// Currently hovered node
    pub hovered_node: Option<usize>,
    /// Node pinned under the pointer; physics leaves it alone
    pub dragged_node: Option<usize>,
}

impl GraphState {
    /// Load graph data, scattering nodes randomly inside `bounds`
    pub fn new(data: GraphData, bounds: Rect) -> Self {
        Self::with_rng(data, bounds, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng>(data: GraphData, bounds: Rect, rng: &mut R) -> Self {
        let bounds = if bounds.width() < 1.0 || bounds.height() < 1.0 {
            Rect::from_center_size(bounds.center(), Vec2::splat(FALLBACK_SPREAD))
        } else {
            bounds
        };

        let mut node_index = HashMap::with_capacity(data.nodes.len());
        let mut positions = Vec::with_capacity(data.nodes.len());
        for (i, node) in data.nodes.iter().enumerate() {
            node_index.insert(node.id.clone(), i);
            let x = rng.gen_range(bounds.min.x..bounds.max.x);
            let y = rng.gen_range(bounds.min.y..bounds.max.y);
            positions.push(Pos2::new(x, y));
        }

        // Edges whose endpoints are not nodes are dropped from physics but kept in data
        let edge_endpoints = data
            .edges
            .iter()
            .filter_map(|e| Some((*node_index.get(&e.from)?, *node_index.get(&e.to)?)))
            .collect();

        Self {
            velocities: vec![Vec2::ZERO; positions.len()],
            positions,
            node_index,
            edge_endpoints,
            data,
            hovered_node: None,
            dragged_node: None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.data.nodes.len()
    }

    /// Closest node whose dot contains `pos` (graph space)
    pub fn node_at(&self, pos: Pos2) -> Option<usize> {
        self.positions
            .iter()
            .zip(&self.data.nodes)
            .enumerate()
            .filter_map(|(i, (p, node))| {
                let d = p.distance(pos);
                (d <= node.size).then_some((i, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Move a node by hand, zeroing its velocity
    pub fn move_node(&mut self, index: usize, to: Pos2) {
        if let Some(p) = self.positions.get_mut(index) {
            *p = to;
            self.velocities[index] = Vec2::ZERO;
        }
    }
}

#[cfg(test)]
impl TrustLine {
    pub fn new(id: &str, staker: &str, borrower: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            staker: Some(staker.to_string()),
            borrower: Some(borrower.to_string()),
        }
    }
}

#[cfg(test)]
impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_state() -> GraphState {
        let data = build_graph(&[
            TrustLine::new("1", "0xAAAA1111", "0xBBBB2222"),
            TrustLine::new("2", "0xAAAA1111", "0xCCCC3333"),
        ]);
        let bounds = Rect::from_center_size(Pos2::ZERO, Vec2::new(600.0, 400.0));
        GraphState::with_rng(data, bounds, &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn endpoints_require_both_sides() {
        let line = TrustLine {
            id: Some("1".into()),
            staker: Some("0xAAAA".into()),
            borrower: None,
        };
        assert_eq!(line.endpoints(), None);
        assert_eq!(
            TrustLine::new("1", "a", "b").endpoints(),
            Some(("a", "b"))
        );
    }

    #[test]
    fn trust_line_decodes_with_missing_fields() {
        let line: TrustLine = serde_json::from_str(r#"{"id":"1","staker":null}"#).unwrap();
        assert_eq!(line.staker, None);
        assert_eq!(line.borrower, None);
    }

    #[test]
    fn positions_start_inside_bounds() {
        let state = sample_state();
        let bounds = Rect::from_center_size(Pos2::ZERO, Vec2::new(600.0, 400.0));
        assert_eq!(state.positions.len(), 3);
        assert!(state.positions.iter().all(|p| bounds.contains(*p)));
        assert!(state.velocities.iter().all(|v| *v == Vec2::ZERO));
    }

    #[test]
    fn edge_endpoints_resolve_to_indices() {
        let state = sample_state();
        assert_eq!(state.edge_endpoints, vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn degenerate_bounds_do_not_panic() {
        let data = build_graph(&[TrustLine::new("1", "a", "b")]);
        let state = GraphState::new(data, Rect::from_min_max(Pos2::ZERO, Pos2::ZERO));
        assert_eq!(state.node_count(), 2);
    }

    #[test]
    fn node_at_hits_within_radius() {
        let mut state = sample_state();
        state.move_node(0, Pos2::new(-200.0, 0.0));
        state.move_node(1, Pos2::new(100.0, 100.0));
        state.move_node(2, Pos2::new(200.0, -150.0));
        assert_eq!(state.node_at(Pos2::new(105.0, 100.0)), Some(1));
        assert_eq!(state.node_index.get("0xBBBB2222"), Some(&1));
    }
}
