//! Derived qubit connectivity graph.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use alsvid_model::{Entity, EntityId, EntityKind, RefField};

/// Directed graph over qubit entities, derived from edge entities.
///
/// Nodes are qubit entity ids; each edge carries the id of the
/// originating `Edge` entity so downstream code can recover per-edge
/// calibration parameters.
///
/// Building is add-only: [`extend_from`](Self::extend_from) inserts
/// missing nodes and edges but never removes stale ones. If the
/// workspace's edge set has shrunk, discard the graph and rebuild from
/// scratch.
#[derive(Debug, Default)]
pub struct ConnectivityGraph {
    graph: DiGraph<EntityId, EntityId>,
    nodes: FxHashMap<EntityId, NodeIndex>,
}

impl ConnectivityGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, qubit: EntityId) -> NodeIndex {
        match self.nodes.get(&qubit) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(qubit);
                self.nodes.insert(qubit, idx);
                idx
            }
        }
    }

    /// Fold a slice of workspace entities into the graph: every qubit
    /// not already present becomes a node, every edge entity with both
    /// endpoints set becomes a directed edge annotated with the edge
    /// entity's id. Idempotent.
    pub fn extend_from(&mut self, entities: &[Entity]) {
        for entity in entities {
            if entity.kind == EntityKind::Qubit {
                self.node(entity.id);
            }
        }
        for entity in entities {
            if entity.kind != EntityKind::Edge {
                continue;
            }
            let (Some(source), Some(target)) = (
                entity.get_ref(RefField::Source),
                entity.get_ref(RefField::Target),
            ) else {
                continue;
            };
            let s = self.node(source);
            let t = self.node(target);
            match self.graph.find_edge(s, t) {
                Some(e) => self.graph[e] = entity.id,
                None => {
                    self.graph.add_edge(s, t, entity.id);
                }
            }
        }
    }

    /// Whether a qubit is present as a node.
    pub fn contains(&self, qubit: EntityId) -> bool {
        self.nodes.contains_key(&qubit)
    }

    /// The edge entity connecting two qubits, looked up in both
    /// directions. Storage stays directed; lookup is symmetric.
    pub fn edge_between(&self, a: EntityId, b: EntityId) -> Option<EntityId> {
        let (&ia, &ib) = (self.nodes.get(&a)?, self.nodes.get(&b)?);
        self.graph
            .find_edge(ia, ib)
            .or_else(|| self.graph.find_edge(ib, ia))
            .map(|e| self.graph[e])
    }

    /// Whether a directed edge `source -> target` exists.
    pub fn has_edge(&self, source: EntityId, target: EntityId) -> bool {
        match (self.nodes.get(&source), self.nodes.get(&target)) {
            (Some(&s), Some(&t)) => self.graph.find_edge(s, t).is_some(),
            _ => false,
        }
    }

    /// Qubits reachable over one outgoing edge from `qubit`.
    pub fn neighbors(&self, qubit: EntityId) -> Vec<EntityId> {
        let Some(&idx) = self.nodes.get(&qubit) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| self.graph[e.target()])
            .collect()
    }

    /// Number of qubit nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of derived edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_model::SnapshotId;

    fn qubit(id: i64) -> Entity {
        let mut e = Entity::new(EntityKind::Qubit, format!("q{id}"), SnapshotId(1));
        e.id = EntityId(id);
        e
    }

    fn edge(id: i64, source: EntityId, target: EntityId) -> Entity {
        let mut e = Entity::new(EntityKind::Edge, format!("e{id}"), SnapshotId(1));
        e.id = EntityId(id);
        e.set_ref(RefField::Source, source).unwrap();
        e.set_ref(RefField::Target, target).unwrap();
        e
    }

    #[test]
    fn test_build_and_symmetric_lookup() {
        let mut g = ConnectivityGraph::new();
        let (q1, q2) = (qubit(1), qubit(2));
        let e = edge(10, q1.id, q2.id);
        g.extend_from(&[q1.clone(), q2.clone(), e]);

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.has_edge(q1.id, q2.id));
        assert!(!g.has_edge(q2.id, q1.id));

        // Stored directed, looked up in both directions.
        assert_eq!(g.edge_between(q1.id, q2.id), Some(EntityId(10)));
        assert_eq!(g.edge_between(q2.id, q1.id), Some(EntityId(10)));
        assert_eq!(g.edge_between(q1.id, EntityId(99)), None);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut g = ConnectivityGraph::new();
        let (q1, q2) = (qubit(1), qubit(2));
        let e = edge(10, q1.id, q2.id);
        let entities = [q1, q2, e];

        g.extend_from(&entities);
        g.extend_from(&entities);

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_add_only_never_removes() {
        let mut g = ConnectivityGraph::new();
        let (q1, q2) = (qubit(1), qubit(2));
        let e = edge(10, q1.id, q2.id);
        g.extend_from(&[q1.clone(), q2.clone(), e]);

        // Rebuilding from a shrunken entity set leaves the old edge in
        // place; callers must start from a fresh graph to drop it.
        g.extend_from(&[q1.clone(), q2.clone()]);
        assert_eq!(g.edge_count(), 1);

        let mut fresh = ConnectivityGraph::new();
        fresh.extend_from(&[q1, q2]);
        assert_eq!(fresh.edge_count(), 0);
    }

    #[test]
    fn test_neighbors() {
        let mut g = ConnectivityGraph::new();
        let (q1, q2, q3) = (qubit(1), qubit(2), qubit(3));
        g.extend_from(&[
            q1.clone(),
            q2.clone(),
            q3.clone(),
            edge(10, q1.id, q2.id),
            edge(11, q1.id, q3.id),
        ]);

        let mut n = g.neighbors(q1.id);
        n.sort();
        assert_eq!(n, vec![q2.id, q3.id]);
        assert!(g.neighbors(q2.id).is_empty());
    }

    #[test]
    fn test_edge_with_unset_endpoint_skipped() {
        let mut g = ConnectivityGraph::new();
        let q1 = qubit(1);
        let mut half = Entity::new(EntityKind::Edge, "half", SnapshotId(1));
        half.id = EntityId(20);
        half.set_ref(RefField::Source, q1.id).unwrap();
        g.extend_from(&[q1, half]);

        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }
}
