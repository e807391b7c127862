//! Stage G: Graph Assembler. Deduplicates nodes and edges accumulated
//! across every earlier stage and produces the final, stably-sorted
//! node/edge lists — no I/O, no further resolution, just
//! set discipline so the same project always serializes to the same
//! bytes.

use indexmap::IndexSet;
use protocol::{Edge, EdgeLabel, Node};

pub struct AssembledGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub fn assemble(nodes: Vec<Node>, mut edges: Vec<Edge>) -> AssembledGraph {
    let mut seen_ids = IndexSet::new();
    let mut deduped_nodes = Vec::new();
    for node in nodes {
        if seen_ids.insert(node.id.clone()) {
            deduped_nodes.push(node);
        }
    }

    // Every edge must carry its inverse; stages
    // emit both directions already, but dedup could in principle drop one
    // side if two stages produced the same logical edge from different
    // angles, so re-derive any missing inverse before the final dedup pass.
    let mut with_inverses = Vec::with_capacity(edges.len() * 2);
    for e in &edges {
        with_inverses.push(e.clone());
        with_inverses.push(e.inverse());
    }
    edges = with_inverses;

    let mut seen_edges: IndexSet<(String, EdgeLabel, String)> = IndexSet::new();
    let mut deduped_edges = Vec::new();
    for edge in edges {
        let key = (edge.src.clone(), edge.label, edge.dst.clone());
        if seen_edges.insert(key) {
            deduped_edges.push(edge);
        }
    }

    deduped_nodes.sort_by(|a, b| a.id.cmp(&b.id));
    deduped_edges.sort_by(|a, b| {
        (a.src.as_str(), a.label as u8, a.dst.as_str()).cmp(&(b.src.as_str(), b.label as u8, b.dst.as_str()))
    });

    AssembledGraph {
        nodes: deduped_nodes,
        edges: deduped_edges,
    }
}
