use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{LinkId, NodeId};

/// A single directed, capacitated edge. Immutable after construction; its
/// id is assigned by [`Graph::add_edge`] in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub src: NodeId,
    pub dst: NodeId,
    pub capacity: f64,
}

/// Directed capacitated graph. Nodes are bare ids; links carry a dense,
/// contiguous id assigned at insertion time.
///
/// Invariant: every link's endpoints appear in `nodes`; link ids are unique
/// and contiguous from 0.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<NodeId>,
    links: Vec<Link>,
    adjacency: HashMap<NodeId, Vec<LinkId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node. Idempotent — inserting the same id twice is a no-op.
    pub fn add_node(&mut self, id: NodeId) {
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
            self.adjacency.entry(id).or_default();
        }
    }

    /// Inserts a directed link, assigning it the next link id. Endpoints
    /// are added to the node set if not already present.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, capacity: f64) -> LinkId {
        self.add_node(src);
        self.add_node(dst);
        let id = LinkId(self.links.len() as u32);
        let link = Link {
            id,
            src,
            dst,
            capacity,
        };
        self.links.push(link);
        self.adjacency.entry(src).or_default().push(id);
        id
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0 as usize)
    }

    /// Links going from `src`, if `src` is known to the graph.
    pub fn outgoing(&self, src: NodeId) -> &[LinkId] {
        self.adjacency
            .get(&src)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Looks up the (first) link directly connecting `src` to `dst`.
    pub fn find_link(&self, src: NodeId, dst: NodeId) -> Option<LinkId> {
        self.outgoing(src)
            .iter()
            .copied()
            .find(|&lid| self.links[lid.0 as usize].dst == dst)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Resolves a tunnel's hop sequence into node ids, `[src, ..., dst]`.
    pub fn tunnel_nodes(&self, tunnel: &[LinkId]) -> Option<Vec<NodeId>> {
        let mut nodes = Vec::with_capacity(tunnel.len() + 1);
        for (i, &lid) in tunnel.iter().enumerate() {
            let link = self.link(lid)?;
            if i == 0 {
                nodes.push(link.src);
            }
            nodes.push(link.dst);
        }
        Some(nodes)
    }
}
