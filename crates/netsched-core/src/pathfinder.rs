use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use netsched_common::{Graph, LinkId, NodeId};

/// Per-link residual capacity (`capacity - already_allocated`), indexed by
/// link id. Shared by [`PathFinder::allocate_demand_bandwidth`] and by
/// callers that want to probe routes against already-committed traffic.
pub type ResidualMap = HashMap<LinkId, f64>;

/// Capacity-weighted, k-distinct-path search and bounded-BFS enumeration
/// over a fixed [`Graph`]. Stateless beyond the graph reference; every
/// search takes its residual-capacity view as an argument so callers can
/// probe hypothetical allocations without mutating shared state.
pub struct PathFinder<'g> {
    graph: &'g Graph,
    /// Upper bound on the number of search states popped from the frontier
    /// in a single `widest_paths`/`find_all_paths` call — spec.md §5's
    /// `max_search_states` knob. `usize::MAX` (via [`Self::new`]) disables
    /// the bound.
    max_states: usize,
}

#[derive(Debug, Clone)]
struct SearchState {
    bottleneck: f64,
    node: NodeId,
    path: Vec<LinkId>,
    visited: HashSet<NodeId>,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.bottleneck == other.bottleneck
    }
}
impl Eq for SearchState {}
impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on bottleneck capacity: prefer expanding the
        // highest-capacity partial path first.
        self.bottleneck
            .partial_cmp(&other.bottleneck)
            .unwrap_or(Ordering::Equal)
    }
}

impl<'g> PathFinder<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            max_states: usize::MAX,
        }
    }

    /// Like [`Self::new`], but aborts a search once `max_states` frontier
    /// states have been popped, returning whatever results were already
    /// collected — the bounded-effort contract spec.md §5 attaches to the
    /// A*-style path search.
    pub fn bounded(graph: &'g Graph, max_states: usize) -> Self {
        Self {
            graph,
            max_states: max_states.max(1),
        }
    }

    fn link_capacity(&self, residual: &ResidualMap, link: LinkId) -> f64 {
        residual
            .get(&link)
            .copied()
            .unwrap_or_else(|| self.graph.link(link).map(|l| l.capacity).unwrap_or(0.0))
    }

    /// Best-first search ranking partial paths by their bottleneck
    /// (minimum residual capacity along the path so far), expanding the
    /// highest-bottleneck path first. Shared by `find_path` and
    /// `find_multi_path`; collects up to `max_results` distinct simple
    /// paths reaching `dst`.
    fn widest_paths(
        &self,
        src: NodeId,
        dst: NodeId,
        residual: &ResidualMap,
        max_results: usize,
    ) -> Vec<Vec<LinkId>> {
        let mut heap = BinaryHeap::new();
        let mut visited = HashSet::new();
        visited.insert(src);
        heap.push(SearchState {
            bottleneck: f64::INFINITY,
            node: src,
            path: Vec::new(),
            visited,
        });

        let mut results: Vec<Vec<LinkId>> = Vec::new();
        let mut seen: HashSet<Vec<LinkId>> = HashSet::new();
        let mut states_popped = 0usize;

        while let Some(state) = heap.pop() {
            if results.len() >= max_results || states_popped >= self.max_states {
                break;
            }
            states_popped += 1;
            if state.node == dst && !state.path.is_empty() {
                if seen.insert(state.path.clone()) {
                    results.push(state.path.clone());
                }
                continue;
            }
            for &link_id in self.graph.outgoing(state.node) {
                let link = match self.graph.link(link_id) {
                    Some(l) => l,
                    None => continue,
                };
                if state.visited.contains(&link.dst) {
                    continue;
                }
                let cap = self.link_capacity(residual, link_id);
                if cap <= 0.0 {
                    continue;
                }
                let mut next_path = state.path.clone();
                next_path.push(link_id);
                let mut next_visited = state.visited.clone();
                next_visited.insert(link.dst);
                heap.push(SearchState {
                    bottleneck: state.bottleneck.min(cap),
                    node: link.dst,
                    path: next_path,
                    visited: next_visited,
                });
            }
        }
        results
    }

    /// Returns a single simple path from `src` to `dst`, preferring
    /// high-capacity links. Empty when no path exists.
    pub fn find_path(&self, src: NodeId, dst: NodeId) -> Vec<LinkId> {
        self.find_path_with_residual(src, dst, &ResidualMap::new())
    }

    pub fn find_path_with_residual(
        &self,
        src: NodeId,
        dst: NodeId,
        residual: &ResidualMap,
    ) -> Vec<LinkId> {
        self.widest_paths(src, dst, residual, 1)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Returns up to `k` distinct simple paths from `src` to `dst`, in
    /// descending bottleneck-capacity order.
    pub fn find_multi_path(&self, src: NodeId, dst: NodeId, k: usize) -> Vec<Vec<LinkId>> {
        self.find_multi_path_with_residual(src, dst, k, &ResidualMap::new())
    }

    pub fn find_multi_path_with_residual(
        &self,
        src: NodeId,
        dst: NodeId,
        k: usize,
        residual: &ResidualMap,
    ) -> Vec<Vec<LinkId>> {
        self.widest_paths(src, dst, residual, k)
    }

    /// Bounded breadth-first enumeration of up to `max_paths` simple paths,
    /// without regard to capacity ordering. Used by the Phase-2 LP variant,
    /// which wants path diversity rather than a single widest route.
    pub fn find_all_paths(&self, src: NodeId, dst: NodeId, max_paths: usize) -> Vec<Vec<LinkId>> {
        let mut results = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        let mut visited = HashSet::new();
        visited.insert(src);
        queue.push_back((src, Vec::<LinkId>::new(), visited));
        let mut states_popped = 0usize;

        while let Some((node, path, visited)) = queue.pop_front() {
            if results.len() >= max_paths || states_popped >= self.max_states {
                break;
            }
            states_popped += 1;
            if node == dst && !path.is_empty() {
                results.push(path);
                continue;
            }
            for &link_id in self.graph.outgoing(node) {
                let link = match self.graph.link(link_id) {
                    Some(l) => l,
                    None => continue,
                };
                if visited.contains(&link.dst) {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(link_id);
                let mut next_visited = visited.clone();
                next_visited.insert(link.dst);
                queue.push_back((link.dst, next_path, next_visited));
            }
        }
        results
    }

    /// Greedily fills `demand` Gbps across paths enumerated by
    /// [`Self::find_all_paths`], updating `residual` in place. On
    /// success returns the per-path allocations; on failure to meet the
    /// full demand, every increment made during this call is rolled back
    /// and `None` is returned — atomic from the caller's point of view.
    pub fn allocate_demand_bandwidth(
        &self,
        src: NodeId,
        dst: NodeId,
        demand: f64,
        residual: &mut ResidualMap,
        max_paths: usize,
    ) -> Option<Vec<(Vec<LinkId>, f64)>> {
        let candidates = self.find_all_paths(src, dst, max_paths);
        let mut remaining = demand;
        let mut allocations = Vec::new();
        let mut journal: Vec<(LinkId, f64)> = Vec::new();

        for path in &candidates {
            if remaining <= 0.0 {
                break;
            }
            let path_available = path
                .iter()
                .map(|&l| self.link_capacity(residual, l))
                .fold(f64::INFINITY, f64::min);
            if path_available <= 0.0 {
                continue;
            }
            let take = remaining.min(path_available);
            for &l in path {
                let cap = self.link_capacity(residual, l);
                journal.push((l, cap));
                residual.insert(l, cap - take);
            }
            allocations.push((path.clone(), take));
            remaining -= take;
        }

        if remaining > 1e-9 {
            for (l, prior) in journal.into_iter().rev() {
                residual.insert(l, prior);
            }
            return None;
        }
        Some(allocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsched_common::NodeId;

    fn line_graph() -> Graph {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), 100.0);
        g.add_edge(NodeId(1), NodeId(2), 100.0);
        g
    }

    #[test]
    fn find_path_returns_simple_route() {
        let g = line_graph();
        let pf = PathFinder::new(&g);
        let path = pf.find_path(NodeId(0), NodeId(2));
        assert_eq!(path.len(), 2);
        assert_eq!(g.tunnel_nodes(&path), Some(vec![NodeId(0), NodeId(1), NodeId(2)]));
    }

    #[test]
    fn find_path_empty_when_disconnected() {
        let mut g = line_graph();
        g.add_node(NodeId(9));
        let pf = PathFinder::new(&g);
        assert!(pf.find_path(NodeId(0), NodeId(9)).is_empty());
    }

    #[test]
    fn find_multi_path_returns_distinct_routes() {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), 100.0);
        g.add_edge(NodeId(1), NodeId(2), 100.0);
        g.add_edge(NodeId(0), NodeId(2), 50.0);
        let pf = PathFinder::new(&g);
        let paths = pf.find_multi_path(NodeId(0), NodeId(2), 2);
        assert_eq!(paths.len(), 2);
        assert_ne!(paths[0], paths[1]);
    }

    #[test]
    fn allocate_demand_bandwidth_splits_across_paths() {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), 60.0);
        g.add_edge(NodeId(0), NodeId(2), 40.0);
        let pf = PathFinder::new(&g);
        let mut residual = ResidualMap::new();
        let allocations = pf
            .allocate_demand_bandwidth(NodeId(0), NodeId(1), 50.0, &mut residual, 4)
            .unwrap();
        let total: f64 = allocations.iter().map(|(_, bw)| bw).sum();
        assert!((total - 50.0).abs() < 1e-6);
    }

    #[test]
    fn allocate_demand_bandwidth_rolls_back_on_failure() {
        let mut g = Graph::new();
        g.add_edge(NodeId(0), NodeId(1), 10.0);
        let pf = PathFinder::new(&g);
        let mut residual = ResidualMap::new();
        residual.insert(LinkId(0), 10.0);
        let before = residual.clone();
        let result = pf.allocate_demand_bandwidth(NodeId(0), NodeId(1), 100.0, &mut residual, 4);
        assert!(result.is_none());
        assert_eq!(residual, before);
    }
}
