//! Pathfinding
//!
//! Best-first graph search over a caller-supplied cost and expansion
//! function. With a zero heuristic this is Dijkstra; with an admissible
//! estimate it is A*. The graph is generic: nodes are dense integer ids and
//! grid adjacency is just the default expansion the map helpers provide.

use crate::geometry::Vec2;
use crate::map::GridMap;

const NO_NODE: usize = usize::MAX;

/// Binary min-heap keyed by f64 with reposition-on-improvement.
///
/// Heap slots are tracked per node in an external position map so relaxing
/// an already-open node repositions it in place instead of reinserting.
struct BinaryHeap {
    /// Node ids ordered heap-wise.
    nodes: Vec<usize>,
    /// Key per node id.
    keys: Vec<f64>,
    /// Heap slot per node id, `NO_NODE` when not on the heap.
    pos: Vec<usize>,
}

impl BinaryHeap {
    fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            keys: vec![0.0; capacity],
            pos: vec![NO_NODE; capacity],
        }
    }

    fn clear(&mut self) {
        for &node in &self.nodes {
            self.pos[node] = NO_NODE;
        }
        self.nodes.clear();
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn contains(&self, node: usize) -> bool {
        self.pos[node] != NO_NODE
    }

    fn push(&mut self, node: usize, key: f64) {
        debug_assert!(!self.contains(node), "node already on heap");
        self.keys[node] = key;
        self.pos[node] = self.nodes.len();
        self.nodes.push(node);
        self.sift_up(self.nodes.len() - 1);
    }

    /// Lower an open node's key and restore heap order.
    fn decrease_key(&mut self, node: usize, key: f64) {
        debug_assert!(self.contains(node), "node not on heap");
        debug_assert!(key <= self.keys[node], "key may only decrease");
        self.keys[node] = key;
        self.sift_up(self.pos[node]);
    }

    fn pop_min(&mut self) -> Option<usize> {
        let min = *self.nodes.first()?;
        let last = self.nodes.pop().expect("heap not empty");
        self.pos[min] = NO_NODE;
        if !self.nodes.is_empty() {
            self.nodes[0] = last;
            self.pos[last] = 0;
            self.sift_down(0);
        }
        Some(min)
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.keys[self.nodes[slot]] >= self.keys[self.nodes[parent]] {
                break;
            }
            self.swap_slots(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let mut smallest = slot;
            for child in [2 * slot + 1, 2 * slot + 2] {
                if child < self.nodes.len()
                    && self.keys[self.nodes[child]] < self.keys[self.nodes[smallest]]
                {
                    smallest = child;
                }
            }
            if smallest == slot {
                break;
            }
            self.swap_slots(slot, smallest);
            slot = smallest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.nodes.swap(a, b);
        self.pos[self.nodes[a]] = a;
        self.pos[self.nodes[b]] = b;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Unvisited,
    Open,
    Closed,
}

/// Reusable search context sized for a fixed node count.
///
/// Scratch arrays (tentative cost, visitation state, parent pointers, heap
/// slots) are allocated once and reused across calls. Node ids at or above
/// the sized count are a caller contract violation and panic.
pub struct Pathfinder {
    node_count: usize,
    cost: Vec<f64>,
    state: Vec<NodeState>,
    parent: Vec<usize>,
    heap: BinaryHeap,
    neighbors: Vec<usize>,
}

impl Pathfinder {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            cost: vec![0.0; node_count],
            state: vec![NodeState::Unvisited; node_count],
            parent: vec![NO_NODE; node_count],
            heap: BinaryHeap::new(node_count),
            neighbors: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Shortest path by uniform-cost search (Dijkstra).
    ///
    /// `cost(a, b)` is the edge cost from `a` to a neighbor `b`; `expand`
    /// pushes the neighbors of a node into the supplied buffer. Returns the
    /// node sequence from `start` to `goal` inclusive, or `None` when the
    /// goal is unreachable. Ties between equal-cost nodes pop in heap order.
    pub fn find_path<C, E>(&mut self, start: usize, goal: usize, cost: C, expand: E) -> Option<Vec<usize>>
    where
        C: FnMut(usize, usize) -> f64,
        E: FnMut(usize, &mut Vec<usize>),
    {
        self.find_path_with_heuristic(start, goal, cost, expand, |_| 0.0)
    }

    /// Shortest path with an admissible heuristic (A*).
    pub fn find_path_with_heuristic<C, E, H>(
        &mut self,
        start: usize,
        goal: usize,
        mut cost: C,
        mut expand: E,
        mut heuristic: H,
    ) -> Option<Vec<usize>>
    where
        C: FnMut(usize, usize) -> f64,
        E: FnMut(usize, &mut Vec<usize>),
        H: FnMut(usize) -> f64,
    {
        assert!(
            start < self.node_count && goal < self.node_count,
            "start/goal node id out of range"
        );

        self.reset();
        self.cost[start] = 0.0;
        self.state[start] = NodeState::Open;
        self.heap.push(start, heuristic(start));

        while let Some(node) = self.heap.pop_min() {
            if node == goal {
                return Some(self.reconstruct(start, goal));
            }
            self.state[node] = NodeState::Closed;

            let mut neighbors = std::mem::take(&mut self.neighbors);
            neighbors.clear();
            expand(node, &mut neighbors);
            for &next in &neighbors {
                assert!(next < self.node_count, "expanded node id out of range");
                if self.state[next] == NodeState::Closed {
                    continue;
                }
                let tentative = self.cost[node] + cost(node, next);
                match self.state[next] {
                    NodeState::Unvisited => {
                        self.cost[next] = tentative;
                        self.parent[next] = node;
                        self.state[next] = NodeState::Open;
                        self.heap.push(next, tentative + heuristic(next));
                    }
                    NodeState::Open if tentative < self.cost[next] => {
                        self.cost[next] = tentative;
                        self.parent[next] = node;
                        self.heap.decrease_key(next, tentative + heuristic(next));
                    }
                    _ => {}
                }
            }
            self.neighbors = neighbors;
        }

        None
    }

    fn reset(&mut self) {
        self.state.fill(NodeState::Unvisited);
        self.parent.fill(NO_NODE);
        self.heap.clear();
    }

    fn reconstruct(&self, start: usize, goal: usize) -> Vec<usize> {
        let mut path = vec![goal];
        let mut node = goal;
        while node != start {
            node = self.parent[node];
            path.push(node);
        }
        path.reverse();
        path
    }

    /// Accumulated cost of a node from the last search.
    pub fn cost_of(&self, node: usize) -> f64 {
        self.cost[node]
    }
}

/// 4-directional grid expansion over walkable cells.
pub fn grid_expand_4(map: &GridMap) -> impl FnMut(usize, &mut Vec<usize>) + '_ {
    move |node, out| {
        let pos = map.coords(node);
        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            let nx = pos.x + dx;
            let ny = pos.y + dy;
            if map.is_walkable(nx, ny) {
                out.push(map.idx(nx, ny));
            }
        }
    }
}

/// 8-directional grid expansion over walkable cells.
pub fn grid_expand_8(map: &GridMap) -> impl FnMut(usize, &mut Vec<usize>) + '_ {
    move |node, out| {
        let pos = map.coords(node);
        for (dx, dy) in crate::geometry::DIRECTION_OFFSETS {
            let nx = pos.x + dx;
            let ny = pos.y + dy;
            if map.is_walkable(nx, ny) {
                out.push(map.idx(nx, ny));
            }
        }
    }
}

/// Shortest 4-directional unit-cost walking path between two map positions.
pub fn find_walking_path(
    pathfinder: &mut Pathfinder,
    map: &GridMap,
    start: Vec2,
    goal: Vec2,
) -> Option<Vec<Vec2>> {
    if !map.in_bounds(start.x, start.y) || !map.in_bounds(goal.x, goal.y) {
        return None;
    }
    let path = pathfinder.find_path(
        map.idx(start.x, start.y),
        map.idx(goal.x, goal.y),
        |_, _| 1.0,
        grid_expand_4(map),
    )?;
    Some(path.into_iter().map(|idx| map.coords(idx)).collect())
}
