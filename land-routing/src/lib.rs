use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::Hash;

/// A trait for graphs a distance tree can be grown over.
///
/// `Node`: the type of node identifiers (e.g., LandKey).
pub trait Graph<Node> {
    /// Return the neighbors of a node together with the edge weight.
    fn neighbors(&self, node: &Node) -> Vec<(Node, u32)>;
}

/// Compute hop distances and parent pointers from `start` to every
/// reachable node (Dijkstra).
///
/// `tiebreak` is evaluated lazily, once per settled node. When two routes
/// of equal length compete for a node, the candidate parent with the
/// smaller tie-break value wins. The resulting `parent` map forms a tree
/// rooted at `start`.
pub fn distances_from<Node, G, T, F>(
    graph: &G,
    start: Node,
    mut tiebreak: F,
) -> (HashMap<Node, u32>, HashMap<Node, Node>)
where
    Node: Clone + Eq + Hash + Ord,
    G: Graph<Node>,
    T: Ord,
    F: FnMut(&Node, &HashMap<Node, u32>, &HashMap<Node, Node>) -> T,
{
    let mut dist: HashMap<Node, u32> = HashMap::new();
    let mut parent: HashMap<Node, Node> = HashMap::new();
    let mut priority: HashMap<Node, T> = HashMap::new();
    let mut settled: HashSet<Node> = HashSet::new();
    let mut open_set = BinaryHeap::new();

    dist.insert(start.clone(), 0);
    open_set.push(State {
        cost: 0,
        node: start,
    });

    while let Some(State { cost, node }) = open_set.pop() {
        // Skip if already settled with a better path
        if !settled.insert(node.clone()) {
            continue;
        }

        let node_priority = tiebreak(&node, &dist, &parent);

        for (next, weight) in graph.neighbors(&node) {
            if settled.contains(&next) {
                continue;
            }
            let alt = cost + weight;
            match dist.get(&next) {
                Some(&best) if alt > best => continue,
                Some(&best) if alt == best => {
                    // Equal-length route: the current parent keeps the
                    // node unless the new one tie-breaks lower.
                    let current = &parent[&next];
                    match priority.get(current) {
                        Some(p) if node_priority <= *p => {}
                        // Unsettled parent means a duplicate edge from
                        // this same node; nothing to improve.
                        _ => continue,
                    }
                }
                _ => {}
            }
            dist.insert(next.clone(), alt);
            parent.insert(next.clone(), node.clone());
            open_set.push(State { cost: alt, node: next });
        }

        priority.insert(node, node_priority);
    }

    (dist, parent)
}

/// Walk the parent map back from `dst` to `src`.
///
/// Returns `None` if `dst` has no route to `src`.
pub fn construct_path<Node>(
    parent: &HashMap<Node, Node>,
    src: &Node,
    dst: &Node,
) -> Option<Vec<Node>>
where
    Node: Clone + Eq + Hash,
{
    let mut path = vec![dst.clone()];
    let mut cursor = dst;
    while cursor != src {
        cursor = parent.get(cursor)?;
        path.push(cursor.clone());
    }
    path.reverse();
    Some(path)
}

/// Helper struct for the priority queue.
#[derive(Clone, Eq, PartialEq)]
struct State<Node> {
    cost: u32,
    node: Node,
}

// The priority queue depends on `Ord`.
// Explicitly implement the trait so the queue becomes a min-heap;
// ties fall back to the node itself so pop order is deterministic.
impl<Node: Ord> Ord for State<Node> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<Node: Ord> PartialOrd for State<Node> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
