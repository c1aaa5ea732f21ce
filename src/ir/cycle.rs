//! Cycle detection for the build graph.

use indexmap::IndexMap;

use super::Node;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mark {
    Unseen,
    OnPath,
    Done,
}

/// Search the graph for a dependency cycle, starting from each node in
/// declaration order.
///
/// The cycle is returned closed (its first name repeated at the end) and
/// rotated to start at its smallest name. Prerequisites naming nodes
/// outside the graph are not followed.
pub(crate) fn find_cycle(nodes: &IndexMap<String, Node>) -> Option<Vec<String>> {
    let edges: Vec<Vec<usize>> = nodes
        .values()
        .map(|node| {
            node.node_dependencies()
                .filter_map(|dep| nodes.get_index_of(dep))
                .collect()
        })
        .collect();
    let mut marks = vec![Mark::Unseen; nodes.len()];
    for root in 0..nodes.len() {
        if marks.get(root) != Some(&Mark::Unseen) {
            continue;
        }
        if let Some(path) = walk(root, &edges, &mut marks) {
            let names = path
                .into_iter()
                .filter_map(|idx| nodes.get_index(idx).map(|(name, _)| name.clone()))
                .collect();
            return Some(close_cycle(names));
        }
    }
    None
}

/// Depth-first walk from `root`.
///
/// Returns the indices on the current path from the first node reached
/// twice, or `None` once every node reachable from `root` is done.
fn walk(root: usize, edges: &[Vec<usize>], marks: &mut [Mark]) -> Option<Vec<usize>> {
    // Each frame holds a node and the position of its next edge.
    let mut path: Vec<(usize, usize)> = vec![(root, 0)];
    set_mark(marks, root, Mark::OnPath);
    while let Some(frame) = path.last_mut() {
        let (node, next) = *frame;
        let Some(&dep) = edges.get(node).and_then(|out| out.get(next)) else {
            set_mark(marks, node, Mark::Done);
            path.pop();
            continue;
        };
        frame.1 += 1;
        match marks.get(dep) {
            Some(Mark::Unseen) => {
                set_mark(marks, dep, Mark::OnPath);
                path.push((dep, 0));
            }
            Some(Mark::OnPath) => {
                let start = path.iter().position(|&(idx, _)| idx == dep).unwrap_or(0);
                return Some(path.iter().skip(start).map(|&(idx, _)| idx).collect());
            }
            Some(Mark::Done) | None => {}
        }
    }
    None
}

fn set_mark(marks: &mut [Mark], idx: usize, mark: Mark) {
    if let Some(slot) = marks.get_mut(idx) {
        *slot = mark;
    }
}

/// Rotate an open cycle to start at its smallest name, then close it.
fn close_cycle(mut cycle: Vec<String>) -> Vec<String> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    cycle.rotate_left(start);
    if let Some(first) = cycle.first().cloned() {
        cycle.push(first);
    }
    cycle
}
