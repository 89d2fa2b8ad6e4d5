use crate::dependency::Dependency;
use crate::graph::store::GraphStore;
use petgraph::algo::{DfsSpace, has_path_connecting};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

/// Reports whether committing `predecessor -> successor` would close a
/// cycle, i.e. whether `successor` already reaches `predecessor`.
///
/// The traversal scratch space lives only for this call.
pub fn creates_cycle<N, E>(
    graph: &StableDiGraph<N, E>,
    predecessor: NodeIndex,
    successor: NodeIndex,
) -> bool {
    if predecessor == successor {
        return true;
    }
    let mut space = DfsSpace::new(graph);
    has_path_connecting(graph, successor, predecessor, Some(&mut space))
}

/// Store-level check for a candidate edge. Edges naming unknown tasks cannot
/// close a cycle; the store rejects them separately.
pub fn would_create_cycle(store: &GraphStore, candidate: &Dependency) -> bool {
    match (
        store.node_index(candidate.predecessor),
        store.node_index(candidate.successor),
    ) {
        (Some(pred), Some(succ)) => creates_cycle(store.graph(), pred, succ),
        _ => false,
    }
}
