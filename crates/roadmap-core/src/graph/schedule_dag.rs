use crate::dependency::{Dependency, DependencyKind};
use crate::task::{Task, TaskId};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagLink {
    pub node: usize,
    pub kind: DependencyKind,
    pub lag_days: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DagNode {
    pub id: TaskId,
    pub duration: i64,
    pub anchored_start: Option<i64>,
    pub percent_complete: f64,
    pub parent: Option<usize>,
    pub predecessors: Vec<DagLink>,
    pub successors: Vec<DagLink>,
}

/// Owned, index-addressed view of a project's graph.
///
/// Node positions follow task insertion order; the scheduling passes run
/// over this copy so they never hold a borrow of the live store.
#[derive(Debug, Clone, Default)]
pub struct ScheduleDag {
    nodes: Vec<DagNode>,
    index: HashMap<TaskId, usize>,
}

impl ScheduleDag {
    /// Built only from a store snapshot, which guarantees the edges form a
    /// DAG over existing tasks.
    pub(crate) fn from_store_parts(tasks: &[&Task], dependencies: &[Dependency]) -> Self {
        let index: HashMap<TaskId, usize> = tasks
            .iter()
            .enumerate()
            .map(|(pos, task)| (task.id, pos))
            .collect();

        let mut nodes: Vec<DagNode> = tasks
            .iter()
            .map(|task| DagNode {
                id: task.id,
                duration: task.duration_days,
                anchored_start: task.anchored_start(),
                percent_complete: task.percent_complete,
                parent: task.parent_id.and_then(|p| index.get(&p).copied()),
                predecessors: Vec::new(),
                successors: Vec::new(),
            })
            .collect();

        for dep in dependencies {
            if let (Some(&u), Some(&v)) = (index.get(&dep.predecessor), index.get(&dep.successor)) {
                nodes[u].successors.push(DagLink {
                    node: v,
                    kind: dep.kind,
                    lag_days: dep.lag_days,
                });
                nodes[v].predecessors.push(DagLink {
                    node: u,
                    kind: dep.kind,
                    lag_days: dep.lag_days,
                });
            }
        }

        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[DagNode] {
        &self.nodes
    }

    pub fn node(&self, pos: usize) -> &DagNode {
        &self.nodes[pos]
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Kahn's algorithm; among ready nodes the earliest inserted goes first.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.predecessors.len()).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(pos, _)| Reverse(pos))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(pos)) = ready.pop() {
            order.push(pos);
            for link in &self.nodes[pos].successors {
                in_degree[link.node] -= 1;
                if in_degree[link.node] == 0 {
                    ready.push(Reverse(link.node));
                }
            }
        }
        order
    }

    /// Direct children per node in the containment tree, by position.
    pub fn children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.nodes.len()];
        for (pos, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                children[parent].push(pos);
            }
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_break_by_insertion_order() {
        let a = Task::new(5, "A", 1);
        let b = Task::new(3, "B", 1);
        let c = Task::new(1, "C", 1);
        let deps = vec![Dependency::finish_to_start(5, 1)];
        let dag = ScheduleDag::from_store_parts(&[&a, &b, &c], &deps);
        let ids: Vec<TaskId> = dag
            .topological_order()
            .into_iter()
            .map(|pos| dag.node(pos).id)
            .collect();
        assert_eq!(ids, vec![5, 3, 1]);
    }

    #[test]
    fn children_follow_parent_links() {
        let m = Task::milestone(1, "M");
        let x = Task::new(2, "X", 2).with_parent(1);
        let y = Task::new(3, "Y", 2).with_parent(1);
        let dag = ScheduleDag::from_store_parts(&[&m, &x, &y], &[]);
        assert_eq!(dag.children()[0], vec![1, 2]);
        assert!(dag.children()[1].is_empty());
    }
}
