use crate::dependency::{Dependency, DependencyKind};
use crate::error::{EngineError, EngineResult};
use crate::graph::cycle_guard;
use crate::graph::schedule_dag::ScheduleDag;
use crate::task::{Task, TaskId, TaskKind, TaskUpdate};
use crate::task_validation;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct TaskNode {
    task: Task,
    seq: u64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeData {
    kind: DependencyKind,
    lag_days: i64,
}

/// Tasks and dependency edges of one project.
///
/// Node indexes of the underlying stable graph are reused after removals,
/// so ordering always goes through the insertion sequence stored on each
/// node.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graph: StableDiGraph<TaskNode, EdgeData>,
    id_to_index: HashMap<TaskId, NodeIndex>,
    next_seq: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted records, applying every structural check
    /// an interactive edit would.
    pub fn from_records(tasks: Vec<Task>, dependencies: &[Dependency]) -> EngineResult<Self> {
        task_validation::validate_task_collection(&tasks)?;
        let mut store = Self::new();
        // Parents may be listed after their children.
        let mut pending_parents = Vec::new();
        for mut task in tasks {
            if let Some(parent) = task.parent_id.take() {
                pending_parents.push((task.id, parent));
            }
            store.add_task(task)?;
        }
        for (id, parent) in pending_parents {
            store.update_task(id, &TaskUpdate::parent(Some(parent)))?;
        }
        for dependency in dependencies {
            store.add_edge(*dependency)?;
        }
        Ok(store)
    }

    pub(crate) fn graph(&self) -> &StableDiGraph<TaskNode, EdgeData> {
        &self.graph
    }

    pub(crate) fn node_index(&self, id: TaskId) -> Option<NodeIndex> {
        self.id_to_index.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.id_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_index.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.node_index(id).map(|ix| &self.graph[ix].task)
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> Vec<&Task> {
        let mut nodes: Vec<&TaskNode> = self
            .graph
            .node_indices()
            .map(|ix| &self.graph[ix])
            .collect();
        nodes.sort_by_key(|node| node.seq);
        nodes.into_iter().map(|node| &node.task).collect()
    }

    pub fn next_task_id(&self) -> TaskId {
        self.id_to_index.keys().max().map(|max| max + 1).unwrap_or(1)
    }

    /// All edges ordered by (predecessor, successor) insertion sequence.
    pub fn dependencies(&self) -> Vec<Dependency> {
        let mut edges: Vec<(u64, u64, Dependency)> = Vec::new();
        for ix in self.graph.node_indices() {
            for edge in self.graph.edges_directed(ix, Direction::Outgoing) {
                let pred = &self.graph[edge.source()];
                let succ = &self.graph[edge.target()];
                edges.push((
                    pred.seq,
                    succ.seq,
                    Dependency {
                        predecessor: pred.task.id,
                        successor: succ.task.id,
                        kind: edge.weight().kind,
                        lag_days: edge.weight().lag_days,
                    },
                ));
            }
        }
        edges.sort_by_key(|(pred_seq, succ_seq, _)| (*pred_seq, *succ_seq));
        edges.into_iter().map(|(_, _, dep)| dep).collect()
    }

    pub fn dependency(&self, predecessor: TaskId, successor: TaskId) -> Option<Dependency> {
        let (pred, succ) = (self.node_index(predecessor)?, self.node_index(successor)?);
        let edge = self.graph.find_edge(pred, succ)?;
        let data = self.graph[edge];
        Some(Dependency {
            predecessor,
            successor,
            kind: data.kind,
            lag_days: data.lag_days,
        })
    }

    pub fn predecessors(&self, id: TaskId) -> Vec<TaskId> {
        self.neighbors(id, Direction::Incoming)
    }

    pub fn successors(&self, id: TaskId) -> Vec<TaskId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: TaskId, direction: Direction) -> Vec<TaskId> {
        let Some(ix) = self.node_index(id) else {
            return Vec::new();
        };
        let mut found: Vec<&TaskNode> = self
            .graph
            .neighbors_directed(ix, direction)
            .map(|n| &self.graph[n])
            .collect();
        found.sort_by_key(|node| node.seq);
        found.into_iter().map(|node| node.task.id).collect()
    }

    /// Tasks grouped directly under `id` in the containment tree.
    pub fn children(&self, id: TaskId) -> Vec<TaskId> {
        self.tasks()
            .into_iter()
            .filter(|task| task.parent_id == Some(id))
            .map(|task| task.id)
            .collect()
    }

    pub fn add_task(&mut self, task: Task) -> EngineResult<()> {
        task_validation::validate_task(&task)?;
        if self.contains(task.id) {
            return Err(EngineError::DuplicateTask(task.id));
        }
        self.validate_parent(task.id, task.parent_id)?;

        let id = task.id;
        let seq = self.next_seq;
        self.next_seq += 1;
        let ix = self.graph.add_node(TaskNode { task, seq });
        self.id_to_index.insert(id, ix);
        debug!(task = id, "task added");
        Ok(())
    }

    /// Apply `update` to task `id`, returning the committed record.
    pub fn update_task(&mut self, id: TaskId, update: &TaskUpdate) -> EngineResult<Task> {
        let ix = self.node_index(id).ok_or(EngineError::TaskNotFound(id))?;
        let current = &self.graph[ix].task;
        let candidate = current.merged(update);

        task_validation::validate_task(&candidate)?;
        if candidate.parent_id != current.parent_id {
            self.validate_parent(id, candidate.parent_id)?;
        }
        if candidate.kind != TaskKind::Milestone && !self.children(id).is_empty() {
            return Err(EngineError::invalid_containment(format!(
                "task {id} still contains other tasks and must remain a milestone"
            )));
        }

        self.graph[ix].task = candidate.clone();
        debug!(task = id, "task updated");
        Ok(candidate)
    }

    /// Remove a task together with every incident edge. Tasks it contained
    /// move up to its own parent.
    pub fn remove_task(&mut self, id: TaskId) -> EngineResult<Task> {
        let ix = self.node_index(id).ok_or(EngineError::TaskNotFound(id))?;
        let children = self.children(id);
        let node = self
            .graph
            .remove_node(ix)
            .ok_or(EngineError::TaskNotFound(id))?;
        self.id_to_index.remove(&id);

        for child in children {
            if let Some(child_ix) = self.node_index(child) {
                self.graph[child_ix].task.parent_id = node.task.parent_id;
            }
        }
        debug!(task = id, "task removed");
        Ok(node.task)
    }

    pub fn add_edge(&mut self, dependency: Dependency) -> EngineResult<()> {
        task_validation::validate_dependency(&dependency)?;
        let pred = self
            .node_index(dependency.predecessor)
            .ok_or(EngineError::TaskNotFound(dependency.predecessor))?;
        let succ = self
            .node_index(dependency.successor)
            .ok_or(EngineError::TaskNotFound(dependency.successor))?;

        if self.graph.find_edge(pred, succ).is_some() {
            return Err(EngineError::DuplicateEdge {
                predecessor: dependency.predecessor,
                successor: dependency.successor,
            });
        }
        if cycle_guard::creates_cycle(&self.graph, pred, succ) {
            return Err(EngineError::Cycle {
                predecessor: dependency.predecessor,
                successor: dependency.successor,
            });
        }

        self.graph.add_edge(
            pred,
            succ,
            EdgeData {
                kind: dependency.kind,
                lag_days: dependency.lag_days,
            },
        );
        debug!(
            predecessor = dependency.predecessor,
            successor = dependency.successor,
            kind = dependency.kind.as_str(),
            "dependency added"
        );
        Ok(())
    }

    pub fn remove_edge(&mut self, predecessor: TaskId, successor: TaskId) -> EngineResult<Dependency> {
        let not_found = EngineError::DependencyNotFound {
            predecessor,
            successor,
        };
        let removed = self.dependency(predecessor, successor).ok_or(not_found.clone())?;
        let (pred, succ) = match (self.node_index(predecessor), self.node_index(successor)) {
            (Some(pred), Some(succ)) => (pred, succ),
            _ => return Err(not_found),
        };
        let edge = self.graph.find_edge(pred, succ).ok_or(not_found)?;
        self.graph.remove_edge(edge);
        debug!(predecessor, successor, "dependency removed");
        Ok(removed)
    }

    /// Owned, index-based copy of the graph for the scheduling passes.
    pub fn to_dag(&self) -> ScheduleDag {
        let tasks = self.tasks();
        let dependencies = self.dependencies();
        ScheduleDag::from_store_parts(&tasks, &dependencies)
    }

    fn validate_parent(&self, id: TaskId, parent: Option<TaskId>) -> EngineResult<()> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        if parent_id == id {
            return Err(EngineError::invalid_containment(format!(
                "task {id} cannot contain itself"
            )));
        }
        let parent_task = self.task(parent_id).ok_or_else(|| {
            EngineError::invalid_containment(format!("parent {parent_id} of task {id} does not exist"))
        })?;
        if !parent_task.is_milestone() {
            return Err(EngineError::invalid_containment(format!(
                "parent {parent_id} of task {id} is not a milestone"
            )));
        }

        // Walk up from the proposed parent; meeting `id` means a loop.
        let mut cursor = parent_task.parent_id;
        let mut steps = 0usize;
        while let Some(ancestor) = cursor {
            if ancestor == id || steps > self.len() {
                return Err(EngineError::invalid_containment(format!(
                    "placing task {id} under {parent_id} would make it its own ancestor"
                )));
            }
            cursor = self.task(ancestor).and_then(|t| t.parent_id);
            steps += 1;
        }
        Ok(())
    }
}
