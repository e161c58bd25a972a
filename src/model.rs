use crate::config::LayoutConfig;
use crate::ir::{DependencyStatus, Task, TaskStatus};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub task_name: String,
    pub status: TaskStatus,
    pub width: f32,
    pub height: f32,
    pub has_upstream_deps: bool,
    pub has_downstream_deps: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub dependency_status: DependencyStatus,
    pub animated: bool,
}

/// Nodes and edges derived from a task list, before any layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{}-{}", source, target)
}

pub fn build_graph_model(tasks: &[Task], config: &LayoutConfig) -> GraphModel {
    let mut by_name: HashMap<&str, &Task> = HashMap::new();
    for task in tasks {
        by_name.entry(task.task_name.as_str()).or_insert(task);
    }

    let mut has_downstream: HashSet<&str> = HashSet::new();
    let mut edges = Vec::new();
    for task in tasks {
        let mut seen: HashSet<&str> = HashSet::new();
        for dep_name in task.deps() {
            let Some(&dep) = by_name.get(dep_name.as_str()) else {
                continue;
            };
            if dep.id == task.id || !seen.insert(dep.id.as_str()) {
                continue;
            }
            has_downstream.insert(dep.id.as_str());
            let dependency_status = DependencyStatus::from_source(dep.status);
            edges.push(GraphEdge {
                id: edge_id(&dep.id, &task.id),
                source: dep.id.clone(),
                target: task.id.clone(),
                dependency_status,
                animated: dependency_status == DependencyStatus::Blocked
                    && task.status == TaskStatus::Pending,
            });
        }
    }

    let nodes = tasks
        .iter()
        .map(|task| GraphNode {
            id: task.id.clone(),
            task_name: task.task_name.clone(),
            status: task.status,
            width: config.node_width,
            height: config.node_height,
            has_upstream_deps: !task.deps().is_empty(),
            has_downstream_deps: has_downstream.contains(task.id.as_str()),
        })
        .collect();

    GraphModel { nodes, edges }
}

impl GraphModel {
    /// Stable fingerprint of node ids and edge endpoints. Statuses are not
    /// part of it, so it only changes when the graph shape does.
    pub fn topology_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.nodes.len().hash(&mut hasher);
        for node in &self.nodes {
            node.id.hash(&mut hasher);
            node.width.to_bits().hash(&mut hasher);
            node.height.to_bits().hash(&mut hasher);
        }
        self.edges.len().hash(&mut hasher);
        for edge in &self.edges {
            edge.source.hash(&mut hasher);
            edge.target.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn node_index(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.as_str(), idx))
            .collect()
    }
}
