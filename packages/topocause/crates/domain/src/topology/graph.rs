use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use thiserror::Error;

use super::node::{DeviceNode, DeviceRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyIssue {
    #[error("entry '{key}' declares mismatching id '{id}'")]
    IdMismatch { key: String, id: String },
    #[error("duplicate device id '{0}'")]
    DuplicateId(String),
    #[error("device '{device}' references unknown parent '{parent}'")]
    DanglingParent { device: String, parent: String },
    #[error("device '{0}' is its own parent")]
    SelfParent(String),
    #[error("parent cycle detected through '{0}'")]
    Cycle(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("topology is empty")]
    Empty,
    #[error("invalid topology: {}", join_issues(.0))]
    Invalid(Vec<TopologyIssue>),
}

fn join_issues(issues: &[TopologyIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validated, read-only network model.
///
/// Edges run parent -> child. Nodes keep the order they were loaded in, which
/// is the order children and group members are reported in.
#[derive(Debug, Clone)]
pub struct Topology {
    graph: DiGraph<DeviceNode, ()>,
    node_map: HashMap<String, NodeIndex>,
    groups: HashMap<String, Vec<NodeIndex>>,
    depths: Vec<usize>,
}

impl Topology {
    /// Build from an `id -> record` mapping, as found in topology files.
    pub fn from_records(records: BTreeMap<String, DeviceRecord>) -> Result<Self, TopologyError> {
        let mut issues = Vec::new();
        let mut nodes = Vec::with_capacity(records.len());

        for (key, record) in records {
            if let Some(id) = record.id.as_deref() {
                if id != key {
                    issues.push(TopologyIssue::IdMismatch {
                        key: key.clone(),
                        id: id.to_string(),
                    });
                }
            }
            nodes.push(record.into_node(&key));
        }

        Self::build(nodes, issues)
    }

    pub fn from_nodes(nodes: Vec<DeviceNode>) -> Result<Self, TopologyError> {
        Self::build(nodes, Vec::new())
    }

    fn build(nodes: Vec<DeviceNode>, mut issues: Vec<TopologyIssue>) -> Result<Self, TopologyError> {
        if nodes.is_empty() {
            return Err(TopologyError::Empty);
        }

        let mut graph = DiGraph::with_capacity(nodes.len(), nodes.len());
        let mut node_map = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if node_map.contains_key(&node.id) {
                issues.push(TopologyIssue::DuplicateId(node.id.clone()));
                continue;
            }
            let id = node.id.clone();
            let idx = graph.add_node(node);
            node_map.insert(id, idx);
        }

        // O(N) parent -> child indexing
        let indices: Vec<NodeIndex> = graph.node_indices().collect();
        for idx in indices {
            let (id, parent) = {
                let node = &graph[idx];
                (node.id.clone(), node.parent_id.clone())
            };
            let Some(parent) = parent else { continue };

            if parent == id {
                issues.push(TopologyIssue::SelfParent(id));
                continue;
            }
            match node_map.get(&parent) {
                Some(&parent_idx) => {
                    graph.add_edge(parent_idx, idx, ());
                }
                None => issues.push(TopologyIssue::DanglingParent { device: id, parent }),
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            issues.push(TopologyIssue::Cycle(graph[cycle.node_id()].id.clone()));
        }

        if !issues.is_empty() {
            return Err(TopologyError::Invalid(issues));
        }

        let mut groups: HashMap<String, Vec<NodeIndex>> = HashMap::new();
        for idx in graph.node_indices() {
            if let Some(group) = &graph[idx].redundancy_group {
                groups.entry(group.clone()).or_default().push(idx);
            }
        }

        let depths = compute_depths(&graph);

        Ok(Self {
            graph,
            node_map,
            groups,
            depths,
        })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&DeviceNode> {
        self.node_map.get(id).map(|&idx| &self.graph[idx])
    }

    /// All devices in load order.
    pub fn nodes(&self) -> impl Iterator<Item = &DeviceNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn children(&self, id: &str) -> Vec<&DeviceNode> {
        match self.node_map.get(id) {
            Some(&idx) => self
                .child_indices(idx)
                .into_iter()
                .map(|c| &self.graph[c])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Devices that have at least one child, in load order.
    pub fn parents(&self) -> impl Iterator<Item = &DeviceNode> {
        self.graph
            .node_indices()
            .filter(move |&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_some()
            })
            .map(move |idx| &self.graph[idx])
    }

    /// Transitive descendants of `id` in breadth-first order, excluding `id`.
    ///
    /// Unknown ids have no descendants.
    pub fn descendants(&self, id: &str) -> Vec<&DeviceNode> {
        let Some(&root) = self.node_map.get(id) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut visited = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            for child in self.child_indices(current) {
                if visited.insert(child) {
                    out.push(&self.graph[child]);
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// True when `ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.get(id).and_then(|n| n.parent_id.as_deref());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(|n| n.parent_id.as_deref());
        }
        false
    }

    /// Every member of a redundancy group, in load order.
    pub fn group_members(&self, group: &str) -> Vec<&DeviceNode> {
        self.groups
            .get(group)
            .map(|members| members.iter().map(|&idx| &self.graph[idx]).collect())
            .unwrap_or_default()
    }

    /// Other members of the redundancy group `id` belongs to.
    pub fn redundancy_peers(&self, id: &str) -> Vec<&DeviceNode> {
        let Some(group) = self.get(id).and_then(|n| n.redundancy_group.as_deref()) else {
            return Vec::new();
        };
        self.group_members(group)
            .into_iter()
            .filter(|n| n.id != id)
            .collect()
    }

    /// Distance from the root of the tree `id` belongs to (roots are 0).
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.node_map.get(id).map(|idx| self.depths[idx.index()])
    }

    fn child_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }
}

fn compute_depths(graph: &DiGraph<DeviceNode, ()>) -> Vec<usize> {
    let mut depths = vec![0; graph.node_count()];
    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|&idx| {
            graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_none()
        })
        .collect();

    while let Some(current) = queue.pop_front() {
        let next = depths[current.index()] + 1;
        for child in graph.neighbors_directed(current, Direction::Outgoing) {
            depths[child.index()] = next;
            queue.push_back(child);
        }
    }
    depths
}
