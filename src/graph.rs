//! Resource Dependency Graph
//!
//! Tracks which declarations feed which. The assembler records an edge every
//! time one resource's attribute is threaded into another's properties. The
//! graph drives:
//!
//! - Stack ordering (cross-stack edges become stack dependencies)
//! - Cycle detection
//! - Dependency visualization (`sitestack graph`)

use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexMap;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scope of nodes resolved outside any stack
pub const EXTERNAL_SCOPE: &str = "external";

/// Scope of the post-deploy content publish step
pub const PUBLISH_SCOPE: &str = "publish";

/// What a node declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Looked-up hosted zone
    HostedZone,
    /// Content bucket
    Bucket,
    /// Bucket policy
    BucketPolicy,
    /// ACM certificate
    Certificate,
    /// CloudFront distribution
    Distribution,
    /// Route 53 alias record
    AliasRecord,
    /// Content sync and invalidation
    Deployment,
}

impl ResourceKind {
    /// Short label used in graph output
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::HostedZone => "hosted zone",
            ResourceKind::Bucket => "bucket",
            ResourceKind::BucketPolicy => "bucket policy",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Distribution => "distribution",
            ResourceKind::AliasRecord => "alias record",
            ResourceKind::Deployment => "deployment",
        }
    }
}

/// A node in the resource graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Logical id
    pub id: String,
    /// Resource kind
    pub kind: ResourceKind,
    /// Stack (or pseudo-scope) the node belongs to
    pub scope: String,
}

impl ResourceNode {
    /// Create a new resource node
    pub fn new(id: impl Into<String>, kind: ResourceKind, scope: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            scope: scope.into(),
        }
    }
}

/// How a dependent consumes its dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// `Ref` to the dependency
    Reference,
    /// `Fn::GetAtt` on the dependency
    Attribute,
    /// Value crosses a stack boundary through an output and a parameter
    CrossStack,
    /// Value read from a looked-up external entity
    Lookup,
    /// Consumed after deployment by the content publisher
    PostDeploy,
}

/// The dependency graph between declarations
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    graph: DiGraph<ResourceNode, DependencyKind>,
    node_indices: IndexMap<String, NodeIndex>,
}

impl ResourceGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; re-adding an id replaces the node in place
    pub fn add_node(&mut self, node: ResourceNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node.id) {
            if let Some(existing) = self.graph.node_weight_mut(idx) {
                *existing = node;
            }
            return idx;
        }

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        idx
    }

    /// Record that `dependent` consumes `dependency`
    pub fn add_dependency(
        &mut self,
        dependency: &str,
        dependent: &str,
        kind: DependencyKind,
    ) -> Result<()> {
        let from = self.index_of(dependency)?;
        let to = self.index_of(dependent)?;
        self.graph.update_edge(from, to, kind);
        Ok(())
    }

    fn index_of(&self, id: &str) -> Result<NodeIndex> {
        self.node_indices
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownResource(id.to_string()))
    }

    /// Check for dependency cycles
    pub fn has_cycles(&self) -> bool {
        tarjan_scc(&self.graph).iter().any(|scc| scc.len() > 1)
    }

    /// All cycles in the graph, as lists of ids
    pub fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                scc.into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.id.clone()))
                    .collect()
            })
            .collect()
    }

    /// Declaration order respecting every edge
    pub fn topological_order(&self) -> Result<Vec<String>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter_map(|idx| self.graph.node_weight(idx).map(|n| n.id.clone()))
                .collect()),
            Err(cycle) => {
                let id = self
                    .graph
                    .node_weight(cycle.node_id())
                    .map(|n| n.id.as_str())
                    .unwrap_or("?");
                Err(Error::DependencyCycle(format!(
                    "resource '{}' participates in a cycle",
                    id
                )))
            }
        }
    }

    /// Everything that consumes `id`, directly or transitively (sorted)
    pub fn dependents(&self, id: &str) -> Vec<String> {
        self.walk(id, Direction::Outgoing)
    }

    /// Everything `id` consumes, directly or transitively (sorted)
    pub fn dependencies(&self, id: &str) -> Vec<String> {
        self.walk(id, Direction::Incoming)
    }

    fn walk(&self, id: &str, direction: Direction) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();

        if let Some(&start) = self.node_indices.get(id) {
            queue.push_back(start);

            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors_directed(current, direction) {
                    if let Some(node) = self.graph.node_weight(neighbor) {
                        if seen.insert(node.id.clone()) {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        }

        seen.into_iter().collect()
    }

    /// Get a node by id
    pub fn node(&self, id: &str) -> Option<&ResourceNode> {
        self.node_indices
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.node_indices
            .values()
            .filter_map(|idx| self.graph.node_weight(*idx))
    }

    /// Edges as `(dependency, dependent, kind)`, in insertion order
    pub fn edges(&self) -> Vec<(String, String, DependencyKind)> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let from = self.graph.node_weight(edge.source())?;
                let to = self.graph.node_weight(edge.target())?;
                Some((from.id.clone(), to.id.clone(), *edge.weight()))
            })
            .collect()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Ids of the nodes in `scope`
    pub fn nodes_in_scope(&self, scope: &str) -> Vec<String> {
        self.nodes()
            .filter(|n| n.scope == scope)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Scopes that nodes in `scope` consume from, limited to `among`
    pub fn scope_dependencies(&self, scope: &str, among: &[String]) -> Vec<String> {
        let mut found = Vec::new();
        for edge in self.graph.edge_references() {
            let (Some(from), Some(to)) = (
                self.graph.node_weight(edge.source()),
                self.graph.node_weight(edge.target()),
            ) else {
                continue;
            };
            if to.scope == scope
                && from.scope != scope
                && among.contains(&from.scope)
                && !found.contains(&from.scope)
            {
                found.push(from.scope.clone());
            }
        }
        found
    }

    /// Order `scopes` so that every scope follows the scopes it consumes from
    pub fn scope_order(&self, scopes: &[String]) -> Result<Vec<String>> {
        let mut scope_graph: DiGraph<String, ()> = DiGraph::new();
        let indices: IndexMap<&String, NodeIndex> = scopes
            .iter()
            .map(|s| (s, scope_graph.add_node(s.clone())))
            .collect();

        for scope in scopes {
            for dependency in self.scope_dependencies(scope, scopes) {
                if let (Some(&from), Some(&to)) = (indices.get(&dependency), indices.get(scope)) {
                    scope_graph.update_edge(from, to, ());
                }
            }
        }

        toposort(&scope_graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .filter_map(|idx| scope_graph.node_weight(idx).cloned())
                    .collect()
            })
            .map_err(|_| Error::DependencyCycle("stacks depend on each other".to_string()))
    }

    /// Generate a DOT format representation for visualization
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph resources {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box];\n\n");

        // Group nodes by scope
        let mut scopes: IndexMap<&str, Vec<&ResourceNode>> = IndexMap::new();
        for node in self.nodes() {
            scopes.entry(node.scope.as_str()).or_default().push(node);
        }

        for (i, (scope, nodes)) in scopes.iter().enumerate() {
            output.push_str(&format!("  subgraph cluster_{} {{\n", i));
            output.push_str(&format!("    label=\"{}\";\n", scope));
            for node in nodes {
                output.push_str(&format!(
                    "    \"{}\" [label=\"{}\\n{}\"];\n",
                    node.id,
                    node.id,
                    node.kind.label()
                ));
            }
            output.push_str("  }\n");
        }

        output.push('\n');

        for (from, to, kind) in self.edges() {
            let style = match kind {
                DependencyKind::Reference => "solid",
                DependencyKind::Attribute => "bold",
                DependencyKind::CrossStack => "dashed",
                DependencyKind::Lookup => "dotted",
                DependencyKind::PostDeploy => "dotted",
            };
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [style={}];\n",
                from, to, style
            ));
        }

        output.push_str("}\n");
        output
    }
}

impl PartialEq for ResourceGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes()) && self.edges() == other.edges()
    }
}
