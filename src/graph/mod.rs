use crate::{
    document::{Document, ObligationKind, ProofEnd, identifiers},
    span::SourceCache,
};
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use ustr::Ustr;

pub mod cycles;
mod select;

pub use select::RootSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Obligation {
        kind: ObligationKind,
        end: ProofEnd,
        line: usize,
        section: Option<Ustr>,
    },
    /// A configured pseudo-node depending on a fixed list of names.
    Group,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    edges: FxHashSet<Ustr>,
    lines: usize,
}

/// Dependency graph between obligations and configured groups. Edges point
/// from a node to the nodes it uses.
#[derive(Debug)]
pub struct DepGraph {
    names: Vec<Ustr>,
    nodes: FxHashMap<Ustr, Node>,
    reachable: FxHashMap<Ustr, FxHashSet<Ustr>>,
    total_lines: FxHashMap<Ustr, usize>,
}

/// The direct edges of one node split by whether a longer path already
/// implies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub kept: Vec<Ustr>,
    pub implied: Vec<Ustr>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("unknown lemma or group `{0}`")]
    UnknownName(Ustr),

    #[error("group `{0}` has the same name as a lemma")]
    GroupClash(Ustr),

    #[error("groups depend on each other in a cycle: {}", .0.iter().join(", "))]
    Cycle(Vec<Ustr>),

    #[error("no roots selected")]
    NoRoots,
}

impl DepGraph {
    pub fn build(
        document: &Document,
        sources: &SourceCache,
        groups: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, GraphError> {
        let mut nodes: FxHashMap<Ustr, Node> = FxHashMap::default();
        let mut names = Vec::new();

        for obligation in document.obligations() {
            // Only obligations declared earlier are visible, so edges always
            // point backwards in the document.
            let body = sources.span_text(obligation.body());
            let edges = identifiers(body)
                .filter_map(Ustr::from_existing)
                .filter(|id| nodes.contains_key(id))
                .collect();

            let name = obligation.name();
            nodes.insert(
                name,
                Node {
                    kind: NodeKind::Obligation {
                        kind: obligation.kind(),
                        end: obligation.end(),
                        line: obligation.line(),
                        section: obligation.section(),
                    },
                    edges,
                    lines: obligation.lines(),
                },
            );
            names.push(name);
        }

        let group_names = groups.keys().map(|g| Ustr::from(g.as_str())).collect_vec();
        for &group in &group_names {
            if nodes.contains_key(&group) {
                return Err(GraphError::GroupClash(group));
            }
            nodes.insert(
                group,
                Node {
                    kind: NodeKind::Group,
                    edges: FxHashSet::default(),
                    lines: 0,
                },
            );
            names.push(group);
        }

        for (&group, members) in group_names.iter().zip(groups.values()) {
            let mut edges = FxHashSet::default();
            for member in members {
                let member = Ustr::from_existing(member)
                    .filter(|m| nodes.contains_key(m))
                    .ok_or_else(|| GraphError::UnknownName(Ustr::from(member.as_str())))?;
                edges.insert(member);
            }
            if let Some(node) = nodes.get_mut(&group) {
                node.edges = edges;
            }
        }

        let mut graph = Self {
            names,
            nodes,
            reachable: FxHashMap::default(),
            total_lines: FxHashMap::default(),
        };

        if let Some(cycle) = cycles::find_dependency_cycles(&graph).into_iter().next() {
            return Err(GraphError::Cycle(cycle));
        }

        graph.compute_closures();
        log::debug!(
            "built graph with {} nodes and {} edges",
            graph.names.len(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn compute_closures(&mut self) {
        fn close(
            name: Ustr,
            nodes: &FxHashMap<Ustr, Node>,
            reachable: &mut FxHashMap<Ustr, FxHashSet<Ustr>>,
        ) {
            if reachable.contains_key(&name) {
                return;
            }

            let mut set = FxHashSet::default();
            for &next in &nodes[&name].edges {
                close(next, nodes, reachable);
                set.insert(next);
                set.extend(reachable[&next].iter().copied());
            }
            reachable.insert(name, set);
        }

        for &name in &self.names {
            close(name, &self.nodes, &mut self.reachable);
        }

        for &name in &self.names {
            let total = self.nodes[&name].lines
                + self.reachable[&name]
                    .iter()
                    .map(|n| self.nodes[n].lines)
                    .sum::<usize>();
            self.total_lines.insert(name, total);
        }
    }

    /// Every node, obligations in document order followed by groups.
    pub fn names(&self) -> &[Ustr] {
        &self.names
    }

    pub fn obligations(&self) -> impl Iterator<Item = Ustr> + '_ {
        self.names
            .iter()
            .copied()
            .filter(|n| matches!(self.nodes[n].kind, NodeKind::Obligation { .. }))
    }

    pub fn contains(&self, name: Ustr) -> bool {
        self.nodes.contains_key(&name)
    }

    pub fn kind(&self, name: Ustr) -> NodeKind {
        self.nodes[&name].kind
    }

    /// Direct dependencies of a node.
    pub fn edges(&self, name: Ustr) -> &FxHashSet<Ustr> {
        &self.nodes[&name].edges
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.edges.len()).sum()
    }

    /// Every node reachable from `name` through at least one edge.
    pub fn reachable(&self, name: Ustr) -> &FxHashSet<Ustr> {
        &self.reachable[&name]
    }

    /// `name` together with everything it depends on.
    pub fn subgraph(&self, name: Ustr) -> FxHashSet<Ustr> {
        let mut set = self.reachable(name).clone();
        set.insert(name);
        set
    }

    /// Drop the direct edges of `name` that are implied by a path through
    /// another direct successor.
    pub fn reduce(&self, name: Ustr) -> Reduction {
        let edges = self.edges(name);
        let implied_by_paths: FxHashSet<Ustr> = edges
            .iter()
            .flat_map(|&next| self.reachable(next).iter().copied())
            .collect();

        let (implied, kept): (Vec<Ustr>, Vec<Ustr>) = edges
            .iter()
            .copied()
            .sorted()
            .partition(|e| implied_by_paths.contains(e));

        Reduction { kept, implied }
    }

    /// Number of source lines in `name` and everything it depends on.
    pub fn total_lines(&self, name: Ustr) -> usize {
        self.total_lines[&name]
    }

    pub fn label(&self, name: Ustr) -> String {
        match self.kind(name) {
            NodeKind::Obligation { line, .. } => {
                format!("{line}: {name} ({})", self.total_lines(name))
            }
            NodeKind::Group => format!("{name} ({})", self.total_lines(name)),
        }
    }

    /// Obligations nothing depends on, sorted by name.
    pub fn unused(&self) -> Vec<Ustr> {
        let used: FxHashSet<Ustr> = self
            .nodes
            .values()
            .flat_map(|n| n.edges.iter().copied())
            .collect();

        self.obligations()
            .filter(|n| !used.contains(n))
            .sorted()
            .collect()
    }
}
