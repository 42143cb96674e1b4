use crate::{
    graph::{DepGraph, GraphError},
    strings::{ALL_ROOTS, EXCLUDE_PREFIX},
};
use rustc_hash::FxHashSet;
use ustr::Ustr;

/// Which part of the graph to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSelection {
    /// Every obligation.
    All,
    /// Everything outside the subgraph of the given node, with dependencies.
    Excluding(Ustr),
    /// The given nodes with everything they depend on.
    Roots(Vec<Ustr>),
}

impl RootSelection {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text == ALL_ROOTS {
            Self::All
        } else if let Some(excluded) = text.strip_prefix(EXCLUDE_PREFIX) {
            Self::Excluding(Ustr::from(excluded.trim()))
        } else {
            Self::Roots(
                text.split(',')
                    .map(str::trim)
                    .filter(|root| !root.is_empty())
                    .map(Ustr::from)
                    .collect(),
            )
        }
    }

    /// The selected node set. It is always closed under edges.
    pub fn select(&self, graph: &DepGraph) -> Result<FxHashSet<Ustr>, GraphError> {
        let check = |name: Ustr| {
            if graph.contains(name) {
                Ok(name)
            } else {
                Err(GraphError::UnknownName(name))
            }
        };

        match self {
            Self::All => Ok(graph.obligations().collect()),
            Self::Excluding(excluded) => {
                let excluded = graph.subgraph(check(*excluded)?);
                Ok(graph
                    .obligations()
                    .filter(|root| !excluded.contains(root))
                    .flat_map(|root| graph.subgraph(root))
                    .collect())
            }
            Self::Roots(roots) => {
                if roots.is_empty() {
                    return Err(GraphError::NoRoots);
                }

                let mut nodes = FxHashSet::default();
                for &root in roots {
                    nodes.extend(graph.subgraph(check(root)?));
                }
                Ok(nodes)
            }
        }
    }
}
