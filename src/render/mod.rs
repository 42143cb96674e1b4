//! Turn a selected part of the dependency graph into Graphviz DOT text.

use crate::{
    graph::{DepGraph, GraphError, NodeKind},
    util::dot_quote,
};
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::{collections::BTreeMap, fmt};
use ustr::Ustr;

pub mod pipeline;

const UNUSED_COLOR: &str = "red";

pub struct DotOptions<'a> {
    /// Only draw edges that are not implied by longer paths.
    pub reduce: bool,
    /// Draw layout chains dashed instead of invisible.
    pub show_invisible: bool,
    pub section_colors: &'a BTreeMap<String, String>,
    pub chains: &'a [Vec<String>],
}

struct DotNode {
    name: Ustr,
    label: String,
    color: Option<String>,
    group: bool,
}

/// The nodes, edges and layout chains to emit, in output order.
pub struct DotGraph {
    nodes: Vec<DotNode>,
    edges: Vec<(Ustr, Ustr)>,
    chains: Vec<Vec<Ustr>>,
    chain_style: &'static str,
    implied: Vec<(Ustr, Vec<Ustr>)>,
}

impl DotGraph {
    pub fn plan(
        graph: &DepGraph,
        selection: &FxHashSet<Ustr>,
        options: &DotOptions,
    ) -> Result<Self, GraphError> {
        let unused: FxHashSet<Ustr> = graph.unused().into_iter().collect();
        let selected = selection.iter().copied().sorted().collect_vec();

        let nodes = selected
            .iter()
            .map(|&name| {
                let (color, group) = match graph.kind(name) {
                    NodeKind::Obligation { .. } if unused.contains(&name) => {
                        (Some(UNUSED_COLOR.to_string()), false)
                    }
                    NodeKind::Obligation { section, .. } => (
                        section.and_then(|s| options.section_colors.get(s.as_str()).cloned()),
                        false,
                    ),
                    NodeKind::Group => (None, true),
                };
                DotNode {
                    name,
                    label: graph.label(name),
                    color,
                    group,
                }
            })
            .collect();

        let mut edges = Vec::new();
        let mut implied = Vec::new();
        for &from in &selected {
            let targets = if options.reduce {
                let reduction = graph.reduce(from);
                if !reduction.implied.is_empty() {
                    implied.push((from, reduction.implied));
                }
                reduction.kept
            } else {
                graph.edges(from).iter().copied().sorted().collect()
            };
            edges.extend(targets.into_iter().map(|to| (from, to)));
        }

        let mut chains = Vec::new();
        for chain in options.chains {
            let mut kept = Vec::new();
            for member in chain {
                let member = Ustr::from_existing(member)
                    .filter(|&m| graph.contains(m))
                    .ok_or_else(|| GraphError::UnknownName(Ustr::from(member.as_str())))?;
                if selection.contains(&member) {
                    kept.push(member);
                }
            }
            if kept.len() > 1 {
                chains.push(kept);
            }
        }

        Ok(Self {
            nodes,
            edges,
            chains,
            chain_style: if options.show_invisible { "dashed" } else { "invis" },
            implied,
        })
    }

    /// Edges left out because of transitivity, per source node.
    pub fn implied(&self) -> &[(Ustr, Vec<Ustr>)] {
        &self.implied
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl fmt::Display for DotGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {{")?;
        writeln!(f, "margin=0;")?;
        writeln!(f, "node [shape=box fontsize=\"10\" margin=\"0.055,0.055\"];")?;
        writeln!(f, "node [fontname=\"Serif\" height=0];")?;

        for node in &self.nodes {
            write!(f, "{} [label={}", dot_quote(&node.name), dot_quote(&node.label))?;
            if let Some(color) = &node.color {
                write!(f, ", color={}", dot_quote(color))?;
            }
            if node.group {
                write!(f, ", shape=ellipse")?;
            }
            writeln!(f, "];")?;
        }

        for (from, to) in &self.edges {
            writeln!(f, "{} -> {};", dot_quote(from), dot_quote(to))?;
        }

        for chain in &self.chains {
            writeln!(
                f,
                "{} [style={}];",
                chain.iter().map(|n| dot_quote(n)).join(" -> "),
                self.chain_style
            )?;
        }

        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{RootSelection, tests::graph_of};
    use pretty_assertions::assert_eq;

    const DOC: &str = "\
(** ** Basics *)
Lemma base : True. Qed.
Lemma middle : True.
Proof. apply base. Qed.
(** ** Results *)
Theorem top : True.
Proof. apply middle; apply base. Qed.
Lemma lonely : True. Admitted.
";

    fn render(
        root: &str,
        groups: &[(&str, &[&str])],
        reduce: bool,
        show_invisible: bool,
        chains: &[Vec<String>],
    ) -> Result<DotGraph, GraphError> {
        let graph = graph_of(DOC, groups).unwrap();
        let selection = RootSelection::parse(root).select(&graph).unwrap();
        let colors = BTreeMap::from([("Basics".to_string(), "blue".to_string())]);
        let options = DotOptions {
            reduce,
            show_invisible,
            section_colors: &colors,
            chains,
        };
        DotGraph::plan(&graph, &selection, &options)
    }

    fn chain(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn renders_full_graph() {
        let dot = render("all", &[], false, false, &[]).unwrap();
        assert_eq!(
            dot.to_string(),
            r#"digraph {
margin=0;
node [shape=box fontsize="10" margin="0.055,0.055"];
node [fontname="Serif" height=0];
"base" [label="2: base (1)", color="blue"];
"lonely" [label="8: lonely (1)", color="red"];
"middle" [label="3: middle (3)", color="blue"];
"top" [label="6: top (5)", color="red"];
"middle" -> "base";
"top" -> "base";
"top" -> "middle";
}
"#
        );
        assert!(dot.implied().is_empty());
    }

    #[test]
    fn reduced_graph_reports_implied_edges() {
        let dot = render("top", &[], true, false, &[]).unwrap();
        let text = dot.to_string();
        assert!(text.contains("\"top\" -> \"middle\";\n"));
        assert!(!text.contains("\"top\" -> \"base\";"));
        assert_eq!(dot.edge_count(), 2);
        assert_eq!(dot.implied(), [(Ustr::from("top"), vec![Ustr::from("base")])]);
    }

    #[test]
    fn group_nodes_are_ellipses() {
        let dot = render("ROOT", &[("ROOT", &["top"])], false, false, &[]).unwrap();
        let text = dot.to_string();
        assert!(text.contains("\"ROOT\" [label=\"ROOT (5)\", shape=ellipse];\n"));
        assert!(text.contains("\"ROOT\" -> \"top\";\n"));
        // `top` is used by the group, so it takes its section color instead.
        assert!(text.contains("\"top\" [label=\"6: top (5)\"];\n"));
        assert!(!text.contains("lonely"));
    }

    #[test]
    fn chains_are_filtered_to_selection() {
        let chains = [
            chain(&["lonely", "middle", "base"]),
            chain(&["lonely", "top"]),
        ];
        let dot = render("middle", &[], false, false, &chains).unwrap();
        let text = dot.to_string();
        assert!(text.ends_with("\"middle\" -> \"base\" [style=invis];\n}\n"));
        assert!(!text.contains("\"top\""));

        let dot = render("all", &[], false, true, &chains).unwrap();
        let text = dot.to_string();
        assert!(text.contains("\"lonely\" -> \"middle\" -> \"base\" [style=dashed];\n"));
        assert!(text.contains("\"lonely\" -> \"top\" [style=dashed];\n"));
    }

    #[test]
    fn chains_must_name_known_nodes() {
        let chains = [chain(&["base", "no_such_lemma"])];
        assert_eq!(
            render("all", &[], false, false, &chains).err(),
            Some(GraphError::UnknownName(Ustr::from("no_such_lemma")))
        );
    }
}
