use rustc_hash::{FxHashMap, FxHashSet};
use ustr::Ustr;

use crate::graph::DepGraph;

/// Find the groups of nodes that depend on each other, directly or through a
/// longer path. Every returned group is a strongly connected component with
/// more than one node, or a single node depending on itself.
pub fn find_dependency_cycles(graph: &DepGraph) -> Vec<Vec<Ustr>> {
    // Tarjan's strongly connected components over the direct edges.

    let mut index = 0;
    let mut indices: FxHashMap<Ustr, usize> = FxHashMap::default();
    let mut lowlinks: FxHashMap<Ustr, usize> = FxHashMap::default();
    let mut stack: Vec<Ustr> = Vec::new();
    let mut on_stack: FxHashSet<Ustr> = FxHashSet::default();
    let mut sccs: Vec<Vec<Ustr>> = Vec::new();

    struct State<'a> {
        graph: &'a DepGraph,
        index: &'a mut usize,
        indices: &'a mut FxHashMap<Ustr, usize>,
        lowlinks: &'a mut FxHashMap<Ustr, usize>,
        stack: &'a mut Vec<Ustr>,
        on_stack: &'a mut FxHashSet<Ustr>,
        sccs: &'a mut Vec<Vec<Ustr>>,
    }

    fn dfs(at: Ustr, st: &mut State) {
        st.stack.push(at);
        st.on_stack.insert(at);

        st.indices.insert(at, *st.index);
        st.lowlinks.insert(at, *st.index);
        *st.index += 1;

        let graph = st.graph;
        for &to in graph.edges(at) {
            if !st.indices.contains_key(&to) {
                dfs(to, st);
                let low = st.lowlinks[&at].min(st.lowlinks[&to]);
                st.lowlinks.insert(at, low);
            } else if st.on_stack.contains(&to) {
                let low = st.lowlinks[&at].min(st.indices[&to]);
                st.lowlinks.insert(at, low);
            }
        }

        if st.indices[&at] == st.lowlinks[&at] {
            let mut scc = Vec::new();
            while let Some(node) = st.stack.pop() {
                st.on_stack.remove(&node);
                scc.push(node);
                if node == at {
                    break;
                }
            }
            st.sccs.push(scc);
        }
    }

    let mut st = State {
        graph,
        index: &mut index,
        indices: &mut indices,
        lowlinks: &mut lowlinks,
        stack: &mut stack,
        on_stack: &mut on_stack,
        sccs: &mut sccs,
    };

    for &name in graph.names() {
        if !st.indices.contains_key(&name) {
            dfs(name, &mut st);
        }
    }

    sccs.retain(|scc| scc.len() > 1 || graph.edges(scc[0]).contains(&scc[0]));
    for scc in &mut sccs {
        scc.sort();
    }
    sccs
}
