//! Graphviz rendering of the stack graph for debugging.

use std::fmt;
use std::rc::Rc;

use bosk_tree::StateId;
use rustc_hash::FxHashMap;

use crate::node::{NodeRef, StackNode};
use crate::stack::Stack;

/// A [`fmt::Display`] rendering of the whole node graph in DOT format.
///
/// Numbered heads point at their nodes; node labels are states, with `?` for
/// the error state. Pending links are dashed and extra trees gray. Node ids
/// are assigned in head order, then breadth-first, so the output is stable
/// across runs.
pub struct DotGraph<'a> {
    stack: &'a Stack,
}

impl<'a> DotGraph<'a> {
    pub(crate) fn new(stack: &'a Stack) -> Self {
        Self { stack }
    }
}

impl fmt::Display for DotGraph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids = FxHashMap::default();
        let mut queue = Vec::new();

        writeln!(f, "digraph stack {{")?;
        writeln!(f, "rankdir=\"RL\";")?;
        writeln!(f, "edge [arrowhead=none]")?;

        for (version, head) in self.stack.heads().iter().enumerate() {
            let id = visit(head, &mut ids, &mut queue);
            writeln!(f, "head_{version} [shape=none label=\"\"]")?;
            writeln!(
                f,
                "head_{version} -> node_{id} [label={version} fontcolor=blue weight=10000]"
            )?;
        }

        let mut index = 0;
        while index < queue.len() {
            let node = queue[index].clone();
            index += 1;

            let id = ids[&Rc::as_ptr(&node)];
            if node.state() == StateId::ERROR {
                writeln!(f, "node_{id} [label=\"?\"]")?;
            } else {
                writeln!(f, "node_{id} [label=\"{}\"]", node.state().raw())?;
            }

            for link in node.links() {
                let target = visit(&link.target, &mut ids, &mut queue);
                write!(f, "node_{id} -> node_{target} [")?;
                if link.pending {
                    write!(f, "style=dashed ")?;
                }
                if link.tree.is_extra() {
                    write!(f, "fontcolor=gray ")?;
                }
                writeln!(f, "label=\"{}\"]", link.tree.symbol())?;
            }
        }

        writeln!(f, "}}")
    }
}

fn visit(
    node: &NodeRef,
    ids: &mut FxHashMap<*const StackNode, usize>,
    queue: &mut Vec<NodeRef>,
) -> usize {
    let next = ids.len();
    *ids.entry(Rc::as_ptr(node)).or_insert_with(|| {
        queue.push(node.clone());
        next
    })
}
