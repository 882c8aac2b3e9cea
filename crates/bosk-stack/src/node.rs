use std::cell::RefCell;
use std::rc::Rc;

use bosk_length::Length;
use bosk_tree::{StateId, Tree};

pub(crate) type NodeRef = Rc<StackNode>;

/// A node of the stack graph.
///
/// Links point toward the root; the root is the only node without links. A
/// node's position is the sum of tree sizes along any path to the root, which
/// every path agrees on because merging only joins nodes with equal positions.
pub(crate) struct StackNode {
    state: StateId,
    position: Length,
    links: RefCell<Vec<Link>>,
}

#[derive(Clone)]
pub(crate) struct Link {
    pub(crate) target: NodeRef,
    pub(crate) tree: Tree,
    pub(crate) pending: bool,
}

impl StackNode {
    pub(crate) fn root() -> NodeRef {
        Rc::new(StackNode {
            state: StateId::ROOT,
            position: Length::ZERO,
            links: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn pushed(
        previous: &NodeRef,
        tree: &Tree,
        pending: bool,
        state: StateId,
    ) -> NodeRef {
        let link = Link { target: previous.clone(), tree: tree.clone(), pending };
        Rc::new(StackNode {
            state,
            position: previous.position + tree.size(),
            links: RefCell::new(vec![link]),
        })
    }

    pub(crate) fn state(&self) -> StateId {
        self.state
    }

    pub(crate) fn position(&self) -> Length {
        self.position
    }

    pub(crate) fn links(&self) -> Vec<Link> {
        self.links.borrow().clone()
    }

    pub(crate) fn has_links(&self) -> bool {
        !self.links.borrow().is_empty()
    }

    /// Splices `link` into `node`'s link list, collapsing duplicates.
    ///
    /// A link identical in target, tree and pending flag is dropped. A link
    /// that carries the same tree as an existing link into a different node
    /// with equal state and position merges the two target nodes instead,
    /// recursively, so common suffixes of merged paths stay shared.
    pub(crate) fn add_link(node: &NodeRef, link: Link) {
        if Rc::ptr_eq(node, &link.target) {
            return;
        }

        let mut links = node.links.borrow_mut();
        for existing in links.iter() {
            if existing.tree == link.tree && existing.pending == link.pending {
                if Rc::ptr_eq(&existing.target, &link.target) {
                    return;
                }
                if existing.target.state == link.target.state
                    && existing.target.position == link.target.position
                {
                    let into = existing.target.clone();
                    for sub in link.target.links() {
                        StackNode::add_link(&into, sub);
                    }
                    return;
                }
            }
        }

        links.push(link);
    }
}
