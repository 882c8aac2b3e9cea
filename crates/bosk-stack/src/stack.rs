use std::fmt;
use std::rc::Rc;

use bosk_length::Length;
use bosk_tree::{StateId, Tree};

use crate::dot::DotGraph;
use crate::node::{Link, NodeRef, StackNode};

/// Index of one head of the stack. Stable only until the next operation that
/// removes or renumbers versions.
pub type StackVersion = usize;

/// One popped path: the trees harvested along it, in push order, and the
/// version positioned at its endpoint.
#[derive(Debug)]
pub struct StackSlice {
    pub version: StackVersion,
    pub trees: Vec<Tree>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PopStatus {
    Succeeded,
    /// The traversal crossed into an error-state node and stopped there.
    StoppedAtError,
    /// Reserved; no current operation produces it.
    Failed,
}

#[derive(Debug)]
pub struct PopResult {
    pub status: PopStatus,
    pub slices: Vec<StackSlice>,
}

/// Control value returned by a [`Stack::iterate`] visitor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IterateAction {
    /// Keep walking through this node's links.
    Continue,
    /// Harvest the path walked so far into a slice and stop walking it.
    Pop,
    /// Abandon this path.
    Stop,
}

/// The state of one walked path, handed to a [`Stack::iterate`] visitor at
/// each node.
pub struct StackEntry<'a> {
    state: StateId,
    position: Length,
    trees: &'a [Tree],
    tree_count: usize,
    is_done: bool,
    is_pending: bool,
}

impl StackEntry<'_> {
    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn position(&self) -> Length {
        self.position
    }

    /// Trees crossed so far, most recently pushed first.
    pub fn trees(&self) -> &[Tree] {
        self.trees
    }

    /// Number of non-extra trees crossed so far.
    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    /// Whether the walk reached the root.
    pub fn is_done(&self) -> bool {
        self.is_done
    }

    /// Whether every non-extra link crossed so far was pushed as pending.
    pub fn is_pending(&self) -> bool {
        self.is_pending
    }
}

/// A graph-structured parse stack.
///
/// Version 0 exists from construction and points at the root. Operations
/// taking a version panic if it is out of bounds.
pub struct Stack {
    heads: Vec<NodeRef>,
    root: NodeRef,
}

impl Stack {
    pub fn new() -> Self {
        let root = StackNode::root();
        Self { heads: vec![root.clone()], root }
    }

    pub fn version_count(&self) -> usize {
        self.heads.len()
    }

    pub fn top_state(&self, version: StackVersion) -> StateId {
        self.heads[version].state()
    }

    pub fn top_position(&self, version: StackVersion) -> Length {
        self.heads[version].position()
    }

    /// Advances `version` to a new node in `state`, linked to the previous
    /// head through `tree`.
    pub fn push(&mut self, version: StackVersion, tree: &Tree, pending: bool, state: StateId) {
        self.heads[version] = StackNode::pushed(&self.heads[version], tree, pending, state);
    }

    /// Walks backward from `version`'s head until `count` non-extra trees
    /// have been collected along each path, harvesting one slice per path.
    ///
    /// Each distinct endpoint gets one freshly allocated version; paths that
    /// converge on the same endpoint share it. `version` itself keeps its
    /// head. A path that crosses into an error-state node completes there
    /// and the whole pop reports [`PopStatus::StoppedAtError`]; a path that
    /// bottoms out at the root completes with the trees it collected.
    pub fn pop_count(&mut self, version: StackVersion, count: usize) -> PopResult {
        let mut found_error = false;
        let slices = self.iter(version, |path| {
            if path.tree_count == count {
                IterateAction::Pop
            } else if path.stopped_at_error {
                found_error = true;
                IterateAction::Pop
            } else if !path.node.has_links() {
                IterateAction::Pop
            } else {
                IterateAction::Continue
            }
        });

        let status = if found_error { PopStatus::StoppedAtError } else { PopStatus::Succeeded };
        PopResult { status, slices }
    }

    /// Reverts `version`'s most recent push if it was marked pending: the
    /// revealed node replaces `version`'s head in place. Does nothing for a
    /// non-pending head.
    pub fn pop_pending(&mut self, version: StackVersion) -> PopResult {
        if !self.heads[version].links().first().is_some_and(|link| link.pending) {
            return PopResult { status: PopStatus::Succeeded, slices: Vec::new() };
        }

        let mut result = self.pop_count(version, 1);
        if let Some(first) = result.slices.first() {
            let popped = first.version;
            self.renumber_version(popped, version);
            for slice in &mut result.slices {
                if slice.version == popped {
                    slice.version = version;
                } else if slice.version > popped {
                    slice.version -= 1;
                }
            }
        }
        result
    }

    /// Collapses every pair of versions whose heads share state and
    /// position, splicing the links of one head into the other. Repeats
    /// until no such pair remains.
    pub fn merge(&mut self) {
        while let Some((into, from)) = self.mergeable_pair() {
            for link in self.heads[from].links() {
                StackNode::add_link(&self.heads[into], link);
            }
            self.remove_version(from);
        }
    }

    /// Walks every path from `version`'s head toward the root in link
    /// order, invoking `visitor` at each node. Paths the visitor pops are
    /// harvested exactly as by [`Stack::pop_count`] and returned.
    pub fn iterate<F>(&mut self, version: StackVersion, mut visitor: F) -> Vec<StackSlice>
    where
        F: FnMut(&StackEntry<'_>) -> IterateAction,
    {
        self.iter(version, |path| {
            visitor(&StackEntry {
                state: path.node.state(),
                position: path.node.position(),
                trees: &path.trees,
                tree_count: path.tree_count,
                is_done: !path.node.has_links(),
                is_pending: path.is_pending,
            })
        })
    }

    /// Releases `version` and compacts higher indices downward by one.
    pub fn remove_version(&mut self, version: StackVersion) {
        self.heads.remove(version);
    }

    /// Releases every version and restarts with version 0 at the root.
    pub fn clear(&mut self) {
        self.heads.clear();
        self.heads.push(self.root.clone());
    }

    /// Renders the node graph in Graphviz DOT format.
    pub fn dot(&self) -> DotGraph<'_> {
        DotGraph::new(self)
    }

    pub(crate) fn heads(&self) -> &[NodeRef] {
        &self.heads
    }

    fn add_version(&mut self, node: NodeRef) -> StackVersion {
        self.heads.push(node);
        self.heads.len() - 1
    }

    fn renumber_version(&mut self, from: StackVersion, to: StackVersion) {
        debug_assert!(to < from);
        let head = self.heads.remove(from);
        self.heads[to] = head;
    }

    fn mergeable_pair(&self) -> Option<(StackVersion, StackVersion)> {
        for a in 0..self.heads.len() {
            for b in a + 1..self.heads.len() {
                if self.heads[a].state() == self.heads[b].state()
                    && self.heads[a].position() == self.heads[b].position()
                {
                    return Some((a, b));
                }
            }
        }
        None
    }

    /// Breadth-first walk over path frontiers. Each round visits every live
    /// path once; a path at a node with several links continues through the
    /// first link and forks one new path per remaining link. Forked paths
    /// join the walk on the next round.
    fn iter(
        &mut self,
        version: StackVersion,
        mut callback: impl FnMut(&PathIter) -> IterateAction,
    ) -> Vec<StackSlice> {
        let mut slices = Vec::new();
        let mut paths = vec![PathIter::start(self.heads[version].clone())];

        while !paths.is_empty() {
            let mut len = paths.len();
            let mut i = 0;
            while i < len {
                let action = callback(&paths[i]);
                let links = paths[i].node.links();

                match action {
                    IterateAction::Pop => {
                        let endpoint = paths[i].node.clone();
                        let mut trees = std::mem::take(&mut paths[i].trees);
                        trees.reverse();
                        self.add_slice(&mut slices, endpoint, trees);
                    }
                    IterateAction::Continue if !links.is_empty() => {
                        for link in &links[1..] {
                            paths.push(paths[i].fork(link));
                        }
                        paths[i].descend(&links[0]);
                        i += 1;
                        continue;
                    }
                    _ => {}
                }

                paths.remove(i);
                len -= 1;
            }
        }

        slices
    }

    /// Attaches a slice to the version at `endpoint`, allocating one when no
    /// slice of this walk ends there yet. Slices sharing an endpoint stay
    /// adjacent.
    fn add_slice(&mut self, slices: &mut Vec<StackSlice>, endpoint: NodeRef, trees: Vec<Tree>) {
        for i in (0..slices.len()).rev() {
            let version = slices[i].version;
            if Rc::ptr_eq(&self.heads[version], &endpoint) {
                slices.insert(i + 1, StackSlice { version, trees });
                return;
            }
        }

        let version = self.add_version(endpoint);
        slices.push(StackSlice { version, trees });
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack").field("versions", &self.heads.len()).finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct PathIter {
    node: NodeRef,
    trees: Vec<Tree>,
    tree_count: usize,
    is_pending: bool,
    stopped_at_error: bool,
}

impl PathIter {
    fn start(node: NodeRef) -> Self {
        Self { node, trees: Vec::new(), tree_count: 0, is_pending: true, stopped_at_error: false }
    }

    fn descend(&mut self, link: &Link) {
        self.stopped_at_error =
            link.target.state() == StateId::ERROR && self.node.state() != StateId::ERROR;
        self.node = link.target.clone();
        self.trees.push(link.tree.clone());
        if !link.tree.is_extra() {
            self.tree_count += 1;
            if !link.pending {
                self.is_pending = false;
            }
        }
    }

    fn fork(&self, link: &Link) -> Self {
        let mut fork = self.clone();
        fork.descend(link);
        fork
    }
}
