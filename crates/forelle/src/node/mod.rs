//! # Potential Parse Nodes
//!
//! Partially specified parse trees with a consumption cursor, hash-consed in
//! a [`NodeArena`].
//!
//! ## Overview
//!
//! A potential parse node describes one hypothesis about the shape of the
//! parse around the current input position. Leaves are grammar symbols that
//! have not been expanded; parents record which rule produced their children.
//! Exactly one cursor marks the consumption frontier: it sits immediately
//! before one of the leaves, or trails past the last leaf once the whole
//! node has been consumed.
//!
//! Nodes are immutable and interned, so structural equality is pointer
//! equality on [`NodeId`] and the memoization tables of the engine can key
//! on ids directly. Every "mutation" below builds a new node and returns its
//! id; only the spine from the root to the touched leaf is rebuilt, the rest
//! is shared.
//!
//! The trailing cursor is canonical: it is only ever recorded on the root,
//! never inside a child, so two nodes that have consumed all their leaves
//! compare equal regardless of how the consumption was reached.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::error::InvariantError;
use crate::grammar::{Grammar, NonTerminal, Rule, RuleId, Symbol};

type RandomState = ahash::RandomState;

/// Identifies an interned node within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The structure of an interned node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeData {
    /// An unexpanded symbol. `cursor` places the cursor immediately before
    /// this leaf.
    Leaf { symbol: Symbol, cursor: bool },
    /// A rule application. `trailing_cursor` places the cursor past the last
    /// leaf; it is only set on root nodes.
    Parent {
        rule: RuleId,
        children: SmallVec<[NodeId; 4]>,
        trailing_cursor: bool,
    },
}

/// Hash-consing arena for potential parse nodes.
///
/// Leaf counts and cursor positions are computed once at interning time and
/// cached, so the cursor operations below never traverse shared subtrees
/// that do not contain the cursor.
pub struct NodeArena {
    nodes: Vec<NodeData>,
    index: HashMap<NodeData, NodeId, RandomState>,
    leaf_counts: Vec<usize>,
    cursor_positions: Vec<Option<usize>>,
}

impl NodeArena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::default(),
            leaf_counts: Vec::new(),
            cursor_positions: Vec::new(),
        }
    }

    fn intern(&mut self, data: NodeData) -> NodeId {
        if let Some(id) = self.index.get(&data) {
            return *id;
        }
        let (leaves, cursor) = match &data {
            NodeData::Leaf { cursor, .. } => (1, cursor.then_some(0)),
            NodeData::Parent {
                children,
                trailing_cursor,
                ..
            } => {
                let mut leaves = 0;
                let mut cursor = None;
                for child in children {
                    if let Some(p) = self.cursor_positions[child.index()] {
                        cursor = Some(leaves + p);
                    }
                    leaves += self.leaf_counts[child.index()];
                }
                if *trailing_cursor {
                    cursor = Some(leaves);
                }
                (leaves, cursor)
            }
        };
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data.clone());
        self.leaf_counts.push(leaves);
        self.cursor_positions.push(cursor);
        self.index.insert(data, id);
        id
    }

    /// Intern a leaf, optionally with the cursor before it.
    pub fn leaf(&mut self, symbol: Symbol, cursor: bool) -> NodeId {
        self.intern(NodeData::Leaf { symbol, cursor })
    }

    /// Intern a rule application over already-interned children.
    pub fn parent(&mut self, rule: RuleId, children: SmallVec<[NodeId; 4]>) -> NodeId {
        self.intern(NodeData::Parent {
            rule,
            children,
            trailing_cursor: false,
        })
    }

    /// A parent whose children are the bare symbol leaves of `rule`, with
    /// the cursor before the first leaf (or trailing, for an empty rule).
    pub fn rule_root(&mut self, id: RuleId, rule: &Rule) -> NodeId {
        let children: SmallVec<[NodeId; 4]> = rule
            .symbols()
            .iter()
            .enumerate()
            .map(|(i, sym)| self.leaf(*sym, i == 0))
            .collect();
        self.intern(NodeData::Parent {
            rule: id,
            children,
            trailing_cursor: rule.is_empty(),
        })
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn leaf_count(&self, id: NodeId) -> usize {
        self.leaf_counts[id.index()]
    }

    /// The leaf index the cursor sits before; equal to the leaf count when
    /// the cursor is trailing. `None` when the node carries no cursor.
    #[must_use]
    pub fn cursor_position(&self, id: NodeId) -> Option<usize> {
        self.cursor_positions[id.index()]
    }

    #[must_use]
    pub fn has_cursor(&self, id: NodeId) -> bool {
        self.cursor_positions[id.index()].is_some()
    }

    /// Whether the cursor has passed every leaf of this node.
    #[must_use]
    pub fn is_fully_consumed(&self, id: NodeId) -> bool {
        self.cursor_positions[id.index()] == Some(self.leaf_counts[id.index()])
    }

    /// The symbol produced by this node as a whole.
    #[must_use]
    pub fn produced(&self, grammar: &Grammar, id: NodeId) -> Symbol {
        match self.get(id) {
            NodeData::Leaf { symbol, .. } => *symbol,
            NodeData::Parent { rule, .. } => {
                Symbol::NonTerminal(grammar.rule(*rule).produced())
            }
        }
    }

    /// The symbol of the leaf at a given index.
    #[must_use]
    pub fn leaf_at(&self, id: NodeId, index: usize) -> Option<Symbol> {
        match self.get(id) {
            NodeData::Leaf { symbol, .. } => (index == 0).then_some(*symbol),
            NodeData::Parent { children, .. } => {
                let mut offset = index;
                for child in children {
                    let count = self.leaf_count(*child);
                    if offset < count {
                        return self.leaf_at(*child, offset);
                    }
                    offset -= count;
                }
                None
            }
        }
    }

    /// The symbols of all leaves from `index` on, in leaf order.
    #[must_use]
    pub fn leaf_symbols_from(&self, id: NodeId, index: usize) -> Vec<Symbol> {
        let mut all = Vec::with_capacity(self.leaf_count(id));
        self.collect_leaves(id, &mut all);
        all.split_off(index.min(all.len()))
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<Symbol>) {
        match self.get(id) {
            NodeData::Leaf { symbol, .. } => out.push(*symbol),
            NodeData::Parent { children, .. } => {
                for child in children {
                    self.collect_leaves(*child, out);
                }
            }
        }
    }

    /// The symbol of the leaf under the cursor.
    ///
    /// # Errors
    ///
    /// Fails when the node has no cursor or the cursor is trailing.
    pub fn symbol_at_cursor(&self, id: NodeId) -> Result<Symbol, InvariantError> {
        let pos = self.cursor_position(id).ok_or(InvariantError::NoCursor)?;
        self.leaf_at(id, pos).ok_or(InvariantError::NoLeafAtCursor)
    }

    /// A copy of this node without any cursor.
    pub fn without_cursor(&mut self, id: NodeId) -> NodeId {
        if self.cursor_position(id).is_none() {
            return id;
        }
        match self.get(id).clone() {
            NodeData::Leaf { symbol, .. } => self.leaf(symbol, false),
            NodeData::Parent { rule, children, .. } => {
                let children = children
                    .into_iter()
                    .map(|child| self.without_cursor(child))
                    .collect();
                self.intern(NodeData::Parent {
                    rule,
                    children,
                    trailing_cursor: false,
                })
            }
        }
    }

    /// A copy of this node with the cursor placed before leaf `index`, or
    /// trailing when `index` equals the leaf count.
    ///
    /// # Errors
    ///
    /// Fails when `index` exceeds the leaf count, or a trailing cursor is
    /// requested on a bare leaf root.
    pub fn with_cursor(&mut self, id: NodeId, index: usize) -> Result<NodeId, InvariantError> {
        let leaves = self.leaf_count(id);
        if index > leaves {
            return Err(InvariantError::CursorOutOfRange { index, leaves });
        }
        let bare = self.without_cursor(id);
        if index == leaves {
            return match self.get(bare).clone() {
                NodeData::Parent { rule, children, .. } => Ok(self.intern(NodeData::Parent {
                    rule,
                    children,
                    trailing_cursor: true,
                })),
                NodeData::Leaf { .. } => Err(InvariantError::CorruptState(
                    "trailing cursor on a bare leaf".to_string(),
                )),
            };
        }
        Ok(self.place_cursor(bare, index))
    }

    fn place_cursor(&mut self, id: NodeId, index: usize) -> NodeId {
        match self.get(id).clone() {
            NodeData::Leaf { symbol, .. } => self.leaf(symbol, true),
            NodeData::Parent {
                rule, mut children, ..
            } => {
                let mut offset = index;
                for slot in children.iter_mut() {
                    let count = self.leaf_count(*slot);
                    if offset < count {
                        *slot = self.place_cursor(*slot, offset);
                        break;
                    }
                    offset -= count;
                }
                self.intern(NodeData::Parent {
                    rule,
                    children,
                    trailing_cursor: false,
                })
            }
        }
    }

    /// A copy of this node with the cursor moved past its current leaf.
    ///
    /// # Errors
    ///
    /// Fails when the node has no cursor or the cursor is already trailing.
    pub fn advance_cursor(&mut self, id: NodeId) -> Result<NodeId, InvariantError> {
        let pos = self.cursor_position(id).ok_or(InvariantError::NoCursor)?;
        if pos >= self.leaf_count(id) {
            return Err(InvariantError::CursorAlreadyTrailing);
        }
        self.with_cursor(id, pos + 1)
    }

    /// Expand the non-terminal leaf under the cursor with one of its rules.
    /// The cursor lands before the first leaf contributed by the expansion,
    /// or on whatever follows when the rule is empty.
    ///
    /// # Errors
    ///
    /// Fails when there is no cursor leaf, or the leaf does not match the
    /// rule's produced non-terminal.
    pub fn expand_cursor_leaf(
        &mut self,
        id: NodeId,
        rule_id: RuleId,
        rule: &Rule,
    ) -> Result<NodeId, InvariantError> {
        let pos = self.cursor_position(id).ok_or(InvariantError::NoCursor)?;
        let leaf = self.leaf_at(id, pos).ok_or(InvariantError::NoLeafAtCursor)?;
        if leaf != Symbol::NonTerminal(rule.produced()) {
            return Err(InvariantError::CorruptState(format!(
                "expansion rule does not produce the cursor leaf (leaf count {})",
                self.leaf_count(id)
            )));
        }
        let symbols: Vec<Symbol> = rule.symbols().to_vec();
        let children: SmallVec<[NodeId; 4]> = symbols
            .into_iter()
            .map(|sym| self.leaf(sym, false))
            .collect();
        let expansion = self.intern(NodeData::Parent {
            rule: rule_id,
            children,
            trailing_cursor: false,
        });
        let replaced = self.replace_leaf(id, pos, expansion);
        self.with_cursor(replaced, pos)
    }

    fn replace_leaf(&mut self, id: NodeId, index: usize, replacement: NodeId) -> NodeId {
        match self.get(id).clone() {
            NodeData::Leaf { .. } => replacement,
            NodeData::Parent {
                rule, mut children, ..
            } => {
                let mut offset = index;
                for slot in children.iter_mut() {
                    let count = self.leaf_count(*slot);
                    if offset < count {
                        *slot = self.replace_leaf(*slot, offset, replacement);
                        break;
                    }
                    offset -= count;
                }
                self.intern(NodeData::Parent {
                    rule,
                    children,
                    trailing_cursor: false,
                })
            }
        }
    }

    /// The chain of nodes from the root down to the cursor leaf, inclusive.
    /// Empty when the cursor is trailing or absent.
    #[must_use]
    pub fn cursor_spine(&self, id: NodeId) -> Vec<NodeId> {
        let mut spine = Vec::new();
        let mut current = id;
        loop {
            let Some(pos) = self.cursor_position(current) else {
                return Vec::new();
            };
            if pos >= self.leaf_count(current) {
                return Vec::new();
            }
            spine.push(current);
            match self.get(current) {
                NodeData::Leaf { .. } => return spine,
                NodeData::Parent { children, .. } => {
                    let next = children
                        .iter()
                        .find(|c| self.cursor_positions[c.index()].is_some());
                    match next {
                        Some(c) => current = *c,
                        None => return spine,
                    }
                }
            }
        }
    }

    /// The rules applied along the cursor spine, outermost first.
    #[must_use]
    pub fn spine_rules(&self, id: NodeId) -> Vec<RuleId> {
        self.cursor_spine(id)
            .iter()
            .filter_map(|n| match self.get(*n) {
                NodeData::Parent { rule, .. } => Some(*rule),
                NodeData::Leaf { .. } => None,
            })
            .collect()
    }

    /// Replace the spine ancestor at `depth` (0 is the root) with a bare
    /// leaf for `produced` and move the cursor past that leaf. This is how
    /// the outer context resumes after a recursive subtree has been split
    /// off to be parsed on its own.
    ///
    /// # Errors
    ///
    /// Fails when `depth` does not name a proper spine ancestor.
    pub fn collapse_spine_ancestor(
        &mut self,
        id: NodeId,
        depth: usize,
        produced: NonTerminal,
    ) -> Result<NodeId, InvariantError> {
        if depth == 0 {
            return Err(InvariantError::CorruptState(
                "cannot collapse the root of a node".to_string(),
            ));
        }
        let spine = self.cursor_spine(id);
        let Some(target) = spine.get(depth).copied() else {
            return Err(InvariantError::CorruptState(format!(
                "spine depth {depth} exceeds spine length {}",
                spine.len()
            )));
        };
        // Leaves strictly before the target subtree.
        let pos = self.cursor_position(id).ok_or(InvariantError::NoCursor)?;
        let inner = self
            .cursor_position(target)
            .ok_or(InvariantError::NoCursor)?;
        let offset = pos - inner;
        let path = self.cursor_child_path(id);
        let replacement = self.leaf(Symbol::NonTerminal(produced), false);
        let replaced = self.replace_at_path(id, &path[..depth], replacement);
        let bare = self.without_cursor(replaced);
        self.with_cursor(bare, offset + 1)
    }

    /// The child index taken at each spine parent on the way to the cursor
    /// leaf. One entry per `Parent` on the spine.
    fn cursor_child_path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let NodeData::Parent { children, .. } = self.get(current) {
            let next = children
                .iter()
                .position(|c| self.cursor_positions[c.index()].is_some());
            let Some(i) = next else { break };
            path.push(i);
            current = children[i];
        }
        path
    }

    fn replace_at_path(&mut self, id: NodeId, path: &[usize], replacement: NodeId) -> NodeId {
        let Some((head, rest)) = path.split_first() else {
            return replacement;
        };
        match self.get(id).clone() {
            NodeData::Leaf { .. } => replacement,
            NodeData::Parent {
                rule, mut children, ..
            } => {
                children[*head] = self.replace_at_path(children[*head], rest, replacement);
                self.intern(NodeData::Parent {
                    rule,
                    children,
                    trailing_cursor: false,
                })
            }
        }
    }

    /// Whether `outcome` is a refinement of `hypothesis`: the hypothesis,
    /// with zero or more of its leaves expanded further. Cursors are ignored,
    /// only the derivation shape matters.
    #[must_use]
    pub fn derives_from(&self, grammar: &Grammar, outcome: NodeId, hypothesis: NodeId) -> bool {
        match (self.get(outcome), self.get(hypothesis)) {
            (_, NodeData::Leaf { symbol, .. }) => self.produced(grammar, outcome) == *symbol,
            (NodeData::Leaf { .. }, NodeData::Parent { .. }) => false,
            (
                NodeData::Parent {
                    rule: out_rule,
                    children: out_children,
                    ..
                },
                NodeData::Parent {
                    rule: hyp_rule,
                    children: hyp_children,
                    ..
                },
            ) => {
                out_rule == hyp_rule
                    && out_children.len() == hyp_children.len()
                    && out_children
                        .iter()
                        .zip(hyp_children.iter())
                        .all(|(o, h)| self.derives_from(grammar, *o, *h))
            }
        }
    }

    /// Render a node as text, showing the cursor as an inline `.`.
    #[must_use]
    pub fn render(&self, grammar: &Grammar, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(grammar, id, &mut out);
        out
    }

    fn render_into(&self, grammar: &Grammar, id: NodeId, out: &mut String) {
        match self.get(id) {
            NodeData::Leaf { symbol, cursor } => {
                if *cursor {
                    out.push_str(". ");
                }
                out.push_str(grammar.render_symbol(*symbol));
            }
            NodeData::Parent {
                rule,
                children,
                trailing_cursor,
            } => {
                out.push_str(grammar.render_symbol(Symbol::NonTerminal(
                    grammar.rule(*rule).produced(),
                )));
                out.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.render_into(grammar, *child, out);
                }
                if *trailing_cursor {
                    if !children.is_empty() {
                        out.push(' ');
                    }
                    out.push('.');
                }
                out.push(')');
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeArena")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
