//! The graph arena: values, nodes, and blocks.
//!
//! A [`Graph`] owns three arenas. Ownership of *definitions* is explicit:
//! a block owns its nodes (in order) and its parameters, a node owns its
//! output values and nested blocks, and the graph owns the top block. Uses
//! are never ownership: a node's inputs are plain [`ValueId`]s, mirrored by
//! a per-value use list that every mutation keeps in sync.
//!
//! Every block ends with a `Return` terminator node. The terminator's
//! inputs are the block's outputs, and it is the anchor for "insert at the
//! end of this block" (nodes inserted before it land after every other
//! node of the block).
//!
//! Entities are tombstoned on destruction. Accessors on a destroyed entity
//! are a caller bug and debug-panic.

mod clone;
mod dominance;

use smallvec::SmallVec;

use crate::ids::{BlockId, NodeId, ValueId};
use crate::kind::{LoopShape, NodeKind, Ty};

pub use clone::ValueMap;

// ── Arena records ───────────────────────────────────────────────────

/// Where a value is defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueDef {
    /// The `index`-th output of `node`.
    Output { node: NodeId, index: usize },
    /// The `index`-th parameter of `block`.
    Param { block: BlockId, index: usize },
}

/// One use of a value: input slot `index` of `node`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Use {
    pub node: NodeId,
    pub index: usize,
}

/// Who owns a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockOwner {
    /// The graph's top-level block.
    Graph,
    /// A nested block of a node (loop body, condition, `If` branch).
    Node(NodeId),
    /// Not attached to the graph's instruction stream. Donor blocks built
    /// by passes live here until their nodes are spliced out.
    Detached,
}

#[derive(Clone, Debug)]
struct ValueData {
    ty: Ty,
    def: ValueDef,
    uses: Vec<Use>,
    live: bool,
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    inputs: Vec<ValueId>,
    outputs: SmallVec<[ValueId; 1]>,
    blocks: SmallVec<[BlockId; 2]>,
    /// `None` while the node is floating (created but not inserted).
    owner: Option<BlockId>,
    live: bool,
}

#[derive(Clone, Debug)]
struct BlockData {
    params: Vec<ValueId>,
    nodes: Vec<NodeId>,
    terminator: NodeId,
    owner: BlockOwner,
    live: bool,
}

// ── Graph ───────────────────────────────────────────────────────────

/// A structured IR graph: one top-level block and everything nested in it.
#[derive(Clone, Debug)]
pub struct Graph {
    values: Vec<ValueData>,
    nodes: Vec<NodeData>,
    blocks: Vec<BlockData>,
    top: BlockId,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create an empty graph with a top block that returns nothing.
    pub fn new() -> Self {
        let mut graph = Graph {
            values: Vec::new(),
            nodes: Vec::new(),
            blocks: Vec::new(),
            top: BlockId::new(0),
        };
        graph.top = graph.alloc_block(BlockOwner::Graph);
        graph
    }

    /// The top-level block.
    #[inline]
    pub fn top_block(&self) -> BlockId {
        self.top
    }

    // ── Arena access ────────────────────────────────────────────

    fn value(&self, v: ValueId) -> &ValueData {
        let data = &self.values[v.index()];
        debug_assert!(data.live, "{v} used after destruction");
        data
    }

    fn node(&self, n: NodeId) -> &NodeData {
        let data = &self.nodes[n.index()];
        debug_assert!(data.live, "{n} used after destruction");
        data
    }

    fn node_mut(&mut self, n: NodeId) -> &mut NodeData {
        let data = &mut self.nodes[n.index()];
        debug_assert!(data.live, "{n} used after destruction");
        data
    }

    fn block(&self, b: BlockId) -> &BlockData {
        let data = &self.blocks[b.index()];
        debug_assert!(data.live, "{b} used after destruction");
        data
    }

    fn block_mut(&mut self, b: BlockId) -> &mut BlockData {
        let data = &mut self.blocks[b.index()];
        debug_assert!(data.live, "{b} used after destruction");
        data
    }

    // ── Value queries ───────────────────────────────────────────

    /// The type of `v`.
    pub fn value_ty(&self, v: ValueId) -> Ty {
        self.value(v).ty
    }

    /// Where `v` is defined.
    pub fn value_def(&self, v: ValueId) -> ValueDef {
        self.value(v).def
    }

    /// Every use of `v`, in the order the uses were created.
    pub fn uses(&self, v: ValueId) -> &[Use] {
        &self.value(v).uses
    }

    /// Returns `true` if `v` has not been destroyed. Out-of-range IDs are
    /// reported as dead.
    pub fn is_value_live(&self, v: ValueId) -> bool {
        self.values.get(v.index()).is_some_and(|d| d.live)
    }

    /// Every live value, in allocation order.
    pub fn live_values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, d)| d.live)
            .map(|(i, _)| ValueId::from_len(i))
    }

    // ── Node queries ────────────────────────────────────────────

    pub fn kind(&self, n: NodeId) -> NodeKind {
        self.node(n).kind
    }

    pub fn inputs(&self, n: NodeId) -> &[ValueId] {
        &self.node(n).inputs
    }

    pub fn outputs(&self, n: NodeId) -> &[ValueId] {
        &self.node(n).outputs
    }

    /// The only output of a single-result node.
    ///
    /// # Panics
    ///
    /// Panics if `n` does not have exactly one output.
    pub fn output(&self, n: NodeId) -> ValueId {
        match self.node(n).outputs.as_slice() {
            [v] => *v,
            outs => panic!("{n} has {} outputs, expected exactly one", outs.len()),
        }
    }

    /// Nested blocks owned by `n`, in order.
    pub fn node_blocks(&self, n: NodeId) -> &[BlockId] {
        &self.node(n).blocks
    }

    /// The block `n` is placed in, or `None` while it is floating.
    pub fn node_owner(&self, n: NodeId) -> Option<BlockId> {
        self.node(n).owner
    }

    /// Returns `true` if `n` has not been destroyed. Out-of-range IDs are
    /// reported as dead.
    pub fn is_node_live(&self, n: NodeId) -> bool {
        self.nodes.get(n.index()).is_some_and(|d| d.live)
    }

    /// Position of `n` within its owning block. The terminator sits one
    /// past the last ordinary node. `None` while `n` is floating.
    pub fn node_position(&self, n: NodeId) -> Option<(BlockId, usize)> {
        let owner = self.node(n).owner?;
        let block = self.block(owner);
        if block.terminator == n {
            return Some((owner, block.nodes.len()));
        }
        let index = block
            .nodes
            .iter()
            .position(|&m| m == n)
            .unwrap_or_else(|| panic!("{n} claims {owner} as owner but is not in its node list"));
        Some((owner, index))
    }

    /// Number of live nodes, terminators included.
    pub fn live_node_count(&self) -> usize {
        self.nodes.iter().filter(|d| d.live).count()
    }

    // ── Block queries ───────────────────────────────────────────

    pub fn params(&self, b: BlockId) -> &[ValueId] {
        &self.block(b).params
    }

    /// Ordinary nodes of `b` in execution order (terminator excluded).
    pub fn block_nodes(&self, b: BlockId) -> &[NodeId] {
        &self.block(b).nodes
    }

    /// The `Return` node ending `b`.
    pub fn terminator(&self, b: BlockId) -> NodeId {
        self.block(b).terminator
    }

    /// Values `b` produces on exit (the terminator's inputs).
    pub fn block_outputs(&self, b: BlockId) -> &[ValueId] {
        self.inputs(self.block(b).terminator)
    }

    pub fn block_owner(&self, b: BlockId) -> BlockOwner {
        self.block(b).owner
    }

    /// Returns `true` if `b` has not been destroyed. Out-of-range IDs are
    /// reported as dead.
    pub fn is_block_live(&self, b: BlockId) -> bool {
        self.blocks.get(b.index()).is_some_and(|d| d.live)
    }

    // ── Creation ────────────────────────────────────────────────

    fn alloc_value(&mut self, ty: Ty, def: ValueDef) -> ValueId {
        let id = ValueId::from_len(self.values.len());
        self.values.push(ValueData {
            ty,
            def,
            uses: Vec::new(),
            live: true,
        });
        id
    }

    fn alloc_block(&mut self, owner: BlockOwner) -> BlockId {
        let id = BlockId::from_len(self.blocks.len());
        let terminator = NodeId::from_len(self.nodes.len());
        self.nodes.push(NodeData {
            kind: NodeKind::Return,
            inputs: Vec::new(),
            outputs: SmallVec::new(),
            blocks: SmallVec::new(),
            owner: Some(id),
            live: true,
        });
        self.blocks.push(BlockData {
            params: Vec::new(),
            nodes: Vec::new(),
            terminator,
            owner,
            live: true,
        });
        id
    }

    /// Create a floating node. It must be placed with
    /// [`append_node`](Self::append_node) or
    /// [`insert_before`](Self::insert_before) before it is part of the
    /// program.
    pub fn create_node(&mut self, kind: NodeKind, inputs: &[ValueId], output_tys: &[Ty]) -> NodeId {
        debug_assert!(
            !matches!(kind, NodeKind::Return),
            "terminators are created with their block"
        );
        let id = NodeId::from_len(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            inputs: inputs.to_vec(),
            outputs: SmallVec::new(),
            blocks: SmallVec::new(),
            owner: None,
            live: true,
        });
        for (index, &v) in inputs.iter().enumerate() {
            self.add_use(v, id, index);
        }
        for (index, &ty) in output_tys.iter().enumerate() {
            let out = self.alloc_value(ty, ValueDef::Output { node: id, index });
            self.node_mut(id).outputs.push(out);
        }
        id
    }

    /// Create a block owned by `n`, appended after its existing blocks.
    pub fn add_block_to_node(&mut self, n: NodeId) -> BlockId {
        let b = self.alloc_block(BlockOwner::Node(n));
        self.node_mut(n).blocks.push(b);
        b
    }

    /// Create a detached block, owned by the caller until it is spliced
    /// and destroyed.
    pub fn create_detached_block(&mut self) -> BlockId {
        self.alloc_block(BlockOwner::Detached)
    }

    /// Append a parameter of type `ty` to `b`.
    pub fn add_block_param(&mut self, b: BlockId, ty: Ty) -> ValueId {
        let index = self.block(b).params.len();
        let v = self.alloc_value(ty, ValueDef::Param { block: b, index });
        self.block_mut(b).params.push(v);
        v
    }

    // ── Placement ───────────────────────────────────────────────

    /// Place floating node `n` at the end of `b` (before its terminator).
    pub fn append_node(&mut self, b: BlockId, n: NodeId) {
        assert!(
            self.node(n).owner.is_none(),
            "{n} is already placed; use move_before"
        );
        self.block_mut(b).nodes.push(n);
        self.node_mut(n).owner = Some(b);
    }

    /// Place floating node `n` immediately before `anchor`.
    pub fn insert_before(&mut self, n: NodeId, anchor: NodeId) {
        assert!(
            self.node(n).owner.is_none(),
            "{n} is already placed; use move_before"
        );
        let (b, index) = self
            .node_position(anchor)
            .unwrap_or_else(|| panic!("anchor {anchor} is not placed in a block"));
        self.block_mut(b).nodes.insert(index, n);
        self.node_mut(n).owner = Some(b);
    }

    /// Move placed node `n` (never a terminator) to immediately before
    /// `anchor`, possibly in a different block. Output values keep their
    /// identity; only position and owner change.
    pub fn move_before(&mut self, n: NodeId, anchor: NodeId) {
        assert_ne!(n, anchor, "cannot move {n} before itself");
        self.unlink(n);
        self.insert_before(n, anchor);
    }

    /// Detach a placed, non-terminator node from its block.
    fn unlink(&mut self, n: NodeId) {
        let (b, index) = self
            .node_position(n)
            .unwrap_or_else(|| panic!("{n} is floating"));
        assert!(
            self.block(b).terminator != n,
            "{n} is the terminator of {b} and cannot be unlinked"
        );
        self.block_mut(b).nodes.remove(index);
        self.node_mut(n).owner = None;
    }

    // ── Input and output editing ────────────────────────────────

    fn add_use(&mut self, v: ValueId, node: NodeId, index: usize) {
        let data = &mut self.values[v.index()];
        assert!(data.live, "{node} cannot use destroyed value {v}");
        data.uses.push(Use { node, index });
    }

    fn remove_use(&mut self, v: ValueId, node: NodeId, index: usize) {
        let uses = &mut self.values[v.index()].uses;
        let pos = uses
            .iter()
            .position(|u| u.node == node && u.index == index)
            .unwrap_or_else(|| panic!("use list of {v} is missing ({node}, {index})"));
        uses.remove(pos);
    }

    fn shift_use(&mut self, v: ValueId, node: NodeId, from: usize, to: usize) {
        let use_ = self.values[v.index()]
            .uses
            .iter_mut()
            .find(|u| u.node == node && u.index == from)
            .unwrap_or_else(|| panic!("use list of {v} is missing ({node}, {from})"));
        use_.index = to;
    }

    /// Insert `v` as input `index` of `n`, shifting later inputs right.
    pub fn insert_input(&mut self, n: NodeId, index: usize, v: ValueId) {
        let later: SmallVec<[ValueId; 8]> = self.node(n).inputs[index..].iter().copied().collect();
        // Back to front, so a value used in two adjacent slots never has
        // two entries for the same slot.
        for (offset, &w) in later.iter().enumerate().rev() {
            self.shift_use(w, n, index + offset, index + offset + 1);
        }
        self.node_mut(n).inputs.insert(index, v);
        self.add_use(v, n, index);
    }

    /// Append `v` as the last input of `n`.
    pub fn push_input(&mut self, n: NodeId, v: ValueId) {
        let index = self.node(n).inputs.len();
        self.insert_input(n, index, v);
    }

    /// Remove input `index` of `n`, shifting later inputs left. Returns the
    /// removed value.
    pub fn remove_input(&mut self, n: NodeId, index: usize) -> ValueId {
        let removed = self.node(n).inputs[index];
        self.remove_use(removed, n, index);
        let later: SmallVec<[ValueId; 8]> =
            self.node(n).inputs[index + 1..].iter().copied().collect();
        for (offset, &w) in later.iter().enumerate() {
            self.shift_use(w, n, index + offset + 1, index + offset);
        }
        self.node_mut(n).inputs.remove(index);
        removed
    }

    /// Replace input `index` of `n` with `v`.
    pub fn replace_input(&mut self, n: NodeId, index: usize, v: ValueId) {
        let old = self.node(n).inputs[index];
        self.remove_use(old, n, index);
        self.node_mut(n).inputs[index] = v;
        self.add_use(v, n, index);
    }

    /// Redirect every use of `old` to `new`.
    pub fn replace_all_uses_with(&mut self, old: ValueId, new: ValueId) {
        if old == new {
            return;
        }
        let uses = std::mem::take(&mut self.values[old.index()].uses);
        for Use { node, index } in uses {
            self.node_mut(node).inputs[index] = new;
            self.add_use(new, node, index);
        }
    }

    /// Append `v` to the outputs of `b`.
    pub fn push_block_output(&mut self, b: BlockId, v: ValueId) {
        let terminator = self.block(b).terminator;
        self.push_input(terminator, v);
    }

    /// Insert `v` as output `index` of `b`.
    pub fn insert_block_output(&mut self, b: BlockId, index: usize, v: ValueId) {
        let terminator = self.block(b).terminator;
        self.insert_input(terminator, index, v);
    }

    /// Change the shape tag of a `Loop` node. The caller is responsible for
    /// having rearranged inputs and blocks to match the new shape.
    pub fn set_loop_shape(&mut self, n: NodeId, shape: LoopShape) {
        let node = self.node_mut(n);
        assert!(node.kind.is_loop(), "{n} is not a loop");
        node.kind = NodeKind::Loop(shape);
    }

    // ── Destruction ─────────────────────────────────────────────

    /// Destroy node `n`, its nested blocks, and its outputs.
    ///
    /// # Panics
    ///
    /// Panics if any output of `n` still has uses, or if `n` is a block
    /// terminator.
    pub fn destroy_node(&mut self, n: NodeId) {
        if self.node(n).owner.is_some() {
            self.unlink(n);
        }
        self.release_node(n);
    }

    /// Destroy a detached block and everything it still owns.
    ///
    /// # Panics
    ///
    /// Panics if `b` is attached, or if a value defined inside `b` is still
    /// used from outside it.
    pub fn destroy_block(&mut self, b: BlockId) {
        assert_eq!(
            self.block(b).owner,
            BlockOwner::Detached,
            "only detached blocks can be destroyed directly"
        );
        self.release_block(b);
    }

    /// Remove nested block `index` from `n` and destroy it.
    pub fn remove_node_block(&mut self, n: NodeId, index: usize) {
        let b = self.node_mut(n).blocks.remove(index);
        self.release_block(b);
    }

    fn release_node(&mut self, n: NodeId) {
        crate::stack::ensure_sufficient_stack(|| {
            let blocks: SmallVec<[BlockId; 2]> = self.node(n).blocks.clone();
            for b in blocks.into_iter().rev() {
                self.release_block(b);
            }
            self.node_mut(n).blocks.clear();

            let inputs = std::mem::take(&mut self.node_mut(n).inputs);
            for (index, v) in inputs.into_iter().enumerate() {
                self.remove_use(v, n, index);
            }

            let outputs = std::mem::take(&mut self.node_mut(n).outputs);
            for v in outputs {
                self.release_value(v);
            }
            let node = self.node_mut(n);
            node.owner = None;
            node.live = false;
        });
    }

    fn release_block(&mut self, b: BlockId) {
        // Terminator first: it uses values of the block's nodes.
        let terminator = self.block(b).terminator;
        let nodes = std::mem::take(&mut self.block_mut(b).nodes);
        self.release_node(terminator);
        for n in nodes.into_iter().rev() {
            self.node_mut(n).owner = None;
            self.release_node(n);
        }
        let params = std::mem::take(&mut self.block_mut(b).params);
        for v in params {
            self.release_value(v);
        }
        self.block_mut(b).live = false;
    }

    fn release_value(&mut self, v: ValueId) {
        let data = &mut self.values[v.index()];
        assert!(
            data.uses.is_empty(),
            "{v} destroyed while still used by {:?}",
            data.uses
        );
        data.live = false;
    }
}
