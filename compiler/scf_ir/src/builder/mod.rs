//! Positional graph builder.
//!
//! A [`Builder`] appends nodes at the end of one block. Control flow
//! helpers open nested blocks and hand the caller a builder positioned in
//! each of them, so a front-end can emit a whole loop nest with closures
//! that mirror the source structure:
//!
//! ```
//! use scf_ir::{Builder, Graph, PrimOp};
//!
//! let mut graph = Graph::new();
//! let mut b = Builder::new(&mut graph);
//! let zero = b.int(0);
//! let trip = b.max_trip_count();
//! let lp = b.while_loop(
//!     trip,
//!     &[zero],
//!     |b, carried| {
//!         let three = b.int(3);
//!         b.prim(PrimOp::Lt, &[carried[0], three])
//!     },
//!     |b, _iter, carried| {
//!         let one = b.int(1);
//!         vec![b.prim(PrimOp::Add, &[carried[0], one])]
//!     },
//! );
//! let result = b.graph().output(lp);
//! b.ret(&[result]);
//! ```

use smallvec::SmallVec;

use crate::graph::Graph;
use crate::ids::{BlockId, NodeId, ValueId};
use crate::kind::{Literal, LoopShape, NodeKind, PrimOp, Ty};

/// Appends nodes at the end of a block.
pub struct Builder<'g> {
    graph: &'g mut Graph,
    block: BlockId,
}

impl<'g> Builder<'g> {
    /// Builder for the end of the graph's top block.
    pub fn new(graph: &'g mut Graph) -> Self {
        let block = graph.top_block();
        Builder { graph, block }
    }

    /// Builder for the end of `block`.
    pub fn at_end(graph: &'g mut Graph, block: BlockId) -> Self {
        Builder { graph, block }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// The block being appended to.
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Create a node and append it.
    pub fn insert(&mut self, kind: NodeKind, inputs: &[ValueId], output_tys: &[Ty]) -> NodeId {
        let n = self.graph.create_node(kind, inputs, output_tys);
        self.graph.append_node(self.block, n);
        n
    }

    pub fn constant(&mut self, lit: Literal) -> ValueId {
        let n = self.insert(NodeKind::Constant(lit), &[], &[lit.ty()]);
        self.graph.output(n)
    }

    pub fn int(&mut self, value: i64) -> ValueId {
        self.constant(Literal::Int(value))
    }

    pub fn bool(&mut self, value: bool) -> ValueId {
        self.constant(Literal::Bool(value))
    }

    /// Trip count for loops bounded only by their condition.
    pub fn max_trip_count(&mut self) -> ValueId {
        self.int(i64::MAX)
    }

    /// Emit a primitive operation. The result type follows the first
    /// operand.
    pub fn prim(&mut self, op: PrimOp, args: &[ValueId]) -> ValueId {
        debug_assert_eq!(args.len(), op.arity(), "{op:?} arity");
        let ty = op.result_ty(self.graph.value_ty(args[0]));
        let n = self.insert(NodeKind::Prim(op), args, &[ty]);
        self.graph.output(n)
    }

    /// Append `values` to the current block's outputs.
    pub fn ret(&mut self, values: &[ValueId]) {
        for &v in values {
            self.graph.push_block_output(self.block, v);
        }
    }

    /// Run `f` with a builder positioned at the end of `block`.
    fn nested<R>(&mut self, block: BlockId, f: impl FnOnce(&mut Builder<'_>) -> R) -> R {
        let mut inner = Builder {
            graph: &mut *self.graph,
            block,
        };
        f(&mut inner)
    }

    /// Emit an `If` producing values of `output_tys`. Each branch closure
    /// returns that branch's outputs.
    pub fn if_else(
        &mut self,
        cond: ValueId,
        output_tys: &[Ty],
        then_branch: impl FnOnce(&mut Builder<'_>) -> Vec<ValueId>,
        else_branch: impl FnOnce(&mut Builder<'_>) -> Vec<ValueId>,
    ) -> NodeId {
        let n = self.insert(NodeKind::If, &[cond], output_tys);
        let then_block = self.graph.add_block_to_node(n);
        let else_block = self.graph.add_block_to_node(n);
        let then_outs = self.nested(then_block, then_branch);
        self.nested(then_block, |b| b.ret(&then_outs));
        let else_outs = self.nested(else_block, else_branch);
        self.nested(else_block, |b| b.ret(&else_outs));
        n
    }

    /// Emit a structured loop with a condition block. `cond` receives the
    /// condition block's carried parameters and returns the boolean;
    /// `body` receives the iteration counter and the carried parameters
    /// and returns the next carried values.
    pub fn while_loop(
        &mut self,
        trip_count: ValueId,
        inits: &[ValueId],
        cond: impl FnOnce(&mut Builder<'_>, &[ValueId]) -> ValueId,
        body: impl FnOnce(&mut Builder<'_>, ValueId, &[ValueId]) -> Vec<ValueId>,
    ) -> NodeId {
        let n = self.counted_loop(trip_count, inits, body);
        let cond_block = self.graph.add_block_to_node(n);
        let params: SmallVec<[ValueId; 4]> = inits
            .iter()
            .map(|&v| {
                let ty = self.graph.value_ty(v);
                self.graph.add_block_param(cond_block, ty)
            })
            .collect();
        let keep_going = self.nested(cond_block, |b| cond(b, &params));
        self.nested(cond_block, |b| b.ret(&[keep_going]));
        n
    }

    /// Emit a structured loop without a condition: it runs `trip_count`
    /// times.
    pub fn counted_loop(
        &mut self,
        trip_count: ValueId,
        inits: &[ValueId],
        body: impl FnOnce(&mut Builder<'_>, ValueId, &[ValueId]) -> Vec<ValueId>,
    ) -> NodeId {
        let mut inputs: SmallVec<[ValueId; 4]> = SmallVec::new();
        inputs.push(trip_count);
        inputs.extend_from_slice(inits);
        let n = self.emit_loop(LoopShape::Structured, &inputs, inits);
        let (body_block, iter, carried) = self.body_block(n, inits);
        let next = self.nested(body_block, |b| body(b, iter, &carried));
        self.nested(body_block, |b| b.ret(&next));
        n
    }

    /// Emit a loop already in guarded shape. `body` returns the next
    /// continue condition and the next carried values.
    pub fn guarded_loop(
        &mut self,
        trip_count: ValueId,
        guard: ValueId,
        inits: &[ValueId],
        body: impl FnOnce(&mut Builder<'_>, ValueId, &[ValueId]) -> (ValueId, Vec<ValueId>),
    ) -> NodeId {
        let mut inputs: SmallVec<[ValueId; 4]> = SmallVec::new();
        inputs.push(trip_count);
        inputs.push(guard);
        inputs.extend_from_slice(inits);
        let n = self.emit_loop(LoopShape::Guarded, &inputs, inits);
        let (body_block, iter, carried) = self.body_block(n, inits);
        let (keep_going, next) = self.nested(body_block, |b| body(b, iter, &carried));
        self.nested(body_block, |b| {
            b.ret(&[keep_going]);
            b.ret(&next);
        });
        n
    }

    fn emit_loop(&mut self, shape: LoopShape, inputs: &[ValueId], inits: &[ValueId]) -> NodeId {
        let tys: SmallVec<[Ty; 4]> = inits.iter().map(|&v| self.graph.value_ty(v)).collect();
        self.insert(NodeKind::Loop(shape), inputs, &tys)
    }

    fn body_block(
        &mut self,
        n: NodeId,
        inits: &[ValueId],
    ) -> (BlockId, ValueId, SmallVec<[ValueId; 4]>) {
        let body = self.graph.add_block_to_node(n);
        let iter = self.graph.add_block_param(body, Ty::Int);
        let carried = inits
            .iter()
            .map(|&v| {
                let ty = self.graph.value_ty(v);
                self.graph.add_block_param(body, ty)
            })
            .collect();
        (body, iter, carried)
    }
}
