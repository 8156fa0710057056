//! Shared test utilities: a reference interpreter and graph fixtures.
//!
//! The interpreter gives every structural rewrite an executable oracle:
//! a pass is correct when the graph computes the same results, and runs
//! loop bodies the same number of times, before and after.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use rustc_hash::FxHashMap;

use scf_ir::{BlockId, Builder, Graph, Literal, LoopShape, NodeId, NodeKind, PrimOp, ValueId};

/// A runtime value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Val {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Val {
    fn int(self) -> i64 {
        match self {
            Val::Int(v) => v,
            other => panic!("expected int, found {other:?}"),
        }
    }

    fn bool(self) -> bool {
        match self {
            Val::Bool(v) => v,
            other => panic!("expected bool, found {other:?}"),
        }
    }
}

/// What running a graph produced.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Outcome {
    /// The top block's outputs.
    pub results: Vec<Val>,
    /// Loop body executions, over every loop in the graph.
    pub body_runs: usize,
}

/// Run `graph` with `args` bound to the top block's parameters.
pub(crate) fn run(graph: &Graph, args: &[Val]) -> Outcome {
    let mut interp = Interp {
        graph,
        env: FxHashMap::default(),
        body_runs: 0,
    };
    let results = interp.block(graph.top_block(), args);
    Outcome {
        results,
        body_runs: interp.body_runs,
    }
}

struct Interp<'g> {
    graph: &'g Graph,
    env: FxHashMap<ValueId, Val>,
    body_runs: usize,
}

impl Interp<'_> {
    fn get(&self, v: ValueId) -> Val {
        *self
            .env
            .get(&v)
            .unwrap_or_else(|| panic!("{v} read before it was computed"))
    }

    fn block(&mut self, b: BlockId, args: &[Val]) -> Vec<Val> {
        let graph = self.graph;
        let params = graph.params(b);
        assert_eq!(params.len(), args.len(), "{b} argument count");
        for (&p, &a) in params.iter().zip(args) {
            self.env.insert(p, a);
        }
        for &n in graph.block_nodes(b) {
            self.node(n);
        }
        graph
            .block_outputs(b)
            .iter()
            .map(|&v| self.get(v))
            .collect()
    }

    fn node(&mut self, n: NodeId) {
        let graph = self.graph;
        let args: Vec<Val> = graph.inputs(n).iter().map(|&v| self.get(v)).collect();
        let results = match graph.kind(n) {
            NodeKind::Constant(lit) => vec![literal(lit)],
            NodeKind::Prim(op) => vec![prim(op, &args)],
            NodeKind::If => {
                let branch = if args[0].bool() { 0 } else { 1 };
                self.block(graph.node_blocks(n)[branch], &[])
            }
            NodeKind::Loop(LoopShape::Structured) => self.structured_loop(n, &args),
            NodeKind::Loop(LoopShape::Guarded) => self.guarded_loop(n, &args),
            NodeKind::Return => unreachable!("terminators are not listed in block nodes"),
        };
        for (&out, val) in graph.outputs(n).iter().zip(results) {
            self.env.insert(out, val);
        }
    }

    fn structured_loop(&mut self, n: NodeId, args: &[Val]) -> Vec<Val> {
        let blocks = self.graph.node_blocks(n);
        let (body, cond) = (blocks[0], blocks.get(1).copied());
        let trip = args[0].int();
        let mut carried = args[1..].to_vec();
        let mut iter = 0;
        while iter < trip {
            if let Some(cond) = cond {
                if !self.block(cond, &carried)[0].bool() {
                    break;
                }
            }
            carried = self.body(body, iter, &carried);
            iter += 1;
        }
        carried
    }

    fn guarded_loop(&mut self, n: NodeId, args: &[Val]) -> Vec<Val> {
        let body = self.graph.node_blocks(n)[0];
        let trip = args[0].int();
        let mut keep_going = args[1].bool();
        let mut carried = args[2..].to_vec();
        let mut iter = 0;
        while iter < trip && keep_going {
            let outs = self.body(body, iter, &carried);
            keep_going = outs[0].bool();
            carried = outs[1..].to_vec();
            iter += 1;
        }
        carried
    }

    fn body(&mut self, body: BlockId, iter: i64, carried: &[Val]) -> Vec<Val> {
        self.body_runs += 1;
        let mut args = Vec::with_capacity(carried.len() + 1);
        args.push(Val::Int(iter));
        args.extend_from_slice(carried);
        self.block(body, &args)
    }
}

fn literal(lit: Literal) -> Val {
    match lit {
        Literal::Int(v) => Val::Int(v),
        Literal::Float(bits) => Val::Float(f64::from_bits(bits)),
        Literal::Bool(v) => Val::Bool(v),
    }
}

fn prim(op: PrimOp, args: &[Val]) -> Val {
    use std::cmp::Ordering;

    let ordering = || match (args[0], args[1]) {
        (Val::Int(a), Val::Int(b)) => a.cmp(&b),
        (Val::Float(a), Val::Float(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Val::Bool(a), Val::Bool(b)) => a.cmp(&b),
        (a, b) => panic!("mismatched operands {a:?}, {b:?}"),
    };
    match op {
        PrimOp::Add | PrimOp::Sub | PrimOp::Mul => match (args[0], args[1]) {
            (Val::Int(a), Val::Int(b)) => Val::Int(match op {
                PrimOp::Add => a.wrapping_add(b),
                PrimOp::Sub => a.wrapping_sub(b),
                _ => a.wrapping_mul(b),
            }),
            (Val::Float(a), Val::Float(b)) => Val::Float(match op {
                PrimOp::Add => a + b,
                PrimOp::Sub => a - b,
                _ => a * b,
            }),
            (a, b) => panic!("{op:?} on {a:?}, {b:?}"),
        },
        PrimOp::Neg => match args[0] {
            Val::Int(a) => Val::Int(a.wrapping_neg()),
            Val::Float(a) => Val::Float(-a),
            other => panic!("neg on {other:?}"),
        },
        PrimOp::Lt => Val::Bool(ordering().is_lt()),
        PrimOp::Le => Val::Bool(ordering().is_le()),
        PrimOp::Gt => Val::Bool(ordering().is_gt()),
        PrimOp::Ge => Val::Bool(ordering().is_ge()),
        PrimOp::Eq => Val::Bool(ordering().is_eq()),
        PrimOp::Ne => Val::Bool(ordering().is_ne()),
        PrimOp::And => Val::Bool(args[0].bool() && args[1].bool()),
        PrimOp::Or => Val::Bool(args[0].bool() || args[1].bool()),
        PrimOp::Not => Val::Bool(!args[0].bool()),
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

/// `i = start; while i < limit { i += 1 }; return i`, with no explicit trip
/// count. Returns the graph and the loop node.
pub(crate) fn counter_loop(start: i64, limit: i64) -> (Graph, NodeId) {
    let mut graph = Graph::new();
    let mut b = Builder::new(&mut graph);
    let init = b.int(start);
    let trip = b.max_trip_count();
    let lp = b.while_loop(
        trip,
        &[init],
        |b, carried| {
            let bound = b.int(limit);
            b.prim(PrimOp::Lt, &[carried[0], bound])
        },
        |b, _, carried| {
            let one = b.int(1);
            vec![b.prim(PrimOp::Add, &[carried[0], one])]
        },
    );
    let result = b.graph().output(lp);
    b.ret(&[result]);
    (graph, lp)
}

/// Every loop node in `graph`, in pre-order.
pub(crate) fn loops(graph: &Graph) -> Vec<NodeId> {
    fn walk(graph: &Graph, b: BlockId, out: &mut Vec<NodeId>) {
        for &n in graph.block_nodes(b) {
            if graph.kind(n).is_loop() {
                out.push(n);
            }
            for &nested in graph.node_blocks(n) {
                walk(graph, nested, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(graph, graph.top_block(), &mut out);
    out
}
