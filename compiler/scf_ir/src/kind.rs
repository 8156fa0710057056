//! Node kinds, literal constants, and value types.

use std::fmt;

// ── Types ───────────────────────────────────────────────────────────

/// The type of a value.
///
/// Passes in this workspace are structural: they only ever need to know
/// whether a value is a boolean (conditions) and how many values a loop
/// carries. The numeric types exist so the producer can describe real
/// programs and so the printer has something to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    Float,
    Bool,
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ty::Int => "int",
            Ty::Float => "float",
            Ty::Bool => "bool",
        })
    }
}

// ── Literals ────────────────────────────────────────────────────────

/// A compile-time constant. Floats are stored as bits for `Eq`/`Hash`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i64),
    Float(u64),
    Bool(bool),
}

impl Literal {
    /// Build a float literal from an `f64`.
    pub fn float(value: f64) -> Self {
        Literal::Float(value.to_bits())
    }

    /// The type of the value this literal produces.
    pub fn ty(self) -> Ty {
        match self {
            Literal::Int(_) => Ty::Int,
            Literal::Float(_) => Ty::Float,
            Literal::Bool(_) => Ty::Bool,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

// ── Primitive operations ────────────────────────────────────────────

/// Side-effect-free primitive operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimOp {
    Add,
    Sub,
    Mul,
    Neg,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
}

impl PrimOp {
    /// Number of operands the operation takes.
    pub fn arity(self) -> usize {
        match self {
            PrimOp::Neg | PrimOp::Not => 1,
            _ => 2,
        }
    }

    /// Result type given the type of the first operand.
    pub fn result_ty(self, operand: Ty) -> Ty {
        match self {
            PrimOp::Add | PrimOp::Sub | PrimOp::Mul | PrimOp::Neg => operand,
            PrimOp::Lt
            | PrimOp::Le
            | PrimOp::Gt
            | PrimOp::Ge
            | PrimOp::Eq
            | PrimOp::Ne
            | PrimOp::And
            | PrimOp::Or
            | PrimOp::Not => Ty::Bool,
        }
    }

    /// Mnemonic used by the printer.
    pub fn mnemonic(self) -> &'static str {
        match self {
            PrimOp::Add => "add",
            PrimOp::Sub => "sub",
            PrimOp::Mul => "mul",
            PrimOp::Neg => "neg",
            PrimOp::Lt => "lt",
            PrimOp::Le => "le",
            PrimOp::Gt => "gt",
            PrimOp::Ge => "ge",
            PrimOp::Eq => "eq",
            PrimOp::Ne => "ne",
            PrimOp::And => "and",
            PrimOp::Or => "or",
            PrimOp::Not => "not",
        }
    }
}

// ── Loops ───────────────────────────────────────────────────────────

/// Layout of a `Loop` node's inputs, blocks, and body outputs.
///
/// ```text
/// Structured: inputs [trip, init...]        blocks [body] | [body, cond]
///             body   (iter, carried...) -> (next...)
///             cond   (carried...)       -> (keep_going)
///
/// Guarded:    inputs [trip, guard, init...] blocks [body]
///             body   (iter, carried...) -> (keep_going, next...)
/// ```
///
/// Both shapes produce the final carried values as node outputs. A
/// structured loop without a condition block runs `trip` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopShape {
    /// Condition checked before every iteration by a separate block.
    Structured,
    /// Condition computed explicitly: once before entry, then at the end
    /// of every iteration.
    Guarded,
}

impl LoopShape {
    /// Number of leading non-carried inputs.
    pub fn control_inputs(self) -> usize {
        match self {
            LoopShape::Structured => 1,
            LoopShape::Guarded => 2,
        }
    }

    /// Number of leading non-carried body outputs.
    pub fn control_outputs(self) -> usize {
        match self {
            LoopShape::Structured => 0,
            LoopShape::Guarded => 1,
        }
    }
}

// ── Node kinds ──────────────────────────────────────────────────────

/// What a node does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// No inputs, one output.
    Constant(Literal),
    /// Primitive operation over its inputs, one output.
    Prim(PrimOp),
    /// Two-way conditional: input `[cond]`, blocks `[then, else]`.
    If,
    /// Counted and/or conditioned loop; see [`LoopShape`].
    Loop(LoopShape),
    /// Block terminator. Its inputs are the block's outputs.
    Return,
}

impl NodeKind {
    /// Printer name.
    pub fn mnemonic(self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "const",
            NodeKind::Prim(op) => op.mnemonic(),
            NodeKind::If => "if",
            NodeKind::Loop(LoopShape::Structured) => "loop",
            NodeKind::Loop(LoopShape::Guarded) => "loop.guarded",
            NodeKind::Return => "return",
        }
    }

    /// Returns `true` for `Loop` nodes of either shape.
    pub fn is_loop(self) -> bool {
        matches!(self, NodeKind::Loop(_))
    }
}
