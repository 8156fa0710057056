//! Structured control flow IR.
//!
//! This crate provides the data model that structural passes operate on:
//!
//! - **[`Graph`]**: arena owning every value, node, and block of one unit.
//! - **Blocks** ([`BlockId`]): ordered nodes, a parameter list (values bound
//!   on entry), and a terminator whose inputs are the block's outputs.
//! - **Nodes** ([`NodeId`], [`NodeKind`]): constants, primitive operations,
//!   `If`, and `Loop` (in [`LoopShape::Structured`] or
//!   [`LoopShape::Guarded`] form). Control flow nodes own nested blocks.
//! - **Values** ([`ValueId`]): a single definition site plus a use list.
//!
//! # Design
//!
//! Definitions are owned through explicit per-block and per-node vectors;
//! uses are plain IDs and never own anything. All cross references are
//! arena indices, so nodes can move between blocks (see
//! [`Graph::move_before`]) without invalidating the values they define.
//!
//! Around the arena sit the utilities every pass needs: a positional
//! [`Builder`], subgraph cloning ([`Graph::clone_block_body`]), structured
//! dominance ([`Graph::dominates`]), a printer (`Display for Graph`), and
//! the invariant checker [`verify()`].

mod builder;
mod graph;
mod ids;
mod kind;
mod printer;
pub mod stack;
pub mod verify;

pub use builder::Builder;
pub use graph::{BlockOwner, Graph, Use, ValueDef, ValueMap};
pub use ids::{BlockId, NodeId, ValueId};
pub use kind::{Literal, LoopShape, NodeKind, PrimOp, Ty};
pub use printer::BlockDisplay;
pub use verify::{verify, VerifyError};
