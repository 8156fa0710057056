//! Graph invariant verification.
//!
//! Walks the graph from the top block and checks:
//! - every input and block output is live and dominates its use
//! - node and block owner back-links agree with the containing lists
//! - use lists mirror input slots exactly, in both directions
//! - value definitions point at the slot that holds them
//! - node shapes: operand counts, loop and `If` arities, boolean conditions
//!
//! Passes call [`verify`] at their boundaries; a failure means a pass (or
//! the producer) built a malformed graph, never a user error.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::graph::{BlockOwner, Graph, Use, ValueDef};
use crate::ids::{BlockId, NodeId, ValueId};
use crate::kind::{LoopShape, NodeKind, Ty};

/// A violated graph invariant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("{node} uses destroyed value {value}")]
    DeadValue { node: NodeId, value: ValueId },

    #[error("{node} uses {value}, which does not dominate it")]
    NotDominating { node: NodeId, value: ValueId },

    #[error("{node} is listed in {block} but records owner {owner:?}")]
    NodeOwnerMismatch {
        node: NodeId,
        block: BlockId,
        owner: Option<BlockId>,
    },

    #[error("{block} is nested in {node} but records owner {owner:?}")]
    BlockOwnerMismatch {
        block: BlockId,
        node: NodeId,
        owner: BlockOwner,
    },

    #[error("{node} appears in the body of {block}, but terminators may only end a block")]
    MisplacedTerminator { node: NodeId, block: BlockId },

    #[error("input {index} of {node} is {value}, but its use list disagrees")]
    UseListMismatch {
        node: NodeId,
        index: usize,
        value: ValueId,
    },

    #[error("{value} records definition {def:?}, which holds another value")]
    DefinitionMismatch { value: ValueId, def: ValueDef },

    #[error("{node}: expected {expected} {what}, found {found}")]
    Arity {
        node: NodeId,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{node}: {what} must be {expected}, found {found}")]
    TypeMismatch {
        node: NodeId,
        what: &'static str,
        expected: Ty,
        found: Ty,
    },
}

/// Verify every invariant of `graph`.
pub fn verify(graph: &Graph) -> Result<(), VerifyError> {
    let mut scope = FxHashSet::default();
    verify_block(graph, graph.top_block(), &mut scope)?;
    verify_use_lists(graph)
}

fn verify_block(
    graph: &Graph,
    b: BlockId,
    scope: &mut FxHashSet<ValueId>,
) -> Result<(), VerifyError> {
    crate::stack::ensure_sufficient_stack(|| {
        let mut introduced: Vec<ValueId> = graph.params(b).to_vec();
        scope.extend(graph.params(b).iter().copied());

        let result = verify_block_nodes(graph, b, scope, &mut introduced);

        for v in introduced {
            scope.remove(&v);
        }
        result
    })
}

fn verify_block_nodes(
    graph: &Graph,
    b: BlockId,
    scope: &mut FxHashSet<ValueId>,
    introduced: &mut Vec<ValueId>,
) -> Result<(), VerifyError> {
    for &n in graph.block_nodes(b) {
        if graph.node_owner(n) != Some(b) {
            return Err(VerifyError::NodeOwnerMismatch {
                node: n,
                block: b,
                owner: graph.node_owner(n),
            });
        }
        if graph.kind(n) == NodeKind::Return {
            return Err(VerifyError::MisplacedTerminator { node: n, block: b });
        }
        verify_inputs(graph, n, scope)?;
        check_node(graph, n)?;
        for &nested in graph.node_blocks(n) {
            if graph.block_owner(nested) != BlockOwner::Node(n) {
                return Err(VerifyError::BlockOwnerMismatch {
                    block: nested,
                    node: n,
                    owner: graph.block_owner(nested),
                });
            }
            verify_block(graph, nested, scope)?;
        }
        for &out in graph.outputs(n) {
            scope.insert(out);
            introduced.push(out);
        }
    }

    let terminator = graph.terminator(b);
    if graph.node_owner(terminator) != Some(b) {
        return Err(VerifyError::NodeOwnerMismatch {
            node: terminator,
            block: b,
            owner: graph.node_owner(terminator),
        });
    }
    verify_inputs(graph, terminator, scope)
}

fn verify_inputs(
    graph: &Graph,
    n: NodeId,
    scope: &FxHashSet<ValueId>,
) -> Result<(), VerifyError> {
    for (index, &value) in graph.inputs(n).iter().enumerate() {
        if !graph.is_value_live(value) {
            return Err(VerifyError::DeadValue { node: n, value });
        }
        if !scope.contains(&value) {
            return Err(VerifyError::NotDominating { node: n, value });
        }
        if !graph.uses(value).contains(&Use { node: n, index }) {
            return Err(VerifyError::UseListMismatch {
                node: n,
                index,
                value,
            });
        }
    }
    Ok(())
}

fn verify_use_lists(graph: &Graph) -> Result<(), VerifyError> {
    for value in graph.live_values() {
        for &Use { node, index } in graph.uses(value) {
            let holds = graph.is_node_live(node) && graph.inputs(node).get(index) == Some(&value);
            if !holds {
                return Err(VerifyError::UseListMismatch { node, index, value });
            }
        }
        let def = graph.value_def(value);
        let slot = match def {
            ValueDef::Output { node, index } => graph
                .is_node_live(node)
                .then(|| graph.outputs(node).get(index).copied())
                .flatten(),
            ValueDef::Param { block, index } => graph
                .is_block_live(block)
                .then(|| graph.params(block).get(index).copied())
                .flatten(),
        };
        if slot != Some(value) {
            return Err(VerifyError::DefinitionMismatch { value, def });
        }
    }
    Ok(())
}

// ── Node shapes ─────────────────────────────────────────────────────

fn expect_count(
    node: NodeId,
    what: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), VerifyError> {
    if expected == found {
        Ok(())
    } else {
        Err(VerifyError::Arity {
            node,
            what,
            expected,
            found,
        })
    }
}

fn expect_ty(
    graph: &Graph,
    node: NodeId,
    what: &'static str,
    value: ValueId,
    expected: Ty,
) -> Result<(), VerifyError> {
    let found = graph.value_ty(value);
    if found == expected {
        Ok(())
    } else {
        Err(VerifyError::TypeMismatch {
            node,
            what,
            expected,
            found,
        })
    }
}

/// Check the local shape of one node: operand and result counts, nested
/// block arities, and the types of control operands. Does not look at
/// dominance.
pub fn check_node(graph: &Graph, n: NodeId) -> Result<(), VerifyError> {
    let inputs = graph.inputs(n);
    let outputs = graph.outputs(n);
    let blocks = graph.node_blocks(n);
    match graph.kind(n) {
        NodeKind::Constant(lit) => {
            expect_count(n, "inputs", 0, inputs.len())?;
            expect_count(n, "outputs", 1, outputs.len())?;
            expect_ty(graph, n, "constant result", outputs[0], lit.ty())
        }
        NodeKind::Prim(op) => {
            expect_count(n, "inputs", op.arity(), inputs.len())?;
            expect_count(n, "outputs", 1, outputs.len())?;
            expect_count(n, "blocks", 0, blocks.len())
        }
        NodeKind::If => {
            expect_count(n, "inputs", 1, inputs.len())?;
            expect_ty(graph, n, "if condition", inputs[0], Ty::Bool)?;
            expect_count(n, "blocks", 2, blocks.len())?;
            for &b in blocks {
                expect_count(n, "branch params", 0, graph.params(b).len())?;
                let branch_outputs = graph.block_outputs(b);
                expect_count(n, "branch outputs", outputs.len(), branch_outputs.len())?;
                for (&out, &result) in branch_outputs.iter().zip(outputs) {
                    expect_ty(graph, n, "branch output", out, graph.value_ty(result))?;
                }
            }
            Ok(())
        }
        NodeKind::Loop(shape) => check_loop(graph, n, shape),
        NodeKind::Return => Ok(()),
    }
}

fn check_loop(graph: &Graph, n: NodeId, shape: LoopShape) -> Result<(), VerifyError> {
    let inputs = graph.inputs(n);
    let blocks = graph.node_blocks(n);
    let control = shape.control_inputs();
    if inputs.len() < control {
        return Err(VerifyError::Arity {
            node: n,
            what: "loop control inputs",
            expected: control,
            found: inputs.len(),
        });
    }
    expect_ty(graph, n, "trip count", inputs[0], Ty::Int)?;
    if shape == LoopShape::Guarded {
        expect_ty(graph, n, "entry guard", inputs[1], Ty::Bool)?;
    }
    let inits = &inputs[control..];
    let carried = inits.len();
    let carried_tys: SmallVec<[Ty; 4]> = inits.iter().map(|&v| graph.value_ty(v)).collect();
    let outputs = graph.outputs(n);
    expect_count(n, "outputs", carried, outputs.len())?;
    for (&out, &ty) in outputs.iter().zip(&carried_tys) {
        expect_ty(graph, n, "loop result", out, ty)?;
    }

    let max_blocks = match shape {
        LoopShape::Structured => 2,
        LoopShape::Guarded => 1,
    };
    if blocks.is_empty() || blocks.len() > max_blocks {
        return Err(VerifyError::Arity {
            node: n,
            what: "loop blocks",
            expected: max_blocks,
            found: blocks.len(),
        });
    }

    let body = blocks[0];
    let params = graph.params(body);
    expect_count(n, "body params", 1 + carried, params.len())?;
    expect_ty(graph, n, "iteration counter", params[0], Ty::Int)?;
    for (&param, &ty) in params[1..].iter().zip(&carried_tys) {
        expect_ty(graph, n, "carried body param", param, ty)?;
    }
    let body_outputs = graph.block_outputs(body);
    let lead = shape.control_outputs();
    expect_count(n, "body outputs", lead + carried, body_outputs.len())?;
    if shape == LoopShape::Guarded {
        expect_ty(graph, n, "continue condition", body_outputs[0], Ty::Bool)?;
    }
    for (&next, &ty) in body_outputs[lead..].iter().zip(&carried_tys) {
        expect_ty(graph, n, "carried body output", next, ty)?;
    }

    if let Some(&cond) = blocks.get(1) {
        let cond_params = graph.params(cond);
        expect_count(n, "condition params", carried, cond_params.len())?;
        for (&param, &ty) in cond_params.iter().zip(&carried_tys) {
            expect_ty(graph, n, "condition param", param, ty)?;
        }
        let cond_outputs = graph.block_outputs(cond);
        expect_count(n, "condition outputs", 1, cond_outputs.len())?;
        expect_ty(graph, n, "loop condition", cond_outputs[0], Ty::Bool)?;
    }
    Ok(())
}
