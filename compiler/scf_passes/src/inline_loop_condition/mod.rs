//! Loop condition inlining (loop rotation).
//!
//! Rewrites every structured loop, whose condition lives in a separate
//! block evaluated before each iteration, into guarded form, where the
//! condition is ordinary code computed twice:
//!
//! ```text
//! %r = loop(%trip, %x0)                 %g = <cond>(%x0)
//!   body(%i, %x):                       %r = loop.guarded(%trip, %g, %x0)
//!     ...                       ==>       body(%i, %x):
//!     -> (%x1)                              ...
//!   cond(%c):                               %k = <cond>(%x1)
//!     <cond>(%c)                            -> (%k, %x1)
//! ```
//!
//! 1. The condition block is cloned with its parameters bound to the
//!    loop's initial carried values and spliced in front of the loop. The
//!    result is the entry guard: when it is false the body never runs, so
//!    zero-trip loops keep their meaning.
//! 2. The condition block is cloned again with its parameters bound to the
//!    carried values the body yields, spliced in front of the body's
//!    terminator, and its result becomes the body's leading output.
//! 3. The condition block is destroyed and the loop is tagged `Guarded`.
//!
//! Counted loops (no condition block) and loops already guarded are left
//! alone, which makes the pass idempotent.
//!
//! Each loop's nested blocks are normalized before the loop itself, so the
//! condition block is rewritten once and then cloned in its final form, and
//! nodes spliced by a rewrite never need another visit.

use smallvec::SmallVec;

use scf_ir::verify::check_node;
use scf_ir::{BlockId, Graph, LoopShape, NodeId, NodeKind, ValueId, ValueMap};

use crate::error::RewriteError;
use crate::options::InlineOptions;
use crate::splice::splice_before;

const BODY_BLOCK: usize = 0;
const CONDITION_BLOCK: usize = 1;

/// Counters reported by a pass run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InlineStats {
    /// Structured loops rewritten into guarded form.
    pub loops_rewritten: usize,
    /// Structured loops without a condition block, left as they are.
    pub counted_loops: usize,
    /// Nodes spliced in, nested ones included, over both clones of every
    /// condition.
    pub nodes_spliced: usize,
}

// Public API

/// Normalize every structured loop in `graph` into guarded form.
///
/// # Panics
///
/// Panics if the graph violates an invariant the rewrite depends on. See
/// [`RewriteError`] for the cases.
pub fn inline_loop_conditions(graph: &mut Graph) {
    inline_loop_conditions_with(graph, &InlineOptions::default());
}

/// [`inline_loop_conditions`] with explicit options.
pub fn inline_loop_conditions_with(graph: &mut Graph, options: &InlineOptions) {
    if let Err(err) = try_inline_loop_conditions_with(graph, options) {
        panic!("loop condition inlining failed: {err}");
    }
}

/// Fallible form of [`inline_loop_conditions`].
///
/// Each loop is checked before it is touched, so on error every loop
/// visited earlier is fully rewritten and the offending loop is unchanged.
pub fn try_inline_loop_conditions(graph: &mut Graph) -> Result<InlineStats, RewriteError> {
    try_inline_loop_conditions_with(graph, &InlineOptions::default())
}

/// Fallible form of [`inline_loop_conditions_with`].
pub fn try_inline_loop_conditions_with(
    graph: &mut Graph,
    options: &InlineOptions,
) -> Result<InlineStats, RewriteError> {
    let verify = options.verify.enabled();
    if verify {
        scf_ir::verify(graph).map_err(RewriteError::MalformedInput)?;
    }

    let mut stats = InlineStats::default();
    let top = graph.top_block();
    rewrite_block(graph, top, &mut stats)?;

    if verify {
        scf_ir::verify(graph).map_err(RewriteError::MalformedOutput)?;
    }

    tracing::debug!(
        loops_rewritten = stats.loops_rewritten,
        counted_loops = stats.counted_loops,
        nodes_spliced = stats.nodes_spliced,
        "loop condition inlining complete"
    );
    Ok(stats)
}

// Traversal

fn rewrite_block(
    graph: &mut Graph,
    b: BlockId,
    stats: &mut InlineStats,
) -> Result<(), RewriteError> {
    // Rewrites only insert nodes before the node being visited, so the
    // snapshot still lists every node that needs a visit.
    let nodes: Vec<NodeId> = graph.block_nodes(b).to_vec();
    for n in nodes {
        rewrite_node(graph, n, stats)?;
    }
    Ok(())
}

fn rewrite_node(
    graph: &mut Graph,
    n: NodeId,
    stats: &mut InlineStats,
) -> Result<(), RewriteError> {
    scf_ir::stack::ensure_sufficient_stack(|| {
        let blocks: SmallVec<[BlockId; 2]> = graph.node_blocks(n).iter().copied().collect();
        for b in blocks {
            rewrite_block(graph, b, stats)?;
        }
        if graph.kind(n) == NodeKind::Loop(LoopShape::Structured) {
            rewrite_loop(graph, n, stats)?;
        }
        Ok(())
    })
}

// Loop rewrite

fn rewrite_loop(
    graph: &mut Graph,
    lp: NodeId,
    stats: &mut InlineStats,
) -> Result<(), RewriteError> {
    check_node(graph, lp).map_err(|source| RewriteError::MalformedLoop { node: lp, source })?;

    let Some(&cond) = graph.node_blocks(lp).get(CONDITION_BLOCK) else {
        tracing::trace!(node = lp.raw(), "counted loop, no condition to inline");
        stats.counted_loops += 1;
        return Ok(());
    };
    let body = graph.node_blocks(lp)[BODY_BLOCK];
    let carried_from = LoopShape::Structured.control_inputs();
    let entry: SmallVec<[ValueId; 4]> = graph.inputs(lp)[carried_from..].to_vec().into();
    check_scope(graph, lp, cond, &entry)?;

    tracing::trace!(
        node = lp.raw(),
        carried = entry.len(),
        condition_nodes = graph.block_nodes(cond).len(),
        "inlining loop condition"
    );

    let guard = inline_condition(graph, cond, &entry, lp, stats);
    graph.insert_input(lp, carried_from, guard);

    let next: SmallVec<[ValueId; 4]> = graph.block_outputs(body).iter().copied().collect();
    let body_end = graph.terminator(body);
    let keep_going = inline_condition(graph, cond, &next, body_end, stats);
    graph.insert_block_output(body, 0, keep_going);

    graph.remove_node_block(lp, CONDITION_BLOCK);
    graph.set_loop_shape(lp, LoopShape::Guarded);

    check_node(graph, lp).map_err(|source| RewriteError::BrokenRewrite { node: lp, source })?;
    stats.loops_rewritten += 1;
    Ok(())
}

/// Clone `cond` with its parameters bound to `bindings`, splice the clone
/// in front of `anchor`, and return the condition value.
fn inline_condition(
    graph: &mut Graph,
    cond: BlockId,
    bindings: &[ValueId],
    anchor: NodeId,
    stats: &mut InlineStats,
) -> ValueId {
    let mut map = ValueMap::default();
    for (&param, &value) in graph.params(cond).iter().zip(bindings) {
        map.insert(param, value);
    }
    let donor = graph.clone_block_body(cond, &mut map);
    let keep_going = graph.block_outputs(donor)[0];
    stats.nodes_spliced += count_nodes(graph, donor);

    splice_before(graph, anchor, donor);
    graph.destroy_block(donor);
    keep_going
}

/// Nodes in `b` and in every block nested under it, terminators excluded.
fn count_nodes(graph: &Graph, b: BlockId) -> usize {
    scf_ir::stack::ensure_sufficient_stack(|| {
        graph
            .block_nodes(b)
            .iter()
            .map(|&n| {
                1 + graph
                    .node_blocks(n)
                    .iter()
                    .map(|&nested| count_nodes(graph, nested))
                    .sum::<usize>()
            })
            .sum()
    })
}

/// Check that both clones of `cond` can be bound: every value it uses is
/// defined inside it or is available before the loop, and so are the
/// loop's initial carried values.
///
/// Anything available before the loop is also available at the end of the
/// body, so one check covers both splice points.
fn check_scope(
    graph: &Graph,
    lp: NodeId,
    cond: BlockId,
    entry: &[ValueId],
) -> Result<(), RewriteError> {
    if let Some(&value) = entry.iter().find(|&&v| !graph.dominates(v, lp)) {
        return Err(RewriteError::EntryValueOutOfScope { node: lp, value });
    }
    check_block_scope(graph, lp, cond, cond)
}

fn check_block_scope(
    graph: &Graph,
    lp: NodeId,
    cond: BlockId,
    b: BlockId,
) -> Result<(), RewriteError> {
    scf_ir::stack::ensure_sufficient_stack(|| {
        for &n in graph.block_nodes(b) {
            check_uses(graph, lp, cond, n)?;
            for &nested in graph.node_blocks(n) {
                check_block_scope(graph, lp, cond, nested)?;
            }
        }
        check_uses(graph, lp, cond, graph.terminator(b))
    })
}

fn check_uses(graph: &Graph, lp: NodeId, cond: BlockId, n: NodeId) -> Result<(), RewriteError> {
    for &value in graph.inputs(n) {
        let inside = graph
            .defining_block(value)
            .is_some_and(|def| graph.block_encloses(cond, def));
        if !inside && !graph.dominates(value, lp) {
            return Err(RewriteError::ConditionOutOfScope { node: lp, value });
        }
    }
    Ok(())
}
