//! Block splicing: move a donor block's nodes in front of an anchor.
//!
//! Passes that synthesize code build it in a detached donor block (usually
//! with [`Graph::clone_block_body`]) and then splice it into place. The
//! move is an ownership transfer, not a copy: spliced nodes keep their
//! output values, so anything that already refers to them (the donor's
//! output list, a binding map) stays valid.

use scf_ir::{BlockId, BlockOwner, Graph, NodeId};

/// Move every node of `donor`, in order, to immediately before `anchor`.
///
/// `anchor` may be any placed node, including a block terminator (which
/// splices at the end of that block). `donor` must be detached. Afterwards
/// `donor` has no nodes but keeps its parameters and outputs; destroying
/// it is the caller's job.
///
/// Every value used by the donor's nodes must be defined inside the donor
/// (by an earlier node) or dominate `anchor`. Debug builds check this after
/// each move.
///
/// # Panics
///
/// Panics if `anchor` is destroyed or floating, if `donor` is attached, or
/// if `anchor` lives in `donor` itself.
pub fn splice_before(graph: &mut Graph, anchor: NodeId, donor: BlockId) {
    assert!(graph.is_node_live(anchor), "splice anchor {anchor} is not live");
    let Some((target, _)) = graph.node_position(anchor) else {
        panic!("splice anchor {anchor} is not placed in a block");
    };
    assert_eq!(
        graph.block_owner(donor),
        BlockOwner::Detached,
        "splice donor {donor} is still attached"
    );
    assert_ne!(target, donor, "cannot splice {donor} into itself");

    let nodes = graph.block_nodes(donor).to_vec();
    for &n in &nodes {
        graph.move_before(n, anchor);
        #[cfg(debug_assertions)]
        check_dominance(graph, n);
    }

    tracing::trace!(
        donor = donor.raw(),
        anchor = anchor.raw(),
        target = target.raw(),
        moved = nodes.len(),
        "spliced donor block"
    );
}

/// Assert that every input of `n`, and of everything nested in it, is
/// available where it is used.
#[cfg(debug_assertions)]
fn check_dominance(graph: &Graph, n: NodeId) {
    scf_ir::stack::ensure_sufficient_stack(|| {
        for &v in graph.inputs(n) {
            assert!(
                graph.dominates(v, n),
                "spliced {n} uses {v}, which does not dominate the splice point"
            );
        }
        for &b in graph.node_blocks(n) {
            for &inner in graph.block_nodes(b) {
                check_dominance(graph, inner);
            }
            check_dominance(graph, graph.terminator(b));
        }
    });
}
