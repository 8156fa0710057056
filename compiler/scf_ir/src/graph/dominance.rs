//! Structured dominance.
//!
//! In a nested-block IR dominance follows the nesting: a value is available
//! at a point if it is a parameter of an enclosing block, or the output of a
//! node that precedes the point in its own block or precedes (in an
//! enclosing block) the node whose nested block contains the point. Nothing
//! defined inside a sibling's nested block is ever visible.

use super::{BlockOwner, Graph, ValueDef};
use crate::ids::{BlockId, NodeId, ValueId};

impl Graph {
    /// Returns `true` if `value` is available immediately before `node`.
    ///
    /// A floating node dominates nothing and is dominated by nothing.
    pub fn dominates(&self, value: ValueId, node: NodeId) -> bool {
        let Some((block, index)) = self.node_position(node) else {
            return false;
        };
        self.available_at(value, block, index)
    }

    /// Returns `true` if `value` is available before position `index` of
    /// `block` (index `block_nodes(block).len()` is the terminator).
    pub fn available_at(&self, value: ValueId, mut block: BlockId, mut index: usize) -> bool {
        let def = self.value_def(value);
        loop {
            match def {
                ValueDef::Param { block: b, .. } if b == block => return true,
                ValueDef::Output { node: def_node, .. }
                    if self.node_owner(def_node) == Some(block) =>
                {
                    // Single definition site: if it is in this block but
                    // not before the point, no enclosing block has it.
                    return self
                        .node_position(def_node)
                        .is_some_and(|(_, def_index)| def_index < index);
                }
                _ => {}
            }
            match self.block_owner(block) {
                BlockOwner::Node(parent) => match self.node_position(parent) {
                    Some((outer, outer_index)) => {
                        block = outer;
                        index = outer_index;
                    }
                    None => return false,
                },
                BlockOwner::Graph | BlockOwner::Detached => return false,
            }
        }
    }

    /// Returns `true` if `inner` is `outer` or is nested (at any depth)
    /// inside a node of `outer`.
    pub fn block_encloses(&self, outer: BlockId, mut inner: BlockId) -> bool {
        loop {
            if inner == outer {
                return true;
            }
            match self.block_owner(inner) {
                BlockOwner::Node(parent) => match self.node_owner(parent) {
                    Some(b) => inner = b,
                    None => return false,
                },
                BlockOwner::Graph | BlockOwner::Detached => return false,
            }
        }
    }

    /// The block in which `value` is defined.
    pub fn defining_block(&self, value: ValueId) -> Option<BlockId> {
        match self.value_def(value) {
            ValueDef::Param { block, .. } => Some(block),
            ValueDef::Output { node, .. } => self.node_owner(node),
        }
    }
}
