//! Subgraph cloning.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::Graph;
use crate::ids::{BlockId, NodeId, ValueId};
use crate::kind::Ty;

/// Substitution from source values to the values that replace them.
pub type ValueMap = FxHashMap<ValueId, ValueId>;

fn lookup(map: &ValueMap, v: ValueId) -> ValueId {
    map.get(&v).copied().unwrap_or(v)
}

impl Graph {
    /// Clone the nodes of `src` into a fresh detached block.
    ///
    /// Inputs are rewritten through `bindings`; values missing from the map
    /// are referenced as-is, so the clone shares free values with the
    /// source. Pre-seed `bindings` with `src`'s parameters to give them
    /// concrete values, since the clone has no parameters of its own.
    /// Nested blocks are cloned with fresh parameters. Clone order equals
    /// source order.
    ///
    /// On return `bindings` also maps every value defined inside `src` to
    /// its clone, and the new block's outputs are the mapped outputs of
    /// `src`.
    pub fn clone_block_body(&mut self, src: BlockId, bindings: &mut ValueMap) -> BlockId {
        let dst = self.create_detached_block();
        self.clone_nodes_into(src, dst, bindings);
        let outputs: SmallVec<[ValueId; 4]> = self
            .block_outputs(src)
            .iter()
            .map(|&v| lookup(bindings, v))
            .collect();
        for v in outputs {
            self.push_block_output(dst, v);
        }
        dst
    }

    fn clone_nodes_into(&mut self, src: BlockId, dst: BlockId, map: &mut ValueMap) {
        let nodes: Vec<NodeId> = self.block_nodes(src).to_vec();
        for n in nodes {
            let copy = self.clone_node(n, map);
            self.append_node(dst, copy);
        }
    }

    fn clone_node(&mut self, n: NodeId, map: &mut ValueMap) -> NodeId {
        crate::stack::ensure_sufficient_stack(|| {
            let inputs: SmallVec<[ValueId; 4]> =
                self.inputs(n).iter().map(|&v| lookup(map, v)).collect();
            let output_tys: SmallVec<[Ty; 1]> =
                self.outputs(n).iter().map(|&v| self.value_ty(v)).collect();
            let copy = self.create_node(self.kind(n), &inputs, &output_tys);

            for (&old, &new) in self.outputs(n).iter().zip(self.outputs(copy)) {
                map.insert(old, new);
            }

            let blocks: SmallVec<[BlockId; 2]> = self.node_blocks(n).iter().copied().collect();
            for src in blocks {
                let dst = self.add_block_to_node(copy);
                let params: SmallVec<[ValueId; 4]> = self.params(src).iter().copied().collect();
                for p in params {
                    let fresh = self.add_block_param(dst, self.value_ty(p));
                    map.insert(p, fresh);
                }
                self.clone_nodes_into(src, dst, map);
                let outputs: SmallVec<[ValueId; 4]> = self
                    .block_outputs(src)
                    .iter()
                    .map(|&v| lookup(map, v))
                    .collect();
                for v in outputs {
                    self.push_block_output(dst, v);
                }
            }
            copy
        })
    }
}
