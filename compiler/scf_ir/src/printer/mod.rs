//! Textual dump of a graph.
//!
//! ```text
//! graph():
//!   %0 : int = const[0]()
//!   %1 : int = const[9223372036854775807]()
//!   %2 : int = loop(%1, %0)
//!     block1(%3 : int, %4 : int):
//!       %5 : int = const[1]()
//!       %6 : int = add(%4, %5)
//!       -> (%6)
//!     block2(%7 : int):
//!       %8 : int = const[3]()
//!       %9 : bool = lt(%7, %8)
//!       -> (%9)
//!   -> (%2)
//! ```
//!
//! Intended for debugging, test expectations, and trace logs. There is no
//! parser for this format.

use std::fmt::{self, Write};

use crate::graph::Graph;
use crate::ids::{BlockId, NodeId, ValueId};
use crate::kind::NodeKind;

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let top = self.top_block();
        f.write_str("graph(")?;
        write_params(self, f, self.params(top))?;
        f.write_str("):\n")?;
        write_block_body(self, f, top, 1)
    }
}

/// Displays one block (with its header) at the top indentation level.
pub struct BlockDisplay<'g> {
    graph: &'g Graph,
    block: BlockId,
}

impl fmt::Display for BlockDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(self.graph, f, self.block, 0)
    }
}

impl Graph {
    /// Display a single block, e.g. a detached donor block in a trace.
    pub fn display_block(&self, block: BlockId) -> BlockDisplay<'_> {
        BlockDisplay { graph: self, block }
    }
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

fn write_params(graph: &Graph, f: &mut fmt::Formatter<'_>, params: &[ValueId]) -> fmt::Result {
    for (i, &p) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{p} : {}", graph.value_ty(p))?;
    }
    Ok(())
}

fn write_value_list(f: &mut fmt::Formatter<'_>, values: &[ValueId]) -> fmt::Result {
    f.write_char('(')?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{v}")?;
    }
    f.write_char(')')
}

fn write_block(graph: &Graph, f: &mut fmt::Formatter<'_>, b: BlockId, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    write!(f, "{b}(")?;
    write_params(graph, f, graph.params(b))?;
    f.write_str("):\n")?;
    write_block_body(graph, f, b, depth + 1)
}

fn write_block_body(
    graph: &Graph,
    f: &mut fmt::Formatter<'_>,
    b: BlockId,
    depth: usize,
) -> fmt::Result {
    for &n in graph.block_nodes(b) {
        write_node(graph, f, n, depth)?;
    }
    indent(f, depth)?;
    f.write_str("-> ")?;
    write_value_list(f, graph.block_outputs(b))?;
    f.write_char('\n')
}

fn write_node(graph: &Graph, f: &mut fmt::Formatter<'_>, n: NodeId, depth: usize) -> fmt::Result {
    crate::stack::ensure_sufficient_stack(|| {
        indent(f, depth)?;
        let outputs = graph.outputs(n);
        if !outputs.is_empty() {
            write_params(graph, f, outputs)?;
            f.write_str(" = ")?;
        }
        let kind = graph.kind(n);
        f.write_str(kind.mnemonic())?;
        if let NodeKind::Constant(lit) = kind {
            write!(f, "[{lit}]")?;
        }
        write_value_list(f, graph.inputs(n))?;
        f.write_char('\n')?;
        for &b in graph.node_blocks(n) {
            write_block(graph, f, b, depth + 1)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests;
