//! Derives search hints from freshly emitted code.
//!
//! Hints are only extracted when the program consists of a single top-level
//! alternative, since otherwise no node is guaranteed to take part in every
//! match.

use regexp_runtime::bytecode::Node;
use regexp_runtime::{Hints, Opcode};

/// The first node, immediately following the magic marker.
const FIRST_NODE: usize = 1;

/// Inspects a compiled program and returns the hints the runtime may use to
/// speed up a search. `sp_start` signifies that the pattern begins with a
/// construct likely to backtrack heavily, in which case a required literal is
/// worth looking for up front.
pub(crate) fn hints(code: &[u8], sp_start: bool) -> Hints {
    let mut hints = Hints::default();

    let top = match Node::decode(code, FIRST_NODE) {
        Ok(top) => top,
        Err(_) => return hints,
    };
    let single_branch = top
        .next()
        .and_then(|next| Node::decode(code, next).ok())
        .map_or(false, |next| next.opcode() == Opcode::End);
    if !single_branch {
        return hints;
    }

    let first = match Node::decode(code, top.operand_offset()) {
        Ok(first) => first,
        Err(_) => return hints,
    };
    match first.opcode() {
        Opcode::Exactly => hints.start = first.operand().first().copied(),
        Opcode::Bol => hints.anchored = true,
        _ => (),
    }

    if sp_start {
        hints.required = longest_literal(code, first);
    }

    hints
}

/// Finds the longest `EXACTLY` operand along the chain starting at `node`.
/// Ties resolve to the later literal.
fn longest_literal(code: &[u8], node: Node<'_>) -> Option<std::ops::Range<usize>> {
    let mut longest: Option<std::ops::Range<usize>> = None;

    let mut scan = Some(node);
    while let Some(node) = scan {
        if node.opcode() == Opcode::Exactly {
            let len = node.operand().len();
            if longest.as_ref().map_or(true, |range| len >= range.len()) {
                let start = node.operand_offset();
                longest = Some(start..start + len);
            }
        }

        scan = node.next().and_then(|next| Node::decode(code, next).ok());
    }

    longest
}
