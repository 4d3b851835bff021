//! Code emission strategies for the two compilation passes.
//!
//! The parser is run twice over the same pattern. The first pass drives a
//! [`SizeCounter`] that only tallies the bytes the program will need. The
//! second drives a [`CodeWriter`] over a buffer allocated at exactly that size.
//! Since both passes make the same sequence of calls, the writer never grows
//! or relocates its buffer.

use regexp_runtime::bytecode::{Jump, Node, NODE_HEADER_LEN};
use regexp_runtime::Opcode;

use crate::compiler::CompileError;

/// The operations the parser uses to lay out a program.
pub trait Emitter {
    /// Appends a node header with an empty `next` pointer, returning its
    /// position.
    fn emit_node(&mut self, opcode: Opcode) -> usize;

    /// Appends a single operand byte.
    fn emit_byte(&mut self, byte: u8);

    /// Inserts a node header in front of the already emitted operand at
    /// `at`, relocating everything from `at` onward.
    fn reserve(&mut self, opcode: Opcode, at: usize);

    /// Points the last node of the chain beginning at `chain` to `target`.
    /// Fails if the jump cannot be encoded in a node header.
    fn set_tail(&mut self, chain: usize, target: usize) -> Result<(), CompileError>;

    /// Like [`Emitter::set_tail`] but on the operand chain of a `BRANCH`
    /// node. Nodes of any other opcode are left untouched.
    fn set_operand_tail(&mut self, node: usize, target: usize) -> Result<(), CompileError>;

    /// Returns the successor of the node at `at`, if it is known.
    fn next(&self, at: usize) -> Option<usize>;
}

/// Counts program size without producing any code.
#[derive(Debug, Default)]
pub struct SizeCounter {
    size: usize,
}

impl SizeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of bytes counted so far.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Emitter for SizeCounter {
    fn emit_node(&mut self, _: Opcode) -> usize {
        let at = self.size;
        self.size += NODE_HEADER_LEN;
        at
    }

    fn emit_byte(&mut self, _: u8) {
        self.size += 1;
    }

    fn reserve(&mut self, _: Opcode, _: usize) {
        self.size += NODE_HEADER_LEN;
    }

    fn set_tail(&mut self, _: usize, _: usize) -> Result<(), CompileError> {
        Ok(())
    }

    fn set_operand_tail(&mut self, _: usize, _: usize) -> Result<(), CompileError> {
        Ok(())
    }

    fn next(&self, _: usize) -> Option<usize> {
        None
    }
}

/// Writes code into a buffer of a size fixed up front.
#[derive(Debug)]
pub struct CodeWriter {
    code: Vec<u8>,
    cursor: usize,
}

impl CodeWriter {
    /// Allocates a zeroed buffer of exactly `size` bytes.
    pub fn with_size(size: usize) -> Self {
        Self {
            code: vec![0; size],
            cursor: 0,
        }
    }

    /// Returns the emitted code, truncated to the bytes actually written.
    pub fn into_code(mut self) -> Vec<u8> {
        self.code.truncate(self.cursor);
        self.code
    }

    fn opcode_at(&self, at: usize) -> Option<Opcode> {
        self.code.get(at).copied().and_then(Opcode::from_byte)
    }

    fn write_jump(&mut self, at: usize, jump: Jump) {
        let [hi, lo] = jump.magnitude().to_be_bytes();
        self.code[at + 1] = hi;
        self.code[at + 2] = lo;
    }
}

impl Emitter for CodeWriter {
    fn emit_node(&mut self, opcode: Opcode) -> usize {
        let at = self.cursor;
        self.code[at..at + NODE_HEADER_LEN].copy_from_slice(&[opcode.to_byte(), 0, 0]);
        self.cursor += NODE_HEADER_LEN;
        at
    }

    fn emit_byte(&mut self, byte: u8) {
        self.code[self.cursor] = byte;
        self.cursor += 1;
    }

    fn reserve(&mut self, opcode: Opcode, at: usize) {
        let end = self.cursor;
        self.code.copy_within(at..end, at + NODE_HEADER_LEN);
        self.code[at..at + NODE_HEADER_LEN].copy_from_slice(&[opcode.to_byte(), 0, 0]);
        self.cursor += NODE_HEADER_LEN;
    }

    fn set_tail(&mut self, chain: usize, target: usize) -> Result<(), CompileError> {
        // find the last node.
        let mut last = chain;
        while let Some(next) = self.next(last) {
            last = next;
        }

        let jump = self
            .opcode_at(last)
            .and_then(|opcode| Jump::between(opcode, last, target))
            .ok_or(CompileError::Internal)?;
        self.write_jump(last, jump);
        Ok(())
    }

    fn set_operand_tail(&mut self, node: usize, target: usize) -> Result<(), CompileError> {
        match self.opcode_at(node) {
            Some(Opcode::Branch) => self.set_tail(node + NODE_HEADER_LEN, target),
            _ => Ok(()),
        }
    }

    fn next(&self, at: usize) -> Option<usize> {
        Node::decode(&self.code, at).ok()?.next()
    }
}
