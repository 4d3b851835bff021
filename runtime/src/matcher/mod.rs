//! The backtracking interpreter evaluating a single match attempt at a fixed
//! starting offset.
//!
//! Nodes that do not need to know whether the remainder of the pattern
//! succeeds are walked by a loop. `OPEN`, `CLOSE`, `BRANCH`, `STAR` and
//! `PLUS` recurse into the remainder instead. Each iteration of a complex
//! repetition such as `(a|b)*` re-enters its loop through `BACK` without
//! returning, so stack depth grows with the number of iterations and hence
//! with the input. Depth is capped at [`MAX_RECURSION_DEPTH`], past which the
//! attempt fails with [`MatchError::RecursionLimitExceeded`].

use crate::bytecode::{MatchError, Node, Opcode, MAX_RECURSION_DEPTH, NSUBEXP};

/// Mutable state of one match attempt over a haystack.
#[derive(Debug)]
pub struct Backtracker<'p, 'h> {
    program: &'p [u8],
    haystack: &'h [u8],
    cursor: usize,
    depth: usize,
    starts: [Option<usize>; NSUBEXP],
    ends: [Option<usize>; NSUBEXP],
}

impl<'p, 'h> Backtracker<'p, 'h> {
    pub fn new(program: &'p [u8], haystack: &'h [u8]) -> Self {
        Self {
            program,
            haystack,
            cursor: 0,
            depth: 0,
            starts: [None; NSUBEXP],
            ends: [None; NSUBEXP],
        }
    }

    /// Attempts a match beginning exactly at `start`, returning a boolean
    /// signifying success. On success slot 0 spans the match.
    pub fn try_at(&mut self, start: usize) -> Result<bool, MatchError> {
        self.cursor = start;
        self.depth = 0;
        self.starts = [None; NSUBEXP];
        self.ends = [None; NSUBEXP];

        // the first node follows the magic marker.
        if self.matches_from(1)? {
            self.starts[0] = Some(start);
            self.ends[0] = Some(self.cursor);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// The bounds recorded by the last successful attempt, by group.
    pub fn bounds(&self) -> impl Iterator<Item = (Option<usize>, Option<usize>)> + '_ {
        self.starts.iter().copied().zip(self.ends.iter().copied())
    }

    fn next_of(&self, node: &Node<'p>) -> Result<usize, MatchError> {
        node.next()
            .ok_or(MatchError::DanglingNode { at: node.offset() })
    }

    fn opcode_at(&self, at: usize) -> Result<Opcode, MatchError> {
        Node::decode(self.program, at).map(|node| node.opcode())
    }

    /// Walks the chain beginning at `scan`, returning true if it reaches
    /// `END` with the input consumed so far.
    fn matches_from(&mut self, scan: usize) -> Result<bool, MatchError> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(MatchError::RecursionLimitExceeded);
        }

        self.depth += 1;
        let matched = self.walk(scan);
        self.depth -= 1;
        matched
    }

    fn walk(&mut self, mut scan: usize) -> Result<bool, MatchError> {
        loop {
            let node = Node::decode(self.program, scan)?;
            let next = node.next();

            match node.opcode() {
                Opcode::Bol => {
                    if self.cursor != 0 {
                        return Ok(false);
                    }
                }
                Opcode::Eol => {
                    if self.cursor != self.haystack.len() {
                        return Ok(false);
                    }
                }
                Opcode::Any => {
                    if self.cursor >= self.haystack.len() {
                        return Ok(false);
                    }
                    self.cursor += 1;
                }
                Opcode::Exactly => {
                    let literal = node.operand();
                    let remaining = &self.haystack[self.cursor..];

                    // compare the first byte inline before the whole literal.
                    if remaining.first() != literal.first() || !remaining.starts_with(literal) {
                        return Ok(false);
                    }
                    self.cursor += literal.len();
                }
                Opcode::AnyOf => match self.haystack.get(self.cursor) {
                    Some(b) if node.operand().contains(b) => self.cursor += 1,
                    _ => return Ok(false),
                },
                Opcode::AnyBut => match self.haystack.get(self.cursor) {
                    Some(b) if !node.operand().contains(b) => self.cursor += 1,
                    _ => return Ok(false),
                },
                Opcode::Nothing | Opcode::Back => {}
                Opcode::Open(group) => {
                    let save = self.cursor;
                    let next = self.next_of(&node)?;

                    if !self.matches_from(next)? {
                        return Ok(false);
                    }

                    // a later invocation of the same group may have already
                    // recorded its bound.
                    let slot = &mut self.starts[group as usize];
                    if slot.is_none() {
                        *slot = Some(save);
                    }
                    return Ok(true);
                }
                Opcode::Close(group) => {
                    let save = self.cursor;
                    let next = self.next_of(&node)?;

                    if !self.matches_from(next)? {
                        return Ok(false);
                    }

                    let slot = &mut self.ends[group as usize];
                    if slot.is_none() {
                        *slot = Some(save);
                    }
                    return Ok(true);
                }
                Opcode::Branch => {
                    let next = self.next_of(&node)?;

                    // no choice, step into the operand without recursing.
                    if self.opcode_at(next)? != Opcode::Branch {
                        scan = node.operand_offset();
                        continue;
                    }

                    return self.alternatives(node);
                }
                Opcode::Star | Opcode::Plus => {
                    let min = if node.opcode() == Opcode::Star { 0 } else { 1 };
                    return self.repetition(node, min);
                }
                Opcode::End => return Ok(true),
            }

            scan = next.ok_or(MatchError::DanglingNode { at: scan })?;
        }
    }

    /// Tries each alternative of a chain of `BRANCH` nodes in order.
    fn alternatives(&mut self, first: Node<'p>) -> Result<bool, MatchError> {
        let mut branch = Some(first);

        while let Some(node) = branch.filter(|n| n.opcode() == Opcode::Branch) {
            let save = self.cursor;
            if self.matches_from(node.operand_offset())? {
                return Ok(true);
            }

            self.cursor = save;
            branch = match node.next() {
                Some(next) => Some(Node::decode(self.program, next)?),
                None => None,
            };
        }

        Ok(false)
    }

    /// Greedily consumes as many repetitions of the simple operand of `node`
    /// as possible, then backs off one at a time until the remainder of the
    /// pattern matches or fewer than `min` repetitions remain.
    fn repetition(&mut self, node: Node<'p>, min: usize) -> Result<bool, MatchError> {
        let next = self.next_of(&node)?;
        let following = Node::decode(self.program, next)?;

        // skip attempts that the following literal would reject outright.
        let lookahead = match following.opcode() {
            Opcode::Exactly => following.operand().first().copied(),
            _ => None,
        };

        let save = self.cursor;
        let mut count = self.repeat(node.operand_offset())?;
        if count < min {
            return Ok(false);
        }

        loop {
            let viable = lookahead.map_or(true, |c| self.haystack.get(self.cursor) == Some(&c));
            if viable && self.matches_from(next)? {
                return Ok(true);
            }

            if count == min {
                return Ok(false);
            }
            count -= 1;
            self.cursor = save + count;
        }
    }

    /// Counts consecutive matches of a single-byte node at the cursor,
    /// advancing the cursor past them.
    fn repeat(&mut self, at: usize) -> Result<usize, MatchError> {
        let node = Node::decode(self.program, at)?;
        let remaining = &self.haystack[self.cursor..];

        let count = match node.opcode() {
            Opcode::Any => remaining.len(),
            Opcode::Exactly => {
                let operand = node.operand();
                match operand.first() {
                    Some(c) => remaining.iter().take_while(|b| *b == c).count(),
                    None => 0,
                }
            }
            Opcode::AnyOf => {
                let operand = node.operand();
                remaining.iter().take_while(|b| operand.contains(b)).count()
            }
            Opcode::AnyBut => {
                let operand = node.operand();
                remaining.iter().take_while(|b| !operand.contains(b)).count()
            }
            opcode => {
                return Err(MatchError::UnknownOpcode {
                    at,
                    byte: opcode.to_byte(),
                })
            }
        };

        self.cursor += count;
        Ok(count)
    }
}
