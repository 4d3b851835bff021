//! Provides the compiled program representation and the backtracking runtime
//! that evaluates it against an input.
//!
//! # Example
//!
//! ```rust
//! use regexp_runtime::{run, Hints, Program, SaveGroupSlot, MAGIC};
//!
//! // A hand-assembled program for the pattern `b`:
//! //
//! // 0001: BRANCH -> 0009
//! // 0004: EXACTLY "b" -> 0009
//! // 0009: END
//! let program = Program::new(
//!     vec![MAGIC, 6, 0, 8, 8, 0, 5, b'b', 0, 0, 0, 0],
//!     Hints::default().with_start(b'b'),
//! );
//!
//! let captures = run(&program, "abc").unwrap().unwrap();
//! assert_eq!(SaveGroupSlot::complete(1, 2), captures.slot(0));
//! assert_eq!(Some(&b"b"[..]), captures.get(0).map(|m| m.as_bytes()));
//! ```

pub mod bytecode;
pub mod matcher;

use std::fmt::{Debug, Display};
use std::ops::Range;

pub use bytecode::{MatchError, Opcode, MAGIC, MAX_PROGRAM_SIZE, MAX_RECURSION_DEPTH, NSUBEXP};
use matcher::Backtracker;

/// Represents a defined match group for a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveGroupSlot {
    #[default]
    None,
    Complete {
        start: usize,
        end: usize,
    },
}

impl SaveGroupSlot {
    /// Returns a boolean representing if the savegroup slot is of the `None`
    /// variant, signifying a match was not found.
    pub fn is_none(&self) -> bool {
        matches!(self, SaveGroupSlot::None)
    }

    /// Returns a boolean representing if the savegroup slot is of the
    /// `Complete` variant, signifying a match was found.
    pub fn is_complete(&self) -> bool {
        !self.is_none()
    }

    /// Returns a completed save group from its constituent parts.
    pub const fn complete(start: usize, end: usize) -> Self {
        Self::Complete { start, end }
    }

    /// Joins independently recorded bounds, yielding a complete slot only
    /// when both are present.
    fn from_bounds(start: Option<usize>, end: Option<usize>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) => Self::Complete { start, end },
            _ => Self::None,
        }
    }
}

/// Information derived at compile time that permits the runtime to skip or
/// reject work on simple cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints {
    /// A byte every match must begin with.
    pub start: Option<u8>,
    /// Whether the match can only begin at the start of the input.
    pub anchored: bool,
    /// The bytes, within the program buffer, of a literal every match must
    /// contain.
    pub required: Option<Range<usize>>,
}

impl Hints {
    pub fn with_start(mut self, start: u8) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_anchored(mut self, anchored: bool) -> Self {
        self.anchored = anchored;
        self
    }

    pub fn with_required(mut self, required: Range<usize>) -> Self {
        self.required = Some(required);
        self
    }
}

/// A compiled program. The buffer is never modified once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Program {
    code: Vec<u8>,
    hints: Hints,
}

impl Program {
    #[must_use]
    pub fn new(code: Vec<u8>, hints: Hints) -> Self {
        Self { code, hints }
    }

    /// The raw program bytes, magic marker included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /// The program size in bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    /// Returns the literal every match must contain, if one was found at
    /// compile time.
    pub fn required_substring(&self) -> Option<&[u8]> {
        self.hints
            .required
            .as_ref()
            .and_then(|range| self.code.get(range.clone()))
    }
}

impl Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("len", &self.code.len())
            .field("hints", &self.hints)
            .finish()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bytecode::disassemble(&self.code, f)
    }
}

/// A single matched span of a haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'h> {
    haystack: &'h [u8],
    start: usize,
    end: usize,
}

impl<'h> Match<'h> {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The matched bytes.
    pub fn as_bytes(&self) -> &'h [u8] {
        &self.haystack[self.range()]
    }
}

/// The save group slots of a successful match. Slot 0 spans the whole match,
/// slots 1 through 9 the parenthesized groups that participated in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures<'h> {
    haystack: &'h [u8],
    slots: [SaveGroupSlot; NSUBEXP],
}

impl<'h> Captures<'h> {
    /// Returns the raw slot for a group, `SaveGroupSlot::None` if out of
    /// range.
    pub fn slot(&self, group: usize) -> SaveGroupSlot {
        self.slots.get(group).copied().unwrap_or_default()
    }

    pub fn slots(&self) -> &[SaveGroupSlot; NSUBEXP] {
        &self.slots
    }

    /// Returns the span matched by a group, if the group participated.
    pub fn get(&self, group: usize) -> Option<Match<'h>> {
        match self.slot(group) {
            SaveGroupSlot::Complete { start, end } => Some(Match {
                haystack: self.haystack,
                start,
                end,
            }),
            SaveGroupSlot::None => None,
        }
    }

    /// Iterates over every slot in group order.
    pub fn iter(&self) -> impl Iterator<Item = Option<Match<'h>>> + '_ {
        (0..self.slots.len()).map(|group| self.get(group))
    }
}

/// Executes a given program against an input, returning the leftmost match.
///
/// The haystack is treated as plain bytes. A NUL byte has no special meaning
/// and does not end the input, so `$` only matches at the true end.
///
/// `Ok(None)` signifies no match exists anywhere in the input. An error is
/// returned for programs that are not well-formed, or when an attempt
/// recurses past [`MAX_RECURSION_DEPTH`].
pub fn run<'h, H>(program: &Program, haystack: &'h H) -> Result<Option<Captures<'h>>, MatchError>
where
    H: AsRef<[u8]> + ?Sized,
{
    let haystack = haystack.as_ref();
    let code = program.as_bytes();

    if code.first() != Some(&MAGIC) {
        return Err(MatchError::CorruptedProgram);
    }

    // reject inputs lacking the required literal before any backtracking.
    if let Some(required) = program.required_substring() {
        if memchr::memmem::find(haystack, required).is_none() {
            log::trace!("required substring absent, skipping search");
            return Ok(None);
        }
    }

    let mut backtracker = Backtracker::new(code, haystack);
    let hints = program.hints();

    let found = if hints.anchored {
        log::trace!("anchored search");
        backtracker.try_at(0)?
    } else if let Some(start) = hints.start {
        log::trace!("scanning for start byte {:?}", start as char);
        let mut found = false;
        let mut offset = 0;
        while let Some(idx) = memchr::memchr(start, &haystack[offset..]) {
            if backtracker.try_at(offset + idx)? {
                found = true;
                break;
            }
            offset += idx + 1;
        }
        found
    } else {
        log::trace!("trying every offset");
        let mut found = false;
        for offset in 0..=haystack.len() {
            if backtracker.try_at(offset)? {
                found = true;
                break;
            }
        }
        found
    };

    if !found {
        return Ok(None);
    }

    let mut slots = [SaveGroupSlot::None; NSUBEXP];
    for (slot, (start, end)) in slots.iter_mut().zip(backtracker.bounds()) {
        *slot = SaveGroupSlot::from_bounds(start, end);
    }

    Ok(Some(Captures { haystack, slots }))
}
