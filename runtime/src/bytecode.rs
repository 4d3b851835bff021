//! Provides the binary layout of a compiled program and the utilities for
//! decoding its nodes.
//!
//! A program is a single contiguous byte buffer. The first byte is the
//! [`MAGIC`] marker, every following node is laid out as:
//!
//! ```text
//! +--------+----------+----------+---------------------+
//! | opcode | next(hi) | next(lo) | operand\0 (if any)  |
//! +--------+----------+----------+---------------------+
//! ```
//!
//! `next` is a 16-bit magnitude relative to the start of the node containing
//! it. Every opcode but [`Opcode::Back`] points forward. A magnitude of zero
//! signifies the node has no successor.

/// Marker byte found at the start of every compiled program.
pub const MAGIC: u8 = 0o234;

/// Width of a node header: one opcode byte followed by two offset bytes.
pub const NODE_HEADER_LEN: usize = 3;

/// Programs at or above this size can no longer be addressed by a 16-bit
/// relative offset.
pub const MAX_PROGRAM_SIZE: usize = 32767;

/// Number of save group slots, slot 0 being the whole match.
pub const NSUBEXP: usize = 10;

/// Deepest nesting of recursive calls a single match attempt may reach.
/// Each iteration of a complex repetition costs several levels.
pub const MAX_RECURSION_DEPTH: usize = 1000;

const OPEN_BASE: u8 = 20;
const CLOSE_BASE: u8 = 30;

/// Represents each instruction of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// End of program.
    End,
    /// Match the empty string at the beginning of the input.
    Bol,
    /// Match the empty string at the end of the input.
    Eol,
    /// Match any one byte.
    Any,
    /// Match any byte in the operand.
    AnyOf,
    /// Match any byte not in the operand.
    AnyBut,
    /// Match this alternative, or the next one.
    Branch,
    /// Match the empty string. `next` points backward.
    Back,
    /// Match the operand string.
    Exactly,
    /// Match the empty string.
    Nothing,
    /// Match the following simple node 0 or more times.
    Star,
    /// Match the following simple node 1 or more times.
    Plus,
    /// Mark the input position as the start of a numbered group.
    Open(u8),
    /// Mark the input position as the end of a numbered group.
    Close(u8),
}

impl Opcode {
    /// Returns the encoded byte representation of the opcode.
    pub const fn to_byte(self) -> u8 {
        match self {
            Opcode::End => 0,
            Opcode::Bol => 1,
            Opcode::Eol => 2,
            Opcode::Any => 3,
            Opcode::AnyOf => 4,
            Opcode::AnyBut => 5,
            Opcode::Branch => 6,
            Opcode::Back => 7,
            Opcode::Exactly => 8,
            Opcode::Nothing => 9,
            Opcode::Star => 10,
            Opcode::Plus => 11,
            Opcode::Open(group) => OPEN_BASE + group,
            Opcode::Close(group) => CLOSE_BASE + group,
        }
    }

    /// Attempts to decode an opcode from its byte representation, returning
    /// `None` for unassigned values.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        let opcode = match byte {
            0 => Opcode::End,
            1 => Opcode::Bol,
            2 => Opcode::Eol,
            3 => Opcode::Any,
            4 => Opcode::AnyOf,
            5 => Opcode::AnyBut,
            6 => Opcode::Branch,
            7 => Opcode::Back,
            8 => Opcode::Exactly,
            9 => Opcode::Nothing,
            10 => Opcode::Star,
            11 => Opcode::Plus,
            21..=29 => Opcode::Open(byte - OPEN_BASE),
            31..=39 => Opcode::Close(byte - CLOSE_BASE),
            _ => return None,
        };

        Some(opcode)
    }

    /// Returns true if the opcode is followed by a NUL-terminated operand
    /// string.
    pub const fn has_string_operand(self) -> bool {
        matches!(self, Opcode::Exactly | Opcode::AnyOf | Opcode::AnyBut)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Opcode::End => write!(f, "END"),
            Opcode::Bol => write!(f, "BOL"),
            Opcode::Eol => write!(f, "EOL"),
            Opcode::Any => write!(f, "ANY"),
            Opcode::AnyOf => write!(f, "ANYOF"),
            Opcode::AnyBut => write!(f, "ANYBUT"),
            Opcode::Branch => write!(f, "BRANCH"),
            Opcode::Back => write!(f, "BACK"),
            Opcode::Exactly => write!(f, "EXACTLY"),
            Opcode::Nothing => write!(f, "NOTHING"),
            Opcode::Star => write!(f, "STAR"),
            Opcode::Plus => write!(f, "PLUS"),
            Opcode::Open(group) => write!(f, "OPEN{}", group),
            Opcode::Close(group) => write!(f, "CLOSE{}", group),
        }
    }
}

/// A decoded `next` pointer, carrying its direction explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Forward(u16),
    Backward(u16),
}

impl Jump {
    /// Builds the jump that leads from the node at `from` to `to`, for a node
    /// of the given opcode.
    pub fn between(opcode: Opcode, from: usize, to: usize) -> Option<Self> {
        let magnitude = match opcode {
            Opcode::Back => from.checked_sub(to)?,
            _ => to.checked_sub(from)?,
        };

        let magnitude = u16::try_from(magnitude).ok()?;
        match opcode {
            Opcode::Back => Some(Jump::Backward(magnitude)),
            _ => Some(Jump::Forward(magnitude)),
        }
    }

    /// The unsigned distance as stored in the node header.
    pub const fn magnitude(self) -> u16 {
        match self {
            Jump::Forward(m) | Jump::Backward(m) => m,
        }
    }

    /// Resolves the jump to an absolute program index relative to the node it
    /// was read from.
    pub fn resolve(self, from: usize) -> Option<usize> {
        match self {
            Jump::Forward(m) => from.checked_add(m as usize),
            Jump::Backward(m) => from.checked_sub(m as usize),
        }
    }
}

/// Represents all error types that may occur while decoding or walking a
/// compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// The program is empty or is missing its magic marker.
    CorruptedProgram,
    /// A node carries a byte that is not an assigned opcode.
    UnknownOpcode { at: usize, byte: u8 },
    /// A node chain ended, or pointed outside the program, before reaching
    /// `END`.
    DanglingNode { at: usize },
    /// An attempt needed more than [`MAX_RECURSION_DEPTH`] nested calls.
    RecursionLimitExceeded,
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::CorruptedProgram => write!(f, "compiled regular expression corrupted"),
            MatchError::UnknownOpcode { at, byte } => {
                write!(f, "unknown opcode {} at offset {:04}", byte, at)
            }
            MatchError::DanglingNode { at } => {
                write!(f, "node at offset {:04} has no valid successor", at)
            }
            MatchError::RecursionLimitExceeded => write!(
                f,
                "match exceeded the recursion limit of {}",
                MAX_RECURSION_DEPTH
            ),
        }
    }
}

impl std::error::Error for MatchError {}

/// A read-only view of a single node within a program buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node<'p> {
    program: &'p [u8],
    at: usize,
    opcode: Opcode,
}

impl<'p> Node<'p> {
    /// Decodes the node starting at index `at` of `program`.
    pub fn decode(program: &'p [u8], at: usize) -> Result<Self, MatchError> {
        let header = program
            .get(at..at + NODE_HEADER_LEN)
            .ok_or(MatchError::DanglingNode { at })?;
        let opcode = Opcode::from_byte(header[0]).ok_or(MatchError::UnknownOpcode {
            at,
            byte: header[0],
        })?;

        Ok(Self {
            program,
            at,
            opcode,
        })
    }

    /// The index of the node's opcode byte.
    pub fn offset(&self) -> usize {
        self.at
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Returns the node's encoded `next` pointer, if it has one.
    pub fn jump(&self) -> Option<Jump> {
        let magnitude = read_magnitude(self.program, self.at)?;
        match (magnitude, self.opcode) {
            (0, _) => None,
            (m, Opcode::Back) => Some(Jump::Backward(m)),
            (m, _) => Some(Jump::Forward(m)),
        }
    }

    /// Returns the absolute index of the following node, if any.
    pub fn next(&self) -> Option<usize> {
        self.jump().and_then(|jump| jump.resolve(self.at))
    }

    /// Index of the first byte past the header. This is either the start of a
    /// string operand or, for `BRANCH`, `STAR` and `PLUS`, the first node of
    /// the operand chain.
    pub fn operand_offset(&self) -> usize {
        self.at + NODE_HEADER_LEN
    }

    /// Returns the NUL-terminated operand of an `EXACTLY`, `ANYOF` or
    /// `ANYBUT` node, without its terminator.
    pub fn operand(&self) -> &'p [u8] {
        operand_at(self.program, self.operand_offset())
    }
}

/// Reads the big-endian `next` magnitude of the node at `at`.
pub fn read_magnitude(program: &[u8], at: usize) -> Option<u16> {
    let hi = *program.get(at + 1)?;
    let lo = *program.get(at + 2)?;

    Some(u16::from_be_bytes([hi, lo]))
}

/// Returns the NUL-terminated string starting at `at`, excluding the
/// terminator. A missing terminator yields the remainder of the program.
pub fn operand_at(program: &[u8], at: usize) -> &[u8] {
    let tail = program.get(at..).unwrap_or_default();
    match memchr::memchr(0, tail) {
        Some(len) => &tail[..len],
        None => tail,
    }
}

/// Writes a node-per-line listing of a program buffer, stopping at the first
/// undecodable byte.
pub(crate) fn disassemble(program: &[u8], f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match program.first() {
        Some(&MAGIC) => writeln!(f, "0000: MAGIC")?,
        _ => return writeln!(f, "0000: <missing magic>"),
    }

    let mut at = 1;
    while at < program.len() {
        let node = match Node::decode(program, at) {
            Ok(node) => node,
            Err(e) => return writeln!(f, "{:04}: <{}>", at, e),
        };
        let opcode = node.opcode();

        write!(f, "{:04}: {}", at, opcode)?;
        if opcode.has_string_operand() {
            write!(f, " {:?}", String::from_utf8_lossy(node.operand()))?;
        }
        match node.next() {
            Some(next) => writeln!(f, " -> {:04}", next)?,
            None => writeln!(f)?,
        }

        at = node.operand_offset();
        if opcode.has_string_operand() {
            at += node.operand().len() + 1;
        }
    }

    Ok(())
}
