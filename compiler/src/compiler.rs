//! Provides the recursive-descent parser that compiles a pattern directly
//! into runtime bytecode.
//!
//! The grammar, from lowest to highest precedence:
//!
//! ```text
//! expr   := branch ('|' branch)*
//! branch := piece*
//! piece  := atom ('*' | '+' | '?')?
//! atom   := '^' | '$' | '.' | '[' class ']' | '(' expr ')' | '\' byte | literal-run
//! ```

use regexp_runtime::{Opcode, Program, MAGIC, MAX_PROGRAM_SIZE, NSUBEXP};

use crate::emitter::{CodeWriter, Emitter, SizeCounter};
use crate::optimizer;

/// Bytes with special meaning outside of a bracket expression.
const META: &[u8] = b"^$.[()|?+*\\";

fn is_quantifier(c: u8) -> bool {
    matches!(c, b'*' | b'+' | b'?')
}

/// Represents every way a pattern can fail to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileError {
    /// No pattern was supplied.
    NoExpression,
    /// The program would exceed what 16-bit relative offsets can address.
    TooLarge,
    /// More than nine parenthesized groups.
    TooManyGroups,
    /// An opening parenthesis without a close, or the reverse.
    UnmatchedParentheses,
    /// `*` or `+` applied to something that can match the empty string.
    EmptyOperand,
    /// A quantifier directly following another, i.e. `a**`.
    NestedQuantifier,
    /// A bracket range whose upper bound is below its lower bound.
    InvalidRange,
    /// A bracket expression without its closing `]`.
    UnmatchedBracket,
    /// A pattern ending in an unescaped backslash.
    TrailingBackslash,
    /// A quantifier with no preceding atom.
    QuantifierFollowsNothing,
    /// The parser reached a state the grammar rules out.
    Internal,
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::NoExpression => write!(f, "no expression supplied"),
            CompileError::TooLarge => write!(f, "expression too big"),
            CompileError::TooManyGroups => write!(f, "too many parentheses"),
            CompileError::UnmatchedParentheses => write!(f, "unmatched parentheses"),
            CompileError::EmptyOperand => write!(f, "*+ operand could be empty"),
            CompileError::NestedQuantifier => write!(f, "nested *?+"),
            CompileError::InvalidRange => write!(f, "invalid range in []"),
            CompileError::UnmatchedBracket => write!(f, "unmatched []"),
            CompileError::TrailingBackslash => write!(f, "trailing backslash"),
            CompileError::QuantifierFollowsNothing => write!(f, "?+* follows nothing"),
            CompileError::Internal => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Properties of an emitted fragment, passed up the descent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Flags {
    /// Known never to match the empty string.
    pub has_width: bool,
    /// Matches exactly one byte, so it may be the operand of `STAR`/`PLUS`.
    pub simple: bool,
    /// Starts with `*` or `?`, so the match may involve heavy backtracking.
    pub sp_start: bool,
}

impl Flags {
    const WORST: Self = Self {
        has_width: false,
        simple: false,
        sp_start: false,
    };
}

/// A single pass of the recursive descent over a pattern.
struct Parser<'p, E> {
    pattern: &'p [u8],
    pos: usize,
    /// The next group number to assign.
    npar: usize,
    emitter: E,
}

impl<'p, E: Emitter> Parser<'p, E> {
    fn new(pattern: &'p [u8], emitter: E) -> Self {
        Self {
            pattern,
            pos: 0,
            npar: 1,
            emitter,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.pos).copied()
    }

    /// Emits the magic marker and the top-level expression.
    fn program(&mut self) -> Result<Flags, CompileError> {
        self.emitter.emit_byte(MAGIC);
        self.expression(false).map(|(_, flags)| flags)
    }

    /// Parses a main body or a parenthesized expression. The caller consumes
    /// the opening parenthesis.
    fn expression(&mut self, paren: bool) -> Result<(usize, Flags), CompileError> {
        let mut flags = Flags {
            has_width: true,
            ..Flags::WORST
        };

        let (open, group) = if paren {
            if self.npar >= NSUBEXP {
                return Err(CompileError::TooManyGroups);
            }
            let group = self.npar;
            self.npar += 1;
            (Some(self.emitter.emit_node(Opcode::Open(group as u8))), group)
        } else {
            (None, 0)
        };

        let (first, branch_flags) = self.branch()?;
        let head = match open {
            Some(open) => {
                // OPEN -> first branch.
                self.emitter.set_tail(open, first)?;
                open
            }
            None => first,
        };
        flags.has_width &= branch_flags.has_width;
        flags.sp_start |= branch_flags.sp_start;

        while self.peek() == Some(b'|') {
            self.pos += 1;
            let (branch, branch_flags) = self.branch()?;
            // BRANCH -> BRANCH.
            self.emitter.set_tail(head, branch)?;
            flags.has_width &= branch_flags.has_width;
            flags.sp_start |= branch_flags.sp_start;
        }

        let ender = self.emitter.emit_node(match paren {
            true => Opcode::Close(group as u8),
            false => Opcode::End,
        });
        self.emitter.set_tail(head, ender)?;

        // hook the tail of every branch to the closing node.
        let mut branch = Some(head);
        while let Some(at) = branch {
            self.emitter.set_operand_tail(at, ender)?;
            branch = self.emitter.next(at);
        }

        match (paren, self.peek()) {
            (true, Some(b')')) => self.pos += 1,
            (true, _) => return Err(CompileError::UnmatchedParentheses),
            (false, None) => (),
            (false, Some(b')')) => return Err(CompileError::UnmatchedParentheses),
            (false, Some(_)) => return Err(CompileError::Internal),
        }

        Ok((head, flags))
    }

    /// Parses one alternative of a `|` operator, the concatenation of its
    /// pieces.
    fn branch(&mut self) -> Result<(usize, Flags), CompileError> {
        let mut flags = Flags::WORST;
        let head = self.emitter.emit_node(Opcode::Branch);

        let mut chain = None;
        while !matches!(self.peek(), None | Some(b'|' | b')')) {
            let (latest, piece_flags) = self.piece()?;
            flags.has_width |= piece_flags.has_width;
            match chain {
                None => flags.sp_start |= piece_flags.sp_start,
                Some(chain) => self.emitter.set_tail(chain, latest)?,
            }
            chain = Some(latest);
        }

        // an empty branch still needs a node to carry its tail.
        if chain.is_none() {
            self.emitter.emit_node(Opcode::Nothing);
        }

        Ok((head, flags))
    }

    /// Parses an atom followed by an optional quantifier.
    ///
    /// The branching sequences for `?` and for complex `*` and `+` share a
    /// single `NOTHING` node as both the end marker of their branch list and
    /// the body of the last branch.
    fn piece(&mut self) -> Result<(usize, Flags), CompileError> {
        let (atom, atom_flags) = self.atom()?;

        let op = match self.peek() {
            Some(op) if is_quantifier(op) => op,
            _ => return Ok((atom, atom_flags)),
        };

        if !atom_flags.has_width && op != b'?' {
            return Err(CompileError::EmptyOperand);
        }
        let flags = match op {
            b'+' => Flags {
                has_width: true,
                ..Flags::WORST
            },
            _ => Flags {
                sp_start: true,
                ..Flags::WORST
            },
        };

        let emitter = &mut self.emitter;
        match op {
            b'*' if atom_flags.simple => emitter.reserve(Opcode::Star, atom),
            b'*' => {
                // x* as (x&|), where & loops back to the branch.
                emitter.reserve(Opcode::Branch, atom);
                let back = emitter.emit_node(Opcode::Back);
                emitter.set_operand_tail(atom, back)?;
                emitter.set_operand_tail(atom, atom)?;
                let or = emitter.emit_node(Opcode::Branch);
                emitter.set_tail(atom, or)?;
                let null = emitter.emit_node(Opcode::Nothing);
                emitter.set_tail(atom, null)?;
            }
            b'+' if atom_flags.simple => emitter.reserve(Opcode::Plus, atom),
            b'+' => {
                // x+ as x(&|), where & loops back to x.
                let either = emitter.emit_node(Opcode::Branch);
                emitter.set_tail(atom, either)?;
                let back = emitter.emit_node(Opcode::Back);
                emitter.set_tail(back, atom)?;
                let or = emitter.emit_node(Opcode::Branch);
                emitter.set_tail(either, or)?;
                let null = emitter.emit_node(Opcode::Nothing);
                emitter.set_tail(atom, null)?;
            }
            _ => {
                // x? as (x|)
                emitter.reserve(Opcode::Branch, atom);
                let or = emitter.emit_node(Opcode::Branch);
                emitter.set_tail(atom, or)?;
                let null = emitter.emit_node(Opcode::Nothing);
                emitter.set_tail(atom, null)?;
                emitter.set_operand_tail(atom, null)?;
            }
        }

        self.pos += 1;
        if self.peek().map_or(false, is_quantifier) {
            return Err(CompileError::NestedQuantifier);
        }

        Ok((atom, flags))
    }

    /// Parses the lowest level of the grammar.
    ///
    /// A run of ordinary bytes becomes a single `EXACTLY` node. Escaped bytes
    /// each become a node of their own.
    fn atom(&mut self) -> Result<(usize, Flags), CompileError> {
        let c = self.peek().ok_or(CompileError::Internal)?;
        self.pos += 1;

        let width_and_simple = Flags {
            has_width: true,
            simple: true,
            ..Flags::WORST
        };

        match c {
            b'^' => Ok((self.emitter.emit_node(Opcode::Bol), Flags::WORST)),
            b'$' => Ok((self.emitter.emit_node(Opcode::Eol), Flags::WORST)),
            b'.' => Ok((self.emitter.emit_node(Opcode::Any), width_and_simple)),
            b'[' => self.bracket().map(|at| (at, width_and_simple)),
            b'(' => {
                let (at, flags) = self.expression(true)?;
                Ok((
                    at,
                    Flags {
                        has_width: flags.has_width,
                        sp_start: flags.sp_start,
                        ..Flags::WORST
                    },
                ))
            }
            b'|' | b')' => Err(CompileError::Internal),
            b'?' | b'+' | b'*' => Err(CompileError::QuantifierFollowsNothing),
            b'\\' => {
                let escaped = self.peek().ok_or(CompileError::TrailingBackslash)?;
                self.pos += 1;

                let at = self.emitter.emit_node(Opcode::Exactly);
                self.emitter.emit_byte(escaped);
                self.emitter.emit_byte(0);
                Ok((at, width_and_simple))
            }
            _ => {
                self.pos -= 1;
                self.literal_run()
            }
        }
    }

    /// Parses the body of a bracket expression, the opening `[` consumed.
    fn bracket(&mut self) -> Result<usize, CompileError> {
        let at = match self.peek() {
            Some(b'^') => {
                self.pos += 1;
                self.emitter.emit_node(Opcode::AnyBut)
            }
            _ => self.emitter.emit_node(Opcode::AnyOf),
        };

        // a leading `]` or `-` is taken literally.
        if let Some(c @ (b']' | b'-')) = self.peek() {
            self.emitter.emit_byte(c);
            self.pos += 1;
        }

        while let Some(c) = self.peek().filter(|&c| c != b']') {
            self.pos += 1;
            if c != b'-' {
                self.emitter.emit_byte(c);
                continue;
            }

            match self.peek() {
                // a trailing `-` is taken literally.
                None | Some(b']') => self.emitter.emit_byte(b'-'),
                Some(upper) => {
                    // the lower bound was emitted on the previous iteration.
                    let lower = self.pattern[self.pos - 2];
                    if lower > upper {
                        return Err(CompileError::InvalidRange);
                    }
                    for b in (lower..=upper).skip(1) {
                        self.emitter.emit_byte(b);
                    }
                    self.pos += 1;
                }
            }
        }
        self.emitter.emit_byte(0);

        match self.peek() {
            Some(b']') => {
                self.pos += 1;
                Ok(at)
            }
            _ => Err(CompileError::UnmatchedBracket),
        }
    }

    /// Gobbles a run of ordinary bytes into one `EXACTLY` node.
    fn literal_run(&mut self) -> Result<(usize, Flags), CompileError> {
        let rest = &self.pattern[self.pos..];
        let mut len = rest.iter().take_while(|c| !META.contains(c)).count();
        if len == 0 {
            return Err(CompileError::Internal);
        }

        // back off so a trailing quantifier applies to the last byte only.
        if len > 1 && rest.get(len).copied().map_or(false, is_quantifier) {
            len -= 1;
        }

        let flags = Flags {
            has_width: true,
            simple: len == 1,
            ..Flags::WORST
        };

        let at = self.emitter.emit_node(Opcode::Exactly);
        for &c in &rest[..len] {
            self.emitter.emit_byte(c);
        }
        self.emitter.emit_byte(0);
        self.pos += len;

        Ok((at, flags))
    }
}

/// Compiles a pattern into a runnable program.
///
/// The pattern ends at its first NUL byte, if it has one. `None` yields
/// [`CompileError::NoExpression`].
///
/// # Example
///
/// ```
/// use regexp_compiler::{compile, CompileError};
///
/// let program = compile("^ab+").unwrap();
/// assert!(program.hints().anchored);
///
/// assert_eq!(Err(CompileError::NestedQuantifier), compile("a**"));
/// assert_eq!(Err(CompileError::NoExpression), compile(None));
/// ```
pub fn compile<'a, P>(pattern: P) -> Result<Program, CompileError>
where
    P: Into<Option<&'a str>>,
{
    let pattern = pattern
        .into()
        .ok_or(CompileError::NoExpression)?
        .as_bytes();
    let pattern = match pattern.iter().position(|&c| c == 0) {
        Some(len) => &pattern[..len],
        None => pattern,
    };

    // first pass: determine size and legality.
    let mut sizing = Parser::new(pattern, SizeCounter::new());
    sizing.program()?;
    let size = sizing.emitter.size();
    if size >= MAX_PROGRAM_SIZE {
        return Err(CompileError::TooLarge);
    }

    // second pass: emit code.
    let mut emitting = Parser::new(pattern, CodeWriter::with_size(size));
    let flags = emitting.program()?;
    let code = emitting.emitter.into_code();

    let hints = optimizer::hints(&code, flags.sp_start);
    log::debug!(
        "compiled {:?} into {} bytes, {:?}",
        String::from_utf8_lossy(pattern),
        code.len(),
        hints
    );

    Ok(Program::new(code, hints))
}
