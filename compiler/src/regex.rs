//! A reusable compiled expression object that holds at most one program at a
//! time.

use regexp_runtime::{run, Captures, MatchError, Program};

use crate::compiler::{compile, CompileError};

/// Couples a compiled program with the operations for searching an input.
///
/// A `Regex` may be empty, in which case every search fails. A failed
/// compilation leaves the previously held program in place.
///
/// # Example
///
/// ```
/// use regexp_compiler::Regex;
///
/// let mut re = Regex::new("wor(ld)").unwrap();
/// let captures = re.find("hello\nworld").unwrap();
/// assert_eq!(Some(6..11), captures.get(0).map(|m| m.range()));
/// assert_eq!(Some(&b"ld"[..]), captures.get(1).map(|m| m.as_bytes()));
///
/// assert!(re.compile("(").is_err());
/// assert!(re.is_match("world"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Regex {
    program: Option<Program>,
}

impl Regex {
    /// Compiles `pattern` into a new expression object.
    pub fn new<'a, P>(pattern: P) -> Result<Self, CompileError>
    where
        P: Into<Option<&'a str>>,
    {
        let mut re = Self::default();
        re.compile(pattern)?;
        Ok(re)
    }

    /// Replaces the held program with one compiled from `pattern`. On failure
    /// the previous program is retained.
    pub fn compile<'a, P>(&mut self, pattern: P) -> Result<(), CompileError>
    where
        P: Into<Option<&'a str>>,
    {
        self.program = Some(compile(pattern)?);
        Ok(())
    }

    /// Searches `haystack` for the leftmost match, returning its captures.
    ///
    /// A corrupted program, or an attempt that exceeds the recursion limit,
    /// is logged and treated as no match. See [`Regex::try_find`] to observe
    /// the error instead.
    pub fn find<'h, H>(&self, haystack: &'h H) -> Option<Captures<'h>>
    where
        H: AsRef<[u8]> + ?Sized,
    {
        match self.try_find(haystack) {
            Ok(captures) => captures,
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    /// Like [`Regex::find`] but surfaces errors raised while walking the
    /// program. An empty object never matches.
    pub fn try_find<'h, H>(&self, haystack: &'h H) -> Result<Option<Captures<'h>>, MatchError>
    where
        H: AsRef<[u8]> + ?Sized,
    {
        match &self.program {
            Some(program) => run(program, haystack),
            None => Ok(None),
        }
    }

    pub fn is_match<H>(&self, haystack: &H) -> bool
    where
        H: AsRef<[u8]> + ?Sized,
    {
        self.find(haystack).is_some()
    }

    /// Returns true if the object holds a program.
    pub fn is_valid(&self) -> bool {
        self.program.is_some()
    }

    /// Discards the held program.
    pub fn set_invalid(&mut self) {
        self.program = None;
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_retain_previous_program_on_failed_compile() {
        let mut re = Regex::new("ab").unwrap();
        let before = re.clone();

        assert_eq!(Err(CompileError::NestedQuantifier), re.compile("a**"));
        assert_eq!(before, re);
        assert!(re.is_match("xab"));
    }

    #[test]
    fn should_produce_identical_programs_on_recompilation() {
        let mut re = Regex::new("(a|b)*c").unwrap();
        let first = re.clone();

        re.compile("(a|b)*c").unwrap();
        assert_eq!(first, re);
        assert_eq!(
            first.find("abac").map(|c| c.get(1).map(|m| m.range())),
            re.find("abac").map(|c| c.get(1).map(|m| m.range()))
        );
    }

    #[test]
    fn should_fail_every_search_when_empty() {
        let mut re = Regex::new("a").unwrap();
        assert!(re.is_valid());

        re.set_invalid();
        assert!(!re.is_valid());
        assert!(re.find("a").is_none());
        assert_eq!(Ok(None), re.try_find("a"));

        assert!(!Regex::default().is_valid());
        assert_eq!(Ok(None), Regex::default().try_find(""));
    }

    #[test]
    fn should_reject_missing_pattern() {
        assert_eq!(Err(CompileError::NoExpression), Regex::new(None));
    }
}
