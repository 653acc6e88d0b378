//! Line classification for both dialects: symbol-test recognition plus
//! the fixed structural patterns (directives, function heads, `def` lines).
//!
//! Everything here is line-oriented. No token or syntax trees are built;
//! a line either matches a pattern or it does not.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::types::Dialect;

/// Opens a conditional region regardless of the tested symbol.
static ANY_DIRECTIVE_START: LazyLock<Regex> =
    LazyLock::new(|| return compiled(r"^\s*#\s*(if|ifdef|ifndef)\b"));

/// Starts an indent-dialect function body.
static DEFINITION_HEAD: LazyLock<Regex> = LazyLock::new(|| return compiled(r"^\s*def\s+\w+\s*\("));

/// Closes the innermost conditional region.
static DIRECTIVE_END: LazyLock<Regex> = LazyLock::new(|| return compiled(r"^\s*#\s*endif\b"));

/// A plausible brace-dialect function head.
///
/// Optional specifiers, a return type, a name, and a closed argument list.
/// Group 1 captures what follows the arguments: `{` opens a body, `;` ends
/// a prototype, end of line means the head continues. Control statements
/// like `if (x) {` fail the type-then-name shape, and `=` before the
/// parenthesis rules out assignments, so neither needs special casing.
static FUNCTION_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    return compiled(
        r"^\s*(?:inline\s+|static\s+|virtual\s+|constexpr\s+|friend\s+|typename\s+|[\w:*&<>]+\s+)*[\w:*&<>]+\s+\w[\w:*&<>]*\s*\([^)]*\)\s*(\{|;|$)",
    );
});

/// What a line that looks like a function head tells the scanner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadSignal {
    /// Complete signature with neither `{` nor `;` yet: buffer the line
    /// and wait for the body or a prototype terminator.
    Continues,
    /// The head's own line contains `{`: the body starts here.
    OpensBody,
    /// Terminated by `;`: a prototype, nothing to extract.
    Prototype,
}

/// Recognizer for lines that test one configuration symbol, compiled once
/// per scan and shared read-only across workers.
#[derive(Debug)]
pub struct SymbolMatcher {
    /// Dialect the pattern was built for.
    dialect: Dialect,
    /// The symbol-test pattern itself.
    test: Regex,
}

impl SymbolMatcher {
    /// Dialect this matcher was built for.
    pub fn dialect(&self) -> Dialect {
        return self.dialect;
    }

    /// Build the symbol-test recognizer for one symbol. The symbol is
    /// escaped, so regex metacharacters in a name cannot widen the match.
    ///
    /// # Errors
    ///
    /// Returns `Error::Regex` if the assembled pattern fails to compile.
    pub fn new(dialect: Dialect, symbol: &str) -> Result<Self, Error> {
        let sym = regex::escape(symbol);
        let pattern = match dialect {
            Dialect::Brace => format!(
                r"(^\s*#(ifdef|ifndef)\s+{sym}\b)|(^\s*#(if|elif)\s+defined\s*\(\s*{sym}\s*\))|(^\s*#(if|elif)\s+defined\s+{sym})|(^\s*#(if|elif)\s+\(?\s*{sym}\s*\)?)"
            ),
            Dialect::Indent => format!(r"^\s*(?:if|elif)\b\s*\(?\s*app\.{sym}\b"),
        };
        let test = Regex::new(&pattern)?;
        return Ok(Self { dialect, test });
    }

    /// True when the line tests the symbol this matcher was built for.
    pub fn tests_symbol(&self, line: &str) -> bool {
        return self.test.is_match(line);
    }
}

/// True for `#endif` lines, tolerating whitespace after the `#`.
pub fn closes_directive(line: &str) -> bool {
    return DIRECTIVE_END.is_match(line);
}

/// Compile a pattern known to be valid.
#[allow(
    clippy::expect_used,
    reason = "patterns are fixed literals, exercised by the matcher tests"
)]
pub(crate) fn compiled(pattern: &str) -> Regex {
    return Regex::new(pattern).expect("hardcoded pattern must compile");
}

/// Classify a line as a brace-dialect function head, if it is one.
/// Returns None for ordinary lines, control statements, and assignments.
pub fn function_head(line: &str) -> Option<HeadSignal> {
    let captures = FUNCTION_HEAD.captures(line)?;
    let trailing = captures.get(1).map_or("", |m| return m.as_str());
    return match trailing {
        "{" => Some(HeadSignal::OpensBody),
        ";" => Some(HeadSignal::Prototype),
        _ => Some(HeadSignal::Continues),
    };
}

/// True for `def name(` lines in the indent dialect.
pub fn opens_definition(line: &str) -> bool {
    return DEFINITION_HEAD.is_match(line);
}

/// True for any conditional-opening directive, whatever it tests.
pub fn opens_directive(line: &str) -> bool {
    return ANY_DIRECTIVE_START.is_match(line);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn brace(symbol: &str) -> SymbolMatcher {
        return SymbolMatcher::new(Dialect::Brace, symbol).unwrap();
    }

    fn indent(symbol: &str) -> SymbolMatcher {
        return SymbolMatcher::new(Dialect::Indent, symbol).unwrap();
    }

    #[test]
    fn brace_matches_every_directive_form() {
        let m = brace("FEATURE_X");
        assert!(m.tests_symbol("#ifdef FEATURE_X"));
        assert!(m.tests_symbol("#ifndef FEATURE_X"));
        assert!(m.tests_symbol("#if defined(FEATURE_X)"));
        assert!(m.tests_symbol("#if defined ( FEATURE_X )"));
        assert!(m.tests_symbol("#if defined FEATURE_X"));
        assert!(m.tests_symbol("#if FEATURE_X"));
        assert!(m.tests_symbol("#if (FEATURE_X)"));
        assert!(m.tests_symbol("#elif defined(FEATURE_X)"));
        assert!(m.tests_symbol("#elif FEATURE_X"));
        assert!(m.tests_symbol("  #if FEATURE_X"));
    }

    #[test]
    fn brace_rejects_other_symbols_and_non_tests() {
        let m = brace("FEATURE_X");
        assert!(!m.tests_symbol("#ifdef FEATURE_X2"));
        assert!(!m.tests_symbol("#ifdef OTHER"));
        assert!(!m.tests_symbol("#endif"));
        assert!(!m.tests_symbol("#define FEATURE_X 1"));
        assert!(!m.tests_symbol("#if 0 // FEATURE_X disabled"));
        assert!(!m.tests_symbol("int feature_x = 0;"));
    }

    #[test]
    fn directive_recognizers_tolerate_interior_whitespace() {
        assert!(opens_directive("# ifdef ANYTHING"));
        assert!(opens_directive("  #if X > 2"));
        assert!(opens_directive("#ifndef GUARD_H"));
        assert!(!opens_directive("#define X"));
        assert!(closes_directive("#endif"));
        assert!(closes_directive(" # endif // FEATURE_X"));
        assert!(!closes_directive("#else"));
    }

    #[test]
    fn function_head_classifies_bodies_prototypes_and_continuations() {
        assert_eq!(function_head("void draw(int x) {"), Some(HeadSignal::OpensBody));
        assert_eq!(function_head("void draw(int x);"), Some(HeadSignal::Prototype));
        assert_eq!(
            function_head("std::string render(const Widget& w)"),
            Some(HeadSignal::Continues)
        );
        assert_eq!(
            function_head("static inline int clamp(int v, int lo, int hi) {"),
            Some(HeadSignal::OpensBody)
        );
    }

    #[test]
    fn function_head_rejects_control_flow_statements_and_assignments() {
        assert_eq!(function_head("if (ready) {"), None);
        assert_eq!(function_head("while (true) {"), None);
        assert_eq!(function_head("for (int i = 0; i < n; i++) {"), None);
        assert_eq!(function_head("switch (mode) {"), None);
        assert_eq!(function_head("int x = compute(y);"), None);
        assert_eq!(function_head("obj.method();"), None);
        assert_eq!(function_head("#if defined(FEATURE_X)"), None);
    }

    #[test]
    fn function_head_requires_a_closed_argument_list() {
        assert_eq!(function_head("void draw(int x,"), None);
        assert_eq!(function_head("    int y) {"), None);
    }

    #[test]
    fn indent_matches_if_and_elif_tests() {
        let m = indent("DEBUG_MODE");
        assert!(m.tests_symbol("if app.DEBUG_MODE:"));
        assert!(m.tests_symbol("elif app.DEBUG_MODE:"));
        assert!(m.tests_symbol("    if app.DEBUG_MODE and ready:"));
        assert!(m.tests_symbol("if (app.DEBUG_MODE):"));
    }

    #[test]
    fn indent_requires_whole_word_and_app_prefix() {
        let m = indent("DEBUG");
        assert!(!m.tests_symbol("if app.DEBUG_MODE:"));
        assert!(!m.tests_symbol("if DEBUG:"));
        assert!(!m.tests_symbol("x = app.DEBUG"));
        assert!(!m.tests_symbol("ifapp.DEBUG:"));
    }

    #[test]
    fn symbol_names_are_escaped_before_compilation() {
        let m = SymbolMatcher::new(Dialect::Brace, "A.B").unwrap();
        assert!(m.tests_symbol("#ifdef A.B"));
        assert!(!m.tests_symbol("#ifdef AxB"));
    }
}
