//! Indent-dialect scanner: `def`-delimited function bodies and eagerly
//! captured `if`/`elif app.SYMBOL` blocks, delimited by indentation depth
//! instead of braces.
//!
//! Unlike the brace dialect, the two concerns are entangled: an active
//! capture consumes lines before ordinary handling sees them, and the line
//! that terminates a capture is handed back so it can close a function,
//! open a new capture, or start a `def` of its own.

use std::path::Path;

use crate::matcher::{self, SymbolMatcher};
use crate::types::{CodeBlock, ScanResult};

/// An in-progress conditional capture.
struct Capture {
    /// Indentation depth of the opening `if`/`elif` line.
    indent: usize,
    /// Blank lines waiting for a deeper non-blank line before they may
    /// join the block. Dropped if the block ends first.
    pending_blanks: String,
    /// Block text so far, including the opening line.
    text: String,
}

/// Single-file scanner for the indent dialect.
///
/// Feed lines in file order with [`IndentScanner::push_line`], then call
/// [`IndentScanner::finish`].
pub struct IndentScanner<'a> {
    /// Active conditional capture, if any.
    capture: Option<Capture>,
    /// Source file stamped onto emitted blocks.
    file: &'a Path,
    /// Currently open `def` body, if any.
    function: Option<OpenFunction>,
    /// Symbol recognizer shared across the scan.
    matcher: &'a SymbolMatcher,
    /// Blocks emitted so far.
    result: ScanResult,
}

impl<'a> IndentScanner<'a> {
    /// Close the open function, emitting it when relevant.
    fn close_function(&mut self) {
        let Some(function) = self.function.take() else {
            return;
        };
        if function.relevant {
            self.result.function_blocks.push(CodeBlock {
                source_file: self.file.to_path_buf(),
                text: function.text,
            });
        }
        return;
    }

    /// Close the active capture and emit its block. Pending blank lines
    /// never made it into the block and are dropped here.
    fn emit_capture(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        self.result.conditional_blocks.push(CodeBlock {
            source_file: self.file.to_path_buf(),
            text: capture.text,
        });
        return;
    }

    /// Consume the scanner at end of file. An open capture emits its
    /// block, and an open function emits when relevant; indentation has
    /// no closing token, so end of file is a legitimate terminator.
    pub fn finish(mut self) -> ScanResult {
        self.emit_capture();
        self.close_function();
        return self.result;
    }

    /// Scanner over one file's lines.
    pub fn new(file: &'a Path, matcher: &'a SymbolMatcher) -> Self {
        return Self {
            capture: None,
            file,
            function: None,
            matcher,
            result: ScanResult::default(),
        };
    }

    /// Advance the scanner by one line.
    pub fn push_line(&mut self, line: &str) {
        if self.step_capture(line) {
            return;
        }
        self.step_line(line);
        return;
    }

    /// Advance an active capture. Returns true when the capture consumed
    /// the line; false hands the line back to ordinary handling, with the
    /// capture already closed and emitted.
    fn step_capture(&mut self, line: &str) -> bool {
        let Some(capture) = self.capture.as_mut() else {
            return false;
        };
        if is_blank(line) {
            capture.pending_blanks.push_str(line);
            capture.pending_blanks.push('\n');
            append_function_line(&mut self.function, line);
            return true;
        }
        if indent_of(line) > capture.indent {
            // A deeper line legitimizes any blanks sitting between it and
            // the block body.
            capture.text.push_str(&capture.pending_blanks);
            capture.pending_blanks.clear();
            capture.text.push_str(line);
            capture.text.push('\n');
            append_function_line(&mut self.function, line);
            return true;
        }
        self.emit_capture();
        return false;
    }

    /// Ordinary per-line handling: `def` boundaries, function body
    /// accumulation, and capture starts.
    fn step_line(&mut self, line: &str) {
        if is_blank(line) {
            append_function_line(&mut self.function, line);
            return;
        }
        if matcher::opens_definition(line) {
            self.close_function();
            self.function = Some(OpenFunction {
                indent: indent_of(line),
                relevant: false,
                text: format!("{line}\n"),
            });
            return;
        }
        if let Some(function) = &self.function
            && indent_of(line) <= function.indent
        {
            self.close_function();
        }
        let tests_symbol = self.matcher.tests_symbol(line);
        if let Some(function) = self.function.as_mut() {
            function.text.push_str(line);
            function.text.push('\n');
            if tests_symbol {
                function.relevant = true;
            }
        }
        if tests_symbol {
            self.capture = Some(Capture {
                indent: indent_of(line),
                pending_blanks: String::new(),
                text: format!("{line}\n"),
            });
        }
        return;
    }
}

/// An open `def` body.
struct OpenFunction {
    /// Indentation depth of the `def` line itself.
    indent: usize,
    /// True once any contained line tested the symbol.
    relevant: bool,
    /// Body text so far, including the `def` line.
    text: String,
}

/// Append a line to the open function's buffer, if one is open.
fn append_function_line(function: &mut Option<OpenFunction>, line: &str) {
    if let Some(function) = function.as_mut() {
        function.text.push_str(line);
        function.text.push('\n');
    }
    return;
}

/// Indentation depth: the count of leading space and tab bytes, each
/// weighing one.
fn indent_of(line: &str) -> usize {
    return line
        .bytes()
        .take_while(|&b| return b == b' ' || b == b'\t')
        .count();
}

/// True for lines containing only whitespace.
fn is_blank(line: &str) -> bool {
    return line.trim().is_empty();
}
