//! Brace-dialect scanner: preprocessor conditional blocks and curly-brace
//! function bodies, tracked by two independent state machines fed the same
//! line stream in a single forward pass.

use std::path::Path;

use crate::matcher::{self, HeadSignal, SymbolMatcher};
use crate::types::{CodeBlock, ScanResult};

/// Single-file scanner for the brace dialect.
///
/// Feed lines in file order with [`BraceScanner::push_line`], then call
/// [`BraceScanner::finish`]. The conditional and function machines advance
/// independently, so a conditional block that spans a function boundary
/// confuses neither side.
pub struct BraceScanner<'a> {
    /// Conditional state machine.
    conditional: ConditionalState,
    /// Source file stamped onto emitted blocks.
    file: &'a Path,
    /// Function state machine.
    function: FunctionState,
    /// Symbol recognizer shared across the scan.
    matcher: &'a SymbolMatcher,
    /// Blocks emitted so far.
    result: ScanResult,
}

impl<'a> BraceScanner<'a> {
    /// Consume the scanner. Anything still open at end of file is
    /// malformed input and is dropped, never emitted half-finished.
    pub fn finish(self) -> ScanResult {
        return self.result;
    }

    /// Scanner over one file's lines.
    pub fn new(file: &'a Path, matcher: &'a SymbolMatcher) -> Self {
        return Self {
            conditional: ConditionalState::Outside,
            file,
            function: FunctionState::Outside,
            matcher,
            result: ScanResult::default(),
        };
    }

    /// Advance both state machines by one line.
    pub fn push_line(&mut self, line: &str) {
        let tests_symbol = self.matcher.tests_symbol(line);
        self.step_conditional(line, tests_symbol);
        self.step_function(line, tests_symbol);
        return;
    }

    /// Conditional machine step.
    ///
    /// A symbol test opens a block at nesting one. Any opening directive
    /// inside deepens the nesting, `#endif` unwinds it, and the block
    /// closes when the depth returns to zero. `#elif` and `#else` belong
    /// to the current level and just join the text.
    fn step_conditional(&mut self, line: &str, tests_symbol: bool) {
        let state = std::mem::replace(&mut self.conditional, ConditionalState::Outside);
        self.conditional = match state {
            ConditionalState::Inside { nesting, mut text } => {
                text.push_str(line);
                text.push('\n');
                if matcher::opens_directive(line) {
                    ConditionalState::Inside {
                        nesting: nesting.saturating_add(1),
                        text,
                    }
                } else if matcher::closes_directive(line) {
                    let remaining = nesting.saturating_sub(1);
                    if remaining == 0 {
                        self.result.conditional_blocks.push(CodeBlock {
                            source_file: self.file.to_path_buf(),
                            text,
                        });
                        ConditionalState::Outside
                    } else {
                        ConditionalState::Inside {
                            nesting: remaining,
                            text,
                        }
                    }
                } else {
                    ConditionalState::Inside { nesting, text }
                }
            },
            ConditionalState::Outside => {
                if tests_symbol {
                    ConditionalState::Inside {
                        nesting: 1,
                        text: format!("{line}\n"),
                    }
                } else {
                    ConditionalState::Outside
                }
            },
        };
        return;
    }

    /// Function machine step.
    ///
    /// The close check runs only on lines after the one that opened the
    /// body, so a body opened and closed on a single line stays open until
    /// the next line arrives.
    fn step_function(&mut self, line: &str, tests_symbol: bool) {
        let state = std::mem::replace(&mut self.function, FunctionState::Outside);
        self.function = match state {
            FunctionState::Buffering { mut head } => {
                head.push('\n');
                head.push_str(line);
                if line.contains('{') {
                    FunctionState::InBody {
                        depth: brace_delta(line),
                        relevant: tests_symbol,
                        text: format!("{head}\n"),
                    }
                } else if line.contains(';') {
                    FunctionState::Outside
                } else {
                    FunctionState::Buffering { head }
                }
            },
            FunctionState::InBody {
                depth,
                relevant,
                mut text,
            } => {
                text.push_str(line);
                text.push('\n');
                let relevant = relevant || tests_symbol;
                let depth = depth.saturating_add(brace_delta(line));
                if depth <= 0 {
                    if relevant {
                        self.result.function_blocks.push(CodeBlock {
                            source_file: self.file.to_path_buf(),
                            text,
                        });
                    }
                    FunctionState::Outside
                } else {
                    FunctionState::InBody {
                        depth,
                        relevant,
                        text,
                    }
                }
            },
            FunctionState::Outside => match matcher::function_head(line) {
                None | Some(HeadSignal::Prototype) => FunctionState::Outside,
                Some(HeadSignal::Continues) => FunctionState::Buffering {
                    head: String::from(line),
                },
                Some(HeadSignal::OpensBody) => FunctionState::InBody {
                    depth: brace_delta(line),
                    relevant: tests_symbol,
                    text: format!("{line}\n"),
                },
            },
        };
        return;
    }
}

/// Conditional-block tracking state.
enum ConditionalState {
    /// Accumulating an open block.
    Inside {
        /// Directive nesting depth; the block closes when it reaches zero.
        nesting: u32,
        /// Block text so far, including the opening line.
        text: String,
    },
    /// No symbol-test directive is open.
    Outside,
}

/// Function-body tracking state.
enum FunctionState {
    /// A complete signature was seen without `{` or `;`. Lines join the
    /// head until one of them settles it either way.
    Buffering {
        /// Head lines joined by newlines, no trailing newline.
        head: String,
    },
    /// Inside a function body.
    InBody {
        /// Net brace depth since the line that opened the body.
        depth: i64,
        /// True once any body line tested the symbol.
        relevant: bool,
        /// Body text so far, including the head line(s).
        text: String,
    },
    /// Not tracking anything.
    Outside,
}

/// Net brace depth change contributed by one line.
fn brace_delta(line: &str) -> i64 {
    let mut delta = 0_i64;
    for byte in line.bytes() {
        if byte == b'{' {
            delta = delta.saturating_add(1);
        } else if byte == b'}' {
            delta = delta.saturating_sub(1);
        }
    }
    return delta;
}
