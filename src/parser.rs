// parser.rs

use crate::error::TokenizeError;

/// Default upper bound for a single input line, in bytes.
pub const DEFAULT_MAX_LINE: usize = 4096;

/// One tokenized input line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    pub args: Vec<String>,
    /// Set when the line ended with `&`.
    pub background: bool,
}

impl ParsedLine {
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Splits `line` on runs of spaces and tabs.
///
/// A trailing `&`, either as its own token or glued to the last argument, is
/// removed and turns on `background`. Any other `&` is kept as a literal
/// character. A line terminator (`\n` or `\r\n`) is ignored.
pub fn tokenize(line: &str, max_line: usize) -> Result<ParsedLine, TokenizeError> {
    let line = line
        .strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line);
    if line.len() > max_line {
        return Err(TokenizeError::LineTooLong {
            len: line.len(),
            max: max_line,
        });
    }

    let mut args = Vec::new();
    let mut cur = String::new();
    for ch in line.chars() {
        match ch {
            ' ' | '\t' => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            _ => cur.push(ch),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }

    let mut background = false;
    if let Some(last) = args.last_mut() {
        if last.ends_with('&') {
            background = true;
            last.pop();
            if last.is_empty() {
                args.pop();
            }
        }
    }
    // A lone `&` carries nothing to run.
    if args.is_empty() {
        background = false;
    }

    Ok(ParsedLine { args, background })
}
