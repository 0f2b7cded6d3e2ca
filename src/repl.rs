// repl.rs

use crate::completion::ShellHelper;
use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::shell::Shell;
use bytes::BytesMut;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};
use std::io::{self, IsTerminal, Read, Write};
use tracing::info;

/// Where the interpreter gets its input lines from.
pub trait LineSource {
    /// Returns the next line, or `None` once the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError>;
}

/// Interactive input through rustyline.
pub struct EditorSource {
    editor: Editor<ShellHelper, DefaultHistory>,
}

impl EditorSource {
    pub fn new() -> Result<Self, ShellError> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(false)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(ShellHelper::new()));
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            // Ctrl-C drops the current line and reprompts.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Newline-delimited input from any reader, for pipes and files.
///
/// A read of zero bytes ends the input. A last line without a trailing
/// newline is still returned. A line that is not valid UTF-8 is consumed and
/// reported as [`ShellError::InvalidUtf8`]; the next call reads on past it.
pub struct RawSource<R> {
    reader: R,
    buf: BytesMut,
    eof: bool,
    show_prompt: bool,
}

const READ_CHUNK: usize = 1024;

impl<R: Read> RawSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
            show_prompt: false,
        }
    }

    /// Print the prompt to stdout before every read.
    pub fn with_prompt(mut self, show: bool) -> Self {
        self.show_prompt = show;
        self
    }
}

impl<R: Read> LineSource for RawSource<R> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        if self.show_prompt {
            let mut stdout = io::stdout();
            let _ = write!(stdout, "{}", prompt);
            let _ = stdout.flush();
        }
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line = self.buf.split_to(pos + 1);
                return decode(&line).map(Some);
            }
            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = self.buf.split();
                return decode(&rest).map(Some);
            }
            let mut chunk = [0u8; READ_CHUNK];
            match self.reader.read(&mut chunk) {
                Ok(0) => self.eof = true,
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ShellError::Read(e)),
            }
        }
    }
}

fn decode(line: &[u8]) -> Result<String, ShellError> {
    String::from_utf8(line.to_vec()).map_err(|err| ShellError::InvalidUtf8 {
        valid_up_to: err.utf8_error().valid_up_to(),
    })
}

/// Runs an interactive session on the process's stdin and stdout.
///
/// The line editor is used only when stdin is a terminal and it was not
/// turned off in `config`.
pub fn start_repl(config: ShellConfig) -> Result<i32, ShellError> {
    let interactive = io::stdin().is_terminal();
    let mut source: Box<dyn LineSource> = if interactive && config.use_editor {
        Box::new(EditorSource::new()?)
    } else {
        Box::new(RawSource::new(io::stdin()).with_prompt(interactive))
    };
    info!(interactive, editor = interactive && config.use_editor, "starting shell");
    let mut shell = Shell::new(config, io::stdout());
    shell.run(source.as_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(input: &[u8]) -> Vec<String> {
        let mut source = RawSource::new(Cursor::new(input.to_vec()));
        let mut out = Vec::new();
        while let Some(line) = source.read_line("").unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn splits_on_newlines() {
        assert_eq!(lines(b"ls\npwd\n"), vec!["ls\n", "pwd\n"]);
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        assert_eq!(lines(b"ls\njobs"), vec!["ls\n", "jobs"]);
    }

    #[test]
    fn empty_input_is_end_of_input() {
        assert!(lines(b"").is_empty());
    }

    #[test]
    fn lines_longer_than_a_chunk() {
        let long = "x".repeat(READ_CHUNK * 3);
        let input = format!("{}\nls\n", long);
        let got = lines(input.as_bytes());
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].trim_end(), long);
    }

    #[test]
    fn invalid_utf8_is_rejected_and_skipped() {
        let mut source = RawSource::new(Cursor::new(b"touch caf\xe9\nls\n\xff".to_vec()));
        let err = source.read_line("").unwrap_err();
        assert!(matches!(err, ShellError::InvalidUtf8 { valid_up_to: 9 }));
        assert!(!err.is_fatal());
        assert_eq!(source.read_line("").unwrap().as_deref(), Some("ls\n"));
        assert!(matches!(
            source.read_line(""),
            Err(ShellError::InvalidUtf8 { valid_up_to: 0 })
        ));
        assert_eq!(source.read_line("").unwrap(), None);
    }

    #[test]
    fn read_errors_surface() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }
        let err = RawSource::new(Failing).read_line("").unwrap_err();
        assert!(matches!(err, ShellError::Read(_)));
        assert!(err.is_fatal());
    }
}
