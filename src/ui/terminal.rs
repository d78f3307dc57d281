use std::io::{self, Write};

use crate::core::message::{Part, Turn};
use crate::ui::surface::{ChatSurface, STREAM_CURSOR};

pub const INPUT_PLACEHOLDER: &str = "Ask me about your code...";
const RETRY_HINT: &str =
    "Please try again. If the issue persists, verify your API key or the model's availability.";
/// Moves back over the cursor marker and blanks it.
const ERASE_CURSOR: &str = "\u{8} \u{8}";

/// Line-oriented surface: replies stream in place, errors go to the error
/// writer.
pub struct TerminalSurface<O: Write, E: Write> {
    out: O,
    err: E,
    printed: String,
    cursor_shown: bool,
    echo_user: bool,
}

impl TerminalSurface<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalSurface<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            printed: String::new(),
            cursor_shown: false,
            echo_user: true,
        }
    }

    /// Skip echoing user turns, for one-shot use where the prompt came from
    /// the command line.
    pub fn without_user_echo(mut self) -> Self {
        self.echo_user = false;
        self
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn advance_to(&mut self, text: &str) -> io::Result<()> {
        if self.cursor_shown {
            write!(self.out, "{ERASE_CURSOR}")?;
            self.cursor_shown = false;
        }
        match text.strip_prefix(self.printed.as_str()) {
            Some(delta) => write!(self.out, "{delta}")?,
            // The reply no longer extends what is on screen; start over.
            None => write!(self.out, "\n{text}")?,
        }
        self.printed = text.to_string();
        Ok(())
    }

    fn write_stream(&mut self, partial: &str) -> io::Result<()> {
        let text = partial.strip_suffix(STREAM_CURSOR).unwrap_or(partial);
        self.advance_to(text)?;
        write!(self.out, "{STREAM_CURSOR}")?;
        self.cursor_shown = true;
        self.out.flush()
    }

    fn write_assistant(&mut self, turn: &Turn) -> io::Result<()> {
        self.advance_to(&turn.text())?;
        writeln!(self.out)?;
        writeln!(self.out)?;
        self.printed.clear();
        self.out.flush()
    }

    fn write_user(&mut self, turn: &Turn) -> io::Result<()> {
        if !self.echo_user {
            return Ok(());
        }
        for part in &turn.parts {
            match part {
                Part::Text(text) => writeln!(self.out, "You: {text}")?,
                Part::Image(image) => writeln!(
                    self.out,
                    "You: [{} image, {}x{}]",
                    image.format.as_str(),
                    image.width(),
                    image.height()
                )?,
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn write_error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "❌ {message}")?;
        if message.starts_with("An error occurred while generating response") {
            writeln!(self.err, "⚠️  {RETRY_HINT}")?;
        }
        self.err.flush()
    }
}

fn report(result: io::Result<()>) {
    if let Err(err) = result {
        tracing::debug!("terminal write failed: {err}");
    }
}

impl<O: Write, E: Write> ChatSurface for TerminalSurface<O, E> {
    fn display_user_turn(&mut self, turn: &Turn) {
        report(self.write_user(turn));
    }

    fn display_assistant_stream(&mut self, partial: &str) {
        report(self.write_stream(partial));
    }

    fn display_assistant_turn(&mut self, turn: &Turn) {
        report(self.write_assistant(turn));
    }

    fn display_error(&mut self, message: &str) {
        report(self.write_error(message));
    }
}
