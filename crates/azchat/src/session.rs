//! Interactive console loop: one line in, at most one completion call, one
//! reply out.

use std::io::{self, Write};

use crate::Result;
use crate::chat_completions::{ChatCompletion, Role};
use crate::transcript::Transcript;

pub const BANNER: &str = "Azure OpenAI Chat (type 'exit' to quit, 'reset' to clear)";
pub const PROMPT: &str = "You> ";
pub const REPLY_PREFIX: &str = "Assistant> ";

/// Source of user input lines.
pub trait LineReader {
    /// Returns `Ok(None)` on end-of-input or when the user interrupts.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Exit,
    Reset,
    Empty,
    Message(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Command::Empty
        } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            Command::Exit
        } else if line.eq_ignore_ascii_case("reset") {
            Command::Reset
        } else {
            Command::Message(line)
        }
    }
}

pub struct Session<C> {
    client: C,
    transcript: Transcript,
}

impl<C: ChatCompletion> Session<C> {
    pub fn new(client: C, transcript: Transcript) -> Self {
        Self { client, transcript }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn reset(&mut self) {
        self.transcript.reset();
    }

    /// Runs one conversation turn. On success the transcript grows by the
    /// user message and the reply; on failure it is left as it was.
    pub async fn turn(&mut self, input: &str) -> Result<String> {
        self.transcript.append(Role::User, input);

        match self.client.complete(&self.transcript).await {
            Ok(reply) => {
                self.transcript.append(Role::Assistant, reply.as_str());
                Ok(reply)
            }
            Err(e) => {
                self.transcript.rollback_last();
                tracing::debug!(error = %e, "completion failed, rolled back user message");
                Err(e)
            }
        }
    }

    /// Reads lines until `exit`/`quit` or end-of-input. Per-turn failures are
    /// written to `err` and never end the loop; only I/O errors on the console
    /// streams do.
    pub async fn run<R, O, E>(&mut self, reader: &mut R, out: &mut O, err: &mut E) -> Result<()>
    where
        R: LineReader,
        O: Write,
        E: Write,
    {
        writeln!(out, "{BANNER}")?;
        out.flush()?;

        loop {
            let Some(line) = reader.read_line(PROMPT)? else {
                writeln!(out)?;
                break;
            };

            match Command::parse(&line) {
                Command::Empty => continue,
                Command::Exit => break,
                Command::Reset => {
                    self.reset();
                    writeln!(out, "(history cleared)")?;
                }
                Command::Message(input) => match self.turn(input).await {
                    Ok(reply) => writeln!(out, "{REPLY_PREFIX}{reply}")?,
                    Err(e) => {
                        writeln!(err, "Error: {e}")?;
                        err.flush()?;
                    }
                },
            }
            out.flush()?;
        }

        out.flush()?;
        Ok(())
    }
}
