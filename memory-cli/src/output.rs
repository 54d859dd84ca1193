//! Shared `--format human|json` rendering, matching the teacher's
//! `OutputFormat`/`Output` trait shape (without the YAML variant: nothing in
//! this CLI's surface benefits from a YAML rendering).

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colorized, human-oriented text.
    Human,
    /// Pretty-printed JSON for scripting.
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Human
    }
}

/// Implemented by every command's result type so it can render in either
/// format without the command bodies branching on `OutputFormat` directly.
pub trait Output: Serialize {
    fn write_human<W: Write>(&self, writer: W) -> anyhow::Result<()>;

    fn write_json<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    fn write<W: Write>(&self, writer: W, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Human => self.write_human(writer),
            OutputFormat::Json => self.write_json(writer),
        }
    }
}

impl OutputFormat {
    /// Render `data` to stdout in this format.
    pub fn print<T: Output>(self, data: &T) -> anyhow::Result<()> {
        data.write(io::stdout(), self)
    }
}
