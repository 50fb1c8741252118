use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// JSON Lines by default, indented JSON per entry with `pretty`.
pub struct RecordWriter {
    out: Box<dyn Write>,
    pretty: bool,
    written: usize,
}

impl RecordWriter {
    pub fn new(out: Box<dyn Write>, pretty: bool) -> Self {
        Self {
            out,
            pretty,
            written: 0,
        }
    }

    /// `path` or stdout.
    pub fn open(path: Option<&Path>, pretty: bool) -> Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(p) => {
                let file = File::create(p).with_context(|| format!("Failed to create {:?}", p))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout())),
        };
        Ok(Self::new(out, pretty))
    }

    pub fn write<T: Serialize>(&mut self, entry: &T) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, entry)?;
        } else {
            serde_json::to_writer(&mut self.out, entry)?;
        }
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<usize> {
        self.out.flush().context("Failed to flush output")?;
        Ok(self.written)
    }
}
