use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Writes a JSON array one element at a time.
///
/// The opening bracket goes out on construction, each element is flushed as
/// soon as it is appended, and the closing bracket is written by [`finish`].
/// If the run aborts before `finish`, the file is left without its closing
/// bracket.
///
/// [`finish`]: ResultStreamWriter::finish
#[derive(Debug)]
pub struct ResultStreamWriter<W: Write> {
    writer: W,
    written: usize,
}

impl ResultStreamWriter<BufWriter<File>> {
    /// Creates (or truncates) `path` and writes the opening bracket
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> ResultStreamWriter<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writer.write_all(b"[\n")?;
        Ok(Self { writer, written: 0 })
    }

    /// Appends one element, preceded by a separator unless it is the first
    pub fn append<T: Serialize>(&mut self, item: &T) -> Result<()> {
        if self.written > 0 {
            self.writer.write_all(b",\n")?;
        }
        serde_json::to_writer_pretty(&mut self.writer, item)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of elements appended so far
    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Writes the closing bracket and hands back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.write_all(b"\n]")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
