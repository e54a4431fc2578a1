//! Marker sinks.

use std::io::Write;

use crate::error::Result;

use super::markers::MarkerArray;

/// Destination for marker batches.
pub trait MarkerPublisher {
    /// Publish one batch.
    fn publish(&mut self, markers: &MarkerArray) -> Result<()>;
}

/// Writes each batch as one JSON document per line.
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
    published: usize,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            published: 0,
        }
    }

    /// Number of batches written so far.
    pub fn published(&self) -> usize {
        self.published
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MarkerPublisher for JsonLinesPublisher<W> {
    fn publish(&mut self, markers: &MarkerArray) -> Result<()> {
        serde_json::to_writer(&mut self.writer, markers)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.published += 1;
        Ok(())
    }
}
