//! Streaming control loops: one reader and one writer per pipeline run,
//! synchronized only through their staging buffers.

mod reader;
mod writer;

pub use reader::{ReaderReport, StreamReader};
pub use writer::{StreamWriter, WriterReport};
