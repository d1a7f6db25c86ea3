//! Tile streaming between backing storage and bounded staging buffers, with
//! a block-scaled MXFP4 codec on the transfer path.
//!
//! The compute stage that consumes staged input tiles and produces output
//! tiles is an external collaborator: it sees only the staging buffer
//! endpoints. A pipeline run wires one [`StreamReader`] and one
//! [`StreamWriter`] to it through [`staging_pair`] instances and drives each
//! stage on its own thread.

pub use args::{OperandArgs, READER_ARG_COUNT, ReaderArgs, WRITER_ARG_COUNT, WriterArgs};
pub use codec::{
    EncodeStats, MXFP4_BLOCK_BYTES, MXFP4_BLOCK_VALUES, MXFP4_BLOCK_WORDS, Mxfp4Codec,
};
pub use config::{BufferId, CB_IN0, CB_IN1, CB_OUT, TileFormat, TileGeometry};
pub use error::TileFlowError;
pub use staging::{StagingConsumer, StagingProducer, staging_pair};
pub use stages::{ReaderReport, StreamReader, StreamWriter, WriterReport};
pub use transfer::{DramTensor, TransferQueue, TransferToken};

pub mod addressing;
pub mod args;
pub mod codec;
pub mod config;
pub mod error;
pub mod staging;
pub mod stages;
pub mod transfer;
