//! Multipart upload pipeline
//!
//! Parts flow from the tokenizer through [`classifier`], file parts are read by a
//! [`accumulator::StreamAccumulator`] running on its own task, and validated values are
//! merged by [`assembler`]. [`decoder::MultipartDecoder`] drives the whole decode.

pub mod accumulator;
pub mod assembler;
pub mod classifier;
pub mod decoder;

pub use accumulator::{
    AccumulatorState, ChunkError, ChunkEvent, FileCandidate, Settlement, StreamAccumulator,
};
pub use assembler::{append_file, append_scalar};
pub use classifier::{classify, FilePart, PartKind, RawPart, SkipReason};
pub use decoder::{is_multipart_form_data, DecodeOutcome, MultipartDecoder};
