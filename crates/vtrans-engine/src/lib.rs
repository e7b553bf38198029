// crates/vtrans-engine/src/lib.rs
//
// The orchestrator: everything that touches a demuxer/decoder/filter
// graph/encoder/muxer lives here, behind the trait boundary in
// `collaborators`. vtrans-core stays free of all of it — this crate is
// where the two meet.

pub mod chooser;
pub mod collaborators;
pub mod error;
pub mod input_driver;
pub mod iter;
pub mod packet;
pub mod stats;
pub mod subtitle;
pub mod supervisor;

#[cfg(test)]
mod mock;

pub use collaborators::{DemuxOutcome, Demuxer, Decoder, Encoder, FilterRuntime, Muxer, Packet};
pub use error::{Error, Result};
pub use supervisor::{exit_code, Collaborators, Supervisor};

pub use vtrans_core::StreamId;
