//! Saved-game format.
//!
//! A snapshot is the postcard encoding of a [`Snapshot`] framed by a short
//! magic/version header and a CRC32C trailer, so truncated or bit-flipped
//! files are rejected before any field is trusted.

mod snapshot;

pub use snapshot::{
    Snapshot,
    SnapshotError,
    encode,
    decode,
    write_to_path,
    read_from_path,
};
