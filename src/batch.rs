//! Splitting UID lists into chunks small enough for a single command.
//!
//! Servers limit how long a command line may be, so a bulk operation over thousands of messages
//! is issued as a sequence of commands, each naming at most [`ChunkSize`] UIDs.
//!
//! ```
//! use imap_bulk::{plan, ChunkSize};
//!
//! let chunks = plan(&[1, 2, 3, 4, 5], ChunkSize::new(2));
//! let sets: Vec<String> = chunks.iter().map(|c| c.to_string()).collect();
//! assert_eq!(sets, ["1,2", "3,4", "5"]);
//! ```

use std::fmt;
use std::ops::Deref;

pub use imap::types::Uid;

use crate::utils::iter_join_onto;

/// The largest number of UIDs sent in a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// The size used when none (or a non-positive one) is configured.
    pub const DEFAULT: ChunkSize = ChunkSize(10);

    /// Make a chunk size from a possibly unset or non-positive value, falling back to
    /// [`ChunkSize::DEFAULT`].
    pub fn new(size: i64) -> Self {
        if size <= 0 {
            Self::DEFAULT
        } else {
            ChunkSize(usize::try_from(size).unwrap_or(usize::MAX))
        }
    }

    /// The bound as a count of UIDs.
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A non-empty, ordered run of UIDs that is sent to the server as one UID set.
///
/// The `Display` implementation renders the chunk as an IMAP UID set (`1,2,3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(Vec<Uid>);

impl Chunk {
    /// The UIDs in this chunk, in the order they were given.
    pub fn uids(&self) -> &[Uid] {
        &self.0
    }
}

impl Deref for Chunk {
    type Target = [Uid];

    fn deref(&self) -> &[Uid] {
        &self.0
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        iter_join_onto(f, &self.0, ",")
    }
}

/// Partition `uids` into chunks of at most `size` UIDs.
///
/// Every chunk but the last holds exactly `size` UIDs. The input order is kept and nothing is
/// dropped or deduplicated, so concatenating the chunks gives back `uids`. An empty list yields no
/// chunks at all.
pub fn plan(uids: &[Uid], size: ChunkSize) -> Vec<Chunk> {
    uids.chunks(size.get())
        .map(|chunk| Chunk(chunk.to_vec()))
        .collect()
}
