//! Text module: Pure computations over rune sequences.
//!
//! This module contains:
//! - [`diff`]: Longest-common-prefix diff producing an [`Edit`]
//! - [`Batch`]: Segments coalesced while replaying queued keystrokes
//! - [`plan_batch_commit`]: Remainder of an edit whose deletions were partly sent

mod batch;
mod diff;

pub use batch::{plan_batch_commit, Batch, BatchPatch};
pub use diff::{common_prefix_len, diff, diff_str, Edit};
