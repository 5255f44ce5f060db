//! Pure balance and settlement computations.
//!
//! Everything in this module operates on values in and values out: no
//! storage, no clocks, no shared state. Callers may invoke it concurrently
//! on independent snapshots.

use std::fmt::Debug;
use std::hash::Hash;

pub mod ledger;
pub mod settle;
pub mod split;

pub use ledger::{Ledger, fold_split, net_total};
pub use settle::{Transfer, apply, minimize};
pub use split::{Split, compute_split, filter_participants};

/// Identity bound for engine participants.
///
/// The engine never interprets identifiers; it only needs them hashable,
/// clonable, and totally ordered. The ordering doubles as the deterministic
/// iteration and tie-break order, so integer ids, names, and UUIDs all work.
pub trait ParticipantId: Clone + Eq + Ord + Hash + Debug {}

impl<T: Clone + Eq + Ord + Hash + Debug> ParticipantId for T {}
