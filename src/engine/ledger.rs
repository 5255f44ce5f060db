//! Net-balance aggregation across expenses.

use crate::engine::ParticipantId;
use crate::engine::split::Split;
use crate::models::Money;
use std::collections::BTreeMap;

/// Net balance per participant. Negative = owes money, positive = is owed.
///
/// Keyed by a `BTreeMap` so iteration (and therefore settlement tie-breaks)
/// always runs in ascending participant order.
pub type Ledger<P> = BTreeMap<P, Money>;

/// Fold one expense's split into a ledger.
///
/// Takes ownership of the ledger and returns the new state. Each owed share
/// is debited from its participant; the payer is credited with the sum of
/// the split's entries rather than the nominal expense amount, so the deltas
/// of a single fold always cancel exactly. Missing entries default to zero.
///
/// Splits are rounded to the minor unit before they reach this point, so
/// folding the same expenses in any order produces the same ledger.
pub fn fold_split<P: ParticipantId>(mut ledger: Ledger<P>, split: &Split<P>, payer: &P) -> Ledger<P> {
    let mut credited = Money::zero();
    for (participant, owed) in split.iter() {
        *ledger.entry(participant.clone()).or_default() -= owed;
        credited += owed;
    }
    *ledger.entry(payer.clone()).or_default() += credited;
    ledger
}

/// Sum of all ledger entries; zero for any ledger built purely by folding.
pub fn net_total<P: ParticipantId>(ledger: &Ledger<P>) -> Money {
    ledger.values().copied().sum()
}
