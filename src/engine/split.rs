//! Split computation for a single expense.
//!
//! An expense is divided among its included participants either by an
//! externally suggested proposal (validated first, since the suggestion
//! source is untrusted) or by the equal-split fallback. Rejected proposals
//! are absorbed, never surfaced: a flaky suggestion collaborator degrades
//! the split, not the request.

use crate::constants::SPLIT_TOLERANCE;
use crate::engine::ParticipantId;
use crate::error::DivvyError;
use crate::models::Money;
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-participant amounts owed for one expense.
///
/// Every included participant has an entry, no excluded participant does,
/// all entries are non-negative, and the entries sum to the expense amount
/// exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Split<P: ParticipantId> {
    shares: BTreeMap<P, Money>,
}

impl<P: ParticipantId> Split<P> {
    /// Rebuild a split from stored rows. Row integrity is the caller's
    /// concern; folding credits the payer with whatever the rows add up to.
    pub fn from_shares(shares: BTreeMap<P, Money>) -> Self {
        Self { shares }
    }

    pub fn get(&self, participant: &P) -> Option<Money> {
        self.shares.get(participant).copied()
    }

    pub fn total(&self) -> Money {
        self.shares.values().copied().sum()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Entries in ascending participant order.
    pub fn iter(&self) -> impl Iterator<Item = (&P, Money)> {
        self.shares.iter().map(|(p, m)| (p, *m))
    }
}

/// Outcome of vetting an external proposal. Rejection stays inside the
/// engine; the caller always receives a usable split.
enum ProposalVerdict<P: ParticipantId> {
    Validated(BTreeMap<P, Money>),
    Rejected(&'static str),
}

/// Remove excluded identifiers from the participant list.
///
/// Duplicates collapse; the result is the included set in ascending order.
pub fn filter_participants<P: ParticipantId>(participants: &[P], excluded: &[P]) -> BTreeSet<P> {
    participants
        .iter()
        .filter(|p| !excluded.contains(p))
        .cloned()
        .collect()
}

/// Compute the per-participant split for one expense.
///
/// # Arguments
/// * `amount` - Total expense amount, must be positive.
/// * `participants` - Participants eligible to owe a share.
/// * `excluded` - Subset removed before splitting.
/// * `payer` - Who paid; absorbs rounding residue when included in the split.
/// * `proposal` - Optional untrusted suggestion of participant shares.
///
/// # Errors
/// `InvalidSplitInput` when the amount is not positive or no participant
/// remains after exclusions. A bad proposal is not an error: it falls back
/// to the equal split.
pub fn compute_split<P: ParticipantId>(
    amount: Money,
    participants: &[P],
    excluded: &[P],
    payer: &P,
    proposal: Option<&HashMap<P, f64>>,
) -> Result<Split<P>, DivvyError> {
    if !amount.is_positive() {
        return Err(DivvyError::InvalidSplitInput(format!(
            "amount must be positive, got {}",
            amount
        )));
    }

    let included = filter_participants(participants, excluded);
    if included.is_empty() {
        return Err(DivvyError::InvalidSplitInput(
            "no participants remain after exclusions".to_string(),
        ));
    }

    // The payer takes the rounding residue when they are part of the split,
    // otherwise the lowest included id does. Fixed so repeated calls on the
    // same input produce the same split.
    let designated = if included.contains(payer) {
        payer.clone()
    } else {
        included.iter().next().cloned().unwrap_or_else(|| payer.clone())
    };

    if let Some(proposal) = proposal {
        match vet_proposal(amount, &included, &designated, proposal) {
            ProposalVerdict::Validated(shares) => {
                debug!(
                    "Split proposal accepted for {} participants, amount {}",
                    included.len(),
                    amount
                );
                return Ok(Split { shares });
            }
            ProposalVerdict::Rejected(reason) => {
                warn!("Split proposal rejected ({}), falling back to equal split", reason);
            }
        }
    }

    Ok(equal_split(amount, &included, &designated))
}

/// Validate an untrusted proposal against the included participant set.
///
/// Accepted only if every key is an included participant, the keys cover the
/// included set exactly, every value is a finite non-negative number, and
/// the values sum to the amount within `SPLIT_TOLERANCE`.
fn vet_proposal<P: ParticipantId>(
    amount: Money,
    included: &BTreeSet<P>,
    designated: &P,
    proposal: &HashMap<P, f64>,
) -> ProposalVerdict<P> {
    for (participant, &value) in proposal {
        if !included.contains(participant) {
            return ProposalVerdict::Rejected("names a participant outside the split");
        }
        if !value.is_finite() || value < 0.0 {
            return ProposalVerdict::Rejected("contains a negative or non-finite share");
        }
    }
    if proposal.len() != included.len() {
        return ProposalVerdict::Rejected("does not cover every included participant");
    }

    let proposed_total: f64 = proposal.values().sum();
    if (proposed_total - amount.to_decimal()).abs() > SPLIT_TOLERANCE {
        return ProposalVerdict::Rejected("shares do not sum to the expense amount");
    }

    let mut shares: BTreeMap<P, Money> = proposal
        .iter()
        .map(|(p, &v)| (p.clone(), Money::from_decimal_lossy(v)))
        .collect();

    // Per-share rounding can drift off the amount by a few cents in total;
    // the designated participant absorbs the drift so the split reconciles
    // exactly.
    let drift = amount - shares.values().copied().sum();
    if !drift.is_zero() {
        if let Some(share) = shares.get_mut(designated) {
            *share += drift;
            if share.is_negative() {
                return ProposalVerdict::Rejected("rounding adjustment drove a share negative");
            }
        }
    }

    ProposalVerdict::Validated(shares)
}

/// Divide the amount evenly, rounding each share to the minor unit.
///
/// The designated participant absorbs the rounding residual. When the
/// rounded per-head share would leave the designated participant negative
/// (a few cents across many heads), the remainder is handed out one cent at
/// a time instead so every share stays non-negative.
fn equal_split<P: ParticipantId>(amount: Money, included: &BTreeSet<P>, designated: &P) -> Split<P> {
    let n = included.len() as i64;
    let total_cents = amount.cents();
    let share_cents = (total_cents + n / 2) / n;
    let designated_cents = total_cents - share_cents * (n - 1);

    let mut shares = BTreeMap::new();
    if designated_cents >= 0 {
        for participant in included {
            let owed = if participant == designated {
                designated_cents
            } else {
                share_cents
            };
            shares.insert(participant.clone(), Money::from_cents(owed));
        }
    } else {
        let base = total_cents / n;
        let mut leftover = total_cents % n;
        for participant in included {
            let mut owed = base;
            if participant != designated && leftover > 0 {
                owed += 1;
                leftover -= 1;
            }
            shares.insert(participant.clone(), Money::from_cents(owed));
        }
    }

    Split { shares }
}
