//! Settlement plan minimization.
//!
//! Greedy largest-debtor/largest-creditor matching over two max-heaps. Every
//! round fully zeroes at least one participant, so a ledger with n nonzero
//! balances settles in at most n - 1 transfers.

use crate::engine::ParticipantId;
use crate::engine::ledger::{Ledger, net_total};
use crate::error::DivvyError;
use crate::models::Money;
use log::{debug, error};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A single settling payment from a debtor to a creditor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transfer<P> {
    pub from: P,
    pub to: P,
    pub amount: Money,
}

/// Reduce a balanced ledger to an ordered list of settling transfers.
///
/// Repeatedly matches the participant owed the most against the participant
/// owing the most and transfers `min(credit, debt)`. Ties on balance are
/// broken toward the lowest participant id, i.e. the first of the tied
/// entries in the ledger's ascending iteration order, so identical ledgers
/// always produce identical plans.
///
/// # Errors
/// `UnbalancedLedger` when the ledger's entries do not sum to zero. Balances
/// are exact minor-unit integers, so a nonzero net total is precisely the
/// condition under which the greedy loop would leave residue behind. This
/// signals a conservation violation upstream (for instance an expense folded
/// twice), never a normal runtime path; the full ledger is logged to aid
/// diagnosis.
pub fn minimize<P: ParticipantId>(ledger: &Ledger<P>) -> Result<Vec<Transfer<P>>, DivvyError> {
    let net = net_total(ledger);
    if !net.is_zero() {
        error!("Ledger does not balance, residual {}: {:?}", net, ledger);
        return Err(DivvyError::UnbalancedLedger(net));
    }

    // Max-heaps keyed by (amount, Reverse(id)): largest balance first, ties
    // to the lowest id. Debts are stored negated so both heaps pop maxima.
    let mut creditors: BinaryHeap<(Money, Reverse<P>)> = BinaryHeap::new();
    let mut debtors: BinaryHeap<(Money, Reverse<P>)> = BinaryHeap::new();
    for (participant, &balance) in ledger {
        if balance.is_positive() {
            creditors.push((balance, Reverse(participant.clone())));
        } else if balance.is_negative() {
            debtors.push((balance.abs(), Reverse(participant.clone())));
        }
    }

    debug!(
        "Minimizing ledger with {} creditors and {} debtors",
        creditors.len(),
        debtors.len()
    );

    let mut transfers = Vec::new();
    while let (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) =
        (creditors.pop(), debtors.pop())
    {
        let amount = credit.min(debt);
        transfers.push(Transfer {
            from: debtor.clone(),
            to: creditor.clone(),
            amount,
        });

        let credit_left = credit - amount;
        if credit_left.is_positive() {
            creditors.push((credit_left, Reverse(creditor)));
        }
        let debt_left = debt - amount;
        if debt_left.is_positive() {
            debtors.push((debt_left, Reverse(debtor)));
        }
    }

    debug!("Settlement plan has {} transfers", transfers.len());
    Ok(transfers)
}

/// Apply a settlement plan to a ledger copy.
///
/// Each transfer moves its amount from debtor to creditor: the debtor's
/// balance rises toward zero, the creditor's falls toward zero. Applying the
/// full plan returned by [`minimize`] zeroes every entry.
pub fn apply<P: ParticipantId>(mut ledger: Ledger<P>, transfers: &[Transfer<P>]) -> Ledger<P> {
    for transfer in transfers {
        *ledger.entry(transfer.from.clone()).or_default() += transfer.amount;
        *ledger.entry(transfer.to.clone()).or_default() -= transfer.amount;
    }
    ledger
}
