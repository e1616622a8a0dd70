//! Pure balance arithmetic for an enrollment's payment history.
//!
//! Everything here is deterministic and side-effect free: callers fetch the
//! offering terms and the successful payment amounts (under the enrollment
//! row lock when the result feeds a write) and hand them in. All monetary
//! values are `rust_decimal::Decimal` rounded to two places; binary floats
//! would drift by cents across repeated installments.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

/// Derived paid/remaining/installment figures at a point in time. Never
/// stored; recomputed from the successful payment set whenever needed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LedgerSnapshot {
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub installment_amount: Decimal,
    pub completed_installments: i32,
    pub next_installment_number: i32,
    pub total_installments: i32,
    pub can_pay: bool,
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the snapshot for an enrollment.
///
/// `max_installments` below 1 is floored to 1. A zero price makes the
/// offering non-payable regardless of `accepted`.
pub fn snapshot(
    price: Decimal,
    max_installments: i32,
    accepted: bool,
    successful_amounts: &[Decimal],
) -> LedgerSnapshot {
    let total_installments = max_installments.max(1);
    let paid_amount = round_money(successful_amounts.iter().copied().sum());
    let remaining_amount = round_money(price - paid_amount).max(Decimal::ZERO);
    let installment_amount = round_money(price / Decimal::from(total_installments));
    let completed_installments = successful_amounts.len() as i32;
    let next_installment_number = total_installments.min(completed_installments + 1);
    let can_pay = accepted && price > Decimal::ZERO && remaining_amount > Decimal::ZERO;

    LedgerSnapshot {
        paid_amount,
        remaining_amount,
        installment_amount,
        completed_installments,
        next_installment_number,
        total_installments,
        can_pay,
    }
}

/// Amount a new attempt should collect for the requested mode: the whole
/// remaining balance, or one installment capped by it.
pub fn amount_for_mode(snapshot: &LedgerSnapshot, installment: bool) -> Decimal {
    if installment {
        snapshot.installment_amount.min(snapshot.remaining_amount)
    } else {
        snapshot.remaining_amount
    }
}
