//! Merging two tokens
//!
//! Exactly one of the pair must carry a pending operator. The token without
//! one (the base) survives and absorbs the operator; the token with one (the
//! holder) is always consumed. A merge either applies completely or rejects
//! without touching either token.

use thiserror::Error;

use super::token::{Operation, Token};

/// Argument position in a [`merge`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }
}

/// Why a pair of tokens bounced off each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MergeRejection {
    #[error("both tokens carry an operator")]
    BothOperators,

    #[error("neither token carries an operator")]
    NoOperator,

    #[error("{dividend} is not divisible by {divisor}")]
    InexactDivision { dividend: u32, divisor: u32 },
}

/// What an applied merge did; the caller must destroy tokens exactly as signalled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeApplied {
    /// Base value after the merge
    pub result_value: u32,
    /// Arithmetic ran (false: a pure operator was only transferred)
    pub operator_consumed: bool,
    /// Argument that held the operator; always destroyed
    pub operator_holder: Slot,
    /// The base (accumulator) dropped to 0 and must be destroyed as well
    pub accumulator_destroyed: bool,
    pub target_reached: bool,
}

impl MergeApplied {
    /// Argument that survives (unless `accumulator_destroyed`)
    pub fn base(&self) -> Slot {
        self.operator_holder.other()
    }

    /// Whether the token passed in `slot` must be removed from play
    pub fn destroys(&self, slot: Slot) -> bool {
        slot == self.operator_holder || self.accumulator_destroyed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    Rejected(MergeRejection),
    Applied(MergeApplied),
}

impl MergeResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, MergeResult::Rejected(_))
    }
}

/// Apply `op` with the base value on the left: `lhs op rhs`.
///
/// Division must be exact. The result is unclamped; the token clamps it.
pub fn apply(op: Operation, lhs: u32, rhs: u32) -> Result<i64, MergeRejection> {
    let (l, r) = (lhs as i64, rhs as i64);
    let raw = match op {
        Operation::None => l,
        Operation::Plus => l + r,
        Operation::Minus => l - r,
        Operation::Multiply => l.saturating_mul(r),
        Operation::Divide => {
            if r == 0 || l % r != 0 {
                return Err(MergeRejection::InexactDivision {
                    dividend: lhs,
                    divisor: rhs,
                });
            }
            l / r
        }
    };
    Ok(raw)
}

/// Merge two colliding tokens.
///
/// Argument order does not pick the roles: whichever token carries the
/// operator is the holder. `target` is the puzzle's target number.
pub fn merge(first: &mut Token, second: &mut Token, target: u32) -> MergeResult {
    let (operator_holder, holder, base) = match (first.has_op(), second.has_op()) {
        (true, true) => return MergeResult::Rejected(MergeRejection::BothOperators),
        (false, false) => return MergeResult::Rejected(MergeRejection::NoOperator),
        (true, false) => (Slot::First, &*first, second),
        (false, true) => (Slot::Second, &*second, first),
    };

    // Pure operator: arm the base, no arithmetic and no win check
    if holder.value() == 0 {
        base.set_operation(holder.operation());
        log::debug!(
            "Token {} takes operator {:?} from token {}",
            base.id,
            holder.operation(),
            holder.id
        );
        return MergeResult::Applied(MergeApplied {
            result_value: base.value(),
            operator_consumed: false,
            operator_holder,
            accumulator_destroyed: false,
            target_reached: false,
        });
    }

    let raw = match apply(holder.operation(), base.value(), holder.value()) {
        Ok(raw) => raw,
        Err(rejection) => return MergeResult::Rejected(rejection),
    };

    let before = base.value();
    base.set_value(raw);
    base.set_operation(Operation::None);

    let result_value = base.value();
    let accumulator_destroyed = result_value == 0;
    let target_reached = !accumulator_destroyed && result_value == target;

    log::debug!(
        "Token {}: {} {} {} = {} (raw {})",
        base.id,
        before,
        holder.operation().symbol(),
        holder.value(),
        result_value,
        raw
    );

    MergeResult::Applied(MergeApplied {
        result_value,
        operator_consumed: true,
        operator_holder,
        accumulator_destroyed,
        target_reached,
    })
}
