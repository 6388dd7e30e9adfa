//! Splitting a bound operator (e.g. `+5`) into a bare number and a pure operator

use glam::Vec2;
use thiserror::Error;

use super::token::{Motion, Operation, Token};
use crate::consts::SPLIT_OFFSET;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SplitRejection {
    #[error("token has no operator to split off")]
    NoOperator,

    #[error("token has no value to keep")]
    NoValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplitResult {
    Rejected(SplitRejection),
    Applied {
        /// New pure-operator token (value 0)
        operator: Token,
        /// The remaining bare number already equals the target
        target_reached: bool,
    },
}

/// Split `token` into a bare number (kept in place) and a new operator token
/// with id `new_id`.
///
/// The new token inherits the source's motion, shifted right by
/// [`SPLIT_OFFSET`] so the two do not spawn overlapping.
pub fn split(token: &mut Token, new_id: u32, target: u32) -> SplitResult {
    if !token.has_op() {
        return SplitResult::Rejected(SplitRejection::NoOperator);
    }
    if token.value() == 0 {
        return SplitResult::Rejected(SplitRejection::NoValue);
    }

    let motion = Motion {
        pos: token.motion.pos + Vec2::X * SPLIT_OFFSET,
        ..token.motion
    };
    let operator = Token::new(new_id, 0, token.operation())
        .with_ceiling(token.ceiling())
        .with_motion(motion);

    log::debug!(
        "Token {} split {} off into token {}",
        token.id,
        token.operation().symbol(),
        new_id
    );
    token.set_operation(Operation::None);

    SplitResult::Applied {
        operator,
        target_reached: token.value() == target,
    }
}
