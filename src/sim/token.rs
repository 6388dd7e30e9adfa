//! Token: one number, one pending operator, or both
//!
//! Value writes always clamp to `0..=ceiling`, so no call on a token can
//! leave it negative or above the ceiling.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::VALUE_CEILING;

/// Arithmetic operator carried by a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    None,
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl Operation {
    pub fn is_none(&self) -> bool {
        *self == Operation::None
    }

    /// Glyph shown next to the number
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::None => "",
            Operation::Plus => "+",
            Operation::Minus => "-",
            Operation::Multiply => "×",
            Operation::Divide => "÷",
        }
    }
}

/// Physics-layer state copied around but never integrated by the core
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Orientation (radians)
    pub rotation: f32,
}

impl Motion {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }
}

/// Value and operator for a token that has not been spawned yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSpec {
    pub value: u32,
    pub operation: Operation,
}

impl TokenSpec {
    pub fn new(value: u32, operation: Operation) -> Self {
        Self { value, operation }
    }
}

/// A token on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TokenRecord")]
pub struct Token {
    pub id: u32,
    value: u32,
    operation: Operation,
    ceiling: u32,
    /// Set while the token is flying after a throw; cleared once it takes part
    /// in a collision or comes to rest
    pub can_combine: bool,
    pub motion: Motion,
}

/// Serialized token as read from disk or the wire, before clamping
#[derive(Deserialize)]
struct TokenRecord {
    id: u32,
    value: u32,
    #[serde(default)]
    operation: Operation,
    #[serde(default = "default_ceiling")]
    ceiling: u32,
    #[serde(default)]
    can_combine: bool,
    #[serde(default)]
    motion: Motion,
}

fn default_ceiling() -> u32 {
    VALUE_CEILING
}

impl From<TokenRecord> for Token {
    fn from(record: TokenRecord) -> Self {
        Self {
            can_combine: record.can_combine,
            motion: record.motion,
            ..Self::with_limit(record.id, record.value, record.operation, record.ceiling)
        }
    }
}

impl Token {
    pub fn new(id: u32, value: u32, operation: Operation) -> Self {
        Self::with_limit(id, value, operation, VALUE_CEILING)
    }

    fn with_limit(id: u32, value: u32, operation: Operation, ceiling: u32) -> Self {
        Self {
            id,
            value: value.min(ceiling),
            operation,
            ceiling,
            can_combine: false,
            motion: Motion::default(),
        }
    }

    /// Token for a generated `spec`, clamped to `ceiling`
    pub fn from_spec(id: u32, spec: TokenSpec, ceiling: u32) -> Self {
        Self::with_limit(id, spec.value, spec.operation, ceiling)
    }

    /// Use a different clamp ceiling (re-clamps the current value)
    pub fn with_ceiling(mut self, ceiling: u32) -> Self {
        self.ceiling = ceiling;
        self.value = self.value.min(ceiling);
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Write a raw arithmetic result, clamped to `0..=ceiling`
    pub(crate) fn set_value(&mut self, raw: i64) {
        self.value = raw.clamp(0, self.ceiling as i64) as u32;
    }

    pub(crate) fn set_operation(&mut self, operation: Operation) {
        self.operation = operation;
    }

    /// Carries a pending operator
    pub fn has_op(&self) -> bool {
        !self.operation.is_none()
    }

    /// Operator with no operand (transfers onto a partner on merge)
    pub fn is_pure_operator(&self) -> bool {
        self.has_op() && self.value == 0
    }

    /// No value and no operator left: must be removed from play
    pub fn is_spent(&self) -> bool {
        !self.has_op() && self.value == 0
    }

    pub fn spec(&self) -> TokenSpec {
        TokenSpec::new(self.value, self.operation)
    }

    /// Label as drawn on screen, e.g. `+5`, `7`, `×`
    pub fn label(&self) -> String {
        if self.is_pure_operator() {
            self.operation.symbol().to_string()
        } else {
            format!("{}{}", self.operation.symbol(), self.value)
        }
    }
}
