use super::value::Value;

/// Comparison operators. `Not` is not a comparator of its own: its code is
/// an offset added to another operation to negate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    Equals = 1,
    LessThan = 2,
    LessThanOrEqual = 3,
    GreaterThan = 4,
    GreaterThanOrEqual = 5,
    Like = 6,
    In = 7,
    IsNull = 8,
    Not = 50,
}

impl Operation {
    pub const BASE: [Operation; 8] = [
        Operation::Equals,
        Operation::LessThan,
        Operation::LessThanOrEqual,
        Operation::GreaterThan,
        Operation::GreaterThanOrEqual,
        Operation::Like,
        Operation::In,
        Operation::IsNull,
    ];

    pub const fn code(self) -> OpCode {
        OpCode(self as u8)
    }

    /// The negated form of this operation.
    pub const fn negated(self) -> OpCode {
        OpCode(self as u8 + Operation::Not as u8)
    }

    fn from_base_code(code: u8) -> Option<Self> {
        Operation::BASE.into_iter().find(|op| *op as u8 == code)
    }
}

impl From<Operation> for OpCode {
    fn from(op: Operation) -> Self {
        op.code()
    }
}

/// Numeric operation code as carried by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpCode(pub u8);

impl OpCode {
    pub const fn is_negated(self) -> bool {
        self.0 >= Operation::Not as u8
    }

    /// Splits the code into its base operation and negation flag.
    ///
    /// Unknown base codes fall back to `Equals`.
    pub fn decode(self) -> (Operation, bool) {
        let negated = self.is_negated();
        let base = if negated {
            self.0 - Operation::Not as u8
        } else {
            self.0
        };
        (Operation::from_base_code(base).unwrap_or(Operation::Equals), negated)
    }

    pub fn base(self) -> Operation {
        self.decode().0
    }

    /// Whether the operation takes no operand (IS NULL / IS NOT NULL).
    pub fn is_null_check(self) -> bool {
        self.base() == Operation::IsNull
    }
}

/// Joins a condition list. A single list never mixes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn from_is_and(is_and: bool) -> Self {
        if is_and {
            Combinator::And
        } else {
            Combinator::Or
        }
    }
}

/// One predicate term.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operation: OpCode,
    pub value: Value,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operation: impl Into<OpCode>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operation: operation.into(),
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operation::Equals, value)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, Operation::IsNull, Value::Null)
    }

    /// Flips the negation of this condition.
    pub fn negate(mut self) -> Self {
        let (base, negated) = self.operation.decode();
        self.operation = if negated { base.code() } else { base.negated() };
        self
    }
}
