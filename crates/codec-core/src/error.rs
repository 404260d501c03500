//! Error taxonomy for table loading and per-call encode/decode failures.

use std::fmt;

use thiserror::Error;

/// Coarse classification of per-call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorKind {
    /// Bad mnemonic, operand text, or operand value.
    Argument,
    /// Decode input is not a 32-character binary word.
    Format,
    /// No instruction matches the binary word.
    DecodeMiss,
    /// The matching instruction cannot be decoded (computed field).
    Unsupported,
    /// The instruction table itself failed to load.
    Schema,
}

/// Reasons a single operand value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandFault {
    /// Register operand lacks the expected one-letter tag.
    #[error("expected a `{expected}` register")]
    RegisterTag {
        /// The tag the field requires (`r` or `f`).
        expected: char,
    },
    /// The operand is not a base-10 integer.
    #[error("not an integer")]
    NotAnInteger,
    /// The value does not fit the field.
    #[error("{value} is outside {min}..={max}")]
    OutOfRange {
        /// Parsed value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },
    /// The field is positive-required and the value is zero or negative.
    #[error("{0} is not positive")]
    NotPositive(i64),
}

/// Per-call encode/decode error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Mnemonic (or its `fmt`/`condn` variant) is not in the table.
    #[error("unknown instruction `{0}`")]
    UnknownMnemonic(String),
    /// Input line has no mnemonic.
    #[error("empty instruction")]
    EmptyInstruction,
    /// Operand count does not match the instruction's operand list.
    #[error("`{instruction}` expects {expected} operand(s), found {found}")]
    OperandCount {
        /// Instruction name.
        instruction: String,
        /// Operands required.
        expected: usize,
        /// Operands supplied.
        found: usize,
    },
    /// A single operand was rejected.
    #[error("invalid operand `{operand}` for field `{field}`: {fault}")]
    InvalidOperand {
        /// Field the operand was bound to.
        field: String,
        /// Raw operand text.
        operand: String,
        /// Why it was rejected.
        fault: OperandFault,
    },
    /// The final operand lacks a well-formed `offset(base)` suffix.
    #[error("`{instruction}` expects an `offset(base)` operand, found `{operand}`")]
    MalformedMemoryOperand {
        /// Instruction name.
        instruction: String,
        /// Offending operand text.
        operand: String,
    },
    /// A `fmt`/`condn` suffix names no legal option.
    #[error("unknown {field} variant `{variant}`")]
    UnknownVariant {
        /// Discriminator field name.
        field: String,
        /// Requested variant name.
        variant: String,
    },
    /// The instruction has no field for a mnemonic variant.
    #[error("`{instruction}` has no `{field}` field")]
    MissingField {
        /// Instruction name.
        instruction: String,
        /// Requested field name.
        field: String,
    },
    /// A field was bound twice within one call.
    #[error("field `{0}` already has a value")]
    Rebound(String),
    /// A field was read before being bound.
    #[error("field `{0}` has no value")]
    Unbound(String),
    /// A computed field could not be evaluated.
    #[error("cannot compute field `{field}`: {reason}")]
    Expression {
        /// Computed field name.
        field: String,
        /// Evaluation failure.
        reason: String,
    },
    /// Unknown batch processing mode.
    #[error("invalid process mode `{0}`")]
    InvalidMode(String),
    /// Decode input is not 32 characters of `0`/`1`.
    #[error("binary string `{0}` is invalid")]
    Format(String),
    /// Opcode unknown or no candidate matched.
    #[error("unknown instruction")]
    DecodeMiss,
    /// Candidate contains a computed field with no inverse.
    #[error("decoding `{instruction}` is unsupported: field `{field}` is computed")]
    Undecodable {
        /// Instruction name.
        instruction: String,
        /// Computed field name.
        field: String,
    },
    /// The built-in instruction table failed to load.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CodecError {
    /// Returns the classification for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::DecodeMiss => ErrorKind::DecodeMiss,
            Self::Undecodable { .. } => ErrorKind::Unsupported,
            Self::Schema(_) => ErrorKind::Schema,
            Self::UnknownMnemonic(_)
            | Self::EmptyInstruction
            | Self::OperandCount { .. }
            | Self::InvalidOperand { .. }
            | Self::MalformedMemoryOperand { .. }
            | Self::UnknownVariant { .. }
            | Self::MissingField { .. }
            | Self::Rebound(_)
            | Self::Unbound(_)
            | Self::Expression { .. }
            | Self::InvalidMode(_) => ErrorKind::Argument,
        }
    }
}

/// Fatal instruction-table error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// 1-based line of the table text, if known.
    pub line: Option<usize>,
    /// Instruction being loaded, if known.
    pub instruction: Option<String>,
    /// What went wrong.
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    /// Creates an error without location context.
    #[must_use]
    pub const fn new(kind: SchemaErrorKind) -> Self {
        Self {
            line: None,
            instruction: None,
            kind,
        }
    }

    /// Attaches the table line number.
    #[must_use]
    pub const fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attaches the instruction name.
    #[must_use]
    pub fn in_instruction(mut self, name: &str) -> Self {
        self.instruction = Some(name.to_string());
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {line}: ")?;
        }
        let scope = self.instruction.as_deref().unwrap_or("table");
        write!(f, "{scope}: {}", self.kind)
    }
}

impl std::error::Error for SchemaError {}

/// Classification of schema errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaErrorKind {
    /// Row has fewer than a name, a class, and one field.
    #[error("malformed row")]
    MalformedRow,
    /// Field spec lacks a name or a numeric width.
    #[error("malformed field spec `{0}`")]
    MalformedField(String),
    /// Field marker is not recognised.
    #[error("field `{field}`: unknown marker `{marker}`")]
    UnknownMarker {
        /// Field name.
        field: String,
        /// Marker text.
        marker: String,
    },
    /// Literal constant has the wrong number of bits.
    #[error("field `{field}`: literal `{literal}` does not match width {width}")]
    LiteralWidth {
        /// Field name.
        field: String,
        /// Literal text.
        literal: String,
        /// Declared width.
        width: usize,
    },
    /// Literal constant contains digits other than `0`/`1`.
    #[error("field `{field}`: literal `{literal}` is not binary")]
    LiteralNotBinary {
        /// Field name.
        field: String,
        /// Literal text.
        literal: String,
    },
    /// Operand order is missing, zero, or not a number.
    #[error("field `{field}`: invalid operand order `{order}`")]
    InvalidOrder {
        /// Field name.
        field: String,
        /// Order text.
        order: String,
    },
    /// `?` used on a field that is neither `fmt` nor `condn`.
    #[error("field `{0}` cannot be a discriminator")]
    NotDiscriminator(String),
    /// Discriminator option letter is unknown.
    #[error("field `{field}`: unknown option `{option}`")]
    UnknownOption {
        /// Field name.
        field: String,
        /// Option text.
        option: String,
    },
    /// Discriminator field has a width other than the pattern width or zero.
    #[error("field `{field}`: discriminator width must be {expected} or 0, found {width}")]
    DiscriminatorWidth {
        /// Field name.
        field: String,
        /// Pattern width.
        expected: usize,
        /// Declared width.
        width: usize,
    },
    /// Expression text failed to parse.
    #[error("field `{field}`: bad expression: {reason}")]
    BadExpression {
        /// Field name.
        field: String,
        /// Parse failure.
        reason: String,
    },
    /// Expression refers to a name that is not a sibling field.
    #[error("field `{field}`: expression refers to unknown field `{variable}`")]
    UnknownVariable {
        /// Computed field name.
        field: String,
        /// Unresolved name.
        variable: String,
    },
    /// Field widths do not add up to 32.
    #[error("field widths sum to {0}, expected 32")]
    WidthSum(usize),
    /// Two fields share a name.
    #[error("duplicate field `{0}`")]
    DuplicateField(String),
    /// Two operand fields share an order.
    #[error("duplicate operand order {0}")]
    DuplicateOrder(usize),
    /// More than one `fmt`, `condn`, or base field.
    #[error("more than one {0} field")]
    DuplicateSpecialField(&'static str),
    /// First field is not a fixed literal.
    #[error("first field `{0}` must be a fixed opcode")]
    OpcodeNotFixed(String),
    /// Zero-width operand that no computed field reads.
    #[error("zero-width field `{0}` is not used by any computed field")]
    UnusedZeroWidth(String),
    /// Row has an empty name cell.
    #[error("missing instruction name")]
    MissingName,
    /// Two rows share a name.
    #[error("duplicate instruction")]
    DuplicateInstruction,
}
