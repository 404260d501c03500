//! Table-driven MIPS32 instruction codec.
//!
//! Instructions are described as rows of typed bit-fields in a CSV-like
//! table. The same definitions drive both directions: operand text is bound
//! field by field into a 32-bit word, and a word is matched back against the
//! instructions that share its opcode.

/// Integer ↔ bit string conversions.
pub mod bits;
pub use bits::{bits_to_signed, bits_to_unsigned, is_word, signed_range, WORD_BITS};

/// `fmt` and `condn` name/pattern tables.
pub mod discriminator;
pub use discriminator::{DiscriminatorKind, Variant, CONDN_VARIANTS, FMT_VARIANTS};

/// Computed-field expressions.
pub mod expr;
pub use expr::{BinaryOp, Expr, ExprError};

/// Error taxonomy.
pub mod error;
pub use error::{CodecError, ErrorKind, OperandFault, SchemaError, SchemaErrorKind};

/// Per-call field values.
pub mod binding;
pub use binding::Bindings;

/// Field model.
pub mod field;
pub use field::{Field, FieldKind, FieldType, RegisterFile};

/// Instruction definitions.
pub mod instruction;
pub use instruction::Instruction;

/// Table loading.
pub mod loader;
pub use loader::{load_table, InstructionTable};

/// Decode candidate index.
pub mod index;
pub use index::DecodeIndex;

/// Encode/decode facade and the built-in table.
pub mod codec;
pub use codec::{decode_one, encode_one, Codec, ALTERNATIVE_SEPARATOR, BUILTIN_TABLE};

/// Batch conversion.
pub mod batch;
pub use batch::{BatchReport, LineOutcome, Mode};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
