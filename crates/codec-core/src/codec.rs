//! Text ↔ binary facade over a loaded table and its decode index.

use std::sync::OnceLock;

use crate::binding::Bindings;
use crate::bits::is_word;
use crate::discriminator::DiscriminatorKind;
use crate::error::{CodecError, SchemaError};
use crate::index::DecodeIndex;
use crate::instruction::Instruction;
use crate::loader::{load_table, InstructionTable};

/// Table text of the embedded MIPS32 instruction set.
pub const BUILTIN_TABLE: &str = include_str!("../data/instructions.csv");

/// Separator between alternative decodings of one word.
pub const ALTERNATIVE_SEPARATOR: &str = " | ";

/// A loaded table plus its decode index.
#[derive(Debug, Clone)]
pub struct Codec {
    table: InstructionTable,
    index: DecodeIndex,
}

/// Mnemonic resolved to a table entry plus the variants spliced out of it.
type Resolution<'a> = (&'a Instruction, Vec<(DiscriminatorKind, &'a str)>);

impl Codec {
    /// Builds the decode index for `table`.
    #[must_use]
    pub fn new(table: InstructionTable) -> Self {
        let index = DecodeIndex::build(&table);
        Self { table, index }
    }

    /// Loads table text and indexes it.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the table is invalid.
    pub fn from_table_text(text: &str) -> Result<Self, SchemaError> {
        load_table(text).map(Self::new)
    }

    /// Process-wide codec over [`BUILTIN_TABLE`], loaded on first use.
    ///
    /// # Errors
    ///
    /// Returns the `SchemaError` from loading the embedded table.
    pub fn builtin() -> Result<&'static Self, SchemaError> {
        static BUILTIN: OnceLock<Result<Codec, SchemaError>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| Self::from_table_text(BUILTIN_TABLE))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The loaded instruction table.
    #[must_use]
    pub const fn table(&self) -> &InstructionTable {
        &self.table
    }

    /// Encodes one line such as `add r1, r2, r3` or `cmp.eq.s f1,f2,f3`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` for unknown mnemonics and operand failures.
    pub fn encode_one(&self, line: &str) -> Result<String, CodecError> {
        let line = line.trim().to_lowercase();
        let mut tokens = line.split_whitespace();
        let mnemonic = tokens.next().ok_or(CodecError::EmptyInstruction)?;
        let operands: String = tokens.collect();

        let (instruction, variants) = self
            .resolve(mnemonic)
            .ok_or_else(|| CodecError::UnknownMnemonic(mnemonic.to_string()))?;
        let mut bindings = Bindings::new();
        for (kind, variant) in variants {
            instruction.bind_variant(kind, variant, &mut bindings)?;
        }
        instruction.encode_with(&operands, bindings)
    }

    /// Finds the table entry for `mnemonic`, trying the literal name, then the
    /// `fmt` position, then the `condn` position, then both.
    fn resolve<'a>(&'a self, mnemonic: &'a str) -> Option<Resolution<'a>> {
        if let Some(instruction) = self.table.get(mnemonic) {
            return Some((instruction, Vec::new()));
        }

        let parts: Vec<&str> = mnemonic.split('.').collect();
        let fmt = DiscriminatorKind::Fmt;
        let condn = DiscriminatorKind::Condn;
        let mut attempts: Vec<(String, Vec<(DiscriminatorKind, &str)>)> = Vec::new();
        if let [_, .., last] = parts.as_slice() {
            attempts.push((fmt.splice(mnemonic, fmt.field_name()), vec![(fmt, *last)]));
        }
        if let [_, middle, last] = parts.as_slice() {
            let condn_name = condn.splice(mnemonic, condn.field_name());
            let both = fmt.splice(&condn_name, fmt.field_name());
            attempts.push((condn_name, vec![(condn, *middle)]));
            attempts.push((both, vec![(condn, *middle), (fmt, *last)]));
        }

        attempts.into_iter().find_map(|(name, variants)| {
            self.table
                .get(&name)
                .map(|instruction| (instruction, variants))
        })
    }

    /// Decodes a 32-character binary word. Every matching instruction is
    /// rendered, joined by [`ALTERNATIVE_SEPARATOR`].
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Format` for malformed input,
    /// `CodecError::DecodeMiss` when nothing matches, and
    /// `CodecError::Undecodable` when the only match has a computed field.
    pub fn decode_one(&self, word: &str) -> Result<String, CodecError> {
        let word = word.trim();
        if !is_word(word) {
            return Err(CodecError::Format(word.to_string()));
        }

        let mut rendered = Vec::new();
        let mut first_error = None;
        for position in self.index.candidates(word) {
            let Some(instruction) = self.table.at(position) else {
                continue;
            };
            match instruction.decode(word) {
                Ok(Some(text)) => rendered.push(text),
                Ok(None) => log::debug!("{word}: `{}` rejected", instruction.name()),
                Err(error) => {
                    log::debug!("{word}: `{}` failed: {error}", instruction.name());
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if rendered.is_empty() {
            return Err(first_error.unwrap_or(CodecError::DecodeMiss));
        }
        Ok(rendered.join(ALTERNATIVE_SEPARATOR))
    }
}

/// Encodes one line with the built-in table.
///
/// # Errors
///
/// See [`Codec::encode_one`]; also `CodecError::Schema` if the built-in table
/// fails to load.
pub fn encode_one(line: &str) -> Result<String, CodecError> {
    Codec::builtin()?.encode_one(line)
}

/// Decodes one word with the built-in table.
///
/// # Errors
///
/// See [`Codec::decode_one`]; also `CodecError::Schema` if the built-in table
/// fails to load.
pub fn decode_one(word: &str) -> Result<String, CodecError> {
    Codec::builtin()?.decode_one(word)
}
