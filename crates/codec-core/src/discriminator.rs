//! Bidirectional name/bit-pattern tables for `fmt` and `condn` fields.

/// Discriminator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscriminatorKind {
    /// Floating-point data format (`add.s`, `add.d`, ...).
    Fmt,
    /// Floating-point comparison condition (`cmp.eq.s`, ...).
    Condn,
}

impl DiscriminatorKind {
    /// Field name that carries this discriminator.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Fmt => "fmt",
            Self::Condn => "condn",
        }
    }

    /// The constant table for this family.
    #[must_use]
    pub const fn table(self) -> &'static [Variant] {
        match self {
            Self::Fmt => FMT_VARIANTS,
            Self::Condn => CONDN_VARIANTS,
        }
    }

    /// Rewrites a dotted mnemonic with `variant` at this family's position.
    ///
    /// `fmt` occupies the last dotted token; `condn` the middle of a
    /// three-part name. Names without that position are returned unchanged.
    #[must_use]
    pub fn splice(self, mnemonic: &str, variant: &str) -> String {
        let mut parts: Vec<&str> = mnemonic.split('.').collect();
        match self {
            Self::Fmt if parts.len() > 1 => {
                let last = parts.len() - 1;
                parts[last] = variant;
            }
            Self::Condn if parts.len() == 3 => parts[1] = variant,
            _ => return mnemonic.to_string(),
        }
        parts.join(".")
    }
}

/// One legal name/bit-pattern pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    /// Upper-case option name as it appears in decoded mnemonics.
    pub name: &'static str,
    /// Encoded bit pattern.
    pub bits: &'static str,
}

/// Width of every discriminator pattern.
pub const PATTERN_BITS: usize = 5;

const fn variant(name: &'static str, bits: &'static str) -> Variant {
    Variant { name, bits }
}

/// Floating-point formats.
///
/// Patterns follow the MIPS32 COP1 `fmt` encoding, so `W` is `10100` and `L`
/// is `10101`. Tables written against the older `W = 10011`, `L = 10100`
/// assignment decode those words differently.
pub const FMT_VARIANTS: &[Variant] = &[
    variant("S", "10000"),
    variant("D", "10001"),
    variant("W", "10100"),
    variant("L", "10101"),
];

/// Floating-point comparison conditions.
pub const CONDN_VARIANTS: &[Variant] = &[
    variant("AF", "00000"),
    variant("UN", "00001"),
    variant("EQ", "00010"),
    variant("UEQ", "00011"),
    variant("LT", "00100"),
    variant("ULT", "00101"),
    variant("LE", "00110"),
    variant("ULE", "00111"),
    variant("SAF", "01000"),
    variant("SUN", "01001"),
    variant("SEQ", "01010"),
    variant("SUEQ", "01011"),
    variant("SLT", "01100"),
    variant("SULT", "01101"),
    variant("SLE", "01110"),
    variant("SULE", "01111"),
    variant("AT", "10000"),
    variant("OR", "10001"),
    variant("UNE", "10010"),
    variant("NE", "10011"),
    variant("UGE", "10100"),
    variant("OGE", "10101"),
    variant("UGT", "10110"),
    variant("OGT", "10111"),
    variant("SAT", "11000"),
    variant("SOR", "11001"),
    variant("SUNE", "11010"),
    variant("SNE", "11011"),
    variant("SUGE", "11100"),
    variant("SOGE", "11101"),
    variant("SUGT", "11110"),
    variant("SOGT", "11111"),
];

/// Finds a variant by name, ignoring case.
#[must_use]
pub fn by_name<'a>(variants: &[&'a Variant], name: &str) -> Option<&'a Variant> {
    variants
        .iter()
        .copied()
        .find(|v| v.name.eq_ignore_ascii_case(name))
}

/// Finds a variant by its bit pattern.
#[must_use]
pub fn by_bits<'a>(variants: &[&'a Variant], bits: &str) -> Option<&'a Variant> {
    variants.iter().copied().find(|v| v.bits == bits)
}
