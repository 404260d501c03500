//! Typed bit-fields and their parse/bind/render rules.
//!
//! A field spec is a whitespace-separated list: name, width, and an optional
//! marker.
//!
//! | marker            | meaning                                        |
//! |-------------------|------------------------------------------------|
//! | *(none)*          | free immediate with no operand position        |
//! | `0`               | all-zero literal                               |
//! | `~`               | base register of an `offset(base)` operand     |
//! | `0101...`         | literal constant, exactly `width` binary digits |
//! | `? [letters]`     | `fmt` / `condn` discriminator                  |
//! | `+ n` / `- n`     | operand `n`; `+` requires a positive value     |
//! | anything else     | expression over sibling fields                 |

use std::collections::HashMap;

use crate::binding::Bindings;
use crate::bits::{
    bits_to_signed, bits_to_unsigned, signed_range, signed_to_bits, to_bits, unsigned_max,
    unsigned_to_bits, WORD_BITS,
};
use crate::discriminator::{by_bits, by_name, DiscriminatorKind, Variant, PATTERN_BITS};
use crate::error::{CodecError, OperandFault, SchemaErrorKind};
use crate::expr::Expr;

/// Closed set of field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum FieldType {
    Gpr,
    Fpr,
    Base,
    Fmt,
    Condn,
    Expr,
    Imme,
    Fixed,
}

/// Register file addressed by a register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterFile {
    /// General purpose registers, written `r<n>`.
    General,
    /// Floating-point registers, written `f<n>`.
    Float,
}

impl RegisterFile {
    /// One-letter operand tag.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::General => 'r',
            Self::Float => 'f',
        }
    }

    fn for_field(name: &str) -> Option<Self> {
        match name {
            "rs" | "rt" | "rd" => Some(Self::General),
            "fs" | "ft" | "fd" => Some(Self::Float),
            _ => None,
        }
    }
}

/// Field semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Constant bits.
    Fixed(String),
    /// Register index operand.
    Register(RegisterFile),
    /// Base register of a memory operand.
    Base,
    /// Enumerated `fmt`/`condn` selector.
    Discriminator {
        /// Discriminator family.
        kind: DiscriminatorKind,
        /// Legal options for this field.
        options: Vec<&'static Variant>,
    },
    /// Value computed from sibling fields.
    Computed(Expr),
    /// Signed integer operand.
    Immediate,
}

/// One named bit-span of an instruction word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    width: usize,
    kind: FieldKind,
    input_order: usize,
    requires_nonzero: bool,
}

impl Field {
    /// Parses a field spec such as `rd 5 - 1` or `funct 6 100000`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaErrorKind` for malformed specs or unknown markers.
    pub fn parse(spec: &str) -> Result<Self, SchemaErrorKind> {
        let tokens: Vec<&str> = spec.split_whitespace().collect();
        let [name, width, markers @ ..] = tokens.as_slice() else {
            return Err(SchemaErrorKind::MalformedField(spec.to_string()));
        };
        let width: usize = width
            .parse()
            .map_err(|_| SchemaErrorKind::MalformedField(spec.to_string()))?;
        if width > WORD_BITS {
            return Err(SchemaErrorKind::MalformedField(spec.to_string()));
        }

        let mut field = Self {
            name: (*name).to_string(),
            width,
            kind: FieldKind::Immediate,
            input_order: 0,
            requires_nonzero: false,
        };

        let Some((first, rest)) = markers.split_first() else {
            return Ok(field);
        };

        if let Some(options) = first.strip_prefix('?') {
            let options = std::iter::once(options).chain(rest.iter().copied()).collect::<String>();
            field.kind = field.discriminator(&options)?;
        } else if let Some(sign @ ('+' | '-')) = first.chars().next() {
            let order = first[1..].chars().chain(rest.iter().flat_map(|t| t.chars()));
            let order: String = order.collect();
            field.input_order = order
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| SchemaErrorKind::InvalidOrder {
                    field: field.name.clone(),
                    order: order.clone(),
                })?;
            field.requires_nonzero = sign == '+';
            field.kind = RegisterFile::for_field(&field.name)
                .map_or(FieldKind::Immediate, FieldKind::Register);
        } else if !rest.is_empty() {
            return Err(SchemaErrorKind::UnknownMarker {
                field: field.name,
                marker: markers.join(" "),
            });
        } else if *first == "0" {
            field.kind = FieldKind::Fixed("0".repeat(width));
        } else if *first == "~" {
            field.kind = FieldKind::Base;
        } else if first.bytes().all(|b| b.is_ascii_digit()) {
            field.kind = FieldKind::Fixed(field.literal(first)?);
        } else {
            let expr = Expr::parse(first).map_err(|e| SchemaErrorKind::BadExpression {
                field: field.name.clone(),
                reason: e.to_string(),
            })?;
            field.kind = FieldKind::Computed(expr);
        }

        Ok(field)
    }

    fn literal(&self, text: &str) -> Result<String, SchemaErrorKind> {
        if !text.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(SchemaErrorKind::LiteralNotBinary {
                field: self.name.clone(),
                literal: text.to_string(),
            });
        }
        if text.len() != self.width {
            return Err(SchemaErrorKind::LiteralWidth {
                field: self.name.clone(),
                literal: text.to_string(),
                width: self.width,
            });
        }
        Ok(text.to_string())
    }

    fn discriminator(&self, options: &str) -> Result<FieldKind, SchemaErrorKind> {
        let kind = match self.name.as_str() {
            "fmt" => DiscriminatorKind::Fmt,
            "condn" => DiscriminatorKind::Condn,
            _ => return Err(SchemaErrorKind::NotDiscriminator(self.name.clone())),
        };
        if self.width != PATTERN_BITS && self.width != 0 {
            return Err(SchemaErrorKind::DiscriminatorWidth {
                field: self.name.clone(),
                expected: PATTERN_BITS,
                width: self.width,
            });
        }

        let all: Vec<&'static Variant> = kind.table().iter().collect();
        if options.is_empty() {
            return Ok(FieldKind::Discriminator { kind, options: all });
        }
        if kind == DiscriminatorKind::Condn {
            return Err(SchemaErrorKind::UnknownOption {
                field: self.name.clone(),
                option: options.to_string(),
            });
        }

        let mut selected = Vec::new();
        for letter in options.chars() {
            let variant = by_name(&all, letter.encode_utf8(&mut [0; 4])).ok_or_else(|| {
                SchemaErrorKind::UnknownOption {
                    field: self.name.clone(),
                    option: letter.to_string(),
                }
            })?;
            if !selected.contains(&variant) {
                selected.push(variant);
            }
        }
        Ok(FieldKind::Discriminator {
            kind,
            options: selected,
        })
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in bits.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Field semantics.
    #[must_use]
    pub const fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Operand position, 0 if not an operand.
    #[must_use]
    pub const fn input_order(&self) -> usize {
        self.input_order
    }

    /// True if zero (and, for immediates, negative) values are rejected.
    #[must_use]
    pub const fn requires_nonzero(&self) -> bool {
        self.requires_nonzero
    }

    /// Literal bits for fixed fields.
    #[must_use]
    pub fn literal_bits(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Fixed(bits) => Some(bits),
            _ => None,
        }
    }

    /// Type tag derived from the field kind.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match &self.kind {
            FieldKind::Fixed(_) => FieldType::Fixed,
            FieldKind::Register(RegisterFile::General) => FieldType::Gpr,
            FieldKind::Register(RegisterFile::Float) => FieldType::Fpr,
            FieldKind::Base => FieldType::Base,
            FieldKind::Discriminator {
                kind: DiscriminatorKind::Fmt,
                ..
            } => FieldType::Fmt,
            FieldKind::Discriminator {
                kind: DiscriminatorKind::Condn,
                ..
            } => FieldType::Condn,
            FieldKind::Computed(_) => FieldType::Expr,
            FieldKind::Immediate => FieldType::Imme,
        }
    }

    /// Binds operand text (encode direction).
    ///
    /// # Errors
    ///
    /// Returns `CodecError` when the text is not valid for this field, or the
    /// field already has a value.
    pub fn load_value(&self, raw: &str, bindings: &mut Bindings) -> Result<(), CodecError> {
        let bits = match &self.kind {
            FieldKind::Fixed(_) => return Err(CodecError::Rebound(self.name.clone())),
            FieldKind::Computed(_) => {
                return Err(CodecError::Expression {
                    field: self.name.clone(),
                    reason: "computed fields take no operand".to_string(),
                })
            }
            FieldKind::Register(file) => {
                let index = raw.strip_prefix(file.tag()).ok_or_else(|| {
                    self.invalid(
                        raw,
                        OperandFault::RegisterTag {
                            expected: file.tag(),
                        },
                    )
                })?;
                self.unsigned_bits(raw, index)?
            }
            FieldKind::Base => {
                let index = raw.strip_prefix(RegisterFile::General.tag()).unwrap_or(raw);
                self.unsigned_bits(raw, index)?
            }
            FieldKind::Discriminator { options, .. } => by_name(options, raw)
                .map(|v| v.bits.to_string())
                .ok_or_else(|| CodecError::UnknownVariant {
                    field: self.name.clone(),
                    variant: raw.to_string(),
                })?,
            FieldKind::Immediate => {
                let value: i64 = raw
                    .parse()
                    .map_err(|_| self.invalid(raw, OperandFault::NotAnInteger))?;
                if self.requires_nonzero && value <= 0 {
                    return Err(self.invalid(raw, OperandFault::NotPositive(value)));
                }
                let width = self.storage_width();
                signed_to_bits(value, width).ok_or_else(|| {
                    let (min, max) = signed_range(width);
                    self.invalid(raw, OperandFault::OutOfRange { value, min, max })
                })?
            }
        };
        bindings.bind(&self.name, bits)
    }

    /// Evaluates a computed field against already-resolved sibling values.
    ///
    /// The result is added to `env` so later computed fields can use it.
    /// Non-computed fields are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Expression` if evaluation fails or the result does
    /// not fit the field.
    pub fn load_computed(
        &self,
        env: &mut HashMap<String, i64>,
        bindings: &mut Bindings,
    ) -> Result<(), CodecError> {
        let FieldKind::Computed(expr) = &self.kind else {
            return Ok(());
        };
        let value = expr.evaluate(env).map_err(|e| CodecError::Expression {
            field: self.name.clone(),
            reason: e.to_string(),
        })?;
        let width = self.storage_width();
        let (min, _) = signed_range(width);
        if !(min..=unsigned_max(width)).contains(&value) {
            return Err(CodecError::Expression {
                field: self.name.clone(),
                reason: format!("{value} does not fit in {width} bits"),
            });
        }
        bindings.bind(&self.name, to_bits(value, width))?;
        env.insert(self.name.clone(), value);
        Ok(())
    }

    /// Returns the bits this field contributes to the encoded word.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Unbound` if a non-literal field has no value.
    pub fn get_value(&self, bindings: &Bindings) -> Result<String, CodecError> {
        let bits = match &self.kind {
            FieldKind::Fixed(bits) => bits.as_str(),
            _ => bindings
                .get(&self.name)
                .ok_or_else(|| CodecError::Unbound(self.name.clone()))?,
        };
        if self.width == 0 {
            return Ok(String::new());
        }
        Ok(bits.to_string())
    }

    /// Binds bits taken from a word (decode direction).
    ///
    /// `Ok(false)` means the bits rule this instruction out.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Undecodable` for computed fields, which have no
    /// inverse. The instruction name is left empty for the caller to fill.
    pub fn restore_value(&self, bits: &str, bindings: &mut Bindings) -> Result<bool, CodecError> {
        match &self.kind {
            FieldKind::Fixed(literal) => return Ok(literal == bits),
            FieldKind::Computed(_) => {
                return Err(CodecError::Undecodable {
                    instruction: String::new(),
                    field: self.name.clone(),
                })
            }
            FieldKind::Discriminator { options, .. } if by_bits(options, bits).is_none() => {
                return Ok(false)
            }
            _ => {}
        }
        if self.requires_nonzero && bits.bytes().all(|b| b == b'0') {
            return Ok(false);
        }
        bindings.bind(&self.name, bits.to_string())?;
        Ok(true)
    }

    /// Renders the bound value in operand syntax.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Unbound` if the field has no value.
    pub fn get_origin_value(&self, bindings: &Bindings) -> Result<String, CodecError> {
        let bits = match &self.kind {
            FieldKind::Fixed(bits) => bits.as_str(),
            _ => bindings
                .get(&self.name)
                .ok_or_else(|| CodecError::Unbound(self.name.clone()))?,
        };
        Ok(match &self.kind {
            FieldKind::Register(file) => format!("{}{}", file.tag(), bits_to_unsigned(bits)),
            FieldKind::Base => format!("({})", bits_to_unsigned(bits)),
            FieldKind::Discriminator { options, .. } => {
                by_bits(options, bits).map_or_else(|| bits.to_string(), |v| v.name.to_string())
            }
            FieldKind::Fixed(_) => bits_to_unsigned(bits).to_string(),
            FieldKind::Immediate | FieldKind::Computed(_) => bits_to_signed(bits).to_string(),
        })
    }

    /// Name of the discriminator option bound to this field, if any.
    #[must_use]
    pub fn variant_name(&self, bindings: &Bindings) -> Option<&'static str> {
        let FieldKind::Discriminator { options, .. } = &self.kind else {
            return None;
        };
        bindings
            .get(&self.name)
            .and_then(|bits| by_bits(options, bits))
            .map(|v| v.name)
    }

    /// Integer value of `bits` as seen by expressions.
    #[must_use]
    pub fn integer_value(&self, bits: &str) -> i64 {
        match self.kind {
            FieldKind::Immediate | FieldKind::Computed(_) => bits_to_signed(bits),
            _ => bits_to_unsigned(bits),
        }
    }

    /// Width used to store bound values; zero-width helpers hold a full word.
    const fn storage_width(&self) -> usize {
        if self.width == 0 {
            WORD_BITS
        } else {
            self.width
        }
    }

    fn unsigned_bits(&self, raw: &str, digits: &str) -> Result<String, CodecError> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.invalid(raw, OperandFault::NotAnInteger));
        }
        let width = self.storage_width();
        let max = unsigned_max(width);
        let value: i64 = digits.parse().map_err(|_| {
            self.invalid(
                raw,
                OperandFault::OutOfRange {
                    value: i64::MAX,
                    min: 0,
                    max,
                },
            )
        })?;
        if self.requires_nonzero && value == 0 {
            return Err(self.invalid(raw, OperandFault::NotPositive(value)));
        }
        unsigned_to_bits(value, width)
            .ok_or_else(|| self.invalid(raw, OperandFault::OutOfRange { value, min: 0, max }))
    }

    fn invalid(&self, raw: &str, fault: OperandFault) -> CodecError {
        CodecError::InvalidOperand {
            field: self.name.clone(),
            operand: raw.to_string(),
            fault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(spec: &str) -> Field {
        Field::parse(spec).expect("field spec should parse")
    }

    #[test]
    fn parses_every_marker() {
        assert_eq!(field("op 6 000000").field_type(), FieldType::Fixed);
        assert_eq!(field("shamt 5 0").literal_bits(), Some("00000"));
        assert_eq!(field("base 5 ~").field_type(), FieldType::Base);
        assert_eq!(field("fmt 5 ? sd").field_type(), FieldType::Fmt);
        assert_eq!(field("condn 5 ?").field_type(), FieldType::Condn);
        assert_eq!(field("sa 2 shift-1").field_type(), FieldType::Expr);
        assert_eq!(field("imm 16").field_type(), FieldType::Imme);

        let rd = field("rd 5 - 1");
        assert_eq!(rd.field_type(), FieldType::Gpr);
        assert_eq!(rd.input_order(), 1);
        assert!(!rd.requires_nonzero());

        let fs = field("fs 5 + 2");
        assert_eq!(fs.field_type(), FieldType::Fpr);
        assert!(fs.requires_nonzero());

        let shamt = field("shamt 5 -3");
        assert_eq!(shamt.field_type(), FieldType::Imme);
        assert_eq!(shamt.input_order(), 3);
    }

    #[test]
    fn rejects_bad_specs() {
        assert!(matches!(
            Field::parse("op"),
            Err(SchemaErrorKind::MalformedField(_))
        ));
        assert!(matches!(
            Field::parse("op six 000000"),
            Err(SchemaErrorKind::MalformedField(_))
        ));
        assert!(matches!(
            Field::parse("op 6 00000"),
            Err(SchemaErrorKind::LiteralWidth { .. })
        ));
        assert!(matches!(
            Field::parse("op 6 000002"),
            Err(SchemaErrorKind::LiteralNotBinary { .. })
        ));
        assert!(matches!(
            Field::parse("rd 5 - x"),
            Err(SchemaErrorKind::InvalidOrder { .. })
        ));
        assert!(matches!(
            Field::parse("rd 5 + 0"),
            Err(SchemaErrorKind::InvalidOrder { .. })
        ));
        assert!(matches!(
            Field::parse("imm 16 ?"),
            Err(SchemaErrorKind::NotDiscriminator(_))
        ));
        assert!(matches!(
            Field::parse("fmt 5 ? sx"),
            Err(SchemaErrorKind::UnknownOption { .. })
        ));
        assert!(matches!(
            Field::parse("fmt 3 ?"),
            Err(SchemaErrorKind::DiscriminatorWidth { .. })
        ));
        assert!(matches!(
            Field::parse("sa 2 shift-"),
            Err(SchemaErrorKind::BadExpression { .. })
        ));
        assert!(matches!(
            Field::parse("sa 2 a b"),
            Err(SchemaErrorKind::UnknownMarker { .. })
        ));
    }

    #[test]
    fn register_binding_checks_tag_and_width() {
        let rd = field("rd 5 - 1");
        let mut bindings = Bindings::new();
        rd.load_value("r31", &mut bindings).expect("r31 fits");
        assert_eq!(rd.get_value(&bindings).as_deref(), Ok("11111"));

        let err = rd.load_value("r32", &mut Bindings::new()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidOperand {
                fault: OperandFault::OutOfRange { value: 32, .. },
                ..
            }
        ));
        let err = rd.load_value("f1", &mut Bindings::new()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidOperand {
                fault: OperandFault::RegisterTag { expected: 'r' },
                ..
            }
        ));
        assert!(rd.load_value("r-1", &mut Bindings::new()).is_err());
    }

    #[test]
    fn rebinding_within_a_call_fails() {
        let rd = field("rd 5 - 1");
        let mut bindings = Bindings::new();
        rd.load_value("r1", &mut bindings).expect("first bind");
        assert_eq!(
            rd.load_value("r2", &mut bindings),
            Err(CodecError::Rebound("rd".into()))
        );
    }

    #[test]
    fn immediate_range_boundaries() {
        let imm = field("imm 16 - 2");
        for ok in ["32767", "-32768", "0"] {
            assert!(imm.load_value(ok, &mut Bindings::new()).is_ok(), "{ok}");
        }
        for bad in ["32768", "-32769", "ten"] {
            assert!(imm.load_value(bad, &mut Bindings::new()).is_err(), "{bad}");
        }

        let mut bindings = Bindings::new();
        imm.load_value("-1", &mut bindings).expect("-1 fits");
        assert_eq!(
            imm.get_value(&bindings).as_deref(),
            Ok("1111111111111111")
        );
        assert_eq!(imm.get_origin_value(&bindings).as_deref(), Ok("-1"));
    }

    #[test]
    fn positive_required_immediate() {
        let count = field("count 5 + 1");
        assert!(matches!(
            count.load_value("0", &mut Bindings::new()),
            Err(CodecError::InvalidOperand {
                fault: OperandFault::NotPositive(0),
                ..
            })
        ));
        assert!(count.load_value("-3", &mut Bindings::new()).is_err());
        assert!(count.load_value("3", &mut Bindings::new()).is_ok());
        assert_eq!(count.restore_value("00000", &mut Bindings::new()), Ok(false));
        assert_eq!(count.restore_value("00011", &mut Bindings::new()), Ok(true));
    }

    #[test]
    fn zero_width_helper_stores_a_full_word() {
        let helper = field("shift 0 + 4");
        let mut bindings = Bindings::new();
        helper.load_value("3", &mut bindings).expect("binds");
        assert_eq!(bindings.get("shift").map(str::len), Some(32));
        assert_eq!(helper.get_value(&bindings).as_deref(), Ok(""));
    }

    #[test]
    fn base_accepts_plain_or_tagged_index() {
        let base = field("base 5 ~");
        let mut bindings = Bindings::new();
        base.load_value("r2", &mut bindings).expect("tagged");
        assert_eq!(base.get_origin_value(&bindings).as_deref(), Ok("(2)"));
        assert!(base.load_value("7", &mut Bindings::new()).is_ok());
        assert!(base.load_value("x7", &mut Bindings::new()).is_err());
    }

    #[test]
    fn discriminator_respects_option_set() {
        let fmt = field("fmt 5 ? sd");
        let mut bindings = Bindings::new();
        fmt.load_value("D", &mut bindings).expect("d is allowed");
        assert_eq!(fmt.get_value(&bindings).as_deref(), Ok("10001"));
        assert_eq!(fmt.variant_name(&bindings), Some("D"));
        assert!(matches!(
            fmt.load_value("w", &mut Bindings::new()),
            Err(CodecError::UnknownVariant { .. })
        ));
        assert_eq!(fmt.restore_value("10100", &mut Bindings::new()), Ok(false));
        assert_eq!(fmt.restore_value("10000", &mut Bindings::new()), Ok(true));
    }

    #[test]
    fn computed_field_evaluates_and_refuses_decode() {
        let sa = field("sa 2 shift-1");
        let mut env = HashMap::from([("shift".to_string(), 4)]);
        let mut bindings = Bindings::new();
        sa.load_computed(&mut env, &mut bindings).expect("3 fits in 2 bits");
        assert_eq!(sa.get_value(&bindings).as_deref(), Ok("11"));
        assert_eq!(env.get("sa"), Some(&3));

        let mut env = HashMap::from([("shift".to_string(), 5)]);
        assert!(matches!(
            sa.load_computed(&mut env, &mut Bindings::new()),
            Err(CodecError::Expression { .. })
        ));
        assert!(matches!(
            sa.restore_value("11", &mut Bindings::new()),
            Err(CodecError::Undecodable { .. })
        ));
    }

    #[test]
    fn fixed_fields_match_exactly() {
        let funct = field("funct 6 100000");
        assert_eq!(funct.restore_value("100000", &mut Bindings::new()), Ok(true));
        assert_eq!(funct.restore_value("100001", &mut Bindings::new()), Ok(false));
        assert_eq!(
            funct.get_value(&Bindings::new()).as_deref(),
            Ok("100000")
        );
    }

    #[test]
    fn unbound_field_reports_error() {
        let imm = field("imm 16 - 1");
        assert_eq!(
            imm.get_value(&Bindings::new()),
            Err(CodecError::Unbound("imm".into()))
        );
    }
}
