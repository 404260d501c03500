//! One instruction definition and the generic encode/decode walk over its
//! fields.

use std::collections::{HashMap, HashSet};

use crate::binding::Bindings;
use crate::bits::WORD_BITS;
use crate::discriminator::DiscriminatorKind;
use crate::error::{CodecError, SchemaErrorKind};
use crate::field::{Field, FieldKind};

/// Immutable instruction definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    name: String,
    class: String,
    fields: Vec<Field>,
    input_queue: Vec<usize>,
    auto_load: Vec<usize>,
}

impl Instruction {
    /// Validates `fields` and derives the operand queue.
    ///
    /// # Errors
    ///
    /// Returns `SchemaErrorKind` when widths do not sum to 32, names or orders
    /// repeat, the opcode is not fixed, or an expression names an unknown
    /// field.
    pub fn new(
        name: impl Into<String>,
        class: impl Into<String>,
        fields: Vec<Field>,
    ) -> Result<Self, SchemaErrorKind> {
        let total: usize = fields.iter().map(Field::width).sum();
        if total != WORD_BITS {
            return Err(SchemaErrorKind::WidthSum(total));
        }
        match fields.first() {
            Some(opcode) if opcode.literal_bits().is_some_and(|b| !b.is_empty()) => {}
            Some(opcode) => return Err(SchemaErrorKind::OpcodeNotFixed(opcode.name().to_string())),
            None => return Err(SchemaErrorKind::MalformedRow),
        }

        let mut names = HashSet::new();
        for field in &fields {
            if !names.insert(field.name()) {
                return Err(SchemaErrorKind::DuplicateField(field.name().to_string()));
            }
        }

        let mut orders = HashSet::new();
        let mut base = None;
        let mut fmt_seen = false;
        let mut condn_seen = false;
        let mut input_queue = Vec::new();
        let mut auto_load = Vec::new();
        for (index, field) in fields.iter().enumerate() {
            match field.kind() {
                FieldKind::Base => {
                    if base.replace(index).is_some() {
                        return Err(SchemaErrorKind::DuplicateSpecialField("base"));
                    }
                }
                FieldKind::Discriminator { kind, .. } => {
                    let seen = match kind {
                        DiscriminatorKind::Fmt => &mut fmt_seen,
                        DiscriminatorKind::Condn => &mut condn_seen,
                    };
                    if std::mem::replace(seen, true) {
                        return Err(SchemaErrorKind::DuplicateSpecialField(kind.field_name()));
                    }
                }
                FieldKind::Computed(expr) => {
                    for variable in expr.variables() {
                        if variable == field.name() || !names.contains(variable) {
                            return Err(SchemaErrorKind::UnknownVariable {
                                field: field.name().to_string(),
                                variable: variable.to_string(),
                            });
                        }
                    }
                    auto_load.push(index);
                }
                _ => {}
            }
            let order = field.input_order();
            if order > 0 {
                if !orders.insert(order) {
                    return Err(SchemaErrorKind::DuplicateOrder(order));
                }
                input_queue.push(index);
            }
        }
        input_queue.sort_by_key(|&index| fields[index].input_order());
        input_queue.extend(base);

        let referenced: HashSet<&str> = auto_load
            .iter()
            .filter_map(|&index| match fields[index].kind() {
                FieldKind::Computed(expr) => Some(expr.variables()),
                _ => None,
            })
            .flatten()
            .collect();
        let unused = input_queue.iter().find(|&&index| {
            fields[index].width() == 0 && !referenced.contains(fields[index].name())
        });
        if let Some(&index) = unused {
            return Err(SchemaErrorKind::UnusedZeroWidth(fields[index].name().to_string()));
        }

        Ok(Self {
            name: name.into(),
            class: class.into(),
            fields,
            input_queue,
            auto_load,
        })
    }

    /// Mnemonic as written in the table, lower case.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class tag (`r`, `i`, `j`, `fr`, ...).
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Fields in declared order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Operand fields in the order operands are consumed.
    pub fn input_queue(&self) -> impl Iterator<Item = &Field> {
        self.input_queue.iter().map(|&index| &self.fields[index])
    }

    /// Computed fields in evaluation order.
    pub fn auto_load(&self) -> impl Iterator<Item = &Field> {
        self.auto_load.iter().map(|&index| &self.fields[index])
    }

    /// Leading opcode bits.
    #[must_use]
    pub fn opcode(&self) -> &str {
        self.fields
            .first()
            .and_then(Field::literal_bits)
            .unwrap_or_default()
    }

    /// Literal bits of the trailing fixed fields after the opcode, or an
    /// empty string when the last field is not fixed.
    #[must_use]
    pub fn signature(&self) -> String {
        let tail: Vec<&str> = self
            .fields
            .iter()
            .skip(1)
            .rev()
            .map_while(Field::literal_bits)
            .collect();
        tail.into_iter().rev().collect()
    }

    /// True if any field is computed and therefore cannot be decoded.
    #[must_use]
    pub fn has_computed(&self) -> bool {
        !self.auto_load.is_empty()
    }

    /// Compact layout such as `op:6 rs:5 rt:5 imm:16`.
    #[must_use]
    pub fn layout(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}:{}", f.name(), f.width()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Binds a mnemonic variant (`s`, `eq`, ...) to this instruction's
    /// discriminator field.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MissingField` if the instruction has no such
    /// discriminator, or the field's own binding error.
    pub fn bind_variant(
        &self,
        kind: DiscriminatorKind,
        variant: &str,
        bindings: &mut Bindings,
    ) -> Result<(), CodecError> {
        let field = self
            .fields
            .iter()
            .find(|f| matches!(f.kind(), FieldKind::Discriminator { kind: k, .. } if *k == kind))
            .ok_or_else(|| CodecError::MissingField {
                instruction: self.name.clone(),
                field: kind.field_name().to_string(),
            })?;
        field.load_value(variant, bindings)
    }

    /// Encodes comma-separated operand text into a 32-character word.
    ///
    /// # Errors
    ///
    /// Returns `CodecError` when operands are missing, malformed, or out of
    /// range.
    pub fn encode(&self, operands: &str) -> Result<String, CodecError> {
        self.encode_with(operands, Bindings::new())
    }

    /// Like [`Instruction::encode`], starting from pre-bound values.
    ///
    /// # Errors
    ///
    /// See [`Instruction::encode`].
    pub fn encode_with(&self, operands: &str, mut bindings: Bindings) -> Result<String, CodecError> {
        let tokens = self.split_operands(operands)?;
        if tokens.len() != self.input_queue.len() {
            return Err(CodecError::OperandCount {
                instruction: self.name.clone(),
                expected: self.input_queue.len(),
                found: tokens.len(),
            });
        }
        for (field, token) in self.input_queue().zip(&tokens) {
            field.load_value(token, &mut bindings)?;
        }

        if self.has_computed() {
            let mut env = self.environment(&bindings);
            for field in self.auto_load() {
                field.load_computed(&mut env, &mut bindings)?;
            }
        }

        self.fields
            .iter()
            .map(|field| field.get_value(&bindings))
            .collect()
    }

    fn split_operands<'a>(&self, operands: &'a str) -> Result<Vec<&'a str>, CodecError> {
        let operands = operands.trim();
        let mut tokens: Vec<&str> = if operands.is_empty() {
            Vec::new()
        } else {
            operands.split(',').map(str::trim).collect()
        };

        let has_base = self
            .fields
            .iter()
            .any(|f| matches!(f.kind(), FieldKind::Base));
        if has_base {
            let last = tokens.pop().unwrap_or_default();
            let malformed = || CodecError::MalformedMemoryOperand {
                instruction: self.name.clone(),
                operand: last.to_string(),
            };
            if last.matches('(').count() != 1 {
                return Err(malformed());
            }
            let (offset, base) = last
                .strip_suffix(')')
                .and_then(|inner| inner.split_once('('))
                .ok_or_else(malformed)?;
            tokens.push(offset.trim());
            tokens.push(base.trim());
        }
        Ok(tokens)
    }

    fn environment(&self, bindings: &Bindings) -> HashMap<String, i64> {
        self.fields
            .iter()
            .filter_map(|field| {
                let bits = field.literal_bits().or_else(|| bindings.get(field.name()))?;
                Some((field.name().to_string(), field.integer_value(bits)))
            })
            .collect()
    }

    /// Decodes a 32-character word against this definition.
    ///
    /// `Ok(None)` means the word is not this instruction.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Undecodable` when the definition has a computed
    /// field.
    pub fn decode(&self, word: &str) -> Result<Option<String>, CodecError> {
        if word.len() != WORD_BITS {
            return Err(CodecError::Format(word.to_string()));
        }
        let mut bindings = Bindings::new();
        let mut position = 0;
        for field in &self.fields {
            let end = position + field.width();
            let Some(bits) = word.get(position..end) else {
                return Err(CodecError::Format(word.to_string()));
            };
            position = end;
            if field.width() == 0 {
                continue;
            }
            let matched = field.restore_value(bits, &mut bindings).map_err(|e| match e {
                CodecError::Undecodable { field, .. } => CodecError::Undecodable {
                    instruction: self.name.clone(),
                    field,
                },
                other => other,
            })?;
            if !matched {
                return Ok(None);
            }
        }
        self.render(&bindings).map(Some)
    }

    fn render(&self, bindings: &Bindings) -> Result<String, CodecError> {
        let mut name = self.name.clone();
        for field in &self.fields {
            if let (FieldKind::Discriminator { kind, .. }, Some(variant)) =
                (field.kind(), field.variant_name(bindings))
            {
                name = kind.splice(&name, variant);
            }
        }

        let mut operands: Vec<String> = Vec::with_capacity(self.input_queue.len());
        for field in self.input_queue() {
            let value = field.get_origin_value(bindings)?;
            match (field.kind(), operands.last_mut()) {
                (FieldKind::Base, Some(offset)) => offset.push_str(&value),
                _ => operands.push(value),
            }
        }

        let name = name.to_uppercase();
        if operands.is_empty() {
            Ok(name)
        } else {
            Ok(format!("{name} {}", operands.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(name: &str, specs: &[&str]) -> Result<Instruction, SchemaErrorKind> {
        let fields = specs
            .iter()
            .map(|spec| Field::parse(spec))
            .collect::<Result<Vec<_>, _>>()?;
        Instruction::new(name, "r", fields)
    }

    fn add() -> Instruction {
        instruction(
            "add",
            &[
                "op 6 000000",
                "rs 5 - 2",
                "rt 5 - 3",
                "rd 5 - 1",
                "shamt 5 0",
                "funct 6 100000",
            ],
        )
        .expect("add is valid")
    }

    fn lw() -> Instruction {
        instruction(
            "lw",
            &["op 6 100011", "base 5 ~", "rt 5 - 1", "offset 16 - 2"],
        )
        .expect("lw is valid")
    }

    #[test]
    fn encodes_register_form() {
        assert_eq!(
            add().encode("r1, r2, r3").as_deref(),
            Ok("00000000010000110000100000100000")
        );
    }

    #[test]
    fn decodes_register_form() {
        assert_eq!(
            add().decode("00000000010000110000100000100000"),
            Ok(Some("ADD r1, r2, r3".to_string()))
        );
        assert_eq!(add().decode("00000000010000110000100000100001"), Ok(None));
    }

    #[test]
    fn base_operand_is_consumed_last() {
        let lw = lw();
        let names: Vec<&str> = lw.input_queue().map(Field::name).collect();
        assert_eq!(names, ["rt", "offset", "base"]);
        assert_eq!(
            lw.encode("r1,10(r2)").as_deref(),
            Ok("10001100010000010000000000001010")
        );
        assert_eq!(
            lw.decode("10001100010000010000000000001010"),
            Ok(Some("LW r1, 10(2)".to_string()))
        );
    }

    #[test]
    fn malformed_memory_operands() {
        let lw = lw();
        for bad in ["r1,10", "r1,10(r2", "r1,10((r2))", "r1,10(r2)x", ""] {
            assert!(
                matches!(
                    lw.encode(bad),
                    Err(CodecError::MalformedMemoryOperand { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn operand_count_must_match() {
        assert!(matches!(
            add().encode("r1, r2"),
            Err(CodecError::OperandCount {
                expected: 3,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            add().encode(""),
            Err(CodecError::OperandCount { found: 0, .. })
        ));
    }

    #[test]
    fn schema_validation() {
        assert_eq!(
            instruction("x", &["op 6 000000", "imm 16 - 1"]),
            Err(SchemaErrorKind::WidthSum(22))
        );
        assert_eq!(
            instruction("x", &["imm 26 - 1", "op 6 000000"]),
            Err(SchemaErrorKind::OpcodeNotFixed("imm".into()))
        );
        assert_eq!(
            instruction("x", &["op 6 000000", "a 13 - 1", "a 13 - 2"]),
            Err(SchemaErrorKind::DuplicateField("a".into()))
        );
        assert_eq!(
            instruction("x", &["op 6 000000", "a 13 - 1", "b 13 - 1"]),
            Err(SchemaErrorKind::DuplicateOrder(1))
        );
        assert_eq!(
            instruction("x", &["op 6 000000", "base 5 ~", "rs 5 ~", "imm 16 - 1"]),
            Err(SchemaErrorKind::DuplicateSpecialField("base"))
        );
        assert!(matches!(
            instruction("x", &["op 6 000000", "a 13 - 1", "b 13 c+1"]),
            Err(SchemaErrorKind::UnknownVariable { .. })
        ));
    }

    #[test]
    fn zero_width_operands_must_feed_a_computed_field() {
        assert_eq!(
            instruction("x", &["op 6 000000", "a 0 - 1", "code 26 0"]),
            Err(SchemaErrorKind::UnusedZeroWidth("a".into()))
        );
        assert_eq!(
            instruction("x", &["op 6 000000", "base 0 ~", "imm 26 - 1"]),
            Err(SchemaErrorKind::UnusedZeroWidth("base".into()))
        );
        assert!(instruction("x", &["op 6 000000", "a 0 - 1", "v 26 a+1"]).is_ok());
    }

    #[test]
    fn signature_reads_trailing_literals() {
        assert_eq!(add().signature(), "00000100000");
        assert_eq!(lw().signature(), "");
        assert_eq!(add().opcode(), "000000");
    }

    #[test]
    fn computed_field_encodes_but_refuses_decode() {
        let bc = instruction("bc", &["op 6 110010", "addr 0 - 1", "offset 26 addr>>2"])
            .expect("bc is valid");
        assert_eq!(
            bc.encode("16").as_deref(),
            Ok("11001000000000000000000000000100")
        );
        assert_eq!(
            bc.decode("11001000000000000000000000000100"),
            Err(CodecError::Undecodable {
                instruction: "bc".into(),
                field: "offset".into()
            })
        );
    }

    #[test]
    fn computed_shift_overflow_is_an_error() {
        let x = instruction("x", &["op 6 111111", "a 0 - 1", "v 26 a<<62"]).expect("x is valid");
        assert!(matches!(
            x.encode("4"),
            Err(CodecError::Expression { .. })
        ));
        assert_eq!(
            x.encode("0").as_deref(),
            Ok("11111100000000000000000000000000")
        );
    }

    #[test]
    fn discriminator_splices_into_the_name() {
        let add_fmt = instruction(
            "add.fmt",
            &[
                "op 6 010001",
                "fmt 5 ? sd",
                "ft 5 - 3",
                "fs 5 - 2",
                "fd 5 - 1",
                "funct 6 000000",
            ],
        )
        .expect("add.fmt is valid");
        let mut bindings = Bindings::new();
        add_fmt
            .bind_variant(DiscriminatorKind::Fmt, "d", &mut bindings)
            .expect("d is an option");
        let word = add_fmt
            .encode_with("f1,f2,f3", bindings)
            .expect("operands are valid");
        assert_eq!(word, "01000110001000110001000001000000");
        assert_eq!(
            add_fmt.decode(&word),
            Ok(Some("ADD.D f1, f2, f3".to_string()))
        );
        assert!(matches!(
            add_fmt.bind_variant(DiscriminatorKind::Condn, "eq", &mut Bindings::new()),
            Err(CodecError::MissingField { .. })
        ));
    }

    #[test]
    fn no_operand_instruction_renders_bare_name() {
        let nop = instruction("nop", &["op 6 000000", "code 26 0"]).expect("nop is valid");
        assert_eq!(nop.encode("").as_deref(), Ok("0".repeat(32).as_str()));
        assert_eq!(nop.decode(&"0".repeat(32)), Ok(Some("NOP".to_string())));
    }
}
