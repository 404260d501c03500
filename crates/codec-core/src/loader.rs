//! Instruction table text parsing.
//!
//! One row per line: `name, class, field-spec, field-spec, ...`. Blank lines
//! and `#` comments are skipped and the first remaining row is a header.

use std::collections::HashMap;

use crate::error::{SchemaError, SchemaErrorKind};
use crate::field::Field;
use crate::instruction::Instruction;

/// Loaded instructions, in table order, with lookup by name.
#[derive(Debug, Clone, Default)]
pub struct InstructionTable {
    instructions: Vec<Instruction>,
    by_name: HashMap<String, usize>,
}

impl InstructionTable {
    /// Looks up an instruction by its lower-case mnemonic.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Instruction> {
        self.by_name.get(name).map(|&index| &self.instructions[index])
    }

    /// Instruction at `position` in table order.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(position)
    }

    /// Iterates in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Instruction count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the table has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn push(&mut self, instruction: Instruction) -> Result<(), SchemaErrorKind> {
        if self.by_name.contains_key(instruction.name()) {
            return Err(SchemaErrorKind::DuplicateInstruction);
        }
        self.by_name
            .insert(instruction.name().to_string(), self.instructions.len());
        self.instructions.push(instruction);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a InstructionTable {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parses table text.
///
/// # Errors
///
/// Returns the first `SchemaError`, tagged with its 1-based line number.
pub fn load_table(text: &str) -> Result<InstructionTable, SchemaError> {
    let mut table = InstructionTable::default();
    let mut header_seen = false;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }

        let cells: Vec<String> = trimmed
            .split(',')
            .map(|cell| cell.trim().to_lowercase())
            .collect();
        let instruction = parse_row(&cells).map_err(|(name, kind)| {
            let error = SchemaError::new(kind).at_line(line_no);
            match name {
                Some(name) => error.in_instruction(name),
                None => error,
            }
        })?;
        let name = instruction.name().to_string();
        table
            .push(instruction)
            .map_err(|kind| SchemaError::new(kind).at_line(line_no).in_instruction(&name))?;
    }

    log::info!("loaded {} instruction(s)", table.len());
    Ok(table)
}

fn parse_row(cells: &[String]) -> Result<Instruction, (Option<&str>, SchemaErrorKind)> {
    let [name, class, specs @ ..] = cells else {
        return Err((None, SchemaErrorKind::MalformedRow));
    };
    if name.is_empty() {
        return Err((None, SchemaErrorKind::MissingName));
    }
    let specs: Vec<&String> = specs.iter().filter(|spec| !spec.is_empty()).collect();
    if specs.is_empty() {
        return Err((Some(name.as_str()), SchemaErrorKind::MalformedRow));
    }
    let fields = specs
        .into_iter()
        .map(|spec| Field::parse(spec))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|kind| (Some(name.as_str()), kind))?;
    Instruction::new(name.as_str(), class.as_str(), fields)
        .map_err(|kind| (Some(name.as_str()), kind))
}
