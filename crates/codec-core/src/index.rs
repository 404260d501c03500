//! Opcode → candidate index used by the decoder.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::loader::InstructionTable;

/// Candidates sharing one opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Group {
    /// The only instruction with this opcode.
    Single(usize),
    /// Several instructions, split by trailing signature.
    Partitioned {
        /// Instructions without a signature; always tried.
        catch_all: Vec<usize>,
        /// Signature length → signature → instructions.
        by_length: BTreeMap<usize, HashMap<String, Vec<usize>>>,
    },
}

/// Read-only lookup from a word to the instructions that might match it.
///
/// Indices refer to positions in the [`InstructionTable`] the index was
/// built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeIndex {
    groups: HashMap<String, Group>,
    opcode_widths: BTreeSet<usize>,
}

impl DecodeIndex {
    /// Groups `table` by opcode, then by trailing signature.
    #[must_use]
    pub fn build(table: &InstructionTable) -> Self {
        let mut by_opcode: HashMap<String, Vec<usize>> = HashMap::new();
        let mut opcode_widths = BTreeSet::new();
        for (position, instruction) in table.iter().enumerate() {
            let opcode = instruction.opcode();
            opcode_widths.insert(opcode.len());
            by_opcode
                .entry(opcode.to_string())
                .or_default()
                .push(position);
        }

        let instructions: Vec<_> = table.iter().collect();
        let groups: HashMap<String, Group> = by_opcode
            .into_iter()
            .map(|(opcode, members)| {
                let group = match members.as_slice() {
                    [only] => Group::Single(*only),
                    _ => {
                        let mut catch_all = Vec::new();
                        let mut by_length: BTreeMap<usize, HashMap<String, Vec<usize>>> =
                            BTreeMap::new();
                        for &position in &members {
                            let signature = instructions[position].signature();
                            if signature.is_empty() {
                                catch_all.push(position);
                            } else {
                                by_length
                                    .entry(signature.len())
                                    .or_default()
                                    .entry(signature)
                                    .or_default()
                                    .push(position);
                            }
                        }
                        Group::Partitioned {
                            catch_all,
                            by_length,
                        }
                    }
                };
                (opcode, group)
            })
            .collect();

        log::debug!(
            "decode index: {} opcode group(s), opcode widths {:?}",
            groups.len(),
            opcode_widths
        );
        Self {
            groups,
            opcode_widths,
        }
    }

    /// Candidate positions for `word`: catch-all first, then signature
    /// matches from the longest signature down.
    #[must_use]
    pub fn candidates(&self, word: &str) -> Vec<usize> {
        let mut found = Vec::new();
        for &width in &self.opcode_widths {
            let Some(group) = word.get(..width).and_then(|op| self.groups.get(op)) else {
                continue;
            };
            match group {
                Group::Single(position) => found.push(*position),
                Group::Partitioned {
                    catch_all,
                    by_length,
                } => {
                    found.extend(catch_all);
                    for (&length, signatures) in by_length.iter().rev() {
                        let tail = word
                            .len()
                            .checked_sub(length)
                            .and_then(|start| word.get(start..));
                        if let Some(matches) = tail.and_then(|tail| signatures.get(tail)) {
                            found.extend(matches);
                        }
                    }
                }
            }
        }
        found
    }

    /// Number of distinct opcodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if the index has no opcodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
