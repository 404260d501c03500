//! Per-call field bindings.
//!
//! Instruction definitions are shared and immutable; every encode or decode
//! call records the values it resolves here instead.

use std::collections::HashMap;

use crate::error::CodecError;

/// Bit values resolved during a single encode or decode call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    /// Creates an empty binding record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `bits` to `field`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Rebound` if the field already has a value.
    pub fn bind(&mut self, field: &str, bits: String) -> Result<(), CodecError> {
        if self.values.contains_key(field) {
            return Err(CodecError::Rebound(field.to_string()));
        }
        self.values.insert(field.to_string(), bits);
        Ok(())
    }

    /// Returns the bits bound to `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Number of bound fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
