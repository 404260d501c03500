//! Line-by-line batch conversion. Each line succeeds or fails on its own.

use std::fmt;
use std::str::FromStr;

use crate::codec::Codec;
use crate::error::CodecError;

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Text → binary.
    Encode,
    /// Binary → text.
    Decode,
}

impl Mode {
    /// Lower-case mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CodecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "encode" => Ok(Self::Encode),
            "decode" => Ok(Self::Decode),
            _ => Err(CodecError::InvalidMode(text.to_string())),
        }
    }
}

/// One input line and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    /// The line as read, without its line terminator.
    pub input: String,
    /// Converted text or the failure.
    pub result: Result<String, CodecError>,
}

impl LineOutcome {
    /// Output text, or the error message for failed lines.
    #[must_use]
    pub fn display_text(&self) -> String {
        match &self.result {
            Ok(text) => text.clone(),
            Err(error) => error.to_string(),
        }
    }
}

/// Every line of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Per-line outcomes.
    pub lines: Vec<LineOutcome>,
}

impl BatchReport {
    /// Joins every line's display text with `\n`.
    #[must_use]
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(LineOutcome::display_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lines that failed.
    pub fn failures(&self) -> impl Iterator<Item = &LineOutcome> {
        self.lines.iter().filter(|line| line.result.is_err())
    }
}

impl Codec {
    /// Converts every line of `text` in `mode`.
    ///
    /// The text is trimmed first, so leading and trailing blank lines vanish.
    #[must_use]
    pub fn run_batch(&self, mode: Mode, text: &str) -> BatchReport {
        let lines = text
            .trim()
            .split('\n')
            .enumerate()
            .map(|(index, line)| {
                let input = line.strip_suffix('\r').unwrap_or(line);
                let result = match mode {
                    Mode::Encode => self.encode_one(input),
                    Mode::Decode => self.decode_one(input),
                };
                if let Err(error) = &result {
                    log::warn!("line {}: {mode} `{input}` failed: {error}", index + 1);
                }
                LineOutcome {
                    input: input.to_string(),
                    result,
                }
            })
            .collect();
        BatchReport { lines }
    }
}
