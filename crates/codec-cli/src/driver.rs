use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use codec_core::{Codec, CodecError, Mode, SchemaError};

/// Failure outside per-line conversion.
#[derive(Debug)]
pub enum DriverError {
    /// Neither an input file nor input text was given.
    NoInput,
    /// The input file does not exist.
    InputNotFound(PathBuf),
    /// Reading or writing a file failed.
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A custom table failed to load.
    Table(SchemaError),
    /// The built-in codec is unavailable.
    Codec(CodecError),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInput => write!(f, "no input provided"),
            Self::InputNotFound(path) => write!(f, "input file '{}' not found", path.display()),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Table(error) => write!(f, "invalid instruction table: {error}"),
            Self::Codec(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Table(error) => Some(error),
            Self::Codec(error) => Some(error),
            Self::NoInput | Self::InputNotFound(_) => None,
        }
    }
}

impl From<CodecError> for DriverError {
    fn from(error: CodecError) -> Self {
        Self::Codec(error)
    }
}

/// Where batch input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Read this file.
    File(PathBuf),
    /// Use this text as-is.
    Text(String),
}

/// Returns the trimmed input text.
///
/// # Errors
///
/// Returns `DriverError::NoInput` for missing or blank text,
/// `DriverError::InputNotFound` for a missing file, or `DriverError::Io`.
pub fn read_input(source: Option<&InputSource>) -> Result<String, DriverError> {
    match source {
        Some(InputSource::File(path)) => match fs::read_to_string(path) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(DriverError::InputNotFound(path.clone()))
            }
            Err(source) => Err(DriverError::Io {
                path: path.clone(),
                source,
            }),
        },
        Some(InputSource::Text(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(InputSource::Text(_)) | None => Err(DriverError::NoInput),
    }
}

/// Writes `text` to `path`, creating parent directories, or prints it to
/// stdout when no path is given.
///
/// # Errors
///
/// Returns `DriverError::Io` if the directory or file cannot be written.
pub fn write_output(text: &str, path: Option<&Path>) -> Result<(), DriverError> {
    let Some(path) = path else {
        println!("{text}");
        return Ok(());
    };
    let io_error = |source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, text).map_err(io_error)?;
    log::debug!("wrote {} byte(s) to {}", text.len(), path.display());
    Ok(())
}

/// Loads a custom table, or returns the built-in codec.
///
/// # Errors
///
/// Returns `DriverError::Table` for an invalid table file, or `DriverError::Io`
/// if it cannot be read.
pub fn load_codec(table: Option<&Path>) -> Result<Codec, DriverError> {
    let Some(path) = table else {
        return Ok(Codec::builtin().map_err(CodecError::from)?.clone());
    };
    let text = fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("loading instruction table from {}", path.display());
    Codec::from_table_text(&text).map_err(DriverError::Table)
}

/// Reads input, converts every line, and writes the rendered result.
///
/// Per-line failures appear in the output text; only driver failures are
/// returned as errors.
///
/// # Errors
///
/// Returns `DriverError` if input cannot be read or output cannot be written.
pub fn process_batch(
    codec: &Codec,
    mode: Mode,
    source: Option<&InputSource>,
    output: Option<&Path>,
) -> Result<String, DriverError> {
    let text = read_input(source)?;
    let report = codec.run_batch(mode, &text);
    let failed = report.failures().count();
    if failed > 0 {
        log::warn!("{failed} of {} line(s) failed", report.lines.len());
    }
    let rendered = report.render();
    write_output(&rendered, output)?;
    Ok(rendered)
}
