use codec_core::{BatchReport, Codec, ErrorKind, Mode};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

macro_rules! console_log {
    ($($t:tt)*) => (web_sys::console::log_1(&JsValue::from_str(&format!($($t)*))))
}

/// One converted line as seen from JavaScript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRow {
    pub input: String,
    pub output: Option<String>,
    pub error: Option<String>,
    pub kind: Option<ErrorKind>,
}

/// Flattens a batch report into serializable rows.
#[must_use]
pub fn batch_rows(report: &BatchReport) -> Vec<BatchRow> {
    report
        .lines
        .iter()
        .map(|line| match &line.result {
            Ok(output) => BatchRow {
                input: line.input.clone(),
                output: Some(output.clone()),
                error: None,
                kind: None,
            },
            Err(error) => BatchRow {
                input: line.input.clone(),
                output: None,
                error: Some(error.to_string()),
                kind: Some(error.kind()),
            },
        })
        .collect()
}

#[wasm_bindgen]
pub struct WasmCodec {
    codec: Codec,
}

#[wasm_bindgen]
impl WasmCodec {
    /// Codec over the built-in MIPS32 table.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Self, JsError> {
        console_error_panic_hook::set_once();
        let codec = Codec::builtin().map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            codec: codec.clone(),
        })
    }

    /// Codec over caller-supplied table text.
    #[wasm_bindgen(js_name = withTable)]
    pub fn with_table(text: &str) -> Result<Self, JsError> {
        console_error_panic_hook::set_once();
        let codec = Codec::from_table_text(text).map_err(|e| JsError::new(&e.to_string()))?;
        console_log!("Loaded {} instructions", codec.table().len());
        Ok(Self { codec })
    }

    pub fn encode(&self, line: &str) -> Result<String, JsError> {
        self.codec
            .encode_one(line)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn decode(&self, word: &str) -> Result<String, JsError> {
        self.codec
            .decode_one(word)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Converts every line of `text`; `mode` is `"encode"` or `"decode"`.
    /// Returns an array of `{input, output, error, kind}` objects.
    pub fn batch(&self, mode: &str, text: &str) -> Result<JsValue, JsError> {
        let mode = mode
            .parse::<Mode>()
            .map_err(|e| JsError::new(&e.to_string()))?;
        let rows = batch_rows(&self.codec.run_batch(mode, text));
        serde_wasm_bindgen::to_value(&rows).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Upper-case names of every table entry, in table order.
    #[wasm_bindgen(js_name = instructionNames)]
    pub fn instruction_names(&self) -> js_sys::Array {
        self.codec
            .table()
            .iter()
            .map(|instruction| JsValue::from_str(&instruction.name().to_uppercase()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
name,class,fields
add,r,op 6 000000,rs 5 - 2,rt 5 - 3,rd 5 - 1,shamt 5 0,funct 6 100000
";

    #[test]
    fn rows_carry_output_or_error() {
        let codec = Codec::from_table_text(TABLE).unwrap();
        let report = codec.run_batch(Mode::Decode, "00000000010000110000100000100000\n1111");
        let rows = batch_rows(&report);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].output.as_deref(), Some("ADD r1, r2, r3"));
        assert_eq!(rows[0].kind, None);
        assert_eq!(rows[1].kind, Some(ErrorKind::Format));
        assert!(rows[1].error.as_deref().unwrap().contains("1111"));
    }

    #[test]
    fn rows_serialize_as_plain_objects() {
        let codec = Codec::from_table_text(TABLE).unwrap();
        let rows = batch_rows(&codec.run_batch(Mode::Encode, "add r1,r2,r3\nfoo"));
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["output"], "00000000010000110000100000100000");
        assert_eq!(json[0]["error"], serde_json::Value::Null);
        assert_eq!(json[1]["kind"], "Argument");

        let back: Vec<BatchRow> = serde_json::from_value(json).unwrap();
        assert_eq!(back, rows);
    }
}
