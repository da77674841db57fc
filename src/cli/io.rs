//! JSON I/O handling for CLI
//!
//! - Input: dataset, query and config files
//! - Output: single JSON object via stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads and parses a JSON file; `wrap` builds the error for a bad file
pub fn read_json_file<T: DeserializeOwned>(
    path: &Path,
    wrap: fn(String) -> CliError,
) -> CliResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| wrap(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| wrap(format!("Invalid JSON in {}: {}", path.display(), e)))
}

/// Builds the success envelope
pub fn ok_envelope(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Builds the error envelope
pub fn error_envelope(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&ok_envelope(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_envelope(code, message))
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;

    #[test]
    fn test_envelopes() {
        assert_eq!(ok_envelope(json!(3)), json!({"status": "ok", "data": 3}));
        assert_eq!(
            error_envelope("AERO_X", "bad"),
            json!({"status": "error", "code": "AERO_X", "message": "bad"})
        );
    }

    #[test]
    fn test_read_json_file_errors_wrapped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ broken").unwrap();

        let err = read_json_file::<Value>(file.path(), |m| CliError::dataset_error(m)).unwrap_err();
        assert_eq!(err.code_str(), "AERO_CLI_DATASET_ERROR");
    }
}
