//! Terminal output formatting.
//!
//! Human-readable status lines go to stderr; results printed with
//! [`OutputHandler::json`] go to stdout so they can be piped.

pub mod colors;
pub mod errors;

use rbx_core::error::{RbxError, RbxResult};
use serde_json::Value;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.dim(message));
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print a labelled value, e.g. `config: rbx.toml`
    pub fn field(&self, label: &str, value: &str) {
        eprintln!("{} {}", self.colors.cyan(&format!("{label:>12}")), value);
    }

    /// Print a JSON document to stdout
    pub fn json(&self, value: &Value) -> RbxResult<()> {
        let text = serde_json::to_string_pretty(value).map_err(|e| RbxError::Format {
            endpoint: "output".to_string(),
            message: e.to_string(),
            source: Some(Box::new(e)),
        })?;
        println!("{text}");
        Ok(())
    }

    pub fn heading(&self, message: &str) {
        eprintln!("{}", self.colors.bold(message));
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
