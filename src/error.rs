//! Structured error types for the folio report engine.
//!
//! Only two failure classes ever reach a caller of the render pipeline: a
//! report record with the wrong structural shape, and a failure of the output
//! sink itself. Content irregularities (missing fields, unreachable images,
//! oversized blocks) are absorbed during layout and never show up here.

use thiserror::Error;

/// The unified error type returned by all public folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The report record is not an object, or a field has a non-scalar shape.
    #[error("Malformed report record: {source}{}", format_hint(.hint))]
    MalformedRecord {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The PDF serializer could not produce an artifact.
    #[error("Render sink failure: {0}")]
    RenderSink(String),

    /// A configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but is not a report record. The top level must be an object and every field a string, number, boolean or null.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::MalformedRecord { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_carry_shape_hint() {
        let err: FolioError = serde_json::from_str::<Vec<u8>>("{}").unwrap_err().into();
        let msg = err.to_string();
        assert!(msg.starts_with("Malformed report record"));
        assert!(msg.contains("Hint: The JSON is valid but is not a report record"));
    }

    #[test]
    fn render_sink_message() {
        let err = FolioError::RenderSink("no pages".to_string());
        assert_eq!(err.to_string(), "Render sink failure: no pages");
    }
}
