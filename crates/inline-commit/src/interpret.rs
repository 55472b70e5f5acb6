//! Response Interpreter
//!
//! Classifies a raw reply body. The portal routes answer either with a
//! small JSON envelope or with a re-rendered markup fragment, and no
//! content type is available to tell them apart, so classification is
//! structural.
//!
//! One discriminant applies to every route: an envelope is an error if and
//! only if its `error` member is present and truthy.

use serde_json::{Map, Value};

/// Message shown when an error envelope carries no readable message
pub const DEFAULT_ERROR_MESSAGE: &str = "The server rejected the change.";

/// Classified reply body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretedResponse {
    /// The server rejected the operation
    StructuredError { message: String },
    /// The body is the new content of the target region, verbatim
    ReplacementContent { markup: String },
    /// Empty body, or JSON that is not an error envelope
    Ambiguous,
}

pub fn interpret(body: &str) -> InterpretedResponse {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return InterpretedResponse::Ambiguous;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(envelope)) => classify_envelope(&envelope),
        Ok(_) => InterpretedResponse::Ambiguous,
        Err(_) => InterpretedResponse::ReplacementContent {
            markup: body.to_string(),
        },
    }
}

fn classify_envelope(envelope: &Map<String, Value>) -> InterpretedResponse {
    match envelope.get("error") {
        Some(flag) if truthy(flag) => InterpretedResponse::StructuredError {
            message: error_message(envelope, flag),
        },
        _ => InterpretedResponse::Ambiguous,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn error_message(envelope: &Map<String, Value>, flag: &Value) -> String {
    readable(envelope.get("message"))
        .or_else(|| readable(flag.get("message")))
        .unwrap_or(DEFAULT_ERROR_MESSAGE)
        .to_string()
}

fn readable(message: Option<&Value>) -> Option<&str> {
    message
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(message: &str) -> InterpretedResponse {
        InterpretedResponse::StructuredError {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_error_flag_true() {
        assert_eq!(
            interpret(r#"{"error": true, "message": "Line not found"}"#),
            error("Line not found")
        );
    }

    #[test]
    fn test_error_flag_as_string() {
        assert_eq!(
            interpret(r#"{"error":"true","message":"Insufficient stock"}"#),
            error("Insufficient stock")
        );
    }

    #[test]
    fn test_error_false_is_ambiguous() {
        assert_eq!(interpret(r#"{"error": false}"#), InterpretedResponse::Ambiguous);
        assert_eq!(interpret(r#"{"error": false, "message": "ok"}"#), InterpretedResponse::Ambiguous);
    }

    #[test]
    fn test_envelope_without_error_is_ambiguous() {
        assert_eq!(interpret(r#"{"type": "ir.actions.act_window_close"}"#), InterpretedResponse::Ambiguous);
        assert_eq!(interpret(r#"{"error": null}"#), InterpretedResponse::Ambiguous);
        assert_eq!(interpret(r#"{"error": 0}"#), InterpretedResponse::Ambiguous);
    }

    #[test]
    fn test_non_object_json_is_ambiguous() {
        assert_eq!(interpret("true"), InterpretedResponse::Ambiguous);
        assert_eq!(interpret("42"), InterpretedResponse::Ambiguous);
        assert_eq!(interpret(r#""done""#), InterpretedResponse::Ambiguous);
    }

    #[test]
    fn test_empty_body_is_ambiguous() {
        assert_eq!(interpret(""), InterpretedResponse::Ambiguous);
        assert_eq!(interpret("  \n"), InterpretedResponse::Ambiguous);
    }

    #[test]
    fn test_markup_is_replacement_verbatim() {
        let body = "\n<table class=\"o_lines\"><tr><td>2</td></tr></table>\n";
        assert_eq!(
            interpret(body),
            InterpretedResponse::ReplacementContent {
                markup: body.to_string()
            }
        );
    }

    #[test]
    fn test_missing_message_falls_back() {
        assert_eq!(interpret(r#"{"error": true}"#), error(DEFAULT_ERROR_MESSAGE));
        assert_eq!(
            interpret(r#"{"error": {"message": "Picking not found"}}"#),
            error("Picking not found")
        );
    }

    #[test]
    fn test_blank_message_falls_through_to_nested_message() {
        assert_eq!(
            interpret(r#"{"error": {"message": "Line not found"}, "message": ""}"#),
            error("Line not found")
        );
        assert_eq!(
            interpret(r#"{"error": {"message": " "}, "message": "  "}"#),
            error(DEFAULT_ERROR_MESSAGE)
        );
    }
}
