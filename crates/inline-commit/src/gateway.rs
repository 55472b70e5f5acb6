//! Remote Command Gateway
//!
//! The seam between widgets and the remote routes, plus the JSON-RPC 2.0
//! envelope the portal routes speak.

use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::GatewayError;

/// Scalar parameter value sent to a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Primitive {
    Int(i64),
    Text(String),
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Int(value)
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::Text(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::Text(value)
    }
}

pub type Params = BTreeMap<String, Primitive>;

/// A named remote operation with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub route: String,
    pub params: Params,
}

impl RemoteCommand {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            params: Params::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Primitive>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Primitive>) {
        self.params.insert(key.into(), value.into());
    }
}

/// Invokes a remote route and yields its raw reply body.
///
/// No retries, no timeout. A failed call is reported, never retried here.
#[async_trait(?Send)]
pub trait CommandGateway {
    async fn invoke(&self, command: &RemoteCommand) -> Result<String, GatewayError>;
}

#[async_trait(?Send)]
impl<G: CommandGateway + ?Sized> CommandGateway for Rc<G> {
    async fn invoke(&self, command: &RemoteCommand) -> Result<String, GatewayError> {
        (**self).invoke(command).await
    }
}

// ========================
// JSON-RPC Envelope
// ========================

/// Build the `call` request body for `command`
pub fn encode_call(id: u64, command: &RemoteCommand) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "call",
        "params": command.params,
        "id": id,
    })
}

#[derive(Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Deserialize)]
struct RpcFault {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<RpcFaultData>,
}

#[derive(Deserialize)]
struct RpcFaultData {
    #[serde(default)]
    message: Option<String>,
}

/// Unwrap a JSON-RPC reply into the raw body the interpreter consumes.
///
/// String results are returned as-is, a null result becomes the empty body
/// and any other result is handed over as its JSON text.
pub fn decode_reply(text: &str) -> Result<String, GatewayError> {
    let reply: RpcReply =
        serde_json::from_str(text).map_err(|e| GatewayError::Malformed(e.to_string()))?;

    if let Some(fault) = reply.error {
        let message = fault
            .data
            .and_then(|data| data.message)
            .or(fault.message)
            .unwrap_or_else(|| "Unknown server error".to_string());
        return Err(GatewayError::Remote(message));
    }

    Ok(match reply.result {
        Some(Value::String(body)) => body,
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_call_shape() {
        let command = RemoteCommand::new("/saved_cart_edit")
            .with("saved_cart", 12_i64)
            .with("attr_name", "name")
            .with("value", "Weekly");
        let body = encode_call(3, &command);

        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "call");
        assert_eq!(body["id"], 3);
        assert_eq!(body["params"]["saved_cart"], 12);
        assert_eq!(body["params"]["value"], "Weekly");
    }

    #[test]
    fn test_decode_string_result() {
        let body = decode_reply(r#"{"jsonrpc":"2.0","id":1,"result":"<table></table>"}"#).unwrap();
        assert_eq!(body, "<table></table>");
    }

    #[test]
    fn test_decode_null_result_is_empty() {
        assert_eq!(decode_reply(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap(), "");
        assert_eq!(decode_reply(r#"{"jsonrpc":"2.0","id":1}"#).unwrap(), "");
    }

    #[test]
    fn test_decode_structured_result_as_json_text() {
        let body = decode_reply(r#"{"jsonrpc":"2.0","id":1,"result":true}"#).unwrap();
        assert_eq!(body, "true");
    }

    #[test]
    fn test_decode_fault_prefers_data_message() {
        let err = decode_reply(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":200,"message":"Odoo Server Error","data":{"message":"Access denied"}}}"#,
        )
        .unwrap_err();
        assert_eq!(err, GatewayError::Remote("Access denied".to_string()));
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        assert!(matches!(decode_reply("<html>502</html>"), Err(GatewayError::Malformed(_))));
    }
}
