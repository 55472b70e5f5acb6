//! JSON-RPC Gateway
//!
//! Browser `fetch` binding for the portal's JSON routes.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestCredentials, RequestInit, Response};

use inline_commit::gateway::{decode_reply, encode_call};
use inline_commit::{CommandGateway, GatewayError, RemoteCommand};

use crate::config::PortalConfig;

pub struct JsonRpcGateway {
    config: Rc<PortalConfig>,
    next_id: Cell<u64>,
}

impl JsonRpcGateway {
    pub fn new(config: Rc<PortalConfig>) -> Self {
        Self {
            config,
            next_id: Cell::new(0),
        }
    }

    fn call_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    async fn post(&self, url: &str, body: String) -> Result<String, GatewayError> {
        let window = web_sys::window().ok_or_else(|| GatewayError::Network("no window".to_string()))?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_credentials(RequestCredentials::SameOrigin);
        init.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(url, &init).map_err(js_network_error)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_network_error)?;

        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_network_error)?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| GatewayError::Malformed("fetch did not yield a Response".to_string()))?;

        if !response.ok() {
            return Err(GatewayError::Status(response.status()));
        }

        let text = JsFuture::from(response.text().map_err(js_network_error)?)
            .await
            .map_err(js_network_error)?;
        text.as_string()
            .ok_or_else(|| GatewayError::Malformed("response body is not text".to_string()))
    }
}

fn js_network_error(err: JsValue) -> GatewayError {
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    GatewayError::Network(message)
}

#[async_trait(?Send)]
impl CommandGateway for JsonRpcGateway {
    async fn invoke(&self, command: &RemoteCommand) -> Result<String, GatewayError> {
        let url = self.config.route_url(&command.route);
        let body = encode_call(self.call_id(), command).to_string();
        let text = self.post(&url, body).await?;
        decode_reply(&text)
    }
}
