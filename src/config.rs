//! Page Configuration
//!
//! Optional settings the portal page can provide as a global
//! `window.portalWidgetsConfig` object. Everything has a default.

use serde::Deserialize;
use wasm_bindgen::JsValue;

use inline_commit::ERRORS_REGION;

/// Name of the global object read at startup
pub const CONFIG_GLOBAL: &str = "portalWidgetsConfig";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Prefix prepended to every route; empty means same origin
    pub rpc_base_url: String,
    /// Selector of the shared errors region
    pub errors_region: String,
    /// Class that hides one half of a display/editor pair
    pub hidden_class: String,
    pub log_level: String,
    /// Caption of the retry button shown after a failed call
    pub retry_label: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            rpc_base_url: String::new(),
            errors_region: ERRORS_REGION.to_string(),
            hidden_class: "d-none".to_string(),
            log_level: "info".to_string(),
            retry_label: "Retry".to_string(),
        }
    }
}

impl PortalConfig {
    /// Read the page's config global, falling back to defaults
    pub fn load() -> Result<Self, String> {
        let Some(window) = web_sys::window() else {
            return Ok(Self::default());
        };
        let raw = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
            .map_err(|e| format!("{:?}", e))?;
        if raw.is_undefined() || raw.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(raw).map_err(|e| e.to_string())
    }

    /// Full URL for a route such as `/saved_cart_edit`
    pub fn route_url(&self, route: &str) -> String {
        format!("{}{}", self.rpc_base_url.trim_end_matches('/'), route)
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PortalConfig::default();
        assert_eq!(config.errors_region, "#edit_errors");
        assert_eq!(config.hidden_class, "d-none");
        assert_eq!(config.route_url("/saved_cart_edit"), "/saved_cart_edit");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PortalConfig =
            serde_json::from_str(r#"{"rpc_base_url": "https://portal.example.com/", "log_level": "debug"}"#).unwrap();
        assert_eq!(config.route_url("/stock_picking_validate"), "https://portal.example.com/stock_picking_validate");
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
        assert_eq!(config.retry_label, "Retry");
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let config = PortalConfig {
            log_level: "chatty".to_string(),
            ..Default::default()
        };
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }
}
