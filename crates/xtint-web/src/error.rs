#![forbid(unsafe_code)]

use xtint_core::ConfigError;

/// Failures of the browser host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no global window")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    /// Inline styles can only be written on HTML elements.
    #[error("element is not an HTML element")]
    NotHtml,
    #[error("DOM call failed: {0}")]
    Dom(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(target_arch = "wasm32")]
impl HostError {
    pub(crate) fn dom(value: &wasm_bindgen::JsValue) -> Self {
        Self::Dom(crate::wasm::describe_js(value))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<HostError> for wasm_bindgen::JsValue {
    fn from(err: HostError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
