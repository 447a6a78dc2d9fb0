#![forbid(unsafe_code)]

//! `chrome.storage` as a [`ConfigStore`].
//!
//! The callback form of the API is used so the same code runs on every
//! Chromium-based browser. `chrome.runtime.lastError` is checked inside the
//! callback and turned into a rejected promise.

use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use xtint_backend::{ConfigStore, StorageArea, StoreError, StoredValues};

use crate::wasm::{describe_js, js_to_json};

fn chrome_path(path: &[&str]) -> Result<JsValue, StoreError> {
    let mut value: JsValue = js_sys::global().into();
    for segment in path {
        value = Reflect::get(&value, &JsValue::from_str(segment))
            .map_err(|err| StoreError::Unavailable(describe_js(&err)))?;
        if value.is_undefined() || value.is_null() {
            return Err(StoreError::Unavailable(format!("{} is not available", path.join("."))));
        }
    }
    Ok(value)
}

fn last_error() -> Option<String> {
    let error = chrome_path(&["chrome", "runtime", "lastError"]).ok()?;
    let message = Reflect::get(&error, &JsValue::from_str("message")).ok()?;
    Some(
        message
            .as_string()
            .unwrap_or_else(|| "unknown storage error".to_owned()),
    )
}

/// Call `target[method](arg, callback)` and settle with the callback result.
fn call_with_callback(target: &JsValue, method: &str, arg: &JsValue) -> Promise {
    Promise::new(&mut |resolve: Function, reject: Function| {
        let settle = {
            let reject = reject.clone();
            Closure::once_into_js(move |result: JsValue| {
                let _ = match last_error() {
                    Some(message) => reject.call1(&JsValue::NULL, &JsValue::from_str(&message)),
                    None => resolve.call1(&JsValue::NULL, &result),
                };
            })
        };
        let called = Reflect::get(target, &JsValue::from_str(method))
            .and_then(JsCast::dyn_into::<Function>)
            .and_then(|f| f.call2(target, arg, &settle));
        if let Err(err) = called {
            let _ = reject.call1(&JsValue::NULL, &err);
        }
    })
}

/// One `chrome.storage` area.
#[derive(Debug, Clone)]
pub struct ChromeStorage {
    area: StorageArea,
}

impl ChromeStorage {
    #[must_use]
    pub fn new(area: StorageArea) -> Self {
        Self { area }
    }

    fn target(&self) -> Result<JsValue, StoreError> {
        chrome_path(&["chrome", "storage", self.area.name()])
    }

    async fn call(&self, method: &str, arg: &JsValue) -> Result<JsValue, StoreError> {
        let target = self.target()?;
        JsFuture::from(call_with_callback(&target, method, arg))
            .await
            .map_err(|err| StoreError::Failed(describe_js(&err)))
    }
}

impl ConfigStore for ChromeStorage {
    async fn get(&self, keys: &[&str]) -> Result<StoredValues, StoreError> {
        let keys: Array = keys.iter().map(|key| JsValue::from_str(key)).collect();
        let result = self.call("get", &keys).await?;
        match js_to_json(&result).map_err(StoreError::Failed)? {
            serde_json::Value::Object(values) => Ok(values),
            _ => Ok(StoredValues::new()),
        }
    }

    async fn set(&self, values: StoredValues) -> Result<(), StoreError> {
        let json = serde_json::to_string(&values).map_err(|err| StoreError::Failed(err.to_string()))?;
        let object =
            js_sys::JSON::parse(&json).map_err(|err| StoreError::Failed(describe_js(&err)))?;
        self.call("set", &object).await.map(drop)
    }
}

/// Register `listener` with `chrome.storage.onChanged`.
pub(crate) fn add_change_listener(listener: &Closure<dyn FnMut(JsValue, String)>) -> Result<(), StoreError> {
    let on_changed = chrome_path(&["chrome", "storage", "onChanged"])?;
    let add = Reflect::get(&on_changed, &JsValue::from_str("addListener"))
        .and_then(JsCast::dyn_into::<Function>)
        .map_err(|err| StoreError::Unavailable(describe_js(&err)))?;
    add.call1(&on_changed, listener.as_ref())
        .map(drop)
        .map_err(|err| StoreError::Failed(describe_js(&err)))
}
