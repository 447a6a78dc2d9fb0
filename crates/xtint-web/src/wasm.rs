#![forbid(unsafe_code)]

//! `wasm-bindgen` exports: the content-script entry point and the settings
//! panel. Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Array, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::MutationObserver;
use xtint_backend::StorageArea;
use xtint_core::{
    SettingsEditor, SettingsStatus, Theme, ThemeController, ThemeField, ThemerConfig,
    load_stored_theme,
};

use crate::convert::storage_changes;
use crate::dom::WebPage;
use crate::error::HostError;
use crate::logging::{self, ConsoleMethod};
use crate::storage::{ChromeStorage, add_change_listener};

// ---------------------------------------------------------------------------
// Console plumbing
// ---------------------------------------------------------------------------

fn console_call(method: &str, msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(function) = Reflect::get(&console, &method.into()) else {
        return;
    };
    let Ok(function) = function.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = function.call1(&console, &JsValue::from_str(msg));
}

fn console_write(method: ConsoleMethod, line: &str) {
    console_call(method.name(), line);
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "xtint panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("xtint panic: {info}")
            };
            console_call("error", &msg);
        }));
    });
}

fn init_host() {
    install_panic_hook();
    // A second module instance on the same page finds the subscriber set.
    let _ = logging::init(tracing::Level::INFO, console_write);
}

/// Best-effort human-readable rendering of a thrown JS value.
pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}

/// Structured-clone-free conversion of a plain JS value to JSON.
pub(crate) fn js_to_json(value: &JsValue) -> Result<serde_json::Value, String> {
    if value.is_undefined() || value.is_null() {
        return Ok(serde_json::Value::Null);
    }
    let text = js_sys::JSON::stringify(value).map_err(|err| describe_js(&err))?;
    let text = text
        .as_string()
        .ok_or_else(|| "value has no JSON representation".to_owned())?;
    serde_json::from_str(&text).map_err(|err| err.to_string())
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn parse_config(config_json: Option<String>) -> Result<ThemerConfig, HostError> {
    match config_json {
        Some(json) => Ok(ThemerConfig::from_json_str(&json)?),
        None => Ok(ThemerConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Content script
// ---------------------------------------------------------------------------

struct Runtime {
    controller: ThemeController<WebPage>,
    page: WebPage,
    /// Kept alive for as long as the page lives.
    _storage_listener: Option<Closure<dyn FnMut(JsValue, String)>>,
}

thread_local! {
    static THEMER: RefCell<Option<Rc<RefCell<Runtime>>>> = const { RefCell::new(None) };
}

/// Run `f` against the runtime unless it is gone or already borrowed.
fn with_runtime(weak: &Weak<RefCell<Runtime>>, what: &str, f: impl FnOnce(&mut Runtime)) {
    let Some(runtime) = weak.upgrade() else {
        return;
    };
    let Ok(mut guard) = runtime.try_borrow_mut() else {
        tracing::warn!(target: "xtint.controller", what, "re-entrant host callback dropped");
        return;
    };
    f(&mut *guard);
}

fn install_page_callbacks(runtime: &Rc<RefCell<Runtime>>) {
    let on_frame = {
        let weak = Rc::downgrade(runtime);
        Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            with_runtime(&weak, "frame", |rt| {
                rt.controller.on_frame(&mut rt.page);
            });
        })
    };
    let on_mutations = {
        let weak = Rc::downgrade(runtime);
        Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |records: Array, _observer: MutationObserver| {
                with_runtime(&weak, "mutations", |rt| {
                    let records = rt.page.convert_records(&records);
                    rt.controller.handle_mutations(&mut rt.page, &records);
                });
            },
        )
    };
    runtime.borrow_mut().page.set_callbacks(on_frame, on_mutations);
}

fn listen_for_storage_changes(runtime: &Rc<RefCell<Runtime>>) {
    let weak = Rc::downgrade(runtime);
    let listener = Closure::<dyn FnMut(JsValue, String)>::new(move |changes: JsValue, area: String| {
        let changes = match js_to_json(&changes) {
            Ok(value) => storage_changes(&value),
            Err(err) => {
                tracing::warn!(target: "xtint.controller", %err, "unreadable storage change");
                return;
            }
        };
        with_runtime(&weak, "storage change", |rt| {
            rt.controller
                .handle_storage_change(&mut rt.page, &changes, &StorageArea::from_name(&area));
        });
    });
    match add_change_listener(&listener) {
        Ok(()) => runtime.borrow_mut()._storage_listener = Some(listener),
        Err(err) => tracing::warn!(target: "xtint.controller", %err, "storage changes will not be followed"),
    }
}

/// Start theming the current page.
///
/// `config_json` is an optional [`ThemerConfig`] document; omitted fields
/// take their defaults. Calling this again on the same page is a no-op.
#[wasm_bindgen(js_name = startThemer)]
pub fn start_themer(config_json: Option<String>) -> Result<(), JsValue> {
    init_host();
    if THEMER.with(|slot| slot.borrow().is_some()) {
        tracing::debug!(target: "xtint.controller", "themer already started");
        return Ok(());
    }

    let config = parse_config(config_json)?;
    let page = WebPage::from_window()?;
    let store = ChromeStorage::new(config.honored_area());
    let runtime = Rc::new(RefCell::new(Runtime {
        controller: ThemeController::new(config.clone()),
        page,
        _storage_listener: None,
    }));
    install_page_callbacks(&runtime);
    THEMER.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&runtime)));

    spawn_local(async move {
        let loaded = load_stored_theme(&store, &config).await;
        with_runtime(&Rc::downgrade(&runtime), "activation", |rt| {
            rt.controller.activate(&mut rt.page, loaded);
        });
        listen_for_storage_changes(&runtime);
    });
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings panel
// ---------------------------------------------------------------------------

fn status_to_js(status: Option<SettingsStatus>) -> JsValue {
    let Some(status) = status else {
        return JsValue::NULL;
    };
    let obj = Object::new();
    set_js(&obj, "message", JsValue::from_str(status.message()));
    set_js(&obj, "isError", JsValue::from_bool(status.is_error()));
    obj.into()
}

fn theme_to_js(theme: &Theme) -> JsValue {
    let obj = Object::new();
    for field in ThemeField::ALL {
        set_js(&obj, field.name(), JsValue::from_str(theme.get(field).as_str()));
    }
    obj.into()
}

/// Settings-panel model exported to the popup script.
///
/// Every method that touches storage returns a promise resolving to
/// `{ message, isError }`, or `null` when there is nothing to report.
#[wasm_bindgen]
pub struct SettingsPanel {
    config: Rc<ThemerConfig>,
    editor: Rc<RefCell<SettingsEditor>>,
    store: Rc<ChromeStorage>,
}

#[wasm_bindgen]
impl SettingsPanel {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<SettingsPanel, JsValue> {
        init_host();
        let config = parse_config(config_json)?;
        Ok(Self {
            editor: Rc::new(RefCell::new(SettingsEditor::new(&config))),
            store: Rc::new(ChromeStorage::new(config.honored_area())),
            config: Rc::new(config),
        })
    }

    /// Read the stored theme into the panel.
    pub fn load(&self) -> Promise {
        let (config, editor, store) = (
            Rc::clone(&self.config),
            Rc::clone(&self.editor),
            Rc::clone(&self.store),
        );
        future_to_promise(async move {
            let loaded = load_stored_theme(&*store, &config).await;
            let status = editor.borrow_mut().load(loaded);
            Ok(status_to_js(status))
        })
    }

    /// Current colors as `{ background, text, border }`.
    pub fn colors(&self) -> JsValue {
        theme_to_js(self.editor.borrow().current())
    }

    /// Apply one input change and persist the result.
    pub fn edit(&self, field: &str, value: &str) -> Result<Promise, JsValue> {
        let field = ThemeField::from_name(field)
            .ok_or_else(|| JsValue::from_str(&format!("unknown theme field {field:?}")))?;
        let snapshot = {
            let mut editor = self.editor.borrow_mut();
            editor.edit(field, value);
            editor.clone()
        };
        let store = Rc::clone(&self.store);
        Ok(future_to_promise(async move {
            Ok(status_to_js(Some(snapshot.save(&*store).await)))
        }))
    }

    /// Restore the built-in palette and persist it.
    pub fn reset(&self) -> Promise {
        let mut snapshot = {
            let mut editor = self.editor.borrow_mut();
            editor.reset();
            editor.clone()
        };
        let store = Rc::clone(&self.store);
        future_to_promise(async move {
            Ok(status_to_js(Some(snapshot.reset_and_save(&*store).await)))
        })
    }
}
