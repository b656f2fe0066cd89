//! Browser-side error logger.
//!
//! Every entry is mirrored to the browser console. Errors and warnings are
//! also POSTed to the server's `/api/log` endpoint. Sending never throws:
//! a failed POST is only noted on the console.

use gloo::net::http::Request;
use serde_json::{json, Value};
use shared::{LogEntry, LogLevel};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{console, ErrorEvent, PromiseRejectionEvent};

pub const DEFAULT_ENDPOINT: &str = "/api/log";

#[derive(Debug, Clone)]
pub struct BrowserLogger {
    endpoint: String,
}

impl Default for BrowserLogger {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl BrowserLogger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn error(&self, message: &str, context: Value) {
        self.log(LogLevel::Error, message, context);
    }

    pub fn warning(&self, message: &str, context: Value) {
        self.log(LogLevel::Warning, message, context);
    }

    pub fn info(&self, message: &str, context: Value) {
        self.log(LogLevel::Info, message, context);
    }

    pub fn debug(&self, message: &str, context: Value) {
        self.log(LogLevel::Debug, message, context);
    }

    fn log(&self, level: LogLevel, message: &str, context: Value) {
        mirror_to_console(level, message, &context);
        if !level.is_reported() {
            return;
        }

        let entry = build_entry(level, message, context, current_url(), now_iso(), user_agent());
        let endpoint = self.endpoint.clone();
        spawn_local(async move {
            if let Err(e) = send(&endpoint, &entry).await {
                console::debug_1(&JsValue::from_str(&format!("Could not send log entry: {}", e)));
            }
        });
    }
}

async fn send(endpoint: &str, entry: &LogEntry) -> Result<(), gloo::net::Error> {
    let response = Request::post(endpoint).json(entry)?.send().await?;
    if !response.ok() {
        console::debug_1(&JsValue::from_str(&format!("Log endpoint answered {}", response.status())));
    }
    Ok(())
}

/// The JSON body POSTed to the server; a missing context becomes `{}`
pub fn build_entry(
    level: LogLevel,
    message: &str,
    context: Value,
    url: String,
    timestamp: String,
    user_agent: String,
) -> LogEntry {
    LogEntry {
        level,
        message: message.to_string(),
        context: if context.is_null() { json!({}) } else { context },
        url,
        timestamp,
        user_agent,
    }
}

fn mirror_to_console(level: LogLevel, message: &str, context: &Value) {
    let message = JsValue::from_str(message);
    let context = JsValue::from_str(&context.to_string());
    match level {
        LogLevel::Error => console::error_2(&message, &context),
        LogLevel::Warning => console::warn_2(&message, &context),
        LogLevel::Info => console::info_2(&message, &context),
        LogLevel::Debug => console::debug_2(&message, &context),
    }
}

fn current_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

fn user_agent() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}

fn now_iso() -> String {
    String::from(js_sys::Date::new_0().to_iso_string())
}

/// Text for an unhandled promise rejection reason
pub fn rejection_message(reason: Option<String>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!("Unhandled promise rejection: {}", reason),
        _ => "Unhandled promise rejection".to_string(),
    }
}

/// Forward `window` `error` and `unhandledrejection` events as error entries
pub fn install_global_handlers(logger: &BrowserLogger) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let error_logger = logger.clone();
    let on_error = Closure::<dyn FnMut(ErrorEvent)>::new(move |event: ErrorEvent| {
        error_logger.error(
            &event.message(),
            json!({
                "source": event.filename(),
                "line": event.lineno(),
                "column": event.colno(),
            }),
        );
    });
    if window
        .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
        .is_ok()
    {
        on_error.forget();
    }

    let rejection_logger = logger.clone();
    let on_rejection = Closure::<dyn FnMut(PromiseRejectionEvent)>::new(move |event: PromiseRejectionEvent| {
        let reason = event.reason();
        let text = reason
            .as_string()
            .or_else(|| js_sys::JSON::stringify(&reason).ok().map(String::from));
        rejection_logger.error(&rejection_message(text), json!({}));
    });
    if window
        .add_event_listener_with_callback("unhandledrejection", on_rejection.as_ref().unchecked_ref())
        .is_ok()
    {
        on_rejection.forget();
    }
}
