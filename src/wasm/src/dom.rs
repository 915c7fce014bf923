use js_sys::{Array, Reflect, Uint8Array, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Blob, BlobPropertyBag, CustomEvent, CustomEventInit, Document, HtmlAnchorElement, HtmlElement,
    Url,
};

use snipe::download::Download;
use snipe::errors::SnipeErrorCode;
use snipe::events::SessionEvent;
use snipe::Error;

/// Turn a crate error into a JS `Error` carrying a numeric `code`.
pub fn to_js(error: Error) -> JsValue {
    let code = SnipeErrorCode::from_error(&error) as u32;
    let js_error = js_sys::Error::new(&error.to_string());
    let _ = Reflect::set(&js_error, &"code".into(), &code.into());
    js_error.into()
}

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document available"))
}

pub fn alert(message: &str) {
    match web_sys::window() {
        Some(window) => {
            let _ = window.alert_with_message(message);
        }
        None => web_sys::console::warn_1(&message.into()),
    }
}

/// Hand a file to the browser by clicking a temporary object URL link.
pub fn trigger_download(download: &Download) -> Result<(), JsValue> {
    let bytes = Uint8Array::from(download.content.as_slice());
    let parts = Array::of1(&bytes);
    let options = BlobPropertyBag::new();
    options.set_type(download.mime);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

    let url = Url::create_object_url_with_blob(&blob)?;
    let link: HtmlAnchorElement = document()?.create_element("a")?.dyn_into()?;
    link.set_href(&url);
    link.set_download(&download.filename);
    link.click();
    Ok(())
}

/// `detail` payload of a lifecycle event.
pub fn event_detail(event: &SessionEvent) -> Option<serde_json::Value> {
    match event {
        SessionEvent::Changed => None,
        SessionEvent::Load {
            filename,
            signature,
        } => Some(serde_json::json!({
            "filename": filename,
            "signature": signature,
        })),
        SessionEvent::LoadEnd { signatures } => Some(serde_json::json!({
            "signatures": signatures,
        })),
    }
}

/// Fire `load`/`loadend` on the host element so embedding pages can react.
pub fn dispatch_lifecycle(host: &HtmlElement, event: &SessionEvent) -> Result<(), JsValue> {
    let (name, detail) = match (event.dom_name(), event_detail(event)) {
        (Some(name), Some(detail)) => (name, detail),
        _ => return Ok(()),
    };
    let detail = JSON::parse(&detail.to_string())?;

    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(&detail);
    let custom = CustomEvent::new_with_event_init_dict(name, &init)?;
    host.dispatch_event(&custom)?;
    Ok(())
}
