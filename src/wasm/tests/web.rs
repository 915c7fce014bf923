//! Browser tests, run with `wasm-pack test --headless --firefox src/wasm`.

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Reflect, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Blob, BlobPropertyBag, CustomEvent, HtmlElement, Url, Worker};

use snipe_wasm::SnipeComponent;

wasm_bindgen_test_configure!(run_in_browser);

fn idle_worker() -> Worker {
    let parts = Array::of1(&"self.onmessage = () => {};".into());
    let options = BlobPropertyBag::new();
    options.set_type("text/javascript");
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options).unwrap();
    let url = Url::create_object_url_with_blob(&blob).unwrap();
    Worker::new(&url).unwrap()
}

fn host() -> HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let host: HtmlElement = document.create_element("div").unwrap().dyn_into().unwrap();
    document.body().unwrap().append_child(&host).unwrap();
    host
}

#[wasm_bindgen_test]
fn mounts_form() {
    let host = host();
    let _component = SnipeComponent::new(host.clone(), idle_worker(), None).unwrap();
    let html = host.inner_html();
    assert!(html.contains("Start Sketching"));
    assert!(html.contains(r#"accept=".fa,.fasta,.fna,.gz,.fq,.fastq""#));
    assert!(!html.contains("Download All as Zip"));
}

#[wasm_bindgen_test]
fn start_without_files_is_rejected() {
    let component = SnipeComponent::new(host(), idle_worker(), None).unwrap();
    let err = component.start_sketching().unwrap_err();
    let code = Reflect::get(&err, &"code".into()).unwrap();
    assert_eq!(code.as_f64(), Some(101.0));
}

#[wasm_bindgen_test]
fn worker_results_render_and_fire_events() {
    let host = host();
    let component = SnipeComponent::new(
        host.clone(),
        idle_worker(),
        Some(r#"{"show_signatures": true}"#.into()),
    )
    .unwrap();

    let loaded = Rc::new(RefCell::new(vec![]));
    let sink = loaded.clone();
    let listener = Closure::<dyn FnMut(CustomEvent)>::new(move |event: CustomEvent| {
        let filename = Reflect::get(&event.detail(), &"filename".into()).unwrap();
        sink.borrow_mut().push(filename.as_string().unwrap());
    });
    host.add_event_listener_with_callback("load", listener.as_ref().unchecked_ref())
        .unwrap();

    let msg = JSON::parse(r#"{"type":"signature:generated","filename":"x.fq","signature":"SIG"}"#)
        .unwrap();
    component.handle_worker_message(msg);

    assert_eq!(*loaded.borrow(), vec!["x.fq".to_string()]);
    let sigs = component.signatures().unwrap();
    assert_eq!(
        Reflect::get(&sigs, &"x.fq".into()).unwrap().as_string(),
        Some("SIG".into())
    );
    assert!(host.inner_html().contains("Download All as Zip"));

    component.clear_session();
    assert!(!host.inner_html().contains("Download All as Zip"));
}

#[wasm_bindgen_test]
fn unknown_messages_are_ignored() {
    let component = SnipeComponent::new(host(), idle_worker(), None).unwrap();
    component.handle_worker_message(JsValue::from_str("ready"));
    component.handle_worker_message(JSON::parse(r#"{"type":"worker:ready"}"#).unwrap());
    let sigs = component.signatures().unwrap();
    assert_eq!(js_sys::Object::keys(&sigs.unchecked_into()).length(), 0);
}
