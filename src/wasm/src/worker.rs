use js_sys::{Array, Object, Reflect, JSON};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{File, MessageEvent, Worker};

use snipe::protocol::{SketchWorker, WorkerMessage, WorkerRequest};
use snipe::{Error, Result};

/// Bridge to the web worker running the sketch computation.
///
/// Posts `{files, options}` and decodes whatever comes back; messages that
/// are not sketch events are dropped.
#[derive(Clone, Debug)]
pub struct WebWorker(Worker);

fn unavailable(e: JsValue) -> Error {
    Error::WorkerUnavailable {
        message: format!("{:?}", e),
    }
}

impl WebWorker {
    pub fn new(worker: Worker) -> WebWorker {
        WebWorker(worker)
    }

    /// Start a worker from a script URL.
    pub fn from_url(url: &str) -> Result<WebWorker> {
        Worker::new(url).map(WebWorker).map_err(unavailable)
    }

    pub fn inner(&self) -> &Worker {
        &self.0
    }

    /// Register `callback` for every sketch event the worker posts.
    ///
    /// The returned closure must be kept alive for as long as events
    /// should be delivered.
    pub fn on_message<C>(&self, mut callback: C) -> Result<Closure<dyn FnMut(MessageEvent)>>
    where
        C: FnMut(WorkerMessage) + 'static,
    {
        let closure = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            if let Some(msg) = decode(&event.data()) {
                callback(msg);
            }
        });
        self.0
            .add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
            .map_err(unavailable)?;
        Ok(closure)
    }
}

/// Decode a structured-clone message posted by the worker.
pub fn decode(data: &JsValue) -> Option<WorkerMessage> {
    let json = JSON::stringify(data).ok()?.as_string()?;
    WorkerMessage::from_json(&json)
}

impl SketchWorker<File> for WebWorker {
    fn post(&self, request: WorkerRequest<'_, File>) -> Result<()> {
        let files = Array::new();
        for file in request.files {
            files.push(file);
        }
        let options = JSON::parse(&serde_json::to_string(&request.options)?).map_err(unavailable)?;

        let msg = Object::new();
        Reflect::set(&msg, &"files".into(), &files).map_err(unavailable)?;
        Reflect::set(&msg, &"options".into(), &options).map_err(unavailable)?;
        self.0.post_message(&msg).map_err(unavailable)
    }
}
