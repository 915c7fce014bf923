use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, File, HtmlElement, HtmlInputElement, MessageEvent, Worker};

use snipe::config::ComponentConfig;
use snipe::events::SessionEvent;
use snipe::options::{FormInput, SketchOptions};
use snipe::protocol::WorkerMessage;
use snipe::session::Session;
use snipe::view::{ACTIONS_REGION, FILES_REGION};
use snipe::Error;

pub mod dom;
pub mod worker;

use crate::dom::to_js;
use crate::worker::WebWorker;

// When the `console_error_panic_hook` feature is enabled, panics are logged
// with `console.error`.
#[cfg(feature = "console_error_panic_hook")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

type EventClosure = Closure<dyn FnMut(Event)>;

struct Component {
    host: HtmlElement,
    session: RefCell<Session<File, WebWorker>>,
    pending: Rc<RefCell<VecDeque<SessionEvent>>>,
    dom_listeners: RefCell<Vec<(&'static str, EventClosure)>>,
    worker_listener: RefCell<Option<Closure<dyn FnMut(MessageEvent)>>>,
}

/// The sketching dashboard, mounted into a host element.
///
/// Sketching runs in the web worker handed to the constructor; one worker
/// can be shared by several components.
#[wasm_bindgen]
pub struct SnipeComponent(Rc<Component>);

#[wasm_bindgen]
impl SnipeComponent {
    /// Mount into `host`, sending sketch requests to `worker`.
    ///
    /// `config` is an optional JSON object, e.g.
    /// `{"extensions": [".fa", ".fa.gz"], "show_signatures": true}`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        host: HtmlElement,
        worker: Worker,
        config: Option<String>,
    ) -> Result<SnipeComponent, JsValue> {
        let config = ComponentConfig::from_json(config.as_deref().unwrap_or("")).map_err(to_js)?;
        let mut session = Session::new(WebWorker::new(worker), config, SketchOptions::default());

        let pending = Rc::new(RefCell::new(VecDeque::new()));
        let queue = pending.clone();
        session.subscribe(move |event| queue.borrow_mut().push_back(event.clone()));

        let component = Rc::new(Component {
            host,
            session: RefCell::new(session),
            pending,
            dom_listeners: RefCell::new(vec![]),
            worker_listener: RefCell::new(None),
        });
        component.mount()?;
        Ok(SnipeComponent(component))
    }

    /// Mount into `host`, starting a dedicated worker from `script_url`.
    pub fn with_worker_script(
        host: HtmlElement,
        script_url: &str,
        config: Option<String>,
    ) -> Result<SnipeComponent, JsValue> {
        let worker = WebWorker::from_url(script_url).map_err(to_js)?;
        SnipeComponent::new(host, worker.inner().clone(), config)
    }

    #[wasm_bindgen(js_name = startSketching)]
    pub fn start_sketching(&self) -> Result<(), JsValue> {
        let res = self.0.session.borrow_mut().start_sketching();
        self.0.flush();
        res.map_err(to_js)
    }

    #[wasm_bindgen(js_name = clearSession)]
    pub fn clear_session(&self) {
        self.0.session.borrow_mut().clear();
        self.0.flush();
    }

    #[wasm_bindgen(js_name = downloadSketch)]
    pub fn download_sketch(&self, filename: &str) -> Result<(), JsValue> {
        let download = self
            .0
            .session
            .borrow()
            .download_sketch(filename)
            .map_err(to_js)?;
        dom::trigger_download(&download)
    }

    #[wasm_bindgen(js_name = downloadAllSketches)]
    pub fn download_all_sketches(&self) -> Result<(), JsValue> {
        let download = self.0.session.borrow().download_all().map_err(to_js)?;
        dom::trigger_download(&download)
    }

    /// Every computed signature, keyed by input filename.
    pub fn signatures(&self) -> Result<JsValue, JsValue> {
        let signatures = self.0.session.borrow().signatures();
        let json = serde_json::to_string(&signatures).map_err(|e| to_js(e.into()))?;
        js_sys::JSON::parse(&json)
    }

    /// Current sketch options as a plain object.
    pub fn options(&self) -> Result<JsValue, JsValue> {
        let json = serde_json::to_string(self.0.session.borrow().options())
            .map_err(|e| to_js(e.into()))?;
        js_sys::JSON::parse(&json)
    }

    /// Feed a worker message received by the host page itself.
    #[wasm_bindgen(js_name = handleWorkerMessage)]
    pub fn handle_worker_message(&self, data: JsValue) {
        if let Some(msg) = worker::decode(&data) {
            self.0.receive(msg);
        }
    }
}

fn data_attr(element: &Element, name: &str) -> Option<String> {
    element.get_attribute(name)
}

impl Component {
    fn mount(self: &Rc<Self>) -> Result<(), JsValue> {
        let view = self.session.borrow().view();
        self.host.set_inner_html(&view.render_form());

        let weak = Rc::downgrade(self);
        let listener = self
            .session
            .borrow()
            .worker()
            .on_message(move |msg| {
                if let Some(component) = weak.upgrade() {
                    component.receive(msg);
                }
            })
            .map_err(to_js)?;
        *self.worker_listener.borrow_mut() = Some(listener);

        self.listen("change", Component::on_change)?;
        self.listen("input", Component::on_input)?;
        self.listen("click", Component::on_click)?;
        Ok(())
    }

    fn listen(self: &Rc<Self>, name: &'static str, handler: fn(&Component, &Event)) -> Result<(), JsValue> {
        let weak: Weak<Component> = Rc::downgrade(self);
        let closure = EventClosure::new(move |event: Event| {
            if let Some(component) = weak.upgrade() {
                handler(&component, &event);
            }
        });
        self.host
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        self.dom_listeners.borrow_mut().push((name, closure));
        Ok(())
    }

    fn receive(&self, msg: WorkerMessage) {
        self.session.borrow_mut().handle_message(msg);
        self.flush();
    }

    /// Deliver queued session events: re-render on changes and forward
    /// lifecycle events to the page.
    fn flush(&self) {
        let mut changed = false;
        loop {
            let event = self.pending.borrow_mut().pop_front();
            let Some(event) = event else { break };
            match event {
                SessionEvent::Changed => changed = true,
                other => {
                    if let Err(e) = dom::dispatch_lifecycle(&self.host, &other) {
                        web_sys::console::warn_2(&"failed to dispatch event".into(), &e);
                    }
                }
            }
        }
        if changed {
            self.render();
        }
    }

    fn render(&self) {
        let view = self.session.borrow().view();
        for (region, html) in [
            (FILES_REGION, view.render_files()),
            (ACTIONS_REGION, view.render_actions()),
        ] {
            let selector = format!("[data-region=\"{}\"]", region);
            match self.host.query_selector(&selector) {
                Ok(Some(element)) => element.set_inner_html(&html),
                _ => log::warn!("region {} missing from component", region),
            }
        }
    }

    fn on_change(&self, event: &Event) {
        let Some(input) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        if data_attr(&input, "data-action").as_deref() != Some("select") {
            return;
        }
        event.prevent_default();

        let files: Vec<File> = match input.files() {
            Some(list) => (0..list.length()).filter_map(|i| list.get(i)).collect(),
            None => return,
        };
        self.session.borrow_mut().select_files(files);
        self.flush();
    }

    fn on_input(&self, event: &Event) {
        let Some(input) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(name) = data_attr(&input, "data-option") else {
            return;
        };

        let value = if input.type_() == "checkbox" {
            FormInput::Checkbox(input.checked())
        } else {
            FormInput::Value(input.value())
        };
        if let Err(e) = self.session.borrow_mut().edit_option_by_name(&name, &value) {
            web_sys::console::warn_1(&e.to_string().into());
        }
    }

    fn on_click(&self, event: &Event) {
        let Some(target) = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest("[data-action]").ok().flatten())
        else {
            return;
        };

        let res = match data_attr(&target, "data-action").as_deref() {
            Some("start") => {
                let res = self.session.borrow_mut().start_sketching();
                self.flush();
                match res {
                    Err(Error::NoFilesSelected) => {
                        dom::alert(&Error::NoFilesSelected.to_string());
                        Ok(())
                    }
                    other => other.map_err(to_js),
                }
            }
            Some("clear") => {
                self.session.borrow_mut().clear();
                self.flush();
                Ok(())
            }
            Some("download") => match data_attr(&target, "data-filename") {
                Some(filename) => self
                    .session
                    .borrow()
                    .download_sketch(&filename)
                    .map_err(to_js)
                    .and_then(|dl| dom::trigger_download(&dl)),
                None => Ok(()),
            },
            Some("download-all") => self
                .session
                .borrow()
                .download_all()
                .map_err(to_js)
                .and_then(|dl| dom::trigger_download(&dl)),
            _ => Ok(()),
        };

        if let Err(e) = res {
            web_sys::console::error_1(&e);
        }
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        for (name, closure) in self.dom_listeners.borrow_mut().drain(..) {
            let _ = self
                .host
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
        if let Some(closure) = self.worker_listener.borrow_mut().take() {
            let _ = self
                .session
                .borrow()
                .worker()
                .inner()
                .remove_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
        }
    }
}
