use std::collections::BTreeMap;

/// Notifications a session sends to whoever renders or embeds it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Files or per-file state changed; views should be refreshed.
    Changed,
    /// A signature arrived for one file.
    Load { filename: String, signature: String },
    /// Every tracked file now has a signature.
    LoadEnd { signatures: BTreeMap<String, String> },
}

impl SessionEvent {
    /// DOM event name for the lifecycle events embedding pages listen to.
    pub fn dom_name(&self) -> Option<&'static str> {
        match self {
            SessionEvent::Changed => None,
            SessionEvent::Load { .. } => Some("load"),
            SessionEvent::LoadEnd { .. } => Some("loadend"),
        }
    }
}

pub type Listener = Box<dyn FnMut(&SessionEvent)>;

#[derive(Default)]
pub(crate) struct Listeners(Vec<Listener>);

impl Listeners {
    pub(crate) fn push(&mut self, listener: Listener) {
        self.0.push(listener);
    }

    pub(crate) fn emit(&mut self, event: &SessionEvent) {
        for listener in self.0.iter_mut() {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Listeners({})", self.0.len())
    }
}
