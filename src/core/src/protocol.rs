//! # Worker bridge
//!
//! Sketches are computed by an external worker reached only through
//! messages. The component posts one request per sketching run and the
//! worker streams back per-file events, in no particular order across
//! files.

use serde::{Deserialize, Serialize};

use crate::options::SketchOptions;
use crate::Result;

/// The single inbound message type: every selected file plus a snapshot of
/// the options.
#[derive(Serialize, Debug, Clone)]
pub struct WorkerRequest<'a, F> {
    pub files: &'a [F],
    pub options: SketchOptions,
}

/// Events posted back by the worker, tagged by `type`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "progress:read")]
    Progress { filename: String, progress: f64 },

    #[serde(rename = "signature:generated")]
    Generated { filename: String, signature: String },

    #[serde(rename = "signature:error")]
    Failed { filename: String, error: String },
}

impl WorkerMessage {
    pub fn filename(&self) -> &str {
        match self {
            WorkerMessage::Progress { filename, .. }
            | WorkerMessage::Generated { filename, .. }
            | WorkerMessage::Failed { filename, .. } => filename,
        }
    }

    /// Decode a message, returning `None` for anything unrecognized.
    pub fn from_value(value: serde_json::Value) -> Option<WorkerMessage> {
        match serde_json::from_value(value) {
            Ok(msg) => Some(msg),
            Err(e) => {
                log::trace!("ignoring worker message: {}", e);
                None
            }
        }
    }

    pub fn from_json(buf: &str) -> Option<WorkerMessage> {
        match serde_json::from_str(buf) {
            Ok(msg) => Some(msg),
            Err(e) => {
                log::trace!("ignoring worker message: {}", e);
                None
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The long-lived background channel sketching requests are posted to.
///
/// Posting is fire-and-forget: results come back later as
/// [`WorkerMessage`]s delivered by the host to the session.
pub trait SketchWorker<F> {
    fn post(&self, request: WorkerRequest<'_, F>) -> Result<()>;
}

impl<F, W: SketchWorker<F> + ?Sized> SketchWorker<F> for &W {
    fn post(&self, request: WorkerRequest<'_, F>) -> Result<()> {
        (**self).post(request)
    }
}

impl<F, W: SketchWorker<F> + ?Sized> SketchWorker<F> for Box<W> {
    fn post(&self, request: WorkerRequest<'_, F>) -> Result<()> {
        (**self).post(request)
    }
}
