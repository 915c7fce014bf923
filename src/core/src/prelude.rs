pub use crate::config::ComponentConfig;
pub use crate::download::Download;
pub use crate::events::SessionEvent;
pub use crate::options::{FormInput, OptionKey, SketchOptions};
pub use crate::protocol::{SketchWorker, WorkerMessage, WorkerRequest};
pub use crate::selection::{ExtensionAllowlist, FileHandle};
pub use crate::session::Session;
pub use crate::status::FileStatus;
pub use crate::{Error, Result};
