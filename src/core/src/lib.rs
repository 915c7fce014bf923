//! # State and plumbing for a sourmash sketching component
//!
//! snipe lets a user pick sequence files, asks an external worker to sketch
//! them, tracks per-file progress and results, and packages the resulting
//! signatures for download, one `.sig` at a time or as a zip bundle.
//!
//! Sketch computation itself is not done here: the worker is a black box
//! reached through the messages in [`protocol`]. In the browser it is a web
//! worker running sourmash compiled to wasm (see the `snipe-wasm` crate);
//! natively [`process::ProcessWorker`] drives the `sourmash` command line.

pub mod errors;
pub use errors::SnipeError as Error;

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude;

pub mod config;
pub mod download;
pub mod events;
pub mod options;
pub mod protocol;
pub mod selection;
pub mod session;
pub mod status;
pub mod view;

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(not(target_arch = "wasm32"))] {
        pub mod process;
    }
}
