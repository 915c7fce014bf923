use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::download::DEFAULT_ARCHIVE_NAME;
use crate::selection::ExtensionAllowlist;
use crate::Result;

/// Component settings that are not sketch parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TypedBuilder)]
#[serde(default)]
pub struct ComponentConfig {
    #[builder(default)]
    pub extensions: ExtensionAllowlist,

    /// Show each computed signature inline under its file.
    #[builder(default = false)]
    pub show_signatures: bool,

    #[builder(default = DEFAULT_ARCHIVE_NAME.into(), setter(into))]
    pub archive_name: String,
}

impl Default for ComponentConfig {
    fn default() -> ComponentConfig {
        ComponentConfig::builder().build()
    }
}

impl ComponentConfig {
    /// Read a config from JSON, e.g. a host element attribute. Blank input
    /// gives the defaults.
    pub fn from_json(buf: &str) -> Result<ComponentConfig> {
        if buf.trim().is_empty() {
            return Ok(ComponentConfig::default());
        }
        Ok(serde_json::from_str(buf)?)
    }
}
