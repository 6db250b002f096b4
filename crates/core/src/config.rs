//! Push configuration file parsing (.attache.toml)

use std::collections::BTreeMap;
use std::path::Path;

use crate::mime::MimeTable;

/// Per-directory push configuration
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Also push files without an extension (off by default, matching the
    /// historical glob behavior)
    pub include_extensionless: bool,

    /// Content-type overrides, extension -> type
    pub mime: BTreeMap<String, String>,
}

/// Config file name
pub const CONFIG_FILE: &str = ".attache.toml";

impl PushConfig {
    /// Load config from the pushed directory.
    ///
    /// Returns default config if .attache.toml doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(root: &Path) -> color_eyre::Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Build the effective MIME table: defaults plus overrides
    #[must_use]
    pub fn mime_table(&self) -> MimeTable {
        let mut table = MimeTable::default();
        table.extend(self.mime.clone());
        table
    }
}
