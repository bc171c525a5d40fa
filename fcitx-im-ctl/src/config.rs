use std::path::Path;

use anyhow::Result;
use fcitx_im_client::transport::{self, BusType, ProxyFlag, ProxyFlags};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, CopyGetters, Getters, Clone, Debug)]
pub struct Config {
    #[getset(get_copy = "pub")]
    log_timestamp: Option<bool>,

    #[getset(get = "pub")]
    #[serde(default)]
    log_directives: Vec<String>,

    #[getset(get_copy = "pub")]
    #[serde(default)]
    bus: BusType,

    /// Falls back to the number in DISPLAY.
    #[getset(get_copy = "pub")]
    display_number: Option<i32>,

    #[serde(default)]
    flags: Vec<ProxyFlag>,
}

impl Config {
    pub fn new(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            Figment::new().merge(Toml::file(path)).extract()?
        } else {
            Figment::new().extract()?
        };
        Ok(config)
    }

    pub fn flags(&self) -> ProxyFlags {
        self.flags.iter().copied().collect()
    }

    pub fn resolved_display_number(&self) -> i32 {
        self.display_number
            .unwrap_or_else(transport::display_number_from_env)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::new(Path::new("/nonexistent/fcitx-im-ctl/config.toml")).unwrap();
        assert_eq!(config.bus(), BusType::Session);
        assert_eq!(config.display_number(), None);
        assert!(config.flags().is_empty());
        assert!(config.log_directives().is_empty());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
log_timestamp = true
log_directives = ["fcitx_im_client=debug"]
bus = "system"
display_number = 2
flags = ["do-not-load-properties"]
"#
        )
        .unwrap();

        let config = Config::new(&path).unwrap();
        assert_eq!(config.log_timestamp(), Some(true));
        assert_eq!(config.log_directives(), &["fcitx_im_client=debug".to_string()]);
        assert_eq!(config.bus(), BusType::System);
        assert_eq!(config.resolved_display_number(), 2);
        assert!(config.flags().contains(ProxyFlag::DoNotLoadProperties));
        assert!(!config.flags().contains(ProxyFlag::DoNotConnectSignals));
    }
}
