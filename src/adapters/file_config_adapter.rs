//! INI file configuration adapter.
//!
//! Sections read by bitage: `[sqlite]` (path, pool_size), `[market_data]`
//! (csv_dir) and `[plans]` (reject_future_ath_date).

use std::path::Path;

use configparser::ini::Ini;

use crate::ports::config_port::ConfigPort;

#[derive(Debug)]
pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut ini = Ini::new();
        ini.load(path).map_err(std::io::Error::other)?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut ini = Ini::new();
        ini.read(content.to_string())?;
        Ok(Self { ini })
    }
}

impl ConfigPort for FileConfigAdapter {
    /// Empty values count as missing.
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .filter(|value| !value.trim().is_empty())
    }
}
