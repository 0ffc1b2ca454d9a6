//! Configuration access port trait.
//!
//! Adapters only supply raw string lookups; typed accessors fall back to the
//! given default when a key is absent or its value does not parse.

use tracing::warn;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        typed(self.get_string(section, key), section, key, default, |v| {
            v.parse().ok()
        })
    }

    /// Accepts true/false, yes/no, on/off and 1/0, case-insensitively.
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        typed(self.get_string(section, key), section, key, default, |v| {
            match v.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            }
        })
    }
}

fn typed<T: Copy + std::fmt::Debug>(
    raw: Option<String>,
    section: &str,
    key: &str,
    default: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    parse(raw.trim()).unwrap_or_else(|| {
        warn!(section, key, value = %raw, ?default, "unparseable config value, using default");
        default
    })
}
