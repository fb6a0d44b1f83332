//! Run configuration (spec SPEC_FULL §4.7). Never part of the language
//! surface itself — spec §6 is unchanged: no env vars or CLI flags are part
//! of the *core* contract — but the binary driving the core needs
//! somewhere to put its knobs, and the teacher's LSP message types already
//! lean on `serde` for exactly this kind of small deserializable struct.

use std::fs;
use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// When set, the concrete action sink maps every `delay` call to
    /// `Duration::ZERO` instead of sleeping. Purely a sink behavior; it
    /// never changes interpreter semantics.
    pub fast_forward: bool,
    #[serde(with = "level_filter_serde")]
    pub log_level: LevelFilter,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fast_forward: false,
            log_level: LevelFilter::Warn,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

mod level_filter_serde {
    use log::LevelFilter;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &LevelFilter, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LevelFilter, D::Error> {
        let s = String::deserialize(d)?;
        LevelFilter::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_fast_forward_and_warn_level() {
        let cfg = RunConfig::default();
        assert!(!cfg.fast_forward);
        assert_eq!(cfg.log_level, LevelFilter::Warn);
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = RunConfig {
            fast_forward: true,
            log_level: LevelFilter::Debug,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert!(back.fast_forward);
        assert_eq!(back.log_level, LevelFilter::Debug);
    }
}
