//! Engine option values and the record of what an engine has accepted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value for a UCI `setoption` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Int(n)
    }
}

impl From<i32> for OptionValue {
    fn from(n: i32) -> Self {
        OptionValue::Int(n.into())
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

/// Option set applied by every client during initialization, before caller overrides.
///
/// Both "Contempt" and "Contempt Factor" are listed because engine builds
/// disagree on the name; whichever one a build lacks is rejected and logged.
pub fn baseline_options() -> BTreeMap<String, OptionValue> {
    let entries: [(&str, OptionValue); 12] = [
        ("Write Debug Log", false.into()),
        ("Contempt Factor", 0.into()),
        ("Contempt", 0.into()),
        ("Min Split Depth", 0.into()),
        ("Threads", 1.into()),
        ("Hash", 16.into()),
        ("MultiPV", 1.into()),
        ("Skill Level", 20.into()),
        ("Move Overhead", 30.into()),
        ("Minimum Thinking Time", 20.into()),
        ("Slow Mover", 80.into()),
        ("UCI_Chess960", false.into()),
    ];
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Options the engine has acknowledged, exactly as they were sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineOptions {
    values: BTreeMap<String, OptionValue>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of principal variations the engine reports. Defaults to 1
    /// when MultiPV was never accepted or is not a positive integer.
    pub fn multipv(&self) -> u32 {
        match self.values.get("MultiPV") {
            Some(OptionValue::Int(n)) if *n > 0 => u32::try_from(*n).unwrap_or(u32::MAX),
            Some(OptionValue::Str(s)) => s.parse().ok().filter(|n| *n > 0).unwrap_or(1),
            _ => 1,
        }
    }

    pub(crate) fn record(&mut self, name: &str, value: OptionValue) {
        self.values.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_value_display_matches_wire_format() {
        assert_eq!(OptionValue::Bool(false).to_string(), "false");
        assert_eq!(OptionValue::Int(-7).to_string(), "-7");
        assert_eq!(OptionValue::Str("<empty>".to_string()).to_string(), "<empty>");
    }

    #[test]
    fn test_baseline_contains_both_contempt_names() {
        let baseline = baseline_options();
        assert_eq!(baseline.len(), 12);
        assert_eq!(baseline.get("Contempt"), Some(&OptionValue::Int(0)));
        assert_eq!(baseline.get("Contempt Factor"), Some(&OptionValue::Int(0)));
        assert_eq!(baseline.get("Hash"), Some(&OptionValue::Int(16)));
        assert_eq!(baseline.get("UCI_Chess960"), Some(&OptionValue::Bool(false)));
    }

    #[test]
    fn test_multipv_defaults_to_one() {
        let mut options = EngineOptions::new();
        assert_eq!(options.multipv(), 1);

        options.record("MultiPV", OptionValue::Int(0));
        assert_eq!(options.multipv(), 1);

        options.record("MultiPV", OptionValue::Int(4));
        assert_eq!(options.multipv(), 4);

        options.record("MultiPV", OptionValue::Str("3".to_string()));
        assert_eq!(options.multipv(), 3);
    }

    #[test]
    fn test_iter_yields_recorded_values_in_name_order() {
        let mut options = EngineOptions::new();
        options.record("Threads", OptionValue::Int(2));
        options.record("Hash", OptionValue::Int(64));
        options.record("Ponder", OptionValue::Bool(false));

        let listed: Vec<(&str, String)> = options
            .iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("Hash", "64".to_string()),
                ("Ponder", "false".to_string()),
                ("Threads", "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_option_value_deserializes_untagged() {
        #[derive(Deserialize)]
        struct Wrapper {
            options: BTreeMap<String, OptionValue>,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
[options]
Hash = 64
Ponder = true
"Syzygy Path" = "/tb"
"#,
        )
        .unwrap();

        assert_eq!(parsed.options["Hash"], OptionValue::Int(64));
        assert_eq!(parsed.options["Ponder"], OptionValue::Bool(true));
        assert_eq!(parsed.options["Syzygy Path"], OptionValue::Str("/tb".to_string()));
    }
}
