//! Serializable grammar descriptions.
//!
//! A [`Grammar`] mirrors the parser tree: flags own nested flags and
//! positional arguments, and exclusive groups bundle flags of which at most
//! one may appear.
//!
//! # Example YAML
//!
//! ```yaml
//! program: power-tool
//! help: true
//! flags:
//!   - key: -p
//!     policy: optional
//!     description: Specify power output.
//!     args:
//!       - name: number_watts
//!         convert: { type: integer, min: 0, max: 50 }
//!   - key: --speed
//!     flags:
//!       - exclusive: mandatory
//!         members:
//!           - key: slow
//!           - key: fast
//! ```

use std::collections::HashSet;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use argtree_core::{GrammarError, HELP_KEY, Policy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::value::ConverterSpec;

/// Root of a grammar file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Grammar {
    /// Program name used in usage output until `argv[0]` overrides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Registers the built-in `--help` flag.
    #[serde(default)]
    pub help: bool,
    /// Positional arguments of the root scope.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSpec>,
    /// Flags and exclusive groups of the root scope.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagEntry>,
}

/// A flag or an exclusive group inside a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagEntry {
    Group(GroupSpec),
    Flag(FlagSpec),
}

/// A flag; it becomes complex when it declares nested args or flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagSpec {
    pub key: String,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagEntry>,
}

/// Exclusive group. Members share the group's policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSpec {
    pub exclusive: Policy,
    pub members: Vec<MemberSpec>,
}

/// A flag inside an exclusive group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberSpec {
    pub key: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagEntry>,
}

/// A positional argument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgSpec {
    pub name: String,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub convert: ConverterSpec,
}

impl FlagSpec {
    pub fn is_complex(&self) -> bool {
        !self.args.is_empty() || !self.flags.is_empty()
    }
}

impl FlagEntry {
    /// Whether this entry puts `key` into its scope.
    pub fn declares(&self, key: &str) -> bool {
        match self {
            FlagEntry::Flag(flag) => flag.key == key,
            FlagEntry::Group(group) => group.members.iter().any(|m| m.key == key),
        }
    }
}

impl MemberSpec {
    pub fn is_complex(&self) -> bool {
        !self.args.is_empty() || !self.flags.is_empty()
    }
}

/// On-disk encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml" | "yml") => Ok(Format::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl Grammar {
    /// Loads a grammar from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](ConfigError::UnsupportedFormat) for other
    /// extensions, [`Io`](ConfigError::Io) if the file cannot be read, or a
    /// decoding error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let grammar: Grammar = match format {
            Format::Json => serde_json::from_reader(reader)?,
            Format::Yaml => serde_yaml::from_reader(reader)?,
        };
        debug!(
            path = %path.display(),
            flags = grammar.flags.len(),
            args = grammar.args.len(),
            "loaded grammar"
        );
        Ok(grammar)
    }

    /// Saves the grammar, encoding chosen by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        match format {
            Format::Json => serde_json::to_writer_pretty(writer, self)?,
            Format::Yaml => serde_yaml::to_writer(writer, self)?,
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validates the grammar without building a parser.
    ///
    /// Reports the same problems [`build`](Self::build) would: empty keys or
    /// argument names, keys repeated within one scope and converter settings
    /// that can never succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use argtree_config::Grammar;
    ///
    /// let grammar = Grammar::from_yaml_str("flags: [{ key: -a }, { key: -a }]").unwrap();
    /// assert!(grammar.check().is_err());
    /// ```
    pub fn check(&self) -> Result<()> {
        check_scope(&self.args, &self.flags)?;
        if self.help && self.flags.iter().any(|entry| entry.declares(HELP_KEY)) {
            return Err(GrammarError::DuplicateKey(HELP_KEY.to_string()).into());
        }
        Ok(())
    }
}

fn check_scope(args: &[ArgSpec], flags: &[FlagEntry]) -> Result<()> {
    for arg in args {
        if arg.name.trim().is_empty() {
            return Err(GrammarError::EmptyArgumentName.into());
        }
        arg.convert.pipeline(&arg.name)?;
    }

    let mut seen = HashSet::new();
    let mut claim = |key: &str| -> Result<()> {
        if key.trim().is_empty() {
            return Err(GrammarError::EmptyKey.into());
        }
        if !seen.insert(key.to_string()) {
            return Err(GrammarError::DuplicateKey(key.to_string()).into());
        }
        Ok(())
    };

    for entry in flags {
        match entry {
            FlagEntry::Flag(flag) => {
                claim(&flag.key)?;
                check_scope(&flag.args, &flag.flags)?;
            }
            FlagEntry::Group(group) => {
                for member in &group.members {
                    claim(&member.key)?;
                    check_scope(&member.args, &member.flags)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
program: power-tool
help: true
flags:
  - key: -p
    policy: optional
    description: Specify power output.
    args:
      - name: number_watts
        description: An integer representing the number of watts.
        convert: { type: integer, min: 0, max: 50 }
  - key: --speed
    description: Specify the speed.
    flags:
      - exclusive: mandatory
        members:
          - key: slow
          - key: medium
          - key: fast
"#
    }

    #[test]
    fn test_parse_sample() {
        let grammar = Grammar::from_yaml_str(sample_yaml()).unwrap();
        assert_eq!(grammar.program.as_deref(), Some("power-tool"));
        assert!(grammar.help);
        assert_eq!(grammar.flags.len(), 2);

        let FlagEntry::Flag(power) = &grammar.flags[0] else {
            panic!("expected a flag");
        };
        assert_eq!(power.policy, Policy::Optional);
        assert!(power.is_complex());
        assert_eq!(
            power.args[0].convert,
            ConverterSpec::Integer {
                min: Some(0),
                max: Some(50),
                min_inclusive: true,
                max_inclusive: true,
            }
        );

        let FlagEntry::Flag(speed) = &grammar.flags[1] else {
            panic!("expected a flag");
        };
        assert_eq!(speed.policy, Policy::Mandatory);
        let FlagEntry::Group(group) = &speed.flags[0] else {
            panic!("expected a group");
        };
        assert_eq!(group.exclusive, Policy::Mandatory);
        assert_eq!(group.members.len(), 3);
        assert!(!group.members[0].is_complex());
        assert!(grammar.check().is_ok());
    }

    #[test]
    fn test_defaults() {
        let grammar = Grammar::from_json_str(r#"{"args": [{"name": "file"}]}"#).unwrap();
        assert_eq!(grammar.program, None);
        assert!(!grammar.help);
        assert_eq!(grammar.args[0].policy, Policy::Mandatory);
        assert_eq!(grammar.args[0].convert, ConverterSpec::Text);
        assert_eq!(grammar.args[0].description, "");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(Grammar::from_yaml_str("flgs: []").is_err());
    }

    #[test]
    fn test_check_rejects_duplicates_across_group_and_scope() {
        let grammar = Grammar::from_yaml_str(
            r#"
flags:
  - key: -a
  - exclusive: optional
    members:
      - key: -a
"#,
        )
        .unwrap();
        assert!(matches!(
            grammar.check(),
            Err(ConfigError::Grammar(GrammarError::DuplicateKey(ref key))) if key == "-a"
        ));
    }

    #[test]
    fn test_check_allows_same_key_in_nested_scope() {
        let grammar = Grammar::from_yaml_str(
            r#"
flags:
  - key: --limit
  - key: fast
    flags:
      - key: --limit
"#,
        )
        .unwrap();
        assert!(grammar.check().is_ok());
    }

    #[test]
    fn test_check_reserves_help_key() {
        let mut grammar = Grammar::from_yaml_str("flags: [{ key: --help }]").unwrap();
        assert!(grammar.check().is_ok());
        grammar.help = true;
        assert!(matches!(
            grammar.check(),
            Err(ConfigError::Grammar(GrammarError::DuplicateKey(_)))
        ));
    }

    #[test]
    fn test_check_rejects_empty_names_and_bad_converters() {
        let empty = Grammar::from_yaml_str("args: [{ name: '' }]").unwrap();
        assert!(matches!(
            empty.check(),
            Err(ConfigError::Grammar(GrammarError::EmptyArgumentName))
        ));

        let bad = Grammar::from_yaml_str(
            "flags: [{ key: -n, args: [{ name: n, convert: { type: number, min: 2.0, max: 1.0 } }] }]",
        )
        .unwrap();
        assert!(matches!(bad.check(), Err(ConfigError::InvalidConverter { .. })));
    }

    #[test]
    fn test_load_and_save_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let grammar = Grammar::from_yaml_str(sample_yaml()).unwrap();

        let json = dir.path().join("grammar.json");
        grammar.save(&json).unwrap();
        assert_eq!(Grammar::load(&json).unwrap(), grammar);

        let yaml = dir.path().join("grammar.yml");
        grammar.save(&yaml).unwrap();
        assert_eq!(Grammar::load(&yaml).unwrap(), grammar);

        let toml = dir.path().join("grammar.toml");
        assert!(matches!(
            grammar.save(&toml),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            Grammar::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
