//! Fragments and their `defaults` lists.
//!
//! ```yaml
//! # @package _global_
//! defaults:
//!   - /pipeline: listops
//!   - /model: s4
//!   - override /scheduler: cosine_warmup
//!
//! model:
//!   d_model: 128
//! ```

use std::fmt;

use crate::error::ConfigError;
use crate::tree::{yaml, ConfigNode, KeyPath};

const DEFAULTS_KEY: &str = "defaults";
const SELF_MARKER: &str = "_self_";
const PACKAGE_DIRECTIVE: &str = "@package";

/// How an overlay lands on the base tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Recursive key-wise union; the overlay wins on collisions.
    Merge,
    /// The base subtree at the target is discarded.
    Replace,
}

/// The `# @package` header of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageHeader {
    /// `_global_`: contents land at the root.
    Global,
    /// `_group_`: contents land at the fragment's group path.
    Group,
    Path(KeyPath),
}

impl PackageHeader {
    fn parse(text: &str) -> Self {
        match text {
            "_global_" => PackageHeader::Global,
            "_group_" => PackageHeader::Group,
            other => PackageHeader::Path(KeyPath::parse(other)),
        }
    }
}

/// One entry of a `defaults` list that names a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayReference {
    /// Config group, empty for a bare entry. A leading `/` makes it absolute.
    pub group: String,
    /// Selected option; `None` disables the entry.
    pub option: Option<String>,
    /// Explicit target package (`group@package`).
    pub package: Option<KeyPath>,
    pub mode: MergeMode,
    /// A missing fragment is skipped instead of failing the load.
    pub optional: bool,
}

impl OverlayReference {
    /// True for bare entries (`- base`) that name a fragment, not a group.
    pub fn is_bare(&self) -> bool {
        self.group.is_empty()
    }

    /// Absolute group path, given the directory of the including fragment.
    pub fn absolute_group(&self, dir: &str) -> String {
        absolute_name(&self.group, dir)
    }

    /// Name of the fragment selected by `option`.
    pub fn fragment_name(&self, dir: &str, option: &str) -> String {
        if self.is_bare() {
            return absolute_name(option, dir);
        }
        format!("{}/{}", self.absolute_group(dir), option)
    }
}

impl fmt::Display for OverlayReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode == MergeMode::Replace {
            write!(f, "override ")?;
        }
        if self.optional {
            write!(f, "optional ")?;
        }
        let option = self.option.as_deref().unwrap_or("null");
        if self.is_bare() {
            return write!(f, "{}", option);
        }
        write!(f, "{}", self.group)?;
        if let Some(package) = &self.package {
            write!(f, "@{}", package)?;
        }
        write!(f, ": {}", option)
    }
}

/// An entry of a `defaults` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultsEntry {
    /// `_self_`. Accepted for compatibility; local keys always apply last.
    SelfMarker,
    Overlay(OverlayReference),
}

impl DefaultsEntry {
    /// Parse one list item: a bare string or a single-key mapping.
    pub fn parse(item: &ConfigNode) -> Result<Self, ConfigError> {
        match item {
            ConfigNode::String(s) if s == SELF_MARKER => Ok(DefaultsEntry::SelfMarker),
            ConfigNode::String(s) => {
                check_name(s, s)?;
                Ok(DefaultsEntry::Overlay(OverlayReference {
                    group: String::new(),
                    option: Some(s.clone()),
                    package: None,
                    mode: MergeMode::Merge,
                    optional: false,
                }))
            }
            ConfigNode::Mapping(map) => match (map.len(), map.iter().next()) {
                (1, Some((key, value))) => {
                    parse_keyed_entry(key, value).map(DefaultsEntry::Overlay)
                }
                _ => Err(unexpected_item(item)),
            },
            other => Err(unexpected_item(other)),
        }
    }
}

fn unexpected_item(item: &ConfigNode) -> ConfigError {
    ConfigError::UnknownOverlayTarget {
        entry: describe_item(item),
        reason: "expected `name` or a single `group: option` pair".to_string(),
    }
}

fn parse_keyed_entry(key: &str, value: &ConfigNode) -> Result<OverlayReference, ConfigError> {
    let entry = format!("{}: {}", key, describe_item(value));
    let malformed = |reason: &str| ConfigError::UnknownOverlayTarget {
        entry: entry.clone(),
        reason: reason.to_string(),
    };

    let mut mode = MergeMode::Merge;
    let mut optional = false;
    let mut target = None;
    for word in key.split_whitespace() {
        match word {
            "override" if target.is_none() => mode = MergeMode::Replace,
            "optional" if target.is_none() => optional = true,
            _ if target.is_none() => target = Some(word),
            _ => return Err(malformed("unexpected words after the group name")),
        }
    }
    let target = target.ok_or_else(|| malformed("missing group name"))?;

    let (group, package) = match target.split_once('@') {
        Some((group, package)) => {
            let package = KeyPath::parse(package);
            if !package.is_well_formed() {
                return Err(malformed("malformed package after `@`"));
            }
            (group, Some(package))
        }
        None => (target, None),
    };
    check_name(group, &entry)?;

    let option = match value {
        ConfigNode::Null => None,
        ConfigNode::String(option) => {
            check_name(option, &entry)?;
            Some(option.clone())
        }
        other => {
            return Err(malformed(&format!(
                "option must be a name or null, found {}",
                other.kind()
            )))
        }
    };

    Ok(OverlayReference {
        group: group.to_string(),
        option,
        package,
        mode,
        optional,
    })
}

/// Group and option names are slash-separated words that stay inside the
/// search roots.
fn check_name(name: &str, entry: &str) -> Result<(), ConfigError> {
    let trimmed = name.strip_prefix('/').unwrap_or(name);
    let valid = !trimmed.is_empty()
        && trimmed
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
        && !trimmed.contains(|c: char| c.is_whitespace() || c == '\\');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::UnknownOverlayTarget {
            entry: entry.to_string(),
            reason: format!("`{}` is not a valid config name", name),
        })
    }
}

fn absolute_name(name: &str, dir: &str) -> String {
    match name.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if dir.is_empty() => name.to_string(),
        None => format!("{}/{}", dir, name),
    }
}

fn describe_item(item: &ConfigNode) -> String {
    item.render_scalar()
        .unwrap_or_else(|| format!("<{}>", item.kind()))
}

/// Directory part of a fragment name (`model/layer/s4` → `model/layer`).
pub fn parent_dir(name: &str) -> &str {
    name.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// A parsed fragment: header, defaults list and local keys.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub name: String,
    pub header: Option<PackageHeader>,
    pub defaults: Vec<DefaultsEntry>,
    /// Everything except the `defaults` key.
    pub body: ConfigNode,
}

impl Fragment {
    pub fn parse(name: &str, text: &str) -> Result<Self, ConfigError> {
        let header = parse_header(text);
        let mut body = yaml::parse_document(name, text)?;

        let defaults = match body.as_mapping_mut().and_then(|map| map.remove(DEFAULTS_KEY)) {
            None | Some(ConfigNode::Null) => Vec::new(),
            Some(ConfigNode::Sequence(items)) => items
                .iter()
                .map(DefaultsEntry::parse)
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(ConfigError::UnknownOverlayTarget {
                    entry: format!("{}: defaults", name),
                    reason: format!("`defaults` must be a list, found {}", other.kind()),
                })
            }
        };

        Ok(Self {
            name: name.to_string(),
            header,
            defaults,
            body,
        })
    }

    /// The directory that relative defaults entries are resolved against.
    pub fn dir(&self) -> &str {
        parent_dir(&self.name)
    }
}

/// Find `# @package <pkg>` among the leading comment lines.
fn parse_header(text: &str) -> Option<PackageHeader> {
    text.lines()
        .map(str::trim)
        .take_while(|line| line.is_empty() || line.starts_with('#'))
        .filter_map(|line| line.trim_start_matches('#').trim().strip_prefix(PACKAGE_DIRECTIVE))
        .map(str::trim)
        .find(|package| !package.is_empty())
        .map(PackageHeader::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPERIMENT: &str = "\
# @package _global_
defaults:
  - /pipeline: listops
  - /model: s4
  - override /scheduler: cosine_warmup

model:
  d_model: 128
";

    fn overlay(entry: DefaultsEntry) -> OverlayReference {
        match entry {
            DefaultsEntry::Overlay(reference) => reference,
            DefaultsEntry::SelfMarker => panic!("expected an overlay entry"),
        }
    }

    #[test]
    fn test_parse_experiment_fragment() {
        let fragment = Fragment::parse("experiment/lra/s4-listops", EXPERIMENT).unwrap();
        assert_eq!(fragment.header, Some(PackageHeader::Global));
        assert_eq!(fragment.dir(), "experiment/lra");
        assert_eq!(fragment.defaults.len(), 3);
        assert!(fragment.body.as_mapping().unwrap().get("defaults").is_none());

        let scheduler = overlay(fragment.defaults[2].clone());
        assert_eq!(scheduler.group, "/scheduler");
        assert_eq!(scheduler.option.as_deref(), Some("cosine_warmup"));
        assert_eq!(scheduler.mode, MergeMode::Replace);
        assert_eq!(scheduler.fragment_name("experiment/lra", "cosine_warmup"), "scheduler/cosine_warmup");
        assert_eq!(scheduler.to_string(), "override /scheduler: cosine_warmup");
    }

    #[test]
    fn test_relative_and_bare_entries() {
        let fragment = Fragment::parse(
            "model/s4",
            "defaults:\n  - _self_\n  - layer: s4\n  - base\n  - optional extras@model.extras: none\n",
        )
        .unwrap();
        assert_eq!(fragment.header, None);
        assert_eq!(fragment.defaults[0], DefaultsEntry::SelfMarker);

        let layer = overlay(fragment.defaults[1].clone());
        assert_eq!(layer.absolute_group("model"), "model/layer");
        assert_eq!(layer.fragment_name("model", "s4"), "model/layer/s4");

        let base = overlay(fragment.defaults[2].clone());
        assert!(base.is_bare());
        assert_eq!(base.fragment_name("model", "base"), "model/base");

        let extras = overlay(fragment.defaults[3].clone());
        assert!(extras.optional);
        assert_eq!(extras.package, Some(KeyPath::parse("model.extras")));
    }

    #[test]
    fn test_null_option_disables_entry() {
        let fragment = Fragment::parse("root", "defaults:\n  - /model: null\n").unwrap();
        assert_eq!(overlay(fragment.defaults[0].clone()).option, None);
    }

    #[test]
    fn test_malformed_entries() {
        let cases = [
            "defaults:\n  - 42\n",
            "defaults:\n  - {a: x, b: y}\n",
            "defaults:\n  - /model: {d_model: 1}\n",
            "defaults:\n  - override /model extra: s4\n",
            "defaults:\n  - /model: ../secrets\n",
            "defaults:\n  - override: s4\n",
            "defaults: /model\n",
        ];
        for text in cases {
            assert!(
                matches!(
                    Fragment::parse("root", text),
                    Err(ConfigError::UnknownOverlayTarget { .. })
                ),
                "expected UnknownOverlayTarget for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_package_headers() {
        assert_eq!(parse_header("# @package _group_\nx: 1\n"), Some(PackageHeader::Group));
        assert_eq!(
            parse_header("\n# comment\n#@package model.encoder\nx: 1\n"),
            Some(PackageHeader::Path(KeyPath::parse("model.encoder")))
        );
        assert_eq!(parse_header("x: 1\n# @package _global_\n"), None);
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("model/layer/s4"), "model/layer");
        assert_eq!(parent_dir("config"), "");
    }
}
