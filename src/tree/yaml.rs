//! Conversion from YAML documents into configuration trees.

use serde_yaml::Value;

use crate::error::ConfigError;
use crate::tree::node::{ConfigNode, Mapping, Number};
use crate::tree::reference::{parse_text, ParsedText};

/// Parse a YAML document. An empty document is an empty mapping.
pub fn parse_document(name: &str, text: &str) -> Result<ConfigNode, ConfigError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    match value {
        Value::Null => Ok(ConfigNode::empty_mapping()),
        Value::Mapping(_) => from_yaml(name, value),
        other => Err(ConfigError::Parse {
            name: name.to_string(),
            message: format!("top level must be a mapping, found {}", yaml_kind(&other)),
        }),
    }
}

/// Parse a single value written on the command line (`128`, `true`, `[1, 2]`).
/// The empty string stays an empty string.
pub fn parse_value(name: &str, text: &str) -> Result<ConfigNode, ConfigError> {
    if text.is_empty() {
        return Ok(ConfigNode::String(String::new()));
    }
    let value: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    from_yaml(name, value)
}

/// Convert a YAML value. String scalars are scanned for `${...}` tokens.
pub fn from_yaml(name: &str, value: Value) -> Result<ConfigNode, ConfigError> {
    Ok(match value {
        Value::Null => ConfigNode::Null,
        Value::Bool(b) => ConfigNode::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigNode::Number(Number::Int(i)),
            None => ConfigNode::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => match parse_text(&s)? {
            ParsedText::Plain(plain) => ConfigNode::String(plain),
            ParsedText::Interpolated(reference) => ConfigNode::Reference(reference),
        },
        Value::Sequence(items) => ConfigNode::Sequence(
            items
                .into_iter()
                .map(|item| from_yaml(name, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(entries) => {
            let mut map = Mapping::new();
            for (key, value) in entries {
                map.insert(mapping_key(name, key)?, from_yaml(name, value)?);
            }
            ConfigNode::Mapping(map)
        }
        Value::Tagged(tagged) => from_yaml(name, tagged.value)?,
    })
}

fn mapping_key(name: &str, key: Value) -> Result<String, ConfigError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ConfigError::Parse {
            name: name.to_string(),
            message: format!("mapping keys must be scalars, found {}", yaml_kind(&other)),
        }),
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::path::KeyPath;

    #[test]
    fn test_scalar_types() {
        let tree = parse_document(
            "t",
            "dropout: 0.\nn_layers: 8\nprenorm: false\nnorm: batch\nexpand: null\nlr: 0.001\n",
        )
        .unwrap();
        let get = |p: &str| tree.get(&KeyPath::parse(p)).unwrap().clone();

        assert_eq!(get("dropout"), ConfigNode::Number(Number::Float(0.0)));
        assert_eq!(get("n_layers"), ConfigNode::Number(Number::Int(8)));
        assert_eq!(get("prenorm"), ConfigNode::Bool(false));
        assert_eq!(get("norm"), ConfigNode::String("batch".to_string()));
        assert_eq!(get("expand"), ConfigNode::Null);
        assert_eq!(get("lr").as_f64(), Some(0.001));
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        assert_eq!(parse_document("t", "").unwrap(), ConfigNode::empty_mapping());
        assert_eq!(parse_document("t", "# only a comment\n").unwrap(), ConfigNode::empty_mapping());
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        assert!(matches!(
            parse_document("t", "- a\n- b\n"),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            parse_document("t", "model: [unclosed\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_reference_tokens_become_references() {
        let tree = parse_document("t", "n_ssm: ${..d_model}\n").unwrap();
        assert!(matches!(
            tree.get(&KeyPath::parse("n_ssm")),
            Some(ConfigNode::Reference(_))
        ));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("o", "256").unwrap(), ConfigNode::from(256i64));
        assert_eq!(parse_value("o", "true").unwrap(), ConfigNode::Bool(true));
        assert_eq!(parse_value("o", "").unwrap(), ConfigNode::String(String::new()));
        assert_eq!(parse_value("o", "null").unwrap(), ConfigNode::Null);
        assert!(matches!(
            parse_value("o", "[1, 2]").unwrap(),
            ConfigNode::Sequence(items) if items.len() == 2
        ));
    }
}
