//! Reference resolution.
//!
//! Runs to a fixed point: every pass substitutes each reference whose target
//! exists and is itself free of references. Forward references settle in a
//! later pass. A pass that substitutes nothing while references remain means
//! a missing target or a cycle.

use crate::error::ConfigError;
use crate::tree::reference::Segment;
use crate::tree::{ConfigNode, KeyPath, Reference};

/// Counters from one resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub passes: usize,
    pub substitutions: usize,
}

/// Substitute every reference in `root`. A tree without references is left
/// untouched.
pub fn resolve_references(root: &mut ConfigNode) -> Result<ResolveStats, ConfigError> {
    let mut stats = ResolveStats::default();

    loop {
        let pending = root.references();
        if pending.is_empty() {
            return Ok(stats);
        }
        stats.passes += 1;

        let mut progressed = false;
        for (location, reference) in &pending {
            let Some(value) = substitute(root, location, reference) else {
                continue;
            };
            if let Some(slot) = root.get_mut(location) {
                *slot = value;
                stats.substitutions += 1;
                progressed = true;
            }
        }

        if !progressed {
            let (location, reference) = &pending[0];
            return Err(ConfigError::UnresolvedReference {
                location: location.to_string(),
                token: reference.source().to_string(),
                reason: diagnose(root, location, reference),
            });
        }

        tracing::trace!(pass = stats.passes, remaining = pending.len(), "Resolution pass finished");
    }
}

/// The value `reference` stands for, if it can be computed now.
fn substitute(root: &ConfigNode, location: &KeyPath, reference: &Reference) -> Option<ConfigNode> {
    if let Some(path) = reference.whole() {
        let target = root.get(&path.absolute_from(location)?)?;
        return target.is_resolved().then(|| target.clone());
    }

    let mut text = String::new();
    for segment in reference.segments() {
        match segment {
            Segment::Literal(literal) => text.push_str(literal),
            Segment::Ref(path) => {
                let target = root.get(&path.absolute_from(location)?)?;
                text.push_str(&target.render_scalar()?);
            }
        }
    }
    Some(ConfigNode::String(text))
}

/// Why `reference` at `location` cannot be substituted.
fn diagnose(root: &ConfigNode, location: &KeyPath, reference: &Reference) -> String {
    let embedded = reference.whole().is_none();
    for path in reference.paths() {
        let Some(absolute) = path.absolute_from(location) else {
            return format!("`{}` climbs above the root", path);
        };
        let Some(target) = root.get(&absolute) else {
            return format!("`{}` does not exist", absolute);
        };
        if !target.is_resolved() {
            return format!("`{}` is part of a reference cycle", absolute);
        }
        if embedded && target.render_scalar().is_none() {
            return format!("`{}` is a {} and cannot be embedded in a string", absolute, target.kind());
        }
    }
    "no substitution possible".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::yaml::parse_document;
    use crate::tree::{Mapping, Number};
    use proptest::prelude::*;

    fn doc(text: &str) -> ConfigNode {
        parse_document("test", text).unwrap()
    }

    fn at<'a>(tree: &'a ConfigNode, path: &str) -> &'a ConfigNode {
        tree.get(&KeyPath::parse(path)).unwrap()
    }

    #[test]
    fn test_parent_sibling_reference() {
        let mut tree = doc("model:\n  d_model: 128\n  layer:\n    n_ssm: ${..d_model}\n");
        resolve_references(&mut tree).unwrap();
        assert_eq!(at(&tree, "model.layer.n_ssm"), &ConfigNode::Number(Number::Int(128)));
        assert!(tree.is_resolved());
    }

    #[test]
    fn test_chained_and_forward_references() {
        let mut tree = doc("a: ${b}\nb: ${c}\nc: 7\n");
        let stats = resolve_references(&mut tree).unwrap();
        assert_eq!(tree, doc("a: 7\nb: 7\nc: 7\n"));
        assert_eq!(stats.substitutions, 2);
        assert!(stats.passes >= 2);
    }

    #[test]
    fn test_mapping_reference_copies_subtree() {
        let mut tree = doc("base:\n  lr: 0.1\n  d: ${.lr}\ncopy: ${base}\n");
        resolve_references(&mut tree).unwrap();
        assert_eq!(at(&tree, "copy"), &doc("lr: 0.1\nd: 0.1\n"));
    }

    #[test]
    fn test_string_interpolation() {
        let mut tree = doc("train:\n  seed: 2222\nname: s4-${train.seed}-${model}\nmodel: listops\n");
        resolve_references(&mut tree).unwrap();
        assert_eq!(at(&tree, "name").as_str(), Some("s4-2222-listops"));
    }

    #[test]
    fn test_cycle_fails() {
        let mut tree = doc("a: ${b}\nb: ${a}\n");
        let err = resolve_references(&mut tree).unwrap_err();
        match err {
            ConfigError::UnresolvedReference { location, token, reason } => {
                assert_eq!(location, "a");
                assert_eq!(token, "${b}");
                assert!(reason.contains("cycle"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_self_containing_reference_fails() {
        let mut tree = doc("model:\n  inner: ${model}\n");
        assert!(matches!(
            resolve_references(&mut tree),
            Err(ConfigError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_missing_target_fails() {
        let mut tree = doc("model:\n  n_ssm: ${..d_modle}\n");
        let err = resolve_references(&mut tree).unwrap_err();
        assert!(err.to_string().contains("`d_modle` does not exist"), "{}", err);
    }

    #[test]
    fn test_climbing_past_root_fails() {
        let mut tree = doc("n_ssm: ${...d_model}\n");
        let err = resolve_references(&mut tree).unwrap_err();
        assert!(err.to_string().contains("climbs above the root"), "{}", err);
    }

    #[test]
    fn test_embedding_a_mapping_fails() {
        let mut tree = doc("model:\n  d: 1\nname: run-${model}\n");
        let err = resolve_references(&mut tree).unwrap_err();
        assert!(err.to_string().contains("cannot be embedded"), "{}", err);
    }

    fn resolved_tree() -> impl Strategy<Value = ConfigNode> {
        let leaf = prop_oneof![
            Just(ConfigNode::Null),
            any::<bool>().prop_map(ConfigNode::Bool),
            any::<i64>().prop_map(ConfigNode::from),
            "[a-z]{0,8}".prop_map(ConfigNode::String),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|map: Mapping| ConfigNode::Mapping(map))
        })
    }

    proptest! {
        #[test]
        fn prop_resolving_a_resolved_tree_is_a_no_op(tree in resolved_tree()) {
            let mut resolved = tree.clone();
            let stats = resolve_references(&mut resolved).unwrap();
            prop_assert_eq!(stats, ResolveStats::default());
            prop_assert_eq!(resolved, tree);
        }
    }
}
