//! Overlay merging.
//!
//! # Design Decisions
//! - Merge is a recursive key-wise union; the overlay wins on collisions
//! - Sequences and scalars are replaced whole, never combined
//! - Replace discards the base subtree at the target outright
//! - Missing mappings along a target path are created on the way

use crate::compose::defaults::MergeMode;
use crate::error::ConfigError;
use crate::tree::{ConfigNode, KeyPath};

/// A subtree headed for a slot of the base tree.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub target: KeyPath,
    pub mode: MergeMode,
    pub node: ConfigNode,
    /// Where the overlay came from, for error messages.
    pub origin: String,
}

impl Overlay {
    pub fn new(origin: impl Into<String>, target: KeyPath, mode: MergeMode, node: ConfigNode) -> Self {
        Self {
            target,
            mode,
            node,
            origin: origin.into(),
        }
    }
}

/// Merge `overlay` into `base` in place.
pub fn merge_into(base: &mut ConfigNode, overlay: ConfigNode) {
    match (base, overlay) {
        (ConfigNode::Mapping(base_map), ConfigNode::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply one overlay to `base`.
pub fn apply_overlay(base: &mut ConfigNode, overlay: Overlay) -> Result<(), ConfigError> {
    let slot = slot_mut(base, &overlay.target, &overlay.origin)?;
    match overlay.mode {
        MergeMode::Merge => merge_into(slot, overlay.node),
        MergeMode::Replace => *slot = overlay.node,
    }

    tracing::trace!(
        origin = %overlay.origin,
        target = %overlay.target,
        mode = ?overlay.mode,
        "Overlay applied"
    );
    Ok(())
}

/// Apply overlays in order; later overlays take precedence.
pub fn apply_all<I>(base: &mut ConfigNode, overlays: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = Overlay>,
{
    for overlay in overlays {
        apply_overlay(base, overlay)?;
    }
    Ok(())
}

/// The node at `target`, creating mappings along the way. A `null` on the
/// path becomes an empty mapping; any other non-mapping blocks the path.
pub fn slot_mut<'a>(
    root: &'a mut ConfigNode,
    target: &KeyPath,
    origin: &str,
) -> Result<&'a mut ConfigNode, ConfigError> {
    let mut node = root;
    for (depth, key) in target.iter().enumerate() {
        if matches!(node, ConfigNode::Null) {
            *node = ConfigNode::empty_mapping();
        }
        node = match node {
            ConfigNode::Mapping(map) => map.entry(key.to_string()).or_insert(ConfigNode::Null),
            blocked => {
                return Err(ConfigError::UnknownOverlayTarget {
                    entry: origin.to_string(),
                    reason: format!(
                        "target `{}` runs through `{}`, which is a {}",
                        target,
                        target.prefix(depth),
                        blocked.kind()
                    ),
                })
            }
        };
    }
    Ok(node)
}
