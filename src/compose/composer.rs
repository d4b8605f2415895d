//! Composition orchestration.

use std::sync::Arc;

use crate::compose::defaults::{parent_dir, DefaultsEntry, Fragment, MergeMode, OverlayReference, PackageHeader};
use crate::compose::merger::{apply_overlay, slot_mut, Overlay};
use crate::compose::overrides::Override;
use crate::compose::resolved::ResolvedConfig;
use crate::compose::resolver::resolve_references;
use crate::error::ConfigError;
use crate::source::{FragmentSource, SearchPath};
use crate::tree::{ConfigNode, KeyPath};

/// Builds a [`ResolvedConfig`] from a named root fragment.
///
/// The fragment source is fixed at construction; the composer holds no other
/// state, so one instance can serve any number of compositions.
#[derive(Debug, Clone)]
pub struct Composer {
    source: Arc<dyn FragmentSource>,
}

impl Composer {
    pub fn new<S: FragmentSource + 'static>(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Composer over files below `roots`, searched in order.
    pub fn with_search_path<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<std::path::PathBuf>,
    {
        Self::new(SearchPath::new(roots))
    }

    pub fn source(&self) -> &dyn FragmentSource {
        self.source.as_ref()
    }

    /// Compose the root fragment `name` (`experiment/lra/s4-listops`).
    ///
    /// Defaults are merged in list order, each fragment's own keys after its
    /// defaults, then command-line overrides, then references are resolved.
    /// Any failure aborts the whole composition.
    pub fn compose(&self, name: &str, overrides: &[Override]) -> Result<ResolvedConfig, ConfigError> {
        let mut composition = Composition::new(self.source.as_ref(), overrides);

        let root = composition.load(name)?.ok_or_else(|| ConfigError::MissingDefaultsFile {
            name: name.to_string(),
            searched: self.source.describe(),
        })?;
        let package = match &root.header {
            Some(PackageHeader::Path(path)) => path.clone(),
            _ => KeyPath::root(),
        };
        composition.expand(root, package, None)?;
        composition.apply_value_overrides()?;

        let Composition { mut tree, loaded, .. } = composition;
        let stats = resolve_references(&mut tree)?;

        tracing::info!(
            config = name,
            fragments = loaded.len(),
            overrides = overrides.len(),
            passes = stats.passes,
            substitutions = stats.substitutions,
            "Configuration composed"
        );
        Ok(ResolvedConfig::freeze(tree, loaded))
    }
}

/// State of one `compose` call.
struct Composition<'a> {
    source: &'a dyn FragmentSource,
    overrides: &'a [Override],
    /// Overrides consumed as group selections.
    selections: Vec<bool>,
    /// Fragments currently being expanded, outermost first.
    stack: Vec<String>,
    loaded: Vec<String>,
    tree: ConfigNode,
}

impl<'a> Composition<'a> {
    fn new(source: &'a dyn FragmentSource, overrides: &'a [Override]) -> Self {
        Self {
            source,
            overrides,
            selections: vec![false; overrides.len()],
            stack: Vec::new(),
            loaded: Vec::new(),
            tree: ConfigNode::empty_mapping(),
        }
    }

    fn load(&mut self, name: &str) -> Result<Option<Fragment>, ConfigError> {
        let Some(text) = self.source.read(name)? else {
            return Ok(None);
        };
        let fragment = Fragment::parse(name, &text)?;
        tracing::debug!(
            fragment = name,
            defaults = fragment.defaults.len(),
            "Fragment loaded"
        );
        self.loaded.push(name.to_string());
        Ok(Some(fragment))
    }

    /// Apply a fragment's defaults, then its own keys, at `package`.
    /// `cleared` is emptied first when the fragment replaces a group.
    fn expand(
        &mut self,
        fragment: Fragment,
        package: KeyPath,
        cleared: Option<KeyPath>,
    ) -> Result<(), ConfigError> {
        if let Some(slot) = cleared {
            *slot_mut(&mut self.tree, &slot, &fragment.name)? = ConfigNode::empty_mapping();
        }

        self.stack.push(fragment.name.clone());
        let dir = fragment.dir().to_string();
        for entry in &fragment.defaults {
            match entry {
                DefaultsEntry::SelfMarker => {}
                DefaultsEntry::Overlay(reference) => self.include(reference, &dir, &package)?,
            }
        }
        self.stack.pop();

        apply_overlay(
            &mut self.tree,
            Overlay::new(fragment.name, package, MergeMode::Merge, fragment.body),
        )
    }

    fn include(
        &mut self,
        reference: &OverlayReference,
        dir: &str,
        parent_package: &KeyPath,
    ) -> Result<(), ConfigError> {
        let group = reference.absolute_group(dir);
        let Some(option) = self.selected_option(reference, &group) else {
            tracing::debug!(entry = %reference, "Defaults entry disabled");
            return Ok(());
        };

        let name = reference.fragment_name(dir, &option);
        if self.stack.contains(&name) {
            let mut chain = self.stack.clone();
            chain.push(name);
            return Err(ConfigError::DefaultsCycle { chain });
        }

        let fragment = match self.load(&name)? {
            Some(fragment) => fragment,
            None if reference.optional => {
                tracing::debug!(fragment = %name, "Optional fragment not found, skipping");
                return Ok(());
            }
            None => {
                return Err(ConfigError::MissingDefaultsFile {
                    name,
                    searched: self.source.describe(),
                })
            }
        };

        let package = package_for(reference, &fragment, &group, parent_package);
        let cleared = match reference.mode {
            MergeMode::Replace => replaced_slot(reference, &group, &package),
            MergeMode::Merge => None,
        };
        self.expand(fragment, package, cleared)
    }

    /// Option for a defaults entry, after command-line selections.
    fn selected_option(&mut self, reference: &OverlayReference, group: &str) -> Option<String> {
        if !reference.is_bare() {
            let selected = self
                .overrides
                .iter()
                .enumerate()
                .rev()
                .find(|(_, o)| o.selects(group));
            if let Some((index, selection)) = selected {
                self.selections[index] = true;
                return selection.option().map(str::to_string);
            }
        }
        reference.option.clone()
    }

    fn apply_value_overrides(&mut self) -> Result<(), ConfigError> {
        for (o, consumed) in self.overrides.iter().zip(&self.selections) {
            if *consumed {
                continue;
            }
            let overlay = Overlay::new(format!("override {}", o), o.path()?, MergeMode::Replace, o.node()?);
            apply_overlay(&mut self.tree, overlay)?;
        }
        Ok(())
    }
}

/// Slot an `override` entry empties before its fragment lands: the entry's
/// `@package`, else its group path. The root is never cleared, so a
/// `_global_` fragment selected through `override` only resets its group.
fn replaced_slot(reference: &OverlayReference, group: &str, package: &KeyPath) -> Option<KeyPath> {
    let slot = match &reference.package {
        Some(explicit) => explicit.clone(),
        None if reference.is_bare() => package.clone(),
        None => KeyPath::from_group(group),
    };
    (!slot.is_root()).then_some(slot)
}

/// Where a fragment's keys land: an explicit `@package` on the entry wins,
/// then the fragment's `# @package` header, then the group path. Bare entries
/// default to the including fragment's package.
fn package_for(
    reference: &OverlayReference,
    fragment: &Fragment,
    group: &str,
    parent_package: &KeyPath,
) -> KeyPath {
    if let Some(package) = &reference.package {
        return package.clone();
    }

    let own_group = if reference.is_bare() {
        parent_dir(&fragment.name)
    } else {
        group
    };
    match &fragment.header {
        Some(PackageHeader::Global) => KeyPath::root(),
        Some(PackageHeader::Group) => KeyPath::from_group(own_group),
        Some(PackageHeader::Path(path)) => path.clone(),
        None if reference.is_bare() => parent_package.clone(),
        None => KeyPath::from_group(group),
    }
}
