//! Configuration-to-instance factory.
//!
//! Builds component subtrees from declarative configuration, bottom-up.
//! Structural violations are detected eagerly here, logged to the
//! instantiation context's error log, and fail construction fast; the
//! navigation operations never re-check them at event time.

use std::collections::HashSet;

use tracing::debug;

use crate::model::component::{
    Component, ComponentId, ComponentKind, ContextState, GroupState, InlinedState, RootState,
};
use crate::model::config::{ComponentConfig, LayoutConfig, LayoutKey};
use crate::model::tree::TileTree;
use crate::nav::{group, root};

/// Error type for layout configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("component name must not be empty")]
    EmptyName,
    #[error("duplicate component name `{0}` in layout")]
    DuplicateName(String),
    #[error("selector `{selector}` of context `{context}` is not selectable")]
    SelectorNotSelectable { context: String, selector: String },
    #[error("group `{group}` declares unknown default child `{child}`")]
    UnknownDefaultChild { group: String, child: String },
}

/// Error log for one instantiation run.
///
/// Configuration errors are accumulated here so a caller can report every
/// problem of a stored layout at once, not just the first.
#[derive(Debug, Default)]
pub struct InstantiationContext {
    errors: Vec<ConfigError>,
}

impl InstantiationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, error: ConfigError) {
        debug!(%error, "configuration error");
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Validate a component configuration tree, logging every problem found.
/// Returns the first new error so construction can fail fast.
pub fn validate(
    ctx: &mut InstantiationContext,
    config: &ComponentConfig,
) -> Result<(), ConfigError> {
    let before = ctx.errors.len();

    let mut names = Vec::new();
    config.collect_names(&mut names);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();
    for name in names {
        if name.is_empty() {
            if reported.insert("") {
                ctx.error(ConfigError::EmptyName);
            }
            continue;
        }
        if !seen.insert(name) && reported.insert(name) {
            ctx.error(ConfigError::DuplicateName(name.to_string()));
        }
    }

    validate_node(ctx, config);

    match ctx.errors.get(before) {
        Some(error) => Err(error.clone()),
        None => Ok(()),
    }
}

fn validate_node(ctx: &mut InstantiationContext, config: &ComponentConfig) {
    match config {
        ComponentConfig::Group(cfg) => {
            if let Some(default) = &cfg.default_selected
                && !cfg.children.iter().any(|c| c.name() == default)
            {
                ctx.error(ConfigError::UnknownDefaultChild {
                    group: cfg.name.clone(),
                    child: default.clone(),
                });
            }
            for child in &cfg.children {
                validate_node(ctx, child);
            }
        }
        ComponentConfig::Context(cfg) => {
            if !matches!(*cfg.selector, ComponentConfig::Inlined(_)) {
                ctx.error(ConfigError::SelectorNotSelectable {
                    context: cfg.name.clone(),
                    selector: cfg.selector.name().to_string(),
                });
            }
            validate_node(ctx, &cfg.selector);
            validate_node(ctx, &cfg.content);
        }
        ComponentConfig::Inlined(_) | ComponentConfig::View(_) => {}
    }
}

/// Build a detached component subtree from configuration.
pub fn instantiate(
    tree: &mut TileTree,
    ctx: &mut InstantiationContext,
    config: &ComponentConfig,
) -> Result<ComponentId, ConfigError> {
    validate(ctx, config)?;
    Ok(build(tree, config))
}

fn build(tree: &mut TileTree, config: &ComponentConfig) -> ComponentId {
    match config {
        ComponentConfig::Group(cfg) => {
            let children: Vec<ComponentId> = cfg.children.iter().map(|c| build(tree, c)).collect();
            let id = tree.insert(Component::new(
                &cfg.name,
                ComponentKind::Group(GroupState {
                    children: children.clone(),
                    selected: None,
                }),
            ));
            for child in children {
                tree.set_parent(child, Some(id));
            }
            id
        }
        ComponentConfig::Context(cfg) => {
            let selector = build(tree, &cfg.selector);
            let content = build(tree, &cfg.content);
            let id = tree.insert(Component::new(
                &cfg.name,
                ComponentKind::Context(ContextState {
                    selector,
                    content,
                    content_displayed: cfg.content_displayed,
                }),
            ));
            tree.set_parent(selector, Some(id));
            tree.set_parent(content, Some(id));
            id
        }
        ComponentConfig::Inlined(cfg) => tree.insert(Component::new(
            &cfg.name,
            ComponentKind::Inlined(InlinedState {
                selection: None,
                collection: cfg.collection.clone(),
            }),
        )),
        ComponentConfig::View(cfg) => {
            tree.insert(Component::new(&cfg.name, ComponentKind::View))
        }
    }
}

/// Instantiate a stored layout and bind it as the top-level component for
/// its layout key, replacing whatever occupied the key before.
///
/// Initializes visibility and the displayed path, then applies configured
/// default selections.
pub fn mount_layout(
    tree: &mut TileTree,
    ctx: &mut InstantiationContext,
    key: &LayoutKey,
    config: &LayoutConfig,
) -> Result<ComponentId, ConfigError> {
    let child = instantiate(tree, ctx, &config.root)?;
    let title = config
        .title
        .clone()
        .unwrap_or_else(|| key.as_str().to_string());
    let root_id = tree.insert(Component::new(title, ComponentKind::Root(RootState::default())));
    if let Some(previous) = tree.mount(key.clone(), root_id) {
        tree.set_visible(previous, false);
        tree.remove_subtree(previous);
    }
    tree.set_visible(root_id, true);
    root::set_root_child(tree, root_id, child);
    apply_defaults(tree, child, &config.root);
    debug!(key = %key, "layout mounted");
    Ok(root_id)
}

/// Apply configured default selections, deepest first, so that selecting
/// an outer branch descends into the inner chain in one step.
fn apply_defaults(tree: &mut TileTree, id: ComponentId, config: &ComponentConfig) {
    match config {
        ComponentConfig::Group(cfg) => {
            let child_ids = tree.children(id);
            for (&child_id, child_cfg) in child_ids.iter().zip(&cfg.children) {
                apply_defaults(tree, child_id, child_cfg);
            }
            if let Some(default) = &cfg.default_selected
                && let Some(&target) = child_ids
                    .iter()
                    .find(|&&c| tree.name(c) == Some(default.as_str()))
            {
                let _ = group::set_selected(tree, id, Some(target));
            }
        }
        ComponentConfig::Context(cfg) => {
            let Some(state) = tree.get(id).and_then(|c| c.as_context()) else {
                return;
            };
            let (selector, content) = (state.selector(), state.content());
            apply_defaults(tree, selector, &cfg.selector);
            apply_defaults(tree, content, &cfg.content);
        }
        ComponentConfig::Inlined(_) | ComponentConfig::View(_) => {}
    }
}
