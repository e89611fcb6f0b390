//! Layout editor operations.
//!
//! Add, delete, and edit components of a mounted layout. Each operation
//! applies the change to the live component tree and persists the updated
//! configuration through the layout store. The store write happens last:
//! when a commit fails, the in-memory tree keeps the change and the error
//! is surfaced to the calling command layer (which owns transactions and
//! user-visible failure).

use tracing::info;

use crate::io::store::{LayoutStore, StoreError};
use crate::model::component::{ComponentId, ComponentKind};
use crate::model::config::{ComponentConfig, LayoutConfig, LayoutKey};
use crate::model::tree::TileTree;
use crate::nav::context::ContextError;
use crate::nav::group::GroupError;
use crate::nav::{context, group, root};
use crate::ops::instantiate::{self, ConfigError, InstantiationContext};

/// Error type for editor operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("no layout stored for key `{0}`")]
    UnknownLayout(LayoutKey),
    #[error("layout `{0}` is not mounted")]
    NotMounted(LayoutKey),
    #[error("no component named `{0}` in layout")]
    UnknownComponent(String),
    #[error("component `{0}` is not a group container")]
    NotAContainer(String),
    #[error("a component named `{0}` already exists in the layout")]
    DuplicateName(String),
    #[error("component `{0}` cannot be removed from its container")]
    NotRemovable(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Resolve a stored layout and mount it as the top-level component for
/// its key.
pub fn mount_stored_layout(
    tree: &mut TileTree,
    store: &dyn LayoutStore,
    ctx: &mut InstantiationContext,
    key: &LayoutKey,
) -> Result<ComponentId, EditError> {
    let config = store
        .resolve(key)
        .ok_or_else(|| EditError::UnknownLayout(key.clone()))?;
    Ok(instantiate::mount_layout(tree, ctx, key, &config)?)
}

/// Add a component to a group of a mounted layout.
pub fn add_component(
    tree: &mut TileTree,
    store: &mut dyn LayoutStore,
    ctx: &mut InstantiationContext,
    key: &LayoutKey,
    container: &str,
    child: ComponentConfig,
) -> Result<ComponentId, EditError> {
    let layout_child = mounted_child(tree, key)?;
    let mut config = store
        .resolve(key)
        .ok_or_else(|| EditError::UnknownLayout(key.clone()))?;

    // Names stay unique within the layout.
    let mut existing = Vec::new();
    config.root.collect_names(&mut existing);
    let mut incoming = Vec::new();
    child.collect_names(&mut incoming);
    for name in &incoming {
        if existing.contains(name) {
            return Err(EditError::DuplicateName(name.to_string()));
        }
    }

    let group_id = tree
        .find_descendant(layout_child, container)
        .ok_or_else(|| EditError::UnknownComponent(container.to_string()))?;
    if tree.get(group_id).and_then(|c| c.as_group()).is_none() {
        return Err(EditError::NotAContainer(container.to_string()));
    }

    let child_id = instantiate::instantiate(tree, ctx, &child)?;
    group::add_child(tree, group_id, child_id)?;

    match config.root.find_mut(container) {
        Some(ComponentConfig::Group(group_cfg)) => group_cfg.children.push(child),
        _ => return Err(EditError::NotAContainer(container.to_string())),
    }
    store.replace(key, config)?;
    info!(key = %key, container, "component added");
    Ok(child_id)
}

/// Delete a component from a mounted layout.
///
/// A displayed component truncates the layout's displayed path on removal;
/// the subtree is dropped from the tree and from the stored configuration.
pub fn delete_component(
    tree: &mut TileTree,
    store: &mut dyn LayoutStore,
    key: &LayoutKey,
    name: &str,
) -> Result<(), EditError> {
    let layout_child = mounted_child(tree, key)?;
    let mut config = store
        .resolve(key)
        .ok_or_else(|| EditError::UnknownLayout(key.clone()))?;

    let target = tree
        .find_descendant(layout_child, name)
        .ok_or_else(|| EditError::UnknownComponent(name.to_string()))?;
    let parent = tree
        .parent(target)
        .ok_or_else(|| EditError::NotRemovable(name.to_string()))?;
    if tree.get(parent).and_then(|c| c.as_group()).is_none() {
        // Only group members can be deleted; context slots and the layout
        // child are edited, not removed.
        return Err(EditError::NotRemovable(name.to_string()));
    }

    group::remove_child(tree, parent, target)?;
    tree.remove_subtree(target);

    config
        .root
        .remove_from_group(name)
        .ok_or_else(|| EditError::UnknownComponent(name.to_string()))?;
    store.replace(key, config)?;
    info!(key = %key, name, "component deleted");
    Ok(())
}

/// Replace a component of a mounted layout with a new configuration.
pub fn edit_component(
    tree: &mut TileTree,
    store: &mut dyn LayoutStore,
    ctx: &mut InstantiationContext,
    key: &LayoutKey,
    name: &str,
    new_config: ComponentConfig,
) -> Result<ComponentId, EditError> {
    let root_id = tree
        .mount_of(key)
        .ok_or_else(|| EditError::NotMounted(key.clone()))?;
    let layout_child = mounted_child(tree, key)?;
    let mut config = store
        .resolve(key)
        .ok_or_else(|| EditError::UnknownLayout(key.clone()))?;

    let target = tree
        .find_descendant(layout_child, name)
        .ok_or_else(|| EditError::UnknownComponent(name.to_string()))?;

    // Names of the replacement may reuse names of the replaced subtree but
    // must not collide with the rest of the layout.
    let mut replaced = Vec::new();
    config
        .root
        .find(name)
        .ok_or_else(|| EditError::UnknownComponent(name.to_string()))?
        .collect_names(&mut replaced);
    let mut existing = Vec::new();
    config.root.collect_names(&mut existing);
    let mut incoming = Vec::new();
    new_config.collect_names(&mut incoming);
    for n in &incoming {
        if existing.contains(n) && !replaced.contains(n) {
            return Err(EditError::DuplicateName(n.to_string()));
        }
    }

    enum Slot {
        RootChild,
        GroupChild(ComponentId),
        ContextSelector(ComponentId),
        ContextContent(ComponentId),
    }
    let slot = match tree
        .parent(target)
        .map(|p| (p, tree.get(p).map(|c| &c.kind)))
    {
        Some((_, Some(ComponentKind::Root(_)))) => Slot::RootChild,
        Some((parent, Some(ComponentKind::Group(_)))) => Slot::GroupChild(parent),
        Some((parent, Some(ComponentKind::Context(state)))) => {
            if state.selector() == target {
                Slot::ContextSelector(parent)
            } else {
                Slot::ContextContent(parent)
            }
        }
        _ => return Err(EditError::NotRemovable(name.to_string())),
    };

    let new_id = instantiate::instantiate(tree, ctx, &new_config)?;
    match slot {
        Slot::RootChild => root::set_root_child(tree, root_id, new_id),
        Slot::GroupChild(parent) => group::replace_child(tree, parent, target, new_id)?,
        Slot::ContextSelector(parent) => {
            context::set_selector(tree, parent, new_id)?;
        }
        Slot::ContextContent(parent) => {
            context::set_content(tree, parent, new_id)?;
        }
    }
    tree.remove_subtree(target);

    if config.root.name() == name {
        config.root = new_config;
    } else {
        config
            .root
            .replace(name, new_config)
            .ok_or_else(|| EditError::UnknownComponent(name.to_string()))?;
    }
    store.replace(key, config)?;
    info!(key = %key, name, "component replaced");
    Ok(new_id)
}

/// Drop the stored configuration for a key and fall back to a default.
///
/// With a default configuration the layout is remounted from it; without
/// one the layout is unmounted entirely. Returns the released
/// configuration.
pub fn release_layout(
    tree: &mut TileTree,
    store: &mut dyn LayoutStore,
    ctx: &mut InstantiationContext,
    key: &LayoutKey,
    default: Option<&LayoutConfig>,
) -> Result<Option<LayoutConfig>, EditError> {
    let released = store.release(key)?;
    match default {
        Some(config) => {
            instantiate::mount_layout(tree, ctx, key, config)?;
        }
        None => {
            if let Some(root_id) = tree.unmount(key) {
                tree.set_visible(root_id, false);
                tree.remove_subtree(root_id);
            }
        }
    }
    info!(key = %key, remounted = default.is_some(), "layout released");
    Ok(released)
}

fn mounted_child(tree: &TileTree, key: &LayoutKey) -> Result<ComponentId, EditError> {
    let root_id = tree
        .mount_of(key)
        .ok_or_else(|| EditError::NotMounted(key.clone()))?;
    tree.get(root_id)
        .and_then(|c| c.as_root())
        .and_then(|state| state.child())
        .ok_or_else(|| EditError::NotMounted(key.clone()))
}
