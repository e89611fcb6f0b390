//! Displayed-path coordination.
//!
//! A root coordinator owns the ordered list of components that are visible
//! along the current navigation path. Selection changes anywhere in its
//! subtree are routed here; the coordinator locates the sender's position
//! in the path, truncates or extends the suffix that changed, and fires a
//! single path notification carrying the old and the new path.

use tracing::{debug, trace};

use crate::model::component::{ComponentId, ComponentKind, RootState};
use crate::model::tree::TileTree;
use crate::nav::event::TileEvent;
use crate::nav::{context, group, inlined};

/// Error type for explicit path navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("component is not part of the displayed path")]
    NotOnDisplayedPath,
}

/// Tile path to the currently displayed component.
///
/// The first element is the root coordinator's child, the last is the
/// component actually on screen. Empty when nothing is mounted.
pub fn displayed_path(tree: &TileTree, root: ComponentId) -> &[ComponentId] {
    match tree.get(root).map(|c| &c.kind) {
        Some(ComponentKind::Root(state)) => &state.displayed_path,
        _ => &[],
    }
}

/// The component currently on screen: the last path element.
pub fn displayed_component(tree: &TileTree, root: ComponentId) -> Option<ComponentId> {
    displayed_path(tree, root).last().copied()
}

/// The root coordinator in which a component is displayed, walking up to
/// the nearest path-tagged ancestor. `None` when the component is not part
/// of any displayed tile path.
pub fn root_tile(tree: &TileTree, component: ComponentId) -> Option<ComponentId> {
    let member = tree.displayed_ancestor(component)?;
    tree.get(member)?.root_tile()
}

/// Tile roots render inline in the host page; they never form the outer
/// frameset. Query point for external command predicates.
pub fn is_outer_frameset(_tree: &TileTree, _root: ComponentId) -> bool {
    false
}

/// Collapse the displayed path back to `component`.
///
/// No-op when `component` already is the last path element. Everything
/// beyond it is deselected and removed from the path, and one path
/// notification fires.
pub fn display_tile_layout(
    tree: &mut TileTree,
    root: ComponentId,
    component: ComponentId,
) -> Result<(), PathError> {
    let path = path_of(tree, root);
    let Some(index) = path.iter().position(|&c| c == component) else {
        return Err(PathError::NotOnDisplayedPath);
    };
    if index == path.len() - 1 {
        // Already the displayed component.
        return Ok(());
    }
    tree.begin_update();
    clear_path_from(tree, root, true, index + 1);
    fire_path_changed(tree, root, path);
    tree.end_update();
    Ok(())
}

/// Replace the root coordinator's child subtree and rebuild the path from
/// scratch, descending into whatever selection chain the new child holds.
pub fn set_root_child(tree: &mut TileTree, root: ComponentId, child: ComponentId) {
    tree.begin_update();
    let old_child = root_state(tree, root).and_then(RootState::child);
    if let Some(old) = old_child
        && old != child
    {
        tree.set_parent(old, None);
    }
    if let Some(state) = root_state_mut(tree, root) {
        state.child = Some(child);
    }
    tree.set_parent(child, Some(root));

    let old_path = path_of(tree, root);
    clear_path_from(tree, root, false, 0);
    tree.propagate_visibility(root);
    add_recursively(tree, root, child);
    fire_path_changed(tree, root, old_path);
    tree.end_update();
}

// ---------------------------------------------------------------------------
// Coordinator reactions
// ---------------------------------------------------------------------------

/// Reaction to a group switching its selected child.
///
/// Appending a group child descends recursively into that child's own
/// selection chain (groups auto-descend, contexts with displayed content
/// auto-open) until a leaf or an unselected junction is reached.
pub(crate) fn handle_group_selection_changed(
    tree: &mut TileTree,
    group: ComponentId,
    new_selected: Option<ComponentId>,
) {
    if tree.suppress_reactions {
        return;
    }
    if !tree.get(group).is_some_and(|c| c.is_visible()) {
        // Selection of an invisible component has changed. Ignore.
        return;
    }
    let Some((root, index, path)) = locate(tree, group) else {
        return;
    };
    if index == path.len() - 1 {
        if let Some(selected) = new_selected {
            extend_path(tree, root, path, selected);
        }
    } else {
        let next = index + 1;
        match new_selected {
            Some(selected) if path[next] == selected => {
                // Actually no change.
            }
            Some(selected) => {
                clear_path_from(tree, root, false, next);
                extend_path(tree, root, path, selected);
            }
            None => {
                clear_path_from(tree, root, true, next);
                fire_path_changed(tree, root, path);
            }
        }
    }
}

/// Reaction to a context flipping between selector and content display.
pub(crate) fn handle_content_displayed_changed(
    tree: &mut TileTree,
    context: ComponentId,
    displayed: bool,
) {
    if tree.suppress_reactions {
        return;
    }
    if !tree.get(context).is_some_and(|c| c.is_visible()) {
        // Display detail of an invisible component has changed. Ignore.
        return;
    }
    let Some((root, index, path)) = locate(tree, context) else {
        return;
    };
    let Some(content) = tree.get(context).and_then(|c| c.as_context()).map(|c| c.content()) else {
        return;
    };
    if index == path.len() - 1 {
        if displayed {
            extend_path(tree, root, path, content);
        }
    } else {
        let next = index + 1;
        if displayed {
            if path[next] == content {
                // Actually no change.
                return;
            }
            clear_path_from(tree, root, false, next);
            extend_path(tree, root, path, content);
        } else {
            clear_path_from(tree, root, true, next);
            fire_path_changed(tree, root, path);
        }
    }
}

/// Reaction to a context's content component being replaced while the
/// content is on the displayed path.
pub(crate) fn handle_content_component_changed(
    tree: &mut TileTree,
    context: ComponentId,
    new_content: ComponentId,
) {
    if tree.suppress_reactions {
        return;
    }
    if !tree.get(context).is_some_and(|c| c.is_visible()) {
        // Invisible content component has changed. Ignore.
        return;
    }
    let Some((root, index, path)) = locate(tree, context) else {
        return;
    };
    if index == path.len() - 1 {
        // Selector is currently displayed. Ignore the content swap.
        return;
    }
    clear_path_from(tree, root, false, index + 1);
    extend_path(tree, root, path, new_content);
}

/// Reaction to an inlined tile selecting or deselecting an object: toggle
/// the enclosing group's selection to the tile's container child.
pub(crate) fn handle_inlined_selection_changed(
    tree: &mut TileTree,
    component: ComponentId,
    selected: bool,
) {
    if tree.suppress_reactions {
        return;
    }
    let Some((enclosing_group, child)) = group_ancestor_child(tree, component) else {
        // Not part of a group; nothing to drive.
        return;
    };
    let target = if selected { Some(child) } else { None };
    if let Err(err) = group::set_selected(tree, enclosing_group, target) {
        debug!(?component, %err, "inlined selection could not drive group");
    }
}

/// Reaction to a container's child list changing: truncate the displayed
/// path at the first member that was detached from the layout tree.
pub(crate) fn handle_children_changed(tree: &mut TileTree, container: ComponentId) {
    if tree.suppress_reactions {
        return;
    }
    let Some(root) = tree.nearest_root_ancestor(container) else {
        return;
    };
    refresh_after_structure_change(tree, root);
}

/// Truncate the displayed path at the first member whose owning-tree link
/// has been severed. Deselects the old selection at the truncation
/// boundary to permit later re-selection. No-op when every path member is
/// still attached.
pub fn refresh_after_structure_change(tree: &mut TileTree, root: ComponentId) {
    let path = path_of(tree, root);
    let Some(first_removed) = path.iter().position(|&c| !tree.is_attached(c)) else {
        // Removal of components does not affect this tile root.
        return;
    };
    trace!(?root, first_removed, "displayed component removed from layout tree");
    tree.begin_update();
    clear_path_from(tree, root, true, first_removed);
    fire_path_changed(tree, root, path);
    tree.end_update();
}

// ---------------------------------------------------------------------------
// Path bookkeeping
// ---------------------------------------------------------------------------

fn root_state(tree: &TileTree, root: ComponentId) -> Option<&RootState> {
    tree.get(root)?.as_root()
}

fn root_state_mut(tree: &mut TileTree, root: ComponentId) -> Option<&mut RootState> {
    match &mut tree.get_mut(root)?.kind {
        ComponentKind::Root(state) => Some(state),
        _ => None,
    }
}

fn path_of(tree: &TileTree, root: ComponentId) -> Vec<ComponentId> {
    displayed_path(tree, root).to_vec()
}

/// Locate the path entry containing `sender`: (owning root, index, path).
fn locate(tree: &TileTree, sender: ComponentId) -> Option<(ComponentId, usize, Vec<ComponentId>)> {
    let member = tree.displayed_ancestor(sender)?;
    let root = tree.get(member)?.root_tile()?;
    let path = path_of(tree, root);
    let index = path.iter().position(|&c| c == member)?;
    Some((root, index, path))
}

/// Append `component` and descend its inner selection chain, then fire.
fn extend_path(tree: &mut TileTree, root: ComponentId, old_path: Vec<ComponentId>, component: ComponentId) {
    add_recursively(tree, root, component);
    fire_path_changed(tree, root, old_path);
}

fn add_recursively(tree: &mut TileTree, root: ComponentId, component: ComponentId) {
    push_path(tree, root, component);
    let next = match tree.get(component).map(|c| &c.kind) {
        Some(ComponentKind::Group(state)) => state.displayed_descendant(),
        Some(ComponentKind::Context(state)) if state.is_content_displayed() => {
            Some(state.content())
        }
        _ => None,
    };
    if let Some(next) = next {
        add_recursively(tree, root, next);
    }
}

fn push_path(tree: &mut TileTree, root: ComponentId, component: ComponentId) {
    if let Some(state) = root_state_mut(tree, root) {
        state.displayed_path.push(component);
    }
    if let Some(c) = tree.get_mut(component) {
        c.root_tile = Some(root);
    }
}

/// Remove `path[first_removed..]`, clearing the owning-root tags.
///
/// With `deselect_displayed` the element at the truncation boundary is
/// deselected as well, so the removed branch can be re-selected later.
fn clear_path_from(
    tree: &mut TileTree,
    root: ComponentId,
    deselect_displayed: bool,
    first_removed: usize,
) {
    let from = if deselect_displayed {
        first_removed.saturating_sub(1)
    } else {
        first_removed
    };
    deselect_tail(tree, root, from);

    let removed: Vec<ComponentId> = match root_state_mut(tree, root) {
        Some(state) if first_removed <= state.displayed_path.len() => {
            state.displayed_path.drain(first_removed..).collect()
        }
        _ => Vec::new(),
    };
    for id in removed {
        if let Some(component) = tree.get_mut(id) {
            component.root_tile = None;
        }
    }
}

/// Clear every selection held under `path[from..]`, tail first.
///
/// Runs with coordinator reactions suppressed: the caller is already
/// rewriting the path, and exactly one notification must fire for the
/// whole operation.
fn deselect_tail(tree: &mut TileTree, root: ComponentId, from: usize) {
    let path = path_of(tree, root);
    if from >= path.len() {
        return;
    }
    let mut holders: Vec<ComponentId> = Vec::new();
    for &element in path[from..].iter().rev() {
        collect_selection_holders(tree, element, &mut holders);
    }

    let was_suppressed = tree.suppress_reactions;
    tree.suppress_reactions = true;
    for holder in holders {
        clear_selection(tree, holder);
    }
    tree.suppress_reactions = was_suppressed;
}

/// Collect the components holding a selection within a subtree. Descent
/// stops at the first selection holder of each branch and never enters a
/// nested root coordinator's subtree.
fn collect_selection_holders(tree: &TileTree, id: ComponentId, out: &mut Vec<ComponentId>) {
    match tree.get(id).map(|c| &c.kind) {
        Some(ComponentKind::Inlined(_)) | Some(ComponentKind::Group(_)) => out.push(id),
        Some(ComponentKind::Context(state)) => out.push(state.selector()),
        _ => {}
    }
}

fn clear_selection(tree: &mut TileTree, id: ComponentId) {
    match tree.get(id).map(|c| &c.kind) {
        Some(ComponentKind::Inlined(_)) => {
            let _ = inlined::set_selection(tree, id, None);
        }
        Some(ComponentKind::Group(_)) => {
            let _ = group::set_selected(tree, id, None);
        }
        Some(ComponentKind::Context(_)) => {
            let _ = context::set_content_displayed(tree, id, false);
        }
        _ => {}
    }
}

/// The direct child of the next group ancestor: (group, child).
/// `None` when the walk escapes the subtree or reaches a root coordinator
/// before any group.
fn group_ancestor_child(
    tree: &TileTree,
    sender: ComponentId,
) -> Option<(ComponentId, ComponentId)> {
    let mut current = sender;
    loop {
        let parent = tree.parent(current)?;
        match tree.get(parent).map(|c| &c.kind) {
            Some(ComponentKind::Root(_)) => return None,
            Some(ComponentKind::Group(_)) => return Some((parent, current)),
            Some(_) => current = parent,
            None => return None,
        }
    }
}

/// Fire a path notification unless the path is unchanged.
fn fire_path_changed(tree: &mut TileTree, root: ComponentId, old_path: Vec<ComponentId>) {
    let new_path = path_of(tree, root);
    if paths_equal_from_end(&old_path, &new_path) {
        return;
    }
    debug!(
        ?root,
        old_len = old_path.len(),
        new_len = new_path.len(),
        "displayed path changed"
    );
    tree.emit(TileEvent::DisplayedPathChanged {
        root,
        old_path,
        new_path,
    });
}

/// Element-by-element comparison from the tail backward; lengths may
/// differ, and unchanged suffixes of equal-length paths must suppress the
/// notification.
fn paths_equal_from_end(a: &[ComponentId], b: &[ComponentId]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().rev().zip(b.iter().rev()).all(|(x, y)| x == y)
}
