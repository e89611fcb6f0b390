//! Inlined tile operations.
//!
//! An inlined tile is a terminal component exposing a single selection
//! channel that holds an opaque business object reference. Selecting a
//! non-null object "enters" the tile: the enclosing group selects the
//! tile's branch, and when the tile serves as a context's selector, the
//! context opens its content.

use crate::model::component::{ComponentId, ComponentKind, ObjectRef};
use crate::model::tree::TileTree;
use crate::nav::event::TileEvent;
use crate::nav::{context, root};

/// Error type for selection-channel operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("component has no selection channel")]
    NotSelectable,
}

pub fn selection(tree: &TileTree, component: ComponentId) -> Option<&ObjectRef> {
    tree.get(component)?.as_inlined()?.selection()
}

/// Put an object into the tile's selection channel (or clear it).
pub fn set_selection(
    tree: &mut TileTree,
    component: ComponentId,
    selection: Option<ObjectRef>,
) -> Result<(), SelectError> {
    let old_selection = {
        let Some(comp) = tree.get_mut(component) else {
            return Err(SelectError::NotSelectable);
        };
        let ComponentKind::Inlined(state) = &mut comp.kind else {
            return Err(SelectError::NotSelectable);
        };
        if state.selection == selection {
            return Ok(());
        }
        std::mem::replace(&mut state.selection, selection.clone())
    };
    tree.begin_update();
    tree.emit(TileEvent::InlinedSelectionChanged {
        component,
        old_selection,
        new_selection: selection.clone(),
    });
    // Context-model mirror: a selector's selection drives whether the
    // owning context displays its content.
    if let Some(parent) = tree.parent(component)
        && tree
            .get(parent)
            .and_then(|c| c.as_context())
            .is_some_and(|state| state.selector() == component)
    {
        let _ = context::set_content_displayed(tree, parent, selection.is_some());
    }
    root::handle_inlined_selection_changed(tree, component, selection.is_some());
    tree.end_update();
    Ok(())
}

pub fn clear_selection(tree: &mut TileTree, component: ComponentId) -> Result<(), SelectError> {
    set_selection(tree, component, None)
}
