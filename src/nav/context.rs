//! Selector/content context operations.
//!
//! A context connects a selectable component with a content component.
//! Exactly one of the two is visible whenever the context itself is
//! visible: the selector while no context object is chosen, the content
//! once one is. The context's outward model mirrors the selector's
//! current selection, which is how an external "select an object" command
//! indirectly steps the displayed path forward.

use crate::model::component::{ComponentId, ComponentKind, ObjectRef};
use crate::model::tree::TileTree;
use crate::nav::event::TileEvent;
use crate::nav::{inlined, root};

/// Error type for context operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("component is not a context")]
    NotAContext,
    #[error("selector component must be selectable")]
    SelectorNotSelectable,
    #[error("replacement component is already attached to another container")]
    AlreadyAttached,
    #[error("unknown replacement component")]
    UnknownComponent,
}

pub fn selector(tree: &TileTree, context: ComponentId) -> Option<ComponentId> {
    Some(tree.get(context)?.as_context()?.selector())
}

pub fn content(tree: &TileTree, context: ComponentId) -> Option<ComponentId> {
    Some(tree.get(context)?.as_context()?.content())
}

pub fn is_content_displayed(tree: &TileTree, context: ComponentId) -> bool {
    tree.get(context)
        .and_then(|c| c.as_context())
        .is_some_and(|state| state.is_content_displayed())
}

/// The context's outward model: the selector's current selection.
pub fn selected_object(tree: &TileTree, context: ComponentId) -> Option<&ObjectRef> {
    let state = tree.get(context)?.as_context()?;
    tree.get(state.selector())?.as_inlined()?.selection()
}

/// Drive the context's model from outside. Forwards to the selector's
/// selection channel; a non-null object displays the content, null brings
/// the selector back.
pub fn set_selected_object(
    tree: &mut TileTree,
    context: ComponentId,
    selection: Option<ObjectRef>,
) -> Result<(), ContextError> {
    let selector = selector(tree, context).ok_or(ContextError::NotAContext)?;
    inlined::set_selection(tree, selector, selection)
        .map_err(|_| ContextError::SelectorNotSelectable)
}

/// Flip between showing the selector and showing the content.
///
/// No-op when unchanged. Visibility propagates to both children and the
/// owning root coordinator reacts; coordinators of enclosing tile subtrees
/// do not.
pub fn set_content_displayed(
    tree: &mut TileTree,
    context: ComponentId,
    displayed: bool,
) -> Result<(), ContextError> {
    {
        let Some(component) = tree.get_mut(context) else {
            return Err(ContextError::NotAContext);
        };
        let ComponentKind::Context(state) = &mut component.kind else {
            return Err(ContextError::NotAContext);
        };
        if state.content_displayed == displayed {
            return Ok(());
        }
        state.content_displayed = displayed;
    }
    tree.begin_update();
    tree.propagate_visibility(context);
    tree.emit(TileEvent::ContentDisplayedChanged { context, displayed });
    root::handle_content_displayed_changed(tree, context, displayed);
    tree.end_update();
    Ok(())
}

/// Replace the content component, returning the outgoing one.
///
/// The outgoing child is reparented to none; a content-changed event fires
/// only when the content reference actually changes identity.
pub fn set_content(
    tree: &mut TileTree,
    context: ComponentId,
    new_content: ComponentId,
) -> Result<ComponentId, ContextError> {
    if !tree.contains(new_content) {
        return Err(ContextError::UnknownComponent);
    }
    let (old_content, selector) = {
        let state = tree
            .get(context)
            .and_then(|c| c.as_context())
            .ok_or(ContextError::NotAContext)?;
        (state.content(), state.selector())
    };
    if old_content == new_content {
        return Ok(old_content);
    }
    if tree.parent(new_content).is_some() {
        return Err(ContextError::AlreadyAttached);
    }
    {
        let Some(component) = tree.get_mut(context) else {
            return Err(ContextError::NotAContext);
        };
        let ComponentKind::Context(state) = &mut component.kind else {
            return Err(ContextError::NotAContext);
        };
        state.content = new_content;
    }
    tree.set_parent(old_content, None);
    tree.set_parent(new_content, Some(context));
    tree.begin_update();
    tree.set_visible(old_content, false);
    tree.propagate_visibility(context);
    tree.emit(TileEvent::ContentComponentChanged {
        context,
        old_content,
        new_content,
    });
    root::handle_content_component_changed(tree, context, new_content);
    tree.emit(TileEvent::ChildrenChanged {
        container: context,
        old_children: vec![selector, old_content],
        new_children: vec![selector, new_content],
    });
    root::handle_children_changed(tree, context);
    tree.end_update();
    Ok(old_content)
}

/// Replace the selector component, returning the outgoing one.
///
/// The incoming component must be selectable.
pub fn set_selector(
    tree: &mut TileTree,
    context: ComponentId,
    new_selector: ComponentId,
) -> Result<ComponentId, ContextError> {
    if !tree.contains(new_selector) {
        return Err(ContextError::UnknownComponent);
    }
    if !tree.get(new_selector).is_some_and(|c| c.is_selectable()) {
        return Err(ContextError::SelectorNotSelectable);
    }
    let (old_selector, content) = {
        let state = tree
            .get(context)
            .and_then(|c| c.as_context())
            .ok_or(ContextError::NotAContext)?;
        (state.selector(), state.content())
    };
    if old_selector == new_selector {
        return Ok(old_selector);
    }
    if tree.parent(new_selector).is_some() {
        return Err(ContextError::AlreadyAttached);
    }
    {
        let Some(component) = tree.get_mut(context) else {
            return Err(ContextError::NotAContext);
        };
        let ComponentKind::Context(state) = &mut component.kind else {
            return Err(ContextError::NotAContext);
        };
        state.selector = new_selector;
    }
    tree.set_parent(old_selector, None);
    tree.set_parent(new_selector, Some(context));
    tree.begin_update();
    tree.set_visible(old_selector, false);
    tree.propagate_visibility(context);
    tree.emit(TileEvent::ChildrenChanged {
        container: context,
        old_children: vec![old_selector, content],
        new_children: vec![new_selector, content],
    });
    root::handle_children_changed(tree, context);
    tree.end_update();
    Ok(old_selector)
}
