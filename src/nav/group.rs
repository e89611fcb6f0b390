//! Group tile operations.
//!
//! A group holds an ordered list of child tiles with at most one displayed
//! at a time. Selection is always a current member or `None`; child-list
//! mutation clears the selection first when the selected member leaves.

use crate::model::component::{ComponentId, ComponentKind};
use crate::model::tree::TileTree;
use crate::nav::event::TileEvent;
use crate::nav::root;

/// Error type for group operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("component is not a group")]
    NotAGroup,
    #[error("component is not a member of the group")]
    NotAMember,
    #[error("component is already attached to another container")]
    AlreadyAttached,
    #[error("unknown component")]
    UnknownComponent,
}

pub fn children(tree: &TileTree, group: ComponentId) -> Vec<ComponentId> {
    tree.get(group)
        .and_then(|c| c.as_group())
        .map(|state| state.children().to_vec())
        .unwrap_or_default()
}

pub fn selected(tree: &TileTree, group: ComponentId) -> Option<ComponentId> {
    tree.get(group)?.as_group()?.selected()
}

/// Select a child (or none). The child must be a current member.
///
/// The previously selected child becomes invisible, the new one visible
/// (matching the group's own visibility), and the owning root coordinator
/// updates its displayed path.
pub fn set_selected(
    tree: &mut TileTree,
    group: ComponentId,
    selected: Option<ComponentId>,
) -> Result<(), GroupError> {
    let old_selected = {
        let Some(component) = tree.get_mut(group) else {
            return Err(GroupError::NotAGroup);
        };
        let ComponentKind::Group(state) = &mut component.kind else {
            return Err(GroupError::NotAGroup);
        };
        if let Some(child) = selected
            && !state.children.contains(&child)
        {
            return Err(GroupError::NotAMember);
        }
        if state.selected == selected {
            return Ok(());
        }
        std::mem::replace(&mut state.selected, selected)
    };
    tree.begin_update();
    tree.propagate_visibility(group);
    tree.emit(TileEvent::GroupSelectionChanged {
        group,
        old_selected,
        new_selected: selected,
    });
    root::handle_group_selection_changed(tree, group, selected);
    tree.end_update();
    Ok(())
}

/// Append a detached component as the group's last child.
pub fn add_child(
    tree: &mut TileTree,
    group: ComponentId,
    child: ComponentId,
) -> Result<(), GroupError> {
    if !tree.contains(child) {
        return Err(GroupError::UnknownComponent);
    }
    if tree.parent(child).is_some() {
        return Err(GroupError::AlreadyAttached);
    }
    let (old_children, new_children) = {
        let Some(component) = tree.get_mut(group) else {
            return Err(GroupError::NotAGroup);
        };
        let ComponentKind::Group(state) = &mut component.kind else {
            return Err(GroupError::NotAGroup);
        };
        let old = state.children.clone();
        state.children.push(child);
        (old, state.children.clone())
    };
    tree.set_parent(child, Some(group));
    tree.begin_update();
    tree.propagate_visibility(group);
    tree.emit(TileEvent::ChildrenChanged {
        container: group,
        old_children,
        new_children,
    });
    root::handle_children_changed(tree, group);
    tree.end_update();
    Ok(())
}

/// Remove a child from the group, detaching its subtree.
///
/// The removed subtree stays in the arena; callers that want it gone drop
/// it with [`TileTree::remove_subtree`] afterwards.
pub fn remove_child(
    tree: &mut TileTree,
    group: ComponentId,
    child: ComponentId,
) -> Result<(), GroupError> {
    {
        let state = tree
            .get(group)
            .and_then(|c| c.as_group())
            .ok_or(GroupError::NotAGroup)?;
        if !state.children().contains(&child) {
            return Err(GroupError::NotAMember);
        }
    }
    // Selection must always be a current member: clear it before the
    // structural change.
    if selected(tree, group) == Some(child) {
        set_selected(tree, group, None)?;
    }
    let (old_children, new_children) = {
        let Some(component) = tree.get_mut(group) else {
            return Err(GroupError::NotAGroup);
        };
        let ComponentKind::Group(state) = &mut component.kind else {
            return Err(GroupError::NotAGroup);
        };
        let old = state.children.clone();
        state.children.retain(|&c| c != child);
        (old, state.children.clone())
    };
    tree.set_parent(child, None);
    tree.begin_update();
    tree.set_visible(child, false);
    tree.emit(TileEvent::ChildrenChanged {
        container: group,
        old_children,
        new_children,
    });
    root::handle_children_changed(tree, group);
    tree.end_update();
    Ok(())
}

/// Swap one child for another, preserving its position.
pub fn replace_child(
    tree: &mut TileTree,
    group: ComponentId,
    old_child: ComponentId,
    new_child: ComponentId,
) -> Result<(), GroupError> {
    if !tree.contains(new_child) {
        return Err(GroupError::UnknownComponent);
    }
    if tree.parent(new_child).is_some() {
        return Err(GroupError::AlreadyAttached);
    }
    {
        let state = tree
            .get(group)
            .and_then(|c| c.as_group())
            .ok_or(GroupError::NotAGroup)?;
        if !state.children().contains(&old_child) {
            return Err(GroupError::NotAMember);
        }
    }
    if selected(tree, group) == Some(old_child) {
        set_selected(tree, group, None)?;
    }
    let (old_children, new_children) = {
        let Some(component) = tree.get_mut(group) else {
            return Err(GroupError::NotAGroup);
        };
        let ComponentKind::Group(state) = &mut component.kind else {
            return Err(GroupError::NotAGroup);
        };
        let old = state.children.clone();
        for slot in &mut state.children {
            if *slot == old_child {
                *slot = new_child;
            }
        }
        (old, state.children.clone())
    };
    tree.set_parent(old_child, None);
    tree.set_parent(new_child, Some(group));
    tree.begin_update();
    tree.set_visible(old_child, false);
    tree.propagate_visibility(group);
    tree.emit(TileEvent::ChildrenChanged {
        container: group,
        old_children,
        new_children,
    });
    root::handle_children_changed(tree, group);
    tree.end_update();
    Ok(())
}

/// Replace the whole child list.
///
/// Children present in both lists stay attached; the selection is cleared
/// first when the selected member is not part of the new list.
pub fn replace_children(
    tree: &mut TileTree,
    group: ComponentId,
    new_children: Vec<ComponentId>,
) -> Result<(), GroupError> {
    let old_children = {
        let state = tree
            .get(group)
            .and_then(|c| c.as_group())
            .ok_or(GroupError::NotAGroup)?;
        state.children().to_vec()
    };
    for &child in &new_children {
        if !tree.contains(child) {
            return Err(GroupError::UnknownComponent);
        }
        if let Some(parent) = tree.parent(child)
            && parent != group
        {
            return Err(GroupError::AlreadyAttached);
        }
    }
    if let Some(current) = selected(tree, group)
        && !new_children.contains(&current)
    {
        set_selected(tree, group, None)?;
    }
    {
        let Some(component) = tree.get_mut(group) else {
            return Err(GroupError::NotAGroup);
        };
        let ComponentKind::Group(state) = &mut component.kind else {
            return Err(GroupError::NotAGroup);
        };
        state.children = new_children.clone();
    }
    tree.begin_update();
    for &child in &old_children {
        if !new_children.contains(&child) {
            tree.set_parent(child, None);
            tree.set_visible(child, false);
        }
    }
    for &child in &new_children {
        tree.set_parent(child, Some(group));
    }
    tree.propagate_visibility(group);
    tree.emit(TileEvent::ChildrenChanged {
        container: group,
        old_children,
        new_children,
    });
    root::handle_children_changed(tree, group);
    tree.end_update();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::component::Component;
    use crate::model::component::GroupState;
    use pretty_assertions::assert_eq;

    fn view(tree: &mut TileTree, name: &str) -> ComponentId {
        tree.insert(Component::new(name, ComponentKind::View))
    }

    fn bare_group(tree: &mut TileTree, children: Vec<ComponentId>) -> ComponentId {
        let id = tree.insert(Component::new(
            "group",
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

    #[test]
    fn selection_must_be_a_member() {
        let mut tree = TileTree::new();
        let a = view(&mut tree, "a");
        let stranger = view(&mut tree, "stranger");
        let g = bare_group(&mut tree, vec![a]);

        assert_eq!(
            set_selected(&mut tree, g, Some(stranger)),
            Err(GroupError::NotAMember)
        );
        set_selected(&mut tree, g, Some(a)).unwrap();
        assert_eq!(selected(&tree, g), Some(a));
    }

    #[test]
    fn removing_the_selected_child_clears_the_selection_first() {
        let mut tree = TileTree::new();
        let a = view(&mut tree, "a");
        let b = view(&mut tree, "b");
        let g = bare_group(&mut tree, vec![a, b]);
        set_selected(&mut tree, g, Some(a)).unwrap();

        remove_child(&mut tree, g, a).unwrap();

        assert_eq!(selected(&tree, g), None);
        assert_eq!(children(&tree, g), vec![b]);
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn add_child_rejects_attached_components() {
        let mut tree = TileTree::new();
        let a = view(&mut tree, "a");
        let g = bare_group(&mut tree, vec![a]);
        let g2 = bare_group(&mut tree, vec![]);

        assert_eq!(add_child(&mut tree, g2, a), Err(GroupError::AlreadyAttached));
        let b = view(&mut tree, "b");
        add_child(&mut tree, g2, b).unwrap();
        assert_eq!(children(&tree, g2), vec![b]);
        assert_eq!(tree.parent(b), Some(g2));
        let _ = g;
    }

    #[test]
    fn replace_children_keeps_selection_when_member_survives() {
        let mut tree = TileTree::new();
        let a = view(&mut tree, "a");
        let b = view(&mut tree, "b");
        let c = view(&mut tree, "c");
        let g = bare_group(&mut tree, vec![a, b]);
        set_selected(&mut tree, g, Some(a)).unwrap();

        replace_children(&mut tree, g, vec![a, c]).unwrap();
        assert_eq!(selected(&tree, g), Some(a));

        replace_children(&mut tree, g, vec![c]).unwrap();
        assert_eq!(selected(&tree, g), None);
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn replace_child_preserves_position() {
        let mut tree = TileTree::new();
        let a = view(&mut tree, "a");
        let b = view(&mut tree, "b");
        let c = view(&mut tree, "c");
        let g = bare_group(&mut tree, vec![a, b]);

        let swap = view(&mut tree, "swap");
        replace_child(&mut tree, g, a, swap).unwrap();
        assert_eq!(children(&tree, g), vec![swap, b]);
        let _ = c;
    }
}
