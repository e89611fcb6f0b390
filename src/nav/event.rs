use crate::model::component::{ComponentId, ObjectRef};

/// Notifications fired by the component tree.
///
/// Every event carries the old and the new value so observers can diff
/// without re-querying the tree. Events are delivered synchronously, in
/// firing order, after the triggering operation has finished mutating
/// state and before it returns.
#[derive(Debug, Clone, PartialEq)]
pub enum TileEvent {
    /// The displayed path of a root coordinator changed. The last element
    /// of `new_path` is the component now actually on screen.
    DisplayedPathChanged {
        root: ComponentId,
        old_path: Vec<ComponentId>,
        new_path: Vec<ComponentId>,
    },
    /// A group switched its selected child.
    GroupSelectionChanged {
        group: ComponentId,
        old_selected: Option<ComponentId>,
        new_selected: Option<ComponentId>,
    },
    /// A context flipped between showing its selector and its content.
    /// Not propagated to coordinators of enclosing tile subtrees; only the
    /// owning root reacts.
    ContentDisplayedChanged {
        context: ComponentId,
        displayed: bool,
    },
    /// A context's content component was replaced. Fired only when the
    /// content reference actually changes identity.
    ContentComponentChanged {
        context: ComponentId,
        old_content: ComponentId,
        new_content: ComponentId,
    },
    /// An inlined tile selected or deselected a business object.
    InlinedSelectionChanged {
        component: ComponentId,
        old_selection: Option<ObjectRef>,
        new_selection: Option<ObjectRef>,
    },
    /// A container's child list changed.
    ChildrenChanged {
        container: ComponentId,
        old_children: Vec<ComponentId>,
        new_children: Vec<ComponentId>,
    },
}

/// Callback observing tile events.
pub type TileListener = Box<dyn FnMut(&TileEvent)>;
