use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a component within a [`TileTree`](crate::model::TileTree).
///
/// Generational indices stay unique across removals, so a stale id held by
/// an event or an external command can never alias a newer component.
pub type ComponentId = generational_arena::Index;

/// Opaque reference to a business object held in an external collection.
///
/// The tree never interprets the key; it only compares it for identity and
/// hands it back to the host framework.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(String);

impl ObjectRef {
    pub fn new(key: impl Into<String>) -> Self {
        ObjectRef(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stateful layout component in the navigation tree.
#[derive(Debug)]
pub struct Component {
    /// Configured name, unique within its layout. Used for labels and for
    /// addressing components in editor operations.
    pub name: String,
    pub kind: ComponentKind,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) visible: bool,
    /// Root coordinator currently displaying this component, if any.
    /// Set only while the component is a member of a displayed path.
    pub(crate) root_tile: Option<ComponentId>,
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Component {
            name: name.into(),
            kind,
            parent: None,
            visible: false,
            root_tile: None,
        }
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The root coordinator whose displayed path contains this component.
    pub fn root_tile(&self) -> Option<ComponentId> {
        self.root_tile
    }

    /// Whether this component can hold a current selection of an external
    /// object. Only selectable components may serve as context selectors.
    pub fn is_selectable(&self) -> bool {
        matches!(self.kind, ComponentKind::Inlined(_))
    }

    /// Direct children in display order.
    pub fn children(&self) -> Vec<ComponentId> {
        match &self.kind {
            ComponentKind::Root(root) => root.child.into_iter().collect(),
            ComponentKind::Group(group) => group.children.clone(),
            ComponentKind::Context(context) => vec![context.selector, context.content],
            ComponentKind::Inlined(_) | ComponentKind::View => Vec::new(),
        }
    }

    pub fn as_group(&self) -> Option<&GroupState> {
        match &self.kind {
            ComponentKind::Group(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&ContextState> {
        match &self.kind {
            ComponentKind::Context(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_inlined(&self) -> Option<&InlinedState> {
        match &self.kind {
            ComponentKind::Inlined(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_root(&self) -> Option<&RootState> {
        match &self.kind {
            ComponentKind::Root(state) => Some(state),
            _ => None,
        }
    }
}

/// The kinds of component that make up a tile layout.
#[derive(Debug)]
pub enum ComponentKind {
    /// Root coordinator: owns a single child subtree and the displayed path.
    Root(RootState),
    /// Ordered group of tiles with at most one child displayed.
    Group(GroupState),
    /// Selector/content pair: exactly one of the two is visible at a time,
    /// switched by whether a context object is selected.
    Context(ContextState),
    /// Terminal tile that selects a business object from an external
    /// collection. Selecting a non-null object "enters" the tile.
    Inlined(InlinedState),
    /// Terminal content component rendered by the host framework.
    View,
}

#[derive(Debug, Default)]
pub struct RootState {
    pub(crate) child: Option<ComponentId>,
    pub(crate) displayed_path: Vec<ComponentId>,
}

impl RootState {
    pub fn child(&self) -> Option<ComponentId> {
        self.child
    }

    /// Path from the root's child to the currently visible component.
    /// The last element is the component actually on screen.
    pub fn displayed_path(&self) -> &[ComponentId] {
        &self.displayed_path
    }
}

#[derive(Debug, Default)]
pub struct GroupState {
    pub(crate) children: Vec<ComponentId>,
    pub(crate) selected: Option<ComponentId>,
}

impl GroupState {
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// The selected child. Always a current member or `None`.
    pub fn selected(&self) -> Option<ComponentId> {
        self.selected
    }

    /// The child the root coordinator descends into after a selection
    /// change.
    pub fn displayed_descendant(&self) -> Option<ComponentId> {
        self.selected
    }
}

#[derive(Debug)]
pub struct ContextState {
    pub(crate) selector: ComponentId,
    pub(crate) content: ComponentId,
    pub(crate) content_displayed: bool,
}

impl ContextState {
    pub fn selector(&self) -> ComponentId {
        self.selector
    }

    pub fn content(&self) -> ComponentId {
        self.content
    }

    pub fn is_content_displayed(&self) -> bool {
        self.content_displayed
    }
}

#[derive(Debug, Default)]
pub struct InlinedState {
    pub(crate) selection: Option<ObjectRef>,
    /// Key of the external collection this component selects from.
    pub(crate) collection: Option<String>,
}

impl InlinedState {
    pub fn selection(&self) -> Option<&ObjectRef> {
        self.selection.as_ref()
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }
}
