use generational_arena::Arena;
use indexmap::IndexMap;
use tracing::trace;

use crate::model::component::{Component, ComponentId, ComponentKind};
use crate::model::config::LayoutKey;
use crate::nav::event::{TileEvent, TileListener};

/// Arena-backed tree of layout components.
///
/// Owns every component of a session, the top-level mounts per layout key,
/// and the event queue. All mutation goes through the operation functions
/// in [`crate::nav`] and [`crate::ops`]; the tree itself only offers
/// structural primitives.
///
/// Single-threaded by design: one tree per session, events are processed
/// synchronously before the mutating call returns.
pub struct TileTree {
    arena: Arena<Component>,
    mounts: IndexMap<LayoutKey, ComponentId>,
    listeners: Vec<TileListener>,
    pending: Vec<TileEvent>,
    update_depth: usize,
    /// Set while a coordinator clears selections during path truncation.
    /// Suppresses coordinator reactions so one external operation yields
    /// one path notification.
    pub(crate) suppress_reactions: bool,
}

impl Default for TileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TileTree {
    pub fn new() -> Self {
        TileTree {
            arena: Arena::new(),
            mounts: IndexMap::new(),
            listeners: Vec::new(),
            pending: Vec::new(),
            update_depth: 0,
            suppress_reactions: false,
        }
    }

    /// Insert a detached component. Attachment happens through the
    /// instantiation and navigation operations.
    pub fn insert(&mut self, component: Component) -> ComponentId {
        self.arena.insert(component)
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.arena.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.arena.get_mut(id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn name(&self, id: ComponentId) -> Option<&str> {
        self.get(id).map(|c| c.name.as_str())
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.get(id)?.parent
    }

    pub(crate) fn set_parent(&mut self, id: ComponentId, parent: Option<ComponentId>) {
        if let Some(component) = self.arena.get_mut(id) {
            component.parent = parent;
        }
    }

    pub fn children(&self, id: ComponentId) -> Vec<ComponentId> {
        self.get(id).map(Component::children).unwrap_or_default()
    }

    /// Iterate over `from` and all its descendants, depth-first.
    pub fn descendants(&self, from: ComponentId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: if self.contains(from) {
                vec![from]
            } else {
                Vec::new()
            },
        }
    }

    /// Find a component by name within a subtree (including `from` itself).
    pub fn find_descendant(&self, from: ComponentId, name: &str) -> Option<ComponentId> {
        self.descendants(from)
            .find(|&id| self.name(id) == Some(name))
    }

    /// Remove a component and its whole subtree from the arena.
    /// Returns the number of components removed.
    ///
    /// Callers must truncate any displayed path referencing the subtree
    /// first; the navigation operations do this before detaching.
    pub fn remove_subtree(&mut self, id: ComponentId) -> usize {
        let ids: Vec<ComponentId> = self.descendants(id).collect();
        let mut removed = 0;
        for id in ids {
            if self.arena.remove(id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    // -----------------------------------------------------------------
    // Mounts
    // -----------------------------------------------------------------

    /// Bind a root coordinator as the top-level component for a layout key.
    /// Returns the previously mounted root, if any.
    pub fn mount(&mut self, key: LayoutKey, root: ComponentId) -> Option<ComponentId> {
        debug_assert!(matches!(
            self.get(root).map(|c| &c.kind),
            Some(ComponentKind::Root(_))
        ));
        trace!(key = %key, "mounting layout root");
        let previous = self.mounts.insert(key, root);
        if previous == Some(root) { None } else { previous }
    }

    pub fn unmount(&mut self, key: &LayoutKey) -> Option<ComponentId> {
        self.mounts.shift_remove(key)
    }

    /// Resolve the current top-level component for a layout key.
    pub fn mount_of(&self, key: &LayoutKey) -> Option<ComponentId> {
        self.mounts.get(key).copied()
    }

    pub fn mounts(&self) -> impl Iterator<Item = (&LayoutKey, ComponentId)> {
        self.mounts.iter().map(|(k, &v)| (k, v))
    }

    /// Whether a component is still part of a mounted layout tree.
    pub fn is_attached(&self, id: ComponentId) -> bool {
        let mut current = id;
        loop {
            let Some(component) = self.get(current) else {
                return false;
            };
            match component.parent {
                Some(parent) => current = parent,
                None => return self.mounts.values().any(|&root| root == current),
            }
        }
    }

    // -----------------------------------------------------------------
    // Ancestor walks
    // -----------------------------------------------------------------

    /// The nearest enclosing root coordinator, including `id` itself.
    pub(crate) fn nearest_root_ancestor(&self, id: ComponentId) -> Option<ComponentId> {
        let mut current = Some(id);
        while let Some(c) = current {
            let component = self.get(c)?;
            if matches!(component.kind, ComponentKind::Root(_)) {
                return Some(c);
            }
            current = component.parent;
        }
        None
    }

    /// The displayed-path member containing `id`: the nearest ancestor
    /// (including `id`) tagged with an owning root coordinator. `None`
    /// means the component is part of an inactive subtree.
    pub fn displayed_ancestor(&self, id: ComponentId) -> Option<ComponentId> {
        let mut current = Some(id);
        while let Some(c) = current {
            let component = self.get(c)?;
            if component.root_tile.is_some() {
                return Some(c);
            }
            current = component.parent;
        }
        None
    }

    // -----------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------

    pub(crate) fn set_visible(&mut self, id: ComponentId, visible: bool) {
        let Some(component) = self.arena.get_mut(id) else {
            return;
        };
        if component.visible == visible {
            return;
        }
        component.visible = visible;
        self.propagate_visibility(id);
    }

    /// Push a component's visibility down to its children: groups show the
    /// selected child, contexts show exactly one of selector and content.
    pub(crate) fn propagate_visibility(&mut self, id: ComponentId) {
        let Some(component) = self.get(id) else {
            return;
        };
        let visible = component.visible;
        let updates: Vec<(ComponentId, bool)> = match &component.kind {
            ComponentKind::Root(root) => root.child.map(|c| (c, visible)).into_iter().collect(),
            ComponentKind::Group(group) => group
                .children
                .iter()
                .map(|&c| (c, visible && group.selected == Some(c)))
                .collect(),
            ComponentKind::Context(context) => vec![
                (context.selector, visible && !context.content_displayed),
                (context.content, visible && context.content_displayed),
            ],
            ComponentKind::Inlined(_) | ComponentKind::View => Vec::new(),
        };
        for (child, v) in updates {
            self.set_visible(child, v);
        }
    }

    // -----------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------

    /// Register a listener observing every tile event. Listeners run after
    /// the triggering operation's state changes complete, in firing order.
    pub fn add_listener(&mut self, listener: TileListener) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&mut self, event: TileEvent) {
        debug_assert!(self.update_depth > 0, "event emitted outside an update");
        self.pending.push(event);
    }

    pub(crate) fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    pub(crate) fn end_update(&mut self) {
        debug_assert!(self.update_depth > 0);
        self.update_depth -= 1;
        if self.update_depth > 0 || self.pending.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.pending);
        let mut listeners = std::mem::take(&mut self.listeners);
        for event in &events {
            for listener in &mut listeners {
                listener(event);
            }
        }
        // Listeners registered during dispatch land behind the existing ones.
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }
}

/// Depth-first iterator over a subtree, children in display order.
pub struct Descendants<'a> {
    tree: &'a TileTree,
    stack: Vec<ComponentId>,
}

impl Iterator for Descendants<'_> {
    type Item = ComponentId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(component) = self.tree.get(current) {
            // Push children in reverse order for left-to-right traversal.
            let mut children = component.children();
            children.reverse();
            self.stack.extend(children);
        }
        Some(current)
    }
}
