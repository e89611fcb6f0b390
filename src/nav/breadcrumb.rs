//! Breadcrumb trail over the displayed path.
//!
//! Derived on demand from the root coordinator's current path; holds no
//! state of its own. Each entry labels one navigation step and can be
//! activated to collapse the path back to that step.

use crate::model::component::{ComponentId, ComponentKind};
use crate::model::tree::TileTree;
use crate::nav::root::{self, PathError};

/// One step of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq)]
pub struct BreadcrumbEntry {
    pub component: ComponentId,
    pub label: String,
    /// Whether this entry is the component currently on screen.
    pub current: bool,
}

/// Build the trail for a root coordinator's displayed path.
pub fn breadcrumb_trail(tree: &TileTree, root: ComponentId) -> Vec<BreadcrumbEntry> {
    let path = root::displayed_path(tree, root);
    path.iter()
        .enumerate()
        .map(|(index, &component)| BreadcrumbEntry {
            component,
            label: entry_label(tree, component),
            current: index + 1 == path.len(),
        })
        .collect()
}

/// Navigate back to a trail entry.
pub fn navigate(
    tree: &mut TileTree,
    root: ComponentId,
    component: ComponentId,
) -> Result<(), PathError> {
    root::display_tile_layout(tree, root, component)
}

/// Label for a path element: the selected object's key when the step was
/// entered through a context selection, the configured component name
/// otherwise.
fn entry_label(tree: &TileTree, component: ComponentId) -> String {
    if let Some(parent) = tree.parent(component)
        && let Some(ComponentKind::Context(state)) = tree.get(parent).map(|c| &c.kind)
        && state.content() == component
        && let Some(selection) = tree
            .get(state.selector())
            .and_then(|c| c.as_inlined())
            .and_then(|s| s.selection())
    {
        return selection.key().to_string();
    }
    tree.name(component).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{
        ComponentConfig, ContextConfig, GroupConfig, InlinedConfig, LayoutConfig, LayoutKey,
        ViewConfig,
    };
    use crate::model::ObjectRef;
    use crate::nav::{group, inlined};
    use crate::ops::instantiate::{mount_layout, InstantiationContext};
    use pretty_assertions::assert_eq;

    fn sample_layout() -> LayoutConfig {
        LayoutConfig {
            title: Some("Sales".to_string()),
            root: ComponentConfig::Group(GroupConfig {
                name: "overview".to_string(),
                children: vec![ComponentConfig::Context(ContextConfig {
                    name: "orders".to_string(),
                    selector: Box::new(ComponentConfig::Inlined(InlinedConfig {
                        name: "order-list".to_string(),
                        collection: Some("orders".to_string()),
                    })),
                    content: Box::new(ComponentConfig::View(ViewConfig {
                        name: "order-detail".to_string(),
                    })),
                    content_displayed: false,
                })],
                default_selected: None,
            }),
        }
    }

    #[test]
    fn trail_follows_the_path_and_labels_selections() {
        let mut tree = TileTree::new();
        let mut ctx = InstantiationContext::new();
        let root = mount_layout(
            &mut tree,
            &mut ctx,
            &LayoutKey::new("sales"),
            &sample_layout(),
        )
        .unwrap();
        let overview = tree.find_descendant(root, "overview").unwrap();
        let orders = tree.find_descendant(root, "orders").unwrap();
        let list = tree.find_descendant(root, "order-list").unwrap();

        group::set_selected(&mut tree, overview, Some(orders)).unwrap();
        inlined::set_selection(&mut tree, list, Some(ObjectRef::new("order-17"))).unwrap();

        let trail = breadcrumb_trail(&tree, root);
        let labels: Vec<&str> = trail.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["overview", "orders", "order-17"]);
        assert!(trail.last().unwrap().current);
        assert!(!trail[0].current);
    }

    #[test]
    fn activating_an_entry_truncates_the_path() {
        let mut tree = TileTree::new();
        let mut ctx = InstantiationContext::new();
        let root = mount_layout(
            &mut tree,
            &mut ctx,
            &LayoutKey::new("sales"),
            &sample_layout(),
        )
        .unwrap();
        let overview = tree.find_descendant(root, "overview").unwrap();
        let orders = tree.find_descendant(root, "orders").unwrap();
        let list = tree.find_descendant(root, "order-list").unwrap();

        group::set_selected(&mut tree, overview, Some(orders)).unwrap();
        inlined::set_selection(&mut tree, list, Some(ObjectRef::new("order-17"))).unwrap();
        assert_eq!(root::displayed_path(&tree, root).len(), 3);

        navigate(&mut tree, root, overview).unwrap();
        assert_eq!(root::displayed_path(&tree, root), &[overview]);
        let trail = breadcrumb_trail(&tree, root);
        assert_eq!(trail.len(), 1);
        assert!(trail[0].current);
    }
}
