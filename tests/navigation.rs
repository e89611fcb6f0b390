//! End-to-end navigation scenarios over a mounted tile layout.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use mosaic::model::{
    ComponentConfig, ComponentId, ComponentKind, ContextConfig, GroupConfig, InlinedConfig,
    LayoutConfig, LayoutKey, ObjectRef, TileTree, ViewConfig,
};
use mosaic::nav::{self, breadcrumb, context, group, inlined, root, TileEvent};
use mosaic::ops::{mount_layout, InstantiationContext};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn view(name: &str) -> ComponentConfig {
    ComponentConfig::View(ViewConfig {
        name: name.to_string(),
    })
}

fn inlined_cfg(name: &str, collection: &str) -> ComponentConfig {
    ComponentConfig::Inlined(InlinedConfig {
        name: name.to_string(),
        collection: Some(collection.to_string()),
    })
}

/// Three-level layout: group → selector/content context → group.
fn three_level_layout(content_displayed: bool) -> LayoutConfig {
    LayoutConfig {
        title: Some("Projects".to_string()),
        root: ComponentConfig::Group(GroupConfig {
            name: "projects".to_string(),
            children: vec![
                view("summary"),
                view("timeline"),
                ComponentConfig::Context(ContextConfig {
                    name: "workspaces".to_string(),
                    selector: Box::new(inlined_cfg("workspace-list", "workspaces")),
                    content: Box::new(ComponentConfig::Group(GroupConfig {
                        name: "workspace".to_string(),
                        children: vec![view("tasks"), view("files"), view("members")],
                        default_selected: None,
                    })),
                    content_displayed,
                }),
            ],
            default_selected: None,
        }),
    }
}

struct Mounted {
    tree: TileTree,
    root: ComponentId,
    events: Rc<RefCell<Vec<TileEvent>>>,
}

impl Mounted {
    fn new(config: &LayoutConfig) -> Self {
        init_logging();
        let mut tree = TileTree::new();
        let mut ctx = InstantiationContext::new();
        let root = mount_layout(&mut tree, &mut ctx, &LayoutKey::new("projects"), config).unwrap();
        assert!(!ctx.has_errors());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        tree.add_listener(Box::new(move |event| sink.borrow_mut().push(event.clone())));
        Mounted { tree, root, events }
    }

    fn id(&self, name: &str) -> ComponentId {
        self.tree
            .find_descendant(self.root, name)
            .unwrap_or_else(|| panic!("no component named {name}"))
    }

    fn path_events(&self) -> Vec<(Vec<ComponentId>, Vec<ComponentId>)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                TileEvent::DisplayedPathChanged {
                    old_path, new_path, ..
                } => Some((old_path.clone(), new_path.clone())),
                _ => None,
            })
            .collect()
    }

    fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Check the structural visibility invariants over the whole tree.
    fn assert_visibility_invariants(&self) {
        for id in self.tree.descendants(self.root) {
            let component = self.tree.get(id).unwrap();
            match &component.kind {
                ComponentKind::Context(state) => {
                    let selector_visible =
                        self.tree.get(state.selector()).unwrap().is_visible();
                    let content_visible = self.tree.get(state.content()).unwrap().is_visible();
                    if component.is_visible() {
                        assert_ne!(
                            selector_visible, content_visible,
                            "context must show exactly one child"
                        );
                        assert_eq!(content_visible, state.is_content_displayed());
                    } else {
                        assert!(!selector_visible && !content_visible);
                    }
                }
                ComponentKind::Group(state) => {
                    for &child in state.children() {
                        let child_visible = self.tree.get(child).unwrap().is_visible();
                        if child_visible {
                            assert!(component.is_visible());
                            assert_eq!(state.selected(), Some(child));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Check that the path is a valid descent chain: every element after
    /// the first is reachable from its predecessor by one selection step.
    fn assert_path_consistent(&self) {
        let path = nav::displayed_path(&self.tree, self.root);
        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let reachable = group::selected(&self.tree, from) == Some(to)
                || (context::is_content_displayed(&self.tree, from)
                    && context::content(&self.tree, from) == Some(to));
            assert!(
                reachable,
                "path element {:?} is not one selection step from {:?}",
                to, from
            );
        }
    }
}

#[test]
fn selection_walks_the_path_down_and_back_up() {
    let mut m = Mounted::new(&three_level_layout(false));
    let (projects, workspaces, list, workspace) = (
        m.id("projects"),
        m.id("workspaces"),
        m.id("workspace-list"),
        m.id("workspace"),
    );
    assert_eq!(nav::displayed_path(&m.tree, m.root), &[projects]);

    // Enter the context tile.
    group::set_selected(&mut m.tree, projects, Some(workspaces)).unwrap();
    assert_eq!(
        nav::displayed_path(&m.tree, m.root),
        &[projects, workspaces]
    );
    m.assert_path_consistent();
    m.assert_visibility_invariants();

    // Selecting a workspace opens the content group: one path event.
    m.clear_events();
    inlined::set_selection(&mut m.tree, list, Some(ObjectRef::new("ws-7"))).unwrap();
    assert_eq!(
        nav::displayed_path(&m.tree, m.root),
        &[projects, workspaces, workspace]
    );
    assert_eq!(
        m.path_events(),
        vec![(
            vec![projects, workspaces],
            vec![projects, workspaces, workspace]
        )]
    );
    m.assert_path_consistent();
    m.assert_visibility_invariants();

    // Clearing the selection at the outer selector collapses the branch
    // back to the entry tile.
    m.clear_events();
    inlined::set_selection(&mut m.tree, list, None).unwrap();
    assert_eq!(nav::displayed_path(&m.tree, m.root), &[projects]);
    assert_eq!(nav::displayed_path(&m.tree, m.root).len(), 1);
    m.assert_path_consistent();
    m.assert_visibility_invariants();
    assert_eq!(group::selected(&m.tree, projects), None);
}

#[test]
fn configured_content_display_descends_in_a_single_step() {
    // With the context configured to start in content display, selecting
    // its tile grows the path to length 3 with exactly one notification.
    let mut m = Mounted::new(&three_level_layout(true));
    let (projects, workspaces, workspace) =
        (m.id("projects"), m.id("workspaces"), m.id("workspace"));
    assert_eq!(nav::displayed_path(&m.tree, m.root), &[projects]);

    m.clear_events();
    group::set_selected(&mut m.tree, projects, Some(workspaces)).unwrap();

    assert_eq!(
        nav::displayed_path(&m.tree, m.root),
        &[projects, workspaces, workspace]
    );
    assert_eq!(
        m.path_events(),
        vec![(
            vec![projects],
            vec![projects, workspaces, workspace]
        )]
    );
    m.assert_path_consistent();
}

#[test]
fn switching_a_mid_path_selection_replaces_only_the_suffix() {
    let mut m = Mounted::new(&three_level_layout(false));
    let (projects, workspaces, list, workspace, tasks, files) = (
        m.id("projects"),
        m.id("workspaces"),
        m.id("workspace-list"),
        m.id("workspace"),
        m.id("tasks"),
        m.id("files"),
    );

    group::set_selected(&mut m.tree, projects, Some(workspaces)).unwrap();
    inlined::set_selection(&mut m.tree, list, Some(ObjectRef::new("ws-7"))).unwrap();
    group::set_selected(&mut m.tree, workspace, Some(tasks)).unwrap();
    assert_eq!(
        nav::displayed_path(&m.tree, m.root),
        &[projects, workspaces, workspace, tasks]
    );

    // Same selection again: no notification at all.
    m.clear_events();
    group::set_selected(&mut m.tree, workspace, Some(tasks)).unwrap();
    assert!(m.path_events().is_empty());

    // Switch the inner group: one event, suffix replaced.
    group::set_selected(&mut m.tree, workspace, Some(files)).unwrap();
    assert_eq!(
        m.path_events(),
        vec![(
            vec![projects, workspaces, workspace, tasks],
            vec![projects, workspaces, workspace, files]
        )]
    );
    m.assert_path_consistent();
    m.assert_visibility_invariants();
}

#[test]
fn component_events_precede_the_path_notification() {
    let mut m = Mounted::new(&three_level_layout(false));
    let (projects, workspaces) = (m.id("projects"), m.id("workspaces"));

    m.clear_events();
    group::set_selected(&mut m.tree, projects, Some(workspaces)).unwrap();

    let events = m.events.borrow();
    let group_pos = events
        .iter()
        .position(|e| matches!(e, TileEvent::GroupSelectionChanged { .. }))
        .unwrap();
    let path_pos = events
        .iter()
        .position(|e| matches!(e, TileEvent::DisplayedPathChanged { .. }))
        .unwrap();
    assert!(group_pos < path_pos);
    match &events[group_pos] {
        TileEvent::GroupSelectionChanged {
            group,
            old_selected,
            new_selected,
        } => {
            assert_eq!(*group, projects);
            assert_eq!(*old_selected, None);
            assert_eq!(*new_selected, Some(workspaces));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn display_tile_layout_collapses_and_stays_idempotent() {
    let mut m = Mounted::new(&three_level_layout(false));
    let (projects, workspaces, list) = (
        m.id("projects"),
        m.id("workspaces"),
        m.id("workspace-list"),
    );
    group::set_selected(&mut m.tree, projects, Some(workspaces)).unwrap();
    inlined::set_selection(&mut m.tree, list, Some(ObjectRef::new("ws-7"))).unwrap();
    assert_eq!(nav::displayed_path(&m.tree, m.root).len(), 3);

    m.clear_events();
    root::display_tile_layout(&mut m.tree, m.root, workspaces).unwrap();
    assert_eq!(
        nav::displayed_path(&m.tree, m.root),
        &[projects, workspaces]
    );
    assert_eq!(m.path_events().len(), 1);

    // Idempotent at the tail: no further notification.
    root::display_tile_layout(&mut m.tree, m.root, workspaces).unwrap();
    assert_eq!(m.path_events().len(), 1);

    // The collapsed step was deselected, so it can be entered again.
    assert_eq!(inlined::selection(&m.tree, list), None);
    inlined::set_selection(&mut m.tree, list, Some(ObjectRef::new("ws-9"))).unwrap();
    assert_eq!(nav::displayed_path(&m.tree, m.root).len(), 3);
}

#[test]
fn breadcrumb_mirrors_the_displayed_path() {
    let mut m = Mounted::new(&three_level_layout(false));
    let (projects, workspaces, list) = (
        m.id("projects"),
        m.id("workspaces"),
        m.id("workspace-list"),
    );
    group::set_selected(&mut m.tree, projects, Some(workspaces)).unwrap();
    inlined::set_selection(&mut m.tree, list, Some(ObjectRef::new("ws-7"))).unwrap();

    let trail = breadcrumb::breadcrumb_trail(&m.tree, m.root);
    let labels: Vec<&str> = trail.iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["projects", "workspaces", "ws-7"]);

    breadcrumb::navigate(&mut m.tree, m.root, projects).unwrap();
    assert_eq!(nav::displayed_path(&m.tree, m.root), &[projects]);
}

#[test]
fn stale_selections_in_inactive_subtrees_change_no_path() {
    let mut m = Mounted::new(&three_level_layout(false));
    let (projects, summary, workspace, tasks) = (
        m.id("projects"),
        m.id("summary"),
        m.id("workspace"),
        m.id("tasks"),
    );
    group::set_selected(&mut m.tree, projects, Some(summary)).unwrap();

    // The workspace group is not displayed; its selection is absorbed.
    m.clear_events();
    group::set_selected(&mut m.tree, workspace, Some(tasks)).unwrap();
    assert!(m.path_events().is_empty());
    assert_eq!(nav::displayed_path(&m.tree, m.root), &[projects, summary]);
    // The state change itself is kept for later descent.
    assert_eq!(group::selected(&m.tree, workspace), Some(tasks));
}

#[test]
fn nested_group_selection_descends_through_retained_chains() {
    let mut m = Mounted::new(&three_level_layout(false));
    let (projects, workspaces, list, workspace, members) = (
        m.id("projects"),
        m.id("workspaces"),
        m.id("workspace-list"),
        m.id("workspace"),
        m.id("members"),
    );

    // Prepare an inner selection while the branch is inactive.
    group::set_selected(&mut m.tree, workspace, Some(members)).unwrap();
    group::set_selected(&mut m.tree, projects, Some(workspaces)).unwrap();

    // Entering the context now descends through content and inner group.
    m.clear_events();
    inlined::set_selection(&mut m.tree, list, Some(ObjectRef::new("ws-1"))).unwrap();
    assert_eq!(
        nav::displayed_path(&m.tree, m.root),
        &[projects, workspaces, workspace, members]
    );
    assert_eq!(m.path_events().len(), 1);
    m.assert_path_consistent();
    m.assert_visibility_invariants();
}
