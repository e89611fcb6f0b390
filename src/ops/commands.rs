//! Named navigation commands.
//!
//! User-facing actions are modeled externally as named commands with an
//! executability predicate that drives UI affordances. The commands here
//! cover the navigation the tile layer owns itself: stepping back out of
//! the current tile and collapsing to the entry tile. Access decisions are
//! delegated to the host framework through [`AccessGate`].

use crate::model::component::ComponentId;
use crate::model::tree::TileTree;
use crate::nav::root::{self, PathError};

/// Access decision hook consulted before navigating to a component.
/// Implemented by the host framework's security layer.
pub trait AccessGate {
    fn allow(&self, tree: &TileTree, component: ComponentId) -> bool;
}

/// Gate that permits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessGate for AllowAll {
    fn allow(&self, _tree: &TileTree, _component: ComponentId) -> bool {
        true
    }
}

/// Error type for command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("command `{0}` is not executable")]
    NotExecutable(&'static str),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// A named command operating on one root coordinator.
pub trait TileCommand {
    fn id(&self) -> &'static str;

    /// Whether the command may run right now. Consulted to show, hide, or
    /// disable UI affordances.
    fn is_executable(&self, tree: &TileTree, root: ComponentId, gate: &dyn AccessGate) -> bool;

    fn execute(
        &self,
        tree: &mut TileTree,
        root: ComponentId,
        gate: &dyn AccessGate,
    ) -> Result<(), CommandError>;
}

/// Step back to the previous path element.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepOutCommand;

impl StepOutCommand {
    fn target(tree: &TileTree, root: ComponentId) -> Option<ComponentId> {
        let path = root::displayed_path(tree, root);
        if path.len() < 2 {
            return None;
        }
        path.get(path.len() - 2).copied()
    }
}

impl TileCommand for StepOutCommand {
    fn id(&self) -> &'static str {
        "stepOut"
    }

    fn is_executable(&self, tree: &TileTree, root: ComponentId, gate: &dyn AccessGate) -> bool {
        Self::target(tree, root).is_some_and(|target| gate.allow(tree, target))
    }

    fn execute(
        &self,
        tree: &mut TileTree,
        root: ComponentId,
        gate: &dyn AccessGate,
    ) -> Result<(), CommandError> {
        let Some(target) = Self::target(tree, root) else {
            return Err(CommandError::NotExecutable(self.id()));
        };
        if !gate.allow(tree, target) {
            return Err(CommandError::NotExecutable(self.id()));
        }
        root::display_tile_layout(tree, root, target)?;
        Ok(())
    }
}

/// Collapse the path back to the entry tile.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayHomeCommand;

impl TileCommand for DisplayHomeCommand {
    fn id(&self) -> &'static str {
        "displayHome"
    }

    fn is_executable(&self, tree: &TileTree, root: ComponentId, gate: &dyn AccessGate) -> bool {
        let path = root::displayed_path(tree, root);
        path.len() > 1 && gate.allow(tree, path[0])
    }

    fn execute(
        &self,
        tree: &mut TileTree,
        root: ComponentId,
        gate: &dyn AccessGate,
    ) -> Result<(), CommandError> {
        if !self.is_executable(tree, root, gate) {
            return Err(CommandError::NotExecutable(self.id()));
        }
        let home = root::displayed_path(tree, root)[0];
        root::display_tile_layout(tree, root, home)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::{ComponentConfig, GroupConfig, LayoutConfig, LayoutKey, ViewConfig};
    use crate::nav::group;
    use crate::ops::instantiate::{mount_layout, InstantiationContext};
    use pretty_assertions::assert_eq;

    struct DenyAll;
    impl AccessGate for DenyAll {
        fn allow(&self, _tree: &TileTree, _component: ComponentId) -> bool {
            false
        }
    }

    fn mounted_group(tree: &mut TileTree) -> (ComponentId, ComponentId, ComponentId) {
        let config = LayoutConfig {
            title: None,
            root: ComponentConfig::Group(GroupConfig {
                name: "home".to_string(),
                children: vec![ComponentConfig::View(ViewConfig {
                    name: "detail".to_string(),
                })],
                default_selected: None,
            }),
        };
        let mut ctx = InstantiationContext::new();
        let root = mount_layout(tree, &mut ctx, &LayoutKey::new("home"), &config).unwrap();
        let home = tree.find_descendant(root, "home").unwrap();
        let detail = tree.find_descendant(root, "detail").unwrap();
        (root, home, detail)
    }

    #[test]
    fn step_out_executability_follows_the_path_length() {
        let mut tree = TileTree::new();
        let (root, home, detail) = mounted_group(&mut tree);
        let command = StepOutCommand;

        assert!(!command.is_executable(&tree, root, &AllowAll));
        group::set_selected(&mut tree, home, Some(detail)).unwrap();
        assert!(command.is_executable(&tree, root, &AllowAll));

        command.execute(&mut tree, root, &AllowAll).unwrap();
        assert_eq!(crate::nav::displayed_path(&tree, root), &[home]);
        assert!(!command.is_executable(&tree, root, &AllowAll));
        assert_eq!(
            command.execute(&mut tree, root, &AllowAll),
            Err(CommandError::NotExecutable("stepOut"))
        );
    }

    #[test]
    fn gate_veto_disables_execution() {
        let mut tree = TileTree::new();
        let (root, home, detail) = mounted_group(&mut tree);
        group::set_selected(&mut tree, home, Some(detail)).unwrap();

        let command = StepOutCommand;
        assert!(!command.is_executable(&tree, root, &DenyAll));
        assert_eq!(
            command.execute(&mut tree, root, &DenyAll),
            Err(CommandError::NotExecutable("stepOut"))
        );
        // Path untouched by the refused command.
        assert_eq!(crate::nav::displayed_path(&tree, root), &[home, detail]);
    }

    #[test]
    fn display_home_collapses_the_whole_path() {
        let mut tree = TileTree::new();
        let (root, home, detail) = mounted_group(&mut tree);
        group::set_selected(&mut tree, home, Some(detail)).unwrap();

        let command = DisplayHomeCommand;
        assert!(command.is_executable(&tree, root, &AllowAll));
        command.execute(&mut tree, root, &AllowAll).unwrap();
        assert_eq!(crate::nav::displayed_path(&tree, root), &[home]);
        assert!(!command.is_executable(&tree, root, &AllowAll));
    }
}
