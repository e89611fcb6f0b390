use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque string key naming a stored layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutKey(String);

impl LayoutKey {
    pub fn new(key: impl Into<String>) -> Self {
        LayoutKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayoutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayoutKey {
    fn from(key: &str) -> Self {
        LayoutKey(key.to_string())
    }
}

/// A stored layout: the declarative component tree for one layout key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Title shown in the toolbar of the mounted layout. `None` means no
    /// title is displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub root: ComponentConfig,
}

/// Declarative configuration of one component subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComponentConfig {
    Group(GroupConfig),
    Context(ContextConfig),
    Inlined(InlinedConfig),
    View(ViewConfig),
}

// Scalar fields precede the component-tree fields so the TOML form keeps
// plain values ahead of sub-tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    /// Name of the child selected when the layout is first displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_selected: Option<String>,
    #[serde(default)]
    pub children: Vec<ComponentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub name: String,
    /// Whether the content pane starts out displayed.
    #[serde(default)]
    pub content_displayed: bool,
    pub selector: Box<ComponentConfig>,
    pub content: Box<ComponentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlinedConfig {
    pub name: String,
    /// Key of the external collection the component selects from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
}

impl ComponentConfig {
    pub fn name(&self) -> &str {
        match self {
            ComponentConfig::Group(c) => &c.name,
            ComponentConfig::Context(c) => &c.name,
            ComponentConfig::Inlined(c) => &c.name,
            ComponentConfig::View(c) => &c.name,
        }
    }

    /// Direct child configurations in display order.
    pub fn children(&self) -> Vec<&ComponentConfig> {
        match self {
            ComponentConfig::Group(c) => c.children.iter().collect(),
            ComponentConfig::Context(c) => vec![c.selector.as_ref(), c.content.as_ref()],
            ComponentConfig::Inlined(_) | ComponentConfig::View(_) => Vec::new(),
        }
    }

    /// Collect the names of this subtree, depth-first.
    pub fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(self.name());
        for child in self.children() {
            child.collect_names(out);
        }
    }

    /// Find the named component in this subtree, depth-first.
    pub fn find(&self, name: &str) -> Option<&ComponentConfig> {
        if self.name() == name {
            return Some(self);
        }
        match self {
            ComponentConfig::Group(c) => c.children.iter().find_map(|child| child.find(name)),
            ComponentConfig::Context(c) => {
                c.selector.find(name).or_else(|| c.content.find(name))
            }
            _ => None,
        }
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut ComponentConfig> {
        if self.name() == name {
            return Some(self);
        }
        match self {
            ComponentConfig::Group(c) => {
                c.children.iter_mut().find_map(|child| child.find_mut(name))
            }
            ComponentConfig::Context(c) => {
                if c.selector.find(name).is_some() {
                    c.selector.find_mut(name)
                } else {
                    c.content.find_mut(name)
                }
            }
            _ => None,
        }
    }

    /// Remove the named component from the group that contains it.
    /// Returns the removed configuration, or `None` when the name does not
    /// occur in a group child slot of this subtree.
    pub fn remove_from_group(&mut self, name: &str) -> Option<ComponentConfig> {
        match self {
            ComponentConfig::Group(group) => {
                if let Some(pos) = group.children.iter().position(|c| c.name() == name) {
                    if group.default_selected.as_deref() == Some(name) {
                        group.default_selected = None;
                    }
                    return Some(group.children.remove(pos));
                }
                group
                    .children
                    .iter_mut()
                    .find_map(|child| child.remove_from_group(name))
            }
            ComponentConfig::Context(context) => context
                .selector
                .remove_from_group(name)
                .or_else(|| context.content.remove_from_group(name)),
            _ => None,
        }
    }

    /// Replace the named component with `new`, returning the old
    /// configuration. Searches group child slots and context slots.
    pub fn replace(&mut self, name: &str, new: ComponentConfig) -> Option<ComponentConfig> {
        if self.name() == name {
            return Some(std::mem::replace(self, new));
        }
        match self {
            ComponentConfig::Group(group) => {
                let target = group
                    .children
                    .iter()
                    .position(|child| child.find(name).is_some())?;
                group.children[target].replace(name, new)
            }
            ComponentConfig::Context(context) => {
                if context.selector.find(name).is_some() {
                    context.selector.replace(name, new)
                } else {
                    context.content.replace(name, new)
                }
            }
            _ => None,
        }
    }
}
