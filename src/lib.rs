//! Server-side tile navigation and layout composition state.
//!
//! A `mosaic` layout is a tree of stateful components (groups of tiles,
//! selector/content contexts, inlined object selectors) coordinated by a
//! root component that tracks the path of components currently on screen.
//! User interactions arrive as selection changes on individual components;
//! the root coordinator incrementally recomputes the displayed path and
//! notifies listeners with the old and new paths so they can diff.
//!
//! Rendering, request plumbing, security checks, and transactions live in
//! the host framework. This crate owns the component tree, the navigation
//! state machine, the typed layout configuration, and the layout-key
//! persistence boundary.

pub mod io;
pub mod model;
pub mod nav;
pub mod ops;
