//! Dependency grapher for LookML projects: builds the model → explore → view
//! graph, renders it through an external layout engine, and can animate its
//! evolution across git history.

pub mod animator;
pub mod error;
pub mod grapher;
pub mod render;

pub use animator::{Frame, GraphAnimator};
pub use error::{GraphError, Result};
pub use grapher::{LookmlGrapher, NodeKind};
pub use render::Renderer;
