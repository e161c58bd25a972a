#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config, parse_config};
pub use error::{Error, Result};
pub use geometry::{Point, Rect};
pub use ir::{DependencyStatus, Task, TaskStatus, parse_tasks};
pub use layout::{GraphLayout, compute_graph_layout, route_edge};
pub use model::{GraphModel, build_graph_model};
pub use output::RenderGraph;
pub use pipeline::{LayoutPipeline, layout_tasks};
pub use theme::{Palette, ThemeMode, edge_stroke};
