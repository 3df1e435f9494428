//! Mermaid diagram rendering with interchangeable strategies.
//!
//! Two strategies exist: a local Mermaid CLI process and a remote
//! mermaid.ink style service. A [`RenderChain`] tries them in configured
//! order per block and degrades failures into structured
//! [`RenderFailure`] values so one broken diagram never loses a document.

mod chain;
mod config;
mod consts;
mod error;
mod local;
mod raster;
mod remote;
mod renderer;
mod svg;

pub use chain::{RenderChain, RenderResult};
pub use config::{RenderingConfig, StrategyKind};
pub use consts::{
    DEFAULT_COMMAND, DEFAULT_HEIGHT_PX, DEFAULT_MAX_CONCURRENT, DEFAULT_SERVICE_URL,
    DEFAULT_TIMEOUT, DEFAULT_WIDTH_PX,
};
pub use error::{FailureReason, RenderFailure};
pub use local::LocalProcessRenderer;
pub use raster::RenderedImage;
pub use remote::RemoteServiceRenderer;
pub use renderer::DiagramRenderer;
pub use svg::rasterize_svg;
