//! The rendering strategy interface.

use crate::config::{RenderingConfig, StrategyKind};
use crate::error::RenderFailure;
use crate::raster::RenderedImage;

/// One concrete way of turning Mermaid source into a raster image.
///
/// Implementations are stateless and safe to invoke repeatedly and
/// concurrently. Each call must respect `config.per_strategy_timeout` and
/// release any external process or socket on every exit path.
pub trait DiagramRenderer: Send + Sync {
    /// Which strategy this renderer implements.
    fn kind(&self) -> StrategyKind;

    /// Render diagram source to a PNG image at the configured dimensions.
    fn render(
        &self,
        source: &str,
        config: &RenderingConfig,
    ) -> Result<RenderedImage, RenderFailure>;
}
