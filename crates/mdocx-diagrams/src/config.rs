//! Rendering configuration shared across strategies.

use std::time::Duration;

use crate::consts::{
    DEFAULT_COMMAND, DEFAULT_HEIGHT_PX, DEFAULT_MAX_CONCURRENT, DEFAULT_SERVICE_URL,
    DEFAULT_TIMEOUT, DEFAULT_WIDTH_PX,
};

/// Identifier of a concrete rendering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// External Mermaid CLI process.
    Local,
    /// Network rendering service (mermaid.ink style API).
    Remote,
}

impl StrategyKind {
    /// Parse a strategy identifier as used in config files and CLI flags.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }

    /// String identifier of this strategy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// Configuration for one conversion.
///
/// Read-only once built; safely shared by reference across concurrent
/// render calls. The core never reads process-wide globals, so concurrent
/// conversions with different configs stay isolated.
#[derive(Debug, Clone)]
pub struct RenderingConfig {
    /// Strategies to attempt, in order. The first success wins.
    pub strategy_order: Vec<StrategyKind>,
    /// Timeout applied to each individual strategy attempt.
    pub per_strategy_timeout: Duration,
    /// Target image width in pixels.
    pub image_width_px: u32,
    /// Target image height in pixels.
    pub image_height_px: u32,
    /// Bound on concurrent render attempts within one document.
    pub max_concurrent_renders: usize,
    /// Deadline for the whole conversion. When it expires, in-flight
    /// attempts are not awaited and unresolved blocks fail with a timeout.
    pub conversion_timeout: Option<Duration>,
    /// Base URL of the remote rendering service.
    pub service_url: String,
    /// Mermaid CLI command for the local strategy.
    pub command: String,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            strategy_order: vec![StrategyKind::Local, StrategyKind::Remote],
            per_strategy_timeout: DEFAULT_TIMEOUT,
            image_width_px: DEFAULT_WIDTH_PX,
            image_height_px: DEFAULT_HEIGHT_PX,
            max_concurrent_renders: DEFAULT_MAX_CONCURRENT,
            conversion_timeout: None,
            service_url: DEFAULT_SERVICE_URL.to_owned(),
            command: DEFAULT_COMMAND.to_owned(),
        }
    }
}
