//! Internal constants for diagram rendering.

use std::time::Duration;

/// Default per-strategy timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default rendered image width in pixels.
pub const DEFAULT_WIDTH_PX: u32 = 1200;

/// Default rendered image height in pixels.
pub const DEFAULT_HEIGHT_PX: u32 = 800;

/// Default bound on concurrent render attempts per document.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default remote rendering service.
pub const DEFAULT_SERVICE_URL: &str = "https://mermaid.ink";

/// Default Mermaid CLI command.
pub const DEFAULT_COMMAND: &str = "mmdc";
