//! Fallback orchestration across rendering strategies.

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;

use mdocx_segment::{Block, BlockKind};

use crate::config::{RenderingConfig, StrategyKind};
use crate::error::RenderFailure;
use crate::local::LocalProcessRenderer;
use crate::raster::RenderedImage;
use crate::remote::RemoteServiceRenderer;
use crate::renderer::DiagramRenderer;

/// Exactly one render result exists per diagram block in the final assembly.
pub type RenderResult = Result<RenderedImage, RenderFailure>;

/// A prioritized chain of rendering strategies.
///
/// Strategies are attempted in order; the first success short-circuits the
/// chain. When every strategy fails, the *last* failure is reported so the
/// user sees the terminal cause rather than an early, possibly less
/// informative one. The chain owns no long-lived state; every call is
/// independent and may run concurrently with calls for other blocks.
pub struct RenderChain {
    strategies: Vec<Box<dyn DiagramRenderer>>,
}

impl RenderChain {
    /// Build the chain named by `config.strategy_order`.
    #[must_use]
    pub fn from_config(config: &RenderingConfig) -> Self {
        let strategies = config
            .strategy_order
            .iter()
            .map(|kind| -> Box<dyn DiagramRenderer> {
                match kind {
                    StrategyKind::Local => Box::new(LocalProcessRenderer),
                    StrategyKind::Remote => Box::new(RemoteServiceRenderer),
                }
            })
            .collect();
        Self { strategies }
    }

    /// Build a chain from explicit strategies. Used by tests and callers
    /// that bring their own renderer implementations.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn DiagramRenderer>>) -> Self {
        Self { strategies }
    }

    /// Resolve a single diagram block through the fallback chain.
    pub fn resolve(&self, block: &Block, config: &RenderingConfig) -> RenderResult {
        self.resolve_with_deadline(block, config, None)
    }

    /// Resolve every diagram block of a document concurrently.
    ///
    /// Rendering runs on a dedicated thread pool bounded by
    /// `max_concurrent_renders` so a diagram-heavy document cannot exhaust
    /// external process or network capacity. Results are keyed by ordinal,
    /// which makes assembly order independent of render completion order.
    #[must_use]
    pub fn resolve_all(
        &self,
        blocks: &[Block],
        config: &RenderingConfig,
    ) -> BTreeMap<usize, RenderResult> {
        let diagrams: Vec<&Block> = blocks.iter().filter(|b| b.is_diagram()).collect();
        if diagrams.is_empty() {
            return BTreeMap::new();
        }

        let deadline = config.conversion_timeout.map(|t| Instant::now() + t);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrent_renders.max(1))
            .build();
        match pool {
            Ok(pool) => pool.install(|| {
                diagrams
                    .par_iter()
                    .map(|block| {
                        (
                            block.ordinal,
                            self.resolve_with_deadline(block, config, deadline),
                        )
                    })
                    .collect()
            }),
            Err(e) => {
                // Pool creation failing is unusual; render sequentially
                // rather than losing the document.
                tracing::warn!(error = %e, "render pool unavailable, falling back to sequential rendering");
                diagrams
                    .iter()
                    .map(|block| {
                        (
                            block.ordinal,
                            self.resolve_with_deadline(block, config, deadline),
                        )
                    })
                    .collect()
            }
        }
    }

    fn resolve_with_deadline(
        &self,
        block: &Block,
        config: &RenderingConfig,
        deadline: Option<Instant>,
    ) -> RenderResult {
        let BlockKind::Diagram {
            source,
            terminated,
            syntax,
        } = &block.kind
        else {
            debug_assert!(false, "resolve called with a prose block");
            return Err(RenderFailure::process("not a diagram block"));
        };

        if !terminated {
            return Err(RenderFailure::decode(
                "diagram fence was never closed before end of input",
            ));
        }

        let mut last_failure: Option<RenderFailure> = None;
        for strategy in &self.strategies {
            let effective = match remaining_budget(deadline) {
                Budget::Unbounded => None,
                Budget::Expired => {
                    tracing::warn!(
                        ordinal = block.ordinal,
                        "conversion deadline expired before all strategies ran"
                    );
                    // Keep an earlier strategy's concrete failure over a
                    // generic expiry diagnostic.
                    if last_failure.is_none() {
                        last_failure = Some(RenderFailure::timeout("conversion deadline expired"));
                    }
                    break;
                }
                Budget::Remaining(remaining) => Some(RenderingConfig {
                    per_strategy_timeout: config.per_strategy_timeout.min(remaining),
                    ..config.clone()
                }),
            };
            let effective = effective.as_ref().unwrap_or(config);

            tracing::debug!(
                strategy = strategy.kind().as_str(),
                ordinal = block.ordinal,
                syntax = syntax.as_str(),
                "render attempt"
            );
            match strategy.render(source, effective) {
                Ok(image) => return Ok(image),
                Err(failure) => {
                    tracing::warn!(
                        strategy = strategy.kind().as_str(),
                        ordinal = block.ordinal,
                        %failure,
                        "render attempt failed"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        Err(last_failure
            .unwrap_or_else(|| RenderFailure::process("no rendering strategy configured")))
    }
}

enum Budget {
    Unbounded,
    Expired,
    Remaining(std::time::Duration),
}

fn remaining_budget(deadline: Option<Instant>) -> Budget {
    match deadline {
        None => Budget::Unbounded,
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                Budget::Expired
            } else {
                Budget::Remaining(remaining)
            }
        }
    }
}
