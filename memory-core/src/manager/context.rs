//! The read-only handle passed to sub-stores instead of a back-reference to
//! the manager (spec §9 design note: cyclic references between the manager
//! and its sub-stores).

use std::sync::Arc;

use tracing::Span;

/// Supplies the externally-measured context-pressure percentage. The
/// manager degrades gracefully to `0%` when no source is configured (spec
/// §5).
pub trait PressureSource: Send + Sync {
    /// Current context-window utilization, in percent, if known.
    fn pressure_percent(&self) -> Option<f32>;
}

/// A pressure source that always reports no pressure, used when no LLM
/// adapter is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPressure;

impl PressureSource for NoPressure {
    fn pressure_percent(&self) -> Option<f32> {
        None
    }
}

/// Small, cloneable handle carrying only what sub-stores need from the
/// manager: the pressure getter and a tracing span for correlated logging.
#[derive(Clone)]
pub struct MemoryContext {
    pressure: Arc<dyn PressureSource>,
    span: Span,
}

impl MemoryContext {
    /// Build a context around a pressure source.
    #[must_use]
    pub fn new(pressure: Arc<dyn PressureSource>) -> Self {
        Self {
            pressure,
            span: Span::current(),
        }
    }

    /// Current pressure, defaulting to `0.0` if unavailable.
    #[must_use]
    pub fn current_pressure(&self) -> f32 {
        self.pressure.pressure_percent().unwrap_or(0.0)
    }

    /// The span sub-stores should log under for correlation.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pressure_degrades_to_zero() {
        let context = MemoryContext::new(Arc::new(NoPressure));
        assert_eq!(context.current_pressure(), 0.0);
    }
}
