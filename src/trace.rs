//! C10 — opt-in diagnostic tracing for the parse/translate pipeline.
//!
//! Ordered verbosity levels, same shape as a typical build-tool logger:
//! each level subsumes the ones below it. Tracing never allocates or
//! prints outside `debug_assertions` builds, so it costs nothing in a
//! release binary; callers that want it in release too should build with
//! `debug-assertions = true` in their profile.

use std::fmt::{self, Display, Formatter};

/// A traced event at a given verbosity. `None` never prints; `Verbose`
/// prints at every level including `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceLevel {
    None,
    Default,
    Success,
    Verbose,
}

impl TraceLevel {
    fn enabled(self, threshold: TraceLevel) -> bool {
        threshold != TraceLevel::None && self >= threshold
    }
}

/// A tracer carrying the verbosity threshold the caller configured.
/// `emit` is the only entry point; everything else is convenience.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracer {
    threshold: Option<TraceLevel>,
}

impl Tracer {
    pub fn new(threshold: TraceLevel) -> Self {
        Self { threshold: Some(threshold) }
    }

    /// A tracer that never prints, for call sites that want the API
    /// without the `cfg`-gating at every call site.
    pub fn silent() -> Self {
        Self { threshold: None }
    }

    pub fn emit(&self, level: TraceLevel, stage: &str, event: impl Display) {
        #[cfg(debug_assertions)]
        if let Some(threshold) = self.threshold {
            if level.enabled(threshold) {
                eprintln!("[{}; {:?}]: {}", stage, level, event);
            }
        }
        #[cfg(not(debug_assertions))]
        {
            let _ = (level, stage, event);
        }
    }
}

impl Display for TraceLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering_subsumes_lower_levels() {
        assert!(TraceLevel::Verbose.enabled(TraceLevel::Default));
        assert!(!TraceLevel::Default.enabled(TraceLevel::Verbose));
    }

    #[test]
    fn none_threshold_never_enables() {
        assert!(!TraceLevel::Verbose.enabled(TraceLevel::None));
    }

    #[test]
    fn silent_tracer_has_no_threshold() {
        let tracer = Tracer::silent();
        assert!(tracer.threshold.is_none());
    }
}
