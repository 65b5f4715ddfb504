//! Structured diagnostics.
//!
//! Data problems that must not halt the fleet (bad coordinates, NaN fuel,
//! routes pointing at missing trucks) are reported through a
//! [`DiagnosticSink`] injected into whichever component detects them.  The
//! sink decides where they go: [`TracingSink`] logs them, [`CollectingSink`]
//! keeps them for assertions.

use std::fmt;
use std::sync::Mutex;

/// What kind of degradation happened.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// A node string could not be parsed; `(0,0)` was used instead.
    MalformedCoordinate,
    /// A route was empty or inconsistent and was replaced by a safe default.
    MalformedRoute,
    /// A physical quantity was NaN/infinite/negative and was clamped to 0.
    NumericCorruption,
    /// A record referenced something absent from its own solution.
    StructuralViolation,
    /// A solver fetch failed and will be retried.
    FetchFailure,
    /// A truck delivered more gas than it had on board.
    CargoShortfall,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::MalformedCoordinate => "malformed_coordinate",
            DiagnosticKind::MalformedRoute      => "malformed_route",
            DiagnosticKind::NumericCorruption   => "numeric_corruption",
            DiagnosticKind::StructuralViolation => "structural_violation",
            DiagnosticKind::FetchFailure        => "fetch_failure",
            DiagnosticKind::CargoShortfall      => "cargo_shortfall",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported degradation.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub kind:    DiagnosticKind,
    /// The offending value or entity (raw node text, truck code, …).
    pub subject: String,
    pub detail:  String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { kind, subject: subject.into(), detail: detail.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.detail)
    }
}

/// Receiver for diagnostics.  Must be shareable across the runner's tasks.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Forwards every diagnostic to `tracing` at `warn` level
/// (structural violations at `error`).
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, d: Diagnostic) {
        match d.kind {
            DiagnosticKind::StructuralViolation => tracing::error!(
                kind = %d.kind, subject = %d.subject, "{}", d.detail
            ),
            _ => tracing::warn!(kind = %d.kind, subject = %d.subject, "{}", d.detail),
        }
    }
}

/// Keeps every diagnostic in memory.  Intended for tests and for surfacing
/// a per-tick problem list to an operator view.
#[derive(Debug, Default)]
pub struct CollectingSink {
    inner: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything collected so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        match self.inner.lock() {
            Ok(mut v) => std::mem::take(&mut *v),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of collected diagnostics of `kind`.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.inner
            .lock()
            .map(|v| v.iter().filter(|d| d.kind == kind).count())
            .unwrap_or(0)
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match self.inner.lock() {
            Ok(mut v) => v.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
