//! Error types for the engine. Per spec §7, the nine unknown-resolution
//! categories are NOT modeled as Rust errors — they are conservative,
//! non-aborting facts recorded in `UnknownTracker` (see `pta-core::state`).
//! `AnalysisError` is reserved for what spec §7 calls fatal errors:
//! "programmer misuse detectable at configuration time", reported at
//! construction, never during solving.

use std::fmt;
use thiserror::Error;

use crate::domain::Site;

/// Kinds of fatal, construction-time failure.
#[derive(Debug, Error)]
pub enum AnalysisErrorKind {
    #[error("unknown context policy")]
    UnknownContextPolicy(String),

    #[error("invalid context depth")]
    InvalidContextDepth(String),

    #[error("missing translator")]
    MissingTranslator,

    #[error("missing context selector")]
    MissingContextSelector,

    #[error("internal error")]
    Internal(String),
}

/// A context-aware engine error: a kind, an optional source location, and
/// accumulated context strings describing how the failure was reached.
#[derive(Debug, Error)]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub location: Option<Site>,
    pub context: Vec<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind) -> Self {
        Self {
            kind,
            location: None,
            context: Vec::new(),
            source: None,
        }
    }

    pub fn with_location(mut self, location: Site) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}:{}:{}", loc.file, loc.line, loc.column)?;
        }
        if !self.context.is_empty() {
            write!(f, "\n\nContext:")?;
            for (i, ctx) in self.context.iter().enumerate() {
                write!(f, "\n  {}. {}", i + 1, ctx)?;
            }
        }
        Ok(())
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Extension trait for adding context to a `Result` as it propagates.
pub trait ResultExt<T> {
    fn with_context(self, ctx: impl Into<String>) -> AnalysisResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AnalysisError>,
{
    fn with_context(self, ctx: impl Into<String>) -> AnalysisResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }
}

impl From<AnalysisErrorKind> for AnalysisError {
    fn from(kind: AnalysisErrorKind) -> Self {
        AnalysisError::new(kind)
    }
}

#[macro_export]
macro_rules! analysis_error {
    ($kind:expr) => {
        $crate::error::AnalysisError::new($kind)
    };
    ($kind:expr, $($ctx:expr),+) => {{
        let mut err = $crate::error::AnalysisError::new($kind);
        $(
            err = err.with_context($ctx);
        )+
        err
    }};
}

#[macro_export]
macro_rules! analysis_bail {
    ($kind:expr) => {
        return Err($crate::analysis_error!($kind))
    };
    ($kind:expr, $($ctx:expr),+) => {
        return Err($crate::analysis_error!($kind, $($ctx),+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_creation_has_no_location_or_context() {
        let err = AnalysisError::new(AnalysisErrorKind::UnknownContextPolicy("foo".into()));
        assert!(matches!(err.kind, AnalysisErrorKind::UnknownContextPolicy(_)));
        assert!(err.location.is_none());
        assert!(err.context.is_empty());
    }

    #[test]
    fn error_with_location() {
        let loc = Site::new("mod.py", 10, 5);
        let err = AnalysisError::new(AnalysisErrorKind::MissingTranslator)
            .with_location(loc.clone());
        assert_eq!(err.location, Some(loc));
    }

    #[test]
    fn error_with_context_accumulates() {
        let err = AnalysisError::new(AnalysisErrorKind::Internal("boom".into()))
            .with_context("while analyzing 'f'")
            .with_context("during module composition");
        assert_eq!(err.context.len(), 2);
        assert_eq!(err.context[0], "while analyzing 'f'");
    }

    #[test]
    fn error_display_includes_location_and_context() {
        let loc = Site::new("example.py", 25, 10);
        let err = AnalysisError::new(AnalysisErrorKind::InvalidContextDepth("k=-1".into()))
            .with_location(loc)
            .with_context("in function 'my_func'");
        let display = format!("{}", err);
        assert!(display.contains("invalid context depth"));
        assert!(display.contains("example.py:25:10"));
        assert!(display.contains("in function 'my_func'"));
    }

    #[test]
    fn analysis_error_macro_builds_context() {
        let err1 = analysis_error!(AnalysisErrorKind::MissingTranslator);
        assert!(matches!(err1.kind, AnalysisErrorKind::MissingTranslator));

        let err2 = analysis_error!(
            AnalysisErrorKind::Internal("x".into()),
            "context 1",
            "context 2"
        );
        assert_eq!(err2.context.len(), 2);
    }
}
