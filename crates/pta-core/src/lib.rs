//! Constraint-based k-CFA solver: call resolution, context selection, MRO,
//! built-in summaries. Consumes the `pta-hir` types; produces a fixpoint
//! `AnalysisState` queryable through `query::Query`.

pub mod builtins;
pub mod context_selector;
pub mod hierarchy;
pub mod query;
pub mod solver;
pub mod state;
pub mod translate;

pub use query::{EngineStats, Query};
pub use solver::Solver;
pub use state::{AnalysisState, UnknownKind, UnknownRecord, UnknownTracker};
