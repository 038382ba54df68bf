//! Read-only query façade over a finished `AnalysisState` (SPEC_FULL §2:
//! "a query façade wrapping the raw maps"). Grounded on the teacher's
//! `AnalysisResult`/`ModuleMetrics` pattern (`depyler-analyzer/src/lib.rs`):
//! a plain serializable summary struct plus a handful of narrow accessor
//! methods, rather than exposing the mutable solver internals directly.

use serde::Serialize;

use pta_hir::domain::{AbstractObject, Context, Field, PointsToSet, Variable};

use crate::solver::Solver;
use crate::state::{CallGraphNode, UnknownKind};

/// Aggregate counters over a finished analysis; cheap to compute, safe to
/// serialize for a CLI `--stats` flag or a snapshot test.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub variable_count: usize,
    pub object_count: usize,
    pub live_context_count: usize,
    pub function_count: usize,
    pub class_count: usize,
    pub total_unknowns: usize,
    pub unknowns_by_kind: Vec<(UnknownKind, usize)>,
}

/// A narrow view over a `Solver`'s state. Takes `&mut Solver` rather than
/// `&Solver` solely because `mro` goes through `ClassHierarchy`'s cache,
/// which recomputes lazily on first access; every method here is read-only
/// in effect, just not in borrow-checker terms.
pub struct Query<'a> {
    solver: &'a mut Solver,
}

impl<'a> Query<'a> {
    pub fn new(solver: &'a mut Solver) -> Self {
        Self { solver }
    }

    pub fn points_to(&self, var: &Variable) -> PointsToSet {
        self.solver.state.pts(var)
    }

    pub fn field_points_to(&self, field: &Field) -> PointsToSet {
        self.solver.state.field_pts(field)
    }

    /// The functions/contexts a given `(scope, context)` call site resolved
    /// to, with the call-site `Site` that produced each edge (spec §4.4
    /// "query the final call graph").
    pub fn resolved_callees(&self, scope: &str, context: &Context) -> Vec<(CallGraphNode, pta_hir::domain::Site)> {
        self.solver.state.resolved_callees(scope, context)
    }

    pub fn class_object(&self, class_id: &str) -> Option<&AbstractObject> {
        self.solver.state.class_object(class_id)
    }

    pub fn mro(&mut self, class_id: &str) -> Vec<String> {
        self.solver.hierarchy.mro(class_id).to_vec()
    }

    pub fn stats(&self) -> EngineStats {
        let kinds = [
            UnknownKind::CalleeEmpty,
            UnknownKind::CalleeNonCallable,
            UnknownKind::FunctionNotInRegistry,
            UnknownKind::MissingDependencies,
            UnknownKind::DynamicAttribute,
            UnknownKind::FieldLoadEmpty,
            UnknownKind::ImportNotFound,
            UnknownKind::AllocContextFailure,
            UnknownKind::TranslationError,
        ];
        let unknowns_by_kind = kinds
            .iter()
            .map(|k| (*k, self.solver.state.unknowns.count(*k)))
            .collect();
        EngineStats {
            variable_count: self.solver.state.variable_count(),
            object_count: self.solver.state.object_count(),
            live_context_count: self.solver.state.live_context_count(),
            function_count: self.solver.state.functions.len(),
            class_count: self.solver.state.classes.len(),
            total_unknowns: self.solver.state.unknowns.total(),
            unknowns_by_kind,
        }
    }

    /// A JSON-serializable snapshot of the engine's aggregate stats, for a
    /// CLI `--export-summary` flag or a golden-file regression test.
    pub fn export_summary(&self) -> serde_json::Value {
        serde_json::to_value(self.stats()).unwrap_or(serde_json::Value::Null)
    }
}
