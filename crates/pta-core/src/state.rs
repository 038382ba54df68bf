//! The mutable knowledge base: points-to maps, field maps, function/class
//! registries, the live-context set, call-graph edges, and the
//! unknown-resolution tracker (spec §3 State, §7 Error Handling Design).

use std::collections::HashMap;

use indexmap::IndexSet;
use petgraph::graph::{DiGraph, NodeIndex};
use pta_hir::constraint::{Constraint, ConstraintKind};
use pta_hir::domain::{AbstractObject, Context, Field, PointsToSet, Site, Variable};
use pta_hir::ir::{IrClass, IrFunction};
use pta_hir::AnalysisConfig;
use tracing::{debug, warn};

/// The nine categories of resolution failure, spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum UnknownKind {
    CalleeEmpty,
    CalleeNonCallable,
    FunctionNotInRegistry,
    MissingDependencies,
    DynamicAttribute,
    FieldLoadEmpty,
    ImportNotFound,
    AllocContextFailure,
    TranslationError,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UnknownRecord {
    pub kind: UnknownKind,
    pub site: Site,
    pub message: String,
}

/// Bookkeeping for resolution failures. Never aborts the solver; always
/// produces a conservative continuation (spec §7).
#[derive(Debug, Default)]
pub struct UnknownTracker {
    counts: HashMap<UnknownKind, usize>,
    details: Vec<UnknownRecord>,
    track_unknowns: bool,
    log_unknown_details: bool,
    verbose: bool,
}

impl UnknownTracker {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            counts: HashMap::new(),
            details: Vec::new(),
            track_unknowns: config.track_unknowns,
            log_unknown_details: config.log_unknown_details,
            verbose: config.verbose,
        }
    }

    pub fn record(&mut self, kind: UnknownKind, site: Site, message: impl Into<String>) {
        if !self.track_unknowns {
            return;
        }
        *self.counts.entry(kind).or_insert(0) += 1;
        let message = message.into();
        let should_detail = self.log_unknown_details
            || (kind == UnknownKind::FieldLoadEmpty && self.verbose);
        if should_detail {
            warn!(?kind, %site.file, site.line, %message, "unknown recorded");
            self.details.push(UnknownRecord {
                kind,
                site,
                message,
            });
        }
    }

    pub fn count(&self, kind: UnknownKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn details(&self) -> &[UnknownRecord] {
        &self.details
    }

    /// Testable property from spec §8: "detailed records count equals
    /// total_unknowns when tracking is enabled" -- only holds when every
    /// recorded unknown is also detailed, i.e. `log_unknown_details` is on.
    pub fn accounting_is_consistent(&self) -> bool {
        if !self.track_unknowns {
            return self.total() == 0 && self.details.is_empty();
        }
        if self.log_unknown_details {
            return self.details.len() == self.total();
        }
        true
    }
}

/// A node in the context-sensitive call graph: a function/method scope
/// paired with the context it was analyzed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallGraphNode {
    pub scope: String,
    pub context: Context,
}

#[derive(Debug, Clone)]
pub struct CallGraphEdge {
    pub site: Site,
}

/// Unique id of a registered constraint; used to index which constraints
/// must be re-evaluated when a given variable or field grows.
pub type ConstraintId = usize;

#[derive(Default)]
pub struct AnalysisState {
    pub config: AnalysisConfig,
    var_pts: HashMap<Variable, PointsToSet>,
    field_pts: HashMap<Field, PointsToSet>,
    constraints: Vec<Constraint>,
    /// Constraints to re-evaluate when this variable's pts grows: Copy
    /// (source), Load (base), Store (base and value), Call (callee).
    reads_var: HashMap<Variable, Vec<ConstraintId>>,
    /// Load constraints to re-evaluate when this concrete field grows.
    /// Populated lazily the first time a Load observes a concrete base
    /// object (spec §4.2: "achieved by indexing Loads by base object and
    /// selector").
    reads_field: HashMap<Field, Vec<ConstraintId>>,
    pub functions: HashMap<String, IrFunction>,
    pub classes: HashMap<String, IrClass>,
    /// The `CLASS` abstract object each registered class allocated to, keyed
    /// by class id. Populated at `DefClass` translation time, consulted by
    /// the solver's MRO-based attribute resolution (spec §4.5).
    pub class_objects: HashMap<String, AbstractObject>,
    live_contexts: IndexSet<Context>,
    call_graph: DiGraph<CallGraphNode, CallGraphEdge>,
    call_graph_nodes: HashMap<CallGraphNode, NodeIndex>,
    /// Memoizes translator invocations: the same `(function, context)` is
    /// translated at most once (spec §4.6, §5 "no unbounded recursion").
    pub translated: IndexSet<(String, Context)>,
    pub unknowns: UnknownTracker,
}

impl AnalysisState {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            unknowns: UnknownTracker::new(&config),
            config,
            ..Default::default()
        }
    }

    pub fn register_context(&mut self, ctx: Context) {
        self.live_contexts.insert(ctx);
    }

    pub fn live_context_count(&self) -> usize {
        self.live_contexts.len()
    }

    pub fn live_contexts(&self) -> impl Iterator<Item = &Context> {
        self.live_contexts.iter()
    }

    pub fn pts(&self, var: &Variable) -> PointsToSet {
        self.var_pts.get(var).cloned().unwrap_or_default()
    }

    pub fn field_pts(&self, field: &Field) -> PointsToSet {
        self.field_pts.get(field).cloned().unwrap_or_default()
    }

    pub fn variable_count(&self) -> usize {
        self.var_pts.len()
    }

    pub fn object_count(&self) -> usize {
        self.var_pts
            .values()
            .flat_map(|s| s.iter())
            .chain(self.field_pts.values().flat_map(|s| s.iter()))
            .collect::<std::collections::HashSet<_>>()
            .len()
    }

    /// Adds an object to a variable's points-to set; returns `true` if it
    /// grew (the caller should enqueue the variable as dirty).
    pub fn insert_var(&mut self, var: &Variable, obj: AbstractObject) -> bool {
        self.var_pts.entry(var.clone()).or_default().insert(obj)
    }

    pub fn insert_field(&mut self, field: &Field, obj: AbstractObject) -> bool {
        self.field_pts.entry(field.clone()).or_default().insert(obj)
    }

    pub fn union_var(&mut self, target: &Variable, addition: &PointsToSet) -> bool {
        self.var_pts.entry(target.clone()).or_default().union_from(addition)
    }

    pub fn union_field(&mut self, field: &Field, addition: &PointsToSet) -> bool {
        self.field_pts.entry(field.clone()).or_default().union_from(addition)
    }

    /// Appends a constraint and indexes it by the variable(s) whose growth
    /// should re-trigger its evaluation. Returns the id assigned.
    pub fn add_constraint(&mut self, c: Constraint) -> ConstraintId {
        let id = self.constraints.len();
        match &c.kind {
            ConstraintKind::Copy { source, .. } => {
                self.reads_var.entry(source.clone()).or_default().push(id);
            }
            ConstraintKind::Load { base, .. } => {
                self.reads_var.entry(base.clone()).or_default().push(id);
            }
            ConstraintKind::Store { base, value, .. } => {
                self.reads_var.entry(base.clone()).or_default().push(id);
                self.reads_var.entry(value.clone()).or_default().push(id);
            }
            ConstraintKind::Call { callee, .. } => {
                self.reads_var.entry(callee.clone()).or_default().push(id);
            }
            ConstraintKind::Alloc { .. } | ConstraintKind::Return { .. } | ConstraintKind::Import { .. } => {}
        }
        debug!(id, kind = ?discriminant_name(&c.kind), "constraint registered");
        self.constraints.push(c);
        id
    }

    pub fn constraint(&self, id: ConstraintId) -> &Constraint {
        &self.constraints[id]
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints_reading_var(&self, var: &Variable) -> Vec<ConstraintId> {
        self.reads_var.get(var).cloned().unwrap_or_default()
    }

    pub fn constraints_reading_field(&self, field: &Field) -> Vec<ConstraintId> {
        self.reads_field.get(field).cloned().unwrap_or_default()
    }

    /// Registers a Load constraint against a concrete field so a later
    /// Store can re-trigger it directly (spec §4.2 edge case).
    pub fn subscribe_field(&mut self, field: Field, constraint_id: ConstraintId) {
        let entry = self.reads_field.entry(field).or_default();
        if !entry.contains(&constraint_id) {
            entry.push(constraint_id);
        }
    }

    pub fn call_graph_node(&mut self, node: CallGraphNode) -> NodeIndex {
        if let Some(idx) = self.call_graph_nodes.get(&node) {
            return *idx;
        }
        let idx = self.call_graph.add_node(node.clone());
        self.call_graph_nodes.insert(node, idx);
        idx
    }

    /// Records a call-graph edge; monotone (duplicates are harmless, the
    /// graph simply gains a parallel edge which callers can dedup on read).
    pub fn add_call_edge(&mut self, caller: CallGraphNode, callee: CallGraphNode, site: Site) {
        let from = self.call_graph_node(caller);
        let to = self.call_graph_node(callee);
        self.call_graph.add_edge(from, to, CallGraphEdge { site });
    }

    pub fn call_graph(&self) -> &DiGraph<CallGraphNode, CallGraphEdge> {
        &self.call_graph
    }

    pub fn register_class_object(&mut self, class_id: impl Into<String>, obj: AbstractObject) {
        self.class_objects.insert(class_id.into(), obj);
    }

    pub fn class_object(&self, class_id: &str) -> Option<&AbstractObject> {
        self.class_objects.get(class_id)
    }

    pub fn resolved_callees(&self, scope: &str, context: &Context) -> Vec<(CallGraphNode, Site)> {
        let node = CallGraphNode {
            scope: scope.to_string(),
            context: context.clone(),
        };
        let Some(&idx) = self.call_graph_nodes.get(&node) else {
            return Vec::new();
        };
        self.call_graph
            .edges(idx)
            .map(|e| (self.call_graph[e.target()].clone(), e.weight().site.clone()))
            .collect()
    }
}

fn discriminant_name(kind: &ConstraintKind) -> &'static str {
    match kind {
        ConstraintKind::Alloc { .. } => "Alloc",
        ConstraintKind::Copy { .. } => "Copy",
        ConstraintKind::Load { .. } => "Load",
        ConstraintKind::Store { .. } => "Store",
        ConstraintKind::Call { .. } => "Call",
        ConstraintKind::Return { .. } => "Return",
        ConstraintKind::Import { .. } => "Import",
    }
}
