//! Module dependency graph and cross-module summary composition (spec
//! §4.8). Architecturally grounded on the teacher's `depyler-graph` crate
//! (dependency declarations `petgraph`/`thiserror`/`tracing`, stated purpose
//! "dependency graph analysis... for error reasoning"); its own `src/` was
//! not retained in this snapshot, so the shape here — a graph over module
//! names plus a composition pass — follows `pta-core::solver`'s house style
//! rather than literal teacher code.

use std::collections::{HashMap, HashSet};

use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

use pta_core::builtins::BuiltinTable;
use pta_core::solver::{module_alloc, Solver};
use pta_core::state::UnknownKind;
use pta_hir::domain::{AbstractObject, AllocSite, Context, Field, PointsToSet, ScopeId, Selector, Variable};
use pta_hir::ir::{IrModule, Stmt};
use tracing::warn;

/// An immutable, serializable snapshot of what a module exports (spec §4.8
/// point 3: "summaries made immutable before publication"). Built once per
/// re-export round and handed to importers read-only; never mutated after
/// `Composer::compose` returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleSummary {
    /// Each exported top-level binding's points-to set, with every object's
    /// context stripped to `Context::Empty` -- a summary outlives any one
    /// calling context, so it can't carry context-specific heap clones.
    pub exports: HashMap<String, PointsToSet>,
    /// Allocation sites reachable from an export, deduplicated across all of
    /// them; lets an importer reason about what a module can hand out
    /// without re-walking its body.
    pub escaping_allocs: HashSet<AllocSite>,
    /// `(class_id, base-name tuple)` for every class the module defines,
    /// including nested ones, so an importer's MRO computation doesn't
    /// depend on re-translating the defining module.
    pub class_registrations: Vec<(String, Vec<String>)>,
    /// Names of builtins the module's body actually calls, for a whole-
    /// program run that wants to know which builtin summaries matter
    /// without re-scanning every module's statements.
    pub builtin_augmentations: HashSet<String>,
}

fn strip_context(objects: &[AbstractObject]) -> PointsToSet {
    objects
        .iter()
        .map(|o| AbstractObject::new(o.alloc.clone(), Context::Empty))
        .collect()
}

fn collect_class_registrations(stmts: &[Stmt], out: &mut Vec<(String, Vec<String>)>) {
    for stmt in stmts {
        match stmt {
            Stmt::DefClass { class, .. } => {
                out.push((class.name.clone(), class.bases.clone()));
                collect_class_registrations(&class.body, out);
            }
            Stmt::DefFunction { func, .. } => collect_class_registrations(&func.body, out),
            _ => {}
        }
    }
}

fn collect_builtin_calls(stmts: &[Stmt], table: &BuiltinTable, out: &mut HashSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Call { callee, .. } => {
                if let Some(name) = callee.as_var() {
                    if table.is_builtin(name) {
                        out.insert(name.to_string());
                    }
                }
            }
            Stmt::DefFunction { func, .. } => collect_builtin_calls(&func.body, table, out),
            Stmt::DefClass { class, .. } => collect_builtin_calls(&class.body, table, out),
            _ => {}
        }
    }
}

/// Direct-import edges between modules, derived by walking every `Import`/
/// `ImportFrom` statement reachable in a module's body (including inside
/// nested function/class bodies).
#[derive(Debug, Default)]
pub struct ModuleGraph {
    deps: HashMap<String, Vec<String>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: &IrModule) {
        let mut imports = Vec::new();
        collect_imports(&module.body, &mut imports);
        self.deps.insert(module.name.clone(), imports);
    }

    pub fn direct_imports(&self, module: &str) -> &[String] {
        self.deps.get(module).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A dependency-first ordering: `B` appears before `A` if `A` imports
    /// `B`. Cycles are broken arbitrarily (the first module revisited while
    /// still on the current DFS stack is treated as having no further
    /// unvisited dependencies), matching spec §4.8's requirement that
    /// composition terminate even under import cycles.
    pub fn topo_order(&self) -> Vec<String> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut names: Vec<&String> = self.deps.keys().collect();
        names.sort();
        for name in names {
            self.visit(name, &mut done, &mut on_stack, &mut order);
        }
        order
    }

    fn visit(&self, name: &str, done: &mut HashSet<String>, on_stack: &mut HashSet<String>, order: &mut Vec<String>) {
        if done.contains(name) || on_stack.contains(name) {
            return;
        }
        on_stack.insert(name.to_string());
        for dep in self.direct_imports(name) {
            self.visit(dep, done, on_stack, order);
        }
        on_stack.remove(name);
        done.insert(name.to_string());
        order.push(name.to_string());
    }

    /// Builds a `petgraph` view for callers that want to inspect or render
    /// the import graph directly (e.g. a CLI `--dump-module-graph`).
    pub fn as_digraph(&self) -> DiGraph<String, ()> {
        let mut g = DiGraph::new();
        let mut idx = HashMap::new();
        for name in self.deps.keys() {
            idx.insert(name.clone(), g.add_node(name.clone()));
        }
        for (name, deps) in &self.deps {
            let &from = idx.get(name).unwrap();
            for dep in deps {
                let to = *idx.entry(dep.clone()).or_insert_with(|| g.add_node(dep.clone()));
                g.add_edge(from, to, ());
            }
        }
        g
    }
}

fn collect_imports(stmts: &[Stmt], out: &mut Vec<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Import { module, .. } | Stmt::ImportFrom { module, .. } => out.push(module.clone()),
            Stmt::DefFunction { func, .. } => collect_imports(&func.body, out),
            Stmt::DefClass { class, .. } => collect_imports(&class.body, out),
            _ => {}
        }
    }
}

/// Every name a module's top-level body binds, used to decide what gets
/// mirrored onto the module's `MODULE` object (spec §4.8: "the importer's
/// variable is bound... to the exported points-to set").
fn top_level_bindings(module: &IrModule) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in &module.body {
        match stmt {
            Stmt::Copy { target, .. }
            | Stmt::DefFunction { binding: target, .. }
            | Stmt::DefClass { binding: target, .. }
            | Stmt::Import { target, .. }
            | Stmt::ImportFrom { target, .. } => names.push(target.clone()),
            _ => {}
        }
    }
    names
}

/// Drives whole-program composition across a set of registered modules:
/// analyzes each exactly once (memoized the same way lazy function
/// translation is, via `AnalysisState::translated`), in dependency order
/// where acyclic, then runs a bounded number of re-export passes so mutually
/// importing modules still converge (spec §4.8, §5 "no unbounded
/// recursion").
pub struct Composer<'a> {
    graph: ModuleGraph,
    modules: HashMap<String, &'a IrModule>,
    summaries: HashMap<String, ModuleSummary>,
    max_import_depth: u32,
}

impl<'a> Composer<'a> {
    pub fn new(max_import_depth: u32) -> Self {
        Self {
            graph: ModuleGraph::new(),
            modules: HashMap::new(),
            summaries: HashMap::new(),
            max_import_depth,
        }
    }

    pub fn register_module(&mut self, module: &'a IrModule) {
        self.graph.register(module);
        self.modules.insert(module.name.clone(), module);
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// The most recently published summary for `name`, if it has been
    /// composed at least once.
    pub fn summary(&self, name: &str) -> Option<&ModuleSummary> {
        self.summaries.get(name)
    }

    pub fn summaries(&self) -> &HashMap<String, ModuleSummary> {
        &self.summaries
    }

    pub fn compose(&mut self, solver: &mut Solver) {
        let order = self.graph.topo_order();
        self.check_depth(solver, &order);

        for name in &order {
            self.analyze_module(solver, name);
        }

        // Cyclic import groups: one module's exports may only become
        // visible after a module later in `order` (its own importer) runs.
        // Re-export repeatedly until nothing grows, bounded by module count
        // so a pathological cycle can't loop forever. The summary published
        // for each module is whatever the final round produced.
        let rounds = self.modules.len().max(1);
        for _ in 0..rounds {
            let mut any_grew = false;
            let mut round_summaries = HashMap::new();
            for name in &order {
                let (grew, summary) = self.export_module(solver, name);
                if grew {
                    any_grew = true;
                }
                round_summaries.insert(name.clone(), summary);
            }
            self.summaries = round_summaries;
            if !any_grew {
                break;
            }
        }
    }

    fn check_depth(&self, solver: &mut Solver, order: &[String]) {
        for name in order {
            let depth = self.import_chain_depth(name, &mut HashSet::new());
            if depth > self.max_import_depth {
                warn!(module = name, depth, "import chain exceeds configured depth budget");
                solver.state.unknowns.record(
                    UnknownKind::ImportNotFound,
                    pta_hir::domain::Site::new(name.clone(), 0, 0),
                    format!("import chain for `{name}` exceeds max_import_depth ({})", self.max_import_depth),
                );
            }
        }
    }

    fn import_chain_depth(&self, name: &str, seen: &mut HashSet<String>) -> u32 {
        if !seen.insert(name.to_string()) {
            return 0; // cycle: don't double-count
        }
        self.graph
            .direct_imports(name)
            .iter()
            .map(|dep| 1 + self.import_chain_depth(dep, seen))
            .max()
            .unwrap_or(0)
    }

    fn analyze_module(&self, solver: &mut Solver, name: &str) {
        let Some(module) = self.modules.get(name) else {
            solver.state.unknowns.record(
                UnknownKind::ImportNotFound,
                pta_hir::domain::Site::new(name.to_string(), 0, 0),
                format!("module `{name}` not found among registered modules"),
            );
            return;
        };
        let key = (name.to_string(), Context::Empty);
        if solver.state.translated.contains(&key) {
            return;
        }
        solver.state.translated.insert(key);
        solver.run(module);
    }

    /// Mirrors every top-level binding `name` has produced so far onto its
    /// `MODULE` object's attributes, and builds the read-only `ModuleSummary`
    /// for this round. Returns whether the live module object's fields grew.
    fn export_module(&self, solver: &mut Solver, name: &str) -> (bool, ModuleSummary) {
        let Some(module) = self.modules.get(name) else {
            return (false, ModuleSummary::default());
        };
        let scope = ScopeId::Module(name.to_string());
        let module_obj = AbstractObject::new(module_alloc(name), Context::Empty);
        let mut grew = false;
        let mut summary = ModuleSummary::default();
        for binding in top_level_bindings(module) {
            let var = Variable::new(scope.clone(), binding.clone(), Context::Empty);
            let pts = solver.state.pts(&var);
            if pts.is_empty() {
                continue;
            }
            let field = Field::new(module_obj.clone(), Selector::Attr(binding.clone()));
            let objects: Vec<AbstractObject> = pts.iter().cloned().collect();
            if solver.seed_field(field, objects.clone()) {
                grew = true;
            }
            let stripped = strip_context(&objects);
            summary.escaping_allocs.extend(stripped.iter().map(|o| o.alloc.clone()));
            summary.exports.insert(binding, stripped);
        }
        collect_class_registrations(&module.body, &mut summary.class_registrations);
        let builtins = BuiltinTable::new();
        collect_builtin_calls(&module.body, &builtins, &mut summary.builtin_augmentations);
        (grew, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pta_core::state::AnalysisState;
    use pta_hir::domain::Site as DomainSite;
    use pta_hir::ir::Expr;
    use pta_hir::AnalysisConfig;

    fn site(line: u32) -> DomainSite {
        DomainSite::new("m.py", line, 0)
    }

    fn module_with_import(name: &str, imports: &[&str], body_tail: Vec<Stmt>) -> IrModule {
        let mut body: Vec<Stmt> = imports
            .iter()
            .enumerate()
            .map(|(i, m)| Stmt::Import {
                target: format!("mod{i}"),
                module: m.to_string(),
                site: site(1),
            })
            .collect();
        body.extend(body_tail);
        IrModule {
            name: name.to_string(),
            functions: vec![],
            classes: vec![],
            body,
        }
    }

    #[test]
    fn graph_orders_dependencies_before_dependents() {
        let a = module_with_import("a", &[], vec![]);
        let b = module_with_import("b", &["a"], vec![]);
        let mut graph = ModuleGraph::new();
        graph.register(&a);
        graph.register(&b);
        let order = graph.topo_order();
        let pos_a = order.iter().position(|x| x == "a").unwrap();
        let pos_b = order.iter().position(|x| x == "b").unwrap();
        assert!(pos_a < pos_b);
    }

    #[test]
    fn graph_tolerates_import_cycles() {
        let a = module_with_import("a", &["b"], vec![]);
        let b = module_with_import("b", &["a"], vec![]);
        let mut graph = ModuleGraph::new();
        graph.register(&a);
        graph.register(&b);
        let order = graph.topo_order();
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn compose_exports_top_level_binding_across_modules() {
        let producer = IrModule {
            name: "producer".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::Copy {
                target: "value".to_string(),
                value: Expr::Literal(site(1)),
                site: site(1),
            }],
        };
        let consumer = IrModule {
            name: "consumer".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::ImportFrom {
                target: "v".to_string(),
                module: "producer".to_string(),
                item: "value".to_string(),
                site: site(2),
            }],
        };

        let mut composer = Composer::new(16);
        composer.register_module(&producer);
        composer.register_module(&consumer);

        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        composer.compose(&mut solver);

        let v = Variable::new(ScopeId::Module("consumer".to_string()), "v", Context::Empty);
        assert!(!solver.state.pts(&v).is_empty());
    }

    #[test]
    fn summary_round_trips_through_serde_preserving_exported_pts() {
        let producer = IrModule {
            name: "producer".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::Copy {
                target: "value".to_string(),
                value: Expr::Literal(site(1)),
                site: site(1),
            }],
        };

        let mut composer = Composer::new(16);
        composer.register_module(&producer);

        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        composer.compose(&mut solver);

        let original = composer.summary("producer").cloned().expect("producer was composed");
        assert!(!original.exports.is_empty(), "producer should have at least one export");

        let encoded = serde_json::to_string(&original).expect("summary serializes");
        let decoded: ModuleSummary = serde_json::from_str(&encoded).expect("summary deserializes");

        for (name, pts) in &original.exports {
            assert_eq!(decoded.exports.get(name), Some(pts), "pts for export `{name}` must round-trip exactly");
        }
        assert_eq!(decoded.class_registrations, original.class_registrations);
        assert_eq!(decoded.builtin_augmentations, original.builtin_augmentations);
        assert_eq!(decoded.escaping_allocs, original.escaping_allocs);
    }

    #[test]
    fn compose_converges_across_import_cycle() {
        let a = IrModule {
            name: "a".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![
                Stmt::ImportFrom {
                    target: "b_val".to_string(),
                    module: "b".to_string(),
                    item: "b_export".to_string(),
                    site: site(1),
                },
                Stmt::Copy {
                    target: "a_export".to_string(),
                    value: Expr::Literal(site(2)),
                    site: site(2),
                },
            ],
        };
        let b = IrModule {
            name: "b".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![
                Stmt::ImportFrom {
                    target: "a_val".to_string(),
                    module: "a".to_string(),
                    item: "a_export".to_string(),
                    site: site(3),
                },
                Stmt::Copy {
                    target: "b_export".to_string(),
                    value: Expr::Literal(site(4)),
                    site: site(4),
                },
            ],
        };

        let mut composer = Composer::new(16);
        composer.register_module(&a);
        composer.register_module(&b);

        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        composer.compose(&mut solver);

        let a_val = Variable::new(ScopeId::Module("b".to_string()), "a_val", Context::Empty);
        let b_val = Variable::new(ScopeId::Module("a".to_string()), "b_val", Context::Empty);
        assert!(!solver.state.pts(&a_val).is_empty());
        assert!(!solver.state.pts(&b_val).is_empty());
    }
}
