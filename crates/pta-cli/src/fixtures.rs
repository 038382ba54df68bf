//! Hand-built end-to-end scenarios, one per documented system behavior:
//! direct-call resolution, context distinction, MRO dispatch, container
//! flow through a builtin, an unresolved callee, and cross-module
//! composition. The `Demo` subcommand runs all six and prints whether each
//! one's expectation held, so a build can be smoke-tested without a real
//! module finder wired up yet.

use petgraph::visit::EdgeRef;

use pta_core::query::Query;
use pta_core::solver::Solver;
use pta_core::state::AnalysisState;
use pta_hir::config::AnalysisConfig;
use pta_hir::domain::{AllocKind, Context, ScopeId, Site, Variable};
use pta_hir::ir::{Expr, IrClass, IrFunction, IrModule, Stmt};
use pta_modules::Composer;

/// Whether `graph` contains any edge whose target node has the given
/// qualified scope name, i.e. "something calls `qualified`" regardless of
/// who the caller is (the caller-side scope label the solver records is a
/// best-effort debug string, not a reliable lookup key).
fn has_edge_into(graph: &petgraph::graph::DiGraph<pta_core::state::CallGraphNode, pta_core::state::CallGraphEdge>, qualified: &str) -> bool {
    graph.edge_references().any(|e| graph[e.target()].scope == qualified)
}

pub struct Scenario {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

fn site(line: u32) -> Site {
    Site::new("<fixture>", line, 0)
}

fn module_var(module: &str, name: &str, context: Context) -> Variable {
    Variable::new(ScopeId::Module(module.to_string()), name, context)
}

/// 1. Direct call, 0-CFA: `def id(x): return x; a = <alloc>; b = id(a)`.
/// Expects pts(b) to be exactly the object allocated for `a`, reached
/// through a single `(Empty, call-site) -> id` edge, under one live context.
pub fn direct_call_0cfa() -> Scenario {
    let id_fn = IrFunction {
        name: "id".to_string(),
        params: vec!["x".to_string()],
        decorators: vec![],
        body: vec![Stmt::Return {
            value: Some(Expr::Var("x".to_string())),
            site: site(1),
        }],
        free_vars: vec![],
        site: site(1),
    };
    let module = IrModule {
        name: "s1".to_string(),
        functions: vec![],
        classes: vec![],
        body: vec![
            Stmt::DefFunction {
                binding: "id".to_string(),
                func: id_fn,
            },
            Stmt::Copy {
                target: "a".to_string(),
                value: Expr::Literal(site(2)),
                site: site(2),
            },
            Stmt::Call {
                target: Some("b".to_string()),
                callee: Expr::Var("id".to_string()),
                args: vec![Expr::Var("a".to_string())],
                site: site(3),
            },
        ],
    };

    let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
    solver.run(&module);
    let edge_exists = has_edge_into(solver.state.call_graph(), "s1::id");
    let mut query = Query::new(&mut solver);

    let a = module_var("s1", "a", Context::Empty);
    let b = module_var("s1", "b", Context::Empty);
    let a_pts = query.points_to(&a);
    let b_pts = query.points_to(&b);
    let same_object = a_pts.len() == 1 && b_pts.len() == 1 && a_pts == b_pts;
    let one_context = query.stats().live_context_count == 1;

    Scenario {
        name: "direct call, 0-CFA",
        passed: same_object && one_context && edge_exists,
        detail: format!(
            "pts(a)==pts(b): {same_object}, one live context: {one_context}, call edge to id: {edge_exists}"
        ),
    }
}

/// 2. Context distinction under 2-CFA: two call sites `id(A())`/`id(B())`.
/// Expects `id`'s parameter to hold disjoint singletons per call-site
/// context.
pub fn context_distinction_2cfa() -> Scenario {
    let id_fn = IrFunction {
        name: "id".to_string(),
        params: vec!["x".to_string()],
        decorators: vec![],
        body: vec![],
        free_vars: vec![],
        site: site(1),
    };
    let class_a = IrClass {
        name: "A".to_string(),
        bases: vec![],
        decorators: vec![],
        body: vec![],
        site: site(2),
    };
    let class_b = IrClass {
        name: "B".to_string(),
        bases: vec![],
        decorators: vec![],
        body: vec![],
        site: site(3),
    };
    let call_a_site = site(4);
    let call_b_site = site(5);
    let module = IrModule {
        name: "s2".to_string(),
        functions: vec![],
        classes: vec![],
        body: vec![
            Stmt::DefFunction {
                binding: "id".to_string(),
                func: id_fn,
            },
            Stmt::DefClass {
                binding: "A".to_string(),
                class: class_a,
            },
            Stmt::DefClass {
                binding: "B".to_string(),
                class: class_b,
            },
            Stmt::Call {
                target: Some("a_inst".to_string()),
                callee: Expr::Var("A".to_string()),
                args: vec![],
                site: call_a_site.clone(),
            },
            Stmt::Call {
                target: None,
                callee: Expr::Var("id".to_string()),
                args: vec![Expr::Var("a_inst".to_string())],
                site: call_a_site.clone(),
            },
            Stmt::Call {
                target: Some("b_inst".to_string()),
                callee: Expr::Var("B".to_string()),
                args: vec![],
                site: call_b_site.clone(),
            },
            Stmt::Call {
                target: None,
                callee: Expr::Var("id".to_string()),
                args: vec![Expr::Var("b_inst".to_string())],
                site: call_b_site.clone(),
            },
        ],
    };

    let mut config = AnalysisConfig::default();
    config = config.with_context_policy("2-cfa").expect("2-cfa is a valid policy spec");
    let mut solver = Solver::new(AnalysisState::new(config));
    solver.run(&module);

    let ctx_a = Context::CallString(smallvec::smallvec![call_a_site]);
    let ctx_b = Context::CallString(smallvec::smallvec![call_b_site]);
    let x_in_a = Variable::new(ScopeId::Function("s2::id".to_string()), "x", ctx_a);
    let x_in_b = Variable::new(ScopeId::Function("s2::id".to_string()), "x", ctx_b);

    let pts_a = solver.state.pts(&x_in_a);
    let pts_b = solver.state.pts(&x_in_b);
    let disjoint = pts_a.iter().all(|o| !pts_b.contains(o)) && !pts_a.is_empty() && !pts_b.is_empty();
    let a_is_a = pts_a.iter().all(|o| o.alloc.name == "A");
    let b_is_b = pts_b.iter().all(|o| o.alloc.name == "B");

    Scenario {
        name: "context distinction, 2-CFA",
        passed: disjoint && a_is_a && b_is_b,
        detail: format!(
            "pts(id.x)[siteA]={} distinct object(s) of A, pts(id.x)[siteB]={} distinct object(s) of B, disjoint: {disjoint}",
            pts_a.len(),
            pts_b.len()
        ),
    }
}

/// 3. Method dispatch via MRO: `class A: def m(self): return 1`;
/// `class B(A): pass`; `b = B(); r = b.m()`. Expects the resolver to pick
/// `A.m` and to synthesize a bound method whose `__self__` is the B
/// instance.
pub fn method_dispatch_via_mro() -> Scenario {
    let m = IrFunction {
        name: "m".to_string(),
        params: vec!["self".to_string()],
        decorators: vec![],
        body: vec![Stmt::Return {
            value: Some(Expr::Literal(site(1))),
            site: site(1),
        }],
        free_vars: vec![],
        site: site(1),
    };
    let class_a = IrClass {
        name: "A".to_string(),
        bases: vec![],
        decorators: vec![],
        body: vec![Stmt::DefFunction {
            binding: "m".to_string(),
            func: m,
        }],
        site: site(2),
    };
    let class_b = IrClass {
        name: "B".to_string(),
        bases: vec!["A".to_string()],
        decorators: vec![],
        body: vec![],
        site: site(3),
    };
    let module = IrModule {
        name: "s3".to_string(),
        functions: vec![],
        classes: vec![],
        body: vec![
            Stmt::DefClass {
                binding: "A".to_string(),
                class: class_a,
            },
            Stmt::DefClass {
                binding: "B".to_string(),
                class: class_b,
            },
            Stmt::Call {
                target: Some("b".to_string()),
                callee: Expr::Var("B".to_string()),
                args: vec![],
                site: site(4),
            },
            Stmt::LoadAttr {
                target: "bound_m".to_string(),
                base: Expr::Var("b".to_string()),
                attr: "m".to_string(),
                site: site(5),
            },
            Stmt::Call {
                target: Some("r".to_string()),
                callee: Expr::Var("bound_m".to_string()),
                args: vec![],
                site: site(5),
            },
            // Same read, but off the class object itself (`A.m`, not an
            // instance): bound-method synthesis is unconditional on the
            // base's kind, so this must bind too.
            Stmt::LoadAttr {
                target: "class_m".to_string(),
                base: Expr::Var("A".to_string()),
                attr: "m".to_string(),
                site: site(6),
            },
        ],
    };

    let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
    solver.run(&module);
    let mut query = Query::new(&mut solver);

    let mro = query.mro("B");
    let selects_a_m = mro.first().map(String::as_str) == Some("B") && mro.iter().any(|c| c == "A");
    let r = module_var("s3", "r", Context::Empty);
    let r_is_const = query.points_to(&r).iter().all(|o| o.kind() == AllocKind::Const) && !query.points_to(&r).is_empty();
    let bound_m = module_var("s3", "bound_m", Context::Empty);
    let bound_objs = query.points_to(&bound_m);
    let bound_method_present = bound_objs.iter().any(|o| o.kind() == AllocKind::BoundMethod);
    let class_m = module_var("s3", "class_m", Context::Empty);
    let class_bound_objs = query.points_to(&class_m);
    let class_base_binds = class_bound_objs.iter().any(|o| o.kind() == AllocKind::BoundMethod);

    Scenario {
        name: "method dispatch via MRO",
        passed: selects_a_m && r_is_const && bound_method_present && class_base_binds,
        detail: format!(
            "mro(B)={mro:?}, pts(r) is CONST: {r_is_const}, bound-method synthesized (instance base): {bound_method_present}, bound-method synthesized (class base): {class_base_binds}"
        ),
    }
}

/// 4. Container through call: `xs = [A()]; ys = list(xs)`. Expects
/// `ys`'s element field to be (a superset including) the same `A` instance
/// as `xs`'s, with no re-allocation of `A`.
pub fn container_through_call() -> Scenario {
    let class_a = IrClass {
        name: "A".to_string(),
        bases: vec![],
        decorators: vec![],
        body: vec![],
        site: site(1),
    };
    let module = IrModule {
        name: "s4".to_string(),
        functions: vec![],
        classes: vec![],
        body: vec![
            Stmt::DefClass {
                binding: "A".to_string(),
                class: class_a,
            },
            Stmt::Call {
                target: Some("a_inst".to_string()),
                callee: Expr::Var("A".to_string()),
                args: vec![],
                site: site(2),
            },
            Stmt::Copy {
                target: "xs".to_string(),
                value: Expr::List {
                    elements: vec![Expr::Var("a_inst".to_string())],
                    site: site(3),
                },
                site: site(3),
            },
            Stmt::Call {
                target: Some("ys".to_string()),
                callee: Expr::Var("list".to_string()),
                args: vec![Expr::Var("xs".to_string())],
                site: site(4),
            },
        ],
    };

    let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
    solver.run(&module);
    let mut query = Query::new(&mut solver);

    let xs = module_var("s4", "xs", Context::Empty);
    let ys = module_var("s4", "ys", Context::Empty);
    let xs_obj = query.points_to(&xs).iter().next().cloned();
    let ys_obj = query.points_to(&ys).iter().next().cloned();

    let (elems_cover, single_a_alloc) = match (xs_obj, ys_obj) {
        (Some(xs_obj), Some(ys_obj)) => {
            let xs_elem = query.field_points_to(&pta_hir::domain::Field::new(xs_obj, pta_hir::domain::Selector::Elem));
            let ys_elem = query.field_points_to(&pta_hir::domain::Field::new(ys_obj, pta_hir::domain::Selector::Elem));
            let covers = xs_elem.iter().all(|o| ys_elem.contains(o)) && !xs_elem.is_empty();
            let a_allocs: std::collections::HashSet<_> =
                xs_elem.iter().chain(ys_elem.iter()).filter(|o| o.kind() == AllocKind::Object).map(|o| o.alloc.clone()).collect();
            (covers, a_allocs.len() == 1)
        }
        _ => (false, false),
    };

    Scenario {
        name: "container through call",
        passed: elems_cover && single_a_alloc,
        detail: format!("ys.elem ⊇ xs.elem: {elems_cover}, exactly one A allocation reused: {single_a_alloc}"),
    }
}

/// 5. Unknown callee: `f = getattr(mod, some_var); r = f()`. Expects an
/// unknown-tracker entry (callee-empty, callee-non-callable, or
/// dynamic-attribute; the spec accepts either of the first and the last)
/// and `pts(r)` to hold exactly one UNKNOWN object.
pub fn unknown_callee() -> Scenario {
    let module = IrModule {
        name: "s5".to_string(),
        functions: vec![],
        classes: vec![],
        body: vec![
            Stmt::Call {
                target: Some("f".to_string()),
                callee: Expr::Var("getattr".to_string()),
                args: vec![Expr::Var("mod".to_string()), Expr::Var("some_var".to_string())],
                site: site(1),
            },
            Stmt::Call {
                target: Some("r".to_string()),
                callee: Expr::Var("f".to_string()),
                args: vec![],
                site: site(2),
            },
        ],
    };

    let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
    solver.run(&module);
    let mut query = Query::new(&mut solver);

    let r = module_var("s5", "r", Context::Empty);
    let r_pts = query.points_to(&r);
    let exactly_one_unknown = r_pts.len() == 1 && r_pts.iter().all(|o| o.kind() == AllocKind::Unknown);
    let stats = query.stats();
    let recorded = stats.total_unknowns > 0;

    Scenario {
        name: "unknown callee",
        passed: exactly_one_unknown && recorded,
        detail: format!("pts(r) has {} UNKNOWN object(s), total unknowns recorded: {}", r_pts.len(), stats.total_unknowns),
    }
}

/// 6. Modular composition: module `P` exports function `helper`; module
/// `Q` imports and calls it. Expects `Q`'s call graph to gain an edge to
/// `helper`'s qualified name, with `P`'s body translated exactly once.
pub fn modular_composition() -> Scenario {
    let helper = IrFunction {
        name: "helper".to_string(),
        params: vec![],
        decorators: vec![],
        body: vec![Stmt::Return {
            value: Some(Expr::Literal(site(1))),
            site: site(1),
        }],
        free_vars: vec![],
        site: site(1),
    };
    let p = IrModule {
        name: "P".to_string(),
        functions: vec![],
        classes: vec![],
        body: vec![Stmt::DefFunction {
            binding: "helper".to_string(),
            func: helper,
        }],
    };
    let q = IrModule {
        name: "Q".to_string(),
        functions: vec![],
        classes: vec![],
        body: vec![
            Stmt::ImportFrom {
                target: "helper_ref".to_string(),
                module: "P".to_string(),
                item: "helper".to_string(),
                site: site(2),
            },
            Stmt::Call {
                target: Some("r".to_string()),
                callee: Expr::Var("helper_ref".to_string()),
                args: vec![],
                site: site(3),
            },
        ],
    };

    let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
    let mut composer = Composer::new(16);
    composer.register_module(&p);
    composer.register_module(&q);
    composer.compose(&mut solver);

    let qualified_helper = "P::helper".to_string();
    let function_known = solver.state.functions.contains_key(&qualified_helper);
    let translated_once = solver.state.translated.iter().filter(|(name, _)| name == &qualified_helper).count() == 1;
    let edge_exists = has_edge_into(solver.state.call_graph(), &qualified_helper);
    let mut query = Query::new(&mut solver);
    let r = module_var("Q", "r", Context::Empty);
    let r_non_empty = !query.points_to(&r).is_empty();

    Scenario {
        name: "modular composition",
        passed: function_known && translated_once && edge_exists && r_non_empty,
        detail: format!(
            "helper registered: {function_known}, translated once: {translated_once}, call edge present: {edge_exists}, pts(r) non-empty: {r_non_empty}"
        ),
    }
}

pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        direct_call_0cfa(),
        context_distinction_2cfa(),
        method_dispatch_via_mro(),
        container_through_call(),
        unknown_callee(),
        modular_composition(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_six_scenarios_pass() {
        for scenario in all_scenarios() {
            assert!(scenario.passed, "scenario `{}` failed: {}", scenario.name, scenario.detail);
        }
    }
}
