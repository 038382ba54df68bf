//! IR-to-constraint translation (spec §4.6). Translation is driven lazily
//! from the solver: a `(function, context)` pair is translated the first
//! time a `Call` constraint resolves to it, never eagerly for the whole
//! program (spec §4.4, §5). Module-level bodies are the one exception,
//! translated once per module at composition time (spec §4.8).

use pta_hir::constraint::{Constraint, ConstraintKind};
use pta_hir::domain::{AllocKind, AllocSite, Context, ScopeId, Selector, Site, Variable};
use pta_hir::ir::{Expr, IrClass, IrFunction, IrModule, Name, Stmt, SubscriptKey};
use pta_hir::config::FieldSensitivityMode;

use crate::hierarchy::ClassHierarchy;
use crate::state::AnalysisState;

/// A fixed allocation site for the single process-wide `None` singleton
/// (spec §9 design notes: "process-wide singletons ... are a fixed set of
/// interned CONST objects"). Reusing this exact `AllocSite` everywhere makes
/// repeated `None` uses collapse onto the same abstract object instead of
/// allocating a fresh one per use.
fn none_alloc() -> AllocSite {
    AllocSite::new(Site::new("<builtins>", 0, 0), AllocKind::Const, "None")
}

/// Translates `IrModule`/`IrFunction` bodies into constraints against an
/// `AnalysisState`. Stateless across calls other than the state and
/// hierarchy it is given; a fresh `TranslationSession` is created per
/// function/module body so temp-variable numbering never collides across
/// calls.
pub struct Translator;

impl Translator {
    pub fn new() -> Self {
        Self
    }

    /// Translates a module's top-level body in `Context::Empty` (module
    /// bodies only ever run once, at import time; spec §4.8).
    pub fn translate_module(&self, state: &mut AnalysisState, hierarchy: &mut ClassHierarchy, module: &IrModule) {
        let scope = ScopeId::Module(module.name.clone());
        let mut session = TranslationSession::new(scope, Context::Empty);
        for stmt in &module.body {
            session.translate_stmt(state, hierarchy, stmt);
        }
    }

    /// Translates a single function body under a specific calling context.
    /// Parameters are bound as ordinary scope-local variables; the caller
    /// (the solver's call-resolution procedure) is responsible for wiring
    /// argument points-to sets into them.
    pub fn translate_function(
        &self,
        state: &mut AnalysisState,
        hierarchy: &mut ClassHierarchy,
        qualified_name: &str,
        func: &IrFunction,
        context: Context,
    ) {
        let scope = ScopeId::Function(qualified_name.to_string());
        let mut session = TranslationSession::new(scope, context);
        for stmt in &func.body {
            session.translate_stmt(state, hierarchy, stmt);
        }
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-body translation state: the scope/context pair every emitted
/// `Variable` carries, and a monotonically increasing counter for
/// synthesized temporaries.
struct TranslationSession {
    scope: ScopeId,
    context: Context,
    temp_seq: u32,
}

impl TranslationSession {
    fn new(scope: ScopeId, context: Context) -> Self {
        Self {
            scope,
            context,
            temp_seq: 0,
        }
    }

    fn var(&self, name: &str) -> Variable {
        Variable::new(self.scope.clone(), name, self.context.clone())
    }

    fn fresh_temp(&mut self) -> Variable {
        self.temp_seq += 1;
        self.var(&format!("$t{}", self.temp_seq))
    }

    fn return_slot(&self) -> Variable {
        Variable::return_slot(self.scope.clone(), self.context.clone())
    }

    fn raised_slot(&self) -> Variable {
        Variable::raised_slot(self.scope.clone(), self.context.clone())
    }

    fn push(&self, state: &mut AnalysisState, kind: ConstraintKind, site: &Site) {
        state.add_constraint(Constraint::new(kind, self.context.clone(), site.clone()));
    }

    /// Binds `name` to the process-wide `None` singleton and returns the
    /// variable it was bound into. Used for with-exit's three fixed
    /// arguments and similar constant materializations.
    fn none_var(&mut self, state: &mut AnalysisState, site: &Site) -> Variable {
        let temp = self.fresh_temp();
        self.push(
            state,
            ConstraintKind::Alloc {
                target: temp.clone(),
                alloc: none_alloc(),
            },
            site,
        );
        temp
    }

    /// Turns an `Expr` into a `Variable` carrying its value, allocating
    /// temporaries and `Alloc`/container constraints as needed. A bare
    /// `Expr::Var` resolves directly to the named scope variable with no
    /// new constraint.
    fn materialize(&mut self, state: &mut AnalysisState, expr: &Expr) -> Variable {
        match expr {
            Expr::Var(name) => self.var(name),
            Expr::Literal(site) => {
                let temp = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Alloc {
                        target: temp.clone(),
                        alloc: AllocSite::new(site.clone(), AllocKind::Const, "literal"),
                    },
                    site,
                );
                temp
            }
            Expr::List { elements, site } => {
                self.materialize_container(state, AllocKind::List, elements, site)
            }
            Expr::Tuple { elements, site } => {
                self.materialize_container(state, AllocKind::Tuple, elements, site)
            }
            Expr::Set { elements, site } => {
                self.materialize_container(state, AllocKind::Set, elements, site)
            }
            Expr::Dict { entries, site } => {
                let temp = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Alloc {
                        target: temp.clone(),
                        alloc: AllocSite::new(site.clone(), AllocKind::Dict, "dict-literal"),
                    },
                    site,
                );
                for (key, value) in entries {
                    // Keys flow nowhere in a dict's value-only field model
                    // (spec §4.1); they are still materialized so any
                    // allocations/side-constraints they carry are emitted.
                    let _ = self.materialize(state, key);
                    let value_var = self.materialize(state, value);
                    self.push(
                        state,
                        ConstraintKind::Store {
                            base: temp.clone(),
                            selector: Selector::Value,
                            value: value_var,
                        },
                        site,
                    );
                }
                temp
            }
        }
    }

    fn materialize_container(
        &mut self,
        state: &mut AnalysisState,
        kind: AllocKind,
        elements: &[Expr],
        site: &Site,
    ) -> Variable {
        let temp = self.fresh_temp();
        self.push(
            state,
            ConstraintKind::Alloc {
                target: temp.clone(),
                alloc: AllocSite::new(site.clone(), kind, "container-literal"),
            },
            site,
        );
        for element in elements {
            let element_var = self.materialize(state, element);
            self.push(
                state,
                ConstraintKind::Store {
                    base: temp.clone(),
                    selector: Selector::Elem,
                    value: element_var,
                },
                site,
            );
        }
        temp
    }

    /// Maps a statically-known subscript key to a selector, honoring the
    /// configured field-sensitivity mode (SPEC_FULL §4 Open Question 1:
    /// only integer keys under `attr-name` get per-index precision; string
    /// keys and `collapsed` mode fall back to the generic `.elem` selector,
    /// which the solver's field resolution remaps to `.value` for `DICT`
    /// base objects).
    fn subscript_selector(&self, mode: FieldSensitivityMode, key: &Option<SubscriptKey>) -> Selector {
        match (mode, key) {
            (FieldSensitivityMode::AttrName, Some(SubscriptKey::Int(i))) => Selector::ElemAt(*i),
            _ => Selector::Elem,
        }
    }

    fn translate_stmt(&mut self, state: &mut AnalysisState, hierarchy: &mut ClassHierarchy, stmt: &Stmt) {
        match stmt {
            Stmt::Copy { target, value, site } => {
                let value_var = self.materialize(state, value);
                let target_var = self.var(target);
                if value_var != target_var {
                    self.push(
                        state,
                        ConstraintKind::Copy {
                            target: target_var,
                            source: value_var,
                        },
                        site,
                    );
                }
            }
            Stmt::StoreAttr {
                base,
                attr,
                value,
                site,
            } => {
                let base_var = self.materialize(state, base);
                let value_var = self.materialize(state, value);
                self.push(
                    state,
                    ConstraintKind::Store {
                        base: base_var,
                        selector: Selector::Attr(attr.clone()),
                        value: value_var,
                    },
                    site,
                );
            }
            Stmt::LoadAttr {
                target,
                base,
                attr,
                site,
            } => {
                let base_var = self.materialize(state, base);
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: self.var(target),
                        base: base_var,
                        selector: Selector::Attr(attr.clone()),
                    },
                    site,
                );
            }
            Stmt::StoreSubscript {
                base,
                index,
                value,
                site,
            } => {
                let base_var = self.materialize(state, base);
                let value_var = self.materialize(state, value);
                let selector = self.subscript_selector(state.config.field_sensitivity_mode, index);
                self.push(
                    state,
                    ConstraintKind::Store {
                        base: base_var,
                        selector,
                        value: value_var,
                    },
                    site,
                );
            }
            Stmt::LoadSubscript {
                target,
                base,
                index,
                site,
            } => {
                let base_var = self.materialize(state, base);
                let selector = self.subscript_selector(state.config.field_sensitivity_mode, index);
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: self.var(target),
                        base: base_var,
                        selector,
                    },
                    site,
                );
            }
            Stmt::Call {
                target,
                callee,
                args,
                site,
            } => {
                let callee_var = self.materialize(state, callee);
                let arg_vars: Vec<Variable> = args.iter().map(|a| self.materialize(state, a)).collect();
                self.push(
                    state,
                    ConstraintKind::Call {
                        target: target.as_ref().map(|t| self.var(t)),
                        callee: callee_var,
                        args: arg_vars,
                    },
                    site,
                );
            }
            Stmt::Return { value, site } => {
                let value_var = match value {
                    Some(expr) => self.materialize(state, expr),
                    None => self.none_var(state, site),
                };
                let return_slot = self.return_slot();
                self.push(
                    state,
                    ConstraintKind::Copy {
                        target: return_slot,
                        source: value_var,
                    },
                    site,
                );
            }
            Stmt::DefFunction { binding, func } => self.translate_def_function(state, binding, func),
            Stmt::DefClass { binding, class } => self.translate_def_class(state, hierarchy, binding, class),
            Stmt::Import { target, module, site } => {
                self.push(
                    state,
                    ConstraintKind::Import {
                        target: self.var(target),
                        module: module.clone(),
                    },
                    site,
                );
            }
            Stmt::ImportFrom {
                target,
                module,
                item,
                site,
            } => {
                // `from module import item`: bind a temp to the module
                // object, then read `item` off it. Module composition
                // (spec §4.8) is responsible for populating the module
                // object's attribute fields from the summary's exports, so
                // this is a plain Import + Load, not a new constraint kind.
                let temp = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Import {
                        target: temp.clone(),
                        module: module.clone(),
                    },
                    site,
                );
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: self.var(target),
                        base: temp,
                        selector: Selector::Attr(item.clone()),
                    },
                    site,
                );
            }
            Stmt::Raise { exception, site } => {
                if let Some(expr) = exception {
                    let exc_var = self.materialize(state, expr);
                    let raised = self.raised_slot();
                    self.push(
                        state,
                        ConstraintKind::Copy {
                            target: raised,
                            source: exc_var,
                        },
                        site,
                    );
                }
                // A bare re-raise adds nothing new: whatever is already in
                // `$raised` from an enclosing `except` is left untouched.
            }
            Stmt::Catch { target, site } => {
                let raised = self.raised_slot();
                self.push(
                    state,
                    ConstraintKind::Copy {
                        target: self.var(target),
                        source: raised,
                    },
                    site,
                );
            }
            Stmt::Yield { value, site } => {
                let value_var = self.materialize(state, value);
                let frame = self.var("$genframe");
                self.push(
                    state,
                    ConstraintKind::Alloc {
                        target: frame.clone(),
                        alloc: AllocSite::new(site.clone(), AllocKind::GenFrame, "gen-frame"),
                    },
                    site,
                );
                self.push(
                    state,
                    ConstraintKind::Store {
                        base: frame.clone(),
                        selector: Selector::Attr("__yield_value__".to_string()),
                        value: value_var,
                    },
                    site,
                );
                // Calling a generator function returns its frame, not
                // whatever its (unreachable, in a generator body) `return`
                // statement would have produced.
                let return_slot = self.return_slot();
                self.push(
                    state,
                    ConstraintKind::Copy {
                        target: return_slot,
                        source: frame,
                    },
                    site,
                );
            }
            Stmt::Await { target, value, site } => {
                let awaited_var = self.materialize(state, value);
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: self.var(target),
                        base: awaited_var,
                        selector: Selector::Attr("__yield_value__".to_string()),
                    },
                    site,
                );
            }
            Stmt::WithEnter { target, manager, site } => {
                let manager_var = self.materialize(state, manager);
                let enter_method = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: enter_method.clone(),
                        base: manager_var,
                        selector: Selector::Attr("__enter__".to_string()),
                    },
                    site,
                );
                self.push(
                    state,
                    ConstraintKind::Call {
                        target: Some(self.var(target)),
                        callee: enter_method,
                        args: Vec::new(),
                    },
                    site,
                );
            }
            Stmt::WithExit { manager, site } => {
                let manager_var = self.materialize(state, manager);
                let exit_method = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: exit_method.clone(),
                        base: manager_var,
                        selector: Selector::Attr("__exit__".to_string()),
                    },
                    site,
                );
                let none_args = vec![
                    self.none_var(state, site),
                    self.none_var(state, site),
                    self.none_var(state, site),
                ];
                self.push(
                    state,
                    ConstraintKind::Call {
                        target: None,
                        callee: exit_method,
                        args: none_args,
                    },
                    site,
                );
            }
            Stmt::ForIter {
                iter_binding,
                iterable,
                site,
            } => {
                let iterable_var = self.materialize(state, iterable);
                let iter_method = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: iter_method.clone(),
                        base: iterable_var,
                        selector: Selector::Attr("__iter__".to_string()),
                    },
                    site,
                );
                self.push(
                    state,
                    ConstraintKind::Call {
                        target: Some(self.var(iter_binding)),
                        callee: iter_method,
                        args: Vec::new(),
                    },
                    site,
                );
            }
            Stmt::ForNext {
                target,
                iter_binding,
                site,
            } => {
                let iter_var = self.var(iter_binding);
                let next_method = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: next_method.clone(),
                        base: iter_var,
                        selector: Selector::Attr("__next__".to_string()),
                    },
                    site,
                );
                self.push(
                    state,
                    ConstraintKind::Call {
                        target: Some(self.var(target)),
                        callee: next_method,
                        args: Vec::new(),
                    },
                    site,
                );
            }
            Stmt::BinaryOp {
                target,
                dunder,
                left,
                right,
                site,
            } => {
                let left_var = self.materialize(state, left);
                let right_var = self.materialize(state, right);
                let method = self.fresh_temp();
                self.push(
                    state,
                    ConstraintKind::Load {
                        target: method.clone(),
                        base: left_var,
                        selector: Selector::Attr(dunder.clone()),
                    },
                    site,
                );
                self.push(
                    state,
                    ConstraintKind::Call {
                        target: Some(self.var(target)),
                        callee: method,
                        args: vec![right_var],
                    },
                    site,
                );
            }
            Stmt::Del { .. } => {
                // Points-to sets are monotone (spec §3 invariant: "elements
                // are added, never removed"); `del` has no sound effect to
                // express short of full flow sensitivity, which the engine
                // does not model. No-op.
            }
            Stmt::Phi { target, sources, site } => {
                let target_var = self.var(target);
                for source in sources {
                    self.push(
                        state,
                        ConstraintKind::Copy {
                            target: target_var.clone(),
                            source: self.var(source),
                        },
                        site,
                    );
                }
            }
        }
    }

    fn translate_def_function(&mut self, state: &mut AnalysisState, binding: &Name, func: &IrFunction) {
        let qualified = format!("{}::{}", scope_name(&self.scope), func.name);
        state.functions.insert(qualified.clone(), func.clone());

        let binding_var = self.var(binding);
        self.push(
            state,
            ConstraintKind::Alloc {
                target: binding_var.clone(),
                alloc: AllocSite::new(func.site.clone(), AllocKind::Function, qualified),
            },
            &func.site,
        );

        for free_var in &func.free_vars {
            let cell = self.fresh_temp();
            self.push(
                state,
                ConstraintKind::Alloc {
                    target: cell.clone(),
                    alloc: AllocSite::new(func.site.clone(), AllocKind::Cell, format!("cell:{free_var}")),
                },
                &func.site,
            );
            self.push(
                state,
                ConstraintKind::Store {
                    base: cell.clone(),
                    selector: Selector::CellValue,
                    value: self.var(free_var),
                },
                &func.site,
            );
            self.push(
                state,
                ConstraintKind::Store {
                    base: binding_var.clone(),
                    selector: Selector::Attr(format!("__closure__${free_var}")),
                    value: cell,
                },
                &func.site,
            );
        }

        self.apply_decorators(state, &binding_var, &func.decorators, &func.site);
    }

    fn translate_def_class(
        &mut self,
        state: &mut AnalysisState,
        hierarchy: &mut ClassHierarchy,
        binding: &Name,
        class: &IrClass,
    ) {
        // Class identity is the bare class name, matching the identifiers
        // `IrClass::bases` already uses; module-qualifying it would require
        // import resolution the translator does not have (SPEC_FULL §4).
        hierarchy.register(&class.name, class.bases.clone());
        state.classes.insert(class.name.clone(), class.clone());

        let binding_var = self.var(binding);
        let alloc = AllocSite::new(class.site.clone(), AllocKind::Class, class.name.clone());
        let class_obj = pta_hir::domain::AbstractObject::new(alloc.clone(), self.context.clone());
        state.register_class_object(class.name.clone(), class_obj);

        self.push(
            state,
            ConstraintKind::Alloc {
                target: binding_var.clone(),
                alloc,
            },
            &class.site,
        );

        self.translate_class_body(state, hierarchy, &binding_var, &class.name, &class.body);
        self.apply_decorators(state, &binding_var, &class.decorators, &class.site);
    }

    /// Runs class-body statements in a synthetic class scope, then mirrors
    /// every name the body binds into the class object's `__dict__` via an
    /// explicit `Store` (spec §4.5: "class bodies run in a synthetic
    /// class-scope context to populate `__dict__`").
    fn translate_class_body(
        &mut self,
        state: &mut AnalysisState,
        hierarchy: &mut ClassHierarchy,
        class_var: &Variable,
        class_name: &str,
        body: &[Stmt],
    ) {
        let body_scope = ScopeId::Function(format!("{class_name}$body"));
        let mut session = TranslationSession::new(body_scope, self.context.clone());
        for stmt in body {
            session.translate_stmt(state, hierarchy, stmt);
            if let Some(name) = bound_name(stmt) {
                let value_var = session.var(&name);
                session.push(
                    state,
                    ConstraintKind::Store {
                        base: class_var.clone(),
                        selector: Selector::Attr(name),
                        value: value_var,
                    },
                    stmt_site(stmt),
                );
            }
        }
    }

    /// Folds `binding = dec_n(...dec_1(binding))` per spec §4.4: each
    /// decorator is called with the previous value and its result replaces
    /// the binding.
    fn apply_decorators(&mut self, state: &mut AnalysisState, binding_var: &Variable, decorators: &[Expr], site: &Site) {
        if decorators.is_empty() {
            return;
        }
        let mut current = binding_var.clone();
        for decorator in decorators {
            let dec_var = self.materialize(state, decorator);
            let result = self.fresh_temp();
            self.push(
                state,
                ConstraintKind::Call {
                    target: Some(result.clone()),
                    callee: dec_var,
                    args: vec![current],
                },
                site,
            );
            current = result;
        }
        if &current != binding_var {
            self.push(
                state,
                ConstraintKind::Copy {
                    target: binding_var.clone(),
                    source: current,
                },
                site,
            );
        }
    }
}

fn scope_name(scope: &ScopeId) -> &str {
    match scope {
        ScopeId::Module(name) => name,
        ScopeId::Function(name) => name,
    }
}

/// The name a statement binds in its enclosing scope, for class-body
/// `__dict__` mirroring. `None` for statements that don't introduce a
/// class-level name (imports executed for side effect, bare expression
/// statements desugared as `Call` with no target, etc).
fn bound_name(stmt: &Stmt) -> Option<String> {
    match stmt {
        Stmt::Copy { target, .. } => Some(target.clone()),
        Stmt::DefFunction { binding, .. } => Some(binding.clone()),
        Stmt::DefClass { binding, .. } => Some(binding.clone()),
        Stmt::Import { target, .. } => Some(target.clone()),
        Stmt::ImportFrom { target, .. } => Some(target.clone()),
        _ => None,
    }
}

fn stmt_site(stmt: &Stmt) -> &Site {
    match stmt {
        Stmt::Copy { site, .. }
        | Stmt::StoreAttr { site, .. }
        | Stmt::LoadAttr { site, .. }
        | Stmt::StoreSubscript { site, .. }
        | Stmt::LoadSubscript { site, .. }
        | Stmt::Call { site, .. }
        | Stmt::Return { site, .. }
        | Stmt::Import { site, .. }
        | Stmt::ImportFrom { site, .. }
        | Stmt::Raise { site, .. }
        | Stmt::Catch { site, .. }
        | Stmt::Yield { site, .. }
        | Stmt::Await { site, .. }
        | Stmt::WithEnter { site, .. }
        | Stmt::WithExit { site, .. }
        | Stmt::ForIter { site, .. }
        | Stmt::ForNext { site, .. }
        | Stmt::BinaryOp { site, .. }
        | Stmt::Del { site, .. }
        | Stmt::Phi { site, .. } => site,
        Stmt::DefFunction { func, .. } => &func.site,
        Stmt::DefClass { class, .. } => &class.site,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AnalysisState;
    use pta_hir::AnalysisConfig;

    fn site(line: u32) -> Site {
        Site::new("m.py", line, 0)
    }

    #[test]
    fn copy_of_literal_allocates_and_copies() {
        let mut state = AnalysisState::new(AnalysisConfig::default());
        let mut hierarchy = ClassHierarchy::new();
        let translator = Translator::new();
        let module = IrModule {
            name: "m".to_string(),
            functions: Vec::new(),
            classes: Vec::new(),
            body: vec![Stmt::Copy {
                target: "x".to_string(),
                value: Expr::Literal(site(1)),
                site: site(1),
            }],
        };
        translator.translate_module(&mut state, &mut hierarchy, &module);
        // The literal's temp feeds `x` via a Copy; the temp is the thing a
        // Copy constraint reads, so it must be registered as a dependency.
        let temp = Variable::new(ScopeId::Module("m".to_string()), "$t1", Context::Empty);
        assert_eq!(state.constraints_reading_var(&temp).len(), 1);
    }

    #[test]
    fn def_function_registers_and_allocates() {
        let mut state = AnalysisState::new(AnalysisConfig::default());
        let mut hierarchy = ClassHierarchy::new();
        let translator = Translator::new();
        let func = IrFunction {
            name: "f".to_string(),
            params: vec![],
            decorators: vec![],
            body: vec![],
            free_vars: vec![],
            site: site(2),
        };
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::DefFunction {
                binding: "f".to_string(),
                func,
            }],
        };
        translator.translate_module(&mut state, &mut hierarchy, &module);
        assert!(state.functions.contains_key("m::f"));
    }

    #[test]
    fn def_class_registers_hierarchy_and_class_object() {
        let mut state = AnalysisState::new(AnalysisConfig::default());
        let mut hierarchy = ClassHierarchy::new();
        let translator = Translator::new();
        let class = IrClass {
            name: "C".to_string(),
            bases: vec![],
            decorators: vec![],
            body: vec![],
            site: site(3),
        };
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::DefClass {
                binding: "C".to_string(),
                class,
            }],
        };
        translator.translate_module(&mut state, &mut hierarchy, &module);
        assert!(state.classes.contains_key("C"));
        assert!(state.class_object("C").is_some());
        assert!(hierarchy.is_registered("C"));
    }

    #[test]
    fn decorator_chain_folds_calls() {
        let mut state = AnalysisState::new(AnalysisConfig::default());
        let mut hierarchy = ClassHierarchy::new();
        let translator = Translator::new();
        let func = IrFunction {
            name: "f".to_string(),
            params: vec![],
            decorators: vec![Expr::Var("dec1".to_string()), Expr::Var("dec2".to_string())],
            body: vec![],
            free_vars: vec![],
            site: site(4),
        };
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::DefFunction {
                binding: "f".to_string(),
                func,
            }],
        };
        translator.translate_module(&mut state, &mut hierarchy, &module);
        // Two decorators fold into two synthesized Call constraints plus a
        // final Copy back into `f`; registration succeeding without panic
        // is the behavior under test here.
        assert!(state.functions.contains_key("m::f"));
    }
}
