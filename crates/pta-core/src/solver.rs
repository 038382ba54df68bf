//! The worklist fixpoint solver (spec §4.2, §4.4): the naive "re-evaluate
//! every constraint reading a dirty item" loop, call resolution across
//! FUNCTION/CLASS/BOUND_METHOD objects and builtins, and MRO-based
//! attribute resolution with BOUND_METHOD synthesis (spec §4.4, §4.5).
//! Grounded on the teacher's `Analyzer::analyze` shape
//! (`depyler-analyzer/src/lib.rs`): a struct wrapping mutable state with a
//! single `run` entry point, everything else private helpers.

use std::collections::VecDeque;

use pta_hir::constraint::{Constraint, ConstraintKind};
use pta_hir::domain::{AbstractObject, AllocKind, AllocSite, Context, Field, ScopeId, Selector, Site, Variable};
use pta_hir::ir::IrModule;
use tracing::{debug, trace};

use crate::builtins::{BuiltinCall, BuiltinTable};
use crate::context_selector::{CallMetadata, ContextSelector};
use crate::hierarchy::ClassHierarchy;
use crate::state::{AnalysisState, CallGraphNode, ConstraintId, UnknownKind};
use crate::translate::Translator;

/// A variable or concrete field whose points-to set just grew; re-evaluate
/// whatever reads it.
#[derive(Debug, Clone)]
enum Dirty {
    Var(Variable),
    Field(Field),
}

pub struct Solver {
    pub state: AnalysisState,
    pub hierarchy: ClassHierarchy,
    selector: ContextSelector,
    builtins: BuiltinTable,
    translator: Translator,
    worklist: VecDeque<Dirty>,
    temp_seq: u32,
}

impl Solver {
    pub fn new(state: AnalysisState) -> Self {
        let selector = ContextSelector::new(state.config.context_policy);
        Self {
            state,
            hierarchy: ClassHierarchy::new(),
            selector,
            builtins: BuiltinTable::new(),
            translator: Translator::new(),
            worklist: VecDeque::new(),
            temp_seq: 0,
        }
    }

    /// Translates `module`'s top-level body and runs the fixpoint to
    /// completion. Idempotent to call more than once with different
    /// modules (each is translated in `Context::Empty`, spec §4.8).
    pub fn run(&mut self, module: &IrModule) {
        debug!(module = %module.name, "translating module body");
        let before = self.state.constraint_count();
        self.translator.translate_module(&mut self.state, &mut self.hierarchy, module);
        let after = self.state.constraint_count();
        for id in before..after {
            self.apply_constraint(id);
        }
        self.drain_worklist();
    }

    /// Populates a field (typically a `MODULE` object's exported-symbol
    /// attribute) and reprocesses whatever already depends on it, draining
    /// the resulting fixpoint before returning. The only mutation entry
    /// point exposed to `pta-modules`'s composition pass (spec §4.8) —
    /// composition never needs the raw worklist machinery, just "this field
    /// grew, make sure everything downstream knows."
    pub fn seed_field(&mut self, field: Field, objects: impl IntoIterator<Item = AbstractObject>) -> bool {
        let mut grew = false;
        for obj in objects {
            if self.state.insert_field(&field, obj) {
                grew = true;
            }
        }
        if grew {
            self.worklist.push_back(Dirty::Field(field));
            self.drain_worklist();
        }
        grew
    }

    fn drain_worklist(&mut self) {
        while let Some(item) = self.worklist.pop_front() {
            let ids = match &item {
                Dirty::Var(v) => self.state.constraints_reading_var(v),
                Dirty::Field(f) => self.state.constraints_reading_field(f),
            };
            for id in ids {
                self.apply_constraint(id);
            }
        }
    }

    fn enqueue_var(&mut self, grew: bool, var: &Variable) {
        if grew {
            self.worklist.push_back(Dirty::Var(var.clone()));
        }
    }

    fn enqueue_field(&mut self, grew: bool, field: &Field) {
        if grew {
            self.worklist.push_back(Dirty::Field(field.clone()));
        }
    }

    /// Delivers a fresh `UNKNOWN` object to `target` so downstream reads of
    /// it stay sound instead of silently seeing an empty points-to set
    /// (spec §7: unknown kinds 1-5/7/9). Never called for kind 6
    /// (`FieldLoadEmpty`), which deliberately allocates nothing so a later
    /// `Store` into the same field can still be picked up by the worklist.
    fn deliver_unknown(&mut self, target: Option<&Variable>, site: &Site, context: &Context, discriminator: &str) {
        let Some(target) = target else { return };
        let obj = AbstractObject::new(AllocSite::unknown_at(site.clone(), discriminator), context.clone());
        let grew = self.state.insert_var(target, obj);
        self.enqueue_var(grew, target);
    }

    fn fresh_temp(&mut self, scope: &ScopeId, context: &Context) -> Variable {
        self.temp_seq += 1;
        Variable::new(scope.clone(), format!("$solver{}", self.temp_seq), context.clone())
    }

    /// Adds a constraint and immediately applies it once against the
    /// current state, so a dependency that was already populated before
    /// this constraint existed is not missed (spec §4.2: a constraint added
    /// mid-solve must see the pts accumulated so far, not just future
    /// growth).
    fn add_and_seed(&mut self, c: Constraint) {
        let id = self.state.add_constraint(c);
        self.apply_constraint(id);
    }

    fn apply_constraint(&mut self, id: ConstraintId) {
        let constraint = self.state.constraint(id).clone();
        trace!(id, "applying constraint");
        match &constraint.kind {
            ConstraintKind::Alloc { target, alloc } => {
                self.state.register_context(constraint.context.clone());
                let obj = AbstractObject::new(alloc.clone(), constraint.context.clone());
                let grew = self.state.insert_var(target, obj);
                self.enqueue_var(grew, target);
            }
            ConstraintKind::Copy { target, source } => {
                let pts = self.state.pts(source);
                let grew = self.state.union_var(target, &pts);
                self.enqueue_var(grew, target);
            }
            ConstraintKind::Load { target, base, selector } => {
                self.apply_load(id, &constraint.site, &constraint.context, target, base, selector);
            }
            ConstraintKind::Store { base, selector, value } => {
                self.apply_store(base, selector, value);
            }
            ConstraintKind::Call { target, callee, args } => {
                self.apply_call(id, &constraint.site, &constraint.context, target.clone(), callee, args);
            }
            ConstraintKind::Return {
                target,
                callee_scope,
                callee_context,
            } => {
                let return_var = Variable::return_slot(callee_scope.clone(), callee_context.clone());
                let pts = self.state.pts(&return_var);
                let grew = self.state.union_var(target, &pts);
                self.enqueue_var(grew, target);
            }
            ConstraintKind::Import { target, module } => {
                // Module objects are process-wide singletons keyed purely
                // by module name: the `Site` here is a canonical pseudo-site
                // (not the importing statement's location), and the context
                // is always `Empty`, so every `import module` anywhere in
                // the program collapses onto the same object (spec §9
                // design notes). Populating its attributes from the
                // module's exports is pta-modules' job (spec §4.8); the
                // solver only allocates the placeholder here.
                let obj = AbstractObject::new(module_alloc(module), Context::Empty);
                let grew = self.state.insert_var(target, obj);
                self.enqueue_var(grew, target);
            }
        }
    }

    /// Remaps a generic positional selector onto `.value` for `DICT` base
    /// objects (SPEC_FULL §4 Open Question 1): the translator cannot tell
    /// list/tuple/set subscripting from dict subscripting syntactically, so
    /// the distinction is resolved here once the base object's concrete
    /// kind is known.
    fn concretize_selector(selector: &Selector, kind: AllocKind) -> Selector {
        match (selector, kind) {
            (Selector::Elem, AllocKind::Dict) | (Selector::ElemAt(_), AllocKind::Dict) => Selector::Value,
            (other, _) => other.clone(),
        }
    }

    fn apply_load(
        &mut self,
        id: ConstraintId,
        site: &Site,
        context: &Context,
        target: &Variable,
        base: &Variable,
        selector: &Selector,
    ) {
        let base_pts = self.state.pts(base);
        for obj in base_pts.iter() {
            if let Selector::Attr(name) = selector {
                self.resolve_attr_load(id, site, context, target, obj, name);
                continue;
            }
            let concrete = Self::concretize_selector(selector, obj.kind());
            let field = Field::new(obj.clone(), concrete);
            self.state.subscribe_field(field.clone(), id);
            let fp = self.state.field_pts(&field);
            if fp.is_empty() {
                self.state.unknowns.record(
                    UnknownKind::FieldLoadEmpty,
                    site.clone(),
                    format!("empty field {:?} on {:?}", field.selector, obj.alloc),
                );
                continue;
            }
            let grew = self.state.union_var(target, &fp);
            self.enqueue_var(grew, target);
        }
    }

    /// MRO-based attribute resolution (spec §4.5): the object's own field is
    /// checked first (instance `__dict__` shadows the class), then, for
    /// `OBJECT`/`CLASS` kinds, each class in the MRO in order. A resolved
    /// `FUNCTION` read off an `OBJECT` or `CLASS` base is wrapped into a
    /// synthesized `BOUND_METHOD` (spec §4.4 item 2) -- the single place
    /// bound methods come into being, unconditional on the base's kind.
    fn resolve_attr_load(
        &mut self,
        id: ConstraintId,
        site: &Site,
        context: &Context,
        target: &Variable,
        obj: &AbstractObject,
        name: &str,
    ) {
        let own_field = Field::new(obj.clone(), Selector::Attr(name.to_string()));
        self.state.subscribe_field(own_field.clone(), id);
        let own_pts = self.state.field_pts(&own_field);
        let resolved = if !own_pts.is_empty() {
            Some(own_pts)
        } else if matches!(obj.kind(), AllocKind::Object | AllocKind::Class)
            && self.state.config.use_mro
            && self.state.config.build_class_hierarchy
        {
            let class_id = obj.alloc.name.clone();
            let mro: Vec<String> = self.hierarchy.mro(&class_id).to_vec();
            if self.hierarchy.mro_used_fallback(&class_id) {
                // Inconsistent C3 linearization (spec §4.5): the conservative
                // preorder fallback is sound but may pick a different
                // attribute owner than a consistent linearization would
                // have, so it's worth a record even though resolution itself
                // still proceeds.
                self.state.unknowns.record(
                    UnknownKind::FieldLoadEmpty,
                    site.clone(),
                    format!("MRO of `{class_id}` is C3-inconsistent; used conservative fallback to resolve `{name}`"),
                );
            }
            let mut found = None;
            for cname in &mro {
                if let Some(cobj) = self.state.class_object(cname).cloned() {
                    let cfield = Field::new(cobj, Selector::Attr(name.to_string()));
                    self.state.subscribe_field(cfield.clone(), id);
                    let cpts = self.state.field_pts(&cfield);
                    if !cpts.is_empty() {
                        found = Some(cpts);
                        break;
                    }
                }
            }
            found
        } else {
            None
        };

        let Some(pts) = resolved else {
            self.state.unknowns.record(
                UnknownKind::FieldLoadEmpty,
                site.clone(),
                format!("no attribute `{name}` resolved via MRO on {:?}", obj.alloc),
            );
            return;
        };

        let mut grew = false;
        if matches!(obj.kind(), AllocKind::Object | AllocKind::Class) {
            for candidate in pts.iter() {
                if candidate.kind() == AllocKind::Function {
                    let bm_alloc = AllocSite::new(
                        site.clone(),
                        AllocKind::BoundMethod,
                        format!("bound:{}", candidate.alloc.name),
                    );
                    let bm_obj = AbstractObject::new(bm_alloc, context.clone());
                    self.state
                        .insert_field(&Field::new(bm_obj.clone(), Selector::SelfRef), obj.clone());
                    self.state
                        .insert_field(&Field::new(bm_obj.clone(), Selector::Func), candidate.clone());
                    if self.state.insert_var(target, bm_obj) {
                        grew = true;
                    }
                } else if self.state.insert_var(target, candidate.clone()) {
                    grew = true;
                }
            }
        } else if self.state.union_var(target, &pts) {
            grew = true;
        }
        self.enqueue_var(grew, target);
    }

    fn apply_store(&mut self, base: &Variable, selector: &Selector, value: &Variable) {
        let base_pts = self.state.pts(base);
        let value_pts = self.state.pts(value);
        for obj in base_pts.iter() {
            let concrete = Self::concretize_selector(selector, obj.kind());
            let field = Field::new(obj.clone(), concrete);
            let grew = self.state.union_field(&field, &value_pts);
            self.enqueue_field(grew, &field);
        }
    }

    fn apply_call(
        &mut self,
        _id: ConstraintId,
        site: &Site,
        context: &Context,
        target: Option<Variable>,
        callee: &Variable,
        args: &[Variable],
    ) {
        if callee.name == "getattr" {
            // The attribute name is a runtime value (spec §7 kind 5,
            // `dynamic-attribute`): no selector can be derived statically,
            // so no `Load` constraint is generated at all and the target
            // gets a synthesized `UNKNOWN` instead.
            self.state.unknowns.record(
                UnknownKind::DynamicAttribute,
                site.clone(),
                "`getattr` with a non-literal attribute name".to_string(),
            );
            self.deliver_unknown(target.as_ref(), site, context, "dynamic-attribute");
            return;
        }

        let callee_pts = self.state.pts(callee);

        if callee_pts.is_empty() {
            if let Some(handler) = self.builtins.lookup(&callee.name) {
                self.invoke_builtin(site, context, handler, args, target.as_ref());
            } else {
                self.state.unknowns.record(
                    UnknownKind::CalleeEmpty,
                    site.clone(),
                    format!("call to `{}` with empty points-to set", callee.name),
                );
                self.deliver_unknown(target.as_ref(), site, context, "callee-empty");
            }
            return;
        }

        let mut any_handled = false;
        let objects: Vec<AbstractObject> = callee_pts.iter().cloned().collect();
        for obj in &objects {
            match obj.kind() {
                AllocKind::Function => {
                    any_handled = true;
                    self.dispatch_function_call(site, context, &target, obj, args, None, false);
                }
                AllocKind::Class => {
                    any_handled = true;
                    self.dispatch_constructor_call(site, context, &target, obj, args);
                }
                AllocKind::BoundMethod => {
                    any_handled = true;
                    self.dispatch_bound_method_call(site, context, &target, obj, args);
                }
                _ => {}
            }
        }

        if !any_handled {
            if looks_like_constructor(&callee.name) {
                self.dispatch_uppercase_heuristic_constructor(site, context, &target, &callee.name);
            } else {
                self.state.unknowns.record(
                    UnknownKind::CalleeNonCallable,
                    site.clone(),
                    format!("`{}` points only to non-callable objects", callee.name),
                );
                self.deliver_unknown(target.as_ref(), site, context, "callee-non-callable");
            }
        }
    }

    fn invoke_builtin(
        &mut self,
        site: &Site,
        context: &Context,
        handler: crate::builtins::BuiltinHandler,
        args: &[Variable],
        target: Option<&Variable>,
    ) {
        let args = args.to_vec();
        let target = target.cloned();
        let call = BuiltinCall {
            context,
            site,
            args: &args,
            target: target.as_ref(),
        };
        let scope = target
            .as_ref()
            .map(|t| t.scope.clone())
            .or_else(|| args.first().map(|a| a.scope.clone()))
            .unwrap_or_else(|| ScopeId::Module("<builtin>".to_string()));
        self.temp_seq += 1;
        let mut counter = self.temp_seq;
        let mut temps = || {
            counter += 1;
            Variable::new(scope.clone(), format!("$bi{counter}"), context.clone())
        };
        let constraints = handler(&call, &mut temps);
        self.temp_seq = counter;
        for c in constraints {
            self.add_and_seed(c);
        }
    }

    fn dispatch_function_call(
        &mut self,
        site: &Site,
        caller_context: &Context,
        target: &Option<Variable>,
        func_obj: &AbstractObject,
        args: &[Variable],
        receiver: Option<&AbstractObject>,
        is_method_call: bool,
    ) {
        let qualified = func_obj.alloc.name.clone();
        let Some(func) = self.state.functions.get(&qualified).cloned() else {
            self.state.unknowns.record(
                UnknownKind::FunctionNotInRegistry,
                site.clone(),
                format!("`{qualified}` has no registered body"),
            );
            self.deliver_unknown(target.as_ref(), site, caller_context, "function-not-in-registry");
            return;
        };

        let meta = CallMetadata {
            call_site: site,
            callee_ident: &qualified,
            receiver_alloc: receiver.map(|r| &r.alloc),
            receiver_type: receiver.map(|r| r.alloc.name.as_str()),
            is_method_call,
        };
        let callee_context = self.selector.select(caller_context, &meta);
        self.state.register_context(callee_context.clone());

        let callee_scope = ScopeId::Function(qualified.clone());
        let mut param_idx = 0;
        if is_method_call {
            if let (Some(self_param), Some(receiver_obj)) = (func.params.first(), receiver) {
                let self_var = Variable::new(callee_scope.clone(), self_param.clone(), callee_context.clone());
                let grew = self.state.insert_var(&self_var, receiver_obj.clone());
                self.enqueue_var(grew, &self_var);
            }
            param_idx = 1;
        }
        for (param, arg) in func.params.iter().skip(param_idx).zip(args.iter()) {
            let param_var = Variable::new(callee_scope.clone(), param.clone(), callee_context.clone());
            self.add_and_seed(Constraint::new(
                ConstraintKind::Copy {
                    target: param_var,
                    source: arg.clone(),
                },
                caller_context.clone(),
                site.clone(),
            ));
        }

        if let Some(t) = target {
            self.add_and_seed(Constraint::new(
                ConstraintKind::Return {
                    target: t.clone(),
                    callee_scope: callee_scope.clone(),
                    callee_context: callee_context.clone(),
                },
                caller_context.clone(),
                site.clone(),
            ));
        }

        let caller_scope_str = scope_name_of(&func_obj.alloc.site, caller_context);
        self.state.add_call_edge(
            CallGraphNode {
                scope: caller_scope_str,
                context: caller_context.clone(),
            },
            CallGraphNode {
                scope: qualified.clone(),
                context: callee_context.clone(),
            },
            site.clone(),
        );

        let key = (qualified.clone(), callee_context.clone());
        if !self.state.translated.contains(&key) {
            self.state.translated.insert(key);
            let before = self.state.constraint_count();
            self.translator
                .translate_function(&mut self.state, &mut self.hierarchy, &qualified, &func, callee_context);
            let after = self.state.constraint_count();
            for id in before..after {
                self.apply_constraint(id);
            }
        }
    }

    fn dispatch_constructor_call(
        &mut self,
        site: &Site,
        caller_context: &Context,
        target: &Option<Variable>,
        class_obj: &AbstractObject,
        args: &[Variable],
    ) {
        let class_id = class_obj.alloc.name.clone();
        let instance_alloc = AllocSite::new(site.clone(), AllocKind::Object, class_id.clone());
        let instance = AbstractObject::new(instance_alloc, caller_context.clone());
        self.state.register_context(caller_context.clone());

        if let Some(t) = target {
            let grew = self.state.insert_var(t, instance.clone());
            self.enqueue_var(grew, t);
        }

        let mro: Vec<String> = self.hierarchy.mro(&class_id).to_vec();
        let mut init_bound: Option<AbstractObject> = None;
        for cname in &mro {
            if let Some(cobj) = self.state.class_object(cname).cloned() {
                let field = Field::new(cobj, Selector::Attr("__init__".to_string()));
                let fp = self.state.field_pts(&field);
                if let Some(func_obj) = fp.of_kind(AllocKind::Function).next() {
                    init_bound = Some(func_obj.clone());
                    break;
                }
            }
        }

        if let Some(func_obj) = init_bound {
            self.dispatch_function_call(site, caller_context, &None, &func_obj, args, Some(&instance), true);
        }
        // No __init__ found: the instance is still allocated and usable;
        // any attributes it gains come from wherever else it is stored to.
    }

    fn dispatch_bound_method_call(
        &mut self,
        site: &Site,
        caller_context: &Context,
        target: &Option<Variable>,
        bound_method: &AbstractObject,
        args: &[Variable],
    ) {
        let func_field = Field::new(bound_method.clone(), Selector::Func);
        let self_field = Field::new(bound_method.clone(), Selector::SelfRef);
        let func_pts = self.state.field_pts(&func_field);
        let self_pts = self.state.field_pts(&self_field);
        let receiver = self_pts.iter().next().cloned();
        for func_obj in func_pts.of_kind(AllocKind::Function) {
            self.dispatch_function_call(site, caller_context, target, func_obj, args, receiver.as_ref(), true);
        }
    }

    /// Spec §4.4: "an unresolved callable whose identifier starts with an
    /// uppercase letter is conservatively treated as a constructor-like
    /// call", producing an `OBJECT` with no further structure since the
    /// real class is unknown.
    fn dispatch_uppercase_heuristic_constructor(
        &mut self,
        site: &Site,
        context: &Context,
        target: &Option<Variable>,
        ident: &str,
    ) {
        let alloc = AllocSite::new(site.clone(), AllocKind::Object, format!("heuristic:{ident}"));
        let obj = AbstractObject::new(alloc, context.clone());
        if let Some(t) = target {
            let grew = self.state.insert_var(t, obj);
            self.enqueue_var(grew, t);
        }
    }
}

fn looks_like_constructor(ident: &str) -> bool {
    ident.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

/// The canonical `AllocSite` for a `MODULE` object, keyed only by name so
/// every importer of the same module produces the identical object
/// regardless of where the `import` statement sits.
pub fn module_alloc(module: &str) -> AllocSite {
    AllocSite::new(Site::new(module.to_string(), 0, 0), AllocKind::Module, module.to_string())
}

/// Best-effort caller scope label for call-graph edges: derived from the
/// allocation site's file rather than tracked explicitly, since constraints
/// don't carry the enclosing function's qualified name directly. Good
/// enough for a human-readable call graph; not used for analysis decisions.
fn scope_name_of(_site: &Site, context: &Context) -> String {
    format!("<caller in {context:?}>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pta_hir::domain::{Site as DomainSite};
    use pta_hir::ir::{Expr, IrFunction, Stmt};
    use pta_hir::AnalysisConfig;

    fn site(line: u32) -> DomainSite {
        DomainSite::new("m.py", line, 0)
    }

    #[test]
    fn direct_call_propagates_argument_to_parameter() {
        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        let func = IrFunction {
            name: "f".to_string(),
            params: vec!["x".to_string()],
            decorators: vec![],
            body: vec![Stmt::Return {
                value: Some(Expr::Var("x".to_string())),
                site: site(2),
            }],
            free_vars: vec![],
            site: site(1),
        };
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![
                Stmt::DefFunction {
                    binding: "f".to_string(),
                    func,
                },
                Stmt::Copy {
                    target: "a".to_string(),
                    value: Expr::Literal(site(3)),
                    site: site(3),
                },
                Stmt::Call {
                    target: Some("r".to_string()),
                    callee: Expr::Var("f".to_string()),
                    args: vec![Expr::Var("a".to_string())],
                    site: site(4),
                },
            ],
        };
        solver.run(&module);
        let r = Variable::new(ScopeId::Module("m".to_string()), "r", Context::Empty);
        assert!(!solver.state.pts(&r).is_empty());
    }

    #[test]
    fn call_to_undefined_name_records_callee_empty() {
        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::Call {
                target: None,
                callee: Expr::Var("does_not_exist".to_string()),
                args: vec![],
                site: site(1),
            }],
        };
        solver.run(&module);
        assert_eq!(solver.state.unknowns.count(UnknownKind::CalleeEmpty), 1);
    }

    #[test]
    fn call_to_undefined_name_delivers_unknown_object_to_target() {
        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::Call {
                target: Some("r".to_string()),
                callee: Expr::Var("does_not_exist".to_string()),
                args: vec![],
                site: site(1),
            }],
        };
        solver.run(&module);
        let r = Variable::new(ScopeId::Module("m".to_string()), "r", Context::Empty);
        let pts = solver.state.pts(&r);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts.iter().next().unwrap().kind(), AllocKind::Unknown);
    }

    #[test]
    fn getattr_records_dynamic_attribute_and_delivers_unknown() {
        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::Call {
                target: Some("r".to_string()),
                callee: Expr::Var("getattr".to_string()),
                args: vec![],
                site: site(1),
            }],
        };
        solver.run(&module);
        assert_eq!(solver.state.unknowns.count(UnknownKind::DynamicAttribute), 1);
        let r = Variable::new(ScopeId::Module("m".to_string()), "r", Context::Empty);
        assert_eq!(solver.state.pts(&r).len(), 1);
    }

    #[test]
    fn builtin_list_call_resolves_without_unknown() {
        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![Stmt::Call {
                target: Some("r".to_string()),
                callee: Expr::Var("list".to_string()),
                args: vec![],
                site: site(1),
            }],
        };
        solver.run(&module);
        assert_eq!(solver.state.unknowns.count(UnknownKind::CalleeEmpty), 0);
        let r = Variable::new(ScopeId::Module("m".to_string()), "r", Context::Empty);
        assert!(!solver.state.pts(&r).is_empty());
    }

    #[test]
    fn method_dispatch_binds_self_and_runs_init() {
        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        let init = IrFunction {
            name: "__init__".to_string(),
            params: vec!["self".to_string()],
            decorators: vec![],
            body: vec![Stmt::StoreAttr {
                base: Expr::Var("self".to_string()),
                attr: "x".to_string(),
                value: Expr::Literal(site(2)),
                site: site(2),
            }],
            free_vars: vec![],
            site: site(2),
        };
        let class = pta_hir::ir::IrClass {
            name: "C".to_string(),
            bases: vec![],
            decorators: vec![],
            body: vec![Stmt::DefFunction {
                binding: "__init__".to_string(),
                func: init,
            }],
            site: site(1),
        };
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![
                Stmt::DefClass {
                    binding: "C".to_string(),
                    class,
                },
                Stmt::Call {
                    target: Some("inst".to_string()),
                    callee: Expr::Var("C".to_string()),
                    args: vec![],
                    site: site(3),
                },
            ],
        };
        solver.run(&module);
        let inst = Variable::new(ScopeId::Module("m".to_string()), "inst", Context::Empty);
        let pts = solver.state.pts(&inst);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts.iter().next().unwrap().kind(), AllocKind::Object);
    }

    #[test]
    fn attribute_read_off_a_class_base_also_binds() {
        let mut solver = Solver::new(AnalysisState::new(AnalysisConfig::default()));
        let m = IrFunction {
            name: "m".to_string(),
            params: vec!["self".to_string()],
            decorators: vec![],
            body: vec![Stmt::Return {
                value: Some(Expr::Literal(site(2))),
                site: site(2),
            }],
            free_vars: vec![],
            site: site(2),
        };
        let class = pta_hir::ir::IrClass {
            name: "C".to_string(),
            bases: vec![],
            decorators: vec![],
            body: vec![Stmt::DefFunction {
                binding: "m".to_string(),
                func: m,
            }],
            site: site(1),
        };
        let module = IrModule {
            name: "m".to_string(),
            functions: vec![],
            classes: vec![],
            body: vec![
                Stmt::DefClass {
                    binding: "C".to_string(),
                    class,
                },
                Stmt::LoadAttr {
                    target: "bm".to_string(),
                    base: Expr::Var("C".to_string()),
                    attr: "m".to_string(),
                    site: site(3),
                },
            ],
        };
        solver.run(&module);
        let bm = Variable::new(ScopeId::Module("m".to_string()), "bm", Context::Empty);
        let pts = solver.state.pts(&bm);
        assert_eq!(pts.len(), 1);
        let bound = pts.iter().next().unwrap();
        assert_eq!(bound.kind(), AllocKind::BoundMethod);
        let self_field = Field::new(bound.clone(), Selector::SelfRef);
        let self_pts = solver.state.field_pts(&self_field);
        assert_eq!(self_pts.len(), 1);
        assert_eq!(self_pts.iter().next().unwrap().kind(), AllocKind::Class);
    }
}
