//! Built-in summary library (spec §4.7): a table mapping qualified
//! callable identifiers to constraint-generating handlers, so the solver
//! never needs a real body for `list`, `print`, `isinstance`, and friends.

use pta_hir::constraint::{Constraint, ConstraintKind};
use pta_hir::domain::{AllocKind, AllocSite, Context, Selector, Site, Variable};

pub struct BuiltinCall<'a> {
    pub context: &'a Context,
    pub site: &'a Site,
    pub args: &'a [Variable],
    pub target: Option<&'a Variable>,
}

pub type TempFactory<'a> = dyn FnMut() -> Variable + 'a;
pub type BuiltinHandler = fn(&BuiltinCall<'_>, &mut TempFactory<'_>) -> Vec<Constraint>;

pub struct BuiltinTable {
    handlers: std::collections::HashMap<&'static str, BuiltinHandler>,
}

impl Default for BuiltinTable {
    fn default() -> Self {
        let mut handlers: std::collections::HashMap<&'static str, BuiltinHandler> =
            std::collections::HashMap::new();

        handlers.insert("list", list_constructor as BuiltinHandler);
        handlers.insert("tuple", tuple_constructor as BuiltinHandler);
        handlers.insert("set", set_constructor as BuiltinHandler);
        // No distinct `AllocKind` exists for a frozen set; it's immutable
        // but otherwise the same shape, so it shares `Set`'s allocation kind.
        handlers.insert("frozenset", set_constructor as BuiltinHandler);
        handlers.insert("dict", dict_constructor as BuiltinHandler);

        for name in [
            "len", "isinstance", "hasattr", "type", "id", "hash", "callable", "repr", "str",
        ] {
            handlers.insert(name, identity_inspection as BuiltinHandler);
        }

        for name in ["map", "filter", "sorted", "reversed", "zip", "enumerate"] {
            handlers.insert(name, higher_order_list as BuiltinHandler);
        }
        for name in ["iter", "next"] {
            handlers.insert(name, higher_order_gen_frame as BuiltinHandler);
        }

        for name in ["staticmethod", "classmethod", "property"] {
            handlers.insert(name, descriptor_decorator as BuiltinHandler);
        }

        handlers.insert("print", io_const_return as BuiltinHandler);
        handlers.insert("open", open_builtin as BuiltinHandler);

        Self { handlers }
    }
}

impl BuiltinTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<BuiltinHandler> {
        self.handlers.get(qualified_name).copied()
    }

    pub fn is_builtin(&self, qualified_name: &str) -> bool {
        self.handlers.contains_key(qualified_name)
    }
}

fn alloc_target(call: &BuiltinCall<'_>, kind: AllocKind, name: &str) -> Vec<Constraint> {
    let Some(target) = call.target else {
        return Vec::new();
    };
    let alloc = AllocSite::new(call.site.clone(), kind, name);
    vec![Constraint::new(
        ConstraintKind::Alloc {
            target: target.clone(),
            alloc,
        },
        call.context.clone(),
        call.site.clone(),
    )]
}

/// `list`/`tuple`/`set`/`frozenset`: allocate a new container of the given
/// kind; wire each argument's element selector through, covering the
/// "argument is itself a container" case without needing to inspect its
/// points-to set up front. Selector wiring is uniform across all four; only
/// the allocated `AllocKind` distinguishes them.
fn container_constructor_of_kind(call: &BuiltinCall<'_>, temps: &mut TempFactory<'_>, kind: AllocKind) -> Vec<Constraint> {
    let mut out = alloc_target(call, kind, "container-ctor");
    let Some(target) = call.target else { return out };
    for arg in call.args {
        out.extend(wire_elem_through_temp(call, target, arg, temps));
    }
    out
}

fn list_constructor(call: &BuiltinCall<'_>, temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    container_constructor_of_kind(call, temps, AllocKind::List)
}

fn tuple_constructor(call: &BuiltinCall<'_>, temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    container_constructor_of_kind(call, temps, AllocKind::Tuple)
}

fn set_constructor(call: &BuiltinCall<'_>, temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    container_constructor_of_kind(call, temps, AllocKind::Set)
}

fn dict_constructor(call: &BuiltinCall<'_>, temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    let mut out = alloc_target(call, AllocKind::Dict, "dict-ctor");
    let Some(target) = call.target else { return out };
    for arg in call.args {
        let temp = temps();
        out.push(Constraint::new(
            ConstraintKind::Load {
                target: temp.clone(),
                base: arg.clone(),
                selector: Selector::Value,
            },
            call.context.clone(),
            call.site.clone(),
        ));
        out.push(Constraint::new(
            ConstraintKind::Store {
                base: target.clone(),
                selector: Selector::Value,
                value: temp,
            },
            call.context.clone(),
            call.site.clone(),
        ));
    }
    out
}

fn wire_elem_through_temp(
    call: &BuiltinCall<'_>,
    target: &Variable,
    arg: &Variable,
    temps: &mut TempFactory<'_>,
) -> Vec<Constraint> {
    let temp = temps();
    vec![
        Constraint::new(
            ConstraintKind::Load {
                target: temp.clone(),
                base: arg.clone(),
                selector: Selector::Elem,
            },
            call.context.clone(),
            call.site.clone(),
        ),
        Constraint::new(
            ConstraintKind::Store {
                base: target.clone(),
                selector: Selector::Elem,
                value: temp,
            },
            call.context.clone(),
            call.site.clone(),
        ),
    ]
}

/// `len`, `isinstance`, `type`, ...: allocate a CONST result; the input is
/// never a source of the result's identity.
fn identity_inspection(call: &BuiltinCall<'_>, _temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    alloc_target(call, AllocKind::Const, "inspection-result")
}

/// `map`, `filter`, `sorted`, ...: conservatively allocate a LIST, wiring
/// every argument's element selector into it (the iterable argument's
/// position varies by builtin, so all positions are wired).
fn higher_order_list(call: &BuiltinCall<'_>, temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    let mut out = alloc_target(call, AllocKind::List, "higher-order-result");
    let Some(target) = call.target else { return out };
    for arg in call.args {
        out.extend(wire_elem_through_temp(call, target, arg, temps));
    }
    out
}

fn higher_order_gen_frame(call: &BuiltinCall<'_>, temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    let mut out = alloc_target(call, AllocKind::GenFrame, "higher-order-gen-frame");
    let Some(target) = call.target else { return out };
    for arg in call.args {
        out.extend(wire_elem_through_temp(call, target, arg, temps));
    }
    out
}

/// `staticmethod`/`classmethod`/`property`: a descriptor-like object whose
/// `__func__` is the argument (spec §4.4 decorators, §4.7).
fn descriptor_decorator(call: &BuiltinCall<'_>, _temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    let mut out = alloc_target(call, AllocKind::Object, "descriptor");
    let Some(target) = call.target else { return out };
    if let Some(func_arg) = call.args.first() {
        out.push(Constraint::new(
            ConstraintKind::Store {
                base: target.clone(),
                selector: Selector::Func,
                value: func_arg.clone(),
            },
            call.context.clone(),
            call.site.clone(),
        ));
    }
    out
}

fn io_const_return(call: &BuiltinCall<'_>, _temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    alloc_target(call, AllocKind::Const, "io-result")
}

fn open_builtin(call: &BuiltinCall<'_>, _temps: &mut TempFactory<'_>) -> Vec<Constraint> {
    alloc_target(call, AllocKind::Object, "file-handle")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pta_hir::domain::ScopeId;

    fn var(name: &str) -> Variable {
        Variable::new(ScopeId::Module("m".into()), name, Context::Empty)
    }

    #[test]
    fn table_knows_container_constructors() {
        let table = BuiltinTable::new();
        assert!(table.is_builtin("list"));
        assert!(table.is_builtin("dict"));
        assert!(!table.is_builtin("my_user_function"));
    }

    #[test]
    fn list_constructor_allocates_and_wires_elements() {
        let table = BuiltinTable::new();
        let handler = table.lookup("list").unwrap();
        let site = Site::new("m.py", 1, 0);
        let target = var("t");
        let arg = var("xs");
        let call = BuiltinCall {
            context: &Context::Empty,
            site: &site,
            args: &[arg],
            target: Some(&target),
        };
        let mut counter = 0;
        let mut temps = || {
            counter += 1;
            var(&format!("$tmp{counter}"))
        };
        let constraints = handler(&call, &mut temps);
        assert!(constraints
            .iter()
            .any(|c| matches!(c.kind, ConstraintKind::Alloc { .. })));
        assert!(constraints
            .iter()
            .any(|c| matches!(c.kind, ConstraintKind::Load { .. })));
        assert!(constraints
            .iter()
            .any(|c| matches!(c.kind, ConstraintKind::Store { .. })));
    }

    #[test]
    fn container_constructors_allocate_distinct_kinds() {
        let table = BuiltinTable::new();
        let site = Site::new("m.py", 1, 0);
        let target = var("t");
        let call = BuiltinCall {
            context: &Context::Empty,
            site: &site,
            args: &[],
            target: Some(&target),
        };
        let mut temps = || var("$unused");

        let kind_of = |builtin: &str| {
            let handler = table.lookup(builtin).unwrap();
            let constraints = handler(&call, &mut temps);
            constraints
                .into_iter()
                .find_map(|c| match c.kind {
                    ConstraintKind::Alloc { alloc, .. } => Some(alloc.kind),
                    _ => None,
                })
                .unwrap()
        };

        assert_eq!(kind_of("list"), AllocKind::List);
        assert_eq!(kind_of("tuple"), AllocKind::Tuple);
        assert_eq!(kind_of("set"), AllocKind::Set);
        assert_eq!(kind_of("frozenset"), AllocKind::Set);
    }

    #[test]
    fn inspection_builtins_do_not_wire_arguments() {
        let table = BuiltinTable::new();
        let handler = table.lookup("isinstance").unwrap();
        let site = Site::new("m.py", 1, 0);
        let target = var("t");
        let call = BuiltinCall {
            context: &Context::Empty,
            site: &site,
            args: &[var("x"), var("int")],
            target: Some(&target),
        };
        let mut temps = || var("$unused");
        let constraints = handler(&call, &mut temps);
        assert_eq!(constraints.len(), 1);
        assert!(matches!(constraints[0].kind, ConstraintKind::Alloc { .. }));
    }
}
