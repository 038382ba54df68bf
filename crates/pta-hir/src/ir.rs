//! The CFG-per-function input form consumed from the external IR builder
//! (spec §6). The core never parses source; it only walks these types.
//! Shaped after the teacher's `depyler-core::hir` statement/expression
//! enums, generalized with site info, decorators, closures and the
//! additional statement kinds (with/for-iter desugar hooks, yield/await,
//! raise/catch) the spec's translator requires that a transpilation-only
//! HIR does not need to carry.

use crate::domain::Site;
use serde::{Deserialize, Serialize};

pub type Name = String;

/// A whole analysis unit as the module finder hands it to the core
/// (spec §6, "Consumed from the module finder").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrModule {
    pub name: String,
    pub functions: Vec<IrFunction>,
    pub classes: Vec<IrClass>,
    /// Module-level statements executed in module scope (includes
    /// top-level imports, assignments, and class/function definitions that
    /// are not nested inside another function).
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrFunction {
    pub name: Name,
    pub params: Vec<Name>,
    /// Decorators applied innermost-first, e.g. `@a @b def f` -> `[b, a]`
    /// is NOT assumed; the translator applies them in declaration order
    /// per spec §4.4.
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
    /// Free variables captured from an enclosing scope; each becomes a
    /// `CELL` object reachable through `__closure__` (spec §4.6, §9).
    pub free_vars: Vec<Name>,
    pub site: Site,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrClass {
    pub name: Name,
    /// Multiple inheritance: ordered list of immediate base names.
    pub bases: Vec<Name>,
    pub decorators: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub site: Site,
}

/// One CFG statement. Variants correspond 1:1 to the fixed statement kind
/// set enumerated in spec §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Copy {
        target: Name,
        value: Expr,
        site: Site,
    },
    StoreAttr {
        base: Expr,
        attr: Name,
        value: Expr,
        site: Site,
    },
    LoadAttr {
        target: Name,
        base: Expr,
        attr: Name,
        site: Site,
    },
    /// `index = None` models a subscript whose key is not statically known;
    /// `Some(_)` carries a statically-known literal key (SPEC_FULL §4 Open
    /// Question 1).
    StoreSubscript {
        base: Expr,
        index: Option<SubscriptKey>,
        value: Expr,
        site: Site,
    },
    LoadSubscript {
        target: Name,
        base: Expr,
        index: Option<SubscriptKey>,
        site: Site,
    },
    Call {
        target: Option<Name>,
        callee: Expr,
        args: Vec<Expr>,
        site: Site,
    },
    Return {
        value: Option<Expr>,
        site: Site,
    },
    DefFunction {
        binding: Name,
        func: IrFunction,
    },
    DefClass {
        binding: Name,
        class: IrClass,
    },
    Import {
        target: Name,
        module: Name,
        site: Site,
    },
    ImportFrom {
        target: Name,
        module: Name,
        item: Name,
        site: Site,
    },
    Raise {
        exception: Option<Expr>,
        site: Site,
    },
    /// Binds the implicit `$raised` accumulator into `target` (spec §4.6:
    /// "the design treats catch as a Copy ... no path-sensitive
    /// refinement is required").
    Catch {
        target: Name,
        site: Site,
    },
    Yield {
        value: Expr,
        site: Site,
    },
    Await {
        target: Name,
        value: Expr,
        site: Site,
    },
    /// `temp = m.__enter__(); target = temp` at `with` entry.
    WithEnter {
        target: Name,
        manager: Expr,
        site: Site,
    },
    /// `m.__exit__(None, None, None)` at `with` exit.
    WithExit {
        manager: Expr,
        site: Site,
    },
    /// `iter = c.__iter__()`.
    ForIter {
        iter_binding: Name,
        iterable: Expr,
        site: Site,
    },
    /// `item = iter.__next__()`, one iteration's worth (spec §4.6: "one
    /// iteration's constraints suffice because of monotone
    /// over-approximation").
    ForNext {
        target: Name,
        iter_binding: Name,
        site: Site,
    },
    /// Translated to the named dunder method on `left` with `right` as the
    /// sole argument (spec §4.6).
    BinaryOp {
        target: Name,
        dunder: Name,
        left: Expr,
        right: Expr,
        site: Site,
    },
    Del {
        target: Name,
        site: Site,
    },
    /// SSA-style merge point; the translator treats it as a multi-source
    /// Copy.
    Phi {
        target: Name,
        sources: Vec<Name>,
        site: Site,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptKey {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Var(Name),
    /// A constant/literal; the translator allocates a `CONST` object at
    /// `site` for it.
    Literal(Site),
    List { elements: Vec<Expr>, site: Site },
    Dict {
        entries: Vec<(Expr, Expr)>,
        site: Site,
    },
    Tuple { elements: Vec<Expr>, site: Site },
    Set { elements: Vec<Expr>, site: Site },
}

impl Expr {
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name.as_str()),
            _ => None,
        }
    }
}
