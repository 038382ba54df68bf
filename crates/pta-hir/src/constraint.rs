//! The seven constraint forms of spec §4.1. Constraints are append-only:
//! adding one to the state enqueues the variables/fields it mentions
//! (`pta-core::state` does the enqueueing; this module only describes the
//! shape).

use crate::domain::{AllocSite, Context, Selector, Site, Variable};
use serde::{Deserialize, Serialize};

/// One of the seven constraint kinds. Every kind also carries a `Site` via
/// the enclosing `Constraint` for call-graph edges and debugging; `Alloc`
/// additionally needs the full `AllocSite` (kind + name) to know what it
/// allocates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// `v <- new S`. `pts(v, ctx) |= {(S, ctx)}`.
    Alloc { target: Variable, alloc: AllocSite },
    /// `v <- u`. `pts(v) |= pts(u)`.
    Copy { target: Variable, source: Variable },
    /// `v <- u.f`. For each `o` in `pts(u)`: `pts(v) |= pts(o.f)`.
    Load {
        target: Variable,
        base: Variable,
        selector: Selector,
    },
    /// `u.f <- v`. For each `o` in `pts(u)`: `pts(o.f) |= pts(v)`.
    Store {
        base: Variable,
        selector: Selector,
        value: Variable,
    },
    /// `v <- u(a1..an)`. Dispatch is handled by the solver's call-resolution
    /// procedure (spec §4.4); this constraint only records the shape. A
    /// method call's receiver is never a separate field here — `u` is
    /// produced by a preceding `Load` of the method attribute, which is
    /// where BOUND_METHOD synthesis happens (spec §4.4 item 2), so `u`'s
    /// points-to set already carries `__self__`/`__func__` for dispatch.
    Call {
        target: Option<Variable>,
        callee: Variable,
        args: Vec<Variable>,
    },
    /// `v <- ret(callee_ctx)`. `pts(v) |= pts($return in callee_ctx)`.
    Return {
        target: Variable,
        callee_scope: crate::domain::ScopeId,
        callee_context: Context,
    },
    /// `m <- import N`. Allocates a MODULE object; triggers module analysis
    /// within the configured depth budget (spec §4.8).
    Import { target: Variable, module: String },
}

/// A constraint plus the context/site metadata the spec requires for
/// call-graph edges and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub context: Context,
    pub site: Site,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, context: Context, site: Site) -> Self {
        Self {
            kind,
            context,
            site,
        }
    }
}
