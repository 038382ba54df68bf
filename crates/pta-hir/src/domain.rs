//! Immutable value types shared by every layer of the engine: allocation
//! sites, contexts, abstract objects, variables, fields and points-to sets.
//! Everything here is hashable and structurally equal; nothing here mutates
//! state — that lives in `pta-core::state`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A source position. Shared by allocation sites and call sites; carries no
/// `kind` tag of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Site {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Site {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// Tag distinguishing what an `AllocSite` allocates. See spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocKind {
    Const,
    Object,
    Function,
    Class,
    Module,
    Method,
    BoundMethod,
    Exception,
    GenFrame,
    List,
    Dict,
    Tuple,
    Set,
    Cell,
    Unknown,
}

/// `(file, line, column, kind, name)`. Two allocation sites are equal iff
/// every field matches — this is the engine's only notion of syntactic
/// allocation identity; heap cloning comes from pairing with a `Context`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllocSite {
    pub site: Site,
    pub kind: AllocKind,
    pub name: String,
}

impl AllocSite {
    pub fn new(site: Site, kind: AllocKind, name: impl Into<String>) -> Self {
        Self {
            site,
            kind,
            name: name.into(),
        }
    }

    /// A fresh `UNKNOWN` allocation for the unknown-resolution tracker
    /// (spec §7). `discriminator` keeps repeated unknowns at the same call
    /// site from collapsing into one object when that would lose precision
    /// the tracker wants to preserve (e.g. per-category unknowns).
    pub fn unknown_at(site: Site, discriminator: impl Into<String>) -> Self {
        Self::new(site, AllocKind::Unknown, discriminator)
    }
}

/// An opaque, hashable, immutable analysis context. The five concrete
/// shapes from spec §3; `Empty` is the distinguished singleton produced by
/// `0-cfa` and by conservative fallback (spec §7, `alloc-context-failure`).
///
/// Object/Receiver contexts key on the receiver's `AllocSite`, not its full
/// `AbstractObject` — this mirrors how the spec phrases n-obj/n-rcv
/// ("sequence of up to n receiver allocation-site identifiers") and avoids
/// `Context` needing to embed itself through `AbstractObject`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Context {
    #[default]
    Empty,
    CallString(SmallVec<[Site; 4]>),
    Object(SmallVec<[AllocSite; 2]>),
    Type(SmallVec<[String; 2]>),
    Receiver(SmallVec<[AllocSite; 2]>),
    Hybrid {
        call_string: SmallVec<[Site; 2]>,
        objects: SmallVec<[AllocSite; 2]>,
    },
}

impl Context {
    pub fn is_empty(&self) -> bool {
        matches!(self, Context::Empty)
    }

    /// Length of the bounded internal sequence(s); used by the "context
    /// budget" testable property (spec §8).
    pub fn depth(&self) -> usize {
        match self {
            Context::Empty => 0,
            Context::CallString(s) => s.len(),
            Context::Object(s) | Context::Receiver(s) => s.len(),
            Context::Type(s) => s.len(),
            Context::Hybrid {
                call_string,
                objects,
            } => call_string.len().max(objects.len()),
        }
    }
}

/// `(AllocSite, Context)`. The Cartesian pairing that gives heap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbstractObject {
    pub alloc: AllocSite,
    pub context: Context,
}

impl AbstractObject {
    pub fn new(alloc: AllocSite, context: Context) -> Self {
        Self { alloc, context }
    }

    pub fn kind(&self) -> AllocKind {
        self.alloc.kind
    }
}

/// Identifies the lexical scope a `Variable` belongs to: a module or a
/// function/method body. Distinct from `Context`, which tracks the calling
/// history rather than lexical nesting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeId {
    Module(String),
    Function(String),
}

/// `(scope, name, context)`. Variables in the same lexical scope but
/// different contexts are distinct entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub scope: ScopeId,
    pub name: String,
    pub context: Context,
}

impl Variable {
    pub fn new(scope: ScopeId, name: impl Into<String>, context: Context) -> Self {
        Self {
            scope,
            name: name.into(),
            context,
        }
    }

    /// The reserved `$return` variable of a function scope in a given
    /// calling context (spec §4.1, Return constraint).
    pub fn return_slot(scope: ScopeId, context: Context) -> Self {
        Self::new(scope, "$return", context)
    }

    /// The reserved `$raised` variable accumulating exception flow into
    /// catch targets (spec §4.6).
    pub fn raised_slot(scope: ScopeId, context: Context) -> Self {
        Self::new(scope, "$raised", context)
    }
}

/// A field selector: a named attribute, a positional/element tag, or a
/// reserved internal selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    Attr(String),
    /// Collapsed positional selector for list/tuple/set elements.
    Elem,
    /// Statically-known element index, used only when
    /// `field_sensitivity_mode = attr-name` (SPEC_FULL §4 Open Question 1).
    ElemAt(i64),
    /// Collapsed value selector for dict values.
    Value,
    SelfRef,
    Func,
    Closure,
    Bases,
    Dict,
    /// The single cell slot of a `CELL` object.
    CellValue,
}

/// `(base_object, selector)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub base: AbstractObject,
    pub selector: Selector,
}

impl Field {
    pub fn new(base: AbstractObject, selector: Selector) -> Self {
        Self { base, selector }
    }
}

/// An ordered, deduplicated collection of `AbstractObject`s. Insertion
/// order is preserved so solver runs are deterministic; set semantics
/// (union is join, empty is bottom) are what the spec actually requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsToSet(indexmap::IndexSet<AbstractObject>);

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(obj: AbstractObject) -> Self {
        let mut s = Self::new();
        s.insert(obj);
        s
    }

    /// Returns `true` if `obj` was newly added (the caller should enqueue
    /// dependents in that case).
    pub fn insert(&mut self, obj: AbstractObject) -> bool {
        self.0.insert(obj)
    }

    /// Unions `other` into `self`; returns `true` if anything grew.
    pub fn union_from(&mut self, other: &PointsToSet) -> bool {
        let mut grew = false;
        for obj in other.iter() {
            if self.insert(obj.clone()) {
                grew = true;
            }
        }
        grew
    }

    pub fn contains(&self, obj: &AbstractObject) -> bool {
        self.0.contains(obj)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbstractObject> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Objects of a particular kind only, e.g. all callables in a callee
    /// points-to set (spec §4.4 call resolution).
    pub fn of_kind(&self, kind: AllocKind) -> impl Iterator<Item = &AbstractObject> {
        self.0.iter().filter(move |o| o.kind() == kind)
    }
}

impl<'a> IntoIterator for &'a PointsToSet {
    type Item = &'a AbstractObject;
    type IntoIter = indexmap::set::Iter<'a, AbstractObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<AbstractObject> for PointsToSet {
    fn from_iter<T: IntoIterator<Item = AbstractObject>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Stable 64-bit digest used by the MRO cache key (spec §4.5: "cached MRO
/// is recomputed only if the class's base tuple is updated").
pub fn stable_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
