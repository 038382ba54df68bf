//! Module dependency graph and cross-module summary composition, the
//! whole-program layer on top of `pta-core`'s single-module solver
//! (spec §4.8).

pub mod compose;

pub use compose::{Composer, ModuleGraph, ModuleSummary};
