//! Domain model, constraint language, IR types, configuration and error
//! types for the points-to analysis engine. This crate defines values only
//! — no mutable state and no algorithms; see `pta-core` for the solver and
//! `pta-modules` for summary composition.

pub mod config;
pub mod constraint;
pub mod domain;
pub mod error;
pub mod ir;

pub use config::AnalysisConfig;
pub use domain::{AbstractObject, AllocSite, Context, Field, PointsToSet, Selector, Variable};
pub use error::{AnalysisError, AnalysisErrorKind, AnalysisResult};
