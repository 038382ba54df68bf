//! The engine's configuration surface (spec §6). Shaped after the
//! teacher's `depyler-annotations::TranspilationAnnotations`: a flat struct
//! of enums/bools with a `Default` impl, validated at construction by a
//! dedicated `thiserror` error rather than during solving.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown context policy: {0}")]
    UnknownContextPolicy(String),
    #[error("context depth must be >= 0, got {0}")]
    InvalidDepth(i64),
    #[error("max_import_depth must be >= 0, got {0}")]
    InvalidImportDepth(i64),
}

/// One of the six context-selection policies of spec §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextPolicyKind {
    ZeroCfa,
    KCfa,
    NObj,
    NType,
    NRcv,
    Hybrid,
}

/// A parsed, validated `context_policy` configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPolicyConfig {
    pub kind: ContextPolicyKind,
    /// Depth `k`/`n` for single-sequence policies; unused for `ZeroCfa`.
    pub depth: usize,
    /// For `Hybrid`, the independent call-string (`K`) and object (`N`)
    /// bounds; `depth` is ignored when `kind == Hybrid`.
    pub hybrid_call_depth: usize,
    pub hybrid_object_depth: usize,
}

impl ContextPolicyConfig {
    pub fn zero_cfa() -> Self {
        Self {
            kind: ContextPolicyKind::ZeroCfa,
            depth: 0,
            hybrid_call_depth: 0,
            hybrid_object_depth: 0,
        }
    }

    /// Parses strings like `"0-cfa"`, `"2-cfa"`, `"1-obj"`, `"3-type"`,
    /// `"2-rcv"`, `"2c1o"` (hybrid: 2 call-string, 1 object).
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        if spec == "0-cfa" {
            return Ok(Self::zero_cfa());
        }
        if let Some(rest) = spec.strip_suffix("-cfa") {
            let depth = parse_depth(rest, spec)?;
            return Ok(Self {
                kind: ContextPolicyKind::KCfa,
                depth,
                hybrid_call_depth: 0,
                hybrid_object_depth: 0,
            });
        }
        if let Some(rest) = spec.strip_suffix("-obj") {
            let depth = parse_depth(rest, spec)?;
            return Ok(Self {
                kind: ContextPolicyKind::NObj,
                depth,
                hybrid_call_depth: 0,
                hybrid_object_depth: 0,
            });
        }
        if let Some(rest) = spec.strip_suffix("-type") {
            let depth = parse_depth(rest, spec)?;
            return Ok(Self {
                kind: ContextPolicyKind::NType,
                depth,
                hybrid_call_depth: 0,
                hybrid_object_depth: 0,
            });
        }
        if let Some(rest) = spec.strip_suffix("-rcv") {
            let depth = parse_depth(rest, spec)?;
            return Ok(Self {
                kind: ContextPolicyKind::NRcv,
                depth,
                hybrid_call_depth: 0,
                hybrid_object_depth: 0,
            });
        }
        if let Some(rest) = spec.strip_suffix('o') {
            if let Some((call_part, _)) = rest.split_once('c') {
                let hybrid_call_depth = parse_depth(call_part, spec)?;
                let object_part = &rest[call_part.len() + 1..];
                let hybrid_object_depth = parse_depth(object_part, spec)?;
                return Ok(Self {
                    kind: ContextPolicyKind::Hybrid,
                    depth: 0,
                    hybrid_call_depth,
                    hybrid_object_depth,
                });
            }
        }
        Err(ConfigError::UnknownContextPolicy(spec.to_string()))
    }
}

fn parse_depth(text: &str, original: &str) -> Result<usize, ConfigError> {
    text.parse::<i64>()
        .map_err(|_| ConfigError::UnknownContextPolicy(original.to_string()))
        .and_then(|d| {
            if d < 0 {
                Err(ConfigError::InvalidDepth(d))
            } else {
                Ok(d as usize)
            }
        })
}

/// `collapsed` merges all positional/element selectors of a container into
/// one; `attr-name` additionally distinguishes statically-known subscript
/// keys (SPEC_FULL §4 Open Question 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSensitivityMode {
    AttrName,
    Collapsed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub context_policy: ContextPolicyConfig,
    pub field_sensitivity_mode: FieldSensitivityMode,
    pub build_class_hierarchy: bool,
    pub use_mro: bool,
    pub max_import_depth: u32,
    pub enable_modular_analysis: bool,
    pub track_unknowns: bool,
    pub verbose: bool,
    pub log_unknown_details: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            context_policy: ContextPolicyConfig::zero_cfa(),
            field_sensitivity_mode: FieldSensitivityMode::AttrName,
            build_class_hierarchy: true,
            use_mro: true,
            max_import_depth: 16,
            enable_modular_analysis: true,
            track_unknowns: true,
            verbose: false,
            log_unknown_details: false,
        }
    }
}

impl AnalysisConfig {
    pub fn with_context_policy(mut self, spec: &str) -> Result<Self, ConfigError> {
        self.context_policy = ContextPolicyConfig::parse(spec)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_import_depth > i64::MAX as u32 {
            return Err(ConfigError::InvalidImportDepth(self.max_import_depth as i64));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cfa_parses() {
        let cfg = ContextPolicyConfig::parse("0-cfa").unwrap();
        assert_eq!(cfg.kind, ContextPolicyKind::ZeroCfa);
    }

    #[test]
    fn k_cfa_parses_depth() {
        let cfg = ContextPolicyConfig::parse("2-cfa").unwrap();
        assert_eq!(cfg.kind, ContextPolicyKind::KCfa);
        assert_eq!(cfg.depth, 2);
    }

    #[test]
    fn n_obj_and_n_rcv_parse() {
        assert_eq!(
            ContextPolicyConfig::parse("1-obj").unwrap().kind,
            ContextPolicyKind::NObj
        );
        assert_eq!(
            ContextPolicyConfig::parse("3-rcv").unwrap().kind,
            ContextPolicyKind::NRcv
        );
    }

    #[test]
    fn hybrid_parses_both_depths() {
        let cfg = ContextPolicyConfig::parse("2c1o").unwrap();
        assert_eq!(cfg.kind, ContextPolicyKind::Hybrid);
        assert_eq!(cfg.hybrid_call_depth, 2);
        assert_eq!(cfg.hybrid_object_depth, 1);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(ContextPolicyConfig::parse("bogus").is_err());
    }

    #[test]
    fn default_config_is_zero_cfa_and_sound() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.context_policy.kind, ContextPolicyKind::ZeroCfa);
        assert!(cfg.build_class_hierarchy);
        assert!(cfg.use_mro);
        assert!(cfg.validate().is_ok());
    }
}
