//! Pure context-selection policy (spec §4.3). Stateless and deterministic:
//! the same `(caller_ctx, call_site, callee_ident, receiver...)` always
//! produces the same `Context`, which is what makes the solver's fixpoint
//! order deterministic.

use pta_hir::config::{ContextPolicyConfig, ContextPolicyKind};
use pta_hir::domain::{AllocKind, AllocSite, Context, Site};
use smallvec::SmallVec;

/// Everything the selector needs to know about a call site to produce a
/// callee context.
pub struct CallMetadata<'a> {
    pub call_site: &'a Site,
    pub callee_ident: &'a str,
    /// Present only for method-dispatch calls (spec §4.4: bound method /
    /// unbound method / constructor calls all have a receiver).
    pub receiver_alloc: Option<&'a AllocSite>,
    pub receiver_type: Option<&'a str>,
    pub is_method_call: bool,
}

#[derive(Debug, Clone)]
pub struct ContextSelector {
    policy: ContextPolicyConfig,
}

impl ContextSelector {
    pub fn new(policy: ContextPolicyConfig) -> Self {
        Self { policy }
    }

    pub fn select(&self, caller_ctx: &Context, meta: &CallMetadata<'_>) -> Context {
        match self.policy.kind {
            ContextPolicyKind::ZeroCfa => Context::Empty,
            ContextPolicyKind::KCfa => {
                Context::CallString(push_bounded_site(caller_ctx, meta.call_site, self.policy.depth))
            }
            ContextPolicyKind::NObj => {
                Context::Object(push_bounded_object(caller_ctx, meta, self.policy.depth))
            }
            ContextPolicyKind::NType => {
                Context::Type(push_bounded_type(caller_ctx, meta, self.policy.depth))
            }
            ContextPolicyKind::NRcv => {
                if meta.is_method_call {
                    Context::Receiver(push_bounded_object(caller_ctx, meta, self.policy.depth))
                } else {
                    // Plain function calls inherit the caller context
                    // unchanged under n-rcv (spec §4.3).
                    caller_ctx.clone()
                }
            }
            ContextPolicyKind::Hybrid => {
                let call_string =
                    push_bounded_site_hybrid(caller_ctx, meta.call_site, self.policy.hybrid_call_depth);
                let objects = push_bounded_object_hybrid(caller_ctx, meta, self.policy.hybrid_object_depth);
                Context::Hybrid {
                    call_string,
                    objects,
                }
            }
        }
    }
}

/// Synthesizes a placeholder allocation site for a plain (non-method) call
/// under object-sensitivity, per spec §4.3: "else synthesize
/// `call:<site>`".
fn synthetic_call_site_alloc(call_site: &Site) -> AllocSite {
    AllocSite::new(
        call_site.clone(),
        AllocKind::Unknown,
        format!("call:{}:{}:{}", call_site.file, call_site.line, call_site.column),
    )
}

fn push_bounded_site(caller_ctx: &Context, site: &Site, depth: usize) -> SmallVec<[Site; 4]> {
    let mut seq: SmallVec<[Site; 4]> = match caller_ctx {
        Context::CallString(s) => s.clone(),
        _ => SmallVec::new(),
    };
    seq.push(site.clone());
    truncate_front(&mut seq, depth);
    seq
}

fn push_bounded_site_hybrid(caller_ctx: &Context, site: &Site, depth: usize) -> SmallVec<[Site; 2]> {
    let mut seq: SmallVec<[Site; 2]> = match caller_ctx {
        Context::Hybrid { call_string, .. } => call_string.clone(),
        _ => SmallVec::new(),
    };
    seq.push(site.clone());
    truncate_front(&mut seq, depth);
    seq
}

fn push_bounded_object(
    caller_ctx: &Context,
    meta: &CallMetadata<'_>,
    depth: usize,
) -> SmallVec<[AllocSite; 2]> {
    let mut seq: SmallVec<[AllocSite; 2]> = match caller_ctx {
        Context::Object(s) | Context::Receiver(s) => s.clone(),
        _ => SmallVec::new(),
    };
    let next = meta
        .receiver_alloc
        .cloned()
        .unwrap_or_else(|| synthetic_call_site_alloc(meta.call_site));
    seq.push(next);
    truncate_front(&mut seq, depth);
    seq
}

fn push_bounded_object_hybrid(
    caller_ctx: &Context,
    meta: &CallMetadata<'_>,
    depth: usize,
) -> SmallVec<[AllocSite; 2]> {
    let mut seq: SmallVec<[AllocSite; 2]> = match caller_ctx {
        Context::Hybrid { objects, .. } => objects.clone(),
        _ => SmallVec::new(),
    };
    let next = meta
        .receiver_alloc
        .cloned()
        .unwrap_or_else(|| synthetic_call_site_alloc(meta.call_site));
    seq.push(next);
    truncate_front(&mut seq, depth);
    seq
}

fn push_bounded_type(
    caller_ctx: &Context,
    meta: &CallMetadata<'_>,
    depth: usize,
) -> SmallVec<[String; 2]> {
    let mut seq: SmallVec<[String; 2]> = match caller_ctx {
        Context::Type(s) => s.clone(),
        _ => SmallVec::new(),
    };
    let next = meta
        .receiver_type
        .map(str::to_string)
        .unwrap_or_else(|| meta.callee_ident.to_string());
    seq.push(next);
    truncate_front(&mut seq, depth);
    seq
}

fn truncate_front<T, const N: usize>(seq: &mut SmallVec<[T; N]>, depth: usize) {
    while seq.len() > depth {
        seq.remove(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pta_hir::config::ContextPolicyKind as Kind;

    fn site(line: u32) -> Site {
        Site::new("m.py", line, 0)
    }

    #[test]
    fn zero_cfa_always_empty() {
        let sel = ContextSelector::new(ContextPolicyConfig {
            kind: Kind::ZeroCfa,
            depth: 0,
            hybrid_call_depth: 0,
            hybrid_object_depth: 0,
        });
        let meta = CallMetadata {
            call_site: &site(1),
            callee_ident: "f",
            receiver_alloc: None,
            receiver_type: None,
            is_method_call: false,
        };
        assert_eq!(sel.select(&Context::Empty, &meta), Context::Empty);
    }

    #[test]
    fn k_cfa_truncates_to_depth() {
        let sel = ContextSelector::new(ContextPolicyConfig {
            kind: Kind::KCfa,
            depth: 2,
            hybrid_call_depth: 0,
            hybrid_object_depth: 0,
        });
        let mut ctx = Context::Empty;
        for i in 1..=3 {
            let meta = CallMetadata {
                call_site: &site(i),
                callee_ident: "f",
                receiver_alloc: None,
                receiver_type: None,
                is_method_call: false,
            };
            ctx = sel.select(&ctx, &meta);
        }
        match &ctx {
            Context::CallString(s) => {
                assert_eq!(s.len(), 2);
                assert_eq!(s[0].line, 2);
                assert_eq!(s[1].line, 3);
            }
            other => panic!("expected CallString, got {other:?}"),
        }
    }

    #[test]
    fn n_rcv_only_mutates_on_method_calls() {
        let sel = ContextSelector::new(ContextPolicyConfig {
            kind: Kind::NRcv,
            depth: 1,
            hybrid_call_depth: 0,
            hybrid_object_depth: 0,
        });
        let caller_ctx = Context::Empty;
        let plain_call = CallMetadata {
            call_site: &site(1),
            callee_ident: "f",
            receiver_alloc: None,
            receiver_type: None,
            is_method_call: false,
        };
        assert_eq!(sel.select(&caller_ctx, &plain_call), caller_ctx);
    }

    #[test]
    fn n_obj_synthesizes_call_site_for_plain_calls() {
        let sel = ContextSelector::new(ContextPolicyConfig {
            kind: Kind::NObj,
            depth: 1,
            hybrid_call_depth: 0,
            hybrid_object_depth: 0,
        });
        let meta = CallMetadata {
            call_site: &site(7),
            callee_ident: "f",
            receiver_alloc: None,
            receiver_type: None,
            is_method_call: false,
        };
        let ctx = sel.select(&Context::Empty, &meta);
        match ctx {
            Context::Object(s) => assert_eq!(s.len(), 1),
            other => panic!("expected Object, got {other:?}"),
        }
    }
}
