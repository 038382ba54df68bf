//! Property checks for MRO computation (spec §4.5): invariants that must
//! hold for any base structure, not just the worked examples in
//! `hierarchy.rs`'s unit tests.

use proptest::prelude::*;

use pta_core::hierarchy::ClassHierarchy;

proptest! {
    /// A single-inheritance chain always linearizes to itself, most-derived
    /// first, with no C3 fallback needed -- there's no multiple inheritance
    /// for C3 to disagree about.
    #[test]
    fn single_inheritance_chain_linearizes_in_declaration_order(len in 1usize..8) {
        let mut h = ClassHierarchy::new();
        let names: Vec<String> = (0..len).map(|i| format!("C{i}")).collect();
        for i in 0..len {
            let bases = if i == 0 { vec![] } else { vec![names[i - 1].clone()] };
            h.register(&names[i], bases);
        }
        let top = &names[len - 1];
        let mro = h.mro(top).to_vec();
        let expected: Vec<String> = names.iter().rev().cloned().collect();
        prop_assert_eq!(mro, expected);
        prop_assert!(!h.mro_used_fallback(top));
    }

    /// Whether C3 succeeds or falls back, the class always precedes its
    /// bases, and every directly registered base shows up somewhere.
    #[test]
    fn mro_always_starts_with_the_class_and_contains_every_direct_base(fan in 0usize..5) {
        let mut h = ClassHierarchy::new();
        let bases: Vec<String> = (0..fan).map(|i| format!("B{i}")).collect();
        for base in &bases {
            h.register(base, vec![]);
        }
        h.register("Derived", bases.clone());

        let mro = h.mro("Derived").to_vec();
        prop_assert_eq!(&mro[0], "Derived");
        for base in &bases {
            prop_assert!(mro.contains(base), "mro {:?} missing direct base {}", mro, base);
        }
    }
}
