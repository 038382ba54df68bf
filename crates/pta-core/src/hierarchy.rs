//! Class hierarchy bookkeeping and MRO computation (spec §4.5). Bases are
//! registered as CLASS objects are allocated or summaries declare them;
//! MRO is C3-linearized and cached, with a conservative fallback on
//! inconsistency.

use std::collections::HashMap;

use pta_hir::domain::stable_hash;
use tracing::warn;

#[derive(Debug, Default)]
pub struct ClassHierarchy {
    bases: HashMap<String, Vec<String>>,
    // class_id -> (hash of base tuple, cached linearization, whether C3 succeeded)
    mro_cache: HashMap<String, (u64, Vec<String>, bool)>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or updates a class's immediate bases. Per spec §3
    /// invariant, the MRO cache is only invalidated if the base tuple
    /// actually changed.
    pub fn register(&mut self, class: &str, bases: Vec<String>) {
        self.bases.insert(class.to_string(), bases);
    }

    pub fn bases_of(&self, class: &str) -> &[String] {
        self.bases.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_registered(&self, class: &str) -> bool {
        self.bases.contains_key(class)
    }

    /// Returns the cached or freshly-computed MRO for `class`. Falls back
    /// to a conservative pre-order linearization if C3 is inconsistent,
    /// returning `false` for "c3 succeeded" in that case.
    pub fn mro(&mut self, class: &str) -> &[String] {
        let current_hash = stable_hash(self.bases.get(class).cloned().unwrap_or_default().as_slice());
        if let Some((hash, _, _)) = self.mro_cache.get(class) {
            if *hash == current_hash {
                return &self.mro_cache[class].1;
            }
        }
        let (linearization, c3_ok) = match self.c3_linearize(class) {
            Some(l) => (l, true),
            None => {
                warn!(class, "C3 linearization inconsistent, using conservative fallback");
                (self.conservative_fallback(class), false)
            }
        };
        self.mro_cache
            .insert(class.to_string(), (current_hash, linearization, c3_ok));
        &self.mro_cache[class].1
    }

    pub fn mro_used_fallback(&self, class: &str) -> bool {
        self.mro_cache.get(class).map(|(_, _, ok)| !ok).unwrap_or(false)
    }

    fn c3_linearize(&self, class: &str) -> Option<Vec<String>> {
        let bases = self.bases.get(class).cloned().unwrap_or_default();
        if bases.is_empty() {
            return Some(vec![class.to_string()]);
        }
        let mut sequences: Vec<Vec<String>> = bases
            .iter()
            .map(|b| self.c3_linearize_or_self(b))
            .collect::<Option<Vec<_>>>()?;
        sequences.push(bases.clone());

        let mut result = vec![class.to_string()];
        loop {
            sequences.retain(|s| !s.is_empty());
            if sequences.is_empty() {
                break;
            }
            let head = sequences.iter().find_map(|seq| {
                let candidate = &seq[0];
                let in_tail = sequences
                    .iter()
                    .any(|other| other.iter().skip(1).any(|x| x == candidate));
                if in_tail {
                    None
                } else {
                    Some(candidate.clone())
                }
            })?;
            result.push(head.clone());
            for seq in sequences.iter_mut() {
                if seq.first() == Some(&head) {
                    seq.remove(0);
                }
            }
        }
        Some(result)
    }

    fn c3_linearize_or_self(&self, class: &str) -> Option<Vec<String>> {
        if self.bases.contains_key(class) {
            self.c3_linearize(class)
        } else {
            // Externally-defined base with no registered bases of its own
            // (spec §6: "class-hierarchy bootstrap ... pre-populated bases
            // for externally defined classes" — absent one, treat as a
            // single-element chain).
            Some(vec![class.to_string()])
        }
    }

    /// "class itself, then depth-first, left-to-right pre-order over
    /// bases, deduplicated" (spec §4.5).
    fn conservative_fallback(&self, class: &str) -> Vec<String> {
        let mut seen = Vec::new();
        self.preorder(class, &mut seen);
        seen
    }

    fn preorder(&self, class: &str, seen: &mut Vec<String>) {
        if seen.contains(&class.to_string()) {
            return;
        }
        seen.push(class.to_string());
        for base in self.bases_of(class).to_vec() {
            self.preorder(&base, seen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_inheritance_linearizes_to_chain() {
        let mut h = ClassHierarchy::new();
        h.register("A", vec![]);
        h.register("B", vec!["A".into()]);
        assert_eq!(h.mro("B"), &["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn class_precedes_every_base() {
        let mut h = ClassHierarchy::new();
        h.register("A", vec![]);
        h.register("B", vec![]);
        h.register("C", vec!["A".into(), "B".into()]);
        let mro = h.mro("C").to_vec();
        let pos_c = mro.iter().position(|x| x == "C").unwrap();
        let pos_a = mro.iter().position(|x| x == "A").unwrap();
        let pos_b = mro.iter().position(|x| x == "B").unwrap();
        assert!(pos_c < pos_a && pos_c < pos_b);
    }

    #[test]
    fn diamond_inheritance_c3() {
        // classic diamond: O, A(O), B(O), C(A, B)
        let mut h = ClassHierarchy::new();
        h.register("O", vec![]);
        h.register("A", vec!["O".into()]);
        h.register("B", vec!["O".into()]);
        h.register("C", vec!["A".into(), "B".into()]);
        assert_eq!(
            h.mro("C"),
            &["C".to_string(), "A".to_string(), "B".to_string(), "O".to_string()]
        );
        assert!(!h.mro_used_fallback("C"));
    }

    #[test]
    fn inconsistent_hierarchy_falls_back() {
        // X(A, B), Y(B, A) then Z(X, Y) is the canonical C3 failure case.
        let mut h = ClassHierarchy::new();
        h.register("A", vec![]);
        h.register("B", vec![]);
        h.register("X", vec!["A".into(), "B".into()]);
        h.register("Y", vec!["B".into(), "A".into()]);
        h.register("Z", vec!["X".into(), "Y".into()]);
        let mro = h.mro("Z").to_vec();
        assert_eq!(mro[0], "Z");
        assert!(h.mro_used_fallback("Z"));
    }

    #[test]
    fn cache_recomputes_only_on_base_tuple_change() {
        let mut h = ClassHierarchy::new();
        h.register("A", vec![]);
        h.register("B", vec!["A".into()]);
        let first = h.mro("B").to_vec();
        h.register("B", vec!["A".into()]); // identical bases
        let second = h.mro("B").to_vec();
        assert_eq!(first, second);
    }
}
