//! Monotonicity property checks for `PointsToSet` (spec §3: points-to sets
//! only ever grow). A fixpoint solver's termination and soundness both rest
//! on this holding for every union, not just the cases the unit tests happen
//! to exercise.

use proptest::prelude::*;

use pta_hir::domain::{AbstractObject, AllocKind, AllocSite, Context, PointsToSet, Site};

fn arb_alloc_kind() -> impl Strategy<Value = AllocKind> {
    prop_oneof![
        Just(AllocKind::Const),
        Just(AllocKind::Object),
        Just(AllocKind::Function),
        Just(AllocKind::Unknown),
    ]
}

prop_compose! {
    fn arb_object()(
        line in 0..50u32,
        name in "[a-z]{1,8}",
        kind in arb_alloc_kind(),
    ) -> AbstractObject {
        let alloc = AllocSite::new(Site::new("f.py", line, 0), kind, name);
        AbstractObject::new(alloc, Context::Empty)
    }
}

fn arb_pts() -> impl Strategy<Value = PointsToSet> {
    prop::collection::vec(arb_object(), 0..12).prop_map(|objs| objs.into_iter().collect())
}

proptest! {
    /// Inserting the same object twice never shrinks the set, and the
    /// second insert reports no growth.
    #[test]
    fn insert_is_idempotent(obj in arb_object()) {
        let mut pts = PointsToSet::new();
        let first = pts.insert(obj.clone());
        let len_after_first = pts.len();
        let second = pts.insert(obj);
        prop_assert!(first);
        prop_assert!(!second);
        prop_assert_eq!(pts.len(), len_after_first);
    }

    /// Unioning never removes anything already present, and unioning a set
    /// into itself is a no-op.
    #[test]
    fn union_never_shrinks(a in arb_pts(), b in arb_pts()) {
        let mut union = a.clone();
        union.union_from(&b);
        prop_assert!(union.len() >= a.len());
        for obj in a.iter() {
            prop_assert!(union.contains(obj));
        }
        for obj in b.iter() {
            prop_assert!(union.contains(obj));
        }

        let mut reflexive = union.clone();
        let grew = reflexive.union_from(&union);
        prop_assert!(!grew);
        prop_assert_eq!(reflexive, union);
    }

    /// Union is commutative up to set equality, since it's a join over sets.
    #[test]
    fn union_is_commutative(a in arb_pts(), b in arb_pts()) {
        let mut a_then_b = a.clone();
        a_then_b.union_from(&b);
        let mut b_then_a = b.clone();
        b_then_a.union_from(&a);
        prop_assert_eq!(a_then_b, b_then_a);
    }
}
