//! Property check for `ModuleGraph::topo_order` (spec §4.8): for any
//! acyclic import structure, every dependency must precede its dependent in
//! the returned order, regardless of the order modules were registered in.

use std::collections::HashSet;

use proptest::prelude::*;

use pta_hir::domain::Site;
use pta_hir::ir::{IrModule, Stmt};
use pta_modules::ModuleGraph;

fn name_for(i: usize) -> String {
    format!("M{i}")
}

fn module_for(i: usize, deps: &[usize]) -> IrModule {
    let body = deps
        .iter()
        .enumerate()
        .map(|(k, &dep)| Stmt::Import {
            target: format!("dep{k}"),
            module: name_for(dep),
            site: Site::new("m.py", 1, 0),
        })
        .collect();
    IrModule {
        name: name_for(i),
        functions: vec![],
        classes: vec![],
        body,
    }
}

/// Triangular index for the unordered pair `(i, j)` with `j < i`, packing
/// every possible dependency edge among up to 5 modules into 10 bits.
fn pair_index(i: usize, j: usize) -> usize {
    i * (i - 1) / 2 + j
}

proptest! {
    #[test]
    fn topo_order_respects_every_dependency_edge(n in 2usize..6, bits in prop::collection::vec(any::<bool>(), 10)) {
        // Module `i` may depend only on modules `0..i`, so the generated
        // graph is acyclic by construction.
        let deps_of: Vec<Vec<usize>> = (0..n)
            .map(|i| (0..i).filter(|&j| bits[pair_index(i, j)]).collect())
            .collect();

        let modules: Vec<IrModule> = (0..n).map(|i| module_for(i, &deps_of[i])).collect();
        let mut graph = ModuleGraph::new();
        // Register in reverse so `topo_order` can't just be echoing back
        // registration order.
        for module in modules.iter().rev() {
            graph.register(module);
        }

        let order = graph.topo_order();
        prop_assert_eq!(order.len(), n);
        let distinct: HashSet<&String> = order.iter().collect();
        prop_assert_eq!(distinct.len(), n);

        let position = |name: &str| order.iter().position(|x| x == name).unwrap();
        for (i, deps) in deps_of.iter().enumerate() {
            for &dep in deps {
                prop_assert!(position(&name_for(dep)) < position(&name_for(i)));
            }
        }
    }
}
