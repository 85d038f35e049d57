//! Redundancy reduction over entailed class sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::expression::{Taxonomy, TermId};

/// Keeps only the maximally specific members of `classes`.
///
/// A class is dropped when another member of the set lies strictly below it
/// in the taxonomy. Classes on a subsumption cycle are equivalent and are all
/// kept. The reduction is idempotent.
#[must_use]
pub fn minimal_cover(classes: &BTreeSet<TermId>, taxonomy: &dyn Taxonomy) -> BTreeSet<TermId> {
    let ancestors: BTreeMap<&TermId, BTreeSet<TermId>> =
        classes.iter().map(|c| (c, taxonomy.ancestors(c))).collect();

    let strictly_below = |lower: &TermId, upper: &TermId| {
        lower != upper
            && ancestors.get(lower).is_some_and(|a| a.contains(upper))
            && !ancestors.get(upper).is_some_and(|a| a.contains(lower))
    };

    classes
        .iter()
        .filter(|candidate| !classes.iter().any(|other| strictly_below(other, *candidate)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::InMemoryTaxonomy;

    fn taxonomy() -> InMemoryTaxonomy {
        InMemoryTaxonomy::new()
            .with_class("GO:0008150", "biological_process", &[])
            .with_class("GO:0008152", "metabolic process", &["GO:0008150"])
            .with_class("GO:0006091", "energy derivation", &["GO:0008152"])
            .with_class("GO:0009987", "cellular process", &["GO:0008150"])
            .with_class("GO:0044237", "cellular metabolic process", &["GO:0008152", "GO:0009987"])
            .with_class("CYC:A", "a", &["CYC:B"])
            .with_class("CYC:B", "b", &["CYC:A"])
    }

    fn set(ids: &[&str]) -> BTreeSet<TermId> {
        ids.iter().map(|id| TermId::from(*id)).collect()
    }

    #[test]
    fn drops_ancestors_of_other_members() {
        let t = taxonomy();
        let reduced = minimal_cover(
            &set(&["GO:0008150", "GO:0008152", "GO:0006091", "GO:0009987"]),
            &t,
        );
        assert_eq!(reduced, set(&["GO:0006091", "GO:0009987"]));
    }

    #[test]
    fn multiple_inheritance_keeps_only_leaf() {
        let t = taxonomy();
        let reduced = minimal_cover(
            &set(&["GO:0044237", "GO:0008152", "GO:0009987", "GO:0008150"]),
            &t,
        );
        assert_eq!(reduced, set(&["GO:0044237"]));
    }

    #[test]
    fn reduction_is_idempotent_and_antichain() {
        let t = taxonomy();
        let inputs = [
            set(&[]),
            set(&["GO:0008150"]),
            set(&["GO:0008150", "GO:0006091"]),
            set(&["GO:0044237", "GO:0006091", "GO:0008152", "GO:0009987"]),
            set(&["GO:0008150", "GO:0008152", "GO:0006091", "GO:0009987", "GO:0044237"]),
            set(&["UNKNOWN:1", "GO:0008150"]),
        ];
        for input in inputs {
            let once = minimal_cover(&input, &t);
            let twice = minimal_cover(&once, &t);
            assert_eq!(once, twice);
            for a in &once {
                for b in &once {
                    assert!(!t.is_proper_ancestor(a, b), "{a} is an ancestor of {b}");
                }
            }
        }
    }

    #[test]
    fn equivalent_classes_survive_together() {
        let t = taxonomy();
        assert_eq!(minimal_cover(&set(&["CYC:A", "CYC:B"]), &t), set(&["CYC:A", "CYC:B"]));
    }
}
