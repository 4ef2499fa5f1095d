//! Union of two parent-id -> label-list maps.
//!
//! A favorites view is assembled from parents the user favorited directly
//! (labelled generically, e.g. `Post`) and parents reached because one of
//! their child items was favorited (labelled with the child's type). Label
//! lists use the SetColumn encoding.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use ahash::AHashSet;

use crate::set_column::{DELIMITER, decode, encode};

/// Parent id -> comma-joined labels.
pub type Associations = BTreeMap<String, String>;

/// Labels every id in `ids` with the same `label`.
pub fn label_all<I>(ids: I, label: &str) -> Associations
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    ids.into_iter()
        .map(|id| (id.to_string(), label.to_owned()))
        .collect()
}

/// Groups `(parent_id, label)` pairs, appending labels in input order.
/// Repeated labels for one parent are kept, matching how child rows are
/// listed.
pub fn group_labels<I, K, L>(pairs: I) -> Associations
where
    I: IntoIterator<Item = (K, L)>,
    K: fmt::Display,
    L: AsRef<str>,
{
    let mut grouped = Associations::new();
    for (parent_id, label) in pairs {
        let label = label.as_ref().trim();
        if label.is_empty() {
            continue;
        }
        grouped
            .entry(parent_id.to_string())
            .and_modify(|labels: &mut String| {
                labels.push(DELIMITER);
                labels.push_str(label);
            })
            .or_insert_with(|| label.to_owned());
    }
    grouped
}

/// Merges `derived` into `direct`.
///
/// A parent already present keeps its labels in order and gains only the
/// labels it lacks (exact, case-sensitive match). A new parent is inserted
/// unchanged. Nothing is ever removed, and because each `derived` entry only
/// appends to its own key the result does not depend on the order `derived`
/// is walked in.
pub fn merge_associations<I>(direct: Associations, derived: I) -> Associations
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged = direct;
    for (parent_id, labels) in derived {
        match merged.entry(parent_id) {
            Entry::Occupied(mut entry) => append_missing_labels(entry.get_mut(), &labels),
            Entry::Vacant(entry) => {
                entry.insert(labels);
            }
        }
    }
    merged
}

fn append_missing_labels(existing: &mut String, incoming: &str) {
    let mut labels = decode(Some(existing.as_str()));
    let mut seen: AHashSet<String> = labels.iter().cloned().collect();

    let before = labels.len();
    for label in decode(Some(incoming)) {
        if seen.insert(label.clone()) {
            labels.push(label);
        }
    }
    if labels.len() != before {
        *existing = encode(&labels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> Associations {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn disjoint_keys_are_unioned() {
        let direct = label_all([1, 2], "Post");
        let derived = map(&[("3", "Shirt")]);
        let merged = merge_associations(direct, derived);
        assert_eq!(
            merged,
            map(&[("1", "Post"), ("2", "Post"), ("3", "Shirt")])
        );
    }

    #[test]
    fn shared_key_gains_only_new_labels() {
        let direct = map(&[("1", "Post,Shirt")]);
        let derived = map(&[("1", "Shirt,Pants")]);
        let merged = merge_associations(direct, derived);
        assert_eq!(merged["1"], "Post,Shirt,Pants");
    }

    #[test]
    fn label_match_is_case_sensitive() {
        let merged = merge_associations(map(&[("1", "Post")]), map(&[("1", "post")]));
        assert_eq!(merged["1"], "Post,post");
    }

    #[test]
    fn shared_label_is_not_duplicated() {
        let merged = merge_associations(map(&[("4", "Post")]), map(&[("4", "Post")]));
        assert_eq!(merged["4"], "Post");
    }

    #[test]
    fn walk_order_of_derived_does_not_matter() {
        let direct = map(&[("1", "Post"), ("2", "Post")]);
        let derived = map(&[("1", "Hat"), ("2", "Shoes,Post"), ("5", "Coat")]);

        let forward = merge_associations(direct.clone(), derived.clone());
        let backward = merge_associations(direct, derived.into_iter().rev());
        assert_eq!(forward, backward);
        assert_eq!(forward["2"], "Post,Shoes");
    }

    #[test]
    fn group_labels_appends_in_input_order() {
        let grouped = group_labels([(10, "Shirt"), (11, "Hat"), (10, "Shoes"), (10, "Shirt")]);
        assert_eq!(grouped["10"], "Shirt,Shoes,Shirt");
        assert_eq!(grouped["11"], "Hat");
    }
}
