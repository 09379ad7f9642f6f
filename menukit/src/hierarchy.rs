//! Splitting long flat menu lists into a two-level hierarchy.
//!
//! Given `N` labels and a fan-out `k`, the labels are naturally sorted and cut into at most
//! `k` contiguous buckets whose sizes differ by at most one. Buckets holding a single label
//! are emitted as-is; every other bucket becomes a group labelled with a short range
//! (`"Ab - Az"`) built from the shortest distinguishing prefixes of its first and last label.

use std::num::NonZeroUsize;

use serde::Serialize;

use crate::natural;

/// Code units compared before a distinguishing position is accepted outside the window.
const EDGE_SCAN_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HierarchyNode {
    Entry(String),
    Group { label: String, entries: Vec<String> },
}

impl HierarchyNode {
    pub fn label(&self) -> &str {
        match self {
            HierarchyNode::Entry(e) => e,
            HierarchyNode::Group { label, .. } => label,
        }
    }

    pub fn entries(&self) -> &[String] {
        match self {
            HierarchyNode::Entry(e) => std::slice::from_ref(e),
            HierarchyNode::Group { entries, .. } => entries,
        }
    }
}

/// Sort `flat_entries` in place and split it into at most `split_after` menu levels.
pub fn split_long_menu_list_into_hierarchy(
    flat_entries: &mut Vec<String>,
    split_after: NonZeroUsize,
) -> Vec<HierarchyNode> {
    if flat_entries.is_empty() {
        return Vec::new();
    }

    natural::sort(flat_entries);

    let buckets = bucket_sizes(flat_entries.len(), split_after);
    let edges = collect_edges(flat_entries, &buckets);
    let edge_lens = edge_lengths(&edges);

    let mut result = Vec::with_capacity(buckets.len());
    let mut entries = flat_entries.iter();
    let mut edge_pos = 0;

    for &size in buckets.iter().take_while(|&&size| size > 0) {
        let bucket: Vec<String> = entries.by_ref().take(size).cloned().collect();

        if size == 1 {
            result.extend(bucket.into_iter().map(HierarchyNode::Entry));
            continue;
        }

        let label = format!(
            "{} - {}",
            edge_text(&edges[edge_pos], edge_lens[edge_pos]),
            edge_text(&edges[edge_pos + 1], edge_lens[edge_pos + 1])
        );
        edge_pos += 2;

        result.push(HierarchyNode::Group {
            label,
            entries: bucket,
        });
    }

    log::debug!(
        "split {} menu entries into {} nodes (split_after={})",
        flat_entries.len(),
        result.len(),
        split_after
    );

    result
}

/// Round-robin counting: entry `i` lands in bucket `i % split_after`.
pub fn bucket_sizes(count: usize, split_after: NonZeroUsize) -> Vec<usize> {
    let mut buckets = vec![0usize; split_after.get()];
    let len = buckets.len();
    for i in 0..count {
        buckets[i % len] += 1;
    }
    buckets
}

// First and last entry of every multi-entry bucket, plus the first entry of the
// first single-entry bucket (which ends the list).
fn collect_edges(sorted: &[String], buckets: &[usize]) -> Vec<Vec<u16>> {
    let mut edges = Vec::new();
    let mut pos = 0;

    for &size in buckets {
        if size == 0 {
            break;
        }
        edges.push(sorted[pos].encode_utf16().collect());
        if size > 1 {
            edges.push(sorted[pos + size - 1].encode_utf16().collect());
            pos += size;
        } else {
            break;
        }
    }

    edges
}

fn edge_lengths(edges: &[Vec<u16>]) -> Vec<usize> {
    let mut lens = vec![0usize; edges.len()];

    for i in 0..edges.len().saturating_sub(1) {
        let c1 = &edges[i];
        let c2 = &edges[i + 1];

        let common = c1.len().min(c2.len());
        let window = common.min(EDGE_SCAN_WINDOW);

        let clashes = |j: usize| {
            let candidate = &c1[..=j];
            (0..i).any(|k| &edges[k][..lens[k]] == candidate)
        };
        let accept = |j: &usize| c1[*j] != c2[*j] && !clashes(*j);

        let j = (0..window)
            .find(|j| accept(j))
            .or_else(|| (window..common).find(|j| accept(j)))
            .unwrap_or(common)
            + 1;

        lens[i] = c1.len().min(lens[i].max(j));
        lens[i] = keep_surrogate_pair(c1, lens[i]);

        lens[i + 1] = c2.len().min(j);
        lens[i + 1] = keep_surrogate_pair(c2, lens[i + 1]);
    }

    lens
}

fn keep_surrogate_pair(units: &[u16], len: usize) -> usize {
    if len > 0 && len < units.len() && is_high_surrogate(units[len - 1]) {
        len + 1
    } else {
        len
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn edge_text(units: &[u16], len: usize) -> String {
    String::from_utf16_lossy(&units[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn owned(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn flatten(nodes: &[HierarchyNode]) -> Vec<String> {
        nodes.iter().flat_map(|n| n.entries().to_vec()).collect()
    }

    fn group_labels(nodes: &[HierarchyNode]) -> Vec<&str> {
        nodes
            .iter()
            .filter_map(|n| match n {
                HierarchyNode::Group { label, .. } => Some(label.as_str()),
                HierarchyNode::Entry(_) => None,
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        for n in 1..5 {
            let mut v = Vec::new();
            assert!(split_long_menu_list_into_hierarchy(&mut v, k(n)).is_empty());
        }
    }

    #[test]
    fn fruit_example_groups_contiguous_ranges() {
        let mut v = owned(&["Banana", "apple", "Cherry", "date", "Eggplant", "fig", "Grape"]);
        let nodes = split_long_menu_list_into_hierarchy(&mut v, k(3));

        assert_eq!(
            v,
            owned(&["apple", "Banana", "Cherry", "date", "Eggplant", "fig", "Grape"])
        );
        assert_eq!(
            nodes,
            vec![
                HierarchyNode::Group {
                    label: "a - C".into(),
                    entries: owned(&["apple", "Banana", "Cherry"]),
                },
                HierarchyNode::Group {
                    label: "d - E".into(),
                    entries: owned(&["date", "Eggplant"]),
                },
                HierarchyNode::Group {
                    label: "f - G".into(),
                    entries: owned(&["fig", "Grape"]),
                },
            ]
        );
    }

    #[test]
    fn flattening_returns_every_entry_in_sorted_order() {
        for n in 1..12 {
            for split in 1..8 {
                let mut v: Vec<String> = (0..n).rev().map(|i| format!("Entry {i}")).collect();
                let nodes = split_long_menu_list_into_hierarchy(&mut v, k(split));
                assert_eq!(flatten(&nodes), v, "n={n} split={split}");
                assert!(nodes.len() <= split);
            }
        }
    }

    #[test]
    fn single_entry_buckets_stay_flat() {
        let mut v = owned(&["a", "b", "c", "d", "e"]);
        let nodes = split_long_menu_list_into_hierarchy(&mut v, k(4));

        assert_eq!(bucket_sizes(5, k(4)), vec![2, 1, 1, 1]);
        assert_eq!(
            nodes,
            vec![
                HierarchyNode::Group {
                    label: "a - b".into(),
                    entries: owned(&["a", "b"]),
                },
                HierarchyNode::Entry("c".into()),
                HierarchyNode::Entry("d".into()),
                HierarchyNode::Entry("e".into()),
            ]
        );
    }

    #[test]
    fn fewer_entries_than_buckets_is_flat() {
        let mut v = owned(&["z", "y"]);
        let nodes = split_long_menu_list_into_hierarchy(&mut v, k(10));
        assert_eq!(
            nodes,
            vec![HierarchyNode::Entry("y".into()), HierarchyNode::Entry("z".into())]
        );
    }

    #[test]
    fn shared_long_prefix_still_gives_unique_labels() {
        let mut v: Vec<String> = (1..=20).map(|i| format!("Project_{i:02}")).collect();
        let nodes = split_long_menu_list_into_hierarchy(&mut v, k(3));

        assert_eq!(
            group_labels(&nodes),
            vec![
                "Project_01 - Project_07",
                "Project_08 - Project_14",
                "Project_15 - Project_2",
            ]
        );
    }

    #[test]
    fn labels_are_unique_for_many_similar_entries() {
        let mut v: Vec<String> = (0..200).map(|i| format!("Downloads/Series {i}")).collect();
        let nodes = split_long_menu_list_into_hierarchy(&mut v, k(9));
        let mut labels = group_labels(&nodes);
        let total = labels.len();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), total);
        assert_eq!(flatten(&nodes).len(), 200);
    }

    #[test]
    fn edges_never_split_surrogate_pairs() {
        let mut v = owned(&["a1", "a2", "\u{1D49C}", "\u{1F600}"]);
        let nodes = split_long_menu_list_into_hierarchy(&mut v, k(2));

        assert_eq!(group_labels(&nodes), vec!["a1 - a2", "\u{1D49C} - \u{1F600}"]);
        for node in &nodes {
            assert!(!node.label().contains('\u{FFFD}'));
        }
    }

    #[test]
    fn sorting_twice_gives_same_buckets() {
        let mut v = owned(&["tag10", "Tag2", "tag1", "alpha", "Beta", "tag3"]);
        let first = split_long_menu_list_into_hierarchy(&mut v, k(2));
        let sorted = v.clone();
        let second = split_long_menu_list_into_hierarchy(&mut v, k(2));
        assert_eq!(first, second);
        assert_eq!(v, sorted);
    }

    #[test]
    fn split_after_one_makes_single_group() {
        let mut v = owned(&["b", "a", "c"]);
        let nodes = split_long_menu_list_into_hierarchy(&mut v, k(1));
        assert_eq!(
            nodes,
            vec![HierarchyNode::Group {
                label: "a - c".into(),
                entries: owned(&["a", "b", "c"]),
            }]
        );
    }
}
