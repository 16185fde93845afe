//! Per-file dependency deduplication with direct/indirect upgrade.

use std::collections::{BTreeMap, HashMap};

use crate::record::Dependency;

/// Collapses each file's dependency list into one canonical entry per
/// identity key.
///
/// Entries keep the order of their first appearance. When an identity first
/// seen as indirect later appears as direct, the already-emitted entry is
/// upgraded in place; it does not move, and the later duplicate is dropped.
/// Once an identity has a direct entry, every further duplicate is dropped
/// unchanged.
///
/// Each file's list is processed independently: the position bookkeeping is
/// scoped to that file's output list, so an upgrade can only ever touch an
/// entry of the same file.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use purview_deps::{Dependency, deduplicate};
///
/// let mut raw = BTreeMap::new();
/// raw.insert(
///     "file:///test/pom.xml".to_owned(),
///     vec![
///         Dependency::transitive("libB", "2.0", ""),
///         Dependency::direct("libB", "2.0", ""),
///     ],
/// );
///
/// let deduped = deduplicate(&raw);
/// let deps = &deduped["file:///test/pom.xml"];
/// assert_eq!(deps.len(), 1);
/// assert!(!deps[0].indirect);
/// ```
#[must_use]
pub fn deduplicate(
    dependencies: &BTreeMap<String, Vec<Dependency>>,
) -> BTreeMap<String, Vec<Dependency>> {
    dependencies
        .iter()
        .map(|(file, deps)| (file.clone(), deduplicate_file(deps)))
        .collect()
}

/// Deduplicates one file's list.
///
/// `direct_at` and `indirect_at` map an identity key to the position of its
/// canonical entry in `deduped`. All three bindings live in this frame so a
/// recorded position always indexes the list it was taken from.
fn deduplicate_file(deps: &[Dependency]) -> Vec<Dependency> {
    let mut deduped: Vec<Dependency> = Vec::new();
    let mut direct_at: HashMap<String, usize> = HashMap::new();
    let mut indirect_at: HashMap<String, usize> = HashMap::new();

    for dep in deps {
        let id = dep.identity();

        if direct_at.contains_key(&id) {
            // A direct entry is already canonical for this identity.
            continue;
        }

        if let Some(&position) = indirect_at.get(&id) {
            if !dep.indirect {
                if let Some(entry) = deduped.get_mut(position) {
                    entry.indirect = false;
                }
                // The identity is direct from here on; the stale indirect
                // position is never consulted again.
                direct_at.insert(id, position);
            }
            continue;
        }

        let position = deduped.len();
        deduped.push(dep.clone());
        if dep.indirect {
            indirect_at.insert(id, position);
        } else {
            direct_at.insert(id, position);
        }
    }

    deduped
}
