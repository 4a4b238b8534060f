//! Minimal union-find backing the dedup strategies' "group equivalent items
//! transitively" behaviour (spec.md §4.4: union-find-like grouping).

use std::collections::BTreeMap;

pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }

    /// Groups of original indices sharing a root, in root order.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..n {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }
        by_root.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitively_unions_three_items() {
        let mut uf = UnionFind::new(4);
        uf.union(0, 1);
        uf.union(1, 2);
        let groups = uf.groups();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().any(|g| g == &vec![0, 1, 2]));
        assert!(groups.iter().any(|g| g == &vec![3]));
    }

    #[test]
    fn singletons_stay_their_own_group() {
        let mut uf = UnionFind::new(3);
        let groups = uf.groups();
        assert_eq!(groups.len(), 3);
    }
}
