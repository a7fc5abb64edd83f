//! DFA Minimizer (C5): table-filling (Hopcroft-Moore pairwise
//! distinguishability) combined with union-find partitioning.
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::Alphabet;
use crate::deterministic::{Deterministic, Target};
use crate::dfa::Dfa;
use crate::tokenizer::TokenId;

/// An unordered pair of state indices, canonicalized so the smaller index is
/// always first — this is what makes pair lookup symmetric without storing
/// both orderings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Pair(usize, usize);

impl Pair {
    fn new(a: usize, b: usize) -> Self {
        if a <= b { Pair(a, b) } else { Pair(b, a) }
    }
}

/// Plain array-backed union-find. `union` links one root under the other
/// without rank; acceptable given the small state counts typical of
/// classroom-sized DFAs.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_a] = root_b;
        }
    }
}

/// Minimize `dfa` via table-filling, treating all final states as equivalent
/// regardless of token id (the base algorithm from the design).
pub fn minimize<A: Alphabet>(dfa: &Dfa<A>) -> Dfa<A> {
    minimize_with(dfa, false)
}

/// Minimize `dfa` with the stricter refinement that also distinguishes final
/// states tagged with different token ids — useful when the scanner must
/// never conflate two distinct token kinds even if they happen to be
/// language-equivalent.
pub fn minimize_by_token_id<A: Alphabet>(dfa: &Dfa<A>) -> Dfa<A> {
    minimize_with(dfa, true)
}

fn minimize_with<A: Alphabet>(dfa: &Dfa<A>, refine_by_token_id: bool) -> Dfa<A> {
    let n = dfa.node_count();
    let chars: Vec<A> = dfa.alphabet().to_vec();
    let target = |i: usize| Target::new(i).expect("state indices are allocated sequentially from zero");

    let mut distinguishable: HashSet<Pair> = HashSet::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let (p, q) = (target(i), target(j));
            let final_mismatch = dfa.is_final(p) != dfa.is_final(q);
            let token_mismatch = refine_by_token_id
                && dfa.is_final(p)
                && dfa.is_final(q)
                && dfa.token_id(p) != dfa.token_id(q);
            if final_mismatch || token_mismatch {
                distinguishable.insert(Pair::new(i, j));
            }
        }
    }

    loop {
        // OR-accumulated across every pair examined in the pass: a single
        // overwrite-per-insertion formulation would lose a pair marked
        // distinguishable early in the pass if a later pair in the same pass
        // found nothing new, which is exactly the bug this guards against.
        let mut changed = false;

        for i in 0..n {
            for j in (i + 1)..n {
                let pair = Pair::new(i, j);
                if distinguishable.contains(&pair) {
                    continue;
                }

                let (p, q) = (target(i), target(j));
                let mut mark = false;

                for character in &chars {
                    match (dfa.get(p, character), dfa.get(q, character)) {
                        (Some(pt), Some(qt)) => {
                            if pt.index() != qt.index()
                                && distinguishable.contains(&Pair::new(pt.index(), qt.index()))
                            {
                                mark = true;
                            }
                        }
                        (None, None) => {}
                        _ => mark = true,
                    }
                }

                if mark {
                    distinguishable.insert(pair);
                    changed = true;
                }
            }
        }

        log::trace!(
            "minimize: round done, {}/{} pairs distinguishable",
            distinguishable.len(),
            n * n.saturating_sub(1) / 2
        );

        if !changed {
            break;
        }
    }

    let mut union_find = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if !distinguishable.contains(&Pair::new(i, j)) {
                union_find.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..n {
        let root = union_find.find(i);
        groups.entry(root).or_default().push(i);
    }

    // Deterministic partition order: sort by the smallest member id so that
    // reconstructed DFA ids are stable across runs.
    let mut partitions: Vec<Vec<usize>> = groups.into_values().collect();
    partitions.sort_by_key(|members| members[0]);
    log::debug!("minimize: {} states collapsed into {} partitions", n, partitions.len());

    let mut new_dfa = Deterministic::<A>::new(chars.iter().copied());
    let mut new_of: HashMap<usize, Target> = HashMap::new();
    let mut new_targets = Vec::with_capacity(partitions.len());

    for members in &partitions {
        let new_target = new_dfa.node();
        new_targets.push(new_target);
        for &member in members {
            new_of.insert(member, new_target);
        }
    }

    let mut finals = BTreeSet::new();
    let mut token_ids = HashMap::new();

    for (partition_index, members) in partitions.iter().enumerate() {
        let new_target = new_targets[partition_index];
        let winning = members
            .iter()
            .map(|&m| target(m))
            .filter(|&t| dfa.is_final(t))
            .filter_map(|t| dfa.token_id(t).cloned())
            .min_by_key(|token_id| priority_of(dfa, token_id));

        if let Some(token_id) = winning {
            finals.insert(new_target);
            token_ids.insert(new_target, token_id);
        }
    }

    // Rebuild transitions; re-adding an already-recorded transition for a
    // merged member is idempotent since `set` always overwrites the same
    // slot with the same value.
    for members in &partitions {
        let representative = members[0];
        let from = new_of[&representative];
        for character in &chars {
            if let Some(old_to) = dfa.get(target(representative), character) {
                let to = new_of[&old_to.index()];
                new_dfa.set(from, character, to);
            }
        }
    }

    let start = new_of[&dfa.start().index()];
    Dfa::from_parts(new_dfa, start, finals, token_ids, dfa.token_priority().clone())
}

fn priority_of<A: Alphabet>(dfa: &Dfa<A>, token_id: &TokenId) -> crate::tokenizer::TokenPriority {
    dfa.token_priority()
        .get(token_id)
        .copied()
        .unwrap_or(crate::tokenizer::TokenPriority(usize::MAX))
}
