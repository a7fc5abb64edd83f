//! Cycle-safe arena storage for epsilon-nondeterministic automata.
//!
//! `Builder` is the mutable side: nodes and edges can be added in any order
//! while the automaton is under construction, and a process-wide id counter
//! is never involved — every id handed out comes from a counter owned by the
//! `Builder` value itself, so independent builders never collide and ids
//! stay reproducible across runs. `finish` freezes the graph into
//! `NonDeterministic`, a compacted representation with edges sorted per node
//! so moves can be found by binary search instead of a linear scan.
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::ops::Range;

use super::Alphabet;

/// A frozen, cycle-safe epsilon-NFA graph.
///
/// States are identified purely by index (`usize`). There is no by-value
/// equality recursing into transitions — that would be both expensive and
/// ill-defined for a cyclic graph. Equivalence of states (used during
/// minimization) is computed separately, over a distinguishability table,
/// rather than being a structural property of this type.
pub struct NonDeterministic<A> {
    /// All visited characters, ordered.
    characters: Vec<A>,

    /// The edges of all nodes, sorted within each node's range by label so
    /// that a single character's edges form one contiguous run.
    edges: Vec<Edge>,

    /// Ranges of the edges of each node.
    ranges: Vec<Range<usize>>,
}

/// Dynamic representation of a non-deterministic graph.
///
/// As opposed to `NonDeterministic` this is optimized for making changes to the graph structure.
pub struct Builder<A> {
    /// All visited characters, unordered.
    characters: Vec<A>,

    /// The indices of the ordered list of characters.
    ///
    /// Changing the index of a char within `character` during mutation of the builder would
    /// require iterating all edges, i.e. be a large, potentially wasted effort. We nevertheless
    /// want an ordered list to bisect new characters. This list provides the bisectable ordering.
    ordered: Vec<Character>,

    /// Edges for each node, may contain duplicate entries for first component.
    edges: Vec<Vec<(Character, usize)>>,

    /// Stores epsilon transitions separately.
    ///
    /// This makes it easier to find the epsilon reachability graph.
    epsilons: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, Debug)]
struct Edge {
    character: Label,
    target: usize,
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Character(NonZeroUsize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Label(Option<Character>);

impl<A> Builder<A> {
    pub fn new() -> Self {
        Builder {
            characters: Vec::new(),
            ordered: Vec::new(),
            edges: Vec::new(),
            epsilons: Vec::new(),
        }
    }
}

impl<A: Alphabet> Builder<A> {
    /// Allocate a fresh node, owned by this builder's id space.
    ///
    /// Ids are handed out sequentially starting at 0. Since the counter
    /// lives on the `Builder` itself rather than anywhere process-wide, two
    /// builders constructed independently never produce colliding ids.
    pub fn node(&mut self) -> usize {
        let id = self.edges.len();
        self.edges.push(vec![]);
        self.epsilons.push(vec![]);
        id
    }

    /// Insert a new edge, guarded by the specified character (`None` for epsilon).
    pub fn insert(&mut self, from: usize, character: Option<&A>, to: usize) {
        self.ensure_nodes(from);
        self.ensure_nodes(to);
        if let Some(character) = character {
            let character = self.ensure_char(character);
            self.edges[from].push((character, to));
        } else {
            self.epsilons[from].push(to);
        }
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn finish(&self) -> NonDeterministic<A> {
        // Map from the unordered `Character` assigned at insertion time to
        // its rank in the final, ordered alphabet.
        let character_label = self.ordered
            .iter()
            .enumerate()
            .map(|(index, character)| (*character, Label::character(index)))
            .collect::<HashMap<_, _>>();
        let characters = self.ordered
            .iter()
            .map(|character| self.characters[character.index()])
            .collect::<Vec<_>>();

        let mut edges = Vec::new();
        let mut ranges = Vec::new();

        let per_node = self.edges.iter().zip(self.epsilons.iter());
        for (node_edges, node_epsilons) in per_node {
            let start = edges.len();

            let mut node_all: Vec<Edge> = Vec::with_capacity(node_epsilons.len() + node_edges.len());
            node_all.extend(node_epsilons.iter().map(|&target| Edge {
                character: Label::EPSILON,
                target,
            }));
            node_all.extend(node_edges.iter().map(|(character, target)| Edge {
                character: character_label[character],
                target: *target,
            }));

            // `Label::EPSILON` (`None`) sorts before every `Some(_)`
            // character, so this single sort both groups epsilon edges
            // together and orders the remaining edges for binary search.
            node_all.sort_by_key(|edge| edge.character);

            let end = start + node_all.len();
            edges.extend(node_all);
            ranges.push(start..end);
        }

        NonDeterministic {
            characters,
            edges,
            ranges,
        }
    }

    /// The `Character` or the index where to insert it into the ordered representation.
    ///
    /// In case of an insert, the new `Character` is given by the current length of the `character`
    /// vector.
    fn resolve_char(&self, character: &A) -> Result<Character, usize> {
        self.ordered.binary_search_by_key(&character,
            |character| &self.characters[character.index()])
            .map(|index| self.ordered[index])
    }

    fn ensure_char(&mut self, character: &A) -> Character {
        match self.resolve_char(character) {
            Ok(found) => found,
            Err(index) => {
                let new_char = Character::new(self.characters.len());
                self.characters.push(*character);
                self.ordered.insert(index, new_char);
                new_char
            }
        }
    }

    fn ensure_nodes(&mut self, node: usize) {
        if node >= self.edges.len() {
            self.edges.resize_with(node + 1, Vec::new);
            self.epsilons.resize_with(node + 1, Vec::new);
        }
    }
}

impl<A> Default for Builder<A> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<A: Alphabet> NonDeterministic<A> {
    pub fn node_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn alphabet(&self) -> &[A] {
        &self.characters
    }

    fn edges_of(&self, node: usize) -> &[Edge] {
        &self.edges[self.ranges[node].clone()]
    }

    fn label_of(&self, character: &A) -> Option<Label> {
        self.characters
            .binary_search(character)
            .ok()
            .map(Label::character)
    }

    /// The set of states reachable from `start` by epsilon transitions only,
    /// including every state in `start` itself.
    ///
    /// Computed by DFS with a visited-set guard, adding a state to the
    /// worklist only the first time it is seen, so cycles terminate.
    pub fn epsilon_closure<I>(&self, start: I) -> BTreeSet<usize>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut reached = BTreeSet::new();
        let mut todo = Vec::new();

        for state in start {
            if reached.insert(state) {
                todo.push(state);
            }
        }

        while let Some(next) = todo.pop() {
            let epsilon_edges = self.edges_of(next)
                .iter()
                .take_while(|edge| edge.character == Label::EPSILON);
            for edge in epsilon_edges {
                if reached.insert(edge.target) {
                    todo.push(edge.target);
                }
            }
        }

        reached
    }

    /// All outgoing edges of `node`, epsilon transitions first (`None`),
    /// in the same sorted order `finish` recorded them in.
    pub fn edges(&self, node: usize) -> impl Iterator<Item = (Option<&A>, usize)> + '_ {
        self.edges_of(node).iter().map(move |edge| {
            let character = edge.character.0.map(|c| &self.characters[c.index()]);
            (character, edge.target)
        })
    }

    /// The set of states reachable from any state in `states` by a single
    /// `character`-labelled transition (epsilon transitions are not followed).
    pub fn mov(&self, states: &BTreeSet<usize>, character: &A) -> BTreeSet<usize> {
        let Some(label) = self.label_of(character) else {
            return BTreeSet::new();
        };

        let mut reached = BTreeSet::new();
        for &state in states {
            let edges = self.edges_of(state);
            let start = edges.partition_point(|edge| edge.character < label);
            let matching = edges[start..].iter().take_while(|edge| edge.character == label);
            reached.extend(matching.map(|edge| edge.target));
        }
        reached
    }
}

impl Character {
    pub fn new(index: usize) -> Self {
        Character(NonZeroUsize::new(index + 1).unwrap())
    }

    pub fn index(self) -> usize {
        self.0.get() - 1
    }
}

impl Label {
    const EPSILON: Label = Label(None);

    pub fn character(index: usize) -> Self {
        Label(Some(Character::new(index)))
    }
}
