//! Symmetric cell adjacency
//!
//! Each fact is stored once with the smaller site id first. Lookups accept the
//! pair in either order, so `(A, B)` and `(B, A)` always answer identically.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::SiteId;
use crate::geometry::Point;

/// Two cells sharing a boundary segment
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjacencyFact {
    /// Smaller site id of the pair
    pub a: SiteId,
    /// Larger site id of the pair
    pub b: SiteId,
    /// Shared segment endpoints
    pub segment: (Point, Point),
}

impl AdjacencyFact {
    /// Create a fact, normalising the pair order
    ///
    /// Swapping the ids also swaps the segment direction so that the segment
    /// keeps the left-hand orientation of cell `a`.
    pub fn new(first: SiteId, second: SiteId, segment: (Point, Point)) -> Self {
        if first <= second {
            Self {
                a: first,
                b: second,
                segment,
            }
        } else {
            Self {
                a: second,
                b: first,
                segment: (segment.1, segment.0),
            }
        }
    }

    /// The id on the other side of `id`, if `id` takes part in this fact
    pub fn other(&self, id: SiteId) -> Option<SiteId> {
        if id == self.a {
            Some(self.b)
        } else if id == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// Length of the shared segment
    pub fn length(&self) -> f64 {
        (self.segment.1 - self.segment.0).length()
    }
}

/// Set of adjacency facts keyed by the unordered site pair
///
/// Serializes as a plain list of facts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(from = "Vec<AdjacencyFact>", into = "Vec<AdjacencyFact>")
)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacency {
    facts: BTreeMap<(SiteId, SiteId), AdjacencyFact>,
}

impl From<Vec<AdjacencyFact>> for Adjacency {
    fn from(facts: Vec<AdjacencyFact>) -> Self {
        let mut adjacency = Self::new();
        for fact in facts {
            adjacency.insert(AdjacencyFact::new(fact.a, fact.b, fact.segment));
        }
        adjacency
    }
}

impl From<Adjacency> for Vec<AdjacencyFact> {
    fn from(adjacency: Adjacency) -> Self {
        adjacency.facts.into_values().collect()
    }
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact; the first fact recorded for a pair wins
    pub fn insert(&mut self, fact: AdjacencyFact) {
        self.facts.entry((fact.a, fact.b)).or_insert(fact);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Shared segment between two cells, in either argument order
    pub fn get(&self, x: SiteId, y: SiteId) -> Option<&AdjacencyFact> {
        let key = if x <= y { (x, y) } else { (y, x) };
        self.facts.get(&key)
    }

    /// Check whether two cells are adjacent
    #[inline]
    pub fn contains(&self, x: SiteId, y: SiteId) -> bool {
        self.get(x, y).is_some()
    }

    /// Neighbours of a cell in ascending id order
    pub fn neighbors_of(&self, id: SiteId) -> Vec<SiteId> {
        let mut neighbors: Vec<SiteId> = self.facts.values().filter_map(|f| f.other(id)).collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Iterate over all facts ordered by `(a, b)`
    pub fn iter(&self) -> impl Iterator<Item = &AdjacencyFact> {
        self.facts.values()
    }

    /// Keep only the facts for which `f` returns `Some`, replacing each with the result
    pub(crate) fn filter_map(&self, mut f: impl FnMut(&AdjacencyFact) -> Option<AdjacencyFact>) -> Self {
        let mut out = Self::new();
        for fact in self.facts.values() {
            if let Some(mapped) = f(fact) {
                out.insert(mapped);
            }
        }
        out
    }
}
