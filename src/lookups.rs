//! Hand-rank lookup tables.
//!
//! Each hand family enumerates every legal 5-card (or shorter) rank multiset
//! from strongest to weakest and assigns dense indices starting at 0, so a
//! smaller index always means a stronger holding within its family. Keys are
//! the product of per-rank primes together with a suit-uniformity flag.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use num_bigint::BigUint;

use crate::utilities::{Card, Error, Rank, RankOrder};

// The generated rank character -> prime map.
include!(concat!(env!("OUT_DIR"), "/rank_multipliers.rs"));

/// The classification labels of hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::HighCard => write!(f, "High card"),
            Label::OnePair => write!(f, "One pair"),
            Label::TwoPair => write!(f, "Two pair"),
            Label::ThreeOfAKind => write!(f, "Three of a kind"),
            Label::Straight => write!(f, "Straight"),
            Label::Flush => write!(f, "Flush"),
            Label::FullHouse => write!(f, "Full house"),
            Label::FourOfAKind => write!(f, "Four of a kind"),
            Label::StraightFlush => write!(f, "Straight flush"),
        }
    }
}

/// An entry in a hand lookup table.
#[derive(Debug, Clone, Copy, Eq, Hash)]
pub struct Entry {
    /// The dense strength index. `0` is the strongest entry of the family.
    pub index: i32,
    /// The classification label of the hand.
    pub label: Label,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

/// A hand lookup table keyed by rank-prime products and suitedness.
pub trait Lookup {
    /// The rank order used by this lookup, weakest rank first.
    fn rank_order(&self) -> &'static [Rank];

    /// The internal map of entries.
    fn entries(&self) -> &HashMap<(BigUint, bool), Entry>;

    /// Populates the lookup table.
    fn add_entries(&mut self);

    /// Hashes a collection of ranks into a product of primes.
    fn hash_ranks(&self, ranks: &[Rank]) -> BigUint {
        ranks
            .iter()
            .map(|r| {
                let rank_char = r.to_string().chars().next().unwrap();
                *RANK_MULTIPLIERS.get(&rank_char).unwrap_or(&1)
            })
            .product()
    }

    /// Enumerates hashes for every hand matching the rank multiplicities in
    /// `counter` (multiplicity -> how many ranks carry it), strongest hand
    /// first.
    fn hash_multisets(
        &self,
        ranks: &[Rank],
        counter: &mut BTreeMap<usize, usize>,
    ) -> Vec<BigUint> {
        if counter.is_empty() {
            return vec![BigUint::from(1u32)];
        }

        let (&multiplicity, &count) = counter.iter().next_back().unwrap();
        counter.remove(&multiplicity);

        let mut hashes = Vec::new();
        for samples in ranks.iter().rev().combinations(count) {
            let sample_ranks: Vec<Rank> = samples.iter().map(|&&r| r).collect();
            let hash_part = self.hash_ranks(&sample_ranks).pow(multiplicity as u32);
            let remaining_ranks: Vec<Rank> = ranks
                .iter()
                .filter(|r| !sample_ranks.contains(r))
                .cloned()
                .collect();

            for partial_hash in self.hash_multisets(&remaining_ranks, counter) {
                hashes.push(&hash_part * partial_hash);
            }
        }

        counter.insert(multiplicity, count);
        hashes
    }

    /// Computes the lookup key for a set of cards. Cards with unknown
    /// components are rejected.
    fn get_key(&self, cards: &[Card]) -> Result<(BigUint, bool), Error> {
        if cards.iter().any(|c| !c.is_known()) {
            return Err(Error::InvalidHand(
                "cards with unknown components cannot be ranked".to_string(),
            ));
        }
        let ranks: Vec<Rank> = Card::get_ranks(cards).collect();
        Ok((self.hash_ranks(&ranks), Card::are_suited(cards)))
    }

    /// Looks up the entry for a hand.
    fn get_entry(&self, cards: &[Card]) -> Result<Entry, Error> {
        let key = self.get_key(cards)?;
        self.entries().get(&key).copied().ok_or_else(|| {
            Error::InvalidHand(format!(
                "the cards '{}' form an invalid hand",
                crate::utilities::cards_to_string(cards)
            ))
        })
    }

    fn get_entry_or_none(&self, cards: &[Card]) -> Option<Entry> {
        self.get_key(cards)
            .ok()
            .and_then(|key| self.entries().get(&key).copied())
    }

    fn has_entry(&self, cards: &[Card]) -> bool {
        self.get_entry_or_none(cards).is_some()
    }
}

/// Accumulates entries in strength order and compacts the indices.
#[derive(Default)]
struct LookupBuilder {
    entries: HashMap<(BigUint, bool), Entry>,
    entry_count: i32,
}

impl LookupBuilder {
    /// Registers a hand under one or more suitedness flags. Keys claimed by
    /// a stronger family earlier (straights inside the high-card multisets,
    /// straight flushes inside the flushes) are left untouched.
    fn add_entry(&mut self, hash: BigUint, suitednesses: &[bool], label: Label) {
        let entry = Entry {
            index: self.entry_count,
            label,
        };
        self.entry_count += 1;

        for &suitedness in suitednesses {
            self.entries
                .entry((hash.clone(), suitedness))
                .or_insert(entry);
        }
    }

    /// Adds every hand matching a rank multiset shape, strongest first.
    fn add_multisets(
        &mut self,
        lookup: &dyn Lookup,
        mut counter: BTreeMap<usize, usize>,
        suitednesses: &[bool],
        label: Label,
    ) {
        let hashes = lookup.hash_multisets(lookup.rank_order(), &mut counter);
        for hash in hashes {
            self.add_entry(hash, suitednesses, label);
        }
    }

    /// Adds all `count`-card straights, strongest first, the wheel last.
    fn add_straights(
        &mut self,
        lookup: &dyn Lookup,
        count: usize,
        suitednesses: &[bool],
        label: Label,
    ) {
        let rank_order = lookup.rank_order();

        for i in (0..=(rank_order.len() - count)).rev() {
            self.add_entry(
                lookup.hash_ranks(&rank_order[i..i + count]),
                suitednesses,
                label,
            );
        }

        let mut wheel_ranks = vec![rank_order[rank_order.len() - 1]];
        wheel_ranks.extend_from_slice(&rank_order[..count - 1]);
        self.add_entry(lookup.hash_ranks(&wheel_ranks), suitednesses, label);
    }

    /// Re-indexes all entries to be contiguous from 0 while preserving the
    /// insertion strength order.
    fn build(mut self) -> HashMap<(BigUint, bool), Entry> {
        let mut sorted_indices: Vec<i32> = self.entries.values().map(|e| e.index).collect();
        sorted_indices.sort_unstable();
        sorted_indices.dedup();

        let reset_indices: HashMap<i32, i32> = sorted_indices
            .into_iter()
            .enumerate()
            .map(|(i, old_index)| (old_index, i as i32))
            .collect();

        for entry in self.entries.values_mut() {
            entry.index = reset_indices[&entry.index];
        }

        self.entries
    }
}

macro_rules! impl_lookup_ctors {
    ($lookup_type:ident) => {
        impl $lookup_type {
            pub fn new() -> Self {
                let mut lookup = Self {
                    entries: HashMap::new(),
                };
                lookup.add_entries();
                lookup
            }
        }

        impl Default for $lookup_type {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// The lookup for standard high hands.
pub struct StandardLookup {
    entries: HashMap<(BigUint, bool), Entry>,
}

impl Lookup for StandardLookup {
    fn rank_order(&self) -> &'static [Rank] {
        &RankOrder::STANDARD
    }

    fn entries(&self) -> &HashMap<(BigUint, bool), Entry> {
        &self.entries
    }

    fn add_entries(&mut self) {
        let mut builder = LookupBuilder::default();
        builder.add_straights(self, 5, &[true], Label::StraightFlush);
        builder.add_multisets(self, BTreeMap::from([(4, 1), (1, 1)]), &[false], Label::FourOfAKind);
        builder.add_multisets(self, BTreeMap::from([(3, 1), (2, 1)]), &[false], Label::FullHouse);
        builder.add_multisets(self, BTreeMap::from([(1, 5)]), &[true], Label::Flush);
        builder.add_straights(self, 5, &[false], Label::Straight);
        builder.add_multisets(self, BTreeMap::from([(3, 1), (1, 2)]), &[false], Label::ThreeOfAKind);
        builder.add_multisets(self, BTreeMap::from([(2, 2), (1, 1)]), &[false], Label::TwoPair);
        builder.add_multisets(self, BTreeMap::from([(2, 1), (1, 3)]), &[false], Label::OnePair);
        builder.add_multisets(self, BTreeMap::from([(1, 5)]), &[false], Label::HighCard);
        self.entries = builder.build();
    }
}
impl_lookup_ctors!(StandardLookup);

/// The lookup for short-deck hold'em, where flushes outrank full houses.
pub struct ShortDeckHoldemLookup {
    entries: HashMap<(BigUint, bool), Entry>,
}

impl Lookup for ShortDeckHoldemLookup {
    fn rank_order(&self) -> &'static [Rank] {
        &RankOrder::SHORT_DECK_HOLDEM
    }

    fn entries(&self) -> &HashMap<(BigUint, bool), Entry> {
        &self.entries
    }

    fn add_entries(&mut self) {
        let mut builder = LookupBuilder::default();
        builder.add_straights(self, 5, &[true], Label::StraightFlush);
        builder.add_multisets(self, BTreeMap::from([(4, 1), (1, 1)]), &[false], Label::FourOfAKind);
        builder.add_multisets(self, BTreeMap::from([(1, 5)]), &[true], Label::Flush);
        builder.add_multisets(self, BTreeMap::from([(3, 1), (2, 1)]), &[false], Label::FullHouse);
        builder.add_straights(self, 5, &[false], Label::Straight);
        builder.add_multisets(self, BTreeMap::from([(3, 1), (1, 2)]), &[false], Label::ThreeOfAKind);
        builder.add_multisets(self, BTreeMap::from([(2, 2), (1, 1)]), &[false], Label::TwoPair);
        builder.add_multisets(self, BTreeMap::from([(2, 1), (1, 3)]), &[false], Label::OnePair);
        builder.add_multisets(self, BTreeMap::from([(1, 5)]), &[false], Label::HighCard);
        self.entries = builder.build();
    }
}
impl_lookup_ctors!(ShortDeckHoldemLookup);

/// The lookup for eight-or-better low hands: five distinct ranks no higher
/// than eight, flushes ignored.
pub struct EightOrBetterLookup {
    entries: HashMap<(BigUint, bool), Entry>,
}

impl Lookup for EightOrBetterLookup {
    fn rank_order(&self) -> &'static [Rank] {
        &RankOrder::EIGHT_OR_BETTER_LOW
    }

    fn entries(&self) -> &HashMap<(BigUint, bool), Entry> {
        &self.entries
    }

    fn add_entries(&mut self) {
        let mut builder = LookupBuilder::default();
        builder.add_multisets(self, BTreeMap::from([(1, 5)]), &[false, true], Label::HighCard);
        self.entries = builder.build();
    }
}
impl_lookup_ctors!(EightOrBetterLookup);

/// The lookup for regular (ace-low) hands where straights and flushes do
/// not count, as in razz.
pub struct RegularLookup {
    entries: HashMap<(BigUint, bool), Entry>,
}

impl Lookup for RegularLookup {
    fn rank_order(&self) -> &'static [Rank] {
        &RankOrder::REGULAR
    }

    fn entries(&self) -> &HashMap<(BigUint, bool), Entry> {
        &self.entries
    }

    fn add_entries(&mut self) {
        let mut builder = LookupBuilder::default();
        builder.add_multisets(self, BTreeMap::from([(4, 1), (1, 1)]), &[false], Label::FourOfAKind);
        builder.add_multisets(self, BTreeMap::from([(3, 1), (2, 1)]), &[false], Label::FullHouse);
        builder.add_multisets(self, BTreeMap::from([(3, 1), (1, 2)]), &[false], Label::ThreeOfAKind);
        builder.add_multisets(self, BTreeMap::from([(2, 2), (1, 1)]), &[false], Label::TwoPair);
        builder.add_multisets(self, BTreeMap::from([(2, 1), (1, 3)]), &[false], Label::OnePair);
        builder.add_multisets(self, BTreeMap::from([(1, 5)]), &[false, true], Label::HighCard);
        self.entries = builder.build();
    }
}
impl_lookup_ctors!(RegularLookup);

fn badugi_key(lookup: &dyn Lookup, cards: &[Card]) -> Result<(BigUint, bool), Error> {
    if cards.iter().any(|c| !c.is_known()) {
        return Err(Error::InvalidHand(
            "cards with unknown components cannot be ranked".to_string(),
        ));
    }
    if !Card::are_rainbow(cards) {
        return Err(Error::InvalidHand(
            "badugi hands must be rainbow".to_string(),
        ));
    }
    let ranks: Vec<Rank> = Card::get_ranks(cards).collect();
    Ok((lookup.hash_ranks(&ranks), Card::are_suited(cards)))
}

/// The lookup for badugi hands (ace low): 1-4 rainbow cards of distinct
/// ranks, more cards always better.
pub struct BadugiLookup {
    entries: HashMap<(BigUint, bool), Entry>,
}

impl Lookup for BadugiLookup {
    fn rank_order(&self) -> &'static [Rank] {
        &RankOrder::REGULAR
    }

    fn entries(&self) -> &HashMap<(BigUint, bool), Entry> {
        &self.entries
    }

    fn add_entries(&mut self) {
        let mut builder = LookupBuilder::default();
        for i in 1..=4 {
            builder.add_multisets(self, BTreeMap::from([(1, i)]), &[i == 1], Label::HighCard);
        }
        self.entries = builder.build();
    }

    fn get_key(&self, cards: &[Card]) -> Result<(BigUint, bool), Error> {
        badugi_key(self, cards)
    }
}
impl_lookup_ctors!(BadugiLookup);

/// The badugi lookup with aces playing high.
pub struct StandardBadugiLookup {
    entries: HashMap<(BigUint, bool), Entry>,
}

impl Lookup for StandardBadugiLookup {
    fn rank_order(&self) -> &'static [Rank] {
        &RankOrder::STANDARD
    }

    fn entries(&self) -> &HashMap<(BigUint, bool), Entry> {
        &self.entries
    }

    fn add_entries(&mut self) {
        let mut builder = LookupBuilder::default();
        for i in 1..=4 {
            builder.add_multisets(self, BTreeMap::from([(1, i)]), &[i == 1], Label::HighCard);
        }
        self.entries = builder.build();
    }

    fn get_key(&self, cards: &[Card]) -> Result<(BigUint, bool), Error> {
        badugi_key(self, cards)
    }
}
impl_lookup_ctors!(StandardBadugiLookup);

/// The single-card lookup for Kuhn poker.
pub struct KuhnPokerLookup {
    entries: HashMap<(BigUint, bool), Entry>,
}

impl Lookup for KuhnPokerLookup {
    fn rank_order(&self) -> &'static [Rank] {
        &RankOrder::KUHN_POKER
    }

    fn entries(&self) -> &HashMap<(BigUint, bool), Entry> {
        &self.entries
    }

    fn add_entries(&mut self) {
        let mut builder = LookupBuilder::default();
        builder.add_multisets(self, BTreeMap::from([(1, 1)]), &[true], Label::HighCard);
        self.entries = builder.build();
    }
}
impl_lookup_ctors!(KuhnPokerLookup);
