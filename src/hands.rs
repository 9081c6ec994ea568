//! Poker hand types: construction from explicit cards and projection from
//! game state (hole cards plus board).

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use itertools::Itertools;
use once_cell::sync::Lazy;

use crate::lookups::{
    BadugiLookup, EightOrBetterLookup, Entry, KuhnPokerLookup, Lookup, RegularLookup,
    ShortDeckHoldemLookup, StandardBadugiLookup, StandardLookup,
};
use crate::utilities::{cards_to_string, Card, Error, Rank, RankOrder};

static STANDARD_LOOKUP: Lazy<StandardLookup> = Lazy::new(StandardLookup::new);
static SHORT_DECK_HOLDEM_LOOKUP: Lazy<ShortDeckHoldemLookup> =
    Lazy::new(ShortDeckHoldemLookup::new);
static EIGHT_OR_BETTER_LOOKUP: Lazy<EightOrBetterLookup> = Lazy::new(EightOrBetterLookup::new);
static REGULAR_LOOKUP: Lazy<RegularLookup> = Lazy::new(RegularLookup::new);
static BADUGI_LOOKUP: Lazy<BadugiLookup> = Lazy::new(BadugiLookup::new);
static STANDARD_BADUGI_LOOKUP: Lazy<StandardBadugiLookup> = Lazy::new(StandardBadugiLookup::new);
static KUHN_POKER_LOOKUP: Lazy<KuhnPokerLookup> = Lazy::new(KuhnPokerLookup::new);

/// A poker hand. Stronger hands compare greater than weaker hands of the
/// same family; low families invert the underlying entry comparison.
pub trait Hand: Sized + Clone + Eq + Hash + Ord + Display + Debug {
    /// `true` if a lower (weaker-as-high) holding is better.
    const LOW: bool;
    /// The number of cards that make up this type of hand, if fixed.
    const CARD_COUNT: Option<usize>;

    /// The cards that form this hand.
    fn cards(&self) -> &[Card];

    /// The lookup entry carrying the dense rank.
    fn entry(&self) -> Entry;

    /// Builds a hand from explicit cards, validating the card count and the
    /// family's legality rules.
    fn from_cards(cards: Vec<Card>, lookup: &dyn Lookup) -> Result<Self, Error>;

    /// Builds the best possible hand from hole and board cards, enumerating
    /// the projections the family allows.
    fn from_game(hole_cards: &[Card], board_cards: &[Card], lookup: &dyn Lookup)
        -> Result<Self, Error>;
}

/// An order-comparable strength value usable across players within one hand
/// family; greater wins. Low families are folded in so callers never need
/// to consult the family's low flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandStrength(pub i32);

fn strength(entry: Entry, low: bool) -> HandStrength {
    if low {
        HandStrength(entry.index)
    } else {
        HandStrength(-entry.index)
    }
}

macro_rules! impl_hand_boilerplate {
    ($hand_type:ident) => {
        impl PartialEq for $hand_type {
            fn eq(&self, other: &Self) -> bool {
                self.entry() == other.entry()
            }
        }
        impl Eq for $hand_type {}

        impl PartialOrd for $hand_type {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $hand_type {
            fn cmp(&self, other: &Self) -> Ordering {
                // Entries index 0 as the strongest, so the high comparison
                // is reversed and the low comparison is direct.
                if <Self as Hand>::LOW {
                    self.entry().cmp(&other.entry())
                } else {
                    other.entry().cmp(&self.entry())
                }
            }
        }

        impl Hash for $hand_type {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.entry().hash(state);
            }
        }

        impl Display for $hand_type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} ({})", self.entry().label, cards_to_string(self.cards()))
            }
        }

        impl Debug for $hand_type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", cards_to_string(self.cards()))
            }
        }
    };
}

/// Hands formed from the best fixed-size combination of all available cards.
macro_rules! impl_combination_hand {
    ($hand_type:ident, $is_low:expr, $card_count:expr, $hand_name:expr) => {
        #[derive(Clone)]
        pub struct $hand_type {
            cards: Vec<Card>,
            entry: Entry,
        }
        impl_hand_boilerplate!($hand_type);

        impl Hand for $hand_type {
            const LOW: bool = $is_low;
            const CARD_COUNT: Option<usize> = Some($card_count);

            fn cards(&self) -> &[Card] {
                &self.cards
            }

            fn entry(&self) -> Entry {
                self.entry
            }

            fn from_cards(cards: Vec<Card>, lookup: &dyn Lookup) -> Result<Self, Error> {
                if cards.len() != $card_count {
                    return Err(Error::InvalidHand(format!(
                        "{} takes exactly {} cards, got {}",
                        $hand_name,
                        $card_count,
                        cards.len()
                    )));
                }
                let entry = lookup.get_entry(&cards)?;
                Ok(Self { cards, entry })
            }

            fn from_game(
                hole_cards: &[Card],
                board_cards: &[Card],
                lookup: &dyn Lookup,
            ) -> Result<Self, Error> {
                hole_cards
                    .iter()
                    .chain(board_cards)
                    .copied()
                    .combinations($card_count)
                    .filter_map(|combo| Self::from_cards(combo, lookup).ok())
                    .max()
                    .ok_or_else(|| {
                        Error::InvalidHand(format!("no valid {} can be formed", $hand_name))
                    })
            }
        }
    };
}

impl_combination_hand!(StandardHighHand, false, 5, "StandardHighHand");
impl_combination_hand!(StandardLowHand, true, 5, "StandardLowHand");
impl_combination_hand!(ShortDeckHoldemHand, false, 5, "ShortDeckHoldemHand");
impl_combination_hand!(EightOrBetterLowHand, true, 5, "EightOrBetterLowHand");
impl_combination_hand!(RegularLowHand, true, 5, "RegularLowHand");

/// Hands that must use exact counts of hole and board cards.
macro_rules! impl_hole_board_combination_hand {
    (
        $hand_type:ident,
        $is_low:expr,
        $card_count:expr,
        $hole_card_count:expr,
        $board_card_count:expr,
        $hand_name:expr
    ) => {
        #[derive(Clone)]
        pub struct $hand_type {
            cards: Vec<Card>,
            entry: Entry,
        }
        impl_hand_boilerplate!($hand_type);

        impl Hand for $hand_type {
            const LOW: bool = $is_low;
            const CARD_COUNT: Option<usize> = Some($card_count);

            fn cards(&self) -> &[Card] {
                &self.cards
            }

            fn entry(&self) -> Entry {
                self.entry
            }

            fn from_cards(cards: Vec<Card>, lookup: &dyn Lookup) -> Result<Self, Error> {
                if cards.len() != $card_count {
                    return Err(Error::InvalidHand(format!(
                        "{} takes exactly {} cards, got {}",
                        $hand_name,
                        $card_count,
                        cards.len()
                    )));
                }
                let entry = lookup.get_entry(&cards)?;
                Ok(Self { cards, entry })
            }

            fn from_game(
                hole_cards: &[Card],
                board_cards: &[Card],
                lookup: &dyn Lookup,
            ) -> Result<Self, Error> {
                hole_cards
                    .iter()
                    .copied()
                    .combinations($hole_card_count)
                    .cartesian_product(
                        board_cards.iter().copied().combinations($board_card_count),
                    )
                    .filter_map(|(h, b)| {
                        let combo: Vec<Card> = h.into_iter().chain(b).collect();
                        Self::from_cards(combo, lookup).ok()
                    })
                    .max()
                    .ok_or_else(|| {
                        Error::InvalidHand(format!("no valid {} can be formed", $hand_name))
                    })
            }
        }
    };
}

impl_hole_board_combination_hand!(OmahaHoldemHand, false, 5, 2, 3, "OmahaHoldemHand");
impl_hole_board_combination_hand!(
    OmahaEightOrBetterLowHand,
    true,
    5,
    2,
    3,
    "OmahaEightOrBetterLowHand"
);
// Greek hold'em: both hole cards are mandatory, completed by three board
// cards. With two hole cards the hole enumeration is the identity.
impl_hole_board_combination_hand!(GreekHoldemHand, false, 5, 2, 3, "GreekHoldemHand");

/// Badugi hands: the best rainbow, distinct-rank subset of 1-4 cards.
macro_rules! impl_badugi_hand {
    ($hand_type:ident, $hand_name:expr) => {
        #[derive(Clone)]
        pub struct $hand_type {
            cards: Vec<Card>,
            entry: Entry,
        }
        impl_hand_boilerplate!($hand_type);

        impl Hand for $hand_type {
            const LOW: bool = true;
            const CARD_COUNT: Option<usize> = None;

            fn cards(&self) -> &[Card] {
                &self.cards
            }

            fn entry(&self) -> Entry {
                self.entry
            }

            fn from_cards(cards: Vec<Card>, lookup: &dyn Lookup) -> Result<Self, Error> {
                if cards.is_empty() || cards.len() > 4 {
                    return Err(Error::InvalidHand(format!(
                        "{} takes 1 to 4 cards, got {}",
                        $hand_name,
                        cards.len()
                    )));
                }
                let entry = lookup.get_entry(&cards)?;
                Ok(Self { cards, entry })
            }

            fn from_game(
                hole_cards: &[Card],
                board_cards: &[Card],
                lookup: &dyn Lookup,
            ) -> Result<Self, Error> {
                let all_cards: Vec<Card> =
                    hole_cards.iter().chain(board_cards).copied().collect();
                (1..=4)
                    .rev()
                    .flat_map(|count| all_cards.iter().copied().combinations(count))
                    .filter_map(|combo| Self::from_cards(combo, lookup).ok())
                    .max()
                    .ok_or_else(|| {
                        Error::InvalidHand(format!("no valid {} can be formed", $hand_name))
                    })
            }
        }
    };
}

impl_badugi_hand!(BadugiHand, "BadugiHand");
impl_badugi_hand!(StandardBadugiHand, "StandardBadugiHand");

/// The single-card Kuhn poker hand.
#[derive(Clone)]
pub struct KuhnPokerHand {
    cards: Vec<Card>,
    entry: Entry,
}
impl_hand_boilerplate!(KuhnPokerHand);

impl Hand for KuhnPokerHand {
    const LOW: bool = false;
    const CARD_COUNT: Option<usize> = Some(1);

    fn cards(&self) -> &[Card] {
        &self.cards
    }

    fn entry(&self) -> Entry {
        self.entry
    }

    fn from_cards(cards: Vec<Card>, lookup: &dyn Lookup) -> Result<Self, Error> {
        if cards.len() != 1 {
            return Err(Error::InvalidHand(format!(
                "KuhnPokerHand takes exactly 1 card, got {}",
                cards.len()
            )));
        }
        let entry = lookup.get_entry(&cards)?;
        Ok(Self { cards, entry })
    }

    fn from_game(
        hole_cards: &[Card],
        board_cards: &[Card],
        lookup: &dyn Lookup,
    ) -> Result<Self, Error> {
        hole_cards
            .iter()
            .chain(board_cards)
            .filter_map(|&card| Self::from_cards(vec![card], lookup).ok())
            .max()
            .ok_or_else(|| Error::InvalidHand("no valid KuhnPokerHand can be formed".to_string()))
    }
}

/// The value-level hand family tag carried by variants.
///
/// Custom families are composed from a lookup plus a projection function
/// rather than subclassed.
#[derive(Debug, Clone, Copy)]
pub enum HandType {
    StandardHighHand,
    StandardLowHand,
    ShortDeckHoldemHand,
    EightOrBetterLowHand,
    RegularLowHand,
    OmahaHoldemHand,
    OmahaEightOrBetterLowHand,
    GreekHoldemHand,
    BadugiHand,
    StandardBadugiHand,
    KuhnPokerHand,
    Custom {
        low: bool,
        rank_order: &'static [Rank],
        evaluate: fn(&[Card], &[Card]) -> Option<HandStrength>,
    },
}

impl HandType {
    /// Whether a weaker-as-high holding is better for this family.
    pub fn low(&self) -> bool {
        match self {
            HandType::StandardHighHand
            | HandType::ShortDeckHoldemHand
            | HandType::OmahaHoldemHand
            | HandType::GreekHoldemHand
            | HandType::KuhnPokerHand => false,
            HandType::StandardLowHand
            | HandType::EightOrBetterLowHand
            | HandType::RegularLowHand
            | HandType::OmahaEightOrBetterLowHand
            | HandType::BadugiHand
            | HandType::StandardBadugiHand => true,
            HandType::Custom { low, .. } => *low,
        }
    }

    /// The rank order governing card comparisons for this family, weakest
    /// rank first. Used for bring-in and exposed-hand opener selection.
    pub fn rank_order(&self) -> &'static [Rank] {
        match self {
            HandType::StandardHighHand
            | HandType::StandardLowHand
            | HandType::OmahaHoldemHand
            | HandType::GreekHoldemHand
            | HandType::StandardBadugiHand => &RankOrder::STANDARD,
            HandType::ShortDeckHoldemHand => &RankOrder::SHORT_DECK_HOLDEM,
            HandType::EightOrBetterLowHand
            | HandType::RegularLowHand
            | HandType::OmahaEightOrBetterLowHand
            | HandType::BadugiHand => &RankOrder::REGULAR,
            HandType::KuhnPokerHand => &RankOrder::KUHN_POKER,
            HandType::Custom { rank_order, .. } => rank_order,
        }
    }

    /// Evaluates the strongest qualifying projection, or `None` when no
    /// legal hand can be formed (unknown cards, missing qualifier).
    pub fn evaluate(&self, hole_cards: &[Card], board_cards: &[Card]) -> Option<HandStrength> {
        match self {
            HandType::StandardHighHand => {
                StandardHighHand::from_game(hole_cards, board_cards, &*STANDARD_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), false))
            }
            HandType::StandardLowHand => {
                StandardLowHand::from_game(hole_cards, board_cards, &*STANDARD_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), true))
            }
            HandType::ShortDeckHoldemHand => {
                ShortDeckHoldemHand::from_game(hole_cards, board_cards, &*SHORT_DECK_HOLDEM_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), false))
            }
            HandType::EightOrBetterLowHand => {
                EightOrBetterLowHand::from_game(hole_cards, board_cards, &*EIGHT_OR_BETTER_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), true))
            }
            HandType::RegularLowHand => {
                RegularLowHand::from_game(hole_cards, board_cards, &*REGULAR_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), true))
            }
            HandType::OmahaHoldemHand => {
                OmahaHoldemHand::from_game(hole_cards, board_cards, &*STANDARD_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), false))
            }
            HandType::OmahaEightOrBetterLowHand => OmahaEightOrBetterLowHand::from_game(
                hole_cards,
                board_cards,
                &*EIGHT_OR_BETTER_LOOKUP,
            )
            .ok()
            .map(|h| strength(h.entry(), true)),
            HandType::GreekHoldemHand => {
                GreekHoldemHand::from_game(hole_cards, board_cards, &*STANDARD_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), false))
            }
            HandType::BadugiHand => {
                BadugiHand::from_game(hole_cards, board_cards, &*BADUGI_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), true))
            }
            HandType::StandardBadugiHand => {
                StandardBadugiHand::from_game(hole_cards, board_cards, &*STANDARD_BADUGI_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), true))
            }
            HandType::KuhnPokerHand => {
                KuhnPokerHand::from_game(hole_cards, board_cards, &*KUHN_POKER_LOOKUP)
                    .ok()
                    .map(|h| strength(h.entry(), false))
            }
            HandType::Custom { evaluate, .. } => evaluate(hole_cards, board_cards),
        }
    }
}

/// The shared lookups, exposed so concrete hands can be built without
/// re-deriving tables.
pub fn standard_lookup() -> &'static StandardLookup {
    &STANDARD_LOOKUP
}

pub fn short_deck_holdem_lookup() -> &'static ShortDeckHoldemLookup {
    &SHORT_DECK_HOLDEM_LOOKUP
}

pub fn eight_or_better_lookup() -> &'static EightOrBetterLookup {
    &EIGHT_OR_BETTER_LOOKUP
}

pub fn regular_lookup() -> &'static RegularLookup {
    &REGULAR_LOOKUP
}

pub fn badugi_lookup() -> &'static BadugiLookup {
    &BADUGI_LOOKUP
}

pub fn standard_badugi_lookup() -> &'static StandardBadugiLookup {
    &STANDARD_BADUGI_LOOKUP
}

pub fn kuhn_poker_lookup() -> &'static KuhnPokerLookup {
    &KUHN_POKER_LOOKUP
}
