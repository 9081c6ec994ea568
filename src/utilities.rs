//! Helper constants, functions, and types used throughout the crate: the
//! card model, the deck, the chip-value abstraction, and the error type.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use chrono::NaiveTime;
use itertools::Itertools;
use num_traits::Signed;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rust_decimal::Decimal;
use strum_macros::{Display, EnumString};

use crate::state::State;

/// The crate-wide error type.
///
/// Verifiers return these; `can_*` queries collapse them to `false`;
/// performers leave the state untouched when one is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed card, action, or numeric literal.
    #[error("parse error: {0}")]
    Parse(String),
    /// Operation arguments contradict the current state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Operation invoked in a phase that does not offer it.
    #[error("illegal phase: {0}")]
    IllegalPhase(String),
    /// Cards cannot form a legal hand for the requested family.
    #[error("invalid hand: {0}")]
    InvalidHand(String),
    /// A draw cannot be satisfied even after replenishing the deck.
    #[error("deck exhausted: {0}")]
    DeckExhausted(String),
}

/// Represents the rank of a card.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, EnumString, Display)]
pub enum Rank {
    #[strum(serialize = "A")]
    Ace,
    #[strum(serialize = "2")]
    Deuce,
    #[strum(serialize = "3")]
    Trey,
    #[strum(serialize = "4")]
    Four,
    #[strum(serialize = "5")]
    Five,
    #[strum(serialize = "6")]
    Six,
    #[strum(serialize = "7")]
    Seven,
    #[strum(serialize = "8")]
    Eight,
    #[strum(serialize = "9")]
    Nine,
    #[strum(serialize = "T")]
    Ten,
    #[strum(serialize = "J")]
    Jack,
    #[strum(serialize = "Q")]
    Queen,
    #[strum(serialize = "K")]
    King,
    #[strum(serialize = "?")]
    Unknown,
}

/// Defines the orderings of ranks, weakest first, for the supported deck
/// and hand families.
pub struct RankOrder;

impl RankOrder {
    pub const STANDARD: [Rank; 13] = [
        Rank::Deuce, Rank::Trey, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
        Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];
    pub const SHORT_DECK_HOLDEM: [Rank; 9] = [
        Rank::Six, Rank::Seven, Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack,
        Rank::Queen, Rank::King, Rank::Ace,
    ];
    pub const REGULAR: [Rank; 13] = [
        Rank::Ace, Rank::Deuce, Rank::Trey, Rank::Four, Rank::Five, Rank::Six,
        Rank::Seven, Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King,
    ];
    pub const EIGHT_OR_BETTER_LOW: [Rank; 8] = [
        Rank::Ace, Rank::Deuce, Rank::Trey, Rank::Four, Rank::Five, Rank::Six,
        Rank::Seven, Rank::Eight,
    ];
    pub const KUHN_POKER: [Rank; 3] = [Rank::Jack, Rank::Queen, Rank::King];
    pub const ROYAL_POKER: [Rank; 5] = [
        Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];
}

/// Represents the suit of a card. The derived order (clubs lowest) is the
/// conventional tiebreak for bring-in selection.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, EnumString, Display)]
pub enum Suit {
    #[strum(serialize = "c")]
    Club,
    #[strum(serialize = "d")]
    Diamond,
    #[strum(serialize = "h")]
    Heart,
    #[strum(serialize = "s")]
    Spade,
    #[strum(serialize = "?")]
    Unknown,
}

pub const SUITS: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];

/// A playing card: a rank paired with a suit, either of which may be the
/// unknown sentinel.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const UNKNOWN: Card = Card {
        rank: Rank::Unknown,
        suit: Suit::Unknown,
    };

    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// `true` when both components are known.
    pub fn is_known(&self) -> bool {
        self.rank != Rank::Unknown && self.suit != Suit::Unknown
    }

    pub fn get_ranks(cards: &[Card]) -> impl Iterator<Item = Rank> + '_ {
        cards.iter().map(|c| c.rank)
    }

    pub fn get_suits(cards: &[Card]) -> impl Iterator<Item = Suit> + '_ {
        cards.iter().map(|c| c.suit)
    }

    pub fn are_paired(cards: &[Card]) -> bool {
        let ranks: Vec<Rank> = Self::get_ranks(cards).collect();
        ranks.iter().unique().count() != ranks.len()
    }

    pub fn are_suited(cards: &[Card]) -> bool {
        Self::get_suits(cards).unique().count() <= 1
    }

    pub fn are_rainbow(cards: &[Card]) -> bool {
        let suits: Vec<Suit> = Self::get_suits(cards).collect();
        suits.iter().unique().count() == suits.len()
    }

    /// Parses zero or more cards from 2-character tokens. `T` and `10` both
    /// mean ten; `?` stands for an unknown rank or suit.
    pub fn parse_cards(s: &str) -> Result<Vec<Card>, Error> {
        let s = s.replace("10", "T").replace(',', " ");
        let mut cards = Vec::new();
        for content in s.split_whitespace() {
            if content.len() % 2 != 0 {
                return Err(Error::Parse(format!(
                    "the length of a card string must be a multiple of 2, got '{content}'"
                )));
            }
            for i in (0..content.len()).step_by(2) {
                let rank_str = &content[i..i + 1];
                let suit_str = &content[i + 1..i + 2];
                let rank = Rank::from_str(rank_str)
                    .map_err(|_| Error::Parse(format!("invalid rank: '{rank_str}'")))?;
                let suit = Suit::from_str(suit_str)
                    .map_err(|_| Error::Parse(format!("invalid suit: '{suit_str}'")))?;
                cards.push(Card::new(rank, suit));
            }
        }
        Ok(cards)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cards = Card::parse_cards(s)?;
        if cards.len() == 1 {
            Ok(cards[0])
        } else {
            Err(Error::Parse(format!("expected a single card, got '{s}'")))
        }
    }
}

/// Formats a card slice without separators, e.g. `"AcKs"`.
pub fn cards_to_string(cards: &[Card]) -> String {
    cards.iter().map(|c| c.to_string()).collect()
}

/// The standard 52-card deck template.
pub fn standard_deck() -> Vec<Card> {
    RankOrder::STANDARD
        .iter()
        .cartesian_product(&SUITS)
        .map(|(&rank, &suit)| Card::new(rank, suit))
        .collect()
}

/// The 36-card short deck (sixes to aces).
pub fn short_deck() -> Vec<Card> {
    RankOrder::SHORT_DECK_HOLDEM
        .iter()
        .cartesian_product(&SUITS)
        .map(|(&rank, &suit)| Card::new(rank, suit))
        .collect()
}

/// The 20-card royal deck (tens to aces).
pub fn royal_deck() -> Vec<Card> {
    RankOrder::ROYAL_POKER
        .iter()
        .cartesian_product(&SUITS)
        .map(|(&rank, &suit)| Card::new(rank, suit))
        .collect()
}

/// The three-card Kuhn poker deck.
pub fn kuhn_deck() -> Vec<Card> {
    RankOrder::KUHN_POKER
        .iter()
        .map(|&rank| Card::new(rank, Suit::Spade))
        .collect()
}

/// An ordered sequence of live cards together with its shuffle source.
///
/// The RNG is injected at construction and consumed deterministically, both
/// for the initial shuffle and for any mid-hand replenishment, so a seeded
/// source replays identically.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: VecDeque<Card>,
    rng: StdRng,
}

impl Deck {
    pub fn new(template: &[Card], mut rng: StdRng) -> Self {
        let mut cards = template.to_vec();
        cards.shuffle(&mut rng);
        Self {
            cards: cards.into(),
            rng,
        }
    }

    /// A deck seeded from entropy.
    pub fn from_entropy(template: &[Card]) -> Self {
        Self::new(template, StdRng::from_entropy())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    pub fn peek_front(&self) -> Option<Card> {
        self.cards.front().copied()
    }

    /// The live cards, front first.
    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.cards.iter().copied()
    }

    /// Removes `n` cards from the front.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, Error> {
        if self.cards.len() < n {
            return Err(Error::DeckExhausted(format!(
                "cannot draw {n} cards from a deck of {}",
                self.cards.len()
            )));
        }
        Ok(self.cards.drain(..n).collect())
    }

    /// Removes a named card from anywhere in the deck. Returns `false` when
    /// the card is not present.
    pub fn remove(&mut self, card: Card) -> bool {
        match self.cards.iter().position(|&c| c == card) {
            Some(i) => {
                self.cards.remove(i);
                true
            }
            None => false,
        }
    }

    /// Shuffles returned cards (muck, burns, stale discards) into the tail.
    pub fn replenish(&mut self, returned: Vec<Card>) {
        let mut returned = returned;
        returned.shuffle(&mut self.rng);
        self.cards.extend(returned);
    }
}

/// An abstract chip value: 64-bit integers and exact decimals both satisfy
/// it. A state is generic over exactly one chip type, so representations
/// never mix. The `Signed` bound covers negative blind entries (post bets)
/// and running payoffs.
pub trait Chips:
    Copy
    + fmt::Debug
    + fmt::Display
    + PartialOrd
    + Signed
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
    + SubAssign
    + FromStr
    + 'static
{
    /// Floored division by a count, with the remainder.
    fn div_rem(self, divisor: usize) -> (Self, Self);

    /// The sentinel for an unknown (unbounded) starting stack.
    fn unbounded() -> Self;
}

impl Chips for i64 {
    fn div_rem(self, divisor: usize) -> (Self, Self) {
        let d = divisor as i64;
        (self / d, self % d)
    }

    fn unbounded() -> Self {
        i64::MAX
    }
}

impl Chips for Decimal {
    fn div_rem(self, divisor: usize) -> (Self, Self) {
        let d = Decimal::from(divisor as u64);
        let quotient = self / d;
        (quotient, self - quotient * d)
    }

    fn unbounded() -> Self {
        Decimal::MAX
    }
}

/// Sums an iterator of chip values.
pub fn sum_chips<C: Chips>(values: impl IntoIterator<Item = C>) -> C {
    values.into_iter().fold(C::zero(), |acc, v| acc + v)
}

pub fn min_or_none<T: Ord>(values: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    values.into_iter().flatten().min()
}

pub fn max_or_none<T: Ord>(values: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    values.into_iter().flatten().max()
}

/// Densifies a sparse seat -> value map into a vector of `count` entries.
/// Negative keys count from the end, so `-1` addresses the button seat.
pub fn clean_values<C: Chips>(values: &BTreeMap<isize, C>, count: usize) -> Vec<C> {
    let mut cleaned = vec![C::zero(); count];
    for (&k, &v) in values {
        let index = if k < 0 { k + count as isize } else { k };
        if (0..count as isize).contains(&index) {
            cleaned[index as usize] = v;
        }
    }
    cleaned
}

/// Uniform antes/blinds/stacks for every seat.
pub fn uniform_values<C: Chips>(value: C, count: usize) -> BTreeMap<isize, C> {
    (0..count as isize).map(|i| (i, value)).collect()
}

pub fn shuffled<T: Clone>(values: &[T], rng: &mut StdRng) -> Vec<T> {
    let mut shuffled_values = values.to_vec();
    shuffled_values.shuffle(rng);
    shuffled_values
}

/// Rotates a sequence, positive counts to the right.
pub fn rotated<T: Clone>(values: &[T], count: isize) -> VecDeque<T> {
    let mut deque: VecDeque<T> = values.iter().cloned().collect();
    if deque.is_empty() {
        return deque;
    }
    let len = deque.len() as isize;
    let count = count.rem_euclid(len) as usize;
    deque.rotate_right(count);
    deque
}

/// The default divmod hook: floored division with remainder.
pub fn div_mod<C: Chips>(dividend: C, divisor: usize) -> (C, C) {
    dividend.div_rem(divisor)
}

/// The default rake hook: takes no rake.
pub fn rake<C: Chips>(_state: &State<C>, amount: C) -> (C, C) {
    (C::zero(), amount)
}

/// Parses a chip value, tolerating digit-group commas.
pub fn parse_value<C: Chips>(raw_value: &str) -> Result<C, Error> {
    let raw_value = raw_value.replace(',', "");
    raw_value
        .parse::<C>()
        .map_err(|_| Error::Parse(format!("could not parse '{raw_value}' as a chip value")))
}

pub fn parse_time(raw_time: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(raw_time, "%H:%M:%S")
        .map_err(|e| Error::Parse(format!("could not parse '{raw_time}' as a time: {e}")))
}
