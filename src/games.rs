//! Predefined poker variants as values.
//!
//! A [`Variant`] bundles the deck template, the hand families, the street
//! schedule, and the betting structure. The factory functions below build
//! the standard games; custom games are composed the same way.

use crate::hands::HandType;
use crate::state::{BettingStructure, Opening, Street};
use crate::utilities::{kuhn_deck, royal_deck, short_deck, standard_deck, Card, Chips, Error};

/// An immutable game description consumed by the state builder.
#[derive(Debug, Clone)]
pub struct Variant<C: Chips> {
    pub deck: Vec<Card>,
    pub hand_types: Vec<HandType>,
    pub streets: Vec<Street<C>>,
    pub betting_structure: BettingStructure,
}

const FIXED_LIMIT_CAP: Option<usize> = Some(4);

fn holdem_streets<C: Chips>(
    hole_count: usize,
    pre_flop_bet: C,
    flop_bet: C,
    late_bet: C,
    max_count: Option<usize>,
) -> Result<Vec<Street<C>>, Error> {
    Ok(vec![
        Street::new(
            false,
            vec![false; hole_count],
            0,
            false,
            Opening::Position,
            pre_flop_bet,
            max_count,
        )?,
        Street::new(true, vec![], 3, false, Opening::Position, flop_bet, max_count)?,
        Street::new(true, vec![], 1, false, Opening::Position, late_bet, max_count)?,
        Street::new(true, vec![], 1, false, Opening::Position, late_bet, max_count)?,
    ])
}

fn stud_streets<C: Chips>(
    first_opening: Opening,
    later_opening: Opening,
    small_bet: C,
    big_bet: C,
) -> Result<Vec<Street<C>>, Error> {
    Ok(vec![
        Street::new(
            false,
            vec![false, false, true],
            0,
            false,
            first_opening,
            small_bet,
            FIXED_LIMIT_CAP,
        )?,
        Street::new(false, vec![true], 0, false, later_opening, small_bet, FIXED_LIMIT_CAP)?,
        Street::new(false, vec![true], 0, false, later_opening, big_bet, FIXED_LIMIT_CAP)?,
        Street::new(false, vec![true], 0, false, later_opening, big_bet, FIXED_LIMIT_CAP)?,
        Street::new(false, vec![false], 0, false, later_opening, big_bet, FIXED_LIMIT_CAP)?,
    ])
}

fn draw_streets<C: Chips>(
    hole_count: usize,
    draw_count: usize,
    bets: &[C],
    max_count: Option<usize>,
) -> Result<Vec<Street<C>>, Error> {
    let mut streets = vec![Street::new(
        false,
        vec![false; hole_count],
        0,
        false,
        Opening::Position,
        bets[0],
        max_count,
    )?];
    for draw in 0..draw_count {
        streets.push(Street::new(
            false,
            vec![],
            0,
            true,
            Opening::Position,
            bets[draw + 1],
            max_count,
        )?);
    }
    Ok(streets)
}

pub fn fixed_limit_texas_holdem<C: Chips>(
    small_bet: C,
    big_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::StandardHighHand],
        streets: holdem_streets(2, small_bet, small_bet, big_bet, FIXED_LIMIT_CAP)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}

pub fn no_limit_texas_holdem<C: Chips>(min_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::StandardHighHand],
        streets: holdem_streets(2, min_bet, min_bet, min_bet, None)?,
        betting_structure: BettingStructure::NoLimit,
    })
}

pub fn pot_limit_texas_holdem<C: Chips>(min_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::StandardHighHand],
        streets: holdem_streets(2, min_bet, min_bet, min_bet, None)?,
        betting_structure: BettingStructure::PotLimit,
    })
}

pub fn no_limit_short_deck_holdem<C: Chips>(min_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: short_deck(),
        hand_types: vec![HandType::ShortDeckHoldemHand],
        streets: holdem_streets(2, min_bet, min_bet, min_bet, None)?,
        betting_structure: BettingStructure::NoLimit,
    })
}

pub fn pot_limit_omaha_holdem<C: Chips>(min_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::OmahaHoldemHand],
        streets: holdem_streets(4, min_bet, min_bet, min_bet, None)?,
        betting_structure: BettingStructure::PotLimit,
    })
}

pub fn fixed_limit_omaha_holdem_split_eight_or_better<C: Chips>(
    small_bet: C,
    big_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![
            HandType::OmahaHoldemHand,
            HandType::OmahaEightOrBetterLowHand,
        ],
        streets: holdem_streets(4, small_bet, small_bet, big_bet, FIXED_LIMIT_CAP)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}

pub fn pot_limit_omaha_holdem_split_eight_or_better<C: Chips>(
    min_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![
            HandType::OmahaHoldemHand,
            HandType::OmahaEightOrBetterLowHand,
        ],
        streets: holdem_streets(4, min_bet, min_bet, min_bet, None)?,
        betting_structure: BettingStructure::PotLimit,
    })
}

pub fn no_limit_greek_holdem<C: Chips>(min_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::GreekHoldemHand],
        streets: holdem_streets(2, min_bet, min_bet, min_bet, None)?,
        betting_structure: BettingStructure::NoLimit,
    })
}

pub fn fixed_limit_seven_card_stud<C: Chips>(
    small_bet: C,
    big_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::StandardHighHand],
        streets: stud_streets(Opening::LowCard, Opening::HighHand, small_bet, big_bet)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}

pub fn fixed_limit_seven_card_stud_split_eight_or_better<C: Chips>(
    small_bet: C,
    big_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![
            HandType::StandardHighHand,
            HandType::EightOrBetterLowHand,
        ],
        streets: stud_streets(Opening::LowCard, Opening::HighHand, small_bet, big_bet)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}

pub fn fixed_limit_razz<C: Chips>(small_bet: C, big_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::RegularLowHand],
        streets: stud_streets(Opening::HighCard, Opening::LowHand, small_bet, big_bet)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}

pub fn no_limit_deuce_to_seven_lowball_single_draw<C: Chips>(
    min_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::StandardLowHand],
        streets: draw_streets(5, 1, &[min_bet, min_bet], None)?,
        betting_structure: BettingStructure::NoLimit,
    })
}

pub fn fixed_limit_deuce_to_seven_lowball_triple_draw<C: Chips>(
    small_bet: C,
    big_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::StandardLowHand],
        streets: draw_streets(5, 3, &[small_bet, small_bet, big_bet, big_bet], FIXED_LIMIT_CAP)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}

pub fn fixed_limit_badugi<C: Chips>(small_bet: C, big_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::BadugiHand],
        streets: draw_streets(4, 3, &[small_bet, small_bet, big_bet, big_bet], FIXED_LIMIT_CAP)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}

pub fn kuhn_poker<C: Chips>() -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: kuhn_deck(),
        hand_types: vec![HandType::KuhnPokerHand],
        streets: vec![Street::new(
            false,
            vec![false],
            0,
            false,
            Opening::Position,
            C::one(),
            Some(1),
        )?],
        betting_structure: BettingStructure::FixedLimit,
    })
}

/// Courchevel: five hole cards with the first board card exposed before the
/// pre-flop betting, then the remainder of the flop.
pub fn pot_limit_courchevel<C: Chips>(min_bet: C) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: standard_deck(),
        hand_types: vec![HandType::OmahaHoldemHand],
        streets: vec![
            Street::new(
                false,
                vec![false; 5],
                1,
                false,
                Opening::Position,
                min_bet,
                None,
            )?,
            Street::new(true, vec![], 2, false, Opening::Position, min_bet, None)?,
            Street::new(true, vec![], 1, false, Opening::Position, min_bet, None)?,
            Street::new(true, vec![], 1, false, Opening::Position, min_bet, None)?,
        ],
        betting_structure: BettingStructure::PotLimit,
    })
}

pub fn fixed_limit_royal_holdem<C: Chips>(
    small_bet: C,
    big_bet: C,
) -> Result<Variant<C>, Error> {
    Ok(Variant {
        deck: royal_deck(),
        hand_types: vec![HandType::StandardHighHand],
        streets: holdem_streets(2, small_bet, small_bet, big_bet, FIXED_LIMIT_CAP)?,
        betting_structure: BettingStructure::FixedLimit,
    })
}
