//! The poker game state machine.
//!
//! A [`State`] is driven by operations grouped into phases. Every operation
//! `x` comes in three flavors: `can_x` (boolean query), `verify_x` (pure
//! check returning the resolved arguments), and the performer `x` itself,
//! which verifies, mutates, appends a record to the operation log, and
//! advances the automaton. Failed verifications leave the state untouched.

use std::collections::{BTreeMap, HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;
use strum_macros::{Display, EnumString};

use crate::games::Variant;
use crate::hands::{HandStrength, HandType};
use crate::utilities::{
    clean_values, div_mod, rake, sum_chips, Card, Chips, Deck, Error, Suit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum BettingStructure {
    #[strum(serialize = "Fixed-limit")]
    FixedLimit,
    #[strum(serialize = "Pot-limit")]
    PotLimit,
    #[strum(serialize = "No-limit")]
    NoLimit,
}

/// How the first player to act on a street is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Opening {
    Position,
    LowCard,
    HighCard,
    LowHand,
    HighHand,
}

/// Phases the state machine can auto-complete with default arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum Automation {
    AntePosting,
    BetCollection,
    BlindOrStraddlePosting,
    CardBurning,
    HoleDealing,
    BoardDealing,
    RunoutCountSelection,
    HoleCardsShowingOrMucking,
    HandKilling,
    ChipsPushing,
    ChipsPulling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Mode {
    Tournament,
    #[strum(serialize = "Cash-game")]
    CashGame,
}

/// The currently active phase, derived from the pending statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AntePosting,
    BetCollection,
    BlindOrStraddlePosting,
    Dealing,
    Betting,
    RunoutCountSelection,
    Showdown,
    HandKilling,
    ChipsPushing,
    ChipsPulling,
    Terminal,
}

/// A showdown decision: show everything, muck, or reveal specific cards
/// (unknown entries stay face down). `None` passed to the performer lets the
/// state decide (show iff the hand is not yet beaten).
#[derive(Debug, Clone)]
pub enum ShowOrMuck {
    Show,
    Muck,
    Cards(Vec<Card>),
}

/// A single street: dealing shape plus betting parameters.
#[derive(Debug, Clone)]
pub struct Street<C: Chips> {
    pub card_burning_status: bool,
    pub hole_dealing_statuses: Vec<bool>,
    pub board_dealing_count: usize,
    pub draw_status: bool,
    pub opening: Opening,
    pub min_completion_betting_or_raising_amount: C,
    pub max_completion_betting_or_raising_count: Option<usize>,
}

impl<C: Chips> Street<C> {
    pub fn new(
        card_burning_status: bool,
        hole_dealing_statuses: Vec<bool>,
        board_dealing_count: usize,
        draw_status: bool,
        opening: Opening,
        min_completion_betting_or_raising_amount: C,
        max_completion_betting_or_raising_count: Option<usize>,
    ) -> Result<Self, Error> {
        if !hole_dealing_statuses.is_empty() && draw_status {
            return Err(Error::InvalidArgument(
                "only one of hole dealing or drawing is permitted on a street".to_string(),
            ));
        }
        if min_completion_betting_or_raising_amount <= C::zero() {
            return Err(Error::InvalidArgument(
                "the minimum bet or raise amount must be positive".to_string(),
            ));
        }
        Ok(Self {
            card_burning_status,
            hole_dealing_statuses,
            board_dealing_count,
            draw_status,
            opening,
            min_completion_betting_or_raising_amount,
            max_completion_betting_or_raising_count,
        })
    }
}

/// A pot or side pot over a contribution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Pot<C: Chips> {
    pub raked_amount: C,
    pub unraked_amount: C,
    pub player_indices: Vec<usize>,
}

impl<C: Chips> Pot<C> {
    pub fn amount(&self) -> C {
        self.raked_amount + self.unraked_amount
    }
}

/// A non-fatal anomaly (card availability, replenishment) raised during
/// replay-tolerant operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
}

// Operation records: every performer returns one and appends it to the log.

#[derive(Debug, Clone)]
pub struct AntePosting<C: Chips> {
    pub player_index: usize,
    pub amount: C,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BetCollection<C: Chips> {
    pub bets: Vec<C>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlindOrStraddlePosting<C: Chips> {
    pub player_index: usize,
    pub amount: C,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CardBurning {
    pub card: Card,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HoleDealing {
    pub player_index: usize,
    pub cards: Vec<Card>,
    pub statuses: Vec<bool>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BoardDealing {
    pub cards: Vec<Card>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StandingPatOrDiscarding {
    pub player_index: usize,
    pub cards: Vec<Card>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Folding {
    pub player_index: usize,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckingOrCalling<C: Chips> {
    pub player_index: usize,
    pub amount: C,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BringInPosting<C: Chips> {
    pub player_index: usize,
    pub amount: C,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionBettingOrRaisingTo<C: Chips> {
    pub player_index: usize,
    pub amount: C,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunoutCountSelection {
    pub player_index: usize,
    pub runout_count: Option<usize>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HoleCardsShowingOrMucking {
    pub player_index: usize,
    pub hole_cards: Vec<Card>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HandKilling {
    pub player_index: usize,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChipsPushing<C: Chips> {
    pub amounts: Vec<C>,
    pub pot_index: usize,
    pub board_index: Option<usize>,
    pub hand_type_index: Option<usize>,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChipsPulling<C: Chips> {
    pub player_index: usize,
    pub amount: C,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NoOperation {
    pub commentary: Option<String>,
}

/// Everything a state can do, as a log-friendly sum type.
#[derive(Debug, Clone)]
pub enum Operation<C: Chips> {
    AntePosting(AntePosting<C>),
    BetCollection(BetCollection<C>),
    BlindOrStraddlePosting(BlindOrStraddlePosting<C>),
    CardBurning(CardBurning),
    HoleDealing(HoleDealing),
    BoardDealing(BoardDealing),
    StandingPatOrDiscarding(StandingPatOrDiscarding),
    Folding(Folding),
    CheckingOrCalling(CheckingOrCalling<C>),
    BringInPosting(BringInPosting<C>),
    CompletionBettingOrRaisingTo(CompletionBettingOrRaisingTo<C>),
    RunoutCountSelection(RunoutCountSelection),
    HoleCardsShowingOrMucking(HoleCardsShowingOrMucking),
    HandKilling(HandKilling),
    ChipsPushing(ChipsPushing<C>),
    ChipsPulling(ChipsPulling<C>),
    NoOperation(NoOperation),
}

fn min_c<C: Chips>(a: C, b: C) -> C {
    if b < a {
        b
    } else {
        a
    }
}

fn max_c<C: Chips>(a: C, b: C) -> C {
    if b > a {
        b
    } else {
        a
    }
}

/// The simulated state of a single poker hand.
#[derive(Clone)]
pub struct State<C: Chips> {
    // Configuration
    pub automations: HashSet<Automation>,
    pub deck: Vec<Card>,
    pub hand_types: Vec<HandType>,
    pub streets: Vec<Street<C>>,
    pub betting_structure: BettingStructure,
    pub ante_trimming_status: bool,
    pub antes: Vec<C>,
    pub blinds_or_straddles: Vec<C>,
    pub bring_in: C,
    pub starting_stacks: Vec<C>,
    pub player_count: usize,
    pub mode: Mode,
    pub starting_board_count: usize,
    pub strict_status: bool,
    pub divmod: fn(C, usize) -> (C, C),
    pub rake: fn(&State<C>, C) -> (C, C),

    // Game state
    pub deck_cards: Deck,
    pub board_cards: Vec<Vec<Card>>,
    pub mucked_cards: Vec<Card>,
    pub burn_cards: Vec<Card>,
    pub discarded_cards: Vec<Vec<Card>>,
    pub statuses: Vec<bool>,
    pub bets: Vec<C>,
    pub stacks: Vec<C>,
    pub payoffs: Vec<C>,
    pub posted_antes: Vec<C>,
    pub hole_cards: Vec<Vec<Card>>,
    pub hole_card_statuses: Vec<Vec<bool>>,
    pub street_index: Option<usize>,
    pub status: bool,
    pub operations: Vec<Operation<C>>,
    pub warnings: Vec<Warning>,

    // Phase-specific state
    pub ante_posting_statuses: Vec<bool>,
    pub bet_collection_status: bool,
    pub blind_or_straddle_posting_statuses: Vec<bool>,
    pub card_burning_status: bool,
    pub hole_dealing_statuses: Vec<VecDeque<bool>>,
    pub board_dealing_counts: Vec<usize>,
    pub standing_pat_or_discarding_statuses: Vec<bool>,
    pub actor_indices: VecDeque<usize>,
    pub opener_index: Option<usize>,
    pub bring_in_status: bool,
    pub completion_status: bool,
    pub completion_betting_or_raising_amount: C,
    pub completion_betting_or_raising_count: usize,
    pub acted_player_indices: HashSet<usize>,
    pub consecutive_short_all_in_count: usize,
    pub consecutive_short_all_in_amount: C,
    pub runout_count_selection_status: bool,
    pub runout_count_selector_statuses: Vec<bool>,
    pub runout_count_selections: Vec<Option<usize>>,
    pub runout_count: Option<usize>,
    pub street_return_index: Option<usize>,
    pub street_return_count: usize,
    pub runout_replay_status: bool,
    pub showdown_indices: VecDeque<usize>,
    pub hand_killing_statuses: Vec<bool>,
    pub pot_snapshots: Vec<Pot<C>>,
    pub chips_pushing_queue: VecDeque<(usize, Option<usize>, Option<usize>)>,
    pub chips_pulling_statuses: Vec<bool>,
    pub raked_total: C,
}

/// Builds a [`State`] from a variant plus the per-hand configuration.
pub struct StateBuilder<C: Chips> {
    variant: Variant<C>,
    automations: HashSet<Automation>,
    ante_trimming_status: bool,
    raw_antes: BTreeMap<isize, C>,
    raw_blinds_or_straddles: BTreeMap<isize, C>,
    bring_in: C,
    raw_starting_stacks: BTreeMap<isize, C>,
    player_count: usize,
    mode: Mode,
    starting_board_count: usize,
    strict_status: bool,
    shuffle_source: Option<StdRng>,
    divmod: fn(C, usize) -> (C, C),
    rake: fn(&State<C>, C) -> (C, C),
}

impl<C: Chips> StateBuilder<C> {
    pub fn new(variant: Variant<C>, player_count: usize) -> Self {
        Self {
            variant,
            automations: HashSet::new(),
            ante_trimming_status: false,
            raw_antes: BTreeMap::new(),
            raw_blinds_or_straddles: BTreeMap::new(),
            bring_in: C::zero(),
            raw_starting_stacks: BTreeMap::new(),
            player_count,
            mode: Mode::Tournament,
            starting_board_count: 1,
            strict_status: false,
            shuffle_source: None,
            divmod: div_mod,
            rake,
        }
    }

    pub fn automations(mut self, automations: &[Automation]) -> Self {
        self.automations = automations.iter().copied().collect();
        self
    }

    pub fn ante_trimming_status(mut self, ante_trimming_status: bool) -> Self {
        self.ante_trimming_status = ante_trimming_status;
        self
    }

    pub fn raw_antes(mut self, raw_antes: BTreeMap<isize, C>) -> Self {
        self.raw_antes = raw_antes;
        self
    }

    pub fn raw_blinds_or_straddles(mut self, raw_blinds_or_straddles: BTreeMap<isize, C>) -> Self {
        self.raw_blinds_or_straddles = raw_blinds_or_straddles;
        self
    }

    pub fn bring_in(mut self, bring_in: C) -> Self {
        self.bring_in = bring_in;
        self
    }

    pub fn raw_starting_stacks(mut self, raw_starting_stacks: BTreeMap<isize, C>) -> Self {
        self.raw_starting_stacks = raw_starting_stacks;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn starting_board_count(mut self, starting_board_count: usize) -> Self {
        self.starting_board_count = starting_board_count;
        self
    }

    /// Escalates card-availability warnings into verification errors.
    pub fn strict(mut self, strict_status: bool) -> Self {
        self.strict_status = strict_status;
        self
    }

    /// Injects the deterministic shuffle source consumed by the deck.
    pub fn shuffle_source(mut self, rng: StdRng) -> Self {
        self.shuffle_source = Some(rng);
        self
    }

    pub fn divmod(mut self, divmod: fn(C, usize) -> (C, C)) -> Self {
        self.divmod = divmod;
        self
    }

    pub fn rake(mut self, rake: fn(&State<C>, C) -> (C, C)) -> Self {
        self.rake = rake;
        self
    }

    pub fn build(self) -> Result<State<C>, Error> {
        if self.player_count < 2 {
            return Err(Error::InvalidArgument(
                "the player count must be at least 2".to_string(),
            ));
        }
        if self.variant.streets.is_empty() {
            return Err(Error::InvalidArgument(
                "the variant must define at least one street".to_string(),
            ));
        }
        if self.variant.hand_types.is_empty() || self.variant.hand_types.len() > 2 {
            return Err(Error::InvalidArgument(
                "the variant must define one or two hand types".to_string(),
            ));
        }
        if self.starting_board_count == 0 {
            return Err(Error::InvalidArgument(
                "the starting board count must be positive".to_string(),
            ));
        }

        let antes = clean_values(&self.raw_antes, self.player_count);
        let blinds_or_straddles = clean_values(&self.raw_blinds_or_straddles, self.player_count);
        let starting_stacks = clean_values(&self.raw_starting_stacks, self.player_count);

        if starting_stacks.iter().any(|s| *s <= C::zero()) {
            return Err(Error::InvalidArgument(
                "every starting stack must be positive".to_string(),
            ));
        }

        let rng = self
            .shuffle_source
            .unwrap_or_else(StdRng::from_entropy);
        let street_count = self.variant.streets.len();

        let mut state = State {
            automations: self.automations,
            deck: self.variant.deck.clone(),
            hand_types: self.variant.hand_types,
            streets: self.variant.streets,
            betting_structure: self.variant.betting_structure,
            ante_trimming_status: self.ante_trimming_status,
            antes,
            blinds_or_straddles,
            bring_in: self.bring_in,
            starting_stacks: starting_stacks.clone(),
            player_count: self.player_count,
            mode: self.mode,
            starting_board_count: self.starting_board_count,
            strict_status: self.strict_status,
            divmod: self.divmod,
            rake: self.rake,
            deck_cards: Deck::new(&self.variant.deck, rng),
            board_cards: Vec::new(),
            mucked_cards: Vec::new(),
            burn_cards: Vec::new(),
            discarded_cards: vec![Vec::new(); street_count],
            statuses: vec![true; self.player_count],
            bets: vec![C::zero(); self.player_count],
            stacks: starting_stacks,
            payoffs: vec![C::zero(); self.player_count],
            posted_antes: vec![C::zero(); self.player_count],
            hole_cards: vec![Vec::new(); self.player_count],
            hole_card_statuses: vec![Vec::new(); self.player_count],
            street_index: None,
            status: true,
            operations: Vec::new(),
            warnings: Vec::new(),
            ante_posting_statuses: vec![false; self.player_count],
            bet_collection_status: false,
            blind_or_straddle_posting_statuses: vec![false; self.player_count],
            card_burning_status: false,
            hole_dealing_statuses: vec![VecDeque::new(); self.player_count],
            board_dealing_counts: vec![0; self.starting_board_count],
            standing_pat_or_discarding_statuses: vec![false; self.player_count],
            actor_indices: VecDeque::new(),
            opener_index: None,
            bring_in_status: false,
            completion_status: false,
            completion_betting_or_raising_amount: C::zero(),
            completion_betting_or_raising_count: 0,
            acted_player_indices: HashSet::new(),
            consecutive_short_all_in_count: 0,
            consecutive_short_all_in_amount: C::zero(),
            runout_count_selection_status: false,
            runout_count_selector_statuses: vec![false; self.player_count],
            runout_count_selections: vec![None; self.player_count],
            runout_count: None,
            street_return_index: None,
            street_return_count: 0,
            runout_replay_status: false,
            showdown_indices: VecDeque::new(),
            hand_killing_statuses: vec![false; self.player_count],
            pot_snapshots: Vec::new(),
            chips_pushing_queue: VecDeque::new(),
            chips_pulling_statuses: vec![false; self.player_count],
            raked_total: C::zero(),
        };

        state.begin();
        Ok(state)
    }
}

impl<C: Chips> State<C> {
    // ------------------------------------------------------------------
    // Derived queries

    /// Players still in the hand.
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.player_count).filter(move |&i| self.statuses[i])
    }

    pub fn ante_poster_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.player_count).filter(move |&i| self.ante_posting_statuses[i])
    }

    pub fn blind_or_straddle_poster_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.player_count).filter(move |&i| self.blind_or_straddle_posting_statuses[i])
    }

    /// The next player owed hole cards, in seat order.
    pub fn hole_dealee_index(&self) -> Option<usize> {
        (0..self.player_count).find(|&i| !self.hole_dealing_statuses[i].is_empty())
    }

    /// The next player owed a stand-pat/discard decision, in seat order.
    pub fn stander_pat_or_discarder_index(&self) -> Option<usize> {
        (0..self.player_count).find(|&i| self.standing_pat_or_discarding_statuses[i])
    }

    /// The player currently in turn to act during betting.
    pub fn actor_index(&self) -> Option<usize> {
        self.actor_indices.front().copied()
    }

    /// The player currently in turn to show or muck.
    pub fn showdown_index(&self) -> Option<usize> {
        self.showdown_indices.front().copied()
    }

    pub fn runout_count_selector_index(&self) -> Option<usize> {
        (0..self.player_count).find(|&i| self.runout_count_selector_statuses[i])
    }

    pub fn hand_killing_index(&self) -> Option<usize> {
        (0..self.player_count).find(|&i| self.hand_killing_statuses[i])
    }

    pub fn chips_pulling_index(&self) -> Option<usize> {
        (0..self.player_count).find(|&i| self.chips_pulling_statuses[i])
    }

    /// The currently active phase.
    pub fn phase(&self) -> Phase {
        if !self.status {
            Phase::Terminal
        } else if self.ante_posting_statuses.iter().any(|&s| s) {
            Phase::AntePosting
        } else if self.bet_collection_status {
            Phase::BetCollection
        } else if self.blind_or_straddle_posting_statuses.iter().any(|&s| s) {
            Phase::BlindOrStraddlePosting
        } else if self.card_burning_status
            || self.hole_dealing_statuses.iter().any(|q| !q.is_empty())
            || self.board_dealing_counts.iter().any(|&c| c > 0)
            || self.standing_pat_or_discarding_statuses.iter().any(|&s| s)
        {
            Phase::Dealing
        } else if !self.actor_indices.is_empty() {
            Phase::Betting
        } else if self.runout_count_selector_statuses.iter().any(|&s| s) {
            Phase::RunoutCountSelection
        } else if !self.showdown_indices.is_empty() {
            Phase::Showdown
        } else if self.hand_killing_statuses.iter().any(|&s| s) {
            Phase::HandKilling
        } else if !self.chips_pushing_queue.is_empty() {
            Phase::ChipsPushing
        } else if self.chips_pulling_statuses.iter().any(|&s| s) {
            Phase::ChipsPulling
        } else {
            Phase::Terminal
        }
    }

    /// The number of boards in play (doubled and more by multi-runouts).
    pub fn board_count(&self) -> usize {
        self.starting_board_count * self.runout_count.unwrap_or(1)
    }

    /// The cards of board `board_index`. Positions dealt before a runout
    /// split hold fewer variants and are shared.
    pub fn get_board_cards(&self, board_index: usize) -> Vec<Card> {
        self.board_cards
            .iter()
            .filter(|slot| !slot.is_empty())
            .map(|slot| slot[board_index % slot.len()])
            .collect()
    }

    pub fn max_bet(&self) -> C {
        self.bets.iter().fold(C::zero(), |acc, &b| max_c(acc, b))
    }

    /// Collected pots plus outstanding bets.
    pub fn total_pot_amount(&self) -> C {
        sum_chips(self.pots().iter().map(|p| p.amount()))
            + sum_chips(self.bets.iter().copied())
    }

    /// Whether no further betting can occur while two or more players
    /// remain in the hand.
    pub fn all_in_status(&self) -> bool {
        let active: Vec<usize> = self.active_indices().collect();
        active.len() >= 2
            && active
                .iter()
                .filter(|&&i| self.stacks[i] > C::zero())
                .count()
                <= 1
    }

    fn effective_index(&self, player_index: usize) -> usize {
        // Heads up, the seat roles are swapped: seat 0 takes the big blind.
        if self.player_count == 2 {
            1 - player_index
        } else {
            player_index
        }
    }

    pub fn get_effective_ante(&self, player_index: usize) -> C {
        let ante = self.antes[self.effective_index(player_index)].abs();
        min_c(ante, self.starting_stacks[player_index])
    }

    pub fn get_effective_blind_or_straddle(&self, player_index: usize) -> C {
        let blind = self.blinds_or_straddles[self.effective_index(player_index)].abs();
        min_c(
            blind,
            self.starting_stacks[player_index] - self.get_effective_ante(player_index),
        )
    }

    /// The layered pots over collected contributions. With ante trimming
    /// off, posted antes are dead money in the main pot.
    pub fn pots(&self) -> Vec<Pot<C>> {
        let n = self.player_count;
        let mut contributions: Vec<C> = (0..n)
            .map(|i| C::zero() - self.payoffs[i] - self.bets[i])
            .collect();

        let mut dead_money = C::zero();
        if !self.ante_trimming_status {
            for i in 0..n {
                contributions[i] -= self.posted_antes[i];
                dead_money += self.posted_antes[i];
            }
        }

        let mut levels: Vec<C> = contributions
            .iter()
            .copied()
            .filter(|c| *c > C::zero())
            .collect();
        levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        levels.dedup_by(|a, b| a == b);

        let mut raw_pots: Vec<(C, Vec<usize>)> = Vec::new();
        let mut last_level = C::zero();
        for level in levels {
            let mut amount = C::zero();
            let mut player_indices = Vec::new();
            for i in 0..n {
                if contributions[i] >= level {
                    amount += level - last_level;
                    if self.statuses[i] {
                        player_indices.push(i);
                    }
                }
            }
            last_level = level;
            if amount <= C::zero() {
                continue;
            }
            match raw_pots.last_mut() {
                Some((prev_amount, prev_indices)) if *prev_indices == player_indices => {
                    *prev_amount += amount;
                }
                _ => raw_pots.push((amount, player_indices)),
            }
        }

        if dead_money > C::zero() {
            if let Some((amount, _)) = raw_pots.first_mut() {
                *amount += dead_money;
            } else {
                raw_pots.push((dead_money, self.active_indices().collect()));
            }
        }

        raw_pots
            .into_iter()
            .map(|(amount, player_indices)| {
                let (raked_amount, unraked_amount) = (self.rake)(self, amount);
                Pot {
                    raked_amount,
                    unraked_amount,
                    player_indices,
                }
            })
            .collect()
    }

    fn push_warning(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(Warning { message });
    }

    /// Cards obtainable for dealing: the live deck plus everything a
    /// replenishment would recover.
    fn available_card_count(&self) -> usize {
        let stale_discards: usize = self
            .street_index
            .map(|s| self.discarded_cards[..s].iter().map(Vec::len).sum())
            .unwrap_or(0);
        self.deck_cards.len() + self.mucked_cards.len() + self.burn_cards.len() + stale_discards
    }

    /// Replenishes the deck from the muck, burns, and previous-street
    /// discards when fewer than `needed` cards remain.
    fn ensure_deck(&mut self, needed: usize) {
        if self.deck_cards.len() >= needed {
            return;
        }
        let mut returned: Vec<Card> = Vec::new();
        returned.append(&mut self.mucked_cards);
        returned.append(&mut self.burn_cards);
        if let Some(street_index) = self.street_index {
            for pile in &mut self.discarded_cards[..street_index] {
                returned.append(pile);
            }
        }
        if returned.is_empty() {
            return;
        }
        self.deck_cards.replenish(returned);
        self.push_warning("the deck was replenished from the muck, burns, and discards".to_string());
    }

    /// Draws or extracts the requested cards. Named cards missing from the
    /// deck are tolerated with a warning (replay mode).
    fn take_cards(&mut self, cards: Option<Vec<Card>>, count: usize) -> Vec<Card> {
        match cards {
            Some(cards) => {
                let mut taken = Vec::with_capacity(cards.len());
                for card in cards {
                    if card.is_known() {
                        self.ensure_deck(1);
                        if !self.deck_cards.remove(card) {
                            self.push_warning(format!("the card {card} was not in the deck"));
                        }
                        taken.push(card);
                    } else {
                        self.ensure_deck(1);
                        if let Ok(mut drawn) = self.deck_cards.draw(1) {
                            drawn.pop();
                        }
                        taken.push(Card::UNKNOWN);
                    }
                }
                taken
            }
            None => {
                self.ensure_deck(count);
                let available = count.min(self.deck_cards.len());
                if available < count {
                    self.push_warning(format!(
                        "only {available} of {count} requested cards could be dealt"
                    ));
                }
                self.deck_cards.draw(available).unwrap_or_default()
            }
        }
    }

    // ------------------------------------------------------------------
    // Phase transitions

    fn begin(&mut self) {
        log::debug!("beginning a hand with {} players", self.player_count);
        self.begin_ante_posting();
    }

    fn begin_ante_posting(&mut self) {
        for i in 0..self.player_count {
            self.ante_posting_statuses[i] = self.get_effective_ante(i) > C::zero();
        }
        if self.automations.contains(&Automation::AntePosting) {
            let indices: Vec<usize> = self.ante_poster_indices().collect();
            for i in indices {
                self.apply_ante_posting(i, None);
            }
        }
        self.update_ante_posting();
    }

    fn update_ante_posting(&mut self) {
        if !self.ante_posting_statuses.iter().any(|&s| s) {
            self.end_ante_posting();
        }
    }

    fn end_ante_posting(&mut self) {
        self.begin_bet_collection();
    }

    fn begin_bet_collection(&mut self) {
        self.bet_collection_status = self.bets.iter().any(|b| *b > C::zero());
        if self.bet_collection_status && self.automations.contains(&Automation::BetCollection) {
            self.apply_bet_collection(None);
        }
        self.update_bet_collection();
    }

    fn update_bet_collection(&mut self) {
        if !self.bet_collection_status {
            self.end_bet_collection();
        }
    }

    fn end_bet_collection(&mut self) {
        if self.active_indices().count() <= 1 {
            self.begin_chips_pushing();
        } else if self.street_index.is_none() {
            self.begin_blind_or_straddle_posting();
        } else {
            if self.all_in_status() {
                if self.mode == Mode::Tournament {
                    self.table_hole_cards();
                } else if !self.runout_count_selection_status
                    && self.street_index < Some(self.streets.len() - 1)
                {
                    self.begin_runout_count_selection();
                    return;
                }
            }
            if self.street_index == Some(self.streets.len() - 1) {
                if self.street_return_count > 0 {
                    self.begin_runout_replay();
                } else {
                    self.begin_showdown();
                }
            } else {
                self.begin_dealing();
            }
        }
    }

    fn begin_blind_or_straddle_posting(&mut self) {
        for i in 0..self.player_count {
            self.blind_or_straddle_posting_statuses[i] =
                self.get_effective_blind_or_straddle(i) > C::zero();
        }
        if self.automations.contains(&Automation::BlindOrStraddlePosting) {
            let indices: Vec<usize> = self.blind_or_straddle_poster_indices().collect();
            for i in indices {
                self.apply_blind_or_straddle_posting(i, None);
            }
        }
        self.update_blind_or_straddle_posting();
    }

    fn update_blind_or_straddle_posting(&mut self) {
        if !self.blind_or_straddle_posting_statuses.iter().any(|&s| s) {
            self.end_blind_or_straddle_posting();
        }
    }

    fn end_blind_or_straddle_posting(&mut self) {
        self.begin_dealing();
    }

    fn begin_dealing(&mut self) {
        let new_street_index = self.street_index.map_or(0, |i| i + 1);
        self.street_index = Some(new_street_index);
        let street = self.streets[new_street_index].clone();
        log::debug!("dealing street {new_street_index}");

        self.card_burning_status = street.card_burning_status;
        if !self.runout_replay_status {
            for i in 0..self.player_count {
                if self.statuses[i] {
                    self.hole_dealing_statuses[i]
                        .extend(street.hole_dealing_statuses.iter().copied());
                    self.standing_pat_or_discarding_statuses[i] = street.draw_status;
                }
            }
        }
        self.board_dealing_counts =
            vec![street.board_dealing_count; self.starting_board_count];
        self.update_dealing();
    }

    fn update_dealing(&mut self) {
        if self.automations.contains(&Automation::CardBurning) && self.card_burning_status {
            self.apply_card_burning(None, None);
        }
        let standing_done = !self
            .standing_pat_or_discarding_statuses
            .iter()
            .any(|&s| s);
        if !self.card_burning_status && standing_done {
            if self.automations.contains(&Automation::HoleDealing) {
                while let Some(i) = self.hole_dealee_index() {
                    let count = self.hole_dealing_statuses[i].len();
                    self.apply_hole_dealing(i, None, count, None);
                }
            }
            if self.automations.contains(&Automation::BoardDealing) {
                while self.board_dealing_counts.iter().any(|&c| c > 0)
                    && self.hole_dealee_index().is_none()
                {
                    self.apply_board_dealing(None, None);
                }
            }
        }

        let done = !self.card_burning_status
            && self.hole_dealing_statuses.iter().all(|q| q.is_empty())
            && self.board_dealing_counts.iter().all(|&c| c == 0)
            && !self.standing_pat_or_discarding_statuses.iter().any(|&s| s);
        if done {
            self.end_dealing();
        }
    }

    fn end_dealing(&mut self) {
        self.begin_betting();
    }

    fn begin_betting(&mut self) {
        let street = self.streets[self.street_index.unwrap()].clone();
        self.acted_player_indices.clear();
        self.bring_in_status = false;
        self.completion_status = false;
        self.completion_betting_or_raising_count = 0;
        self.consecutive_short_all_in_count = 0;
        self.consecutive_short_all_in_amount = C::zero();

        // The opening full-raise increment: the street minimum, bumped by
        // the largest blind or straddle pre-flop.
        let mut increment = street.min_completion_betting_or_raising_amount;
        if self.street_index == Some(0) {
            for i in 0..self.player_count {
                increment = max_c(increment, self.blinds_or_straddles[i].abs());
            }
        }
        self.completion_betting_or_raising_amount = increment;

        let opener_index = self.compute_opener_index(&street);
        self.opener_index = Some(opener_index);

        if self.bring_in > C::zero() && self.street_index == Some(0) {
            self.bring_in_status = true;
        }

        self.actor_indices = (0..self.player_count)
            .cycle()
            .skip(opener_index)
            .take(self.player_count)
            .filter(|&i| self.statuses[i] && self.stacks[i] > C::zero())
            .collect();

        self.update_betting();
    }

    fn update_betting(&mut self) {
        let active: Vec<usize> = self.active_indices().collect();
        if active.len() <= 1 || self.actor_indices.is_empty() {
            self.end_betting();
            return;
        }
        let with_chips = active
            .iter()
            .filter(|&&i| self.stacks[i] > C::zero())
            .count();
        let max_bet = self.max_bet();
        let settled = active
            .iter()
            .all(|&i| self.bets[i] == max_bet || self.stacks[i].is_zero());
        if with_chips <= 1 && settled && !self.bring_in_status {
            self.end_betting();
        }
    }

    fn end_betting(&mut self) {
        self.actor_indices.clear();
        self.bring_in_status = false;
        self.begin_bet_collection();
    }

    fn next_active_from(&self, start: usize) -> usize {
        (0..self.player_count)
            .map(|k| (start + k) % self.player_count)
            .find(|&i| self.statuses[i])
            .unwrap_or(0)
    }

    fn compute_opener_index(&self, street: &Street<C>) -> usize {
        match street.opening {
            Opening::Position => {
                if self.street_index == Some(0) {
                    let last_blind = (0..self.player_count)
                        .rev()
                        .find(|&i| self.blinds_or_straddles[i] > C::zero());
                    match last_blind {
                        Some(_) if self.player_count == 2 => 1,
                        Some(i) => self.next_active_from((i + 1) % self.player_count),
                        None => self.next_active_from(0),
                    }
                } else {
                    self.next_active_from(0)
                }
            }
            Opening::LowCard => self.opening_card_index(false),
            Opening::HighCard => self.opening_card_index(true),
            Opening::LowHand => self.opening_hand_index(false),
            Opening::HighHand => self.opening_hand_index(true),
        }
    }

    /// The opener by the last exposed hole card, with the conventional
    /// clubs-lowest suit tiebreak.
    fn opening_card_index(&self, high: bool) -> usize {
        let order = self.hand_types[0].rank_order();
        let mut best: Option<((usize, Suit), usize)> = None;
        for i in self.active_indices() {
            let card = self.hole_cards[i]
                .iter()
                .zip(&self.hole_card_statuses[i])
                .filter(|(_, &shown)| shown)
                .map(|(&c, _)| c)
                .last();
            let Some(card) = card else { continue };
            let rank_position = order.iter().position(|&r| r == card.rank).unwrap_or(0);
            let key = (rank_position, card.suit);
            let better = match &best {
                None => true,
                Some((best_key, _)) => {
                    if high {
                        key > *best_key
                    } else {
                        key < *best_key
                    }
                }
            };
            if better {
                best = Some((key, i));
            }
        }
        best.map(|(_, i)| i)
            .unwrap_or_else(|| self.next_active_from(0))
    }

    /// The opener by the strongest (or weakest) exposed partial hand,
    /// compared by rank multiplicities. Ties go to the earliest seat.
    fn opening_hand_index(&self, high: bool) -> usize {
        let order = self.hand_types[0].rank_order();
        let mut best: Option<(Vec<(usize, usize)>, usize)> = None;
        for i in self.active_indices() {
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for (card, &shown) in self.hole_cards[i].iter().zip(&self.hole_card_statuses[i]) {
                if shown {
                    let position = order.iter().position(|&r| r == card.rank).unwrap_or(0);
                    *counts.entry(position).or_insert(0) += 1;
                }
            }
            if counts.is_empty() {
                continue;
            }
            let mut key: Vec<(usize, usize)> = counts
                .into_iter()
                .map(|(position, count)| (count, position))
                .collect();
            key.sort_unstable_by(|a, b| b.cmp(a));
            let better = match &best {
                None => true,
                Some((best_key, _)) => {
                    if high {
                        key > *best_key
                    } else {
                        key < *best_key
                    }
                }
            };
            if better {
                best = Some((key, i));
            }
        }
        best.map(|(_, i)| i)
            .unwrap_or_else(|| self.next_active_from(0))
    }

    fn begin_runout_count_selection(&mut self) {
        for i in 0..self.player_count {
            self.runout_count_selector_statuses[i] = self.statuses[i];
        }
        self.runout_count_selections = vec![None; self.player_count];
        if self.automations.contains(&Automation::RunoutCountSelection) {
            while let Some(i) = self.runout_count_selector_index() {
                self.apply_runout_count_selection(i, None, None);
            }
        }
        self.update_runout_count_selection();
    }

    fn update_runout_count_selection(&mut self) {
        if !self.runout_count_selector_statuses.iter().any(|&s| s) {
            self.end_runout_count_selection();
        }
    }

    fn end_runout_count_selection(&mut self) {
        self.runout_count_selection_status = true;
        let mut nominated: Vec<usize> = self
            .runout_count_selections
            .iter()
            .flatten()
            .copied()
            .collect();
        nominated.sort_unstable();
        nominated.dedup();
        // Unanimity among nominations; anything else runs out once.
        let resolved = match nominated.as_slice() {
            [count] => *count,
            _ => 1,
        };
        log::debug!("runout count resolved to {resolved}");
        self.runout_count = Some(resolved);
        if resolved > 1 {
            self.street_return_index = Some(self.street_index.unwrap() + 1);
            self.street_return_count = resolved - 1;
        }
        self.begin_dealing();
    }

    fn begin_runout_replay(&mut self) {
        self.street_return_count -= 1;
        self.runout_replay_status = true;
        self.street_index = Some(self.street_return_index.unwrap() - 1);
        self.begin_dealing();
    }

    /// Turns every active player's hole cards face up (tournament all-ins).
    fn table_hole_cards(&mut self) {
        for i in 0..self.player_count {
            if self.statuses[i] {
                for status in &mut self.hole_card_statuses[i] {
                    *status = true;
                }
            }
        }
    }

    fn begin_showdown(&mut self) {
        let start = self.opener_index.unwrap_or(0);
        self.showdown_indices = (0..self.player_count)
            .cycle()
            .skip(start)
            .take(self.player_count)
            .filter(|&i| {
                self.statuses[i] && self.hole_card_statuses[i].iter().any(|&shown| !shown)
            })
            .collect();
        if self
            .automations
            .contains(&Automation::HoleCardsShowingOrMucking)
        {
            while let Some(i) = self.showdown_index() {
                let decision = if self.can_win_showdown(i) {
                    ShowOrMuck::Show
                } else {
                    ShowOrMuck::Muck
                };
                self.apply_hole_cards_showing_or_mucking(i, decision, None);
            }
        }
        self.update_showdown();
    }

    fn update_showdown(&mut self) {
        if self.showdown_indices.is_empty() {
            self.end_showdown();
        }
    }

    fn end_showdown(&mut self) {
        self.begin_hand_killing();
    }

    /// Whether the player's hand is unbeaten by those already revealed, for
    /// at least one pot portion.
    fn can_win_showdown(&self, player_index: usize) -> bool {
        self.can_win(player_index, |q| {
            !self.hole_card_statuses[q].iter().any(|&shown| !shown)
        })
    }

    /// Whether the player can win any portion against every live hand.
    fn can_win_pot(&self, player_index: usize) -> bool {
        self.can_win(player_index, |_| true)
    }

    fn can_win(&self, player_index: usize, contender: impl Fn(usize) -> bool) -> bool {
        let pots = self.pots();
        for pot in &pots {
            if !pot.player_indices.contains(&player_index) {
                continue;
            }
            for board_index in 0..self.board_count() {
                let board = self.get_board_cards(board_index);
                for hand_type in &self.hand_types {
                    let Some(strength) =
                        hand_type.evaluate(&self.hole_cards[player_index], &board)
                    else {
                        continue;
                    };
                    let beaten = pot.player_indices.iter().any(|&q| {
                        q != player_index
                            && self.statuses[q]
                            && contender(q)
                            && hand_type
                                .evaluate(&self.hole_cards[q], &board)
                                .map_or(false, |other| other > strength)
                    });
                    if !beaten {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn begin_hand_killing(&mut self) {
        let active_count = self.active_indices().count();
        for i in 0..self.player_count {
            self.hand_killing_statuses[i] =
                active_count > 1 && self.statuses[i] && !self.can_win_pot(i);
        }
        if self.automations.contains(&Automation::HandKilling) {
            while let Some(i) = self.hand_killing_index() {
                if self.active_indices().count() <= 1 {
                    break;
                }
                self.apply_hand_killing(i, None);
            }
        }
        self.update_hand_killing();
    }

    fn update_hand_killing(&mut self) {
        if self.active_indices().count() <= 1 {
            self.hand_killing_statuses.iter_mut().for_each(|s| *s = false);
        }
        if !self.hand_killing_statuses.iter().any(|&s| s) {
            self.end_hand_killing();
        }
    }

    fn end_hand_killing(&mut self) {
        self.begin_chips_pushing();
    }

    fn begin_chips_pushing(&mut self) {
        let pots = self.pots();
        self.raked_total = sum_chips(pots.iter().map(|p| p.raked_amount));
        self.pot_snapshots = pots;
        self.chips_pushing_queue.clear();

        let active_count = self.active_indices().count();
        for pot_index in 0..self.pot_snapshots.len() {
            if active_count <= 1 {
                self.chips_pushing_queue.push_back((pot_index, None, None));
            } else {
                for board_index in 0..self.board_count() {
                    for hand_type_index in 0..self.hand_types.len() {
                        self.chips_pushing_queue.push_back((
                            pot_index,
                            Some(board_index),
                            Some(hand_type_index),
                        ));
                    }
                }
            }
        }
        if self.automations.contains(&Automation::ChipsPushing) {
            while !self.chips_pushing_queue.is_empty() {
                self.apply_chips_pushing(None);
            }
        }
        self.update_chips_pushing();
    }

    fn update_chips_pushing(&mut self) {
        if self.chips_pushing_queue.is_empty() {
            self.end_chips_pushing();
        }
    }

    fn end_chips_pushing(&mut self) {
        self.begin_chips_pulling();
    }

    fn begin_chips_pulling(&mut self) {
        for i in 0..self.player_count {
            self.chips_pulling_statuses[i] = self.bets[i] > C::zero();
        }
        if self.automations.contains(&Automation::ChipsPulling) {
            while let Some(i) = self.chips_pulling_index() {
                self.apply_chips_pulling(i, None);
            }
        }
        self.update_chips_pulling();
    }

    fn update_chips_pulling(&mut self) {
        if !self.chips_pulling_statuses.iter().any(|&s| s) {
            self.end_chips_pulling();
        }
    }

    fn end_chips_pulling(&mut self) {
        self.status = false;
        log::debug!("hand complete; payoffs: {:?}", self.payoffs);
    }

    // ------------------------------------------------------------------
    // Ante posting

    pub fn verify_ante_posting(&self, player_index: Option<usize>) -> Result<usize, Error> {
        let player_index = player_index
            .or_else(|| self.ante_poster_indices().next())
            .ok_or_else(|| Error::IllegalPhase("no player can post an ante".to_string()))?;
        if player_index >= self.player_count {
            return Err(Error::InvalidArgument(format!(
                "player index {player_index} is out of range"
            )));
        }
        if !self.ante_posting_statuses[player_index] {
            return Err(Error::IllegalPhase(format!(
                "player {player_index} cannot post an ante"
            )));
        }
        Ok(player_index)
    }

    pub fn can_post_ante(&self, player_index: Option<usize>) -> bool {
        self.verify_ante_posting(player_index).is_ok()
    }

    pub fn post_ante(
        &mut self,
        player_index: Option<usize>,
        commentary: Option<String>,
    ) -> Result<AntePosting<C>, Error> {
        let player_index = self.verify_ante_posting(player_index)?;
        let operation = self.apply_ante_posting(player_index, commentary);
        self.update_ante_posting();
        Ok(operation)
    }

    fn apply_ante_posting(
        &mut self,
        player_index: usize,
        commentary: Option<String>,
    ) -> AntePosting<C> {
        let amount = self.get_effective_ante(player_index);
        self.ante_posting_statuses[player_index] = false;
        self.bets[player_index] += amount;
        self.stacks[player_index] -= amount;
        self.payoffs[player_index] -= amount;
        self.posted_antes[player_index] = amount;
        let operation = AntePosting {
            player_index,
            amount,
            commentary,
        };
        self.operations
            .push(Operation::AntePosting(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Bet collection

    pub fn verify_bet_collection(&self) -> Result<(), Error> {
        if !self.bet_collection_status {
            return Err(Error::IllegalPhase("there are no bets to collect".to_string()));
        }
        Ok(())
    }

    pub fn can_collect_bets(&self) -> bool {
        self.verify_bet_collection().is_ok()
    }

    pub fn collect_bets(&mut self, commentary: Option<String>) -> Result<BetCollection<C>, Error> {
        self.verify_bet_collection()?;
        let operation = self.apply_bet_collection(commentary);
        self.update_bet_collection();
        Ok(operation)
    }

    fn apply_bet_collection(&mut self, commentary: Option<String>) -> BetCollection<C> {
        self.bet_collection_status = false;

        // After street betting, a lone largest bet was not fully called:
        // the excess over the second-largest bet returns to its owner.
        if self.street_index.is_some() {
            let max_bet = self.max_bet();
            if max_bet > C::zero() {
                let top: Vec<usize> = (0..self.player_count)
                    .filter(|&i| self.bets[i] == max_bet)
                    .collect();
                if let [leader] = top.as_slice() {
                    let second = (0..self.player_count)
                        .filter(|&i| i != *leader)
                        .map(|i| self.bets[i])
                        .fold(C::zero(), max_c);
                    let refund = max_bet - second;
                    if refund > C::zero() {
                        self.bets[*leader] = second;
                        self.stacks[*leader] += refund;
                        self.payoffs[*leader] += refund;
                    }
                }
            }
        }

        let bets = self.bets.clone();
        for bet in &mut self.bets {
            *bet = C::zero();
        }
        let operation = BetCollection { bets, commentary };
        self.operations
            .push(Operation::BetCollection(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Blind or straddle posting

    pub fn verify_blind_or_straddle_posting(
        &self,
        player_index: Option<usize>,
    ) -> Result<usize, Error> {
        let player_index = player_index
            .or_else(|| self.blind_or_straddle_poster_indices().next())
            .ok_or_else(|| {
                Error::IllegalPhase("no player can post a blind or straddle".to_string())
            })?;
        if player_index >= self.player_count {
            return Err(Error::InvalidArgument(format!(
                "player index {player_index} is out of range"
            )));
        }
        if !self.blind_or_straddle_posting_statuses[player_index] {
            return Err(Error::IllegalPhase(format!(
                "player {player_index} cannot post a blind or straddle"
            )));
        }
        Ok(player_index)
    }

    pub fn can_post_blind_or_straddle(&self, player_index: Option<usize>) -> bool {
        self.verify_blind_or_straddle_posting(player_index).is_ok()
    }

    pub fn post_blind_or_straddle(
        &mut self,
        player_index: Option<usize>,
        commentary: Option<String>,
    ) -> Result<BlindOrStraddlePosting<C>, Error> {
        let player_index = self.verify_blind_or_straddle_posting(player_index)?;
        let operation = self.apply_blind_or_straddle_posting(player_index, commentary);
        self.update_blind_or_straddle_posting();
        Ok(operation)
    }

    fn apply_blind_or_straddle_posting(
        &mut self,
        player_index: usize,
        commentary: Option<String>,
    ) -> BlindOrStraddlePosting<C> {
        let amount = self.get_effective_blind_or_straddle(player_index);
        self.blind_or_straddle_posting_statuses[player_index] = false;
        self.bets[player_index] += amount;
        self.stacks[player_index] -= amount;
        self.payoffs[player_index] -= amount;
        let operation = BlindOrStraddlePosting {
            player_index,
            amount,
            commentary,
        };
        self.operations
            .push(Operation::BlindOrStraddlePosting(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Card burning

    pub fn verify_card_burning(&self, card: Option<Card>) -> Result<(), Error> {
        if !self.card_burning_status {
            return Err(Error::IllegalPhase("no card may be burned now".to_string()));
        }
        if self.available_card_count() == 0 {
            return Err(Error::DeckExhausted(
                "no cards remain to burn".to_string(),
            ));
        }
        if let Some(card) = card {
            if card.is_known() && self.strict_status && !self.deck_cards.contains(card) {
                return Err(Error::InvalidArgument(format!(
                    "the burn card {card} is not in the deck"
                )));
            }
        }
        Ok(())
    }

    pub fn can_burn_card(&self, card: Option<Card>) -> bool {
        self.verify_card_burning(card).is_ok()
    }

    pub fn burn_card(
        &mut self,
        card: Option<Card>,
        commentary: Option<String>,
    ) -> Result<CardBurning, Error> {
        self.verify_card_burning(card)?;
        let operation = self.apply_card_burning(card, commentary);
        self.update_dealing();
        Ok(operation)
    }

    fn apply_card_burning(&mut self, card: Option<Card>, commentary: Option<String>) -> CardBurning {
        let burned = match card {
            Some(card) if card.is_known() => {
                self.ensure_deck(1);
                if !self.deck_cards.remove(card) {
                    self.push_warning(format!("the burn card {card} was not in the deck"));
                }
                card
            }
            _ => {
                self.ensure_deck(1);
                match self.deck_cards.draw(1) {
                    Ok(mut drawn) => drawn.pop().unwrap_or(Card::UNKNOWN),
                    Err(_) => {
                        self.push_warning("no card was available to burn".to_string());
                        Card::UNKNOWN
                    }
                }
            }
        };
        self.card_burning_status = false;
        self.burn_cards.push(burned);
        let operation = CardBurning {
            card: burned,
            commentary,
        };
        self.operations
            .push(Operation::CardBurning(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Hole dealing

    pub fn verify_hole_dealing(
        &self,
        cards: Option<&[Card]>,
        player_index: Option<usize>,
    ) -> Result<(usize, usize), Error> {
        if self.card_burning_status {
            return Err(Error::IllegalPhase(
                "the card must be burned before dealing".to_string(),
            ));
        }
        if self.standing_pat_or_discarding_statuses.iter().any(|&s| s) {
            return Err(Error::IllegalPhase(
                "all stand-pat or discard decisions must precede dealing".to_string(),
            ));
        }
        let player_index = player_index
            .or_else(|| self.hole_dealee_index())
            .ok_or_else(|| Error::IllegalPhase("no player can be dealt hole cards".to_string()))?;
        if player_index >= self.player_count {
            return Err(Error::InvalidArgument(format!(
                "player index {player_index} is out of range"
            )));
        }
        let pending = self.hole_dealing_statuses[player_index].len();
        if pending == 0 {
            return Err(Error::InvalidArgument(format!(
                "player {player_index} is not owed hole cards"
            )));
        }
        let count = cards.map_or(pending, <[Card]>::len);
        if count == 0 {
            return Err(Error::InvalidArgument(
                "at least one hole card must be dealt".to_string(),
            ));
        }
        if count > pending {
            return Err(Error::InvalidArgument(format!(
                "player {player_index} is owed only {pending} hole cards"
            )));
        }
        if self.available_card_count() < count {
            return Err(Error::DeckExhausted(format!(
                "{count} cards cannot be dealt even after replenishment"
            )));
        }
        if self.strict_status {
            if let Some(cards) = cards {
                for card in cards.iter().filter(|c| c.is_known()) {
                    if !self.deck_cards.contains(*card) {
                        return Err(Error::InvalidArgument(format!(
                            "the card {card} is not in the deck"
                        )));
                    }
                }
            }
        }
        Ok((player_index, count))
    }

    pub fn can_deal_hole(&self, cards: Option<&[Card]>, player_index: Option<usize>) -> bool {
        self.verify_hole_dealing(cards, player_index).is_ok()
    }

    pub fn deal_hole(
        &mut self,
        cards: Option<Vec<Card>>,
        player_index: Option<usize>,
        commentary: Option<String>,
    ) -> Result<HoleDealing, Error> {
        let (player_index, count) =
            self.verify_hole_dealing(cards.as_deref(), player_index)?;
        let operation = self.apply_hole_dealing(player_index, cards, count, commentary);
        self.update_dealing();
        Ok(operation)
    }

    fn apply_hole_dealing(
        &mut self,
        player_index: usize,
        cards: Option<Vec<Card>>,
        count: usize,
        commentary: Option<String>,
    ) -> HoleDealing {
        let dealt = self.take_cards(cards, count);
        let mut statuses = Vec::with_capacity(dealt.len());
        for card in &dealt {
            let status = self.hole_dealing_statuses[player_index]
                .pop_front()
                .unwrap_or(false);
            self.hole_cards[player_index].push(*card);
            self.hole_card_statuses[player_index].push(status);
            statuses.push(status);
        }
        if dealt.len() < count {
            // Exhaustion despite replenishment: forgive the shortfall so the
            // phase can complete. A warning was already recorded.
            self.hole_dealing_statuses[player_index].clear();
        }
        let operation = HoleDealing {
            player_index,
            cards: dealt,
            statuses,
            commentary,
        };
        self.operations
            .push(Operation::HoleDealing(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Board dealing

    fn board_slots_before(&self, street_index: usize) -> usize {
        self.streets[..street_index]
            .iter()
            .map(|s| s.board_dealing_count)
            .sum()
    }

    pub fn verify_board_dealing(&self, cards: Option<&[Card]>) -> Result<usize, Error> {
        if self.card_burning_status {
            return Err(Error::IllegalPhase(
                "the card must be burned before dealing".to_string(),
            ));
        }
        if self.standing_pat_or_discarding_statuses.iter().any(|&s| s) {
            return Err(Error::IllegalPhase(
                "all stand-pat or discard decisions must precede dealing".to_string(),
            ));
        }
        if self.hole_dealee_index().is_some() {
            return Err(Error::IllegalPhase(
                "hole cards must be dealt before the board".to_string(),
            ));
        }
        let count = self
            .board_dealing_counts
            .iter()
            .copied()
            .find(|&c| c > 0)
            .ok_or_else(|| Error::IllegalPhase("no board cards may be dealt now".to_string()))?;
        if let Some(cards) = cards {
            if cards.len() != count {
                return Err(Error::InvalidArgument(format!(
                    "exactly {count} board cards must be dealt, got {}",
                    cards.len()
                )));
            }
            if self.strict_status {
                for card in cards.iter().filter(|c| c.is_known()) {
                    if !self.deck_cards.contains(*card) {
                        return Err(Error::InvalidArgument(format!(
                            "the card {card} is not in the deck"
                        )));
                    }
                }
            }
        }
        if self.available_card_count() < count {
            return Err(Error::DeckExhausted(format!(
                "{count} cards cannot be dealt even after replenishment"
            )));
        }
        Ok(count)
    }

    pub fn can_deal_board(&self, cards: Option<&[Card]>) -> bool {
        self.verify_board_dealing(cards).is_ok()
    }

    pub fn deal_board(
        &mut self,
        cards: Option<Vec<Card>>,
        commentary: Option<String>,
    ) -> Result<BoardDealing, Error> {
        self.verify_board_dealing(cards.as_deref())?;
        let operation = self.apply_board_dealing(cards, commentary);
        self.update_dealing();
        Ok(operation)
    }

    fn apply_board_dealing(
        &mut self,
        cards: Option<Vec<Card>>,
        commentary: Option<String>,
    ) -> BoardDealing {
        let board_position = self
            .board_dealing_counts
            .iter()
            .position(|&c| c > 0)
            .unwrap_or(0);
        let count = self.board_dealing_counts[board_position];
        let dealt = self.take_cards(cards, count);

        let street_index = self.street_index.unwrap_or(0);
        let base = self.board_slots_before(street_index);
        for (offset, card) in dealt.iter().enumerate() {
            let slot = base + offset;
            while self.board_cards.len() <= slot {
                self.board_cards.push(Vec::new());
            }
            self.board_cards[slot].push(*card);
        }
        self.board_dealing_counts[board_position] = 0;

        let operation = BoardDealing {
            cards: dealt,
            commentary,
        };
        self.operations
            .push(Operation::BoardDealing(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Standing pat or discarding

    pub fn verify_standing_pat_or_discarding(
        &self,
        cards: Option<&[Card]>,
    ) -> Result<(usize, Vec<Card>), Error> {
        if self.card_burning_status {
            return Err(Error::IllegalPhase(
                "the card must be burned before drawing".to_string(),
            ));
        }
        let player_index = self.stander_pat_or_discarder_index().ok_or_else(|| {
            Error::IllegalPhase("no player can stand pat or discard".to_string())
        })?;
        let discards = cards.map(<[Card]>::to_vec).unwrap_or_default();
        let mut remaining = self.hole_cards[player_index].clone();
        for card in &discards {
            match remaining.iter().position(|c| c == card) {
                Some(position) => {
                    remaining.remove(position);
                }
                None => {
                    return Err(Error::InvalidArgument(format!(
                        "player {player_index} does not hold {card}"
                    )));
                }
            }
        }
        Ok((player_index, discards))
    }

    pub fn can_stand_pat_or_discard(&self, cards: Option<&[Card]>) -> bool {
        self.verify_standing_pat_or_discarding(cards).is_ok()
    }

    pub fn stand_pat_or_discard(
        &mut self,
        cards: Option<Vec<Card>>,
        commentary: Option<String>,
    ) -> Result<StandingPatOrDiscarding, Error> {
        let (player_index, discards) =
            self.verify_standing_pat_or_discarding(cards.as_deref())?;
        let operation =
            self.apply_standing_pat_or_discarding(player_index, discards, commentary);
        self.update_dealing();
        Ok(operation)
    }

    fn apply_standing_pat_or_discarding(
        &mut self,
        player_index: usize,
        discards: Vec<Card>,
        commentary: Option<String>,
    ) -> StandingPatOrDiscarding {
        self.standing_pat_or_discarding_statuses[player_index] = false;
        let street_index = self.street_index.unwrap_or(0);
        for card in &discards {
            if let Some(position) = self.hole_cards[player_index].iter().position(|c| c == card)
            {
                self.hole_cards[player_index].remove(position);
                self.hole_card_statuses[player_index].remove(position);
                self.discarded_cards[street_index].push(*card);
            }
        }
        // Replacements arrive face down during this street's hole dealing.
        for _ in 0..discards.len() {
            self.hole_dealing_statuses[player_index].push_back(false);
        }
        let operation = StandingPatOrDiscarding {
            player_index,
            cards: discards,
            commentary,
        };
        self.operations
            .push(Operation::StandingPatOrDiscarding(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Folding

    pub fn verify_folding(&self) -> Result<usize, Error> {
        let actor = self
            .actor_index()
            .ok_or_else(|| Error::IllegalPhase("no player is in turn to act".to_string()))?;
        if self.bring_in_status && Some(actor) == self.opener_index {
            return Err(Error::InvalidArgument(
                "the bring-in must be posted or completed first".to_string(),
            ));
        }
        Ok(actor)
    }

    pub fn can_fold(&self) -> bool {
        self.verify_folding().is_ok()
    }

    pub fn fold(&mut self, commentary: Option<String>) -> Result<Folding, Error> {
        let actor = self.verify_folding()?;
        let operation = self.apply_folding(actor, commentary);
        self.update_betting();
        Ok(operation)
    }

    fn muck_player(&mut self, player_index: usize) {
        self.statuses[player_index] = false;
        self.mucked_cards.append(&mut self.hole_cards[player_index]);
        self.hole_card_statuses[player_index].clear();
    }

    fn apply_folding(&mut self, actor: usize, commentary: Option<String>) -> Folding {
        self.actor_indices.pop_front();
        self.acted_player_indices.insert(actor);
        self.muck_player(actor);
        let operation = Folding {
            player_index: actor,
            commentary,
        };
        self.operations.push(Operation::Folding(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Checking or calling

    pub fn verify_checking_or_calling(&self) -> Result<(usize, C), Error> {
        let actor = self
            .actor_index()
            .ok_or_else(|| Error::IllegalPhase("no player is in turn to act".to_string()))?;
        if self.bring_in_status && Some(actor) == self.opener_index {
            return Err(Error::InvalidArgument(
                "the bring-in must be posted or completed first".to_string(),
            ));
        }
        let amount = min_c(self.max_bet() - self.bets[actor], self.stacks[actor]);
        Ok((actor, amount))
    }

    pub fn can_check_or_call(&self) -> bool {
        self.verify_checking_or_calling().is_ok()
    }

    pub fn check_or_call(
        &mut self,
        commentary: Option<String>,
    ) -> Result<CheckingOrCalling<C>, Error> {
        let (actor, amount) = self.verify_checking_or_calling()?;
        let operation = self.apply_checking_or_calling(actor, amount, commentary);
        self.update_betting();
        Ok(operation)
    }

    fn apply_checking_or_calling(
        &mut self,
        actor: usize,
        amount: C,
        commentary: Option<String>,
    ) -> CheckingOrCalling<C> {
        self.actor_indices.pop_front();
        self.acted_player_indices.insert(actor);
        self.bets[actor] += amount;
        self.stacks[actor] -= amount;
        self.payoffs[actor] -= amount;
        let operation = CheckingOrCalling {
            player_index: actor,
            amount,
            commentary,
        };
        self.operations
            .push(Operation::CheckingOrCalling(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Bring-in posting

    pub fn verify_bring_in_posting(&self) -> Result<(usize, C), Error> {
        let actor = self
            .actor_index()
            .ok_or_else(|| Error::IllegalPhase("no player is in turn to act".to_string()))?;
        if !self.bring_in_status || Some(actor) != self.opener_index {
            return Err(Error::IllegalPhase(
                "the bring-in is not owed by the player in turn".to_string(),
            ));
        }
        let amount = min_c(self.bring_in, self.stacks[actor]);
        Ok((actor, amount))
    }

    pub fn can_post_bring_in(&self) -> bool {
        self.verify_bring_in_posting().is_ok()
    }

    pub fn post_bring_in(
        &mut self,
        commentary: Option<String>,
    ) -> Result<BringInPosting<C>, Error> {
        let (actor, amount) = self.verify_bring_in_posting()?;
        let operation = self.apply_bring_in_posting(actor, amount, commentary);
        self.update_betting();
        Ok(operation)
    }

    fn apply_bring_in_posting(
        &mut self,
        actor: usize,
        amount: C,
        commentary: Option<String>,
    ) -> BringInPosting<C> {
        self.actor_indices.pop_front();
        self.acted_player_indices.insert(actor);
        self.bring_in_status = false;
        self.bets[actor] += amount;
        self.stacks[actor] -= amount;
        self.payoffs[actor] -= amount;
        let operation = BringInPosting {
            player_index: actor,
            amount,
            commentary,
        };
        self.operations
            .push(Operation::BringInPosting(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Completion, betting, or raising to an amount

    fn is_bring_in_street(&self) -> bool {
        self.bring_in > C::zero() && self.street_index == Some(0)
    }

    /// The smallest legal completion/bet/raise-to amount for the player in
    /// turn, the all-in shortfall aside.
    pub fn min_completion_betting_or_raising_to_amount(&self) -> Option<C> {
        let street = &self.streets[self.street_index?];
        if self.is_bring_in_street() && !self.completion_status {
            Some(street.min_completion_betting_or_raising_amount)
        } else {
            Some(self.max_bet() + self.completion_betting_or_raising_amount)
        }
    }

    /// The largest legal completion/bet/raise-to amount for the player in
    /// turn.
    pub fn max_completion_betting_or_raising_to_amount(&self) -> Option<C> {
        let actor = self.actor_index()?;
        let all_in = self.stacks[actor] + self.bets[actor];
        let max_bet = self.max_bet();
        Some(match self.betting_structure {
            BettingStructure::FixedLimit => {
                min_c(self.min_completion_betting_or_raising_to_amount()?, all_in)
            }
            BettingStructure::PotLimit => {
                let pot_cap = self.total_pot_amount() + max_bet + max_bet - self.bets[actor];
                min_c(pot_cap, all_in)
            }
            BettingStructure::NoLimit => all_in,
        })
    }

    pub fn verify_completion_betting_or_raising_to(
        &self,
        amount: Option<C>,
    ) -> Result<(usize, C), Error> {
        let actor = self
            .actor_index()
            .ok_or_else(|| Error::IllegalPhase("no player is in turn to act".to_string()))?;
        let street = &self.streets[self.street_index.unwrap_or(0)];
        if let Some(max_count) = street.max_completion_betting_or_raising_count {
            if self.completion_betting_or_raising_count >= max_count {
                return Err(Error::InvalidArgument(
                    "no more completions, bets, or raises are permitted".to_string(),
                ));
            }
        }
        if self.acted_player_indices.contains(&actor) {
            return Err(Error::InvalidArgument(
                "betting was not reopened for the player in turn".to_string(),
            ));
        }
        let responder_exists = (0..self.player_count)
            .any(|i| i != actor && self.statuses[i] && self.stacks[i] > C::zero());
        if !responder_exists {
            return Err(Error::InvalidArgument(
                "no other player can respond to a wager".to_string(),
            ));
        }

        let max_bet = self.max_bet();
        let all_in = self.stacks[actor] + self.bets[actor];
        let min_to = self
            .min_completion_betting_or_raising_to_amount()
            .unwrap_or(C::zero());
        let max_to = self
            .max_completion_betting_or_raising_to_amount()
            .unwrap_or(C::zero());
        let amount = amount.unwrap_or_else(|| min_c(min_to, max_to));

        if amount <= max_bet {
            return Err(Error::InvalidArgument(format!(
                "the amount {amount} does not exceed the outstanding bet {max_bet}"
            )));
        }
        if amount > max_to {
            return Err(Error::InvalidArgument(format!(
                "the amount {amount} exceeds the maximum {max_to}"
            )));
        }
        if amount < min_to && amount != all_in {
            return Err(Error::InvalidArgument(format!(
                "the amount {amount} is below the minimum {min_to} and is not all-in"
            )));
        }
        Ok((actor, amount))
    }

    pub fn can_complete_bet_or_raise_to(&self, amount: Option<C>) -> bool {
        self.verify_completion_betting_or_raising_to(amount).is_ok()
    }

    pub fn complete_bet_or_raise_to(
        &mut self,
        amount: Option<C>,
        commentary: Option<String>,
    ) -> Result<CompletionBettingOrRaisingTo<C>, Error> {
        let (actor, amount) = self.verify_completion_betting_or_raising_to(amount)?;
        let operation = self.apply_completion_betting_or_raising_to(actor, amount, commentary);
        self.update_betting();
        Ok(operation)
    }

    fn apply_completion_betting_or_raising_to(
        &mut self,
        actor: usize,
        amount: C,
        commentary: Option<String>,
    ) -> CompletionBettingOrRaisingTo<C> {
        let max_bet = self.max_bet();
        let raise_delta = amount - max_bet;
        let bring_in_completion = self.is_bring_in_street() && !self.completion_status;
        let delta = amount - self.bets[actor];
        self.bets[actor] = amount;
        self.stacks[actor] -= delta;
        self.payoffs[actor] -= delta;
        self.opener_index = Some(actor);
        self.completion_status = true;
        self.bring_in_status = false;
        self.completion_betting_or_raising_count += 1;

        let full_increment = self.completion_betting_or_raising_amount;
        if raise_delta >= full_increment || bring_in_completion {
            // A full raise (or the completion of the bring-in) reopens the
            // action for everyone.
            if !bring_in_completion {
                self.completion_betting_or_raising_amount =
                    max_c(full_increment, raise_delta);
            }
            self.acted_player_indices.clear();
            self.consecutive_short_all_in_count = 0;
            self.consecutive_short_all_in_amount = C::zero();
        } else {
            // A short all-in raise leaves prior actors closed, unless the
            // consecutive shortfalls add up to a full raise (WSOP Rule 96).
            self.consecutive_short_all_in_count += 1;
            self.consecutive_short_all_in_amount += raise_delta;
            if self.consecutive_short_all_in_count >= 2
                && self.consecutive_short_all_in_amount >= full_increment
            {
                self.acted_player_indices.clear();
                self.consecutive_short_all_in_count = 0;
                self.consecutive_short_all_in_amount = C::zero();
            }
        }
        self.acted_player_indices.insert(actor);

        self.actor_indices = (0..self.player_count)
            .cycle()
            .skip(actor + 1)
            .take(self.player_count)
            .filter(|&i| i != actor && self.statuses[i] && self.stacks[i] > C::zero())
            .collect();

        let operation = CompletionBettingOrRaisingTo {
            player_index: actor,
            amount,
            commentary,
        };
        self.operations
            .push(Operation::CompletionBettingOrRaisingTo(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Runout count selection

    pub fn verify_runout_count_selection(
        &self,
        player_index: Option<usize>,
        runout_count: Option<usize>,
    ) -> Result<usize, Error> {
        let player_index = player_index
            .or_else(|| self.runout_count_selector_index())
            .ok_or_else(|| {
                Error::IllegalPhase("no player can select a runout count".to_string())
            })?;
        if player_index >= self.player_count
            || !self.runout_count_selector_statuses[player_index]
        {
            return Err(Error::IllegalPhase(format!(
                "player {player_index} cannot select a runout count"
            )));
        }
        if runout_count == Some(0) {
            return Err(Error::InvalidArgument(
                "the runout count must be at least 1".to_string(),
            ));
        }
        Ok(player_index)
    }

    pub fn can_select_runout_count(
        &self,
        player_index: Option<usize>,
        runout_count: Option<usize>,
    ) -> bool {
        self.verify_runout_count_selection(player_index, runout_count)
            .is_ok()
    }

    pub fn select_runout_count(
        &mut self,
        player_index: Option<usize>,
        runout_count: Option<usize>,
        commentary: Option<String>,
    ) -> Result<RunoutCountSelection, Error> {
        let player_index = self.verify_runout_count_selection(player_index, runout_count)?;
        let operation = self.apply_runout_count_selection(player_index, runout_count, commentary);
        self.update_runout_count_selection();
        Ok(operation)
    }

    fn apply_runout_count_selection(
        &mut self,
        player_index: usize,
        runout_count: Option<usize>,
        commentary: Option<String>,
    ) -> RunoutCountSelection {
        self.runout_count_selector_statuses[player_index] = false;
        self.runout_count_selections[player_index] = runout_count;
        let operation = RunoutCountSelection {
            player_index,
            runout_count,
            commentary,
        };
        self.operations
            .push(Operation::RunoutCountSelection(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Hole cards showing or mucking

    pub fn verify_hole_cards_showing_or_mucking(
        &self,
        decision: Option<&ShowOrMuck>,
    ) -> Result<usize, Error> {
        let player_index = self.showdown_index().ok_or_else(|| {
            Error::IllegalPhase("no player is in turn to show or muck".to_string())
        })?;
        if let Some(ShowOrMuck::Cards(cards)) = decision {
            if cards.iter().all(|c| !c.is_known()) && self.mode != Mode::CashGame {
                return Err(Error::InvalidArgument(
                    "keeping all hole cards face down is only allowed in cash games"
                        .to_string(),
                ));
            }
            if self.strict_status {
                for card in cards.iter().filter(|c| c.is_known()) {
                    let in_hole = self.hole_cards[player_index].contains(card);
                    let has_unknown = self.hole_cards[player_index]
                        .iter()
                        .any(|c| !c.is_known());
                    if !in_hole && !has_unknown {
                        return Err(Error::InvalidArgument(format!(
                            "player {player_index} does not hold {card}"
                        )));
                    }
                }
            }
        }
        if let Some(ShowOrMuck::Muck) = decision {
            if self.active_indices().count() <= 1 {
                return Err(Error::InvalidArgument(
                    "the last player in the hand cannot muck".to_string(),
                ));
            }
        }
        Ok(player_index)
    }

    pub fn can_show_or_muck_hole_cards(&self, decision: Option<&ShowOrMuck>) -> bool {
        self.verify_hole_cards_showing_or_mucking(decision).is_ok()
    }

    pub fn show_or_muck_hole_cards(
        &mut self,
        decision: Option<ShowOrMuck>,
        commentary: Option<String>,
    ) -> Result<HoleCardsShowingOrMucking, Error> {
        let player_index = self.verify_hole_cards_showing_or_mucking(decision.as_ref())?;
        let decision = decision.unwrap_or_else(|| {
            if self.can_win_showdown(player_index) {
                ShowOrMuck::Show
            } else {
                ShowOrMuck::Muck
            }
        });
        let operation =
            self.apply_hole_cards_showing_or_mucking(player_index, decision, commentary);
        self.update_showdown();
        Ok(operation)
    }

    fn apply_hole_cards_showing_or_mucking(
        &mut self,
        player_index: usize,
        decision: ShowOrMuck,
        commentary: Option<String>,
    ) -> HoleCardsShowingOrMucking {
        self.showdown_indices.pop_front();
        let mut shown_cards = Vec::new();
        match decision {
            ShowOrMuck::Show => {
                for status in &mut self.hole_card_statuses[player_index] {
                    *status = true;
                }
                shown_cards = self.hole_cards[player_index].clone();
            }
            ShowOrMuck::Muck => {
                self.muck_player(player_index);
            }
            ShowOrMuck::Cards(cards) => {
                for card in cards.into_iter().filter(|c| c.is_known()) {
                    if let Some(position) = self.hole_cards[player_index]
                        .iter()
                        .position(|c| *c == card)
                    {
                        self.hole_card_statuses[player_index][position] = true;
                        shown_cards.push(card);
                    } else if let Some(position) = self.hole_cards[player_index]
                        .iter()
                        .position(|c| !c.is_known())
                    {
                        // A reveal binds a previously unknown hole card.
                        self.hole_cards[player_index][position] = card;
                        self.hole_card_statuses[player_index][position] = true;
                        shown_cards.push(card);
                    } else {
                        self.push_warning(format!(
                            "player {player_index} showed {card} which they do not hold"
                        ));
                    }
                }
            }
        }
        let operation = HoleCardsShowingOrMucking {
            player_index,
            hole_cards: shown_cards,
            commentary,
        };
        self.operations
            .push(Operation::HoleCardsShowingOrMucking(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Hand killing

    pub fn verify_hand_killing(&self, player_index: Option<usize>) -> Result<usize, Error> {
        let player_index = player_index
            .or_else(|| self.hand_killing_index())
            .ok_or_else(|| Error::IllegalPhase("no hand may be killed".to_string()))?;
        if player_index >= self.player_count || !self.hand_killing_statuses[player_index] {
            return Err(Error::IllegalPhase(format!(
                "player {player_index}'s hand cannot be killed"
            )));
        }
        if self.active_indices().count() <= 1 {
            return Err(Error::IllegalPhase(
                "the last hand in play cannot be killed".to_string(),
            ));
        }
        Ok(player_index)
    }

    pub fn can_kill_hand(&self, player_index: Option<usize>) -> bool {
        self.verify_hand_killing(player_index).is_ok()
    }

    pub fn kill_hand(
        &mut self,
        player_index: Option<usize>,
        commentary: Option<String>,
    ) -> Result<HandKilling, Error> {
        let player_index = self.verify_hand_killing(player_index)?;
        let operation = self.apply_hand_killing(player_index, commentary);
        self.update_hand_killing();
        Ok(operation)
    }

    fn apply_hand_killing(
        &mut self,
        player_index: usize,
        commentary: Option<String>,
    ) -> HandKilling {
        self.hand_killing_statuses[player_index] = false;
        self.muck_player(player_index);
        let operation = HandKilling {
            player_index,
            commentary,
        };
        self.operations
            .push(Operation::HandKilling(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Chips pushing

    pub fn verify_chips_pushing(&self) -> Result<(), Error> {
        if self.chips_pushing_queue.is_empty() {
            return Err(Error::IllegalPhase("no chips may be pushed".to_string()));
        }
        Ok(())
    }

    pub fn can_push_chips(&self) -> bool {
        self.verify_chips_pushing().is_ok()
    }

    pub fn push_chips(&mut self, commentary: Option<String>) -> Result<ChipsPushing<C>, Error> {
        self.verify_chips_pushing()?;
        let operation = self.apply_chips_pushing(commentary);
        self.update_chips_pushing();
        Ok(operation)
    }

    fn apply_chips_pushing(&mut self, commentary: Option<String>) -> ChipsPushing<C> {
        let (pot_index, board_index, hand_type_index) = self
            .chips_pushing_queue
            .pop_front()
            .unwrap_or((0, None, None));
        let pot = self.pot_snapshots[pot_index].clone();
        let eligible: Vec<usize> = pot
            .player_indices
            .iter()
            .copied()
            .filter(|&i| self.statuses[i])
            .collect();
        let mut amounts = vec![C::zero(); self.player_count];

        match (board_index, hand_type_index) {
            (Some(board_index), Some(hand_type_index)) => {
                let board_count = self.board_count();
                let (board_share, board_odd) = (self.divmod)(pot.unraked_amount, board_count);
                let mut amount = board_share;
                if board_index == 0 {
                    amount += board_odd;
                }

                let board = self.get_board_cards(board_index);
                if self.hand_types.len() == 2 {
                    let qualifies: Vec<bool> = self
                        .hand_types
                        .iter()
                        .map(|hand_type| {
                            eligible.iter().any(|&p| {
                                hand_type.evaluate(&self.hole_cards[p], &board).is_some()
                            })
                        })
                        .collect();
                    if !qualifies[hand_type_index] {
                        amount = C::zero();
                    } else if qualifies[0] && qualifies[1] {
                        let (half, half_odd) = (self.divmod)(amount, 2);
                        amount = if hand_type_index == 0 {
                            half + half_odd
                        } else {
                            half
                        };
                    }
                }

                if amount > C::zero() {
                    let hand_type = self.hand_types[hand_type_index];
                    let mut best: Option<HandStrength> = None;
                    let mut winners: Vec<usize> = Vec::new();
                    for &p in &eligible {
                        if let Some(strength) =
                            hand_type.evaluate(&self.hole_cards[p], &board)
                        {
                            match best {
                                Some(current) if strength < current => {}
                                Some(current) if strength == current => winners.push(p),
                                _ => {
                                    best = Some(strength);
                                    winners = vec![p];
                                }
                            }
                        }
                    }
                    match winners.iter().min() {
                        Some(&most_out_of_position) => {
                            let (share, odd) = (self.divmod)(amount, winners.len());
                            for &winner in &winners {
                                amounts[winner] += share;
                            }
                            // The odd chip goes to the winner most out of
                            // position.
                            amounts[most_out_of_position] += odd;
                        }
                        None => {
                            // Every eligible hand was unrankable (hidden or
                            // unknown cards): fall back to the earliest seat
                            // still in the hand.
                            self.push_warning(format!(
                                "pot {pot_index} had no rankable hand on board {board_index}"
                            ));
                            if let Some(fallback) =
                                eligible.first().copied().or_else(|| self.active_indices().next())
                            {
                                amounts[fallback] += amount;
                            }
                        }
                    }
                }
            }
            _ => {
                // Uncontested: the whole pot goes to the lone eligible
                // player, or to the earliest survivor when every layer
                // contributor has left the hand.
                if let Some(winner) =
                    eligible.first().copied().or_else(|| self.active_indices().next())
                {
                    amounts[winner] = pot.unraked_amount;
                }
            }
        }

        for i in 0..self.player_count {
            if amounts[i] > C::zero() {
                self.bets[i] += amounts[i];
            }
        }

        let operation = ChipsPushing {
            amounts,
            pot_index,
            board_index,
            hand_type_index,
            commentary,
        };
        self.operations
            .push(Operation::ChipsPushing(operation.clone()));
        operation
    }

    // ------------------------------------------------------------------
    // Chips pulling

    pub fn verify_chips_pulling(&self, player_index: Option<usize>) -> Result<usize, Error> {
        let player_index = player_index
            .or_else(|| self.chips_pulling_index())
            .ok_or_else(|| Error::IllegalPhase("no chips may be pulled".to_string()))?;
        if player_index >= self.player_count || !self.chips_pulling_statuses[player_index] {
            return Err(Error::IllegalPhase(format!(
                "player {player_index} has no chips to pull"
            )));
        }
        Ok(player_index)
    }

    pub fn can_pull_chips(&self, player_index: Option<usize>) -> bool {
        self.verify_chips_pulling(player_index).is_ok()
    }

    pub fn pull_chips(
        &mut self,
        player_index: Option<usize>,
        commentary: Option<String>,
    ) -> Result<ChipsPulling<C>, Error> {
        let player_index = self.verify_chips_pulling(player_index)?;
        let operation = self.apply_chips_pulling(player_index, commentary);
        self.update_chips_pulling();
        Ok(operation)
    }

    fn apply_chips_pulling(
        &mut self,
        player_index: usize,
        commentary: Option<String>,
    ) -> ChipsPulling<C> {
        let amount = self.bets[player_index];
        self.chips_pulling_statuses[player_index] = false;
        self.bets[player_index] = C::zero();
        self.stacks[player_index] += amount;
        self.payoffs[player_index] += amount;
        let operation = ChipsPulling {
            player_index,
            amount,
            commentary,
        };
        self.operations
            .push(Operation::ChipsPulling(operation.clone()));
        operation
    }

    /// Records commentary without touching the state.
    pub fn no_operation(&mut self, commentary: Option<String>) -> NoOperation {
        let operation = NoOperation { commentary };
        self.operations
            .push(Operation::NoOperation(operation.clone()));
        operation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{
        fixed_limit_deuce_to_seven_lowball_triple_draw, fixed_limit_seven_card_stud,
        fixed_limit_texas_holdem, kuhn_poker, no_limit_texas_holdem, pot_limit_omaha_holdem,
    };
    use crate::utilities::uniform_values;
    use crate::utilities::Card;

    fn cards(s: &str) -> Vec<Card> {
        Card::parse_cards(s).unwrap()
    }

    fn chip_map(values: &[(isize, i64)]) -> BTreeMap<isize, i64> {
        values.iter().copied().collect()
    }

    fn full_automations() -> Vec<Automation> {
        vec![
            Automation::AntePosting,
            Automation::BetCollection,
            Automation::BlindOrStraddlePosting,
            Automation::CardBurning,
            Automation::HoleDealing,
            Automation::BoardDealing,
            Automation::RunoutCountSelection,
            Automation::HoleCardsShowingOrMucking,
            Automation::HandKilling,
            Automation::ChipsPushing,
            Automation::ChipsPulling,
        ]
    }

    fn nlhe_state(stacks: &[(isize, i64)], blinds: &[(isize, i64)], min_bet: i64) -> State<i64> {
        StateBuilder::new(no_limit_texas_holdem(min_bet).unwrap(), stacks.len())
            .automations(&full_automations())
            .raw_blinds_or_straddles(chip_map(blinds))
            .raw_starting_stacks(chip_map(stacks))
            .shuffle_source(StdRng::seed_from_u64(42))
            .build()
            .unwrap()
    }

    #[test]
    fn heads_up_roles_are_swapped() {
        let state = nlhe_state(&[(0, 200), (1, 200)], &[(0, 1), (1, 2)], 2);
        assert_eq!(state.get_effective_blind_or_straddle(0), 2);
        assert_eq!(state.get_effective_blind_or_straddle(1), 1);
        assert_eq!(state.actor_index(), Some(1));
        assert_eq!(state.phase(), Phase::Betting);
    }

    #[test]
    fn big_blind_keeps_the_option() {
        let mut state = nlhe_state(&[(0, 200), (1, 200)], &[(0, 1), (1, 2)], 2);
        state.check_or_call(None).unwrap();
        assert_eq!(state.actor_index(), Some(0));
        assert!(state.can_complete_bet_or_raise_to(None));
        state.check_or_call(None).unwrap();
        // The pre-flop round closed and the flop was dealt.
        assert_eq!(state.street_index, Some(1));
        assert_eq!(state.get_board_cards(0).len(), 3);
        assert_eq!(state.actor_index(), Some(0));
    }

    #[test]
    fn uncalled_bet_is_refunded() {
        let mut state = nlhe_state(&[(0, 200), (1, 200)], &[(0, 1), (1, 2)], 2);
        state.complete_bet_or_raise_to(Some(10), None).unwrap();
        state.fold(None).unwrap();
        assert!(!state.status);
        assert_eq!(state.stacks, vec![198, 202]);
        assert_eq!(state.payoffs, vec![-2, 2]);
    }

    #[test]
    fn fixed_limit_amounts_are_exact_and_capped() {
        let mut state = StateBuilder::new(fixed_limit_texas_holdem(2, 4).unwrap(), 2)
            .automations(&full_automations())
            .raw_blinds_or_straddles(chip_map(&[(0, 1), (1, 2)]))
            .raw_starting_stacks(chip_map(&[(0, 200), (1, 200)]))
            .shuffle_source(StdRng::seed_from_u64(7))
            .build()
            .unwrap();

        assert!(state.verify_completion_betting_or_raising_to(Some(5)).is_err());
        let op = state.complete_bet_or_raise_to(None, None).unwrap();
        assert_eq!(op.amount, 4);
        assert_eq!(state.complete_bet_or_raise_to(None, None).unwrap().amount, 6);
        assert_eq!(state.complete_bet_or_raise_to(None, None).unwrap().amount, 8);
        assert_eq!(state.complete_bet_or_raise_to(None, None).unwrap().amount, 10);
        // The cap of four completions per street has been reached.
        assert!(!state.can_complete_bet_or_raise_to(None));
        assert!(state.can_check_or_call());
    }

    #[test]
    fn pot_limit_raises_are_pot_capped() {
        let mut state = StateBuilder::new(pot_limit_omaha_holdem(1000).unwrap(), 2)
            .automations(&full_automations())
            .raw_blinds_or_straddles(chip_map(&[(0, 500), (1, 1000)]))
            .raw_starting_stacks(chip_map(&[(0, 1_000_000), (1, 1_000_000)]))
            .shuffle_source(StdRng::seed_from_u64(11))
            .build()
            .unwrap();

        assert_eq!(state.actor_index(), Some(1));
        assert_eq!(state.max_completion_betting_or_raising_to_amount(), Some(3000));
        assert!(state
            .verify_completion_betting_or_raising_to(Some(3001))
            .is_err());
        state.complete_bet_or_raise_to(Some(3000), None).unwrap();
        assert_eq!(state.max_completion_betting_or_raising_to_amount(), Some(9000));
    }

    #[test]
    fn short_all_in_raise_does_not_reopen_action() {
        let state = nlhe_state(
            &[(0, 100), (1, 16), (2, 100)],
            &[(0, 1), (1, 2)],
            2,
        );
        let mut state = state;
        // Button raises to 10 (a full raise; the increment becomes 8).
        state.complete_bet_or_raise_to(Some(10), None).unwrap();
        // Small blind calls.
        state.check_or_call(None).unwrap();
        // Big blind shoves 16: six over the bet, short of a full raise.
        state.complete_bet_or_raise_to(Some(16), None).unwrap();
        // Action returns to the button, who already acted: call or fold only.
        assert_eq!(state.actor_index(), Some(2));
        assert!(!state.can_complete_bet_or_raise_to(None));
        assert!(state.can_check_or_call());
        state.check_or_call(None).unwrap();
        assert_eq!(state.actor_index(), Some(0));
        assert!(!state.can_complete_bet_or_raise_to(None));
        state.check_or_call(None).unwrap();
        // The pre-flop round is over.
        assert_ne!(state.street_index, Some(0));
    }

    #[test]
    fn consecutive_short_all_ins_reopen_action() {
        let mut state = nlhe_state(
            &[(0, 14), (1, 19), (2, 100), (3, 100), (4, 100)],
            &[(0, 1), (1, 2)],
            2,
        );
        assert_eq!(state.actor_index(), Some(2));
        state.fold(None).unwrap();
        // A full raise to 10 sets the increment to 8.
        state.complete_bet_or_raise_to(Some(10), None).unwrap();
        state.check_or_call(None).unwrap(); // p4 calls
        // Two consecutive short shoves: 4 over, then 5 over. Together they
        // exceed the increment, which reopens the action.
        state.complete_bet_or_raise_to(Some(14), None).unwrap();
        assert_eq!(state.consecutive_short_all_in_count, 1);
        state.complete_bet_or_raise_to(Some(19), None).unwrap();
        assert_eq!(state.actor_index(), Some(3));
        assert!(state.can_complete_bet_or_raise_to(None));
        assert_eq!(state.min_completion_betting_or_raising_to_amount(), Some(27));
        state.complete_bet_or_raise_to(Some(27), None).unwrap();
        state.check_or_call(None).unwrap();
        assert_ne!(state.street_index, Some(0));
    }

    #[test]
    fn side_pots_partition_contributions() {
        let automations: Vec<Automation> = full_automations()
            .into_iter()
            .filter(|a| !matches!(a, Automation::ChipsPushing | Automation::HandKilling))
            .collect();
        let mut state = StateBuilder::new(no_limit_texas_holdem(2).unwrap(), 3)
            .automations(&automations)
            .raw_blinds_or_straddles(chip_map(&[(0, 1), (1, 2)]))
            .raw_starting_stacks(chip_map(&[(0, 50), (1, 100), (2, 200)]))
            .shuffle_source(StdRng::seed_from_u64(5))
            .build()
            .unwrap();

        state.complete_bet_or_raise_to(Some(200), None).unwrap();
        state.check_or_call(None).unwrap(); // 50 all-in
        state.check_or_call(None).unwrap(); // 100 all-in

        // The uncalled 100 went back to the button; the board then ran out
        // and the hand stalled before any hands were killed, so the pot
        // layers are still over all three contributors.
        let pots = state.pots();
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount(), 150);
        assert_eq!(pots[0].player_indices, vec![0, 1, 2]);
        assert_eq!(pots[1].amount(), 100);
        assert_eq!(pots[1].player_indices, vec![1, 2]);

        while state.can_kill_hand(None) {
            state.kill_hand(None, None).unwrap();
        }
        while state.can_push_chips() {
            state.push_chips(None).unwrap();
        }
        assert!(!state.status);
        assert_eq!(state.stacks.iter().sum::<i64>(), 350);
    }

    #[test]
    fn failed_operations_leave_the_state_untouched() {
        let mut state = nlhe_state(&[(0, 200), (1, 200)], &[(0, 1), (1, 2)], 2);
        let stacks = state.stacks.clone();
        let bets = state.bets.clone();
        let operation_count = state.operations.len();
        let phase = state.phase();

        assert!(state.complete_bet_or_raise_to(Some(1_000_000), None).is_err());
        assert!(state.complete_bet_or_raise_to(Some(3), None).is_err());
        assert!(state.post_ante(None, None).is_err());
        assert!(state.deal_board(None, None).is_err());
        assert!(state.select_runout_count(None, Some(2), None).is_err());

        assert_eq!(state.stacks, stacks);
        assert_eq!(state.bets, bets);
        assert_eq!(state.operations.len(), operation_count);
        assert_eq!(state.phase(), phase);
    }

    #[test]
    fn kuhn_poker_fold_gives_the_pot_to_the_bettor() {
        let mut state = StateBuilder::new(kuhn_poker().unwrap(), 2)
            .automations(&full_automations())
            .ante_trimming_status(true)
            .raw_antes(uniform_values(1i64, 2))
            .raw_starting_stacks(uniform_values(5, 2))
            .shuffle_source(StdRng::seed_from_u64(2))
            .build()
            .unwrap();

        assert_eq!(state.actor_index(), Some(0));
        let op = state.complete_bet_or_raise_to(None, None).unwrap();
        assert_eq!(op.amount, 1);
        // Only one completion is permitted in Kuhn poker.
        assert!(!state.can_complete_bet_or_raise_to(None));
        state.fold(None).unwrap();
        assert!(!state.status);
        assert_eq!(state.stacks, vec![6, 4]);
    }

    #[test]
    fn bring_in_is_owed_by_the_lowest_up_card() {
        let mut state = StateBuilder::new(fixed_limit_seven_card_stud(10i64, 20).unwrap(), 3)
            .automations(&[
                Automation::AntePosting,
                Automation::BetCollection,
                Automation::BlindOrStraddlePosting,
                Automation::HoleCardsShowingOrMucking,
                Automation::HandKilling,
                Automation::ChipsPushing,
                Automation::ChipsPulling,
            ])
            .ante_trimming_status(true)
            .raw_antes(uniform_values(1, 3))
            .bring_in(5)
            .raw_starting_stacks(uniform_values(500, 3))
            .shuffle_source(StdRng::seed_from_u64(9))
            .build()
            .unwrap();

        state
            .deal_hole(Some(cards("AcKs2c")), Some(0), None)
            .unwrap();
        state
            .deal_hole(Some(cards("QdQh3d")), Some(1), None)
            .unwrap();
        state
            .deal_hole(Some(cards("JsJcTd")), Some(2), None)
            .unwrap();

        // The deuce of clubs brings it in.
        assert_eq!(state.actor_index(), Some(0));
        assert!(state.can_post_bring_in());
        assert!(!state.can_check_or_call());
        assert!(!state.can_fold());
        let op = state.post_bring_in(None).unwrap();
        assert_eq!(op.amount, 5);

        // The next player may call the bring-in or complete to the small bet.
        assert_eq!(state.actor_index(), Some(1));
        assert_eq!(state.min_completion_betting_or_raising_to_amount(), Some(10));
        state.complete_bet_or_raise_to(None, None).unwrap();
        state.check_or_call(None).unwrap();
        state.check_or_call(None).unwrap();

        // Fourth street: the exposed pair opens.
        assert_eq!(state.street_index, Some(1));
        state.deal_hole(Some(cards("As")), Some(0), None).unwrap();
        state.deal_hole(Some(cards("3h")), Some(1), None).unwrap();
        state.deal_hole(Some(cards("2d")), Some(2), None).unwrap();
        assert_eq!(state.actor_index(), Some(1));
    }

    #[test]
    fn draw_streets_replace_discards() {
        let mut state = StateBuilder::new(
            fixed_limit_deuce_to_seven_lowball_triple_draw(10, 20).unwrap(),
            2,
        )
        .automations(&full_automations())
        .raw_blinds_or_straddles(chip_map(&[(0, 5), (1, 10)]))
        .raw_starting_stacks(uniform_values(500, 2))
        .shuffle_source(StdRng::seed_from_u64(13))
        .build()
        .unwrap();

        // Pre-draw betting: call and check.
        state.check_or_call(None).unwrap();
        state.check_or_call(None).unwrap();
        assert_eq!(state.street_index, Some(1));
        assert_eq!(state.phase(), Phase::Dealing);

        let discards: Vec<Card> = state.hole_cards[0][..2].to_vec();
        state.stand_pat_or_discard(Some(discards.clone()), None).unwrap();
        // Replacements wait until everyone has decided.
        assert_eq!(state.hole_cards[0].len(), 3);
        state.stand_pat_or_discard(Some(vec![]), None).unwrap();
        // The automated dealing replenished the discarder.
        assert_eq!(state.hole_cards[0].len(), 5);
        assert_eq!(state.discarded_cards[1], discards);
        assert_eq!(state.phase(), Phase::Betting);
    }

    #[test]
    fn runout_disagreement_resolves_to_one() {
        let automations: Vec<Automation> = full_automations()
            .into_iter()
            .filter(|a| *a != Automation::RunoutCountSelection)
            .collect();
        let mut state = StateBuilder::new(no_limit_texas_holdem(2).unwrap(), 2)
            .automations(&automations)
            .raw_blinds_or_straddles(chip_map(&[(0, 1), (1, 2)]))
            .raw_starting_stacks(uniform_values(100, 2))
            .mode(Mode::CashGame)
            .shuffle_source(StdRng::seed_from_u64(17))
            .build()
            .unwrap();

        state.complete_bet_or_raise_to(Some(100), None).unwrap();
        state.check_or_call(None).unwrap();
        assert_eq!(state.phase(), Phase::RunoutCountSelection);
        state.select_runout_count(Some(0), Some(2), None).unwrap();
        state.select_runout_count(Some(1), Some(3), None).unwrap();
        assert_eq!(state.runout_count, Some(1));
        assert_eq!(state.board_count(), 1);
        assert_eq!(state.runout_count_selections, vec![Some(2), Some(3)]);
        assert!(!state.status);
        assert_eq!(state.stacks.iter().sum::<i64>(), 200);
    }

    #[test]
    fn strict_mode_escalates_card_anomalies() {
        let automations: Vec<Automation> = full_automations()
            .into_iter()
            .filter(|a| *a != Automation::HoleDealing)
            .collect();
        let mut state = StateBuilder::new(no_limit_texas_holdem(2).unwrap(), 2)
            .automations(&automations)
            .raw_blinds_or_straddles(chip_map(&[(0, 1), (1, 2)]))
            .raw_starting_stacks(chip_map(&[(0, 200), (1, 200)]))
            .strict(true)
            .shuffle_source(StdRng::seed_from_u64(21))
            .build()
            .unwrap();

        state.deal_hole(Some(cards("AcAs")), Some(0), None).unwrap();
        // The ace of clubs has already been dealt.
        let result = state.deal_hole(Some(cards("AcKd")), Some(1), None);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(state.warnings.is_empty());

        // The tolerant default records a warning instead.
        state.strict_status = false;
        state.deal_hole(Some(cards("AcKd")), Some(1), None).unwrap();
        assert!(!state.warnings.is_empty());
    }

    #[test]
    fn rake_hook_skims_pushed_pots() {
        fn tenth(_state: &State<i64>, amount: i64) -> (i64, i64) {
            (amount / 10, amount - amount / 10)
        }
        let mut state = StateBuilder::new(no_limit_texas_holdem(20).unwrap(), 2)
            .automations(&full_automations())
            .raw_blinds_or_straddles(chip_map(&[(0, 10), (1, 20)]))
            .raw_starting_stacks(chip_map(&[(0, 200), (1, 200)]))
            .rake(tenth)
            .shuffle_source(StdRng::seed_from_u64(23))
            .build()
            .unwrap();

        state.complete_bet_or_raise_to(Some(40), None).unwrap();
        state.fold(None).unwrap();

        assert!(!state.status);
        assert_eq!(state.raked_total, 4);
        // The uncalled 20 went back, the 40-chip pot paid 36 after rake.
        assert_eq!(state.stacks, vec![180, 216]);
        assert_eq!(
            state.stacks.iter().sum::<i64>() + state.raked_total,
            400
        );
    }

    #[test]
    fn every_reachable_state_offers_a_phase() {
        let mut state = nlhe_state(
            &[(0, 50), (1, 60), (2, 70)],
            &[(0, 1), (1, 2)],
            2,
        );
        let mut guard = 0;
        while state.status {
            assert_ne!(state.phase(), Phase::Terminal);
            if state.can_check_or_call() {
                state.check_or_call(None).unwrap();
            }
            guard += 1;
            assert!(guard < 64, "the state machine failed to make progress");
        }
        assert_eq!(state.phase(), Phase::Terminal);
        assert_eq!(state.stacks.iter().sum::<i64>(), 180);
    }
}
