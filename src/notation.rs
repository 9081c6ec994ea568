//! The textual action notation bridge.
//!
//! A line has the shape `<actor> <verb>[ args][ # commentary]`, where the
//! actor is `d` (the dealer) or `p<N>` (1-indexed player) and the verbs are
//! `db`, `dh`, `sd`, `pb`, `f`, `cc`, `cbr <amount>`, and `sm`. The module
//! also carries [`HandRecord`], the minimal game-construction bundle used
//! by external serializers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use regex::Regex;

use crate::games::{
    fixed_limit_badugi, fixed_limit_deuce_to_seven_lowball_triple_draw,
    fixed_limit_omaha_holdem_split_eight_or_better, fixed_limit_razz,
    fixed_limit_royal_holdem, fixed_limit_seven_card_stud,
    fixed_limit_seven_card_stud_split_eight_or_better, fixed_limit_texas_holdem, kuhn_poker,
    no_limit_deuce_to_seven_lowball_single_draw, no_limit_greek_holdem,
    no_limit_short_deck_holdem, no_limit_texas_holdem, pot_limit_courchevel,
    pot_limit_omaha_holdem, pot_limit_omaha_holdem_split_eight_or_better,
    pot_limit_texas_holdem, Variant,
};
use crate::state::{Automation, Mode, Operation, ShowOrMuck, State, StateBuilder};
use crate::utilities::{cards_to_string, parse_value, Card, Chips, Error};

static ACTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(d|p\d+)\s+(db|dh|sd|pb|f|cc|cbr|sm)\s*([^#]*?)\s*(?:#\s*(.*\S)\s*)?$")
        .unwrap()
});

/// The payload of one notation line.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind<C: Chips> {
    DealBoard { cards: Vec<Card> },
    DealHole { player_index: usize, cards: Vec<Card> },
    StandPatOrDiscard { player_index: usize, cards: Vec<Card> },
    PostBringIn { player_index: usize },
    Fold { player_index: usize },
    CheckOrCall { player_index: usize },
    CompleteBetOrRaiseTo { player_index: usize, amount: C },
    ShowOrMuckHoleCards { player_index: usize, cards: Vec<Card> },
}

/// One notation line: an action plus optional commentary.
#[derive(Debug, Clone, PartialEq)]
pub struct Action<C: Chips> {
    pub kind: ActionKind<C>,
    pub commentary: Option<String>,
}

impl<C: Chips> Action<C> {
    pub fn new(kind: ActionKind<C>) -> Self {
        Self {
            kind,
            commentary: None,
        }
    }

    /// Parses a single notation line.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let captures = ACTION_PATTERN
            .captures(line)
            .ok_or_else(|| Error::Parse(format!("malformed action line: '{line}'")))?;
        let actor = captures.get(1).map_or("", |m| m.as_str());
        let verb = captures.get(2).map_or("", |m| m.as_str());
        let args = captures.get(3).map_or("", |m| m.as_str()).trim();
        let commentary = captures.get(4).map(|m| m.as_str().to_string());

        let player_index = |raw: &str| -> Result<usize, Error> {
            let index: usize = raw[1..]
                .parse()
                .map_err(|_| Error::Parse(format!("invalid player: '{raw}'")))?;
            if index == 0 {
                return Err(Error::Parse("players are 1-indexed".to_string()));
            }
            Ok(index - 1)
        };

        let kind = match verb {
            "db" | "dh" => {
                if actor != "d" {
                    return Err(Error::Parse(format!(
                        "only the dealer may '{verb}', got '{actor}'"
                    )));
                }
                if verb == "db" {
                    let cards = Card::parse_cards(args)?;
                    if cards.is_empty() {
                        return Err(Error::Parse("'db' requires cards".to_string()));
                    }
                    ActionKind::DealBoard { cards }
                } else {
                    let mut parts = args.splitn(2, char::is_whitespace);
                    let target = parts.next().unwrap_or("");
                    if !target.starts_with('p') {
                        return Err(Error::Parse(format!(
                            "'dh' requires a player, got '{args}'"
                        )));
                    }
                    let cards = Card::parse_cards(parts.next().unwrap_or(""))?;
                    if cards.is_empty() {
                        return Err(Error::Parse("'dh' requires cards".to_string()));
                    }
                    ActionKind::DealHole {
                        player_index: player_index(target)?,
                        cards,
                    }
                }
            }
            _ => {
                if !actor.starts_with('p') {
                    return Err(Error::Parse(format!(
                        "'{verb}' requires a player actor, got '{actor}'"
                    )));
                }
                let player_index = player_index(actor)?;
                match verb {
                    "sd" => ActionKind::StandPatOrDiscard {
                        player_index,
                        cards: Card::parse_cards(args)?,
                    },
                    "pb" | "f" | "cc" => {
                        if !args.is_empty() {
                            return Err(Error::Parse(format!(
                                "'{verb}' takes no arguments, got '{args}'"
                            )));
                        }
                        match verb {
                            "pb" => ActionKind::PostBringIn { player_index },
                            "f" => ActionKind::Fold { player_index },
                            _ => ActionKind::CheckOrCall { player_index },
                        }
                    }
                    "cbr" => ActionKind::CompleteBetOrRaiseTo {
                        player_index,
                        amount: parse_value(args)?,
                    },
                    "sm" => ActionKind::ShowOrMuckHoleCards {
                        player_index,
                        cards: Card::parse_cards(args)?,
                    },
                    _ => unreachable!("verb was matched by the pattern"),
                }
            }
        };
        Ok(Self { kind, commentary })
    }

    /// Drives a state with this action. A pending burn is resolved
    /// implicitly, as burns are never notated. The notated actor must match
    /// the player the state says is in turn.
    pub fn apply(&self, state: &mut State<C>) -> Result<(), Error> {
        fn check_turn(
            expected: Option<usize>,
            player_index: usize,
            role: &str,
        ) -> Result<(), Error> {
            if expected != Some(player_index) {
                return Err(Error::InvalidArgument(format!(
                    "p{} is not the {role} in turn",
                    player_index + 1
                )));
            }
            Ok(())
        }

        let commentary = self.commentary.clone();
        match &self.kind {
            ActionKind::DealBoard { cards } => {
                if state.card_burning_status {
                    state.burn_card(None, None)?;
                }
                state.deal_board(Some(cards.clone()), commentary)?;
            }
            ActionKind::DealHole {
                player_index,
                cards,
            } => {
                if state.card_burning_status {
                    state.burn_card(None, None)?;
                }
                state.deal_hole(Some(cards.clone()), Some(*player_index), commentary)?;
            }
            ActionKind::StandPatOrDiscard {
                player_index,
                cards,
            } => {
                check_turn(
                    state.stander_pat_or_discarder_index(),
                    *player_index,
                    "drawer",
                )?;
                state.stand_pat_or_discard(Some(cards.clone()), commentary)?;
            }
            ActionKind::PostBringIn { player_index } => {
                check_turn(state.actor_index(), *player_index, "actor")?;
                state.post_bring_in(commentary)?;
            }
            ActionKind::Fold { player_index } => {
                check_turn(state.actor_index(), *player_index, "actor")?;
                state.fold(commentary)?;
            }
            ActionKind::CheckOrCall { player_index } => {
                check_turn(state.actor_index(), *player_index, "actor")?;
                state.check_or_call(commentary)?;
            }
            ActionKind::CompleteBetOrRaiseTo {
                player_index,
                amount,
            } => {
                check_turn(state.actor_index(), *player_index, "actor")?;
                state.complete_bet_or_raise_to(Some(*amount), commentary)?;
            }
            ActionKind::ShowOrMuckHoleCards {
                player_index,
                cards,
            } => {
                check_turn(state.showdown_index(), *player_index, "shower")?;
                let decision = if cards.is_empty() {
                    ShowOrMuck::Show
                } else {
                    ShowOrMuck::Cards(cards.clone())
                };
                state.show_or_muck_hole_cards(Some(decision), commentary)?;
            }
        }
        Ok(())
    }
}

impl<C: Chips> fmt::Display for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ActionKind::DealBoard { cards } => {
                write!(f, "d db {}", cards_to_string(cards))?;
            }
            ActionKind::DealHole {
                player_index,
                cards,
            } => {
                write!(f, "d dh p{} {}", player_index + 1, cards_to_string(cards))?;
            }
            ActionKind::StandPatOrDiscard {
                player_index,
                cards,
            } => {
                write!(f, "p{} sd", player_index + 1)?;
                if !cards.is_empty() {
                    write!(f, " {}", cards_to_string(cards))?;
                }
            }
            ActionKind::PostBringIn { player_index } => {
                write!(f, "p{} pb", player_index + 1)?;
            }
            ActionKind::Fold { player_index } => {
                write!(f, "p{} f", player_index + 1)?;
            }
            ActionKind::CheckOrCall { player_index } => {
                write!(f, "p{} cc", player_index + 1)?;
            }
            ActionKind::CompleteBetOrRaiseTo {
                player_index,
                amount,
            } => {
                write!(f, "p{} cbr {}", player_index + 1, amount)?;
            }
            ActionKind::ShowOrMuckHoleCards {
                player_index,
                cards,
            } => {
                write!(f, "p{} sm", player_index + 1)?;
                if !cards.is_empty() {
                    write!(f, " {}", cards_to_string(cards))?;
                }
            }
        }
        if let Some(commentary) = &self.commentary {
            write!(f, " # {commentary}")?;
        }
        Ok(())
    }
}

/// Projects an operations log onto its notated actions. Postings,
/// collections, burns, runout bookkeeping, and pot movements have no
/// notation; voluntary mucks are expressed by omission.
pub fn actions_from_operations<C: Chips>(operations: &[Operation<C>]) -> Vec<Action<C>> {
    operations
        .iter()
        .filter_map(|operation| {
            let (kind, commentary) = match operation {
                Operation::HoleDealing(op) => (
                    ActionKind::DealHole {
                        player_index: op.player_index,
                        cards: op.cards.clone(),
                    },
                    op.commentary.clone(),
                ),
                Operation::BoardDealing(op) => (
                    ActionKind::DealBoard {
                        cards: op.cards.clone(),
                    },
                    op.commentary.clone(),
                ),
                Operation::StandingPatOrDiscarding(op) => (
                    ActionKind::StandPatOrDiscard {
                        player_index: op.player_index,
                        cards: op.cards.clone(),
                    },
                    op.commentary.clone(),
                ),
                Operation::BringInPosting(op) => (
                    ActionKind::PostBringIn {
                        player_index: op.player_index,
                    },
                    op.commentary.clone(),
                ),
                Operation::Folding(op) => (
                    ActionKind::Fold {
                        player_index: op.player_index,
                    },
                    op.commentary.clone(),
                ),
                Operation::CheckingOrCalling(op) => (
                    ActionKind::CheckOrCall {
                        player_index: op.player_index,
                    },
                    op.commentary.clone(),
                ),
                Operation::CompletionBettingOrRaisingTo(op) => (
                    ActionKind::CompleteBetOrRaiseTo {
                        player_index: op.player_index,
                        amount: op.amount,
                    },
                    op.commentary.clone(),
                ),
                Operation::HoleCardsShowingOrMucking(op) => {
                    if op.hole_cards.is_empty() {
                        return None;
                    }
                    (
                        ActionKind::ShowOrMuckHoleCards {
                            player_index: op.player_index,
                            cards: op.hole_cards.clone(),
                        },
                        op.commentary.clone(),
                    )
                }
                _ => return None,
            };
            Some(Action { kind, commentary })
        })
        .collect()
}

/// The automations a transcript replay wants: everything the notation
/// cannot express.
pub fn replay_automations() -> Vec<Automation> {
    vec![
        Automation::AntePosting,
        Automation::BetCollection,
        Automation::BlindOrStraddlePosting,
        Automation::CardBurning,
        Automation::RunoutCountSelection,
        Automation::HandKilling,
        Automation::ChipsPushing,
        Automation::ChipsPulling,
    ]
}

/// The minimal game-construction bundle for external serializers: variant
/// code, forced-bet configuration, stacks, actions, and optional metadata.
#[derive(Debug, Clone)]
pub struct HandRecord<C: Chips> {
    pub variant_code: String,
    pub antes: BTreeMap<isize, C>,
    pub blinds_or_straddles: BTreeMap<isize, C>,
    pub bring_in: Option<C>,
    pub small_bet: Option<C>,
    pub big_bet: Option<C>,
    pub min_bet: Option<C>,
    pub starting_stacks: Vec<C>,
    pub actions: Vec<Action<C>>,
    pub ante_trimming_status: bool,
    pub mode: Mode,

    // Optional human-facing metadata.
    pub author: Option<String>,
    pub event: Option<String>,
    pub venue: Option<String>,
    pub currency: Option<String>,
    pub time_zone: Option<String>,
    pub time: Option<NaiveTime>,
    pub level: Option<u32>,
    pub seats: Option<Vec<usize>>,
    pub players: Option<Vec<String>>,
    pub finishing_stacks: Option<Vec<C>>,
}

impl<C: Chips> HandRecord<C> {
    pub fn new(variant_code: &str, starting_stacks: Vec<C>) -> Self {
        Self {
            variant_code: variant_code.to_string(),
            antes: BTreeMap::new(),
            blinds_or_straddles: BTreeMap::new(),
            bring_in: None,
            small_bet: None,
            big_bet: None,
            min_bet: None,
            starting_stacks,
            actions: Vec::new(),
            ante_trimming_status: false,
            mode: Mode::Tournament,
            author: None,
            event: None,
            venue: None,
            currency: None,
            time_zone: None,
            time: None,
            level: None,
            seats: None,
            players: None,
            finishing_stacks: None,
        }
    }

    pub fn parse_actions(&mut self, lines: &[&str]) -> Result<(), Error> {
        for line in lines {
            self.actions.push(Action::parse(line)?);
        }
        Ok(())
    }

    fn small_and_big(&self) -> Result<(C, C), Error> {
        match (self.small_bet, self.big_bet) {
            (Some(small), Some(big)) => Ok((small, big)),
            _ => Err(Error::Parse(format!(
                "variant '{}' requires a small and a big bet",
                self.variant_code
            ))),
        }
    }

    fn min(&self) -> Result<C, Error> {
        self.min_bet.ok_or_else(|| {
            Error::Parse(format!(
                "variant '{}' requires a minimum bet",
                self.variant_code
            ))
        })
    }

    /// Resolves the variant code into a game description.
    pub fn variant(&self) -> Result<Variant<C>, Error> {
        match self.variant_code.as_str() {
            "FT" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_texas_holdem(small, big)
            }
            "NT" => no_limit_texas_holdem(self.min()?),
            "PT" => pot_limit_texas_holdem(self.min()?),
            "NS" => no_limit_short_deck_holdem(self.min()?),
            "PO" => pot_limit_omaha_holdem(self.min()?),
            "PO/8" => pot_limit_omaha_holdem_split_eight_or_better(self.min()?),
            "FO/8" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_omaha_holdem_split_eight_or_better(small, big)
            }
            "NG" => no_limit_greek_holdem(self.min()?),
            "F7S" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_seven_card_stud(small, big)
            }
            "F7S/8" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_seven_card_stud_split_eight_or_better(small, big)
            }
            "FR" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_razz(small, big)
            }
            "N2L1D" => no_limit_deuce_to_seven_lowball_single_draw(self.min()?),
            "F2L3D" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_deuce_to_seven_lowball_triple_draw(small, big)
            }
            "FB" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_badugi(small, big)
            }
            "KP" => kuhn_poker(),
            "PC" => pot_limit_courchevel(self.min()?),
            "FRH" => {
                let (small, big) = self.small_and_big()?;
                fixed_limit_royal_holdem(small, big)
            }
            other => Err(Error::Parse(format!("unknown variant code '{other}'"))),
        }
    }

    /// Builds a state and replays the recorded actions through it.
    pub fn into_state(
        &self,
        automations: &[Automation],
        shuffle_source: StdRng,
    ) -> Result<State<C>, Error> {
        let variant = self.variant()?;
        let mut builder = StateBuilder::new(variant, self.starting_stacks.len())
            .automations(automations)
            .ante_trimming_status(self.ante_trimming_status)
            .raw_antes(self.antes.clone())
            .raw_blinds_or_straddles(self.blinds_or_straddles.clone())
            .raw_starting_stacks(
                self.starting_stacks
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| (i as isize, s))
                    .collect(),
            )
            .mode(self.mode)
            .shuffle_source(shuffle_source);
        if let Some(bring_in) = self.bring_in {
            builder = builder.bring_in(bring_in);
        }
        let mut state = builder.build()?;
        for action in &self.actions {
            action.apply(&mut state)?;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn round_trip(line: &str) {
        let action: Action<i64> = Action::parse(line).unwrap();
        assert_eq!(action.to_string(), line);
        assert_eq!(Action::parse(&action.to_string()).unwrap(), action);
    }

    #[test]
    fn lines_round_trip() {
        round_trip("d db AhKsQd");
        round_trip("d dh p1 AcAs");
        round_trip("d dh p2 ????");
        round_trip("p1 sd");
        round_trip("p2 sd 2cQh");
        round_trip("p3 pb");
        round_trip("p1 f");
        round_trip("p2 cc");
        round_trip("p3 cbr 100");
        round_trip("p1 sm");
        round_trip("p1 sm AcKs");
        round_trip("p2 cbr 250 # snap raise");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(Action::<i64>::parse("x cc").is_err());
        assert!(Action::<i64>::parse("p0 cc").is_err());
        assert!(Action::<i64>::parse("p1 zz").is_err());
        assert!(Action::<i64>::parse("p1 cbr ten").is_err());
        assert!(Action::<i64>::parse("d cc").is_err());
        assert!(Action::<i64>::parse("p1 db AcAs").is_err());
        assert!(Action::<i64>::parse("d dh AcAs").is_err());
        assert!(Action::<i64>::parse("p1 cc now").is_err());
    }

    #[test]
    fn commentary_is_preserved() {
        let action: Action<i64> = Action::parse("p1 cc # thinks for a while").unwrap();
        assert_eq!(action.commentary.as_deref(), Some("thinks for a while"));
        assert_eq!(action.kind, ActionKind::CheckOrCall { player_index: 0 });
    }

    #[test]
    fn record_replay_reaches_the_expected_terminal_stacks() {
        let mut record: HandRecord<i64> = HandRecord::new("NT", vec![200, 200]);
        record.blinds_or_straddles.insert(0, 1);
        record.blinds_or_straddles.insert(1, 2);
        record.min_bet = Some(2);
        record
            .parse_actions(&[
                "d dh p1 AcAs",
                "d dh p2 7h6h",
                "p2 cbr 6",
                "p1 f",
            ])
            .unwrap();
        let state = record
            .into_state(&replay_automations(), StdRng::seed_from_u64(3))
            .unwrap();
        assert!(!state.status);
        // Heads up, seat 1 is the small blind and opens; seat 0 posted the
        // big blind and folded it away.
        assert_eq!(state.stacks, vec![198, 202]);
    }

    #[test]
    fn operations_project_back_to_actions() {
        let mut record: HandRecord<i64> = HandRecord::new("NT", vec![200, 200]);
        record.blinds_or_straddles.insert(0, 1);
        record.blinds_or_straddles.insert(1, 2);
        record.min_bet = Some(2);
        let lines = ["d dh p1 AcAs", "d dh p2 7h6h", "p2 cbr 6", "p1 f"];
        record.parse_actions(&lines).unwrap();
        let state = record
            .into_state(&replay_automations(), StdRng::seed_from_u64(3))
            .unwrap();
        let actions = actions_from_operations(&state.operations);
        let rendered: Vec<String> = actions.iter().map(Action::to_string).collect();
        assert_eq!(rendered, lines);
    }

    #[test]
    fn unknown_variant_codes_error() {
        let record: HandRecord<i64> = HandRecord::new("XYZ", vec![100, 100]);
        assert!(record.variant().is_err());
        let record: HandRecord<i64> = HandRecord::new("NT", vec![100, 100]);
        assert!(record.variant().is_err()); // missing min bet
    }
}
