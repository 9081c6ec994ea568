//! Boundary scenarios replayed through the state machine: famous televised
//! hands with published stack outcomes, plus a multi-runout cash-game hand.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cardroom::games::{
    fixed_limit_deuce_to_seven_lowball_triple_draw, fixed_limit_texas_holdem,
    no_limit_short_deck_holdem, no_limit_texas_holdem, pot_limit_omaha_holdem,
};
use cardroom::notation::replay_automations;
use cardroom::state::{Automation, Mode, Operation, ShowOrMuck, State, StateBuilder};
use cardroom::utilities::{uniform_values, Card, Chips};

fn cards(s: &str) -> Vec<Card> {
    Card::parse_cards(s).unwrap()
}

fn chip_map<C: Chips>(values: &[(isize, C)]) -> BTreeMap<isize, C> {
    values.iter().copied().collect()
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(0xDEA1)
}

/// S1: heads-up fixed-limit hold'em, complete, raise, fold.
#[test]
fn heads_up_fixed_limit_raise_and_fold() {
    let mut state = StateBuilder::new(fixed_limit_texas_holdem(2i64, 4).unwrap(), 2)
        .automations(&replay_automations())
        .raw_blinds_or_straddles(chip_map(&[(0, 1), (1, 2)]))
        .raw_starting_stacks(uniform_values(200, 2))
        .shuffle_source(rng())
        .build()
        .unwrap();

    state.deal_hole(Some(cards("AcAs")), Some(0), None).unwrap();
    state.deal_hole(Some(cards("7h6h")), Some(1), None).unwrap();

    state.complete_bet_or_raise_to(Some(4), None).unwrap(); // p2 completes
    state.complete_bet_or_raise_to(Some(6), None).unwrap(); // p1 raises
    state.fold(None).unwrap(); // p2 folds

    assert!(!state.status);
    assert_eq!(state.stacks, vec![204, 196]);
    assert_eq!(state.payoffs, vec![4, -4]);
}

/// S2: the Dwan/Ivey three-way no-limit hold'em hand.
#[test]
fn no_limit_three_way_dwan_ivey() {
    let mut state = StateBuilder::new(no_limit_texas_holdem(2000i64).unwrap(), 3)
        .automations(&replay_automations())
        .ante_trimming_status(true)
        .raw_antes(uniform_values(500, 3))
        .raw_blinds_or_straddles(chip_map(&[(0, 1000), (1, 2000)]))
        .raw_starting_stacks(chip_map(&[(0, 1_125_600), (1, 2_000_000), (2, 553_500)]))
        .shuffle_source(rng())
        .build()
        .unwrap();

    state.deal_hole(Some(cards("Ac2d")), Some(0), None).unwrap(); // Ivey
    state.deal_hole(Some(cards("????")), Some(1), None).unwrap(); // Antonius
    state.deal_hole(Some(cards("7h6h")), Some(2), None).unwrap(); // Dwan

    state.complete_bet_or_raise_to(Some(7_000), None).unwrap(); // Dwan
    state.complete_bet_or_raise_to(Some(23_000), None).unwrap(); // Ivey
    state.fold(None).unwrap(); // Antonius
    state.check_or_call(None).unwrap(); // Dwan

    state.deal_board(Some(cards("Jc3d5c")), None).unwrap();
    state.complete_bet_or_raise_to(Some(35_000), None).unwrap(); // Ivey
    state.check_or_call(None).unwrap(); // Dwan

    state.deal_board(Some(cards("4h")), None).unwrap();
    state.complete_bet_or_raise_to(Some(90_000), None).unwrap(); // Ivey
    state.complete_bet_or_raise_to(Some(232_600), None).unwrap(); // Dwan
    state.complete_bet_or_raise_to(Some(1_067_100), None).unwrap(); // Ivey all-in
    state.check_or_call(None).unwrap(); // Dwan all-in for less

    state.deal_board(Some(cards("Jh")), None).unwrap();

    assert!(!state.status);
    assert_eq!(state.stacks, vec![572_100, 1_997_500, 1_109_500]);
}

/// S3: the Antonius/Blom pot-limit Omaha hand, in exact decimals.
#[test]
fn pot_limit_omaha_antonius_blom() {
    let mut state = StateBuilder::new(
        pot_limit_omaha_holdem::<Decimal>(dec!(1000)).unwrap(),
        2,
    )
    .automations(&replay_automations())
    .raw_blinds_or_straddles(chip_map(&[(0, dec!(500)), (1, dec!(1000))]))
    .raw_starting_stacks(chip_map(&[(0, dec!(1259450.25)), (1, dec!(678473.5))]))
    .shuffle_source(rng())
    .build()
    .unwrap();

    state
        .deal_hole(Some(cards("Ah3sKsKh")), Some(0), None)
        .unwrap(); // Antonius
    state
        .deal_hole(Some(cards("6d9s7d8h")), Some(1), None)
        .unwrap(); // Blom

    state
        .complete_bet_or_raise_to(Some(dec!(3000)), None)
        .unwrap(); // Blom
    state
        .complete_bet_or_raise_to(Some(dec!(9000)), None)
        .unwrap(); // Antonius
    state
        .complete_bet_or_raise_to(Some(dec!(27000)), None)
        .unwrap(); // Blom
    state
        .complete_bet_or_raise_to(Some(dec!(81000)), None)
        .unwrap(); // Antonius
    state.check_or_call(None).unwrap(); // Blom

    state.deal_board(Some(cards("4s5c2h")), None).unwrap();
    state
        .complete_bet_or_raise_to(Some(dec!(91000)), None)
        .unwrap(); // Antonius
    state
        .complete_bet_or_raise_to(Some(dec!(435000)), None)
        .unwrap(); // Blom
    state
        .complete_bet_or_raise_to(Some(dec!(779000)), None)
        .unwrap(); // Antonius
    state.check_or_call(None).unwrap(); // Blom all-in

    state.deal_board(Some(cards("5h")), None).unwrap();
    state.deal_board(Some(cards("9c")), None).unwrap();

    assert!(!state.status);
    assert_eq!(state.stacks, vec![dec!(1937923.75), dec!(0.0)]);
}

/// S4: the Xuan/Phua six-handed short-deck all-in.
#[test]
fn short_deck_six_handed_all_in_xuan_phua() {
    let mut state = StateBuilder::new(no_limit_short_deck_holdem(3000i64).unwrap(), 6)
        .automations(&replay_automations())
        .ante_trimming_status(true)
        .raw_antes(uniform_values(3000, 6))
        .raw_blinds_or_straddles(chip_map(&[(5, 3000)]))
        .raw_starting_stacks(chip_map(&[
            (0, 495_000),
            (1, 232_000),
            (2, 362_000),
            (3, 403_000),
            (4, 301_000),
            (5, 204_000),
        ]))
        .shuffle_source(rng())
        .build()
        .unwrap();

    state.deal_hole(Some(cards("Th8h")), Some(0), None).unwrap(); // Badziakouski
    state.deal_hole(Some(cards("QsJd")), Some(1), None).unwrap(); // Zhong
    state.deal_hole(Some(cards("QhQd")), Some(2), None).unwrap(); // Xuan
    state.deal_hole(Some(cards("8d7c")), Some(3), None).unwrap(); // Jun
    state.deal_hole(Some(cards("KhKs")), Some(4), None).unwrap(); // Phua
    state.deal_hole(Some(cards("8c7h")), Some(5), None).unwrap(); // Koon

    state.check_or_call(None).unwrap(); // Badziakouski
    state.check_or_call(None).unwrap(); // Zhong
    state.complete_bet_or_raise_to(Some(35_000), None).unwrap(); // Xuan
    state.fold(None).unwrap(); // Jun
    state.complete_bet_or_raise_to(Some(298_000), None).unwrap(); // Phua all-in
    state.fold(None).unwrap(); // Koon
    state.fold(None).unwrap(); // Badziakouski
    state.fold(None).unwrap(); // Zhong
    state.check_or_call(None).unwrap(); // Xuan

    state.deal_board(Some(cards("9h6cKc")), None).unwrap();
    state.deal_board(Some(cards("Jh")), None).unwrap();
    state.deal_board(Some(cards("Ts")), None).unwrap();

    assert!(!state.status);
    assert_eq!(
        state.stacks,
        vec![489_000, 226_000, 684_000, 400_000, 0, 198_000]
    );
}

/// S5: the Yockey/Arieh deuce-to-seven triple draw bad beat.
#[test]
fn fixed_limit_triple_draw_yockey_arieh() {
    let mut state = StateBuilder::new(
        fixed_limit_deuce_to_seven_lowball_triple_draw(150_000i64, 300_000).unwrap(),
        4,
    )
    .automations(&replay_automations())
    .raw_blinds_or_straddles(chip_map(&[(0, 75_000), (1, 150_000)]))
    .raw_starting_stacks(chip_map(&[
        (0, 1_180_000),
        (1, 4_340_000),
        (2, 5_910_000),
        (3, 10_765_000),
    ]))
    .shuffle_source(rng())
    .build()
    .unwrap();

    state
        .deal_hole(Some(cards("7h6c4c3d2c")), Some(0), None)
        .unwrap(); // Yockey
    state
        .deal_hole(Some(cards("??????????")), Some(1), None)
        .unwrap(); // Hui
    state
        .deal_hole(Some(cards("??????????")), Some(2), None)
        .unwrap(); // Esposito
    state
        .deal_hole(Some(cards("AsQs6s5c3c")), Some(3), None)
        .unwrap(); // Arieh

    state.fold(None).unwrap(); // Esposito
    state.complete_bet_or_raise_to(None, None).unwrap(); // Arieh raises to 300,000
    state.complete_bet_or_raise_to(None, None).unwrap(); // Yockey to 450,000
    state.fold(None).unwrap(); // Hui
    state.check_or_call(None).unwrap(); // Arieh

    // First draw.
    state.stand_pat_or_discard(Some(vec![]), None).unwrap(); // Yockey pat
    state
        .stand_pat_or_discard(Some(cards("AsQs")), None)
        .unwrap(); // Arieh
    state.deal_hole(Some(cards("2hQh")), Some(3), None).unwrap();
    state.complete_bet_or_raise_to(None, None).unwrap(); // Yockey bets 150,000
    state.check_or_call(None).unwrap(); // Arieh

    // Second draw.
    state.stand_pat_or_discard(Some(vec![]), None).unwrap(); // Yockey pat
    state.stand_pat_or_discard(Some(cards("Qh")), None).unwrap(); // Arieh
    state.deal_hole(Some(cards("4d")), Some(3), None).unwrap();
    state.complete_bet_or_raise_to(None, None).unwrap(); // Yockey bets 300,000
    state.check_or_call(None).unwrap(); // Arieh

    // Third draw.
    state.stand_pat_or_discard(Some(vec![]), None).unwrap(); // Yockey pat
    state.stand_pat_or_discard(Some(cards("6s")), None).unwrap(); // Arieh
    state.deal_hole(Some(cards("7c")), Some(3), None).unwrap();
    let all_in = state.complete_bet_or_raise_to(None, None).unwrap(); // Yockey all-in
    assert_eq!(all_in.amount, 280_000);
    state.check_or_call(None).unwrap(); // Arieh

    assert!(!state.status);
    assert_eq!(
        state.stacks,
        vec![0, 4_190_000, 5_910_000, 12_095_000]
    );
}

/// S6: a cash-game all-in run out four times. The pot splits into four
/// equal portions with the odd chip on the first board, and each portion's
/// odd chips go to the earliest-position winner.
#[test]
fn cash_game_multi_runout_splits_the_pot() {
    let mut automations = replay_automations();
    automations.retain(|a| *a != Automation::RunoutCountSelection);
    let mut state: State<i64> = StateBuilder::new(no_limit_texas_holdem(400i64).unwrap(), 6)
        .automations(&automations)
        .raw_antes(chip_map(&[(-1, 601)]))
        .raw_blinds_or_straddles(chip_map(&[(0, 200), (1, 400), (2, 800)]))
        .raw_starting_stacks(chip_map(&[
            (0, 100_000),
            (1, 100_000),
            (2, 20_000),
            (3, 20_000),
            (4, 100_000),
            (5, 100_000),
        ]))
        .mode(Mode::CashGame)
        .shuffle_source(rng())
        .build()
        .unwrap();

    state.deal_hole(Some(cards("????")), Some(0), None).unwrap();
    state.deal_hole(Some(cards("????")), Some(1), None).unwrap();
    state.deal_hole(Some(cards("AsAh")), Some(2), None).unwrap();
    state.deal_hole(Some(cards("KsKh")), Some(3), None).unwrap();
    state.deal_hole(Some(cards("????")), Some(4), None).unwrap();
    state.deal_hole(Some(cards("????")), Some(5), None).unwrap();

    // The straddle on seat 2 makes seat 3 first to act.
    state.complete_bet_or_raise_to(Some(20_000), None).unwrap(); // p4 shoves
    state.fold(None).unwrap();
    state.fold(None).unwrap();
    state.fold(None).unwrap();
    state.fold(None).unwrap();
    state.check_or_call(None).unwrap(); // the straddler calls all-in

    // Both players want four runouts.
    assert!(state.can_select_runout_count(Some(2), Some(4)));
    state.select_runout_count(Some(2), Some(4), None).unwrap();
    state.select_runout_count(Some(3), Some(4), None).unwrap();
    assert_eq!(state.runout_count, Some(4));
    assert_eq!(state.board_count(), 4);

    // First runout: the kings hold.
    state.deal_board(Some(cards("Kc7d2s")), None).unwrap();
    state.deal_board(Some(cards("4c")), None).unwrap();
    state.deal_board(Some(cards("9d")), None).unwrap();
    // Second runout: the aces hold.
    state.deal_board(Some(cards("Qc7h2d")), None).unwrap();
    state.deal_board(Some(cards("3s")), None).unwrap();
    state.deal_board(Some(cards("8d")), None).unwrap();
    // Third runout: the kings again.
    state.deal_board(Some(cards("Kd6s2h")), None).unwrap();
    state.deal_board(Some(cards("3d")), None).unwrap();
    state.deal_board(Some(cards("8h")), None).unwrap();
    // Fourth runout: the aces again.
    state.deal_board(Some(cards("Qd6c3h")), None).unwrap();
    state.deal_board(Some(cards("Jd")), None).unwrap();
    state.deal_board(Some(cards("Th")), None).unwrap();

    assert_eq!(state.get_board_cards(0), cards("Kc7d2s4c9d"));
    assert_eq!(state.get_board_cards(1), cards("Qc7h2d3s8d"));
    assert_eq!(state.get_board_cards(2), cards("Kd6s2h3d8h"));
    assert_eq!(state.get_board_cards(3), cards("Qd6c3hJdTh"));

    // Cash games leave the reveal to the players.
    state
        .show_or_muck_hole_cards(Some(ShowOrMuck::Show), None)
        .unwrap();
    state
        .show_or_muck_hole_cards(Some(ShowOrMuck::Show), None)
        .unwrap();

    assert!(!state.status);

    // Pot: 200 + 400 + 20,000 + 20,000 live plus the 601 dead ante, split
    // into four portions of 10,300 with the odd chip on the first board.
    let pushes: Vec<_> = state
        .operations
        .iter()
        .filter_map(|operation| match operation {
            Operation::ChipsPushing(op) => Some(op.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(pushes.len(), 4);
    let portion_totals: Vec<i64> = pushes
        .iter()
        .map(|p| p.amounts.iter().sum::<i64>())
        .collect();
    assert_eq!(portion_totals, vec![10_301, 10_300, 10_300, 10_300]);

    // The kings took boards one and three, the aces boards two and four.
    assert_eq!(state.stacks, vec![99_800, 99_600, 20_600, 20_601, 100_000, 99_399]);
    assert_eq!(state.stacks.iter().sum::<i64>(), 440_000);
}
