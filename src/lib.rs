//! Faithful simulation of arbitrary poker variants and fast evaluation of
//! poker hands.
//!
//! The crate is organized around two cores. The state machine ([`state`])
//! drives a hand from ante posting through chip distribution as guarded
//! transitions over a [`games::Variant`]. The evaluator ([`lookups`],
//! [`hands`]) maps card multisets to dense ranks, one table per hand
//! family. The [`notation`] module is a pure codec between operations and
//! the textual action format.
//!
//! ```no_run
//! use std::collections::BTreeMap;
//!
//! use cardroom::games::no_limit_texas_holdem;
//! use cardroom::state::{Automation, StateBuilder};
//! use cardroom::utilities::uniform_values;
//!
//! let variant = no_limit_texas_holdem(2i64)?;
//! let mut blinds = BTreeMap::new();
//! blinds.insert(0, 1);
//! blinds.insert(1, 2);
//! let mut state = StateBuilder::new(variant, 6)
//!     .automations(&[
//!         Automation::AntePosting,
//!         Automation::BetCollection,
//!         Automation::BlindOrStraddlePosting,
//!         Automation::CardBurning,
//!         Automation::HoleDealing,
//!         Automation::BoardDealing,
//!         Automation::HoleCardsShowingOrMucking,
//!         Automation::HandKilling,
//!         Automation::ChipsPushing,
//!         Automation::ChipsPulling,
//!     ])
//!     .raw_blinds_or_straddles(blinds)
//!     .raw_starting_stacks(uniform_values(200i64, 6))
//!     .build()?;
//!
//! while state.status {
//!     if state.can_fold() {
//!         state.fold(None)?;
//!     }
//! }
//! # Ok::<(), cardroom::utilities::Error>(())
//! ```

pub mod games;
pub mod hands;
pub mod lookups;
pub mod notation;
pub mod state;
pub mod utilities;
