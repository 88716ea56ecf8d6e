//--------------------------------------------------------------------------------------------------
// TEST MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Property tests over randomized order streams (§8): never-crossed, conservation of quantity
// plus id-index consistency, and idempotent cancel.
//--------------------------------------------------------------------------------------------------

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use limit_matching_engine::engine::{MatchingEngine, SubmitOrderRequest};
use limit_matching_engine::journal::NullJournal;
use limit_matching_engine::model::{OrderStatus, Side};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    Submit { side: bool, qty: u64, price: i64 },
    CancelPrevious { index: usize },
    ModifyPrevious { index: usize, qty: u64, price: i64 },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (any::<bool>(), 1u64..20, 90i64..110).prop_map(|(side, qty, price)| Action::Submit {
            side,
            qty,
            price
        }),
        1 => (0usize..64).prop_map(|index| Action::CancelPrevious { index }),
        1 => (0usize..64, 1u64..20, 90i64..110)
            .prop_map(|(index, qty, price)| Action::ModifyPrevious { index, qty, price }),
    ]
}

fn new_engine() -> MatchingEngine {
    MatchingEngine::new(Arc::new(NullJournal), "/tmp/limit-matching-engine-invariants")
}

proptest! {
    #[test]
    fn never_crossed_after_random_stream(actions in prop::collection::vec(action_strategy(), 1..200)) {
        let engine = new_engine();
        let mut order_ids: Vec<String> = Vec::new();

        for action in actions {
            match action {
                Action::Submit { side, qty, price } => {
                    let side = if side { Side::Buy } else { Side::Sell };
                    let outcome = engine
                        .submit(SubmitOrderRequest {
                            user_id: "u".into(),
                            symbol: "X".into(),
                            side,
                            quantity: qty,
                            price,
                        })
                        .unwrap();
                    order_ids.push(outcome.order.id);
                }
                Action::CancelPrevious { index } => {
                    if let Some(id) = order_ids.get(index % order_ids.len().max(1)) {
                        let _ = engine.cancel("X", id);
                    }
                }
                Action::ModifyPrevious { index, qty, price } => {
                    if let Some(id) = order_ids.get(index % order_ids.len().max(1)) {
                        let _ = engine.modify("X", id, qty, price);
                    }
                }
            }

            let data = engine.market_data("X", 1);
            if let (Some(bid), Some(ask)) = (data.best_bid, data.best_ask) {
                prop_assert!(bid < ask, "book crossed: bid {bid} >= ask {ask}");
            }
        }
    }

    #[test]
    fn conservation_and_id_index_consistency(actions in prop::collection::vec(action_strategy(), 1..200)) {
        let engine = new_engine();
        let mut order_ids: Vec<String> = Vec::new();
        let mut original_qty: HashMap<String, u64> = HashMap::new();
        let mut filled: HashMap<String, u64> = HashMap::new();
        let mut cancelled: HashSet<String> = HashSet::new();

        let mut record_trades = |trades: &[limit_matching_engine::Trade]| {
            for trade in trades {
                *filled.entry(trade.buy_order_id.clone()).or_insert(0) += trade.quantity;
                *filled.entry(trade.sell_order_id.clone()).or_insert(0) += trade.quantity;
            }
        };

        for action in actions {
            match action {
                Action::Submit { side, qty, price } => {
                    let side = if side { Side::Buy } else { Side::Sell };
                    let outcome = engine
                        .submit(SubmitOrderRequest {
                            user_id: "u".into(),
                            symbol: "X".into(),
                            side,
                            quantity: qty,
                            price,
                        })
                        .unwrap();
                    original_qty.insert(outcome.order.id.clone(), qty);
                    record_trades(&outcome.trades);
                    order_ids.push(outcome.order.id);
                }
                Action::CancelPrevious { index } => {
                    if let Some(id) = order_ids.get(index % order_ids.len().max(1)).cloned() {
                        if engine.cancel("X", &id).is_ok() {
                            cancelled.insert(id);
                        }
                    }
                }
                Action::ModifyPrevious { index, qty, price } => {
                    if let Some(id) = order_ids.get(index % order_ids.len().max(1)).cloned() {
                        if let Ok(outcome) = engine.modify("X", &id, qty, price) {
                            original_qty.insert(id, qty);
                            record_trades(&outcome.trades);
                        }
                    }
                }
            }
        }

        for id in &order_ids {
            let total_filled = *filled.get(id).unwrap_or(&0);
            match engine.status("X", id) {
                Ok(status) => {
                    prop_assert!(!cancelled.contains(id), "cancelled order {id} still resolves");
                    prop_assert_eq!(status.filled_qty, total_filled);
                    let original = original_qty[id];
                    prop_assert_eq!(status.filled_qty + status.remaining, original);
                    prop_assert!(status.status.is_resting() || status.remaining == 0);
                }
                Err(_) => {
                    // Not found means fully filled or cancelled — either is consistent with
                    // the id index invariant (§8.5): resting iff present.
                    let original = original_qty[id];
                    prop_assert!(cancelled.contains(id) || total_filled == original);
                }
            }
        }
    }

    #[test]
    fn idempotent_cancel_never_mutates_state(qty in 1u64..20, price in 90i64..110) {
        let engine = new_engine();
        prop_assert!(matches!(engine.cancel("X", "never-existed"), Err(_)));

        let outcome = engine
            .submit(SubmitOrderRequest {
                user_id: "u".into(),
                symbol: "X".into(),
                side: Side::Buy,
                quantity: qty,
                price,
            })
            .unwrap();

        let before = engine.market_data("X", 5);
        engine.cancel("X", &outcome.order.id).unwrap();
        let second = engine.cancel("X", &outcome.order.id);
        prop_assert!(second.is_err());

        let after = engine.market_data("X", 5);
        prop_assert_eq!(after.best_bid, None);
        prop_assert_ne!(before.best_bid, after.best_bid.or(Some(price)));
        let _ = OrderStatus::Cancelled;
    }
}
