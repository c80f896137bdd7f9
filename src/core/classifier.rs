// Keep/cancel decision for a resting order under the current signal

use crate::core::types::{OpenOrder, OrderSide, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDecision {
    Keep,
    Cancel,
}

/// Long keeps buys, Short keeps sells, Neutral keeps nothing.
///
/// Price, size and age of the order play no part.
pub fn is_still_valid(order: &OpenOrder, signal: Signal) -> bool {
    matches!(
        (signal, order.side),
        (Signal::Long, OrderSide::Buy) | (Signal::Short, OrderSide::Sell)
    )
}

pub fn classify(order: &OpenOrder, signal: Signal) -> OrderDecision {
    if is_still_valid(order, signal) {
        OrderDecision::Keep
    } else {
        OrderDecision::Cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        let buy = OpenOrder::new("B", OrderSide::Buy);
        let sell = OpenOrder::new("S", OrderSide::Sell);

        let table = [
            (Signal::Long, &buy, true),
            (Signal::Long, &sell, false),
            (Signal::Short, &buy, false),
            (Signal::Short, &sell, true),
            (Signal::Neutral, &buy, false),
            (Signal::Neutral, &sell, false),
        ];

        for (signal, order, expected) in table {
            assert_eq!(
                is_still_valid(order, signal),
                expected,
                "signal={} side={}",
                signal,
                order.side
            );
        }
    }

    #[test]
    fn test_descriptor_fields_ignored() {
        let mut order = OpenOrder::new("X", OrderSide::Buy);
        order.price = Some(0.1);
        order.volume = Some(1_000.0);
        order.order_type = "limit".to_string();
        assert_eq!(classify(&order, Signal::Long), OrderDecision::Keep);
        assert_eq!(classify(&order, Signal::Short), OrderDecision::Cancel);
    }
}
