//! Filtering and sorting of the coin list

use crate::types::{CoinSummary, SortKey};
use std::cmp::Ordering;

/// Coins whose name or symbol contains `query`, ignoring case
///
/// A blank query returns the whole list. Order is preserved.
pub fn filter_coins(coins: &[CoinSummary], query: &str) -> Vec<CoinSummary> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return coins.to_vec();
    }
    coins
        .iter()
        .filter(|coin| coin.matches_query(&needle))
        .cloned()
        .collect()
}

/// Sorts descending by `key`; ties keep their current order
pub fn sort_coins(coins: &mut [CoinSummary], key: SortKey) {
    coins.sort_by(|a, b| {
        b.sort_value(key)
            .partial_cmp(&a.sort_value(key))
            .unwrap_or(Ordering::Equal)
    });
}

/// Filter then, if a key is given, sort
pub fn visible_coins(coins: &[CoinSummary], query: &str, sort: Option<SortKey>) -> Vec<CoinSummary> {
    let mut visible = filter_coins(coins, query);
    if let Some(key) = sort {
        sort_coins(&mut visible, key);
    }
    visible
}
