//! Delivery table selection
//!
//! The POS models the delivery queue as tables in a named section. Orders
//! are spread over the tables least-recently-used: the table whose most
//! recent active order is oldest (or that has never been used) wins.

use super::types::{RestaurantTable, TableOrder};

/// Most recent active-order timestamp per table, epoch millis, 0 = never.
fn last_used_millis(table_id: &str, active: &[TableOrder]) -> i64 {
    active
        .iter()
        .filter(|o| o.order.table_ids.iter().any(|id| id == table_id))
        .filter_map(|o| o.order.when_created)
        .map(|t| t.timestamp_millis())
        .max()
        .unwrap_or(0)
}

/// Pick the least-recently-used table. `None` only when there are no
/// tables at all, which is a hard failure for the caller.
pub fn select_table<'a>(
    tables: &'a [RestaurantTable],
    active: &[TableOrder],
) -> Option<&'a RestaurantTable> {
    tables
        .iter()
        .min_by_key(|t| last_used_millis(&t.id, active))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::types::TableOrderBody;
    use chrono::{TimeZone, Utc};

    fn table(id: &str) -> RestaurantTable {
        RestaurantTable {
            id: id.into(),
            number: 0,
            name: id.into(),
        }
    }

    fn active_order(table_id: &str, secs: i64) -> TableOrder {
        TableOrder {
            id: format!("order-{table_id}"),
            order: TableOrderBody {
                table_ids: vec![table_id.into()],
                when_created: Some(Utc.timestamp_opt(secs, 0).unwrap()),
                status: "New".into(),
            },
        }
    }

    #[test]
    fn never_used_table_wins() {
        let tables = vec![table("a"), table("b"), table("c")];
        // a used at T, b never, c used at T2 > T.
        let active = vec![active_order("a", 1_000), active_order("c", 2_000)];
        let selected = select_table(&tables, &active).unwrap();
        assert_eq!(selected.id, "b");
    }

    #[test]
    fn oldest_last_use_wins_when_all_used() {
        let tables = vec![table("a"), table("b")];
        let active = vec![
            active_order("a", 1_000),
            active_order("b", 500),
            active_order("a", 3_000),
        ];
        let selected = select_table(&tables, &active).unwrap();
        assert_eq!(selected.id, "b");
    }

    #[test]
    fn table_uses_its_latest_order_not_earliest() {
        let tables = vec![table("a"), table("b")];
        // a has an old and a very recent order; b only a middle one.
        let active = vec![
            active_order("a", 100),
            active_order("a", 5_000),
            active_order("b", 1_000),
        ];
        assert_eq!(select_table(&tables, &active).unwrap().id, "b");
    }

    #[test]
    fn no_tables_is_none() {
        assert!(select_table(&[], &[]).is_none());
    }

    #[test]
    fn no_active_orders_picks_first_table() {
        let tables = vec![table("a"), table("b")];
        assert_eq!(select_table(&tables, &[]).unwrap().id, "a");
    }
}
