//! Stop-list diffing
//!
//! Pure comparison of an incoming POS stop-list snapshot against the local
//! catalog. Matching is by external id; the POS sends `-1` for "no limit",
//! which maps to the local `None` stock. A product missing from the payload
//! is counted but not changed: POS omission semantics are ambiguous, and
//! resetting to unlimited is opt-in via configuration.

use shared::events::StopListEntry;
use shared::models::Product;

/// POS balance meaning "unlimited".
pub const UNLIMITED_SENTINEL: f64 = -1.0;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub external_id: String,
    pub name: String,
    pub old: Option<f64>,
    pub new: Option<f64>,
}

#[derive(Debug, Default)]
pub struct StopListDiff {
    pub changes: Vec<StockChange>,
    /// Incoming entries with no local product; logged, never applied.
    pub unknown: usize,
    /// Locally limited products absent from the payload (see module docs).
    pub missing_from_payload: usize,
}

fn to_stock(balance: f64) -> Option<f64> {
    if balance <= UNLIMITED_SENTINEL {
        None
    } else {
        Some(balance)
    }
}

fn stock_eq(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() < EPSILON,
        _ => false,
    }
}

/// Diff the snapshot against local products. When `reset_missing` is set,
/// limited products absent from the payload are restored to unlimited in
/// addition to being counted.
pub fn diff_stop_list(
    products: &[Product],
    incoming: &[StopListEntry],
    reset_missing: bool,
) -> StopListDiff {
    let mut diff = StopListDiff::default();

    for entry in incoming {
        let Some(product) = products
            .iter()
            .find(|p| !p.external_id.is_empty() && p.external_id == entry.product_id)
        else {
            diff.unknown += 1;
            continue;
        };
        let new = to_stock(entry.balance);
        if !stock_eq(product.stock, new) {
            diff.changes.push(StockChange {
                external_id: product.external_id.clone(),
                name: product.name.clone(),
                old: product.stock,
                new,
            });
        }
    }

    for product in products {
        if product.stock.is_none() || product.external_id.is_empty() {
            continue;
        }
        let mentioned = incoming.iter().any(|e| e.product_id == product.external_id);
        if !mentioned {
            diff.missing_from_payload += 1;
            if reset_missing {
                diff.changes.push(StockChange {
                    external_id: product.external_id.clone(),
                    name: product.name.clone(),
                    old: product.stock,
                    new: None,
                });
            }
        }
    }

    diff
}

fn fmt_stock(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.0}"),
        None => "∞".into(),
    }
}

/// One consolidated report regardless of how many items changed.
pub fn render_report(diff: &StopListDiff) -> String {
    if diff.changes.is_empty() {
        return "✅ Стоп-лист без розбіжностей".into();
    }
    let mut report = String::from("📦 Оновлення стоп-листа:");
    for change in &diff.changes {
        report.push_str(&format!(
            "\n✏️ {}: {} ➝ {}",
            change.name,
            fmt_stock(change.old),
            fmt_stock(change.new),
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn product(external_id: &str, name: &str, stock: Option<f64>) -> Product {
        Product {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            name: name.into(),
            price: 100.0,
            weight: 0.0,
            stock,
            hidden: false,
        }
    }

    fn entry(product_id: &str, balance: f64) -> StopListEntry {
        StopListEntry {
            product_id: product_id.into(),
            balance,
        }
    }

    #[test]
    fn equal_balance_produces_no_change() {
        let products = vec![product("ext-1", "Бургер", Some(5.0))];
        let diff = diff_stop_list(&products, &[entry("ext-1", 5.0)], false);
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn changed_balance_produces_one_change_with_old_and_new() {
        let products = vec![product("ext-1", "Бургер", Some(5.0))];
        let diff = diff_stop_list(&products, &[entry("ext-1", 2.0)], false);
        assert_eq!(diff.changes.len(), 1);
        let change = &diff.changes[0];
        assert_eq!(change.old, Some(5.0));
        assert_eq!(change.new, Some(2.0));
        let report = render_report(&diff);
        assert!(report.contains("Бургер: 5 ➝ 2"));
    }

    #[test]
    fn sentinel_balance_means_unlimited() {
        let products = vec![product("ext-1", "Бургер", Some(3.0))];
        let diff = diff_stop_list(&products, &[entry("ext-1", -1.0)], false);
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].new, None);
    }

    #[test]
    fn unlimited_to_unlimited_is_a_no_op() {
        let products = vec![product("ext-1", "Бургер", None)];
        let diff = diff_stop_list(&products, &[entry("ext-1", -1.0)], false);
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn missing_limited_product_is_counted_not_changed() {
        let products = vec![product("ext-1", "Бургер", Some(3.0))];
        let diff = diff_stop_list(&products, &[], false);
        assert!(diff.changes.is_empty());
        assert_eq!(diff.missing_from_payload, 1);
    }

    #[test]
    fn reset_missing_restores_unlimited_when_enabled() {
        let products = vec![product("ext-1", "Бургер", Some(3.0))];
        let diff = diff_stop_list(&products, &[], true);
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].new, None);
        assert_eq!(diff.missing_from_payload, 1);
    }

    #[test]
    fn unknown_incoming_product_is_counted() {
        let diff = diff_stop_list(&[], &[entry("ghost", 1.0)], false);
        assert!(diff.changes.is_empty());
        assert_eq!(diff.unknown, 1);
    }

    #[test]
    fn no_changes_renders_clean_report() {
        let diff = StopListDiff::default();
        assert_eq!(render_report(&diff), "✅ Стоп-лист без розбіжностей");
    }
}
