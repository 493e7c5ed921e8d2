//! Product and modifier resolution
//!
//! The internal catalog and the POS catalog are synchronized out of band and
//! drift. Resolution consults the operator-maintained mapping table first,
//! then falls back to a layered heuristic chain over the fetched
//! nomenclature. The chain is a pure function so every layer is testable.
//!
//! Unresolvable items keep their external id verbatim; the POS call may then
//! fail, which is logged and handled by the submitter, not fatal here.

use shared::models::OrderItem;
use std::collections::HashMap;

use super::types::{PosMenuItem, PosOrderItem, PosOrderModifier};

/// Vendor prefix on POS-side names ("D Бургер" for the delivery menu copy).
const VENDOR_PREFIX: &str = "D ";
/// Keyword identifying delivery-fee pseudo-products.
const DELIVERY_KEYWORD: &str = "ДОСТАВКА";
/// Legacy name variant still present in some POS installations.
const DELIVERY_TEST_NAME: &str = "ДОСТАВКА ТЕСТ";

const ITEM_TYPE_PRODUCT: &str = "Product";

fn strip_vendor_prefix(name: &str) -> &str {
    name.strip_prefix(VENDOR_PREFIX).unwrap_or(name)
}

/// Heuristic match chain, tried in order until one layer succeeds:
/// exact id/code, prefix-stripped name, delivery-keyword containment,
/// legacy literal.
pub fn match_catalog<'a>(
    catalog: &'a [PosMenuItem],
    external_id: &str,
    name: &str,
) -> Option<&'a PosMenuItem> {
    if !external_id.is_empty() {
        if let Some(item) = catalog
            .iter()
            .find(|p| p.id == external_id || (!p.code.is_empty() && p.code == external_id))
        {
            return Some(item);
        }
    }

    let wanted = name.trim().to_uppercase();
    if !wanted.is_empty() {
        if let Some(item) = catalog
            .iter()
            .find(|p| strip_vendor_prefix(&p.name).trim().to_uppercase() == wanted)
        {
            return Some(item);
        }

        if wanted.contains(DELIVERY_KEYWORD) {
            if let Some(item) = catalog
                .iter()
                .find(|p| p.name.to_uppercase().contains(DELIVERY_KEYWORD))
            {
                return Some(item);
            }
        }

        if wanted == DELIVERY_TEST_NAME {
            return catalog
                .iter()
                .find(|p| p.name.trim().to_uppercase() == DELIVERY_TEST_NAME);
        }
    }
    None
}

/// Top up mandatory modifiers so the payload passes the POS's own
/// mandatory-selection validation. Simple modifiers with `min_amount > 0`
/// are added at their default (or minimum) amount when missing; group
/// minimums are satisfied by topping up with the group's first child.
pub fn enrich_modifiers(
    menu_item: &PosMenuItem,
    mut modifiers: Vec<PosOrderModifier>,
) -> Vec<PosOrderModifier> {
    for modifier in &menu_item.modifiers {
        if modifier.min_amount <= 0.0 {
            continue;
        }
        if modifiers.iter().any(|m| m.product_id == modifier.id) {
            continue;
        }
        let amount = if modifier.default_amount > 0.0 {
            modifier.default_amount
        } else {
            modifier.min_amount
        };
        modifiers.push(PosOrderModifier {
            product_id: modifier.id.clone(),
            amount,
            product_group_id: None,
        });
    }

    for group in &menu_item.group_modifiers {
        if group.min_amount <= 0.0 || group.child_modifiers.is_empty() {
            continue;
        }
        let present: f64 = modifiers
            .iter()
            .filter(|m| {
                m.product_group_id.as_deref() == Some(group.id.as_str())
                    || group.child_modifiers.iter().any(|c| c.id == m.product_id)
            })
            .map(|m| m.amount)
            .sum();
        if present < group.min_amount {
            let first = &group.child_modifiers[0];
            modifiers.push(PosOrderModifier {
                product_id: first.id.clone(),
                amount: group.min_amount - present,
                product_group_id: Some(group.id.clone()),
            });
        }
    }

    modifiers
}

pub struct Resolver<'a> {
    mapping: &'a HashMap<String, String>,
    catalog: &'a [PosMenuItem],
}

impl<'a> Resolver<'a> {
    pub fn new(mapping: &'a HashMap<String, String>, catalog: &'a [PosMenuItem]) -> Self {
        Self { mapping, catalog }
    }

    /// Resolve an internal external-id/name pair to a POS product id.
    /// Mapping table wins over every heuristic; the verbatim external id
    /// is the last resort.
    pub fn resolve_id(&self, external_id: &str, name: &str) -> String {
        if let Some(mapped) = self.mapping.get(external_id) {
            return mapped.clone();
        }
        match match_catalog(self.catalog, external_id, name) {
            Some(item) => item.id.clone(),
            None => {
                tracing::warn!(external_id, name, "No POS match, using external id verbatim");
                external_id.to_string()
            }
        }
    }

    /// Expand one internal order line into POS lines: quantity N becomes N
    /// unit lines, each carrying the resolved, enriched modifier set.
    ///
    /// A variation that resolves to a standalone POS product replaces the
    /// base product; one that resolves to a modifier attaches as a modifier,
    /// with its group id discovered from the base product's group modifiers.
    pub fn resolve_item(&self, item: &OrderItem) -> Vec<PosOrderItem> {
        let mut product_id = self.resolve_id(&item.external_product_id, &item.name);

        let mut modifiers = Vec::new();
        if let Some(variation_ext) = &item.variation_external_id {
            let variation_name = item.variation_name.as_deref().unwrap_or_default();
            let variation_pos_id = self.resolve_id(variation_ext, variation_name);
            if self.catalog.iter().any(|p| p.id == variation_pos_id) {
                product_id = variation_pos_id;
            } else {
                // Amount follows the child modifier's default (or minimum)
                // when the base product's group modifiers declare one.
                let mut amount = 1.0;
                let group_id = self
                    .catalog
                    .iter()
                    .find(|p| p.id == product_id)
                    .and_then(|p| {
                        p.group_modifiers.iter().find_map(|g| {
                            let child =
                                g.child_modifiers.iter().find(|c| c.id == variation_pos_id)?;
                            if child.default_amount > 0.0 {
                                amount = child.default_amount;
                            } else if child.min_amount > 0.0 {
                                amount = child.min_amount;
                            }
                            Some(g.id.clone())
                        })
                    });
                modifiers.push(PosOrderModifier {
                    product_id: variation_pos_id,
                    amount,
                    product_group_id: group_id,
                });
            }
        }

        if let Some(menu_item) = self.catalog.iter().find(|p| p.id == product_id) {
            modifiers = enrich_modifiers(menu_item, modifiers);
        }

        (0..item.quantity.max(1))
            .map(|_| PosOrderItem {
                product_id: product_id.clone(),
                item_type: ITEM_TYPE_PRODUCT.into(),
                amount: 1.0,
                price: Some(item.price),
                modifiers: modifiers.clone(),
                comment: None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::types::{PosModifier, PosModifierGroup};
    use uuid::Uuid;

    fn menu_item(id: &str, code: &str, name: &str) -> PosMenuItem {
        PosMenuItem {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn order_item(external_id: &str, name: &str, quantity: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            product_id: Uuid::new_v4(),
            external_product_id: external_id.into(),
            name: name.into(),
            price: 100.0,
            quantity,
            total_price: 100.0 * quantity as f64,
            weight: 0.0,
            total_weight: 0.0,
            variation_id: None,
            variation_external_id: None,
            variation_name: None,
            variation_group_id: None,
            variation_group_name: None,
        }
    }

    #[test]
    fn exact_id_and_code_match_first() {
        let catalog = vec![
            menu_item("guid-1", "101", "Бургер"),
            menu_item("guid-2", "102", "Піца"),
        ];
        assert_eq!(match_catalog(&catalog, "guid-2", "whatever").unwrap().id, "guid-2");
        assert_eq!(match_catalog(&catalog, "101", "whatever").unwrap().id, "guid-1");
    }

    #[test]
    fn name_match_strips_vendor_prefix() {
        let catalog = vec![menu_item("guid-1", "", "D Бургер")];
        assert_eq!(match_catalog(&catalog, "missing", "бургер").unwrap().id, "guid-1");
    }

    #[test]
    fn delivery_keyword_containment() {
        let catalog = vec![
            menu_item("guid-1", "", "Бургер"),
            menu_item("guid-2", "", "Доставка по місту"),
        ];
        assert_eq!(
            match_catalog(&catalog, "", "Доставка (зона 1)").unwrap().id,
            "guid-2"
        );
    }

    #[test]
    fn no_match_yields_none() {
        let catalog = vec![menu_item("guid-1", "", "Бургер")];
        assert!(match_catalog(&catalog, "missing", "Салат").is_none());
    }

    #[test]
    fn mapping_table_wins_over_heuristics() {
        let catalog = vec![menu_item("guid-1", "ext-1", "Бургер")];
        let mapping = HashMap::from([("ext-1".to_string(), "guid-override".to_string())]);
        let resolver = Resolver::new(&mapping, &catalog);
        assert_eq!(resolver.resolve_id("ext-1", "Бургер"), "guid-override");
    }

    #[test]
    fn unresolved_id_passes_through_verbatim() {
        let catalog = vec![];
        let mapping = HashMap::new();
        let resolver = Resolver::new(&mapping, &catalog);
        assert_eq!(resolver.resolve_id("ext-9", "Невідоме"), "ext-9");
    }

    #[test]
    fn mandatory_modifier_added_at_default_amount() {
        let mut item = menu_item("guid-1", "", "Бургер");
        item.modifiers = vec![PosModifier {
            id: "mod-1".into(),
            min_amount: 1.0,
            max_amount: 3.0,
            default_amount: 2.0,
        }];
        let enriched = enrich_modifiers(&item, vec![]);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].product_id, "mod-1");
        assert_eq!(enriched[0].amount, 2.0);
    }

    #[test]
    fn present_modifier_is_not_duplicated() {
        let mut item = menu_item("guid-1", "", "Бургер");
        item.modifiers = vec![PosModifier {
            id: "mod-1".into(),
            min_amount: 1.0,
            ..Default::default()
        }];
        let existing = vec![PosOrderModifier {
            product_id: "mod-1".into(),
            amount: 1.0,
            product_group_id: None,
        }];
        let enriched = enrich_modifiers(&item, existing);
        assert_eq!(enriched.len(), 1);
    }

    #[test]
    fn group_minimum_topped_up_with_first_child() {
        let mut item = menu_item("guid-1", "", "Піца");
        item.group_modifiers = vec![PosModifierGroup {
            id: "grp-1".into(),
            min_amount: 2.0,
            max_amount: 5.0,
            child_modifiers: vec![
                PosModifier {
                    id: "child-1".into(),
                    ..Default::default()
                },
                PosModifier {
                    id: "child-2".into(),
                    ..Default::default()
                },
            ],
        }];
        let existing = vec![PosOrderModifier {
            product_id: "child-2".into(),
            amount: 1.0,
            product_group_id: Some("grp-1".into()),
        }];
        let enriched = enrich_modifiers(&item, existing);
        assert_eq!(enriched.len(), 2);
        let added = &enriched[1];
        assert_eq!(added.product_id, "child-1");
        assert_eq!(added.amount, 1.0);
        assert_eq!(added.product_group_id.as_deref(), Some("grp-1"));
    }

    #[test]
    fn satisfied_group_is_left_alone() {
        let mut item = menu_item("guid-1", "", "Піца");
        item.group_modifiers = vec![PosModifierGroup {
            id: "grp-1".into(),
            min_amount: 1.0,
            max_amount: 5.0,
            child_modifiers: vec![PosModifier {
                id: "child-1".into(),
                ..Default::default()
            }],
        }];
        let existing = vec![PosOrderModifier {
            product_id: "child-1".into(),
            amount: 1.0,
            product_group_id: None,
        }];
        let enriched = enrich_modifiers(&item, existing);
        assert_eq!(enriched.len(), 1);
    }

    #[test]
    fn variation_resolving_to_a_product_replaces_the_base() {
        let catalog = vec![
            menu_item("guid-base", "ext-1", "Піца"),
            menu_item("guid-large", "ext-1-l", "Піца Велика"),
        ];
        let mapping = HashMap::new();
        let resolver = Resolver::new(&mapping, &catalog);

        let mut item = order_item("ext-1", "Піца (Велика)", 1);
        item.variation_external_id = Some("ext-1-l".into());
        item.variation_name = Some("Велика".into());

        let lines = resolver.resolve_item(&item);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, "guid-large");
        assert!(lines[0].modifiers.is_empty());
    }

    #[test]
    fn variation_resolving_to_a_modifier_carries_its_group_id() {
        let mut base = menu_item("guid-base", "ext-1", "Піца");
        base.group_modifiers = vec![PosModifierGroup {
            id: "grp-size".into(),
            min_amount: 0.0,
            max_amount: 1.0,
            child_modifiers: vec![PosModifier {
                id: "mod-large".into(),
                min_amount: 1.0,
                default_amount: 2.0,
                ..Default::default()
            }],
        }];
        let catalog = vec![base];
        let mapping = HashMap::from([("ext-1-l".to_string(), "mod-large".to_string())]);
        let resolver = Resolver::new(&mapping, &catalog);

        let mut item = order_item("ext-1", "Піца (Велика)", 1);
        item.variation_external_id = Some("ext-1-l".into());
        item.variation_name = Some("Велика".into());

        let lines = resolver.resolve_item(&item);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, "guid-base");
        assert_eq!(lines[0].modifiers[0].product_id, "mod-large");
        assert_eq!(lines[0].modifiers[0].amount, 2.0);
        assert_eq!(lines[0].modifiers[0].product_group_id.as_deref(), Some("grp-size"));
    }

    #[test]
    fn quantity_three_expands_into_three_unit_lines_with_modifier() {
        let mut menu = menu_item("guid-1", "ext-1", "Бургер");
        menu.modifiers = vec![PosModifier {
            id: "mod-1".into(),
            min_amount: 1.0,
            default_amount: 1.0,
            ..Default::default()
        }];
        let catalog = vec![menu];
        let mapping = HashMap::new();
        let resolver = Resolver::new(&mapping, &catalog);

        let lines = resolver.resolve_item(&order_item("ext-1", "Бургер", 3));
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.product_id, "guid-1");
            assert_eq!(line.amount, 1.0);
            assert_eq!(line.price, Some(100.0));
            assert_eq!(line.modifiers.len(), 1);
            assert_eq!(line.modifiers[0].product_id, "mod-1");
            assert_eq!(line.modifiers[0].amount, 1.0);
        }
    }
}
