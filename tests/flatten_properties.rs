use customer_extract::{flatten, CustomerRecord};
use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

type GeneratedOrder = (u16, Vec<(u32, u8, bool)>);
type GeneratedCustomer = (u16, bool, Vec<GeneratedOrder>);
type Generated = Vec<GeneratedCustomer>;

// (price in cents, quantity, price is valid)
fn item_strategy() -> impl Strategy<Value = (u32, u8, bool)> {
    (0u32..1_000_000, 0u8..20, prop::bool::weighted(0.85))
}

fn order_strategy() -> impl Strategy<Value = GeneratedOrder> {
    (0u16..500, vec(item_strategy(), 0..6))
}

fn customer_strategy() -> impl Strategy<Value = GeneratedCustomer> {
    (0u16..200, prop::bool::weighted(0.9), vec(order_strategy(), 0..4))
}

fn build(customers: &Generated) -> Vec<CustomerRecord> {
    let values: Vec<Value> = customers
        .iter()
        .map(|(id, valid_date, orders)| {
            let orders: Vec<Value> = orders
                .iter()
                .map(|(order_id, items)| {
                    let items: Vec<Value> = items
                        .iter()
                        .enumerate()
                        .map(|(idx, (cents, qty, valid_price))| {
                            let price = if *valid_price {
                                json!(format!("${}.{:02}", cents / 100, cents % 100))
                            } else {
                                json!("N/A")
                            };
                            json!({
                                "item_id": idx,
                                "product_name": format!("p{}", idx),
                                "category": (idx % 6) as i64,
                                "price": price,
                                "quantity": qty
                            })
                        })
                        .collect();
                    json!({"order_id": order_id, "order_date": "2022-02-02", "items": items})
                })
                .collect();

            let date = if *valid_date { "2021-01-01" } else { "bogus" };
            json!({"id": id, "name": "n", "registration_date": date, "orders": orders})
        })
        .collect();

    serde_json::from_value(Value::Array(values)).unwrap()
}

// Give every customer and every order of a customer a distinct id
fn with_unique_keys(mut customers: Generated) -> Generated {
    for (c_idx, (id, _, orders)) in customers.iter_mut().enumerate() {
        *id = c_idx as u16;
        for (o_idx, (order_id, _)) in orders.iter_mut().enumerate() {
            *order_id = o_idx as u16;
        }
    }
    customers
}

proptest! {
    #[test]
    fn prop_rows_are_sorted(customers in vec(customer_strategy(), 0..8)) {
        let rows = flatten(&HashSet::new(), &build(&customers));
        for pair in rows.windows(2) {
            prop_assert!(pair[0].sort_key() <= pair[1].sort_key());
        }
    }

    #[test]
    fn prop_total_item_price_is_exact_product(customers in vec(customer_strategy(), 0..8)) {
        for row in flatten(&HashSet::new(), &build(&customers)) {
            prop_assert_eq!(row.total_item_price, row.unit_price * row.item_quantity as f64);
        }
    }

    #[test]
    fn prop_percentages_sum_to_one(customers in vec(customer_strategy(), 0..8)) {
        let rows = flatten(&HashSet::new(), &build(&with_unique_keys(customers)));

        let mut groups: HashMap<(i64, i64), (f64, f64)> = HashMap::new();
        for row in &rows {
            let entry = groups.entry((row.customer_id, row.order_id)).or_insert((0.0, 0.0));
            entry.0 += row.total_item_price;
            entry.1 += row.total_order_value_percentage;
        }

        for (total, pct_sum) in groups.values() {
            if *total > 0.0 {
                prop_assert!((pct_sum - 1.0).abs() < 1e-6 * (1.0 + *pct_sum));
            } else {
                prop_assert_eq!(*pct_sum, 0.0);
            }
        }
    }

    #[test]
    fn prop_invalid_customers_contribute_nothing(customers in vec(customer_strategy(), 0..8)) {
        let valid_ids: HashSet<i64> = customers
            .iter()
            .filter(|(_, valid_date, _)| *valid_date)
            .map(|(id, _, _)| *id as i64)
            .collect();

        for row in flatten(&HashSet::new(), &build(&customers)) {
            prop_assert!(valid_ids.contains(&row.customer_id));
        }
    }

    #[test]
    fn prop_vip_flag_matches_set(customers in vec(customer_strategy(), 0..8), vip in vec(0i64..200, 0..20)) {
        let vip_ids: HashSet<i64> = vip.into_iter().collect();
        for row in flatten(&vip_ids, &build(&customers)) {
            prop_assert_eq!(row.is_vip, vip_ids.contains(&row.customer_id));
        }
    }
}
