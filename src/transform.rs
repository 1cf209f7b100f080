// 🧮 Flattening Transformer - customer → order → item into one sorted table
//
// Validation happens at three levels. A failure at any level drops that unit
// and everything nested under it; siblings keep going.

use crate::category::{CategoryMap, CATEGORY_MAP};
use crate::coerce::{self, CoerceError, CoerceResult};
use crate::records::{CustomerRecord, Entry, ItemRecord, OrderRecord};
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// OUTPUT ROW
// ============================================================================

/// One flattened (customer, order, item) triple
///
/// Field order is the column order of every sink.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub registration_date: NaiveDateTime,
    pub is_vip: bool,
    pub order_id: i64,
    pub order_date: NaiveDateTime,
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub unit_price: f64,
    pub item_quantity: i64,
    pub total_item_price: f64,
    pub total_order_value_percentage: f64,
}

impl OutputRow {
    /// Column names, in output order
    pub const COLUMNS: [&'static str; 13] = [
        "customer_id",
        "customer_name",
        "registration_date",
        "is_vip",
        "order_id",
        "order_date",
        "product_id",
        "product_name",
        "category",
        "unit_price",
        "item_quantity",
        "total_item_price",
        "total_order_value_percentage",
    ];

    /// Composite sort key of the table
    pub fn sort_key(&self) -> (i64, i64, i64) {
        (self.customer_id, self.order_id, self.product_id)
    }
}

// ============================================================================
// SKIP REASONS
// ============================================================================

/// Why a customer, order or item was left out
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {source}")]
pub struct FieldError {
    pub field: &'static str,
    #[source]
    pub source: CoerceError,
}

fn field<'v, T>(
    name: &'static str,
    value: Option<&'v Value>,
    parse: impl FnOnce(&'v Value) -> CoerceResult<T>,
) -> Result<T, FieldError> {
    coerce::require(value)
        .and_then(parse)
        .map_err(|source| FieldError { field: name, source })
}

// A nested list element that never deserialized into a record
fn well_formed<'e, T>(name: &'static str, entry: &'e Entry<T>) -> Result<&'e T, FieldError> {
    match entry {
        Entry::Record(record) => Ok(record),
        Entry::Malformed(raw) => Err(FieldError {
            field: name,
            source: CoerceError::NotARecord(raw.to_string()),
        }),
    }
}

// ============================================================================
// VALIDATED UNITS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidCustomer<'a> {
    pub id: i64,
    pub name: Option<String>,
    pub registration_date: NaiveDateTime,
    pub is_vip: bool,
    pub orders: &'a [Entry<OrderRecord>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrder<'a> {
    pub order_id: i64,
    pub order_date: NaiveDateTime,
    pub items: &'a [Entry<ItemRecord>],
}

/// An item that survived validation, with its values parsed exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem<'a> {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub total_item_price: f64,
    pub record: &'a ItemRecord,
}

pub fn validate_customer<'a>(
    record: &'a CustomerRecord,
    vip_ids: &HashSet<i64>,
) -> Result<ValidCustomer<'a>, FieldError> {
    let id = field("id", record.id.as_ref(), coerce::int_like)?;
    let registration_date = field(
        "registration_date",
        record.registration_date.as_ref(),
        coerce::timestamp,
    )?;
    // missing or null names are kept; text() only fails on null
    let name = record.name.as_ref().and_then(|raw| coerce::text(raw).ok());

    Ok(ValidCustomer {
        id,
        name,
        registration_date,
        is_vip: vip_ids.contains(&id),
        orders: &record.orders,
    })
}

pub fn validate_order(record: &OrderRecord) -> Result<ValidOrder<'_>, FieldError> {
    let order_id = field("order_id", record.order_id.as_ref(), coerce::int_like)?;
    let order_date = field("order_date", record.order_date.as_ref(), coerce::timestamp)?;

    Ok(ValidOrder {
        order_id,
        order_date,
        items: &record.items,
    })
}

pub fn validate_item(record: &ItemRecord) -> Result<PricedItem<'_>, FieldError> {
    if let Some(missing) = record.first_missing_field() {
        return Err(FieldError {
            field: missing,
            source: CoerceError::Missing,
        });
    }

    let unit_price = field("price", record.price.as_ref(), coerce::price)?;
    let quantity = field("quantity", record.quantity.as_ref(), coerce::int_like)?;
    let product_id = field("item_id", record.item_id.as_ref(), coerce::int_like)?;
    let product_name = field("product_name", record.product_name.as_ref(), coerce::text)?;

    Ok(PricedItem {
        product_id,
        product_name,
        unit_price,
        quantity,
        total_item_price: unit_price * quantity as f64,
        record,
    })
}

// ============================================================================
// PER-ORDER SCRATCH STATE
// ============================================================================

/// Surviving items of one order plus their running total
#[derive(Debug, Default)]
pub struct OrderTotals<'a> {
    pub items: Vec<PricedItem<'a>>,
    pub total_order_value: f64,
}

impl<'a> OrderTotals<'a> {
    pub fn push(&mut self, item: PricedItem<'a>) {
        self.total_order_value += item.total_item_price;
        self.items.push(item);
    }

    /// Share of the order total; 0.0 when the total is zero
    pub fn percentage_of(&self, total_item_price: f64) -> f64 {
        if self.total_order_value == 0.0 {
            0.0
        } else {
            total_item_price / self.total_order_value
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

/// Counts of what the transformer saw and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenReport {
    pub customers_seen: usize,
    pub customers_skipped: usize,
    pub orders_seen: usize,
    pub orders_skipped: usize,
    pub items_seen: usize,
    pub items_skipped: usize,
    pub rows_emitted: usize,
}

impl FlattenReport {
    pub fn summary(&self) -> String {
        format!(
            "{} rows from {} customers ({} skipped), {} orders ({} skipped), {} items ({} skipped)",
            self.rows_emitted,
            self.customers_seen,
            self.customers_skipped,
            self.orders_seen,
            self.orders_skipped,
            self.items_seen,
            self.items_skipped,
        )
    }
}

// ============================================================================
// TRANSFORMER
// ============================================================================

pub struct FlatteningTransformer {
    categories: CategoryMap,
}

impl FlatteningTransformer {
    pub fn new() -> Self {
        Self::with_categories(CATEGORY_MAP)
    }

    pub fn with_categories(categories: CategoryMap) -> Self {
        FlatteningTransformer { categories }
    }

    /// Flatten, validate and sort; returns the table and what was dropped
    pub fn flatten(
        &self,
        vip_ids: &HashSet<i64>,
        customers: &[CustomerRecord],
    ) -> (Vec<OutputRow>, FlattenReport) {
        let mut rows = Vec::new();
        let mut report = FlattenReport::default();

        for (index, record) in customers.iter().enumerate() {
            report.customers_seen += 1;

            let customer = match validate_customer(record, vip_ids) {
                Ok(customer) => customer,
                Err(reason) => {
                    debug!(index, %reason, "skipping customer");
                    report.customers_skipped += 1;
                    continue;
                }
            };

            for order_entry in customer.orders {
                report.orders_seen += 1;

                let order = match well_formed("order", order_entry).and_then(validate_order) {
                    Ok(order) => order,
                    Err(reason) => {
                        debug!(customer_id = customer.id, %reason, "skipping order");
                        report.orders_skipped += 1;
                        continue;
                    }
                };

                // Pass 1: validate and accumulate the order total
                let mut totals = OrderTotals::default();
                for item_entry in order.items {
                    report.items_seen += 1;
                    match well_formed("item", item_entry).and_then(validate_item) {
                        Ok(item) => totals.push(item),
                        Err(reason) => {
                            debug!(
                                customer_id = customer.id,
                                order_id = order.order_id,
                                %reason,
                                "skipping item"
                            );
                            report.items_skipped += 1;
                        }
                    }
                }

                // Pass 2: emit with the final total known
                for item in &totals.items {
                    rows.push(self.emit(&customer, &order, item, &totals));
                }
            }
        }

        rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        report.rows_emitted = rows.len();

        info!(
            rows = report.rows_emitted,
            customers_skipped = report.customers_skipped,
            orders_skipped = report.orders_skipped,
            items_skipped = report.items_skipped,
            "flattened customer records"
        );

        (rows, report)
    }

    fn emit(
        &self,
        customer: &ValidCustomer<'_>,
        order: &ValidOrder<'_>,
        item: &PricedItem<'_>,
        totals: &OrderTotals<'_>,
    ) -> OutputRow {
        OutputRow {
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            registration_date: customer.registration_date,
            is_vip: customer.is_vip,
            order_id: order.order_id,
            order_date: order.order_date,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            category: self
                .categories
                .resolve(item.record.category.as_ref())
                .to_string(),
            unit_price: item.unit_price,
            item_quantity: item.quantity,
            total_item_price: item.total_item_price,
            total_order_value_percentage: totals.percentage_of(item.total_item_price),
        }
    }
}

impl Default for FlatteningTransformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten with the standard category table
pub fn flatten(vip_ids: &HashSet<i64>, customers: &[CustomerRecord]) -> Vec<OutputRow> {
    flatten_with_report(vip_ids, customers).0
}

pub fn flatten_with_report(
    vip_ids: &HashSet<i64>,
    customers: &[CustomerRecord],
) -> (Vec<OutputRow>, FlattenReport) {
    FlatteningTransformer::new().flatten(vip_ids, customers)
}
