// 🧾 Record Model - raw customer → order → item input
// Fields stay loosely typed so every coercion happens in the transformer

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ============================================================================
// NESTED ENTRIES
// ============================================================================

/// One element of a nested `orders` / `items` list
///
/// Anything that is not a well-formed object is kept as `Malformed` so the
/// transformer can skip that unit alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Record(T),
    Malformed(Value),
}

impl<T: DeserializeOwned> Entry<T> {
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            return Entry::Malformed(value);
        }
        match serde_json::from_value(value.clone()) {
            Ok(record) => Entry::Record(record),
            Err(_) => Entry::Malformed(value),
        }
    }
}

impl<T> Entry<T> {
    pub fn as_record(&self) -> Option<&T> {
        match self {
            Entry::Record(record) => Some(record),
            Entry::Malformed(_) => None,
        }
    }
}

impl<T> From<T> for Entry<T> {
    fn from(record: T) -> Self {
        Entry::Record(record)
    }
}

// ============================================================================
// RAW RECORDS
// ============================================================================

/// CustomerRecord - one customer as delivered by the loader
///
/// Missing and `null` scalar fields are both `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerRecord {
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub name: Option<Value>,

    #[serde(default)]
    pub registration_date: Option<Value>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub orders: Vec<Entry<OrderRecord>>,
}

/// OrderRecord - exists only nested inside its customer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderRecord {
    #[serde(default)]
    pub order_id: Option<Value>,

    #[serde(default)]
    pub order_date: Option<Value>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<Entry<ItemRecord>>,
}

/// ItemRecord - one line item of an order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub item_id: Option<Value>,

    #[serde(default)]
    pub product_name: Option<Value>,

    #[serde(default)]
    pub category: Option<Value>,

    #[serde(default)]
    pub price: Option<Value>,

    #[serde(default)]
    pub quantity: Option<Value>,
}

impl ItemRecord {
    /// Names of the fields every item must carry (present and non-null)
    pub const REQUIRED_FIELDS: [&'static str; 5] =
        ["item_id", "product_name", "category", "price", "quantity"];

    /// First required field that is missing or null, if any
    pub fn first_missing_field(&self) -> Option<&'static str> {
        let fields = [
            &self.item_id,
            &self.product_name,
            &self.category,
            &self.price,
            &self.quantity,
        ];

        fields
            .iter()
            .zip(Self::REQUIRED_FIELDS)
            .find(|(value, _)| value.is_none())
            .map(|(_, name)| name)
    }
}

// `null` reads the same as an absent key; a non-list is one malformed entry
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<Entry<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values.into_iter().map(Entry::from_value).collect(),
        Some(other) => vec![Entry::Malformed(other)],
    })
}
