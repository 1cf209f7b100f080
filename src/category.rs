// 🏷️ Category Map - fixed product category labels
//
// "Category code is a KEY, category label is a VALUE"
// The table never changes for the lifetime of the process.

use serde_json::Value;

/// Label used for any code the table does not know (or no code at all)
pub const FALLBACK_CATEGORY: &str = "Misc";

/// Immutable code → label table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMap {
    entries: &'static [(i64, &'static str)],
}

/// The process-wide category table
pub const CATEGORY_MAP: CategoryMap = CategoryMap {
    entries: &[
        (1, "Electronics"),
        (2, "Apparel"),
        (3, "Books"),
        (4, "Home Goods"),
    ],
};

impl CategoryMap {
    /// Label for a known code
    pub fn get(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, label)| *label)
    }

    /// Resolve a raw category value, falling back to "Misc"
    ///
    /// Only integral numbers are codes: `2` and `2.0` are Apparel,
    /// `"2"` is not a code and lands in Misc.
    pub fn resolve(&self, raw: Option<&Value>) -> &'static str {
        raw.and_then(category_code)
            .and_then(|code| self.get(code))
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        CATEGORY_MAP
    }
}

fn category_code(raw: &Value) -> Option<i64> {
    let Value::Number(number) = raw else {
        return None;
    };
    if let Some(code) = number.as_i64() {
        return Some(code);
    }
    let f = number.as_f64()?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
