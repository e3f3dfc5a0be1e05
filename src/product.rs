//! Product line item data structure.
//!
//! The [`ProductLineItem`] is the unit of state the engine synchronizes.
//! Items are deduplicated by their normalized name: "Milk", "milk!!" and
//! "mílk" all normalize to `milk` and address the same line item.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A single line on a basket's shopping list.
///
/// `id` stays `None` until the remote authority assigns one; until then the
/// item is addressed by its locally generated `local_key`.
///
/// # Example
///
/// ```
/// use basketi_sync::ProductLineItem;
///
/// let item = ProductLineItem::new("Crème Fraîche");
/// assert_eq!(item.normalized_name, "creme fraiche");
/// assert_eq!(item.quantity, 1);
/// assert!(item.is_added);
/// assert!(item.id.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductLineItem {
    /// Authority-assigned id, `None` while the item is pending
    pub id: Option<String>,
    /// Stable local placeholder key, used to address pending items
    #[serde(default = "new_local_key")]
    pub local_key: String,
    /// Display name, first-seen casing preserved
    pub name: String,
    /// Derived from `name` on every construction/rename, never edited directly
    pub normalized_name: String,
    /// Always >= 1; clamped on every write
    pub quantity: u32,
    /// On the current list vs known-but-removed
    pub is_added: bool,
    /// Epoch millis of the last (re)add
    pub last_added_at: i64,
    /// How many times this item has been (re)added
    pub times_added: u64,
    /// Filled asynchronously by the remote classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn new_local_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl ProductLineItem {
    /// Create a new pending item (no authority id yet).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = normalize_name(&name);
        Self {
            id: None,
            local_key: new_local_key(),
            name,
            normalized_name,
            quantity: 1,
            is_added: true,
            last_added_at: epoch_millis(),
            times_added: 1,
            category: None,
        }
    }

    /// Key the engine addresses this item by: the authority id once
    /// assigned, the local placeholder before that.
    #[must_use]
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.local_key)
    }

    /// Reactivate a known-but-removed item: back on the list with
    /// quantity reset, a fresh timestamp and a bumped add counter.
    pub fn reactivate(&mut self) {
        self.is_added = true;
        self.quantity = 1;
        self.last_added_at = epoch_millis();
        self.times_added = self.times_added.saturating_add(1);
    }
}

/// Normalize a product name for deduplication.
///
/// Lowercases, strips diacritics (NFD decomposition, combining marks
/// dropped), keeps only letters/digits/spaces, and collapses whitespace.
/// Idempotent: `normalize_name(normalize_name(x)) == normalize_name(x)`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();

    stripped
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clamp a quantity to the minimum of 1.
#[must_use]
pub fn clamp_quantity(quantity: u32) -> u32 {
    quantity.max(1)
}

/// Current time as epoch millis.
pub(crate) fn epoch_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Normalized outgoing wire shape for a line item.
///
/// This is what the engine sends to the remote authority on every
/// mutation: just the fields the authority owns, quantity pre-clamped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub is_added: bool,
    pub quantity: u32,
}

impl From<&ProductLineItem> for ProductPayload {
    fn from(item: &ProductLineItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            is_added: item.is_added,
            quantity: clamp_quantity(item.quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_pending() {
        let item = ProductLineItem::new("Milk");
        assert!(item.id.is_none());
        assert!(!item.local_key.is_empty());
        assert_eq!(item.key(), item.local_key);
        assert_eq!(item.quantity, 1);
        assert!(item.is_added);
        assert_eq!(item.times_added, 1);
        assert!(item.last_added_at > 0);
    }

    #[test]
    fn test_key_prefers_authority_id() {
        let mut item = ProductLineItem::new("Milk");
        item.id = Some("42".to_string());
        assert_eq!(item.key(), "42");
    }

    #[test]
    fn test_normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize_name("Milk!!"), "milk");
        assert_eq!(normalize_name("  Whole   Milk  "), "whole milk");
        assert_eq!(normalize_name("eggs (12)"), "eggs 12");
    }

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize_name("Crème Fraîche"), "creme fraiche");
        assert_eq!(normalize_name("jalapeño"), "jalapeno");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in ["Milk!!", "Crème Fraîche", "  a  b  ", "ĆçÖ-123"] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn test_reactivate_resets_quantity_and_bumps_counter() {
        let mut item = ProductLineItem::new("Milk");
        item.is_added = false;
        item.quantity = 5;
        let before = item.last_added_at;

        item.reactivate();

        assert!(item.is_added);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.times_added, 2);
        assert!(item.last_added_at >= before);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(1), 1);
        assert_eq!(clamp_quantity(7), 7);
    }

    #[test]
    fn test_payload_clamps_quantity() {
        let mut item = ProductLineItem::new("Milk");
        item.quantity = 0;
        let payload = ProductPayload::from(&item);
        assert_eq!(payload.quantity, 1);
        assert!(payload.id.is_none());
    }

    #[test]
    fn test_serialize_round_trip_keeps_local_key() {
        let item = ProductLineItem::new("Milk");
        let json = serde_json::to_string(&item).unwrap();
        let back: ProductLineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.local_key, item.local_key);
        assert_eq!(back.normalized_name, "milk");
    }

    #[test]
    fn test_deserialize_without_local_key_generates_one() {
        let json = r#"{"id":"7","name":"Milk","normalizedName":"milk",
                       "quantity":1,"isAdded":true,"lastAddedAt":0,"timesAdded":1}"#;
        let item: ProductLineItem = serde_json::from_str(json).unwrap();
        assert!(!item.local_key.is_empty());
        assert_eq!(item.key(), "7");
    }
}
