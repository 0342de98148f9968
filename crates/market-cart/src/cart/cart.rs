//! The cart value.
//!
//! A [`Cart`] is never edited in place. Each change derives a complete new
//! cart from the current one, which the store then publishes as a whole.

use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::cart::{CartLine, Item};
use crate::ids::ProductId;

/// Ordered collection of cart lines, unique by id.
///
/// Existing lines keep their position; new lines are appended.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from raw lines, restoring the cart invariants.
    ///
    /// Lines with quantity 0 or item data breaking the catalog contract are
    /// dropped, and a repeated id is folded into its first occurrence by
    /// summing quantities.
    pub fn from_lines(raw: Vec<CartLine>) -> Self {
        let raw_len = raw.len();
        let mut lines: Vec<CartLine> = Vec::with_capacity(raw_len);

        for line in raw {
            if line.quantity == 0 {
                continue;
            }
            if let Err(e) = line.validate() {
                warn!(error = %e, "dropping invalid cart line");
                continue;
            }
            match lines.iter_mut().find(|l| l.id == line.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => lines.push(line),
            }
        }

        if lines.len() != raw_len {
            warn!(
                raw = raw_len,
                kept = lines.len(),
                "normalized cart lines with zero quantity, invalid items or duplicate ids"
            );
        }
        Self { lines }
    }

    /// Lines in cart order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Iterate over the lines in cart order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartLine> {
        self.lines.iter()
    }

    /// Get the line for an item.
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == id)
    }

    /// Check if the cart holds a line for `id`.
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Quantity held for `id`, 0 when absent.
    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.get(id).map_or(0, |l| l.quantity)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total item count (sum of quantities).
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// The cart after adding one unit of `item`.
    ///
    /// An item already in the cart is incremented; otherwise a line with
    /// quantity 1 is appended.
    pub fn with_added(&self, item: &Item) -> Self {
        if let Some(next) = self.with_incremented(&item.id) {
            return next;
        }
        let mut lines = self.lines.clone();
        lines.push(CartLine::from_item(item));
        Self { lines }
    }

    /// The cart with one more unit of `id`, or `None` if no line matches.
    pub fn with_incremented(&self, id: &ProductId) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let lines = self
            .lines
            .iter()
            .map(|l| {
                if &l.id == id {
                    l.with_quantity(l.quantity.saturating_add(1))
                } else {
                    l.clone()
                }
            })
            .collect();
        Some(Self { lines })
    }

    /// The cart with one unit of `id` fewer, or `None` if no line matches.
    ///
    /// A line that reaches zero is removed, not kept at zero.
    pub fn with_decremented(&self, id: &ProductId) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let lines = self
            .lines
            .iter()
            .map(|l| {
                if &l.id == id {
                    l.with_quantity(l.quantity.saturating_sub(1))
                } else {
                    l.clone()
                }
            })
            .filter(|l| l.quantity > 0)
            .collect();
        Some(Self { lines })
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self::from_lines(lines)
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.lines.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item::new(id, format!("Item {id}"), format!("https://img/{id}.png"), 10.0).unwrap()
    }

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine {
            quantity,
            ..CartLine::from_item(&item(id))
        }
    }

    #[test]
    fn test_add_appends_new_line() {
        let cart = Cart::new().with_added(&item("a")).with_added(&item("b"));

        let ids: Vec<&str> = cart.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_same_item_increases_quantity() {
        let cart = Cart::new()
            .with_added(&item("a"))
            .with_added(&item("b"))
            .with_added(&item("a"));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(&"a".into()), 2);
        assert_eq!(cart.lines()[0].id.as_str(), "a");
    }

    #[test]
    fn test_increment_only_touches_matching_line() {
        let cart = Cart::from_lines(vec![line("a", 1), line("b", 5)]);
        let next = cart.with_incremented(&"b".into()).unwrap();

        assert_eq!(next.quantity_of(&"a".into()), 1);
        assert_eq!(next.quantity_of(&"b".into()), 6);
        // The source cart is untouched.
        assert_eq!(cart.quantity_of(&"b".into()), 5);
    }

    #[test]
    fn test_decrement_removes_line_at_zero() {
        let cart = Cart::from_lines(vec![line("a", 1), line("b", 2)]);
        let next = cart.with_decremented(&"a".into()).unwrap();

        assert!(!next.contains(&"a".into()));
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_increment_decrement_are_inverse() {
        let cart = Cart::from_lines(vec![line("a", 3)]);
        let id = ProductId::new("a");

        let down_up = cart
            .with_decremented(&id)
            .and_then(|c| c.with_incremented(&id))
            .unwrap();
        let up_down = cart
            .with_incremented(&id)
            .and_then(|c| c.with_decremented(&id))
            .unwrap();

        assert_eq!(down_up, cart);
        assert_eq!(up_down, cart);
    }

    #[test]
    fn test_unknown_id_is_none() {
        let cart = Cart::from_lines(vec![line("a", 1)]);
        assert!(cart.with_incremented(&"nonexistent".into()).is_none());
        assert!(cart.with_decremented(&"nonexistent".into()).is_none());
    }

    #[test]
    fn test_increment_saturates() {
        let cart = Cart::from_lines(vec![line("a", u32::MAX)]);
        let next = cart.with_incremented(&"a".into()).unwrap();
        assert_eq!(next.quantity_of(&"a".into()), u32::MAX);
    }

    #[test]
    fn test_from_lines_drops_invalid_items() {
        let nameless = CartLine {
            id: ProductId::new(""),
            ..line("x", 1)
        };
        let negative = CartLine {
            price: -1.0,
            ..line("n", 2)
        };
        let cart = Cart::from_lines(vec![nameless, line("a", 1), negative]);

        let ids: Vec<&str> = cart.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a"]);
    }

    #[test]
    fn test_from_lines_normalizes() {
        let cart = Cart::from_lines(vec![line("a", 2), line("z", 0), line("b", 1), line("a", 3)]);

        let ids: Vec<&str> = cart.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(cart.quantity_of(&"a".into()), 5);
    }
}
