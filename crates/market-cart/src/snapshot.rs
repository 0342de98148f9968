//! Persisted snapshot codec.
//!
//! A snapshot is the whole cart as a JSON array of flat line objects.

use crate::cart::Cart;
use crate::error::CartError;

/// Serialize the full cart.
pub fn encode(cart: &Cart) -> Result<String, CartError> {
    Ok(serde_json::to_string(cart)?)
}

/// Parse a stored snapshot, normalizing it into a valid cart.
pub fn decode(raw: &str) -> Result<Cart, CartError> {
    Ok(serde_json::from_str(raw)?)
}
