//! Shopping cart module.
//!
//! Contains the catalog item, the cart line and the immutable cart value.

mod cart;
mod item;

pub use cart::Cart;
pub use item::{CartLine, Item};
