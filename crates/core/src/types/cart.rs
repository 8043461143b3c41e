//! Cart collection and its merge rules.
//!
//! The cart holds at most one line per product ID. Adding a product that is
//! already present bumps its quantity and leaves every other field of the
//! existing line untouched, so a price change in the catalog does not reach
//! a line that is already in the cart.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::product::Product;
use super::quantity::{Quantity, QuantityError};

/// One product in the cart with its quantity.
///
/// Serialized as the product record with a `quantity` field added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: Quantity,
}

impl CartLine {
    /// Create a line with quantity one.
    #[must_use]
    pub fn new(mut product: Product) -> Self {
        // A stray `quantity` column would be serialized twice.
        product.extra.remove("quantity");
        Self {
            product,
            quantity: Quantity::ONE,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Result of adding a product to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAddOutcome {
    /// A new line was created with quantity one.
    Inserted,
    /// An existing line's quantity was increased.
    Incremented { quantity: Quantity },
}

/// Result of setting a line's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// The line now has the given quantity.
    Updated { quantity: Quantity },
    /// A zero or negative quantity was requested; the line was removed if it existed.
    Removed { was_present: bool },
    /// No line with that ID; nothing changed.
    NotInCart,
}

/// Totals shown next to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    /// Number of distinct lines.
    pub line_count: usize,
    /// Sum of all quantities.
    pub item_count: u64,
    /// Sum of price times quantity.
    pub subtotal: Price,
}

/// The cart collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if the existing line cannot grow;
    /// the cart is left unchanged.
    pub fn add(&mut self, product: Product) -> Result<CartAddOutcome, QuantityError> {
        if let Some(line) = self.lines.iter_mut().find(|line| line.id() == product.id) {
            line.quantity = line.quantity.incremented()?;
            return Ok(CartAddOutcome::Incremented {
                quantity: line.quantity,
            });
        }
        self.lines.push(CartLine::new(product));
        Ok(CartAddOutcome::Inserted)
    }

    /// Remove the line for `id`. Returns whether a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id() != id);
        self.lines.len() != before
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Zero or negative requests remove the line.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::TooLarge` if `requested` exceeds `u32::MAX`;
    /// the cart is left unchanged.
    pub fn set_quantity(
        &mut self,
        id: ProductId,
        requested: i64,
    ) -> Result<QuantityOutcome, QuantityError> {
        let Some(quantity) = Quantity::from_requested(requested)? else {
            return Ok(QuantityOutcome::Removed {
                was_present: self.remove(id),
            });
        };
        match self.lines.iter_mut().find(|line| line.id() == id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(QuantityOutcome::Updated { quantity })
            }
            None => Ok(QuantityOutcome::NotInCart),
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Take the quantities in `ordered` out of this cart.
    ///
    /// Lines that reach zero are removed. Units added after `ordered` was
    /// captured, and lines it does not list, stay in the cart.
    pub fn remove_ordered(&mut self, ordered: &Self) {
        let mut emptied = Vec::new();
        for placed in &ordered.lines {
            if let Some(line) = self.lines.iter_mut().find(|line| line.id() == placed.id()) {
                let remaining = line.quantity.get().saturating_sub(placed.quantity.get());
                match Quantity::new(remaining) {
                    Some(quantity) => line.quantity = quantity,
                    None => emptied.push(placed.id()),
                }
            }
        }
        self.lines.retain(|line| !emptied.contains(&line.id()));
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            line_count: self.lines.len(),
            item_count: self
                .lines
                .iter()
                .map(|line| u64::from(line.quantity.get()))
                .sum(),
            subtotal: self.lines.iter().map(CartLine::line_total).sum(),
        }
    }
}
