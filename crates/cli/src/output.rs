//! Terminal output. Logs go to stderr; everything here goes to stdout.

#![allow(clippy::print_stdout)]

use watchshop_core::{Cart, CartSummary, CurrencyCode, Favorites, OrderRecord};

pub fn message(text: &str) {
    println!("{text}");
}

pub fn cart(cart: &Cart, currency: CurrencyCode) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:>6}  {:<32} {:>4} x {:>14} = {:>14}",
            line.id().to_string(),
            line.product.name,
            line.quantity.to_string(),
            line.product.price.display(currency),
            line.line_total().display(currency),
        );
    }
    summary(&cart.summary(), currency);
}

pub fn summary(summary: &CartSummary, currency: CurrencyCode) {
    println!(
        "{} line(s), {} item(s), subtotal {}",
        summary.line_count,
        summary.item_count,
        summary.subtotal.display(currency)
    );
}

pub fn favorites(favorites: &Favorites, currency: CurrencyCode) {
    if favorites.is_empty() {
        println!("No favorites yet");
        return;
    }
    for entry in favorites.entries() {
        let details: Vec<&str> = [
            entry.category.as_deref(),
            entry.mechanism.as_deref(),
            entry.material.as_deref(),
            entry.water_resistance.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        println!(
            "{:>6}  {:<32} {:>14}  {}",
            entry.id.to_string(),
            entry.name,
            entry.price.display(currency),
            details.join(", ")
        );
    }
}

pub fn order_placed(order: &OrderRecord, currency: CurrencyCode) {
    println!(
        "Order {} placed: {} ({})",
        order.id,
        order.total.display(currency),
        order.status
    );
}

pub fn orders(orders: &[OrderRecord], currency: CurrencyCode) {
    if orders.is_empty() {
        println!("No orders yet");
        return;
    }
    for order in orders {
        println!(
            "{:>6}  {}  {:>14}  {}",
            order.id.to_string(),
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.total.display(currency),
            order.status
        );
    }
}
