//! Order Price Calculator
//!
//! Resolves client selections against the catalog and produces frozen line
//! item snapshots plus order-level pricing:
//!
//! ```text
//! unit_price = base + Σ option.price + Σ add_on.price × add_on.quantity
//! item_total = unit_price × quantity
//! subtotal   = Σ item_total
//! tax        = subtotal × tax_rate
//! total      = subtotal + delivery_fee + tax - discount + tip
//! ```

use crate::orders::money::{round_money, to_decimal, to_f64, validate_amount, validate_quantity};
use crate::orders::traits::OrderError;
use rust_decimal::prelude::*;
use shared::models::MenuItem;
use shared::order::{
    OrderItemInput, OrderItemSnapshot, OrderPricing, SelectedAddOn, SelectedCustomization,
};

/// Pricing knobs taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    /// Fraction, e.g. 0.08
    pub tax_rate: Decimal,
    /// Reject unknown customization / add-on names instead of ignoring them
    pub strict_selections: bool,
}

impl PricingPolicy {
    pub fn new(tax_rate_percent: u32, strict_selections: bool) -> Self {
        Self {
            tax_rate: Decimal::from(tax_rate_percent) / Decimal::ONE_HUNDRED,
            strict_selections,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::new(8, true)
    }
}

/// Unit price from a base price and resolved selections
pub fn calculate_unit_price(
    base_price: f64,
    customizations: &[SelectedCustomization],
    add_ons: &[SelectedAddOn],
) -> Decimal {
    let options: Decimal = customizations.iter().map(|c| to_decimal(c.price)).sum();
    let extras: Decimal = add_ons
        .iter()
        .map(|a| to_decimal(a.price) * Decimal::from(a.quantity))
        .sum();
    to_decimal(base_price) + options + extras
}

/// Resolve one requested line against its menu item
///
/// The caller has already checked that `menu_item` is the item requested.
pub fn price_item(
    menu_item: &MenuItem,
    input: &OrderItemInput,
    policy: &PricingPolicy,
) -> Result<OrderItemSnapshot, OrderError> {
    validate_quantity(input.quantity, "quantity")?;

    let mut customizations = Vec::new();
    for selection in &input.customizations {
        for option_name in &selection.options {
            match menu_item.find_option(&selection.name, option_name) {
                Some(option) => customizations.push(SelectedCustomization {
                    name: selection.name.clone(),
                    option: option.name.clone(),
                    price: option.price,
                }),
                None if policy.strict_selections => {
                    return Err(OrderError::Validation(format!(
                        "Unknown customization '{}: {}' for {}",
                        selection.name, option_name, menu_item.name
                    )));
                }
                None => {
                    tracing::debug!(
                        menu_item_id = %menu_item.id,
                        customization = %selection.name,
                        option = %option_name,
                        "Ignoring unknown customization"
                    );
                }
            }
        }
    }

    let mut add_ons = Vec::new();
    for selection in &input.add_ons {
        validate_quantity(selection.quantity, "add-on quantity")?;
        match menu_item.find_add_on(&selection.name) {
            Some(add_on) => add_ons.push(SelectedAddOn {
                name: add_on.name.clone(),
                price: add_on.price,
                quantity: selection.quantity,
            }),
            None if policy.strict_selections => {
                return Err(OrderError::Validation(format!(
                    "Unknown add-on '{}' for {}",
                    selection.name, menu_item.name
                )));
            }
            None => {
                tracing::debug!(
                    menu_item_id = %menu_item.id,
                    add_on = %selection.name,
                    "Ignoring unknown add-on"
                );
            }
        }
    }

    let unit = calculate_unit_price(menu_item.price, &customizations, &add_ons);
    let item_total = unit * Decimal::from(input.quantity);

    Ok(OrderItemSnapshot {
        menu_item_id: menu_item.id.clone(),
        name: menu_item.name.clone(),
        base_price: menu_item.price,
        unit_price: to_f64(unit),
        quantity: input.quantity,
        customizations,
        add_ons,
        item_total: to_f64(item_total),
        special_instructions: input.special_instructions.clone(),
    })
}

/// Subtotal of already priced items
pub fn calculate_subtotal(items: &[OrderItemSnapshot]) -> Decimal {
    items.iter().map(|i| to_decimal(i.item_total)).sum()
}

/// Order-level pricing
///
/// Fails with `Validation` when tip or discount are invalid or the discount
/// exceeds what the order is worth.
pub fn calculate_order_pricing(
    items: &[OrderItemSnapshot],
    delivery_fee: f64,
    discount: f64,
    tip: f64,
    tax_rate: Decimal,
) -> Result<OrderPricing, OrderError> {
    validate_amount(delivery_fee, "delivery_fee")?;
    validate_amount(discount, "discount")?;
    validate_amount(tip, "tip")?;

    let subtotal = round_money(calculate_subtotal(items));
    let delivery_fee = round_money(to_decimal(delivery_fee));
    let tax = round_money(subtotal * tax_rate);
    let discount = round_money(to_decimal(discount));
    let tip = round_money(to_decimal(tip));

    let gross = subtotal + delivery_fee + tax;
    if discount > gross {
        return Err(OrderError::Validation(format!(
            "Discount {} exceeds order value {}",
            discount, gross
        )));
    }

    Ok(OrderPricing {
        subtotal: to_f64(subtotal),
        delivery_fee: to_f64(delivery_fee),
        tax: to_f64(tax),
        discount: to_f64(discount),
        tip: to_f64(tip),
        total: to_f64(gross - discount + tip),
    })
}
