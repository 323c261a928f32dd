//! PlaceOrder command handler
//!
//! Validates the restaurant and every requested item against the catalog
//! data resolved by the manager, freezes prices into line item snapshots
//! and allocates the display number.

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::HashMap;

use crate::orders::availability::{check_item, check_minimum_order, check_restaurant};
use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use crate::pricing::{calculate_order_pricing, calculate_subtotal, price_item, PricingPolicy};
use shared::models::{MenuItem, Restaurant};
use shared::order::{
    DeliveryAddress, EventPayload, OrderEvent, OrderItemInput, PaymentMethod,
};

/// PlaceOrder action
#[derive(Debug, Clone)]
pub struct PlaceOrderAction {
    /// Pre-generated order id (the manager locks on it)
    pub order_id: String,
    pub customer_id: String,
    pub restaurant_id: String,
    pub items: Vec<OrderItemInput>,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<DeliveryAddress>,
    pub special_instructions: Option<String>,
    pub tip: f64,
    pub discount: f64,
    /// Catalog state resolved before the transaction
    pub restaurant: Option<Restaurant>,
    pub menu_items: HashMap<String, MenuItem>,
    pub policy: PricingPolicy,
    /// Placement instant in the business timezone
    pub placed_at: DateTime<Tz>,
}

/// Human-facing order number: `ORD{YYYYMMDD}{10000 + count}`
pub fn format_order_number(placed_at: &DateTime<Tz>, count: u64) -> String {
    format!("ORD{}{}", placed_at.format("%Y%m%d"), 10000 + count)
}

#[async_trait]
impl CommandHandler for PlaceOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Restaurant
        let restaurant = check_restaurant(&self.restaurant_id, self.restaurant.as_ref())?;

        // 2. Order must be new
        if ctx.load_snapshot(&self.order_id).is_ok() {
            return Err(OrderError::Validation(format!(
                "Order already exists: {}",
                self.order_id
            )));
        }

        if self.items.is_empty() {
            return Err(OrderError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }

        // 3. Availability and pricing per line
        let mut requested: HashMap<&str, u32> = HashMap::new();
        for input in &self.items {
            *requested.entry(input.menu_item_id.as_str()).or_default() += input.quantity;
        }

        let mut items = Vec::with_capacity(self.items.len());
        for input in &self.items {
            let menu_item = check_item(
                &self.restaurant_id,
                &input.menu_item_id,
                self.menu_items.get(&input.menu_item_id),
                requested[input.menu_item_id.as_str()],
                &self.placed_at,
            )?;
            items.push(price_item(menu_item, input, &self.policy)?);
        }

        // 4. Order totals
        check_minimum_order(restaurant, calculate_subtotal(&items))?;
        let pricing = calculate_order_pricing(
            &items,
            restaurant.delivery_fee,
            self.discount,
            self.tip,
            self.policy.tax_rate,
        )?;
        if !pricing.is_consistent() {
            return Err(OrderError::Validation(format!(
                "Inconsistent order pricing: {:?}",
                pricing
            )));
        }

        // 5. Display number (inside the transaction)
        let order_number = format_order_number(&self.placed_at, ctx.next_order_count()?);

        let seq = ctx.next_sequence();
        let event = OrderEvent::with_timestamp(
            seq,
            self.order_id.clone(),
            &metadata.operator,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            self.placed_at.timestamp_millis(),
            EventPayload::OrderPlaced {
                order_number,
                customer_id: self.customer_id.clone(),
                restaurant_id: self.restaurant_id.clone(),
                items,
                pricing,
                payment_method: self.payment_method,
                delivery_address: self.delivery_address.clone(),
                special_instructions: self.special_instructions.clone(),
            },
        );

        Ok(vec![event])
    }
}
