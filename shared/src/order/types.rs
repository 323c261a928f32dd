//! Shared types for order event sourcing

use super::snapshot::OrderStatus;
use serde::{Deserialize, Serialize};

// ============================================================================
// Actors
// ============================================================================

/// Role of the actor issuing a command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    RestaurantOwner,
    DeliveryPartner,
    Admin,
    /// Engine-internal actor (payment completion, compensation)
    System,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRole::Customer => write!(f, "customer"),
            ActorRole::RestaurantOwner => write!(f, "restaurant_owner"),
            ActorRole::DeliveryPartner => write!(f, "delivery_partner"),
            ActorRole::Admin => write!(f, "admin"),
            ActorRole::System => write!(f, "system"),
        }
    }
}

/// Actor issuing a command (already authenticated by the surrounding service)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    /// Engine-internal actor used for events the engine emits on its own
    pub fn system() -> Self {
        Self::new("system", "System", ActorRole::System)
    }
}

// ============================================================================
// Payment Types
// ============================================================================

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    Wallet,
    CashOnDelivery,
}

impl PaymentMethod {
    /// Whether this method is charged through the payment gateway
    pub fn requires_gateway(&self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::Wallet => write!(f, "wallet"),
            PaymentMethod::CashOnDelivery => write!(f, "cash_on_delivery"),
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Opaque payment details forwarded to the gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PaymentDetails {
    /// Tokenized card reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_token: Option<String>,
    /// UPI virtual payment address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    /// Wallet provider name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_provider: Option<String>,
}

/// Payment info carried by the order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<f64>,
}

impl PaymentInfo {
    pub fn pending(method: PaymentMethod) -> Self {
        Self {
            method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            gateway: None,
            paid_at: None,
            refunded_at: None,
            refund_amount: None,
        }
    }
}

// ============================================================================
// Item Types
// ============================================================================

/// Customization selection as requested by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomizationSelection {
    /// Customization group name (e.g. "Size")
    pub name: String,
    /// Selected option names within the group
    pub options: Vec<String>,
}

/// Add-on selection as requested by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddOnSelection {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Order item input - menu item reference plus selections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub menu_item_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<CustomizationSelection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_ons: Vec<AddOnSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

impl OrderItemInput {
    pub fn new(menu_item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            quantity,
            customizations: Vec::new(),
            add_ons: Vec::new(),
            special_instructions: None,
        }
    }
}

/// Resolved customization option with its price snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedCustomization {
    pub name: String,
    pub option: String,
    pub price: f64,
}

/// Resolved add-on with its price snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedAddOn {
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// Line item snapshot - frozen at placement time
///
/// Never recomputed from the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemSnapshot {
    pub menu_item_id: String,
    /// Name snapshot
    pub name: String,
    /// Catalog base price at placement time
    pub base_price: f64,
    /// base + customizations + add-ons
    pub unit_price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<SelectedCustomization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_ons: Vec<SelectedAddOn>,
    /// unit_price * quantity
    pub item_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

// ============================================================================
// Pricing
// ============================================================================

/// Order-level pricing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderPricing {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub tax: f64,
    pub discount: f64,
    pub tip: f64,
    pub total: f64,
}

impl OrderPricing {
    /// `total == subtotal + delivery_fee + tax - discount + tip`, all parts non-negative
    ///
    /// Compared in cents to avoid float drift.
    pub fn is_consistent(&self) -> bool {
        let cents = |v: f64| (v * 100.0).round() as i64;
        let parts = [
            self.subtotal,
            self.delivery_fee,
            self.tax,
            self.discount,
            self.tip,
            self.total,
        ];
        if parts.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return false;
        }
        cents(self.subtotal) + cents(self.delivery_fee) + cents(self.tax) - cents(self.discount)
            + cents(self.tip)
            == cents(self.total)
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Delivery address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Delivery timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeliveryInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<DeliveryAddress>,
    /// Set when the order is confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_time: Option<i64>,
    /// Set when the order goes out for delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_arrival_time: Option<i64>,
    /// Set when the order is delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_delivery_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_person_id: Option<String>,
}

// ============================================================================
// History, Cancellation, Rating
// ============================================================================

/// Status history entry (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub actor_id: String,
    pub actor_role: ActorRole,
}

/// Cancellation record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationInfo {
    pub reason: String,
    pub cancelled_by: String,
    pub actor_role: ActorRole,
    pub previous_status: OrderStatus,
    pub refund_amount: f64,
    pub cancelled_at: i64,
}

/// Rating input (scores 1..=5)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingInput {
    pub food: u8,
    pub delivery: u8,
    pub overall: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Rating stored on the order, immutable once set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderRating {
    pub food: u8,
    pub delivery: u8,
    pub overall: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub rated_at: i64,
}

// ============================================================================
// Command Response
// ============================================================================

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// The command ID this responds to
    pub command_id: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Order ID affected (new order ID for PlaceOrder)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Error details if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn success(command_id: String, order_id: Option<String>) -> Self {
        Self {
            command_id,
            success: true,
            order_id,
            error: None,
        }
    }

    pub fn error(command_id: String, error: CommandError) -> Self {
        Self {
            command_id,
            success: false,
            order_id: None,
            error: Some(error),
        }
    }

    pub fn duplicate(command_id: String) -> Self {
        Self {
            command_id,
            success: true,
            order_id: None,
            error: None,
        }
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    /// Bad input, illegal transition, minimum order unmet, already rated
    ValidationFailed,
    /// Restaurant, menu item or order absent
    NotFound,
    /// Actor lacks rights
    PermissionDenied,
    /// Gateway declined or errored
    PaymentFailed,
    InternalError,
    StorageFull,
    OutOfMemory,
    StorageCorrupted,
    SystemBusy,
}
