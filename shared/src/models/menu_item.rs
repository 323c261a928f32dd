//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Time-of-day window, `HH:MM` on both ends, inclusive
///
/// `start > end` spans midnight (e.g. 22:00 - 02:00).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Availability flags of a menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemAvailability {
    pub is_available: bool,
    /// Remaining stock; None = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,
    /// Lowercase weekday names ("monday", ...); empty = every day
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_days: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_time: Option<TimeWindow>,
}

impl Default for ItemAvailability {
    fn default() -> Self {
        Self {
            is_available: true,
            available_quantity: None,
            available_days: Vec::new(),
            available_time: None,
        }
    }
}

/// One option inside a customization group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomizationOption {
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

/// Customization group (e.g. "Size" with Small/Large)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customization {
    pub name: String,
    pub options: Vec<CustomizationOption>,
}

/// Add-on priced per unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddOn {
    pub name: String,
    pub price: f64,
}

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
    #[serde(default)]
    pub availability: ItemAvailability,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customizations: Vec<Customization>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_ons: Vec<AddOn>,
}

impl MenuItem {
    pub fn find_option(&self, group: &str, option: &str) -> Option<&CustomizationOption> {
        self.customizations
            .iter()
            .find(|c| c.name == group)?
            .options
            .iter()
            .find(|o| o.name == option)
    }

    pub fn find_add_on(&self, name: &str) -> Option<&AddOn> {
        self.add_ons.iter().find(|a| a.name == name)
    }
}
