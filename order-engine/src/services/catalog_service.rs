//! Catalog Service - restaurants and menu items with in-memory caching
//!
//! Read-mostly lookups for order placement plus the only writes the engine
//! makes to the catalog: stock reservation and restoration.

use parking_lot::RwLock;
use shared::models::{MenuItem, Restaurant};
use std::collections::HashMap;
use thiserror::Error;

/// Stock adjustment for one menu item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub menu_item_id: String,
    pub quantity: u32,
}

impl StockLine {
    pub fn new(menu_item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        menu_item_id: String,
        name: String,
        requested: u32,
        available: u32,
    },
}

/// In-memory catalog
#[derive(Debug, Default)]
pub struct CatalogService {
    restaurants: RwLock<HashMap<String, Restaurant>>,
    menu_items: RwLock<HashMap<String, MenuItem>>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Restaurants ==========

    pub fn upsert_restaurant(&self, restaurant: Restaurant) {
        self.restaurants
            .write()
            .insert(restaurant.id.clone(), restaurant);
    }

    pub fn get_restaurant(&self, id: &str) -> Option<Restaurant> {
        self.restaurants.read().get(id).cloned()
    }

    /// Owner of a restaurant (used by the authorization policy)
    pub fn restaurant_owner(&self, id: &str) -> Option<String> {
        self.restaurants.read().get(id).map(|r| r.owner_id.clone())
    }

    // ========== Menu Items ==========

    pub fn upsert_menu_item(&self, item: MenuItem) {
        self.menu_items.write().insert(item.id.clone(), item);
    }

    pub fn get_menu_item(&self, id: &str) -> Option<MenuItem> {
        self.menu_items.read().get(id).cloned()
    }

    /// Batch lookup; missing ids are simply absent from the result
    pub fn get_menu_items_batch(&self, ids: &[String]) -> HashMap<String, MenuItem> {
        let items = self.menu_items.read();
        ids.iter()
            .filter_map(|id| items.get(id).map(|item| (id.clone(), item.clone())))
            .collect()
    }

    pub fn list_menu_items(&self, restaurant_id: &str) -> Vec<MenuItem> {
        let mut result: Vec<MenuItem> = self
            .menu_items
            .read()
            .values()
            .filter(|item| item.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// Remaining stock (None = unlimited or unknown item)
    pub fn available_quantity(&self, id: &str) -> Option<u32> {
        self.menu_items
            .read()
            .get(id)
            .and_then(|item| item.availability.available_quantity)
    }

    // ========== Stock ==========

    /// Reserve stock for all lines, or none at all
    ///
    /// Lines for the same item are summed before checking. The whole check
    /// and decrement happen under one write lock, so two concurrent orders
    /// for the last unit cannot both succeed.
    pub fn reserve_stock(&self, lines: &[StockLine]) -> Result<(), CatalogError> {
        let requested = merge_lines(lines);
        let mut items = self.menu_items.write();

        for (id, quantity) in &requested {
            let item = items
                .get(id)
                .ok_or_else(|| CatalogError::MenuItemNotFound(id.clone()))?;
            if let Some(available) = item.availability.available_quantity
                && available < *quantity
            {
                return Err(CatalogError::InsufficientStock {
                    menu_item_id: id.clone(),
                    name: item.name.clone(),
                    requested: *quantity,
                    available,
                });
            }
        }

        for (id, quantity) in &requested {
            if let Some(item) = items.get_mut(id)
                && let Some(available) = item.availability.available_quantity.as_mut()
            {
                *available -= quantity;
            }
        }

        Ok(())
    }

    /// Give back previously reserved stock
    ///
    /// Items without a tracked quantity, or no longer in the catalog, are skipped.
    pub fn restore_stock(&self, lines: &[StockLine]) {
        let mut items = self.menu_items.write();
        for (id, quantity) in merge_lines(lines) {
            match items.get_mut(&id) {
                Some(item) => {
                    if let Some(available) = item.availability.available_quantity.as_mut() {
                        *available = available.saturating_add(quantity);
                    }
                }
                None => {
                    tracing::warn!(menu_item_id = %id, quantity, "Cannot restore stock: menu item gone");
                }
            }
        }
    }
}

fn merge_lines(lines: &[StockLine]) -> Vec<(String, u32)> {
    let mut merged: Vec<(String, u32)> = Vec::new();
    for line in lines {
        match merged.iter_mut().find(|(id, _)| *id == line.menu_item_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
            None => merged.push((line.menu_item_id.clone(), line.quantity)),
        }
    }
    merged
}
