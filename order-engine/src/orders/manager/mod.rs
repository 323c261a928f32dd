//! OrdersManager - Core command processing and event generation
//!
//! This module handles:
//! - Command validation and processing
//! - Event generation with global sequence numbers
//! - Persistence to redb (transactional)
//! - Payment orchestration with compensating rollback
//! - Event broadcasting and notification publishing
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 0. Acquire per-command lock (retries wait for the first attempt)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Authorize (actor, order, action)
//!     ├─ 3. Acquire per-order lock
//!     ├─ 4. process_command (one write transaction)
//!     │     ├─ action.execute → events
//!     │     ├─ EventApplier → snapshots
//!     │     ├─ reserve stock (placement only)
//!     │     └─ persist, mark processed, commit
//!     ├─ 5. Charge gateway (card / upi / wallet placements)
//!     │     └─ on failure: delete order, restore stock, PaymentFailed
//!     ├─ 6. Broadcast event(s)
//!     ├─ 7. Publish notifications, restore stock, submit review
//!     └─ 8. Return response
//! ```
//!
//! No write transaction is open while the gateway call is pending; the
//! per-order lock keeps every other command on the order waiting instead,
//! and queries skip the order until the charge settles.

mod error;
pub use error::*;

#[cfg(test)]
mod tests;

use super::actions::{
    CancelOrderAction, CommandAction, CompletePaymentAction, PlaceOrderAction, RateOrderAction,
    UpdateStatusAction,
};
use super::appliers::{replay, EventAction};
use super::storage::{OrderStorage, StorageError, StorageStats};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError};
use crate::auth::{authorize, AuthError, OrderAction, OrderResource};
use crate::core::Config;
use crate::message::EventPublisher;
use crate::pricing::PricingPolicy;
use crate::services::{
    charge_with_timeout, CatalogService, ChargeRequest, PaymentGateway, ReviewSink, StockLine,
};
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use shared::message::{
    order_topic, restaurant_topic, BusMessage, NotificationKind, OrderNotification,
};
use shared::models::ReviewRecord;
use shared::order::{
    Actor, ActorRole, CommandResponse, EventPayload, OrderCommand, OrderCommandPayload,
    OrderEvent, OrderSnapshot, OrderStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

/// Result of one committed write transaction
struct Committed {
    events: Vec<OrderEvent>,
    /// Snapshot of the targeted order after the events were applied
    snapshot: OrderSnapshot,
}

/// OrdersManager for command processing
pub struct OrdersManager {
    storage: OrderStorage,
    event_tx: broadcast::Sender<OrderEvent>,
    catalog: Arc<CatalogService>,
    gateway: Arc<dyn PaymentGateway>,
    publisher: Arc<dyn EventPublisher>,
    reviews: Arc<dyn ReviewSink>,
    config: Config,
    policy: PricingPolicy,
    /// One async mutex per order with a command in flight
    order_locks: DashMap<String, Arc<Mutex<()>>>,
    /// One async mutex per command id being executed
    command_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Orders committed but still waiting on the gateway
    in_flight: DashSet<String>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("gateway", &self.gateway)
            .field("locked_orders", &self.order_locks.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl OrdersManager {
    /// Create a new OrdersManager with the database under `config.work_dir`
    pub fn new(
        config: Config,
        catalog: Arc<CatalogService>,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
        reviews: Arc<dyn ReviewSink>,
    ) -> ManagerResult<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            ManagerError::Internal(format!(
                "Failed to create work dir {}: {}",
                config.work_dir, e
            ))
        })?;
        let storage = OrderStorage::open(config.db_path())?;
        tracing::info!(db_path = %config.db_path().display(), timezone = %config.timezone, "OrdersManager started");
        Ok(Self::with_storage(
            storage, config, catalog, gateway, publisher, reviews,
        ))
    }

    /// Create an OrdersManager with existing storage
    pub fn with_storage(
        storage: OrderStorage,
        config: Config,
        catalog: Arc<CatalogService>,
        gateway: Arc<dyn PaymentGateway>,
        publisher: Arc<dyn EventPublisher>,
        reviews: Arc<dyn ReviewSink>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let policy = PricingPolicy::new(config.tax_rate_percent, config.strict_selections);
        Self {
            storage,
            event_tx,
            catalog,
            gateway,
            publisher,
            reviews,
            config,
            policy,
            order_locks: DashMap::new(),
            command_locks: DashMap::new(),
            in_flight: DashSet::new(),
        }
    }

    /// Subscribe to committed events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========== Commands ==========

    /// Execute a command and return the response
    pub async fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        self.execute_command_with_events(cmd).await.0
    }

    /// Execute a command and return both the response and the committed events
    ///
    /// Events are broadcast internally as well; the returned copy is for
    /// callers that forward them somewhere else.
    pub async fn execute_command_with_events(
        &self,
        cmd: OrderCommand,
    ) -> (CommandResponse, Vec<OrderEvent>) {
        let command_id = cmd.command_id.clone();
        match self.dispatch(&cmd).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(command_id = %command_id, error = %err, "Command failed");
                (CommandResponse::error(command_id, err.into()), vec![])
            }
        }
    }

    async fn dispatch(&self, cmd: &OrderCommand) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, operator = %cmd.operator.id, payload = ?cmd.payload, "Processing command");

        let lock = keyed_lock(&self.command_locks, &cmd.command_id);
        let result = {
            let _guard = lock.lock().await;
            self.dispatch_locked(cmd).await
        };
        drop(lock);
        release_keyed_lock(&self.command_locks, &cmd.command_id);
        result
    }

    /// Idempotency check and routing, with the command lock held
    async fn dispatch_locked(
        &self,
        cmd: &OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        if self.storage.is_command_processed(&cmd.command_id)? {
            tracing::warn!(command_id = %cmd.command_id, "Duplicate command");
            return Ok((self.duplicate_response(&cmd.command_id)?, vec![]));
        }

        match &cmd.payload {
            OrderCommandPayload::PlaceOrder { .. } => self.place_order(cmd).await,
            _ => self.mutate_order(cmd).await,
        }
    }

    fn duplicate_response(&self, command_id: &str) -> ManagerResult<CommandResponse> {
        let mut response = CommandResponse::duplicate(command_id.to_string());
        response.order_id = self
            .storage
            .get_processed_command(command_id)?
            .filter(|id| !id.is_empty());
        Ok(response)
    }

    // ========== Placement ==========

    async fn place_order(
        &self,
        cmd: &OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        let OrderCommandPayload::PlaceOrder {
            customer_id,
            restaurant_id,
            ..
        } = &cmd.payload
        else {
            return Err(ManagerError::Internal("Expected a PlaceOrder command".into()));
        };

        let owner = self.catalog.restaurant_owner(restaurant_id);
        let resource = OrderResource {
            customer_id,
            restaurant_owner_id: owner.as_deref(),
            delivery_person_id: None,
        };
        authorize(&cmd.operator, &resource, OrderAction::Place)?;

        let order_id = uuid::Uuid::new_v4().to_string();
        let lock = keyed_lock(&self.order_locks, &order_id);
        self.in_flight.insert(order_id.clone());
        let result = {
            let _guard = lock.lock().await;
            self.place_order_locked(cmd, &order_id).await
        };
        // Already cleared on success; this covers the error paths
        self.in_flight.remove(&order_id);
        drop(lock);
        release_keyed_lock(&self.order_locks, &order_id);
        result
    }

    /// Placement with the order lock held, payment included
    async fn place_order_locked(
        &self,
        cmd: &OrderCommand,
        order_id: &str,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        let OrderCommandPayload::PlaceOrder {
            customer_id,
            restaurant_id,
            items,
            payment_method,
            payment_details,
            delivery_address,
            special_instructions,
            tip,
            discount,
        } = &cmd.payload
        else {
            return Err(ManagerError::Internal("Expected a PlaceOrder command".into()));
        };

        let menu_ids: Vec<String> = items.iter().map(|i| i.menu_item_id.clone()).collect();
        let action = PlaceOrderAction {
            order_id: order_id.to_string(),
            customer_id: customer_id.clone(),
            restaurant_id: restaurant_id.clone(),
            items: items.clone(),
            payment_method: *payment_method,
            delivery_address: delivery_address.clone(),
            special_instructions: special_instructions.clone(),
            tip: *tip,
            discount: *discount,
            restaurant: self.catalog.get_restaurant(restaurant_id),
            menu_items: self.catalog.get_menu_items_batch(&menu_ids),
            policy: self.policy,
            placed_at: Utc::now().with_timezone(&self.config.timezone),
        };
        let stock: Vec<StockLine> = items
            .iter()
            .map(|i| StockLine::new(i.menu_item_id.clone(), i.quantity))
            .collect();

        let metadata = command_metadata(cmd);
        let Some(placed) = self.process_command(
            &metadata,
            order_id,
            CommandAction::PlaceOrder(action),
            Some(&stock),
        )?
        else {
            return Ok((self.duplicate_response(&cmd.command_id)?, vec![]));
        };

        let mut events = placed.events;
        let mut snapshot = placed.snapshot;

        if payment_method.requires_gateway() {
            let request = ChargeRequest {
                order_id: order_id.to_string(),
                method: *payment_method,
                amount: snapshot.pricing.total,
                details: payment_details.clone(),
            };
            let timeout = Duration::from_millis(self.config.payment_timeout_ms);

            let receipt = match charge_with_timeout(self.gateway.as_ref(), request, timeout).await
            {
                Ok(receipt) => receipt,
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Payment failed, rolling back order");
                    self.compensate_placement(&cmd.command_id, order_id, &stock);
                    return Err(e.into());
                }
            };

            let payment_metadata = CommandMetadata {
                command_id: format!("{}:payment", cmd.command_id),
                operator: Actor::system(),
                timestamp: shared::util::now_millis(),
            };
            let action = CommandAction::CompletePayment(CompletePaymentAction {
                order_id: order_id.to_string(),
                transaction_id: receipt.transaction_id.clone(),
                gateway: receipt.gateway.clone(),
                amount: snapshot.pricing.total,
            });
            match self.process_command(&payment_metadata, order_id, action, None) {
                Ok(Some(paid)) => {
                    events.extend(paid.events);
                    snapshot = paid.snapshot;
                }
                Ok(None) => {
                    self.compensate_placement(&cmd.command_id, order_id, &stock);
                    return Err(ManagerError::Internal(format!(
                        "Payment command for order {} was already processed",
                        order_id
                    )));
                }
                Err(e) => {
                    tracing::error!(
                        order_id = %order_id,
                        transaction_id = %receipt.transaction_id,
                        error = %e,
                        "Charge succeeded but could not be recorded, rolling back order"
                    );
                    self.compensate_placement(&cmd.command_id, order_id, &stock);
                    return Err(e);
                }
            }
        }

        // Queries see the order from here on
        self.in_flight.remove(order_id);
        self.broadcast(&events);
        self.publish(
            restaurant_topic(&snapshot.restaurant_id),
            NotificationKind::NewOrder,
            &snapshot,
        );

        tracing::info!(
            command_id = %cmd.command_id,
            order_id = %order_id,
            order_number = %snapshot.order_number,
            total = snapshot.pricing.total,
            payment_method = %payment_method,
            "Order placed"
        );
        Ok((
            CommandResponse::success(cmd.command_id.clone(), Some(order_id.to_string())),
            events,
        ))
    }

    /// Undo a placement whose payment failed
    ///
    /// Deletes the order's events and snapshot, forgets the command id so the
    /// client may retry, then gives the reserved stock back. The stock is
    /// returned even if the delete fails; the caller reports the payment
    /// error either way.
    fn compensate_placement(&self, command_id: &str, order_id: &str, stock: &[StockLine]) {
        match self.remove_placement(command_id, order_id) {
            Ok(removed) => {
                tracing::info!(order_id = %order_id, removed_events = removed, "Placement rolled back");
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    command_id = %command_id,
                    error = %e,
                    "Failed to delete unpaid order"
                );
            }
        }
        self.catalog.restore_stock(stock);
    }

    fn remove_placement(&self, command_id: &str, order_id: &str) -> Result<usize, StorageError> {
        let txn = self.storage.begin_write()?;
        let removed = self.storage.remove_order(&txn, order_id)?;
        self.storage.unmark_command_processed(&txn, command_id)?;
        txn.commit()?;
        Ok(removed)
    }

    // ========== Transitions, cancellation, rating ==========

    async fn mutate_order(
        &self,
        cmd: &OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        let order_id = cmd
            .target_order_id()
            .ok_or_else(|| ManagerError::Internal("Command has no target order".into()))?
            .to_string();

        let lock = keyed_lock(&self.order_locks, &order_id);
        let result = {
            let _guard = lock.lock().await;
            self.mutate_order_locked(cmd, &order_id)
        };
        drop(lock);
        release_keyed_lock(&self.order_locks, &order_id);
        result
    }

    fn mutate_order_locked(
        &self,
        cmd: &OrderCommand,
        order_id: &str,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        let current = self
            .storage
            .get_snapshot(order_id)?
            .ok_or_else(|| OrderError::order_not_found(order_id))?;

        let (requested, action) = match &cmd.payload {
            OrderCommandPayload::UpdateStatus {
                status,
                note,
                delivery_person_id,
                ..
            } => {
                if cmd.operator.role == ActorRole::DeliveryPartner
                    && delivery_person_id
                        .as_deref()
                        .is_some_and(|id| id != cmd.operator.id)
                {
                    return Err(ManagerError::Authorization(
                        "delivery partners can only assign themselves".to_string(),
                    ));
                }
                (
                    OrderAction::UpdateStatus(*status),
                    CommandAction::UpdateStatus(UpdateStatusAction {
                        order_id: order_id.to_string(),
                        status: *status,
                        note: note.clone(),
                        delivery_person_id: delivery_person_id.clone(),
                        preparation_millis: self.config.preparation_millis(),
                        delivery_millis: self.config.delivery_millis(),
                    }),
                )
            }
            OrderCommandPayload::CancelOrder { reason, .. } => (
                OrderAction::Cancel,
                CommandAction::CancelOrder(CancelOrderAction {
                    order_id: order_id.to_string(),
                    reason: reason.clone(),
                }),
            ),
            OrderCommandPayload::RateOrder { rating, .. } => (
                OrderAction::Rate,
                CommandAction::RateOrder(RateOrderAction {
                    order_id: order_id.to_string(),
                    rating: rating.clone(),
                }),
            ),
            OrderCommandPayload::PlaceOrder { .. } => {
                return Err(ManagerError::Internal(
                    "PlaceOrder does not target an existing order".into(),
                ));
            }
        };
        self.authorize_order(&cmd.operator, &current, requested)?;

        let metadata = command_metadata(cmd);
        let Some(committed) = self.process_command(&metadata, order_id, action, None)? else {
            return Ok((self.duplicate_response(&cmd.command_id)?, vec![]));
        };

        self.broadcast(&committed.events);
        for event in &committed.events {
            self.after_commit(event, &committed.snapshot);
        }

        tracing::info!(
            command_id = %cmd.command_id,
            order_id = %order_id,
            status = %committed.snapshot.status,
            event_count = committed.events.len(),
            "Command processed successfully"
        );
        Ok((
            CommandResponse::success(cmd.command_id.clone(), Some(order_id.to_string())),
            committed.events,
        ))
    }

    /// Side effects of a committed event; failures are logged, never returned
    fn after_commit(&self, event: &OrderEvent, snapshot: &OrderSnapshot) {
        match &event.payload {
            EventPayload::StatusChanged { .. } => {
                self.publish(
                    order_topic(&snapshot.order_id),
                    NotificationKind::OrderStatusUpdated,
                    snapshot,
                );
            }
            EventPayload::OrderCancelled { stock_restored, .. } => {
                if *stock_restored {
                    self.catalog.restore_stock(&stock_lines(snapshot));
                }
                self.publish(
                    restaurant_topic(&snapshot.restaurant_id),
                    NotificationKind::OrderCancelled,
                    snapshot,
                );
                self.publish(
                    order_topic(&snapshot.order_id),
                    NotificationKind::OrderCancelled,
                    snapshot,
                );
            }
            EventPayload::OrderRated { rating } => {
                let record = ReviewRecord {
                    order_id: snapshot.order_id.clone(),
                    customer_id: snapshot.customer_id.clone(),
                    restaurant_id: snapshot.restaurant_id.clone(),
                    rating: rating.overall,
                    food_rating: rating.food,
                    delivery_rating: rating.delivery,
                    comment: rating.comment.clone(),
                    is_verified_purchase: true,
                    created_at: event.timestamp,
                };
                if let Err(e) = self.reviews.submit(record) {
                    tracing::warn!(order_id = %snapshot.order_id, error = %e, "Review submission failed");
                }
            }
            EventPayload::OrderPlaced { .. } | EventPayload::PaymentCompleted { .. } => {}
        }
    }

    // ========== Transaction ==========

    /// Run one action inside one write transaction
    ///
    /// Returns `None` when the command id turns out to be processed already.
    /// `reservation` is taken from the catalog after the action validated
    /// and given back if persisting or committing fails.
    fn process_command(
        &self,
        metadata: &CommandMetadata,
        order_id: &str,
        action: CommandAction,
        reservation: Option<&[StockLine]>,
    ) -> ManagerResult<Option<Committed>> {
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if self
            .storage
            .is_command_processed_txn(&txn, &metadata.command_id)?
        {
            return Ok(None);
        }

        let current_sequence = self.storage.get_current_sequence_txn(&txn)?;
        let mut ctx = CommandContext::new(&txn, &self.storage, current_sequence);

        let events = futures::executor::block_on(action.execute(&mut ctx, metadata))?;

        for event in &events {
            let mut snapshot = match ctx.load_snapshot(&event.order_id) {
                Ok(snapshot) => snapshot,
                Err(OrderError::NotFound(_)) => OrderSnapshot::new(event.order_id.clone()),
                Err(e) => return Err(e.into()),
            };
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
            ctx.save_snapshot(snapshot);
        }

        let snapshots: Vec<OrderSnapshot> = ctx.modified_snapshots().cloned().collect();
        drop(ctx);
        let snapshot = snapshots
            .iter()
            .find(|s| s.order_id == order_id)
            .cloned()
            .ok_or_else(|| {
                ManagerError::Internal(format!("Command produced no events for order {}", order_id))
            })?;

        if let Some(lines) = reservation {
            self.catalog.reserve_stock(lines)?;
        }

        let result = match self.persist(&txn, metadata, order_id, &events, &snapshots, current_sequence)
        {
            Ok(()) => txn
                .commit()
                .map_err(|e| ManagerError::from(StorageError::from(e))),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            if let Some(lines) = reservation {
                self.catalog.restore_stock(lines);
            }
            return Err(e);
        }

        Ok(Some(Committed { events, snapshot }))
    }

    fn persist(
        &self,
        txn: &redb::WriteTransaction,
        metadata: &CommandMetadata,
        order_id: &str,
        events: &[OrderEvent],
        snapshots: &[OrderSnapshot],
        current_sequence: u64,
    ) -> ManagerResult<()> {
        for event in events {
            self.storage.store_event(txn, event)?;
        }
        for snapshot in snapshots {
            self.storage.store_snapshot(txn, snapshot)?;
        }

        let max_sequence = events
            .iter()
            .map(|e| e.sequence)
            .max()
            .unwrap_or(current_sequence);
        if max_sequence > current_sequence {
            self.storage.set_sequence(txn, max_sequence)?;
        }

        self.storage
            .mark_command_processed(txn, &metadata.command_id, order_id)?;
        Ok(())
    }

    // ========== Broadcast / notifications ==========

    fn broadcast(&self, events: &[OrderEvent]) {
        for event in events {
            if self.event_tx.send(event.clone()).is_err() {
                tracing::debug!("Event broadcast skipped: no active receivers");
                break;
            }
        }
    }

    fn publish(&self, topic: String, kind: NotificationKind, snapshot: &OrderSnapshot) {
        let msg = BusMessage::new(topic, kind, OrderNotification::from_snapshot(snapshot));
        let topic = msg.topic.clone();
        if let Err(e) = self.publisher.publish(msg) {
            tracing::warn!(topic = %topic, kind = %kind, error = %e, "Notification publish failed");
        }
    }

    // ========== Authorization ==========

    fn authorize_order(
        &self,
        actor: &Actor,
        snapshot: &OrderSnapshot,
        action: OrderAction,
    ) -> Result<(), AuthError> {
        let owner = self.catalog.restaurant_owner(&snapshot.restaurant_id);
        let resource = OrderResource {
            customer_id: &snapshot.customer_id,
            restaurant_owner_id: owner.as_deref(),
            delivery_person_id: snapshot.delivery.delivery_person_id.as_deref(),
        };
        authorize(actor, &resource, action)
    }

    // ========== Queries ==========

    /// Get an order the actor is allowed to see
    pub fn get_order(&self, actor: &Actor, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let snapshot = self
            .storage
            .get_snapshot(order_id)?
            .filter(|s| !self.in_flight.contains(&s.order_id))
            .ok_or_else(|| OrderError::order_not_found(order_id))?;
        self.authorize_order(actor, &snapshot, OrderAction::View)?;
        Ok(snapshot)
    }

    /// A customer's orders, newest first, limited to what the actor may see
    pub fn get_orders_for_customer(
        &self,
        actor: &Actor,
        customer_id: &str,
    ) -> ManagerResult<Vec<OrderSnapshot>> {
        let orders = self.storage.find_snapshots(|s| {
            s.customer_id == customer_id && !self.in_flight.contains(&s.order_id)
        })?;
        Ok(self.visible_to(actor, orders))
    }

    /// A restaurant's orders, optionally filtered by status, newest first
    pub fn get_orders_for_restaurant(
        &self,
        actor: &Actor,
        restaurant_id: &str,
        status: Option<OrderStatus>,
    ) -> ManagerResult<Vec<OrderSnapshot>> {
        let orders = self.storage.find_snapshots(|s| {
            s.restaurant_id == restaurant_id
                && status.is_none_or(|wanted| s.status == wanted)
                && !self.in_flight.contains(&s.order_id)
        })?;
        Ok(self.visible_to(actor, orders))
    }

    fn visible_to(&self, actor: &Actor, orders: Vec<OrderSnapshot>) -> Vec<OrderSnapshot> {
        orders
            .into_iter()
            .filter(|s| self.authorize_order(actor, s, OrderAction::View).is_ok())
            .collect()
    }

    pub fn get_events_for_order(&self, order_id: &str) -> ManagerResult<Vec<OrderEvent>> {
        if self.in_flight.contains(order_id) {
            return Ok(vec![]);
        }
        Ok(self.storage.get_events_for_order(order_id)?)
    }

    /// Events after `since_sequence`, in global order (client resync)
    ///
    /// Stops at the first event of an in-flight placement, so a client that
    /// resumes from the last returned sequence still receives it later.
    pub fn get_events_since(&self, since_sequence: u64) -> ManagerResult<Vec<OrderEvent>> {
        Ok(self
            .storage
            .get_events_since(since_sequence)?
            .into_iter()
            .take_while(|e| !self.in_flight.contains(&e.order_id))
            .collect())
    }

    /// Rebuild an order from its event stream
    pub fn rebuild_snapshot(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let events = self.storage.get_events_for_order(order_id)?;
        if events.is_empty() {
            return Err(OrderError::order_not_found(order_id).into());
        }
        Ok(replay(order_id, &events))
    }

    /// Whether the stored snapshot equals the one rebuilt from events
    pub fn verify_snapshot(&self, order_id: &str) -> ManagerResult<bool> {
        let stored = self
            .storage
            .get_snapshot(order_id)?
            .ok_or_else(|| OrderError::order_not_found(order_id))?;
        let rebuilt = self.rebuild_snapshot(order_id)?;
        if stored != rebuilt {
            tracing::warn!(
                order_id = %order_id,
                stored_checksum = %stored.state_checksum,
                rebuilt_checksum = %rebuilt.state_checksum,
                "Snapshot drift detected"
            );
            return Ok(false);
        }
        Ok(true)
    }

    pub fn stats(&self) -> ManagerResult<StorageStats> {
        Ok(self.storage.get_stats()?)
    }
}

fn command_metadata(cmd: &OrderCommand) -> CommandMetadata {
    CommandMetadata {
        command_id: cmd.command_id.clone(),
        operator: cmd.operator.clone(),
        timestamp: cmd.timestamp,
    }
}

/// Async mutex for `key`, created on first use
fn keyed_lock(locks: &DashMap<String, Arc<Mutex<()>>>, key: &str) -> Arc<Mutex<()>> {
    locks.entry(key.to_string()).or_default().clone()
}

/// Drop the lock entry once nobody else holds or waits on it
fn release_keyed_lock(locks: &DashMap<String, Arc<Mutex<()>>>, key: &str) {
    locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
}

/// Stock held by an order's line items
fn stock_lines(snapshot: &OrderSnapshot) -> Vec<StockLine> {
    snapshot
        .items
        .iter()
        .map(|item| StockLine::new(item.menu_item_id.clone(), item.quantity))
        .collect()
}
