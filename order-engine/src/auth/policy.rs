//! Order access policy
//!
//! | Action        | Allowed                                                        |
//! |---------------|----------------------------------------------------------------|
//! | Place         | admin; customer placing for themselves                         |
//! | UpdateStatus  | admin; restaurant owner; delivery partner (pickup, delivery)   |
//! | Cancel        | admin; ordering customer; restaurant owner                     |
//! | Rate          | ordering customer                                              |
//! | View          | admin; ordering customer; restaurant owner; assigned courier   |
//!
//! The system actor passes every check.

use shared::order::{Actor, ActorRole, OrderStatus};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{role} {actor_id} may not {action}")]
pub struct AuthError {
    pub actor_id: String,
    pub role: ActorRole,
    pub action: String,
}

/// Operation being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Place,
    UpdateStatus(OrderStatus),
    Cancel,
    Rate,
    View,
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAction::Place => write!(f, "place this order"),
            OrderAction::UpdateStatus(status) => write!(f, "move this order to {}", status),
            OrderAction::Cancel => write!(f, "cancel this order"),
            OrderAction::Rate => write!(f, "rate this order"),
            OrderAction::View => write!(f, "view this order"),
        }
    }
}

/// Ownership facts about the order an action targets
#[derive(Debug, Clone, Copy)]
pub struct OrderResource<'a> {
    pub customer_id: &'a str,
    /// Owner of the order's restaurant, if the restaurant is still known
    pub restaurant_owner_id: Option<&'a str>,
    pub delivery_person_id: Option<&'a str>,
}

pub fn authorize(
    actor: &Actor,
    resource: &OrderResource<'_>,
    action: OrderAction,
) -> Result<(), AuthError> {
    if is_allowed(actor, resource, action) {
        Ok(())
    } else {
        tracing::debug!(actor_id = %actor.id, role = %actor.role, %action, "Authorization denied");
        Err(AuthError {
            actor_id: actor.id.clone(),
            role: actor.role,
            action: action.to_string(),
        })
    }
}

fn is_allowed(actor: &Actor, resource: &OrderResource<'_>, action: OrderAction) -> bool {
    let is_customer = actor.id == resource.customer_id;
    let is_owner = resource.restaurant_owner_id == Some(actor.id.as_str());
    let is_courier = resource.delivery_person_id == Some(actor.id.as_str());

    match actor.role {
        ActorRole::System => true,
        ActorRole::Admin => !matches!(action, OrderAction::Rate),
        ActorRole::Customer => match action {
            OrderAction::Place | OrderAction::Cancel | OrderAction::Rate | OrderAction::View => {
                is_customer
            }
            OrderAction::UpdateStatus(_) => false,
        },
        ActorRole::RestaurantOwner => match action {
            OrderAction::UpdateStatus(_) | OrderAction::Cancel | OrderAction::View => is_owner,
            OrderAction::Place | OrderAction::Rate => false,
        },
        ActorRole::DeliveryPartner => match action {
            // Unassigned orders can be picked up by any courier
            OrderAction::UpdateStatus(OrderStatus::OutForDelivery) => {
                resource.delivery_person_id.is_none() || is_courier
            }
            OrderAction::UpdateStatus(OrderStatus::Delivered) | OrderAction::View => is_courier,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(courier: Option<&'static str>) -> OrderResource<'static> {
        OrderResource {
            customer_id: "c-1",
            restaurant_owner_id: Some("owner-1"),
            delivery_person_id: courier,
        }
    }

    fn actor(id: &str, role: ActorRole) -> Actor {
        Actor::new(id, id, role)
    }

    #[test]
    fn test_customer_rules() {
        let me = actor("c-1", ActorRole::Customer);
        let other = actor("c-2", ActorRole::Customer);
        let res = resource(None);

        assert!(authorize(&me, &res, OrderAction::Place).is_ok());
        assert!(authorize(&me, &res, OrderAction::Cancel).is_ok());
        assert!(authorize(&me, &res, OrderAction::Rate).is_ok());
        assert!(authorize(&me, &res, OrderAction::View).is_ok());
        assert!(authorize(&me, &res, OrderAction::UpdateStatus(OrderStatus::Confirmed)).is_err());

        assert!(authorize(&other, &res, OrderAction::Place).is_err());
        assert!(authorize(&other, &res, OrderAction::Cancel).is_err());
        assert!(authorize(&other, &res, OrderAction::View).is_err());
    }

    #[test]
    fn test_owner_rules() {
        let owner = actor("owner-1", ActorRole::RestaurantOwner);
        let stranger = actor("owner-2", ActorRole::RestaurantOwner);
        let res = resource(None);

        assert!(authorize(&owner, &res, OrderAction::UpdateStatus(OrderStatus::Preparing)).is_ok());
        assert!(authorize(&owner, &res, OrderAction::Cancel).is_ok());
        assert!(authorize(&owner, &res, OrderAction::Rate).is_err());
        assert!(authorize(&stranger, &res, OrderAction::Cancel).is_err());
    }

    #[test]
    fn test_delivery_partner_rules() {
        let courier = actor("d-1", ActorRole::DeliveryPartner);
        let other = actor("d-2", ActorRole::DeliveryPartner);
        let pickup = OrderAction::UpdateStatus(OrderStatus::OutForDelivery);
        let deliver = OrderAction::UpdateStatus(OrderStatus::Delivered);

        assert!(authorize(&courier, &resource(None), pickup).is_ok());
        assert!(authorize(&courier, &resource(Some("d-1")), deliver).is_ok());
        assert!(authorize(&other, &resource(Some("d-1")), pickup).is_err());
        assert!(authorize(&other, &resource(Some("d-1")), deliver).is_err());
        assert!(authorize(&courier, &resource(None), OrderAction::Cancel).is_err());
        assert!(
            authorize(&courier, &resource(None), OrderAction::UpdateStatus(OrderStatus::Confirmed))
                .is_err()
        );
    }

    #[test]
    fn test_admin_and_system() {
        let admin = actor("a-1", ActorRole::Admin);
        let res = resource(None);
        assert!(authorize(&admin, &res, OrderAction::Cancel).is_ok());
        assert!(authorize(&admin, &res, OrderAction::View).is_ok());
        assert!(authorize(&admin, &res, OrderAction::Rate).is_err());
        assert!(authorize(&Actor::system(), &res, OrderAction::Rate).is_ok());
    }

    #[test]
    fn test_error_message() {
        let err = authorize(
            &actor("c-2", ActorRole::Customer),
            &resource(None),
            OrderAction::Cancel,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "customer c-2 may not cancel this order");
    }
}
