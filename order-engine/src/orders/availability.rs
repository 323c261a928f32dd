//! Availability Guard
//!
//! Checks run at order-creation time against the catalog:
//! restaurant status, item ownership/activity, stock, weekday and time
//! windows, and the restaurant's minimum order.

use crate::orders::money::to_decimal;
use crate::orders::traits::OrderError;
use chrono::{DateTime, Datelike, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::models::{MenuItem, Restaurant, TimeWindow};

/// Restaurant must exist and be active
pub fn check_restaurant<'a>(
    restaurant_id: &str,
    restaurant: Option<&'a Restaurant>,
) -> Result<&'a Restaurant, OrderError> {
    match restaurant {
        Some(r) if r.is_active() => Ok(r),
        Some(r) => Err(OrderError::NotFound(format!(
            "Restaurant {} is not accepting orders ({:?})",
            r.id, r.status
        ))),
        None => Err(OrderError::NotFound(format!(
            "Restaurant not found: {}",
            restaurant_id
        ))),
    }
}

/// Menu item must exist, belong to the restaurant and be available now
pub fn check_item<'a>(
    restaurant_id: &str,
    menu_item_id: &str,
    item: Option<&'a MenuItem>,
    requested: u32,
    now: &DateTime<Tz>,
) -> Result<&'a MenuItem, OrderError> {
    let item = item.ok_or_else(|| {
        OrderError::NotFound(format!("Menu item not found: {}", menu_item_id))
    })?;

    if item.restaurant_id != restaurant_id {
        return Err(OrderError::Validation(format!(
            "Menu item {} does not belong to restaurant {}",
            item.id, restaurant_id
        )));
    }
    if !item.is_active {
        return Err(OrderError::Validation(format!(
            "Menu item {} is not active",
            item.name
        )));
    }
    if !is_currently_available(item, requested, now) {
        return Err(OrderError::Validation(format!(
            "Menu item {} is not currently available",
            item.name
        )));
    }
    Ok(item)
}

/// Availability flags, stock, weekday list and time window
pub fn is_currently_available(item: &MenuItem, requested: u32, now: &DateTime<Tz>) -> bool {
    let availability = &item.availability;
    if !availability.is_available {
        return false;
    }
    if let Some(remaining) = availability.available_quantity
        && remaining < requested
    {
        return false;
    }
    if !availability.available_days.is_empty() {
        let today = weekday_name(now.weekday());
        if !availability
            .available_days
            .iter()
            .any(|d| d.eq_ignore_ascii_case(today))
        {
            return false;
        }
    }
    if let Some(window) = &availability.available_time {
        let time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN);
        return is_within_window(window, time);
    }
    true
}

/// Inclusive `[start, end]` check; `start > end` wraps past midnight
///
/// An unparsable window does not restrict the item.
pub fn is_within_window(window: &TimeWindow, time: NaiveTime) -> bool {
    let (Ok(start), Ok(end)) = (
        NaiveTime::parse_from_str(&window.start, "%H:%M"),
        NaiveTime::parse_from_str(&window.end, "%H:%M"),
    ) else {
        tracing::warn!(start = %window.start, end = %window.end, "Ignoring malformed availability window");
        return true;
    };

    if start <= end {
        time >= start && time <= end
    } else {
        time >= start || time <= end
    }
}

/// Subtotal must reach the restaurant's minimum order
pub fn check_minimum_order(restaurant: &Restaurant, subtotal: Decimal) -> Result<(), OrderError> {
    let minimum = to_decimal(restaurant.minimum_order);
    if subtotal < minimum {
        return Err(OrderError::Validation(format!(
            "Order subtotal {} is below the minimum order of {} for {}",
            subtotal.round_dp(2),
            minimum,
            restaurant.name
        )));
    }
    Ok(())
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::{ItemAvailability, RestaurantStatus};

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn restaurant(status: RestaurantStatus) -> Restaurant {
        Restaurant {
            id: "r-1".to_string(),
            owner_id: "owner-1".to_string(),
            name: "Diner".to_string(),
            status,
            minimum_order: 15.0,
            delivery_fee: 2.0,
        }
    }

    fn item() -> MenuItem {
        MenuItem {
            id: "m-1".to_string(),
            restaurant_id: "r-1".to_string(),
            name: "Soup".to_string(),
            price: 6.0,
            is_active: true,
            availability: ItemAvailability::default(),
            customizations: vec![],
            add_ons: vec![],
        }
    }

    /// 2026-01-05 is a Monday
    fn monday_at(hour: u32, minute: u32) -> DateTime<Tz> {
        chrono_tz::UTC
            .with_ymd_and_hms(2026, 1, 5, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_window_inclusive_bounds() {
        let window = TimeWindow::new("11:00", "15:00");
        assert!(is_within_window(&window, at(11, 0)));
        assert!(is_within_window(&window, at(15, 0)));
        assert!(is_within_window(&window, at(13, 30)));
        assert!(!is_within_window(&window, at(10, 59)));
        assert!(!is_within_window(&window, at(15, 1)));
    }

    #[test]
    fn test_overnight_window() {
        let window = TimeWindow::new("22:00", "02:00");
        assert!(is_within_window(&window, at(23, 15)));
        assert!(is_within_window(&window, at(0, 30)));
        assert!(is_within_window(&window, at(2, 0)));
        assert!(!is_within_window(&window, at(12, 0)));
        assert!(!is_within_window(&window, at(21, 59)));
    }

    #[test]
    fn test_malformed_window_is_ignored() {
        let window = TimeWindow::new("lunch", "15:00");
        assert!(is_within_window(&window, at(3, 0)));
    }

    #[test]
    fn test_check_restaurant() {
        let active = restaurant(RestaurantStatus::Active);
        assert!(check_restaurant("r-1", Some(&active)).is_ok());

        let suspended = restaurant(RestaurantStatus::Suspended);
        assert!(matches!(
            check_restaurant("r-1", Some(&suspended)),
            Err(OrderError::NotFound(_))
        ));
        assert!(matches!(
            check_restaurant("r-x", None),
            Err(OrderError::NotFound(_))
        ));
    }

    #[test]
    fn test_check_item_errors() {
        let now = monday_at(12, 0);
        assert!(matches!(
            check_item("r-1", "m-x", None, 1, &now),
            Err(OrderError::NotFound(_))
        ));

        let mut foreign = item();
        foreign.restaurant_id = "r-2".to_string();
        assert!(matches!(
            check_item("r-1", "m-1", Some(&foreign), 1, &now),
            Err(OrderError::Validation(_))
        ));

        let mut inactive = item();
        inactive.is_active = false;
        assert!(matches!(
            check_item("r-1", "m-1", Some(&inactive), 1, &now),
            Err(OrderError::Validation(_))
        ));

        let mut sold_out = item();
        sold_out.availability.available_quantity = Some(1);
        assert!(check_item("r-1", "m-1", Some(&sold_out), 1, &now).is_ok());
        assert!(matches!(
            check_item("r-1", "m-1", Some(&sold_out), 2, &now),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn test_available_days() {
        let mut weekdays = item();
        weekdays.availability.available_days = vec!["Monday".to_string(), "tuesday".to_string()];
        assert!(is_currently_available(&weekdays, 1, &monday_at(12, 0)));

        weekdays.availability.available_days = vec!["saturday".to_string()];
        assert!(!is_currently_available(&weekdays, 1, &monday_at(12, 0)));
    }

    #[test]
    fn test_time_window_uses_business_timezone() {
        let mut late = item();
        late.availability.available_time = Some(TimeWindow::new("22:00", "02:00"));

        // 17:00 UTC is 22:30 in Kolkata (+05:30)
        let utc = monday_at(17, 0);
        assert!(!is_currently_available(&late, 1, &utc));
        let kolkata = utc.with_timezone(&chrono_tz::Asia::Kolkata);
        assert!(is_currently_available(&late, 1, &kolkata));

        assert!(is_currently_available(&late, 1, &monday_at(23, 0)));
    }

    #[test]
    fn test_minimum_order() {
        let r = restaurant(RestaurantStatus::Active);
        assert!(check_minimum_order(&r, Decimal::new(1500, 2)).is_ok());
        assert!(matches!(
            check_minimum_order(&r, Decimal::new(1499, 2)),
            Err(OrderError::Validation(_))
        ));
    }
}
