//! The order book.
//!
//! Checkouts append placed orders; customers read their own history;
//! administrators search, filter and move orders through fulfilment.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, instrument};

use styleaura_core::storage::{KeyValueStore, StorageError, StorageKeys};
use styleaura_core::{IdentityId, Order, OrderId, OrderStatus};
use styleaura_storefront::services::checkout::OrderSink;

use crate::db::JsonCollection;
use crate::error::{AdminError, Result};
use crate::middleware::RequireAdmin;

// =============================================================================
// Queries
// =============================================================================

/// Which statuses an order list includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

/// Search and filter for the admin order list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Matched case-insensitively against the order id and the recipient's
    /// name. Blank matches everything.
    pub search: Option<String>,
    pub status: StatusFilter,
}

impl OrderQuery {
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if !self.status.matches(order.status) {
            return false;
        }
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        order.id.as_str().to_lowercase().contains(&term)
            || order.shipping_address.name.to_lowercase().contains(&term)
    }
}

// =============================================================================
// OrderBook
// =============================================================================

/// Every order placed through the storefront.
#[derive(Debug)]
pub struct OrderBook {
    orders: JsonCollection<Order>,
}

impl OrderBook {
    /// Create an order book over the orders key in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, keys: &StorageKeys) -> Self {
        Self {
            orders: JsonCollection::new(store, keys.orders.clone()),
        }
    }

    /// Append a placed order.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the order cannot be persisted.
    #[instrument(skip(self, order), fields(order_id = %order.id, user_id = %order.user_id))]
    pub fn record(&self, order: Order) -> Result<()> {
        self.append(order)?;
        info!("Order recorded");
        Ok(())
    }

    /// Add `order` unless an order with its id is already recorded.
    fn append(&self, order: Order) -> std::result::Result<(), StorageError> {
        self.orders.update(|orders| {
            if !orders.iter().any(|existing| existing.id == order.id) {
                orders.push(order);
            }
            Ok::<_, StorageError>(())
        })
    }

    /// A customer's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the order book cannot be read.
    pub fn for_user(&self, user_id: &IdentityId) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .load()?
            .into_iter()
            .filter(|order| &order.user_id == user_id)
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Orders matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Storage` if the order book cannot be read.
    pub fn list(&self, _admin: &RequireAdmin, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .load()?
            .into_iter()
            .filter(|order| query.matches(order))
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Look up one order.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` for an unknown id.
    pub fn get(&self, _admin: &RequireAdmin, order_id: &OrderId) -> Result<Order> {
        self.orders
            .load()?
            .into_iter()
            .find(|order| &order.id == order_id)
            .ok_or_else(|| not_found(order_id))
    }

    /// Move an order to `status` and return the updated order.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` for an unknown id, or
    /// `AdminError::Storage` if the change cannot be persisted.
    #[instrument(skip(self, admin), fields(admin_id = %admin.identity().id, order_id = %order_id, status = %status))]
    pub fn update_status(
        &self,
        admin: &RequireAdmin,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        let updated = self.orders.update(|orders| {
            let order = orders
                .iter_mut()
                .find(|order| &order.id == order_id)
                .ok_or_else(|| not_found(order_id))?;
            order.status = status;
            Ok::<_, AdminError>(order.clone())
        })?;
        info!("Order status updated");
        Ok(updated)
    }
}

impl OrderSink for OrderBook {
    #[instrument(skip(self, order), fields(order_id = %order.id, user_id = %order.user_id))]
    fn record_order(&self, order: &Order) -> std::result::Result<(), StorageError> {
        self.append(order.clone())?;
        info!("Order recorded from checkout");
        Ok(())
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
}

fn not_found(order_id: &OrderId) -> AdminError {
    AdminError::NotFound(format!("order {order_id}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use styleaura_core::storage::MemoryStore;

    use super::*;
    use crate::test_support::{admin_guard, day, order};

    fn book_with_orders() -> OrderBook {
        let book = OrderBook::new(Arc::new(MemoryStore::new()), &StorageKeys::default());
        book.record(order("ORD-AAA111", "user-1", "Priya Sharma", day(1)))
            .unwrap();
        book.record(order("ORD-BBB222", "user-2", "Rahul Verma", day(3)))
            .unwrap();
        book.record(order("ORD-CCC333", "user-1", "Priya Sharma", day(2)))
            .unwrap();
        book
    }

    fn ids(orders: &[Order]) -> Vec<&str> {
        orders.iter().map(|order| order.id.as_str()).collect()
    }

    #[test]
    fn test_list_is_newest_first() {
        let book = book_with_orders();
        let admin = admin_guard();

        let orders = book.list(&admin, &OrderQuery::default()).unwrap();

        assert_eq!(ids(&orders), ["ORD-BBB222", "ORD-CCC333", "ORD-AAA111"]);
    }

    #[test]
    fn test_search_matches_id_or_name() {
        let book = book_with_orders();
        let admin = admin_guard();

        let by_name = OrderQuery {
            search: Some("  rahul ".to_string()),
            ..OrderQuery::default()
        };
        assert_eq!(ids(&book.list(&admin, &by_name).unwrap()), ["ORD-BBB222"]);

        let by_id = OrderQuery {
            search: Some("aaa1".to_string()),
            ..OrderQuery::default()
        };
        assert_eq!(ids(&book.list(&admin, &by_id).unwrap()), ["ORD-AAA111"]);
    }

    #[test]
    fn test_status_filter() {
        let book = book_with_orders();
        let admin = admin_guard();
        book.update_status(&admin, &OrderId::new("ORD-AAA111"), OrderStatus::Shipped)
            .unwrap();

        let shipped = OrderQuery {
            status: "Shipped".parse().unwrap(),
            ..OrderQuery::default()
        };
        assert_eq!(ids(&book.list(&admin, &shipped).unwrap()), ["ORD-AAA111"]);

        let all = OrderQuery {
            status: "all".parse().unwrap(),
            ..OrderQuery::default()
        };
        assert_eq!(book.list(&admin, &all).unwrap().len(), 3);
        assert!("lost".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_update_status_persists() {
        let book = book_with_orders();
        let admin = admin_guard();

        let updated = book
            .update_status(&admin, &OrderId::new("ORD-CCC333"), OrderStatus::Delivered)
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Delivered);

        let stored = book.get(&admin, &OrderId::new("ORD-CCC333")).unwrap();
        assert_eq!(stored.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_unknown_order_is_not_found() {
        let book = book_with_orders();
        let admin = admin_guard();

        let err = book
            .update_status(&admin, &OrderId::new("ORD-NOPE"), OrderStatus::Shipped)
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound(_)));
        assert!(matches!(
            book.get(&admin, &OrderId::new("ORD-NOPE")),
            Err(AdminError::NotFound(_))
        ));
    }

    #[test]
    fn test_for_user_only_returns_own_orders() {
        let book = book_with_orders();

        let orders = book.for_user(&IdentityId::new("user-1")).unwrap();

        assert_eq!(ids(&orders), ["ORD-CCC333", "ORD-AAA111"]);
        assert!(book.for_user(&IdentityId::new("user-9")).unwrap().is_empty());
    }

    #[test]
    fn test_checkout_records_each_order_once() {
        let book = OrderBook::new(Arc::new(MemoryStore::new()), &StorageKeys::default());
        let placed = order("ORD-DDD444", "user-3", "Meera Iyer", day(4));

        book.record_order(&placed).unwrap();
        book.record_order(&placed).unwrap();

        let orders = book.for_user(&IdentityId::new("user-3")).unwrap();
        assert_eq!(orders, vec![placed]);
    }
}
