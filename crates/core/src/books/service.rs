//! Order and debtor bookkeeping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shiftbook_shared::types::{DebtorId, OrderId};
use tracing::info;

use super::error::BookError;
use super::types::{Debtor, DebtorInput, Order, OrderInput, OrderTotals};
use crate::auth::SystemUser;

/// Stateless operations over the order list and the debt notebook.
pub struct BookService;

impl BookService {
    /// Records a new order at the top of the list.
    ///
    /// The paid amount is clamped to `0..=price`.
    ///
    /// # Errors
    ///
    /// Returns `BookError::IncompleteOrder` for a blank item or a price that
    /// is not positive.
    pub fn add_order(
        orders: &mut Vec<Order>,
        input: OrderInput,
        now: DateTime<Utc>,
    ) -> Result<OrderId, BookError> {
        let (item, price, paid) = Self::check_order(&input)?;
        let order = Order {
            id: OrderId::new(),
            item,
            supplier: input.supplier.trim().to_string(),
            price,
            paid_amount: paid,
            date: input.date,
            timestamp: Some(now),
        };
        let id = order.id;
        info!(order_id = %id, price = %order.price, paid = %order.paid_amount, "order added");
        orders.insert(0, order);
        Ok(id)
    }

    /// Replaces an order's fields, keeping its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `BookError::IncompleteOrder` for invalid input and
    /// `BookError::OrderNotFound` for an unknown id.
    pub fn update_order(
        orders: &mut [Order],
        id: OrderId,
        input: OrderInput,
    ) -> Result<(), BookError> {
        let (item, price, paid) = Self::check_order(&input)?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(BookError::OrderNotFound(id))?;
        order.item = item;
        order.supplier = input.supplier.trim().to_string();
        order.price = price;
        order.paid_amount = paid;
        order.date = input.date;
        info!(order_id = %id, "order updated");
        Ok(())
    }

    /// Deletes an order.
    ///
    /// # Errors
    ///
    /// Returns `BookError::Forbidden` for non-super actors and
    /// `BookError::OrderNotFound` for an unknown id.
    pub fn remove_order(
        orders: &mut Vec<Order>,
        actor: &SystemUser,
        id: OrderId,
    ) -> Result<Order, BookError> {
        if !actor.role.can_delete_records() {
            return Err(BookError::Forbidden);
        }
        let index = orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(BookError::OrderNotFound(id))?;
        info!(order_id = %id, "order removed");
        Ok(orders.remove(index))
    }

    /// Value, paid and remaining over every order.
    #[must_use]
    pub fn order_totals(orders: &[Order]) -> OrderTotals {
        let value: Decimal = orders.iter().map(|o| o.price).sum();
        let paid: Decimal = orders.iter().map(|o| o.paid_amount).sum();
        OrderTotals {
            value,
            paid,
            remaining: value - paid,
        }
    }

    /// Opens a customer account.
    ///
    /// # Errors
    ///
    /// Returns `BookError::MissingName`, `BookError::NegativeBalance` or
    /// `BookError::DuplicateDebtor`.
    pub fn add_debtor(debtors: &mut Vec<Debtor>, input: DebtorInput) -> Result<DebtorId, BookError> {
        let name = Self::check_debtor(debtors, None, &input)?;
        let debtor = Debtor {
            id: DebtorId::new(),
            name,
            balance: input.balance,
            history: Vec::new(),
        };
        let id = debtor.id;
        info!(debtor_id = %id, balance = %debtor.balance, "debtor added");
        debtors.push(debtor);
        Ok(id)
    }

    /// Renames an account and sets its balance.
    ///
    /// # Errors
    ///
    /// Returns `BookError::DebtorNotFound` for an unknown id, or the same
    /// validation errors as [`add_debtor`](Self::add_debtor).
    pub fn update_debtor(
        debtors: &mut [Debtor],
        id: DebtorId,
        input: DebtorInput,
    ) -> Result<(), BookError> {
        let name = Self::check_debtor(debtors, Some(id), &input)?;
        let debtor = debtors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(BookError::DebtorNotFound(id))?;
        debtor.name = name;
        debtor.balance = input.balance;
        info!(debtor_id = %id, balance = %input.balance, "debtor updated");
        Ok(())
    }

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// Returns `BookError::Forbidden` for non-super actors and
    /// `BookError::DebtorNotFound` for an unknown id.
    pub fn remove_debtor(
        debtors: &mut Vec<Debtor>,
        actor: &SystemUser,
        id: DebtorId,
    ) -> Result<Debtor, BookError> {
        if !actor.role.can_delete_records() {
            return Err(BookError::Forbidden);
        }
        let index = debtors
            .iter()
            .position(|d| d.id == id)
            .ok_or(BookError::DebtorNotFound(id))?;
        info!(debtor_id = %id, "debtor removed");
        Ok(debtors.remove(index))
    }

    /// Sum of every customer balance.
    #[must_use]
    pub fn outstanding_balance(debtors: &[Debtor]) -> Decimal {
        debtors.iter().map(|d| d.balance).sum()
    }

    fn check_order(input: &OrderInput) -> Result<(String, Decimal, Decimal), BookError> {
        let item = input.item.trim();
        if item.is_empty() || input.price <= Decimal::ZERO {
            return Err(BookError::IncompleteOrder);
        }
        let paid = input.paid_amount.clamp(Decimal::ZERO, input.price);
        Ok((item.to_string(), input.price, paid))
    }

    fn check_debtor(
        debtors: &[Debtor],
        editing: Option<DebtorId>,
        input: &DebtorInput,
    ) -> Result<String, BookError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(BookError::MissingName);
        }
        if input.balance < Decimal::ZERO {
            return Err(BookError::NegativeBalance);
        }
        let lower = name.to_lowercase();
        let taken = debtors
            .iter()
            .any(|d| Some(d.id) != editing && d.name.to_lowercase() == lower);
        if taken {
            return Err(BookError::DuplicateDebtor(name.to_string()));
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::seed_users;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn order_input(item: &str, price: Decimal, paid: Decimal) -> OrderInput {
        OrderInput {
            item: item.to_string(),
            supplier: String::new(),
            price,
            paid_amount: paid,
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        }
    }

    fn debtor_input(name: &str, balance: Decimal) -> DebtorInput {
        DebtorInput {
            name: name.to_string(),
            balance,
        }
    }

    #[test]
    fn test_add_order_newest_first() {
        let mut orders = Vec::new();
        let first = BookService::add_order(&mut orders, order_input("سكر", dec!(500), dec!(200)), Utc::now()).unwrap();
        let second = BookService::add_order(&mut orders, order_input("شاي", dec!(300), dec!(0)), Utc::now()).unwrap();
        assert_eq!(orders[0].id, second);
        assert_eq!(orders[1].id, first);
        assert_eq!(orders[1].remaining(), dec!(300));
    }

    #[rstest]
    #[case("", dec!(100))]
    #[case("   ", dec!(100))]
    #[case("سكر", dec!(0))]
    #[case("سكر", dec!(-5))]
    fn test_incomplete_order_rejected(#[case] item: &str, #[case] price: Decimal) {
        let mut orders = Vec::new();
        let err = BookService::add_order(&mut orders, order_input(item, price, dec!(0)), Utc::now())
            .unwrap_err();
        assert_eq!(err, BookError::IncompleteOrder);
        assert!(orders.is_empty());
    }

    #[test]
    fn test_paid_amount_clamped_to_price() {
        let mut orders = Vec::new();
        BookService::add_order(&mut orders, order_input("لبن", dec!(100), dec!(250)), Utc::now()).unwrap();
        assert_eq!(orders[0].paid_amount, dec!(100));
        assert_eq!(orders[0].remaining(), Decimal::ZERO);
    }

    #[test]
    fn test_update_and_totals() {
        let mut orders = Vec::new();
        let id = BookService::add_order(&mut orders, order_input("سكر", dec!(500), dec!(0)), Utc::now()).unwrap();
        BookService::add_order(&mut orders, order_input("شاي", dec!(300), dec!(100)), Utc::now()).unwrap();
        BookService::update_order(&mut orders, id, order_input("سكر", dec!(500), dec!(450))).unwrap();

        let totals = BookService::order_totals(&orders);
        assert_eq!(totals.value, dec!(800));
        assert_eq!(totals.paid, dec!(550));
        assert_eq!(totals.remaining, dec!(250));
    }

    #[test]
    fn test_remove_order_requires_super() {
        let users = seed_users();
        let mut orders = Vec::new();
        let id = BookService::add_order(&mut orders, order_input("سكر", dec!(500), dec!(0)), Utc::now()).unwrap();

        let err = BookService::remove_order(&mut orders, &users[1], id).unwrap_err();
        assert_eq!(err, BookError::Forbidden);
        assert_eq!(orders.len(), 1);

        BookService::remove_order(&mut orders, &users[0], id).unwrap();
        assert!(orders.is_empty());
        assert_eq!(
            BookService::remove_order(&mut orders, &users[0], id).unwrap_err(),
            BookError::OrderNotFound(id)
        );
    }

    #[test]
    fn test_debtor_names_unique_ignoring_case() {
        let mut debtors = Vec::new();
        BookService::add_debtor(&mut debtors, debtor_input("Ahmed", dec!(50))).unwrap();
        let err = BookService::add_debtor(&mut debtors, debtor_input(" ahmed ", dec!(10))).unwrap_err();
        assert_eq!(err, BookError::DuplicateDebtor("ahmed".to_string()));
        assert_eq!(debtors.len(), 1);
    }

    #[test]
    fn test_update_debtor_keeps_own_name() {
        let mut debtors = Vec::new();
        let id = BookService::add_debtor(&mut debtors, debtor_input("Ahmed", dec!(50))).unwrap();
        BookService::add_debtor(&mut debtors, debtor_input("Sayed", dec!(20))).unwrap();

        BookService::update_debtor(&mut debtors, id, debtor_input("AHMED", dec!(75))).unwrap();
        assert_eq!(debtors[0].name, "AHMED");
        assert_eq!(BookService::outstanding_balance(&debtors), dec!(95));

        let err = BookService::update_debtor(&mut debtors, id, debtor_input("sayed", dec!(75))).unwrap_err();
        assert!(matches!(err, BookError::DuplicateDebtor(_)));
    }

    #[test]
    fn test_debtor_validation() {
        let mut debtors = Vec::new();
        assert_eq!(
            BookService::add_debtor(&mut debtors, debtor_input("", dec!(5))).unwrap_err(),
            BookError::MissingName
        );
        assert_eq!(
            BookService::add_debtor(&mut debtors, debtor_input("Ali", dec!(-5))).unwrap_err(),
            BookError::NegativeBalance
        );
    }

    #[test]
    fn test_remove_debtor_requires_super() {
        let users = seed_users();
        let mut debtors = Vec::new();
        let id = BookService::add_debtor(&mut debtors, debtor_input("Ali", dec!(5))).unwrap();
        assert_eq!(
            BookService::remove_debtor(&mut debtors, &users[2], id).unwrap_err(),
            BookError::Forbidden
        );
        let removed = BookService::remove_debtor(&mut debtors, &users[0], id).unwrap();
        assert_eq!(removed.name, "Ali");
    }

    #[test]
    fn test_debtor_wire_form() {
        let json = serde_json::json!({
            "id": 1_718_000_000_000_i64,
            "name": "Ali",
            "balance": "١٢٠",
            "history": []
        });
        let debtor: Debtor = serde_json::from_value(json).unwrap();
        assert_eq!(debtor.balance, dec!(120));
        assert_eq!(debtor.id, DebtorId(1_718_000_000_000));
    }
}
