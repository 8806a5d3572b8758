//! The application state object and its operations.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shiftbook_shared::types::{DebtorId, EntryId, OrderId};
use tracing::{debug, info, warn};

use super::error::StateError;
use crate::auth::{
    AuthError, NewUser, SessionState, SystemUser, UserService, UserUpdate, seed_users,
};
use crate::books::{BookService, Debtor, DebtorInput, Order, OrderInput};
use crate::fiscal::FiscalMonth;
use crate::ledger::{LedgerError, ShiftEntry, available_dates, merge_day_view, merged_entry};
use crate::reports::{DailyReport, DayFinalized, MonthFinalized, MonthlyReport, ReportService};
use crate::storage::{KeyValueStore, StorageError, StoreKey};

/// Expense item suggestions, reinstated on every load.
pub const DEFAULT_CATEGORIES: [&str; 9] = [
    "ليمون",
    "لبن",
    "نظافة",
    "صيانة",
    "كهرباء/مياه/غاز",
    "عصير",
    "نقل كراتين",
    "يوميات",
    "أخرى",
];

/// Every shared collection, plus the entry being edited on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    /// Finished shift entries, newest first.
    pub entries: Vec<ShiftEntry>,
    /// Daily reports, most recently finalized first.
    pub daily: Vec<DailyReport>,
    /// Monthly reports, most recently closed first.
    pub monthly: Vec<MonthlyReport>,
    /// Supplier orders, newest first.
    pub orders: Vec<Order>,
    /// Customer debt accounts.
    pub debtors: Vec<Debtor>,
    /// The working entry.
    pub current_entry: ShiftEntry,
    /// Login accounts.
    pub users: Vec<SystemUser>,
    /// Expense item suggestions.
    pub categories: Vec<String>,
}

impl AppState {
    /// Fresh state: no records, seed users, a blank working entry.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            entries: Vec::new(),
            daily: Vec::new(),
            monthly: Vec::new(),
            orders: Vec::new(),
            debtors: Vec::new(),
            current_entry: ShiftEntry::blank(today),
            users: seed_users(),
            categories: default_categories(),
        }
    }

    /// Loads every key from the store.
    ///
    /// A key that is missing, null or unreadable falls back to its default.
    /// An empty user list is replaced by the seed users. Categories always
    /// start from the default list.
    pub async fn load<S>(store: &S, today: NaiveDate) -> Self
    where
        S: KeyValueStore + ?Sized,
    {
        let mut state = Self::new(today);
        state.entries = read_or_default(store, StoreKey::Records).await;
        state.daily = read_or_default(store, StoreKey::DailyReports).await;
        state.monthly = read_or_default(store, StoreKey::MonthlyReports).await;
        state.orders = read_or_default(store, StoreKey::Orders).await;
        state.debtors = read_or_default(store, StoreKey::Debtors).await;
        if let Some(entry) = read_key(store, StoreKey::CurrentEntry).await {
            state.current_entry = entry;
        }
        let users: Vec<SystemUser> = read_or_default(store, StoreKey::SystemUsers).await;
        if !users.is_empty() {
            state.users = users;
        }

        info!(
            entries = state.entries.len(),
            daily = state.daily.len(),
            monthly = state.monthly.len(),
            users = state.users.len(),
            "application state loaded"
        );
        state
    }

    /// The JSON document for a key, or `None` for keys this state does not
    /// hold (session keys and the kill switch).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Malformed` if a value fails to encode.
    pub fn value_for(&self, key: StoreKey) -> Result<Option<Value>, StorageError> {
        fn encode<T: Serialize>(value: &T) -> Result<Option<Value>, StorageError> {
            Ok(Some(serde_json::to_value(value)?))
        }

        match key {
            StoreKey::Records => encode(&self.entries),
            StoreKey::DailyReports => encode(&self.daily),
            StoreKey::MonthlyReports => encode(&self.monthly),
            StoreKey::Orders => encode(&self.orders),
            StoreKey::Debtors => encode(&self.debtors),
            StoreKey::CurrentEntry => encode(&self.current_entry),
            StoreKey::SystemUsers => encode(&self.users),
            StoreKey::ExpenseCategories => encode(&self.categories),
            StoreKey::ActiveTab
            | StoreKey::IsLoggedIn
            | StoreKey::CurrentUser
            | StoreKey::KillSwitch => Ok(None),
        }
    }

    /// Replaces a collection with a decoded value if it differs.
    ///
    /// Returns true if the state changed. Keys this state does not hold are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the value does not match the key's type;
    /// the state is untouched.
    pub fn replace_value(&mut self, key: StoreKey, value: Value) -> Result<bool, serde_json::Error> {
        match key {
            StoreKey::Records => replace_if_changed(&mut self.entries, value),
            StoreKey::DailyReports => replace_if_changed(&mut self.daily, value),
            StoreKey::MonthlyReports => replace_if_changed(&mut self.monthly, value),
            StoreKey::Orders => replace_if_changed(&mut self.orders, value),
            StoreKey::Debtors => replace_if_changed(&mut self.debtors, value),
            StoreKey::CurrentEntry => replace_if_changed(&mut self.current_entry, value),
            StoreKey::SystemUsers => replace_if_changed(&mut self.users, value),
            StoreKey::ExpenseCategories => replace_if_changed(&mut self.categories, value),
            StoreKey::ActiveTab
            | StoreKey::IsLoggedIn
            | StoreKey::CurrentUser
            | StoreKey::KillSwitch => Ok(false),
        }
    }

    /// Resets a key to its safe default, for a remote value that was cleared.
    ///
    /// Record collections become empty and the working entry becomes blank.
    /// Returns `None` for keys without a safe default, `Some(changed)`
    /// otherwise.
    pub fn reset_to_fallback(&mut self, key: StoreKey, today: NaiveDate) -> Option<bool> {
        fn clear<T>(items: &mut Vec<T>) -> bool {
            let changed = !items.is_empty();
            items.clear();
            changed
        }

        match key {
            StoreKey::Records => Some(clear(&mut self.entries)),
            StoreKey::DailyReports => Some(clear(&mut self.daily)),
            StoreKey::MonthlyReports => Some(clear(&mut self.monthly)),
            StoreKey::Orders => Some(clear(&mut self.orders)),
            StoreKey::Debtors => Some(clear(&mut self.debtors)),
            StoreKey::CurrentEntry => {
                let blank = ShiftEntry::blank(today);
                let changed = self.current_entry != blank;
                self.current_entry = blank;
                Some(changed)
            }
            _ => None,
        }
    }

    /// Logs a user in and prepares their working entry.
    ///
    /// A super user gets the merged view of today's shifts when there are
    /// any. Anyone else resumes their unfinalized entry for today's shift, or
    /// starts a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` for blank input and
    /// `AuthError::InvalidCredentials` when nothing matches.
    pub fn login(
        &mut self,
        session: &mut SessionState,
        username: &str,
        password: &str,
        today: NaiveDate,
    ) -> Result<&ShiftEntry, StateError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials.into());
        }
        let user = UserService::authenticate(&self.users, username, password)?;
        self.current_entry = self.entry_for_login(&user, today);
        session.begin(user);
        Ok(&self.current_entry)
    }

    fn entry_for_login(&self, user: &SystemUser, today: NaiveDate) -> ShiftEntry {
        if user.is_super()
            && let Some(merged) = merged_entry(&self.entries, today, &user.username)
        {
            return merged;
        }
        self.entries
            .iter()
            .find(|e| e.date == today && e.shift == Some(user.shift) && !e.is_daily_finalized)
            .cloned()
            .unwrap_or_else(|| ShiftEntry::for_worker(today, user.username.clone(), user.shift))
    }

    /// Ends the session and blanks the working entry.
    pub fn logout(&mut self, session: &mut SessionState, today: NaiveDate) {
        session.end();
        self.current_entry = ShiftEntry::blank(today);
    }

    /// Kill switch: drops the session whatever the switch value is.
    ///
    /// Returns true if someone was logged in.
    pub fn invalidate_session(&mut self, session: &mut SessionState, today: NaiveDate) -> bool {
        let was_logged_in = session.invalidate();
        self.current_entry = ShiftEntry::blank(today);
        was_logged_in
    }

    /// Files the working entry with the records and logs out.
    ///
    /// An entry resumed from the records replaces its earlier copy.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` without a session and
    /// `LedgerError::EmptyShift` when nothing was recorded.
    pub fn finish_shift(
        &mut self,
        session: &mut SessionState,
        today: NaiveDate,
    ) -> Result<EntryId, StateError> {
        let actor = actor(session)?;
        if self.current_entry.is_blank() {
            return Err(LedgerError::EmptyShift.into());
        }

        let mut entry = self.current_entry.clone();
        let id = *entry.id.get_or_insert_with(EntryId::new);
        match self.entries.iter_mut().find(|e| e.id == Some(id)) {
            Some(existing) => *existing = entry,
            None => self.entries.insert(0, entry),
        }
        info!(entry_id = %id, username = %actor.username, "shift finished");

        self.logout(session, today);
        Ok(id)
    }

    /// Sets the till sales of the working entry. Negative input reads as zero.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` without a session.
    pub fn set_sales(&mut self, session: &SessionState, sales: Decimal) -> Result<(), StateError> {
        self.edit_entry(session, |entry| {
            entry.sales = sales.max(Decimal::ZERO);
            Ok(())
        })
    }

    /// Adds an expense line to the working entry; returns its key.
    ///
    /// # Errors
    ///
    /// See [`ShiftEntry::add_expense`].
    pub fn add_expense(
        &mut self,
        session: &SessionState,
        item: &str,
        amount: Decimal,
    ) -> Result<String, StateError> {
        self.edit_entry(session, |entry| {
            entry.add_expense(item, amount).map(|line| line.key())
        })
    }

    /// Edits an expense line of the working entry.
    ///
    /// # Errors
    ///
    /// See [`ShiftEntry::edit_expense`].
    pub fn edit_expense(
        &mut self,
        session: &SessionState,
        key: &str,
        item: &str,
        amount: Decimal,
    ) -> Result<(), StateError> {
        self.edit_entry(session, |entry| entry.edit_expense(key, item, amount))
    }

    /// Removes an expense line from the working entry.
    ///
    /// # Errors
    ///
    /// See [`ShiftEntry::remove_expense`].
    pub fn remove_expense(&mut self, session: &SessionState, key: &str) -> Result<(), StateError> {
        self.edit_entry(session, |entry| entry.remove_expense(key).map(|_| ()))
    }

    /// Applies an edit to the working entry.
    ///
    /// A super user's edit is written straight into the records: the date's
    /// entries are replaced by the edited entry, flagged as finalized. The
    /// reports wait for an explicit finalize.
    fn edit_entry<R, F>(&mut self, session: &SessionState, edit: F) -> Result<R, StateError>
    where
        F: FnOnce(&mut ShiftEntry) -> Result<R, LedgerError>,
    {
        let actor = actor(session)?;
        let out = edit(&mut self.current_entry)?;
        if actor.is_super() {
            let date = self.current_entry.date;
            self.entries.retain(|e| e.date != date);
            self.entries.insert(
                0,
                ShiftEntry {
                    is_daily_finalized: true,
                    ..self.current_entry.clone()
                },
            );
            debug!(%date, "admin edit written to records");
        }
        Ok(out)
    }

    /// Switches the admin working entry to another date.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` for non-super users.
    pub fn select_date(
        &mut self,
        session: &SessionState,
        date: NaiveDate,
    ) -> Result<&ShiftEntry, StateError> {
        let actor = require_super(session, "browse other dates")?;
        self.current_entry = merge_day_view(&self.entries, &self.daily, date, &actor.username);
        Ok(&self.current_entry)
    }

    /// Dates offered for daily closing, newest first.
    #[must_use]
    pub fn available_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        available_dates(&self.entries, &self.daily, today)
    }

    /// Finalizes the date of the working entry.
    ///
    /// # Errors
    ///
    /// See [`ReportService::finalize_day`]; also `AuthError::NotLoggedIn`.
    pub fn finalize_day(
        &mut self,
        session: &SessionState,
        now: DateTime<Utc>,
    ) -> Result<DayFinalized, StateError> {
        let actor = actor(session)?;
        let date = self.current_entry.date;
        let outcome =
            ReportService::finalize_day(&mut self.entries, &mut self.daily, date, &actor, now)?;
        self.current_entry.is_daily_finalized = true;
        Ok(outcome)
    }

    /// Closes a fiscal month and blanks the working entry for a clean start.
    ///
    /// # Errors
    ///
    /// See [`ReportService::finalize_month`]; also `AuthError::NotLoggedIn`.
    pub fn finalize_month(
        &mut self,
        session: &SessionState,
        month: FiscalMonth,
        now: &DateTime<Tz>,
    ) -> Result<MonthFinalized, StateError> {
        let actor = actor(session)?;
        let outcome =
            ReportService::finalize_month(&self.daily, &mut self.monthly, month, &actor, now)?;
        self.current_entry = ShiftEntry::blank(now.date_naive());
        Ok(outcome)
    }

    /// Recomputes closed months from the daily reports.
    ///
    /// Returns the months whose figures changed.
    pub fn cascade_monthly(&mut self, now: DateTime<Utc>) -> Vec<FiscalMonth> {
        ReportService::cascade_monthly(&self.daily, &mut self.monthly, now)
    }

    /// Adds a login account.
    ///
    /// # Errors
    ///
    /// See [`UserService::add_user`].
    pub fn add_user(&mut self, session: &SessionState, input: NewUser) -> Result<(), StateError> {
        let actor = actor(session)?;
        Ok(UserService::add_user(&mut self.users, &actor, input)?)
    }

    /// Updates a login account.
    ///
    /// # Errors
    ///
    /// See [`UserService::update_user`].
    pub fn update_user(
        &mut self,
        session: &SessionState,
        username: &str,
        update: UserUpdate,
    ) -> Result<(), StateError> {
        let actor = actor(session)?;
        Ok(UserService::update_user(&mut self.users, &actor, username, update)?)
    }

    /// Deletes a login account other than the caller's.
    ///
    /// # Errors
    ///
    /// See [`UserService::delete_user`].
    pub fn delete_user(
        &mut self,
        session: &SessionState,
        username: &str,
    ) -> Result<SystemUser, StateError> {
        let actor = actor(session)?;
        Ok(UserService::delete_user(&mut self.users, &actor, username)?)
    }

    /// Records an order.
    ///
    /// # Errors
    ///
    /// See [`BookService::add_order`].
    pub fn add_order(
        &mut self,
        session: &SessionState,
        input: OrderInput,
        now: DateTime<Utc>,
    ) -> Result<OrderId, StateError> {
        actor(session)?;
        Ok(BookService::add_order(&mut self.orders, input, now)?)
    }

    /// Updates an order.
    ///
    /// # Errors
    ///
    /// See [`BookService::update_order`].
    pub fn update_order(
        &mut self,
        session: &SessionState,
        id: OrderId,
        input: OrderInput,
    ) -> Result<(), StateError> {
        actor(session)?;
        Ok(BookService::update_order(&mut self.orders, id, input)?)
    }

    /// Deletes an order.
    ///
    /// # Errors
    ///
    /// See [`BookService::remove_order`].
    pub fn remove_order(&mut self, session: &SessionState, id: OrderId) -> Result<Order, StateError> {
        let actor = actor(session)?;
        Ok(BookService::remove_order(&mut self.orders, &actor, id)?)
    }

    /// Opens a debtor account.
    ///
    /// # Errors
    ///
    /// See [`BookService::add_debtor`].
    pub fn add_debtor(
        &mut self,
        session: &SessionState,
        input: DebtorInput,
    ) -> Result<DebtorId, StateError> {
        actor(session)?;
        Ok(BookService::add_debtor(&mut self.debtors, input)?)
    }

    /// Updates a debtor account.
    ///
    /// # Errors
    ///
    /// See [`BookService::update_debtor`].
    pub fn update_debtor(
        &mut self,
        session: &SessionState,
        id: DebtorId,
        input: DebtorInput,
    ) -> Result<(), StateError> {
        actor(session)?;
        Ok(BookService::update_debtor(&mut self.debtors, id, input)?)
    }

    /// Deletes a debtor account.
    ///
    /// # Errors
    ///
    /// See [`BookService::remove_debtor`].
    pub fn remove_debtor(
        &mut self,
        session: &SessionState,
        id: DebtorId,
    ) -> Result<Debtor, StateError> {
        let actor = actor(session)?;
        Ok(BookService::remove_debtor(&mut self.debtors, &actor, id)?)
    }
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect()
}

fn actor(session: &SessionState) -> Result<SystemUser, AuthError> {
    session.user().cloned().ok_or(AuthError::NotLoggedIn)
}

fn require_super(session: &SessionState, action: &'static str) -> Result<SystemUser, AuthError> {
    let user = actor(session)?;
    if user.is_super() {
        Ok(user)
    } else {
        Err(AuthError::Forbidden(action))
    }
}

fn replace_if_changed<T>(slot: &mut T, value: Value) -> Result<bool, serde_json::Error>
where
    T: DeserializeOwned + PartialEq,
{
    let incoming: T = serde_json::from_value(value)?;
    if *slot == incoming {
        return Ok(false);
    }
    *slot = incoming;
    Ok(true)
}

async fn read_key<S, T>(store: &S, key: StoreKey) -> Option<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let value = match store.get(key).await {
        Ok(Some(Value::Null) | None) => return None,
        Ok(Some(value)) => value,
        Err(e) => {
            warn!(%key, error = %e, "unreadable document, using default");
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(%key, error = %e, "malformed document, using default");
            None
        }
    }
}

async fn read_or_default<S, T>(store: &S, key: StoreKey) -> T
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    read_key(store, key).await.unwrap_or_default()
}
