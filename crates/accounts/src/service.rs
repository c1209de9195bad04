//! Account service over an [`AccountStore`].

use common::{AccountId, Money};
use store::{
    AccountRecord, AccountStore, NewAccount, OrderRecord, OrderStore, ProfileRecord, ProfileUpdate,
    StoreError,
};

use crate::error::AccountError;

/// How many orders the account overview shows.
const RECENT_ORDERS_LIMIT: usize = 5;

/// Input for [`AccountService::register`].
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub newsletter: bool,
}

/// Profile plus the order figures the account page shows.
#[derive(Debug, Clone)]
pub struct AccountOverview {
    pub account: AccountRecord,
    pub profile: ProfileRecord,
    pub recent_orders: Vec<OrderRecord>,
    pub total_spent: Money,
}

/// Service for registration and profile management.
pub struct AccountService<S> {
    store: S,
}

impl<S: AccountStore + OrderStore> AccountService<S> {
    /// Creates a new account service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers an account, creating account and profile rows in one
    /// transaction. All field validation happens before any write.
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountRecord, AccountError> {
        let username = request.username.trim().to_string();
        if username.is_empty() {
            return Err(AccountError::BlankField("username"));
        }

        let email = request.email.trim().to_string();
        if !looks_like_email(&email) {
            return Err(AccountError::InvalidEmail);
        }

        let phone = normalize_phone(&request.phone)?;

        let account = self
            .store
            .create_account(NewAccount {
                id: AccountId::new(),
                username,
                email,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                phone,
                newsletter: request.newsletter,
            })
            .await
            .map_err(map_duplicate)?;

        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Returns the account's profile, creating an empty one on first
    /// access. Total and idempotent: there is no "profile missing" case.
    #[tracing::instrument(skip(self))]
    pub async fn profile(&self, account_id: AccountId) -> Result<ProfileRecord, AccountError> {
        self.store
            .find_or_create_profile(account_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AccountError::NotFound(account_id),
                other => AccountError::Store(other),
            })
    }

    /// Applies a partial profile update; name fields land on the account
    /// row in the same transaction.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        account_id: AccountId,
        mut changes: ProfileUpdate,
    ) -> Result<(AccountRecord, ProfileRecord), AccountError> {
        if let Some(ref phone) = changes.phone {
            changes.phone = Some(normalize_phone(phone)?);
        }

        self.store
            .update_account_profile(account_id, changes)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AccountError::NotFound(account_id),
                other => AccountError::Store(other),
            })
    }

    /// The account page payload: profile, most recent orders, and the sum
    /// spent across delivered orders.
    #[tracing::instrument(skip(self))]
    pub async fn overview(&self, account_id: AccountId) -> Result<AccountOverview, AccountError> {
        let account = self
            .store
            .account_by_id(account_id)
            .await?
            .ok_or(AccountError::NotFound(account_id))?;
        let profile = self.profile(account_id).await?;

        let mut recent_orders = self.store.orders_for_account(account_id).await?;
        recent_orders.truncate(RECENT_ORDERS_LIMIT);

        let total_spent = self.store.delivered_total(account_id).await?;

        Ok(AccountOverview {
            account,
            profile,
            recent_orders,
            total_spent,
        })
    }
}

/// Minimal shape check: something before the `@`, a dot somewhere in the
/// domain, no whitespace.
fn looks_like_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Strips everything but digits; an empty phone is fine, anything else must
/// land between 9 and 15 digits.
fn normalize_phone(phone: &str) -> Result<String, AccountError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() && phone.trim().is_empty() {
        return Ok(String::new());
    }
    if !(9..=15).contains(&digits.len()) {
        return Err(AccountError::InvalidPhone);
    }
    Ok(digits)
}

fn map_duplicate(e: StoreError) -> AccountError {
    match e {
        StoreError::Duplicate { ref detail, .. } if detail.contains("email") => {
            AccountError::EmailTaken
        }
        StoreError::Duplicate { .. } => AccountError::UsernameTaken,
        other => AccountError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, OrderNumber, OrderStatus, PaymentMethod, ShopperIdentity};
    use store::{CartStore, InMemoryStore, NewOrder};

    fn request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: "+33 1 23 45 67 89".to_string(),
            newsletter: true,
        }
    }

    #[tokio::test]
    async fn register_creates_account_and_profile_together() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store.clone());

        let account = service
            .register(request("ada", "ada@example.com"))
            .await
            .unwrap();

        let profile = service.profile(account.id).await.unwrap();
        assert_eq!(profile.phone, "33123456789");
        assert!(profile.newsletter);
    }

    #[tokio::test]
    async fn duplicate_username_maps_to_username_taken() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store);

        service
            .register(request("ada", "ada@example.com"))
            .await
            .unwrap();
        let result = service.register(request("ada", "other@example.com")).await;

        assert!(matches!(result, Err(AccountError::UsernameTaken)));
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_email_taken() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store);

        service
            .register(request("ada", "ada@example.com"))
            .await
            .unwrap();
        let result = service.register(request("grace", "ada@example.com")).await;

        assert!(matches!(result, Err(AccountError::EmailTaken)));
    }

    #[tokio::test]
    async fn bad_email_is_rejected_before_any_write() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store);

        for email in ["", "nope", "a@b", "a b@c.com", "a@.com"] {
            let result = service.register(request("ada", email)).await;
            assert!(matches!(result, Err(AccountError::InvalidEmail)), "{email}");
        }
    }

    #[tokio::test]
    async fn short_phone_is_rejected() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store);

        let mut bad = request("ada", "ada@example.com");
        bad.phone = "12345".to_string();
        let result = service.register(bad).await;

        assert!(matches!(result, Err(AccountError::InvalidPhone)));
    }

    #[tokio::test]
    async fn empty_phone_is_fine() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store);

        let mut ok = request("ada", "ada@example.com");
        ok.phone = String::new();
        let account = service.register(ok).await.unwrap();

        let profile = service.profile(account.id).await.unwrap();
        assert_eq!(profile.phone, "");
    }

    #[tokio::test]
    async fn profile_of_unknown_account_is_not_found() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store);

        let result = service.profile(AccountId::new()).await;
        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_profile_touches_account_and_profile() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store);
        let account = service
            .register(request("ada", "ada@example.com"))
            .await
            .unwrap();

        let (account, profile) = service
            .update_profile(
                account.id,
                ProfileUpdate {
                    first_name: Some("Augusta".to_string()),
                    city: Some("London".to_string()),
                    newsletter: Some(false),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(account.first_name, "Augusta");
        assert_eq!(account.last_name, "Lovelace");
        assert_eq!(profile.city, "London");
        assert!(!profile.newsletter);
    }

    #[tokio::test]
    async fn overview_collects_recent_orders_and_total_spent() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store.clone());
        let account = service
            .register(request("ada", "ada@example.com"))
            .await
            .unwrap();

        let cart = store
            .find_or_create_cart(&ShopperIdentity::Account(account.id))
            .await
            .unwrap();
        for cents in [1_000, 2_000, 3_000, 4_000, 5_000, 6_000] {
            let order = store
                .place_order(
                    cart.id,
                    NewOrder {
                        id: OrderId::new(),
                        account_id: account.id,
                        order_number: OrderNumber::generate(),
                        payment_method: PaymentMethod::Paypal,
                        total_amount: Money::from_cents(cents),
                        shipping_address: "1 Main St".to_string(),
                        billing_address: "1 Main St".to_string(),
                        notes: String::new(),
                    },
                    vec![],
                )
                .await
                .unwrap();
            if cents <= 2_000 {
                store
                    .set_order_status(order.id, OrderStatus::Delivered)
                    .await
                    .unwrap();
            }
        }

        let overview = service.overview(account.id).await.unwrap();
        assert_eq!(overview.recent_orders.len(), 5);
        assert_eq!(overview.total_spent.cents(), 3_000);
    }
}
