mod inmemory;
mod postgres;

use barbershop_booking_domain::{Subscription, ID};
pub use inmemory::InMemorySubscriptionRepo;
pub use postgres::PostgresSubscriptionRepo;

#[async_trait::async_trait]
pub trait ISubscriptionRepo: Send + Sync {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn find(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>>;
    async fn find_by_barbershop(&self, barbershop_id: &ID)
        -> anyhow::Result<Option<Subscription>>;
    /// Moves every trial that ended before `now` to `past_due` in one write
    /// and returns the updated subscriptions
    async fn expire_trials(&self, now: i64) -> anyhow::Result<Vec<Subscription>>;
    /// Subscriptions that should be synced with the billing provider
    async fn find_reconcilable(&self) -> anyhow::Result<Vec<Subscription>>;
}
