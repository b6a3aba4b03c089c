use super::ISubscriptionRepo;
use crate::repos::shared::inmemory_repo::*;
use barbershop_booking_domain::{Subscription, ID};

pub struct InMemorySubscriptionRepo {
    subscriptions: std::sync::Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self {
            subscriptions: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for InMemorySubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        insert(subscription, &self.subscriptions);
        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        save(subscription, &self.subscriptions);
        Ok(())
    }

    async fn find(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>> {
        Ok(find(subscription_id, &self.subscriptions))
    }

    async fn find_by_barbershop(
        &self,
        barbershop_id: &ID,
    ) -> anyhow::Result<Option<Subscription>> {
        Ok(find_by(&self.subscriptions, |s| s.barbershop_id == *barbershop_id)
            .into_iter()
            .next())
    }

    async fn expire_trials(&self, now: i64) -> anyhow::Result<Vec<Subscription>> {
        Ok(update_many(
            &self.subscriptions,
            |s| s.is_trial_overdue(now),
            |s| {
                s.expire_trial(now);
            },
        ))
    }

    async fn find_reconcilable(&self) -> anyhow::Result<Vec<Subscription>> {
        Ok(find_by(&self.subscriptions, |s| s.is_reconcilable()))
    }
}
