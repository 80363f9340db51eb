//! Membership application service: plan catalogue plus the subscription
//! lifecycle, including the at-most-one-active-per-user invariant.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{
    DomainError, DomainResult, Entity, ExpectedRevision, PlanId, SubscriptionId, UserId,
};
use gymops_membership::{NewPlan, Plan, PlanUpdate, SubscriptionStatus, UserSubscription};
use gymops_store::{Collection, UniqueIndex};

use crate::pagination::{paginate, Page, PageRequest};

/// Minimal member record: the holder of the denormalized back-reference to
/// the current subscription. Member personal data lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub user_id: UserId,
    pub current_subscription: Option<SubscriptionId>,
}

/// Filters for the subscription list operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionListFilter {
    pub status: Option<SubscriptionStatus>,
    /// Stored-active records whose end date has passed (awaiting the sweep).
    pub expired_only: bool,
}

/// Read-side aggregation over subscription records. No state mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStats {
    pub total_active: u64,
    /// Stored-active but past end date (logically expired).
    pub total_lapsed: u64,
    pub total_cancelled: u64,
    /// Sum of `amount_paid` over records created in the current calendar month.
    pub monthly_revenue: u64,
}

/// Subscription lifecycle service.
///
/// The `active_claims` index holds one entry per user with a stored-active
/// subscription; Subscribe and Renew must take the claim before activating,
/// which is what keeps two concurrent subscribes from both succeeding.
#[derive(Debug, Default)]
pub struct MembershipService {
    plans: Collection<PlanId, Plan>,
    plan_names: UniqueIndex<String, PlanId>,
    subscriptions: Collection<SubscriptionId, UserSubscription>,
    active_claims: UniqueIndex<UserId, SubscriptionId>,
    members: Collection<UserId, MemberRecord>,
}

impl MembershipService {
    pub fn new() -> Self {
        Self::default()
    }

    // --- members ---------------------------------------------------------

    /// Register the back-reference record for a user. Invoked when the
    /// (out-of-scope) user management creates an account.
    pub fn register_member(&self, user_id: UserId) -> DomainResult<()> {
        self.members.insert(
            user_id,
            MemberRecord {
                user_id,
                current_subscription: None,
            },
        )
    }

    pub fn get_member(&self, user_id: UserId) -> DomainResult<MemberRecord> {
        Ok(self.members.fetch(&user_id)?.doc)
    }

    // --- plans -----------------------------------------------------------

    pub fn create_plan(&self, new: NewPlan, now: DateTime<Utc>) -> DomainResult<Plan> {
        let id = PlanId::new();
        let plan = Plan::create(id, new, now)?;

        self.plan_names
            .claim(plan.name().to_string(), id)
            .map_err(|_| {
                DomainError::conflict(format!("a plan named '{}' already exists", plan.name()))
            })?;
        if let Err(e) = self.plans.insert(id, plan.clone()) {
            self.plan_names.release(&plan.name().to_string(), &id)?;
            return Err(e);
        }
        Ok(plan)
    }

    pub fn get_plan(&self, id: PlanId) -> DomainResult<Plan> {
        Ok(self.plans.fetch(&id)?.doc)
    }

    pub fn update_plan(&self, id: PlanId, update: PlanUpdate) -> DomainResult<Plan> {
        self.plans.update(&id, ExpectedRevision::Any, |plan| {
            if let Some(old_name) = plan.apply_update(update.clone())? {
                self.plan_names
                    .reclaim(&old_name, plan.name().to_string(), id)
                    .map_err(|_| {
                        DomainError::conflict(format!(
                            "a plan named '{}' already exists",
                            plan.name()
                        ))
                    })?;
            }
            Ok(plan.clone())
        })
    }

    /// Delete a plan. Fails with `Conflict` while any user subscription on
    /// it is stored-active.
    pub fn delete_plan(&self, id: PlanId) -> DomainResult<()> {
        if let Some(count) = self.active_subscriber_count(id)? {
            return Err(DomainError::conflict(format!(
                "plan has {count} active subscriber(s)"
            )));
        }
        let plan = self.plans.remove(&id)?;
        // Re-check after removal: a subscribe that loaded the plan before
        // the remove committed wins, and the plan goes back.
        if self.active_subscriber_count(id)?.is_some() {
            self.plans.insert(id, plan)?;
            return Err(DomainError::conflict("plan has active subscriber(s)"));
        }
        self.plan_names.release(&plan.name().to_string(), &id)?;
        Ok(())
    }

    fn active_subscriber_count(&self, plan_id: PlanId) -> DomainResult<Option<usize>> {
        let count = self
            .subscriptions
            .snapshot()?
            .into_iter()
            .filter(|s| s.plan_id() == plan_id && s.status() == SubscriptionStatus::Active)
            .count();
        Ok((count > 0).then_some(count))
    }

    /// Plans sorted by price; optionally only those open for new signups.
    pub fn list_plans(&self, active_only: bool) -> DomainResult<Vec<Plan>> {
        let mut plans: Vec<_> = self
            .plans
            .snapshot()?
            .into_iter()
            .filter(|p| !active_only || p.is_active())
            .collect();
        plans.sort_by_key(Plan::price);
        Ok(plans)
    }

    // --- subscription lifecycle ------------------------------------------

    /// Enrol a user in a plan.
    pub fn subscribe(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        discount: u64,
        payment_method: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<UserSubscription> {
        self.members.fetch(&user_id)?;
        let plan = self.plans.fetch(&plan_id)?.doc;
        if !plan.is_active() {
            return Err(DomainError::conflict(format!(
                "plan '{}' is not open for new subscriptions",
                plan.name()
            )));
        }

        let id = SubscriptionId::new();
        // The claim is the uniqueness write: a concurrent subscribe for the
        // same user loses here, before anything is stored.
        self.active_claims.claim(user_id, id).map_err(|_| {
            DomainError::conflict("user already has an active subscription")
        })?;

        let subscription =
            match UserSubscription::subscribe(id, user_id, &plan, discount, payment_method, now) {
                Ok(s) => s,
                Err(e) => {
                    self.active_claims.release(&user_id, &id)?;
                    return Err(e);
                }
            };
        if let Err(e) = self.subscriptions.insert(id, subscription.clone()) {
            self.active_claims.release(&user_id, &id)?;
            return Err(e);
        }
        self.set_back_reference(user_id, Some(id))?;
        tracing::info!(user_id = %user_id, subscription_id = %id, "user subscribed");
        Ok(subscription)
    }

    /// Renew a subscription on the current terms of its plan.
    ///
    /// Permitted regardless of prior status; an expired or cancelled record
    /// reactivates. The at-most-one-active invariant still wins: if a
    /// *different* subscription holds the user's active claim, renewal fails
    /// with `Conflict`.
    pub fn renew(
        &self,
        id: SubscriptionId,
        discount: u64,
        payment_method: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<UserSubscription> {
        let stored = self.subscriptions.fetch(&id)?;
        let user_id = stored.doc.user_id();
        // The plan may have been deleted since this record was written.
        let plan = self
            .plans
            .get(&stored.doc.plan_id())?
            .ok_or_else(|| {
                DomainError::not_found("subscription's plan no longer exists; subscribe to a current plan")
            })?
            .doc;

        // `claim` answers atomically whether this call inserted the entry;
        // only a claim we inserted may be unwound. A concurrent cancel can
        // release the claim between two separate index calls, so the holder
        // must not be re-read out of band.
        let newly_claimed = self.active_claims.claim(user_id, id).map_err(|_| {
            DomainError::conflict("user has a different active subscription")
        })?;

        let result = self
            .subscriptions
            .update(&id, ExpectedRevision::Exact(stored.revision), |sub| {
                sub.renew(&plan, discount, payment_method.clone(), now);
                Ok(sub.clone())
            });
        match result {
            Ok(subscription) => {
                self.set_back_reference(user_id, Some(id))?;
                tracing::info!(subscription_id = %id, renewal = subscription.renewal_count(), "subscription renewed");
                Ok(subscription)
            }
            Err(e) => {
                if newly_claimed {
                    self.active_claims.release(&user_id, &id)?;
                }
                Err(e)
            }
        }
    }

    /// Cancel a subscription, recording the reason and timestamp; the user's
    /// back-reference is cleared in the same operation.
    pub fn cancel(
        &self,
        id: SubscriptionId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<UserSubscription> {
        let subscription = self.subscriptions.update(&id, ExpectedRevision::Any, |sub| {
            sub.cancel(reason.clone(), now);
            Ok(sub.clone())
        })?;
        let user_id = subscription.user_id();
        self.active_claims.release(&user_id, &id)?;
        self.clear_back_reference(user_id, id)?;
        tracing::info!(subscription_id = %id, "subscription cancelled");
        Ok(subscription)
    }

    /// The user's currently valid subscription.
    ///
    /// Lazy expiry: a stored-active record past its end date answers
    /// `NotFound` here; its stored status is rewritten only by the sweep.
    pub fn get_active_subscription(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<UserSubscription> {
        let id = self
            .active_claims
            .holder(&user_id)?
            .ok_or_else(|| DomainError::not_found("no active subscription for this user"))?;
        let subscription = self.subscriptions.fetch(&id)?.doc;
        if !subscription.is_current(now) {
            return Err(DomainError::not_found("no active subscription for this user"));
        }
        Ok(subscription)
    }

    pub fn list_subscriptions(
        &self,
        filter: SubscriptionListFilter,
        request: PageRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<Page<UserSubscription>> {
        let mut subscriptions: Vec<_> = self
            .subscriptions
            .snapshot()?
            .into_iter()
            .filter(|s| {
                filter.status.is_none_or(|status| s.status() == status)
                    && (!filter.expired_only || s.is_lapsed(now))
            })
            .collect();
        subscriptions.sort_by_key(|s| std::cmp::Reverse(s.created_at()));
        Ok(paginate(subscriptions, request))
    }

    /// Transition every lapsed record to `expired`, releasing its active
    /// claim and clearing the back-reference. Idempotent; safe to run
    /// concurrently with itself and with subscribe/renew on other records.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let lapsed: Vec<SubscriptionId> = self
            .subscriptions
            .snapshot()?
            .into_iter()
            .filter(|s| s.is_lapsed(now))
            .map(|s| *s.id())
            .collect();

        let mut swept = 0;
        for id in lapsed {
            let expired = self
                .subscriptions
                .update(&id, ExpectedRevision::Any, |sub| Ok(sub.expire(now).then(|| sub.user_id())))?;
            // `expire` reports false when someone renewed or cancelled in
            // between; that record is no longer ours to touch.
            if let Some(user_id) = expired {
                self.active_claims.release(&user_id, &id)?;
                self.clear_back_reference(user_id, id)?;
                swept += 1;
            }
        }
        if swept > 0 {
            tracing::info!(swept, "expired subscriptions swept");
        }
        Ok(swept)
    }

    /// Counts by status plus revenue for the current calendar month.
    pub fn stats(&self, now: DateTime<Utc>) -> DomainResult<SubscriptionStats> {
        let subscriptions = self.subscriptions.snapshot()?;
        let mut stats = SubscriptionStats {
            total_active: 0,
            total_lapsed: 0,
            total_cancelled: 0,
            monthly_revenue: 0,
        };
        for sub in &subscriptions {
            match sub.status() {
                SubscriptionStatus::Active if sub.is_lapsed(now) => stats.total_lapsed += 1,
                SubscriptionStatus::Active => stats.total_active += 1,
                SubscriptionStatus::Cancelled => stats.total_cancelled += 1,
                SubscriptionStatus::Expired | SubscriptionStatus::Pending => {}
            }
            let created = sub.created_at();
            if created.year() == now.year() && created.month() == now.month() {
                stats.monthly_revenue += sub.amount_paid();
            }
        }
        Ok(stats)
    }

    /// Keep the materialized back-reference in step with the status change
    /// it belongs to; never a separate best-effort step.
    fn set_back_reference(
        &self,
        user_id: UserId,
        subscription: Option<SubscriptionId>,
    ) -> DomainResult<()> {
        self.members.update(&user_id, ExpectedRevision::Any, |member| {
            member.current_subscription = subscription;
            Ok(())
        })
    }

    /// Clear the back-reference only if it still points at `id`; cancelling
    /// an old record must not wipe a newer subscription's reference.
    fn clear_back_reference(&self, user_id: UserId, id: SubscriptionId) -> DomainResult<()> {
        self.members.update(&user_id, ExpectedRevision::Any, |member| {
            if member.current_subscription == Some(id) {
                member.current_subscription = None;
            }
            Ok(())
        })
    }
}
