use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use gymops_core::{DomainResult, Entity, PlanId, SubscriptionId, UserId};

use crate::plan::Plan;

/// Subscription status lifecycle.
///
/// `pending → active → {expired, cancelled}`; renewal re-enters `active`
/// from any status. `expired` and `cancelled` are otherwise terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
    Pending,
}

impl core::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Pending => "pending",
        };
        f.write_str(s)
    }
}

/// The computed monetary and date terms of a subscription period.
///
/// An explicit pure function rather than a persistence hook: Subscribe and
/// Renew call it, nothing else recomputes dates behind the caller's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTerms {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub amount_paid: u64,
}

impl SubscriptionTerms {
    pub fn compute(plan: &Plan, discount: u64, now: DateTime<Utc>) -> Self {
        Self {
            start_date: now,
            end_date: now + Duration::days(plan.duration_days()),
            amount_paid: plan.price().saturating_sub(discount),
        }
    }
}

/// A member's enrolment in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSubscription {
    id: SubscriptionId,
    user_id: UserId,
    plan_id: PlanId,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: SubscriptionStatus,
    payment_method: Option<String>,
    amount_paid: u64,
    discount_amount: u64,
    renewal_count: u32,
    cancellation_reason: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl UserSubscription {
    /// Start a new subscription, immediately active.
    ///
    /// The plan-active and at-most-one-active checks belong to the caller;
    /// this constructor only derives the terms.
    pub fn subscribe(
        id: SubscriptionId,
        user_id: UserId,
        plan: &Plan,
        discount: u64,
        payment_method: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let terms = SubscriptionTerms::compute(plan, discount, now);
        Ok(Self {
            id,
            user_id,
            plan_id: *plan.id(),
            start_date: terms.start_date,
            end_date: terms.end_date,
            status: SubscriptionStatus::Active,
            payment_method,
            amount_paid: terms.amount_paid,
            discount_amount: discount,
            renewal_count: 0,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: now,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    pub fn amount_paid(&self) -> u64 {
        self.amount_paid
    }

    pub fn discount_amount(&self) -> u64 {
        self.discount_amount
    }

    pub fn renewal_count(&self) -> u32 {
        self.renewal_count
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Lazy-expiry read contract: active *and* not past its end date.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date >= now
    }

    /// Stored as active but past its end date: logically expired, awaiting
    /// the sweep.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date < now
    }

    /// Re-enter `active` on the *current* plan's terms, regardless of prior
    /// status; expired and cancelled records reactivate.
    pub fn renew(
        &mut self,
        plan: &Plan,
        discount: u64,
        payment_method: Option<String>,
        now: DateTime<Utc>,
    ) {
        let terms = SubscriptionTerms::compute(plan, discount, now);
        self.plan_id = *plan.id();
        self.start_date = terms.start_date;
        self.end_date = terms.end_date;
        self.amount_paid = terms.amount_paid;
        self.discount_amount = discount;
        self.status = SubscriptionStatus::Active;
        self.payment_method = payment_method;
        self.cancellation_reason = None;
        self.cancelled_at = None;
        self.renewal_count += 1;
    }

    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Cancelled;
        self.cancellation_reason = reason;
        self.cancelled_at = Some(now);
    }

    /// Sweep transition: stored-active past end date becomes `expired`.
    /// Returns whether anything changed, so the sweep stays idempotent.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_lapsed(now) {
            return false;
        }
        self.status = SubscriptionStatus::Expired;
        true
    }
}

impl Entity for UserSubscription {
    type Id = SubscriptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::NewPlan;
    use gymops_core::PlanId;

    fn plan(price: u64, duration_days: i64) -> Plan {
        Plan::create(
            PlanId::new(),
            NewPlan {
                name: "Gold".to_string(),
                description: None,
                price,
                duration_days,
                features: vec![],
                is_active: true,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn terms_apply_discount_with_floor_at_zero() {
        let now = Utc::now();
        let p = plan(1000, 30);

        let terms = SubscriptionTerms::compute(&p, 100, now);
        assert_eq!(terms.amount_paid, 900);
        assert_eq!(terms.end_date, now + Duration::days(30));

        let terms = SubscriptionTerms::compute(&p, 5000, now);
        assert_eq!(terms.amount_paid, 0);
    }

    #[test]
    fn subscribe_starts_active_with_zero_renewals() {
        let now = Utc::now();
        let p = plan(1000, 30);
        let sub =
            UserSubscription::subscribe(SubscriptionId::new(), UserId::new(), &p, 100, None, now)
                .unwrap();
        assert_eq!(sub.status(), SubscriptionStatus::Active);
        assert_eq!(sub.amount_paid(), 900);
        assert_eq!(sub.renewal_count(), 0);
        assert_eq!(sub.end_date(), now + Duration::days(30));
    }

    #[test]
    fn renew_resets_dates_from_renewal_time_and_current_plan() {
        let now = Utc::now();
        let p = plan(1000, 30);
        let mut sub =
            UserSubscription::subscribe(SubscriptionId::new(), UserId::new(), &p, 0, None, now)
                .unwrap();

        // One day before expiry, on a plan whose duration has changed.
        let longer = plan(1200, 90);
        let renewal_time = now + Duration::days(29);
        sub.renew(&longer, 0, None, renewal_time);

        assert_eq!(sub.start_date(), renewal_time);
        assert_eq!(sub.end_date(), renewal_time + Duration::days(90));
        assert_eq!(sub.amount_paid(), 1200);
        assert_eq!(sub.renewal_count(), 1);
    }

    #[test]
    fn renew_reactivates_cancelled_and_expired_records() {
        let now = Utc::now();
        let p = plan(1000, 30);
        let mut sub =
            UserSubscription::subscribe(SubscriptionId::new(), UserId::new(), &p, 0, None, now)
                .unwrap();
        sub.cancel(Some("moving away".to_string()), now);
        assert_eq!(sub.status(), SubscriptionStatus::Cancelled);

        sub.renew(&p, 0, None, now + Duration::days(200));
        assert_eq!(sub.status(), SubscriptionStatus::Active);
        assert_eq!(sub.cancellation_reason(), None);
        assert!(sub.is_current(now + Duration::days(201)));
    }

    #[test]
    fn lazy_expiry_predicates() {
        let now = Utc::now();
        let p = plan(1000, 30);
        let sub =
            UserSubscription::subscribe(SubscriptionId::new(), UserId::new(), &p, 0, None, now)
                .unwrap();

        let before_end = now + Duration::days(29);
        let after_end = now + Duration::days(31);
        assert!(sub.is_current(before_end));
        assert!(!sub.is_current(after_end));
        assert!(sub.is_lapsed(after_end));
        assert!(!sub.is_lapsed(before_end));
    }

    #[test]
    fn expire_only_touches_lapsed_records() {
        let now = Utc::now();
        let p = plan(1000, 30);
        let mut sub =
            UserSubscription::subscribe(SubscriptionId::new(), UserId::new(), &p, 0, None, now)
                .unwrap();

        assert!(!sub.expire(now + Duration::days(1)));
        assert_eq!(sub.status(), SubscriptionStatus::Active);

        assert!(sub.expire(now + Duration::days(31)));
        assert_eq!(sub.status(), SubscriptionStatus::Expired);

        // Second sweep is a no-op.
        assert!(!sub.expire(now + Duration::days(32)));
    }

    #[test]
    fn status_serializes_with_lowercase_vocabulary() {
        let json = serde_json::to_string(&SubscriptionStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
