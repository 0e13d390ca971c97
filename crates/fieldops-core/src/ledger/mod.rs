//! Capacity ledger: reserved hours per engineer per day and per ISO week.
//!
//! The ledger is the only place consumed capacity lives. It knows nothing
//! about tasks; callers reserve and release hours against `(engineer, date)`.
//!
//! Invariant kept by `reserve`: for every engineer, the daily and weekly sums
//! never exceed the engineer's registered ceilings.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::domain::{EngineerId, EngineerRecord, Hours};

/// Monday of the ISO week containing `date`.
///
/// The calendar's first, partial week is keyed by `NaiveDate::MIN`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = Days::new(u64::from(date.weekday().num_days_from_monday()));
    date.checked_sub_days(offset).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapacityLimits {
    pub per_day: Hours,
    pub per_week: Hours,
}

impl From<&EngineerRecord> for CapacityLimits {
    fn from(engineer: &EngineerRecord) -> Self {
        Self {
            per_day: engineer.max_hours_per_day,
            per_week: engineer.max_hours_per_week,
        }
    }
}

/// Which ceiling a reservation ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityScope {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("capacity exceeded for {engineer_id} on {date}: {scope:?} load {load} + {requested} > {limit}")]
pub struct CapacityExceeded {
    pub engineer_id: EngineerId,
    pub date: NaiveDate,
    pub scope: CapacityScope,
    pub load: Hours,
    pub requested: Hours,
    pub limit: Hours,
}

#[derive(Debug, Clone, Default)]
pub struct CapacityLedger {
    limits: HashMap<EngineerId, CapacityLimits>,
    daily: BTreeMap<(EngineerId, NaiveDate), Hours>,
    weekly: BTreeMap<(EngineerId, NaiveDate), Hours>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or updates) an engineer's ceilings. Unregistered engineers
    /// have zero capacity.
    pub fn set_limits(&mut self, engineer_id: EngineerId, limits: CapacityLimits) {
        self.limits.insert(engineer_id, limits);
    }

    pub fn limits(&self, engineer_id: EngineerId) -> CapacityLimits {
        self.limits.get(&engineer_id).copied().unwrap_or_default()
    }

    /// Debits `hours` on `date` and its week, or changes nothing.
    ///
    /// Both ceilings are checked before either map is touched.
    pub fn reserve(
        &mut self,
        engineer_id: EngineerId,
        date: NaiveDate,
        hours: Hours,
    ) -> Result<(), CapacityExceeded> {
        let limits = self.limits(engineer_id);
        let daily = self.daily_load(engineer_id, date);
        let weekly = self.weekly_load(engineer_id, date);

        let exceeded = |scope, load: Hours, limit: Hours| CapacityExceeded {
            engineer_id,
            date,
            scope,
            load,
            requested: hours,
            limit,
        };

        match daily.checked_add(hours) {
            Some(next) if next <= limits.per_day => {}
            _ => return Err(exceeded(CapacityScope::Daily, daily, limits.per_day)),
        }
        match weekly.checked_add(hours) {
            Some(next) if next <= limits.per_week => {}
            _ => return Err(exceeded(CapacityScope::Weekly, weekly, limits.per_week)),
        }

        self.debit(engineer_id, date, hours);
        Ok(())
    }

    /// Moves one reservation from `from` to `to`, or changes nothing.
    ///
    /// The hours must have been reserved on `from` earlier.
    pub fn transfer(
        &mut self,
        engineer_id: EngineerId,
        from: NaiveDate,
        to: NaiveDate,
        hours: Hours,
    ) -> Result<(), CapacityExceeded> {
        self.release(engineer_id, from, hours);
        if let Err(exceeded) = self.reserve(engineer_id, to, hours) {
            self.reinstate(engineer_id, from, hours);
            return Err(exceeded);
        }
        Ok(())
    }

    /// Puts back hours released earlier under the same lock. No ceiling check:
    /// the hours fitted before they were released.
    pub(crate) fn reinstate(&mut self, engineer_id: EngineerId, date: NaiveDate, hours: Hours) {
        self.debit(engineer_id, date, hours);
    }

    fn debit(&mut self, engineer_id: EngineerId, date: NaiveDate, hours: Hours) {
        *self.daily.entry((engineer_id, date)).or_default() += hours;
        *self.weekly.entry((engineer_id, week_start(date))).or_default() += hours;
    }

    /// Credits `hours` back. Saturates at zero; always succeeds.
    pub fn release(&mut self, engineer_id: EngineerId, date: NaiveDate, hours: Hours) {
        Self::credit(&mut self.daily, (engineer_id, date), hours);
        Self::credit(&mut self.weekly, (engineer_id, week_start(date)), hours);
    }

    fn credit(map: &mut BTreeMap<(EngineerId, NaiveDate), Hours>, key: (EngineerId, NaiveDate), hours: Hours) {
        if let Some(load) = map.get_mut(&key) {
            *load = load.saturating_sub(hours);
            if load.is_zero() {
                map.remove(&key);
            }
        }
    }

    pub fn daily_load(&self, engineer_id: EngineerId, date: NaiveDate) -> Hours {
        self.daily
            .get(&(engineer_id, date))
            .copied()
            .unwrap_or_default()
    }

    /// Load of the ISO week containing `date`.
    pub fn weekly_load(&self, engineer_id: EngineerId, date: NaiveDate) -> Hours {
        self.weekly
            .get(&(engineer_id, week_start(date)))
            .copied()
            .unwrap_or_default()
    }

    pub fn remaining_daily(&self, engineer_id: EngineerId, date: NaiveDate) -> Hours {
        self.limits(engineer_id)
            .per_day
            .saturating_sub(self.daily_load(engineer_id, date))
    }

    pub fn remaining_weekly(&self, engineer_id: EngineerId, date: NaiveDate) -> Hours {
        self.limits(engineer_id)
            .per_week
            .saturating_sub(self.weekly_load(engineer_id, date))
    }

    /// Days with a non-zero load for one engineer, in date order.
    pub fn daily_breakdown(&self, engineer_id: EngineerId) -> Vec<(NaiveDate, Hours)> {
        self.daily
            .range((engineer_id, NaiveDate::MIN)..=(engineer_id, NaiveDate::MAX))
            .map(|(&(_, date), &hours)| (date, hours))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{day, engineer_id};
    use rstest::rstest;

    fn ledger() -> CapacityLedger {
        let mut ledger = CapacityLedger::new();
        ledger.set_limits(
            engineer_id(1),
            CapacityLimits {
                per_day: Hours::whole(10),
                per_week: Hours::whole(40),
            },
        );
        ledger
    }

    #[rstest]
    #[case::monday(15, 15)]
    #[case::wednesday(17, 15)]
    #[case::sunday(21, 15)]
    #[case::next_monday(22, 22)]
    fn week_starts_on_monday(#[case] date: u32, #[case] monday: u32) {
        assert_eq!(week_start(day(date)), day(monday));
    }

    #[test]
    fn week_start_never_leaves_the_calendar() {
        assert_eq!(week_start(NaiveDate::MIN), NaiveDate::MIN);
        assert_eq!(week_start(NaiveDate::MAX).weekday(), chrono::Weekday::Mon);

        let mut ledger = ledger();
        ledger.reserve(engineer_id(1), NaiveDate::MIN, Hours::whole(2)).unwrap();
        assert_eq!(ledger.weekly_load(engineer_id(1), NaiveDate::MIN), Hours::whole(2));
    }

    #[test]
    fn reserve_debits_day_and_week() {
        let mut ledger = ledger();
        ledger.reserve(engineer_id(1), day(15), Hours::whole(5)).unwrap();
        ledger.reserve(engineer_id(1), day(16), Hours::whole(3)).unwrap();

        assert_eq!(ledger.daily_load(engineer_id(1), day(15)), Hours::whole(5));
        assert_eq!(ledger.weekly_load(engineer_id(1), day(19)), Hours::whole(8));
        assert_eq!(ledger.remaining_daily(engineer_id(1), day(15)), Hours::whole(5));
        assert_eq!(ledger.remaining_weekly(engineer_id(1), day(15)), Hours::whole(32));
    }

    #[test]
    fn reserve_up_to_the_ceiling_is_allowed() {
        let mut ledger = ledger();
        ledger.reserve(engineer_id(1), day(15), Hours::whole(10)).unwrap();
        assert_eq!(ledger.remaining_daily(engineer_id(1), day(15)), Hours::ZERO);
    }

    #[test]
    fn daily_ceiling_rejects_without_side_effects() {
        let mut ledger = ledger();
        ledger.reserve(engineer_id(1), day(15), Hours::whole(8)).unwrap();

        let err = ledger.reserve(engineer_id(1), day(15), Hours::whole(5)).unwrap_err();
        assert_eq!(err.scope, CapacityScope::Daily);
        assert_eq!(err.load, Hours::whole(8));
        assert_eq!(ledger.daily_load(engineer_id(1), day(15)), Hours::whole(8));
        assert_eq!(ledger.weekly_load(engineer_id(1), day(15)), Hours::whole(8));
    }

    #[test]
    fn weekly_ceiling_rejects_even_with_daily_room() {
        let mut ledger = ledger();
        for d in 15..=18 {
            ledger.reserve(engineer_id(1), day(d), Hours::whole(10)).unwrap();
        }

        let err = ledger.reserve(engineer_id(1), day(19), Hours::whole(1)).unwrap_err();
        assert_eq!(err.scope, CapacityScope::Weekly);
        assert_eq!(ledger.daily_load(engineer_id(1), day(19)), Hours::ZERO);

        // next ISO week starts fresh
        ledger.reserve(engineer_id(1), day(22), Hours::whole(10)).unwrap();
    }

    #[test]
    fn unregistered_engineer_has_no_capacity() {
        let mut ledger = ledger();
        assert!(ledger.reserve(engineer_id(9), day(15), Hours::whole(1)).is_err());
    }

    #[test]
    fn release_restores_and_saturates() {
        let mut ledger = ledger();
        ledger.reserve(engineer_id(1), day(15), Hours::whole(5)).unwrap();
        ledger.release(engineer_id(1), day(15), Hours::whole(5));

        assert_eq!(ledger.daily_load(engineer_id(1), day(15)), Hours::ZERO);
        assert!(ledger.daily_breakdown(engineer_id(1)).is_empty());

        ledger.release(engineer_id(1), day(15), Hours::whole(3));
        assert_eq!(ledger.weekly_load(engineer_id(1), day(15)), Hours::ZERO);
    }

    #[test]
    fn transfer_moves_hours_between_days() {
        let mut ledger = ledger();
        ledger.reserve(engineer_id(1), day(15), Hours::whole(5)).unwrap();

        ledger.transfer(engineer_id(1), day(15), day(22), Hours::whole(5)).unwrap();

        assert_eq!(ledger.daily_load(engineer_id(1), day(15)), Hours::ZERO);
        assert_eq!(ledger.weekly_load(engineer_id(1), day(15)), Hours::ZERO);
        assert_eq!(ledger.daily_load(engineer_id(1), day(22)), Hours::whole(5));
    }

    #[test]
    fn failed_transfer_keeps_the_original_reservation() {
        let mut ledger = ledger();
        ledger.reserve(engineer_id(1), day(15), Hours::whole(5)).unwrap();
        ledger.reserve(engineer_id(1), day(16), Hours::whole(8)).unwrap();

        let err = ledger
            .transfer(engineer_id(1), day(15), day(16), Hours::whole(5))
            .unwrap_err();

        assert_eq!(err.scope, CapacityScope::Daily);
        assert_eq!(ledger.daily_load(engineer_id(1), day(15)), Hours::whole(5));
        assert_eq!(ledger.daily_load(engineer_id(1), day(16)), Hours::whole(8));
        assert_eq!(ledger.weekly_load(engineer_id(1), day(15)), Hours::whole(13));
    }

    #[test]
    fn breakdown_is_per_engineer_in_date_order() {
        let mut ledger = ledger();
        ledger.set_limits(
            engineer_id(2),
            CapacityLimits {
                per_day: Hours::whole(10),
                per_week: Hours::whole(40),
            },
        );
        ledger.reserve(engineer_id(1), day(17), Hours::whole(2)).unwrap();
        ledger.reserve(engineer_id(1), day(15), Hours::whole(4)).unwrap();
        ledger.reserve(engineer_id(2), day(16), Hours::whole(6)).unwrap();

        assert_eq!(
            ledger.daily_breakdown(engineer_id(1)),
            vec![(day(15), Hours::whole(4)), (day(17), Hours::whole(2))]
        );
    }
}
