// SPDX-FileCopyrightText: 2026 FlowBot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory repositories, one per persisted entity.
//!
//! Each engine owns the repository it mutates; the persistence service only
//! takes snapshots out and puts hydrated snapshots back in.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use flowbot_core::{ChatQuota, StateSnapshot, StreakRecord, UserId};

/// Streak records keyed by user.
#[derive(Debug, Default)]
pub struct StreakRepository {
    records: DashMap<UserId, StreakRecord>,
}

impl StreakRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: UserId) -> Option<StreakRecord> {
        self.records.get(&user).map(|r| *r)
    }

    pub fn upsert(&self, user: UserId, record: StreakRecord) {
        self.records.insert(user, record);
    }

    pub fn delete(&self, user: UserId) -> Option<StreakRecord> {
        self.records.remove(&user).map(|(_, r)| r)
    }

    /// Delete the record only while `predicate` still holds for it.
    ///
    /// Used by the sweep so a completion that lands between evaluation and
    /// deletion is not lost.
    pub fn delete_if(
        &self,
        user: UserId,
        predicate: impl FnOnce(&StreakRecord) -> bool,
    ) -> Option<StreakRecord> {
        self.records
            .remove_if(&user, |_, r| predicate(r))
            .map(|(_, r)| r)
    }

    /// Apply `f` to the user's record under the shard lock, creating it
    /// with `init` when absent. Returns whatever `f` returns.
    pub fn upsert_with<R>(
        &self,
        user: UserId,
        init: impl FnOnce() -> StreakRecord,
        f: impl FnOnce(&mut StreakRecord, bool) -> R,
    ) -> R {
        let mut created = false;
        let mut entry = self.records.entry(user).or_insert_with(|| {
            created = true;
            init()
        });
        f(entry.value_mut(), created)
    }

    /// Mutate an existing record. Returns `false` when the user has none.
    pub fn update(&self, user: UserId, f: impl FnOnce(&mut StreakRecord)) -> bool {
        match self.records.get_mut(&user) {
            Some(mut record) => {
                f(record.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<UserId, StreakRecord> {
        self.records.iter().map(|e| (*e.key(), *e.value())).collect()
    }

    pub fn replace(&self, records: BTreeMap<UserId, StreakRecord>) {
        self.records.clear();
        for (user, record) in records {
            self.records.insert(user, record);
        }
    }
}

/// Lifetime message counts keyed by user.
#[derive(Debug, Default)]
pub struct MessageCounter {
    counts: DashMap<UserId, u64>,
}

impl MessageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more message for `user` and return the new total.
    pub fn increment(&self, user: UserId) -> u64 {
        let mut count = self.counts.entry(user).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn get(&self, user: UserId) -> u64 {
        self.counts.get(&user).map(|c| *c).unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<UserId, u64> {
        self.counts.iter().map(|e| (*e.key(), *e.value())).collect()
    }

    pub fn replace(&self, counts: BTreeMap<UserId, u64>) {
        self.counts.clear();
        for (user, count) in counts {
            self.counts.insert(user, count);
        }
    }
}

/// Outcome of asking the quota repository for one more relay call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Allowed; `used` is the count after this call.
    Granted { used: u32 },
    /// The daily cap is already reached.
    Exhausted { limit: u32 },
}

/// Per-day relay usage keyed by user.
#[derive(Debug, Default)]
pub struct ChatQuotaRepository {
    quotas: DashMap<UserId, ChatQuota>,
}

impl ChatQuotaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user: UserId) -> Option<ChatQuota> {
        self.quotas.get(&user).map(|q| *q)
    }

    pub fn upsert(&self, user: UserId, quota: ChatQuota) {
        self.quotas.insert(user, quota);
    }

    /// Reset the user's quota if it belongs to another day, then take one
    /// call from it. `limit` of `None` means the user is exempt.
    pub fn consume(&self, user: UserId, today: NaiveDate, limit: Option<u32>) -> QuotaDecision {
        let mut quota = self
            .quotas
            .entry(user)
            .or_insert_with(|| ChatQuota::fresh(today));
        if !quota.is_for(today) {
            *quota = ChatQuota::fresh(today);
        }
        if let Some(limit) = limit
            && quota.count >= limit
        {
            return QuotaDecision::Exhausted { limit };
        }
        quota.count = quota.count.saturating_add(1);
        QuotaDecision::Granted { used: quota.count }
    }

    pub fn snapshot(&self) -> BTreeMap<UserId, ChatQuota> {
        self.quotas.iter().map(|e| (*e.key(), *e.value())).collect()
    }

    pub fn replace(&self, quotas: BTreeMap<UserId, ChatQuota>) {
        self.quotas.clear();
        for (user, quota) in quotas {
            self.quotas.insert(user, quota);
        }
    }
}

/// Shared handles to every repository.
#[derive(Debug, Clone, Default)]
pub struct Repositories {
    pub streaks: Arc<StreakRepository>,
    pub messages: Arc<MessageCounter>,
    pub chats: Arc<ChatQuotaRepository>,
}

impl Repositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every record out for persistence.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            streaks: self.streaks.snapshot(),
            messages: self.messages.snapshot(),
            chats: self.chats.snapshot(),
        }
    }

    /// Replace all in-memory state with `snapshot`.
    pub fn restore(&self, snapshot: StateSnapshot) {
        self.streaks.replace(snapshot.streaks);
        self.messages.replace(snapshot.messages);
        self.chats.replace(snapshot.chats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn message_counter_starts_at_zero_and_increments() {
        let counter = MessageCounter::new();
        assert_eq!(counter.get(UserId(1)), 0);
        assert_eq!(counter.increment(UserId(1)), 1);
        assert_eq!(counter.increment(UserId(1)), 2);
        assert_eq!(counter.get(UserId(1)), 2);
        assert_eq!(counter.get(UserId(2)), 0);
    }

    #[test]
    fn quota_caps_non_exempt_users() {
        let repo = ChatQuotaRepository::new();
        let today = date(2026, 5, 1);
        for used in 1..=3 {
            assert_eq!(
                repo.consume(UserId(7), today, Some(3)),
                QuotaDecision::Granted { used }
            );
        }
        assert_eq!(
            repo.consume(UserId(7), today, Some(3)),
            QuotaDecision::Exhausted { limit: 3 }
        );
        assert_eq!(repo.get(UserId(7)).unwrap().count, 3);
    }

    #[test]
    fn quota_resets_on_new_day() {
        let repo = ChatQuotaRepository::new();
        for _ in 0..3 {
            repo.consume(UserId(7), date(2026, 5, 1), Some(3));
        }
        assert_eq!(
            repo.consume(UserId(7), date(2026, 5, 2), Some(3)),
            QuotaDecision::Granted { used: 1 }
        );
        let quota = repo.get(UserId(7)).unwrap();
        assert_eq!((quota.day, quota.month), (2, 5));
    }

    #[test]
    fn quota_resets_when_only_month_differs() {
        let repo = ChatQuotaRepository::new();
        for _ in 0..3 {
            repo.consume(UserId(7), date(2026, 5, 1), Some(3));
        }
        assert!(matches!(
            repo.consume(UserId(7), date(2026, 6, 1), Some(3)),
            QuotaDecision::Granted { used: 1 }
        ));
    }

    #[test]
    fn exempt_users_are_never_capped() {
        let repo = ChatQuotaRepository::new();
        for used in 1..=10 {
            assert_eq!(
                repo.consume(UserId(9), date(2026, 5, 1), None),
                QuotaDecision::Granted { used }
            );
        }
    }

    #[test]
    fn delete_if_respects_predicate() {
        let repo = StreakRepository::new();
        repo.upsert(UserId(1), StreakRecord::started_on(date(2026, 1, 1)));
        assert!(repo.delete_if(UserId(1), |r| r.value > 5).is_none());
        assert!(repo.get(UserId(1)).is_some());
        assert!(repo.delete_if(UserId(1), |r| r.value == 1).is_some());
        assert!(repo.is_empty());
    }

    #[test]
    fn snapshot_and_restore_round_trip() {
        let repos = Repositories::new();
        repos
            .streaks
            .upsert(UserId(1), StreakRecord::started_on(date(2026, 1, 1)));
        repos.messages.increment(UserId(2));
        repos.chats.consume(UserId(3), date(2026, 1, 1), Some(3));

        let snapshot = repos.snapshot();
        assert_eq!(snapshot.len(), 3);

        let restored = Repositories::new();
        restored.messages.increment(UserId(99));
        restored.restore(snapshot.clone());
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.messages.get(UserId(99)), 0);
    }

    #[test]
    fn replace_through_shared_handle_drops_stale_entries() {
        let streaks = Arc::new(StreakRepository::new());
        let handle = streaks.clone();
        handle.upsert(UserId(1), StreakRecord::started_on(date(2026, 1, 1)));

        let mut fresh = BTreeMap::new();
        fresh.insert(UserId(2), StreakRecord::started_on(date(2026, 1, 2)));
        fresh.insert(UserId(3), StreakRecord::started_on(date(2026, 1, 3)));
        handle.replace(fresh.clone());

        assert_eq!(streaks.snapshot(), fresh);
        assert!(streaks.get(UserId(1)).is_none());
    }
}
