use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use teloxide::types::UserId;

/// A user that joined the group, and how far along verification they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMember {
    pub user_id: UserId,
    pub display_name: String,
    /// Set once when the entry is created, never touched again.
    pub join_time: DateTime<Utc>,
    pub verified: bool,
    /// Digits only. `Some` if and only if `verified`.
    pub room: Option<String>,
    /// Digits only. `Some` if and only if `verified`.
    pub roll: Option<String>,
}

/// Everyone who joined during this process' lifetime, keyed by user ID.
///
/// Entries are never evicted. The group is a few hundred people at most,
/// so nobody has bothered with expiry.
#[derive(Debug, Default)]
pub struct PendingMembers(Mutex<HashMap<UserId, PendingMember>>);

impl PendingMembers {
    #[must_use]
    pub fn new() -> PendingMembers {
        PendingMembers::default()
    }

    /// Record a fresh join. Overwrites any previous entry for this user,
    /// so a re-join restarts their verification from scratch.
    pub fn record_join(
        &self,
        user_id: UserId,
        display_name: &str,
        join_time: DateTime<Utc>,
    ) -> PendingMember {
        let member = PendingMember {
            user_id,
            display_name: display_name.to_string(),
            join_time,
            verified: false,
            room: None,
            roll: None,
        };
        self.lock().insert(user_id, member.clone());
        member
    }

    /// Mark a member as verified and store their room and roll numbers.
    ///
    /// Returns `None` if this user has no entry, i.e. they joined before
    /// the bot was running. The caller decides what to do about that.
    pub fn mark_verified(&self, user_id: UserId, room: &str, roll: &str) -> Option<PendingMember> {
        let mut map = self.lock();
        let member = map.get_mut(&user_id)?;
        member.verified = true;
        member.room = Some(room.to_string());
        member.roll = Some(roll.to_string());
        Some(member.clone())
    }

    /// How many recorded members have not verified yet.
    #[must_use]
    pub fn count_unverified(&self) -> usize {
        self.lock().values().filter(|m| !m.verified).count()
    }

    /// Members that have not verified yet, oldest join first.
    #[must_use]
    pub fn list_unverified(&self) -> Vec<PendingMember> {
        let mut members: Vec<PendingMember> = self
            .lock()
            .values()
            .filter(|m| !m.verified)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.join_time);
        members
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, PendingMember>> {
        self.0.lock().expect("Member map lock poisoned!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn when(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn join_creates_unverified_entry() {
        let members = PendingMembers::new();
        let alice = members.record_join(UserId(42), "Alice", when(0));

        assert!(!alice.verified);
        assert_eq!(alice.join_time, when(0));
        assert_eq!(alice.room, None);
        assert_eq!(alice.roll, None);
        assert_eq!(members.count_unverified(), 1);
    }

    #[test]
    fn rejoin_overwrites_instead_of_duplicating() {
        let members = PendingMembers::new();
        members.record_join(UserId(42), "Alice", when(0));
        members.mark_verified(UserId(42), "4", "5").unwrap();

        // They left and came back. Verification starts over.
        members.record_join(UserId(42), "Alice", when(3));

        let unverified = members.list_unverified();
        assert_eq!(unverified.len(), 1);
        assert_eq!(unverified[0].user_id, UserId(42));
        assert_eq!(unverified[0].join_time, when(3));
        assert_eq!(members.count_unverified(), 1);
    }

    #[test]
    fn verification_fills_room_and_roll() {
        let members = PendingMembers::new();
        members.record_join(UserId(42), "Alice", when(0));

        let alice = members.mark_verified(UserId(42), "4", "5").unwrap();
        assert!(alice.verified);
        assert_eq!(alice.room.as_deref(), Some("4"));
        assert_eq!(alice.roll.as_deref(), Some("5"));
        // Join time survives verification untouched.
        assert_eq!(alice.join_time, when(0));
        assert_eq!(members.count_unverified(), 0);
    }

    #[test]
    fn verifying_a_stranger_reports_not_found() {
        let members = PendingMembers::new();
        assert_eq!(members.mark_verified(UserId(42), "4", "5"), None);
    }

    #[test]
    fn unverified_list_is_ordered_by_join_time() {
        let members = PendingMembers::new();
        members.record_join(UserId(3), "Carol", when(3));
        members.record_join(UserId(1), "Alice", when(1));
        members.record_join(UserId(2), "Bob", when(2));
        members.mark_verified(UserId(2), "4", "5").unwrap();

        let unverified = members.list_unverified();
        let names: Vec<&str> = unverified.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, ["Alice", "Carol"]);
    }
}
