use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use teloxide::types::UserId;

/// Where a user is in the verification dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyState {
    /// Waiting for them to send their room number.
    AwaitingRoom,
    /// Room received, waiting for the roll number.
    AwaitingRoll { room: String },
}

/// Outcome of feeding one reply into the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The reply failed validation; the dialogue stays where it was.
    Invalid,
    /// Room number accepted, now waiting for the roll number.
    RoomRecorded { room: String },
    /// Roll number accepted; the verification data is complete.
    Verified { room: String, roll: String },
}

/// Advance the dialogue by one user reply.
///
/// Pure function; updating the session map and talking to Telegram is
/// the caller's business.
#[must_use]
pub fn advance(state: &VerifyState, input: &str) -> Step {
    let input = input.trim();
    if !is_all_digits(input) {
        return Step::Invalid;
    }
    match state {
        VerifyState::AwaitingRoom => Step::RoomRecorded {
            room: input.to_string(),
        },
        VerifyState::AwaitingRoll { room } => Step::Verified {
            room: room.clone(),
            roll: input.to_string(),
        },
    }
}

/// True for non-empty strings of ASCII decimal digits, and nothing else.
/// No length cap and no range check; "007" is a fine room number here.
fn is_all_digits(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}

/// Active verification dialogues, keyed by the user going through them.
/// A user has at most one; starting a new one replaces the old.
#[derive(Debug, Default)]
pub struct Sessions(Mutex<HashMap<UserId, VerifyState>>);

impl Sessions {
    #[must_use]
    pub fn new() -> Sessions {
        Sessions::default()
    }

    /// Start (or restart) the dialogue for this user.
    pub fn begin(&self, user_id: UserId) {
        self.lock().insert(user_id, VerifyState::AwaitingRoom);
    }

    /// Feed one reply into this user's dialogue.
    ///
    /// Returns `None` if they have no dialogue going, which is also what
    /// a stale or duplicate update resolves to. On [`Step::Verified`] the
    /// session is gone; on [`Step::Invalid`] it stays put for another try.
    pub fn advance(&self, user_id: UserId, input: &str) -> Option<Step> {
        let mut map = self.lock();
        let state = map.get(&user_id)?;
        let step = advance(state, input);
        match &step {
            Step::Invalid => {}
            Step::RoomRecorded { room } => {
                map.insert(
                    user_id,
                    VerifyState::AwaitingRoll { room: room.clone() },
                );
            }
            Step::Verified { .. } => {
                map.remove(&user_id);
            }
        }
        Some(step)
    }

    /// Drop this user's dialogue. True if there was one to drop.
    pub fn cancel(&self, user_id: UserId) -> bool {
        self.lock().remove(&user_id).is_some()
    }

    /// True if this user is mid-dialogue.
    #[must_use]
    pub fn is_active(&self, user_id: UserId) -> bool {
        self.lock().contains_key(&user_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, VerifyState>> {
        self.0.lock().expect("Session map lock poisoned!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_validation() {
        assert!(is_all_digits("4"));
        assert!(is_all_digits("007"));
        assert!(is_all_digits("123456789012345678901234567890"));

        assert!(!is_all_digits(""));
        assert!(!is_all_digits("4a"));
        assert!(!is_all_digits("-4"));
        assert!(!is_all_digits("4.5"));
        assert!(!is_all_digits("room 4"));
        // Non-ASCII digits don't count.
        assert!(!is_all_digits("٤"));
    }

    #[test]
    fn transitions_are_pure_and_ordered() {
        let step = advance(&VerifyState::AwaitingRoom, " 4 ");
        assert_eq!(step, Step::RoomRecorded { room: "4".to_string() });

        let state = VerifyState::AwaitingRoll {
            room: "4".to_string(),
        };
        let step = advance(&state, "5");
        assert_eq!(
            step,
            Step::Verified {
                room: "4".to_string(),
                roll: "5".to_string(),
            }
        );
    }

    #[test]
    fn invalid_input_does_not_advance() {
        assert_eq!(advance(&VerifyState::AwaitingRoom, "four"), Step::Invalid);
        assert_eq!(advance(&VerifyState::AwaitingRoom, ""), Step::Invalid);

        let state = VerifyState::AwaitingRoll {
            room: "4".to_string(),
        };
        assert_eq!(advance(&state, "#5"), Step::Invalid);
    }

    #[test]
    fn full_dialogue_through_the_session_map() {
        let sessions = Sessions::new();
        let user = UserId(42);

        sessions.begin(user);
        assert!(sessions.is_active(user));

        assert_eq!(
            sessions.advance(user, "4"),
            Some(Step::RoomRecorded { room: "4".to_string() })
        );
        // Still active between the two questions.
        assert!(sessions.is_active(user));

        assert_eq!(
            sessions.advance(user, "5"),
            Some(Step::Verified {
                room: "4".to_string(),
                roll: "5".to_string(),
            })
        );
        // Completion destroys the session.
        assert!(!sessions.is_active(user));
    }

    #[test]
    fn invalid_replies_keep_the_session_where_it_was() {
        let sessions = Sessions::new();
        let user = UserId(42);

        sessions.begin(user);
        assert_eq!(sessions.advance(user, "not a number"), Some(Step::Invalid));
        assert_eq!(sessions.advance(user, ""), Some(Step::Invalid));

        // Still awaiting the room number, so a digit is taken as one.
        assert_eq!(
            sessions.advance(user, "7"),
            Some(Step::RoomRecorded { room: "7".to_string() })
        );
    }

    #[test]
    fn advancing_without_a_session_is_a_no_op() {
        let sessions = Sessions::new();
        assert_eq!(sessions.advance(UserId(42), "4"), None);
    }

    #[test]
    fn cancellation_destroys_the_session() {
        let sessions = Sessions::new();
        let user = UserId(42);

        sessions.begin(user);
        assert!(sessions.cancel(user));
        assert!(!sessions.is_active(user));
        // Cancelling twice finds nothing.
        assert!(!sessions.cancel(user));
    }

    #[test]
    fn restarting_resets_to_the_first_question() {
        let sessions = Sessions::new();
        let user = UserId(42);

        sessions.begin(user);
        sessions.advance(user, "4").unwrap();
        sessions.begin(user);

        // Back at the room question, not the roll one.
        assert_eq!(
            sessions.advance(user, "9"),
            Some(Step::RoomRecorded { room: "9".to_string() })
        );
    }
}
