use chrono::{DateTime, Utc};
use html_escape::encode_text;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{ChatId, ParseMode, UserId},
    Bot,
};

use crate::misc::{format_join_time, telegram_retry};

/// One auditable event for the admin log chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEvent {
    /// Someone new showed up in the group.
    MemberJoined {
        user: String,
        user_id: UserId,
        joined: DateTime<Utc>,
        dm_delivered: bool,
    },
    /// Someone finished the verification dialogue.
    VerificationCompleted {
        user: String,
        user_id: UserId,
        room: String,
        roll: String,
        joined: DateTime<Utc>,
    },
    /// A member flagged something for the admins with /report.
    ReportFiled {
        reporter: String,
        reporter_id: UserId,
        chat_title: String,
        text: String,
    },
    /// The owner announced a promotion with /promoted.
    PromotionAnnounced { text: String },
}

impl AdminEvent {
    /// Render this event to its HTML template for the admin log chat.
    ///
    /// Room and roll numbers are digit-validated before they get here;
    /// everything else user-controlled is escaped.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            AdminEvent::MemberJoined {
                user,
                user_id,
                joined,
                dm_delivered,
            } => {
                let dm_status = match dm_delivered {
                    true => "✅ DM sent",
                    false => "❌ DM failed",
                };
                format!(
                    "🆕 <b>New Member Joined</b>\n\
                     👤 {} (<code>{}</code>)\n\
                     📅 Joined: {}\n\
                     📩 {}",
                    encode_text(user),
                    user_id,
                    format_join_time(joined),
                    dm_status
                )
            }
            AdminEvent::VerificationCompleted {
                user,
                user_id,
                room,
                roll,
                joined,
            } => format!(
                "✅ <b>Verification Complete</b>\n\
                 👤 {} (<code>{}</code>)\n\
                 🏠 Room: {} • 📋 Roll: #{}\n\
                 📅 Joined: {}\n\n\
                 🔔 <i>Action:</i> Promote as restricted admin with title <code>Room {} • #{}</code>",
                encode_text(user),
                user_id,
                room,
                roll,
                format_join_time(joined),
                room,
                roll
            ),
            AdminEvent::ReportFiled {
                reporter,
                reporter_id,
                chat_title,
                text,
            } => format!(
                "🚨 <b>New Report</b>\n\
                 👤 {} (<code>{}</code>)\n\
                 🏘️ Group: {}\n\
                 📝 {}",
                encode_text(reporter),
                reporter_id,
                encode_text(chat_title),
                encode_text(text)
            ),
            AdminEvent::PromotionAnnounced { text } => format!(
                "👑 <b>Admin Promoted</b>\n👤 {}",
                encode_text(text)
            ),
        }
    }
}

/// Send an event to the admin log chat. Returns whether delivery worked.
///
/// Delivery is best-effort: rate limits get a couple of retries, anything
/// else is logged and swallowed. Whatever triggered the event must finish
/// normally for the user no matter what happens here.
pub async fn notify(bot: &Bot, admin_log_chat: ChatId, event: &AdminEvent) -> bool {
    let text = event.render();
    let sent = telegram_retry!(
        bot.send_message(admin_log_chat, text.as_str())
            .parse_mode(ParseMode::Html)
            .await
    );
    match sent {
        Ok(_) => true,
        Err(e) => {
            log::error!("Failed to send to the admin log chat: {e}");
            false
        }
    }
}
