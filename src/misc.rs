use chrono::{DateTime, Utc};
use html_escape::encode_text;
use teloxide::types::User;

/// Retry a teloxide request a few times, waiting out rate limits.
/// Evaluates to the last attempt's result.
macro_rules! telegram_retry {
    ($request:expr) => {{
        let mut attempts: u8 = 0;
        loop {
            attempts += 1;
            let result = $request;
            match &result {
                Err(teloxide::RequestError::RetryAfter(secs)) if attempts < 3 => {
                    tokio::time::sleep(secs.duration()).await;
                }
                _ => break result,
            }
        }
    }};
}
pub(crate) use telegram_retry;

/// `@username` if the user has one, otherwise their full name.
/// Not escaped; escape at the point of use if it goes into HTML.
#[must_use]
pub fn user_display_name(user: &User) -> String {
    match &user.username {
        Some(username) => format!("@{username}"),
        None => user.full_name(),
    }
}

/// Like [`user_display_name`], but a bare full name becomes a `tg://user`
/// link so the welcome message actually pings them. Safe to embed in HTML.
#[must_use]
pub fn user_mention_html(user: &User) -> String {
    match &user.username {
        Some(username) => format!("@{username}"),
        None => format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            user.id,
            encode_text(&user.full_name())
        ),
    }
}

/// Name of whoever sent this message, for log lines. Messages posted on
/// behalf of a channel or the group itself have no user behind them.
#[must_use]
pub fn sender_display_name(message: &teloxide::types::Message) -> String {
    if let Some(user) = &message.from {
        user_display_name(user)
    } else if let Some(chat) = &message.sender_chat {
        if let Some(username) = chat.username() {
            format!("@{username}")
        } else if let Some(title) = chat.title() {
            title.to_string()
        } else {
            // Shouldn't happen, but eh.
            "a private sender".to_string()
        }
    } else {
        "a private sender".to_string()
    }
}

/// The timestamp format used in admin log templates.
#[must_use]
pub fn format_join_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d at %H:%M").to_string()
}
