use html_escape::encode_text;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{BotCommand, Me, Message, ParseMode, User},
    Bot, RequestError,
};

use crate::{
    config::Config,
    membership::PendingMembers,
    misc::user_display_name,
    relay::{self, AdminEvent},
    verify::Sessions,
};

/// The one fixed reply a privileged command gives to the unprivileged.
static REFUSAL: &str = "🔒 Admin-only command.";

static HELP_TEXT: &str = "ℹ️ <b>The Learning Circle — Bot Help</b>\n\n\
🔹 <b>New here?</b>\n\
→ Press /start to verify your room &amp; roll number\n\n\
🔹 <b>Need help?</b>\n\
→ Use /report &lt;issue&gt; to alert admins\n\n\
🔹 <b>Admins only</b>\n\
→ /status — check bot health\n\
→ /list_pending — see unverified members";

/// Commands shown in the Telegram command menu. The privileged ones are
/// left out on purpose; the people who may use them know they exist.
pub fn generate_bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Verify your room and roll number"),
        BotCommand::new("cancel", "Cancel a verification in progress"),
        BotCommand::new("help", "How to use this bot"),
        BotCommand::new("report", "Alert the admins about a problem"),
    ]
}

/// Returns `true` if a command was parsed and responded to.
pub async fn handle_command(
    bot: &Bot,
    me: &Me,
    message: &Message,
    config: &Config,
    members: &PendingMembers,
    sessions: &Sessions,
) -> Result<bool, RequestError> {
    let Some(text) = message.text() else {
        return Ok(false);
    };
    if !text.starts_with('/') {
        return Ok(false);
    }
    // Get first word in the message, the command itself.
    let Some(command) = text.split_whitespace().next() else {
        return Ok(false);
    };

    let command_full_len = command.len();

    // Trim the bot's username from the command and convert to lowercase.
    let username = format!("@{}", me.username());
    let command = command.trim_end_matches(username.as_str()).to_lowercase();
    let args = text[command_full_len..].trim();

    // Anonymous senders (channels, the group itself) don't get to run
    // commands; there's no user to hold a session or a role for.
    let Some(user) = message.from.clone() else {
        return Ok(false);
    };

    match command.as_str() {
        "/start" => start_verification(bot, message, &user, sessions).await?,
        "/cancel" => cancel_verification(bot, message, &user, sessions).await?,
        "/help" => {
            bot.send_message(message.chat.id, HELP_TEXT)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        "/report" => file_report(bot, message, &user, args, config).await?,
        "/status" => send_status(bot, message, &user, config, members).await?,
        "/list_pending" => list_pending(bot, message, &user, config, members).await?,
        "/promoted" => announce_promotion(bot, message, &user, args, config).await?,
        _ => return Ok(false),
    }

    Ok(true)
}

/// `/start`: begin (or restart) the verification dialogue.
async fn start_verification(
    bot: &Bot,
    message: &Message,
    user: &User,
    sessions: &Sessions,
) -> Result<(), RequestError> {
    sessions.begin(user.id);
    bot.send_message(
        message.chat.id,
        format!(
            "👋 Hello, {}!\n\n\
             Welcome to <b>The Learning Circle</b>.\n\
             Let's verify your class info step by step.\n\n\
             ➡️ What's your <b>room number</b>? (e.g., 4)",
            encode_text(&user.first_name)
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// `/cancel`: drop the dialogue, wherever it was.
async fn cancel_verification(
    bot: &Bot,
    message: &Message,
    user: &User,
    sessions: &Sessions,
) -> Result<(), RequestError> {
    let reply = match sessions.cancel(user.id) {
        true => "❌ Verification cancelled. Send /start to try again.",
        false => "Nothing to cancel. Send /start to begin verification.",
    };
    bot.send_message(message.chat.id, reply).await?;
    Ok(())
}

/// `/report <text>`: forward a complaint to the admin log chat.
async fn file_report(
    bot: &Bot,
    message: &Message,
    user: &User,
    args: &str,
    config: &Config,
) -> Result<(), RequestError> {
    if args.is_empty() {
        bot.send_message(
            message.chat.id,
            "Usage: /report &lt;your message&gt;\nExample: /report User is posting ads",
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    relay::notify(
        bot,
        config.admin_log_chat,
        &AdminEvent::ReportFiled {
            reporter: user_display_name(user),
            reporter_id: user.id,
            chat_title: message
                .chat
                .title()
                .unwrap_or("The Learning Circle")
                .to_string(),
            text: args.to_string(),
        },
    )
    .await;

    // Thank them either way; relay trouble is ours to sort out, not theirs.
    bot.send_message(message.chat.id, "✅ Report sent to admins. Thank you!")
        .await?;
    Ok(())
}

/// `/status`, owner only: a pulse check plus the pending count.
async fn send_status(
    bot: &Bot,
    message: &Message,
    user: &User,
    config: &Config,
    members: &PendingMembers,
) -> Result<(), RequestError> {
    if !config.is_owner(user.id) {
        return refuse(bot, message).await;
    }

    bot.send_message(
        message.chat.id,
        format!(
            "🔐 <b>Owner Status</b>\n\
             🟢 Bot: Active\n\
             👥 Pending verifications: {}\n\
             🏘️ Group: {}",
            members.count_unverified(),
            encode_text(message.chat.title().unwrap_or("The Learning Circle"))
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;
    Ok(())
}

/// `/list_pending`, admins only: who joined but never verified.
async fn list_pending(
    bot: &Bot,
    message: &Message,
    user: &User,
    config: &Config,
    members: &PendingMembers,
) -> Result<(), RequestError> {
    if !config.is_admin(user.id) {
        return refuse(bot, message).await;
    }

    let unverified = members.list_unverified();
    if unverified.is_empty() {
        bot.send_message(message.chat.id, "✅ All members verified!")
            .await?;
        return Ok(());
    }

    use std::fmt::Write;
    let mut text = String::from("<b>📋 Unverified Members</b>");
    for member in &unverified {
        write!(
            text,
            "\n• {} (joined {})",
            encode_text(&member.display_name),
            member.join_time.format("%m-%d")
        )
        .expect("Writing to a String never fails");
    }
    bot.send_message(message.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// `/promoted <text>`, owner only: log a promotion for the admin record.
async fn announce_promotion(
    bot: &Bot,
    message: &Message,
    user: &User,
    args: &str,
    config: &Config,
) -> Result<(), RequestError> {
    if !config.is_owner(user.id) {
        return refuse(bot, message).await;
    }

    if args.is_empty() {
        bot.send_message(
            message.chat.id,
            "Usage: /promoted @username Room X • #Y\nExample: /promoted @feva95 Room 4 • #5",
        )
        .await?;
        return Ok(());
    }

    relay::notify(
        bot,
        config.admin_log_chat,
        &AdminEvent::PromotionAnnounced {
            text: args.to_string(),
        },
    )
    .await;

    bot.send_message(message.chat.id, "✅ Promotion logged.")
        .await?;
    Ok(())
}

async fn refuse(bot: &Bot, message: &Message) -> Result<(), RequestError> {
    bot.send_message(message.chat.id, REFUSAL).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Validate that bot commands match requirements by Telegram's Bot API
    fn validate_bot_commands() {
        let commands = generate_bot_commands();
        // "At most 100 commands can be specified"
        // - https://core.telegram.org/bots/api#setmycommands
        assert!(commands.len() <= 100);
        for command in &commands {
            // Everything here is from https://core.telegram.org/bots/api#botcommand
            // "Text of the command; 1-32 characters."
            assert!(!command.command.is_empty());
            assert!(command.command.len() <= 32);

            // "Can contain only lowercase English letters, digits and underscores."
            for chr in command.command.chars() {
                let is_lowercase_latin = chr.is_ascii_alphabetic() && chr.is_ascii_lowercase();
                let is_digit = chr.is_ascii_digit();
                let is_underscore = chr == '_';

                assert!(is_lowercase_latin || is_digit || is_underscore);
            }

            // "Description of the command; 1-256 characters."
            assert!(!command.description.is_empty());
            assert!(command.description.len() <= 256);
        }
    }

    #[test]
    fn privileged_commands_are_not_advertised() {
        let commands = generate_bot_commands();
        for privileged in ["status", "list_pending", "promoted"] {
            assert!(!commands.iter().any(|c| c.command == privileged));
        }
    }
}
