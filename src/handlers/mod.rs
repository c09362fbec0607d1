use std::sync::Arc;

use chrono::Utc;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    types::{ChatMemberUpdated, Me, Message, ParseMode, User},
    Bot, RequestError,
};

use crate::{
    config::Config,
    membership::PendingMembers,
    misc::{sender_display_name, user_display_name, user_mention_html},
    relay::{self, AdminEvent},
    spam,
    verify::{Sessions, Step},
};

pub mod commands;

static SPAM_NOTICE: &str = "❌ Off-topic or spam message removed.";

static PRIVATE_CHAT_HINT: &str = "
This bot looks after The Learning Circle group.

Send /start to verify your room and roll number, or /help to see everything it can do.";

/// A chat-member update. The only transition this bot cares about is
/// someone arriving who wasn't in the group before.
pub async fn handle_chat_member_updated(
    bot: Bot,
    me: Me,
    update: ChatMemberUpdated,
    config: Arc<Config>,
    members: Arc<PendingMembers>,
) -> Result<(), RequestError> {
    if update.old_chat_member.is_present() || !update.new_chat_member.is_present() {
        return Ok(());
    }

    let user = &update.new_chat_member.user;
    if user.id == me.id {
        // That's us getting added somewhere.
        return Ok(());
    }

    let member = members.record_join(user.id, &user.full_name(), update.date);
    log::info!(
        "New member: {} ({}), {} pending total",
        member.display_name,
        user.id,
        members.count_unverified()
    );

    // DM them the instructions. Telegram only allows this if they have
    // talked to the bot before, so this failing is perfectly normal.
    let dm_delivered = match bot
        .send_message(user.id, verification_dm_text(&me))
        .parse_mode(ParseMode::Html)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Could not DM {} ({}): {e}", member.display_name, user.id);
            false
        }
    };

    if let Err(e) = bot
        .send_message(update.chat.id, public_welcome_text(user, &me))
        .parse_mode(ParseMode::Html)
        .await
    {
        log::error!("Failed to send the public welcome: {e}");
    }

    relay::notify(
        &bot,
        config.admin_log_chat,
        &AdminEvent::MemberJoined {
            user: user_display_name(user),
            user_id: user.id,
            joined: update.date,
            dm_delivered,
        },
    )
    .await;

    Ok(())
}

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    config: Arc<Config>,
    members: Arc<PendingMembers>,
    sessions: Arc<Sessions>,
) -> Result<(), RequestError> {
    // The bot ignores messages made by itself.
    if message.from.as_ref().map(|user| user.id) == Some(me.id) {
        return Ok(());
    }

    let Some(text) = message.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        // Commands never reach the dialogue or the spam filter,
        // recognized or not.
        commands::handle_command(&bot, &me, &message, &config, &members, &sessions).await?;
        return Ok(());
    }

    // Dialogue replies take precedence over everything else, so a room
    // number like "4" never has to survive the spam filter.
    if let Some(user) = message.from.clone() {
        if let Some(step) = sessions.advance(user.id, text) {
            return respond_to_step(&bot, &message, &user, step, &config, &members).await;
        }
    }

    if message.chat.is_private() {
        // No dialogue going. Point them at the instructions.
        bot.send_message(message.chat.id, PRIVATE_CHAT_HINT).await?;
        return Ok(());
    }

    if spam::is_spam(text) {
        delete_as_spam(&bot, &message).await;
    }

    Ok(())
}

/// Act on one verification dialogue step: re-prompt, ask the next
/// question, or wrap the whole thing up.
async fn respond_to_step(
    bot: &Bot,
    message: &Message,
    user: &User,
    step: Step,
    config: &Config,
    members: &PendingMembers,
) -> Result<(), RequestError> {
    match step {
        Step::Invalid => {
            bot.send_message(message.chat.id, "❌ Please enter a <b>number</b> (e.g., 4).")
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Step::RoomRecorded { room } => {
            bot.send_message(
                message.chat.id,
                format!(
                    "✅ Room {room} recorded!\n\n\
                     ➡️ Now, what's your <b>roll number</b> from your attendance list? (e.g., 5)"
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        Step::Verified { room, roll } => {
            let member = match members.mark_verified(user.id, &room, &roll) {
                Some(member) => member,
                None => {
                    // They joined before the bot was up, or it restarted
                    // since. Record them now so the books stay straight.
                    members.record_join(user.id, &user.full_name(), Utc::now());
                    members
                        .mark_verified(user.id, &room, &roll)
                        .expect("Entry was inserted just above")
                }
            };
            log::info!(
                "Verified {} ({}) as room {room}, roll {roll}",
                member.display_name,
                user.id
            );

            relay::notify(
                bot,
                config.admin_log_chat,
                &AdminEvent::VerificationCompleted {
                    user: user_display_name(user),
                    user_id: user.id,
                    room: room.clone(),
                    roll: roll.clone(),
                    joined: member.join_time,
                },
            )
            .await;

            // The user gets their confirmation whether or not the admin
            // log heard about it.
            bot.send_message(
                message.chat.id,
                format!(
                    "✅ Verified! You're <b>Room {room} • #{roll}</b>.\n\n\
                     An admin will assign your role shortly. Thank you for helping keep \
                     <b>The Learning Circle</b> organized! 🙌"
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }
    Ok(())
}

/// Delete a spam message and post the transient notice in its place.
/// Both sends are best-effort; lacking delete rights only gets logged.
async fn delete_as_spam(bot: &Bot, message: &Message) {
    let sender = sender_display_name(message);
    match bot.delete_message(message.chat.id, message.id).await {
        Ok(_) => {
            log::info!("Removed spam from {sender}");
            if let Err(e) = bot.send_message(message.chat.id, SPAM_NOTICE).await {
                log::warn!("Failed to post the spam removal notice: {e}");
            }
        }
        Err(e) => {
            log::warn!("Failed to delete spam from {sender}: {e}");
        }
    }
}

fn verification_dm_text(me: &Me) -> String {
    format!(
        "👋 Welcome to <b>The Learning Circle</b>!\n\n\
         To verify your class info, please start a chat with me:\n\
         1. Tap this link → @{}\n\
         2. Press <b>Start</b>\n\
         3. Follow the steps!",
        me.username()
    )
}

fn public_welcome_text(user: &User, me: &Me) -> String {
    format!(
        "👋 Welcome, {}!\n\n\
         Please verify your class info for <b>The Learning Circle</b>:\n\
         1️⃣ Tap → @{}\n\
         2️⃣ Press <b>Start</b>\n\
         3️⃣ Follow the steps!",
        user_mention_html(user),
        me.username()
    )
}
