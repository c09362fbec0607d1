use std::{fs, sync::Arc};

use teloxide::{dptree::deps, prelude::*};

use crate::{config::Config, handlers, membership::PendingMembers, verify::Sessions};

/// # Panics
///
/// Panics if the bot key file or the environment configuration is
/// missing or malformed. Nothing useful can happen without either.
pub async fn entry() {
    let key = fs::read_to_string(match cfg!(debug_assertions) {
        true => "key_debug",
        false => "key",
    })
    .expect("Could not load bot key file!");

    let config = Arc::new(Config::from_env().expect("Bad environment configuration!"));
    log::info!(
        "Admin log chat: {}; owner {}; {} extra admin(s)",
        config.admin_log_chat,
        config
            .owner
            .map_or_else(|| "unset".to_string(), |id| id.to_string()),
        config.admins.len()
    );

    let bot = Bot::new(key.trim());

    bot.set_my_commands(handlers::commands::generate_bot_commands())
        .await
        .expect("Failed to set bot commands!");

    let members = Arc::new(PendingMembers::new());
    let sessions = Arc::new(Sessions::new());

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_chat_member().endpoint(handlers::handle_chat_member_updated))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![config, members, sessions])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
