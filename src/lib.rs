//! Source code for the group bot of "The Learning Circle" study group on Telegram.
//!
//! The bot greets new members, walks them through a short room/roll
//! verification dialogue in DMs, forwards noteworthy events to an admin log
//! chat, and removes keyword spam from the group.

/// Startup configuration read from the environment.
mod config;

/// Miscellaneous functions.
mod misc;

/// Records who joined and whether they verified yet.
mod membership;

/// The spam filter.
mod spam;

/// The room/roll verification dialogue.
mod verify;

/// Forwards events to the admin log chat.
mod relay;

/// Functions that handle events from Telegram.
mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
