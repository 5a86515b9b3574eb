//! memindex: keyword-indexed media for a Telegram bot.
//!
//! Users upload a sticker, photo or animation, reply with comma-separated
//! keywords, and later pull the media back through inline queries.

pub mod caption;
pub mod channels;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod index;
pub mod indexing;
pub mod logging;
pub mod media;
pub mod query;
pub mod sessions;
