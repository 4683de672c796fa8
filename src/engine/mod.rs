// Mdm Teo Engine — everything with I/O or async around the core state.
// Decision logic lives in the mdmteo-core crate; this layer feeds it messages
// from Telegram and turns fired batches into Gemini calls and replies.

pub mod admin;
pub mod channels;
pub mod chat;
pub mod config;
pub mod dispatcher;
pub mod health;
pub mod http;
pub mod providers;
pub mod telegram;
pub mod testing;
