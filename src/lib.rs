// Mdm Teo — group-chat companion bot.
//
// Atoms hold the shared vocabulary (errors, constants, collaborator traits);
// the engine wires them to Telegram, Gemini and the admin surface.

pub mod atoms;
pub mod engine;
