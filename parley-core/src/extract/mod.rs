pub mod chat;
pub mod talk;

pub use chat::ChatExport;
pub use talk::{TalkPage, TalkSection};
