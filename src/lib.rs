//! ATLAS relay - polls Telegram, routes each update to one handler, replies.

pub mod config;
pub mod groq;
pub mod media;
pub mod relay;
pub mod server;
pub mod session;
pub mod telegram;

pub use config::{Config, ConfigError};
pub use relay::{Command, Dispatcher, FixedBackoff, Ingestor, Update};
pub use session::{Identity, Session};
pub use telegram::{TelegramClient, Transport, TransportError};
