//! Relay core: update model, command routing, handlers and the ingest loop.

pub mod command;
pub mod handlers;
pub mod ingestor;
pub mod replies;
pub mod update;


pub use command::{route, Command};
pub use handlers::{Delivery, Dispatcher, HandlerResult, Outbound, MAX_DOWNLOAD_BYTES};
pub use ingestor::{Backoff, FixedBackoff, Ingestor};
pub use update::{AudioRef, DocumentRef, IncomingMessage, Update, VoiceRef};
