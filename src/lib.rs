// Library root. The binary entry point is src/main.rs.

pub mod config;
pub mod console;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod logger;
pub mod message;
pub mod prompt;
pub mod responder;
pub mod session;

pub use knowledge::KnowledgeBase;
pub use message::{Message, Role};
pub use responder::{RemoteDelegate, Responder};
pub use session::{Session, SessionStatus};
