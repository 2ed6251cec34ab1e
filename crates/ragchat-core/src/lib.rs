pub mod config;
pub mod error;
pub mod session;
pub mod stream;
pub mod turn;

// Re-export common types
pub use config::{Backend, ChatConfig};
pub use error::{ChatError, ErrorKind, ResolveError};
pub use session::SessionStore;
pub use stream::{Prefixes, prefix_stream, streamify};
pub use turn::{ConversationTurn, MessageRole};
