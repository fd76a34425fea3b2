pub mod code;
pub mod token;
pub mod tries;

pub use code::{Code, CodeStatus, CodeStore, InMemoryCodeStore, NewCode};
pub use token::{InMemoryTokenStore, TokenEntity, TokenKind, TokenStatus, TokenStore};
pub use tries::{InMemoryTryStore, TryStore};
