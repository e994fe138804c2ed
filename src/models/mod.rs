//! Data models for Libris

pub mod book;
pub mod enums;
pub mod member;
pub mod transaction;

// Re-export commonly used types
pub use book::Book;
pub use enums::{MemberStatus, MembershipType, TransactionStatus};
pub use member::Member;
pub use transaction::{Transaction, TransactionView};
