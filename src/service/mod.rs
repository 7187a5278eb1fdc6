//! The practice engine and account logic. All operations take the
//! `Storage` handle explicitly; handlers are thin wrappers over these.

pub mod accounts;
pub mod practice;
pub mod session;
pub mod vocabulary;
