// src/store/mod.rs

pub mod question_store;
pub mod response_store;
pub mod session_store;

pub use question_store::QuestionStore;
pub use response_store::ResponseStore;
pub use session_store::SessionStore;
