pub mod mongo;
pub mod retry;
pub mod time;
