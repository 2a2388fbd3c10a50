pub mod events;
pub mod handler;
pub mod router;
pub mod signature;
