//! Wire protocol types shared by the server and its clients.

pub mod messages;

pub use messages::ClientAction;
