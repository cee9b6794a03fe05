pub mod connections;
pub mod health;
pub mod search;

pub use connections::get_connections;
pub use health::health_check;
pub use search::{search, search_get};
