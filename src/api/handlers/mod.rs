pub mod health;
pub mod links;
pub mod pastes;
pub mod responses;
pub mod stats;


pub use health::health_handler;
pub use links::{create_link_handler, follow_link_handler};
pub use pastes::{create_paste_handler, show_paste_handler};
pub use stats::stats_handler;
