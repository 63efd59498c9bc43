pub mod handler;

pub use handler::stats_ws_handler;
