pub mod bot;
pub mod feed;
pub mod manager;
pub mod preset;
pub mod store;
pub mod validator;

pub use bot::TradingBot;
pub use feed::{PriceSnapshot, SimulatedFeed};
pub use manager::BotManager;
pub use preset::map_preset;
pub use store::{MemoryStore, RedisStore, SqliteStore, Store, StoreError};
pub use validator::validate;
