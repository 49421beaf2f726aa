pub mod app;
pub mod clock;
pub mod config;
pub mod counter;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod state;
pub mod storage;
pub mod tracker;
pub mod ui;
pub mod watchdog;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use tracker::DailyCounterStore;
