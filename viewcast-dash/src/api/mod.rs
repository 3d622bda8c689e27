//! HTTP API handlers for viewcast-dash

pub mod batch;
pub mod buildinfo;
pub mod eda;
pub mod health;
pub mod live;
pub mod predict;
pub mod ui;

pub use batch::batch_routes;
pub use eda::eda_routes;
pub use health::health_routes;
pub use live::live_routes;
pub use predict::predict_routes;
pub use ui::ui_routes;
