//! External collaborators

pub mod youtube_client;

pub use youtube_client::{LiveStats, StatsError, StatsSource, YouTubeClient};
