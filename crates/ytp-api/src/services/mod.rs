//! Business logic services.

pub mod youtube;

pub use youtube::{Download, YoutubeService};
