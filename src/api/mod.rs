pub mod line_feed;

pub use line_feed::LineFeedClient;
