//! Realtime chat connection manager
//!
//! One logical "room" abstraction over two physically different backing
//! stores (group-channel messages vs. direct-message pairs) and a live push
//! subscription, with unified deduplication and graceful degradation.

pub mod connection;
pub mod feed;
pub mod log;
pub mod room;

pub use connection::ChatConnection;
pub use feed::FeedEvent;
pub use feed::LiveFeed;
pub use feed::LiveSubscription;
pub use feed::PgLiveFeed;
pub use feed::SubscriptionStatus;
pub use log::MessageLog;
pub use room::RoomId;
