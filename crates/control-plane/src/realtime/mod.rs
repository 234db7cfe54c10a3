// Live update delivery
//
// Registry of open channels per event short code, and the SSE channel
// adapter. Services publish notifications here after mutations commit.

pub mod channel;
pub mod registry;

pub use channel::{ChannelState, ChannelStream, LiveChannel, LiveMessage, SendError, SseChannel};
pub use registry::ConnectionRegistry;
