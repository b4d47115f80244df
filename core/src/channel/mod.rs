pub mod adapter;
pub mod codec;
pub mod reconnect;

pub use adapter::{ChannelAdapter, ChannelHandle, ChannelNotice, ChannelTask};
pub use codec::{decode_frame, encode_command};
pub use reconnect::{ReconnectPolicy, ReconnectState, RetryDecision};
