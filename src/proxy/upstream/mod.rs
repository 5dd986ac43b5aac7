pub mod client;

pub use client::{HttpReply, Upstream, UpstreamClient, SESSION_HEADER};
