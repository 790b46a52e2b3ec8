//! # dispatch
//!
//! Everything between "the webhook accepted a JSON body" and "a content handler runs":
//!
//! - [`IdempotencyCache`] – sliding-window set of recently seen update ids
//! - [`classify`] / [`Route`] – fixed-priority classification of a message
//! - [`UpdateRouter`] – handler-chain entry that applies the permission gate and calls [`RouteHandlers`]
//! - [`PersistenceHandler`], [`ProfanityCounter`] – side effects that run for every message
//! - [`RecordingSender`] – sends through a [`herald_core::Bot`] and stores what was sent
//! - [`UpdateDispatcher`] – dedups, then runs the chain on a bounded set of tracked tasks

mod cache;
mod dispatcher;
mod persistence;
mod profanity;
mod route;
mod router;
mod sender;

pub use cache::IdempotencyCache;
pub use dispatcher::{AcceptOutcome, UpdateDispatcher};
pub use persistence::PersistenceHandler;
pub use profanity::{ProfanityCounter, ProfanityMatcher};
pub use route::{classify, find_video_link, is_permitted, Route, VIDEO_LINK_FRAGMENTS};
pub use router::{RouteHandlers, UpdateRouter};
pub use sender::RecordingSender;
