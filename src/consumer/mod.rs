//! Reading records and inspecting consumer groups
//!
//! - `offset` - offset specifications and their resolution
//! - `engine` - the bounded consumption loop
//! - `lease` - scoped release of consumer handles
//! - `groups` - consumer group listing and description

pub mod engine;
pub mod groups;
pub mod lease;
pub mod offset;

pub use engine::{
    consume_messages, inspector_group_id, timeout_from_secs, Clock, ConsumeEngine, ConsumeOutcome,
    ConsumeRequest, ConsumedRecord, PartitionTarget, RecordHeader, SystemClock,
};
pub use groups::{describe_consumer_group, list_consumer_groups, GroupListing, GroupReport};
pub use lease::ConsumerLease;
pub use offset::{OffsetSpec, StartOffset};
