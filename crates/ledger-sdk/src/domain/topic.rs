//! Topic message streaming types.

use serde::{Deserialize, Serialize};

use super::entity_id::TopicId;
use super::transaction_id::Timestamp;

/// Parameters of a single mirror stream request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicQuery {
    /// Topic to follow
    pub topic_id: TopicId,
    /// Inclusive lower bound on consensus time
    pub start_time: Option<Timestamp>,
    /// Exclusive upper bound on consensus time
    pub end_time: Option<Timestamp>,
    /// Maximum messages to deliver (0 = unlimited)
    pub limit: u64,
}

/// A message delivered on a topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    /// Topic the message was submitted to
    pub topic_id: TopicId,
    /// Consensus timestamp of the message
    pub consensus_timestamp: Timestamp,
    /// Position of the message in the topic
    pub sequence_number: u64,
    /// Message body
    pub contents: Vec<u8>,
}
