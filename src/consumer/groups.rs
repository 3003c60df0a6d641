//! Consumer group listing and description

use bytes::Buf;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::{GroupInfo, GroupMemberInfo};
use crate::context::KafkaContext;
use crate::error::Result;

/// Upper bounds on decoded assignment sizes
const MAX_TOPICS: usize = 10_000;
const MAX_PARTITIONS_PER_TOPIC: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupListing {
    pub group_id: String,
    /// True for groups that do not use the consumer rebalance protocol
    pub is_simple: bool,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedPartition {
    pub topic: String,
    pub partition: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDescription {
    pub member_id: String,
    pub client_id: String,
    pub host: String,
    pub assignment: Vec<AssignedPartition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coordinator {
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GroupReport {
    Found {
        group_id: String,
        state: String,
        protocol_type: String,
        protocol: String,
        members: Vec<MemberDescription>,
        coordinator: Option<Coordinator>,
    },
    Error {
        error: String,
    },
}

impl GroupReport {
    pub fn is_error(&self) -> bool {
        matches!(self, GroupReport::Error { .. })
    }
}

fn state_or_unknown(state: &str) -> String {
    if state.is_empty() {
        "UNKNOWN".to_string()
    } else {
        state.to_string()
    }
}

pub async fn list_consumer_groups(ctx: &KafkaContext) -> Result<Vec<GroupListing>> {
    let admin = ctx.admin()?;
    let groups = admin.fetch_groups(None, ctx.timeouts().metadata).await?;
    debug!(groups = groups.len(), "Listed consumer groups");

    Ok(groups
        .into_iter()
        .map(|g| GroupListing {
            is_simple: g.protocol_type.is_empty(),
            state: state_or_unknown(&g.state),
            group_id: g.group_id,
        })
        .collect())
}

/// Describe one group. Unknown groups and broker failures are error markers.
pub async fn describe_consumer_group(ctx: &KafkaContext, group_id: &str) -> Result<GroupReport> {
    let admin = ctx.admin()?;
    let groups = match admin.fetch_groups(Some(group_id), ctx.timeouts().metadata).await {
        Ok(groups) => groups,
        Err(e) => {
            warn!(group_id, error = %e, "Describe consumer group failed");
            return Ok(GroupReport::Error {
                error: format!("Failed to describe group '{}': {}", group_id, e),
            });
        }
    };

    let Some(group) = groups.into_iter().find(|g| g.group_id == group_id) else {
        return Ok(not_found(group_id));
    };
    if is_dead_placeholder(&group) {
        return Ok(not_found(group_id));
    }

    Ok(GroupReport::Found {
        state: state_or_unknown(&group.state),
        members: group.members.iter().map(describe_member).collect(),
        coordinator: group.coordinator.map(|id| Coordinator { id }),
        protocol_type: group.protocol_type,
        protocol: group.protocol,
        group_id: group.group_id,
    })
}

fn not_found(group_id: &str) -> GroupReport {
    GroupReport::Error {
        error: format!("Failed to describe group '{}': group not found", group_id),
    }
}

/// Brokers answer lookups for unknown groups with an empty `Dead` group
fn is_dead_placeholder(group: &GroupInfo) -> bool {
    group.state.eq_ignore_ascii_case("dead")
        && group.members.is_empty()
        && group.protocol_type.is_empty()
}

fn describe_member(member: &GroupMemberInfo) -> MemberDescription {
    MemberDescription {
        member_id: member.member_id.clone(),
        client_id: member.client_id.clone(),
        host: member.host.clone(),
        assignment: member
            .assignment
            .as_deref()
            .map(parse_member_assignment)
            .unwrap_or_default(),
    }
}

/// Decode a consumer-protocol member assignment.
///
/// Layout: version (i16), topic count (i32), then per topic a string (i16
/// length + bytes) and a partition array (i32 count + i32 ids), followed by
/// user data which is ignored. Anything undecodable yields an empty list.
pub fn parse_member_assignment(data: &[u8]) -> Vec<AssignedPartition> {
    decode_assignment(data).unwrap_or_default()
}

fn decode_assignment(mut buf: &[u8]) -> Option<Vec<AssignedPartition>> {
    if buf.remaining() < 6 {
        return None;
    }
    let _version = buf.get_i16();

    let topic_count = buf.get_i32();
    let topic_count = match usize::try_from(topic_count) {
        Ok(count) if count <= MAX_TOPICS => count,
        _ => {
            warn!(topic_count, "Invalid topic count in member assignment");
            return None;
        }
    };

    let mut assigned = Vec::new();
    for _ in 0..topic_count {
        if buf.remaining() < 2 {
            return None;
        }
        let name_len = usize::try_from(buf.get_i16()).ok()?;
        if buf.remaining() < name_len {
            return None;
        }
        let topic = std::str::from_utf8(&buf[..name_len]).ok()?.to_string();
        buf.advance(name_len);

        if buf.remaining() < 4 {
            return None;
        }
        let partition_count = match usize::try_from(buf.get_i32()) {
            Ok(count) if count <= MAX_PARTITIONS_PER_TOPIC => count,
            _ => {
                warn!(topic = %topic, "Invalid partition count in member assignment");
                return None;
            }
        };
        if buf.remaining() < partition_count * 4 {
            return None;
        }
        for _ in 0..partition_count {
            assigned.push(AssignedPartition {
                topic: topic.clone(),
                partition: buf.get_i32(),
            });
        }
    }

    Some(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    fn encode(topics: &[(&str, &[i32])]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_i16(0);
        buf.put_i32(topics.len() as i32);
        for (topic, partitions) in topics {
            buf.put_i16(topic.len() as i16);
            buf.put_slice(topic.as_bytes());
            buf.put_i32(partitions.len() as i32);
            for p in *partitions {
                buf.put_i32(*p);
            }
        }
        // empty user data
        buf.put_i32(-1);
        buf
    }

    #[test]
    fn test_parse_assignment() {
        let data = encode(&[("orders", &[0, 2]), ("payments", &[1])]);
        let assigned = parse_member_assignment(&data);
        assert_eq!(
            assigned,
            vec![
                AssignedPartition { topic: "orders".into(), partition: 0 },
                AssignedPartition { topic: "orders".into(), partition: 2 },
                AssignedPartition { topic: "payments".into(), partition: 1 },
            ]
        );
    }

    #[test]
    fn test_parse_empty_assignment() {
        assert!(parse_member_assignment(&[]).is_empty());
        assert!(parse_member_assignment(&encode(&[])).is_empty());
    }

    #[test]
    fn test_parse_truncated_assignment() {
        let data = encode(&[("orders", &[0, 1, 2])]);
        assert!(parse_member_assignment(&data[..data.len() - 8]).is_empty());
    }

    #[test]
    fn test_parse_negative_topic_count() {
        let mut data = Vec::new();
        data.put_i16(0);
        data.put_i32(-5);
        assert!(parse_member_assignment(&data).is_empty());
    }

    #[test]
    fn test_dead_placeholder() {
        let group = GroupInfo {
            group_id: "ghost".into(),
            state: "Dead".into(),
            protocol_type: String::new(),
            protocol: String::new(),
            coordinator: None,
            members: Vec::new(),
        };
        assert!(is_dead_placeholder(&group));
    }

    #[test]
    fn test_state_or_unknown() {
        assert_eq!(state_or_unknown(""), "UNKNOWN");
        assert_eq!(state_or_unknown("Stable"), "Stable");
    }
}
