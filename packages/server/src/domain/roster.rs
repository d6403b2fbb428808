//! Room roster: which connections are currently viewing which conversation.
//!
//! Membership is per connection, not per user: a user with two tabs can have
//! one tab inside a conversation and the other on the list view. The roster
//! is the fan-out target set for message delivery; it never decides
//! authorization — the join use case does that before calling in.

use std::collections::{HashMap, HashSet};

use super::value_object::{ConnectionId, ConversationId};

/// In-memory conversation-room membership, with a reverse index so that
/// purging a dead connection does not scan every room.
#[derive(Debug, Default)]
pub struct RoomRoster {
    members: HashMap<ConversationId, HashSet<ConnectionId>>,
    joined: HashMap<ConnectionId, HashSet<ConversationId>>,
}

impl RoomRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room. Joining twice is a no-op, not an error;
    /// reconnection naturally produces duplicate joins.
    pub fn join(&mut self, connection_id: ConnectionId, conversation_id: ConversationId) {
        self.members
            .entry(conversation_id.clone())
            .or_default()
            .insert(connection_id);
        self.joined
            .entry(connection_id)
            .or_default()
            .insert(conversation_id);
    }

    /// Remove a connection from a room. Idempotent.
    pub fn leave(&mut self, connection_id: &ConnectionId, conversation_id: &ConversationId) {
        if let Some(members) = self.members.get_mut(conversation_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.members.remove(conversation_id);
            }
        }
        if let Some(rooms) = self.joined.get_mut(connection_id) {
            rooms.remove(conversation_id);
            if rooms.is_empty() {
                self.joined.remove(connection_id);
            }
        }
    }

    /// Connections currently joined to the room (possibly empty).
    pub fn members_of(&self, conversation_id: &ConversationId) -> Vec<ConnectionId> {
        self.members
            .get(conversation_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the connection is currently joined to the room.
    pub fn is_member(&self, connection_id: &ConnectionId, conversation_id: &ConversationId) -> bool {
        self.members
            .get(conversation_id)
            .is_some_and(|members| members.contains(connection_id))
    }

    /// Remove every membership held by the connection.
    ///
    /// Called when a connection dies, with or without an explicit leave, so
    /// the roster never accumulates stale fan-out targets. Returns the rooms
    /// the connection was in.
    pub fn purge_connection(&mut self, connection_id: &ConnectionId) -> Vec<ConversationId> {
        let Some(rooms) = self.joined.remove(connection_id) else {
            return Vec::new();
        };
        for conversation_id in &rooms {
            if let Some(members) = self.members.get_mut(conversation_id) {
                members.remove(connection_id);
                if members.is_empty() {
                    self.members.remove(conversation_id);
                }
            }
        }
        rooms.into_iter().collect()
    }

    pub fn room_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(name: &str) -> ConversationId {
        ConversationId::new(name.to_string()).unwrap()
    }

    #[test]
    fn test_join_and_members_of() {
        // テスト項目: join した接続が members_of に含まれる
        // given (前提条件):
        let mut roster = RoomRoster::new();
        let c1 = ConnectionId::generate();

        // when (操作):
        roster.join(c1, conv("conv-1"));

        // then (期待する結果):
        assert_eq!(roster.members_of(&conv("conv-1")), vec![c1]);
        assert!(roster.is_member(&c1, &conv("conv-1")));
    }

    #[test]
    fn test_double_join_is_idempotent() {
        // テスト項目: 二重 join してもメンバーは 1 つのまま
        // given (前提条件):
        let mut roster = RoomRoster::new();
        let c1 = ConnectionId::generate();
        roster.join(c1, conv("conv-1"));

        // when (操作):
        roster.join(c1, conv("conv-1"));

        // then (期待する結果):
        assert_eq!(roster.members_of(&conv("conv-1")).len(), 1);
    }

    #[test]
    fn test_leave_is_idempotent() {
        // テスト項目: 参加していない部屋からの leave はエラーにならない
        // given (前提条件):
        let mut roster = RoomRoster::new();
        let c1 = ConnectionId::generate();

        // when (操作):
        roster.leave(&c1, &conv("conv-1"));

        // then (期待する結果):
        assert!(roster.members_of(&conv("conv-1")).is_empty());
    }

    #[test]
    fn test_connection_can_join_multiple_rooms() {
        // テスト項目: 1 つの接続が複数の部屋に所属できる
        // given (前提条件):
        let mut roster = RoomRoster::new();
        let c1 = ConnectionId::generate();

        // when (操作):
        roster.join(c1, conv("conv-1"));
        roster.join(c1, conv("conv-2"));

        // then (期待する結果):
        assert!(roster.is_member(&c1, &conv("conv-1")));
        assert!(roster.is_member(&c1, &conv("conv-2")));
    }

    #[test]
    fn test_purge_removes_all_memberships() {
        // テスト項目: purge_connection が全ての部屋から接続を取り除く
        // given (前提条件):
        let mut roster = RoomRoster::new();
        let c1 = ConnectionId::generate();
        let c2 = ConnectionId::generate();
        roster.join(c1, conv("conv-1"));
        roster.join(c1, conv("conv-2"));
        roster.join(c2, conv("conv-1"));

        // when (操作):
        let mut purged = roster.purge_connection(&c1);
        purged.sort();

        // then (期待する結果):
        assert_eq!(purged, vec![conv("conv-1"), conv("conv-2")]);
        assert_eq!(roster.members_of(&conv("conv-1")), vec![c2]);
        assert!(roster.members_of(&conv("conv-2")).is_empty());
    }

    #[test]
    fn test_empty_rooms_are_dropped() {
        // テスト項目: 最後のメンバーが抜けた部屋はマップから消える
        // given (前提条件):
        let mut roster = RoomRoster::new();
        let c1 = ConnectionId::generate();
        roster.join(c1, conv("conv-1"));

        // when (操作):
        roster.leave(&c1, &conv("conv-1"));

        // then (期待する結果):
        assert_eq!(roster.room_count(), 0);
    }
}
