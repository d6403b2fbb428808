//! Message deduplication by id.
//!
//! ファンアウトは送信者自身の他接続（他タブ）も含むため、REST で投稿した
//! メッセージの WebSocket エコーが投稿元タブにも届く。購読者に渡す前に
//! メッセージ id で重複を落とす。

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

const DEFAULT_WINDOW: usize = 512;

/// Bounded window of recently seen message ids.
#[derive(Debug)]
pub struct MessageDeduper {
    seen: HashSet<Uuid>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl Default for MessageDeduper {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl MessageDeduper {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a sighting of `id`. Returns `true` if this is the first time
    /// the id is seen inside the window.
    pub fn observe(&mut self, id: Uuid) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_is_fresh() {
        // テスト項目: 初見の id は新規と判定される
        // given (前提条件):
        let mut deduper = MessageDeduper::new(4);
        let id = Uuid::new_v4();

        // when (操作):
        let result = deduper.observe(id);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_second_sighting_is_duplicate() {
        // テスト項目: 同じ id の2回目の観測は重複と判定される
        // given (前提条件):
        let mut deduper = MessageDeduper::new(4);
        let id = Uuid::new_v4();
        deduper.observe(id);

        // when (操作):
        let result = deduper.observe(id);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_window_evicts_oldest_id() {
        // テスト項目: ウィンドウが溢れたら最古の id から追い出される
        // given (前提条件):
        let mut deduper = MessageDeduper::new(2);
        let first = Uuid::new_v4();
        deduper.observe(first);
        deduper.observe(Uuid::new_v4());
        deduper.observe(Uuid::new_v4());

        // when (操作): 追い出された id を再観測する
        let result = deduper.observe(first);

        // then (期待する結果): ウィンドウ外なので新規扱いになる
        assert!(result);
    }
}
