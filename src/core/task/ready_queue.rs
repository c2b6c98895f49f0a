use alloc::collections::VecDeque;

use super::ids::ThreadId;

/// Readyキュー
///
/// 到着順のFIFO。同じスレッドが二重に並ぶことはない。
#[derive(Debug, Default)]
pub struct ReadyQueue {
    queue: VecDeque<ThreadId>,
}

impl ReadyQueue {
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// 末尾に追加
    ///
    /// # Returns
    /// 既に並んでいた場合はfalse
    pub fn push_back(&mut self, id: ThreadId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    /// 先頭を取り出す
    pub fn pop_front(&mut self) -> Option<ThreadId> {
        self.queue.pop_front()
    }

    /// キューから取り除く
    pub fn remove(&mut self, id: ThreadId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|&queued| queued != id);
        self.queue.len() != before
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        self.queue.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// 先頭から順に反復処理
    pub fn iter(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.queue.iter().copied()
    }
}
