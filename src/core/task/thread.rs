use alloc::vec::Vec;

use super::ids::{TaskId, ThreadId, ThreadState};

/// スレッド構造体
///
/// タスクに属するスケジューリングの単位。
/// 所属タスクは生成時に決まり、以後変わらない。
pub struct Thread {
    /// スレッドID
    id: ThreadId,
    /// 所属するタスクID
    task: TaskId,
    /// 現在の状態
    state: ThreadState,
    /// プロセッサに割り当てられた回数
    dispatches: u64,
}

impl Thread {
    /// 新しいスレッドを作成（状態はReady）
    pub fn new(task: TaskId) -> Self {
        Self {
            id: ThreadId::new(),
            task,
            state: ThreadState::Ready,
            dispatches: 0,
        }
    }

    /// スレッドIDを取得
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// 所属するタスクIDを取得
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// スレッドの状態を取得
    pub fn state(&self) -> ThreadState {
        self.state
    }

    /// スレッドの状態を設定
    pub fn set_state(&mut self, state: ThreadState) {
        self.state = state;
    }

    /// ディスパッチされた回数
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    pub(super) fn mark_dispatched(&mut self) {
        self.state = ThreadState::Running;
        self.dispatches += 1;
    }
}

impl core::fmt::Debug for Thread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("task", &self.task)
            .field("state", &self.state)
            .field("dispatches", &self.dispatches)
            .finish()
    }
}

/// スレッドテーブル
///
/// スケジューラが生成したすべてのスレッドを保持する。
/// Killedになったスレッドも記録として残る。
pub struct ThreadTable {
    /// スレッドのスロット
    threads: Vec<Option<Thread>>,
    /// 現在のスレッド数
    count: usize,
}

impl ThreadTable {
    /// 新しいスレッドテーブルを作成
    pub const fn new() -> Self {
        Self {
            threads: Vec::new(),
            count: 0,
        }
    }

    /// スレッドを追加
    pub fn push(&mut self, thread: Thread) -> ThreadId {
        let id = thread.id();
        self.count += 1;

        // 空きスロットを探す
        for slot in &mut self.threads {
            if slot.is_none() {
                *slot = Some(thread);
                return id;
            }
        }

        self.threads.push(Some(thread));
        id
    }

    /// スレッドIDでスレッドを取得
    pub fn get(&self, id: ThreadId) -> Option<&Thread> {
        self.threads
            .iter()
            .find_map(|slot| slot.as_ref().filter(|t| t.id() == id))
    }

    /// スレッドIDでスレッドの可変参照を取得
    pub fn get_mut(&mut self, id: ThreadId) -> Option<&mut Thread> {
        self.threads
            .iter_mut()
            .find_map(|slot| slot.as_mut().filter(|t| t.id() == id))
    }

    /// スレッドを削除
    ///
    /// # Returns
    /// 削除されたスレッドを返す。存在しない場合はNone
    pub fn remove(&mut self, id: ThreadId) -> Option<Thread> {
        for slot in &mut self.threads {
            if slot.as_ref().is_some_and(|t| t.id() == id) {
                self.count -= 1;
                return slot.take();
            }
        }
        None
    }

    /// 指定された状態のスレッド数をカウント
    pub fn count_by_state(&self, state: ThreadState) -> usize {
        self.iter().filter(|t| t.state() == state).count()
    }

    /// 指定されたタスクに属するスレッドを反復処理
    pub fn iter_by_task(&self, task: TaskId) -> impl Iterator<Item = &Thread> {
        self.iter().filter(move |t| t.task() == task)
    }

    /// すべてのスレッドを反復処理
    pub fn iter(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter().filter_map(|slot| slot.as_ref())
    }

    /// 現在のスレッド数を取得
    pub fn count(&self) -> usize {
        self.count
    }

    /// スレッドテーブルが空かどうか
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for ThreadTable {
    fn default() -> Self {
        Self::new()
    }
}
