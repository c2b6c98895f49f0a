use alloc::string::String;
use alloc::vec::Vec;
use x86_64::structures::paging::{FrameAllocator, FrameDeallocator};

use super::ids::{TaskId, TaskState, ThreadId};
use crate::error::{Result, TaskError};
use crate::mem::{PageTable, SequentialFrameAllocator};

/// タスク操作のインターフェース
///
/// スケジューラはタスクの生成・破棄には関与せず、ここに挙げた操作だけを使う
pub trait TaskControl {
    /// タスクに属するスレッド数
    fn thread_count(&self, task: TaskId) -> usize;

    /// タスクにスレッドを登録
    fn add_thread(&mut self, task: TaskId, thread: ThreadId) -> Result<()>;

    /// タスクからスレッドを外す
    fn remove_thread(&mut self, task: TaskId, thread: ThreadId);

    /// タスクの現在のスレッド
    fn current_thread(&self, task: TaskId) -> Option<ThreadId>;

    /// タスクの現在のスレッドを設定
    fn set_current_thread(&mut self, task: TaskId, thread: Option<ThreadId>);

    /// タスクのページテーブル
    fn page_table(&self, task: TaskId) -> Option<PageTable>;

    /// タスクを終了させる
    fn kill(&mut self, task: TaskId);
}

/// タスク構造体
///
/// メモリ空間（ページテーブル）を持ち、1つ以上のスレッドを束ねる
pub struct Task {
    /// タスクID
    id: TaskId,
    /// タスク名
    name: String,
    /// タスクの状態
    state: TaskState,
    /// 所属スレッド
    threads: Vec<ThreadId>,
    /// プロセッサ上にある所属スレッド
    current_thread: Option<ThreadId>,
    /// ページテーブル
    page_table: PageTable,
}

impl Task {
    /// タスクIDを取得
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// タスク名を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// タスクの状態を取得
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// 所属スレッド
    pub fn threads(&self) -> &[ThreadId] {
        &self.threads
    }

    pub fn current_thread(&self) -> Option<ThreadId> {
        self.current_thread
    }

    pub fn page_table(&self) -> PageTable {
        self.page_table
    }
}

impl core::fmt::Debug for Task {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("threads", &self.threads)
            .field("current_thread", &self.current_thread)
            .field(
                "page_table",
                &format_args!("{:#x}", self.page_table.root().start_address().as_u64()),
            )
            .finish()
    }
}

/// タスクテーブル
///
/// システム内のすべてのタスクを管理する。終了済みのタスクはスロットが
/// 必要になるまで参照でき、その後ページテーブルのフレームごと回収される。
pub struct TaskTable {
    /// タスクのスロット
    tasks: Vec<Option<Task>>,
    /// 生存中のタスク数
    count: usize,
    /// ページテーブル用フレーム
    frames: SequentialFrameAllocator,
}

impl TaskTable {
    /// タスクテーブルの最大容量
    pub const MAX_TASKS: usize = 64;

    /// 新しいタスクテーブルを作成
    pub fn new() -> Self {
        Self::with_frames(SequentialFrameAllocator::default())
    }

    /// フレームアロケータを指定してタスクテーブルを作成
    pub fn with_frames(frames: SequentialFrameAllocator) -> Self {
        Self {
            tasks: Vec::new(),
            count: 0,
            frames,
        }
    }

    /// タスクを作成して登録
    ///
    /// # Returns
    /// 成功時はタスクIDを返す
    pub fn create(&mut self, name: &str) -> Result<TaskId> {
        if self.count >= Self::MAX_TASKS {
            return Err(TaskError::TableFull.into());
        }

        let has_free_slot =
            self.tasks.len() < Self::MAX_TASKS || self.tasks.iter().any(Option::is_none);
        if !has_free_slot {
            self.reclaim_terminated();
        }

        let root = match self.frames.allocate_frame() {
            Some(frame) => frame,
            None => {
                self.reclaim_terminated().ok_or(TaskError::TableFull)?;
                self.frames.allocate_frame().ok_or(TaskError::TableFull)?
            }
        };
        let id = TaskId::new();
        let task = Task {
            id,
            name: String::from(name),
            state: TaskState::Live,
            threads: Vec::new(),
            current_thread: None,
            page_table: PageTable::new(id, root),
        };

        crate::debug!("Created {} '{}' with {}", id, name, task.page_table);

        self.count += 1;
        // 空きスロットを探す
        match self.tasks.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(task),
            None => self.tasks.push(Some(task)),
        }
        Ok(id)
    }

    /// タスクIDでタスクを取得
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks
            .iter()
            .find_map(|slot| slot.as_ref().filter(|t| t.id() == id))
    }

    fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find_map(|slot| slot.as_mut().filter(|t| t.id() == id))
    }

    /// タスクを削除
    ///
    /// # Returns
    /// 削除されたタスクを返す。存在しない場合はNone
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let slot = self
            .tasks
            .iter_mut()
            .find(|slot| slot.as_ref().map_or(false, |t| t.id() == id))?;
        let task = slot.take()?;
        if task.state == TaskState::Live {
            self.count -= 1;
        }
        self.release_frame(&task);
        Some(task)
    }

    /// 最も古い終了済みタスクのスロットを空ける
    fn reclaim_terminated(&mut self) -> Option<TaskId> {
        let slot = self.tasks.iter_mut().find(|slot| {
            slot.as_ref()
                .map_or(false, |t| t.state == TaskState::Terminated)
        })?;
        let task = slot.take()?;
        self.release_frame(&task);
        crate::debug!("Reclaimed slot of {} '{}'", task.id, task.name);
        Some(task.id)
    }

    fn release_frame(&mut self, task: &Task) {
        // 取り除いたタスクのページテーブルはもう参照されない
        unsafe { self.frames.deallocate_frame(task.page_table.root()) };
    }

    /// すべてのタスクを反復処理
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter_map(|slot| slot.as_ref())
    }

    /// 生存中のタスク数を取得
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskControl for TaskTable {
    fn thread_count(&self, task: TaskId) -> usize {
        self.get(task).map_or(0, |t| t.threads.len())
    }

    fn add_thread(&mut self, task: TaskId, thread: ThreadId) -> Result<()> {
        let entry = self.get_mut(task).ok_or(TaskError::TaskNotFound)?;
        if entry.state == TaskState::Terminated {
            return Err(TaskError::Terminated.into());
        }
        if !entry.threads.contains(&thread) {
            entry.threads.push(thread);
        }
        Ok(())
    }

    fn remove_thread(&mut self, task: TaskId, thread: ThreadId) {
        if let Some(entry) = self.get_mut(task) {
            entry.threads.retain(|&t| t != thread);
        }
    }

    fn current_thread(&self, task: TaskId) -> Option<ThreadId> {
        self.get(task).and_then(|t| t.current_thread)
    }

    fn set_current_thread(&mut self, task: TaskId, thread: Option<ThreadId>) {
        if let Some(entry) = self.get_mut(task) {
            entry.current_thread = thread;
        }
    }

    fn page_table(&self, task: TaskId) -> Option<PageTable> {
        self.get(task).map(|t| t.page_table)
    }

    fn kill(&mut self, task: TaskId) {
        let Some(entry) = self.get_mut(task) else {
            crate::warn!("Attempt to kill unknown {}", task);
            return;
        };
        if entry.state == TaskState::Terminated {
            crate::warn!("{} already terminated", task);
            return;
        }

        entry.state = TaskState::Terminated;
        entry.current_thread = None;
        crate::info!("{} '{}' terminated", task, entry.name);
        self.count -= 1;
    }
}
