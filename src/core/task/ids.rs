use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// タスクID生成用カウンタ
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// スレッドID生成用カウンタ
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// タスクID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// 新しいタスクIDを生成
    pub fn new() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// タスクIDの値を取得
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {}", self.0)
    }
}

/// スレッドID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    /// 新しいスレッドIDを生成
    pub fn new() -> Self {
        Self(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// スレッドIDの値を取得
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread {}", self.0)
    }
}

/// スレッドの状態
///
/// `Waiting`の`level`は重ねて中断された回数。0が最も浅い待機。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// 実行可能（Readyキューで待機）
    Ready,
    /// 実行中
    Running,
    /// イベント待ち
    Waiting { level: u32 },
    /// 終了済み
    Killed,
}

impl ThreadState {
    /// 最も浅い待機状態
    pub const WAITING: Self = ThreadState::Waiting { level: 0 };

    /// 待機状態かどうか（深さは問わない）
    pub fn is_waiting(&self) -> bool {
        matches!(self, ThreadState::Waiting { .. })
    }

    /// 待機の深さ。待機中でなければNone
    pub fn waiting_level(&self) -> Option<u32> {
        match self {
            ThreadState::Waiting { level } => Some(*level),
            _ => None,
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadState::Ready => write!(f, "Ready"),
            ThreadState::Running => write!(f, "Running"),
            ThreadState::Waiting { level: 0 } => write!(f, "Waiting"),
            ThreadState::Waiting { level } => write!(f, "Waiting+{}", level),
            ThreadState::Killed => write!(f, "Killed"),
        }
    }
}

/// タスクの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// 稼働中
    Live,
    /// 終了済み
    Terminated,
}
