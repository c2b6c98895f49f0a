//! スケジューラのエラー型定義
//!
//! すべてのエラーをResult型で表現し、panicを禁止

use core::fmt;

/// トップレベルエラー型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// スレッドエラー
    Thread(ThreadError),
    /// タスクエラー
    Task(TaskError),
    /// スケジューリングエラー
    Schedule(ScheduleError),
    /// リソースエラー
    Resource(ResourceError),
}

/// スレッド関連のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadError {
    /// タスクのスレッド数が上限に達した
    CapacityExceeded,
    /// タスクへのスレッド登録に失敗
    AttachFailed,
    /// スレッドが見つからない
    ThreadNotFound,
    /// 待機中でないスレッドの再開
    InvalidResume,
    /// 実行中でも待機中でもないスレッドの中断
    InvalidSuspend,
}

/// タスク関連のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// タスクが見つからない
    TaskNotFound,
    /// 終了済みのタスク
    Terminated,
    /// タスクテーブルが満杯
    TableFull,
}

/// スケジューリング関連のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// ディスパッチ時にReadyキューが空
    Starvation,
}

/// リソース関連のエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    /// 未登録のリソース
    UnknownResource,
    /// 空きインスタンスが不足
    Insufficient,
}

impl KernelError {
    /// このエラーが致命的かどうか
    ///
    /// 致命的なエラーはスケジューラの不変条件が崩れていることを示す
    /// - `ScheduleError::Starvation`
    pub fn is_fatal(&self) -> bool {
        matches!(self, KernelError::Schedule(_))
    }

    /// 呼び出し側で処理を打ち切れば回復できるエラーかどうか
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}

impl From<ThreadError> for KernelError {
    fn from(e: ThreadError) -> Self {
        KernelError::Thread(e)
    }
}

impl From<TaskError> for KernelError {
    fn from(e: TaskError) -> Self {
        KernelError::Task(e)
    }
}

impl From<ScheduleError> for KernelError {
    fn from(e: ScheduleError) -> Self {
        KernelError::Schedule(e)
    }
}

impl From<ResourceError> for KernelError {
    fn from(e: ResourceError) -> Self {
        KernelError::Resource(e)
    }
}

impl fmt::Display for KernelError {
    /// エラーをフォーマット表示
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Thread(e) => write!(f, "Thread error: {}", e),
            KernelError::Task(e) => write!(f, "Task error: {:?}", e),
            KernelError::Schedule(e) => write!(f, "Schedule error: {}", e),
            KernelError::Resource(e) => write!(f, "Resource error: {:?}", e),
        }
    }
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::CapacityExceeded => write!(f, "Max thread count exceeded"),
            ThreadError::AttachFailed => write!(f, "Failed to add thread to task"),
            ThreadError::ThreadNotFound => write!(f, "Thread not found"),
            ThreadError::InvalidResume => write!(f, "Thread was not waiting"),
            ThreadError::InvalidSuspend => write!(f, "Thread is neither running nor waiting"),
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Starvation => write!(f, "No ready thread to dispatch"),
        }
    }
}

/// 結果型のエイリアス
pub type Result<T> = core::result::Result<T, KernelError>;
