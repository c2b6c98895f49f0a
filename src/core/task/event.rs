use alloc::collections::VecDeque;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use super::ids::{ThreadId, ThreadState};
use super::scheduler::{Machine, Scheduler};
use crate::util::Reporter;

/// 待ち行列のインターフェース
pub trait WaitQueue {
    /// スレッドを待ち行列に加える
    fn add_thread(&mut self, thread: ThreadId);
}

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// イベントID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {}", self.0)
    }
}

/// 待ち合わせ点
///
/// I/O完了やページフォールト解消などを待つスレッドを到着順に保持する
#[derive(Debug)]
pub struct Event {
    id: EventId,
    waiting: VecDeque<ThreadId>,
}

impl Event {
    pub fn new() -> Self {
        Self {
            id: EventId(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed)),
            waiting: VecDeque::new(),
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    /// 待っているスレッド（到着順）
    pub fn waiting(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.waiting.iter().copied()
    }

    pub fn contains(&self, thread: ThreadId) -> bool {
        self.waiting.contains(&thread)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// イベントの発生を通知する
    ///
    /// 待ち行列を空にし、終了済みでないスレッドを到着順に一段ずつ再開する。
    /// ディスパッチは行わない。
    ///
    /// # Returns
    /// 再開したスレッドの数
    pub fn notify(&mut self, scheduler: &mut Scheduler, machine: &mut Machine<'_>) -> usize {
        machine.reporter.log(&self.id, "notify waiting threads");

        let mut resumed = 0;
        while let Some(thread) = self.waiting.pop_front() {
            if scheduler.thread_state(thread) == Some(ThreadState::Killed) {
                continue;
            }
            if scheduler.resume_thread(machine, thread).is_ok() {
                resumed += 1;
            }
        }
        resumed
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitQueue for Event {
    fn add_thread(&mut self, thread: ThreadId) {
        self.waiting.push_back(thread);
    }
}
