use alloc::collections::VecDeque;

use super::event::WaitQueue;
use super::ids::{TaskId, ThreadId, ThreadState};
use super::ready_queue::ReadyQueue;
use super::resource::ResourceControl;
use super::task_table::TaskControl;
use super::thread::{Thread, ThreadTable};
use crate::driver::DeviceTable;
use crate::error::{KernelError, Result, ScheduleError, TaskError, ThreadError};
use crate::mem::MemoryUnit;
use crate::util::Reporter;

/// スケジューラの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// 1タスクあたりの最大スレッド数
    pub max_threads_per_task: usize,
    /// スケジューリング記録の保持件数（0で記録しない）
    pub audit_capacity: usize,
}

impl SchedulerConfig {
    /// デフォルトの最大スレッド数
    pub const DEFAULT_MAX_THREADS_PER_TASK: usize = 10;
    /// デフォルトの記録保持件数
    pub const DEFAULT_AUDIT_CAPACITY: usize = 256;

    /// 最大スレッド数を設定
    pub fn with_max_threads_per_task(mut self, max: usize) -> Self {
        self.max_threads_per_task = max;
        self
    }

    /// 記録保持件数を設定
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_threads_per_task: Self::DEFAULT_MAX_THREADS_PER_TASK,
            audit_capacity: Self::DEFAULT_AUDIT_CAPACITY,
        }
    }
}

/// スケジューラが操作する外部の協調者
///
/// タスク、MMU、デバイス、リソース、報告シンク。
/// スケジューラはこれらの内部状態を所有しない。
pub struct Machine<'a> {
    pub tasks: &'a mut dyn TaskControl,
    pub mmu: &'a mut dyn MemoryUnit,
    pub devices: &'a mut DeviceTable,
    pub resources: &'a mut dyn ResourceControl,
    pub reporter: &'a dyn Reporter,
}

/// スケジューリングの記録
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEvent {
    /// スレッドがプロセッサに載った
    Dispatched { thread: ThreadId },
    /// スレッドがプロセッサから降ろされた
    Preempted { thread: ThreadId, state: ThreadState },
    /// Readyキューが空でディスパッチできなかった
    Starved,
}

/// スケジューラ
///
/// 単一プロセッサ上のFIFOスケジューラ。スレッドテーブルとReadyキューを所有する。
/// タイムスライスによる切り替えはなく、生成・終了・中断・再開の契機でのみ
/// ディスパッチが走る。
pub struct Scheduler {
    config: SchedulerConfig,
    threads: ThreadTable,
    ready_queue: ReadyQueue,
    audit_log: VecDeque<ScheduleEvent>,
}

impl Scheduler {
    /// 新しいスケジューラを作成
    pub fn new(config: SchedulerConfig) -> Self {
        crate::info!(
            "Initializing scheduler (max {} threads per task)",
            config.max_threads_per_task
        );
        Self {
            config,
            threads: ThreadTable::new(),
            ready_queue: ReadyQueue::new(),
            audit_log: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// スレッドテーブル
    pub fn threads(&self) -> &ThreadTable {
        &self.threads
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.get(id)
    }

    pub fn thread_state(&self, id: ThreadId) -> Option<ThreadState> {
        self.threads.get(id).map(|t| t.state())
    }

    /// Readyキュー
    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready_queue
    }

    /// スケジューリングの記録（古い順、直近`audit_capacity`件）
    pub fn audit_log(&self) -> &VecDeque<ScheduleEvent> {
        &self.audit_log
    }

    pub fn clear_audit_log(&mut self) {
        self.audit_log.clear();
    }

    /// 終了済みスレッドの記録をテーブルから取り除く
    pub fn reap(&mut self, id: ThreadId) -> Option<Thread> {
        match self.thread_state(id) {
            Some(ThreadState::Killed) => self.threads.remove(id),
            _ => None,
        }
    }

    /// スレッドを生成してタスクに加える
    ///
    /// 成否にかかわらずディスパッチはちょうど1回走る。
    ///
    /// # Returns
    /// 生成したスレッドのID
    pub fn create_thread(&mut self, m: &mut Machine<'_>, task: TaskId) -> Result<ThreadId> {
        m.reporter.log(&task, "create thread");

        if m.tasks.thread_count(task) >= self.config.max_threads_per_task {
            m.reporter.report_warning(&task, "max thread count exceeded");
            self.dispatch(m)?;
            return Err(ThreadError::CapacityExceeded.into());
        }

        let thread = Thread::new(task);
        let id = thread.id();
        if let Err(e) = m.tasks.add_thread(task, id) {
            crate::debug!("add_thread({}, {}) failed: {}", task, id, e);
            m.reporter.report_warning(&task, "failed to add thread to task");
            self.dispatch(m)?;
            return Err(ThreadError::AttachFailed.into());
        }

        self.threads.push(thread);
        self.ready_queue.push_back(id);

        self.dispatch(m)?;
        Ok(id)
    }

    /// スレッドを終了させる
    ///
    /// プロセッサから降ろした後で、タスク・デバイス・リソースの後始末を行う。
    /// 後始末は途中のディスパッチが失敗しても最後まで行い、その失敗を返す。
    pub fn kill_thread(&mut self, m: &mut Machine<'_>, id: ThreadId) -> Result<()> {
        m.reporter.log(&id, "kill thread");

        let thread = self
            .threads
            .get_mut(id)
            .ok_or(ThreadError::ThreadNotFound)?;
        let previous = thread.state();
        let task = thread.task();
        if previous == ThreadState::Killed {
            m.reporter.report_warning(&id, "thread already killed");
            return Ok(());
        }
        thread.set_state(ThreadState::Killed);

        let dispatched = match previous {
            ThreadState::Ready => {
                self.ready_queue.remove(id);
                Ok(())
            }
            ThreadState::Running => self.dispatch_with(m, ThreadState::Killed).map(|_| ()),
            _ => Ok(()),
        };

        m.tasks.remove_thread(task, id);

        let cancelled = m.devices.cancel_all(id);
        if cancelled > 0 {
            crate::debug!("Cancelled {} pending I/O requests of {}", cancelled, id);
        }

        m.resources.release_all(id);

        if m.tasks.thread_count(task) == 0 {
            m.reporter.log(&task, "no threads left, killing task");
            m.tasks.kill(task);
        }

        dispatched
    }

    /// スレッドをイベントで中断させる
    ///
    /// 実行中なら待機状態でプロセッサから降ろし、既に待機中なら待機を一段深くする。
    pub fn suspend_thread(
        &mut self,
        m: &mut Machine<'_>,
        id: ThreadId,
        event: &mut dyn WaitQueue,
    ) -> Result<()> {
        m.reporter.log(&id, "suspend thread");

        let previous = self.thread_state(id).ok_or(ThreadError::ThreadNotFound)?;
        event.add_thread(id);

        match previous {
            ThreadState::Running => {
                self.dispatch_with(m, ThreadState::WAITING)?;
                Ok(())
            }
            ThreadState::Waiting { level } => {
                self.set_state(id, ThreadState::Waiting { level: level + 1 });
                Ok(())
            }
            ThreadState::Ready | ThreadState::Killed => {
                m.reporter
                    .report_error(&id, "attempt to suspend a thread that is not running or waiting");
                Err(ThreadError::InvalidSuspend.into())
            }
        }
    }

    /// 待機中のスレッドを一段再開する
    ///
    /// 最も浅い待機ならReadyにしてキューの末尾へ、より深ければ一段浅くするだけ。
    /// ディスパッチは行わない。
    pub fn resume_thread(&mut self, m: &mut Machine<'_>, id: ThreadId) -> Result<()> {
        m.reporter.log(&id, "resume thread");

        match self.thread_state(id).ok_or(ThreadError::ThreadNotFound)? {
            ThreadState::Waiting { level: 0 } => {
                self.set_state(id, ThreadState::Ready);
                self.ready_queue.push_back(id);
                Ok(())
            }
            ThreadState::Waiting { level } => {
                self.set_state(id, ThreadState::Waiting { level: level - 1 });
                Ok(())
            }
            state => {
                crate::debug!("resume on {} in state {}", id, state);
                m.reporter.report_warning(&id, "attempt to resume a thread that wasn't waiting");
                Err(ThreadError::InvalidResume.into())
            }
        }
    }

    /// 次のスレッドをディスパッチする
    ///
    /// 現在のスレッドはReadyとしてプロセッサから降ろされる。
    ///
    /// # Returns
    /// プロセッサに載ったスレッドのID
    pub fn dispatch(&mut self, m: &mut Machine<'_>) -> Result<ThreadId> {
        self.dispatch_with(m, ThreadState::Ready)
    }

    /// 現在のスレッドを`outgoing`状態で降ろしてから、Readyキューの先頭を載せる
    fn dispatch_with(&mut self, m: &mut Machine<'_>, outgoing: ThreadState) -> Result<ThreadId> {
        m.reporter.log(&"scheduler", "dispatch");

        self.preempt(m, outgoing);

        let Some(next) = self.ready_queue.pop_front() else {
            m.reporter
                .report_error(&"scheduler", "no ready to run thread when dispatching");
            self.record(ScheduleEvent::Starved);
            return Err(ScheduleError::Starvation.into());
        };
        // 唯一のReadyスレッドは自分自身に再スケジュールされる
        if self.ready_queue.is_empty() {
            self.ready_queue.push_back(next);
        }

        let task = self
            .threads
            .get(next)
            .map(|t| t.task())
            .ok_or(ThreadError::ThreadNotFound)?;
        let page_table = m
            .tasks
            .page_table(task)
            .ok_or(KernelError::Task(TaskError::TaskNotFound))?;

        if let Some(thread) = self.threads.get_mut(next) {
            thread.mark_dispatched();
        }
        m.mmu.set_active_mapping(Some(page_table));
        m.tasks.set_current_thread(task, Some(next));

        self.record(ScheduleEvent::Dispatched { thread: next });
        crate::trace!("{} now running on {}", next, page_table);
        Ok(next)
    }

    /// プロセッサ上のスレッドを`outgoing`状態にして降ろす
    ///
    /// 何も載っていなければ何もしない。載っていたスレッドが実行中でなければ
    /// 不整合を報告するが、状態の修正はしない。いずれの場合もMMUとタスクの
    /// 現在のスレッドは空にする。
    fn preempt(&mut self, m: &mut Machine<'_>, outgoing: ThreadState) {
        let Some(mapping) = m.mmu.active_mapping() else {
            return;
        };
        let task = mapping.owning_task();

        if let Some(current) = m.tasks.current_thread(task) {
            m.reporter.log(&current, "preempt thread");

            let state = self.thread_state(current);
            // killは先にKilledへ遷移させてからディスパッチする
            let switchable = state == Some(ThreadState::Running)
                || (state == Some(ThreadState::Killed) && outgoing == ThreadState::Killed);

            if switchable {
                self.set_state(current, outgoing);
                if outgoing == ThreadState::Ready {
                    self.ready_queue.push_back(current);
                } else {
                    self.ready_queue.remove(current);
                }
                self.record(ScheduleEvent::Preempted {
                    thread: current,
                    state: outgoing,
                });
            } else {
                m.reporter
                    .report_error(&current, "erroneous status of current running thread");
            }
        }

        m.mmu.set_active_mapping(None);
        m.tasks.set_current_thread(task, None);
    }

    fn record(&mut self, event: ScheduleEvent) {
        if self.config.audit_capacity == 0 {
            return;
        }
        while self.audit_log.len() >= self.config.audit_capacity {
            self.audit_log.pop_front();
        }
        self.audit_log.push_back(event);
    }

    fn set_state(&mut self, id: ThreadId, state: ThreadState) {
        if let Some(thread) = self.threads.get_mut(id) {
            thread.set_state(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Device, DeviceTable, IoDevice, IoOperation, Iorb};
    use crate::mem::Mmu;
    use crate::task::event::Event;
    use crate::task::resource::ResourceTable;
    use crate::task::task_table::TaskTable;
    use crate::util::{RecordingReporter, Severity};
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    struct Rig {
        scheduler: Scheduler,
        tasks: TaskTable,
        mmu: Mmu,
        devices: DeviceTable,
        resources: ResourceTable,
        reporter: RecordingReporter,
    }

    impl Rig {
        fn new(max_threads: usize) -> Self {
            Self {
                scheduler: Scheduler::new(
                    SchedulerConfig::default().with_max_threads_per_task(max_threads),
                ),
                tasks: TaskTable::new(),
                mmu: Mmu::new(),
                devices: DeviceTable::new(),
                resources: ResourceTable::new(),
                reporter: RecordingReporter::new(),
            }
        }

        fn run<R>(&mut self, f: impl FnOnce(&mut Scheduler, &mut Machine<'_>) -> R) -> R {
            let mut machine = Machine {
                tasks: &mut self.tasks,
                mmu: &mut self.mmu,
                devices: &mut self.devices,
                resources: &mut self.resources,
                reporter: &self.reporter,
            };
            f(&mut self.scheduler, &mut machine)
        }

        fn create(&mut self, task: TaskId) -> Result<ThreadId> {
            self.run(|s, m| s.create_thread(m, task))
        }

        fn state(&self, id: ThreadId) -> Option<ThreadState> {
            self.scheduler.thread_state(id)
        }

        fn running(&self) -> Vec<ThreadId> {
            self.scheduler
                .threads()
                .iter()
                .filter(|t| t.state() == ThreadState::Running)
                .map(|t| t.id())
                .collect()
        }

        fn queue(&self) -> Vec<ThreadId> {
            self.scheduler.ready_queue().iter().collect()
        }
    }

    #[test]
    fn test_first_thread_runs_and_stays_queued() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("init").unwrap();

        let t1 = rig.create(task).unwrap();

        assert_eq!(rig.state(t1), Some(ThreadState::Running));
        assert_eq!(rig.queue(), vec![t1]);
        assert_eq!(rig.tasks.current_thread(task), Some(t1));
        assert_eq!(rig.mmu.active_mapping().map(|p| p.owning_task()), Some(task));
        assert_eq!(rig.reporter.errors(), 0);
    }

    #[test]
    fn test_capacity_violation_still_dispatches_once() {
        let mut rig = Rig::new(2);
        let task = rig.tasks.create("t").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        rig.scheduler.clear_audit_log();

        let third = rig.create(task);

        assert_eq!(third, Err(KernelError::Thread(ThreadError::CapacityExceeded)));
        assert_eq!(rig.tasks.thread_count(task), 2);
        assert_eq!(rig.scheduler.threads().count(), 2);
        let dispatches = rig
            .scheduler
            .audit_log()
            .iter()
            .filter(|e| matches!(e, ScheduleEvent::Dispatched { .. }))
            .count();
        assert_eq!(dispatches, 1);
        assert_eq!(rig.reporter.warnings(), 1);
        let queued = rig.queue();
        assert!(queued.iter().all(|id| *id == t1 || *id == t2));
        assert_eq!(rig.running().len(), 1);
    }

    #[test]
    fn test_attach_failure_still_dispatches() {
        let mut rig = Rig::new(4);
        let live = rig.tasks.create("live").unwrap();
        let dead = rig.tasks.create("dead").unwrap();
        let t1 = rig.create(live).unwrap();
        rig.tasks.kill(dead);
        rig.scheduler.clear_audit_log();

        let result = rig.create(dead);

        assert_eq!(result, Err(KernelError::Thread(ThreadError::AttachFailed)));
        assert_eq!(
            rig.scheduler.audit_log().back(),
            Some(&ScheduleEvent::Dispatched { thread: t1 })
        );
        assert_eq!(rig.state(t1), Some(ThreadState::Running));
    }

    #[test]
    fn test_sole_thread_redispatches_itself() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("solo").unwrap();
        let t1 = rig.create(task).unwrap();

        let next = rig.run(|s, m| s.dispatch(m)).unwrap();

        assert_eq!(next, t1);
        assert_eq!(rig.state(t1), Some(ThreadState::Running));
        assert_eq!(rig.queue(), vec![t1]);
        assert_eq!(rig.scheduler.thread(t1).map(|t| t.dispatches()), Some(2));
    }

    #[test]
    fn test_fifo_dispatch_order() {
        let mut rig = Rig::new(8);
        let task = rig.tasks.create("fifo").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        let t3 = rig.create(task).unwrap();

        // 降ろされたスレッドはキューの末尾に戻る
        assert_eq!(rig.state(t2), Some(ThreadState::Running));
        assert_eq!(rig.queue(), vec![t3, t1]);

        let order: Vec<ThreadId> = (0..3).map(|_| rig.run(|s, m| s.dispatch(m)).unwrap()).collect();
        assert_eq!(order, vec![t3, t1, t2]);
        assert_eq!(rig.running(), vec![t2]);
    }

    #[test]
    fn test_dispatch_on_idle_processor_is_not_an_error() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("idle").unwrap();
        let t1 = rig.create(task).unwrap();
        let mut event = Event::new();

        rig.run(|s, m| s.suspend_thread(m, t1, &mut event)).unwrap_err();
        assert!(rig.mmu.active_mapping().is_none());
        rig.reporter.clear();

        // 何も載っていない状態からのディスパッチ
        rig.run(|s, m| s.resume_thread(m, t1)).unwrap();
        let next = rig.run(|s, m| s.dispatch(m)).unwrap();

        assert_eq!(next, t1);
        assert_eq!(rig.reporter.errors(), 0);
    }

    #[test]
    fn test_starvation_is_reported() {
        let mut rig = Rig::new(4);

        let result = rig.run(|s, m| s.dispatch(m));

        assert_eq!(result, Err(KernelError::Schedule(ScheduleError::Starvation)));
        assert!(result.unwrap_err().is_fatal());
        assert_eq!(rig.reporter.errors(), 1);
        assert_eq!(
            rig.scheduler.audit_log().iter().copied().collect::<Vec<_>>(),
            vec![ScheduleEvent::Starved]
        );
    }

    #[test]
    fn test_suspend_running_thread_hands_over_processor() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("io").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        let mut event = Event::new();

        rig.run(|s, m| s.suspend_thread(m, t1, &mut event)).unwrap();

        assert_eq!(rig.state(t1), Some(ThreadState::WAITING));
        assert_eq!(rig.state(t2), Some(ThreadState::Running));
        assert!(event.contains(t1));
        assert!(!rig.queue().contains(&t1));
        assert_eq!(rig.tasks.current_thread(task), Some(t2));
    }

    #[test]
    fn test_nested_suspend_and_resume() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("nest").unwrap();
        let t1 = rig.create(task).unwrap();
        let _t2 = rig.create(task).unwrap();
        let mut page_fault = Event::new();
        let mut io = Event::new();

        rig.run(|s, m| s.suspend_thread(m, t1, &mut page_fault)).unwrap();
        rig.run(|s, m| s.suspend_thread(m, t1, &mut io)).unwrap();
        assert_eq!(rig.state(t1), Some(ThreadState::Waiting { level: 1 }));

        rig.run(|s, m| s.resume_thread(m, t1)).unwrap();
        assert_eq!(rig.state(t1), Some(ThreadState::WAITING));
        assert!(!rig.queue().contains(&t1));

        rig.run(|s, m| s.resume_thread(m, t1)).unwrap();
        assert_eq!(rig.state(t1), Some(ThreadState::Ready));
        assert_eq!(rig.queue().last(), Some(&t1));
    }

    #[test]
    fn test_resume_ready_thread_warns_and_changes_nothing() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("r").unwrap();
        let _t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        let before = rig.queue();

        let result = rig.run(|s, m| s.resume_thread(m, t2));

        assert_eq!(result, Err(KernelError::Thread(ThreadError::InvalidResume)));
        assert_eq!(rig.state(t2), Some(ThreadState::Ready));
        assert_eq!(rig.queue(), before);
        assert_eq!(rig.reporter.warnings(), 1);
    }

    #[test]
    fn test_suspend_ready_thread_is_rejected() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("s").unwrap();
        let _t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        let mut event = Event::new();

        let result = rig.run(|s, m| s.suspend_thread(m, t2, &mut event));

        assert_eq!(result, Err(KernelError::Thread(ThreadError::InvalidSuspend)));
        assert!(event.contains(t2));
        assert_eq!(rig.state(t2), Some(ThreadState::Ready));
        assert_eq!(rig.reporter.count(Severity::Error), 1);
    }

    #[test]
    fn test_kill_ready_thread_leaves_queue() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("k").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();

        rig.run(|s, m| s.kill_thread(m, t2)).unwrap();

        assert_eq!(rig.state(t2), Some(ThreadState::Killed));
        assert!(!rig.queue().contains(&t2));
        assert_eq!(rig.state(t1), Some(ThreadState::Running));
        assert_eq!(rig.tasks.thread_count(task), 1);
    }

    #[test]
    fn test_kill_running_thread_dispatches_next() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("k").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        rig.reporter.clear();

        rig.run(|s, m| s.kill_thread(m, t1)).unwrap();

        assert_eq!(rig.state(t1), Some(ThreadState::Killed));
        assert_eq!(rig.state(t2), Some(ThreadState::Running));
        assert!(!rig.queue().contains(&t1));
        assert_eq!(rig.reporter.errors(), 0);
        assert!(rig.scheduler.audit_log().contains(&ScheduleEvent::Preempted {
            thread: t1,
            state: ThreadState::Killed,
        }));
    }

    #[test]
    fn test_kill_cleans_up_devices_and_resources() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("k").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();

        let mut disk = IoDevice::new();
        for (thread, block) in [(t1, 0), (t2, 1), (t1, 2)] {
            disk.enqueue(Iorb {
                thread,
                op: IoOperation::Write,
                block,
            });
        }
        let disk = rig.devices.register(Box::new(disk));
        let lock = rig.resources.register(1);
        rig.resources.acquire(t1, lock, 1).unwrap();

        rig.run(|s, m| s.kill_thread(m, t1)).unwrap();

        let device = rig.devices.get(disk).unwrap();
        assert_eq!(device.pending_io(t1), 0);
        assert_eq!(device.pending_io(t2), 1);
        assert_eq!(rig.resources.held_by(t1), 0);
        assert_eq!(rig.resources.available(lock), Some(1));
    }

    #[test]
    fn test_kill_already_killed_thread_is_noop() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("k").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        rig.run(|s, m| s.kill_thread(m, t2)).unwrap();
        rig.reporter.clear();

        rig.run(|s, m| s.kill_thread(m, t2)).unwrap();

        assert_eq!(rig.reporter.warnings(), 1);
        assert_eq!(rig.state(t1), Some(ThreadState::Running));
        assert_eq!(rig.tasks.thread_count(task), 1);
    }

    #[test]
    fn test_reap_only_removes_killed_threads() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("k").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();

        assert!(rig.scheduler.reap(t2).is_none());
        rig.run(|s, m| s.kill_thread(m, t2)).unwrap();
        assert!(rig.scheduler.reap(t2).is_some());
        assert!(rig.scheduler.thread(t2).is_none());
        assert!(rig.scheduler.thread(t1).is_some());
    }

    #[test]
    fn test_current_thread_not_running_is_reported_not_repaired() {
        let mut rig = Rig::new(4);
        let a = rig.tasks.create("a").unwrap();
        let b = rig.tasks.create("b").unwrap();
        let t1 = rig.create(a).unwrap();
        let t2 = rig.create(a).unwrap();
        let t3 = rig.create(b).unwrap();
        assert_eq!(rig.tasks.current_thread(a), Some(t2));
        assert_eq!(rig.queue(), vec![t3, t1]);

        // Readyのスレッドをプロセッサに結び付けた状態にする
        rig.tasks.set_current_thread(a, Some(t1));
        rig.reporter.clear();
        rig.scheduler.clear_audit_log();

        let next = rig.run(|s, m| s.dispatch(m));

        assert_eq!(next, Ok(t3));
        assert_eq!(rig.reporter.errors(), 1);
        assert_eq!(rig.state(t1), Some(ThreadState::Ready));
        assert_eq!(rig.state(t2), Some(ThreadState::Running));
        assert_eq!(rig.queue(), vec![t1]);
        assert!(!rig
            .scheduler
            .audit_log()
            .iter()
            .any(|e| matches!(e, ScheduleEvent::Preempted { .. })));
        // 降ろす側のタスクは結び付きが外れ、MMUは次のタスクを指す
        assert_eq!(rig.tasks.current_thread(a), None);
        assert_eq!(rig.tasks.current_thread(b), Some(t3));
        assert_eq!(rig.mmu.active_mapping().map(|p| p.owning_task()), Some(b));
    }

    #[test]
    fn test_mapping_without_current_thread_switches_nothing_out() {
        let mut rig = Rig::new(4);
        let task = rig.tasks.create("a").unwrap();
        let t1 = rig.create(task).unwrap();
        let t2 = rig.create(task).unwrap();
        assert_eq!(rig.tasks.current_thread(task), Some(t1));

        rig.tasks.set_current_thread(task, None);
        rig.reporter.clear();
        rig.scheduler.clear_audit_log();

        let next = rig.run(|s, m| s.dispatch(m));

        assert_eq!(next, Ok(t2));
        assert_eq!(rig.reporter.errors(), 0);
        assert_eq!(rig.state(t1), Some(ThreadState::Running));
        assert_eq!(
            rig.scheduler.audit_log().iter().copied().collect::<Vec<_>>(),
            vec![ScheduleEvent::Dispatched { thread: t2 }]
        );
        assert_eq!(rig.tasks.current_thread(task), Some(t2));
    }

    #[test]
    fn test_audit_log_keeps_most_recent_events() {
        let mut rig = Rig::new(4);
        rig.scheduler = Scheduler::new(SchedulerConfig::default().with_audit_capacity(3));
        let task = rig.tasks.create("busy").unwrap();
        let t1 = rig.create(task).unwrap();

        for _ in 0..10 {
            rig.run(|s, m| s.dispatch(m)).unwrap();
        }

        let log: Vec<ScheduleEvent> = rig.scheduler.audit_log().iter().copied().collect();
        assert_eq!(
            log,
            vec![
                ScheduleEvent::Dispatched { thread: t1 },
                ScheduleEvent::Preempted {
                    thread: t1,
                    state: ThreadState::Ready,
                },
                ScheduleEvent::Dispatched { thread: t1 },
            ]
        );
    }

    #[test]
    fn test_audit_log_disabled() {
        let mut rig = Rig::new(4);
        rig.scheduler = Scheduler::new(SchedulerConfig::default().with_audit_capacity(0));
        let task = rig.tasks.create("quiet").unwrap();
        rig.create(task).unwrap();
        rig.run(|s, m| s.dispatch(m)).unwrap();

        assert!(rig.scheduler.audit_log().is_empty());
    }

    #[test]
    fn test_unknown_thread() {
        let mut rig = Rig::new(4);
        let ghost = ThreadId::new();

        assert_eq!(
            rig.run(|s, m| s.kill_thread(m, ghost)),
            Err(KernelError::Thread(ThreadError::ThreadNotFound))
        );
        assert_eq!(
            rig.run(|s, m| s.resume_thread(m, ghost)),
            Err(KernelError::Thread(ThreadError::ThreadNotFound))
        );
    }
}
