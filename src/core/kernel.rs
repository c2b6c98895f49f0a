//! シミュレータ本体
//!
//! スケジューラと、それが使う協調者（タスク、MMU、デバイス、リソース、
//! 報告シンク）の標準実装をひとまとめに所有する。

use crate::driver::DeviceTable;
use crate::mem::{MemoryUnit, Mmu};
use crate::task::{
    Event, Machine, ResourceTable, Scheduler, SchedulerConfig, TaskControl, TaskId, TaskTable,
    ThreadId, WaitQueue,
};
use crate::util::{LogReporter, Reporter};
use crate::Result;

/// 単一プロセッサのシミュレータ
pub struct Kernel<R: Reporter = LogReporter> {
    scheduler: Scheduler,
    tasks: TaskTable,
    mmu: Mmu,
    devices: DeviceTable,
    resources: ResourceTable,
    reporter: R,
}

impl Kernel<LogReporter> {
    /// `log`ファサードへ報告するシミュレータを作成
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_reporter(config, LogReporter)
    }
}

impl<R: Reporter> Kernel<R> {
    /// 報告シンクを指定してシミュレータを作成
    pub fn with_reporter(config: SchedulerConfig, reporter: R) -> Self {
        Self {
            scheduler: Scheduler::new(config),
            tasks: TaskTable::new(),
            mmu: Mmu::new(),
            devices: DeviceTable::new(),
            resources: ResourceTable::new(),
            reporter,
        }
    }

    /// スケジューラと協調者の組に分けて処理を実行
    pub fn with_machine<T>(&mut self, f: impl FnOnce(&mut Scheduler, &mut Machine<'_>) -> T) -> T {
        let mut machine = Machine {
            tasks: &mut self.tasks,
            mmu: &mut self.mmu,
            devices: &mut self.devices,
            resources: &mut self.resources,
            reporter: &self.reporter,
        };
        f(&mut self.scheduler, &mut machine)
    }

    /// タスクを作成
    pub fn create_task(&mut self, name: &str) -> Result<TaskId> {
        self.tasks.create(name)
    }

    pub fn create_thread(&mut self, task: TaskId) -> Result<ThreadId> {
        self.with_machine(|s, m| s.create_thread(m, task))
    }

    pub fn kill_thread(&mut self, thread: ThreadId) -> Result<()> {
        self.with_machine(|s, m| s.kill_thread(m, thread))
    }

    pub fn suspend_thread(&mut self, thread: ThreadId, event: &mut dyn WaitQueue) -> Result<()> {
        self.with_machine(|s, m| s.suspend_thread(m, thread, event))
    }

    pub fn resume_thread(&mut self, thread: ThreadId) -> Result<()> {
        self.with_machine(|s, m| s.resume_thread(m, thread))
    }

    pub fn dispatch(&mut self) -> Result<ThreadId> {
        self.with_machine(|s, m| s.dispatch(m))
    }

    /// イベントを通知し、待っていたスレッドを再開させる
    ///
    /// # Returns
    /// 再開したスレッドの数
    pub fn notify(&mut self, event: &mut Event) -> usize {
        self.with_machine(|s, m| event.notify(s, m))
    }

    /// プロセッサ上のスレッド
    pub fn running_thread(&self) -> Option<ThreadId> {
        let mapping = self.mmu.active_mapping()?;
        self.tasks.current_thread(mapping.owning_task())
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn tasks(&self) -> &TaskTable {
        &self.tasks
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut DeviceTable {
        &mut self.devices
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceTable {
        &mut self.resources
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }
}
