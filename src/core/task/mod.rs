//! タスク管理モジュール
//!
//! スレッドの生成・終了・中断・再開とFIFOディスパッチ

pub mod event;
pub mod ids;
pub mod ready_queue;
pub mod resource;
pub mod scheduler;
pub mod task_table;
pub mod thread;

pub use event::{Event, EventId, WaitQueue};
pub use ids::{TaskId, TaskState, ThreadId, ThreadState};
pub use ready_queue::ReadyQueue;
pub use resource::{ResourceControl, ResourceId, ResourceTable};
pub use scheduler::{Machine, ScheduleEvent, Scheduler, SchedulerConfig};
pub use task_table::{Task, TaskControl, TaskTable};
pub use thread::{Thread, ThreadTable};
