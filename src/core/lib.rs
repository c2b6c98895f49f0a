#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! mochiOS スレッドスケジューラ
//!
//! 単一プロセッサ・単一コアのOSシミュレータにおける、スレッドの生成・終了・
//! 中断・再開とFIFOディスパッチ。

extern crate alloc;

/// エラー型定義
pub mod error;

/// シミュレータ本体
pub mod kernel;

/// デバイス管理
pub mod driver;

/// ページテーブルとMMU
pub mod mem;

/// タスク・スレッド管理
pub mod task;

/// ユーティリティモジュール
pub mod util;

pub use error::{KernelError, Result};
pub use kernel::Kernel;
pub use task::{Scheduler, SchedulerConfig, TaskId, ThreadId, ThreadState};
