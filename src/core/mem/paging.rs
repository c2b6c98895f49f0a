//! ページング管理モジュール
//!
//! タスクごとのページテーブルと、現在有効なマッピング（PTBR）を扱う

use core::fmt;
use x86_64::structures::paging::{PhysFrame, Size4KiB};

use crate::task::TaskId;

/// タスクのページテーブル
///
/// ルートフレームと所有タスクの組。MMUに載せるとそのタスクの空間が有効になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTable {
    /// 所有タスク
    task: TaskId,
    /// レベル4テーブルのフレーム
    root: PhysFrame<Size4KiB>,
}

impl PageTable {
    pub fn new(task: TaskId, root: PhysFrame<Size4KiB>) -> Self {
        Self { task, root }
    }

    /// このページテーブルを所有するタスク
    pub fn owning_task(&self) -> TaskId {
        self.task
    }

    /// ルートフレーム
    pub fn root(&self) -> PhysFrame<Size4KiB> {
        self.root
    }
}

impl fmt::Display for PageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page table {:#x} ({})",
            self.root.start_address().as_u64(),
            self.task
        )
    }
}

/// メモリ管理ユニット
pub trait MemoryUnit {
    /// 現在有効なマッピング。プロセッサが空いていればNone
    fn active_mapping(&self) -> Option<PageTable>;

    /// 有効なマッピングを切り替える
    fn set_active_mapping(&mut self, mapping: Option<PageTable>);
}

/// 単一プロセッサのMMU
#[derive(Debug, Default)]
pub struct Mmu {
    /// ページテーブルベースレジスタ
    ptbr: Option<PageTable>,
}

impl Mmu {
    pub const fn new() -> Self {
        Self { ptbr: None }
    }
}

impl MemoryUnit for Mmu {
    fn active_mapping(&self) -> Option<PageTable> {
        self.ptbr
    }

    fn set_active_mapping(&mut self, mapping: Option<PageTable>) {
        match mapping {
            Some(pt) => crate::trace!("PTBR <- {}", pt),
            None => crate::trace!("PTBR <- none"),
        }
        self.ptbr = mapping;
    }
}
