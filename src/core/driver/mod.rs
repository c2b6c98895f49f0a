//! デバイス管理
//!
//! デバイステーブルと、各デバイスが持つI/O要求（IORB）キュー

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::task::ThreadId;

/// デバイスのインターフェース
pub trait Device {
    /// 指定スレッドが出した未完了のI/O要求をすべて取り消す
    ///
    /// # Returns
    /// 取り消した要求の数
    fn cancel_pending_io(&mut self, thread: ThreadId) -> usize;

    /// 指定スレッドの未完了要求の数
    fn pending_io(&self, thread: ThreadId) -> usize;
}

/// I/O要求の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Read,
    Write,
}

/// I/O要求ブロック
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iorb {
    /// 要求を出したスレッド
    pub thread: ThreadId,
    /// 操作
    pub op: IoOperation,
    /// 対象ブロック番号
    pub block: u64,
}

/// 要求をFIFOで処理する単純なデバイス
#[derive(Debug, Default)]
pub struct IoDevice {
    queue: VecDeque<Iorb>,
}

impl IoDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// 要求をキューに積む
    pub fn enqueue(&mut self, iorb: Iorb) {
        self.queue.push_back(iorb);
    }

    /// 先頭の要求を完了させる
    pub fn complete_next(&mut self) -> Option<Iorb> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Device for IoDevice {
    fn cancel_pending_io(&mut self, thread: ThreadId) -> usize {
        let before = self.queue.len();
        self.queue.retain(|iorb| iorb.thread != thread);
        before - self.queue.len()
    }

    fn pending_io(&self, thread: ThreadId) -> usize {
        self.queue.iter().filter(|iorb| iorb.thread == thread).count()
    }
}

/// デバイステーブル
///
/// インデックス0から`table_size()`未満までのデバイスを列挙できる
#[derive(Default)]
pub struct DeviceTable {
    devices: Vec<Box<dyn Device>>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// デバイスを登録
    ///
    /// # Returns
    /// 割り当てたインデックス
    pub fn register(&mut self, device: Box<dyn Device>) -> usize {
        self.devices.push(device);
        self.devices.len() - 1
    }

    /// テーブルのサイズ
    pub fn table_size(&self) -> usize {
        self.devices.len()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Device> {
        self.devices.get(index).map(|d| &**d)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Device + 'static)> {
        self.devices.get_mut(index).map(|d| &mut **d)
    }

    /// すべてのデバイスから指定スレッドの要求を取り消す
    ///
    /// # Returns
    /// 取り消した要求の総数
    pub fn cancel_all(&mut self, thread: ThreadId) -> usize {
        let mut cancelled = 0;
        for index in 0..self.table_size() {
            if let Some(device) = self.get_mut(index) {
                cancelled += device.cancel_pending_io(thread);
            }
        }
        cancelled
    }
}
