use alloc::vec::Vec;

use super::ids::ThreadId;
use crate::error::{ResourceError, Result};

/// リソース管理のインターフェース
pub trait ResourceControl {
    /// スレッドが保持しているリソースインスタンスをすべて返却する
    fn release_all(&mut self, thread: ThreadId);
}

/// リソースID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(usize);

impl ResourceId {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

struct Resource {
    total: u32,
    available: u32,
}

struct Allocation {
    thread: ThreadId,
    resource: ResourceId,
    count: u32,
}

/// リソーステーブル
///
/// リソースの種類ごとのインスタンス数と、スレッドへの割り当てを記録する
#[derive(Default)]
pub struct ResourceTable {
    resources: Vec<Resource>,
    allocations: Vec<Allocation>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `total`個のインスタンスを持つリソースを登録
    pub fn register(&mut self, total: u32) -> ResourceId {
        self.resources.push(Resource {
            total,
            available: total,
        });
        ResourceId(self.resources.len() - 1)
    }

    /// インスタンスを確保
    pub fn acquire(&mut self, thread: ThreadId, resource: ResourceId, count: u32) -> Result<()> {
        let entry = self
            .resources
            .get_mut(resource.0)
            .ok_or(ResourceError::UnknownResource)?;
        if entry.available < count {
            return Err(ResourceError::Insufficient.into());
        }
        entry.available -= count;

        match self
            .allocations
            .iter_mut()
            .find(|a| a.thread == thread && a.resource == resource)
        {
            Some(allocation) => allocation.count += count,
            None => self.allocations.push(Allocation {
                thread,
                resource,
                count,
            }),
        }
        Ok(())
    }

    /// 空きインスタンス数
    pub fn available(&self, resource: ResourceId) -> Option<u32> {
        self.resources.get(resource.0).map(|r| r.available)
    }

    /// 総インスタンス数
    pub fn total(&self, resource: ResourceId) -> Option<u32> {
        self.resources.get(resource.0).map(|r| r.total)
    }

    /// スレッドが保持するインスタンス数（全リソース合計）
    pub fn held_by(&self, thread: ThreadId) -> u32 {
        self.allocations
            .iter()
            .filter(|a| a.thread == thread)
            .map(|a| a.count)
            .sum()
    }
}

impl ResourceControl for ResourceTable {
    fn release_all(&mut self, thread: ThreadId) {
        let resources = &mut self.resources;
        self.allocations.retain(|a| {
            if a.thread != thread {
                return true;
            }
            if let Some(entry) = resources.get_mut(a.resource.0) {
                entry.available += a.count;
            }
            false
        });
    }
}
