//! 物理フレームアロケータ
//!
//! タスクのページテーブル用に4KBフレームを順番に払い出す

use alloc::vec::Vec;
use x86_64::{
    structures::paging::{FrameAllocator, FrameDeallocator, PhysFrame, Size4KiB},
    PhysAddr,
};

/// フレームサイズ
pub const FRAME_SIZE: u64 = 4096;

/// 先頭から順に割り当てるフレームアロケータ
///
/// 解放されたフレームは未使用領域より先に再利用する
#[derive(Debug)]
pub struct SequentialFrameAllocator {
    /// 次に割り当てるフレーム番号
    next_frame: u64,
    /// 割り当て可能な最後のフレーム番号（含まない）
    end_frame: u64,
    /// 解放済みフレーム
    released: Vec<PhysFrame>,
}

impl SequentialFrameAllocator {
    /// ページテーブル領域のデフォルト開始アドレス
    pub const DEFAULT_BASE: u64 = 0x10_0000;
    /// デフォルトのフレーム数
    pub const DEFAULT_FRAMES: u64 = 4096;

    /// 物理アドレス`base`から`frames`個のフレームを管理するアロケータを作成
    pub fn new(base: u64, frames: u64) -> Self {
        let start = base / FRAME_SIZE;
        Self {
            next_frame: start,
            end_frame: start + frames,
            released: Vec::new(),
        }
    }

    /// 残りのフレーム数
    pub fn remaining(&self) -> u64 {
        self.end_frame - self.next_frame + self.released.len() as u64
    }
}

impl Default for SequentialFrameAllocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE, Self::DEFAULT_FRAMES)
    }
}

unsafe impl FrameAllocator<Size4KiB> for SequentialFrameAllocator {
    /// フレームを割り当て
    fn allocate_frame(&mut self) -> Option<PhysFrame> {
        if let Some(frame) = self.released.pop() {
            return Some(frame);
        }
        if self.next_frame >= self.end_frame {
            return None;
        }
        let frame = PhysFrame::containing_address(PhysAddr::new(self.next_frame * FRAME_SIZE));
        self.next_frame += 1;
        Some(frame)
    }
}

impl FrameDeallocator<Size4KiB> for SequentialFrameAllocator {
    /// フレームを解放
    ///
    /// # Safety
    /// `frame`はこのアロケータが払い出したもので、もう参照されていないこと
    unsafe fn deallocate_frame(&mut self, frame: PhysFrame) {
        self.released.push(frame);
    }
}
