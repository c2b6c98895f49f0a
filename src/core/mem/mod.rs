//! メモリ管理モジュール
//!
//! ページテーブル用フレームの割り当てとMMU

pub mod frame;
pub mod paging;

pub use frame::SequentialFrameAllocator;
pub use paging::{MemoryUnit, Mmu, PageTable};
