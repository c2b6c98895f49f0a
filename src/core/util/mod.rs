//! ユーティリティモジュール

pub mod log;
pub mod report;

pub use report::{LogReporter, RecordingReporter, Report, Reporter, Severity};
