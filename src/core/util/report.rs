//! 報告シンク
//!
//! スケジューラはエラー・警告・操作ログをここへ流すだけで、
//! 報告によってスケジューラの状態が変わることはない。

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use spin::Mutex;

/// 報告の重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Log,
    Warning,
    Error,
}

/// 報告シンク
pub trait Reporter {
    /// 致命的な不整合を報告
    fn report_error(&self, context: &dyn fmt::Display, message: &str);

    /// 回復可能な異常を報告
    fn report_warning(&self, context: &dyn fmt::Display, message: &str);

    /// 操作ログ
    fn log(&self, context: &dyn fmt::Display, message: &str);
}

/// `log`ファサードへ転送する報告シンク
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report_error(&self, context: &dyn fmt::Display, message: &str) {
        crate::error!("{}: {}", context, message);
    }

    fn report_warning(&self, context: &dyn fmt::Display, message: &str) {
        crate::warn!("{}: {}", context, message);
    }

    fn log(&self, context: &dyn fmt::Display, message: &str) {
        crate::debug!("{}: {}", context, message);
    }
}

/// 記録された報告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub context: String,
    pub message: String,
}

/// 報告を記録しつつ`log`ファサードへも転送するシンク
///
/// テストやハーネスが警告・エラーの発生を後から確認するために使う
#[derive(Debug, Default)]
pub struct RecordingReporter {
    records: Mutex<Vec<Report>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, severity: Severity, context: &dyn fmt::Display, message: &str) {
        self.records.lock().push(Report {
            severity,
            context: context.to_string(),
            message: message.to_string(),
        });
    }

    /// 記録済みの報告をすべて取得
    pub fn records(&self) -> Vec<Report> {
        self.records.lock().clone()
    }

    /// 指定した重要度の報告数
    pub fn count(&self, severity: Severity) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    /// 記録を破棄
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Reporter for RecordingReporter {
    fn report_error(&self, context: &dyn fmt::Display, message: &str) {
        LogReporter.report_error(context, message);
        self.record(Severity::Error, context, message);
    }

    fn report_warning(&self, context: &dyn fmt::Display, message: &str) {
        LogReporter.report_warning(context, message);
        self.record(Severity::Warning, context, message);
    }

    fn log(&self, context: &dyn fmt::Display, message: &str) {
        LogReporter.log(context, message);
        self.record(Severity::Log, context, message);
    }
}
