use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::report::{Report, ReportError, Reporter};

/// 送信されたメッセージ（トピックとJSON）
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: String,
    pub report: Report,
}

/// テスト用のモック送信先
///
/// クローン同士で履歴を共有するので、ループに渡した後でも検証できます。
#[derive(Debug, Clone, Default)]
pub struct MockReporter {
    published: Rc<RefCell<Vec<PublishedMessage>>>,
    attempts: Rc<Cell<usize>>,
    should_fail: Rc<Cell<bool>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.borrow().clone()
    }

    /// 送信されたトピックの一覧
    pub fn topics(&self) -> Vec<String> {
        self.published.borrow().iter().map(|m| m.topic.clone()).collect()
    }

    /// 失敗したものも含めた送信試行回数
    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }

    /// テスト用: 送信失敗をシミュレート
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.set(fail);
    }
}

impl Reporter for MockReporter {
    fn publish(&mut self, report: &Report) -> Result<(), ReportError> {
        self.attempts.set(self.attempts.get() + 1);
        if self.should_fail.get() {
            return Err(ReportError::Transport("Mock broker unavailable".to_string()));
        }

        let payload = report.to_json()?;
        self.published.borrow_mut().push(PublishedMessage {
            topic: report.topic(),
            payload,
            report: report.clone(),
        });
        Ok(())
    }
}
