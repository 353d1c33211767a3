use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::super::{Clipboard, Notice, NoticePresenter};

pub struct ReturnNoticePresenter {
    pub ret: mpsc::UnboundedSender<Notice>,
}

impl ReturnNoticePresenter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (ret, rx) = mpsc::unbounded_channel();
        (Self { ret }, rx)
    }
}

#[async_trait]
impl NoticePresenter for ReturnNoticePresenter {
    async fn complete(&self, notice: Notice) -> Result<()> {
        self.ret.send(notice).map_err(|e| anyhow!(e.to_string()))
    }
}

/// Clipboard kept in memory; `refuse` makes every write fail.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub content: Mutex<Option<String>>,
    pub refuse: bool,
}

impl Clipboard for MemoryClipboard {
    fn write(&self, text: &str) -> Result<()> {
        if self.refuse {
            return Err(anyhow!("clipboard write denied"));
        }

        *self.content.lock().map_err(|e| anyhow!(e.to_string()))? = Some(text.to_string());
        Ok(())
    }
}
