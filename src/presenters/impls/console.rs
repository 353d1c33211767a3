use anyhow::{bail, Result};
use async_trait::async_trait;

use super::super::{Clipboard, Notice, NoticePresenter};

/// Prints notices on stdout, failures on stderr.
#[derive(Debug, Default)]
pub struct ConsolePresenter;

#[async_trait]
impl NoticePresenter for ConsolePresenter {
    async fn complete(&self, notice: Notice) -> Result<()> {
        match &notice {
            Notice::Failed { .. } => eprintln!("{}", notice),
            Notice::LinkCopied(link) => println!("{} {}", notice, link),
            _ => println!("{}", notice),
        }

        Ok(())
    }
}

/// Terminal without clipboard access.
#[derive(Debug, Default)]
pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn write(&self, _: &str) -> Result<()> { bail!("clipboard unavailable") }
}
