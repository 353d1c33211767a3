mod console;
mod ret;

pub use console::{ConsolePresenter, NoClipboard};
pub use ret::{MemoryClipboard, ReturnNoticePresenter};
