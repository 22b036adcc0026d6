pub mod polling;
pub mod webhook;

use crate::telegram;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("telegram error: {0}")]
    Telegram(#[from] telegram::Error),

    #[error("io error: {0:?}")]
    Io(#[from] std::io::Error),
}
