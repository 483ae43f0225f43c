//! Stand-in button driven by the Enter key

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::application::ports::{ButtonError, ButtonEvents};

/// Treats every input line as a press immediately followed by a release
pub struct KeyboardButton<R = BufReader<Stdin>> {
    lines: Lines<R>,
}

impl KeyboardButton {
    /// Read presses from standard input
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> KeyboardButton<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ButtonEvents for KeyboardButton<R> {
    async fn wait_for_press(&mut self) -> Result<(), ButtonError> {
        match self.lines.next_line().await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ButtonError::Closed),
            Err(e) => Err(ButtonError::ReadFailed(e.to_string())),
        }
    }

    async fn wait_for_release(&mut self) -> Result<(), ButtonError> {
        Ok(())
    }
}
