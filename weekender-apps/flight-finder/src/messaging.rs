//!  Weekender Flight Finder
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Outgoing messages and the sink front ends deliver them through.
//!
//! Text is chat-style Markdown. Keyboards are rows of buttons, each button
//! carrying the command line it stands for, so any front end can render
//! them (inline buttons in a chat, hints in a terminal).

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    pub command: String,
}

impl Button {
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Lay buttons out left to right, `columns` per row; the last row may be short.
    pub fn grid(buttons: Vec<Button>, columns: usize) -> Self {
        let columns = columns.max(1);
        let mut rows = Vec::new();
        let mut row = Vec::with_capacity(columns);
        for button in buttons {
            row.push(button);
            if row.len() == columns {
                rows.push(std::mem::replace(&mut row, Vec::with_capacity(columns)));
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
        Self { rows }
    }

    pub fn push_row(&mut self, row: Vec<Button>) {
        self.rows.push(row);
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Where replies go. Delivery failures are the sink's to report.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, reply: Reply) -> anyhow::Result<()>;
}

/// Buffers replies in memory, for request/response front ends and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    replies: Mutex<Vec<Reply>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Reply> {
        std::mem::take(&mut *self.replies.lock().unwrap_or_else(|p| p.into_inner()))
    }

    pub fn texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSink for CollectingSink {
    async fn send(&self, reply: Reply) -> anyhow::Result<()> {
        self.replies
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(reply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout() {
        let buttons = (0..5).map(|i| Button::new(i.to_string(), "noop")).collect();
        let keyboard = Keyboard::grid(buttons, 2);
        let widths: Vec<_> = keyboard.rows.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![2, 2, 1]);
        assert_eq!(keyboard.buttons().count(), 5);
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.send(Reply::text("hello")).await.unwrap();
        assert_eq!(sink.texts(), vec!["hello"]);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.texts().is_empty());
    }
}
