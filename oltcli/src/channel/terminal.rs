//! Interactive terminal channel over a telnet transport.
//!
//! The channel owns the pattern buffer and implements the three ways a
//! reply can end: a prompt in the buffer tail, a quiet line (two empty
//! reads in a row), or one of several expected patterns during login.

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};
use crate::transport::TelnetTransport;

/// Summary line printed by `ping`; the device stalls after it until it
/// receives another line ending.
const PING_SUMMARY: &[u8] = b"round-trip(ms) min/avg/max";

/// Empty reads in a row that end a quiet-mode read.
const QUIET_READS: u32 = 2;

/// Configuration for channel reads.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Upper bound for a single chunk read.
    pub read_interval: Duration,

    /// Search depth for prompt matching.
    pub search_depth: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            read_interval: Duration::from_secs(1),
            search_depth: 1000,
        }
    }
}

/// Prompt-driven reader and writer for one telnet connection.
pub struct TerminalChannel<S> {
    transport: TelnetTransport<S>,
    buffer: PatternBuffer,
    config: ChannelConfig,
}

impl<S> TerminalChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(transport: TelnetTransport<S>, config: ChannelConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(config.search_depth),
            transport,
            config,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Get a reference to the buffer.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// Write raw bytes to the device.
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!("send {:?}", String::from_utf8_lossy(data));
        self.transport.write_all(data).await
    }

    /// Read until any of `patterns` matches in the buffer tail.
    ///
    /// The earliest match wins. Returns its index and the bytes up to the
    /// end of the match; anything after it stays buffered.
    pub async fn read_until(
        &mut self,
        patterns: &[&Regex],
        deadline: Instant,
        expected: &str,
    ) -> Result<(usize, Vec<u8>)> {
        let started = Instant::now();
        loop {
            let hit = patterns
                .iter()
                .enumerate()
                .filter_map(|(i, p)| self.buffer.find_tail(p).map(|end| (end, i)))
                .min();
            if let Some((end, index)) = hit {
                return Ok((index, self.buffer.split_to(end)));
            }
            self.read_before(deadline, started, expected).await?;
        }
    }

    /// Read a command reply until `prompt` matches at the buffer tail.
    ///
    /// Returns everything read, prompt included.
    pub async fn read_until_prompt(
        &mut self,
        prompt: &Regex,
        deadline: Instant,
        line_ending: &[u8],
    ) -> Result<Vec<u8>> {
        let started = Instant::now();
        loop {
            match self.read_before(deadline, started, prompt.as_str()).await? {
                Some(chunk) if chunk_has_ping_summary(&chunk) => {
                    self.send(line_ending).await?;
                }
                _ => {
                    if self.buffer.tail_contains(prompt) {
                        return Ok(self.buffer.take());
                    }
                }
            }
        }
    }

    /// Read a command reply until the line goes quiet.
    pub async fn read_until_quiet(
        &mut self,
        deadline: Instant,
        line_ending: &[u8],
    ) -> Result<Vec<u8>> {
        let started = Instant::now();
        let mut empty = 0;
        loop {
            match self.read_before(deadline, started, "quiet line").await? {
                None => {
                    empty += 1;
                    if empty >= QUIET_READS {
                        return Ok(self.buffer.take());
                    }
                }
                Some(chunk) if chunk.is_empty() => {}
                Some(chunk) => {
                    empty = 0;
                    if chunk_has_ping_summary(&chunk) {
                        self.send(line_ending).await?;
                    }
                }
            }
        }
    }

    /// Discard pending output.
    ///
    /// Reads until `prompt` shows up or a read times out, then clears the
    /// buffer.
    pub async fn drain(&mut self, prompt: &Regex) -> Result<()> {
        while !self.buffer.tail_contains(prompt) {
            match self.transport.read_chunk(self.config.read_interval).await? {
                Some(chunk) => self.buffer.extend(&chunk),
                None => break,
            }
        }
        if !self.buffer.is_empty() {
            debug!("discarding {} pending bytes", self.buffer.len());
        }
        self.buffer.clear();
        Ok(())
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.buffer.clear();
        self.transport.close().await
    }

    /// Read one chunk into the buffer, bounded by both the read interval
    /// and `deadline`.
    ///
    /// Returns `None` for a soft timeout.
    async fn read_before(
        &mut self,
        deadline: Instant,
        started: Instant,
        expected: &str,
    ) -> Result<Option<Vec<u8>>> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ChannelError::PromptTimeout {
                expected: expected.to_string(),
                waited: started.elapsed(),
            }
            .into());
        }
        let chunk = self
            .transport
            .read_chunk(self.config.read_interval.min(remaining))
            .await?;
        if let Some(data) = &chunk {
            self.buffer.extend(data);
        }
        Ok(chunk)
    }
}

fn chunk_has_ping_summary(chunk: &[u8]) -> bool {
    memchr::memmem::find(chunk, PING_SUMMARY).is_some()
}
