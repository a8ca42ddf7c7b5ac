//! Telnet transport over any async byte stream.
//!
//! The device is driven as a dumb terminal: every option the peer offers
//! or requests is refused, subnegotiation is discarded, and only the data
//! stream is handed to the channel layer.

use std::future::Future;
use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::config::TelnetConfig;
use crate::error::{Result, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum IacState {
    #[default]
    Data,
    Iac,
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Incremental telnet command filter.
///
/// Sequences may be split across reads; state carries over between calls
/// to [`IacParser::feed`].
#[derive(Debug, Default)]
pub struct IacParser {
    state: IacState,
}

impl IacParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `input`, appending data bytes to `data` and negotiation
    /// refusals to `replies`.
    pub fn feed(&mut self, input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in input {
            self.state = match (self.state, byte) {
                (IacState::Data, IAC) => IacState::Iac,
                (IacState::Data, 0) => IacState::Data,
                (IacState::Data, b) => {
                    data.push(b);
                    IacState::Data
                }
                (IacState::Iac, IAC) => {
                    data.push(IAC);
                    IacState::Data
                }
                (IacState::Iac, cmd @ (WILL | WONT | DO | DONT)) => IacState::Negotiate(cmd),
                (IacState::Iac, SB) => IacState::Sub,
                (IacState::Iac, _) => IacState::Data,
                (IacState::Negotiate(cmd), option) => {
                    let refusal = if matches!(cmd, DO | DONT) { WONT } else { DONT };
                    replies.extend_from_slice(&[IAC, refusal, option]);
                    IacState::Data
                }
                (IacState::Sub, IAC) => IacState::SubIac,
                (IacState::Sub, _) => IacState::Sub,
                (IacState::SubIac, SE) => IacState::Data,
                (IacState::SubIac, _) => IacState::Sub,
            };
        }
    }
}

/// Double every 0xFF so it is not taken for IAC.
pub fn escape_iac(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &b in data {
        out.push(b);
        if b == IAC {
            out.push(IAC);
        }
    }
    out
}

/// A telnet connection over stream `S`.
pub struct TelnetTransport<S = TcpStream> {
    stream: S,
    parser: IacParser,
    read_buf: Vec<u8>,
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            parser: IacParser::new(),
            read_buf: vec![0; 4096],
        }
    }

    /// Read one chunk, waiting at most `interval`.
    ///
    /// `Ok(None)` means nothing arrived in time. A chunk made only of
    /// negotiation comes back as an empty vector.
    pub async fn read_chunk(&mut self, interval: Duration) -> Result<Option<Vec<u8>>> {
        let n = match tokio::time::timeout(interval, self.stream.read(&mut self.read_buf)).await {
            Err(_) => return Ok(None),
            Ok(Ok(0)) => return Err(TransportError::Disconnected.into()),
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(TransportError::Io(e).into()),
        };
        trace!("read {} bytes: {:?}", n, String::from_utf8_lossy(&self.read_buf[..n]));

        let mut data = Vec::with_capacity(n);
        let mut replies = Vec::new();
        self.parser.feed(&self.read_buf[..n], &mut data, &mut replies);
        if !replies.is_empty() {
            trace!("refusing telnet options: {:?}", replies);
            self.stream
                .write_all(&replies)
                .await
                .map_err(TransportError::Io)?;
        }
        Ok(Some(data))
    }

    /// Write `data`, escaping 0xFF bytes.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(&escape_iac(data))
            .await
            .map_err(TransportError::Io)?;
        self.stream.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    /// Shut down the write half of the stream.
    pub async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(TransportError::Io)?;
        Ok(())
    }
}

/// Opens the byte stream a session runs over.
///
/// [`TcpDialer`] is used for real devices; tests plug in scripted streams.
pub trait Dialer: Send + Sync {
    /// The connected stream type.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to the host described by `config`.
    fn dial(&self, config: &TelnetConfig) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// Plain TCP dialer bounded by [`TelnetConfig::connect_timeout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, config: &TelnetConfig) -> Result<TcpStream> {
        debug!("connecting to {}", config.socket_addr());
        let stream = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.connect_timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;
        stream.set_nodelay(true).map_err(TransportError::Io)?;
        Ok(stream)
    }
}
