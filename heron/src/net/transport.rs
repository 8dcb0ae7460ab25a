use std::time::Duration;

use thiserror::Error;
use tokio::{
	io::{self, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
	time::{error::Elapsed, timeout},
};

use crate::smtp::Response;

/// Longest command line RFC 5321 section 4.5.3.1.4 allows, CRLF included.
pub const MAX_COMMAND_LINE: usize = 512;

/// Frames a byte stream into command lines and writes replies back.
pub struct LineTransport<S> {
	stream: BufReader<S>,
	max_line: usize,
}

impl<S> LineTransport<S>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	pub fn new(stream: S) -> Self {
		Self::with_max_line(stream, MAX_COMMAND_LINE)
	}

	pub fn with_max_line(stream: S, max_line: usize) -> Self {
		Self {
			stream: BufReader::new(stream),
			max_line,
		}
	}

	/// Waits at most `idle` for the next full line and returns it without
	/// its terminator. The window starts when this is called.
	///
	/// Lines end in LF, optionally preceded by CR. A line over the limit is
	/// consumed up to its terminator and reported as
	/// [TransportError::LineTooLong], leaving the stream at the start of the
	/// following line.
	pub async fn read_line(&mut self, idle: Duration) -> Result<String, TransportError> {
		timeout(idle, self.next_line()).await?
	}

	async fn next_line(&mut self) -> Result<String, TransportError> {
		let mut line = Vec::with_capacity(128);
		let read = (&mut self.stream)
			.take(self.max_line as u64)
			.read_until(b'\n', &mut line)
			.await?;

		if read == 0 {
			return Err(TransportError::ConnectionClosed);
		}

		if line.last() != Some(&b'\n') {
			if line.len() < self.max_line {
				// EOF before the terminator
				return Err(TransportError::ConnectionClosed);
			}

			self.discard_line().await?;
			return Err(TransportError::LineTooLong { max: self.max_line });
		}

		line.pop();
		if line.last() == Some(&b'\r') {
			line.pop();
		}

		Ok(String::from_utf8_lossy(&line).into_owned())
	}

	async fn discard_line(&mut self) -> Result<(), TransportError> {
		loop {
			let available = self.stream.fill_buf().await?;
			if available.is_empty() {
				return Err(TransportError::ConnectionClosed);
			}

			let (found, used) = match available.iter().position(|&b| b == b'\n') {
				Some(index) => (true, index + 1),
				None => (false, available.len()),
			};
			self.stream.consume(used);

			if found {
				return Ok(());
			}
		}
	}

	/// Writes `line` followed by CRLF and flushes it.
	pub async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
		let mut buf = String::with_capacity(line.len() + 2);
		buf.push_str(line);
		buf.push_str("\r\n");

		self.write_flush(buf.as_bytes()).await
	}

	/// Writes every line of `response` in one go.
	pub async fn send(&mut self, response: &Response) -> Result<(), TransportError> {
		self.write_flush(response.as_string().as_bytes()).await
	}

	pub async fn shutdown(&mut self) -> Result<(), TransportError> {
		self.stream.get_mut().shutdown().await?;
		Ok(())
	}

	async fn write_flush(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
		let stream = self.stream.get_mut();
		stream.write_all(bytes).await?;
		stream.flush().await?;
		Ok(())
	}
}

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("no complete line within the idle timeout")]
	Timeout(#[from] Elapsed),
	#[error("connection closed by peer")]
	ConnectionClosed,
	#[error("line longer than {max} octets")]
	LineTooLong { max: usize },
	#[error("i/o failure: {0}")]
	Io(#[from] io::Error),
}

impl TransportError {
	pub fn is_timeout(&self) -> bool {
		matches!(self, TransportError::Timeout(_))
	}
}
