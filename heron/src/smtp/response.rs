use std::{cmp::Ordering, num::ParseIntError};

use thiserror::Error;

/// A reply to the client: one code and one or more text lines.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
	pub code: ResponseCode,
	messages: Vec<String>,
}

impl Response {
	pub fn new(code: ResponseCode) -> Self {
		Self {
			code,
			messages: vec![],
		}
	}

	pub fn with_message<S: Into<String>>(code: ResponseCode, message: S) -> Self {
		Self {
			code,
			messages: vec![message.into()],
		}
	}

	pub fn push<S: Into<String>>(&mut self, message: S) {
		self.messages.push(message.into());
	}

	pub fn insert(&mut self, index: usize, message: &str) {
		self.messages.insert(index, message.to_owned());
	}

	pub fn code(&self) -> ResponseCode {
		self.code
	}

	pub fn messages(&self) -> &[String] {
		&self.messages
	}

	/// The reply as wire lines without their CRLF. Every line but the last
	/// uses the `code-text` continuation form.
	pub fn lines(&self) -> Vec<String> {
		let code = self.code.as_code();

		match self.messages.split_last() {
			None => vec![format!("{} ", code)],
			Some((last, rest)) => rest
				.iter()
				.map(|message| format!("{}-{}", code, message))
				.chain(std::iter::once(format!("{} {}", code, last)))
				.collect(),
		}
	}

	pub fn as_string(&self) -> String {
		self.lines()
			.into_iter()
			.map(|mut line| {
				line.push_str("\r\n");
				line
			})
			.collect()
	}
}

impl std::str::FromStr for Response {
	type Err = ParseResponseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut lines = s.trim_end().rsplit("\r\n");

		let mut response = match lines.next() {
			Some(line) => match line.len().cmp(&3) {
				Ordering::Less => return Err(ParseResponseError::MalformedResponse),
				Ordering::Equal => Response::with_message(line.parse()?, ""),
				Ordering::Greater => {
					let (code, message) = line
						.split_once(' ')
						.ok_or(ParseResponseError::MalformedResponse)?;

					Response::with_message(code.parse()?, message.trim())
				}
			},
			None => return Err(ParseResponseError::EmptyString),
		};

		for line in lines {
			if line.len() <= 4 {
				return Err(ParseResponseError::MalformedResponse);
			}

			let (code, message) = line
				.split_once('-')
				.ok_or(ParseResponseError::MalformedResponse)?;
			let code: ResponseCode = code.parse()?;

			if response.code() != code {
				return Err(ParseResponseError::MixedResponseCode);
			}
			response.insert(0, message.trim());
		}

		Ok(response)
	}
}

#[derive(Error, Debug)]
pub enum ParseResponseError {
	#[error("multiline responses may not mix reply codes")]
	MixedResponseCode,
	#[error("the response was malformed")]
	MalformedResponse,
	#[error("the response code did not make sense")]
	MalformedResponseCode,
	#[error("the response code was invalid")]
	InvalidResponseCode(#[from] ParseIntError),
	#[error("the reply was empty")]
	EmptyString,
}

#[derive(Clone, Copy, Debug)]
pub enum ResponseCode {
	UnrecognizedCommand,   // 500
	InvalidParameters,     // 501
	CommandNotImplemented, // 502
	BadCommandSequence,    // 503

	SystemStatus,   // 211
	HelpMessage,    // 214
	ServiceReady,   // 220
	ServiceClosing, // 221

	ServiceNotAvailable, // 421 (Service not available, closing transmission channel)

	Okay, // 250

	StartMailInput,  // 354
	TransactionFail, // 554

	UnknownPositiveCompletion(u16), // 2xx
	UnknownPositiveWaiting(u16),    // 3xx
	UnknownNegativeTemporary(u16),  // 4xx
	UnknownNegativePermanent(u16),  // 5xx
}

impl PartialEq for ResponseCode {
	fn eq(&self, other: &Self) -> bool {
		self.as_code() == other.as_code()
	}
}

impl ResponseCode {
	pub fn from_code(code: u16) -> Option<ResponseCode> {
		let known = match code {
			500 => ResponseCode::UnrecognizedCommand,
			501 => ResponseCode::InvalidParameters,
			502 => ResponseCode::CommandNotImplemented,
			503 => ResponseCode::BadCommandSequence,

			211 => ResponseCode::SystemStatus,
			214 => ResponseCode::HelpMessage,
			220 => ResponseCode::ServiceReady,
			221 => ResponseCode::ServiceClosing,

			421 => ResponseCode::ServiceNotAvailable,

			250 => ResponseCode::Okay,

			354 => ResponseCode::StartMailInput,
			554 => ResponseCode::TransactionFail,

			_ => {
				return match code / 100 {
					2 => Some(ResponseCode::UnknownPositiveCompletion(code)),
					3 => Some(ResponseCode::UnknownPositiveWaiting(code)),
					4 => Some(ResponseCode::UnknownNegativeTemporary(code)),
					5 => Some(ResponseCode::UnknownNegativePermanent(code)),
					_ => None,
				}
			}
		};

		Some(known)
	}

	pub fn as_code(self) -> u16 {
		match self {
			ResponseCode::UnrecognizedCommand => 500,
			ResponseCode::InvalidParameters => 501,
			ResponseCode::CommandNotImplemented => 502,
			ResponseCode::BadCommandSequence => 503,

			ResponseCode::SystemStatus => 211,
			ResponseCode::HelpMessage => 214,
			ResponseCode::ServiceReady => 220,
			ResponseCode::ServiceClosing => 221,

			ResponseCode::ServiceNotAvailable => 421,

			ResponseCode::Okay => 250,

			ResponseCode::StartMailInput => 354,
			ResponseCode::TransactionFail => 554,

			ResponseCode::UnknownPositiveCompletion(code)
			| ResponseCode::UnknownPositiveWaiting(code)
			| ResponseCode::UnknownNegativeTemporary(code)
			| ResponseCode::UnknownNegativePermanent(code) => code,
		}
	}

	pub fn is_negative(&self) -> bool {
		let first = self.as_code() / 100;

		first == 4 || first == 5
	}

	pub fn is_positive(&self) -> bool {
		let first = self.as_code() / 100;

		first == 2 || first == 3
	}
}

impl std::str::FromStr for ResponseCode {
	type Err = ParseResponseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.len() == 3 {
			ResponseCode::from_code(s.parse()?).ok_or(ParseResponseError::MalformedResponseCode)
		} else {
			Err(ParseResponseError::MalformedResponseCode)
		}
	}
}
