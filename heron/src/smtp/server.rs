use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Config;

use super::{args::ParseDomainError, Command, Response, ResponseCode, Session};

const BANNER: &str = concat!("heron ", env!("CARGO_PKG_VERSION"), " service ready");

/// The protocol state of one connection. It only deals in lines and
/// replies; reading and writing the socket is left to [crate::net].
pub struct Server {
	config: Arc<dyn Config>,
	session: Session,
	state: State,
}

impl Server {
	pub fn initiate(config: Arc<dyn Config>) -> (Self, Response) {
		let greeting = Response::with_message(
			ResponseCode::ServiceReady,
			format!("{} {}", config.primary_host(), BANNER),
		);

		(
			Self {
				config,
				session: Session::default(),
				state: State::AwaitingCommand,
			},
			greeting,
		)
	}

	/// Handles one command line, terminator already stripped.
	pub fn push(&mut self, line: &str) -> Response {
		let command = match line.parse::<Command>() {
			Ok(command) => command,
			Err(never) => match never {},
		};
		trace!(%command, "received");

		let response = match command {
			Command::Helo(text) => self.helo(&text),
			Command::Rset => self.rset(),
			Command::Noop => Self::okay(),
			Command::Quit => self.quit(),
			Command::Unrecognized(verb) => Self::unknown_command(&verb),
		};
		debug!(code = response.code().as_code(), "replying");

		response
	}

	/// The reply for a line that was longer than the transport allows.
	pub fn line_too_long(&self, max: usize) -> Response {
		Response::with_message(
			ResponseCode::UnrecognizedCommand,
			format!("line too long (max {} octets)", max),
		)
	}

	pub fn should_exit(&self) -> bool {
		self.state == State::Exit
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	fn helo(&mut self, text: &str) -> Response {
		if !self.session.accepts_greeting() {
			return Self::bad_command();
		}

		let client_domain = text.split_whitespace().next().unwrap_or_default();
		match client_domain.parse() {
			Ok(domain) => {
				self.session.greet(domain);
				Self::okay()
			}
			Err(ParseDomainError::Empty) => {
				Response::with_message(ResponseCode::InvalidParameters, "HELO requires a domain")
			}
			Err(err) => Response::with_message(
				ResponseCode::InvalidParameters,
				format!("invalid domain: {}", err),
			),
		}
	}

	fn rset(&mut self) -> Response {
		self.session = Session::default();

		Self::okay()
	}

	fn quit(&mut self) -> Response {
		self.state = State::Exit;

		Response::with_message(
			ResponseCode::ServiceClosing,
			format!("{} closing connection", self.config.primary_host()),
		)
	}

	fn okay() -> Response {
		Response::with_message(ResponseCode::Okay, "OK")
	}

	fn bad_command() -> Response {
		Response::with_message(ResponseCode::BadCommandSequence, "bad sequence of commands")
	}

	fn unknown_command(verb: &str) -> Response {
		Response::with_message(
			ResponseCode::UnrecognizedCommand,
			format!("unknown command: \"{}\"", verb.escape_debug()),
		)
	}

	#[cfg(test)]
	fn session_mut(&mut self) -> &mut Session {
		&mut self.session
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
	AwaitingCommand,
	Exit,
}
