use std::convert::Infallible;

/// A parsed command line. Anything the server does not know becomes
/// `Unrecognized`, carrying the uppercased verb for the reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
	Helo(String),
	Rset,
	Noop,
	Quit,
	Unrecognized(String),
}

/// Splits a line at its first space into an uppercased verb and the raw
/// remainder. A line without a space is all verb.
pub fn split_verb(line: &str) -> (String, &str) {
	let (verb, text) = line.split_once(' ').unwrap_or((line, ""));

	(verb.to_ascii_uppercase(), text)
}

impl Command {
	pub fn verb(&self) -> &str {
		match self {
			Command::Helo(_) => "HELO",
			Command::Rset => "RSET",
			Command::Noop => "NOOP",
			Command::Quit => "QUIT",
			Command::Unrecognized(verb) => verb,
		}
	}
}

impl std::fmt::Display for Command {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Command::Helo(text) => write!(f, "HELO {}", text),
			other => write!(f, "{}", other.verb()),
		}
	}
}

impl std::str::FromStr for Command {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (verb, text) = split_verb(s);

		Ok(match verb.as_str() {
			"HELO" => Command::Helo(text.to_owned()),
			"RSET" => Command::Rset,
			"NOOP" => Command::Noop,
			"QUIT" => Command::Quit,
			_ => Command::Unrecognized(verb),
		})
	}
}
