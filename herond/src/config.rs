use std::{
	net::{AddrParseError, IpAddr, SocketAddr},
	num::ParseIntError,
	path::PathBuf,
	time::Duration,
};

use confindent::Confindent;
use getopts::{Matches, Options};
use heron::{
	net::DEFAULT_IDLE_TIMEOUT,
	smtp::args::{Domain, ParseDomainError},
};
use thiserror::Error;

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["/etc/heron/heron.conf", "heron.conf"];

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
	pub address: IpAddr,
	pub port: u16,
	pub hostname: Domain,
	pub idle_timeout: Duration,
}

impl Config {
	fn options() -> Options {
		let mut opts = Options::new();
		opts.optflag("h", "help", "Print this help message");
		opts.optopt(
			"l",
			"listen-address",
			"The IP address heron will listen for incoming connections on\nDefault: 127.0.0.1",
			"IP_ADDR",
		);
		opts.optopt(
			"p",
			"port",
			"The port heron will listen on\nDefault: 8000",
			"PORT",
		);
		opts.optopt(
			"n",
			"hostname",
			"The domain heron greets clients with\nDefault: this machine's hostname",
			"DOMAIN",
		);
		opts.optopt(
			"t",
			"idle-timeout",
			"Seconds a client may stay silent before it is disconnected\nDefault: 30",
			"SECONDS",
		);
		opts.optopt(
			"c",
			"config",
			"An alternate location to read the config from\nDefault: /etc/heron/heron.conf, then ./heron.conf",
			"PATH",
		);
		opts
	}

	pub fn print_usage<S: AsRef<str>>(prgm: S) {
		let brief = format!("Usage: {} [options]", prgm.as_ref());
		println!("{}", Self::options().usage(&brief));
	}

	/// Reads the command line and config file. `Ok(None)` means the user
	/// only asked for help.
	pub fn get() -> Result<Option<Self>, ConfigError> {
		let args: Vec<String> = std::env::args().collect();
		let program = args.first().cloned().unwrap_or_else(|| "herond".into());

		let matches = Self::options().parse(args.iter().skip(1))?;
		if matches.opt_present("help") {
			Self::print_usage(program);
			return Ok(None);
		}

		let file = Self::load_file(matches.opt_str("config"))?;
		Self::from_sources(&matches, file.as_ref()).map(Some)
	}

	// an explicit --config must load, the default locations may be absent
	fn load_file(explicit: Option<String>) -> Result<Option<Confindent>, ConfigError> {
		match explicit {
			Some(path) => match Confindent::from_file(&path) {
				Ok(conf) => Ok(Some(conf)),
				Err(err) => Err(ConfigError::File {
					path: path.into(),
					reason: err.to_string(),
				}),
			},
			None => Ok(DEFAULT_CONFIG_PATHS
				.iter()
				.find_map(|path| Confindent::from_file(path).ok())),
		}
	}

	fn from_sources(matches: &Matches, file: Option<&Confindent>) -> Result<Self, ConfigError> {
		// Options specified on the command line take priority. We only take the
		// cli_key and convert to the config key internally so that we can remain
		// consistent.
		let find_value = |cli_key: &str| -> Option<String> {
			let conf_key: String = cli_key
				.split('-')
				.map(|word| {
					let mut c = word.chars();
					match c.next() {
						None => String::new(),
						Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
					}
				})
				.collect();

			matches.opt_str(cli_key).or_else(|| {
				file.and_then(|conf| conf.child_value(conf_key))
					.map(|s| s.to_owned())
			})
		};

		let address = match find_value("listen-address") {
			Some(value) => value.parse().map_err(|source| ConfigError::Address {
				value,
				source,
			})?,
			None => IpAddr::from([127, 0, 0, 1]),
		};

		let port = match find_value("port") {
			Some(value) => value
				.parse()
				.map_err(|source| ConfigError::Port { value, source })?,
			None => 8000,
		};

		let hostname = match find_value("hostname") {
			Some(value) => value
				.parse()
				.map_err(|source| ConfigError::Hostname { value, source })?,
			None => Self::machine_hostname(),
		};

		let idle_timeout = match find_value("idle-timeout") {
			Some(value) => match value.parse::<u64>() {
				Ok(0) => return Err(ConfigError::ZeroTimeout),
				Ok(seconds) => Duration::from_secs(seconds),
				Err(source) => return Err(ConfigError::Timeout { value, source }),
			},
			None => DEFAULT_IDLE_TIMEOUT,
		};

		Ok(Self {
			address,
			port,
			hostname,
			idle_timeout,
		})
	}

	fn machine_hostname() -> Domain {
		gethostname::gethostname()
			.to_str()
			.and_then(|name| name.parse().ok())
			.unwrap_or_else(|| Domain::Fqdn(String::from("localhost")))
	}

	pub fn socket_address(&self) -> SocketAddr {
		SocketAddr::new(self.address, self.port)
	}
}

impl heron::config::Config for Config {
	fn primary_host(&self) -> Domain {
		self.hostname.clone()
	}
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("{0}")]
	Arguments(#[from] getopts::Fail),
	#[error("failed to read config file {path:?}: {reason}")]
	File { path: PathBuf, reason: String },
	#[error("failed to parse '{value}' as an IP address")]
	Address {
		value: String,
		source: AddrParseError,
	},
	#[error("failed to parse '{value}' as a port")]
	Port {
		value: String,
		source: ParseIntError,
	},
	#[error("failed to parse '{value}' as a hostname: {source}")]
	Hostname {
		value: String,
		source: ParseDomainError,
	},
	#[error("failed to parse '{value}' as a number of seconds")]
	Timeout {
		value: String,
		source: ParseIntError,
	},
	#[error("the idle timeout must be at least one second")]
	ZeroTimeout,
}
