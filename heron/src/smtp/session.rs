use super::args::Domain;

/// What one connection has negotiated so far.
///
/// A session is never cleared field by field. A reset swaps in
/// `Session::default()`, so the record is either wholly fresh or wholly
/// what the client built up.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
	client_domain: Option<Domain>,
	declared_sender: Option<String>,
	recipients: Vec<String>,
	transaction_data: String,
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	/// The domain the client gave in HELO, if it has greeted.
	pub fn client_domain(&self) -> Option<&Domain> {
		self.client_domain.as_ref()
	}

	pub fn declared_sender(&self) -> Option<&str> {
		self.declared_sender.as_deref()
	}

	pub fn recipients(&self) -> &[String] {
		&self.recipients
	}

	pub fn transaction_data(&self) -> &str {
		&self.transaction_data
	}

	pub fn has_greeted(&self) -> bool {
		self.client_domain.is_some()
	}

	/// A transaction is open exactly while a sender is declared.
	pub fn transaction_open(&self) -> bool {
		self.declared_sender.is_some()
	}

	/// HELO is only allowed before the client has greeted and outside of a
	/// transaction.
	pub fn accepts_greeting(&self) -> bool {
		!self.has_greeted() && !self.transaction_open()
	}

	pub fn greet(&mut self, client_domain: Domain) {
		self.client_domain = Some(client_domain);
	}

	// no wire command opens a transaction yet; these drive the state in tests

	/// Opens a transaction for `sender`. An empty sender is the null
	/// reverse-path and still counts as open.
	#[cfg(test)]
	pub fn begin_transaction<S: Into<String>>(&mut self, sender: S) {
		self.declared_sender = Some(sender.into());
	}

	#[cfg(test)]
	pub fn add_recipient<S: Into<String>>(&mut self, recipient: S) {
		self.recipients.push(recipient.into());
	}

	#[cfg(test)]
	pub fn append_data(&mut self, data: &str) {
		self.transaction_data.push_str(data);
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn domain(s: &str) -> Domain {
		s.parse().unwrap()
	}

	#[test]
	fn fresh_session_is_empty() {
		let session = Session::new();

		assert_eq!(session.client_domain(), None);
		assert_eq!(session.declared_sender(), None);
		assert!(session.recipients().is_empty());
		assert!(session.transaction_data().is_empty());
		assert!(session.accepts_greeting());
	}

	#[test]
	fn greeting_is_refused_once_greeted() {
		let mut session = Session::new();
		session.greet(domain("a.com"));

		assert!(!session.accepts_greeting());
		assert_eq!(session.client_domain(), Some(&domain("a.com")));
	}

	#[test]
	fn greeting_is_refused_mid_transaction() {
		let mut session = Session::new();
		session.begin_transaction("");

		assert!(session.transaction_open());
		assert!(!session.accepts_greeting());
	}

	#[test]
	fn replacing_resets_every_field() {
		let mut session = Session::new();
		session.greet(domain("a.com"));
		session.begin_transaction("<alice@a.com>");
		session.add_recipient("<bob@b.com>");
		session.append_data("Subject: hi\r\n");

		session = Session::default();

		assert_eq!(session, Session::new());
	}
}
