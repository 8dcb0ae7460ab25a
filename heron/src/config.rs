use crate::smtp::args::Domain;

pub trait Config: Send + Sync {
	/// Returns the hostname that the server will present itself as
	fn primary_host(&self) -> Domain;
}

impl Config for Domain {
	fn primary_host(&self) -> Domain {
		self.clone()
	}
}
