mod domain;
mod validator;

pub use domain::*;
pub use validator::*;
