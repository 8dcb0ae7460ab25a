pub mod args;
mod command;
mod response;
mod server;
mod session;

pub use command::{split_verb, Command};
pub use response::{ParseResponseError, Response, ResponseCode};
pub use server::Server;
pub use session::Session;
