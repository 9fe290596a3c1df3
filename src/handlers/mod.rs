pub mod commission;
pub mod options;
pub mod session;
pub mod user;
