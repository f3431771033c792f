pub mod config;
pub mod credentials;
pub mod driver;
pub mod duration;
pub mod poll;
pub mod redeem;
pub mod session;
