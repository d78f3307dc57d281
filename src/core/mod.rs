pub mod chat_stream;
pub mod config;
pub mod gateway;
pub mod image;
pub mod keyring;
pub mod message;
pub mod secrets;
pub mod session;
pub mod transcript;
