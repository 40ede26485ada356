//! Message handling - turning raw adapter text into structured messages

pub mod parser;

pub use parser::MessageParser;
