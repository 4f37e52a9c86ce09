pub mod messages;
pub mod output;
pub mod worker;
