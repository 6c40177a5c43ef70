pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod onboard;
pub mod profile;
pub mod serve;
