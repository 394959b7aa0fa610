pub mod config;
pub mod doctor;
pub mod stats;
pub mod timer;
pub mod watch;
