pub mod collector;
pub mod kill;
pub mod netstat;
pub mod platform;
pub mod procfs;
pub mod snapshot;
pub mod source;
