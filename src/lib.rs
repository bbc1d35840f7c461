pub mod config;
pub mod http;
pub mod humanize;
pub mod job;
pub mod naming;
pub mod processors;
pub mod store;
