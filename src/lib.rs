//! Stats resolution and aggregation over historical NBA season tables.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod rankings;
pub mod resolve;
pub mod rpc;
pub mod tables;
pub mod team_summary;
