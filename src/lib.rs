//! # penguin-stats
//!
//! Typed async client for [Penguin Statistics](https://penguin-stats.io),
//! the crowd-sourced drop-rate service for Arknights.
//!
//! ## Modules
//!
//! - [`client`]: REST client for reports, the drop matrix, stages and the planner
//! - [`matrix`]: Drop matrix with per-stage lookup and an optional stage index
//! - [`types`]: Wire types (servers, drops, records, stages, planner)
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use penguin_stats::{ClientConfig, PenguinClient, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PenguinClient::new(ClientConfig::default())?;
//!
//!     let mut matrix = client.get_matrix(Some(Server::Us)).await?;
//!     matrix.build_index();
//!
//!     for record in matrix.lookup("main_01-07") {
//!         println!("{}: {}/{}", record.item_id, record.quantity, record.times);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod matrix;
pub mod types;

pub use client::{ClientConfig, MatrixQuery, PenguinClient, BASE_URL, PLANNER_URL};
pub use config::{Config, ConfigError, DefaultsConfig, LoggingConfig};
pub use error::{PenguinError, PenguinResult};
pub use matrix::{DropMatrix, GroupIndex};
pub use types::{
    Bounds, DropInfo, DropRecord, DropReport, DropType, ItemDrop, ItemValue, ItemValueGroup,
    PlannedStage, PlannerPlan, PlannerRequest, Server, Stage, Synthesis,
};
