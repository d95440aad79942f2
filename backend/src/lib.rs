//! # nightplan
//!
//! Observation-session planner for a single amateur telescope site.
//!
//! Given an observer location, an instrument setup and a catalog of deep-sky
//! objects, the planner decides for one night which objects can be imaged,
//! for how long, and in what order.
//!
//! ## Architecture
//!
//! - [`astro`]: Sidereal time, horizontal coordinates, Sun and Moon ephemerides
//! - [`models`]: Catalog objects, periods, annotations and schedules
//! - [`services`]: Twilight, visibility windows, Moon interference, exposure and mosaic grouping
//! - [`scheduler`]: Strategy scoring and conflict-free slot assignment
//! - [`planner`]: The end-to-end pipeline for one night
//! - [`config`]: TOML configuration
//!
//! ## Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use nightplan::{NightPlanner, PlanRequest, PlannerConfig};
//!
//! let planner = NightPlanner::new(PlannerConfig::new(28.76, -17.89))?;
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let plan = planner.plan(&[], &PlanRequest::for_date(date));
//! assert!(plan.nothing_visible());
//! # Ok::<(), nightplan::PlannerError>(())
//! ```

pub mod astro;
pub mod config;
pub mod error;
pub mod models;
pub mod planner;
pub mod scheduler;
pub mod services;

pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use planner::{NightPlan, NightPlanner, PlanRequest, RejectedObject, RejectionReason};
pub use scheduler::{find_conflicts, Scheduler};
