//! Pipeline stages between the astronomy layer and the scheduler.
//!
//! Each service is a small configured struct with pure methods. None of them
//! mutates catalog objects; they return records the planner collects.

pub mod exposure;
pub mod moon_interference;
pub mod mosaic;
pub mod twilight;
pub mod visibility;

pub use exposure::{required_exposure, required_panels, ExposurePlan, ExposurePlanner};
pub use moon_interference::{interference_radius, MoonInterferenceAnalyzer};
pub use mosaic::{spatial_fit, temporal_overlap, MosaicGrouper};
pub use twilight::TwilightFinder;
pub use visibility::{is_visible, VisibilityBand, VisibilityWindow, VisibilityWindowFinder};
