//! Sunset/sunrise and astronomical twilight for a planning night.
//!
//! The search starts at local solar noon and walks forward in fixed steps
//! until the Sun drops below the target altitude, then keeps walking until it
//! climbs back above it. In precise mode each crossing is refined with Newton
//! iteration on `altitude(t) - target`.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use log::debug;

use crate::astro::sun_altitude;
use crate::config::PlannerConfig;
use crate::error::Result;
use crate::models::{Observer, VisibilityPeriod};

/// Geometric sunset/sunrise altitude.
pub const HORIZON_ALTITUDE: f64 = 0.0;

/// Sun altitude at the end of astronomical twilight.
pub const ASTRONOMICAL_TWILIGHT_ALTITUDE: f64 = -18.0;

/// How far past solar noon the crossings are searched for.
const SEARCH_WINDOW_HOURS: i64 = 36;

const NEWTON_TOLERANCE_DEG: f64 = 0.01;
const NEWTON_MAX_ITERATIONS: usize = 10;
const DERIVATIVE_HALF_STEP_SECONDS: i64 = 30;

/// 12:00 UTC shifted by the observer's longitude.
pub fn local_solar_noon(date: NaiveDate, longitude_degrees: f64) -> Option<DateTime<Utc>> {
    let noon = Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0)?);
    let shift_ms = (longitude_degrees / 15.0 * 3_600_000.0).round() as i64;
    Some(noon - Duration::milliseconds(shift_ms))
}

/// Find when `altitude` drops below `target` after `from`, and when it rises
/// back above it.
///
/// Returns `None` when either crossing is missing within 36 hours.
pub fn find_crossings_with<F>(
    from: DateTime<Utc>,
    step: Duration,
    target: f64,
    precise: bool,
    altitude: F,
) -> Option<VisibilityPeriod>
where
    F: Fn(DateTime<Utc>) -> f64,
{
    if step <= Duration::zero() {
        return None;
    }
    let limit = from + Duration::hours(SEARCH_WINDOW_HOURS);

    let mut t = from;
    while altitude(t) >= target {
        t += step;
        if t > limit {
            return None;
        }
    }
    let set = t;

    while altitude(t) < target {
        t += step;
        if t > limit {
            return None;
        }
    }
    let rise = t;

    let (set, rise) = if precise {
        (
            refine_crossing(set, step, target, &altitude),
            refine_crossing(rise, step, target, &altitude),
        )
    } else {
        (set, rise)
    };

    VisibilityPeriod::new(set, rise)
}

/// Newton iteration with a central-difference derivative.
///
/// Falls back to `coarse` when the iteration does not converge or wanders
/// more than two steps away.
fn refine_crossing<F>(coarse: DateTime<Utc>, step: Duration, target: f64, altitude: &F) -> DateTime<Utc>
where
    F: Fn(DateTime<Utc>) -> f64,
{
    let h = Duration::seconds(DERIVATIVE_HALF_STEP_SECONDS);
    let max_drift_ms = 2 * step.num_milliseconds();
    let mut t = coarse;

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let f = altitude(t) - target;
        if f.abs() < NEWTON_TOLERANCE_DEG {
            return t;
        }

        let slope = (altitude(t + h) - altitude(t - h)) / (2 * DERIVATIVE_HALF_STEP_SECONDS) as f64;
        if slope.abs() < 1e-9 {
            break;
        }

        let dt_ms = (-f / slope * 1000.0).round() as i64;
        t += Duration::milliseconds(dt_ms);
        if (t - coarse).num_milliseconds().abs() > max_drift_ms {
            break;
        }
    }

    if (altitude(t) - target).abs() < NEWTON_TOLERANCE_DEG
        && (t - coarse).num_milliseconds().abs() <= max_drift_ms
    {
        t
    } else {
        debug!(
            "Twilight refinement around {} did not converge, keeping sampled estimate",
            coarse
        );
        coarse
    }
}

/// Locates the night boundaries for an observer.
#[derive(Debug, Clone)]
pub struct TwilightFinder {
    observer: Observer,
    step: Duration,
    precise: bool,
}

impl TwilightFinder {
    pub fn new(observer: Observer, step: Duration, precise: bool) -> Self {
        Self {
            observer,
            step,
            precise,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        Ok(Self::new(
            config.observer()?,
            Duration::minutes(config.twilight.step_minutes as i64),
            config.twilight.precise,
        ))
    }

    pub fn solar_noon(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        local_solar_noon(date, self.observer.longitude_degrees())
    }

    /// Sunset on `date` and the following sunrise.
    pub fn find_sunset_sunrise(&self, date: NaiveDate) -> Option<VisibilityPeriod> {
        self.find_night(date, HORIZON_ALTITUDE)
    }

    /// End of evening and start of morning astronomical twilight.
    pub fn find_astronomical_twilight(&self, date: NaiveDate) -> Option<VisibilityPeriod> {
        self.find_night(date, ASTRONOMICAL_TWILIGHT_ALTITUDE)
    }

    /// Interval during which the Sun stays below `target_altitude` degrees.
    pub fn find_night(&self, date: NaiveDate, target_altitude: f64) -> Option<VisibilityPeriod> {
        let noon = self.solar_noon(date)?;
        find_crossings_with(noon, self.step, target_altitude, self.precise, |t| {
            sun_altitude(&self.observer, t)
        })
    }
}
