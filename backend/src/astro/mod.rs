//! Positional astronomy: time scales, coordinate transforms, Sun and Moon.

pub mod coordinates;
pub mod moon;
pub mod sun;

pub use coordinates::{
    angular_separation, calculate_altaz, equatorial_to_horizontal, julian_date,
    local_sidereal_time, EquatorialCoords, HorizontalCoords,
};
pub use moon::{moon_phase, moon_phase_details, moon_position, MoonPhase, MoonPhaseTier, MoonPrecision};
pub use sun::{sun_altitude, sun_position};
