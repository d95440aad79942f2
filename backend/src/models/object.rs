//! Catalog objects and their apparent sizes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{PlannerError, Result};

/// Catalog object identifier (position of the object in the input catalog).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ObjectId(pub usize);

impl ObjectId {
    pub fn new(value: usize) -> Self {
        ObjectId(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rectangular angular extent (of an object, or of an instrument).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldOfView {
    pub width: qtty::Degrees,
    pub height: qtty::Degrees,
}

impl FieldOfView {
    pub fn new(width: qtty::Degrees, height: qtty::Degrees) -> Self {
        Self { width, height }
    }

    pub fn from_degrees(width: f64, height: f64) -> Self {
        Self::new(qtty::Degrees::new(width), qtty::Degrees::new(height))
    }

    pub fn from_arcminutes(width: f64, height: f64) -> Self {
        Self::from_degrees(width / 60.0, height / 60.0)
    }

    /// Area in square arcminutes.
    pub fn area_arcmin2(&self) -> f64 {
        (self.width.value() * 60.0) * (self.height.value() * 60.0)
    }
}

impl FromStr for FieldOfView {
    type Err = PlannerError;

    /// Parses `W'xH'`, `W°xH°`, mixed units, or a single extent for square
    /// objects. Values without a unit are read as arcminutes, the usual
    /// convention of deep-sky catalogs.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PlannerError::InvalidFieldOfView(s.to_string()));
        }

        let parts: Vec<&str> = trimmed
            .split(['x', 'X', '×'])
            .map(str::trim)
            .collect();

        let (w, h) = match parts.as_slice() {
            [single] => {
                let e = parse_extent(single, s)?;
                (e, e)
            }
            [w, h] => (parse_extent(w, s)?, parse_extent(h, s)?),
            _ => return Err(PlannerError::InvalidFieldOfView(s.to_string())),
        };

        Ok(Self::from_degrees(w, h))
    }
}

/// Parse one extent (`12.5'`, `1.2°`, `30"`, `12.5`) into degrees.
fn parse_extent(part: &str, original: &str) -> Result<f64> {
    let (number, scale) = if let Some(n) = part.strip_suffix('°') {
        (n, 1.0)
    } else if let Some(n) = part.strip_suffix("deg") {
        (n, 1.0)
    } else if let Some(n) = part.strip_suffix('\'').or_else(|| part.strip_suffix('′')) {
        (n, 1.0 / 60.0)
    } else if let Some(n) = part.strip_suffix("arcmin") {
        (n, 1.0 / 60.0)
    } else if let Some(n) = part.strip_suffix('"').or_else(|| part.strip_suffix('″')) {
        (n, 1.0 / 3600.0)
    } else {
        (part, 1.0 / 60.0)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| PlannerError::InvalidFieldOfView(original.to_string()))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(PlannerError::InvalidFieldOfView(original.to_string()));
    }
    Ok(value * scale)
}

/// A catalog object (galaxy, nebula, cluster, ...).
///
/// Objects are immutable once built. Everything the pipeline learns about an
/// object during a night is stored in separate annotation records keyed by
/// [`ObjectId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialObject {
    pub id: ObjectId,
    /// Display name; may hold several `/`-separated catalog designations
    pub name: String,
    /// Right ascension in radians
    pub ra: f64,
    /// Declination in radians
    pub dec: f64,
    /// Apparent size as given by the catalog (`W'xH'` or `W°xH°`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<String>,
    /// Visual magnitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
}

impl CelestialObject {
    pub fn new(
        id: ObjectId,
        name: impl Into<String>,
        ra_hours: f64,
        dec_degrees: f64,
        fov: Option<String>,
        magnitude: Option<f64>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ra: (ra_hours * 15.0).to_radians(),
            dec: dec_degrees.to_radians(),
            fov,
            magnitude,
        }
    }

    /// Build an object from sexagesimal strings (`05:35:17.3`, `-05 23 28`,
    /// `5h35m17s`, `+22°00'52"`) or plain decimal numbers.
    pub fn from_sexagesimal(
        id: ObjectId,
        name: impl Into<String>,
        ra: &str,
        dec: &str,
        fov: Option<String>,
        magnitude: Option<f64>,
    ) -> Result<Self> {
        let ra_hours = parse_ra_hours(ra)?;
        let dec_degrees = parse_dec_degrees(dec)?;
        Ok(Self::new(id, name, ra_hours, dec_degrees, fov, magnitude))
    }

    /// Individual catalog designations (`"M42/NGC 1976"` → `["M42", "NGC 1976"]`).
    pub fn designations(&self) -> Vec<&str> {
        self.name
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn ra_hours(&self) -> f64 {
        self.ra.to_degrees() / 15.0
    }

    pub fn dec_degrees(&self) -> f64 {
        self.dec.to_degrees()
    }

    /// Parsed apparent size; `None` when absent.
    pub fn field_of_view(&self) -> Option<Result<FieldOfView>> {
        self.fov.as_deref().map(FieldOfView::from_str)
    }

    /// Apparent size, treating unparsable strings as absent.
    pub fn parsed_fov(&self) -> Option<FieldOfView> {
        self.field_of_view().and_then(|r| r.ok())
    }

    /// Total angular area in square arcminutes (0 when size unknown).
    pub fn total_area(&self) -> f64 {
        self.parsed_fov().map(|f| f.area_arcmin2()).unwrap_or(0.0)
    }
}

/// One record of an already-parsed catalog, as read from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    pub ra_hours: f64,
    pub dec_degrees: f64,
    #[serde(default)]
    pub fov: Option<String>,
    #[serde(default)]
    pub magnitude: Option<f64>,
}

impl CatalogRecord {
    pub fn into_object(self, id: ObjectId) -> Result<CelestialObject> {
        if !(0.0..24.0).contains(&self.ra_hours) {
            return Err(PlannerError::invalid_coordinate(
                &self.ra_hours.to_string(),
                "right ascension must be in [0, 24) hours",
            ));
        }
        if !(-90.0..=90.0).contains(&self.dec_degrees) {
            return Err(PlannerError::invalid_coordinate(
                &self.dec_degrees.to_string(),
                "declination must be in [-90, 90] degrees",
            ));
        }
        Ok(CelestialObject::new(
            id,
            self.name,
            self.ra_hours,
            self.dec_degrees,
            self.fov,
            self.magnitude,
        ))
    }
}

/// Turn a list of catalog records into objects with sequential ids.
pub fn catalog_from_records(records: Vec<CatalogRecord>) -> Result<Vec<CelestialObject>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_object(ObjectId::new(i)))
        .collect()
}

/// Parse right ascension in hours.
pub fn parse_ra_hours(value: &str) -> Result<f64> {
    let hours = parse_sexagesimal(value)?;
    if !(0.0..24.0).contains(&hours) {
        return Err(PlannerError::invalid_coordinate(
            value,
            "right ascension must be in [0, 24) hours",
        ));
    }
    Ok(hours)
}

/// Parse declination in degrees.
pub fn parse_dec_degrees(value: &str) -> Result<f64> {
    let degrees = parse_sexagesimal(value)?;
    if !(-90.0..=90.0).contains(&degrees) {
        return Err(PlannerError::invalid_coordinate(
            value,
            "declination must be in [-90, 90] degrees",
        ));
    }
    Ok(degrees)
}

fn parse_sexagesimal(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::invalid_coordinate(value, "empty value"));
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let fields: Vec<&str> = body
        .split(|c: char| {
            c.is_whitespace() || matches!(c, ':' | 'h' | 'm' | 's' | 'd' | '°' | '\'' | '"' | '′' | '″')
        })
        .filter(|s| !s.is_empty())
        .collect();

    if fields.is_empty() || fields.len() > 3 {
        return Err(PlannerError::invalid_coordinate(
            value,
            "expected one to three numeric fields",
        ));
    }

    let mut numbers = Vec::with_capacity(fields.len());
    for field in &fields {
        let n: f64 = field
            .parse()
            .map_err(|_| PlannerError::invalid_coordinate(value, format!("'{}' is not a number", field)))?;
        if !n.is_finite() || n < 0.0 {
            return Err(PlannerError::invalid_coordinate(value, "fields must be non-negative"));
        }
        numbers.push(n);
    }

    if numbers.iter().skip(1).any(|&n| n >= 60.0) {
        return Err(PlannerError::invalid_coordinate(
            value,
            "minutes and seconds must be below 60",
        ));
    }

    let magnitude = numbers
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(n, div)| n / div)
        .sum::<f64>();

    Ok(if negative { -magnitude } else { magnitude })
}
