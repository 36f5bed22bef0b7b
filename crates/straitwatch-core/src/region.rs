//! Region definition and geographic matching.
//!
//! A region is a flat lat/lon bounding box plus the keyword tokens that name
//! it in free text. No projection or geodesic correction — box containment
//! is sufficient at the scale the engine operates on.

use serde::Deserialize;

/// The geographic flashpoint the engine correlates events for.
#[derive(Debug, Clone, Deserialize)]
pub struct Region {
  pub name:     String,
  pub lat_min:  f64,
  pub lat_max:  f64,
  pub lon_min:  f64,
  pub lon_max:  f64,
  /// Lower-case tokens matched against narrative `geographic_focus` text.
  pub keywords: Vec<String>,
}

impl Region {
  /// The default region of interest: the Taiwan Strait, 23–26 N, 118–122 E.
  pub fn taiwan_strait() -> Self {
    Self {
      name:     "Taiwan Strait".into(),
      lat_min:  23.0,
      lat_max:  26.0,
      lon_min:  118.0,
      lon_max:  122.0,
      keywords: vec!["taiwan".into(), "strait".into(), "fujian".into()],
    }
  }

  /// True iff the point falls within the bounding box, edges inclusive.
  pub fn contains(&self, lat: f64, lon: f64) -> bool {
    lat >= self.lat_min
      && lat <= self.lat_max
      && lon >= self.lon_min
      && lon <= self.lon_max
  }

  /// True iff `focus` is non-empty and, case-insensitively, contains at
  /// least one of the region's keywords.
  pub fn matches_text(&self, focus: Option<&str>) -> bool {
    let Some(focus) = focus else {
      return false;
    };
    if focus.is_empty() {
      return false;
    }

    let focus = focus.to_lowercase();
    self.keywords.iter().any(|kw| focus.contains(kw.as_str()))
  }
}

impl Default for Region {
  fn default() -> Self { Self::taiwan_strait() }
}
