//! County/basin lookup infrastructure. Each source adapter owns its own
//! static FIPS-county and county-basin tables (they're source-specific —
//! a Texas county code means nothing to North Dakota) and calls into the
//! helpers here to apply the shared fallback rules.

/// Resolve a FIPS county code to a display name via `table`, falling back
/// to the literal `"County <code>"` the spec requires for unknown codes.
pub fn county_name(table: &[(&str, &str)], fips_code: &str) -> String {
    table
        .iter()
        .find(|(code, _)| *code == fips_code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("County {fips_code}"))
}

/// Resolve a county name to a basin name via `table`. Unknown counties
/// yield `None` rather than a placeholder — basin is a nullable field.
pub fn basin_for_county(table: &[(&str, &str)], county_name: &str) -> Option<String> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(county_name))
        .map(|(_, basin)| basin.to_string())
}

/// A single latitude-band fallback rule: wells at or above `min_lat`
/// (degrees N) belong to `basin`. Rules should be sorted by `min_lat`
/// descending and the first match wins.
pub struct LatitudeBand {
    pub min_lat: f64,
    pub basin: &'static str,
}

/// Apply a source's latitude-band fallback when the county table has no
/// answer (e.g. Alaska's North Slope, which isn't meaningfully divided
/// into oil & gas counties).
pub fn basin_for_latitude(bands: &[LatitudeBand], lat: f64) -> Option<String> {
    bands
        .iter()
        .find(|band| lat >= band.min_lat)
        .map(|band| band.basin.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTIES: &[(&str, &str)] = &[("201", "Andrews"), ("317", "Midland")];
    const BASINS: &[(&str, &str)] = &[("Andrews", "Permian"), ("Midland", "Permian")];

    #[test]
    fn unknown_county_falls_back_to_literal() {
        assert_eq!(county_name(COUNTIES, "999"), "County 999");
    }

    #[test]
    fn known_county_resolves() {
        assert_eq!(county_name(COUNTIES, "201"), "Andrews");
    }

    #[test]
    fn unknown_basin_is_none() {
        assert_eq!(basin_for_county(BASINS, "Nowhere"), None);
    }

    #[test]
    fn known_basin_resolves_case_insensitively() {
        assert_eq!(basin_for_county(BASINS, "andrews"), Some("Permian".to_string()));
    }

    #[test]
    fn latitude_band_picks_highest_matching_band() {
        let bands = [
            LatitudeBand { min_lat: 68.0, basin: "North Slope" },
            LatitudeBand { min_lat: 0.0, basin: "Cook Inlet" },
        ];
        assert_eq!(basin_for_latitude(&bands, 70.0), Some("North Slope".to_string()));
        assert_eq!(basin_for_latitude(&bands, 61.0), Some("Cook Inlet".to_string()));
    }
}
