//! Band to calendar-month resolution.
//!
//! Yearly projection files are organised by hydrological year: band 1 is
//! October of the *previous* calendar year and band 12 is September of the
//! nominal year. Every extracted raster is labelled with its effective
//! calendar (year, month), never with the nominal year of the source file.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Band indices present in every yearly file.
pub const BANDS: RangeInclusive<u32> = 1..=12;

/// Band index to two-digit calendar month, in band order.
pub const BAND_MONTHS: [(u32, &str); 12] = [
    (1, "10"),
    (2, "11"),
    (3, "12"),
    (4, "01"),
    (5, "02"),
    (6, "03"),
    (7, "04"),
    (8, "05"),
    (9, "06"),
    (10, "07"),
    (11, "08"),
    (12, "09"),
];

/// Effective calendar label of one band of a yearly file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MonthLabel {
    /// Calendar year after the hydrological-year shift
    pub year: i32,
    /// Two-digit calendar month ("01".."12")
    pub month: &'static str,
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.year, self.month)
    }
}

/// True for the bands that belong to the previous calendar year (Oct, Nov, Dec).
pub fn is_previous_year_band(band: u32) -> bool {
    matches!(band, 1..=3)
}

/// Resolve a band of the file for nominal `year` to its calendar label.
pub fn resolve(band: u32, year: i32) -> Result<MonthLabel> {
    let month = BAND_MONTHS
        .iter()
        .find(|(index, _)| *index == band)
        .map(|(_, month)| *month)
        .ok_or(PipelineError::InvalidBandIndex(band))?;

    let year = if is_previous_year_band(band) {
        year.checked_sub(1).ok_or_else(|| {
            PipelineError::InvalidConfig(format!("year {} has no previous year", year))
        })?
    } else {
        year
    };

    Ok(MonthLabel { year, month })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_autumn_bands_shift_to_previous_year() {
        for band in 1..=3 {
            let label = resolve(band, 2010).unwrap();
            assert_eq!(label.year, 2009, "band {band}");
        }
    }

    #[test]
    fn test_remaining_bands_keep_nominal_year() {
        for band in 4..=12 {
            let label = resolve(band, 2010).unwrap();
            assert_eq!(label.year, 2010, "band {band}");
        }
    }

    #[test]
    fn test_concrete_labels() {
        assert_eq!(
            resolve(1, 2010).unwrap(),
            MonthLabel { year: 2009, month: "10" }
        );
        assert_eq!(
            resolve(5, 2010).unwrap(),
            MonthLabel { year: 2010, month: "02" }
        );
        assert_eq!(resolve(12, 2010).unwrap().month, "09");
        assert_eq!(resolve(1, 2010).unwrap().to_string(), "2009_10");
    }

    #[test]
    fn test_mapping_is_bijective() {
        let months: HashSet<&str> = BANDS.map(|b| resolve(b, 2000).unwrap().month).collect();
        assert_eq!(months.len(), 12);
        for m in 1..=12 {
            assert!(months.contains(format!("{:02}", m).as_str()));
        }
    }

    #[test]
    fn test_out_of_range_band_is_rejected() {
        for band in [0, 13, 99, u32::MAX] {
            match resolve(band, 2010) {
                Err(PipelineError::InvalidBandIndex(b)) => assert_eq!(b, band),
                other => panic!("expected InvalidBandIndex, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_earliest_year_does_not_overflow() {
        assert!(matches!(
            resolve(1, i32::MIN),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert_eq!(resolve(4, i32::MIN).unwrap().year, i32::MIN);
    }

    #[test]
    fn test_twelve_bands_cover_one_hydrological_year() {
        // Oct 2009 through Sep 2010
        let labels: Vec<String> = BANDS.map(|b| resolve(b, 2010).unwrap().to_string()).collect();
        assert_eq!(labels.first().map(String::as_str), Some("2009_10"));
        assert_eq!(labels.last().map(String::as_str), Some("2010_09"));
    }
}
