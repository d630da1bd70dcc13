//! Validation utilities for request input and configuration values

use chrono::NaiveDate;

/// Date format used by the store, the provider and the lookup endpoint
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(value: &str) -> Result<NaiveDate, &'static str> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| "Date must be formatted as YYYY-MM-DD")
}

/// Validate latitude is within -90..=90
pub fn validate_latitude(latitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    Ok(())
}

/// Validate longitude is within -180..=180
pub fn validate_longitude(longitude: f64) -> Result<(), &'static str> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate a forecast horizon in days
pub fn validate_horizon(horizon: usize) -> Result<(), &'static str> {
    if horizon == 0 {
        return Err("Forecast horizon must be at least one day");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(parse_date("2020-01-10"), Ok(NaiveDate::from_ymd_opt(2020, 1, 10).unwrap()));
        assert!(parse_date(" 2020-01-10 ").is_ok());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("2020-13-01").is_err());
        assert!(parse_date("10/01/2020").is_err());
        assert!(parse_date("2021-02-29").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_coordinates() {
        assert!(validate_latitude(-26.2).is_ok());
        assert!(validate_latitude(91.0).is_err());
        assert!(validate_longitude(28.0).is_ok());
        assert!(validate_longitude(-181.0).is_err());
    }

    #[test]
    fn test_horizon() {
        assert!(validate_horizon(7).is_ok());
        assert!(validate_horizon(0).is_err());
    }

    proptest! {
        #[test]
        fn prop_formatted_dates_parse_back(days in 0i64..20_000) {
            let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
            let text = date.format(DATE_FORMAT).to_string();
            prop_assert_eq!(parse_date(&text), Ok(date));
        }
    }
}
