//! ISO-8601 duration normalization
//!
//! Converts duration tokens such as `PT10M30S` (the format video platforms
//! report `contentDetails.duration` in) into minutes rounded to 2 decimals.
//!
//! Supported grammar: `P[nW][nD][T[nH][nM][nS]]`. Years and months are
//! calendar-dependent and rejected.

use crate::{Error, Result};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Designators in the order they must appear, with their length in seconds
const DATE_UNITS: [(char, f64); 2] = [('W', 604_800.0), ('D', 86_400.0)];
const TIME_UNITS: [(char, f64); 3] = [('H', 3_600.0), ('M', 60.0), ('S', 1.0)];

/// Convert an ISO-8601 duration token into minutes, rounded to 2 decimals.
///
/// # Errors
///
/// Returns [`Error::MalformedDuration`] when the token does not parse.
///
/// # Examples
///
/// ```
/// use viewcast_common::duration::normalize;
///
/// assert_eq!(normalize("PT10M30S").unwrap(), 10.5);
/// assert_eq!(normalize("PT1H").unwrap(), 60.0);
/// assert_eq!(normalize("P1DT2M").unwrap(), 1442.0);
/// assert!(normalize("10:30").is_err());
/// ```
pub fn normalize(duration_token: &str) -> Result<f64> {
    let seconds = parse_seconds(duration_token)?;
    let minutes = round_minutes(seconds / SECONDS_PER_MINUTE);
    if !minutes.is_finite() {
        return Err(Error::MalformedDuration(format!(
            "{:?}: duration out of range",
            duration_token
        )));
    }
    Ok(minutes)
}

/// Round a minute value to 2 decimal places
pub fn round_minutes(minutes: f64) -> f64 {
    (minutes * 100.0).round() / 100.0
}

/// Parse a duration token into total seconds
pub fn parse_seconds(duration_token: &str) -> Result<f64> {
    let malformed = |reason: &str| Error::MalformedDuration(format!("{:?}: {}", duration_token, reason));

    let token = duration_token.trim();
    let body = token
        .strip_prefix('P')
        .ok_or_else(|| malformed("must start with 'P'"))?;

    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return Err(malformed("'T' must be followed by a time component"));
            }
            (date, Some(time))
        }
        None => (body, None),
    };

    if date_part.is_empty() && time_part.is_none() {
        return Err(malformed("no components"));
    }

    let mut total = 0.0;
    let mut has_fraction = false;

    for (part, units) in [(date_part, &DATE_UNITS[..]), (time_part.unwrap_or(""), &TIME_UNITS[..])] {
        let mut next_unit = 0;
        let mut number = String::new();

        for c in part.chars() {
            if c.is_ascii_digit() || c == '.' || c == ',' {
                number.push(if c == ',' { '.' } else { c });
                continue;
            }

            let position = units[next_unit..]
                .iter()
                .position(|(designator, _)| *designator == c)
                .ok_or_else(|| {
                    if c == 'Y' || (c == 'M' && units.len() == DATE_UNITS.len()) {
                        malformed("calendar years/months are not supported")
                    } else {
                        malformed(&format!("unexpected designator '{}'", c))
                    }
                })?;

            if number.is_empty() {
                return Err(malformed(&format!("designator '{}' has no value", c)));
            }
            // Only the last component may carry a fraction
            if has_fraction {
                return Err(malformed("fraction allowed on the smallest component only"));
            }
            let value: f64 = number
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| malformed(&format!("invalid number {:?}", number)))?;
            has_fraction = number.contains('.');

            let (_, unit_seconds) = units[next_unit + position];
            total += value * unit_seconds;
            next_unit += position + 1;
            number.clear();
        }

        if !number.is_empty() {
            return Err(malformed(&format!("trailing value {:?} without designator", number)));
        }
    }

    if !total.is_finite() {
        return Err(malformed("duration out of range"));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(normalize("PT10M30S").unwrap(), 10.5);
        assert_eq!(normalize("PT4M13S").unwrap(), 4.22);
        assert_eq!(normalize("PT45S").unwrap(), 0.75);
    }

    #[test]
    fn test_hours_days_weeks() {
        assert_eq!(normalize("PT1H2M").unwrap(), 62.0);
        assert_eq!(normalize("P1D").unwrap(), 1440.0);
        assert_eq!(normalize("P1W").unwrap(), 10080.0);
        assert_eq!(normalize("P0D").unwrap(), 0.0);
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(normalize("PT1M30.5S").unwrap(), 1.51);
        assert_eq!(normalize("PT0,6S").unwrap(), 0.01);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(normalize("  PT2M \n").unwrap(), 2.0);
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        for token in [
            "", "P", "PT", "10M", "PT10", "PT10X", "P1DT", "PTM", "PT5S10M", "PT1M1M", "P1Y", "P2M",
            "PT1.5M30S", "PT1..2S", "pt10m",
        ] {
            assert!(
                matches!(normalize(token), Err(Error::MalformedDuration(_))),
                "{:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_rejects_values_beyond_f64() {
        let huge_seconds = format!("PT{}S", "9".repeat(400));
        assert!(matches!(normalize(&huge_seconds), Err(Error::MalformedDuration(_))));

        // each component finite, total is not
        let huge_weeks = format!("P{}W", "9".repeat(305));
        assert!(matches!(normalize(&huge_weeks), Err(Error::MalformedDuration(_))));

        // finite seconds that overflow once scaled for rounding
        let near_max = format!("PT15{}S", "0".repeat(307));
        assert!(matches!(normalize(&near_max), Err(Error::MalformedDuration(_))));
    }

    #[test]
    fn test_output_is_idempotent_in_minutes() {
        for token in ["PT10M30S", "PT3M7S", "PT59S", "PT1H1M1S", "PT12.345S"] {
            let minutes = normalize(token).unwrap();
            let reparsed: f64 = minutes.to_string().parse().unwrap();
            assert_eq!(round_minutes(reparsed), minutes, "{}", token);
        }
    }
}
