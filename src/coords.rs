//! Coordinate rendering for archive query parameters and file names
//!
//! Right ascension is rendered in hours and declination in degrees, each with
//! two fractional digits of seconds. Rounding is done once on the total number
//! of centiseconds, so `59.996s` carries into the next minute instead of
//! printing `60.00`.

use crate::error::{Error, Result};
use crate::types::SkyPosition;

const CENTIS_PER_HOUR: u64 = 360_000;
const CENTIS_PER_DAY: u64 = 24 * CENTIS_PER_HOUR;

/// Separator style for sexagesimal output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SexagesimalStyle {
    /// `10 50 07.27` / `+30 40 37.52`
    Spaced,
    /// `105007.27` / `+304037.52`
    Compact,
    /// `10h50m07.27s` / `+30d40m37.52s`
    Letters,
}

/// How a survey expects the position to be encoded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateEncoding {
    /// RA in hours, Dec in degrees, sexagesimal
    Sexagesimal(SexagesimalStyle),
    /// Both axes in decimal degrees
    Decimal,
}

/// Rendered RA and Dec strings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedPosition {
    /// Right ascension component
    pub ra: String,
    /// Declination component
    pub dec: String,
}

impl FormattedPosition {
    /// Join both components with a single space
    pub fn joined(&self) -> String {
        format!("{} {}", self.ra, self.dec)
    }
}

/// Renders a [`SkyPosition`] in one fixed encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateFormatter {
    encoding: CoordinateEncoding,
}

impl CoordinateFormatter {
    /// Formatter for a given encoding
    pub const fn new(encoding: CoordinateEncoding) -> Self {
        Self { encoding }
    }

    /// Sexagesimal formatter with the given separator style
    pub const fn sexagesimal(style: SexagesimalStyle) -> Self {
        Self::new(CoordinateEncoding::Sexagesimal(style))
    }

    /// Decimal-degree formatter
    pub const fn decimal() -> Self {
        Self::new(CoordinateEncoding::Decimal)
    }

    /// The encoding this formatter produces
    pub fn encoding(&self) -> CoordinateEncoding {
        self.encoding
    }

    /// Render a position
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if RA is outside [0, 360) or Dec outside [-90, 90].
    pub fn format(&self, position: &SkyPosition) -> Result<FormattedPosition> {
        position.check_range()?;
        Ok(match self.encoding {
            CoordinateEncoding::Sexagesimal(style) => FormattedPosition {
                ra: format_ra(position.ra_deg(), style),
                dec: format_dec(position.dec_deg(), style),
            },
            CoordinateEncoding::Decimal => FormattedPosition {
                ra: format!("{:.6}", position.ra_deg()),
                dec: format!("{:.6}", position.dec_deg()),
            },
        })
    }

    /// IAU-style designation used in file names, e.g. `J105007.27+304037.52`
    pub fn designation(position: &SkyPosition) -> Result<String> {
        let compact = Self::sexagesimal(SexagesimalStyle::Compact).format(position)?;
        Ok(format!("J{}{}", compact.ra, compact.dec))
    }
}

fn format_ra(ra_deg: f64, style: SexagesimalStyle) -> String {
    let centis = ((ra_deg / 15.0) * CENTIS_PER_HOUR as f64).round() as u64 % CENTIS_PER_DAY;
    let (major, minutes, seconds, frac) = split_centis(centis);
    match style {
        SexagesimalStyle::Spaced => format!("{major:02} {minutes:02} {seconds:02}.{frac:02}"),
        SexagesimalStyle::Compact => format!("{major:02}{minutes:02}{seconds:02}.{frac:02}"),
        SexagesimalStyle::Letters => format!("{major:02}h{minutes:02}m{seconds:02}.{frac:02}s"),
    }
}

fn format_dec(dec_deg: f64, style: SexagesimalStyle) -> String {
    let centis = (dec_deg.abs() * CENTIS_PER_HOUR as f64).round() as u64;
    let sign = if dec_deg < 0.0 && centis != 0 { '-' } else { '+' };
    let (major, minutes, seconds, frac) = split_centis(centis);
    match style {
        SexagesimalStyle::Spaced => {
            format!("{sign}{major:02} {minutes:02} {seconds:02}.{frac:02}")
        }
        SexagesimalStyle::Compact => {
            format!("{sign}{major:02}{minutes:02}{seconds:02}.{frac:02}")
        }
        SexagesimalStyle::Letters => {
            format!("{sign}{major:02}d{minutes:02}m{seconds:02}.{frac:02}s")
        }
    }
}

fn split_centis(centis: u64) -> (u64, u64, u64, u64) {
    let major = centis / CENTIS_PER_HOUR;
    let minutes = (centis / 6_000) % 60;
    let seconds = (centis / 100) % 60;
    let frac = centis % 100;
    (major, minutes, seconds, frac)
}

/// Parse a sexagesimal string into its leading unit (hours or degrees)
///
/// Components may be separated by whitespace, `:` or unit letters
/// (`h`, `d`, `m`, `s`). A single component is read as a decimal value.
pub fn parse_sexagesimal(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let normalized: String = body
        .chars()
        .map(|c| match c {
            'h' | 'H' | 'd' | 'D' | 'm' | 'M' | 's' | 'S' | ':' | '°' | '\'' | '"' => ' ',
            other => other,
        })
        .collect();

    let parts = normalized
        .split_whitespace()
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| Error::Format(format!("cannot parse '{part}' in '{text}'")))
        })
        .collect::<Result<Vec<f64>>>()?;

    let value = match parts.as_slice() {
        [whole] => *whole,
        [whole, minutes] => {
            check_sub_unit(*minutes, text)?;
            whole + minutes / 60.0
        }
        [whole, minutes, seconds] => {
            check_sub_unit(*minutes, text)?;
            check_sub_unit(*seconds, text)?;
            whole + minutes / 60.0 + seconds / 3600.0
        }
        _ => {
            return Err(Error::Format(format!(
                "expected 1 to 3 sexagesimal components in '{text}'"
            )));
        }
    };

    if parts.iter().any(|p| *p < 0.0) {
        return Err(Error::Format(format!("misplaced sign in '{text}'")));
    }

    Ok(if negative { -value } else { value })
}

fn check_sub_unit(value: f64, text: &str) -> Result<()> {
    if (0.0..60.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Format(format!(
            "minutes and seconds must lie in [0, 60) in '{text}'"
        )))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn reference_target() -> SkyPosition {
        SkyPosition::from_sexagesimal("10h50m07.270s", "30d40m37.52s").unwrap()
    }

    #[test]
    fn spaced_style_matches_cutout_form_fields() {
        let formatted = CoordinateFormatter::sexagesimal(SexagesimalStyle::Spaced)
            .format(&reference_target())
            .unwrap();

        assert_eq!(formatted.ra, "10 50 07.27");
        assert_eq!(formatted.dec, "+30 40 37.52");
        assert_eq!(formatted.joined(), "10 50 07.27 +30 40 37.52");
    }

    #[test]
    fn letters_style() {
        let formatted = CoordinateFormatter::sexagesimal(SexagesimalStyle::Letters)
            .format(&reference_target())
            .unwrap();

        assert_eq!(formatted.ra, "10h50m07.27s");
        assert_eq!(formatted.dec, "+30d40m37.52s");
    }

    #[test]
    fn designation_is_compact_and_signed() {
        assert_eq!(
            CoordinateFormatter::designation(&reference_target()).unwrap(),
            "J105007.27+304037.52"
        );

        let south = SkyPosition::from_sexagesimal("10h50m07.270s", "-30d40m37.52s").unwrap();
        assert_eq!(
            CoordinateFormatter::designation(&south).unwrap(),
            "J105007.27-304037.52"
        );
    }

    #[test]
    fn decimal_encoding_uses_six_places() {
        let formatted = CoordinateFormatter::decimal()
            .format(&reference_target())
            .unwrap();

        assert_eq!(formatted.ra, "162.530292");
        assert_eq!(formatted.dec, "30.677089");
    }

    #[test]
    fn rounding_carries_into_higher_units() {
        // 59.996 s rounds up to the next minute and hour
        let position = SkyPosition::new(
            (1.0 + 59.0 / 60.0 + 59.996 / 3600.0) * 15.0,
            -(9.0 + 59.0 / 60.0 + 59.999 / 3600.0),
        )
        .unwrap();
        let formatted = CoordinateFormatter::sexagesimal(SexagesimalStyle::Spaced)
            .format(&position)
            .unwrap();

        assert_eq!(formatted.ra, "02 00 00.00");
        assert_eq!(formatted.dec, "-10 00 00.00");
    }

    #[test]
    fn ra_just_below_360_wraps_to_zero_hours() {
        let position = SkyPosition::new(359.999_999_9, 0.0).unwrap();
        let formatted = CoordinateFormatter::sexagesimal(SexagesimalStyle::Compact)
            .format(&position)
            .unwrap();

        assert_eq!(formatted.ra, "000000.00");
    }

    #[test]
    fn tiny_negative_declination_prints_positive_zero() {
        let position = SkyPosition::new(0.0, -1e-9).unwrap();
        let formatted = CoordinateFormatter::sexagesimal(SexagesimalStyle::Spaced)
            .format(&position)
            .unwrap();

        assert_eq!(formatted.dec, "+00 00 00.00");
    }

    #[test]
    fn small_southern_declination_keeps_sign() {
        let position = SkyPosition::new(0.0, -0.5).unwrap();
        let formatted = CoordinateFormatter::sexagesimal(SexagesimalStyle::Letters)
            .format(&position)
            .unwrap();

        assert_eq!(formatted.dec, "-00d30m00.00s");
    }

    #[test]
    fn out_of_range_positions_fail_with_format_error() {
        let formatter = CoordinateFormatter::sexagesimal(SexagesimalStyle::Spaced);

        for position in [
            SkyPosition::new_unchecked(10.0, 91.0),
            SkyPosition::new_unchecked(10.0, -90.01),
            SkyPosition::new_unchecked(360.0, 0.0),
            SkyPosition::new_unchecked(-1.0, 0.0),
            SkyPosition::new_unchecked(f64::INFINITY, 0.0),
        ] {
            assert!(
                matches!(formatter.format(&position), Err(Error::Format(_))),
                "{position:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_supported_separator_styles() {
        for text in ["10h50m07.27s", "10 50 07.27", "10:50:07.27"] {
            let hours = parse_sexagesimal(text).unwrap();
            assert!((hours - 10.835_352_8).abs() < 1e-6, "{text} -> {hours}");
        }
        let dec = parse_sexagesimal("-00d30m00s").unwrap();
        assert!((dec + 0.5).abs() < 1e-12, "sign applies to the whole value");
        assert_eq!(parse_sexagesimal("162.53").unwrap(), 162.53);
    }

    #[test]
    fn rejects_malformed_sexagesimal() {
        assert!(parse_sexagesimal("10h61m00s").is_err());
        assert!(parse_sexagesimal("10 20 30 40").is_err());
        assert!(parse_sexagesimal("ten hours").is_err());
        assert!(parse_sexagesimal("").is_err());
        assert!(parse_sexagesimal("10 -20 30").is_err());
    }

    #[test]
    fn formatted_positions_parse_back_within_rounding() {
        let mut rng = rand::thread_rng();
        let styles = [SexagesimalStyle::Spaced, SexagesimalStyle::Letters];

        for _ in 0..500 {
            let original =
                SkyPosition::new(rng.gen_range(0.0..360.0), rng.gen_range(-90.0..=90.0)).unwrap();
            for style in styles {
                let formatted = CoordinateFormatter::sexagesimal(style)
                    .format(&original)
                    .unwrap();
                let parsed = SkyPosition::from_sexagesimal(&formatted.ra, &formatted.dec).unwrap();

                // half a centisecond of RA is ~2.1e-5 deg at the equator
                assert!(
                    original.separation_deg(&parsed) < 2.5e-5,
                    "{original:?} -> {formatted:?} -> {parsed:?}"
                );
            }

            let decimal = CoordinateFormatter::decimal().format(&original).unwrap();
            let ra: f64 = decimal.ra.parse().unwrap();
            let dec: f64 = decimal.dec.parse().unwrap();
            assert!((ra - original.ra_deg()).abs() < 6e-7);
            assert!((dec - original.dec_deg()).abs() < 6e-7);
        }
    }
}
