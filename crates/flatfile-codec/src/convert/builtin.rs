//! Built-in conversions for standard, chrono and rust_decimal types.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use flatfile_model::{Conversion, PARSE, PARSE_EXACT, SCALED, ValueKind};
use rust_decimal::Decimal;

use super::pattern::to_strftime;
use super::{BoxError, ConversionRegistry, FieldConverter, FieldType, FormatFn, ParseFn};

/// Largest scale `rust_decimal` can represent.
const MAX_DECIMAL_PLACES: u32 = 28;

/// Largest power of ten that still fits an `f64` mantissa exactly.
const MAX_FLOAT_PLACES: u32 = 15;

/// Ulps of representation error tolerated when shifting a float.
const FLOAT_SLACK: f64 = 8.0;

pub(super) fn register_builtins(registry: &mut ConversionRegistry) {
    registry.register::<String>(PARSE, FieldConverter::new(parse_text, format_text));

    register_integers(registry);

    let decimal = FieldConverter::new(parse_decimal, format_decimal).with_prepare(prepare_decimal);
    registry.register::<Decimal>(PARSE, decimal);
    registry.register::<Decimal>(SCALED, decimal);

    let float = FieldConverter::new(parse_f64, format_f64).with_prepare(prepare_float);
    registry.register::<f64>(PARSE, float);
    registry.register::<f64>(SCALED, float);
    let float = FieldConverter::new(parse_f32, format_f32).with_prepare(prepare_float);
    registry.register::<f32>(PARSE, float);
    registry.register::<f32>(SCALED, float);

    registry.register::<NaiveDate>(
        PARSE,
        FieldConverter::new(parse_iso::<NaiveDate>, format_iso::<NaiveDate>),
    );
    registry.register::<NaiveDate>(
        PARSE_EXACT,
        FieldConverter::new(parse_exact_date, format_exact_date).with_prepare(prepare_date),
    );
    registry.register::<NaiveDateTime>(
        PARSE,
        FieldConverter::new(parse_iso::<NaiveDateTime>, format_iso::<NaiveDateTime>),
    );
    registry.register::<NaiveDateTime>(
        PARSE_EXACT,
        FieldConverter::new(parse_exact_datetime, format_exact_datetime)
            .with_prepare(prepare_datetime),
    );
    registry.register::<NaiveTime>(
        PARSE,
        FieldConverter::new(parse_iso::<NaiveTime>, format_iso::<NaiveTime>),
    );
    registry.register::<NaiveTime>(
        PARSE_EXACT,
        FieldConverter::new(parse_exact_time, format_exact_time).with_prepare(prepare_time),
    );

    registry.register::<bool>(PARSE, FieldConverter::new(parse_bool, format_bool));
    registry.register::<char>(PARSE, FieldConverter::new(parse_char, format_char));
}

macro_rules! integer_field_types {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldType for $ty {
                const KIND: ValueKind = ValueKind::Integer;
            }
        )*

        fn register_integers(registry: &mut ConversionRegistry) {
            $(
                registry.register_from_str::<$ty>();
            )*
        }
    };
}

integer_field_types!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl FieldType for String {
    const KIND: ValueKind = ValueKind::Text;
}

impl FieldType for Decimal {
    const KIND: ValueKind = ValueKind::Decimal;
}

impl FieldType for f64 {
    const KIND: ValueKind = ValueKind::Decimal;
}

impl FieldType for f32 {
    const KIND: ValueKind = ValueKind::Decimal;
}

impl FieldType for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;
}

impl FieldType for NaiveDateTime {
    const KIND: ValueKind = ValueKind::Date;
}

impl FieldType for NaiveTime {
    const KIND: ValueKind = ValueKind::Date;
}

impl FieldType for bool {
    const KIND: ValueKind = ValueKind::Other;
}

impl FieldType for char {
    const KIND: ValueKind = ValueKind::Other;
}

// --- text ---

fn parse_text(text: &str, _: &Conversion) -> Result<String, BoxError> {
    Ok(text.to_string())
}

#[allow(clippy::ptr_arg)]
fn format_text(value: &String, _: &Conversion) -> Result<String, BoxError> {
    Ok(value.clone())
}

// --- decimals ---

fn prepare_decimal(conversion: &Conversion) -> Result<Conversion, String> {
    if conversion.places > MAX_DECIMAL_PLACES {
        return Err(format!(
            "{} decimal places exceeds the maximum of {MAX_DECIMAL_PLACES}",
            conversion.places
        ));
    }
    Ok(conversion.clone())
}

fn decimal_factor(places: u32) -> Decimal {
    Decimal::from_i128_with_scale(10i128.pow(places), 0)
}

fn parse_decimal(text: &str, conversion: &Conversion) -> Result<Decimal, BoxError> {
    let value = Decimal::from_str(text.trim())?;
    if conversion.places == 0 {
        return Ok(value);
    }
    value
        .checked_div(decimal_factor(conversion.places))
        .ok_or_else(|| "decimal underflow while applying implied places".into())
}

fn format_decimal(value: &Decimal, conversion: &Conversion) -> Result<String, BoxError> {
    if conversion.places == 0 {
        return Ok(value.to_string());
    }
    let shifted = value
        .checked_mul(decimal_factor(conversion.places))
        .ok_or("decimal overflow while applying implied places")?;
    if !shifted.fract().is_zero() {
        return Err(format!(
            "value {value} has more than {} decimal places",
            conversion.places
        )
        .into());
    }
    Ok(shifted.trunc().normalize().to_string())
}

// --- floats ---

fn prepare_float(conversion: &Conversion) -> Result<Conversion, String> {
    if conversion.places > MAX_FLOAT_PLACES {
        return Err(format!(
            "{} decimal places exceeds the maximum of {MAX_FLOAT_PLACES}",
            conversion.places
        ));
    }
    Ok(conversion.clone())
}

fn parse_f64(text: &str, conversion: &Conversion) -> Result<f64, BoxError> {
    let value = f64::from_str(text.trim())?;
    Ok(value / 10f64.powi(conversion.places as i32))
}

fn format_f64(value: &f64, conversion: &Conversion) -> Result<String, BoxError> {
    if conversion.places == 0 {
        return Ok(value.to_string());
    }
    format_scaled_float(*value, conversion.places, f64::EPSILON)
}

fn parse_f32(text: &str, conversion: &Conversion) -> Result<f32, BoxError> {
    parse_f64(text, conversion).map(|value| value as f32)
}

fn format_f32(value: &f32, conversion: &Conversion) -> Result<String, BoxError> {
    if conversion.places == 0 {
        return Ok(value.to_string());
    }
    format_scaled_float(f64::from(*value), conversion.places, f64::from(f32::EPSILON))
}

/// Shift `value` left by `places` digits. The result must be integral up to
/// the precision of the source type; nothing is rounded away.
fn format_scaled_float(value: f64, places: u32, epsilon: f64) -> Result<String, BoxError> {
    if !value.is_finite() {
        return Err(format!("value {value} cannot carry implied decimal places").into());
    }
    let shifted = value * 10f64.powi(places as i32);
    // `+ 0.0` turns -0 into 0.
    let rounded = shifted.round() + 0.0;
    if (shifted - rounded).abs() > FLOAT_SLACK * epsilon * rounded.abs().max(1.0) {
        return Err(format!("value {value} has more than {places} decimal places").into());
    }
    Ok(format!("{rounded:.0}"))
}

// --- dates and times ---

fn prepare_pattern(conversion: &Conversion) -> Result<Conversion, String> {
    let pattern = conversion
        .pattern
        .as_deref()
        .ok_or_else(|| "a date/time pattern is required".to_string())?;
    let strftime = to_strftime(pattern)?;
    Ok(conversion.clone().with_pattern(strftime))
}

/// Reference moment used to check that a pattern fits its value type.
fn sample_moment() -> Result<NaiveDateTime, String> {
    NaiveDate::from_ymd_opt(2000, 1, 2)
        .and_then(|date| date.and_hms_opt(3, 4, 5))
        .ok_or_else(|| "invalid reference moment".to_string())
}

/// Translate the pattern, then format and parse `sample` with it. A pattern
/// that lacks an item the type needs, or names one it cannot render, fails
/// here rather than on the first line.
fn prepare_checked<T>(
    conversion: &Conversion,
    sample: &T,
    format: FormatFn<T>,
    parse: ParseFn<T>,
    what: &str,
) -> Result<Conversion, String> {
    let prepared = prepare_pattern(conversion)?;
    let pattern = conversion.pattern.as_deref().unwrap_or_default();
    let text = format(sample, &prepared)
        .map_err(|err| format!("pattern '{pattern}' cannot format a {what}: {err}"))?;
    parse(&text, &prepared)
        .map_err(|err| format!("pattern '{pattern}' cannot describe a full {what}: {err}"))?;
    Ok(prepared)
}

fn prepare_date(conversion: &Conversion) -> Result<Conversion, String> {
    let sample = sample_moment()?.date();
    prepare_checked(conversion, &sample, format_exact_date, parse_exact_date, "date")
}

fn prepare_datetime(conversion: &Conversion) -> Result<Conversion, String> {
    let sample = sample_moment()?;
    prepare_checked(
        conversion,
        &sample,
        format_exact_datetime,
        parse_exact_datetime,
        "date and time",
    )
}

fn prepare_time(conversion: &Conversion) -> Result<Conversion, String> {
    let sample = sample_moment()?.time();
    prepare_checked(conversion, &sample, format_exact_time, parse_exact_time, "time")
}

fn pattern_of(conversion: &Conversion) -> Result<&str, BoxError> {
    conversion
        .pattern
        .as_deref()
        .ok_or_else(|| "missing date/time pattern".into())
}

fn parse_iso<T>(text: &str, _: &Conversion) -> Result<T, BoxError>
where
    T: FromStr<Err = chrono::ParseError>,
{
    Ok(text.trim().parse::<T>()?)
}

fn format_iso<T: std::fmt::Display>(value: &T, _: &Conversion) -> Result<String, BoxError> {
    Ok(value.to_string())
}

fn write_formatted(formatted: impl std::fmt::Display) -> Result<String, BoxError> {
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| "value cannot be rendered with this pattern")?;
    Ok(out)
}

fn parse_exact_date(text: &str, conversion: &Conversion) -> Result<NaiveDate, BoxError> {
    Ok(NaiveDate::parse_from_str(text, pattern_of(conversion)?)?)
}

fn format_exact_date(value: &NaiveDate, conversion: &Conversion) -> Result<String, BoxError> {
    write_formatted(value.format(pattern_of(conversion)?))
}

fn parse_exact_datetime(text: &str, conversion: &Conversion) -> Result<NaiveDateTime, BoxError> {
    Ok(NaiveDateTime::parse_from_str(
        text,
        pattern_of(conversion)?,
    )?)
}

fn format_exact_datetime(
    value: &NaiveDateTime,
    conversion: &Conversion,
) -> Result<String, BoxError> {
    write_formatted(value.format(pattern_of(conversion)?))
}

fn parse_exact_time(text: &str, conversion: &Conversion) -> Result<NaiveTime, BoxError> {
    Ok(NaiveTime::parse_from_str(text, pattern_of(conversion)?)?)
}

fn format_exact_time(value: &NaiveTime, conversion: &Conversion) -> Result<String, BoxError> {
    write_formatted(value.format(pattern_of(conversion)?))
}

// --- other ---

fn parse_bool(text: &str, _: &Conversion) -> Result<bool, BoxError> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("'{trimmed}' is not a boolean").into())
    }
}

fn format_bool(value: &bool, _: &Conversion) -> Result<String, BoxError> {
    Ok(value.to_string())
}

fn parse_char(text: &str, _: &Conversion) -> Result<char, BoxError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(format!("expected exactly one character, got '{text}'").into()),
    }
}

fn format_char(value: &char, _: &Conversion) -> Result<String, BoxError> {
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(places: u32) -> Conversion {
        Conversion::scaled(places)
    }

    #[test]
    fn test_scaled_decimal() {
        let value = parse_decimal("0000012345", &scaled(2)).unwrap();
        assert_eq!(value, Decimal::new(12345, 2));
        assert_eq!(format_decimal(&value, &scaled(2)).unwrap(), "12345");

        let negative = parse_decimal("-000012345", &scaled(3)).unwrap();
        assert_eq!(negative, Decimal::new(-12345, 3));
        assert_eq!(format_decimal(&negative, &scaled(3)).unwrap(), "-12345");
    }

    #[test]
    fn test_scaled_decimal_rejects_extra_places() {
        let value = Decimal::new(12345, 3);
        assert!(format_decimal(&value, &scaled(2)).is_err());
    }

    #[test]
    fn test_unscaled_decimal() {
        let value = parse_decimal(" 12.50", &Conversion::parse()).unwrap();
        assert_eq!(value, Decimal::new(1250, 2));
        assert_eq!(format_decimal(&value, &Conversion::parse()).unwrap(), "12.50");
    }

    #[test]
    fn test_decimal_places_limit() {
        assert!(prepare_decimal(&scaled(28)).is_ok());
        assert!(prepare_decimal(&scaled(29)).is_err());
    }

    #[test]
    fn test_scaled_float() {
        let value = parse_f64("000150", &scaled(2)).unwrap();
        assert!((value - 1.5).abs() < 1e-12);
        assert_eq!(format_f64(&1.5, &scaled(2)).unwrap(), "150");
        assert!(format_f64(&f64::NAN, &scaled(2)).is_err());
        assert_eq!(format_f64(&-0.29, &scaled(2)).unwrap(), "-29");
        assert_eq!(format_f64(&-0.0, &scaled(2)).unwrap(), "0");
    }

    #[test]
    fn test_scaled_float_rejects_extra_places() {
        let err = format_f64(&1.2345, &scaled(2)).unwrap_err();
        assert_eq!(err.to_string(), "value 1.2345 has more than 2 decimal places");
        assert!(format_f64(&0.005, &scaled(2)).is_err());

        assert_eq!(format_f32(&1.1, &scaled(2)).unwrap(), "110");
        assert!(format_f32(&1.25, &scaled(1)).is_err());
    }

    #[test]
    fn test_exact_date() {
        let conv = prepare_date(&Conversion::exact("yyyyMMdd")).unwrap();
        assert_eq!(conv.pattern.as_deref(), Some("%Y%m%d"));

        let date = parse_exact_date("20210101", &conv).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(format_exact_date(&date, &conv).unwrap(), "20210101");
        assert!(parse_exact_date("20211301", &conv).is_err());
    }

    #[test]
    fn test_exact_pattern_required() {
        let conv = Conversion::named(PARSE_EXACT);
        assert!(prepare_pattern(&conv).is_err());
        assert!(prepare_date(&conv).is_err());
    }

    #[test]
    fn test_quoted_percent_in_date_pattern() {
        let conv = prepare_date(&Conversion::exact("'%'yyyyMMdd' X'")).unwrap();
        let date = parse_exact_date("%20210101 X", &conv).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(format_exact_date(&date, &conv).unwrap(), "%20210101 X");
    }

    #[test]
    fn test_exact_patterns_must_fit_the_type() {
        assert!(prepare_datetime(&Conversion::exact("yyyyMMddHHmmss")).is_ok());
        assert!(prepare_time(&Conversion::exact("HH:mm")).is_ok());

        let err = prepare_datetime(&Conversion::exact("yyyyMMdd")).unwrap_err();
        assert!(err.contains("cannot describe a full date and time"), "{err}");
        assert!(prepare_time(&Conversion::exact("yyyy")).is_err());
        assert!(prepare_date(&Conversion::exact("yyyy-MM")).is_err());
        assert!(prepare_date(&Conversion::exact("yyyyMMdd HH")).is_err());
    }

    #[test]
    fn test_exact_datetime_and_time() {
        let conv = prepare_datetime(&Conversion::exact("yyyy-MM-dd'T'HH:mm:ss")).unwrap();
        let at = parse_exact_datetime("2021-06-30T23:59:01", &conv).unwrap();
        assert_eq!(format_exact_datetime(&at, &conv).unwrap(), "2021-06-30T23:59:01");

        let conv = prepare_time(&Conversion::exact("HHmmss")).unwrap();
        let time = parse_exact_time("075900", &conv).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(7, 59, 0).unwrap());
    }

    #[test]
    fn test_iso_date() {
        let date: NaiveDate = parse_iso("2024-03-15", &Conversion::parse()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(format_iso(&date, &Conversion::parse()).unwrap(), "2024-03-15");
    }

    #[test]
    fn test_bool_and_char() {
        assert!(parse_bool(" TRUE ", &Conversion::parse()).unwrap());
        assert!(!parse_bool("false", &Conversion::parse()).unwrap());
        assert!(parse_bool("yes", &Conversion::parse()).is_err());

        assert_eq!(parse_char("Y", &Conversion::parse()).unwrap(), 'Y');
        assert!(parse_char("YN", &Conversion::parse()).is_err());
        assert!(parse_char("", &Conversion::parse()).is_err());
    }

    #[test]
    fn test_text_verbatim() {
        let text = parse_text("  padded  ", &Conversion::parse()).unwrap();
        assert_eq!(text, "  padded  ");
    }
}
