// File: src/validation/mod.rs
// Purpose: Per-kind field validation: raw submitted value in, typed value or error out
//
// Everything here is pure. The same kind and raw value always give the same result.

use crate::error::FieldError;
use crate::field::{Bounds, Choice, FieldKind, FieldSpec, FileRules, Length, Precision};
use crate::raw_input::RawValue;
use crate::value::{Secret, UploadedFile, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use formflow_validation::{
    check_length, check_range, dedup_preserving_order, file_extension, first_not_in,
    has_allowed_extension, is_one_of, is_valid_email, is_valid_slug, is_valid_url, looks_like_image, matches_pattern,
    parse_float, parse_integer, parse_ip, Decimal, LengthViolation, PrecisionViolation,
    RangeViolation,
};
use std::fmt::Display;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const TRUE_WORDS: &[&str] = &["true", "on", "1", "yes"];
const FALSE_WORDS: &[&str] = &["false", "off", "0", "no", ""];

/// Validate a non-empty raw value against a field kind
pub fn validate(kind: &FieldKind, raw: &RawValue) -> Result<Value, FieldError> {
    match kind {
        FieldKind::MultiChoice(choices) => validate_multi_choice(choices, raw),
        FieldKind::File(rules) => validate_file(rules, raw, false),
        FieldKind::Image(rules) => validate_file(rules, raw, true),
        scalar => {
            let text = raw
                .as_text()
                .ok_or(FieldError::InvalidFormat { message: None })?;
            validate_text(scalar, text)
        }
    }
}

fn validate_text(kind: &FieldKind, text: &str) -> Result<Value, FieldError> {
    match kind {
        FieldKind::Text(length) => {
            length_ok(text, length)?;
            Ok(Value::Text(text.to_string()))
        }
        FieldKind::Secret(length) => {
            length_ok(text, length)?;
            Ok(Value::Secret(Secret::new(text)))
        }
        FieldKind::Email(length) => {
            length_ok(text, length)?;
            if !is_valid_email(text) {
                return Err(FieldError::InvalidEmail);
            }
            Ok(Value::Text(text.to_string()))
        }
        FieldKind::Url(length) => {
            length_ok(text, length)?;
            if !is_valid_url(text) {
                return Err(FieldError::InvalidUrl);
            }
            Ok(Value::Text(text.to_string()))
        }
        FieldKind::Slug(length) => {
            length_ok(text, length)?;
            if !is_valid_slug(text) {
                return Err(FieldError::InvalidSlug);
            }
            Ok(Value::Text(text.to_string()))
        }
        FieldKind::Pattern {
            regex,
            message,
            length,
        } => {
            length_ok(text, length)?;
            if !matches_pattern(text, regex) {
                return Err(FieldError::InvalidFormat {
                    message: message.clone(),
                });
            }
            Ok(Value::Text(text.to_string()))
        }
        FieldKind::Integer(bounds) => {
            let n = parse_integer(text).ok_or(FieldError::InvalidInteger)?;
            bounds_ok(&n, bounds)?;
            Ok(Value::Integer(n))
        }
        FieldKind::Float(bounds) => {
            let n = parse_float(text).ok_or(FieldError::InvalidNumber)?;
            bounds_ok(&n, bounds)?;
            Ok(Value::Float(n))
        }
        FieldKind::Decimal { precision, bounds } => validate_decimal(text, precision, bounds),
        FieldKind::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| FieldError::InvalidDate),
        FieldKind::Time => TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
            .map(Value::Time)
            .ok_or(FieldError::InvalidTime),
        FieldKind::DateTime => DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(Value::DateTime)
            .ok_or(FieldError::InvalidDateTime),
        FieldKind::Boolean => Ok(Value::Bool(parse_checkbox(text))),
        FieldKind::TriState => Ok(Value::TriState(parse_tri_state(text))),
        FieldKind::Choice(choices) => {
            if !is_one_of(text, &choice_values(choices)) {
                return Err(FieldError::InvalidChoice {
                    value: text.to_string(),
                });
            }
            Ok(Value::Choice(text.to_string()))
        }
        FieldKind::IpAddress(protocol) => parse_ip(text, *protocol)
            .map(Value::Ip)
            .ok_or(FieldError::InvalidIp),
        FieldKind::MultiChoice(_) | FieldKind::File(_) | FieldKind::Image(_) => {
            Err(FieldError::InvalidFormat { message: None })
        }
    }
}

/// Validate one field, applying the required rule before the kind's rules
///
/// A missing or blank value becomes the kind's empty value when the field is
/// optional. A required checkbox must be ticked. A tri-state field never
/// fails as required: no selection means "unknown".
pub fn validate_field(field: &FieldSpec, raw: Option<&RawValue>) -> Result<Value, FieldError> {
    let raw = raw.filter(|r| !r.is_empty());

    match raw {
        None if matches!(field.kind, FieldKind::TriState) => Ok(Value::TriState(None)),
        None if field.required => Err(FieldError::Required),
        None => Ok(empty_value(&field.kind)),
        Some(raw) => {
            let value = validate(&field.kind, raw)?;
            if field.required && value == Value::Bool(false) {
                return Err(FieldError::Required);
            }
            Ok(value)
        }
    }
}

/// The value an optional field takes when left blank
pub fn empty_value(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Text(_)
        | FieldKind::Email(_)
        | FieldKind::Url(_)
        | FieldKind::Slug(_)
        | FieldKind::Pattern { .. } => Value::Text(String::new()),
        FieldKind::Secret(_) => Value::Secret(Secret::new("")),
        FieldKind::Boolean => Value::Bool(false),
        FieldKind::TriState => Value::TriState(None),
        FieldKind::MultiChoice(_) => Value::Choices(Vec::new()),
        _ => Value::Null,
    }
}

/// Message for an error, honouring the field's per-code overrides
pub fn message_for(field: &FieldSpec, error: &FieldError) -> String {
    field
        .error_messages
        .get(error.code())
        .cloned()
        .unwrap_or_else(|| error.to_string())
}

fn length_ok(text: &str, length: &Length) -> Result<(), FieldError> {
    check_length(text, length.min, length.max).map_err(|violation| match violation {
        LengthViolation::TooShort { min, actual } => FieldError::TooShort { min, actual },
        LengthViolation::TooLong { max, actual } => FieldError::TooLong { max, actual },
    })
}

fn bounds_ok<T: PartialOrd + Clone + Display>(value: &T, bounds: &Bounds<T>) -> Result<(), FieldError> {
    check_range(value, bounds.min.as_ref(), bounds.max.as_ref()).map_err(|violation| {
        match violation {
            RangeViolation::TooSmall(min) => FieldError::TooSmall {
                min: min.to_string(),
            },
            RangeViolation::TooLarge(max) => FieldError::TooLarge {
                max: max.to_string(),
            },
        }
    })
}

fn validate_decimal(
    text: &str,
    precision: &Precision,
    bounds: &Bounds<Decimal>,
) -> Result<Value, FieldError> {
    let decimal: Decimal = text.parse().map_err(|_| FieldError::InvalidNumber)?;

    decimal
        .check_precision(precision.max_digits, precision.decimal_places)
        .map_err(|violation| match violation {
            PrecisionViolation::MaxDigits(max) => FieldError::MaxDigits { max },
            PrecisionViolation::MaxDecimalPlaces(max) => FieldError::MaxDecimalPlaces { max },
            PrecisionViolation::MaxWholeDigits(max) => FieldError::MaxWholeDigits { max },
        })?;

    bounds_ok(&decimal, bounds)?;
    Ok(Value::Decimal(decimal))
}

fn choice_values(choices: &[Choice]) -> Vec<&str> {
    choices.iter().map(|choice| choice.value.as_str()).collect()
}

fn validate_multi_choice(choices: &[Choice], raw: &RawValue) -> Result<Value, FieldError> {
    let submitted: Vec<String> = match raw {
        RawValue::Text(s) if s.is_empty() => Vec::new(),
        RawValue::Text(s) => vec![s.clone()],
        RawValue::List(items) => items.iter().filter(|s| !s.is_empty()).cloned().collect(),
        RawValue::File(_) => return Err(FieldError::InvalidList),
    };

    if let Some(bad) = first_not_in(&submitted, &choice_values(choices)) {
        return Err(FieldError::InvalidChoice { value: bad.to_string() });
    }

    Ok(Value::Choices(dedup_preserving_order(&submitted)))
}

fn validate_file(rules: &FileRules, raw: &RawValue, image: bool) -> Result<Value, FieldError> {
    let file: &UploadedFile = match raw {
        RawValue::File(file) => file,
        _ => return Err(FieldError::InvalidFile),
    };

    if file.size == 0 && !rules.allow_empty {
        return Err(FieldError::EmptyFile);
    }

    if image && !looks_like_image(&file.filename, file.content_type.as_deref()) {
        return Err(FieldError::InvalidImage);
    }

    if let Some(allowed) = &rules.allowed_extensions {
        if !has_allowed_extension(&file.filename, allowed) {
            return Err(FieldError::InvalidExtension {
                extension: file_extension(&file.filename).unwrap_or_default(),
            });
        }
    }

    if let Some(max) = rules.max_size {
        if file.size > max {
            return Err(FieldError::FileTooLarge { max });
        }
    }

    Ok(Value::File(file.clone()))
}

fn parse_checkbox(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    !FALSE_WORDS.contains(&lowered.as_str())
}

fn parse_tri_state(text: &str) -> Option<bool> {
    let lowered = text.to_ascii_lowercase();
    if TRUE_WORDS.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSE_WORDS.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use formflow_validation::IpProtocol;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    fn run(field: &FieldSpec, s: &str) -> Result<Value, FieldError> {
        validate_field(field, Some(&text(s)))
    }

    #[test]
    fn test_required_missing() {
        let field = FieldSpec::text("name");
        assert_eq!(validate_field(&field, None), Err(FieldError::Required));
        assert_eq!(run(&field, ""), Err(FieldError::Required));
    }

    #[test]
    fn test_optional_empty_values() {
        assert_eq!(
            validate_field(&FieldSpec::text("bio").optional(), None),
            Ok(Value::Text(String::new()))
        );
        assert_eq!(
            validate_field(&FieldSpec::integer("age").optional(), None),
            Ok(Value::Null)
        );
        assert_eq!(
            validate_field(&FieldSpec::multi_choice("tags", vec![]).optional(), None),
            Ok(Value::Choices(vec![]))
        );
    }

    #[test]
    fn test_length_limits() {
        let field = FieldSpec::text("name").min_length(4).max_length(6);
        assert_eq!(run(&field, "Sam"), Err(FieldError::TooShort { min: 4, actual: 3 }));
        assert_eq!(run(&field, "Samuel"), Ok(Value::Text("Samuel".into())));
        assert_eq!(run(&field, "Samuels"), Err(FieldError::TooLong { max: 6, actual: 7 }));
    }

    #[test]
    fn test_email() {
        let field = FieldSpec::email("email");
        assert_eq!(run(&field, "sam@example.com"), Ok(Value::Text("sam@example.com".into())));
        assert_eq!(run(&field, "not-an-email"), Err(FieldError::InvalidEmail));
    }

    #[rstest]
    #[case("15", Err(FieldError::TooLarge { max: "10".into() }))]
    #[case("-1", Err(FieldError::TooSmall { min: "0".into() }))]
    #[case("7", Ok(Value::Integer(7)))]
    #[case("seven", Err(FieldError::InvalidInteger))]
    fn test_integer_bounds(#[case] input: &str, #[case] expected: Result<Value, FieldError>) {
        let field = FieldSpec::integer("rating").min_value(0.0).max_value(10.0);
        assert_eq!(run(&field, input), expected);
    }

    #[test]
    fn test_float() {
        let field = FieldSpec::float("score").max_value(1.5);
        assert_eq!(run(&field, "1.25"), Ok(Value::Float(1.25)));
        assert_eq!(run(&field, "2"), Err(FieldError::TooLarge { max: "1.5".into() }));
        assert_eq!(run(&field, "NaN"), Err(FieldError::InvalidNumber));
    }

    #[rstest]
    #[case("123.45", None)]
    #[case("1.234", Some(FieldError::MaxDecimalPlaces { max: 2 }))]
    #[case("1234.5", Some(FieldError::MaxWholeDigits { max: 3 }))]
    #[case("12a", Some(FieldError::InvalidNumber))]
    fn test_decimal_precision(#[case] input: &str, #[case] error: Option<FieldError>) {
        let field = FieldSpec::decimal("price").precision(5, 2);
        match error {
            None => assert!(matches!(run(&field, input), Ok(Value::Decimal(_)))),
            Some(expected) => assert_eq!(run(&field, input), Err(expected)),
        }
    }

    #[test]
    fn test_pattern_message() {
        let field = FieldSpec::pattern("phone_number", r"\+?1?\d{9,15}")
            .unwrap()
            .pattern_message("Phone number must be 9-15 digits");
        assert!(run(&field, "+14155552671").is_ok());
        assert_eq!(
            run(&field, "12ab").unwrap_err().to_string(),
            "Phone number must be 9-15 digits"
        );
    }

    #[test]
    fn test_checkbox() {
        let required = FieldSpec::boolean("agree");
        assert_eq!(run(&required, "on"), Ok(Value::Bool(true)));
        assert_eq!(run(&required, "false"), Err(FieldError::Required));
        assert_eq!(validate_field(&required, None), Err(FieldError::Required));

        let optional = FieldSpec::boolean("subscribe").optional();
        assert_eq!(run(&optional, "0"), Ok(Value::Bool(false)));
        assert_eq!(validate_field(&optional, None), Ok(Value::Bool(false)));
    }

    #[rstest]
    #[case(None, Value::TriState(None))]
    #[case(Some("true"), Value::TriState(Some(true)))]
    #[case(Some("no"), Value::TriState(Some(false)))]
    #[case(Some("unknown"), Value::TriState(None))]
    fn test_tri_state_never_required(#[case] input: Option<&str>, #[case] expected: Value) {
        let field = FieldSpec::tri_state("agree");
        let raw = input.map(text);
        assert_eq!(validate_field(&field, raw.as_ref()), Ok(expected));
    }

    #[test]
    fn test_dates_and_times() {
        assert!(matches!(run(&FieldSpec::date("dob"), "2000-02-29"), Ok(Value::Date(_))));
        assert_eq!(run(&FieldSpec::date("dob"), "2001-02-29"), Err(FieldError::InvalidDate));
        assert!(matches!(run(&FieldSpec::time("at"), "09:30"), Ok(Value::Time(_))));
        assert!(matches!(
            run(&FieldSpec::datetime("at"), "2025-06-12T09:30"),
            Ok(Value::DateTime(_))
        ));
        assert_eq!(run(&FieldSpec::datetime("at"), "yesterday"), Err(FieldError::InvalidDateTime));
    }

    #[test]
    fn test_choices() {
        let gender = FieldSpec::choice(
            "gender",
            vec![Choice::new("M", "Male"), Choice::new("F", "Female")],
        );
        assert_eq!(run(&gender, "F"), Ok(Value::Choice("F".into())));
        assert_eq!(run(&gender, "X"), Err(FieldError::InvalidChoice { value: "X".into() }));

        let interests = FieldSpec::multi_choice(
            "interests",
            vec![Choice::new("tech", "Tech"), Choice::new("art", "Art")],
        )
        .optional();
        let raw = RawValue::List(vec!["tech".into(), "art".into(), "tech".into()]);
        assert_eq!(
            validate_field(&interests, Some(&raw)),
            Ok(Value::Choices(vec!["tech".into(), "art".into()]))
        );
        let bad = RawValue::List(vec!["tech".into(), "golf".into()]);
        assert_eq!(
            validate_field(&interests, Some(&bad)),
            Err(FieldError::InvalidChoice { value: "golf".into() })
        );
    }

    #[test]
    fn test_url_slug_ip() {
        assert!(run(&FieldSpec::url("site"), "https://example.com/x").is_ok());
        assert_eq!(run(&FieldSpec::url("site"), "example"), Err(FieldError::InvalidUrl));
        assert_eq!(run(&FieldSpec::slug("slug"), "a b"), Err(FieldError::InvalidSlug));
        assert!(run(&FieldSpec::ip_address("ip", IpProtocol::V4), "10.0.0.1").is_ok());
        assert_eq!(
            run(&FieldSpec::ip_address("ip", IpProtocol::V4), "::1"),
            Err(FieldError::InvalidIp)
        );
    }

    #[test]
    fn test_files() {
        let resume = FieldSpec::file("resume").allowed_extensions(&["pdf"]).max_file_size(1024);
        let ok = RawValue::File(UploadedFile::new("cv.PDF", Some("application/pdf"), 100));
        assert!(matches!(validate_field(&resume, Some(&ok)), Ok(Value::File(_))));

        let wrong = RawValue::File(UploadedFile::new("cv.doc", None, 100));
        assert_eq!(
            validate_field(&resume, Some(&wrong)),
            Err(FieldError::InvalidExtension { extension: "doc".into() })
        );

        let big = RawValue::File(UploadedFile::new("cv.pdf", None, 4096));
        assert_eq!(validate_field(&resume, Some(&big)), Err(FieldError::FileTooLarge { max: 1024 }));

        let empty = RawValue::File(UploadedFile::new("cv.pdf", None, 0));
        assert_eq!(validate_field(&resume, Some(&empty)), Err(FieldError::EmptyFile));

        assert_eq!(run(&resume, "cv.pdf"), Err(FieldError::InvalidFile));
        assert_eq!(validate_field(&resume.clone().optional(), None), Ok(Value::Null));
    }

    #[test]
    fn test_images() {
        let photo = FieldSpec::image("photo");
        let png = RawValue::File(UploadedFile::new("me.png", Some("image/png"), 10));
        assert!(validate_field(&photo, Some(&png)).is_ok());
        let txt = RawValue::File(UploadedFile::new("me.txt", Some("text/plain"), 10));
        assert_eq!(validate_field(&photo, Some(&txt)), Err(FieldError::InvalidImage));
    }

    #[test]
    fn test_secret_is_wrapped() {
        let field = FieldSpec::secret("password").min_length(8);
        assert_eq!(run(&field, "longenough"), Ok(Value::Secret(Secret::new("longenough"))));
        assert!(matches!(run(&field, "short"), Err(FieldError::TooShort { .. })));
    }

    #[test]
    fn test_message_override() {
        let field = FieldSpec::email("email").error_message("required", "Email is required");
        assert_eq!(message_for(&field, &FieldError::Required), "Email is required");
        assert_eq!(
            message_for(&field, &FieldError::InvalidEmail),
            FieldError::InvalidEmail.to_string()
        );
    }

    #[test]
    fn test_validation_is_deterministic() {
        let field = FieldSpec::integer("rating").max_value(10.0);
        assert_eq!(run(&field, "15"), run(&field, "15"));
    }
}
