//! Request DTOs for the FizzBuzz API
//!
//! Raw query parameters and their validation into `FizzBuzzParams`.

use serde::Deserialize;

use crate::config::ParameterLimits;
use crate::error::{AppError, Result};
use crate::fizzbuzz::{FizzBuzzParams, OutputFormat};

/// Query string of `GET /fizz-buzz`.
///
/// Kept as raw strings so malformed numbers are reported as validation
/// errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FizzBuzzQuery {
    pub limit: Option<String>,
    pub nb_one: Option<String>,
    pub nb_two: Option<String>,
    pub str_one: Option<String>,
    pub str_two: Option<String>,
}

fn parse_number(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidParameter(format!("invalid integer for {} {}", name, raw)))
}

fn multiplier(name: &str, raw: Option<&str>, max: u64) -> Result<u64> {
    let Some(raw) = raw.filter(|v| !v.is_empty()) else {
        return Ok(0);
    };

    let value = parse_number(name, raw)?;
    if value < 1 {
        return Err(AppError::InvalidParameter(format!(
            "{} must be greater than zero",
            name
        )));
    }
    let value = value as u64;
    if value > max {
        return Err(AppError::InvalidParameter(format!(
            "maximum size exceeded for {} {}, max {}",
            name, raw, max
        )));
    }
    Ok(value)
}

fn replacement(name: &str, raw: Option<&str>, max_chars: usize) -> Result<String> {
    let value = raw.unwrap_or_default();
    if value.len() > max_chars {
        return Err(AppError::InvalidParameter(format!(
            "maximum char exceeded for {}, max {}",
            name, max_chars
        )));
    }
    Ok(value.to_string())
}

impl FizzBuzzQuery {
    /// Validates the query against `limits`.
    ///
    /// Absent multipliers and limit default to zero. A multiplier without
    /// its replacement string replaces its multiples with nothing.
    pub fn validate(&self, limits: &ParameterLimits, format: OutputFormat) -> Result<FizzBuzzParams> {
        let nb_one = multiplier("nbOne", self.nb_one.as_deref(), limits.max_nb)?;
        let nb_two = multiplier("nbTwo", self.nb_two.as_deref(), limits.max_nb)?;

        let limit = match self.limit.as_deref().filter(|v| !v.is_empty()) {
            None => 0,
            Some(raw) => {
                let value = parse_number("limit", raw)?;
                if value < 1 {
                    return Err(AppError::InvalidParameter(
                        "limit must be greater than zero".to_string(),
                    ));
                }
                if value as u64 > limits.max_limit {
                    return Err(AppError::InvalidParameter(format!(
                        "maximum size exceeded for limit {}, max {}",
                        raw, limits.max_limit
                    )));
                }
                value as u64
            }
        };

        let str_one = replacement("strOne", self.str_one.as_deref(), limits.max_str_chars)?;
        let str_two = replacement("strTwo", self.str_two.as_deref(), limits.max_str_chars)?;

        Ok(FizzBuzzParams {
            limit,
            nb_one,
            nb_two,
            str_one,
            str_two,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> FizzBuzzQuery {
        let mut query = FizzBuzzQuery::default();
        for (name, value) in pairs {
            let slot = match *name {
                "limit" => &mut query.limit,
                "nbOne" => &mut query.nb_one,
                "nbTwo" => &mut query.nb_two,
                "strOne" => &mut query.str_one,
                "strTwo" => &mut query.str_two,
                other => panic!("unknown parameter {}", other),
            };
            *slot = Some(value.to_string());
        }
        query
    }

    fn validate(pairs: &[(&str, &str)]) -> Result<FizzBuzzParams> {
        query(pairs).validate(&ParameterLimits::default(), OutputFormat::Text)
    }

    #[test]
    fn test_query_deserialize_camel_case() {
        let json = r#"{"limit": "15", "nbOne": "3", "strTwo": "buzz"}"#;
        let query: FizzBuzzQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.limit.as_deref(), Some("15"));
        assert_eq!(query.nb_one.as_deref(), Some("3"));
        assert_eq!(query.str_two.as_deref(), Some("buzz"));
        assert!(query.nb_two.is_none());
    }

    #[test]
    fn test_full_query() {
        let params = validate(&[
            ("limit", "100"),
            ("nbOne", "3"),
            ("nbTwo", "5"),
            ("strOne", "fizz"),
            ("strTwo", "buzz"),
        ])
        .unwrap();

        assert_eq!(params.limit, 100);
        assert_eq!(params.nb_one, 3);
        assert_eq!(params.nb_two, 5);
        assert_eq!(params.str_one, "fizz");
        assert_eq!(params.str_two, "buzz");
    }

    #[test]
    fn test_empty_query_defaults_to_zero() {
        let params = validate(&[]).unwrap();
        assert_eq!(params, FizzBuzzParams::default());
    }

    #[test]
    fn test_limit_bounds() {
        assert!(validate(&[("limit", "0")]).is_err());
        assert!(validate(&[("limit", "1")]).is_ok());
        assert!(validate(&[("limit", "1000000000")]).is_err());
        assert!(validate(&[("limit", "abc")]).is_err());
    }

    #[test]
    fn test_multiplier_bounds() {
        assert!(validate(&[("nbOne", "0"), ("strOne", "fizz")]).is_err());
        assert!(validate(&[("nbOne", "-3"), ("strOne", "fizz")]).is_err());
        assert!(validate(&[("nbTwo", "100001"), ("strTwo", "buzz")]).is_err());
    }

    #[test]
    fn test_multiplier_without_string_is_ok() {
        let params = validate(&[("limit", "6"), ("nbOne", "3")]).unwrap();
        assert_eq!(params.nb_one, 3);
        assert_eq!(params.str_one, "");
        assert_eq!(crate::fizzbuzz::sequence(&params), "1,2,,4,5,");

        assert!(validate(&[("limit", "10"), ("nbTwo", "5")]).is_ok());
    }

    #[test]
    fn test_string_without_multiplier_is_ok() {
        let params = validate(&[("limit", "10"), ("strOne", "fizz"), ("strTwo", "buzz")]).unwrap();
        assert_eq!(params.nb_one, 0);
        assert_eq!(params.str_one, "fizz");
    }

    #[test]
    fn test_string_too_long() {
        let long = "x".repeat(101);
        let err = validate(&[("strOne", long.as_str())]).unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
    }
}
