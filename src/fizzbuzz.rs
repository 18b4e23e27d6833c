//! FizzBuzz Module
//!
//! The compute function served through the response cache.

use crate::error::ComputeError;
use crate::models::JsonResp;

// == Output Format ==
/// Encoding of a rendered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Raw comma separated sequence
    #[default]
    Text,
    /// `{"txt": "<sequence>"}`
    Json,
}

impl OutputFormat {
    /// Picks the format from a request `Content-Type` header value.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(value) if value.contains("application/json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }

    /// Response `Content-Type` for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text/plain; charset=utf-8",
            OutputFormat::Json => "application/json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

// == FizzBuzz Params ==
/// Validated request parameters.
///
/// A multiplier of zero never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FizzBuzzParams {
    /// Upper bound of the sequence (inclusive), 0 yields an empty sequence
    pub limit: u64,
    pub nb_one: u64,
    pub nb_two: u64,
    pub str_one: String,
    pub str_two: String,
    pub format: OutputFormat,
}

// == Sequence ==
/// Builds the comma separated sequence for `1..=limit`.
pub fn sequence(params: &FizzBuzzParams) -> String {
    let mut out = String::new();

    for i in 1..=params.limit {
        if i > 1 {
            out.push(',');
        }

        let one = params.nb_one > 0 && i % params.nb_one == 0;
        let two = params.nb_two > 0 && i % params.nb_two == 0;

        if one {
            out.push_str(&params.str_one);
        }
        if two {
            out.push_str(&params.str_two);
        }
        if !one && !two {
            out.push_str(&i.to_string());
        }
    }

    out
}

// == Render ==
/// Renders the full response body for `params`.
pub fn render(params: &FizzBuzzParams) -> Result<Vec<u8>, ComputeError> {
    let txt = sequence(params);

    match params.format {
        OutputFormat::Text => Ok(txt.into_bytes()),
        OutputFormat::Json => serde_json::to_vec(&JsonResp { txt })
            .map_err(|e| ComputeError::Failed(format!("Failed to encode JSON response: {}", e))),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: u64, nb_one: u64, nb_two: u64, str_one: &str, str_two: &str) -> FizzBuzzParams {
        FizzBuzzParams {
            limit,
            nb_one,
            nb_two,
            str_one: str_one.to_string(),
            str_two: str_two.to_string(),
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_classic_fizzbuzz() {
        let p = params(15, 3, 5, "fizz", "buzz");
        assert_eq!(
            sequence(&p),
            "1,2,fizz,4,buzz,fizz,7,8,fizz,buzz,11,fizz,13,14,fizzbuzz"
        );
    }

    #[test]
    fn test_limit_zero_is_empty() {
        let p = params(0, 3, 5, "fizz", "buzz");
        assert_eq!(render(&p).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_limit_one() {
        let p = params(1, 0, 0, "", "");
        assert_eq!(sequence(&p), "1");
    }

    #[test]
    fn test_zero_multipliers_never_match() {
        let p = params(5, 0, 0, "fizz", "buzz");
        assert_eq!(sequence(&p), "1,2,3,4,5");
    }

    #[test]
    fn test_only_second_multiplier() {
        let p = params(6, 0, 2, "", "buzz");
        assert_eq!(sequence(&p), "1,buzz,3,buzz,5,buzz");
    }

    #[test]
    fn test_json_render() {
        let mut p = params(3, 3, 0, "fizz", "");
        p.format = OutputFormat::Json;
        assert_eq!(render(&p).unwrap(), br#"{"txt":"1,2,fizz"}"#.to_vec());
    }

    #[test]
    fn test_json_render_empty_sequence_is_not_empty_body() {
        let p = FizzBuzzParams {
            format: OutputFormat::Json,
            ..Default::default()
        };
        assert_eq!(render(&p).unwrap(), br#"{"txt":""}"#.to_vec());
    }

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(
            OutputFormat::from_content_type(Some("application/json; charset=utf-8")),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::from_content_type(Some("text/html")),
            OutputFormat::Text
        );
        assert_eq!(OutputFormat::from_content_type(None), OutputFormat::Text);
    }
}
