//! Response line classification for the Hiber modem dialect.
//!
//! The modem speaks a line-oriented text protocol. Every received line is
//! one of three shapes:
//!
//! ```text
//! Hiber API <version> - Ready          the modem woke up and accepts commands
//! API(<code>[: <v>[; <v>...]])         result of the last command
//! <anything else>                      noise, log output, corruption
//! ```

/// Result codes at or above this value indicate success.
pub const CODE_OK_MIN: u16 = 600;

/// The modem is sleeping or busy; the command has not completed.
pub const CODE_SLEEPING: u16 = 602;

/// A classified response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The ready banner: the modem is awake and idle.
    Ready,
    /// A coded result, optionally carrying `;`-separated value fields.
    Result { code: u16, values: Vec<String> },
    /// The line had the result envelope but the code was not a valid number.
    BadResultCode { raw: String },
    /// The line matched nothing in the dialect.
    Unrecognized { raw: String },
}

/// Classifies one received line. Stateless.
#[must_use]
pub fn classify(line: &str) -> Response {
    if is_ready_banner(line) {
        return Response::Ready;
    }

    let Some(inner) = line.strip_prefix("API(").and_then(|s| s.strip_suffix(')')) else {
        return Response::Unrecognized { raw: line.to_owned() };
    };

    let (code_str, payload) = match inner.split_once(':') {
        Some((code, rest)) => (code, Some(rest.trim_start_matches(' '))),
        None => (inner, None),
    };

    if code_str.is_empty() || !code_str.bytes().all(|b| b.is_ascii_digit()) {
        return Response::Unrecognized { raw: line.to_owned() };
    }

    // The envelope matched but the digits overflow the code range; this is
    // a parse error, not a coerced result.
    let Ok(code) = code_str.parse::<u16>() else {
        return Response::BadResultCode { raw: line.to_owned() };
    };

    let values = match payload {
        Some(p) if !p.is_empty() => p
            .split(';')
            .map(|v| v.trim_matches(' ').to_owned())
            .collect(),
        _ => Vec::new(),
    };

    Response::Result { code, values }
}

/// Matches `Hiber API <anything> - Ready`.
fn is_ready_banner(line: &str) -> bool {
    line.strip_prefix("Hiber API ")
        .is_some_and(|rest| rest.ends_with(" - Ready"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_banner() {
        assert_eq!(classify("Hiber API 1.2 - Ready"), Response::Ready);
        assert_eq!(classify("Hiber API anything at all - Ready"), Response::Ready);
    }

    #[test]
    fn test_ready_banner_rejects_near_misses() {
        assert!(matches!(
            classify("Hiber API - Ready"),
            Response::Unrecognized { .. }
        ));
        assert!(matches!(
            classify("Hiber API 1.2 - Ready extra"),
            Response::Unrecognized { .. }
        ));
        assert!(matches!(
            classify("hiber API 1.2 - Ready"),
            Response::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_result_without_values() {
        assert_eq!(
            classify("API(602)"),
            Response::Result {
                code: 602,
                values: vec![],
            }
        );
    }

    #[test]
    fn test_result_with_single_value() {
        assert_eq!(
            classify("API(610: v3.2.1)"),
            Response::Result {
                code: 610,
                values: vec!["v3.2.1".to_owned()],
            }
        );
    }

    #[test]
    fn test_result_value_split_tolerates_spaces() {
        assert_eq!(
            classify("API(600: a; b ;c;d)"),
            Response::Result {
                code: 600,
                values: vec!["a".to_owned(), "b".to_owned(), "c".to_owned(), "d".to_owned()],
            }
        );
    }

    #[test]
    fn test_result_empty_payload_has_no_values() {
        assert_eq!(
            classify("API(610: )"),
            Response::Result {
                code: 610,
                values: vec![],
            }
        );
    }

    #[test]
    fn test_non_numeric_code_is_unrecognized() {
        // A non-digit inside the code breaks the envelope match entirely.
        assert!(matches!(classify("API(6x2)"), Response::Unrecognized { .. }));
        assert!(matches!(
            classify("API(err: boom)"),
            Response::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_overflowing_code_is_a_parse_error() {
        assert!(matches!(
            classify("API(99999999: x)"),
            Response::BadResultCode { .. }
        ));
    }

    #[test]
    fn test_noise_is_unrecognized() {
        assert!(matches!(classify("boot: flash ok"), Response::Unrecognized { .. }));
        assert!(matches!(classify("API(600"), Response::Unrecognized { .. }));
        assert!(matches!(classify("(600)"), Response::Unrecognized { .. }));
    }
}
