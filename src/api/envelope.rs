use reqwest::StatusCode;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Value as JsonValue, json};

/// The payload carried by an [`Outcome`], whichever way it went.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data {
    pub results: JsonValue,
}

/// The normalized result of a single DDI API call.
///
/// Serializes as a JSend envelope: `{"status": "success" | "fail", "data": {"results": ...}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Data),
    Fail(Data),
}

impl Outcome {
    /// Normalizes a raw HTTP response into an [`Outcome`].
    ///
    /// Bodies that aren't JSON (including empty ones) become an empty result list. Error statuses fail, and so does
    /// `204 No Content`: that is how the DDI API reports an empty match.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let results = match serde_json::from_str::<JsonValue>(body) {
            Ok(json) => json,
            Err(_) => {
                log::debug!("Response body is not JSON");
                json!([])
            },
        };

        let data = Data { results };
        if status.is_client_error() || status.is_server_error() {
            log::debug!("HTTP error code {status} detected");
            Outcome::Fail(data)
        } else if status == StatusCode::NO_CONTENT {
            log::debug!("HTTP {status} treated as an empty match");
            Outcome::Fail(data)
        } else {
            Outcome::Success(data)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Fail(_) => "fail",
        }
    }

    pub fn results(&self) -> &JsonValue {
        match self {
            Outcome::Success(data) | Outcome::Fail(data) => &data.results,
        }
    }

    /// Turns the outcome into a `fail`, keeping whatever the server sent.
    ///
    /// Used when a lookup went through but didn't turn up what the next step needs.
    pub fn into_fail(self) -> Self {
        match self {
            Outcome::Success(data) | Outcome::Fail(data) => Outcome::Fail(data),
        }
    }

    /// A success that matched nothing is reported as a `fail`.
    pub fn require_rows(self) -> Self {
        if self.first_result().is_some() { self } else { self.into_fail() }
    }

    /// Returns the first row of a successful outcome's results, if there is one.
    pub fn first_result(&self) -> Option<&JsonValue> {
        self.rows().next()
    }

    /// Iterates over the rows of a successful outcome. Failed outcomes have no rows.
    pub fn rows(&self) -> std::slice::Iter<'_, JsonValue> {
        let rows: &[JsonValue] = match self {
            Outcome::Success(_) => self.results().as_array().map(Vec::as_slice).unwrap_or(&[]),
            Outcome::Fail(_) => &[],
        };
        rows.iter()
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match self {
            Outcome::Success(data) | Outcome::Fail(data) => data,
        };

        // Field order matches JSON output with sorted keys.
        let mut state = serializer.serialize_struct("Outcome", 2)?;
        state.serialize_field("data", data)?;
        state.serialize_field("status", self.status())?;
        state.end()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_with_json_body_is_success() {
        let outcome = Outcome::from_response(StatusCode::OK, r#"[{"ip_id": "42"}]"#);
        assert!(outcome.is_success());
        assert_eq!(outcome.first_result(), Some(&json!({"ip_id": "42"})));
    }

    #[test]
    fn non_json_body_becomes_empty_results() {
        let outcome = Outcome::from_response(StatusCode::OK, "<html>oops</html>");
        assert!(outcome.is_success());
        assert_eq!(outcome.results(), &json!([]));
        assert_eq!(outcome.first_result(), None);
    }

    #[test]
    fn no_content_is_fail() {
        let outcome = Outcome::from_response(StatusCode::NO_CONTENT, "");
        assert!(!outcome.is_success());
        assert_eq!(outcome.results(), &json!([]));
    }

    #[test]
    fn error_status_is_fail_but_keeps_payload() {
        let body = r#"[{"errno": "2008", "errmsg": "Object not found"}]"#;
        for status in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::INTERNAL_SERVER_ERROR] {
            let outcome = Outcome::from_response(status, body);
            assert!(!outcome.is_success(), "{status} should fail");
            assert_eq!(outcome.results()[0]["errmsg"], "Object not found");
            assert_eq!(outcome.rows().count(), 0);
        }
    }

    #[test]
    fn empty_match_becomes_fail_with_payload() {
        let outcome = Outcome::from_response(StatusCode::OK, "[]").require_rows();
        assert!(!outcome.is_success());
        assert_eq!(outcome.results(), &json!([]));

        let outcome = Outcome::from_response(StatusCode::OK, r#"{"note": "not a list"}"#).require_rows();
        assert_eq!(outcome, Outcome::Fail(Data { results: json!({"note": "not a list"}) }));

        let outcome = Outcome::from_response(StatusCode::OK, r#"[{"ip_id": "1"}]"#).require_rows();
        assert!(outcome.is_success());
    }

    #[test]
    fn into_fail_keeps_results() {
        let outcome = Outcome::from_response(StatusCode::OK, r#"[{"name": "a"}]"#).into_fail();
        assert_eq!(outcome.status(), "fail");
        assert_eq!(outcome.results()[0]["name"], "a");
    }

    #[test]
    fn serializes_as_jsend() {
        let outcome = Outcome::from_response(StatusCode::CREATED, r#"[{"ret_oid": "7"}]"#);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, json!({"status": "success", "data": {"results": [{"ret_oid": "7"}]}}));

        let outcome = Outcome::from_response(StatusCode::NOT_FOUND, "");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, json!({"status": "fail", "data": {"results": []}}));
    }
}
