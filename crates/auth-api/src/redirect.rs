//! Results handed back by external handlers (companion app or browser)

use url::Url;

use crate::error::{
    AUTH_CODE_INVALID, AUTH_CODE_NOT_PRESENT, AuthError, CANCELED, NULL_RESPONSE, Result, UNKNOWN,
};

const CODE_PARAM: &str = "code";
const ERROR_PARAM: &str = "error";

/// `code` / `error` parameters carried by a redirect back into the host app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

impl RedirectParams {
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            error: None,
        }
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            code: None,
            error: Some(error.into()),
        }
    }

    /// Extract `code` and `error` from a redirect URL.
    ///
    /// The query string is checked first, then the fragment (implicit-style
    /// redirects put parameters after `#`).
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::from_pairs(url.query_pairs());
        if params.code.is_none()
            && params.error.is_none()
            && let Some(fragment) = url.fragment()
        {
            params = Self::from_pairs(url::form_urlencoded::parse(fragment.as_bytes()));
        }
        params
    }

    fn from_pairs<'a>(pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                CODE_PARAM if params.code.is_none() => params.code = Some(value.into_owned()),
                ERROR_PARAM if params.error.is_none() => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// Classify the redirect: a non-empty code wins, then a non-empty error.
    /// Neither present means the user canceled.
    pub fn into_result(self) -> Result<String> {
        match (non_empty(self.code), non_empty(self.error)) {
            (Some(code), _) => Ok(code),
            (None, Some(error)) => Err(AuthError::Client(error)),
            (None, None) => Err(AuthError::Client(CANCELED.to_string())),
        }
    }

    /// Strict code extraction for deep links, which only count when they
    /// actually carry a code.
    pub fn auth_code(&self) -> Result<&str> {
        match self.code.as_deref() {
            None => Err(AuthError::Client(AUTH_CODE_NOT_PRESENT.to_string())),
            Some(code) if code.trim().is_empty() => {
                Err(AuthError::Client(AUTH_CODE_INVALID.to_string()))
            }
            Some(code) => Ok(code),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Result code plus payload returned by a launched external handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalResult {
    /// Handler finished normally. `None` means it returned no data at all.
    Ok(Option<RedirectParams>),
    /// Handler was dismissed by the user.
    Canceled,
    /// Handler returned an unrecognized result code.
    Unknown(i32),
}

impl ExternalResult {
    pub fn into_result(self) -> Result<String> {
        match self {
            ExternalResult::Ok(Some(params)) => params.into_result(),
            ExternalResult::Ok(None) => Err(AuthError::Client(NULL_RESPONSE.to_string())),
            ExternalResult::Canceled => Err(AuthError::canceled()),
            ExternalResult::Unknown(_) => Err(AuthError::Client(UNKNOWN.to_string())),
        }
    }
}

impl From<RedirectParams> for ExternalResult {
    fn from(params: RedirectParams) -> Self {
        ExternalResult::Ok(Some(params))
    }
}
