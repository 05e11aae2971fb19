use secrecy::{ExposeSecret, SecretString};

/// API token supplied by the caller for a single invocation.
///
/// The wrapped value is redacted in `Debug` output and is only exposed when a transport
/// builds its authorization header.
#[derive(Clone, Debug)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn is_blank(&self) -> bool {
        self.0.expose_secret().trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret().trim()
    }
}

impl From<SecretString> for Credential {
    fn from(value: SecretString) -> Self {
        Self(value)
    }
}
