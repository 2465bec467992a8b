/// Registry credentials taken from the environment.
use std::fmt;

use super::errors::MastrError;

/// Environment variable holding the web service API key.
pub const API_KEY_VAR: &str = "MASTR_API_KEY";

/// Environment variable holding the caller's own Marktakteur MaStR number.
pub const MARKTAKTEUR_VAR: &str = "MASTR_MARKTAKTEUR";

/// Authentication parameters sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Web service API key.
    pub api_key: String,
    /// MaStR number of the market participant the key belongs to.
    pub marktakteur: String,
}

impl Credentials {
    /// Read both credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `MastrError::MissingCredential` naming the first variable that
    /// is unset or blank after trimming.
    pub fn from_env() -> Result<Self, MastrError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read both credentials through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Credentials::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MastrError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let read = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .ok_or(MastrError::MissingCredential { var })
        };
        Ok(Self {
            api_key: read(API_KEY_VAR)?,
            marktakteur: read(MARKTAKTEUR_VAR)?,
        })
    }

    /// The API key with all but the last four characters hidden.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count <= 4 {
            return "****".to_owned();
        }
        let tail: String = self.api_key.chars().skip(count - 4).collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.masked_api_key())
            .field("marktakteur", &self.marktakteur)
            .finish()
    }
}
