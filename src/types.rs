/// Shared serializable output types.
///
/// Registry records themselves are passed through as JSON maps; these types
/// cover the tool's own output (role listing, error envelope).
use serde::{Deserialize, Serialize};

use crate::mastr::{MastrError, Role};

/// One accepted `--role` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleOutput {
    /// CLI shorthand (e.g. "BV").
    pub role: String,
    /// Human-readable role name.
    pub label: String,
    /// Registry role code sent in the `Marktrollen` filter.
    pub code: String,
}

impl From<Role> for RoleOutput {
    fn from(role: Role) -> Self {
        Self {
            role: role.shorthand().to_owned(),
            label: role.label().to_owned(),
            code: role.code().to_owned(),
        }
    }
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (`snake_case`).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Process exit code that accompanies this error.
    pub exit_code: i32,
}

impl ErrorOutput {
    /// Construct from a `MastrError`.
    #[must_use]
    pub fn from_mastr_error(err: &MastrError) -> Self {
        Self {
            ok: false,
            error: ErrorDetail {
                code: err.code().to_owned(),
                message: err.to_string(),
                exit_code: err.exit_code(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let err = MastrError::MissingCredential {
            var: "MASTR_API_KEY",
        };
        let value = serde_json::to_value(ErrorOutput::from_mastr_error(&err)).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["code"], "missing_credential");
        assert_eq!(value["error"]["exit_code"], 3);
        assert!(
            value["error"]["message"]
                .as_str()
                .unwrap()
                .contains("MASTR_API_KEY")
        );
    }

    #[test]
    fn test_role_output_from_role() {
        let out = RoleOutput::from(Role::Lt);
        assert_eq!(out.role, "LT");
        assert_eq!(out.code, "EnergiemarktakteureStromlieferant");
    }
}
