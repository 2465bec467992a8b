/// Market roles accepted by `actors --role`.
use clap::ValueEnum;

/// Shorthand for a registry market role (`MarktrollenEnum`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum Role {
    /// Bilanzkreisverantwortlicher (balance responsible party, electricity).
    Bv,
    /// Stromlieferant (electricity supplier). Direct marketers and wholesalers
    /// have no role of their own in the registry and are filed here.
    Lt,
    /// Messstellenbetreiber (metering point operator, electricity).
    Mb,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 3] = [Self::Bv, Self::Lt, Self::Mb];

    /// The registry's role code sent in the `Marktrollen` filter.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Bv => "EnergiemarktakteureBilanzkreisverantwortlicherStrom",
            Self::Lt => "EnergiemarktakteureStromlieferant",
            Self::Mb => "EnergiemarktakteureMessstellenbetreiberStrom",
        }
    }

    /// The CLI shorthand.
    #[must_use]
    pub fn shorthand(self) -> &'static str {
        match self {
            Self::Bv => "BV",
            Self::Lt => "LT",
            Self::Mb => "MB",
        }
    }

    /// Human-readable German role name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Bv => "Bilanzkreisverantwortlicher (Strom)",
            Self::Lt => "Stromlieferant",
            Self::Mb => "Messstellenbetreiber (Strom)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Role::from_str("BV", true).unwrap(), Role::Bv);
        assert_eq!(Role::from_str("lt", true).unwrap(), Role::Lt);
        assert_eq!(Role::from_str(" Mb ".trim(), true).unwrap(), Role::Mb);
        assert!(Role::from_str("XX", true).is_err());
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes: Vec<&str> = Role::ALL.iter().map(|r| r.code()).collect();
        assert_eq!(codes.len(), 3);
        assert!(codes.iter().all(|c| c.starts_with("Energiemarktakteure")));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
    }

    #[test]
    fn test_shorthand_round_trips_through_value_enum() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.shorthand(), false).unwrap(), role);
        }
    }
}
