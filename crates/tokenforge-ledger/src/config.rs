//! Token deployment configuration

use serde::{Deserialize, Serialize};
use tokenforge_core::units::{self, MAX_DECIMALS};
use tokenforge_core::{Amount, LedgerError, Result};

/// Parameters fixed at deployment
///
/// Supplies are whole-token decimal strings (`"1000000000"` is one billion
/// tokens) so configs stay readable and fit TOML's integer range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token name
    #[serde(default = "default_name")]
    pub name: String,

    /// Ticker symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Fractional decimal digits of one token
    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Supply minted to the owner at deployment, in whole tokens
    #[serde(default = "default_initial_supply")]
    pub initial_supply: String,

    /// Issuance ceiling, in whole tokens
    #[serde(default = "default_max_supply")]
    pub max_supply: String,

    /// Reasons recorded when a caller supplies none
    #[serde(default)]
    pub reasons: DefaultReasons,
}

fn default_name() -> String {
    "TokenForge".to_string()
}

fn default_symbol() -> String {
    "TFG".to_string()
}

fn default_decimals() -> u8 {
    units::DECIMALS
}

fn default_initial_supply() -> String {
    "1000000000".to_string()
}

fn default_max_supply() -> String {
    "10000000000".to_string()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            initial_supply: default_initial_supply(),
            max_supply: default_max_supply(),
            reasons: DefaultReasons::default(),
        }
    }
}

impl TokenConfig {
    /// Initial supply in base units
    pub fn initial_supply_units(&self) -> Result<Amount> {
        self.to_units("initial_supply", &self.initial_supply)
    }

    /// Max supply in base units
    pub fn max_supply_units(&self) -> Result<Amount> {
        self.to_units("max_supply", &self.max_supply)
    }

    /// Check the parameters are mutually consistent
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidConfig("name is empty".to_string()));
        }
        if self.symbol.trim().is_empty() {
            return Err(LedgerError::InvalidConfig("symbol is empty".to_string()));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(LedgerError::InvalidConfig(format!(
                "decimals {} exceeds {MAX_DECIMALS}",
                self.decimals
            )));
        }
        let initial = self.initial_supply_units()?;
        let max = self.max_supply_units()?;
        if max < initial {
            return Err(LedgerError::InvalidConfig(format!(
                "max supply {} is below initial supply {}",
                self.max_supply, self.initial_supply
            )));
        }
        Ok(())
    }

    fn to_units(&self, field: &str, value: &str) -> Result<Amount> {
        units::parse_units(value, self.decimals)
            .map_err(|e| LedgerError::InvalidConfig(format!("{field}: {e}")))
    }
}

/// Reasons substituted when a caller omits one
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultReasons {
    #[serde(default = "default_mint_reason")]
    pub mint: String,

    #[serde(default = "default_burn_reason")]
    pub burn: String,

    #[serde(default = "default_burn_from_reason")]
    pub burn_from: String,

    #[serde(default = "default_pause_reason")]
    pub pause: String,
}

fn default_mint_reason() -> String {
    "Admin mint".to_string()
}

fn default_burn_reason() -> String {
    "User burn".to_string()
}

fn default_burn_from_reason() -> String {
    "Burner burn".to_string()
}

fn default_pause_reason() -> String {
    "Emergency pause".to_string()
}

impl Default for DefaultReasons {
    fn default() -> Self {
        Self {
            mint: default_mint_reason(),
            burn: default_burn_reason(),
            burn_from: default_burn_from_reason(),
            pause: default_pause_reason(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenforge_core::units::{INITIAL_SUPPLY, MAX_SUPPLY};

    #[test]
    fn test_default_config_matches_constants() {
        let config = TokenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_supply_units().unwrap(), INITIAL_SUPPLY);
        assert_eq!(config.max_supply_units().unwrap(), MAX_SUPPLY);
        assert_eq!(config.reasons.pause, "Emergency pause");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TokenConfig = toml::from_str(
            r#"
            symbol = "GLD"
            decimals = 6

            [reasons]
            mint = "Treasury issuance"
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "TokenForge");
        assert_eq!(config.symbol, "GLD");
        assert_eq!(config.initial_supply_units().unwrap(), 1_000_000_000 * 1_000_000);
        assert_eq!(config.reasons.mint, "Treasury issuance");
        assert_eq!(config.reasons.burn, "User burn");
    }

    #[test]
    fn test_validate_rejects_inconsistent_supply() {
        let config = TokenConfig {
            initial_supply: "10".to_string(),
            max_supply: "5".to_string(),
            ..TokenConfig::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::InvalidConfig(_))));

        let config = TokenConfig {
            max_supply: "lots".to_string(),
            ..TokenConfig::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::InvalidConfig(_))));

        let config = TokenConfig {
            decimals: 39,
            ..TokenConfig::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::InvalidConfig(_))));
    }
}
