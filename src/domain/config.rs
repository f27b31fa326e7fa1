use std::{collections::BTreeMap, num::NonZeroUsize, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::Sku;

/// Configuration for the 3PL integrations.
///
/// Maps each provider name (as stamped on the staging record) to the profile
/// describing its payload layout and correlation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Profiles keyed by upper-cased provider name.
    providers: BTreeMap<String, ProviderProfile>,
}

/// The structural convention a provider's payloads follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderVariant {
    /// One flat record per kit instance; the serial field identifies the
    /// first component and the batch field the second.
    KitPair,
    /// Kits carry nested bundles of component serial lists.
    Bundled,
    /// No identifiers at all; only quantities are reconciled.
    QuantityOnly,
}

/// How whitespace in tracking URLs is repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlWhitespace {
    /// Percent-encode spaces.
    #[default]
    Encode,
    /// Remove all whitespace.
    Strip,
}

/// Payload layout and correlation rules for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Which correlation strategy applies.
    pub variant: ProviderVariant,

    /// Field holding the SKU on each payload record.
    #[serde(default = "default_sku_field")]
    pub sku_field: String,

    /// Field holding the serial number (or serial list, for bundled payloads).
    #[serde(default = "default_serial_field")]
    pub serial_field: String,

    /// Field holding the batch number.
    #[serde(default = "default_batch_field")]
    pub batch_field: String,

    /// Field holding the record quantity.
    #[serde(default = "default_quantity_field")]
    pub quantity_field: String,

    /// Key under which the record list is nested, if the payload is wrapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope_key: Option<String>,

    /// Reject payloads where any record has a blank SKU.
    ///
    /// A blank SKU means the warehouse scanned kit components without the
    /// kit itself.
    #[serde(default)]
    pub require_sku: bool,

    /// Highest component position that receives identifiers in a kit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_component_limit: Option<NonZeroUsize>,

    /// Group consulted when a stand-alone line's own SKU has no match, e.g. a
    /// returned kit component reported under the kit's SKU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone_fallback_sku: Option<Sku>,

    /// How tracking URLs are cleaned.
    #[serde(default)]
    pub url_whitespace: UrlWhitespace,
}

impl ProviderProfile {
    /// A profile with default field names for the given variant.
    #[must_use]
    pub fn new(variant: ProviderVariant) -> Self {
        Self {
            variant,
            sku_field: default_sku_field(),
            serial_field: default_serial_field(),
            batch_field: default_batch_field(),
            quantity_field: default_quantity_field(),
            envelope_key: None,
            require_sku: false,
            kit_component_limit: None,
            standalone_fallback_sku: None,
            url_whitespace: UrlWhitespace::default(),
        }
    }

    /// The OGL (Mintsoft) profile: flat barcode-verified records, two
    /// components per kit, blank barcodes rejected.
    #[must_use]
    pub fn ogl() -> Self {
        Self {
            sku_field: "Barcode".to_string(),
            envelope_key: Some("ReturnItems".to_string()),
            require_sku: true,
            kit_component_limit: NonZeroUsize::new(2),
            ..Self::new(ProviderVariant::KitPair)
        }
    }

    /// The Fastlog profile: bundled kits with serial number lists.
    #[must_use]
    pub fn fastlog() -> Self {
        Self {
            serial_field: "SerialNumbers".to_string(),
            envelope_key: Some("OrderItems".to_string()),
            ..Self::new(ProviderVariant::Bundled)
        }
    }

    /// The Kinesis profile: quantities only.
    #[must_use]
    pub fn kinesis() -> Self {
        Self {
            url_whitespace: UrlWhitespace::Strip,
            ..Self::new(ProviderVariant::QuantityOnly)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let providers = [
            ("OGL", ProviderProfile::ogl()),
            ("FLG", ProviderProfile::fastlog()),
            ("KIN", ProviderProfile::kinesis()),
        ]
        .into_iter()
        .map(|(name, profile)| (name.to_string(), profile))
        .collect();

        Self { providers }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Looks up a provider profile. Names are matched case-insensitively.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderProfile> {
        self.providers.get(&name.trim().to_uppercase())
    }

    /// Iterates over the configured providers.
    pub fn providers(&self) -> impl Iterator<Item = (&str, &ProviderProfile)> {
        self.providers
            .iter()
            .map(|(name, profile)| (name.as_str(), profile))
    }

    /// Adds or replaces a provider profile.
    ///
    /// Returns the previous profile for that name, if any.
    pub fn set_provider(
        &mut self,
        name: &str,
        profile: ProviderProfile,
    ) -> Option<ProviderProfile> {
        self.providers.insert(name.trim().to_uppercase(), profile)
    }
}

fn default_sku_field() -> String {
    "SKU".to_string()
}

fn default_serial_field() -> String {
    "SerialNo".to_string()
}

fn default_batch_field() -> String {
    "BatchNo".to_string()
}

fn default_quantity_field() -> String {
    "Quantity".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// Missing table means "use the built-in providers".
        #[serde(default, skip_serializing_if = "Option::is_none")]
        providers: Option<BTreeMap<String, ProviderProfile>>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { providers } => providers.map_or_else(Self::default, |providers| {
                Self {
                    providers: providers
                        .into_iter()
                        .map(|(name, profile)| (name.trim().to_uppercase(), profile))
                        .collect(),
                }
            }),
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            providers: Some(config.providers),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\n\n[providers.acme]\nvariant = \"kit-pair\"\nsku_field = \"Code\"\nrequire_sku = true\nkit_component_limit = 3\nstandalone_fallback_sku = \"KIT-A\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        let profile = config.provider("ACME").unwrap();
        assert_eq!(profile.variant, ProviderVariant::KitPair);
        assert_eq!(profile.sku_field, "Code");
        assert_eq!(profile.serial_field, "SerialNo");
        assert!(profile.require_sku);
        assert_eq!(profile.kit_component_limit, NonZeroUsize::new(3));
        assert_eq!(
            profile.standalone_fallback_sku,
            Some(Sku::new("KIT-A").unwrap())
        );
        assert!(config.provider("OGL").is_none());
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\n[providers.x]\nvariant = \"carrier-pigeon\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load_preserves_providers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reconcile.toml");

        let mut config = Config::default();
        config.set_provider("acme", ProviderProfile::new(ProviderVariant::Bundled));
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn provider_lookup_is_case_insensitive() {
        let config = Config::default();
        assert_eq!(
            config.provider("ogl").map(|p| p.variant),
            Some(ProviderVariant::KitPair)
        );
        assert_eq!(
            config.provider(" Flg ").map(|p| p.variant),
            Some(ProviderVariant::Bundled)
        );
        assert_eq!(
            config.provider("KIN").map(|p| p.variant),
            Some(ProviderVariant::QuantityOnly)
        );
        assert!(config.provider("DHL").is_none());
    }
}
