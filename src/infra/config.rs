//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/itinerary.toml

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Config file used when neither `--config` nor `CONFIG_FILE` is given
pub const DEFAULT_CONFIG_PATH: &str = "config/itinerary.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AssemblyConfig {
    /// Gaps longer than this many days are reported
    #[serde(default = "default_gap_threshold_days")]
    pub gap_threshold_days: i64,
    /// Unconfirmed bookings this close together may be the same booking
    #[serde(default = "default_dedup_window_days")]
    pub dedup_window_days: i64,
    /// Same-city visits at most this far apart are one stay
    #[serde(default = "default_merge_adjacency_days")]
    pub merge_adjacency_days: i64,
    /// Minimum strength for a PRESENT signal elsewhere to end the open visit
    #[serde(default = "default_present_override_strength")]
    pub present_override_strength: f64,
}

fn default_gap_threshold_days() -> i64 {
    14
}

fn default_dedup_window_days() -> i64 {
    2
}

fn default_merge_adjacency_days() -> i64 {
    1
}

fn default_present_override_strength() -> f64 {
    0.7
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            gap_threshold_days: default_gap_threshold_days(),
            dedup_window_days: default_dedup_window_days(),
            merge_adjacency_days: default_merge_adjacency_days(),
            present_override_strength: default_present_override_strength(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeBaseConfig {
    /// City named in gap notes
    #[serde(default = "default_home_base_city")]
    pub city: String,
    /// Cities from which a silent gap suggests a return home
    #[serde(default = "default_home_base_cities")]
    pub cities: Vec<String>,
}

fn default_home_base_city() -> String {
    "Barcelona".to_string()
}

fn default_home_base_cities() -> Vec<String> {
    [
        "Barcelona",
        "Madrid",
        "Paris",
        "London",
        "Rome",
        "Milan",
        "Berlin",
        "Amsterdam",
        "Brussels",
        "Lisbon",
        "Vienna",
        "Prague",
        "Budapest",
        "Zurich",
        "Geneva",
        "Copenhagen",
        "Stockholm",
        "Oslo",
        "Helsinki",
        "Dublin",
        "Edinburgh",
        "Athens",
        "Istanbul",
        "Warsaw",
        "Bordeaux",
        "Malaga",
        "Palma de Mallorca",
        "Fuerteventura",
        "Frankfurt",
        "Munich",
        "Hamburg",
        "Moscow",
        "Minsk",
        "St. Petersburg",
        "Tel Aviv",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl Default for HomeBaseConfig {
    fn default() -> Self {
        Self { city: default_home_base_city(), cities: default_home_base_cities() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TravelerConfig {
    /// Full name of the traveler; empty keeps every event
    #[serde(default)]
    pub name: String,
    /// Groups of interchangeable first names, e.g. ["matthew", "matt"]
    #[serde(default)]
    pub first_name_variants: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Drop events whose subject reads like a cancellation or refund
    #[serde(default = "default_skip_cancellations")]
    pub skip_cancellations: bool,
}

fn default_skip_cancellations() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { skip_cancellations: default_skip_cancellations() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// Directory receiving itinerary.json and travel_events.jsonl
    #[serde(default = "default_egress_dir")]
    pub dir: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { dir: default_egress_dir() }
    }
}

fn default_egress_dir() -> String {
    "output".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub home_base: HomeBaseConfig,
    #[serde(default)]
    pub traveler: TravelerConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub egress: EgressConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    gap_threshold_days: i64,
    dedup_window_days: i64,
    merge_adjacency_days: i64,
    present_override_strength: f64,
    home_base: String,
    home_base_cities: Vec<String>,
    traveler_name: String,
    first_name_variants: Vec<Vec<String>>,
    skip_cancellations: bool,
    egress_dir: String,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        // Variant matching is case-insensitive; store lowercase once
        let first_name_variants = toml_config
            .traveler
            .first_name_variants
            .into_iter()
            .map(|group| group.into_iter().map(|n| n.trim().to_lowercase()).collect())
            .collect();

        Self {
            gap_threshold_days: toml_config.assembly.gap_threshold_days,
            dedup_window_days: toml_config.assembly.dedup_window_days,
            merge_adjacency_days: toml_config.assembly.merge_adjacency_days,
            present_override_strength: toml_config.assembly.present_override_strength,
            home_base: toml_config.home_base.city,
            home_base_cities: toml_config.home_base.cities,
            traveler_name: toml_config.traveler.name.trim().to_string(),
            first_name_variants,
            skip_cancellations: toml_config.input.skip_cancellations,
            egress_dir: toml_config.egress.dir,
            config_file,
        }
    }

    /// Determine config file path: explicit `--config`, then `CONFIG_FILE`,
    /// then the default path
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            if !path.is_empty() {
                return path;
            }
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration using `--config`, `CONFIG_FILE`, or the default path
    pub fn load(cli_path: Option<&str>) -> Self {
        Self::load_from_path(Self::resolve_config_path(cli_path))
    }

    /// Check if a city counts as a plausible home base for gap notes
    pub fn is_home_base_city(&self, city: &str) -> bool {
        let city = city.to_lowercase();
        self.home_base_cities.iter().any(|c| c.to_lowercase() == city)
    }

    /// Interchangeable spellings of a first name, including itself
    pub fn first_name_variants(&self, first_name: &str) -> Vec<String> {
        let first_name = first_name.to_lowercase();
        self.first_name_variants
            .iter()
            .find(|group| group.contains(&first_name))
            .cloned()
            .unwrap_or_else(|| vec![first_name])
    }

    // Getters for all config fields
    pub fn gap_threshold_days(&self) -> i64 {
        self.gap_threshold_days
    }

    pub fn dedup_window_days(&self) -> i64 {
        self.dedup_window_days
    }

    pub fn merge_adjacency_days(&self) -> i64 {
        self.merge_adjacency_days
    }

    pub fn present_override_strength(&self) -> f64 {
        self.present_override_strength
    }

    pub fn home_base(&self) -> &str {
        &self.home_base
    }

    pub fn home_base_cities(&self) -> &[String] {
        &self.home_base_cities
    }

    pub fn traveler_name(&self) -> &str {
        &self.traveler_name
    }

    pub fn skip_cancellations(&self) -> bool {
        self.skip_cancellations
    }

    pub fn egress_dir(&self) -> &str {
        &self.egress_dir
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method to set the gap threshold
    pub fn with_gap_threshold_days(mut self, days: i64) -> Self {
        self.gap_threshold_days = days;
        self
    }

    /// Builder method to set the dedup window
    pub fn with_dedup_window_days(mut self, days: i64) -> Self {
        self.dedup_window_days = days;
        self
    }

    pub fn with_merge_adjacency_days(mut self, days: i64) -> Self {
        self.merge_adjacency_days = days;
        self
    }

    pub fn with_present_override_strength(mut self, strength: f64) -> Self {
        self.present_override_strength = strength;
        self
    }

    /// Builder method to replace the home base and its city set
    pub fn with_home_base(mut self, city: &str, cities: &[&str]) -> Self {
        self.home_base = city.to_string();
        self.home_base_cities = cities.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Builder method to set the traveler name (CLI override)
    pub fn with_traveler_name(mut self, name: &str) -> Self {
        self.traveler_name = name.trim().to_string();
        self
    }

    /// Builder method to add a group of interchangeable first names
    pub fn with_first_name_variants(mut self, group: &[&str]) -> Self {
        self.first_name_variants.push(group.iter().map(|n| n.trim().to_lowercase()).collect());
        self
    }

    /// Builder method to set the egress directory (CLI override)
    pub fn with_egress_dir(mut self, dir: &str) -> Self {
        self.egress_dir = dir.to_string();
        self
    }

    pub fn with_skip_cancellations(mut self, skip: bool) -> Self {
        self.skip_cancellations = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gap_threshold_days(), 14);
        assert_eq!(config.dedup_window_days(), 2);
        assert_eq!(config.merge_adjacency_days(), 1);
        assert_eq!(config.present_override_strength(), 0.7);
        assert_eq!(config.home_base(), "Barcelona");
        assert!(config.traveler_name().is_empty());
        assert!(config.skip_cancellations());
        assert_eq!(config.egress_dir(), "output");
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_is_home_base_city() {
        let config = Config::default();
        assert!(config.is_home_base_city("Barcelona"));
        assert!(config.is_home_base_city("paris"));
        assert!(!config.is_home_base_city("Tokyo"));
    }

    #[test]
    fn test_first_name_variants() {
        let mut toml_config = TomlConfig::default();
        toml_config.traveler.first_name_variants =
            vec![vec!["Matthew".to_string(), "Matt".to_string()]];
        let config = Config::from_toml(toml_config, "test".to_string());

        assert_eq!(config.first_name_variants("MATT"), vec!["matthew", "matt"]);
        assert_eq!(config.first_name_variants("Anna"), vec!["anna"]);
    }

    #[test]
    fn test_resolve_config_path_prefers_cli() {
        assert_eq!(Config::resolve_config_path(Some("config/trip.toml")), "config/trip.toml");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_config: TomlConfig = toml::from_str("[assembly]\ngap_threshold_days = 21\n").unwrap();
        let config = Config::from_toml(toml_config, "inline".to_string());

        assert_eq!(config.gap_threshold_days(), 21);
        assert_eq!(config.dedup_window_days(), 2);
        assert!(config.is_home_base_city("Lisbon"));
    }

    #[test]
    fn test_egress_dir_default() {
        let egress = EgressConfig::default();
        assert_eq!(egress.dir, "output");
        assert!(!egress.dir.is_empty());
    }
}
