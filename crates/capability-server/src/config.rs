//! Server configuration
//!
//! Built once by the binary from command-line flags and handed to the
//! capability set being served.

use std::time::Duration;

use crate::servers::{movies, pokemon, weather};
use crate::ServerError;

/// Default timeout for provider API requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Which capability set a server process exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Profile {
    /// Arithmetic, echo and clock tools with sample resources and prompts
    #[default]
    Simple,
    /// Current weather and forecasts for Colombian cities (OpenWeatherMap)
    Weather,
    /// Facts, attractions and regions of Colombian cities
    Cities,
    /// Movie, TV and people search, credits and trends (TMDB)
    Movies,
    /// Species facts, evolutions and stat comparisons (PokeAPI)
    Pokemon,
}

impl Profile {
    /// Server name reported on initialize
    pub fn server_name(&self) -> &'static str {
        match self {
            Profile::Simple => "simple-capability-server",
            Profile::Weather => "weather-capability-server",
            Profile::Cities => "cities-capability-server",
            Profile::Movies => "movies-capability-server",
            Profile::Pokemon => "pokemon-capability-server",
        }
    }
}

/// Provider settings for the weather profile
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key; tools fail with a configuration error without it
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: weather::DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Provider settings for the movies profile
#[derive(Debug, Clone)]
pub struct MovieConfig {
    /// TMDB API key (v3 auth)
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for MovieConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: movies::DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Provider settings for the Pokémon profile; PokeAPI needs no key
#[derive(Debug, Clone)]
pub struct PokemonConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for PokemonConfig {
    fn default() -> Self {
        Self {
            base_url: pokemon::DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub profile: Profile,
    /// Serve HTTP on this port instead of stdio
    pub http_port: Option<u16>,
    pub weather: WeatherConfig,
    pub movies: MovieConfig,
    pub pokemon: PokemonConfig,
}

impl ServerConfig {
    /// Apply the provider overrides given on the command line to the
    /// selected profile
    pub fn with_provider(
        mut self,
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ServerError> {
        match self.profile {
            Profile::Weather => {
                apply(
                    &mut self.weather.api_key,
                    &mut self.weather.base_url,
                    &mut self.weather.timeout,
                    api_key,
                    base_url,
                    timeout,
                );
            }
            Profile::Movies => {
                apply(
                    &mut self.movies.api_key,
                    &mut self.movies.base_url,
                    &mut self.movies.timeout,
                    api_key,
                    base_url,
                    timeout,
                );
            }
            Profile::Pokemon => {
                if api_key.is_some() {
                    return Err(ServerError::Config(
                        "--api-key does not apply to the Pokemon profile".to_string(),
                    ));
                }
                if let Some(base_url) = base_url {
                    self.pokemon.base_url = base_url;
                }
                if let Some(timeout) = timeout {
                    self.pokemon.timeout = timeout;
                }
            }
            Profile::Simple | Profile::Cities => {
                if api_key.is_some() || base_url.is_some() {
                    return Err(ServerError::Config(format!(
                        "--api-key and --base-url do not apply to the {:?} profile",
                        self.profile
                    )));
                }
            }
        }
        Ok(self)
    }
}

fn apply(
    key: &mut Option<String>,
    url: &mut String,
    limit: &mut Duration,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
) {
    if let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) {
        *key = Some(api_key);
    }
    if let Some(base_url) = base_url {
        *url = base_url;
    }
    if let Some(timeout) = timeout {
        *limit = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_overrides_apply_to_selected_profile() {
        let config = ServerConfig {
            profile: Profile::Movies,
            ..Default::default()
        }
        .with_provider(
            Some("secret".to_string()),
            Some("http://localhost:9999".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(config.movies.api_key.as_deref(), Some("secret"));
        assert_eq!(config.movies.base_url, "http://localhost:9999");
        assert_eq!(config.movies.timeout, DEFAULT_TIMEOUT);
        assert!(config.weather.api_key.is_none());
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = ServerConfig {
            profile: Profile::Weather,
            ..Default::default()
        }
        .with_provider(Some("  ".to_string()), None, None)
        .unwrap();

        assert!(config.weather.api_key.is_none());
    }

    #[test]
    fn test_pokemon_takes_base_url_but_no_key() {
        let config = ServerConfig {
            profile: Profile::Pokemon,
            ..Default::default()
        }
        .with_provider(None, Some("http://localhost:8000/api/v2".to_string()), None)
        .unwrap();
        assert_eq!(config.pokemon.base_url, "http://localhost:8000/api/v2");

        let result = ServerConfig {
            profile: Profile::Pokemon,
            ..Default::default()
        }
        .with_provider(Some("k".to_string()), None, None);
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[test]
    fn test_api_key_rejected_for_offline_profiles() {
        let result = ServerConfig::default().with_provider(Some("k".to_string()), None, None);
        assert!(matches!(result, Err(ServerError::Config(_))));
    }
}
