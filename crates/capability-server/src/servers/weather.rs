//! Weather server: current conditions and five-day forecasts for Colombian
//! cities from OpenWeatherMap

use chrono::{DateTime, FixedOffset, NaiveDate};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

use super::api::{upstream_result, ApiClient};
use super::colombia::{self, City, Region, CITIES};
use super::{arg, string_arg};
use crate::config::WeatherConfig;
use crate::ServerError;
use capability_core::protocol::{
    GetPromptResult, McpInputSchema, McpPrompt, McpResource, McpTool, PromptMessage,
    ResourceContents, ToolCallResult,
};
use capability_core::{CapabilityRegistry, RouterError};

/// OpenWeatherMap API root
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Colombia does not observe daylight saving time
const COLOMBIA_UTC_OFFSET_SECS: i32 = -5 * 3600;

#[derive(Debug, Deserialize)]
pub struct CurrentWeather {
    pub weather: Vec<Condition>,
    pub main: Readings,
    pub wind: Option<Wind>,
    pub clouds: Option<Clouds>,
    pub visibility: Option<u32>,
    pub sys: Option<Sun>,
    pub dt: i64,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct Readings {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u32,
    pub pressure: u32,
}

#[derive(Debug, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Clouds {
    pub all: u32,
}

#[derive(Debug, Deserialize)]
pub struct Sun {
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Deserialize)]
pub struct Forecast {
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: Readings,
    pub weather: Vec<Condition>,
}

/// OpenWeatherMap client bound to one API key
pub struct WeatherService {
    api: ApiClient,
    api_key: Option<String>,
}

impl WeatherService {
    pub fn new(config: WeatherConfig) -> Result<Self, ServerError> {
        Ok(Self {
            api: ApiClient::new(config.base_url, config.timeout)?,
            api_key: config.api_key,
        })
    }

    /// Current conditions at a city
    pub async fn current(&self, city: &City) -> Result<CurrentWeather, ServerError> {
        self.fetch("weather", city).await
    }

    /// Five-day forecast in three-hour steps
    pub async fn forecast(&self, city: &City) -> Result<Forecast, ServerError> {
        self.fetch("forecast", city).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, city: &City) -> Result<T, ServerError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ServerError::Config("OpenWeatherMap API key not configured".to_string())
        })?;

        debug!("Fetching {} for {}", path, city.key);
        let query = [
            ("lat", city.lat.to_string()),
            ("lon", city.lon.to_string()),
            ("appid", api_key.to_string()),
            ("units", "metric".to_string()),
        ];
        let body = self.api.get_json(path, &query).await?;
        Ok(serde_json::from_value(body)?)
    }
}

/// Build the weather server's registry
pub fn registry(config: WeatherConfig) -> Result<CapabilityRegistry, ServerError> {
    let service = Arc::new(WeatherService::new(config)?);
    let mut registry = CapabilityRegistry::new();

    let city_schema = || {
        McpInputSchema::default().property(
            "city",
            json!({
                "type": "string",
                "description": "Colombian city",
                "enum": colombia::city_keys(),
            }),
            true,
        )
    };

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_weather", "Current weather for a Colombian city")
            .with_schema(city_schema()),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let city = colombia::require_city(string_arg(&args, "city")?)?;
                upstream_result(
                    service
                        .current(city)
                        .await
                        .map(|weather| ToolCallResult::text(render_current(city, &weather))),
                )
            }
        },
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_forecast", "Five-day weather forecast for a Colombian city")
            .with_schema(city_schema()),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let city = colombia::require_city(string_arg(&args, "city")?)?;
                upstream_result(
                    service
                        .forecast(city)
                        .await
                        .map(|forecast| ToolCallResult::text(render_forecast(city, &forecast))),
                )
            }
        },
    )?;

    let svc = service;
    registry.register_tool(
        McpTool::new(
            "get_multiple_cities_weather",
            "Compare the current weather of several Colombian cities",
        )
        .with_schema(McpInputSchema::default().property(
            "cities",
            json!({
                "type": "array",
                "items": {"type": "string", "enum": colombia::city_keys()},
                "description": "Cities to compare",
            }),
            true,
        )),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move { compare_cities(&service, &args).await }
        },
    )?;

    registry.register_resource(
        McpResource::new("colombia://cities", "Colombian cities")
            .with_description("Cities available for weather queries, with coordinates")
            .with_mime_type("application/json"),
        |uri: String| async move {
            let cities: Map<String, Value> = CITIES
                .iter()
                .map(|c| (c.key.to_string(), json!({"name": c.name, "lat": c.lat, "lon": c.lon})))
                .collect();
            let text = serde_json::to_string_pretty(&cities)?;
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "application/json", text)])
        },
    )?;

    registry.register_resource(
        McpResource::new("colombia://regions", "Regions of Colombia")
            .with_description("Cities grouped by natural region")
            .with_mime_type("text/plain"),
        |uri: String| async move {
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "text/plain", regions_text())])
        },
    )?;

    registry.register_prompt(
        McpPrompt::new("weather_report", "Detailed weather report for a Colombian city")
            .argument("city", "Colombian city", true),
        weather_report,
    )?;
    registry.register_prompt(
        McpPrompt::new(
            "travel_weather_advice",
            "Travel advice based on the weather of several cities",
        )
        .argument("cities", "Comma-separated list of cities", true),
        travel_weather_advice,
    )?;

    Ok(registry)
}

async fn compare_cities(
    service: &WeatherService,
    args: &Map<String, Value>,
) -> anyhow::Result<ToolCallResult> {
    let names = args
        .get("cities")
        .and_then(Value::as_array)
        .filter(|cities| !cities.is_empty())
        .ok_or_else(|| {
            RouterError::InvalidParams("Argument 'cities' must be a non-empty array".to_string())
        })?;

    let lookups = names.iter().map(|name| async move {
        let name = name.as_str().unwrap_or_default();
        match colombia::city(name) {
            Some(city) => (name, Some(city), Some(service.current(city).await)),
            None => (name, None, None),
        }
    });

    let mut text = String::from("Weather comparison across Colombia:\n\n");
    for (name, city, weather) in join_all(lookups).await {
        match (city, weather) {
            (Some(city), Some(Ok(weather))) => {
                let _ = writeln!(
                    text,
                    "{}:\n  {}°C ({})\n  Humidity: {}%\n  Wind: {}\n",
                    city.name,
                    weather.main.temp,
                    describe(&weather.weather),
                    weather.main.humidity,
                    weather
                        .wind
                        .as_ref()
                        .map(|w| format!("{} m/s", w.speed))
                        .unwrap_or_else(|| "N/A".to_string()),
                );
            }
            (Some(city), Some(Err(e))) => {
                let _ = writeln!(text, "{}: Error - {}\n", city.name, e);
            }
            _ => {
                let _ = writeln!(text, "{}: Error - city not found\n", name);
            }
        }
    }

    Ok(ToolCallResult::text(text.trim_end()))
}

async fn weather_report(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let city = colombia::require_city(arg(&args, "city").unwrap_or_default())?;
    let text = format!(
        "Write a detailed report of the current weather in {}, Colombia. Include temperature, \
         humidity, current conditions and recommendations for outdoor activities.",
        city.name
    );
    Ok(GetPromptResult::new(
        Some(format!("Weather report for {}", city.name)),
        vec![PromptMessage::user(text)],
    ))
}

async fn travel_weather_advice(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let cities = arg(&args, "cities").unwrap_or_default();
    let text = format!(
        "Compare the current weather in the following Colombian cities: {}. Give travel advice \
         and recommend what to pack for each destination.",
        cities
    );
    Ok(GetPromptResult::new(None, vec![PromptMessage::user(text)]))
}

fn regions_text() -> String {
    let mut text = String::from("Regions of Colombia:\n");
    for region in Region::ALL {
        let cities: Vec<&str> = region.cities().map(|c| c.name).collect();
        if !cities.is_empty() {
            let _ = writeln!(text, "- {}: {}", region, cities.join(", "));
        }
    }
    text.push_str("\nEach region has its own climate, shaped by location and altitude.");
    text
}

fn describe(conditions: &[Condition]) -> &str {
    conditions
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("unknown")
}

fn local_time(timestamp: i64) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(COLOMBIA_UTC_OFFSET_SECS)?;
    DateTime::from_timestamp(timestamp, 0).map(|t| t.with_timezone(&offset))
}

fn format_time(timestamp: i64, format: &str) -> String {
    local_time(timestamp)
        .map(|t| t.format(format).to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Human-readable current conditions
pub fn render_current(city: &City, weather: &CurrentWeather) -> String {
    let main = &weather.main;
    let mut text = format!(
        "Current weather in {}, Colombia:\n\n\
         Conditions:\n\
         - {}\n\
         - Temperature: {}°C (feels like {}°C)\n\
         - Min/Max: {}°C / {}°C\n\n\
         Humidity and pressure:\n\
         - Humidity: {}%\n\
         - Pressure: {} hPa\n",
        city.name,
        describe(&weather.weather),
        main.temp,
        main.feels_like,
        main.temp_min,
        main.temp_max,
        main.humidity,
        main.pressure,
    );

    if let Some(wind) = &weather.wind {
        let direction = wind
            .deg
            .map(|d| format!("{}°", d))
            .unwrap_or_else(|| "N/A".to_string());
        let _ = write!(text, "\nWind: {} m/s, direction {}\n", wind.speed, direction);
    }
    if let Some(clouds) = &weather.clouds {
        let _ = writeln!(text, "Cloud cover: {}%", clouds.all);
    }
    if let Some(visibility) = weather.visibility {
        let _ = writeln!(text, "Visibility: {:.1} km", f64::from(visibility) / 1000.0);
    }
    if let Some(sun) = &weather.sys {
        let _ = writeln!(
            text,
            "Sunrise: {}  Sunset: {}",
            format_time(sun.sunrise, "%H:%M"),
            format_time(sun.sunset, "%H:%M"),
        );
    }

    let _ = write!(
        text,
        "\nCoordinates: {}, {}\nLast update: {}\nWhat to wear: {}",
        city.lat,
        city.lon,
        format_time(weather.dt, "%Y-%m-%d %H:%M"),
        colombia::clothing_recommendation(main.temp, city.altitude),
    );
    text
}

/// Forecast grouped by local day: at most five days, four readings each
pub fn render_forecast(city: &City, forecast: &Forecast) -> String {
    let mut days: BTreeMap<NaiveDate, Vec<&ForecastEntry>> = BTreeMap::new();
    for entry in &forecast.list {
        if let Some(time) = local_time(entry.dt) {
            days.entry(time.date_naive()).or_default().push(entry);
        }
    }

    let mut text = format!("5-day forecast for {}, Colombia:\n", city.name);
    for (date, entries) in days.iter().take(5) {
        let _ = write!(text, "\n{}:\n", date.format("%A, %Y-%m-%d"));
        for entry in entries.iter().take(4) {
            let _ = writeln!(
                text,
                "  {}: {}, {}°C (humidity {}%)",
                format_time(entry.dt, "%H:%M"),
                describe(&entry.weather),
                entry.main.temp,
                entry.main.humidity,
            );
        }
    }
    text.trim_end().to_string()
}
