//! Cities server: travel facts about Colombian cities and regions, served
//! from the static table in [`super::colombia`]

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

use super::colombia::{self, City, Region, CITIES};
use super::{arg, string_arg};
use capability_core::protocol::{
    GetPromptResult, McpInputSchema, McpPrompt, McpResource, McpTool, PromptMessage,
    ResourceContents, ToolCallResult,
};
use capability_core::{CapabilityRegistry, RegistryError, RouterError};

/// Comparison aspects accepted by `compare_cities`
const CRITERIA: [&str; 4] = ["climate", "attractions", "gastronomy", "events"];

/// Traveller interests accepted by `plan_route`
const INTERESTS: [&str; 7] = [
    "culture",
    "nature",
    "gastronomy",
    "history",
    "adventure",
    "beach",
    "city",
];

const DEFAULT_TRIP_DAYS: u32 = 7;

/// Rough daily spend per city on the route, in USD
const DAILY_BUDGET_PER_CITY_USD: u32 = 50;

const TRAVEL_GUIDE: &str = "# Travel guide to Colombia

## When to go

### Dry season (December to March, July to August)
- Best for most kinds of travel
- Less rain across most of the country
- High season: expect higher prices

### Rainy season (April to June, September to November)
- Greener landscapes
- Fewer tourists and better prices
- Good for watching flora and fauna

## Documents
- Valid passport (foreign visitors)
- National ID card (Colombian citizens)
- Yellow fever vaccination certificate for some regions

## Safety
- Keep copies of important documents
- Do not show valuables
- Use official, recommended transport
- Check the current local situation before travelling

## Getting around
- **Plane**: connections between the main cities
- **Bus**: extensive and cheap network
- **Metro**: only in Medellín
- **Taxi and ride-hailing**: available in the main cities

## Money
- Colombian peso (COP)
- Credit cards widely accepted
- Carry cash for small purchases
";

/// Build the cities server's registry
pub fn registry() -> Result<CapabilityRegistry, RegistryError> {
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

    registry.register_tool(
        McpTool::new(
            "get_city_info",
            "Facts, attractions, food and events of a Colombian city",
        )
        .with_schema(city_schema()),
        get_city_info,
    )?;
    registry.register_tool(
        McpTool::new("get_attractions", "Main tourist attractions of a city")
            .with_schema(city_schema()),
        get_attractions,
    )?;
    registry.register_tool(
        McpTool::new(
            "plan_route",
            "Plan a trip across several Colombian cities with day ranges, activities and costs",
        )
        .with_schema(
            McpInputSchema::default()
                .property(
                    "cities",
                    json!({
                        "type": "array",
                        "items": {"type": "string", "enum": colombia::city_keys()},
                        "description": "Cities to visit, in order",
                    }),
                    true,
                )
                .property(
                    "duration",
                    json!({"type": "integer", "minimum": 1, "description": "Trip length in days (default 7)"}),
                    false,
                )
                .property(
                    "interests",
                    json!({
                        "type": "array",
                        "items": {"type": "string", "enum": INTERESTS},
                        "description": "Traveller interests",
                    }),
                    false,
                ),
        ),
        plan_route,
    )?;
    registry.register_tool(
        McpTool::new("compare_cities", "Compare Colombian cities side by side").with_schema(
            McpInputSchema::default()
                .property(
                    "cities",
                    json!({
                        "type": "array",
                        "items": {"type": "string", "enum": colombia::city_keys()},
                        "description": "At least two cities to compare",
                    }),
                    true,
                )
                .property(
                    "criteria",
                    json!({
                        "type": "array",
                        "items": {"type": "string", "enum": CRITERIA},
                        "description": "Aspects to compare (all when omitted)",
                    }),
                    false,
                ),
        ),
        compare_cities,
    )?;
    registry.register_tool(
        McpTool::new("get_regional_info", "Overview of a natural region of Colombia")
            .with_schema(McpInputSchema::default().property(
                "region",
                json!({
                    "type": "string",
                    "description": "Region of Colombia",
                    "enum": Region::ALL.iter().map(Region::name).collect::<Vec<_>>(),
                }),
                true,
            )),
        get_regional_info,
    )?;

    registry.register_resource(
        McpResource::new("colombia://cities/complete", "Complete city data")
            .with_description("Every city with coordinates, facts, attractions and events")
            .with_mime_type("application/json"),
        |uri: String| async move {
            let text = serde_json::to_string_pretty(CITIES)?;
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "application/json", text)])
        },
    )?;
    registry.register_resource(
        McpResource::new("colombia://regions", "Regions of Colombia")
            .with_description("Regions with their cities, landscape and economy")
            .with_mime_type("application/json"),
        |uri: String| async move {
            let text = serde_json::to_string_pretty(&regions())?;
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "application/json", text)])
        },
    )?;
    registry.register_resource(
        McpResource::new("colombia://travel-guide", "Travel guide to Colombia")
            .with_description("Seasons, documents, safety, transport and money")
            .with_mime_type("text/markdown"),
        |uri: String| async move {
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "text/markdown", TRAVEL_GUIDE)])
        },
    )?;
    registry.register_resource(
        McpResource::new("colombia://gastronomy", "Colombian food by region")
            .with_description("Typical dishes of each city, grouped by region")
            .with_mime_type("application/json"),
        |uri: String| async move {
            let text = serde_json::to_string_pretty(&gastronomy())?;
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "application/json", text)])
        },
    )?;

    registry.register_prompt(
        McpPrompt::new("travel_itinerary", "Detailed travel itinerary across Colombian cities")
            .argument("cities", "Cities to visit (comma-separated)", true)
            .argument("days", "Length of the trip in days", true)
            .argument("budget", "Approximate budget (low, medium, high)", false),
        travel_itinerary,
    )?;
    registry.register_prompt(
        McpPrompt::new("cultural_experience", "Authentic cultural experiences in a city")
            .argument("city", "Colombian city", true)
            .argument("interests", "Specific cultural interests", false),
        cultural_experience,
    )?;
    registry.register_prompt(
        McpPrompt::new("weather_travel_advice", "Travel advice based on the current weather")
            .argument("cities", "Cities to ask about", true)
            .argument("season", "Time of year of the trip", false),
        weather_travel_advice,
    )?;

    Ok(registry)
}

async fn get_city_info(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let city = colombia::require_city(string_arg(&args, "city")?)?;

    let mut text = format!(
        "{} - {}\n\n\
         Region: {}\n\
         Altitude: {} m above sea level\n\
         Population: {}\n\
         Founded: {}\n\
         {}\n",
        city.name,
        city.department,
        city.region,
        city.altitude,
        thousands(city.population),
        city.founded,
        city.description,
    );
    push_list(&mut text, "Main attractions", city.attractions);
    push_list(&mut text, "Typical food", city.gastronomy);
    push_list(&mut text, "Events and festivals", city.events);
    let _ = write!(
        text,
        "\nCoordinates: {}, {}\nTip: {}",
        city.lat, city.lon, city.recommendation
    );

    Ok(ToolCallResult::text(text))
}

async fn get_attractions(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let city = colombia::require_city(string_arg(&args, "city")?)?;

    let mut text = format!("Main attractions in {}:\n\n", city.name);
    for (index, attraction) in city.attractions.iter().enumerate() {
        let _ = writeln!(text, "{}. {}", index + 1, attraction);
    }
    let _ = write!(
        text,
        "\nRegion: {}\nBest time to visit: {}\nRecommended stay: {} days",
        city.region,
        city.region.best_time_to_visit(),
        city.recommended_days,
    );

    Ok(ToolCallResult::text(text))
}

async fn plan_route(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let names = string_list(&args, "cities")?;
    let (cities, unknown): (Vec<_>, Vec<_>) = names
        .iter()
        .map(|name| (*name, colombia::city(name)))
        .partition(|(_, city)| city.is_some());
    let cities: Vec<&City> = cities.into_iter().filter_map(|(_, city)| city).collect();
    if cities.is_empty() {
        return Err(RouterError::InvalidParams(format!(
            "No known cities in the route. Valid cities: {}",
            colombia::city_keys().join(", ")
        ))
        .into());
    }

    let duration = match args.get("duration") {
        None | Some(Value::Null) => DEFAULT_TRIP_DAYS,
        Some(value) => value
            .as_u64()
            .and_then(|days| u32::try_from(days).ok())
            .filter(|days| *days >= 1)
            .ok_or_else(|| {
                RouterError::InvalidParams(
                    "Argument 'duration' must be a positive integer".to_string(),
                )
            })?,
    };

    let interests = match args.get("interests") {
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            let interests = string_list(&args, "interests")?;
            if let Some(unknown) = interests.iter().find(|i| !INTERESTS.contains(*i)) {
                return Err(RouterError::InvalidParams(format!(
                    "Unknown interest: {}. Valid interests: {}",
                    unknown,
                    INTERESTS.join(", ")
                ))
                .into());
            }
            interests
        }
    };

    let unknown: Vec<&str> = unknown.into_iter().map(|(name, _)| name).collect();
    Ok(ToolCallResult::text(render_route(&cities, duration, &interests, &unknown)))
}

/// Day ranges per stop: an even split with the remainder on the last stop.
/// Every stop gets at least one day, so short trips run past `duration`.
fn split_days(stops: usize, duration: u32) -> Vec<(u32, u32)> {
    let per_stop = (duration / stops as u32).max(1);
    let mut ranges = Vec::with_capacity(stops);
    let mut day = 1;
    for index in 0..stops {
        let days = if index + 1 == stops {
            (duration + 1).saturating_sub(day).max(1)
        } else {
            per_stop
        };
        ranges.push((day, day + days - 1));
        day += days;
    }
    ranges
}

fn render_route(cities: &[&City], duration: u32, interests: &[&str], unknown: &[&str]) -> String {
    let mut text = format!("Route through Colombia ({} days)\n", duration);
    if !unknown.is_empty() {
        let _ = writeln!(text, "Skipped unknown cities: {}", unknown.join(", "));
    }

    let ranges = split_days(cities.len(), duration);
    for (index, (city, (first, last))) in cities.iter().zip(ranges).enumerate() {
        let days = if first == last {
            format!("day {}", first)
        } else {
            format!("days {}-{}", first, last)
        };
        let _ = write!(
            text,
            "\n## {} ({})\nRegion: {} | Altitude: {} m\n\nSuggested activities:\n",
            city.name, days, city.region, city.altitude
        );
        for line in activities(city, interests) {
            let _ = writeln!(text, "- {}", line);
        }
        push_list(&mut text, "Must-try food", &city.gastronomy[..city.gastronomy.len().min(3)]);
        if let Some(next) = cities.get(index + 1) {
            let _ = writeln!(
                text,
                "\nGetting to {}: intercity bus (about 8-12 hours) or domestic flight (1-2 hours)",
                next.name
            );
        }
    }

    let low = DAILY_BUDGET_PER_CITY_USD * cities.len() as u32 * duration;
    let _ = write!(
        text,
        "\nEstimated budget: ${}-{} USD (lodging, food and local transport)\nPacking: {}",
        low,
        low + low / 2,
        packing(cities)
    );
    text
}

/// Activity lines for a stop, picked by attraction keywords per interest
fn activities(city: &City, interests: &[&str]) -> Vec<String> {
    let wants = |interest: &str| interests.is_empty() || interests.iter().any(|i| *i == interest);
    let matching = |keywords: &[&str]| -> Vec<&'static str> {
        city.attractions
            .iter()
            .copied()
            .filter(|a| keywords.iter().any(|k| a.contains(k)))
            .take(2)
            .collect()
    };

    let mut lines = Vec::new();
    if wants("culture") {
        let picks = matching(&["Museo", "Teatro", "Centro Histórico"]);
        let picks = if picks.is_empty() {
            city.attractions.first().copied().unwrap_or_default().to_string()
        } else {
            picks.join(", ")
        };
        lines.push(format!("Culture: {}", picks));
    }
    if interests.contains(&"nature") {
        let picks = matching(&["Parque", "Cerro", "Jardín"]);
        let picks = if picks.is_empty() {
            "green spaces around the city".to_string()
        } else {
            picks.join(", ")
        };
        lines.push(format!("Nature: {}", picks));
    }
    if interests.contains(&"history") {
        let picks = matching(&["Histórico", "Castillo", "Catedral", "Iglesia", "Casa"]);
        if !picks.is_empty() {
            lines.push(format!("History: {}", picks.join(", ")));
        }
    }
    if interests.contains(&"beach") {
        let picks = matching(&["Playa", "Isla", "Tayrona", "Rodadero"]);
        if !picks.is_empty() {
            lines.push(format!("Beach: {}", picks.join(", ")));
        }
    }
    if wants("gastronomy") {
        lines.push(format!("Food: {}", city.gastronomy[..city.gastronomy.len().min(2)].join(", ")));
    }

    if lines.is_empty() {
        lines = city.attractions.iter().take(3).map(|a| a.to_string()).collect();
    }
    lines
}

fn packing(cities: &[&City]) -> String {
    let mut items = vec!["comfortable walking clothes"];
    if cities.iter().any(|c| c.region == Region::Caribe) {
        items.push("light beachwear and sunscreen");
    }
    if cities.iter().any(|c| c.region == Region::Andina) {
        items.push("warm layers for the nights and a rain jacket");
    }
    items.push("comfortable shoes, a camera and your documents in order");
    items.join(", ")
}

async fn compare_cities(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let cities = string_list(&args, "cities")?
        .into_iter()
        .map(colombia::require_city)
        .collect::<Result<Vec<&City>, _>>()?;
    if cities.len() < 2 {
        return Err(RouterError::InvalidParams(
            "At least two cities are needed for a comparison".to_string(),
        )
        .into());
    }

    let criteria = match args.get("criteria") {
        None | Some(Value::Null) => CRITERIA.to_vec(),
        Some(_) => {
            let criteria = string_list(&args, "criteria")?;
            if let Some(unknown) = criteria.iter().find(|c| !CRITERIA.contains(*c)) {
                return Err(RouterError::InvalidParams(format!(
                    "Unknown criterion: {}. Valid criteria: {}",
                    unknown,
                    CRITERIA.join(", ")
                ))
                .into());
            }
            criteria
        }
    };

    let mut text = String::from(
        "Comparison of Colombian cities\n\n\
         | City | Region | Altitude | Population |\n\
         |------|--------|----------|------------|\n",
    );
    for city in &cities {
        let _ = writeln!(
            text,
            "| {} | {} | {} m | {} |",
            city.name,
            city.region,
            city.altitude,
            thousands(city.population)
        );
    }

    for criterion in criteria {
        let _ = write!(text, "\n## {}\n", capitalize(criterion));
        for city in &cities {
            let detail = match criterion {
                "climate" => city.climate().to_string(),
                "attractions" => first_three(city.attractions),
                "gastronomy" => first_three(city.gastronomy),
                _ => first_three(city.events),
            };
            let _ = writeln!(text, "{}: {}", city.name, detail);
        }
    }

    Ok(ToolCallResult::text(text.trim_end()))
}

async fn get_regional_info(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let name = string_arg(&args, "region")?;
    let region = Region::parse(name)
        .ok_or_else(|| RouterError::InvalidParams(format!("Unknown region: {}", name)))?;

    let mut cities: Vec<&City> = region.cities().collect();
    let mut text = format!(
        "{} region of Colombia\n\n{}\nEconomy: {}\nBest time to visit: {}\n",
        region,
        region.characteristics(),
        region.economy(),
        region.best_time_to_visit(),
    );

    if cities.is_empty() {
        text.push_str("\nNone of the listed cities lies in this region.");
        return Ok(ToolCallResult::text(text));
    }

    cities.sort_by(|a, b| b.population.cmp(&a.population));
    text.push_str("\nCities by population:\n");
    for (index, city) in cities.iter().enumerate() {
        let _ = writeln!(text, "{}. {}: {}", index + 1, city.name, thousands(city.population));
    }

    let dishes = distinct(cities.iter().flat_map(|c| c.gastronomy.iter().copied()), 8);
    push_list(&mut text, "Regional food", &dishes);
    let events = distinct(cities.iter().flat_map(|c| c.events.iter().copied()), 6);
    push_list(&mut text, "Highlighted events", &events);

    Ok(ToolCallResult::text(text.trim_end()))
}

async fn travel_itinerary(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let cities = arg(&args, "cities").unwrap_or_default();
    let days = arg(&args, "days").unwrap_or_default();
    let budget = arg(&args, "budget").unwrap_or("medium");

    let text = format!(
        "Create a detailed {days}-day itinerary visiting these Colombian cities: {cities}. \
         Assume a {budget} budget. Include lodging, restaurants, main attractions, transport \
         between cities and day-by-day activities, plus packing advice for each destination's \
         climate."
    );
    Ok(GetPromptResult::new(
        Some(format!("{}-day itinerary", days)),
        vec![PromptMessage::user(text)],
    ))
}

async fn cultural_experience(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let city = arg(&args, "city").unwrap_or_default();
    let interests = arg(&args, "interests").unwrap_or("general culture");
    let name = colombia::city(city).map(|c| c.name).unwrap_or(city);

    let text = format!(
        "Recommend authentic cultural experiences in {name}, Colombia, focused on {interests}. \
         Include local festivals, traditions, historic sites, museums, typical food, crafts and \
         ways to connect with the local community, with opening hours, rough costs and tips."
    );
    Ok(GetPromptResult::new(None, vec![PromptMessage::user(text)]))
}

async fn weather_travel_advice(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let cities = arg(&args, "cities").unwrap_or_default();
    let season = arg(&args, "season").unwrap_or("current");

    let text = format!(
        "Give detailed travel advice based on the {season} weather for these Colombian cities: \
         {cities}. Cover what clothes to pack, the best activities for the weather, special \
         precautions and the best time to visit each destination. Also explain how the weather \
         can affect transport and outdoor activities."
    );
    Ok(GetPromptResult::new(None, vec![PromptMessage::user(text)]))
}

fn regions() -> Value {
    let regions: Map<String, Value> = Region::ALL
        .iter()
        .map(|region| {
            let cities: Vec<&str> = region.cities().map(|c| c.name).collect();
            (
                region.name().to_string(),
                json!({
                    "cities": cities,
                    "characteristics": region.characteristics(),
                    "economy": region.economy(),
                }),
            )
        })
        .collect();
    Value::Object(regions)
}

fn gastronomy() -> Value {
    let mut by_region = Map::new();
    for city in CITIES {
        let region = by_region
            .entry(city.region.name())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(cities) = region {
            cities.insert(city.name.to_string(), json!(city.gastronomy));
        }
    }
    Value::Object(by_region)
}

/// Required array-of-strings argument
fn string_list<'a>(
    args: &'a Map<String, Value>,
    name: &str,
) -> Result<Vec<&'a str>, RouterError> {
    args.get(name)
        .and_then(Value::as_array)
        .and_then(|items| items.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
        .ok_or_else(|| {
            RouterError::InvalidParams(format!("Argument '{}' must be an array of strings", name))
        })
}

fn push_list(text: &mut String, title: &str, items: &[&str]) {
    let _ = write!(text, "\n{}:\n", title);
    for item in items {
        let _ = writeln!(text, "- {}", item);
    }
}

fn first_three(items: &[&str]) -> String {
    items.iter().take(3).copied().collect::<Vec<_>>().join(", ")
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>, limit: usize) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen.truncate(limit);
    seen
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Group digits by thousands: 7500000 -> 7,500,000
fn thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use capability_core::{Content, Namespace, RequestRouter};
    use std::sync::Arc;

    fn router() -> RequestRouter {
        RequestRouter::new(Arc::new(registry().unwrap()))
    }

    async fn tool_text(name: &str, args: Value) -> String {
        match router().handle(Namespace::Tools, name, args).await.unwrap() {
            Content::Tool(result) => result.content[0].as_text().unwrap().to_string(),
            other => panic!("expected tool content, got {other:?}"),
        }
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(7_500_000), "7,500,000");
        assert_eq!(thousands(450_000), "450,000");
        assert_eq!(thousands(18), "18");
    }

    #[tokio::test]
    async fn test_city_info() {
        let text = tool_text("get_city_info", json!({"city": "medellin"})).await;
        assert!(text.starts_with("Medellín - Antioquia"), "{text}");
        assert!(text.contains("Population: 2,500,000"));
        assert!(text.contains("- Bandeja paisa"));
    }

    #[tokio::test]
    async fn test_compare_cities_with_selected_criteria() {
        let text = tool_text(
            "compare_cities",
            json!({"cities": ["cartagena", "pasto"], "criteria": ["gastronomy"]}),
        )
        .await;

        assert!(text.contains("| Cartagena | Caribe | 2 m | 1,000,000 |"), "{text}");
        assert!(text.contains("## Gastronomy"));
        assert!(!text.contains("## Climate"));
        assert!(text.contains("Pasto: Cuy asado, Hornado pastuso, Empanadas de añejo"));
    }

    #[tokio::test]
    async fn test_compare_needs_two_known_cities() {
        let router = router();

        let err = router
            .handle(Namespace::Tools, "compare_cities", json!({"cities": ["cali"]}))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidParams(_)));

        let err = router
            .handle(Namespace::Tools, "compare_cities", json!({"cities": ["cali", "quito"]}))
            .await
            .unwrap_err();
        assert!(err.message().starts_with("Unknown city: quito"), "{err}");
    }

    #[tokio::test]
    async fn test_regional_info_orders_by_population() {
        let text = tool_text("get_regional_info", json!({"region": "Caribe"})).await;
        let barranquilla = text.find("1. Barranquilla").unwrap();
        let santa_marta = text.find("3. Santa Marta").unwrap();
        assert!(barranquilla < santa_marta);
    }

    #[tokio::test]
    async fn test_region_without_listed_cities() {
        let text = tool_text("get_regional_info", json!({"region": "Amazónica"})).await;
        assert!(text.contains("None of the listed cities"), "{text}");
    }

    #[tokio::test]
    async fn test_gastronomy_resource_groups_by_region() {
        let content = router()
            .handle(Namespace::Resources, "colombia://gastronomy", Value::Null)
            .await
            .unwrap();
        let Content::Resource(result) = content else {
            panic!("expected resource content");
        };

        let text = result.contents[0].text.as_deref().unwrap();
        let data: Value = serde_json::from_str(text).unwrap();
        assert_eq!(data["Pacífica"]["Cali"][0], "Sancocho de gallina");
    }

    #[test]
    fn test_split_days() {
        assert_eq!(split_days(3, 7), vec![(1, 2), (3, 4), (5, 7)]);
        assert_eq!(split_days(1, 5), vec![(1, 5)]);
        // More stops than days: one day each
        assert_eq!(split_days(3, 2), vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[tokio::test]
    async fn test_plan_route_default_interests() {
        let text = tool_text(
            "plan_route",
            json!({"cities": ["bogota", "cartagena"], "duration": 6}),
        )
        .await;

        assert!(text.starts_with("Route through Colombia (6 days)"), "{text}");
        assert!(text.contains("## Bogotá (days 1-3)"));
        assert!(text.contains("## Cartagena (days 4-6)"));
        assert!(text.contains("Culture: Museo del Oro, Museo Botero"));
        assert!(text.contains("Getting to Cartagena:"));
        assert!(text.contains("Estimated budget: $600-900 USD"));
        assert!(text.contains("light beachwear and sunscreen"));
        assert!(text.contains("warm layers for the nights"));
    }

    #[tokio::test]
    async fn test_plan_route_skips_unknown_cities() {
        let text = tool_text(
            "plan_route",
            json!({"cities": ["quito", "cali"], "interests": ["nature"]}),
        )
        .await;

        assert!(text.contains("Skipped unknown cities: quito"), "{text}");
        assert!(text.contains("## Cali (days 1-7)"));
        assert!(text.contains("Nature: "));
        assert!(!text.contains("Culture: "));
        assert!(!text.contains("Getting to"));
    }

    #[tokio::test]
    async fn test_plan_route_rejects_bad_input() {
        let router = router();

        let err = router
            .handle(Namespace::Tools, "plan_route", json!({"cities": ["quito"]}))
            .await
            .unwrap_err();
        assert!(err.message().starts_with("No known cities in the route"), "{err}");

        let err = router
            .handle(
                Namespace::Tools,
                "plan_route",
                json!({"cities": ["cali"], "interests": ["shopping"]}),
            )
            .await
            .unwrap_err();
        assert!(err.message().starts_with("Unknown interest: shopping"), "{err}");
    }

    #[tokio::test]
    async fn test_travel_guide_resource_is_markdown() {
        let content = router()
            .handle(Namespace::Resources, "colombia://travel-guide", Value::Null)
            .await
            .unwrap();
        let Content::Resource(result) = content else {
            panic!("expected resource content");
        };

        assert_eq!(result.contents[0].mime_type.as_deref(), Some("text/markdown"));
        let text = result.contents[0].text.as_deref().unwrap();
        assert!(text.starts_with("# Travel guide to Colombia"));
        assert!(text.contains("**Metro**: only in Medellín"));
    }

    #[tokio::test]
    async fn test_weather_travel_advice_defaults_season() {
        let content = router()
            .handle(
                Namespace::Prompts,
                "weather_travel_advice",
                json!({"cities": "Bogotá, Cartagena"}),
            )
            .await
            .unwrap();
        let Content::Prompt(result) = content else {
            panic!("expected prompt content");
        };

        let text = result.messages[0].content.as_text().unwrap();
        assert!(text.contains("based on the current weather"), "{text}");
        assert!(text.contains("Bogotá, Cartagena"));
    }

    #[tokio::test]
    async fn test_itinerary_requires_days() {
        let err = router()
            .handle(Namespace::Prompts, "travel_itinerary", json!({"cities": "cali"}))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Missing required argument: days");
    }
}
