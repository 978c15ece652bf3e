//! Pokémon server: species facts, evolutions, moves and stat comparisons from
//! PokeAPI. No API key is needed.

use futures::future::join_all;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};

use super::api::{upstream_result, ApiClient};
use super::string_arg;
use crate::config::PokemonConfig;
use crate::ServerError;
use capability_core::protocol::{McpInputSchema, McpTool, ToolCallResult};
use capability_core::{CapabilityRegistry, RouterError};

/// PokeAPI v2 root
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Highest national dex number the random pick draws from
pub const MAX_POKEMON_ID: u32 = 1010;

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 50;

#[derive(Debug, Deserialize)]
pub struct NamedRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedRef,
}

#[derive(Debug, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedRef,
}

#[derive(Debug, Deserialize)]
pub struct BaseStat {
    pub base_stat: u32,
    pub stat: NamedRef,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveSlot {
    #[serde(rename = "move")]
    pub kind: NamedRef,
    #[serde(default)]
    pub version_group_details: Vec<MoveLearning>,
}

#[derive(Debug, Deserialize)]
pub struct MoveLearning {
    pub level_learned_at: u32,
    pub move_learn_method: NamedRef,
}

#[derive(Debug, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Decimetres
    pub height: u32,
    /// Hectograms
    pub weight: u32,
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub stats: Vec<BaseStat>,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub moves: Vec<MoveSlot>,
}

impl Pokemon {
    fn stat_total(&self) -> u32 {
        self.stats.iter().map(|s| s.base_stat).sum()
    }

    fn stat(&self, name: &str) -> Option<u32> {
        self.stats
            .iter()
            .find(|s| s.stat.name == name)
            .map(|s| s.base_stat)
    }
}

#[derive(Debug, Deserialize)]
pub struct Species {
    pub evolution_chain: ChainRef,
}

#[derive(Debug, Deserialize)]
pub struct ChainRef {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct EvolutionChain {
    pub chain: ChainLink,
}

#[derive(Debug, Deserialize)]
pub struct ChainLink {
    pub species: NamedRef,
    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetail>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Deserialize)]
pub struct EvolutionDetail {
    pub min_level: Option<u32>,
    pub trigger: Option<NamedRef>,
}

#[derive(Debug, Deserialize)]
pub struct TypeListing {
    pub pokemon: Vec<TypeMember>,
}

#[derive(Debug, Deserialize)]
pub struct TypeMember {
    pub pokemon: NamedRef,
}

/// One entry of a type search
#[derive(Debug, Clone, PartialEq)]
pub struct TypeEntry {
    pub id: u32,
    pub name: String,
    pub sprite: Option<String>,
}

/// PokeAPI client
pub struct PokemonService {
    api: ApiClient,
}

impl PokemonService {
    pub fn new(config: PokemonConfig) -> Result<Self, ServerError> {
        Ok(Self {
            api: ApiClient::new(config.base_url, config.timeout)?,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServerError> {
        debug!("PokeAPI request: {}", path);
        let body = self.api.get_json(path, &[]).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn pokemon(&self, name_or_id: &str) -> Result<Pokemon, ServerError> {
        self.fetch(&format!("/pokemon/{}", name_or_id.trim().to_lowercase()))
            .await
    }

    /// Evolution chain of a species, resolved through the species record
    pub async fn evolution_chain(&self, species: &str) -> Result<EvolutionChain, ServerError> {
        let species: Species = self
            .fetch(&format!("/pokemon-species/{}", species.trim().to_lowercase()))
            .await?;
        let id = chain_id(&species.evolution_chain.url).ok_or_else(|| ServerError::Upstream {
            status: 502,
            body: format!("unexpected evolution chain url {}", species.evolution_chain.url),
        })?;
        self.fetch(&format!("/evolution-chain/{}", id)).await
    }

    /// Up to `limit` Pokémon of a type, sorted by id. Entries that fail to
    /// load are skipped.
    pub async fn by_type(&self, kind: &str, limit: usize) -> Result<Vec<TypeEntry>, ServerError> {
        let listing: TypeListing = self
            .fetch(&format!("/type/{}", kind.trim().to_lowercase()))
            .await?;

        let lookups = listing
            .pokemon
            .iter()
            .take(limit)
            .map(|member| self.pokemon(&member.pokemon.name));
        let mut entries: Vec<TypeEntry> = join_all(lookups)
            .await
            .into_iter()
            .filter_map(|loaded| match loaded {
                Ok(pokemon) => Some(TypeEntry {
                    id: pokemon.id,
                    name: title_case(&pokemon.name),
                    sprite: pokemon.sprites.front_default,
                }),
                Err(e) => {
                    warn!("Skipping {} Pokémon entry: {}", kind, e);
                    None
                }
            })
            .collect();
        entries.sort_by_key(|entry| entry.id);
        Ok(entries)
    }
}

/// Build the Pokémon server's registry
pub fn registry(config: PokemonConfig) -> Result<CapabilityRegistry, ServerError> {
    let service = Arc::new(PokemonService::new(config)?);
    let mut registry = CapabilityRegistry::new();

    let limit_schema = json!({
        "type": "integer",
        "minimum": 1,
        "maximum": MAX_LIMIT,
        "description": "Maximum entries to return (default 10)",
    });

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_pokemon_info", "Types, abilities, stats and sprites of a Pokémon")
            .with_schema(McpInputSchema::default().property(
                "name_or_id",
                json!({"type": "string", "description": "Name or national dex number, e.g. pikachu or 25"}),
                true,
            )),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let name = string_arg(&args, "name_or_id")?;
                let loaded = service.pokemon(name).await;
                upstream_result(not_found(loaded, "Pokémon", name, |p| render_info(&p)))
            }
        },
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("search_pokemon_by_type", "Pokémon of one type, e.g. fire or water")
            .with_schema(
                McpInputSchema::default()
                    .property(
                        "pokemon_type",
                        json!({"type": "string", "description": "Type name"}),
                        true,
                    )
                    .property("limit", limit_schema.clone(), false),
            ),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let kind = string_arg(&args, "pokemon_type")?;
                let limit = limit_arg(&args)?;
                let loaded = service.by_type(kind, limit).await;
                upstream_result(not_found(loaded, "Type", kind, |entries| {
                    render_type_search(kind, &entries)
                }))
            }
        },
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_pokemon_evolution_chain", "Full evolution chain of a Pokémon")
            .with_schema(McpInputSchema::default().property(
                "pokemon_name",
                json!({"type": "string", "description": "Species name"}),
                true,
            )),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let name = string_arg(&args, "pokemon_name")?;
                let loaded = service.evolution_chain(name).await;
                upstream_result(not_found(loaded, "Species", name, |chain| {
                    render_evolution(name, &chain.chain)
                }))
            }
        },
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("compare_pokemon_stats", "Compare the base stats of two Pokémon").with_schema(
            McpInputSchema::default()
                .property(
                    "pokemon1",
                    json!({"type": "string", "description": "Name or id of the first Pokémon"}),
                    true,
                )
                .property(
                    "pokemon2",
                    json!({"type": "string", "description": "Name or id of the second Pokémon"}),
                    true,
                ),
        ),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let first = string_arg(&args, "pokemon1")?;
                let second = string_arg(&args, "pokemon2")?;
                let compared = match tokio::join!(service.pokemon(first), service.pokemon(second)) {
                    (Ok(a), Ok(b)) => Ok(ToolCallResult::text(render_comparison(&a, &b))),
                    (Err(e), _) => lookup_failure(e, "Pokémon", first),
                    (_, Err(e)) => lookup_failure(e, "Pokémon", second),
                };
                upstream_result(compared)
            }
        },
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_pokemon_moves", "Moves a Pokémon can learn").with_schema(
            McpInputSchema::default()
                .property(
                    "pokemon_name",
                    json!({"type": "string", "description": "Name or id"}),
                    true,
                )
                .property("limit", limit_schema, false),
        ),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let name = string_arg(&args, "pokemon_name")?;
                let limit = limit_arg(&args)?;
                let loaded = service.pokemon(name).await;
                upstream_result(not_found(loaded, "Pokémon", name, |p| render_moves(&p, limit)))
            }
        },
    )?;

    let svc = service;
    registry.register_tool(
        McpTool::new("get_random_pokemon", "A randomly chosen Pokémon"),
        move |_args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let id = rand::thread_rng().gen_range(1..=MAX_POKEMON_ID).to_string();
                let loaded = service.pokemon(&id).await;
                upstream_result(not_found(loaded, "Pokémon", &id, |p| render_info(&p)))
            }
        },
    )?;

    Ok(registry)
}

/// Render a successful lookup; a 404 becomes a readable error result
fn not_found<T>(
    loaded: Result<T, ServerError>,
    what: &str,
    name: &str,
    render: impl FnOnce(T) -> String,
) -> Result<ToolCallResult, ServerError> {
    match loaded {
        Ok(value) => Ok(ToolCallResult::text(render(value))),
        Err(e) => lookup_failure(e, what, name),
    }
}

fn lookup_failure(
    error: ServerError,
    what: &str,
    name: &str,
) -> Result<ToolCallResult, ServerError> {
    match error {
        ServerError::Upstream { status: 404, .. } => Ok(ToolCallResult::error(format!(
            "{} '{}' not found",
            what, name
        ))),
        e => Err(e),
    }
}

fn limit_arg(args: &Map<String, Value>) -> Result<usize, RouterError> {
    match args.get("limit") {
        None | Some(Value::Null) => Ok(DEFAULT_LIMIT as usize),
        Some(value) => value
            .as_u64()
            .filter(|limit| (1..=MAX_LIMIT).contains(limit))
            .map(|limit| limit as usize)
            .ok_or_else(|| {
                RouterError::InvalidParams(format!(
                    "Argument 'limit' must be an integer between 1 and {}",
                    MAX_LIMIT
                ))
            }),
    }
}

/// Numeric id at the end of a PokeAPI resource url
fn chain_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// `special-attack` -> `Special Attack`
fn title_case(name: &str) -> String {
    name.split(['-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn joined<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<String> = names.map(title_case).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

pub fn render_info(pokemon: &Pokemon) -> String {
    let mut text = format!(
        "{} (#{})\n\
         Types: {}\n\
         Abilities: {}\n\
         Height: {:.1} m\n\
         Weight: {:.1} kg\n\
         Base experience: {}\n\
         \nBase stats:",
        title_case(&pokemon.name),
        pokemon.id,
        joined(pokemon.types.iter().map(|t| t.kind.name.as_str())),
        joined(pokemon.abilities.iter().map(|a| a.ability.name.as_str())),
        f64::from(pokemon.height) / 10.0,
        f64::from(pokemon.weight) / 10.0,
        pokemon
            .base_experience
            .map(|xp| xp.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    );
    for stat in &pokemon.stats {
        let _ = write!(text, "\n  {}: {}", title_case(&stat.stat.name), stat.base_stat);
    }
    let _ = write!(text, "\n  Total: {}", pokemon.stat_total());
    if let Some(sprite) = &pokemon.sprites.front_default {
        let _ = write!(text, "\n\nSprite: {}", sprite);
    }
    if let Some(shiny) = &pokemon.sprites.front_shiny {
        let _ = write!(text, "\nShiny sprite: {}", shiny);
    }
    text
}

pub fn render_type_search(kind: &str, entries: &[TypeEntry]) -> String {
    let mut text = format!("{} type Pokémon ({} found)\n", title_case(kind), entries.len());
    for entry in entries {
        let _ = write!(text, "\n#{} {}", entry.id, entry.name);
        if let Some(sprite) = &entry.sprite {
            let _ = write!(text, "\n   Sprite: {}", sprite);
        }
    }
    text.trim_end().to_string()
}

pub fn render_evolution(name: &str, chain: &ChainLink) -> String {
    let mut text = format!("Evolution chain of {}\n", title_case(name));
    evolution_step(&mut text, chain, 0);
    text.trim_end().to_string()
}

fn evolution_step(text: &mut String, link: &ChainLink, depth: usize) {
    let _ = write!(text, "\n{}{}", "  ".repeat(depth), title_case(&link.species.name));
    if let Some(detail) = link.evolution_details.first() {
        let trigger = detail
            .trigger
            .as_ref()
            .map(|t| title_case(&t.name))
            .unwrap_or_else(|| "Unknown".to_string());
        match detail.min_level {
            Some(level) => {
                let _ = write!(text, " ({}, level {})", trigger, level);
            }
            None => {
                let _ = write!(text, " ({})", trigger);
            }
        }
    }
    for next in &link.evolves_to {
        evolution_step(text, next, depth + 1);
    }
}

pub fn render_comparison(a: &Pokemon, b: &Pokemon) -> String {
    let name_a = title_case(&a.name);
    let name_b = title_case(&b.name);
    let mut text = format!("{} (#{}) vs {} (#{})\n", name_a, a.id, name_b, b.id);

    for stat in &a.stats {
        let left = stat.base_stat;
        let right = b.stat(&stat.stat.name).unwrap_or_default();
        let _ = write!(
            text,
            "\n{}: {} vs {} -> {}",
            title_case(&stat.stat.name),
            left,
            right,
            winner(left, right, &name_a, &name_b)
        );
    }

    let (total_a, total_b) = (a.stat_total(), b.stat_total());
    let _ = write!(
        text,
        "\n\nTotal: {} vs {} -> {}",
        total_a,
        total_b,
        winner(total_a, total_b, &name_a, &name_b)
    );
    text
}

fn winner<'a>(left: u32, right: u32, name_a: &'a str, name_b: &'a str) -> &'a str {
    match left.cmp(&right) {
        std::cmp::Ordering::Greater => name_a,
        std::cmp::Ordering::Less => name_b,
        std::cmp::Ordering::Equal => "Tie",
    }
}

pub fn render_moves(pokemon: &Pokemon, limit: usize) -> String {
    let shown = pokemon.moves.len().min(limit);
    let mut text = format!(
        "Moves of {} ({} of {})\n",
        title_case(&pokemon.name),
        shown,
        pokemon.moves.len()
    );
    for slot in pokemon.moves.iter().take(limit) {
        let _ = write!(text, "\n{}", title_case(&slot.kind.name));
        if let Some(learning) = slot.version_group_details.first() {
            let _ = write!(text, " - {}", title_case(&learning.move_learn_method.name));
            if learning.level_learned_at > 0 {
                let _ = write!(text, " at level {}", learning.level_learned_at);
            }
        }
    }
    text.trim_end().to_string()
}
