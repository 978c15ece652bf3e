//! Movies server: TMDB search, details, credits, discovery and trends for
//! movies, TV shows and people

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

use super::api::{upstream_result, ApiClient};
use super::{arg, page_arg, string_arg};
use crate::config::MovieConfig;
use crate::ServerError;
use capability_core::protocol::{
    GetPromptResult, McpInputSchema, McpPrompt, McpTool, PromptMessage, ToolCallResult,
};
use capability_core::{CapabilityRegistry, RouterError};

/// TMDB v3 API root
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const MEDIA_TYPES: [&str; 4] = ["all", "movie", "tv", "person"];
const TIME_WINDOWS: [&str; 2] = ["day", "week"];
const SORT_ORDERS: [&str; 4] = [
    "popularity.desc",
    "release_date.desc",
    "vote_average.desc",
    "vote_count.desc",
];

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub total_results: u64,
    pub results: Vec<T>,
}

/// Search or listing entry; TV shows and people use `name` instead of `title`
#[derive(Debug, Deserialize)]
pub struct Summary {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub media_type: Option<String>,
    pub known_for_department: Option<String>,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub known_for: Vec<Summary>,
}

impl Summary {
    fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Untitled")
    }

    fn year(&self) -> &str {
        year(self.release_date.as_deref().or(self.first_air_date.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Named>,
    #[serde(default)]
    pub production_countries: Vec<Named>,
    #[serde(default)]
    pub production_companies: Vec<Named>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub homepage: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TvDetails {
    pub id: u64,
    pub name: String,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub genres: Vec<Named>,
    #[serde(default)]
    pub origin_country: Vec<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub networks: Vec<Named>,
    #[serde(default)]
    pub created_by: Vec<Named>,
    pub homepage: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonDetails {
    pub id: u64,
    pub name: String,
    pub popularity: Option<f64>,
    pub known_for_department: Option<String>,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub also_known_as: Vec<String>,
    pub profile_path: Option<String>,
    pub biography: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    pub character: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    pub job: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// What a search, listing or credits request is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Media {
    Movie,
    Tv,
    Person,
}

impl Media {
    fn path(self) -> &'static str {
        match self {
            Media::Movie => "movie",
            Media::Tv => "tv",
            Media::Person => "person",
        }
    }

    fn singular(self) -> &'static str {
        match self {
            Media::Movie => "movie",
            Media::Tv => "TV show",
            Media::Person => "person",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Media::Movie => "movies",
            Media::Tv => "TV shows",
            Media::Person => "people",
        }
    }
}

/// Filters of a discover request; unset filters are left out of the query
#[derive(Debug, Default)]
pub struct Discover {
    pub sort_by: Option<String>,
    pub year: Option<u64>,
    pub genre: Option<String>,
    pub with_cast: Option<String>,
    pub page: u64,
}

impl Discover {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", self.page.max(1).to_string())];
        if let Some(sort_by) = &self.sort_by {
            query.push(("sort_by", sort_by.clone()));
        }
        if let Some(year) = self.year {
            query.push(("year", year.to_string()));
        }
        if let Some(genre) = &self.genre {
            query.push(("with_genres", genre.clone()));
        }
        if let Some(with_cast) = &self.with_cast {
            query.push(("with_cast", with_cast.clone()));
        }
        query
    }
}

/// TMDB client bound to one API key
pub struct MovieService {
    api: ApiClient,
    api_key: Option<String>,
}

impl MovieService {
    pub fn new(config: MovieConfig) -> Result<Self, ServerError> {
        Ok(Self {
            api: ApiClient::new(config.base_url, config.timeout)?,
            api_key: config.api_key,
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ServerError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServerError::Config("TMDB API key not configured".to_string()))?;

        debug!("TMDB request: {}", path);
        let mut query = vec![("api_key", api_key.to_string())];
        query.extend(params.iter().cloned());
        let body = self.api.get_json(path, &query).await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn search(
        &self,
        media: Media,
        query: &str,
        page: u64,
    ) -> Result<Page<Summary>, ServerError> {
        self.fetch(
            &format!("/search/{}", media.path()),
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    pub async fn details(&self, movie_id: u64) -> Result<MovieDetails, ServerError> {
        self.fetch(&format!("/movie/{}", movie_id), &[]).await
    }

    pub async fn tv_details(&self, tv_id: u64) -> Result<TvDetails, ServerError> {
        self.fetch(&format!("/tv/{}", tv_id), &[]).await
    }

    pub async fn person_details(&self, person_id: u64) -> Result<PersonDetails, ServerError> {
        self.fetch(&format!("/person/{}", person_id), &[]).await
    }

    pub async fn credits(&self, media: Media, id: u64) -> Result<Credits, ServerError> {
        self.fetch(&format!("/{}/{}/credits", media.path(), id), &[])
            .await
    }

    pub async fn popular(&self, media: Media, page: u64) -> Result<Page<Summary>, ServerError> {
        self.fetch(
            &format!("/{}/popular", media.path()),
            &[("page", page.to_string())],
        )
        .await
    }

    pub async fn discover(&self, filters: &Discover) -> Result<Page<Summary>, ServerError> {
        self.fetch("/discover/movie", &filters.query()).await
    }

    pub async fn trending(
        &self,
        media_type: &str,
        time_window: &str,
    ) -> Result<Page<Summary>, ServerError> {
        self.fetch(&format!("/trending/{}/{}", media_type, time_window), &[])
            .await
    }
}

/// Build the movies server's registry
pub fn registry(config: MovieConfig) -> Result<CapabilityRegistry, ServerError> {
    let service = Arc::new(MovieService::new(config)?);
    let mut registry = CapabilityRegistry::new();

    register_search(&mut registry, &service, "search_movies", "Search movies by title", Media::Movie)?;
    register_search(&mut registry, &service, "search_tv_shows", "Search TV shows by title", Media::Tv)?;
    register_search(
        &mut registry,
        &service,
        "search_people",
        "Search actors, directors and other people by name",
        Media::Person,
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_movie_details", "Full details of a movie by TMDB id")
            .with_schema(id_schema("movie_id", "TMDB movie id")),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let movie_id = id_arg(&args, "movie_id")?;
                upstream_result(
                    service
                        .details(movie_id)
                        .await
                        .map(|movie| ToolCallResult::text(render_details(&movie))),
                )
            }
        },
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_tv_details", "Full details of a TV show by TMDB id")
            .with_schema(id_schema("tv_id", "TMDB TV show id")),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let tv_id = id_arg(&args, "tv_id")?;
                upstream_result(
                    service
                        .tv_details(tv_id)
                        .await
                        .map(|show| ToolCallResult::text(render_tv_details(&show))),
                )
            }
        },
    )?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_person_details", "Biography and facts about a person by TMDB id")
            .with_schema(id_schema("person_id", "TMDB person id")),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let person_id = id_arg(&args, "person_id")?;
                upstream_result(
                    service
                        .person_details(person_id)
                        .await
                        .map(|person| ToolCallResult::text(render_person(&person))),
                )
            }
        },
    )?;

    register_credits(&mut registry, &service, "get_movie_credits", "movie_id", Media::Movie)?;
    register_credits(&mut registry, &service, "get_tv_credits", "tv_id", Media::Tv)?;
    register_popular(&mut registry, &service, "get_popular_movies", Media::Movie)?;
    register_popular(&mut registry, &service, "get_popular_tv_shows", Media::Tv)?;

    let svc = service.clone();
    registry.register_tool(
        McpTool::new("get_trending", "Trending movies, shows or people").with_schema(
            McpInputSchema::default()
                .property(
                    "media_type",
                    json!({"type": "string", "enum": MEDIA_TYPES}),
                    true,
                )
                .property(
                    "time_window",
                    json!({"type": "string", "enum": TIME_WINDOWS, "description": "Default: week"}),
                    false,
                ),
        ),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let media_type = one_of(&args, "media_type", &MEDIA_TYPES)?;
                let time_window = match args.get("time_window") {
                    None | Some(Value::Null) => "week",
                    Some(_) => one_of(&args, "time_window", &TIME_WINDOWS)?,
                };
                upstream_result(service.trending(media_type, time_window).await.map(|results| {
                    ToolCallResult::text(render_trending(media_type, time_window, &results))
                }))
            }
        },
    )?;

    let svc = service;
    registry.register_tool(
        McpTool::new("discover_movies", "Discover movies by year, genre or cast").with_schema(
            McpInputSchema::default()
                .property(
                    "sort_by",
                    json!({"type": "string", "enum": SORT_ORDERS, "description": "Default: popularity.desc"}),
                    false,
                )
                .property(
                    "year",
                    json!({"type": "integer", "description": "Release year"}),
                    false,
                )
                .property(
                    "genre",
                    json!({"type": "string", "description": "TMDB genre id"}),
                    false,
                )
                .property(
                    "with_cast",
                    json!({"type": "string", "description": "TMDB person id of a cast member"}),
                    false,
                )
                .property("page", page_schema(), false),
        ),
        move |args: Map<String, Value>| {
            let service = svc.clone();
            async move {
                let filters = discover_filters(&args)?;
                upstream_result(
                    service
                        .discover(&filters)
                        .await
                        .map(|results| ToolCallResult::text(render_discover(&filters, &results))),
                )
            }
        },
    )?;

    registry.register_prompt(
        McpPrompt::new("movie_recommendation", "Personalized movie recommendations")
            .argument("genre", "Preferred genre", true)
            .argument("mood", "Current mood or occasion", false),
        movie_recommendation,
    )?;

    Ok(registry)
}

fn page_schema() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": "Result page (default 1)",
    })
}

fn id_schema(name: &str, description: &str) -> McpInputSchema {
    McpInputSchema::default().property(
        name,
        json!({"type": "integer", "description": description}),
        true,
    )
}

fn register_search(
    registry: &mut CapabilityRegistry,
    service: &Arc<MovieService>,
    name: &str,
    description: &str,
    media: Media,
) -> Result<(), ServerError> {
    let service = service.clone();
    registry.register_tool(
        McpTool::new(name, description).with_schema(
            McpInputSchema::default()
                .property(
                    "query",
                    json!({"type": "string", "description": "Title, name or keywords"}),
                    true,
                )
                .property("page", page_schema(), false),
        ),
        move |args: Map<String, Value>| {
            let service = service.clone();
            async move {
                let query = string_arg(&args, "query")?;
                let page = page_arg(&args, "page")?;
                upstream_result(service.search(media, query, page).await.map(|results| {
                    ToolCallResult::text(render_search(media, query, page, &results))
                }))
            }
        },
    )?;
    Ok(())
}

fn register_credits(
    registry: &mut CapabilityRegistry,
    service: &Arc<MovieService>,
    name: &str,
    id_name: &'static str,
    media: Media,
) -> Result<(), ServerError> {
    let service = service.clone();
    let description = format!("Main cast and crew of a {}", media.singular());
    registry.register_tool(
        McpTool::new(name, description).with_schema(id_schema(id_name, "TMDB id")),
        move |args: Map<String, Value>| {
            let service = service.clone();
            async move {
                let id = id_arg(&args, id_name)?;
                upstream_result(
                    service
                        .credits(media, id)
                        .await
                        .map(|credits| ToolCallResult::text(render_credits(media, id, &credits))),
                )
            }
        },
    )?;
    Ok(())
}

fn register_popular(
    registry: &mut CapabilityRegistry,
    service: &Arc<MovieService>,
    name: &str,
    media: Media,
) -> Result<(), ServerError> {
    let service = service.clone();
    registry.register_tool(
        McpTool::new(name, format!("Currently popular {}", media.plural()))
            .with_schema(McpInputSchema::default().property("page", page_schema(), false)),
        move |args: Map<String, Value>| {
            let service = service.clone();
            async move {
                let page = page_arg(&args, "page")?;
                upstream_result(
                    service
                        .popular(media, page)
                        .await
                        .map(|results| ToolCallResult::text(render_popular(media, page, &results))),
                )
            }
        },
    )?;
    Ok(())
}

fn discover_filters(args: &Map<String, Value>) -> Result<Discover, RouterError> {
    let sort_by = match args.get("sort_by") {
        None | Some(Value::Null) => None,
        Some(_) => Some(one_of(args, "sort_by", &SORT_ORDERS)?.to_string()),
    };
    let year = match args.get("year") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_id(value).ok_or_else(|| {
            RouterError::InvalidParams("Argument 'year' must be a positive integer".to_string())
        })?),
    };

    Ok(Discover {
        sort_by,
        year,
        genre: optional_id(args, "genre")?,
        with_cast: optional_id(args, "with_cast")?,
        page: page_arg(args, "page")?,
    })
}

/// Optional id filter, sent to TMDB as given
fn optional_id(args: &Map<String, Value>, name: &str) -> Result<Option<String>, RouterError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_id(value)
            .map(|id| Some(id.to_string()))
            .ok_or_else(|| invalid_id(name)),
    }
}

async fn movie_recommendation(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let genre = arg(&args, "genre").unwrap_or_default();
    let mood = arg(&args, "mood").unwrap_or("any");
    let text = format!(
        "Recommend five {genre} movies for a {mood} mood. Use the search_movies and \
         get_trending tools to check current titles, and explain each pick in one sentence."
    );
    Ok(GetPromptResult::new(
        Some(format!("{} movie recommendations", genre)),
        vec![PromptMessage::user(text)],
    ))
}

/// Required TMDB id argument
fn id_arg(args: &Map<String, Value>, name: &str) -> Result<u64, RouterError> {
    args.get(name).and_then(parse_id).ok_or_else(|| invalid_id(name))
}

fn invalid_id(name: &str) -> RouterError {
    RouterError::InvalidParams(format!("Argument '{}' must be a positive integer", name))
}

/// Accept ids sent as numbers or numeric strings
fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
}

fn one_of<'a>(
    args: &'a Map<String, Value>,
    name: &str,
    allowed: &[&str],
) -> Result<&'a str, RouterError> {
    let value = string_arg(args, name)?;
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(RouterError::InvalidParams(format!(
            "Argument '{}' must be one of: {}",
            name,
            allowed.join(", ")
        )))
    }
}

fn year(date: Option<&str>) -> &str {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .unwrap_or("N/A")
}

fn poster(path: Option<&str>) -> String {
    path.map(|p| format!("{}{}", IMAGE_BASE_URL, p))
        .unwrap_or_else(|| "not available".to_string())
}

fn rating(vote: Option<f64>) -> String {
    vote.map(|v| format!("{:.1}/10", v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn excerpt(text: Option<&str>, limit: usize) -> String {
    match text.filter(|t| !t.is_empty()) {
        Some(t) if t.chars().count() > limit => {
            format!("{}...", t.chars().take(limit).collect::<String>())
        }
        Some(t) => t.to_string(),
        None => "No description".to_string(),
    }
}

fn popularity(value: Option<f64>) -> String {
    value
        .map(|p| format!("{:.1}", p))
        .unwrap_or_else(|| "N/A".to_string())
}

fn count(value: Option<u32>) -> String {
    value
        .map(|n| n.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn known_works(works: &[Summary]) -> String {
    if works.is_empty() {
        return "N/A".to_string();
    }
    works
        .iter()
        .map(Summary::display_title)
        .collect::<Vec<_>>()
        .join(", ")
}

fn names(items: &[Named]) -> String {
    if items.is_empty() {
        return "N/A".to_string();
    }
    items
        .iter()
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn dollars(amount: Option<u64>) -> String {
    match amount.filter(|a| *a > 0) {
        Some(a) => format!("${}", a),
        None => "not available".to_string(),
    }
}

pub fn render_search(media: Media, query: &str, page: u64, results: &Page<Summary>) -> String {
    let kind = media.plural();
    let mut text = format!(
        "Search {}: \"{}\"\nResults: {} {}, page {} of {}\n",
        kind, query, results.total_results, kind, page, results.total_pages
    );
    for item in results.results.iter().take(10) {
        if media == Media::Person {
            let _ = write!(
                text,
                "\n{}\n  ID: {}\n  Known for: {}\n  Popularity: {}\n  Known works: {}\n  Photo: {}\n",
                item.display_title(),
                item.id,
                item.known_for_department.as_deref().unwrap_or("N/A"),
                popularity(item.popularity),
                known_works(&item.known_for),
                poster(item.profile_path.as_deref()),
            );
        } else {
            let _ = write!(
                text,
                "\n{} ({})\n  ID: {}\n  Rating: {}\n  {}\n  Poster: {}\n",
                item.display_title(),
                item.year(),
                item.id,
                rating(item.vote_average),
                excerpt(item.overview.as_deref(), 150),
                poster(item.poster_path.as_deref()),
            );
        }
    }
    text.trim_end().to_string()
}

pub fn render_details(movie: &MovieDetails) -> String {
    let mut text = format!(
        "{} ({})\n\n\
         ID: {}\n\
         Rating: {} ({} votes)\n\
         Runtime: {}\n\
         Genres: {}\n\
         Countries: {}\n\
         Budget: {}\n\
         Revenue: {}\n\
         Studios: {}\n\
         Homepage: {}\n\
         Poster: {}\n\n\
         Overview:\n{}",
        movie.title,
        year(movie.release_date.as_deref()),
        movie.id,
        rating(movie.vote_average),
        movie.vote_count.unwrap_or_default(),
        movie
            .runtime
            .map(|m| format!("{} minutes", m))
            .unwrap_or_else(|| "not available".to_string()),
        names(&movie.genres),
        names(&movie.production_countries),
        dollars(movie.budget),
        dollars(movie.revenue),
        names(&movie.production_companies),
        movie
            .homepage
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or("not available"),
        poster(movie.poster_path.as_deref()),
        excerpt(movie.overview.as_deref(), usize::MAX),
    );
    if let Some(tagline) = movie.tagline.as_deref().filter(|t| !t.is_empty()) {
        let _ = write!(text, "\n\nTagline: {}", tagline);
    }
    text
}

pub fn render_popular(media: Media, page: u64, results: &Page<Summary>) -> String {
    let mut text = format!(
        "Popular {}, page {} of {}\n",
        media.plural(),
        page,
        results.total_pages
    );
    ranked(&mut text, &results.results);
    text.trim_end().to_string()
}

pub fn render_discover(filters: &Discover, results: &Page<Summary>) -> String {
    let mut text = String::from("Discover movies\n");
    if let Some(sort_by) = &filters.sort_by {
        let _ = writeln!(text, "Sorted by: {}", sort_by);
    }
    if let Some(year) = filters.year {
        let _ = writeln!(text, "Year: {}", year);
    }
    if let Some(genre) = &filters.genre {
        let _ = writeln!(text, "Genre id: {}", genre);
    }
    if let Some(with_cast) = &filters.with_cast {
        let _ = writeln!(text, "Cast id: {}", with_cast);
    }
    let _ = writeln!(text, "Page {} of {}", filters.page, results.total_pages);
    ranked(&mut text, &results.results);
    text.trim_end().to_string()
}

fn ranked(text: &mut String, items: &[Summary]) {
    for (index, item) in items.iter().take(10).enumerate() {
        let _ = write!(
            text,
            "\n{}. {} ({})\n   ID: {}\n   Rating: {}\n   Popularity: {}\n",
            index + 1,
            item.display_title(),
            item.year(),
            item.id,
            rating(item.vote_average),
            popularity(item.popularity),
        );
    }
}

pub fn render_tv_details(show: &TvDetails) -> String {
    let run_time = if show.episode_run_time.is_empty() {
        "varies".to_string()
    } else {
        let minutes: Vec<String> = show.episode_run_time.iter().map(u32::to_string).collect();
        format!("{} minutes", minutes.join(", "))
    };
    let countries = if show.origin_country.is_empty() {
        "N/A".to_string()
    } else {
        show.origin_country.join(", ")
    };

    format!(
        "{} ({})\n\n\
         ID: {}\n\
         Rating: {} ({} votes)\n\
         Seasons: {}\n\
         Episodes: {}\n\
         Episode length: {}\n\
         Genres: {}\n\
         Countries: {}\n\
         Status: {}\n\
         Networks: {}\n\
         First aired: {}\n\
         Last aired: {}\n\
         Created by: {}\n\
         Homepage: {}\n\
         Poster: {}\n\n\
         Overview:\n{}",
        show.name,
        year(show.first_air_date.as_deref()),
        show.id,
        rating(show.vote_average),
        show.vote_count.unwrap_or_default(),
        count(show.number_of_seasons),
        count(show.number_of_episodes),
        run_time,
        names(&show.genres),
        countries,
        show.status.as_deref().unwrap_or("N/A"),
        names(&show.networks),
        show.first_air_date.as_deref().unwrap_or("not available"),
        show.last_air_date.as_deref().unwrap_or("still airing"),
        names(&show.created_by),
        show.homepage
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or("not available"),
        poster(show.poster_path.as_deref()),
        excerpt(show.overview.as_deref(), usize::MAX),
    )
}

pub fn render_person(person: &PersonDetails) -> String {
    let aliases = if person.also_known_as.is_empty() {
        "not available".to_string()
    } else {
        person.also_known_as.join(", ")
    };

    format!(
        "{}\n\n\
         ID: {}\n\
         Popularity: {}\n\
         Known for: {}\n\
         Born: {}\n\
         Birthplace: {}\n\
         Died: {}\n\
         Also known as: {}\n\
         Photo: {}\n\n\
         Biography:\n{}",
        person.name,
        person.id,
        popularity(person.popularity),
        person.known_for_department.as_deref().unwrap_or("N/A"),
        person.birthday.as_deref().unwrap_or("not available"),
        person.place_of_birth.as_deref().unwrap_or("not available"),
        person.deathday.as_deref().unwrap_or("-"),
        aliases,
        poster(person.profile_path.as_deref()),
        person
            .biography
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("No biography available"),
    )
}

pub fn render_credits(media: Media, id: u64, credits: &Credits) -> String {
    let mut text = format!("Credits for {} {}\n\nCast:", media.singular(), id);
    for actor in credits.cast.iter().take(10) {
        let _ = write!(
            text,
            "\n  {} as {} (ID: {})",
            actor.name,
            actor.character.as_deref().filter(|c| !c.is_empty()).unwrap_or("unknown"),
            actor.id
        );
    }
    text.push_str("\n\nCrew:");
    for member in credits.crew.iter().take(10) {
        let _ = write!(
            text,
            "\n  {} - {} (ID: {})",
            member.name,
            member.job.as_deref().unwrap_or("unknown"),
            member.id
        );
    }
    text
}

pub fn render_trending(media_type: &str, time_window: &str, results: &Page<Summary>) -> String {
    let period = if time_window == "day" { "today" } else { "this week" };
    let mut text = format!("Trending {} {}\n", media_type, period);
    for (index, item) in results.results.iter().take(15).enumerate() {
        let kind = item.media_type.as_deref().unwrap_or(media_type);
        let _ = write!(
            text,
            "\n{}. [{}] {} ({})\n   ID: {}\n   Rating: {}\n",
            index + 1,
            kind,
            item.display_title(),
            item.year(),
            item.id,
            rating(item.vote_average),
        );
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capability_core::{Namespace, RequestRouter};
    use std::time::Duration;

    fn offline_router() -> RequestRouter {
        let config = MovieConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
        };
        RequestRouter::new(Arc::new(registry(config).unwrap()))
    }

    fn search_fixture() -> Page<Summary> {
        serde_json::from_value(json!({
            "page": 1,
            "total_pages": 3,
            "total_results": 42,
            "results": [
                {"id": 550, "title": "Fight Club", "release_date": "1999-10-15",
                 "overview": "An insomniac office worker...", "vote_average": 8.433,
                 "poster_path": "/poster.jpg"},
                {"id": 1399, "name": "Game of Thrones", "first_air_date": "2011-04-17",
                 "media_type": "tv"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_render_search() {
        let text = render_search(Media::Movie, "fight", 1, &search_fixture());

        assert!(text.starts_with("Search movies: \"fight\"\nResults: 42 movies, page 1 of 3"));
        assert!(text.contains("Fight Club (1999)"));
        assert!(text.contains("Rating: 8.4/10"));
        assert!(text.contains("Poster: https://image.tmdb.org/t/p/w500/poster.jpg"));
        assert!(text.contains("Game of Thrones (2011)"));
    }

    #[test]
    fn test_render_trending_uses_item_media_type() {
        let text = render_trending("all", "day", &search_fixture());
        assert!(text.starts_with("Trending all today"));
        assert!(text.contains("2. [tv] Game of Thrones"));
        assert!(text.contains("1. [all] Fight Club"));
    }

    #[test]
    fn test_render_details_skips_missing_tagline() {
        let movie: MovieDetails = serde_json::from_value(json!({
            "id": 603, "title": "The Matrix", "release_date": "1999-03-30",
            "runtime": 136, "genres": [{"name": "Action"}, {"name": "Science Fiction"}],
            "budget": 63000000, "revenue": 0, "tagline": ""
        }))
        .unwrap();

        let text = render_details(&movie);
        assert!(text.contains("Runtime: 136 minutes"));
        assert!(text.contains("Genres: Action, Science Fiction"));
        assert!(text.contains("Budget: $63000000"));
        assert!(text.contains("Revenue: not available"));
        assert!(!text.contains("Tagline"));
    }

    #[test]
    fn test_id_accepts_numeric_strings() {
        assert_eq!(parse_id(&json!(550)), Some(550));
        assert_eq!(parse_id(&json!(" 550 ")), Some(550));
        assert_eq!(parse_id(&json!(0)), None);
        assert_eq!(parse_id(&json!("abc")), None);
    }

    #[tokio::test]
    async fn test_invalid_trending_window_is_invalid_params() {
        let err = offline_router()
            .handle(
                Namespace::Tools,
                "get_trending",
                json!({"media_type": "movie", "time_window": "month"}),
            )
            .await
            .unwrap_err();
        assert!(err.message().contains("day, week"), "{err}");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported() {
        let err = offline_router()
            .handle(Namespace::Tools, "get_popular_movies", json!({}))
            .await
            .unwrap_err();
        assert!(err.message().contains("TMDB API key not configured"), "{err}");
    }

    #[test]
    fn test_render_people_search_lists_known_works() {
        let results: Page<Summary> = serde_json::from_value(json!({
            "total_pages": 1,
            "total_results": 1,
            "results": [
                {"id": 287, "name": "Brad Pitt", "known_for_department": "Acting",
                 "popularity": 21.44, "profile_path": "/brad.jpg",
                 "known_for": [{"id": 550, "title": "Fight Club"}, {"id": 1402, "name": "The Walking Dead"}]}
            ]
        }))
        .unwrap();

        let text = render_search(Media::Person, "brad", 1, &results);
        assert!(text.starts_with("Search people: \"brad\"\nResults: 1 people"));
        assert!(text.contains("Known for: Acting"));
        assert!(text.contains("Popularity: 21.4"));
        assert!(text.contains("Known works: Fight Club, The Walking Dead"));
        assert!(text.contains("Photo: https://image.tmdb.org/t/p/w500/brad.jpg"));
    }

    #[test]
    fn test_render_tv_details() {
        let show: TvDetails = serde_json::from_value(json!({
            "id": 1396, "name": "Breaking Bad", "first_air_date": "2008-01-20",
            "last_air_date": "2013-09-29", "number_of_seasons": 5, "number_of_episodes": 62,
            "episode_run_time": [45, 47], "origin_country": ["US"], "status": "Ended",
            "networks": [{"name": "AMC"}], "created_by": [{"name": "Vince Gilligan"}]
        }))
        .unwrap();

        let text = render_tv_details(&show);
        assert!(text.starts_with("Breaking Bad (2008)"));
        assert!(text.contains("Seasons: 5\nEpisodes: 62"));
        assert!(text.contains("Episode length: 45, 47 minutes"));
        assert!(text.contains("Networks: AMC"));
        assert!(text.contains("Created by: Vince Gilligan"));
        assert!(text.contains("Overview:\nNo description"));
    }

    #[test]
    fn test_render_person_defaults() {
        let person: PersonDetails = serde_json::from_value(json!({
            "id": 31, "name": "Tom Hanks", "birthday": "1956-07-09", "biography": ""
        }))
        .unwrap();

        let text = render_person(&person);
        assert!(text.contains("Born: 1956-07-09"));
        assert!(text.contains("Died: -"));
        assert!(text.contains("Also known as: not available"));
        assert!(text.ends_with("Biography:\nNo biography available"));
    }

    #[test]
    fn test_render_credits_caps_cast_and_crew() {
        let cast: Vec<Value> = (1..=12)
            .map(|i| json!({"id": i, "name": format!("Actor {i}"), "character": format!("Role {i}")}))
            .collect();
        let credits: Credits = serde_json::from_value(json!({
            "cast": cast,
            "crew": [{"id": 7467, "name": "David Fincher", "job": "Director"}]
        }))
        .unwrap();

        let text = render_credits(Media::Movie, 550, &credits);
        assert!(text.starts_with("Credits for movie 550"));
        assert!(text.contains("Actor 10 as Role 10 (ID: 10)"));
        assert!(!text.contains("Actor 11"));
        assert!(text.contains("David Fincher - Director (ID: 7467)"));
    }

    #[test]
    fn test_discover_filters_build_query() {
        let args = json!({"sort_by": "vote_average.desc", "year": 1999, "genre": "28", "page": 2});
        let filters = discover_filters(args.as_object().unwrap()).unwrap();

        assert_eq!(
            filters.query(),
            vec![
                ("page", "2".to_string()),
                ("sort_by", "vote_average.desc".to_string()),
                ("year", "1999".to_string()),
                ("with_genres", "28".to_string()),
            ]
        );

        let text = render_discover(&filters, &search_fixture());
        assert!(text.starts_with("Discover movies\nSorted by: vote_average.desc\nYear: 1999\nGenre id: 28\nPage 2 of 3"));
        assert!(!text.contains("Cast id"));
    }

    #[test]
    fn test_discover_rejects_unknown_sort_order() {
        let args = json!({"sort_by": "title.asc"});
        let err = discover_filters(args.as_object().unwrap()).unwrap_err();
        assert!(err.message().contains("popularity.desc"), "{err}");
    }

    #[test]
    fn test_registry_lists_every_tmdb_tool() {
        let router = offline_router();
        let names: Vec<String> = router
            .registry()
            .tools()
            .iter()
            .map(|tool| tool.name.clone())
            .collect();
        for expected in [
            "search_movies",
            "search_tv_shows",
            "search_people",
            "get_movie_details",
            "get_tv_details",
            "get_person_details",
            "get_movie_credits",
            "get_tv_credits",
            "get_popular_movies",
            "get_popular_tv_shows",
            "get_trending",
            "discover_movies",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert_eq!(names.len(), 12);
    }

    #[tokio::test]
    async fn test_tv_id_must_be_numeric() {
        let err = offline_router()
            .handle(Namespace::Tools, "get_tv_credits", json!({"tv_id": "breaking"}))
            .await
            .unwrap_err();
        assert!(err.message().contains("'tv_id' must be a positive integer"), "{err}");
    }
}
