//! Static facts about ten major Colombian cities, shared by the weather and
//! cities servers

use serde::Serialize;
use std::fmt;

use capability_core::RouterError;

/// Natural region of Colombia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Region {
    Andina,
    Caribe,
    #[serde(rename = "Pacífica")]
    Pacifica,
    #[serde(rename = "Amazónica")]
    Amazonica,
    #[serde(rename = "Orinoquía")]
    Orinoquia,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Andina,
        Region::Caribe,
        Region::Pacifica,
        Region::Amazonica,
        Region::Orinoquia,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Region::Andina => "Andina",
            Region::Caribe => "Caribe",
            Region::Pacifica => "Pacífica",
            Region::Amazonica => "Amazónica",
            Region::Orinoquia => "Orinoquía",
        }
    }

    /// Parse a region name; accents and case are optional
    pub fn parse(name: &str) -> Option<Self> {
        let folded = fold(name);
        Self::ALL.into_iter().find(|region| fold(region.name()) == folded)
    }

    pub fn characteristics(&self) -> &'static str {
        match self {
            Region::Andina => "Mountainous region with temperate and cold climates",
            Region::Caribe => "Coastal region with a warm tropical climate",
            Region::Pacifica => "Pacific coastal region with very high biodiversity",
            Region::Amazonica => "Rainforest region crossed by the Amazon basin",
            Region::Orinoquia => "Eastern plains with savannas and cattle ranching",
        }
    }

    pub fn economy(&self) -> &'static str {
        match self {
            Region::Andina => "Economic and industrial center of the country",
            Region::Caribe => "Tourism, ports and industry",
            Region::Pacifica => "Sugar industry and the port of Buenaventura",
            Region::Amazonica => "Ecotourism and river trade",
            Region::Orinoquia => "Oil and livestock",
        }
    }

    pub fn best_time_to_visit(&self) -> &'static str {
        match self {
            Region::Caribe => "December to March (dry season)",
            Region::Andina => "December to February and July to August",
            _ => "December to March",
        }
    }

    /// Cities of the table located in this region
    pub fn cities(&self) -> impl Iterator<Item = &'static City> + '_ {
        CITIES.iter().filter(move |city| city.region == *self)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A city with its coordinates and travel facts
#[derive(Debug, Serialize)]
pub struct City {
    pub key: &'static str,
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub region: Region,
    pub department: &'static str,
    /// Meters above sea level
    pub altitude: u32,
    pub population: u32,
    pub founded: u16,
    pub description: &'static str,
    pub attractions: &'static [&'static str],
    pub gastronomy: &'static [&'static str],
    pub events: &'static [&'static str],
    #[serde(skip)]
    pub recommendation: &'static str,
    #[serde(skip)]
    pub recommended_days: u8,
}

impl City {
    /// Short climate summary derived from altitude
    pub fn climate(&self) -> &'static str {
        match self.altitude {
            0..=1000 => "Warm all year round (24-32°C)",
            1001..=2000 => "Temperate, spring-like (17-27°C)",
            _ => "Cool to cold (8-19°C); nights get chilly",
        }
    }
}

/// Look a city up by key (`bogota`, `santa_marta`, ...) or display name
pub fn city(name: &str) -> Option<&'static City> {
    let folded = fold(name).replace(' ', "_");
    CITIES.iter().find(|city| city.key == folded)
}

/// Look a city up, failing with an invalid-params error naming the valid keys
pub fn require_city(name: &str) -> Result<&'static City, RouterError> {
    city(name).ok_or_else(|| {
        RouterError::InvalidParams(format!(
            "Unknown city: {}. Valid cities: {}",
            name,
            city_keys().join(", ")
        ))
    })
}

/// Keys of every city, in table order
pub fn city_keys() -> Vec<&'static str> {
    CITIES.iter().map(|city| city.key).collect()
}

/// Clothing advice for a temperature at an altitude
pub fn clothing_recommendation(temp: f64, altitude: u32) -> &'static str {
    if altitude > 2000 || temp < 15.0 {
        "Warm clothes, a jacket and long trousers; nights can be cold."
    } else if temp > 25.0 {
        "Light, fresh clothing, sunscreen and a hat. Stay hydrated."
    } else {
        "Comfortable clothes and a light jacket for the evening."
    }
}

/// Lowercase and strip Spanish accents
fn fold(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

pub static CITIES: &[City] = &[
    City {
        key: "bogota",
        name: "Bogotá",
        lat: 4.7110,
        lon: -74.0721,
        region: Region::Andina,
        department: "Cundinamarca",
        altitude: 2640,
        population: 7_500_000,
        founded: 1538,
        description: "Capital of Colombia and its political, economic and cultural center",
        attractions: &[
            "Museo del Oro",
            "Cerro de Monserrate",
            "La Candelaria",
            "Museo Botero",
            "Biblioteca Luis Ángel Arango",
            "Parque Simón Bolívar",
            "Zona Rosa",
            "Teatro Colón",
        ],
        gastronomy: &[
            "Ajiaco santafereño",
            "Tamales bogotanos",
            "Changua",
            "Fritanga",
            "Chocolate con queso",
        ],
        events: &[
            "Festival Iberoamericano de Teatro (March-April)",
            "Rock al Parque (October)",
            "Festival de Jazz (September)",
            "Feria del Libro (April-May)",
        ],
        recommendation: "Ideal for cultural and historical tourism. Bring warm clothes.",
        recommended_days: 3,
    },
    City {
        key: "medellin",
        name: "Medellín",
        lat: 6.2442,
        lon: -75.5812,
        region: Region::Andina,
        department: "Antioquia",
        altitude: 1495,
        population: 2_500_000,
        founded: 1616,
        description: "City of Eternal Spring, known for urban innovation and paisa culture",
        attractions: &[
            "Comuna 13 Graffiti Tour",
            "Parque Arví",
            "Museo de Antioquia",
            "Jardín Botánico",
            "Pueblito Paisa",
            "Guatapé (El Peñón)",
            "Metrocable",
            "Biblioteca España",
        ],
        gastronomy: &[
            "Bandeja paisa",
            "Arepa con queso",
            "Sancocho antioqueño",
            "Buñuelos",
            "Natilla",
        ],
        events: &[
            "Feria de las Flores (August)",
            "Alumbrados Navideños (December-January)",
            "Festival de Poesía (July)",
            "Colombiamoda (July)",
        ],
        recommendation: "Great for urban tourism. Mild weather all year.",
        recommended_days: 3,
    },
    City {
        key: "cali",
        name: "Cali",
        lat: 3.4516,
        lon: -76.5320,
        region: Region::Pacifica,
        department: "Valle del Cauca",
        altitude: 1018,
        population: 2_200_000,
        founded: 1536,
        description: "World capital of salsa, famous for its music and nightlife",
        attractions: &[
            "Cerro de las Tres Cruces",
            "Zoológico de Cali",
            "Teatro Municipal",
            "Museo La Tertulia",
            "Boulevard del Río",
            "Barrio San Antonio",
            "Cristo Rey",
            "Gato de Tejada",
        ],
        gastronomy: &[
            "Sancocho de gallina",
            "Empanadas vallecaucanas",
            "Aborrajados",
            "Cholado",
            "Champús",
        ],
        events: &[
            "Feria de Cali (December-January)",
            "Festival Mundial de Salsa (September)",
            "Festival Petronio Álvarez (August)",
            "Salsódromo (December)",
        ],
        recommendation: "The place for salsa lovers and nightlife.",
        recommended_days: 2,
    },
    City {
        key: "barranquilla",
        name: "Barranquilla",
        lat: 10.9639,
        lon: -74.7964,
        region: Region::Caribe,
        department: "Atlántico",
        altitude: 18,
        population: 1_300_000,
        founded: 1629,
        description: "Colombia's Golden Gate, famous for its Carnival and Caribbean culture",
        attractions: &[
            "Carnaval de Barranquilla",
            "Malecón del Río",
            "Casa del Carnaval",
            "Museo del Caribe",
            "Gran Malecón",
            "Estadio Metropolitano",
            "Teatro Amira de la Rosa",
            "Bocas de Ceniza",
        ],
        gastronomy: &[
            "Arepa de huevo",
            "Sancocho de bocachico",
            "Patacón con todo",
            "Carimañolas",
            "Raspao",
        ],
        events: &[
            "Carnaval de Barranquilla (February-March)",
            "Festival de Orquestas (October)",
            "Pre-Carnavales (January)",
            "Barranquijazz (September)",
        ],
        recommendation: "Visit during Carnival for the full experience.",
        recommended_days: 2,
    },
    City {
        key: "cartagena",
        name: "Cartagena",
        lat: 10.3910,
        lon: -75.4794,
        region: Region::Caribe,
        department: "Bolívar",
        altitude: 2,
        population: 1_000_000,
        founded: 1533,
        description: "The Heroic City, a World Heritage Site for its colonial old town",
        attractions: &[
            "Ciudad Amurallada",
            "Castillo San Felipe",
            "Islas del Rosario",
            "Torre del Reloj",
            "Plaza Santo Domingo",
            "Convento La Popa",
            "Getsemaní",
            "Playa Bocagrande",
        ],
        gastronomy: &[
            "Arepa de huevo",
            "Ceviche de camarón",
            "Mote de queso",
            "Pescado frito",
            "Cocadas",
        ],
        events: &[
            "Festival Internacional de Música (January)",
            "Hay Festival (January)",
            "Festival de Cine de Cartagena (March)",
            "Fiestas de Independencia (November)",
        ],
        recommendation: "A must for colonial history and beaches. Pack light clothing.",
        recommended_days: 4,
    },
    City {
        key: "bucaramanga",
        name: "Bucaramanga",
        lat: 7.1253,
        lon: -73.1198,
        region: Region::Andina,
        department: "Santander",
        altitude: 959,
        population: 1_200_000,
        founded: 1622,
        description: "The Pretty City, known for its pleasant weather and parks",
        attractions: &[
            "Parque Santander",
            "Panachi",
            "Cerro del Santísimo",
            "Parque Nacional del Chicamocha",
            "Casa de Bolívar",
            "Catedral de la Sagrada Familia",
            "Jardín Botánico Eloy Valenzuela",
            "Mesa de los Santos",
        ],
        gastronomy: &[
            "Hormigas culonas",
            "Cabrito santandereano",
            "Arepa santandereana",
            "Mute santandereano",
            "Obleas",
        ],
        events: &[
            "Feria Bonita (September)",
            "Festival de la Guabina y el Tiple (August)",
            "Festival de Piano (August)",
            "Día de las Cometas (August)",
        ],
        recommendation: "Excellent for ecotourism and adventure sports.",
        recommended_days: 2,
    },
    City {
        key: "pereira",
        name: "Pereira",
        lat: 4.8133,
        lon: -75.6961,
        region: Region::Andina,
        department: "Risaralda",
        altitude: 1411,
        population: 750_000,
        founded: 1863,
        description: "Pearl of the Otún and gateway to the Coffee Axis",
        attractions: &[
            "Parque Nacional Natural Los Nevados",
            "Termales de Santa Rosa",
            "Zoológico Matecaña",
            "Viaducto César Gaviria Trujillo",
            "Catedral Nuestra Señora de la Pobreza",
            "Parque Consotá",
            "Bolívar Desnudo",
            "Jardín Botánico UTP",
        ],
        gastronomy: &[
            "Sancocho de gallina",
            "Patacones",
            "Arepa de chócolo",
            "Frijoles con garra",
            "Café especial",
        ],
        events: &[
            "Fiestas de la Cosecha (August)",
            "Festival Internacional de Teatro (October)",
            "Semana de la Raza (October)",
            "Festival de la Canción (October)",
        ],
        recommendation: "Gateway to the Coffee Axis, ideal for rural tourism.",
        recommended_days: 2,
    },
    City {
        key: "santa_marta",
        name: "Santa Marta",
        lat: 11.2408,
        lon: -74.1990,
        region: Region::Caribe,
        department: "Magdalena",
        altitude: 2,
        population: 500_000,
        founded: 1525,
        description: "Oldest city in Colombia and gateway to the Sierra Nevada",
        attractions: &[
            "Parque Nacional Tayrona",
            "Ciudad Perdida (Teyuna)",
            "Quinta de San Pedro Alejandrino",
            "Centro Histórico",
            "Rodadero",
            "Minca",
            "Taganga",
            "Museo del Oro Tairona",
        ],
        gastronomy: &[
            "Pescado frito",
            "Arepa de huevo",
            "Patacón con camarón",
            "Cayeye",
            "Lulada",
        ],
        events: &[
            "Fiestas del Mar (July)",
            "Festival de Teatro del Caribe (November)",
            "Semana Santa (March-April)",
            "Aniversario de Santa Marta (July)",
        ],
        recommendation: "The base for exploring Tayrona and the Sierra Nevada.",
        recommended_days: 3,
    },
    City {
        key: "manizales",
        name: "Manizales",
        lat: 5.0703,
        lon: -75.5138,
        region: Region::Andina,
        department: "Caldas",
        altitude: 2153,
        population: 400_000,
        founded: 1849,
        description: "City of Open Doors, famous for its architecture and coffee",
        attractions: &[
            "Catedral Basílica de Manizales",
            "Torre de Herveo",
            "Cable Aéreo",
            "Recinto del Pensamiento",
            "Nevado del Ruiz",
            "Hacienda Cafetera",
            "Teatro Los Fundadores",
            "Ecoparque Los Alcázares",
        ],
        gastronomy: &[
            "Sancocho de gallina",
            "Café de especialidad",
            "Arepa de chócolo",
            "Mazamorra de maíz",
            "Natilla",
        ],
        events: &[
            "Feria de Manizales (January)",
            "Festival Internacional de Teatro (October)",
            "Manizales Grita Rock (October)",
            "Festival de Jazz (September)",
        ],
        recommendation: "Perfect for coffee and architecture lovers.",
        recommended_days: 2,
    },
    City {
        key: "pasto",
        name: "Pasto",
        lat: 1.2136,
        lon: -77.2811,
        region: Region::Andina,
        department: "Nariño",
        altitude: 2527,
        population: 450_000,
        founded: 1537,
        description: "Surprise City of Colombia, famous for the Carnaval de Negros y Blancos",
        attractions: &[
            "Carnaval de Negros y Blancos",
            "Volcán Galeras",
            "Laguna de la Cocha",
            "Centro Histórico",
            "Museo del Oro",
            "Santuario de Las Lajas",
            "Catedral de Pasto",
            "Parque Nariño",
        ],
        gastronomy: &[
            "Cuy asado",
            "Hornado pastuso",
            "Empanadas de añejo",
            "Champús",
            "Helados de paila",
        ],
        events: &[
            "Carnaval de Negros y Blancos (January)",
            "Festival de Teatro Universitario (October)",
            "Semana Santa (March-April)",
            "Festival del Cuy (January)",
        ],
        recommendation: "Visit in January for the Carnaval de Negros y Blancos.",
        recommended_days: 2,
    },
];
