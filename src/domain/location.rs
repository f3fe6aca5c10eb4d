// Coarse reverse-geocoding for the map pin detail panel
use super::coordinate::{to_dms, Axis, Coordinate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationInfo {
    pub country: String,
    pub region: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub dms_latitude: String,
    pub dms_longitude: String,
}

/// Inclusive lat/lng box
struct Bounds {
    lat: (f64, f64),
    lng: (f64, f64),
}

impl Bounds {
    const fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        Self {
            lat: (lat_min, lat_max),
            lng: (lng_min, lng_max),
        }
    }

    fn contains(&self, coord: &Coordinate) -> bool {
        let (lat, lng) = (coord.latitude(), coord.longitude());
        lat >= self.lat.0 && lat <= self.lat.1 && lng >= self.lng.0 && lng <= self.lng.1
    }
}

struct Area {
    bounds: Bounds,
    country: &'static str,
    region: &'static str,
    /// Name used in the address line
    short: &'static str,
}

struct Continent {
    area: Area,
    countries: &'static [Area],
}

const fn area(
    bounds: Bounds,
    country: &'static str,
    region: &'static str,
    short: &'static str,
) -> Area {
    Area {
        bounds,
        country,
        region,
        short,
    }
}

// First match wins at both levels; the order matters where boxes overlap.
static CONTINENTS: &[Continent] = &[
    Continent {
        area: area(Bounds::new(35.0, 72.0, -25.0, 45.0), "Europe", "European Region", "Europe"),
        countries: &[
            area(Bounds::new(49.0, 61.0, -10.0, 2.0), "United Kingdom", "British Isles", "UK region"),
            area(Bounds::new(42.0, 51.0, 2.0, 8.0), "France", "Western Europe", "France"),
            area(Bounds::new(47.0, 55.0, 8.0, 15.0), "Germany", "Central Europe", "Germany"),
            area(Bounds::new(41.0, 47.0, 12.0, 19.0), "Italy", "Southern Europe", "Italy"),
            area(Bounds::new(36.0, 43.0, -9.0, -6.0), "Spain", "Iberian Peninsula", "Spain"),
        ],
    },
    Continent {
        area: area(
            Bounds::new(25.0, 72.0, -170.0, -52.0),
            "North America",
            "North American Region",
            "North America",
        ),
        countries: &[
            area(Bounds::new(25.0, 49.0, -125.0, -66.0), "United States", "North America", "USA"),
            area(Bounds::new(41.0, 72.0, -141.0, -52.0), "Canada", "North America", "Canada"),
        ],
    },
    Continent {
        area: area(Bounds::new(-10.0, 70.0, 60.0, 180.0), "Asia", "Asian Region", "Asia"),
        countries: &[
            area(Bounds::new(20.0, 50.0, 73.0, 135.0), "China", "East Asia", "China"),
            area(Bounds::new(30.0, 46.0, 129.0, 146.0), "Japan", "East Asia", "Japan"),
            area(Bounds::new(6.0, 37.0, 68.0, 97.0), "India", "South Asia", "India"),
        ],
    },
    Continent {
        area: area(Bounds::new(-35.0, 37.0, -20.0, 52.0), "Africa", "African Region", "Africa"),
        countries: &[],
    },
    Continent {
        area: area(
            Bounds::new(-56.0, 15.0, -82.0, -32.0),
            "South America",
            "South American Region",
            "South America",
        ),
        countries: &[],
    },
    Continent {
        area: area(Bounds::new(-47.0, -9.0, 110.0, 180.0), "Australia", "Oceania", "Australia"),
        countries: &[],
    },
];

pub fn describe_location(coord: &Coordinate) -> LocationInfo {
    let lat = coord.latitude();
    let lng = coord.longitude();

    let matched = CONTINENTS
        .iter()
        .find(|c| c.area.bounds.contains(coord))
        .map(|c| {
            c.countries
                .iter()
                .find(|a| a.bounds.contains(coord))
                .unwrap_or(&c.area)
        });

    let (country, region, address) = match matched {
        Some(a) => (
            a.country,
            a.region,
            format!("Location in {} ({:.4}, {:.4})", a.short, lat, lng),
        ),
        None => (
            "Ocean/Remote Area",
            "International Waters",
            format!("Remote location ({:.4}, {:.4})", lat, lng),
        ),
    };

    LocationInfo {
        country: country.to_string(),
        region: region.to_string(),
        address,
        latitude: lat,
        longitude: lng,
        dms_latitude: to_dms(lat, Axis::Latitude),
        dms_longitude: to_dms(lng, Axis::Longitude),
    }
}
