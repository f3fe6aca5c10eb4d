// AQI severity bands
use serde::Serialize;

pub const AQI_MIN: i32 = 0;
pub const AQI_MAX: i32 = 500;

/// Label shown while no AQI has been resolved
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

struct Band {
    max: i32,
    tier: SeverityTier,
    label: &'static str,
    color: &'static str,
    hex: &'static str,
}

// Ordered by `max`; the last band is open-ended.
static BANDS: [Band; 6] = [
    Band {
        max: 50,
        tier: SeverityTier::Good,
        label: "Good",
        color: "rgba(0,255,0,0.8)",
        hex: "#00e400",
    },
    Band {
        max: 100,
        tier: SeverityTier::Moderate,
        label: "Moderate",
        color: "rgba(255,255,0,0.8)",
        hex: "#ffff00",
    },
    Band {
        max: 150,
        tier: SeverityTier::UnhealthySensitive,
        label: "Unhealthy for Sensitive Groups",
        color: "rgba(255,165,0,0.8)",
        hex: "#ff7e00",
    },
    Band {
        max: 200,
        tier: SeverityTier::Unhealthy,
        label: "Unhealthy",
        color: "rgba(255,0,0,0.8)",
        hex: "#ff0000",
    },
    Band {
        max: 300,
        tier: SeverityTier::VeryUnhealthy,
        label: "Very Unhealthy",
        color: "rgba(139,0,0,0.8)",
        hex: "#8f3f97",
    },
    Band {
        max: i32::MAX,
        tier: SeverityTier::Hazardous,
        label: "Hazardous",
        color: "rgba(128,0,128,0.8)",
        hex: "#7e0023",
    },
];

/// Map an AQI value onto its severity band. Input is clamped to [0, 500].
pub fn classify(aqi: i32) -> SeverityTier {
    let aqi = aqi.clamp(AQI_MIN, AQI_MAX);
    BANDS
        .iter()
        .find(|band| aqi <= band.max)
        .map(|band| band.tier)
        .unwrap_or(SeverityTier::Hazardous)
}

impl SeverityTier {
    fn band(&self) -> &'static Band {
        // BANDS is indexed in the same order as the enum
        &BANDS[*self as usize]
    }

    pub fn label(&self) -> &'static str {
        self.band().label
    }

    /// Translucent overlay color
    pub fn color(&self) -> &'static str {
        self.band().color
    }

    /// Solid palette color for the detail panel
    pub fn hex(&self) -> &'static str {
        self.band().hex
    }
}
