//! Defines the `WeatherCondition` enum, mapping WMO weather interpretation codes
//! (as reported by the Open-Meteo archive in its `weather_code` field) to
//! descriptive variants.

/// Represents the daily weather condition reported by the archive.
///
/// This enum maps the WMO 4677 interpretation codes used in the `weather_code`
/// daily series to meaningful weather condition descriptions. See the
/// [Open-Meteo documentation](https://open-meteo.com/en/docs#weathervariables)
/// for the list of codes the archive emits.
///
/// You can convert an integer code into this enum using
/// [`WeatherCondition::from_code`], and obtain the human readable label stored
/// in enriched records with [`WeatherCondition::label`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum WeatherCondition {
    /// Code 0: Clear sky.
    ClearSky = 0,
    /// Code 1: Mainly clear.
    MainlyClear = 1,
    /// Code 2: Partly cloudy.
    PartlyCloudy = 2,
    /// Code 3: Overcast.
    Overcast = 3,
    /// Code 45: Fog.
    Fog = 45,
    /// Code 48: Depositing rime fog.
    RimeFog = 48,
    /// Code 51: Light drizzle.
    LightDrizzle = 51,
    /// Code 53: Moderate drizzle.
    Drizzle = 53,
    /// Code 55: Dense drizzle.
    DenseDrizzle = 55,
    /// Code 56: Light freezing drizzle.
    LightFreezingDrizzle = 56,
    /// Code 57: Dense freezing drizzle.
    DenseFreezingDrizzle = 57,
    /// Code 61: Slight rain.
    SlightRain = 61,
    /// Code 63: Moderate rain.
    Rain = 63,
    /// Code 65: Heavy rain.
    HeavyRain = 65,
    /// Code 66: Light freezing rain.
    LightFreezingRain = 66,
    /// Code 67: Heavy freezing rain.
    HeavyFreezingRain = 67,
    /// Code 71: Slight snow fall.
    SlightSnowfall = 71,
    /// Code 73: Moderate snow fall.
    Snowfall = 73,
    /// Code 75: Heavy snow fall.
    HeavySnowfall = 75,
    /// Code 77: Snow grains.
    SnowGrains = 77,
    /// Code 80: Slight rain showers.
    SlightRainShowers = 80,
    /// Code 81: Moderate rain showers.
    RainShowers = 81,
    /// Code 82: Violent rain showers.
    ViolentRainShowers = 82,
    /// Code 85: Slight snow showers.
    SlightSnowShowers = 85,
    /// Code 86: Heavy snow showers.
    HeavySnowShowers = 86,
    /// Code 95: Thunderstorm.
    Thunderstorm = 95,
    /// Code 96: Thunderstorm with slight hail.
    ThunderstormSlightHail = 96,
    /// Code 99: Thunderstorm with heavy hail.
    ThunderstormHeavyHail = 99,
}

/// Label stored for codes outside the WMO table.
pub const UNKNOWN_CONDITION: &str = "Unknown";

impl WeatherCondition {
    /// Attempts to convert a WMO weather code into a `WeatherCondition` variant.
    ///
    /// # Returns
    ///
    /// * `Some(WeatherCondition)` if `code` is one the archive documents.
    /// * `None` for anything else (e.g. 4, 100, negative values).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use weather_enrich::WeatherCondition;
    ///
    /// assert_eq!(WeatherCondition::from_code(63), Some(WeatherCondition::Rain));
    /// assert_eq!(WeatherCondition::from_code(4), None);
    /// ```
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(WeatherCondition::ClearSky),
            1 => Some(WeatherCondition::MainlyClear),
            2 => Some(WeatherCondition::PartlyCloudy),
            3 => Some(WeatherCondition::Overcast),
            45 => Some(WeatherCondition::Fog),
            48 => Some(WeatherCondition::RimeFog),
            51 => Some(WeatherCondition::LightDrizzle),
            53 => Some(WeatherCondition::Drizzle),
            55 => Some(WeatherCondition::DenseDrizzle),
            56 => Some(WeatherCondition::LightFreezingDrizzle),
            57 => Some(WeatherCondition::DenseFreezingDrizzle),
            61 => Some(WeatherCondition::SlightRain),
            63 => Some(WeatherCondition::Rain),
            65 => Some(WeatherCondition::HeavyRain),
            66 => Some(WeatherCondition::LightFreezingRain),
            67 => Some(WeatherCondition::HeavyFreezingRain),
            71 => Some(WeatherCondition::SlightSnowfall),
            73 => Some(WeatherCondition::Snowfall),
            75 => Some(WeatherCondition::HeavySnowfall),
            77 => Some(WeatherCondition::SnowGrains),
            80 => Some(WeatherCondition::SlightRainShowers),
            81 => Some(WeatherCondition::RainShowers),
            82 => Some(WeatherCondition::ViolentRainShowers),
            85 => Some(WeatherCondition::SlightSnowShowers),
            86 => Some(WeatherCondition::HeavySnowShowers),
            95 => Some(WeatherCondition::Thunderstorm),
            96 => Some(WeatherCondition::ThunderstormSlightHail),
            99 => Some(WeatherCondition::ThunderstormHeavyHail),
            _ => None,
        }
    }

    /// The human readable label written into enriched records.
    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::ClearSky => "Clear sky",
            WeatherCondition::MainlyClear => "Mainly clear",
            WeatherCondition::PartlyCloudy => "Partly cloudy",
            WeatherCondition::Overcast => "Overcast",
            WeatherCondition::Fog => "Foggy",
            WeatherCondition::RimeFog => "Depositing rime fog",
            WeatherCondition::LightDrizzle => "Light drizzle",
            WeatherCondition::Drizzle => "Moderate drizzle",
            WeatherCondition::DenseDrizzle => "Dense drizzle",
            WeatherCondition::LightFreezingDrizzle => "Light freezing drizzle",
            WeatherCondition::DenseFreezingDrizzle => "Dense freezing drizzle",
            WeatherCondition::SlightRain => "Slight rain",
            WeatherCondition::Rain => "Moderate rain",
            WeatherCondition::HeavyRain => "Heavy rain",
            WeatherCondition::LightFreezingRain => "Light freezing rain",
            WeatherCondition::HeavyFreezingRain => "Heavy freezing rain",
            WeatherCondition::SlightSnowfall => "Slight snow fall",
            WeatherCondition::Snowfall => "Moderate snow fall",
            WeatherCondition::HeavySnowfall => "Heavy snow fall",
            WeatherCondition::SnowGrains => "Snow grains",
            WeatherCondition::SlightRainShowers => "Slight rain showers",
            WeatherCondition::RainShowers => "Moderate rain showers",
            WeatherCondition::ViolentRainShowers => "Violent rain showers",
            WeatherCondition::SlightSnowShowers => "Slight snow showers",
            WeatherCondition::HeavySnowShowers => "Heavy snow showers",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::ThunderstormSlightHail => "Thunderstorm with slight hail",
            WeatherCondition::ThunderstormHeavyHail => "Thunderstorm with heavy hail",
        }
    }

    /// Label for an arbitrary code, falling back to [`UNKNOWN_CONDITION`].
    pub fn label_for_code(code: i64) -> &'static str {
        Self::from_code(code)
            .map(|condition| condition.label())
            .unwrap_or(UNKNOWN_CONDITION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_round_trip_to_discriminant() {
        for code in [0, 1, 2, 3, 45, 48, 61, 75, 86, 99] {
            let condition = WeatherCondition::from_code(code).unwrap();
            assert_eq!(condition as i64, code);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(WeatherCondition::label_for_code(0), "Clear sky");
        assert_eq!(WeatherCondition::label_for_code(45), "Foggy");
        assert_eq!(WeatherCondition::label_for_code(96), "Thunderstorm with slight hail");
        assert_eq!(WeatherCondition::label_for_code(4), UNKNOWN_CONDITION);
        assert_eq!(WeatherCondition::label_for_code(-1), UNKNOWN_CONDITION);
    }
}
