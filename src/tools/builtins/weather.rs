//! Weather tools.
//!
//! `get_weather` reports current conditions and a daily forecast using the
//! wttr.in JSON format (`?format=j1`).

use crate::arguments::ValidatedArguments;
use crate::schema::{Field, FieldType};
use crate::tools::definition::{ToolConfig, ToolDefinition};
use crate::tools::error::ToolError;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Module path used for registration.
pub const MODULE_PATH: &str = module_path!();

/// Tool name.
pub const GET_WEATHER: &str = "get_weather";

const WTTR_URL: &str = "https://wttr.in/";

/// wttr.in serves at most three forecast days.
const MAX_DAYS: usize = 3;

/// Returns the definitions declared in this module.
///
/// # Errors
///
/// Returns a registration error if a definition is invalid.
pub fn exports() -> Result<Vec<ToolDefinition>, ToolError> {
    Ok(vec![get_weather()?])
}

/// Builds the `get_weather` tool.
///
/// # Errors
///
/// Returns a registration error if the definition is invalid.
pub fn get_weather() -> Result<ToolDefinition, ToolError> {
    ToolDefinition::builder(ToolConfig::new(
        GET_WEATHER,
        "Get the current weather and a daily forecast (up to 3 days) for a city.",
    ))
    .field(Field::new(
        "city",
        FieldType::String,
        "City name, optionally with country, e.g. 'Tokyo' or 'Paris, France'",
    ))
    .field(
        Field::new(
            "days",
            FieldType::Integer,
            "Number of forecast days to include, 1 to 3",
        )
        .with_default(1),
    )
    .asynchronous(fetch_weather)
    .render_with(render_weather)
    .defined_in(MODULE_PATH)
    .build()
}

#[derive(Debug, Deserialize)]
struct Args {
    city: String,
    days: i64,
}

fn forecast_url(city: &str) -> Result<Url, ToolError> {
    let mut url = Url::parse(WTTR_URL)
        .map_err(|e| ToolError::execution_failed(GET_WEATHER, e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ToolError::execution_failed(GET_WEATHER, "base URL cannot hold a path"))?
        .pop_if_empty()
        .push(city.trim());
    url.query_pairs_mut().append_pair("format", "j1");
    Ok(url)
}

async fn fetch_weather(args: ValidatedArguments) -> Result<Value, ToolError> {
    let args: Args = args.deserialize(GET_WEATHER)?;
    if args.city.trim().is_empty() {
        return Err(ToolError::execution_failed(GET_WEATHER, "city is empty"));
    }
    let days = args.days.clamp(1, MAX_DAYS as i64) as usize;

    let client = super::http_client(GET_WEATHER)?;
    let mut body = super::get_json(GET_WEATHER, client.get(forecast_url(&args.city)?)).await?;

    if let Some(forecast) = body.get_mut("weather").and_then(Value::as_array_mut) {
        forecast.truncate(days);
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct Text {
    value: String,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    humidity: String,
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<Text>,
}

#[derive(Debug, Deserialize)]
struct DailyForecast {
    date: String,
    #[serde(rename = "mintempC")]
    min_temp_c: String,
    #[serde(rename = "maxtempC")]
    max_temp_c: String,
}

#[derive(Debug, Deserialize)]
struct Area {
    #[serde(rename = "areaName")]
    area_name: Vec<Text>,
    country: Vec<Text>,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    current_condition: Vec<CurrentCondition>,
    #[serde(default)]
    weather: Vec<DailyForecast>,
    #[serde(default)]
    nearest_area: Vec<Area>,
}

fn first(texts: &[Text]) -> &str {
    texts.first().map_or("", |t| t.value.as_str())
}

fn render_weather(value: &Value) -> Result<String, ToolError> {
    let response: WeatherResponse = serde_json::from_value(value.clone()).map_err(|e| {
        ToolError::execution_failed(GET_WEATHER, format!("unexpected response shape: {e}"))
    })?;
    let current = response
        .current_condition
        .first()
        .ok_or_else(|| ToolError::execution_failed(GET_WEATHER, "no current conditions"))?;

    let place = match response.nearest_area.first() {
        Some(area) => format!("{}, {}", first(&area.area_name), first(&area.country)),
        None => "the requested location".to_string(),
    };

    let mut out = format!(
        "Weather in {place}: {}, {}°C (feels like {}°C), humidity {}%.",
        first(&current.weather_desc),
        current.temp_c,
        current.feels_like_c,
        current.humidity
    );
    for day in &response.weather {
        out.push_str(&format!(
            "\n{}: {}°C to {}°C",
            day.date, day.min_temp_c, day.max_temp_c
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "current_condition": [{
                "temp_C": "12",
                "FeelsLikeC": "10",
                "humidity": "71",
                "weatherDesc": [{"value": "Partly cloudy"}]
            }],
            "nearest_area": [{
                "areaName": [{"value": "Tokyo"}],
                "country": [{"value": "Japan"}]
            }],
            "weather": [
                {"date": "2024-12-14", "mintempC": "4", "maxtempC": "13"},
                {"date": "2024-12-15", "mintempC": "5", "maxtempC": "12"}
            ]
        })
    }

    #[test]
    fn render_summarizes_conditions_and_forecast() {
        let text = render_weather(&fixture()).unwrap();
        assert_eq!(
            text,
            "Weather in Tokyo, Japan: Partly cloudy, 12°C (feels like 10°C), humidity 71%.\n\
             2024-12-14: 4°C to 13°C\n\
             2024-12-15: 5°C to 12°C"
        );
    }

    #[test]
    fn render_rejects_missing_conditions() {
        assert!(render_weather(&json!({"current_condition": []})).is_err());
        assert!(render_weather(&json!("Unknown location")).is_err());
    }

    #[test]
    fn forecast_url_encodes_city() {
        let url = forecast_url("New York").unwrap();
        assert_eq!(url.as_str(), "https://wttr.in/New%20York?format=j1");
    }

    #[test]
    fn city_is_required() {
        let def = get_weather().unwrap();
        assert!(def.parse_arguments("{}").is_err());
        let args = def.parse_arguments(r#"{"city": "Tokyo"}"#).unwrap();
        assert_eq!(args.get("days"), Some(&json!(1)));
    }
}
