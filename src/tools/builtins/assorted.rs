//! Assorted tools.
//!
//! `get_currencies` looks up the latest reference exchange rates.

use crate::arguments::ValidatedArguments;
use crate::schema::{Field, FieldType};
use crate::tools::definition::{ToolConfig, ToolDefinition};
use crate::tools::error::ToolError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Module path used for registration.
pub const MODULE_PATH: &str = module_path!();

/// Tool name.
pub const GET_CURRENCIES: &str = "get_currencies";

const FRANKFURTER_LATEST_URL: &str = "https://api.frankfurter.dev/v1/latest";

/// Currency symbols supported by the rates source.
pub const CURRENCY_SYMBOLS: [&str; 31] = [
    "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "IDR",
    "ILS", "INR", "ISK", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PLN", "RON", "SEK",
    "SGD", "THB", "TRY", "USD", "ZAR",
];

/// Returns the definitions declared in this module.
///
/// # Errors
///
/// Returns a registration error if a definition is invalid.
pub fn exports() -> Result<Vec<ToolDefinition>, ToolError> {
    Ok(vec![get_currencies()?])
}

/// Builds the `get_currencies` tool.
///
/// # Errors
///
/// Returns a registration error if the definition is invalid.
pub fn get_currencies() -> Result<ToolDefinition, ToolError> {
    ToolDefinition::builder(ToolConfig::new(
        GET_CURRENCIES,
        "This function retrieves the latest exchange rates for a base currency. \
         It provides standardized currency information for applications requiring \
         financial data or currency conversions.",
    ))
    .field(
        Field::new(
            "base",
            FieldType::enumeration(CURRENCY_SYMBOLS),
            "The base currency to convert from",
        )
        .with_default("USD"),
    )
    .field(Field::new(
        "symbols",
        FieldType::optional(FieldType::list(FieldType::enumeration(CURRENCY_SYMBOLS))),
        "The currencies to convert to",
    ))
    .asynchronous(fetch_rates)
    .render_with(render_rates)
    .defined_in(MODULE_PATH)
    .build()
}

#[derive(Debug, Deserialize)]
struct Args {
    base: String,
    #[serde(default)]
    symbols: Option<Vec<String>>,
}

/// Response body of the rates endpoint.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[allow(dead_code)]
    amount: f64,
    base: String,
    date: String,
    rates: BTreeMap<String, f64>,
}

async fn fetch_rates(args: ValidatedArguments) -> Result<Value, ToolError> {
    let args: Args = args.deserialize(GET_CURRENCIES)?;

    let mut query = vec![("base", args.base)];
    if let Some(symbols) = args.symbols.filter(|s| !s.is_empty()) {
        query.push(("symbols", symbols.join(",")));
    }

    let client = super::http_client(GET_CURRENCIES)?;
    super::get_json(GET_CURRENCIES, client.get(FRANKFURTER_LATEST_URL).query(&query)).await
}

fn render_rates(value: &Value) -> Result<String, ToolError> {
    if value.is_null() || value.as_object().is_some_and(|m| m.is_empty()) {
        return Err(ToolError::execution_failed(
            GET_CURRENCIES,
            "empty response content",
        ));
    }

    let response: RatesResponse = serde_json::from_value(value.clone()).map_err(|e| {
        ToolError::execution_failed(GET_CURRENCIES, format!("unexpected response shape: {e}"))
    })?;

    let formatted_rates = response
        .rates
        .iter()
        .map(|(symbol, rate)| format!("{symbol}: {rate}"))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "The base currency is {} on {}. Exchange rates:\n{}",
        response.base, response.date, formatted_rates
    ))
}
