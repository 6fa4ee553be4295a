//! Financial report prompts built from raw stock data.

use serde_json::Value;

use crate::{ChatMessage, CompletionClient, CompletionRequest, Result};

pub const ANALYST_SYSTEM_PROMPT: &str = "You are a professional financial analyst. Be concise, structured, and actionable. Avoid filler and disclaimers. Use short paragraphs and bullets.";

pub const REPORT_TEMPERATURE: f32 = 0.7;

const COMPARATIVE_PREAMBLE: &str = "Generate a comparative financial analysis for the following stocks. Use clear sections and bullet points, highlight trends, momentum, valuation signals if any, and an overall recommendation with risks.";

const SINGLE_PREAMBLE: &str = "Generate a concise financial report based on the following stock data:";

/// Daily aggregate bar; only the first bar of an entry is summarized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bar {
    pub close: Option<Value>,
    pub open: Option<Value>,
    pub high: Option<Value>,
    pub low: Option<Value>,
    pub volume: Option<Value>,
}

/// One item of a multi-stock request: `{ticker, name, data?, error?}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockEntry {
    pub ticker: String,
    pub name: String,
    pub first_bar: Option<Bar>,
    /// Set when fetching this item's data failed upstream.
    pub error: Option<String>,
}

/// Shape of the data handed to the report generator.
#[derive(Clone, Debug, PartialEq)]
pub enum ReportInput {
    /// Serialized verbatim into a narrative prompt.
    Single(Value),
    /// Summarized one line per item into a comparative prompt.
    Multi(Vec<StockEntry>),
}

impl ReportInput {
    /// An array counts as multi-stock as soon as one element has a ticker.
    pub fn from_json(data: &Value) -> Self {
        match data {
            Value::Array(items) if items.iter().any(|item| is_truthy(item.get("ticker"))) => {
                Self::Multi(items.iter().map(StockEntry::from_json).collect())
            }
            other => Self::Single(other.clone()),
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            Self::Single(data) => format!("{SINGLE_PREAMBLE} {data}"),
            Self::Multi(entries) => {
                let summaries = entries
                    .iter()
                    .map(StockEntry::summary_line)
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{COMPARATIVE_PREAMBLE}\n\n{summaries}")
            }
        }
    }
}

impl StockEntry {
    /// Lenient extraction; missing or odd-typed fields never fail.
    pub fn from_json(item: &Value) -> Self {
        let error = item
            .get("error")
            .filter(|value| is_truthy(Some(*value)))
            .map(render);
        let first_bar = item
            .get("data")
            .and_then(Value::as_array)
            .and_then(|bars| bars.first())
            .map(|bar| Bar {
                close: bar.get("c").cloned(),
                open: bar.get("o").cloned(),
                high: bar.get("h").cloned(),
                low: bar.get("l").cloned(),
                volume: bar.get("v").cloned(),
            });
        Self {
            ticker: item.get("ticker").map(render).unwrap_or_default(),
            name: item.get("name").map(render).unwrap_or_default(),
            first_bar,
            error,
        }
    }

    pub fn summary_line(&self) -> String {
        let label = format!("{} ({})", self.name, self.ticker);
        if let Some(error) = &self.error {
            return format!("{label}: error - {error}");
        }
        match &self.first_bar {
            Some(bar) => format!(
                "{label} => close:{} open:{} high:{} low:{} vol:{}",
                render_opt(&bar.close),
                render_opt(&bar.open),
                render_opt(&bar.high),
                render_opt(&bar.low),
                render_opt(&bar.volume),
            ),
            None => format!("{label}: no recent data"),
        }
    }
}

/// Builds the chat request for a financial report on `data`.
pub fn report_request(data: &Value, model: &str, max_tokens: u32) -> CompletionRequest {
    let prompt = ReportInput::from_json(data).prompt();
    CompletionRequest::new(
        model,
        vec![
            ChatMessage::system(ANALYST_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ],
    )
    .with_max_tokens(max_tokens)
    .with_temperature(REPORT_TEMPERATURE)
}

impl CompletionClient {
    /// Generates a financial report for a single stock payload or an array
    /// of `{ticker, name, data?, error?}` items.
    ///
    /// Returns an empty string when the model produced no content.
    pub async fn generate_report(&self, data: &Value) -> Result<String> {
        let config = self.config();
        let request = report_request(data, &config.model, config.max_tokens);
        let result = self.complete(&request).await?;
        Ok(result.into_text())
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(_) => true,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => render_number(n),
        other => other.to_string(),
    }
}

/// Whole floats print without a fraction, so `188.0` reads `188`.
fn render_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn render_opt(value: &Option<Value>) -> String {
    match value {
        Some(Value::Null) | None => "n/a".to_owned(),
        Some(value) => render(value),
    }
}
