use serde_json::json;
use stockai_completion::CompletionClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = CompletionClient::from_env().map_err(anyhow::Error::msg)?;

    let stocks = json!([
        {
            "ticker": "AAPL",
            "name": "Apple Inc.",
            "data": [{ "c": 190.5, "o": 188.0, "h": 191.2, "l": 187.9, "v": 51234000 }]
        },
        {
            "ticker": "MSFT",
            "name": "Microsoft Corporation",
            "data": [{ "c": 415.1, "o": 410.3, "h": 417.0, "l": 409.8, "v": 20311000 }]
        },
        { "ticker": "TSLA", "name": "Tesla, Inc.", "error": "timeout" }
    ]);

    match client.generate_report(&stocks).await {
        Ok(report) if report.is_empty() => eprintln!("model returned no content"),
        Ok(report) => println!("{report}"),
        Err(err) if err.is_rate_limit() => {
            let wait = err
                .retry_after_secs()
                .map_or_else(|| "a moment".to_owned(), |secs| format!("{secs}s"));
            eprintln!("rate limited, try again in {wait}");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
