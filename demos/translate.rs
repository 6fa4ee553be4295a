use stockai_completion::CompletionClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let target = args.next().unwrap_or_else(|| "fr".to_owned());
    let text = args.collect::<Vec<_>>().join(" ");
    let text = if text.is_empty() {
        "Markets closed higher today.".to_owned()
    } else {
        text
    };

    let client = CompletionClient::from_env().map_err(anyhow::Error::msg)?;
    let translation = client.translate(&text, "auto", &target, None).await?;

    println!("{}", translation.content);
    eprintln!(
        "source={} detected={:?} model={} latency={}ms tokens={:?}",
        translation.source_language,
        translation.detected_language,
        translation.model,
        translation.latency.as_millis(),
        translation.tokens_used
    );

    Ok(())
}
