use super::super::args::ConfigArg;
use crate::exit_codes::EXIT_SUCCESS;
use doceval_core::cache::ResponseCache;
use doceval_core::config::load_config;

fn open(args: &ConfigArg) -> anyhow::Result<ResponseCache> {
    let cfg = load_config(&args.config)?;
    Ok(ResponseCache::new(&cfg.settings.cache_dir))
}

pub(crate) async fn clear(args: &ConfigArg) -> anyhow::Result<i32> {
    let cache = open(args)?;
    let removed = cache.clear().await?;
    println!("removed {} cache entries from {}", removed, cache.dir().display());
    Ok(EXIT_SUCCESS)
}

pub(crate) async fn stats(args: &ConfigArg) -> anyhow::Result<i32> {
    let cache = open(args)?;
    let stats = cache.stats().await?;
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "dir": cache.dir().display().to_string(),
        "entries": stats.entries,
        "bytes": stats.bytes,
    }))?);
    Ok(EXIT_SUCCESS)
}
