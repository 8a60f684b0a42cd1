//! Cache diagnostics: prints audio cache statistics and runs one
//! maintenance pass.
//!
//! Usage: cache_report [CACHE_DIR] [MAX_SIZE_MB] [TTL_HOURS]

use motiva::cache::{AudioCache, AudioCacheConfig};

#[tokio::main]
async fn main() -> motiva::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| "./audio-cache".to_string());
    let max_size_mb = args.next().and_then(|s| s.parse().ok()).unwrap_or(50);
    let ttl_hours = args.next().and_then(|s| s.parse().ok()).unwrap_or(24);

    let cache = AudioCache::open(
        AudioCacheConfig::new(&dir)
            .with_max_size_mb(max_size_mb)
            .with_ttl_hours(ttl_hours),
    )
    .await?;

    let stats = cache.statistics().await;
    println!("audio cache at {dir}");
    println!("  entries:   {}", stats.total_items);
    println!(
        "  size:      {} of {max_size_mb} MB cap ({})",
        stats.total_size_display(),
        stats.health
    );
    println!("  avg entry: {:.1} KB", stats.average_file_size_kb);
    if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
        println!("  oldest:    {oldest}");
        println!("  newest:    {newest}");
    }
    println!("  expired:   {}", stats.expired_count);
    println!("  hit rate:  {:.0}%", stats.hit_rate * 100.0);

    let report = cache.perform_maintenance().await?;
    println!(
        "maintenance: removed {} expired, evicted {} for size",
        report.expired_removed, report.evicted_for_size
    );
    Ok(())
}
