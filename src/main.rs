use anyhow::Result;
use clap::{Parser, Subcommand};
use image_scout::config::DiscoveryConfig;
use image_scout::discovery::{Aggregator, Availability, REGISTRY};
use image_scout::types::{DEFAULT_COUNT, ProbeStatus, SourceReport};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "image-scout")]
#[command(about = "多來源圖片搜尋工具")]
#[command(version)]
struct Cli {
    /// 顯示詳細日誌
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 每分鐘對外請求上限
    #[arg(long, global = true)]
    rate_limit: Option<usize>,

    /// 單次請求超時（秒）
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// 啟用的來源（逗號分隔）
    #[arg(long, global = true, value_delimiter = ',')]
    sources: Option<Vec<String>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 搜尋圖片
    Search {
        /// 搜尋關鍵字
        #[arg(required = true)]
        query: Vec<String>,
        /// 回傳數量（上限 50）
        #[arg(short = 'n', long, default_value_t = DEFAULT_COUNT)]
        count: usize,
        /// 以 JSON 輸出
        #[arg(long)]
        json: bool,
    },

    /// 逐一測試每個來源
    Probe {
        #[arg(default_value = "anime")]
        query: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        #[arg(long)]
        json: bool,
    },

    /// 列出所有來源與 API key 狀態
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "image_scout=info"
    } else {
        "image_scout=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Search { query, count, json } => {
            run_search(&config, &query.join(" "), count, json).await?
        }
        Commands::Probe { query, count, json } => {
            run_probe(&config, &query, count, json).await?
        }
        Commands::Sources => print_sources(&config),
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<DiscoveryConfig> {
    let mut config = DiscoveryConfig::from_env()?;

    if let Some(rate) = cli.rate_limit {
        config = config.with_rate_limit(rate);
    }
    if let Some(timeout) = cli.timeout {
        config = config.with_timeout(timeout);
    }
    if let Some(sources) = &cli.sources {
        config = config.with_sources(sources);
    }

    config.validate()?;
    Ok(config)
}

async fn run_search(config: &DiscoveryConfig, query: &str, count: usize, json: bool) -> Result<()> {
    let engine = Aggregator::from_config(config)?;
    let urls = engine.search(query, count).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&urls)?);
        return Ok(());
    }

    if urls.is_empty() {
        println!("⚠️  「{}」沒有找到任何圖片", query);
        return Ok(());
    }

    println!("🔍 「{}」找到 {} 張圖片:\n", query, urls.len());
    for (i, url) in urls.iter().enumerate() {
        println!("{:>3}. {}", i + 1, url);
    }

    Ok(())
}

async fn run_probe(config: &DiscoveryConfig, query: &str, count: usize, json: bool) -> Result<()> {
    let engine = Aggregator::from_config(config)?;
    let names = engine.source_names();

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} 個來源")?
            .progress_chars("=>-"),
    );
    pb.set_message(format!("🧪 測試查詢「{}」", query));

    let reports = engine
        .probe(query, count, |report| {
            pb.set_message(format!("{} {}", status_icon(report), report.source));
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("\n╔══════════════════════════════════════════╗");
    println!("║   🧪 來源診斷報告                        ║");
    println!("╚══════════════════════════════════════════╝\n");

    for report in &reports {
        let detail = match &report.status {
            ProbeStatus::Ok => format!("{} 張", report.count),
            ProbeStatus::Empty => "沒有結果".to_string(),
            ProbeStatus::Failed(e) => e.clone(),
        };
        println!(
            "{} {:<10} {:>6} ms  {}",
            status_icon(report),
            report.source,
            report.elapsed_ms,
            detail
        );
    }

    let working = reports.iter().filter(|r| r.status == ProbeStatus::Ok).count();
    println!("\n📊 {}/{} 個來源可用", working, reports.len());

    Ok(())
}

fn status_icon(report: &SourceReport) -> &'static str {
    match report.status {
        ProbeStatus::Ok => "✅",
        ProbeStatus::Empty => "⚠️ ",
        ProbeStatus::Failed(_) => "❌",
    }
}

fn print_sources(config: &DiscoveryConfig) {
    println!("📋 圖片來源:\n");

    for desc in REGISTRY {
        let enabled = config.sources.iter().any(|s| s == desc.id);
        let status = match desc.availability(&config.api_keys) {
            Availability::Ready => "✅ 可用".to_string(),
            Availability::Fallback => "🔁 沒有 API key，改用網頁爬取".to_string(),
            Availability::MissingKey => {
                format!("🔑 需要 {}", desc.key_env.unwrap_or("API key"))
            }
        };
        println!(
            "  {} {:<10} {:<7} {}",
            if enabled { "●" } else { "○" },
            desc.id,
            desc.kind.as_str(),
            status
        );
    }

    println!("\n●: 已啟用  ○: 未啟用（用 --sources 或 IMAGE_SCOUT_SOURCES 調整）");
}
