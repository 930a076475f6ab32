use clap::Parser;
use site_map::render;
use site_map::screenshot::Screenshotter;
use site_map::{CrawlConfig, SiteMap};
use std::error::Error;
use std::path::PathBuf;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CrawlConfig::from_file(path)?,
        None => CrawlConfig::default(),
    };
    config.apply_env();
    args.apply(&mut config);

    ::log::info!("Mapping {} from {}", config.base_url, config.entry_path);

    let site_map = site_map::crawl_site(&config).await?;

    let images = if config.screenshot.enabled {
        capture_screenshots(&config, &site_map).await
    } else {
        vec![None; site_map.len()]
    };

    let graph = site_map.links_graph();
    let dot = render::to_dot(&graph, &images, &config.render);

    if args.dot {
        print!("{}", dot);
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
    }
    if let Some(output) = &config.render.output {
        render::render_image(&dot, output, &config.render).await?;
    }

    report(&site_map);
    Ok(())
}

/// Screenshots every visited page; a missing browser leaves the graph without images
async fn capture_screenshots(config: &CrawlConfig, site_map: &SiteMap) -> Vec<Option<PathBuf>> {
    let screenshot_config = config.screenshot_config();
    ::log::info!(
        "Taking screenshots through WebDriver at {} (set WEBDRIVER_URL to change it)",
        screenshot_config.webdriver_url
    );

    let screenshotter = match Screenshotter::connect(&screenshot_config).await {
        Ok(screenshotter) => screenshotter,
        Err(e) => {
            ::log::error!("Screenshots disabled: {}", e);
            return vec![None; site_map.len()];
        }
    };

    let images = screenshotter
        .capture_site(site_map, &screenshot_config.output_dir)
        .await;
    screenshotter.close().await;

    images.unwrap_or_else(|e| {
        ::log::error!("Screenshots failed: {}", e);
        vec![None; site_map.len()]
    })
}

fn report(site_map: &SiteMap) {
    let graph = site_map.links_graph();
    ::log::info!(
        "Mapped {} pages with {} links",
        graph.len(),
        graph.edge_count()
    );

    if !site_map.unreachable().is_empty() {
        eprintln!("{} unreachable pages:", site_map.unreachable().len());
        for unreachable in site_map.unreachable() {
            eprintln!("  {}: {}", unreachable.path, unreachable.error);
        }
    }

    if !site_map.skipped().is_empty() {
        eprintln!("{} skipped links:", site_map.skipped().len());
        for skipped in site_map.skipped() {
            eprintln!("  {} -> {} ({})", skipped.from, skipped.href, skipped.reason);
        }
    }
}
