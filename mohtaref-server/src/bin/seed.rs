use std::path::PathBuf;

use anyhow::{bail, Result};
use mohtaref_blob::RetryPolicy;
use mohtaref_server::seed::{seed_content, seed_gallery, seed_videos, ContentFixture};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let content_file = std::env::var_os("SEED_CONTENT_FILE").map(PathBuf::from);
    let video_dir = std::env::var_os("SEED_VIDEO_DIR").map(PathBuf::from);
    let gallery_dir = std::env::var_os("SEED_GALLERY_DIR").map(PathBuf::from);
    if content_file.is_none() && video_dir.is_none() && gallery_dir.is_none() {
        bail!("set at least one of SEED_CONTENT_FILE, SEED_VIDEO_DIR, SEED_GALLERY_DIR");
    }

    let (_app, settings) = mohtaref_server::app::site_app()?;
    let state = mohtaref_server::app::open_state(&settings).await?;
    let policy = RetryPolicy::default();

    if let Some(path) = content_file {
        let fixture = ContentFixture::load(&path).await?;
        let report = seed_content(&state, &fixture).await?;
        println!(
            "[seed] content: {} services, {} projects, {} testimonials, {} banners ({} cleared)",
            report.services, report.projects, report.testimonials, report.banners, report.cleared
        );
    }

    if let Some(dir) = video_dir {
        let report = seed_videos(&state, &dir, &policy).await?;
        println!(
            "[seed] videos: {} seeded, {} skipped",
            report.seeded.len(),
            report.skipped.len()
        );
    }

    if let Some(dir) = gallery_dir {
        let report = seed_gallery(&state, &dir, &policy).await?;
        println!(
            "[seed] gallery: {} seeded, {} skipped",
            report.seeded.len(),
            report.skipped.len()
        );
    }

    Ok(())
}
