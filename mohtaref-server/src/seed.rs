//! Bulk import: site content from a JSON fixture, videos and gallery
//! images from local directories.
//!
//! Each media file is uploaded with [`retry_put`] and gets a document whose
//! `order` is its position in the directory listing (sorted by name).
//! A file that fails is logged and skipped; the rest still go in.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use mohtaref_blob::{retry_put, BlobPut, Bucket, RetryPolicy};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::collections::DocumentStore;
use crate::models::{new_document, Banner, Document, GalleryImage, Project, Service, Testimonial, Video};
use crate::services::SiteState;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub cleared: u64,
    pub seeded: Vec<String>,
    pub skipped: Vec<String>,
}

/// Raw documents per collection, as written by an editor.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ContentFixture {
    pub services: Vec<Value>,
    pub projects: Vec<Value>,
    pub testimonials: Vec<Value>,
    pub banners: Vec<Value>,
}

impl ContentFixture {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentReport {
    pub cleared: u64,
    pub services: usize,
    pub projects: usize,
    pub testimonials: usize,
    pub banners: usize,
}

fn build_all<T: Document>(raw: &[Value]) -> Result<Vec<T>> {
    raw.iter()
        .enumerate()
        .map(|(i, data)| {
            new_document(data.clone()).with_context(|| format!("{} entry {i}", T::COLLECTION))
        })
        .collect()
}

async fn replace_all<T: Document>(store: &dyn DocumentStore<T>, docs: Vec<T>) -> Result<(u64, usize)> {
    let cleared = store.clear().await?;
    let count = docs.len();
    for doc in docs {
        store.insert(doc).await?;
    }
    tracing::info!(collection = T::COLLECTION, cleared, seeded = count, "seeded collection");
    Ok((cleared, count))
}

/// Replace services, projects, testimonials and banners with `fixture`.
///
/// Every entry is validated before anything is cleared, so a bad fixture
/// leaves the collections as they were.
pub async fn seed_content(state: &SiteState, fixture: &ContentFixture) -> Result<ContentReport> {
    let services = build_all::<Service>(&fixture.services)?;
    let projects = build_all::<Project>(&fixture.projects)?;
    let testimonials = build_all::<Testimonial>(&fixture.testimonials)?;
    let banners = build_all::<Banner>(&fixture.banners)?;

    let mut report = ContentReport::default();
    let (cleared, n) = replace_all(state.services.as_ref(), services).await?;
    report.cleared += cleared;
    report.services = n;
    let (cleared, n) = replace_all(state.projects.as_ref(), projects).await?;
    report.cleared += cleared;
    report.projects = n;
    let (cleared, n) = replace_all(state.testimonials.as_ref(), testimonials).await?;
    report.cleared += cleared;
    report.testimonials = n;
    let (cleared, n) = replace_all(state.banners.as_ref(), banners).await?;
    report.cleared += cleared;
    report.banners = n;

    state.cache.clear();
    Ok(report)
}

/// Content type for a file, inferred from its extension.
pub fn content_type_for(bucket: Bucket, path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let ct = match (bucket, ext.as_str()) {
        (Bucket::Images, "jpg" | "jpeg") => "image/jpeg",
        (Bucket::Images, "png") => "image/png",
        (Bucket::Images, "webp") => "image/webp",
        (Bucket::Images, "gif") => "image/gif",
        (Bucket::Videos, "mp4") => "video/mp4",
        (Bucket::Videos, "webm") => "video/webm",
        (Bucket::Videos, "ogg" | "ogv") => "video/ogg",
        (Bucket::Videos, "mov") => "video/quicktime",
        (Bucket::Videos, "avi") => "video/x-msvideo",
        (Bucket::Videos, "mkv") => "video/x-matroska",
        _ => return None,
    };
    Some(ct)
}

async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn upload(
    state: &SiteState,
    policy: &RetryPolicy,
    bucket: Bucket,
    path: &Path,
    content_type: &str,
) -> Result<String> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    tracing::info!(file = %path.display(), size_mb = data.len() as f64 / 1_048_576.0, "uploading");

    let put = BlobPut::new()
        .with_content_type(content_type)
        .with_filename(file_name(path))
        .with_size_hint(data.len() as u64);
    let receipt = retry_put(&state.blobs, policy, bucket, put, Bytes::from(data)).await?;
    Ok(receipt.id.to_string())
}

/// Replace every video document with one per video file in `dir`.
pub async fn seed_videos(state: &SiteState, dir: &Path, policy: &RetryPolicy) -> Result<SeedReport> {
    let cleared = state.videos.clear().await?;
    tracing::info!(cleared, "cleared existing videos");

    let mut report = SeedReport {
        cleared,
        ..SeedReport::default()
    };

    for path in list_files(dir).await? {
        let name = file_name(&path);
        let Some(content_type) = content_type_for(Bucket::Videos, &path) else {
            tracing::warn!(file = %name, "not a video, skipping");
            report.skipped.push(name);
            continue;
        };

        let created = async {
            let video_id = upload(state, policy, Bucket::Videos, &path, content_type).await?;
            let doc: Video = new_document(json!({
                "video": video_id,
                "title": file_stem(&path),
                "order": report.seeded.len(),
            }))?;
            state.videos.insert(doc).await
        }
        .await;

        match created {
            Ok(video) => {
                tracing::info!(file = %name, id = video.id(), "seeded video");
                report.seeded.push(name);
            }
            Err(err) => {
                tracing::error!(file = %name, error = %err, "failed to seed video");
                report.skipped.push(name);
            }
        }
    }

    Ok(report)
}

/// Replace every gallery document with one per image file in `dir`.
pub async fn seed_gallery(state: &SiteState, dir: &Path, policy: &RetryPolicy) -> Result<SeedReport> {
    let cleared = state.gallery.clear().await?;
    tracing::info!(cleared, "cleared existing gallery images");

    let mut report = SeedReport {
        cleared,
        ..SeedReport::default()
    };

    for path in list_files(dir).await? {
        let name = file_name(&path);
        let Some(content_type) = content_type_for(Bucket::Images, &path) else {
            tracing::warn!(file = %name, "not an image, skipping");
            report.skipped.push(name);
            continue;
        };

        let created = async {
            let image_id = upload(state, policy, Bucket::Images, &path, content_type).await?;
            let doc: GalleryImage = new_document(json!({
                "image": image_id,
                "alt": file_stem(&path),
                "order": report.seeded.len(),
            }))?;
            state.gallery.insert(doc).await
        }
        .await;

        match created {
            Ok(image) => {
                tracing::info!(file = %name, id = image.id(), "seeded gallery image");
                report.seeded.push(name);
            }
            Err(err) => {
                tracing::error!(file = %name, error = %err, "failed to seed gallery image");
                report.skipped.push(name);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Filter;
    use crate::thumbnail::FfmpegExtractor;
    use mohtaref_blob::{BlobAdapter, BlobConfig, MemoryBlobStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn state() -> SiteState {
        let blobs = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default());
        SiteState::in_memory(blobs, Arc::new(FfmpegExtractor::default()))
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn content_types_follow_extensions() {
        assert_eq!(content_type_for(Bucket::Videos, Path::new("a.MP4")), Some("video/mp4"));
        assert_eq!(content_type_for(Bucket::Images, Path::new("a.webp")), Some("image/webp"));
        assert_eq!(content_type_for(Bucket::Images, Path::new("a.mp4")), None);
        assert_eq!(content_type_for(Bucket::Videos, Path::new("README")), None);
    }

    const CONTENT: &str = include_str!("../seed/content.json");

    #[tokio::test]
    async fn shipped_content_fixture_seeds_every_collection() {
        let fixture: ContentFixture = serde_json::from_str(CONTENT).unwrap();
        let state = state();

        let report = seed_content(&state, &fixture).await.unwrap();
        assert_eq!(
            report,
            ContentReport {
                cleared: 0,
                services: 6,
                projects: 8,
                testimonials: 6,
                banners: 3,
            }
        );

        let again = seed_content(&state, &fixture).await.unwrap();
        assert_eq!(again.cleared, 23);
        assert_eq!(state.services.list(&Filter::all()).await.unwrap().len(), 6);
        let approved = state.testimonials.list(&Filter::eq("approved", true)).await.unwrap();
        assert_eq!(approved.len(), 6);
    }

    #[tokio::test]
    async fn invalid_fixture_leaves_collections_alone() {
        let state = state();
        let good: ContentFixture = serde_json::from_str(CONTENT).unwrap();
        seed_content(&state, &good).await.unwrap();

        let bad: ContentFixture = serde_json::from_value(json!({
            "testimonials": [{"name": "X", "company": "Y", "rating": 9, "text": "Z"}],
        }))
        .unwrap();
        let err = seed_content(&state, &bad).await.unwrap_err();
        assert!(format!("{err:#}").contains("testimonials entry 0"));

        assert_eq!(state.services.list(&Filter::all()).await.unwrap().len(), 6);
        assert_eq!(state.testimonials.list(&Filter::all()).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn videos_are_seeded_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-drilling.mp4"), b"second").unwrap();
        std::fs::write(dir.path().join("a-cutting.webm"), b"first").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();

        let state = state();
        let report = seed_videos(&state, dir.path(), &fast()).await.unwrap();

        assert_eq!(report.seeded, vec!["a-cutting.webm", "b-drilling.mp4"]);
        assert_eq!(report.skipped, vec!["notes.txt"]);

        let videos = state.videos.list(&Filter::all()).await.unwrap();
        let titles: Vec<_> = videos.iter().map(|v| (v.title.as_str(), v.order)).collect();
        assert_eq!(titles, vec![("a-cutting", 0), ("b-drilling", 1)]);

        let opened = state.blobs.open(Bucket::Videos, &videos[0].video).await.unwrap();
        assert_eq!(&opened.bytes[..], b"first");
        assert_eq!(opened.content_type, "video/webm");
    }

    #[tokio::test]
    async fn reseeding_the_gallery_replaces_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.png"), b"png").unwrap();

        let state = state();
        seed_gallery(&state, dir.path(), &fast()).await.unwrap();
        let report = seed_gallery(&state, dir.path(), &fast()).await.unwrap();

        assert_eq!(report.cleared, 1);
        let gallery = state.gallery.list(&Filter::all()).await.unwrap();
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery[0].alt, "site");
    }
}
