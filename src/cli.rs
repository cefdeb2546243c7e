use crate::catalog::yandex;
use crate::config::Config;
use crate::errors::Result;
use crate::pipeline::{url, DownloadedTrack, Pipeline};
use crate::utils::{format_duration, sanitize_filename};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Yandex Music Downloader - fetch tracks from Yandex Music links
#[derive(Parser)]
#[command(name = "yandex-music-downloader")]
#[command(about = "Download audio tracks from Yandex Music track links")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a track from a Yandex Music link
    Download {
        /// Yandex Music URL (track or album track)
        url: String,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Yandex Music OAuth token (overrides config and environment)
        #[arg(long)]
        token: Option<String>,
    },

    /// Check whether a link is a supported Yandex Music URL
    Check {
        /// URL to check
        url: String,
    },
}

impl Cli {
    /// Execute the parsed command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Download { url, output, token } => download(url, output, token).await,
            Commands::Check { url } => {
                let normalized = url::normalize_url(url.trim());
                if url::validate_url(&normalized) {
                    match url::extract_track_id(&normalized) {
                        Some(id) => println!("✅ Supported track link (track id {})", id),
                        None => println!("⚠️ Valid Yandex Music link, but not a single track"),
                    }
                } else {
                    println!("❌ Not a supported Yandex Music link");
                }
                Ok(())
            }
        }
    }
}

async fn download(url: String, output: Option<PathBuf>, token: Option<String>) -> Result<()> {
    let mut config = Config::load()?;
    if token.is_some() {
        config.token = token;
    }

    let client = yandex::session(&config).await;
    let pipeline = Pipeline::new(client, &config);

    match pipeline.run(&url).await {
        Ok(track) => {
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            let dest = deliver(&track, &output_dir).await?;
            println!(
                "🎵 {} - {} [{}]",
                track.metadata.artist,
                track.metadata.title,
                format_duration(track.metadata.duration_secs)
            );
            println!("Saved to {}", dest.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            if let Some(hint) = e.advisory_hint() {
                eprintln!("💡 {}", hint);
            }
            Err(e)
        }
    }
}

/// Move the finished artifact into the output directory
///
/// The pipeline handed us ownership of the temp file, so it must be gone from
/// the temp directory when this returns, successfully delivered or not.
async fn deliver(track: &DownloadedTrack, output_dir: &Path) -> Result<PathBuf> {
    let filename = sanitize_filename(&format!(
        "{} - {}",
        track.metadata.artist, track.metadata.title
    ));
    let dest = output_dir.join(format!("{}.mp3", filename));

    let result = move_file(&track.file_path, output_dir, &dest).await;
    if result.is_err() {
        tokio::fs::remove_file(&track.file_path).await.ok();
    }
    result.map(|_| dest)
}

async fn move_file(source: &Path, output_dir: &Path, dest: &Path) -> Result<()> {
    tokio::fs::create_dir_all(output_dir).await?;
    // Rename fails across filesystems; fall back to copy + remove
    if tokio::fs::rename(source, dest).await.is_err() {
        tokio::fs::copy(source, dest).await?;
        tokio::fs::remove_file(source).await.ok();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TrackMetadata;

    #[tokio::test]
    async fn deliver_moves_artifact_out_of_temp() {
        let source = crate::utils::temp_file_path("mp3");
        std::fs::write(&source, vec![0u8; 2048]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let track = DownloadedTrack {
            file_path: source.clone(),
            metadata: TrackMetadata {
                title: "X".to_string(),
                artist: "Y".to_string(),
                duration_secs: 245,
            },
        };

        let dest = deliver(&track, dir.path()).await.unwrap();
        assert_eq!(dest, dir.path().join("Y - X.mp3"));
        assert!(dest.exists());
        assert!(!source.exists());
    }
}
