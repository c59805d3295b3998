use clap::Parser;
use eyre::Context;
use multi_uploader::files::{self, VideoFile};
use multi_uploader::schedule::parse_schedule_time;
use multi_uploader::{
    AccountId, BatchReport, BatchRequest, Config, Orchestrator, Outcome, PlatformId,
    UploadOptions, Visibility, YouTubeUploader,
};
use std::path::PathBuf;

/// multi-uploader: upload local videos to YouTube (and, eventually, other platforms).
///
/// Scheduled uploads are uploaded right away as unlisted. Publish them at the intended time with
/// `--publish <VIDEO_ID>`.
#[derive(Parser, Debug)]
#[command(name = "multi-uploader", version, about)]
struct Args {
    /// Upload a single video file
    #[arg(short, long, conflicts_with = "directory")]
    video: Option<PathBuf>,

    /// Upload every supported video in this directory [default: VIDEOS_DIR, or ./videos]
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Comma-separated platforms: youtube, instagram, facebook, or all
    #[arg(short, long, default_value = "youtube")]
    platforms: String,

    /// Video title [default: DEFAULT_VIDEO_TITLE]
    #[arg(short, long)]
    title: Option<String>,

    /// Video description [default: DEFAULT_VIDEO_DESCRIPTION]
    #[arg(long)]
    description: Option<String>,

    /// Comma-separated tags [default: DEFAULT_VIDEO_TAGS]
    #[arg(long)]
    tags: Option<String>,

    /// private, unlisted, or public [default: public]
    #[arg(long)]
    privacy: Option<Visibility>,

    /// Intended publish time, e.g. 2024-01-15T10:30:00 (local time) or 2024-01-15T10:30:00Z
    #[arg(short, long)]
    schedule: Option<String>,

    /// Validate files against platform limits without uploading anything
    #[arg(long)]
    dry_run: bool,

    /// Show configuration and check each YouTube account, then exit
    #[arg(long)]
    info: bool,

    /// YouTube account slot (A-F) [default: first configured]
    #[arg(short, long)]
    account: Option<String>,

    /// YouTube category id [default: 22, People & Blogs]
    #[arg(long)]
    category: Option<String>,

    /// Mark the uploads as made for kids
    #[arg(long)]
    made_for_kids: bool,

    /// Set the visibility of an already uploaded video to --privacy (default public) and exit
    #[arg(long, value_name = "VIDEO_ID")]
    publish: Option<String>,

    /// List your uploaded videos that have this visibility and exit
    #[arg(long, value_name = "VISIBILITY")]
    list: Option<Visibility>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    multi_uploader::init_tracing();
    let args = Args::parse();
    let config = Config::from_env();

    if args.info {
        return show_info(&config).await;
    }

    let account = args
        .account
        .as_deref()
        .map(str::parse::<AccountId>)
        .transpose()?;

    if let Some(video_id) = &args.publish {
        let uploader = YouTubeUploader::from_config(&config)?;
        let visibility = args.privacy.unwrap_or(Visibility::Public);
        uploader
            .set_visibility(video_id, visibility, account.as_ref())
            .await
            .with_context(|| format!("publish video {video_id}"))?;
        println!("✅ {video_id} is now {visibility}: https://www.youtube.com/watch?v={video_id}");
        return Ok(());
    }

    if let Some(visibility) = args.list {
        let uploader = YouTubeUploader::from_config(&config)?;
        let videos = uploader
            .list_by_visibility(visibility, account.as_ref())
            .await
            .context("list uploaded videos")?;
        println!("{} {visibility} video(s):", videos.len());
        for video in videos {
            let published = video
                .published_at
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("  {}  {}  {}  {}", video.id, published, video.title, video.url);
        }
        return Ok(());
    }

    let platforms = PlatformId::parse_list(&args.platforms)?;
    if platforms.is_empty() {
        eyre::bail!("no platforms given");
    }

    let scheduled_time = args
        .schedule
        .as_deref()
        .map(parse_schedule_time)
        .transpose()?;

    let videos = match &args.video {
        Some(path) => vec![files::resolve(path)?],
        None => {
            let dir = args.directory.as_ref().unwrap_or(&config.videos_dir);
            files::scan_directory(dir)?
        }
    };
    if videos.is_empty() {
        println!("No video files found.");
        return Ok(());
    }
    print_videos(&videos);

    let orchestrator = Orchestrator::from_config(&config)?;

    let batch = BatchRequest {
        files: videos,
        platforms,
        options: UploadOptions {
            title: args.title,
            description: args.description,
            tags: args.tags.as_deref().map(multi_uploader::config::split_tags),
            category_id: args.category,
            visibility: args.privacy,
            made_for_kids: args.made_for_kids.then_some(true),
            account,
        },
        dry_run: args.dry_run,
        scheduled_time,
        platform_schedules: Default::default(),
    };

    if let Some(at) = scheduled_time {
        println!(
            "⏰ Scheduling for {at}. Videos are uploaded now as unlisted; publish them then with --publish <VIDEO_ID>."
        );
    }

    let report = orchestrator.run(&batch).await;
    print_report(&report);
    Ok(())
}

fn print_videos(videos: &[VideoFile]) {
    println!("Found {} video(s):", videos.len());
    for video in videos {
        println!(
            "  {} ({})",
            video.name(),
            files::format_file_size(video.size())
        );
    }
}

fn print_report(report: &BatchReport) {
    for (platform, results) in &report.results {
        println!();
        println!("{platform}:");
        for result in results {
            let name = result
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| result.path.display().to_string());
            match &result.outcome {
                Outcome::Uploaded {
                    url,
                    scheduled_time: Some(at),
                    ..
                } => println!("  ✅ {name}: {url} (unlisted; publish at {at})"),
                Outcome::Uploaded { url, .. } => println!("  ✅ {name}: {url}"),
                Outcome::Validated { .. } => println!("  ✓ {name}: ready to upload"),
                Outcome::Failed { error } => println!("  ❌ {name}: {error}"),
            }
        }
        println!(
            "  {} succeeded, {} failed{}",
            report.success_count(*platform),
            report.failure_count(*platform),
            if report.dry_run { " (dry run)" } else { "" }
        );
    }
}

async fn show_info(config: &Config) -> eyre::Result<()> {
    println!("Videos directory: {}", config.videos_dir.display());
    println!("Default title: {}", config.defaults.title);
    println!("Default description: {}", config.defaults.description);
    println!("Default tags: {}", config.defaults.tags.join(", "));
    println!("Pause between uploads: {:?}", config.upload_interval);
    println!();
    for platform in PlatformId::ALL {
        let limits = platform.limits();
        println!(
            "{platform}: up to {}, formats: {}",
            files::format_file_size(limits.max_bytes),
            limits.extensions.join(", ")
        );
    }
    println!();

    let uploader = YouTubeUploader::from_config(config)?;
    for account in uploader.accounts() {
        match uploader.get_quota(Some(account)).await {
            Some(info) => println!("YouTube account {account}: connected ({})", info.title),
            None => println!("YouTube account {account}: not reachable"),
        }
    }
    Ok(())
}
