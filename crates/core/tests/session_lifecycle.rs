//! Download session lifecycle integration tests.
//!
//! These run whole sessions against a temporary library:
//! queued -> fetching_metadata -> transferring -> placing -> done

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use chapterbay_core::{
    metadata::{self, MetadataIndex, VideoStatus},
    placer::PlacementOutcome,
    registry::read_snapshot,
    testing::{fixtures, MockDescriptorSource, MockTransferClient},
    ChapterRange, DownloadSession, FsPlacer, JobOutcomeKind, JobStatus, Placer, PlacerConfig,
    PlacerError, ProgressRegistry, ReleaseJob, SessionConfig,
};

/// Holds every file for a while before handing it to the real placer.
struct SlowPlacer {
    inner: FsPlacer,
    delay: Duration,
}

#[async_trait]
impl Placer for SlowPlacer {
    fn name(&self) -> &str {
        "slow"
    }

    async fn place(
        &self,
        source: &Path,
        index: &MetadataIndex,
        range: &ChapterRange,
    ) -> Result<Option<PlacementOutcome>, PlacerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.place(source, index, range).await
    }

    async fn validate(&self) -> Result<(), PlacerError> {
        self.inner.validate().await
    }
}

fn part_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".part"))
                .collect()
        })
        .unwrap_or_default()
}

/// Temporary library plus work root for one session.
struct TestHarness {
    library: TempDir,
    work: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let library = TempDir::new().expect("Failed to create library dir");
        fixtures::sample_library(library.path()).expect("Failed to write sample library");
        Self {
            library,
            work: TempDir::new().expect("Failed to create work dir"),
        }
    }

    fn root(&self) -> &Path {
        self.library.path()
    }

    fn config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_work_root(self.work.path())
            .with_max_concurrent_jobs(2)
            .with_poll_interval(Duration::from_millis(10))
            .with_grace_period(Duration::from_millis(300))
    }

    fn session(
        &self,
        config: SessionConfig,
        transfer: MockTransferClient,
        descriptors: MockDescriptorSource,
        registry: Arc<ProgressRegistry>,
    ) -> DownloadSession {
        let placer = Arc::new(FsPlacer::with_defaults(self.root()));
        self.session_with_placer(config, transfer, descriptors, registry, placer)
    }

    fn session_with_placer(
        &self,
        config: SessionConfig,
        transfer: MockTransferClient,
        descriptors: MockDescriptorSource,
        registry: Arc<ProgressRegistry>,
        placer: Arc<dyn Placer>,
    ) -> DownloadSession {
        let index = metadata::build(self.root()).expect("Failed to build index");
        DownloadSession::new(
            config,
            Arc::new(transfer),
            Arc::new(descriptors),
            placer,
            registry,
        )
        .with_index(Arc::new(index))
    }
}

#[tokio::test]
async fn test_same_range_different_quality_places_both() {
    let harness = TestHarness::new();
    let transfer = MockTransferClient::new();
    transfer
        .add_file_for(1, "[One Pace][8-11] Orange Town [720p].mkv", b"small video")
        .await;
    transfer
        .add_file_for(2, "[One Pace][8-11] Orange Town [1080p].mp4", b"bigger video")
        .await;

    let jobs = vec![
        ReleaseJob::from_release_title(1, "[One Pace][8-11] Orange Town [720p][AAAA1111].mkv"),
        ReleaseJob::from_release_title(2, "[One Pace][8-11] Orange Town [1080p][BBBB2222].mp4"),
    ];

    let session = harness.session(
        harness.config(),
        transfer,
        MockDescriptorSource::new(),
        Arc::new(ProgressRegistry::new()),
    );
    let report = session.run(jobs, CancellationToken::new()).await;

    assert!(report.all_completed(), "report: {:?}", report.lines());
    assert_eq!(report.jobs[0].title, "Orange Town (720p)");
    assert_eq!(report.jobs[1].title, "Orange Town (1080p)");

    let season = harness.root().join("Season 2");
    let mkv = season.join("One Pace - S02E01 - Orange Town.mkv");
    let mp4 = season.join("One Pace - S02E01 - Orange Town.mp4");
    assert_eq!(std::fs::read(&mkv).unwrap(), b"small video");
    assert_eq!(std::fs::read(&mp4).unwrap(), b"bigger video");

    let index = metadata::build(harness.root()).unwrap();
    assert_eq!(
        metadata::video_status(&index, harness.root(), &ChapterRange::new(8, 11).unwrap()),
        VideoStatus::Complete
    );
    assert_eq!(
        metadata::video_status(&index, harness.root(), &ChapterRange::new(8, 14).unwrap()),
        VideoStatus::Partial
    );

    // Work directories are gone after the session.
    assert!(!harness.work.path().join("chapterbay-tmp-1").exists());
    assert!(!harness.work.path().join("chapterbay-tmp-2").exists());
}

#[tokio::test]
async fn test_unknown_range_lands_in_stray_folder() {
    let harness = TestHarness::new();
    let transfer = MockTransferClient::new();
    transfer.add_file("Mystery Arc.mkv", b"video").await;

    let job = ReleaseJob::new("Mystery Arc", 77)
        .with_chapter_range(ChapterRange::new(99999, 99999).unwrap());

    let session = harness.session(
        harness.config(),
        transfer,
        MockDescriptorSource::new(),
        Arc::new(ProgressRegistry::new()),
    );
    let report = session.run(vec![job], CancellationToken::new()).await;

    assert_eq!(report.jobs[0].kind, JobOutcomeKind::Completed);
    assert_eq!(report.jobs[0].status, JobStatus::Done);
    assert_eq!(report.jobs[0].placements.len(), 1);
    assert!(report.jobs[0].placements[0].starts_with("Stray: "));
    assert!(harness
        .root()
        .join("strayvideos")
        .join("99999-99999")
        .join("Mystery Arc.mkv")
        .exists());
}

#[tokio::test]
async fn test_failed_fetch_does_not_affect_other_jobs() {
    let harness = TestHarness::new();
    let transfer = MockTransferClient::new();
    transfer
        .add_file_for(1, "[One Pace][1-7] Romance Dawn [480p].mkv", b"video")
        .await;
    let descriptors = MockDescriptorSource::new();
    descriptors.fail_for(2, 404).await;

    let jobs = vec![
        ReleaseJob::from_release_title(1, "[One Pace][1-7] Romance Dawn [480p][CCCC3333].mkv"),
        ReleaseJob::from_release_title(2, "[One Pace][12-14] The Circus [480p][DDDD4444].mkv"),
    ];

    let session = harness.session(
        harness.config(),
        transfer,
        descriptors,
        Arc::new(ProgressRegistry::new()),
    );
    let report = session.run(jobs, CancellationToken::new()).await;

    assert_eq!(report.completed_count(), 1);
    assert_eq!(report.jobs[0].kind, JobOutcomeKind::Completed);
    assert_eq!(report.jobs[1].kind, JobOutcomeKind::FetchFailed);
    assert_eq!(report.jobs[1].status, JobStatus::Failed);
    assert!(report.jobs[1].message.starts_with("Failed: "));
    assert!(harness
        .root()
        .join("Season 1")
        .join("One Pace - S01E01 - Romance Dawn.mkv")
        .exists());
}

#[tokio::test]
async fn test_cancellation_returns_within_grace_period() {
    let harness = TestHarness::new();
    let transfer = MockTransferClient::new().never_completes();
    let shutdowns = transfer.shutdown_counter();
    transfer.add_file("partial.mkv", b"part").await;

    let snapshot = harness.work.path().join("active.json");
    let registry = Arc::new(ProgressRegistry::with_snapshot_file(&snapshot));
    let config = harness.config();
    let grace = config.grace_period();
    let session = harness.session(
        config,
        transfer,
        MockDescriptorSource::new(),
        Arc::clone(&registry),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let snapshot_probe = snapshot.clone();
    let probe = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        // In-flight state is visible to other processes while running.
        let records = read_snapshot(&snapshot_probe).unwrap();
        trigger.cancel();
        records
    });

    let started = Instant::now();
    let job = ReleaseJob::from_release_title(5, "[One Pace][8-11] Orange Town [720p][EEEE5555].mkv");
    let report = session.run(vec![job], cancel).await;
    let elapsed = started.elapsed();

    let seen = probe.await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].status, JobStatus::Transferring);

    assert!(report.cancelled);
    assert_eq!(report.jobs[0].kind, JobOutcomeKind::Cancelled);
    assert_eq!(report.jobs[0].status, JobStatus::Cancelled);
    assert!(elapsed < Duration::from_millis(100) + grace + Duration::from_secs(1));
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

    // Nothing was placed, and session state is cleaned up.
    assert!(!harness
        .root()
        .join("Season 2")
        .join("One Pace - S02E01 - Orange Town.mkv")
        .exists());
    assert!(!snapshot.exists());
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_same_extension_releases_last_writer_wins() {
    let harness = TestHarness::new();
    let transfer = MockTransferClient::new();
    transfer
        .add_file_for(1, "[One Pace][8-11] Orange Town [720p].mkv", b"small video")
        .await;
    transfer
        .add_file_for(2, "[One Pace][8-11] Orange Town [1080p].mkv", b"bigger video")
        .await;

    let jobs = vec![
        ReleaseJob::from_release_title(1, "[One Pace][8-11] Orange Town [720p][AAAA1111].mkv"),
        ReleaseJob::from_release_title(2, "[One Pace][8-11] Orange Town [1080p][BBBB2222].mkv"),
    ];

    let session = harness.session(
        harness.config(),
        transfer,
        MockDescriptorSource::new(),
        Arc::new(ProgressRegistry::new()),
    );
    let report = session.run(jobs, CancellationToken::new()).await;
    assert!(report.all_completed(), "report: {:?}", report.lines());

    // One destination, holding exactly one of the two releases.
    let season = harness.root().join("Season 2");
    let placed = std::fs::read(season.join("One Pace - S02E01 - Orange Town.mkv")).unwrap();
    assert!(placed == b"small video" || placed == b"bigger video");
    assert!(part_files(&season).is_empty());
}

#[tokio::test]
async fn test_cancellation_during_placement_keeps_the_file() {
    let harness = TestHarness::new();
    let transfer = MockTransferClient::new();
    transfer
        .add_file("[One Pace][8-11] Orange Town [720p].mkv", &vec![3u8; 4 * 1024 * 1024])
        .await;

    let placer = Arc::new(SlowPlacer {
        inner: FsPlacer::new(
            harness.root(),
            PlacerConfig::default()
                .with_atomic_moves(false)
                .with_checksum_verification(true),
        ),
        delay: Duration::from_millis(300),
    });
    let registry = Arc::new(ProgressRegistry::new());
    let config = harness
        .config()
        .with_max_concurrent_jobs(1)
        .with_grace_period(Duration::from_millis(20));
    let session = harness.session_with_placer(
        config,
        transfer,
        MockDescriptorSource::new(),
        Arc::clone(&registry),
        placer,
    );

    // Cancel as soon as the job starts placing.
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let watched = Arc::clone(&registry);
    let watcher = tokio::spawn(async move {
        for _ in 0..400 {
            if watched.get(9).map(|r| r.status) == Some(JobStatus::Placing) {
                trigger.cancel();
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    });

    let job = ReleaseJob::from_release_title(9, "[One Pace][8-11] Orange Town [720p][FFFF6666].mkv");
    let report = session.run(vec![job], cancel).await;
    assert!(watcher.await.unwrap(), "job never reached placing");

    assert!(report.cancelled);
    assert_eq!(report.jobs[0].status, JobStatus::Cancelled);
    assert_eq!(report.jobs[0].placements.len(), 1);

    let season = harness.root().join("Season 2");
    let destination = season.join("One Pace - S02E01 - Orange Town.mkv");
    assert_eq!(std::fs::metadata(&destination).unwrap().len(), 4 * 1024 * 1024);
    assert!(part_files(&season).is_empty());
    assert!(!harness.work.path().join("chapterbay-tmp-9").exists());
}
