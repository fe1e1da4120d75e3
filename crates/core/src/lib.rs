pub mod chapter;
pub mod config;
pub mod matcher;
pub mod metadata;
pub mod metrics;
pub mod placer;
pub mod registry;
pub mod release;
pub mod session;
pub mod testing;
pub mod transfer;
pub mod worker;

pub use chapter::{ChapterRange, InvalidRange};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, LibraryConfig, StatusServerConfig,
};
pub use metadata::{MetadataCache, MetadataError, MetadataIndex, VideoStatus};
pub use placer::{FsPlacer, Placer, PlacerConfig, PlacerError, PlacementOutcome};
pub use registry::{DownloadRecord, JobStatus, ProgressRegistry};
pub use release::ReleaseJob;
pub use session::{DownloadSession, SessionConfig, SessionReport};
pub use transfer::{
    DescriptorSource, HttpDescriptorSource, LibrqbitTransferClient, TransferClient,
    TransferError,
};
pub use worker::{JobOutcome, JobOutcomeKind};
