pub mod acquirer;
pub mod downloader;
pub mod metadata;
pub mod provider;
pub mod resolver;

pub use acquirer::{AcquiredContent, FormatPreference, LocalVideo, VideoAcquirer};
pub use downloader::Downloader;
pub use metadata::{Platform, ProviderInfo, VideoFormat, VideoMetadata};
pub use provider::{ProviderEngine, VideoProvider};
pub use resolver::{Resolved, VideoInfoResolver};
