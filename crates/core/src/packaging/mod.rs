//! Packaging module for building downloadable archives from stem files.
//!
//! Two entry points, both pure with respect to the session directory's
//! current contents:
//!
//! - [`StemPackager::build_stem_archive`] converts each requested stem to the
//!   target format and bundles them into one zip.
//! - [`StemPackager::build_mixdown`] overlays the requested stems into a
//!   single track and bundles that.
//!
//! Encoding goes through the [`AudioEncoder`] trait; production uses
//! [`FfmpegEncoder`], tests swap in a mock.
//!
//! # Example
//!
//! ```ignore
//! use stemsplit_core::packaging::{
//!     AudioFormat, FfmpegEncoder, PackagingConfig, StemPackager,
//! };
//!
//! let config = PackagingConfig::default();
//! let encoder = Arc::new(FfmpegEncoder::new(config.clone()));
//! let packager = StemPackager::new(config, encoder);
//!
//! let archive = packager
//!     .build_stem_archive(&session_dir, "abc-123", &stems, AudioFormat::Mp3)
//!     .await?;
//! let bytes = tokio::fs::read(&archive.path).await?;
//! archive.discard().await;
//! ```

mod archive;
mod config;
mod error;
mod ffmpeg;
mod packager;
mod traits;
mod types;

pub use archive::write_archive;
pub use config::PackagingConfig;
pub use error::PackagingError;
pub use ffmpeg::FfmpegEncoder;
pub use packager::StemPackager;
pub use traits::AudioEncoder;
pub use types::{Archive, AudioFormat};
