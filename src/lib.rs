//! Version strings for build tooling, derived from `git describe`.
//!
//! ```no_run
//! use relic::release::ReleaseInfo;
//!
//! let version = ReleaseInfo::in_dir(".").remove("release_").get_info();
//! println!("{}", version.normalized);
//! ```

pub mod release;
pub mod template;
pub mod utils;
pub mod version;

pub use release::{get_info, ReleaseInfo};
pub use version::{RemovePattern, VersionRecord, VersionResolver};
