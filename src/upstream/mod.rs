// src/upstream/mod.rs

//! Upstream collaborators: the release feed and distfile downloads
//!
//! Both go through [`HttpClient`], a blocking client with a mandatory
//! timeout and no retries.

mod client;
mod distfile;
mod releases;

pub use client::{parse_next_link, HttpClient, JsonPage};
pub use distfile::HttpDistfileFetcher;
pub use releases::{
    AssetRecord, GithubReleaseFeed, ReleaseFeed, ReleasePage, ReleaseRecord, ReleaseSource,
};
