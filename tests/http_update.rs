// tests/http_update.rs

//! Update against a mock GitHub server: paginated feed and real downloads.

mod common;

use common::{distfile_body, Overlay};
use mockito::Matcher;
use overlay_sync::hash::{hash_bytes, HashAlgorithm};
use overlay_sync::upstream::HttpClient;
use overlay_sync::{
    Channel, GithubReleaseFeed, HttpDistfileFetcher, ManifestReconciler, ReleaseSource,
    Synchronizer,
};
use std::time::Duration;

fn release_json(title: &str, version: &str, asset: &str) -> String {
    format!(
        r#"{{"name": "{title}", "tag_name": "v{version}", "draft": false, "prerelease": false,
            "assets": [{{"name": "{asset}", "size": 100, "browser_download_url": "x"}}]}}"#
    )
}

#[test]
fn test_update_over_http() {
    let mut server = mockito::Server::new();
    let mut overlay = Overlay::new();
    overlay.config.upstream.releases_url =
        format!("{}/repos/brave/brave-browser/releases", server.url());
    overlay.config.upstream.download_url =
        format!("{}/download/v{{version}}/{{distfile}}", server.url());

    overlay.seed(Channel::Stable, &["1.2.0"]);
    overlay.seed(Channel::Beta, &["1.4.0"]);
    overlay.seed(Channel::Nightly, &["1.5.0"]);
    for channel in Channel::ALL {
        let version = overlay.versions(channel).remove(0);
        overlay.seed_manifest(channel, &[&version], &[]);
    }

    let page2 = format!("{}/repos/brave/brave-browser/releases?page=2", server.url());
    let first_page = format!(
        "[{}, {}]",
        release_json("Nightly 1.6.0", "1.6.0", "brave-browser-nightly_1.6.0_amd64.deb"),
        release_json("Beta 1.4.0", "1.4.0", "brave-browser-beta_1.4.0_amd64.deb"),
    );
    let second_page = format!(
        "[{}]",
        release_json("Release 1.3.0", "1.3.0", "brave-browser_1.3.0_amd64.deb"),
    );

    let feed_p1 = server
        .mock("GET", "/repos/brave/brave-browser/releases")
        .match_query(Matcher::UrlEncoded("per_page".into(), "100".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("link", &format!("<{page2}>; rel=\"next\""))
        .with_body(first_page)
        .create();
    let feed_p2 = server
        .mock("GET", "/repos/brave/brave-browser/releases")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(second_page)
        .create();

    let stable_deb = distfile_body("brave-browser_1.3.0_amd64.deb");
    let nightly_deb = distfile_body("brave-browser-nightly_1.6.0_amd64.deb");
    let stable_dl = server
        .mock("GET", "/download/v1.3.0/brave-browser_1.3.0_amd64.deb")
        .with_status(200)
        .with_body(&stable_deb)
        .create();
    let nightly_dl = server
        .mock("GET", "/download/v1.6.0/brave-browser-nightly_1.6.0_amd64.deb")
        .with_status(200)
        .with_body(&nightly_deb)
        .create();

    let config = &overlay.config;
    let feed = GithubReleaseFeed::new(
        HttpClient::new(Duration::from_secs(10)).unwrap(),
        config.upstream.releases_url.clone(),
        config.upstream.per_page,
    );
    let fetcher = HttpDistfileFetcher::new(Duration::from_secs(10)).unwrap();
    let store = overlay.store();
    let reconciler = ManifestReconciler::new(&store, &fetcher, config.hash_algorithms().unwrap());
    let sync = Synchronizer::new(&store, &reconciler);

    let report = sync.update(&ReleaseSource::new(&feed, config)).unwrap();

    feed_p1.assert();
    feed_p2.assert();
    stable_dl.assert();
    nightly_dl.assert();

    assert_eq!(
        report.added.keys().copied().collect::<Vec<_>>(),
        [Channel::Stable, Channel::Nightly]
    );

    let stable = overlay.manifest(Channel::Stable);
    assert_eq!(stable.dist.len(), 2);
    let entry = &stable.dist[1];
    assert_eq!(entry.name, "brave-browser_1.3.0_amd64.deb");
    assert_eq!(entry.size, stable_deb.len() as u64);
    assert_eq!(
        entry.digest(HashAlgorithm::Blake2b),
        Some(hash_bytes(HashAlgorithm::Blake2b, &stable_deb).value.as_str())
    );
    assert_eq!(
        entry.digest(HashAlgorithm::Sha512),
        Some(hash_bytes(HashAlgorithm::Sha512, &stable_deb).value.as_str())
    );
    assert_eq!(overlay.versions(Channel::Nightly), ["1.5.0", "1.6.0"]);
}

#[test]
fn test_download_error_status_aborts_update() {
    let mut server = mockito::Server::new();
    let mut overlay = Overlay::new();
    overlay.config.upstream.releases_url = format!("{}/releases", server.url());
    overlay.config.upstream.download_url = format!("{}/download/{{distfile}}", server.url());

    for channel in Channel::ALL {
        overlay.seed(channel, &["1.0.0"]);
        overlay.seed_manifest(channel, &["1.0.0"], &[]);
    }
    let before = overlay.manifest_text(Channel::Beta);

    let _feed = server
        .mock("GET", "/releases")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(
            "[{}, {}, {}]",
            release_json("Beta 1.1.0", "1.1.0", "brave-browser-beta_1.1.0_amd64.deb"),
            release_json("Release 1.0.0", "1.0.0", "brave-browser_1.0.0_amd64.deb"),
            release_json("Nightly 1.0.0", "1.0.0", "brave-browser-nightly_1.0.0_amd64.deb"),
        ))
        .create();
    let _dl = server
        .mock("GET", "/download/brave-browser-beta_1.1.0_amd64.deb")
        .with_status(502)
        .create();

    let config = &overlay.config;
    let feed = GithubReleaseFeed::new(
        HttpClient::new(Duration::from_secs(10)).unwrap(),
        config.upstream.releases_url.clone(),
        config.upstream.per_page,
    );
    let fetcher = HttpDistfileFetcher::new(Duration::from_secs(10)).unwrap();
    let store = overlay.store();
    let reconciler = ManifestReconciler::new(&store, &fetcher, config.hash_algorithms().unwrap());
    let sync = Synchronizer::new(&store, &reconciler);

    let err = sync.update(&ReleaseSource::new(&feed, config)).unwrap_err();
    assert!(err.to_string().contains("502"), "unexpected error: {err}");
    assert_eq!(overlay.manifest_text(Channel::Beta), before);
    assert_eq!(overlay.versions(Channel::Beta), ["1.0.0"]);
}
