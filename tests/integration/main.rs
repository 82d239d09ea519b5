//! Integration tests for swcache

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::MockServer;

fn swcache() -> Command {
    cargo_bin_cmd!("swcache")
}

/// A config under `dir` with storage inside it and the journal off
fn write_config(dir: &Path, origin: &str) -> PathBuf {
    let storage = dir.join("caches");
    let path = dir.join("config.toml");
    let content = format!(
        r#"[general]
journal = false

[cache]
version = "v1.0.0"
origin = "{origin}"
storage_dir = "{storage}"

[assets]
static = ["/", "/index.html", "/css/base.css"]
images = ["/img/logo.webp"]
fonts = ["/fonts/tenor.css"]
"#,
        origin = origin,
        storage = storage.display().to_string().replace('\\', "/"),
    );
    std::fs::write(&path, content).unwrap();
    path
}

/// swcache with an isolated config
fn isolated(config: &Path) -> Command {
    let mut cmd = swcache();
    cmd.arg("--no-local").arg("--config").arg(config);
    cmd
}

mod cli_tests {
    use super::*;

    #[test]
    fn help_displays() {
        swcache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache strategy engine"));
    }

    #[test]
    fn version_displays() {
        swcache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("swcache"));
    }

    #[test]
    fn config_path_honors_flag() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");

        isolated(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");

        isolated(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("[routing]"))
            .stdout(predicate::str::contains("https://site.test"));
    }

    #[test]
    fn config_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh").join("config.toml");

        isolated(&path).args(["config", "init"]).assert().success();
        assert!(path.exists());

        isolated(&path)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn invalid_config_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache\nversion = 1").unwrap();

        isolated(&path)
            .args(["classify", "/"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn local_config_overrides_global() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");
        let project = dir.path().join("project");
        std::fs::create_dir_all(project.join("nested")).unwrap();
        std::fs::write(
            project.join(".swcache.toml"),
            "[cache]\norigin = \"https://local.test\"\n",
        )
        .unwrap();

        swcache()
            .current_dir(project.join("nested"))
            .arg("--config")
            .arg(&config)
            .args(["classify", "/about"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://local.test/about"));
    }
}

mod classify_tests {
    use super::*;

    fn classify(args: &[&str]) -> assert_cmd::assert::Assert {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");
        isolated(&config).arg("classify").args(args).assert()
    }

    #[test]
    fn precached_stylesheet_is_cache_first() {
        classify(&["/css/base.css"])
            .success()
            .stdout(predicate::str::contains("rule:  static-assets"))
            .stdout(predicate::str::contains("route: cache-first"));
    }

    #[test]
    fn analytics_passes_through() {
        classify(&["https://www.google-analytics.com/collect"])
            .success()
            .stdout(predicate::str::contains("route: pass-through"));
    }

    #[test]
    fn post_passes_through() {
        classify(&["/api/contact", "--method", "POST"])
            .success()
            .stdout(predicate::str::contains("rule:  uncacheable-method"));
    }

    #[test]
    fn image_destination_is_cache_first() {
        classify(&["https://images.test/photo", "--destination", "image"])
            .success()
            .stdout(predicate::str::contains("rule:  images"));
    }

    #[test]
    fn data_json_is_network_first() {
        classify(&["/data/services.json"])
            .success()
            .stdout(predicate::str::contains("route: network-first"));
    }

    #[test]
    fn everything_else_is_stale_while_revalidate() {
        classify(&["/about"])
            .success()
            .stdout(predicate::str::contains("rule:  default"))
            .stdout(predicate::str::contains("route: stale-while-revalidate"));
    }

    #[test]
    fn unknown_destination_rejected() {
        classify(&["/about", "--destination", "hologram"])
            .failure()
            .stderr(predicate::str::contains("unknown destination"));
    }
}

mod lifecycle_tests {
    use super::*;

    #[test]
    fn cache_list_empty() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");

        isolated(&config)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache partitions found"));

        isolated(&config)
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn cache_entries_missing_partition() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");

        isolated(&config)
            .args(["cache", "entries", "static-v1.0.0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Partition not found"))
            .stderr(predicate::str::contains("swcache cache list"));
    }

    #[test]
    fn activate_before_install_fails() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");

        isolated(&config)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cannot activate while worker is parsed"));
    }

    #[test]
    fn unknown_message_ignored() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");

        isolated(&config)
            .args(["message", "SKIP_WAITING"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ignored unrecognized message"));
    }

    #[test]
    fn status_before_install() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "https://site.test");

        isolated(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("parsed"))
            .stdout(predicate::str::contains("static-v1.0.0"))
            .stdout(predicate::str::contains("missing"));
    }

    #[tokio::test]
    async fn install_fetch_and_clear() {
        let dir = TempDir::new().unwrap();
        let server = origin::site().await;
        origin::serve(&server, "/api/items", 200).await;
        let config = write_config(dir.path(), &server.uri());

        isolated(&config)
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cached 5 of 5 assets"))
            .stdout(predicate::str::contains("Activated"));

        isolated(&config)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("static-v1.0.0"))
            .stdout(predicate::str::contains("images-v1.0.0"))
            .stdout(predicate::str::contains("fonts-v1.0.0"));

        isolated(&config)
            .args(["fetch", "/css/base.css"])
            .assert()
            .success()
            .stdout("/css/base.css")
            .stderr(predicate::str::contains("cache (static-v1.0.0)"));

        isolated(&config)
            .args(["fetch", "/api/items"])
            .assert()
            .success()
            .stderr(predicate::str::contains("network-first"));

        isolated(&config)
            .args(["cache", "entries", "dynamic-v1.0.0", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("/api/items"));

        isolated(&config)
            .args(["cache", "clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));

        isolated(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("parsed"));
    }

    #[tokio::test]
    async fn missing_asset_fails_install() {
        let dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        for path in ["/", "/index.html", "/css/base.css", "/fonts/tenor.css"] {
            origin::serve(&server, path, 200).await;
        }
        origin::serve(&server, "/img/logo.webp", 404).await;
        let config = write_config(dir.path(), &server.uri());

        isolated(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("images-v1.0.0"))
            .stderr(predicate::str::contains("404"));

        isolated(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("redundant"));
    }

    #[tokio::test]
    async fn unavailable_origin_is_synthesized() {
        let dir = TempDir::new().unwrap();
        let server = origin::site().await;
        origin::serve(&server, "/api/items", 503).await;
        let config = write_config(dir.path(), &server.uri());

        isolated(&config).arg("install").assert().success();

        isolated(&config)
            .args(["fetch", "/api/items"])
            .assert()
            .success()
            .stdout("Network error happened")
            .stderr(predicate::str::contains("408"))
            .stderr(predicate::str::contains("synthesized"));
    }
}

/// Mock origin for the configured asset lists
mod origin {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answer GET `route` with `status` and the route as body
    pub async fn serve(server: &MockServer, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(route))
            .mount(server)
            .await;
    }

    /// Origin serving every pre-cached asset
    pub async fn site() -> MockServer {
        let server = MockServer::start().await;
        for route in [
            "/",
            "/index.html",
            "/css/base.css",
            "/img/logo.webp",
            "/fonts/tenor.css",
        ] {
            serve(&server, route, 200).await;
        }
        server
    }
}
