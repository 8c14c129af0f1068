use std::{fs, path::PathBuf};

use log::{debug, warn};

/// Which pipeline step fetched a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LandingPage,
    Search,
    OrdersPage,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::LandingPage => "landing_page",
            Stage::Search => "search",
            Stage::OrdersPage => "orders_page",
        }
    }
}

/// Receives every page the pipeline downloads. Useful when the portal's
/// markup changes and the parsers start coming back with placeholders.
pub trait DiagnosticSink: Send + Sync {
    /// `body` is the page exactly as it came off the wire.
    fn capture(&self, stage: Stage, url: &str, body: &str);
}

pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn capture(&self, _stage: Stage, _url: &str, _body: &str) {}
}

impl<F> DiagnosticSink for F
where
    F: Fn(Stage, &str, &str) + Send + Sync,
{
    fn capture(&self, stage: Stage, url: &str, body: &str) {
        self(stage, url, body)
    }
}

/// Writes `<stage>.html` into a directory, overwriting the previous capture.
pub struct DumpDirSink {
    dir: PathBuf,
}

impl DumpDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DiagnosticSink for DumpDirSink {
    fn capture(&self, stage: Stage, url: &str, body: &str) {
        let path = self.dir.join(format!("{}.html", stage.as_str()));
        match fs::write(&path, body) {
            Ok(()) => debug!("Saved {url} to {}", path.display()),
            Err(e) => warn!("Could not save {url} to {}: {e}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(vec![]);
        let sink = |stage: Stage, _url: &str, _body: &str| seen.lock().unwrap().push(stage);
        sink.capture(Stage::OrdersPage, "http://x", "<html></html>");
        assert_eq!(*seen.lock().unwrap(), vec![Stage::OrdersPage]);
    }

    #[test]
    fn dump_dir_sink_writes_one_file_per_stage() {
        let dir = std::env::temp_dir().join(format!("court_fetcher_dump_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let sink = DumpDirSink::new(&dir);
        sink.capture(Stage::Search, "http://x", "{\"data\":[]}");
        let written = fs::read_to_string(dir.join("search.html")).unwrap();
        assert_eq!(written, "{\"data\":[]}");
        fs::remove_dir_all(&dir).unwrap();
    }
}
