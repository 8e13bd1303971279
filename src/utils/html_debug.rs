// src/utils/html_debug.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;

// Markers worth seeing at a glance when a page layout changes on the portal.
static SNAPSHOT_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\d{4}\.\s*december\s*31", "year"),
        (r"(?i)\d{4}\.\s*január\s*\d{1,2}\.\s*-\s*\d{4}\.\s*december\s*\d{1,2}\.", "period"),
        (r"(?i)MÉRLEGE|EREDMÉNYKIMUTATÁS", "statement"),
        (r"Cégnév", "results"),
        (r"(?i)elfogadom|Tovább", "gate"),
        (r"Megtekintés", "link"),
    ]
    .iter()
    .filter_map(|(pat, kind)| Regex::new(pat).ok().map(|re| (re, *kind)))
    .collect()
});

/// Saves a HTML snapshot to a file with debug highlights.
/// Highlights are `(start, end, kind)` byte ranges into `html`; overlapping ranges are dropped.
pub fn save_debug_html(html: &str, path: &Path, highlights: &[(usize, usize, &str)]) -> std::io::Result<()> {
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");

    // CSS for highlight colors
    debug_html.push_str(".highlight-year { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-period { background-color: #FFA500; }\n");
    debug_html.push_str(".highlight-statement { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-results { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-custom { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    let mut last_pos = 0;
    let mut sorted_highlights = highlights.to_vec();
    sorted_highlights.sort_by_key(|h| h.0);

    for (start, end, highlight_type) in sorted_highlights {
        if start < last_pos || end > html.len() {
            continue;
        }
        debug_html.push_str(&html[last_pos..start]);

        let css_class = match highlight_type {
            "year" => "highlight-year",
            "period" => "highlight-period",
            "statement" => "highlight-statement",
            "results" => "highlight-results",
            _ => "highlight-custom",
        };

        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"Position: {}-{}, Type: {}\">",
            css_class, start, end, highlight_type
        ));
        debug_html.push_str(&html[start..end]);
        debug_html.push_str("</span>");

        last_pos = end;
    }

    if last_pos < html.len() {
        debug_html.push_str(&html[last_pos..]);
    }
    debug_html.push_str("\n</body>\n</html>");

    fs::write(path, debug_html)?;
    tracing::debug!("Saved debug HTML to {}", path.display());
    Ok(())
}

/// Creates a debug copy of a page snapshot with the known portal markers highlighted.
pub fn create_debug_html(html: &str, path: &Path) -> std::io::Result<()> {
    let mut highlights = Vec::new();
    for (re, kind) in SNAPSHOT_PATTERNS.iter() {
        for mat in re.find_iter(html) {
            highlights.push((mat.start(), mat.end(), *kind));
        }
    }
    save_debug_html(html, path, &highlights)
}

/// Writes numbered, annotated page snapshots into a directory, one per analysed page.
#[derive(Debug)]
pub struct SnapshotDumper {
    dir: PathBuf,
    counter: AtomicUsize,
}

impl SnapshotDumper {
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, counter: AtomicUsize::new(0) })
    }

    /// Best effort: a failed snapshot is logged and never interrupts a run.
    pub fn dump(&self, label: &str, html: &str) -> Option<PathBuf> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let path = self.dir.join(format!("{:02}_{}.html", n, label));
        match create_debug_html(html, &path) {
            Ok(()) => {
                tracing::info!("Saved {} snapshot: {}", label, path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Failed to save {} snapshot: {}", label, e);
                None
            }
        }
    }
}
