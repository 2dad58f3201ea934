//! Local filenames for fetched URLs.

use std::collections::HashSet;

/// Used when a URL has no usable last path segment.
const DEFAULT_FILENAME: &str = "download.bin";

/// Filename hint from the last non-empty path segment of `url`.
///
/// Control characters and backslashes become `_`; leading/trailing dots are
/// dropped so the result can't be `.`, `..` or a hidden file.
pub fn filename_for(url: &str) -> String {
    let segment = url::Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segs| segs.rfind(|s| !s.is_empty()).map(str::to_string))
    });
    let cleaned: String = segment
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_control() || c == '\\' { '_' } else { c })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One distinct filename per URL, numbering repeats as `1-name`, `2-name`, ...
pub fn assign_filenames(urls: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    urls.iter()
        .map(|url| {
            let base = filename_for(url);
            let mut name = base.clone();
            let mut n = 1;
            while !used.insert(name.clone()) {
                name = format!("{}-{}", n, base);
                n += 1;
            }
            name
        })
        .collect()
}
