use std::path::Path;
use uuid::Uuid;

/// Extracts the file extension from a filename and converts it to lowercase.
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Replaces characters that are unsafe in object keys and filesystem paths.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized: String = filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    while sanitized.ends_with('.') || sanitized.ends_with(' ') {
        sanitized.pop();
    }
    sanitized.trim_start_matches([' ', '.']).to_string()
}

/// Splits a `folder/name.ext` upload filename into its folder prefix and the
/// bare filename. Filenames without a slash come back with no folder.
pub fn split_folder_prefix(filename: &str) -> (Option<String>, String) {
    match filename.split_once('/') {
        Some((folder, rest)) if !folder.is_empty() && !rest.is_empty() => {
            (Some(folder.to_string()), rest.to_string())
        }
        _ => (None, filename.to_string()),
    }
}

/// Derives a collision-free storage filename from the original one:
/// sanitized stem + fresh UUID + original extension.
pub fn unique_storage_filename(original: &str) -> String {
    let sanitized = sanitize_filename(original);
    let path = Path::new(&sanitized);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    let token = Uuid::new_v4().simple();
    match get_file_extension(&sanitized) {
        Some(ext) => format!("{}_{}.{}", stem, token, ext),
        None => format!("{}_{}", stem, token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(get_file_extension("Report.PDF"), Some("pdf".to_string()));
        assert_eq!(get_file_extension("notes.txt"), Some("txt".to_string()));
        assert_eq!(get_file_extension("noext"), None);
    }

    #[test]
    fn sanitize_strips_invalid_characters() {
        assert_eq!(sanitize_filename("a<b>c:d.txt"), "a_b_c_d.txt");
        assert_eq!(sanitize_filename("  trailing. "), "trailing");
        assert_eq!(sanitize_filename("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn folder_prefix_is_split_off() {
        let (folder, name) = split_folder_prefix("reports/q1.pdf");
        assert_eq!(folder.as_deref(), Some("reports"));
        assert_eq!(name, "q1.pdf");

        let (folder, name) = split_folder_prefix("q1.pdf");
        assert!(folder.is_none());
        assert_eq!(name, "q1.pdf");

        // Only the first slash splits; the rest stays in the filename.
        let (folder, name) = split_folder_prefix("a/b/c.pdf");
        assert_eq!(folder.as_deref(), Some("a"));
        assert_eq!(name, "b/c.pdf");
    }

    #[test]
    fn unique_names_keep_stem_and_extension() {
        let name = unique_storage_filename("report.pdf");
        assert!(name.starts_with("report_"));
        assert!(name.ends_with(".pdf"));

        let other = unique_storage_filename("report.pdf");
        assert_ne!(name, other);
    }

    #[test]
    fn unique_name_handles_missing_parts() {
        let name = unique_storage_filename(".hidden");
        assert!(!name.is_empty());
        let name = unique_storage_filename("");
        assert!(name.starts_with("file_"));
    }
}
