use std::path::PathBuf;

/// Format a duration in whole seconds as `M:SS` for display
pub fn format_duration(seconds: u32) -> String {
    if seconds == 0 {
        return "0:00".to_string();
    }
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Allocate a unique path in the OS temp directory with the given extension
///
/// Only the path is reserved (nothing is created on disk); the extension is
/// used without a leading dot.
pub fn temp_file_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("yamdl-{}.{}", uuid::Uuid::new_v4(), extension))
}

/// Sanitize a filename by removing invalid characters and replacing semicolons with commas
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            ';' => ',',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_typical_duration() {
        assert_eq!(format_duration(245), "4:05");
    }

    #[test]
    fn formats_zero_and_sub_minute_durations() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(60), "1:00");
    }

    #[test]
    fn temp_paths_are_unique() {
        let a = temp_file_path("mp3");
        let b = temp_file_path("mp3");
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "mp3");
    }

    #[test]
    fn sanitizes_invalid_filename_characters() {
        assert_eq!(sanitize_filename("AC/DC: Back?"), "AC_DC_ Back_");
        assert_eq!(sanitize_filename("a; b"), "a, b");
    }
}
