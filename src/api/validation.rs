use std::path::Path;

use crate::api::errors::ApiError;
use crate::core::config::Settings;

/// One uploaded part, buffered before validation.
pub(crate) struct UploadCandidate {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

const CONTENT_SCAN_BYTES: usize = 1000;

const SCRIPT_PATTERNS: [(&[u8], &str); 5] = [
    (b"<script", "<script"),
    (b"<?php", "<?php"),
    (b"<iframe", "<iframe"),
    (b"javascript:", "javascript:"),
    (b"vbscript:", "vbscript:"),
];

const ALLOWED_MIME_TYPES: [&str; 8] = [
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/jpg",
    "text/plain",
    "text/markdown",
    "application/zip",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Validates a whole upload batch. Problems from every file are collected
/// into one error message so the caller sees all of them at once.
pub(crate) fn validate_upload_batch(
    files: &[UploadCandidate],
    settings: &Settings,
) -> Result<(), ApiError> {
    let uploads = settings.uploads();
    let mut problems: Vec<String> = Vec::new();

    if files.len() as u64 > uploads.max_files_per_submission {
        problems.push(format!(
            "too many files: {} exceeds the limit of {}",
            files.len(),
            uploads.max_files_per_submission
        ));
    }

    let max_file_bytes = uploads.max_file_size_mb * 1024 * 1024;
    let max_total_bytes = uploads.max_total_size_mb * 1024 * 1024;

    let total_bytes: u64 = files.iter().map(|file| file.bytes.len() as u64).sum();
    if total_bytes > max_total_bytes {
        problems.push(format!(
            "combined upload size exceeds {} MB",
            uploads.max_total_size_mb
        ));
    }

    for file in files {
        if let Err(problem) = validate_file(file, max_file_bytes, &uploads.allowed_extensions) {
            problems.push(format!("{}: {}", file.filename, problem));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Upload rejected: {}", problems.join("; "))))
    }
}

fn validate_file(
    file: &UploadCandidate,
    max_file_bytes: u64,
    allowed_extensions: &[String],
) -> Result<(), String> {
    if file.bytes.len() as u64 > max_file_bytes {
        return Err(format!("larger than {} MB", max_file_bytes / (1024 * 1024)));
    }

    let extension = Path::new(&file.filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| "file must have an extension".to_string())?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(format!("extension '{extension}' is not allowed"));
    }

    let mime = file.content_type.trim().to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(format!("MIME type '{mime}' is not allowed"));
    }

    if !mime_allowed_for_extension(&mime, &extension) {
        return Err(format!("MIME type '{mime}' does not match extension '.{extension}'"));
    }

    if let Some(pattern) = find_blocked_pattern(&file.bytes) {
        return Err(format!("content contains blocked sequence '{pattern}'"));
    }

    Ok(())
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "pdf" => mime == "application/pdf",
        "png" => mime == "image/png",
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "txt" => mime == "text/plain",
        "md" => matches!(mime, "text/markdown" | "text/plain"),
        "zip" => mime == "application/zip",
        "docx" => {
            mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => false,
    }
}

/// Shallow heuristic scan of the first bytes; not a malware scanner.
fn find_blocked_pattern(bytes: &[u8]) -> Option<&'static str> {
    let window = &bytes[..bytes.len().min(CONTENT_SCAN_BYTES)];

    if window.starts_with(b"#!") {
        return Some("#!");
    }

    let lowered: Vec<u8> = window.iter().map(|byte| byte.to_ascii_lowercase()).collect();
    for (needle, label) in SCRIPT_PATTERNS {
        if lowered.windows(needle.len()).any(|chunk| chunk == needle) {
            return Some(label);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn test_settings() -> Settings {
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::remove_var("MENTORA_ENV");
        std::env::remove_var("ENVIRONMENT");
        Settings::load().expect("settings")
    }

    fn candidate(filename: &str, content_type: &str, bytes: Vec<u8>) -> UploadCandidate {
        UploadCandidate {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes,
        }
    }

    #[test]
    fn accepts_a_clean_batch() {
        let _guard = test_support::env_lock();
        let settings = test_settings();

        let files = vec![
            candidate("notes.txt", "text/plain", b"week one reflections".to_vec()),
            candidate("report.pdf", "application/pdf", b"%PDF-1.7 ...".to_vec()),
        ];

        assert!(validate_upload_batch(&files, &settings).is_ok());
    }

    #[test]
    fn rejects_mismatched_extension_and_mime() {
        let _guard = test_support::env_lock();
        let settings = test_settings();

        let files = vec![candidate("photo.png", "application/pdf", vec![0u8; 16])];
        let err = validate_upload_batch(&files, &settings).expect_err("mismatch");

        match err {
            ApiError::BadRequest(message) => {
                assert!(message.contains("does not match extension"), "{message}");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn rejects_aggregate_over_total_limit() {
        let _guard = test_support::env_lock();
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::set_var("MAX_FILE_SIZE_MB", "1");
        std::env::set_var("MAX_TOTAL_SIZE_MB", "1");
        std::env::remove_var("MENTORA_ENV");
        std::env::remove_var("ENVIRONMENT");
        let settings = Settings::load().expect("settings");
        std::env::remove_var("MAX_FILE_SIZE_MB");
        std::env::remove_var("MAX_TOTAL_SIZE_MB");

        // Each file fits the per-file limit; together they do not.
        let files = vec![
            candidate("a.txt", "text/plain", vec![b'a'; 600 * 1024]),
            candidate("b.txt", "text/plain", vec![b'b'; 600 * 1024]),
        ];

        let err = validate_upload_batch(&files, &settings).expect_err("aggregate");
        match err {
            ApiError::BadRequest(message) => {
                assert!(message.contains("combined upload size"), "{message}");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn rejects_too_many_files() {
        let _guard = test_support::env_lock();
        let settings = test_settings();

        let files: Vec<UploadCandidate> = (0..6)
            .map(|index| candidate(&format!("f{index}.txt"), "text/plain", b"ok".to_vec()))
            .collect();

        let err = validate_upload_batch(&files, &settings).expect_err("count");
        match err {
            ApiError::BadRequest(message) => {
                assert!(message.contains("too many files"), "{message}");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn rejects_script_content_in_text_upload() {
        let _guard = test_support::env_lock();
        let settings = test_settings();

        let files =
            vec![candidate("page.txt", "text/plain", b"<SCRIPT>alert(1)</SCRIPT>".to_vec())];
        let err = validate_upload_batch(&files, &settings).expect_err("script");

        match err {
            ApiError::BadRequest(message) => {
                assert!(message.contains("blocked sequence"), "{message}");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn collects_problems_from_every_file() {
        let _guard = test_support::env_lock();
        let settings = test_settings();

        let files = vec![
            candidate("script.sh", "text/plain", b"#!/bin/sh".to_vec()),
            candidate("image.png", "text/plain", vec![0u8; 4]),
        ];

        let err = validate_upload_batch(&files, &settings).expect_err("both invalid");
        match err {
            ApiError::BadRequest(message) => {
                assert!(message.contains("script.sh"), "{message}");
                assert!(message.contains("image.png"), "{message}");
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn pattern_scan_only_reads_the_head() {
        let mut bytes = vec![b'a'; CONTENT_SCAN_BYTES];
        bytes.extend_from_slice(b"<script>");
        assert_eq!(find_blocked_pattern(&bytes), None);

        let head = b"<script>".to_vec();
        assert_eq!(find_blocked_pattern(&head), Some("<script"));
    }
}
