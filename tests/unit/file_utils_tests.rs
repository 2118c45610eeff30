/*!
 * Tests for file utility functions
 */

use std::time::Duration;
use vidnarrate::file_utils::FileManager;

use crate::common;

#[test]
fn test_listVideos_shouldKeepOnlyVideoFilesSorted() {
    let temp_dir = common::create_temp_dir().unwrap();
    let dir = temp_dir.path();
    common::create_test_file(dir, "b.mp4", "x").unwrap();
    common::create_test_file(dir, "a.MOV", "x").unwrap();
    common::create_test_file(dir, "notes.txt", "x").unwrap();
    std::fs::create_dir(dir.join("nested.mp4")).unwrap();

    let videos = FileManager::list_videos(dir).unwrap();

    assert_eq!(videos, vec![dir.join("a.MOV"), dir.join("b.mp4")]);
}

#[test]
fn test_listVideos_withMissingDirectory_shouldFail() {
    assert!(FileManager::list_videos("/definitely/not/here").is_err());
}

#[test]
fn test_ensureDir_shouldCreateNestedDirectories() {
    let temp_dir = common::create_temp_dir().unwrap();
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested).unwrap();

    assert!(FileManager::dir_exists(&nested));
}

#[test]
fn test_isNonEmptyFile_shouldRejectEmptyAndMissingFiles() {
    let temp_dir = common::create_temp_dir().unwrap();
    let empty = common::create_test_file(temp_dir.path(), "empty.mp3", "").unwrap();
    let full = common::create_test_file(temp_dir.path(), "full.mp3", "data").unwrap();

    assert!(!FileManager::is_non_empty_file(&empty));
    assert!(!FileManager::is_non_empty_file(temp_dir.path().join("missing.mp3")));
    assert!(FileManager::is_non_empty_file(&full));
}

#[test]
fn test_formatMediaTime_shouldUseFfmpegLayout() {
    assert_eq!(FileManager::format_media_time(Duration::from_millis(3_000)), "00:00:03.000");
    assert_eq!(FileManager::format_media_time(Duration::from_millis(3_723_045)), "01:02:03.045");
}

#[test]
fn test_escapeFilterPath_shouldEscapeFilterSeparators() {
    assert_eq!(FileManager::escape_filter_path("/tmp/run/subs.srt"), "/tmp/run/subs.srt");
    assert_eq!(FileManager::escape_filter_path("/tmp/it's,here.srt"), "/tmp/it\\'s\\,here.srt");
}
