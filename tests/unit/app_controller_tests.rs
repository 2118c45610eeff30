/*!
 * Tests for the application controller
 */

use std::path::PathBuf;
use std::sync::Arc;
use vidnarrate::app_config::{CaptionMode, Config, SpeechProvider, TextProvider};
use vidnarrate::app_controller::Controller;
use vidnarrate::collaborators::mock::{RecordingRunner, RunnerBehavior};
use vidnarrate::collaborators::{MediaToolkit, TextGenerator};

#[test]
fn test_newForTest_shouldAcceptDefaultConfig() {
    assert!(Controller::new_for_test().is_ok());
}

#[test]
fn test_withConfig_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.speech.provider = SpeechProvider::Http;
    config.speech.endpoint = String::new();

    assert!(Controller::with_config(config).is_err());
}

#[test]
fn test_generatorSettings_shouldMirrorConfig() {
    let mut config = Config::default();
    config.text.narration_template = "Narrate {prompt}".to_string();
    config.speech.audio_extension = "wav".to_string();
    config.video.output_dir = PathBuf::from("/srv/videos");
    config.video.workspace_root = Some(PathBuf::from("/scratch"));

    let settings = Controller::with_config(config).unwrap().generator_settings();

    assert_eq!(settings.narration_template, "Narrate {prompt}");
    assert_eq!(settings.audio_extension, "wav");
    assert_eq!(settings.output_dir, PathBuf::from("/srv/videos"));
    assert_eq!(settings.workspace_root, Some(PathBuf::from("/scratch")));
}

#[tokio::test]
async fn test_buildCollaborators_withScriptProviders_shouldRouteThroughRunner() {
    let mut config = Config::default();
    config.text.provider = TextProvider::Script;
    config.text.script_path = "./pkg/llm.py".to_string();
    config.python_path = "python3".to_string();
    config.captions.mode = CaptionMode::Script;

    let controller = Controller::with_config(config).unwrap();
    let runner = Arc::new(RecordingRunner::new(RunnerBehavior::Stdout("Gravity pulls.".to_string())));
    let collaborators = controller.build_collaborators(runner.clone());

    let text = collaborators.text.generate("Explain gravity").await.unwrap();

    assert_eq!(text, "Gravity pulls.");
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "python3");
    assert_eq!(calls[0].args[0], "./pkg/llm.py");
}

#[tokio::test]
async fn test_buildCollaborators_shouldProbeWithConfiguredFfprobe() {
    let mut config = Config::default();
    config.video.ffprobe_path = "/opt/ffmpeg/bin/ffprobe".to_string();

    let controller = Controller::with_config(config).unwrap();
    let runner = Arc::new(RecordingRunner::new(RunnerBehavior::Stdout("4.5\n".to_string())));
    let collaborators = controller.build_collaborators(runner.clone());

    let duration = collaborators
        .media
        .probe_duration(std::path::Path::new("speech.mp3"))
        .await
        .unwrap();

    assert_eq!(duration.as_millis(), 4_500);
    assert_eq!(runner.calls()[0].program, "/opt/ffmpeg/bin/ffprobe");
}
