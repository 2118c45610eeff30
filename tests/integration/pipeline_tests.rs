/*!
 * End-to-end pipeline runs with mock collaborators
 */

use std::collections::HashSet;
use std::time::Duration;
use vidnarrate::collaborators::mock::{MediaCall, MediaOp, MockMediaToolkit, MockSpeechSynthesizer, MockTextGenerator};
use vidnarrate::errors::{CollaboratorError, CommandError, GenerationError, StageKind};
use vidnarrate::file_utils::FileManager;

use crate::common::{self, Harness};

#[tokio::test]
async fn test_generate_explainGravity_shouldReturnNonEmptyVideo() {
    let harness = Harness::builder()
        .text(MockTextGenerator::working("Gravity pulls masses together."))
        .media(MockMediaToolkit::new(Duration::from_secs(3)))
        .build();

    let video = harness.generator.generate("Explain gravity").await.unwrap();

    assert!(FileManager::is_non_empty_file(&video));
    assert!(video.starts_with(harness.output_dir()));
    assert_eq!(harness.text.call_count(), 1);
    assert_eq!(harness.speech.call_count(), 1);
    assert_eq!(harness.captioner.call_count(), 1);
    assert_eq!(common::entries_in(&harness.workspace_root()), 0);
}

#[tokio::test]
async fn test_generate_shouldTrimToProbedSpeechDuration() {
    let harness = Harness::builder()
        .media(MockMediaToolkit::new(Duration::from_millis(4_250)))
        .build();

    harness.generator.generate("Explain gravity").await.unwrap();

    let speech_file = harness.speech.destinations()[0].clone();
    let calls = harness.media.calls();
    let probed: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            MediaCall::Probe { media } => Some(media.clone()),
            _ => None,
        })
        .collect();
    let trims: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            MediaCall::Trim { duration, .. } => Some(*duration),
            _ => None,
        })
        .collect();

    assert_eq!(probed, vec![speech_file]);
    assert_eq!(trims, vec![Duration::from_millis(4_250)]);
}

#[tokio::test]
async fn test_generate_withSingleBackground_shouldAlwaysUseIt() {
    let harness = Harness::builder().backgrounds(vec!["only.mp4"]).build();
    let expected = harness.background_dir().join("only.mp4");

    for _ in 0..3 {
        harness.generator.generate("Explain gravity").await.unwrap();
    }

    let backgrounds: Vec<_> = harness
        .media
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            MediaCall::ReplaceAudio { video, .. } => Some(video),
            _ => None,
        })
        .collect();
    assert_eq!(backgrounds.len(), 3);
    assert!(backgrounds.iter().all(|v| v == &expected));
}

#[tokio::test]
async fn test_generate_withTextFailure_shouldNeverInvokeLaterStages() {
    let harness = Harness::builder().text(MockTextGenerator::failing()).build();

    let err = harness.generator.generate("Explain gravity").await.unwrap_err();

    assert_eq!(err.stage(), Some(StageKind::Text));
    assert_eq!(harness.text.call_count(), 1);
    assert_eq!(harness.speech.call_count(), 0);
    assert_eq!(harness.media.call_count(), 0);
    assert_eq!(harness.captioner.call_count(), 0);
    assert_eq!(common::entries_in(&harness.workspace_root()), 0);
}

#[tokio::test]
async fn test_generate_withSpeechFailure_shouldNotProduceVideo() {
    let harness = Harness::builder().speech(MockSpeechSynthesizer::failing()).build();

    let err = harness.generator.generate("Explain gravity").await.unwrap_err();

    assert!(matches!(
        err,
        GenerationError::CollaboratorFailure {
            stage: StageKind::Speech,
            source: CollaboratorError::Provider(_)
        }
    ));
    assert_eq!(harness.media.call_count(), 0);
    assert_eq!(common::entries_in(&harness.output_dir()), 0);
    assert_eq!(common::entries_in(&harness.workspace_root()), 0);
}

#[tokio::test]
async fn test_generate_withEmptyPool_shouldFailAndStillCleanUp() {
    let harness = Harness::builder().backgrounds(vec![]).build();

    let err = harness.generator.generate("Explain gravity").await.unwrap_err();

    assert!(matches!(
        err,
        GenerationError::CollaboratorFailure {
            stage: StageKind::Video,
            source: CollaboratorError::NoBackgrounds(_)
        }
    ));
    assert_eq!(harness.speech.call_count(), 1);
    assert_eq!(common::entries_in(&harness.workspace_root()), 0);
}

#[tokio::test]
async fn test_generate_withExportFailure_shouldLeaveNothingBehind() {
    let harness = Harness::builder()
        .media(MockMediaToolkit::new(Duration::from_secs(3)).failing_on(MediaOp::Export))
        .build();

    let err = harness.generator.generate("Explain gravity").await.unwrap_err();

    assert_eq!(err.stage(), Some(StageKind::Video));
    assert!(matches!(
        err,
        GenerationError::CollaboratorFailure {
            source: CollaboratorError::Command(CommandError::TimedOut { .. }),
            ..
        }
    ));
    assert_eq!(harness.captioner.call_count(), 1);
    assert_eq!(common::entries_in(&harness.workspace_root()), 0);
    assert_eq!(common::entries_in(&harness.output_dir()), 0);
}

#[tokio::test]
async fn test_generate_withBlankPrompt_shouldReturnInvalidInput() {
    let harness = Harness::builder().build();

    let err = harness.generator.generate("   ").await.unwrap_err();

    assert!(matches!(err, GenerationError::InvalidInput(_)));
    assert_eq!(harness.text.call_count(), 0);
}

#[tokio::test]
async fn test_generate_concurrentRuns_shouldUseDistinctWorkspacesAndOutputs() {
    let harness = Harness::builder().build();

    let (a, b, c) = tokio::join!(
        harness.generator.generate("Explain gravity"),
        harness.generator.generate("Explain tides"),
        harness.generator.generate("Explain orbits"),
    );

    let outputs: HashSet<_> = [a.unwrap(), b.unwrap(), c.unwrap()].into_iter().collect();
    assert_eq!(outputs.len(), 3);

    let speech_dirs: HashSet<_> = harness
        .speech
        .destinations()
        .into_iter()
        .map(|p| p.parent().unwrap().to_path_buf())
        .collect();
    assert_eq!(speech_dirs.len(), 3);
    assert_eq!(common::entries_in(&harness.workspace_root()), 0);
}

#[tokio::test]
async fn test_generate_shouldPassNarrationTemplateToTextGenerator() {
    let harness = Harness::builder().build();

    harness.generator.generate("Explain gravity").await.unwrap();

    // Default settings use the bare prompt as the template
    assert_eq!(harness.text.prompts(), vec!["Explain gravity".to_string()]);
}
