/*!
 * Common test utilities for the vidnarrate test suite
 */

use anyhow::Result;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

use vidnarrate::collaborators::mock::{
    MockBehavior, MockCaptioner, MockMediaToolkit, MockSpeechSynthesizer, MockTextGenerator,
};
use vidnarrate::collaborators::Captioner;
use vidnarrate::generation::{Collaborators, Generator, GeneratorSettings, SequentialNames};

/// Route library logs to the test output; set RUST_LOG to see them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Number of entries left in a directory (0 when it does not exist)
pub fn entries_in(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Bind an axum router to an ephemeral local port and serve it in the background
pub async fn spawn_router(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Generator wired to mock collaborators inside a private directory tree
pub struct Harness {
    pub root: TempDir,
    pub text: Arc<MockTextGenerator>,
    pub speech: Arc<MockSpeechSynthesizer>,
    pub media: Arc<MockMediaToolkit>,
    pub captioner: Arc<MockCaptioner>,
    pub generator: Generator,
}

/// Knobs for building a `Harness`
pub struct HarnessBuilder {
    text: MockTextGenerator,
    speech: MockSpeechSynthesizer,
    media: MockMediaToolkit,
    captioner: MockCaptioner,
    backgrounds: Vec<&'static str>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            text: MockTextGenerator::working("Gravity pulls masses together."),
            speech: MockSpeechSynthesizer::working(),
            media: MockMediaToolkit::new(Duration::from_secs(3)),
            captioner: MockCaptioner::new(MockBehavior::Working),
            backgrounds: vec!["background.mp4"],
        }
    }
}

impl HarnessBuilder {
    pub fn text(mut self, text: MockTextGenerator) -> Self {
        self.text = text;
        self
    }

    pub fn speech(mut self, speech: MockSpeechSynthesizer) -> Self {
        self.speech = speech;
        self
    }

    pub fn media(mut self, media: MockMediaToolkit) -> Self {
        self.media = media;
        self
    }

    pub fn backgrounds(mut self, files: Vec<&'static str>) -> Self {
        self.backgrounds = files;
        self
    }

    pub fn build(self) -> Harness {
        init_test_logging();
        let root = create_temp_dir().unwrap();
        let background_dir = root.path().join("backgrounds");
        fs::create_dir_all(&background_dir).unwrap();
        for name in &self.backgrounds {
            fs::write(background_dir.join(name), b"background video").unwrap();
        }

        let text = Arc::new(self.text);
        let speech = Arc::new(self.speech);
        let media = Arc::new(self.media);
        let captioner = Arc::new(self.captioner);

        let collaborators = Collaborators {
            text: text.clone(),
            speech: speech.clone(),
            media: media.clone(),
            captioner: captioner.clone() as Arc<dyn Captioner>,
        };
        let mut settings = GeneratorSettings::new(&background_dir, root.path().join("output"));
        settings.workspace_root = Some(root.path().join("workspaces"));
        settings.names = Arc::new(SequentialNames::new("artifact"));

        Harness {
            generator: Generator::new(collaborators, settings),
            root,
            text,
            speech,
            media,
            captioner,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.root.path().join("workspaces")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("output")
    }

    pub fn background_dir(&self) -> PathBuf {
        self.root.path().join("backgrounds")
    }
}
