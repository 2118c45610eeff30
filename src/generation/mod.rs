/*!
 * The generation pipeline.
 *
 * - `context`: typestate record threaded through one run
 * - `stage`: the `Stage` trait and typed chaining
 * - `text_stage`, `speech_stage`, `video_stage`: the three pipeline units
 * - `workspace`: per-run temporary directories and artifact naming
 * - `pipeline`: assembly and the `generate` entry point
 */

pub mod context;
pub mod pipeline;
pub mod speech_stage;
pub mod stage;
pub mod text_stage;
pub mod video_stage;
pub mod workspace;

pub use context::{GenerationContext, Narrated, Rendered, Seeded, Voiced};
pub use pipeline::{Collaborators, Generator, GeneratorSettings};
pub use speech_stage::SpeechStage;
pub use stage::{Chain, Stage, StageExt};
pub use text_stage::TextStage;
pub use video_stage::VideoStage;
pub use workspace::{ArtifactDir, NameGenerator, SequentialNames, UuidNames, Workspace, WorkspaceManager};
