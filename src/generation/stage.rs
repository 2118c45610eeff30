/*!
 * Stage abstraction and typed chaining.
 *
 * A stage turns one context value into the next. `then` links a successor
 * whose input type is this stage's output type, so a mis-ordered pipeline is
 * rejected at compile time. Executing a chain runs the head, then hands its
 * output to the successor and returns whatever the successor returns. The
 * first error stops the chain and is returned unchanged.
 */

use async_trait::async_trait;

use crate::errors::{GenerationError, StageKind};

/// One unit of the generation pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Context state this stage reads
    type Input: Send + 'static;

    /// Context state this stage produces
    type Output: Send + 'static;

    /// Identity used in logs and error tags
    fn kind(&self) -> StageKind;

    /// Run the stage on `input`
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, GenerationError>;
}

/// A stage followed by its successor
#[derive(Debug)]
pub struct Chain<A, B> {
    head: A,
    next: B,
}

#[async_trait]
impl<A, B> Stage for Chain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn kind(&self) -> StageKind {
        self.head.kind()
    }

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, GenerationError> {
        let forwarded = self.head.execute(input).await?;
        self.next.execute(forwarded).await
    }
}

/// Linking for any stage
pub trait StageExt: Stage + Sized {
    /// Link `next` after this stage
    fn then<B>(self, next: B) -> Chain<Self, B>
    where
        B: Stage<Input = Self::Output>,
    {
        Chain { head: self, next }
    }
}

impl<T: Stage> StageExt for T {}
