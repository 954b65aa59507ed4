//! The interaction abstraction and the resolution helpers every interaction
//! shares.
//!
//! An [`Interaction`] is a value describing one user-level gesture (or a
//! polling loop of gestures). It is performed by an
//! [`Actor`](crate::actor::Actor), which lends it exclusive access to its
//! session for the duration of the call.

use async_trait::async_trait;

use crate::actor::Actor;
use crate::error::InteractionError;
use crate::geometry::{BoundingBox, Dimension};
use crate::gesture::GestureSequence;
use crate::session::{ElementId, Lookup};
use crate::target::Target;

/// A user-level action performed against a session.
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Stable name used in errors, logs and records.
    fn name(&self) -> &'static str;

    /// Name of the primary target, if any.
    fn target_name(&self) -> Option<&str> {
        None
    }

    /// Performs the interaction to completion.
    async fn perform_as(&self, actor: &mut Actor) -> Result<(), InteractionError>;
}

/// Resolves `target`, failing with `ElementNotFound` when nothing matches.
pub(crate) async fn resolve(
    actor: &Actor,
    interaction: &'static str,
    target: &Target,
) -> Result<ElementId, InteractionError> {
    match lookup(actor, interaction, target).await? {
        Lookup::Found(id) => Ok(id),
        Lookup::NotFound => Err(InteractionError::ElementNotFound {
            interaction,
            target: target.name().to_string(),
        }),
    }
}

/// Resolves `target` without treating absence as an error.
pub(crate) async fn lookup(
    actor: &Actor,
    interaction: &'static str,
    target: &Target,
) -> Result<Lookup, InteractionError> {
    actor
        .session()
        .find_element(target.locator())
        .await
        .map_err(|source| InteractionError::Session { interaction, source })
}

/// Resolves `target` and reads its current frame.
pub(crate) async fn resolve_rect(
    actor: &Actor,
    interaction: &'static str,
    target: &Target,
) -> Result<BoundingBox, InteractionError> {
    let id = resolve(actor, interaction, target).await?;
    actor
        .session()
        .element_rect(&id)
        .await
        .map_err(|source| InteractionError::Session { interaction, source })
}

pub(crate) async fn viewport(
    actor: &Actor,
    interaction: &'static str,
) -> Result<Dimension, InteractionError> {
    actor
        .session()
        .viewport_size()
        .await
        .map_err(|source| InteractionError::Session { interaction, source })
}

/// Submits a built gesture to the actor's session.
pub(crate) async fn dispatch(
    actor: &Actor,
    interaction: &'static str,
    gesture: &GestureSequence,
) -> Result<(), InteractionError> {
    actor
        .session()
        .perform(gesture)
        .await
        .map_err(|source| InteractionError::SessionDispatch { interaction, source })
}
