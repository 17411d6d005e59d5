//! Capabilities a host provides to a [`crate::Game`].
//!
//! A host supplies a single context value implementing all four traits, the
//! same way a runtime context carries clock and storage.

use beatthebank_types::AccessState;
use futures::Stream;
use std::{future::Future, time::Duration};

pub trait Clock {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

pub trait TextToSpeech {
    /// Resolves once the utterance has been spoken in full.
    fn speak(&self, utterance: &str) -> impl Future<Output = ()>;
}

/// Fire-and-forget sound cues.
pub trait SoundEffects {
    fn play_jackpot(&self);
    fn play_alarm(&self);
}

pub trait SpeechRecognizer {
    type Utterances: Stream<Item = String> + Unpin;

    fn request_access(&self) -> impl Future<Output = AccessState>;

    /// Start continuous recognition. Dropping the stream stops listening.
    fn listen(&self) -> Self::Utterances;
}
