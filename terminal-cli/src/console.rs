//! Terminal stand-ins for speech, sound and the microphone.
//!
//! Speech is printed and held on screen for a per-word duration, sound cues
//! ring the terminal bell, and "recognized" utterances are lines the player
//! types without a leading slash.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use beatthebank_execution::{Clock, SoundEffects, SpeechRecognizer, TextToSpeech};
use beatthebank_types::AccessState;
use futures::channel::mpsc;
use tracing::debug;

#[derive(Clone)]
pub struct Console {
    speech_ms_per_word: u64,
    microphone: bool,
    listener: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
}

impl Console {
    pub fn new(speech_ms_per_word: u64, microphone: bool) -> Self {
        Self {
            speech_ms_per_word,
            microphone,
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Hand a typed line to the active listener. Returns false if nobody is listening.
    pub fn hear(&self, utterance: &str) -> bool {
        let Ok(listener) = self.listener.lock() else {
            return false;
        };
        match listener.as_ref() {
            Some(sender) => sender.unbounded_send(utterance.to_string()).is_ok(),
            None => false,
        }
    }

    fn speaking_time(&self, utterance: &str) -> Duration {
        let words = utterance.split_whitespace().count() as u64;
        Duration::from_millis(words.saturating_mul(self.speech_ms_per_word))
    }
}

impl Clock for Console {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl TextToSpeech for Console {
    async fn speak(&self, utterance: &str) {
        println!("  \u{1F50A} {utterance}");
        tokio::time::sleep(self.speaking_time(utterance)).await;
    }
}

impl SoundEffects for Console {
    fn play_jackpot(&self) {
        println!("\x07  *** JACKPOT ***");
    }

    fn play_alarm(&self) {
        println!("\x07  !!! ALARM !!!");
    }
}

impl SpeechRecognizer for Console {
    type Utterances = mpsc::UnboundedReceiver<String>;

    async fn request_access(&self) -> AccessState {
        if self.microphone {
            AccessState::Available
        } else {
            AccessState::Denied
        }
    }

    fn listen(&self) -> Self::Utterances {
        let (sender, receiver) = mpsc::unbounded();
        match self.listener.lock() {
            Ok(mut listener) => *listener = Some(sender),
            Err(_) => debug!("Listener lock poisoned"),
        }
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn typed_lines_reach_listener() {
        let console = Console::new(0, true);
        assert!(!console.hear("continue"));
        assert_eq!(console.request_access().await, AccessState::Available);

        let mut utterances = console.listen();
        assert!(console.hear("continue please"));
        assert_eq!(utterances.next().await.as_deref(), Some("continue please"));

        // Dropping the stream closes the channel
        drop(utterances);
        assert!(!console.hear("continue"));
    }

    #[tokio::test]
    async fn microphone_off_denies_access() {
        let console = Console::new(0, false);
        assert_eq!(console.request_access().await, AccessState::Denied);
    }

    #[test]
    fn speaking_time_scales_with_words() {
        let console = Console::new(100, true);
        assert_eq!(console.speaking_time("Vault 3"), Duration::from_millis(200));
        assert_eq!(console.speaking_time(""), Duration::ZERO);
    }
}
