//! Recording capability fakes for tests.

use crate::context::{Clock, SoundEffects, SpeechRecognizer, TextToSpeech};
use beatthebank_types::AccessState;
use futures::channel::mpsc;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Everything the game asked the host to do, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Activity {
    Spoke(String),
    Slept(Duration),
    Jackpot,
    Alarm,
    AccessRequested,
    Listened,
}

#[derive(Default)]
struct Inner {
    activity: Vec<Activity>,
    microphone: Option<mpsc::UnboundedSender<String>>,
    cues: Vec<(String, String)>,
}

/// A context that completes every operation immediately and records it.
///
/// Clones share the same log, so a test can keep one clone and hand the other
/// to a [`crate::Game`].
#[derive(Clone)]
pub struct Context {
    access: AccessState,
    inner: Arc<Mutex<Inner>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_access(AccessState::Available)
    }

    pub fn with_access(access: AccessState) -> Self {
        Self {
            access,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn record(&self, activity: Activity) {
        self.inner.lock().unwrap().activity.push(activity);
    }

    /// Deliver an utterance to the active listener (dropped if nobody listens).
    pub fn say(&self, utterance: &str) {
        if let Some(microphone) = &self.inner.lock().unwrap().microphone {
            let _ = microphone.unbounded_send(utterance.to_string());
        }
    }

    /// Say `utterance` as soon as the game speaks `spoken` (once).
    pub fn say_after(&self, spoken: &str, utterance: &str) {
        self.inner
            .lock()
            .unwrap()
            .cues
            .push((spoken.to_string(), utterance.to_string()));
    }

    /// End the active utterance stream.
    pub fn close_microphone(&self) {
        self.inner.lock().unwrap().microphone = None;
    }

    pub fn activity(&self) -> Vec<Activity> {
        self.inner.lock().unwrap().activity.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().activity.clear();
    }

    pub fn spoken(&self) -> Vec<String> {
        self.activity()
            .into_iter()
            .filter_map(|activity| match activity {
                Activity::Spoke(utterance) => Some(utterance),
                _ => None,
            })
            .collect()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.activity()
            .into_iter()
            .filter_map(|activity| match activity {
                Activity::Slept(duration) => Some(duration),
                _ => None,
            })
            .collect()
    }

    fn count(&self, wanted: Activity) -> usize {
        self.activity().iter().filter(|a| **a == wanted).count()
    }

    pub fn jackpots(&self) -> usize {
        self.count(Activity::Jackpot)
    }

    pub fn alarms(&self) -> usize {
        self.count(Activity::Alarm)
    }

    pub fn access_requests(&self) -> usize {
        self.count(Activity::AccessRequested)
    }

    pub fn listens(&self) -> usize {
        self.count(Activity::Listened)
    }
}

impl Clock for Context {
    async fn sleep(&self, duration: Duration) {
        self.record(Activity::Slept(duration));
    }
}

impl TextToSpeech for Context {
    async fn speak(&self, utterance: &str) {
        self.record(Activity::Spoke(utterance.to_string()));
        let mut inner = self.inner.lock().unwrap();
        let Some(index) = inner.cues.iter().position(|(spoken, _)| spoken == utterance) else {
            return;
        };
        let (_, reply) = inner.cues.remove(index);
        if let Some(microphone) = &inner.microphone {
            let _ = microphone.unbounded_send(reply);
        }
    }
}

impl SoundEffects for Context {
    fn play_jackpot(&self) {
        self.record(Activity::Jackpot);
    }

    fn play_alarm(&self) {
        self.record(Activity::Alarm);
    }
}

impl SpeechRecognizer for Context {
    type Utterances = mpsc::UnboundedReceiver<String>;

    async fn request_access(&self) -> AccessState {
        self.record(Activity::AccessRequested);
        self.access
    }

    fn listen(&self) -> Self::Utterances {
        self.record(Activity::Listened);
        let (sender, receiver) = mpsc::unbounded();
        self.inner.lock().unwrap().microphone = Some(sender);
        receiver
    }
}
