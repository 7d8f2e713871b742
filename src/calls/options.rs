//! Outbound call configuration sent with every placement request.

use serde::{Deserialize, Serialize};

use super::bland::DEFAULT_BASE_URL;

/// What the call agent does when it reaches voicemail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicemailAction {
    Hangup,
    LeaveMessage,
    Ignore,
}

impl std::str::FromStr for VoicemailAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hangup" => Ok(Self::Hangup),
            "leave_message" => Ok(Self::LeaveMessage),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown voicemail action '{other}'")),
        }
    }
}

/// Call behaviour knobs, serialized field-for-field into the voice API body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Keep a recording of the call.
    pub record: bool,
    /// Voice preset name.
    pub voice: String,
    /// Wait for the callee to speak first.
    pub wait_for_greeting: bool,
    /// Detect whether a human or a machine answered.
    pub answered_by_enabled: bool,
    pub noise_cancellation: bool,
    /// How long (ms) the agent waits before treating silence as a turn end.
    pub interruption_threshold: u32,
    pub block_interruptions: bool,
    /// Hard cap on call length, in minutes.
    pub max_duration: u32,
    /// Voice-agent model selector.
    pub model: String,
    /// Language code, e.g. `en`.
    pub language: String,
    /// Background audio track, `none` for silence.
    pub background_track: String,
    /// API root the voice agent reports back to.
    pub endpoint: String,
    pub voicemail_action: VoicemailAction,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            record: true,
            voice: "Keelan".to_string(),
            wait_for_greeting: false,
            answered_by_enabled: true,
            noise_cancellation: false,
            interruption_threshold: 100,
            block_interruptions: false,
            max_duration: 12,
            model: "base".to_string(),
            language: "en".to_string(),
            background_track: "none".to_string(),
            endpoint: DEFAULT_BASE_URL.to_string(),
            voicemail_action: VoicemailAction::Hangup,
        }
    }
}
