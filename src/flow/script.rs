use super::prompts;
use crate::config::Config;
use crate::voice::{Gather, Record, Verb, VoiceResponse};

/// Webhook paths the provider is sent to
pub mod paths {
    pub const VOICE: &str = "/voice";
    pub const HANDLE_PIN: &str = "/handle-pin";
    pub const RECORDING_COMPLETE: &str = "/recording-complete";
    pub const MENU_CHOICE: &str = "/menu-choice";
    pub const TRANSCRIPTION: &str = "/transcription";
}

/// Everything the call flow needs to know about a deployment
#[derive(Debug, Clone)]
pub struct Script {
    pub pin: String,
    pub admin_pin: Option<String>,
    pub questions: Vec<String>,
    pub max_recording_secs: u32,
    pub finish_on_key: String,
    pub transcribe: bool,
    pub answer_delay_secs: u32,
    pub pin_timeout_secs: u32,
    pub menu_timeout_secs: u32,
    /// Prefix for action URLs (empty = relative)
    pub base_url: String,
}

impl Script {
    pub fn new(pin: impl Into<String>, questions: Vec<String>) -> Self {
        Self {
            pin: pin.into(),
            admin_pin: None,
            questions,
            max_recording_secs: 300,
            finish_on_key: "#".to_string(),
            transcribe: true,
            answer_delay_secs: 0,
            pin_timeout_secs: 10,
            menu_timeout_secs: 8,
            base_url: String::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let journal = &cfg.journal;
        Self {
            pin: journal.pin.clone(),
            admin_pin: journal.admin_pin.clone(),
            questions: journal.questions.clone(),
            max_recording_secs: journal.max_recording_secs,
            finish_on_key: journal.finish_on_key.clone(),
            transcribe: journal.transcribe,
            answer_delay_secs: journal.answer_delay_secs,
            pin_timeout_secs: journal.pin_timeout_secs,
            menu_timeout_secs: journal.menu_timeout_secs,
            base_url: cfg.service.http.public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn question_url(&self, path: &str, index: usize) -> String {
        format!("{}{}?question={}", self.base_url, path, index)
    }

    /// PIN gather, falling through to the PIN handler with no digits on timeout
    pub fn pin_prompt(&self, lead: Option<&str>) -> VoiceResponse {
        let mut prompts = Vec::new();
        if let Some(lead) = lead {
            prompts.push(Verb::Say(lead.to_string()));
        }
        prompts.push(Verb::Say(prompts::PIN_PROMPT.to_string()));

        let longest = self
            .admin_pin
            .as_ref()
            .map_or(self.pin.len(), |admin| admin.len().max(self.pin.len()));

        VoiceResponse::new()
            .gather(Gather {
                action: self.url(paths::HANDLE_PIN),
                num_digits: Some(longest),
                finish_on_key: Some("#".to_string()),
                timeout_secs: self.pin_timeout_secs,
                prompts,
            })
            .redirect(self.url(paths::HANDLE_PIN))
    }

    /// Speak question `index` and record the answer
    pub fn ask(&self, index: usize) -> VoiceResponse {
        let text = self
            .questions
            .get(index)
            .map(String::as_str)
            .unwrap_or_default();

        VoiceResponse::new()
            .say(prompts::question(index + 1, self.question_count(), text))
            .say(prompts::RECORD_INSTRUCTIONS)
            .record(self.record_verb(Some(index)))
            .redirect(self.question_url(paths::RECORDING_COMPLETE, index))
    }

    /// Save/re-record/review menu for question `index`
    pub fn answer_menu(&self, index: usize) -> VoiceResponse {
        let action = self.question_url(paths::MENU_CHOICE, index);
        self.menu(prompts::ANSWER_MENU, action)
    }

    pub fn broadcast_prompt(&self) -> VoiceResponse {
        VoiceResponse::new()
            .say(prompts::BROADCAST_PROMPT)
            .record(self.record_verb(None))
            .redirect(self.url(paths::RECORDING_COMPLETE))
    }

    pub fn broadcast_menu(&self) -> VoiceResponse {
        self.menu(prompts::BROADCAST_MENU, self.url(paths::MENU_CHOICE))
    }

    pub fn goodbye(&self, text: &str) -> VoiceResponse {
        VoiceResponse::new().say(text).hangup()
    }

    fn menu(&self, text: &str, action: String) -> VoiceResponse {
        VoiceResponse::new()
            .gather(Gather {
                action: action.clone(),
                num_digits: Some(1),
                finish_on_key: None,
                timeout_secs: self.menu_timeout_secs,
                prompts: vec![Verb::Say(text.to_string())],
            })
            .redirect(action)
    }

    fn record_verb(&self, question: Option<usize>) -> Record {
        let action = match question {
            Some(index) => self.question_url(paths::RECORDING_COMPLETE, index),
            None => self.url(paths::RECORDING_COMPLETE),
        };

        Record {
            action,
            max_length_secs: self.max_recording_secs,
            finish_on_key: self.finish_on_key.clone(),
            play_beep: true,
            transcribe_callback: self
                .transcribe
                .then(|| self.url(paths::TRANSCRIPTION)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_carries_question_index_in_urls() {
        let script = Script::new("1234", vec!["A?".to_string(), "B?".to_string()]);
        let twiml = script.ask(1).to_twiml();

        assert!(twiml.contains("Question 2 of 2. B?"));
        assert!(twiml.contains("action=\"/recording-complete?question=1\""));
        assert!(twiml.contains("<Redirect method=\"POST\">/recording-complete?question=1</Redirect>"));
    }

    #[test]
    fn test_base_url_prefixes_actions() {
        let mut script = Script::new("1234", vec!["A?".to_string()]);
        script.base_url = "https://journal.example.com".to_string();

        let twiml = script.pin_prompt(None).to_twiml();
        assert!(twiml.contains("action=\"https://journal.example.com/handle-pin\""));
    }

    #[test]
    fn test_pin_gather_fits_longest_pin() {
        let mut script = Script::new("1234", vec![]);
        script.admin_pin = Some("98765".to_string());

        match &script.pin_prompt(None).verbs()[0] {
            Verb::Gather(gather) => assert_eq!(gather.num_digits, Some(5)),
            other => panic!("expected gather, got {:?}", other),
        }
    }

    #[test]
    fn test_transcription_can_be_disabled() {
        let mut script = Script::new("1234", vec!["A?".to_string()]);
        script.transcribe = false;

        assert!(!script.ask(0).to_twiml().contains("transcribe="));
    }
}
