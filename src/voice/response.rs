use std::fmt::Write;

/// A single instruction for the telephony provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Speak text to the caller
    Say(String),

    /// Silence, in seconds
    Pause(u32),

    /// Collect key presses, speaking/playing the nested prompts while waiting
    Gather(Gather),

    /// Record audio until the finish key, silence, or the length cap
    Record(Record),

    /// Play back a recording
    Play(String),

    /// Continue the call at another webhook
    Redirect(String),

    /// End the call
    Hangup,

    /// SMS reply body
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    pub action: String,
    pub num_digits: Option<usize>,
    pub finish_on_key: Option<String>,
    pub timeout_secs: u32,
    pub prompts: Vec<Verb>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub action: String,
    pub max_length_secs: u32,
    pub finish_on_key: String,
    pub play_beep: bool,
    /// Transcription callback URL, when transcription is requested
    pub transcribe_callback: Option<String>,
}

/// Ordered list of verbs returned from a webhook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn pause(mut self, secs: u32) -> Self {
        if secs > 0 {
            self.verbs.push(Verb::Pause(secs));
        }
        self
    }

    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    pub fn record(mut self, record: Record) -> Self {
        self.verbs.push(Verb::Record(record));
        self
    }

    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play(url.into()));
        self
    }

    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect(url.into()));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn message(mut self, body: impl Into<String>) -> Self {
        self.verbs.push(Verb::Message(body.into()));
        self
    }

    /// Append all verbs of `other`
    pub fn then(mut self, other: VoiceResponse) -> Self {
        self.verbs.extend(other.verbs);
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// All spoken text, in order (nested gather prompts included)
    pub fn spoken_text(&self) -> String {
        let mut parts = Vec::new();
        collect_spoken(&self.verbs, &mut parts);
        parts.join(" ")
    }

    pub fn ends_call(&self) -> bool {
        matches!(self.verbs.last(), Some(Verb::Hangup))
    }

    /// Render as a TwiML document
    pub fn to_twiml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        if self.verbs.is_empty() {
            xml.push_str("<Response/>");
            return xml;
        }
        xml.push_str("<Response>");
        for verb in &self.verbs {
            render_verb(&mut xml, verb);
        }
        xml.push_str("</Response>");
        xml
    }
}

fn collect_spoken<'a>(verbs: &'a [Verb], out: &mut Vec<&'a str>) {
    for verb in verbs {
        match verb {
            Verb::Say(text) => out.push(text),
            Verb::Gather(gather) => collect_spoken(&gather.prompts, out),
            _ => {}
        }
    }
}

fn render_verb(xml: &mut String, verb: &Verb) {
    // Writing into a String cannot fail
    let _ = match verb {
        Verb::Say(text) => write!(xml, "<Say>{}</Say>", escape(text)),
        Verb::Pause(secs) => write!(xml, "<Pause length=\"{}\"/>", secs),
        Verb::Gather(gather) => {
            let _ = write!(
                xml,
                "<Gather action=\"{}\" method=\"POST\" timeout=\"{}\"",
                escape(&gather.action),
                gather.timeout_secs
            );
            if let Some(n) = gather.num_digits {
                let _ = write!(xml, " numDigits=\"{}\"", n);
            }
            if let Some(key) = &gather.finish_on_key {
                let _ = write!(xml, " finishOnKey=\"{}\"", escape(key));
            }
            xml.push('>');
            for prompt in &gather.prompts {
                render_verb(xml, prompt);
            }
            write!(xml, "</Gather>")
        }
        Verb::Record(record) => {
            let _ = write!(
                xml,
                "<Record action=\"{}\" method=\"POST\" maxLength=\"{}\" finishOnKey=\"{}\" playBeep=\"{}\"",
                escape(&record.action),
                record.max_length_secs,
                escape(&record.finish_on_key),
                record.play_beep
            );
            if let Some(callback) = &record.transcribe_callback {
                let _ = write!(
                    xml,
                    " transcribe=\"true\" transcribeCallback=\"{}\"",
                    escape(callback)
                );
            }
            write!(xml, "/>")
        }
        Verb::Play(url) => write!(xml, "<Play>{}</Play>", escape(url)),
        Verb::Redirect(url) => write!(xml, "<Redirect method=\"POST\">{}</Redirect>", escape(url)),
        Verb::Hangup => write!(xml, "<Hangup/>"),
        Verb::Message(body) => write!(xml, "<Message>{}</Message>", escape(body)),
    };
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response() {
        let xml = VoiceResponse::new().to_twiml();
        assert!(xml.ends_with("<Response/>"));
    }

    #[test]
    fn test_verbs_render_in_order() {
        let xml = VoiceResponse::new()
            .pause(2)
            .say("Hello")
            .play("https://example.com/r1")
            .hangup()
            .to_twiml();

        let pause = xml.find("<Pause length=\"2\"/>").unwrap();
        let say = xml.find("<Say>Hello</Say>").unwrap();
        let play = xml.find("<Play>https://example.com/r1</Play>").unwrap();
        let hangup = xml.find("<Hangup/>").unwrap();
        assert!(pause < say && say < play && play < hangup);
    }

    #[test]
    fn test_zero_pause_is_skipped() {
        let response = VoiceResponse::new().pause(0).say("Hi");
        assert_eq!(response.verbs().len(), 1);
    }

    #[test]
    fn test_gather_nests_prompts() {
        let xml = VoiceResponse::new()
            .gather(Gather {
                action: "/menu-choice?question=0".to_string(),
                num_digits: Some(1),
                finish_on_key: None,
                timeout_secs: 8,
                prompts: vec![Verb::Say("Press 1".to_string())],
            })
            .to_twiml();

        assert!(xml.contains(
            "<Gather action=\"/menu-choice?question=0\" method=\"POST\" timeout=\"8\" numDigits=\"1\"><Say>Press 1</Say></Gather>"
        ));
    }

    #[test]
    fn test_record_with_transcription() {
        let xml = VoiceResponse::new()
            .record(Record {
                action: "/recording-complete?question=1".to_string(),
                max_length_secs: 300,
                finish_on_key: "#".to_string(),
                play_beep: true,
                transcribe_callback: Some("/transcription".to_string()),
            })
            .to_twiml();

        assert!(xml.contains("maxLength=\"300\""));
        assert!(xml.contains("finishOnKey=\"#\""));
        assert!(xml.contains("transcribe=\"true\" transcribeCallback=\"/transcription\""));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = VoiceResponse::new()
            .say("Faith & <hope>")
            .play("https://example.com/a?x=1&y=2")
            .to_twiml();

        assert!(xml.contains("<Say>Faith &amp; &lt;hope&gt;</Say>"));
        assert!(xml.contains("x=1&amp;y=2"));
    }

    #[test]
    fn test_spoken_text_includes_gather_prompts() {
        let response = VoiceResponse::new().say("One").gather(Gather {
            action: "/handle-pin".to_string(),
            num_digits: None,
            finish_on_key: Some("#".to_string()),
            timeout_secs: 10,
            prompts: vec![Verb::Say("Two".to_string())],
        });

        assert_eq!(response.spoken_text(), "One Two");
        assert!(!response.ends_call());
    }
}
