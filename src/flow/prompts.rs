//! Caller-facing wording

pub const PIN_PROMPT: &str =
    "Welcome to your voice journal. Please enter your PIN, followed by the pound key.";
pub const PIN_NOT_RECEIVED: &str = "We didn't receive your PIN.";
pub const INVALID_PIN: &str = "Invalid PIN. Goodbye.";
pub const GREETING: &str = "Thank you. Let's begin your reflection.";
pub const BROADCAST_INTRO: &str = "First, here is a message from your pastor.";

pub const RECORD_INSTRUCTIONS: &str =
    "Record your answer after the beep. Press pound when you are finished.";
pub const NO_RECORDING: &str = "Sorry, we didn't hear a recording.";
pub const ANSWER_MENU: &str =
    "To save your answer, press 1. To record it again, press 2. To hear it, press 3.";
pub const INVALID_CHOICE: &str = "Sorry, that was not a valid choice.";
pub const ANSWER_SAVED: &str = "Your answer has been saved.";
pub const TRY_AGAIN: &str = "Okay, let's try that again.";
pub const PLAYBACK_INTRO: &str = "Here is what you recorded.";

pub const BROADCAST_PROMPT: &str =
    "Please record this week's message for callers after the beep. Press pound when you are finished.";
pub const BROADCAST_MENU: &str =
    "To save this message, press 1. To record it again, press 2. To hear it, press 3.";
pub const BROADCAST_SAVED: &str =
    "Your message has been saved and will be played to callers. Goodbye.";

pub const JOURNAL_SAVED: &str =
    "Thank you for journaling today. Your responses have been saved. Goodbye.";
pub const JOURNAL_SAVE_FAILED: &str = "Thank you for journaling today. Your responses were recorded, but we could not save them to your journal. Goodbye.";

pub const SESSION_EXPIRED: &str =
    "Sorry, your session has expired. Please call back to start again. Goodbye.";
pub const CALL_FINISHED: &str = "This call has finished. Goodbye.";
pub const UNKNOWN_CALLER: &str = "Sorry, we could not identify your call. Goodbye.";

pub const SMS_CALLBACK: &str = "Thanks! We'll call you in a moment for your journal.";
pub const SMS_UNAVAILABLE: &str = "Sorry, call-back is not available. Please call in directly.";

pub fn question(number: usize, total: usize, text: &str) -> String {
    format!("Question {} of {}. {}", number, total, text)
}
