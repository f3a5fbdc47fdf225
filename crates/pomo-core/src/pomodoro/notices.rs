//! Messages sent to the chat at phase boundaries.

pub fn focus_started(focus_minutes: u32) -> String {
    format!("🎯 Study session started! Focus for {focus_minutes} minutes.")
}

pub fn break_started(break_minutes: u32) -> String {
    format!(
        "⏰ Study session ended! Time for a break.\n☕ Break time! Take {break_minutes} minutes to rest."
    )
}

pub fn next_focus_started(focus_minutes: u32) -> String {
    format!(
        "⏰ Break ended! Time to get back to studying.\n{}",
        focus_started(focus_minutes)
    )
}

pub fn completed() -> String {
    "⏰ Break ended! Time to get back to studying.\n🎉 Congratulations! You've completed all study sessions!"
        .to_string()
}

pub fn stopped() -> String {
    "❌ Study session stopped.".to_string()
}
