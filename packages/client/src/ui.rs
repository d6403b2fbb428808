//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after printing an async notification
pub fn redisplay_prompt(user_id: &str) {
    print!("{}> ", user_id);
    std::io::stdout().flush().ok();
}
