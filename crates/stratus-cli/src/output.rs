//! Human-readable CLI output

/// Formats command results with checkmark/cross prefixes
pub struct HumanOutput;

impl HumanOutput {
    pub fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }

    pub fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }

    pub fn info(&self, message: &str) {
        println!("  {}", message);
    }
}
