//! Line-oriented string builder for Markdown artifacts.

pub struct DocWriter {
    buf: String,
}

impl DocWriter {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(4096),
        }
    }

    /// Write a complete line (appends newline).
    pub fn line(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Write an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// `## Title` followed by a blank line.
    pub fn heading(&mut self, level: usize, text: &str) {
        self.line(&format!("{} {}", "#".repeat(level.max(1)), text));
        self.blank();
    }

    pub fn bullet(&mut self, text: &str) {
        self.line(&format!("- {}", text));
    }

    /// Numbered list starting at 1.
    pub fn numbered<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, item) in items.into_iter().enumerate() {
            self.line(&format!("{}. {}", i + 1, item.as_ref()));
        }
    }

    /// Write a fenced code block with an optional language tag.
    pub fn fenced(&mut self, lang: &str, body: &str) {
        self.line(&format!("```{}", lang));
        for line in body.lines() {
            self.line(line);
        }
        self.line("```");
    }

    /// Consume the writer and return the generated string.
    pub fn finish(self) -> String {
        self.buf
    }
}

impl Default for DocWriter {
    fn default() -> Self {
        Self::new()
    }
}
