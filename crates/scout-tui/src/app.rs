use scout_core::{Config, Phase, SessionState};

pub struct App {
    pub should_quit: bool,

    // Latest snapshot published by the session controller
    pub session: SessionState,

    // Input line
    pub input: String,
    pub cursor: usize, // cursor position in chars, not bytes

    // Chat pane
    pub scroll: u16,
    pub follow: bool, // keep the newest text in view
    pub chat_height: u16,
    pub chat_width: u16,

    pub animation_frame: u8,
    pub title: String,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl App {
    pub fn new(config: &Config) -> Self {
        let title = match &config.model {
            Some(model) => format!(" scout: {} ", model),
            None => " scout ".to_string(),
        };

        Self {
            should_quit: false,
            session: SessionState::new(),
            input: String::new(),
            cursor: 0,
            scroll: 0,
            follow: true,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            title,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.session.phase.is_busy()
    }

    /// Whether to show the "Thinking..." placeholder instead of streamed text
    pub fn is_thinking(&self) -> bool {
        match self.session.phase {
            Phase::AwaitingSearch => true,
            Phase::AwaitingCompletion => self.session.pending_text.is_empty(),
            Phase::Idle | Phase::Failed => false,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: SessionState) {
        self.session = snapshot;
        if self.follow {
            self.scroll_to_bottom();
        }
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = (self.scroll + lines).min(max);
        self.follow = self.scroll >= max;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_thinking() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
        self.follow = true;
    }

    fn max_scroll(&self) -> u16 {
        self.total_chat_lines().saturating_sub(self.chat_height)
    }

    /// Line count of the chat pane after wrapping; mirrors what ui.rs renders.
    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.session.history {
            // Role line, wrapped content, blank separator
            total_lines = total_lines
                .saturating_add(2)
                .saturating_add(wrapped_lines(&msg.content, wrap_width));
        }

        if self.is_thinking() {
            total_lines = total_lines.saturating_add(2);
        } else if !self.session.pending_text.is_empty() {
            total_lines = total_lines
                .saturating_add(1)
                .saturating_add(wrapped_lines(&self.session.pending_text, wrap_width));
        }

        if let Some(error) = &self.session.last_error {
            total_lines = total_lines.saturating_add(wrapped_lines(error, wrap_width));
        }

        total_lines
    }
}

/// Saturates at `u16::MAX`, the furthest ratatui can scroll anyway.
fn wrapped_lines(text: &str, wrap_width: usize) -> u16 {
    let mut lines: u16 = 0;
    for line in text.lines() {
        // Use character count, not byte length, for proper UTF-8 handling
        let char_count = line.chars().count();
        // Empty line still takes one line
        let rows = char_count.div_ceil(wrap_width).max(1);
        lines = lines.saturating_add(u16::try_from(rows).unwrap_or(u16::MAX));
    }
    lines.max(1)
}
