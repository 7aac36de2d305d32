use aichat_core::error::ChatResult;
use aichat_core::{
    export, log, ChatError, Config, DataPaths, OpenAIClient, Playback, SearchOutcome,
    SearchState, Session, SpeechClient,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Prompt,
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Notice { title: String, text: String },
    Help,
    ConfirmClear,
    Find { input: String, cursor: usize },
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: Focus,
    pub popup: Option<Popup>,
    pub edit_config_requested: bool,

    // Configuration and clients
    pub config: Config,
    pub paths: DataPaths,
    pub completion: OpenAIClient,
    pub speech: SpeechClient,

    // Conversation
    pub session: Session,
    pub playback: Playback,
    pub query_loading: bool,
    pub query_task: Option<JoinHandle<ChatResult<String>>>,

    // Prompt editing
    pub prompt_input: String,
    pub prompt_cursor: usize, // cursor position in prompt_input (chars)

    // Response area
    pub response: String,
    pub response_cursor: usize, // byte offset where a new search starts
    pub highlight: Option<(usize, usize)>,
    pub response_scroll: u16,
    pub response_height: u16, // inner height, updated during render
    pub response_width: u16,

    // Search
    pub search: SearchState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(config: Config, paths: DataPaths) -> Self {
        let completion = OpenAIClient::new();
        let speech = SpeechClient::new(&config.api_key_env, config.player.clone());
        let session = Session::initialize(config.role.clone());
        let response = intro_text(&config);

        Self {
            should_quit: false,
            focus: Focus::Prompt,
            popup: None,
            edit_config_requested: false,

            config,
            paths,
            completion,
            speech,

            session,
            playback: Playback::Off,
            query_loading: false,
            query_task: None,

            prompt_input: String::new(),
            prompt_cursor: 0,

            response,
            response_cursor: 0,
            highlight: None,
            response_scroll: 0,
            response_height: 0,
            response_width: 0,

            search: SearchState::default(),

            animation_frame: 0,
        }
    }

    /// Swap in a freshly loaded configuration and reset everything built from it.
    pub fn reload(&mut self, config: Config) {
        tracing::info!(model = %config.model, "configuration reloaded");

        self.speech = SpeechClient::new(&config.api_key_env, config.player.clone());
        self.session.reset(config.role.clone());
        self.playback = Playback::Off;
        self.search = SearchState::default();
        if let Some(task) = self.query_task.take() {
            task.abort();
        }
        self.query_loading = false;
        self.config = config;
        self.clear();
    }

    pub fn notify(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.popup = Some(Popup::Notice {
            title: title.into(),
            text: text.into(),
        });
    }

    pub fn notify_error(&mut self, err: &ChatError) {
        tracing::warn!(error = %err, "surfacing error");
        self.notify(err.title(), err.to_string());
    }

    /// Reset prompt and response to their start-up contents.
    pub fn clear(&mut self) {
        self.prompt_input.clear();
        self.prompt_cursor = 0;
        self.set_response(intro_text(&self.config));
    }

    pub fn set_response(&mut self, text: String) {
        self.response = text;
        self.response_cursor = 0;
        self.highlight = None;
        self.response_scroll = 0;
    }

    // Conversation

    /// Start an exchange with the current prompt text.
    ///
    /// The user turn is recorded immediately; the network call runs in the
    /// background and is picked up by [`App::poll_query`].
    pub fn submit(&mut self) {
        if self.query_task.is_some() {
            return;
        }

        let payload = self.session.begin_turn(self.prompt_input.clone());
        let client = self.completion.clone();
        let api_key_env = self.config.api_key_env.clone();
        let model = self.config.model.clone();

        tracing::info!(turns = payload.len(), "submitting prompt");

        self.query_loading = true;
        self.animation_frame = 0;
        self.set_response(String::new());
        self.query_task = Some(tokio::spawn(async move {
            client.complete(&api_key_env, &model, &payload).await
        }));
    }

    /// A completion request is in flight.
    pub fn is_busy(&self) -> bool {
        self.query_task.is_some()
    }

    /// Collect the pending reply if the request has finished.
    pub async fn poll_query(&mut self) {
        let finished = self.query_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.query_task.take() {
            let reply = match task.await {
                Ok(reply) => reply,
                Err(e) => Err(ChatError::Transport(e.to_string())),
            };
            self.handle_reply(reply).await;
        }
    }

    pub async fn handle_reply(&mut self, reply: ChatResult<String>) {
        self.query_loading = false;

        match self.session.finish_turn(reply) {
            Ok(text) => {
                self.set_response(text.clone());

                if self.config.logging {
                    if let Err(e) = log::append_exchange(&self.paths.log_file(), self.session.messages()) {
                        self.notify_error(&e);
                    }
                }

                self.prompt_input.clear();
                self.prompt_cursor = 0;

                if self.playback.is_on() {
                    if let Err(e) = self.speak(&text).await {
                        self.notify_error(&e);
                    }
                }
            }
            Err(e) => {
                self.notify_error(&e);
                self.set_response(String::new());
                self.prompt_input.clear();
                self.prompt_cursor = 0;
            }
        }
    }

    pub async fn speak(&self, text: &str) -> ChatResult<()> {
        self.speech
            .speak(&self.config.voice, &self.paths.speech_file(), text)
            .await
    }

    pub async fn toggle_playback(&mut self) {
        let speech = self.speech.clone();
        let path = self.paths.speech_file();
        let voice = self.config.voice.clone();

        let result = self.playback
            .toggle(&voice, |voice, text| async move {
                speech.speak(&voice, &path, &text).await
            })
            .await;

        if let Err(e) = result {
            self.notify(
                "Voice Error",
                format!("There is a problem with the voice\n\n{}", e),
            );
        }
    }

    /// Advance the "Thinking" ellipsis (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.query_loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Search

    /// Begin a search for `needle` at the current response position.
    pub fn find(&mut self, needle: &str) {
        self.search = SearchState::start(needle, self.response_cursor);
        self.find_next();
    }

    pub fn find_next(&mut self) {
        if self.search.is_empty() {
            return;
        }

        match self.search.find_next(&self.response) {
            SearchOutcome::Found { start, end } => {
                self.highlight = Some((start, end));
                self.response_cursor = end;
                self.focus = Focus::Response;
                self.scroll_to_offset(start);
            }
            SearchOutcome::NotFound => {
                self.highlight = None;
                self.response_cursor = 0;
                let text = format!("\"{}\" was not found.", self.search.term());
                self.notify("Find", text);
            }
        }
    }

    // Log, export

    pub fn view_log(&mut self) {
        if !self.config.logging {
            self.notify("View Log", "Log is 'off'");
            return;
        }

        match log::read_log(&self.paths.log_file()) {
            Ok(text) => {
                let end = text.len();
                self.set_response(text);
                self.response_cursor = end;
                self.focus = Focus::Response;
                self.scroll_to_offset(end);
            }
            Err(e) => self.notify_error(&e),
        }
    }

    pub fn export(&mut self) {
        if let Err(e) = export::export_html(&self.response, &self.paths.export_file()) {
            self.notify_error(&e);
        }
    }

    // Response scrolling

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_response_lines().saturating_sub(self.response_height);
        self.response_scroll = self.response_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.response_scroll = self.response_scroll.saturating_sub(lines);
    }

    pub fn page_size(&self) -> u16 {
        self.response_height.max(2) / 2
    }

    fn wrap_width(&self) -> usize {
        // Default to 80 before the first render
        if self.response_width > 0 {
            self.response_width as usize
        } else {
            80
        }
    }

    fn total_response_lines(&self) -> u16 {
        wrapped_line_of(&self.response, self.response.len(), self.wrap_width()) + 1
    }

    /// Scroll so the line holding `offset` sits in view.
    fn scroll_to_offset(&mut self, offset: usize) {
        let line = wrapped_line_of(&self.response, offset, self.wrap_width());
        let height = if self.response_height > 0 { self.response_height } else { 20 };

        if line < self.response_scroll || line >= self.response_scroll + height {
            self.response_scroll = line.saturating_sub(height / 2);
        }
    }

    // Prompt editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.prompt_input, self.prompt_cursor);
        self.prompt_input.insert(byte_pos, c);
        self.prompt_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.prompt_cursor > 0 {
            self.prompt_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.prompt_input, self.prompt_cursor);
            self.prompt_input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.prompt_input.chars().count();
        if self.prompt_cursor < char_count {
            let byte_pos = char_to_byte_index(&self.prompt_input, self.prompt_cursor);
            self.prompt_input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.prompt_cursor = self.prompt_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.prompt_input.chars().count();
        self.prompt_cursor = (self.prompt_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.prompt_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.prompt_cursor = self.prompt_input.chars().count();
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Visual line (after wrapping at `width`) that contains byte `offset`.
pub fn wrapped_line_of(text: &str, offset: usize, width: usize) -> u16 {
    let width = width.max(1);
    let offset = offset.min(text.len());
    let mut line: usize = 0;
    let mut line_start = 0;

    for (idx, _) in text.match_indices('\n') {
        if idx >= offset {
            break;
        }
        // Use character count, not byte length, for proper UTF-8 handling
        let chars = text[line_start..idx].chars().count();
        line += chars / width + 1;
        line_start = idx + 1;
    }

    let head = text.get(line_start..offset).unwrap_or("");
    line += head.chars().count() / width;
    line.min(u16::MAX as usize) as u16
}

pub fn intro_text(config: &Config) -> String {
    format!(
        "\nWelcome to aichat\n    \
         a terminal client for conversing with\n    \
         OpenAI's Large Language Models\n\n\
         Model: {}\n\
         Role: {}\n\
         API key variable: {}\n\
         Log: {}\n\
         Editor: {}\n\
         Voice: {}\n\n\
         A registered OpenAI API key is required\n\
         and set as an environment variable\n\n\
         Use F1 (or Ctrl-H) for the list of keyboard commands\n",
        config.model,
        config.role,
        config.api_key_env,
        if config.logging { "on" } else { "off" },
        config.editor,
        config.voice,
    )
}
