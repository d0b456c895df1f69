//! Input resolution for a single UI tick.
//!
//! A tick can carry several signals at once (say, a typed message and a
//! microphone press). The resolver picks exactly one input source by walking
//! an ordered rule table, and decides where the resulting text goes: the
//! search trigger is not a source of its own, it only reroutes text to the
//! web-search adapter.

/// One signal observed during a UI interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    TypedText(String),
    MicTrigger,
    UploadedAudio(Vec<u8>),
    SearchTrigger,
    TypedTextWithSearch(String),
}

/// Everything observed in one tick, folded from a list of `InputEvent`s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub typed_text: Option<String>,
    pub mic: bool,
    pub upload: Option<Vec<u8>>,
    pub search: bool,
}

impl Signals {
    /// Later events overwrite earlier ones of the same kind. Blank typed text
    /// counts as no text at all.
    pub fn from_events(events: impl IntoIterator<Item = InputEvent>) -> Self {
        let mut signals = Signals::default();
        for event in events {
            match event {
                InputEvent::TypedText(text) => signals.set_text(text),
                InputEvent::MicTrigger => signals.mic = true,
                InputEvent::UploadedAudio(bytes) => signals.upload = Some(bytes),
                InputEvent::SearchTrigger => signals.search = true,
                InputEvent::TypedTextWithSearch(text) => {
                    signals.set_text(text);
                    signals.search = true;
                }
            }
        }
        signals
    }

    fn set_text(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        self.typed_text = Some(text);
    }

    pub fn is_empty(&self) -> bool {
        self.typed_text.is_none() && !self.mic && self.upload.is_none()
    }
}

/// Where the text for this turn comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Microphone,
    Upload(Vec<u8>),
    Typed(String),
}

impl InputSource {
    pub fn label(&self) -> &'static str {
        match self {
            InputSource::Microphone => "microphone",
            InputSource::Upload(_) => "uploaded audio",
            InputSource::Typed(_) => "typed text",
        }
    }
}

/// Which adapter receives the resolved text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Generate,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub source: InputSource,
    pub route: Route,
}

type Rule = fn(&mut Signals) -> Option<InputSource>;

/// Evaluated top to bottom; the first rule that yields a source wins.
const RULES: [(&str, Rule); 3] = [
    ("microphone", microphone_rule),
    ("uploaded file", upload_rule),
    ("typed text", typed_text_rule),
];

fn microphone_rule(signals: &mut Signals) -> Option<InputSource> {
    signals.mic.then_some(InputSource::Microphone)
}

fn upload_rule(signals: &mut Signals) -> Option<InputSource> {
    signals.upload.take().map(InputSource::Upload)
}

fn typed_text_rule(signals: &mut Signals) -> Option<InputSource> {
    signals.typed_text.take().map(InputSource::Typed)
}

/// Picks the input source and route for a tick, or `None` when there is
/// nothing to do. A search trigger with no text source resolves to `None`.
pub fn resolve(mut signals: Signals) -> Option<Resolution> {
    if signals.is_empty() {
        return None;
    }
    let route = if signals.search {
        Route::Search
    } else {
        Route::Generate
    };

    for (name, rule) in RULES {
        if let Some(source) = rule(&mut signals) {
            tracing::debug!("Input resolved by the {} rule.", name);
            return Some(Resolution { source, route });
        }
    }
    None
}
