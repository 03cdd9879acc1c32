//! Bilingual message lookup.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported UI languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    En,
    /// Italian (startup default).
    #[default]
    It,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 2] = [Language::En, Language::It];

    /// Returns the language code (e.g., "en").
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::It => "it",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::En),
            "it" => Ok(Self::It),
            other => Err(format!("unsupported language '{other}' (expected 'en' or 'it')")),
        }
    }
}

/// One message key with its two translations.
#[derive(Debug, Clone, Copy)]
pub struct LocalizedString {
    /// Lookup key.
    pub key: &'static str,
    /// English text.
    pub en: &'static str,
    /// Italian text.
    pub it: &'static str,
}

impl LocalizedString {
    /// Returns the text for the given language.
    pub fn get(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::It => self.it,
        }
    }
}

macro_rules! messages {
    ($($key:ident => ($en:expr, $it:expr)),* $(,)?) => {
        &[$(LocalizedString { key: stringify!($key), en: $en, it: $it }),*]
    };
}

/// The message table, loaded at startup and never modified.
pub static MESSAGES: &[LocalizedString] = messages! {
    // Header & general
    app_title => ("Virtual Architect Studio", "Virtual Architect Studio"),
    change_api_key => ("Change API Key", "Cambia Chiave API"),
    error_title => ("An error occurred", "Si è verificato un errore"),
    logout => ("Logout", "Esci"),
    not_logged_in => ("Not logged in.", "Nessun utente connesso."),

    // Credential setup
    api_key_modal_title => ("Enter your Gemini API Key", "Inserisci la tua Chiave API Gemini"),
    api_key_modal_description => (
        "To use this application, you need a Google Gemini API key. Get your key from Google AI Studio and paste it below.",
        "Per usare questa applicazione, hai bisogno di una chiave API di Google Gemini. Ottieni la tua chiave da Google AI Studio e incollala qui sotto."
    ),
    api_key_modal_placeholder => ("Paste your API key here", "Incolla qui la tua chiave API"),
    api_key_modal_save_button => ("Save and Continue", "Salva e Continua"),
    api_key_modal_error => ("Please enter a valid API key.", "Per favore, inserisci una chiave API valida."),

    // Image selector
    image_selector_title => ("Start by selecting an image", "Inizia selezionando un'immagine"),
    image_selector_upload_title => ("Upload your own photo", "Carica la tua foto"),
    image_selector_gallery_title => ("Or choose from our gallery", "Oppure scegli dalla nostra galleria"),

    // Composer
    upload_image_label => ("Your selected photo", "La tua foto selezionata"),
    upload_image_placeholder => ("Drag & drop or click to upload", "Trascina e rilascia o fai clic per caricare"),
    style_label => ("Choose a style (optional)", "Scegli uno stile (opzionale)"),
    style_modern => ("Modern", "Moderno"),
    style_minimalist => ("Minimalist", "Minimalista"),
    style_bohemian => ("Bohemian", "Boemo"),
    style_industrial => ("Industrial", "Industriale"),
    style_coastal => ("Coastal", "Costiero"),
    style_farmhouse => ("Farmhouse", "Rustico"),
    prompt_label => ("Describe your desired changes", "Descrivi le modifiche desiderate"),
    prompt_placeholder => (
        "e.g., add a green sofa, change the wall color to beige, more natural light",
        "es. aggiungi un divano verde, cambia il colore del muro in beige, più luce naturale"
    ),
    generate_button => ("Generate New Design", "Genera Nuovo Design"),
    generating_button => ("Generating...", "Generazione in corso..."),
    select_image_error => ("Please select an image first.", "Seleziona prima un'immagine."),
    empty_prompt_error => ("Please describe the changes you want.", "Descrivi le modifiche che desideri."),
    unsupported_file_error => (
        "Unsupported file. Use a JPEG, PNG or WebP image.",
        "File non supportato. Usa un'immagine JPEG, PNG o WebP."
    ),

    // Comparison
    comparison_placeholder => (
        "Upload an image and describe the changes to see the magic happen!",
        "Carica un'immagine e descrivi le modifiche per vedere la magia!"
    ),
    original_image_label => ("Original", "Originale"),
    generated_image_label => ("Generated", "Generato"),
    no_original_image => ("No original image uploaded.", "Nessuna immagine originale caricata."),
    generated_image_placeholder => ("Your generated image will appear here.", "La tua immagine generata apparirà qui."),

    // Generation outcomes
    api_key_missing => ("API key is not configured.", "La chiave API non è configurata."),
    invalid_api_key => (
        "Your Gemini API key is not valid. Please check it and try again.",
        "La tua chiave API Gemini non è valida. Controllala e riprova."
    ),
    generation_failed => (
        "Failed to generate the image. Please check the prompt or try a different image.",
        "Impossibile generare l'immagine. Controlla il prompt o prova un'immagine diversa."
    ),
    no_image_returned => (
        "The model did not return an image. Please try a different prompt.",
        "Il modello non ha restituito un'immagine. Prova un prompt diverso."
    ),
    unknown_error => (
        "An unknown error occurred during image generation.",
        "Si è verificato un errore sconosciuto durante la generazione dell'immagine."
    ),
};

/// Looks up message keys in the current language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Translator {
    language: Language,
}

impl Translator {
    /// Creates a translator starting in the given language.
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Returns the current language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Switches the language for all subsequent lookups.
    pub fn set_language(&mut self, language: Language) {
        tracing::debug!(%language, "language switched");
        self.language = language;
    }

    /// Returns the text for `key`, or `key` itself when it is not in the table.
    pub fn lookup<'a>(&self, key: &'a str) -> &'a str {
        MESSAGES
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.get(self.language))
            .unwrap_or(key)
    }
}
