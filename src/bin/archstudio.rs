//! CLI for Virtual Architect Studio.

use archstudio::{
    App, CredentialStore, FileStore, GeminiClient, GeminiModel, Language, Screen, StylePreset,
    SubmitOutcome, Translator, GALLERY,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archstudio")]
#[command(about = "Restyle room photos with Gemini image editing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// UI language (en, it)
    #[arg(long, global = true, env = "ARCHSTUDIO_LANG", default_value = "it")]
    lang: Language,

    /// Directory holding the stored API key
    #[arg(long, global = true, env = "ARCHSTUDIO_HOME")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the stored Gemini API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// List the sample gallery
    Gallery,

    /// Apply described changes to a room photo
    Edit(EditArgs),

    /// Show the current user
    Whoami,

    /// Show which screen the app would open on
    Status,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store a key
    Set {
        /// The Gemini API key
        key: String,

        /// Check the key against the API before storing it
        #[arg(long)]
        verify: bool,
    },

    /// Show the stored key (masked)
    Show,

    /// Forget the stored key
    Clear,
}

#[derive(Args)]
struct EditArgs {
    /// The changes to apply
    prompt: String,

    /// Room photo(s) to upload; the first accepted file is used
    #[arg(short, long = "image", conflicts_with = "gallery")]
    images: Vec<PathBuf>,

    /// Gallery image id (see `archstudio gallery`)
    #[arg(short, long)]
    gallery: Option<u32>,

    /// Style preset
    #[arg(short, long, value_enum)]
    style: Option<StyleArg>,

    /// Gemini model
    #[arg(long, default_value = "gemini-2.5-flash-image-preview")]
    model: GeminiModel,

    /// Output file path (defaults to generated.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, env = "ARCHSTUDIO_BASE_URL", hide = true)]
    base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    Modern,
    Minimalist,
    Bohemian,
    Industrial,
    Coastal,
    Farmhouse,
}

impl From<StyleArg> for StylePreset {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Modern => StylePreset::Modern,
            StyleArg::Minimalist => StylePreset::Minimalist,
            StyleArg::Bohemian => StylePreset::Bohemian,
            StyleArg::Industrial => StylePreset::Industrial,
            StyleArg::Coastal => StylePreset::Coastal,
            StyleArg::Farmhouse => StylePreset::Farmhouse,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("archstudio=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    check_credentials(&cli.command, &open_credentials(&cli)?, &Translator::new(cli.lang))?;

    match cli.command {
        Commands::Key { ref action } => manage_key(&cli, action).await?,
        Commands::Gallery => list_gallery(&cli)?,
        Commands::Edit(ref args) => edit(&cli, args).await?,
        Commands::Whoami => whoami(&cli)?,
        Commands::Status => status(&cli)?,
    }

    Ok(())
}

fn open_credentials(cli: &Cli) -> anyhow::Result<CredentialStore> {
    let store = match cli.data_dir {
        Some(ref dir) => FileStore::new(dir),
        None => FileStore::open_default()?,
    };
    Ok(CredentialStore::load(store)?)
}

fn build_app(cli: &Cli, client: GeminiClient) -> anyhow::Result<App<GeminiClient>> {
    let credentials = open_credentials(cli)?;
    let http = client.http().clone();
    Ok(App::new(credentials, client, http, cli.lang))
}

/// Fails with the setup prompt when no key is stored. Only `key` runs without one.
fn check_credentials(
    command: &Commands,
    credentials: &CredentialStore,
    t: &Translator,
) -> anyhow::Result<()> {
    if matches!(command, Commands::Key { .. }) || credentials.is_set() {
        return Ok(());
    }
    anyhow::bail!(
        "{}\n{}\n(archstudio key set <KEY>)",
        t.lookup("api_key_modal_title"),
        t.lookup("api_key_modal_description")
    );
}

async fn manage_key(cli: &Cli, action: &KeyAction) -> anyhow::Result<()> {
    let t = Translator::new(cli.lang);
    let credentials = open_credentials(cli)?;

    match action {
        KeyAction::Set { key, verify } => {
            if *verify && !key.trim().is_empty() {
                let client = GeminiClient::builder().build()?;
                match client.verify_key(key).await {
                    Ok(()) => {}
                    Err(e) if e.is_invalid_api_key() => anyhow::bail!(e.user_message(&t)),
                    Err(e) => return Err(e.into()),
                }
            }
            credentials
                .submit_setup(key, &t)
                .map_err(anyhow::Error::msg)?;
            if cli.json {
                println!("{}", serde_json::json!({ "stored": true }));
            } else {
                println!("{}", t.lookup("api_key_modal_save_button"));
            }
        }
        KeyAction::Show => {
            let masked = credentials.masked();
            if cli.json {
                println!("{}", serde_json::json!({ "key": masked }));
            } else {
                match masked {
                    Some(key) => println!("{key}"),
                    None => println!("{}", t.lookup("api_key_missing")),
                }
            }
        }
        KeyAction::Clear => {
            credentials.clear()?;
            if cli.json {
                println!("{}", serde_json::json!({ "cleared": true }));
            } else {
                println!("{}", t.lookup("change_api_key"));
            }
        }
    }
    Ok(())
}

fn list_gallery(cli: &Cli) -> anyhow::Result<()> {
    let t = Translator::new(cli.lang);

    if cli.json {
        let items: Vec<_> = GALLERY
            .iter()
            .map(|item| serde_json::json!({ "id": item.id, "src": item.src, "alt": item.alt }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("{}:\n", t.lookup("image_selector_gallery_title"));
        for item in &GALLERY {
            println!("  [{}] {}", item.id, item.alt);
            println!("      {}", item.src);
        }
    }
    Ok(())
}

async fn edit(cli: &Cli, args: &EditArgs) -> anyhow::Result<()> {
    let mut builder = GeminiClient::builder().model(args.model);
    if let Some(ref url) = args.base_url {
        builder = builder.base_url(url);
    }
    let app = build_app(cli, builder.build()?)?;
    let t = app.translator();

    if let Some(id) = args.gallery {
        if !app.select_gallery(id) {
            anyhow::bail!("unknown gallery image {id} (1-{})", GALLERY.len());
        }
    } else if !args.images.is_empty() && !app.drop_files(args.images.as_slice())? {
        anyhow::bail!(t.lookup("unsupported_file_error").to_string());
    }

    if let Some(style) = args.style {
        app.studio().toggle_style(style.into());
    }
    app.studio().set_instruction(&args.prompt);

    let outcome = app.generate().await;
    if outcome == SubmitOutcome::Rejected {
        if let Some(message) = app.studio().validation_error() {
            anyhow::bail!(message);
        }
    }

    let state = app.studio().state();
    let selection = state.selection();
    let error = selection.and_then(|s| s.error.clone());
    let result = selection.and_then(|s| s.result.clone());

    let saved = match result {
        Some(ref image) => {
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("generated.{}", image.format().extension())));
            let size = image.save(&path)?;
            Some((path, size))
        }
        None => None,
    };

    if cli.json {
        let report = serde_json::json!({
            "success": saved.is_some(),
            "original": selection.map(|s| s.original.display_ref().to_string()),
            "instruction": app.studio().instruction(),
            "output": saved.as_ref().map(|(p, _)| p.display().to_string()),
            "size_bytes": saved.as_ref().map(|(_, size)| size),
            "mime_type": result.as_ref().map(|r| r.mime_type.clone()),
            "model": args.model.as_str(),
            "error": error,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", app.render());
        if let Some((ref path, size)) = saved {
            println!("-> {} ({} bytes)", path.display(), size);
        }
    }

    if saved.is_none() {
        anyhow::bail!(error.unwrap_or_else(|| t.lookup("unknown_error").to_string()));
    }
    Ok(())
}

fn whoami(cli: &Cli) -> anyhow::Result<()> {
    let app = build_app(cli, GeminiClient::builder().build()?)?;
    let t = app.translator();

    match app.session().user() {
        Some(user) if cli.json => println!("{}", serde_json::to_string_pretty(user)?),
        Some(user) => println!("{} <{}>", user.name, user.email),
        None => println!("{}", t.lookup("not_logged_in")),
    }
    Ok(())
}

fn status(cli: &Cli) -> anyhow::Result<()> {
    let app = build_app(cli, GeminiClient::builder().build()?)?;
    let screen = match app.screen() {
        Screen::CredentialSetup => "setup",
        Screen::Main => "main",
    };
    let key = app.credentials().masked();

    if cli.json {
        let report = serde_json::json!({
            "screen": screen,
            "key": key,
            "language": app.translator().language().code(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("screen: {screen}");
        println!("key: {}", key.as_deref().unwrap_or("-"));
        println!("language: {}", app.translator().language());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstudio::MemoryStore;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("archstudio").chain(args.iter().copied())).unwrap()
    }

    fn credentials(key: Option<&str>) -> CredentialStore {
        let store = CredentialStore::load(MemoryStore::new()).unwrap();
        if let Some(key) = key {
            store.set(key).unwrap();
        }
        store
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_command_but_key_needs_a_stored_key() {
        let t = Translator::new(Language::En);
        let empty = credentials(None);

        for args in [
            &["gallery"][..],
            &["status"],
            &["whoami"],
            &["edit", "add plants", "--gallery", "3"],
        ] {
            let cli = parse(args);
            let err = check_credentials(&cli.command, &empty, &t).unwrap_err();
            let message = err.to_string();
            assert!(message.starts_with("Enter your Gemini API Key\n"), "{args:?}: {message}");
            assert!(message.contains("Google AI Studio"), "{args:?}: {message}");
        }
    }

    #[test]
    fn test_key_commands_run_without_a_stored_key() {
        let t = Translator::new(Language::En);
        let empty = credentials(None);

        for args in [&["key", "show"][..], &["key", "clear"], &["key", "set", "AIza"]] {
            let cli = parse(args);
            assert!(check_credentials(&cli.command, &empty, &t).is_ok(), "{args:?}");
        }
    }

    #[test]
    fn test_stored_key_opens_every_command() {
        let t = Translator::new(Language::En);
        let stored = credentials(Some("AIzaSyExample"));

        for args in [&["gallery"][..], &["status"], &["whoami"]] {
            let cli = parse(args);
            assert!(check_credentials(&cli.command, &stored, &t).is_ok(), "{args:?}");
        }
    }
}
