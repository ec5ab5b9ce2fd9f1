use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use coach_i18n::audit::audit;
use coach_i18n::config::Config;
use coach_i18n::fuzzy_matcher::KeyMatcher;
use coach_i18n::{
    ConfigPreferenceStore, LocaleCatalog, LocaleSession, ResolveOptions, Resolved, SessionError, TranslationNode,
    Translator,
};

#[derive(Parser)]
#[command(name = "ci18n", version)]
#[command(about = "Look up, switch and audit the coaching site's translations")]
struct Cli {
    /// Directory of <locale>.json files to use instead of the bundled copy
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a dotted key path
    T {
        /// Key path, e.g. about.hero.title
        key: String,
        /// Locale to resolve in [default: current language]
        #[arg(long)]
        lang: Option<String>,
        /// Text returned when the key is missing everywhere
        #[arg(long)]
        fallback: Option<String>,
        /// Print lists and subtrees instead of falling back
        #[arg(long)]
        objects: bool,
    },
    /// Show or change the current language
    Lang {
        #[command(subcommand)]
        action: Option<LangAction>,
    },
    /// List available languages
    Locales,
    /// List translation keys with their values
    Keys {
        /// Only keys starting with this prefix
        prefix: Option<String>,
        /// Locale to list [default: current language]
        #[arg(long)]
        lang: Option<String>,
    },
    /// Report keys missing from or extra to each language
    Audit,
}

#[derive(Subcommand)]
enum LangAction {
    /// Switch and remember the language
    Set {
        /// Locale code or tag, e.g. bg or bg-BG
        locale: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = Config::get_config_path();
    let config = Config::load_from(&config_path)?;
    let catalog_dir = cli.catalog.clone().or_else(|| config.i18n.catalog_dir.clone());
    let catalog = load_catalog(catalog_dir.as_deref(), &config.i18n.default_locale)?;

    // Env override applies to this run only and is never persisted
    let env_lang = std::env::var("CI18N_LANG").ok();
    let store = ConfigPreferenceStore::new(config, config_path);
    let mut session = LocaleSession::open(&catalog, store, env_lang.as_deref())?;

    match cli.command {
        Commands::T { key, lang, fallback, objects } => {
            let tr = session.translator();
            let locale = lang
                .as_deref()
                .map(|l| catalog.match_locale(l).unwrap_or(l))
                .unwrap_or(tr.locale());
            let options = ResolveOptions {
                fallback: fallback.clone(),
                return_objects: objects,
            };
            print_resolved(&Translator::new(&catalog, locale).t_with(&key, &options));

            let known = catalog.has_key(locale, &key)
                || catalog.has_key(catalog.default_locale(), &key)
                || (objects && is_subtree(&catalog, &key));
            if !known && fallback.is_none() {
                print_suggestions(&tr, &key);
            }
        }
        Commands::Lang { action: None } => {
            let tr = session.translator();
            println!("{}", tr.t_format("cli.current_locale", &[tr.locale()]));
        }
        Commands::Lang { action: Some(LangAction::Set { locale }) } => match session.switch_locale(&locale) {
            Ok(changed) => {
                let tr = session.translator();
                let key = if changed { "cli.locale_switched" } else { "cli.locale_unchanged" };
                println!("{}", tr.t_format(key, &[tr.locale()]).green().bold());
            }
            Err(err) => match err.downcast_ref::<SessionError>() {
                Some(SessionError::UnknownLocale { requested, available }) => {
                    let tr = session.translator();
                    eprintln!("{}", tr.t_format("cli.unknown_locale", &[requested, available]).red().bold());
                    std::process::exit(2);
                }
                None => return Err(err),
            },
        },
        Commands::Locales => {
            let tr = session.translator();
            println!("{}", tr.t("cli.locales_header").cyan().bold());
            for locale in catalog.locales() {
                let count = catalog.tree(locale).map_or(0, |tree| tree.leaves().len());
                let mut markers = Vec::new();
                if locale == catalog.default_locale() {
                    markers.push(tr.t("cli.default_marker").into_owned());
                }
                if locale == tr.locale() {
                    markers.push(tr.t("cli.current_marker").into_owned());
                }
                let markers = if markers.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", markers.join(", "))
                };
                println!(
                    "  {} {}{}",
                    locale.green().bold(),
                    tr.t_format("cli.key_count", &[&count.to_string()]).dimmed(),
                    markers.yellow()
                );
            }
        }
        Commands::Keys { prefix, lang } => {
            let tr = session.translator();
            let locale = lang
                .as_deref()
                .and_then(|l| catalog.match_locale(l))
                .unwrap_or(tr.locale());
            let tree = catalog.tree(locale).unwrap_or_else(|| catalog.default_tree());
            let prefix = prefix.unwrap_or_default();
            let leaves: Vec<_> = tree
                .leaves()
                .into_iter()
                .filter(|(key, _)| key.starts_with(&prefix))
                .collect();
            if leaves.is_empty() {
                println!("{}", tr.t("cli.no_keys").yellow());
                return Ok(());
            }

            let width = leaves.iter().map(|(key, _)| key.width()).max().unwrap_or(0);
            for (key, node) in leaves {
                let value = match node {
                    TranslationNode::Text(s) => s.clone(),
                    TranslationNode::List(items) => format!("[{}]", items.join(" | ")),
                    TranslationNode::Tree(_) => continue,
                };
                let pad = " ".repeat(width - key.width());
                println!("{}{}  {}", key.cyan(), pad, value);
            }
        }
        Commands::Audit => {
            let tr = session.translator();
            let report = audit(&catalog);
            println!(
                "{}",
                tr.t_format("cli.audit_header", &[&report.default_locale]).cyan().bold()
            );
            if report.is_complete() {
                println!("{}", tr.t("cli.audit_complete").green());
                return Ok(());
            }
            for coverage in &report.locales {
                let sections = [
                    ("cli.audit_missing", &coverage.missing),
                    ("cli.audit_extra", &coverage.extra),
                    ("cli.audit_kind_mismatch", &coverage.kind_mismatch),
                ];
                for (message, keys) in sections {
                    if keys.is_empty() {
                        continue;
                    }
                    println!(
                        "{}",
                        tr.t_format(message, &[&coverage.locale, &keys.len().to_string()]).yellow()
                    );
                    for key in keys {
                        println!("    {}", key);
                    }
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_catalog(dir: Option<&Path>, default_locale: &str) -> Result<LocaleCatalog> {
    match dir {
        Some(dir) => LocaleCatalog::load_dir(dir, default_locale)
            .with_context(|| format!("Failed to load translations from {}", dir.display())),
        None => LocaleCatalog::bundled_with_default(default_locale).context("Failed to load bundled translations"),
    }
}

fn is_subtree(catalog: &LocaleCatalog, key: &str) -> bool {
    matches!(
        catalog.default_tree().get_path(key.split('.')),
        Some(TranslationNode::Tree(_))
    )
}

fn print_resolved(value: &Resolved<'_>) {
    match value {
        Resolved::Text(s) => println!("{}", s),
        Resolved::List(items) => {
            for item in items.iter() {
                println!("- {}", item);
            }
        }
        Resolved::Tree(_) => println!("{}", value),
    }
}

fn print_suggestions(tr: &Translator<'_>, key: &str) {
    eprintln!("{}", tr.t_format("cli.unresolved_key", &[key]).yellow());

    let keys = tr.catalog().default_tree().leaf_keys();
    let suggestions = KeyMatcher::new().suggest(key, keys.iter().map(String::as_str), 5);
    if suggestions.is_empty() {
        return;
    }
    eprintln!("{}", tr.t("cli.did_you_mean").dimmed());
    for suggestion in suggestions {
        eprintln!("  {}", suggestion.key.cyan());
    }
}
