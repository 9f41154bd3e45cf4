//! CLI command implementations.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;
use trellis_complete::{
    filter_entries, Anchor, AutocompleteController, Command, ControllerConfig, FieldEvent, FieldId,
    FieldInfo, FieldSelector, HttpTemplateSource, NO_RESULTS_TEXT,
};
use trellis_core::{Config, EntryKind, TemplateEntry, CONFIG_DIR};
use trellis_index::{build_index, roots_from_config, IndexOptions, IndexResult};
use trellis_server::{AdminAuth, ServerConfig, ServiceState, TrellisServer};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Write a default config into a project.
pub fn init(path: &Path) -> Result<()> {
    let config_path = Config::default_path(path);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    if let Some(dir) = config_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&config_path, serde_json::to_string_pretty(&Config::default())?)?;

    println!("{} Initialized Trellis in {}", "✓".green(), path.display());
    println!("  Run {} to list your templates", "trellis index".cyan());

    Ok(())
}

/// Build the index and print it as a tree or as the response JSON.
pub fn index(config_path: &Path, json: bool) -> Result<()> {
    let result = build(config_path, !json)?;

    if json {
        let body = serde_json::to_string_pretty(&result.into_response())?;
        println!("{}", body);
        return Ok(());
    }

    println!(
        "{} Indexed {} templates and {} folders from {} roots in {}ms",
        "✓".green(),
        result.files_found.to_string().cyan(),
        result.directories_found.to_string().cyan(),
        result.roots_scanned,
        result.duration_ms
    );
    if result.duplicates_dropped > 0 {
        println!(
            "  {}",
            format!("{} shadowed by an earlier root", result.duplicates_dropped).dimmed()
        );
    }

    if result.entries.is_empty() {
        eprintln!("\n{} No templates found. Check:", "⚠ Warning:".yellow());
        eprintln!("  - templatesPath points at your templates folder");
        eprintln!("  - File extensions match the configured list");
        return Ok(());
    }

    println!();
    for entry in &result.entries {
        println!("{}", tree_line(entry));
    }

    Ok(())
}

/// Filter the index locally, exactly as the dropdown would.
pub fn query(config_path: &Path, text: &str, limit: usize) -> Result<()> {
    let result = build(config_path, false)?;
    let matches = filter_entries(&result.entries, text, limit);

    if matches.is_empty() {
        println!("{}", NO_RESULTS_TEXT);
        return Ok(());
    }

    println!("Found {} matches:\n", matches.len());
    for entry in matches {
        print_row(entry.kind, &entry.path, entry.display_label());
    }

    Ok(())
}

/// Serve the index over HTTP until Ctrl+C.
pub async fn serve(config_path: &Path, bind: Option<&str>) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let base = project_base(config_path);

    let addr = bind.unwrap_or(&config.server.bind).parse()?;
    let state = ServiceState {
        roots: roots_from_config(&config, &base),
        options: IndexOptions::from_config(&config),
        auth: AdminAuth::new(config.server.admin_tokens.clone()),
    };
    let server = TrellisServer::new(
        state,
        ServerConfig {
            addr,
            admin_base: config.server.admin_base.clone(),
        },
    );

    println!("{}", "Starting Trellis template service...".cyan());
    println!("{} Listening on http://{}{}", "✓".green(), addr, server.route());
    println!("  Press {} to stop", "Ctrl+C".cyan());

    server.run().await?;

    Ok(())
}

/// Drive the autocomplete controller against a running server and
/// print what the dropdown would show.
pub async fn complete(url: &str, token: Option<String>, text: &str) -> Result<()> {
    let source = HttpTemplateSource::new(url, token);
    let config = ControllerConfig {
        selectors: vec![FieldSelector::parse("input")?],
        ..ControllerConfig::default()
    };
    let mut controller = AutocompleteController::new(config);

    let field = FieldInfo::input(FieldId(0));
    controller.rescan([&field]);

    let focus = FieldEvent::Focus {
        value: text.to_string(),
        anchor: Anchor::default(),
    };
    let mut commands = controller.handle(field.id, focus, Instant::now());

    let spinner = spinner(format!("Fetching {}", source.url()))?;

    if let Some(ticket) = commands.iter().find_map(|command| match command {
        Command::Fetch(ticket) => Some(*ticket),
        _ => None,
    }) {
        commands = controller.fulfil(ticket, &source).await;
    }
    spinner.finish_and_clear();

    let dropdown = commands.into_iter().find_map(|command| match command {
        Command::Render { dropdown, .. } => Some(dropdown),
        _ => None,
    });

    match dropdown {
        Some(dropdown) if !dropdown.is_empty() => {
            for row in &dropdown.rows {
                print_row(row.kind, &row.path, &row.label);
            }
        }
        _ => println!("{}", NO_RESULTS_TEXT),
    }

    Ok(())
}

fn build(config_path: &Path, show_progress: bool) -> Result<IndexResult> {
    let config = Config::load_or_default(config_path)?;
    let base = project_base(config_path);
    let roots = roots_from_config(&config, &base);
    debug!("Resolved {} roots against {}", roots.len(), base.display());

    let spinner = if show_progress {
        Some(spinner(format!("Scanning {} roots...", roots.len()))?)
    } else {
        None
    };

    let result = build_index(&roots, &IndexOptions::from_config(&config));
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    Ok(result?)
}

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message);
    Ok(spinner)
}

/// Directory that relative paths in a config resolve against: the
/// project holding `.trellis/`, or else the file's own directory.
fn project_base(config_path: &Path) -> PathBuf {
    let dir = config_path.parent().unwrap_or(Path::new(""));
    let base = if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
        dir.parent().unwrap_or(Path::new(""))
    } else {
        dir
    };

    if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base.to_path_buf()
    }
}

fn tree_line(entry: &TemplateEntry) -> String {
    let label = entry.display_label();
    match entry.kind {
        EntryKind::Directory => format!("{} {}", entry.kind.icon(), label.yellow()),
        EntryKind::File => format!("{} {}", entry.kind.icon(), label),
    }
}

fn print_row(kind: EntryKind, path: &str, label: &str) {
    let marker = match kind {
        EntryKind::Directory => kind.to_string().yellow(),
        EntryKind::File => kind.to_string().cyan(),
    };
    if label == path {
        println!("  {} {}", marker, path);
    } else {
        println!("  {} {} {}", marker, path, format!("({})", label.trim()).dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_base() {
        assert_eq!(
            project_base(Path::new("/srv/site/.trellis/config.json")),
            PathBuf::from("/srv/site")
        );
        assert_eq!(
            project_base(Path::new("/etc/trellis.json")),
            PathBuf::from("/etc")
        );
        assert_eq!(project_base(Path::new(".trellis/config.json")), PathBuf::from("."));
        assert_eq!(project_base(Path::new("config.json")), PathBuf::from("."));
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempdir().unwrap();
        init(dir.path()).unwrap();

        let config = Config::load(&Config::default_path(dir.path())).unwrap();
        assert_eq!(config, Config::default());

        // Second run leaves the file alone.
        init(dir.path()).unwrap();
    }

    #[test]
    fn test_build_resolves_roots_from_project() {
        let dir = tempdir().unwrap();
        init(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("templates/blog")).unwrap();
        fs::write(dir.path().join("templates/blog/post.twig"), "").unwrap();

        let result = build(&Config::default_path(dir.path()), false).unwrap();
        let paths: Vec<_> = result.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["blog", "blog/post"]);
    }

    #[test]
    fn test_tree_line_prefers_nested_label() {
        colored::control::set_override(false);
        let top = TemplateEntry::file("index", None);
        assert_eq!(tree_line(&top), "📄 index");

        let nested = TemplateEntry::file("de/home", Some("└ home (de)".to_string()));
        assert_eq!(tree_line(&nested), "📄 └ home (de)");

        assert_eq!(tree_line(&TemplateEntry::directory("blog")), "📁 blog/");
    }
}
