//! SnapDict
//!
//! Point a camera at printed text, recognize the words inside the scan
//! region, and save the ones you tap to a vocabulary history with
//! dictionary links. This binary is the command-line shell around the
//! capture-to-selection pipeline; a still image file stands in for the
//! camera.

mod app;
mod capture;
mod config;
mod dictionary;
mod history;
mod ocr;
mod paths;
mod scanner;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, TimeZone};
use std::io::Write;

use crate::app::App;
use crate::capture::{ImageFileCamera, Size};
use crate::config::{get_config, AppConfig};
use crate::dictionary::lookup_links;
use crate::history::{FileStore, HistoryStore, WordItem};
use crate::ocr::TesseractRecognizer;
use crate::scanner::{RecognitionWorker, ScanStatus, Scanner, SelectionMode};

const USAGE: &str = "\
Usage:
  snapdict scan <image> [--viewport WxH] [--mode single|multiple|sentence] [--select i,j,...]
  snapdict list
  snapdict add <text>
  snapdict edit <id> <text>
  snapdict remove <id>
  snapdict lookup <text>";

/// Default viewport when scanning from the command line (portrait phone).
const DEFAULT_VIEWPORT: Size = Size {
    width: 390.0,
    height: 844.0,
};

/// Rendered size of the still the overlay rects are reported for.
const DEFAULT_RENDERED_WIDTH: f32 = 360.0;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:<5} {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = panic_info
            .location()
            .map(|loc| format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_default();
        log::error!("[PANIC]{} {}", location, msg);
    }));
}

fn main() -> Result<()> {
    init_logging();

    paths::ensure_directories().context("Failed to create data directories")?;
    let config = get_config().clone();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let store = FileStore::new(paths::get_store_dir())?;
    let history = HistoryStore::new(
        Box::new(store),
        config.history_key.clone(),
        config.history_capacity,
    );
    let mut app = App::new(config, history);

    match (command.as_str(), &args[1..]) {
        ("scan", [image, rest @ ..]) => run_scan(&mut app, image, rest),
        ("list", []) => {
            print_history(&app.history());
            Ok(())
        }
        ("add", [text]) => {
            app.manual_add(text)?;
            print_selected(&app);
            Ok(())
        }
        ("edit", [id, text]) => {
            let history = app.edit_word(id, text)?;
            print_history(&history);
            Ok(())
        }
        ("remove", [id]) => {
            app.delete_word(id)?;
            print_history(&app.history());
            Ok(())
        }
        ("lookup", [text]) => {
            for link in lookup_links(text, &app.config().dictionaries) {
                println!("{:<16} {}", link.name, link.url);
            }
            Ok(())
        }
        _ => Err(anyhow!("Unrecognized arguments.\n{}", USAGE)),
    }
}

/// Options for the `scan` command.
struct ScanOptions {
    viewport: Size,
    mode: SelectionMode,
    select: Vec<usize>,
}

fn parse_scan_options(args: &[String]) -> Result<ScanOptions> {
    let mut options = ScanOptions {
        viewport: DEFAULT_VIEWPORT,
        mode: SelectionMode::Single,
        select: Vec::new(),
    };

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("Missing value for {}", flag))?;
        match flag.as_str() {
            "--viewport" => {
                let (w, h) = value
                    .split_once('x')
                    .ok_or_else(|| anyhow!("Viewport must look like 390x844"))?;
                options.viewport = Size::new(w.parse()?, h.parse()?);
            }
            "--mode" => options.mode = value.parse()?,
            "--select" => {
                options.select = value
                    .split(',')
                    .map(|i| i.trim().parse::<usize>())
                    .collect::<Result<_, _>>()
                    .context("--select takes comma separated candidate indices")?;
            }
            other => return Err(anyhow!("Unknown option {}", other)),
        }
    }

    Ok(options)
}

fn run_scan(app: &mut App, image: &str, args: &[String]) -> Result<()> {
    let options = parse_scan_options(args)?;
    let config: AppConfig = app.config().clone();

    app.open_scanner();
    let recognizer =
        TesseractRecognizer::new(config.tesseract_psm, config.tesseract_path.clone());
    let worker = RecognitionWorker::spawn(Box::new(recognizer))?;
    let mut scanner = Scanner::mount(
        &ImageFileCamera::new(image),
        worker,
        config,
        options.viewport,
    )?;

    if let Some(notice) = scanner.notice() {
        println!("{}", notice);
        scanner.dismiss();
        app.close_scanner();
        return Ok(());
    }

    scanner.capture()?;
    if scanner.wait_for_results() != ScanStatus::ShowingResults {
        if let Some(notice) = scanner.notice() {
            println!("{}", notice);
        }
        scanner.dismiss();
        app.close_scanner();
        return Ok(());
    }

    let rendered = scanner
        .session()
        .snapshot()
        .map(|still| {
            let ratio = DEFAULT_RENDERED_WIDTH / still.width().max(1) as f32;
            Size::new(DEFAULT_RENDERED_WIDTH, still.height() as f32 * ratio)
        })
        .unwrap_or_default();
    let overlays = scanner.overlays(rendered);
    for (i, (candidate, rect)) in scanner.candidates().iter().zip(&overlays).enumerate() {
        println!(
            "[{}] {:<20} ({:.0},{:.0} {:.0}x{:.0})",
            i, candidate.display_text, rect.x, rect.y, rect.width, rect.height
        );
    }

    if options.select.is_empty() {
        scanner.dismiss();
        app.close_scanner();
        return Ok(());
    }

    scanner.set_mode(options.mode);
    let output = match options.mode {
        SelectionMode::Single => scanner.tap(options.select[0]),
        SelectionMode::Multiple | SelectionMode::Sentence => {
            for &index in &options.select {
                scanner.tap(index);
            }
            scanner.commit()
        }
    };
    scanner.dismiss();

    match output {
        Some(output) => {
            app.handle_scan_output(output)?;
            print_selected(app);
        }
        None => {
            println!("Nothing selected");
            app.close_scanner();
        }
    }
    Ok(())
}

fn format_timestamp(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn print_history(history: &[WordItem]) {
    if history.is_empty() {
        println!("(no saved words)");
    }
    for item in history {
        println!("{}  {}  {}", item.id, format_timestamp(item.timestamp), item.text);
    }
}

fn print_selected(app: &App) {
    let Some(word) = app.selected_word() else {
        return;
    };
    println!("{}  (added {})", word.text, format_timestamp(word.timestamp));
    for link in app.lookup_selected() {
        println!("  {:<16} {}", link.name, link.url);
    }
}
