//! User-facing console output: the startup line and per-archive banners.
//!
//! These are printed regardless of the log level; diagnostics go through
//! `tracing` instead.

pub mod theme;

use std::path::Path;

use console::StyledObject;

use crate::pipeline::ArchiveState;
use crate::watcher::SyncEvent;

pub use theme::Theme;

/// Styled regardless of console's own stdout detection.
fn paint<D>(value: D) -> StyledObject<D> {
    console::style(value).force_styling(true)
}

/// Startup line naming the fragment being watched for.
pub fn watching_message(dir: &Path, fragment: &str, plain: bool) -> String {
    if plain {
        format!("Watching {} for {fragment}...", dir.display())
    } else {
        format!(
            "{} {} {} {}{}",
            paint("Watching").blue(),
            paint(dir.display()).blue(),
            paint("for").blue(),
            paint(fragment).magenta(),
            paint("...").blue()
        )
    }
}

/// Join destination names the way the banner reads: `a`, `a and b`, `a, b and c`.
fn join_names(names: &[String], plain: bool) -> String {
    let styled: Vec<String> = names
        .iter()
        .map(|n| {
            if plain {
                n.clone()
            } else {
                paint(n).magenta().to_string()
            }
        })
        .collect();

    match styled.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

/// Banner for a finished archive.
pub fn outcome_message(event: &SyncEvent, destinations: &[String], plain: bool) -> String {
    match event {
        SyncEvent::Synced {
            cleanup_failures, ..
        } => {
            let badge = if plain {
                "SUCCESS!".to_string()
            } else {
                paint("SUCCESS!").black().on_green().to_string()
            };
            let mut line = format!(
                "{badge} Updated {} successfully.",
                join_names(destinations, plain)
            );
            if *cleanup_failures > 0 {
                line.push_str(&format!(
                    " ({cleanup_failures} cleanup step(s) failed, see log)"
                ));
            }
            line
        }
        SyncEvent::Failed {
            archive,
            stage,
            reason,
        } => {
            let badge = if plain {
                "ERROR!".to_string()
            } else {
                paint("ERROR!").white().on_red().to_string()
            };
            // Only the working stages read naturally after "while"
            let doing = match stage {
                ArchiveState::Extracting | ArchiveState::Syncing => stage.to_string(),
                _ => "processing".to_string(),
            };
            format!(
                "{badge} There was an error while {doing} {}.\n  {reason}",
                archive.display()
            )
        }
    }
}

pub fn print_watching(dir: &Path, fragment: &str) {
    println!(
        "{}",
        watching_message(dir, fragment, Theme::stdout_is_plain())
    );
}

/// Print a banner: successes to stdout, failures to stderr.
pub fn print_outcome(event: &SyncEvent, destinations: &[String]) {
    match event {
        SyncEvent::Synced { .. } => {
            println!("{}", outcome_message(event, destinations, Theme::stdout_is_plain()));
        }
        SyncEvent::Failed { .. } => {
            eprintln!("{}", outcome_message(event, destinations, Theme::stderr_is_plain()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn names() -> Vec<String> {
        vec!["templates".to_string(), "parts".to_string()]
    }

    #[test]
    fn test_watching_message_plain() {
        assert_eq!(
            watching_message(Path::new("/site"), "edit-site-export", true),
            "Watching /site for edit-site-export..."
        );
    }

    #[test]
    fn test_success_banner() {
        let event = SyncEvent::Synced {
            archive: PathBuf::from("/site/edit-site-export.zip"),
            files_copied: 2,
            cleanup_failures: 0,
        };
        assert_eq!(
            outcome_message(&event, &names(), true),
            "SUCCESS! Updated templates and parts successfully."
        );
    }

    #[test]
    fn test_success_banner_mentions_cleanup_failures() {
        let event = SyncEvent::Synced {
            archive: PathBuf::from("/site/edit-site-export.zip"),
            files_copied: 2,
            cleanup_failures: 1,
        };
        assert!(outcome_message(&event, &names(), true).contains("1 cleanup step(s) failed"));
    }

    #[test]
    fn test_error_banner() {
        let event = SyncEvent::Failed {
            archive: PathBuf::from("/site/edit-site-export.zip"),
            stage: ArchiveState::Extracting,
            reason: "Extraction failed: corrupt".to_string(),
        };
        let message = outcome_message(&event, &names(), true);
        assert!(message.starts_with("ERROR! There was an error while extracting"));
        assert!(message.contains("Extraction failed: corrupt"));
    }

    #[test]
    fn test_error_banner_for_aborted_run() {
        let event = SyncEvent::Failed {
            archive: PathBuf::from("/site/edit-site-export.zip"),
            stage: ArchiveState::Failed,
            reason: "task panicked".to_string(),
        };
        let message = outcome_message(&event, &names(), true);
        assert!(message.starts_with("ERROR! There was an error while processing /site/"));
        assert!(!message.contains("while failed"));
    }

    #[test]
    fn test_colored_banner_keeps_styling_when_captured() {
        // Test output is captured, so console's own detection would strip colors
        let event = SyncEvent::Failed {
            archive: PathBuf::from("/site/edit-site-export.zip"),
            stage: ArchiveState::Syncing,
            reason: "missing theme".to_string(),
        };
        let colored = outcome_message(&event, &names(), false);
        assert!(colored.contains("\u{1b}["));
        assert_eq!(
            console::strip_ansi_codes(&colored),
            outcome_message(&event, &names(), true)
        );
    }

    #[test]
    fn test_join_names() {
        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(join_names(&three, true), "a, b and c");
        assert_eq!(join_names(&three[..1], true), "a");
        assert_eq!(join_names(&[], true), "");
    }
}
