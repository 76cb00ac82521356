pub mod table;
pub mod theme;

pub use theme::{Icon, Theme};

use topocause::domain::{Candidate, CandidateKind, CandidateRole};

pub fn info(message: impl AsRef<str>) {
    println!("{} {}", Theme::primary(Icon::Info), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", Theme::warning("⚠️"), message.as_ref());
}

pub fn heading(icon: Icon, message: impl AsRef<str>) {
    println!("\n{} {}", icon, Theme::bold(message.as_ref()));
}

/// One-line summary of the most likely cause.
pub fn verdict(top: &Candidate) {
    match top.role() {
        CandidateRole::Normal => println!("{} {}", Theme::success(Icon::Check), top.label),
        CandidateRole::Impact => println!(
            "{} {} {}",
            Icon::Impact,
            Theme::primary(&top.device_id),
            Theme::muted(&top.label)
        ),
        _ => {
            let icon = if top.kind == CandidateKind::SilentFailure {
                Icon::Silent
            } else {
                Icon::Root
            };
            println!(
                "{} {} {} ({:.2})",
                icon,
                Theme::primary(&top.device_id),
                top.label,
                top.confidence
            );
        }
    }
    if let Some(diagnostic) = &top.diagnostic {
        for line in diagnostic.lines() {
            println!("   {}", Theme::muted(line));
        }
    }
}
