//! Terminal rendering of chat replies and document views.

use std::io::Write;

use scholia_session::{ChatState, DocumentView, PrimaryAction};
use tokio::sync::{oneshot, watch};

/// Print the message at `index` as it grows, until `done` fires.
pub async fn stream_reply(
    mut rx: watch::Receiver<ChatState>,
    index: usize,
    mut done: oneshot::Receiver<()>,
) {
    let mut printed = 0;
    loop {
        print_new(&mut rx, index, &mut printed);
        tokio::select! {
            changed = rx.changed() => if changed.is_err() { break },
            _ = &mut done => break,
        }
    }
    print_new(&mut rx, index, &mut printed);
    if printed > 0 {
        println!();
    }
}

fn print_new(rx: &mut watch::Receiver<ChatState>, index: usize, printed: &mut usize) {
    let state = rx.borrow_and_update();
    let Some(message) = state.transcript.get(index) else {
        return;
    };
    if let Some(new) = message.text.get(*printed..) {
        if !new.is_empty() {
            print!("{new}");
            let _ = std::io::stdout().flush();
            *printed = message.text.len();
        }
    }
}

/// Print a ready view: status lines, then the body.
pub fn print_view(view: &DocumentView) {
    let DocumentView::Ready {
        body,
        primary_action,
        personalize,
        translate,
        showing_translation,
        ..
    } = view
    else {
        return;
    };

    if *primary_action == PrimaryAction::TakeQuiz {
        eprintln!("(take the background quiz to unlock personalization)");
    }
    for error in [&personalize.error, &translate.error].into_iter().flatten() {
        eprintln!("! {error}");
    }
    if *showing_translation {
        eprintln!("(translated)");
    }
    println!("{body}");
}
