//! Line-based terminal host for one training session.

use chrono::Duration;
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use radio_core::Clock;
use radio_core::model::QuestionType;
use radio_core::ptt::PttGesture;
use radio_core::scorer::QuizResult;
use services::{QuestionPrompt, SessionEvent, SessionPhase, SessionStatus, TrainingSession};

/// One line of trainee input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Continue,
    Back,
    Skip,
    Quit,
    /// Zero-based option index.
    Choice(usize),
    Unknown(String),
}

#[must_use]
pub fn parse_input(line: &str) -> Input {
    let line = line.trim().to_lowercase();
    match line.as_str() {
        "" | "n" | "next" => Input::Continue,
        "b" | "back" => Input::Back,
        "s" | "skip" => Input::Skip,
        "q" | "quit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => Input::Choice(n - 1),
            _ => Input::Unknown(line),
        },
    }
}

#[must_use]
pub fn status_line(status: &SessionStatus) -> String {
    format!(
        "== {} :: {} [{}] ==",
        status.phase_title, status.phase_subtitle, status.progress_label
    )
}

fn manual_hint(status: &SessionStatus, can_skip: bool) -> String {
    let mut hint = if status.is_at_last_manual_page {
        String::from("[Enter] start exam")
    } else {
        String::from("[Enter] next page")
    };
    hint.push_str(if status.can_go_back { "  [b] back" } else { "  [b] leave" });
    if can_skip {
        hint.push_str("  [s] skip to exam");
    }
    hint.push_str("  [q] quit");
    hint
}

/// Random entry of `facts`, or `None` when there are none.
pub fn pick_fact<'a>(facts: &'a [String], rng: &mut impl Rng) -> Option<&'a str> {
    facts.choose(rng).map(String::as_str)
}

/// How the trainee left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(QuizResult),
    Exited,
}

pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn read(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Drive `session` from stdin until it completes or the trainee leaves.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn drive(
    session: &mut TrainingSession,
    terminal: &mut Terminal,
    clock: Clock,
    hold: Duration,
) -> std::io::Result<Outcome> {
    loop {
        match session.phase() {
            SessionPhase::Complete => {
                return Ok(session.result().map_or(Outcome::Exited, Outcome::Completed));
            }
            SessionPhase::Manual => {
                let status = session.status();
                println!();
                println!("{}", status_line(&status));
                if let Some(page) = session.current_page() {
                    println!("{}", page.content);
                }
                println!("{}", manual_hint(&status, session.can_skip_manual()));

                let Some(line) = terminal.read().await? else {
                    return Ok(Outcome::Exited);
                };
                match parse_input(&line) {
                    Input::Continue => {
                        session.advance();
                    }
                    Input::Back => {
                        if session.retreat().event == SessionEvent::ExitRequested {
                            return Ok(Outcome::Exited);
                        }
                    }
                    Input::Skip => {
                        if session.skip_to_quiz().event == SessionEvent::Ignored {
                            println!("Skipping unlocks after your first passed exam.");
                        }
                    }
                    Input::Quit => return Ok(Outcome::Exited),
                    Input::Choice(_) | Input::Unknown(_) => println!("Unknown command."),
                }
            }
            SessionPhase::Quiz => {
                if let Some(feedback) = session.pending_feedback() {
                    let mark = if feedback.is_positive() { "OK" } else { "XX" };
                    println!("[{mark}] {}", feedback.message);
                    println!("[Enter] continue  [q] quit");
                    let Some(line) = terminal.read().await? else {
                        return Ok(Outcome::Exited);
                    };
                    if parse_input(&line) == Input::Quit {
                        return Ok(Outcome::Exited);
                    }
                    session.dismiss_feedback();
                    continue;
                }

                let Some(prompt) = session.current_prompt() else {
                    println!("No questions are available for this rank.");
                    return Ok(Outcome::Exited);
                };
                println!();
                println!("{}", status_line(&session.status()));
                println!("{}", prompt.scenario);

                let answered = match prompt.kind {
                    QuestionType::MultipleChoice => {
                        ask_choice(session, terminal, &prompt).await?
                    }
                    QuestionType::PttTiming => {
                        ask_transmission(session, terminal, &prompt, clock, hold).await?
                    }
                };
                if !answered {
                    return Ok(Outcome::Exited);
                }
            }
        }
    }
}

/// Returns false when the trainee quits.
async fn ask_choice(
    session: &mut TrainingSession,
    terminal: &mut Terminal,
    prompt: &QuestionPrompt,
) -> std::io::Result<bool> {
    for (n, (_, text)) in prompt.options.iter().enumerate() {
        println!("  {}) {text}", n + 1);
    }
    println!("[1-{}] answer  [q] quit", prompt.options.len());

    let Some(line) = terminal.read().await? else {
        return Ok(false);
    };
    match parse_input(&line) {
        Input::Quit => return Ok(false),
        Input::Choice(i) => match prompt.options.get(i) {
            Some((id, _)) => {
                session.submit_answer(id);
            }
            None => println!("No such option."),
        },
        _ => println!("Answer with an option number."),
    }
    Ok(true)
}

/// Two Enter presses bracket the held button.
async fn ask_transmission(
    session: &mut TrainingSession,
    terminal: &mut Terminal,
    prompt: &QuestionPrompt,
    clock: Clock,
    hold: Duration,
) -> std::io::Result<bool> {
    if let Some(instruction) = &prompt.ptt_instruction {
        println!("{instruction}");
    }
    if let Some((_, message)) = prompt.options.first() {
        println!("  Message: \"{message}\"");
    }
    println!("[Enter] key the mic  [q] quit");
    let Some(line) = terminal.read().await? else {
        return Ok(false);
    };
    if parse_input(&line) == Input::Quit {
        return Ok(false);
    }

    let mut gesture = PttGesture::with_hold(hold);
    let pressed_at = clock.now();
    gesture.press(pressed_at);
    println!(
        "Mic keyed. Wait {} ms for the line to open, then [Enter] to speak and release.",
        gesture.hold().num_milliseconds()
    );
    let released = terminal.read().await?;
    let outcome = match released {
        Some(_) => gesture.release(clock.now()),
        None => gesture.abort(clock.now()),
    };
    if let Some(outcome) = outcome {
        let held_ms = clock.since(pressed_at).num_milliseconds();
        println!("Mic held {held_ms} ms.");
        tracing::debug!(success = outcome.is_success(), held_ms, "transmission resolved");
        session.submit_timed_gesture(outcome);
    }
    Ok(released.is_some())
}
