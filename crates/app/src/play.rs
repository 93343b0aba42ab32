//! Terminal front end for the lesson player.

use std::io::{self, BufRead, Write};

use quest_core::model::{Selection, StepKind};
use services::player::{
    CompletionReport, LessonPlayer, OptionHighlight, PlayerEvent, PlayerView, Route, StepView,
};

/// What a line of learner input means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Pick(Selection),
    Next,
    Quit,
    Unknown,
}

fn parse_input(line: &str, step: &StepView) -> Input {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "" | "n" | "next" => return Input::Next,
        "q" | "quit" => return Input::Quit,
        "t" | "true" if step.kind == StepKind::TrueFalse => {
            return Input::Pick(Selection::Boolean(true));
        }
        "f" | "false" if step.kind == StepKind::TrueFalse => {
            return Input::Pick(Selection::Boolean(false));
        }
        _ => {}
    }

    line.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| step.options.get(idx))
        .map_or(Input::Unknown, |opt| Input::Pick(opt.selection))
}

/// Play `player` to the end, reading answers from `input`.
///
/// Returns where the host should navigate. End of input counts as quitting.
///
/// # Errors
///
/// Returns any I/O error from reading input or writing output.
pub async fn run_lesson<R: BufRead, W: Write>(
    player: &mut LessonPlayer,
    input: &mut R,
    out: &mut W,
) -> io::Result<Route> {
    let mut line = String::new();
    loop {
        let step = match player.view() {
            PlayerView::Step(step) => step,
            other => {
                render_terminal(&other, out)?;
                return Ok(quit_route(player));
            }
        };
        render_step(&step, out)?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(quit_route(player));
        }

        match parse_input(&line, &step) {
            Input::Pick(selection) => {
                player.submit_answer(selection);
            }
            Input::Next if step.feedback.is_some() => {
                if let PlayerEvent::Navigate(route) = player.advance().await {
                    if let PlayerView::Complete(report) = player.view() {
                        render_complete(&report, out)?;
                    }
                    return Ok(route);
                }
            }
            Input::Next => writeln!(out, "Answer first.")?,
            Input::Quit => return Ok(quit_route(player)),
            Input::Unknown => writeln!(out, "Not an option: {}", line.trim())?,
        }
    }
}

fn quit_route(player: &mut LessonPlayer) -> Route {
    match player.quit() {
        PlayerEvent::Navigate(route) => route,
        PlayerEvent::Stay => Route::ModuleOverview(player.module_id().clone()),
    }
}

fn render_step<W: Write>(step: &StepView, out: &mut W) -> io::Result<()> {
    let hearts: String = (0..step.max_lives)
        .map(|i| if i < step.lives { '♥' } else { '♡' })
        .collect();
    writeln!(out)?;
    writeln!(
        out,
        "Step {}/{}  {}  [{}%]",
        step.step_number, step.total_steps, hearts, step.progress_percent
    )?;
    writeln!(out, "{}", step.prompt)?;
    for (idx, opt) in step.options.iter().enumerate() {
        let mark = match opt.highlight {
            OptionHighlight::Neutral => ' ',
            OptionHighlight::Correct => '✔',
            OptionHighlight::Incorrect => '✘',
        };
        writeln!(out, " {mark} {}. {}", idx + 1, opt.label)?;
    }

    match &step.feedback {
        Some(feedback) => {
            let verdict = if feedback.was_correct { "Correct!" } else { "Not quite." };
            writeln!(out, "{verdict} {}", feedback.explanation)?;
            writeln!(out, "[Enter] next  [q] quit")?;
        }
        None if step.kind == StepKind::TrueFalse => {
            writeln!(out, "[t/f or number] answer  [q] quit")?;
        }
        None => writeln!(out, "[number] answer  [q] quit")?,
    }
    out.flush()
}

fn render_complete<W: Write>(report: &CompletionReport, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Lesson complete: {}/{} correct, +{} XP (module total {} XP).",
        report.correct_count,
        report.total_steps,
        report.xp_award,
        report.progress.total_xp()
    )
}

fn render_terminal<W: Write>(view: &PlayerView, out: &mut W) -> io::Result<()> {
    match view {
        PlayerView::ModuleNotFound => writeln!(out, "Module not found."),
        PlayerView::UnsupportedModule { module_title } => writeln!(
            out,
            "Gamified lessons are not available for {module_title} yet."
        ),
        PlayerView::NoContent => {
            writeln!(out, "No content for this lesson yet. Please pick another lesson.")
        }
        PlayerView::Complete(report) => render_complete(report, out),
        PlayerView::Loading | PlayerView::Abandoned | PlayerView::Step(_) => Ok(()),
    }
}
