//! Module listings and progress summaries for the terminal.

use std::io::{self, Write};

use quest_core::model::{ModuleId, ModuleSummary};
use services::AppServices;
use services::player::Route;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// The learning hub: every module with completion counts and XP.
pub async fn print_modules<W: Write>(app: &AppServices, out: &mut W) -> io::Result<()> {
    let content = app.content();
    let all = app.progress().all_progress().await;

    for module in content.modules() {
        let progress = all.get(&module.id).cloned().unwrap_or_default();
        let mode = if module.gamified { "quiz" } else { "read" };
        writeln!(
            out,
            "{:<18} {:<28} {}/{} lessons  {:>4} XP  [{mode}]",
            module.id,
            module.title,
            progress.completed_lesson_count(),
            module.lesson_count(),
            progress.total_xp(),
        )?;
    }
    writeln!(out, "Total XP: {}", app.progress().overall_xp().await)
}

/// One module with a line per lesson.
pub async fn print_module_overview<W: Write>(
    app: &AppServices,
    module_id: &ModuleId,
    out: &mut W,
) -> io::Result<()> {
    let content = app.content();
    let Some(module) = content.module(module_id) else {
        return writeln!(out, "Module not found: {module_id}");
    };
    let progress = app.progress().get_module_progress(module_id).await;

    writeln!(out, "{} ({} XP)", module.title, progress.total_xp())?;
    if !module.description.is_empty() {
        writeln!(out, "{}", module.description)?;
    }
    for lesson in &module.lessons {
        match progress.lesson(&lesson.id) {
            Some(record) if record.completed => writeln!(
                out,
                "  [x] {:<4} {:<30} {:>4} XP  last played {}",
                lesson.id,
                lesson.title,
                record.xp_earned,
                record.last_played_at.format(DATE_FORMAT),
            )?,
            _ => writeln!(out, "  [ ] {:<4} {}", lesson.id, lesson.title)?,
        }
    }
    Ok(())
}

/// Overviews for every module that has recorded progress.
pub async fn print_progress<W: Write>(app: &AppServices, out: &mut W) -> io::Result<()> {
    let all = app.progress().all_progress().await;
    let content = app.content();
    let played: Vec<&ModuleSummary> = content
        .modules()
        .iter()
        .filter(|m| all.get(&m.id).is_some_and(|p| !p.is_empty()))
        .collect();

    if played.is_empty() {
        return writeln!(out, "No progress yet.");
    }
    for module in played {
        print_module_overview(app, &module.id, out).await?;
    }
    Ok(())
}

/// Show whatever the player asked to navigate to.
pub async fn print_route<W: Write>(app: &AppServices, route: &Route, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    match route {
        Route::LearningHub => print_modules(app, out).await,
        Route::ModuleOverview(module_id) => print_module_overview(app, module_id, out).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::LessonId;
    use quest_core::time::fixed_now;
    use services::Clock;

    fn render(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn hub_lists_every_module() {
        let app = AppServices::in_memory(Clock::fixed(fixed_now())).unwrap();
        let mut out = Vec::new();
        print_modules(&app, &mut out).await.unwrap();
        let out = render(out);

        assert!(out.contains("scam-awareness"));
        assert!(out.contains("budgeting-basics"));
        assert!(out.contains("[quiz]"));
        assert!(out.ends_with("Total XP: 0\n"));
    }

    #[tokio::test]
    async fn overview_marks_completed_lessons() {
        let app = AppServices::in_memory(Clock::fixed(fixed_now())).unwrap();
        let scam = ModuleId::new("scam-awareness").unwrap();
        app.progress()
            .mark_lesson_completed(&scam, &LessonId::new("2").unwrap(), 20)
            .await;

        let mut out = Vec::new();
        print_module_overview(&app, &scam, &mut out).await.unwrap();
        let out = render(out);

        assert!(out.starts_with("Scam Awareness (20 XP)"));
        assert!(out.contains("[x] 2"));
        assert!(out.contains("last played 2023-11-14 22:13 UTC"));
        assert!(out.contains("[ ] 1"));
    }

    #[tokio::test]
    async fn progress_without_history_says_so() {
        let app = AppServices::in_memory(Clock::fixed(fixed_now())).unwrap();
        let mut out = Vec::new();
        print_progress(&app, &mut out).await.unwrap();
        assert_eq!(render(out), "No progress yet.\n");
    }
}
