//! Implements InputPort. Inquire-based interactive menu.

use crate::adapters::ui::progress::with_spinner;
use crate::domain::{DomainError, ExamQuestion, QuizQuestion, StudyKind, StudySet};
use crate::ports::InputPort;
use crate::usecases::{GenerationService, LibraryService};
use async_trait::async_trait;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{CustomType, InquireError, Select, Text};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Sets shown when picking from the library.
const LIBRARY_PAGE: u32 = 20;
const DEFAULT_COUNT: usize = 10;

/// Neon prompt theme, applied globally.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("?").with_fg(Color::LightMagenta))
        .with_highlighted_option_prefix(Styled::new(">").with_fg(Color::LightCyan))
        .with_answer(StyleSheet::new().with_fg(Color::LightCyan));
    inquire::set_global_render_config(config);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Summarize,
    Flashcards,
    Quiz,
    Exam,
    Pyq,
    TakeQuiz,
    TakeExam,
    Library,
    ExportCsv,
    ExportMarkdown,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 11] = [
        MenuAction::Summarize,
        MenuAction::Flashcards,
        MenuAction::Quiz,
        MenuAction::Exam,
        MenuAction::Pyq,
        MenuAction::TakeQuiz,
        MenuAction::TakeExam,
        MenuAction::Library,
        MenuAction::ExportCsv,
        MenuAction::ExportMarkdown,
        MenuAction::Quit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::Summarize => "Summarize notes",
            MenuAction::Flashcards => "Generate flashcards",
            MenuAction::Quiz => "Generate quiz",
            MenuAction::Exam => "Generate practice exam",
            MenuAction::Pyq => "Search past-year questions",
            MenuAction::TakeQuiz => "Take a quiz",
            MenuAction::TakeExam => "Take a practice exam",
            MenuAction::Library => "Browse library",
            MenuAction::ExportCsv => "Export flashcards (CSV)",
            MenuAction::ExportMarkdown => "Export set (Markdown)",
            MenuAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Library entry as shown in a Select list.
struct SetChoice(StudySet);

impl fmt::Display for SetChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = &self.0;
        let created = chrono::DateTime::<chrono::Utc>::from_timestamp(set.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        write!(
            f,
            "[{}] {} ({} items, {}){}",
            set.kind,
            set.topic,
            set.item_count(),
            created,
            if set.used_fallback { " *placeholder*" } else { "" }
        )
    }
}

fn prompt_err(e: InquireError) -> DomainError {
    match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            DomainError::Ui("cancelled".into())
        }
        other => DomainError::Ui(other.to_string()),
    }
}

fn fallback_notice(used_fallback: bool) {
    if used_fallback {
        println!("  ! The assistant's reply could not be read. Placeholder content was saved instead.");
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    generation: Arc<GenerationService>,
    library: Arc<LibraryService>,
}

impl TuiInputPort {
    pub fn new(generation: Arc<GenerationService>, library: Arc<LibraryService>) -> Self {
        Self {
            generation,
            library,
        }
    }

    async fn dispatch(&self, action: MenuAction) -> Result<(), DomainError> {
        match action {
            MenuAction::Summarize => self.summarize().await,
            MenuAction::Flashcards => self.flashcards().await,
            MenuAction::Quiz => self.quiz().await,
            MenuAction::Exam => self.exam().await,
            MenuAction::Pyq => self.pyq().await,
            MenuAction::TakeQuiz => self.take_quiz().await,
            MenuAction::TakeExam => self.take_exam().await,
            MenuAction::Library => self.browse().await,
            MenuAction::ExportCsv => self.export_csv().await,
            MenuAction::ExportMarkdown => self.export_markdown().await,
            MenuAction::Quit => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Generation
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask for a topic and a notes file; returns (topic, text).
    async fn read_document(&self) -> Result<(String, String), DomainError> {
        let path = Text::new("Path to notes file (.txt / .md):")
            .prompt()
            .map_err(prompt_err)?;
        let path = path.trim();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::Validation(format!("cannot read {}: {}", path, e)))?;

        let default_topic = std::path::Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
            .unwrap_or_default();
        let topic = Text::new("Topic:")
            .with_default(&default_topic)
            .prompt()
            .map_err(prompt_err)?;
        Ok((topic, text))
    }

    fn ask_count(&self, what: &str) -> Result<usize, DomainError> {
        let max = self.generation.limits().max_items;
        CustomType::<usize>::new(&format!("How many {}? (1-{})", what, max))
            .with_default(DEFAULT_COUNT.min(max))
            .with_error_message("Please enter a whole number")
            .prompt()
            .map_err(prompt_err)
    }

    async fn summarize(&self) -> Result<(), DomainError> {
        let (topic, text) = self.read_document().await?;
        let out = with_spinner("Summarizing...", self.generation.summarize(&topic, &text)).await?;
        println!("\n{}\n", out.items.summary);
        for point in &out.items.key_points {
            println!("  - {}", point);
        }
        fallback_notice(out.used_fallback);
        println!("\nSaved as set {}", out.set_id);
        Ok(())
    }

    async fn flashcards(&self) -> Result<(), DomainError> {
        let (topic, text) = self.read_document().await?;
        let count = self.ask_count("flashcards")?;
        let out = with_spinner(
            "Generating flashcards...",
            self.generation.generate_flashcards(&topic, &text, count),
        )
        .await?;
        for (i, card) in out.items.iter().enumerate() {
            println!("\n{}. Q: {}\n   A: {}", i + 1, card.question, card.answer);
        }
        fallback_notice(out.used_fallback);
        println!("\nSaved {} cards as set {}", out.items.len(), out.set_id);
        Ok(())
    }

    async fn quiz(&self) -> Result<(), DomainError> {
        let (topic, text) = self.read_document().await?;
        let count = self.ask_count("questions")?;
        let out = with_spinner(
            "Generating quiz...",
            self.generation.generate_quiz(&topic, &text, count),
        )
        .await?;
        fallback_notice(out.used_fallback);
        println!(
            "Saved {} questions as set {}. Choose \"{}\" to attempt it.",
            out.items.len(),
            out.set_id,
            MenuAction::TakeQuiz
        );
        Ok(())
    }

    async fn exam(&self) -> Result<(), DomainError> {
        let (topic, text) = self.read_document().await?;
        let count = self.ask_count("questions")?;
        let out = with_spinner(
            "Generating practice exam...",
            self.generation.generate_exam(&topic, &text, count),
        )
        .await?;
        let marks: u32 = out.items.iter().map(|q| q.marks).sum();
        fallback_notice(out.used_fallback);
        println!(
            "Saved {} questions ({} marks) as set {}",
            out.items.len(),
            marks,
            out.set_id
        );
        Ok(())
    }

    async fn pyq(&self) -> Result<(), DomainError> {
        let query = Text::new("Search past-year questions for:")
            .prompt()
            .map_err(prompt_err)?;
        let count = self.ask_count("questions")?;
        let out = with_spinner("Searching...", self.generation.search_pyq(&query, count)).await?;
        for (i, entry) in out.items.iter().enumerate() {
            println!("\n{}. {} ({}, {})", i + 1, entry.question, entry.exam, entry.year);
            if let Some(hint) = &entry.answer_hint {
                println!("   Hint: {}", hint);
            }
        }
        fallback_notice(out.used_fallback);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Library
    // ─────────────────────────────────────────────────────────────────────────

    /// Pick a set, optionally filtered by kind. `Ok(None)` if there are none.
    async fn pick_set(&self, kind: Option<StudyKind>) -> Result<Option<StudySet>, DomainError> {
        let sets = self.library.list_sets(kind, LIBRARY_PAGE).await?;
        if sets.is_empty() {
            match kind {
                Some(k) => println!("No {} sets yet.", k),
                None => println!("The library is empty."),
            }
            return Ok(None);
        }
        let choices: Vec<SetChoice> = sets.into_iter().map(SetChoice).collect();
        let picked = Select::new("Select a set:", choices)
            .prompt()
            .map_err(prompt_err)?;
        Ok(Some(picked.0))
    }

    async fn browse(&self) -> Result<(), DomainError> {
        if let Some(set) = self.pick_set(None).await? {
            println!("{}", SetChoice(set));
        }
        Ok(())
    }

    async fn take_quiz(&self) -> Result<(), DomainError> {
        let Some(set) = self.pick_set(Some(StudyKind::Quiz)).await? else {
            return Ok(());
        };
        let questions: Vec<QuizQuestion> = set
            .items()
            .map_err(|e| DomainError::Repo(e.to_string()))?;

        let mut answers = HashMap::new();
        for q in &questions {
            let prompt = format!("{}. {} ({} pt)", q.id, q.question, q.points);
            let answer = match &q.options {
                Some(options) if !options.is_empty() => Select::new(&prompt, options.clone())
                    .prompt()
                    .map_err(prompt_err)?,
                _ => Text::new(&prompt).prompt().map_err(prompt_err)?,
            };
            answers.insert(q.id, answer);
        }

        let result = self.library.grade_quiz(&set.id, &answers).await?;
        for (q, verdict) in questions.iter().zip(&result.verdicts) {
            let mark = if verdict.correct { "+" } else { "x" };
            println!("[{}] {}. {}", mark, q.id, q.question);
            if !verdict.correct {
                println!("      Correct answer: {}", verdict.expected);
                if !q.explanation.is_empty() {
                    println!("      {}", q.explanation);
                }
            }
        }
        println!("\nScore: {}/{} ({:.0}%)", result.score, result.total, result.percentage);
        Ok(())
    }

    async fn take_exam(&self) -> Result<(), DomainError> {
        let Some(set) = self.pick_set(Some(StudyKind::Exam)).await? else {
            return Ok(());
        };
        let questions: Vec<ExamQuestion> = set
            .items()
            .map_err(|e| DomainError::Repo(e.to_string()))?;

        let mut answers = HashMap::new();
        for q in &questions {
            let prompt = format!("{}. {} [{} marks]", q.id, q.question, q.marks);
            let answer = match &q.options {
                Some(options) if !options.is_empty() => Select::new(&prompt, options.clone())
                    .prompt()
                    .map_err(prompt_err)?,
                _ => Text::new(&prompt).prompt().map_err(prompt_err)?,
            };
            answers.insert(q.id, answer);
        }

        let result = self.library.grade_exam(&set.id, &answers).await?;
        println!(
            "\nObjective score: {}/{} ({:.0}%)",
            result.score, result.objective_total, result.percentage
        );
        if !result.pending_review.is_empty() {
            println!(
                "{} marks across {} written answers need self-review against the sample answers.",
                result.pending_marks,
                result.pending_review.len()
            );
            for q in questions.iter().filter(|q| result.pending_review.contains(&q.id)) {
                if let Some(sample) = &q.sample_answer {
                    println!("\n{}. {}\n   Sample: {}", q.id, q.question, sample);
                }
            }
        }
        Ok(())
    }

    async fn export_csv(&self) -> Result<(), DomainError> {
        if let Some(set) = self.pick_set(Some(StudyKind::Flashcards)).await? {
            let path = self.library.export_flashcards_csv(&set.id).await?;
            println!("Exported to {}", path.display());
        }
        Ok(())
    }

    async fn export_markdown(&self) -> Result<(), DomainError> {
        if let Some(set) = self.pick_set(None).await? {
            let path = self.library.export_markdown(&set.id).await?;
            println!("Exported to {}", path.display());
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let action = match Select::new("What would you like to do?", MenuAction::ALL.to_vec())
                .with_page_size(MenuAction::ALL.len())
                .prompt()
            {
                Ok(action) => action,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(prompt_err(e)),
            };
            if action == MenuAction::Quit {
                return Ok(());
            }

            match self.dispatch(action).await {
                Ok(()) => {}
                Err(DomainError::Ui(msg)) if msg == "cancelled" => {}
                Err(e) => {
                    warn!(action = %action, error = %e, "action failed");
                    println!("Error: {}", e);
                }
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_menu_labels_unique() {
        let labels: std::collections::HashSet<String> =
            MenuAction::ALL.iter().map(|a| a.to_string()).collect();
        assert_eq!(labels.len(), MenuAction::ALL.len());
    }

    #[test]
    fn test_set_choice_marks_placeholders() {
        let set = StudySet::new(StudyKind::Quiz, "Cells", json!([{}, {}]), true);
        let label = SetChoice(set).to_string();
        assert!(label.starts_with("[quiz] Cells (2 items"));
        assert!(label.ends_with("*placeholder*"));
    }

    #[test]
    fn test_cancel_maps_to_ui_error() {
        assert!(matches!(
            prompt_err(InquireError::OperationCanceled),
            DomainError::Ui(msg) if msg == "cancelled"
        ));
    }
}
