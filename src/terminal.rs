//! Terminal host: stdin/stdout rendering of a quiz session for local testing.

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::Error;
use crate::quiz::{ContactRecord, ContactSubmission, QuestionKind, QuizSnapshot, Stage};
use crate::session::QuizSession;

const BAR_WIDTH: usize = 20;

/// Fields asked for when the config does not list any.
const FALLBACK_CONTACT_FIELDS: &[&str] = &["name", "email"];

/// A line of user input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 1-based position in the visible answer list.
    Pick(usize),
    Done,
    Restart,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "done" | "d" => Command::Done,
        "restart" | "r" => Command::Restart,
        "quit" | "q" | "exit" => Command::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => Command::Pick(n),
            _ => Command::Unknown(line.to_string()),
        },
    }
}

/// Render a snapshot as plain text.
pub fn render(snapshot: &QuizSnapshot) -> String {
    let mut lines = Vec::new();
    if !snapshot.title.is_empty() {
        lines.push(snapshot.title.clone());
    }
    if let Some(subtitle) = &snapshot.subtitle {
        lines.push(subtitle.clone());
    }
    lines.push(progress_bar(snapshot.percent));

    match snapshot.stage {
        Stage::Question => {
            if let Some(question) = &snapshot.question {
                lines.push(format!("\n{}", question.text));
                if let Some(tooltip) = &question.tooltip {
                    lines.push(format!("  ({tooltip})"));
                }
                let multi = question.kind == QuestionKind::Multi;
                for (pos, answer) in question.answers.iter().enumerate() {
                    let mark = match (multi, answer.selected) {
                        (false, _) => "",
                        (true, true) => "[x] ",
                        (true, false) => "[ ] ",
                    };
                    lines.push(format!("  {}. {mark}{}", pos + 1, answer.label));
                }
                if multi {
                    lines.push("Pick options by number, then type 'done'.".to_string());
                }
            }
        }
        Stage::Contact => {
            lines.push("\nAlmost there. Leave your details to see your result.".to_string());
        }
        Stage::Result => {
            if let Some(outcome) = &snapshot.outcome {
                lines.push(format!("\nYour result: {}", outcome.label));
                if let Some(text) = &outcome.text {
                    lines.push(text.clone());
                }
                lines.push(format!("-> {}: {}", outcome.cta.label, outcome.cta.url));
                if let Some(cta) = &outcome.secondary_cta {
                    lines.push(format!("-> {}: {}", cta.label, cta.url));
                }
            }
            lines.push("Type 'restart' to take the quiz again.".to_string());
        }
    }

    if let Some(notice) = &snapshot.notice {
        lines.push(format!("! {notice}"));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

/// Drive a session from stdin until EOF or `quit`.
pub async fn run(session: &mut QuizSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let snapshot = session.snapshot();
        println!("\n{}", render(&snapshot));

        if snapshot.stage == Stage::Contact {
            let Some(submission) = read_contact(&mut lines, &snapshot.contact_fields).await? else {
                break;
            };
            session.submit_contact(submission).await?;
            continue;
        }

        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Command::Quit => break,
            Command::Restart => session.restart(),
            Command::Done => report(session.confirm().map(|_| ())),
            Command::Pick(n) => {
                let Some(question) = snapshot.question else {
                    eprintln!("Nothing to pick here.");
                    continue;
                };
                let Some(answer) = question.answers.get(n - 1) else {
                    eprintln!("No option {n}.");
                    continue;
                };
                match question.kind {
                    QuestionKind::Single => report(session.answer(&answer.id).map(|_| ())),
                    QuestionKind::Multi => report(session.toggle(&answer.id).map(|_| ())),
                }
            }
            Command::Unknown(input) => {
                eprintln!("Unrecognised input '{input}'. Use a number, 'done', 'restart' or 'quit'.");
            }
        }
    }
    Ok(())
}

/// Prompt for each contact field. `None` on EOF.
async fn read_contact(
    lines: &mut Lines<BufReader<Stdin>>,
    fields: &[String],
) -> anyhow::Result<Option<ContactSubmission>> {
    let names: Vec<&str> = if fields.is_empty() {
        FALLBACK_CONTACT_FIELDS.to_vec()
    } else {
        fields.iter().map(String::as_str).collect()
    };

    let mut record = ContactRecord::new();
    for name in names {
        eprint!("{name}: ");
        let Some(value) = lines.next_line().await? else {
            return Ok(None);
        };
        record.insert(name.to_string(), value.trim().to_string());
    }
    Ok(Some(ContactSubmission {
        fields: record,
        honeypot: None,
    }))
}

fn report(result: crate::error::Result<()>) {
    match result {
        Ok(()) => {}
        // The notice is already part of the next render.
        Err(Error::Validation(_)) => {}
        Err(e) => eprintln!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::quiz::{AnswerView, Cta, Outcome, QuestionView};

    fn snapshot(stage: Stage) -> QuizSnapshot {
        QuizSnapshot {
            quiz_id: "fit".into(),
            title: "Find your fit".into(),
            subtitle: None,
            stage,
            percent: 50,
            question: None,
            outcome: None,
            contact_fields: Vec::new(),
            notice: None,
            answered_count: 1,
            flags: BTreeMap::new(),
            scores: BTreeMap::new(),
            trail: Vec::new(),
        }
    }

    fn answer(id: &str, label: &str, selected: bool) -> AnswerView {
        AnswerView {
            id: id.into(),
            label: label.into(),
            tooltip: None,
            photo_url: None,
            selected,
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command(" 2 "), Command::Pick(2));
        assert_eq!(parse_command("DONE"), Command::Done);
        assert_eq!(parse_command("restart"), Command::Restart);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command("0"), Command::Unknown("0".into()));
        assert_eq!(parse_command("maybe"), Command::Unknown("maybe".into()));
    }

    #[test]
    fn progress_bar_scales_to_width() {
        assert_eq!(progress_bar(0), format!("[{}] 0%", "-".repeat(20)));
        assert_eq!(progress_bar(50), format!("[{}{}] 50%", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(100), format!("[{}] 100%", "#".repeat(20)));
    }

    #[test]
    fn renders_multi_question_with_marks_and_notice() {
        let mut s = snapshot(Stage::Question);
        s.notice = Some("Please select at least 2 options.".into());
        s.question = Some(QuestionView {
            id: "q1".into(),
            index: 0,
            text: "Pick your colours".into(),
            tooltip: None,
            photo_url: None,
            kind: QuestionKind::Multi,
            min: 2,
            max: None,
            answers: vec![answer("a", "Red", true), answer("b", "Blue", false)],
        });

        let text = render(&s);
        assert!(text.starts_with("Find your fit\n"));
        assert!(text.contains("Pick your colours"));
        assert!(text.contains("  1. [x] Red"));
        assert!(text.contains("  2. [ ] Blue"));
        assert!(text.contains("! Please select at least 2 options."));
    }

    #[test]
    fn renders_contact_stage_line_by_line() {
        let text = render(&snapshot(Stage::Contact));
        let bar = progress_bar(50);
        assert_eq!(
            text,
            format!("Find your fit\n{bar}\n\nAlmost there. Leave your details to see your result.\n")
        );
    }

    #[test]
    fn renders_result_with_both_ctas() {
        let mut s = snapshot(Stage::Result);
        s.outcome = Some(Outcome {
            id: "x".into(),
            label: "Explorer".into(),
            text: Some("You like new places.".into()),
            photo_url: None,
            cta: Cta {
                url: "https://shop.example/x".into(),
                label: "Shop".into(),
            },
            secondary_cta: Some(Cta {
                url: "https://shop.example/all".into(),
                label: "See all".into(),
            }),
            forced: false,
        });

        let text = render(&s);
        assert!(text.contains("Your result: Explorer"));
        assert!(text.contains("You like new places."));
        assert!(text.contains("-> Shop: https://shop.example/x"));
        assert!(text.contains("-> See all: https://shop.example/all"));
    }
}
