//! Line-oriented terminal front end for the quiz runner.

use quiz_core::model::{AnswerValue, Question, QuestionKind};
use services::{
    AttemptListItem, AttemptReview, CompletedAttempt, PersistenceStatus, QuizEvent, QuizInput,
    SessionError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HELP_LINE: &str = "(empty line skips, :quit exits)";

/// Map one line of user input to a runner input.
pub fn parse_line(line: &str) -> QuizInput {
    match line.trim() {
        "" | ":skip" => QuizInput::Advance,
        ":retry" | ":r" => QuizInput::Retry,
        ":quit" | ":q" => QuizInput::Quit,
        answer => QuizInput::Submit(answer.to_owned()),
    }
}

/// Forward stdin lines to the runner until EOF or the runner goes away.
pub fn spawn_stdin_reader(tx: mpsc::Sender<QuizInput>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let input = parse_line(&line);
                    let quit = input == QuizInput::Quit;
                    if tx.send(input).await.is_err() || quit {
                        return;
                    }
                }
                Ok(None) => return,
                Err(err) => {
                    tracing::warn!(error = %err, "stdin read failed");
                    return;
                }
            }
        }
    })
}

/// Print a runner event.
pub fn render_event(event: QuizEvent) {
    match event {
        QuizEvent::QuestionShown {
            index,
            total,
            question,
            time_limit,
        } => {
            println!();
            println!("{}", question_header(index, total, &question, time_limit));
            if let QuestionKind::Choice { options } = question.kind() {
                for option in options {
                    println!("  - {option}");
                }
            }
            println!("{HELP_LINE}");
        }
        QuizEvent::Tick { remaining, .. } => {
            if remaining > 0 && (remaining <= 5 || remaining % 10 == 0) {
                println!("  {remaining}s left");
            }
        }
        QuizEvent::AnswerRecorded(submission) => {
            println!("  locked in: {} ({}s)", submission.value, submission.time_spent);
        }
        QuizEvent::InputIgnored { .. } => println!("  not a whole number, try again"),
        QuizEvent::Rejected(err) => println!("  {}", rejection(&err)),
        QuizEvent::TimeUp { .. } => println!("  time's up"),
        QuizEvent::Completed(done) => {
            println!();
            println!("{}", completion_summary(&done));
            println!(":retry to play again, :quit to exit");
        }
        QuizEvent::Reset => println!("starting over"),
    }
}

fn question_header(index: usize, total: usize, question: &Question, time_limit: u32) -> String {
    format!(
        "Question {}/{} [{}s]: {}",
        index + 1,
        total,
        time_limit,
        question.prompt()
    )
}

fn rejection(err: &SessionError) -> String {
    match err {
        SessionError::Transition(err) => format!("ignored: {err}"),
        other => format!("ignored: {other}"),
    }
}

fn completion_summary(done: &CompletedAttempt) -> String {
    let attempt = &done.attempt;
    let mut out = format!(
        "Score: {}/{} ({}%), {}s total",
        attempt.score(),
        attempt.total_questions(),
        attempt.percentage(),
        attempt.total_time_secs()
    );
    if let PersistenceStatus::Failed(reason) = &done.persistence {
        out.push_str(&format!("\n(result not saved: {reason})"));
    }
    out
}

pub fn history_table(items: &[AttemptListItem]) -> String {
    if items.is_empty() {
        return "no attempts yet".to_owned();
    }
    items
        .iter()
        .map(|item| {
            format!(
                "{}  {}  {}/{} ({}%)  {}s",
                item.id,
                item.date.format("%Y-%m-%d %H:%M"),
                item.score,
                item.total,
                item.percentage,
                item.total_time_secs
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn review_table(review: &AttemptReview) -> String {
    let summary = &review.summary;
    let mut lines = vec![format!(
        "Attempt {} on {}: {}/{} ({}%)",
        summary.id,
        summary.date.format("%Y-%m-%d %H:%M"),
        summary.score,
        summary.total,
        summary.percentage
    )];
    for row in &review.questions {
        let mark = if row.is_correct { "+" } else { "-" };
        let submitted = row
            .submitted
            .as_ref()
            .map_or_else(|| "(none)".to_owned(), AnswerValue::to_string);
        let time = row
            .time_spent
            .map_or_else(|| "-".to_owned(), |secs| format!("{secs}s"));
        lines.push(format!(
            "{mark} {}  answer: {submitted}  correct: {}  time: {time}",
            row.prompt, row.correct_answer
        ));
    }
    lines.push(format!(
        "Total time {}s, average {}s per question",
        review.total_time_secs, review.average_time_secs
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_skips_and_commands_are_recognised() {
        assert_eq!(parse_line(""), QuizInput::Advance);
        assert_eq!(parse_line("   "), QuizInput::Advance);
        assert_eq!(parse_line(":retry"), QuizInput::Retry);
        assert_eq!(parse_line(":q"), QuizInput::Quit);
        assert_eq!(parse_line(" 40 "), QuizInput::Submit("40".into()));
        assert_eq!(parse_line("Mercury"), QuizInput::Submit("Mercury".into()));
    }

    #[test]
    fn header_is_one_based() {
        let question = Question::integer(6, "What is 12 + 28?", 40).unwrap();
        assert_eq!(
            question_header(0, 10, &question, 30),
            "Question 1/10 [30s]: What is 12 + 28?"
        );
    }

    #[test]
    fn empty_history_has_a_message() {
        assert_eq!(history_table(&[]), "no attempts yet");
    }
}
