//! Code-review handlers: a small static-analysis pipeline over a `code`
//! string in the workflow state.
//!
//! Each handler reads what earlier stages produced and contributes its own
//! keys, so the stages compose into linear, branching, or looping review
//! graphs. All heuristics are intentionally simple keyword scans.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::handler::{Handler, HandlerError, StateUpdate};
use crate::state::WorkflowState;

/// Complexity above this counts a function as complex.
const COMPLEXITY_THRESHOLD: i64 = 5;

/// Lines longer than this are flagged as a style issue.
const MAX_LINE_LENGTH: usize = 100;

fn string_input(state: &WorkflowState, key: &'static str) -> Result<String, HandlerError> {
    match state.get_ref(key) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(HandlerError::InvalidInput {
            what: key,
            message: format!("expected a string, got {other}"),
        }),
    }
}

fn array_input(state: &WorkflowState, key: &'static str) -> Result<Vec<Value>, HandlerError> {
    match state.get_ref(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(HandlerError::InvalidInput {
            what: key,
            message: format!("expected an array, got {other}"),
        }),
    }
}

fn str_field<'a>(object: &'a Value, field: &str) -> &'a str {
    object.get(field).and_then(Value::as_str).unwrap_or("")
}

// ============================================================================
// Stage 1: function extraction
// ============================================================================

/// Extracts function blocks from the `code` string.
///
/// A function starts at any line whose trimmed form begins with `def ` and
/// runs until the next such line. Produces `functions` (array of
/// `{name, start_line, code}` objects, 1-based start lines) and
/// `function_count`.
pub struct ExtractFunctions;

#[async_trait]
impl Handler for ExtractFunctions {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        let code = string_input(state, "code")?;

        let mut functions: Vec<Value> = Vec::new();
        let mut current: Option<(String, usize, String)> = None;

        for (i, line) in code.split('\n').enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("def ") {
                if let Some((name, start_line, body)) = current.take() {
                    functions.push(json!({
                        "name": name,
                        "start_line": start_line,
                        "code": body,
                    }));
                }
                let name = trimmed
                    .split('(')
                    .next()
                    .unwrap_or(trimmed)
                    .trim_start_matches("def ")
                    .trim()
                    .to_string();
                current = Some((name, i + 1, format!("{line}\n")));
            } else if let Some((_, _, body)) = current.as_mut() {
                body.push_str(line);
                body.push('\n');
            }
        }
        if let Some((name, start_line, body)) = current {
            functions.push(json!({
                "name": name,
                "start_line": start_line,
                "code": body,
            }));
        }

        Ok(StateUpdate::new()
            .with("function_count", json!(functions.len()))
            .with("functions", Value::Array(functions)))
    }
}

// ============================================================================
// Stage 2: complexity scoring
// ============================================================================

/// Scores each extracted function by counting control-flow keywords.
///
/// Complexity starts at 1 and gains 1 per occurrence of `if `, `for `,
/// `while `, `elif `, `and `, and `or ` in the function body. Produces
/// `complexity_scores` (array of `{function, complexity, is_complex}`),
/// `average_complexity`, and `high_complexity_count`.
pub struct CheckComplexity;

impl CheckComplexity {
    fn score(code: &str) -> i64 {
        const KEYWORDS: [&str; 6] = ["if ", "for ", "while ", "elif ", "and ", "or "];
        1 + KEYWORDS
            .iter()
            .map(|keyword| code.matches(keyword).count() as i64)
            .sum::<i64>()
    }
}

#[async_trait]
impl Handler for CheckComplexity {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        let functions = array_input(state, "functions")?;

        let mut scores: Vec<Value> = Vec::new();
        let mut total: i64 = 0;
        let mut high_count: usize = 0;
        for function in &functions {
            let complexity = Self::score(str_field(function, "code"));
            let is_complex = complexity > COMPLEXITY_THRESHOLD;
            total += complexity;
            high_count += usize::from(is_complex);
            scores.push(json!({
                "function": str_field(function, "name"),
                "complexity": complexity,
                "is_complex": is_complex,
            }));
        }

        let average = if scores.is_empty() {
            json!(0)
        } else {
            json!(total as f64 / scores.len() as f64)
        };

        Ok(StateUpdate::new()
            .with("complexity_scores", Value::Array(scores))
            .with("average_complexity", average)
            .with("high_complexity_count", json!(high_count)))
    }
}

// ============================================================================
// Stage 3: issue detection
// ============================================================================

/// Flags common problems in the `code` string and extracted functions.
///
/// Checks for bare `except:` clauses, use of `eval(`, function names that
/// are not lower-case, and lines over 100 characters. Produces `issues`
/// (array of `{type, severity, message}`), `issue_count`, and
/// `high_severity_count`.
pub struct DetectIssues;

#[async_trait]
impl Handler for DetectIssues {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        let code = string_input(state, "code")?;
        let functions = array_input(state, "functions")?;

        let mut issues: Vec<Value> = Vec::new();

        if code.contains("except:") {
            issues.push(json!({
                "type": "bare_except",
                "severity": "medium",
                "message": "Bare except clause found - should specify exception type",
            }));
        }

        if code.contains("eval(") {
            issues.push(json!({
                "type": "security",
                "severity": "high",
                "message": "Use of eval() is dangerous",
            }));
        }

        for function in &functions {
            let name = str_field(function, "name");
            if name.chars().any(char::is_uppercase) {
                issues.push(json!({
                    "type": "naming",
                    "severity": "low",
                    "message": format!("Function '{name}' should use snake_case"),
                }));
            }
        }

        let long_lines = code
            .split('\n')
            .filter(|line| line.chars().count() > MAX_LINE_LENGTH)
            .count();
        if long_lines > 0 {
            issues.push(json!({
                "type": "style",
                "severity": "low",
                "message": format!("{long_lines} lines exceed 100 characters"),
            }));
        }

        let high_severity = issues
            .iter()
            .filter(|issue| str_field(issue, "severity") == "high")
            .count();

        Ok(StateUpdate::new()
            .with("issue_count", json!(issues.len()))
            .with("high_severity_count", json!(high_severity))
            .with("issues", Value::Array(issues)))
    }
}

// ============================================================================
// Stage 4: suggestions and quality score
// ============================================================================

/// Turns detected issues and complexity scores into improvement
/// suggestions plus an overall `quality_score`.
///
/// Suggestions are deduplicated while keeping first-occurrence order. The
/// quality score is `max(0, 100 - 10 * issue_count -
/// 15 * high_complexity_count)`.
pub struct SuggestImprovements;

#[async_trait]
impl Handler for SuggestImprovements {
    async fn invoke(&self, state: &WorkflowState) -> Result<StateUpdate, HandlerError> {
        let issues = array_input(state, "issues")?;
        let scores = array_input(state, "complexity_scores")?;

        let mut suggestions: Vec<String> = Vec::new();
        let mut push_unique = |suggestions: &mut Vec<String>, text: String| {
            if !suggestions.contains(&text) {
                suggestions.push(text);
            }
        };

        for issue in &issues {
            let suggestion = match str_field(issue, "type") {
                "bare_except" => "Specify exception types in except clauses",
                "security" => "Remove eval() and use safer alternatives like ast.literal_eval()",
                "naming" => "Rename functions to follow PEP 8 naming conventions",
                "style" => "Break long lines into multiple lines",
                _ => continue,
            };
            push_unique(&mut suggestions, suggestion.to_string());
        }

        for score in &scores {
            if score.get("is_complex").and_then(Value::as_bool) == Some(true) {
                let function = str_field(score, "function");
                push_unique(
                    &mut suggestions,
                    format!("Refactor function '{function}' to reduce complexity"),
                );
            }
        }

        let issue_count = state
            .get("issue_count", json!(0))
            .as_i64()
            .unwrap_or_default();
        let high_complexity_count = state
            .get("high_complexity_count", json!(0))
            .as_i64()
            .unwrap_or_default();
        let quality_score = (100 - issue_count * 10 - high_complexity_count * 15).max(0);

        Ok(StateUpdate::new()
            .with("suggestions", json!(suggestions))
            .with("quality_score", json!(quality_score)))
    }
}
