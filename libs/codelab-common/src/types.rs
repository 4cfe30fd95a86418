// Wire types shared by the client and its callers
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Expected output the judge uses for cases it could not interpret
pub const VALIDATION_CHECK: &str = "validation_check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Sql,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
            Language::Sql => write!(f, "sql"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "sql" => Ok(Language::Sql),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// A test-case descriptor as authored alongside a question.
///
/// Descriptors arrive as loosely shaped JSON. They are classified once, here,
/// and never inspected by shape again. Any JSON value converts into a
/// descriptor; shapes that are neither a keyword list nor a structured case
/// land in `Malformed` instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum TestCaseSpec {
    /// Tokens the source must contain
    Keywords(Vec<String>),
    /// Arguments for the function under test and its expected output
    Structured {
        values: Vec<Value>,
        expected_output: String,
    },
    Malformed(Value),
}

impl TestCaseSpec {
    pub fn keywords<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TestCaseSpec::Keywords(tokens.into_iter().map(Into::into).collect())
    }

    pub fn structured(values: Vec<Value>, expected_output: impl Into<String>) -> Self {
        TestCaseSpec::Structured {
            values,
            expected_output: expected_output.into(),
        }
    }

    /// Convert into the shape the judge expects in `TestCases`
    pub fn to_wire(&self) -> WireTestCase {
        match self {
            TestCaseSpec::Keywords(tokens) => WireTestCase::Keywords(tokens.clone()),
            TestCaseSpec::Structured {
                values,
                expected_output,
            } => WireTestCase::Case {
                value: values.clone(),
                output: expected_output.clone(),
            },
            TestCaseSpec::Malformed(raw) => WireTestCase::Case {
                value: vec![raw.clone()],
                output: VALIDATION_CHECK.to_string(),
            },
        }
    }
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(*name))
}

fn expected_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<Value> for TestCaseSpec {
    fn from(raw: Value) -> Self {
        match &raw {
            Value::Array(items) => {
                let tokens: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                match tokens {
                    Some(tokens) => TestCaseSpec::Keywords(tokens),
                    None => TestCaseSpec::Malformed(raw),
                }
            }
            Value::Object(obj) => {
                let values = field(obj, &["values", "Value"]).and_then(Value::as_array);
                let expected = field(obj, &["expectedOutput", "expected_output", "Output"])
                    .and_then(expected_text);
                match (values, expected) {
                    (Some(values), Some(expected_output)) => TestCaseSpec::Structured {
                        values: values.clone(),
                        expected_output,
                    },
                    _ => TestCaseSpec::Malformed(raw),
                }
            }
            _ => TestCaseSpec::Malformed(raw),
        }
    }
}

impl From<TestCaseSpec> for Value {
    fn from(spec: TestCaseSpec) -> Self {
        match spec {
            TestCaseSpec::Keywords(tokens) => {
                Value::Array(tokens.into_iter().map(Value::String).collect())
            }
            TestCaseSpec::Structured {
                values,
                expected_output,
            } => serde_json::json!({
                "values": values,
                "expectedOutput": expected_output,
            }),
            TestCaseSpec::Malformed(raw) => raw,
        }
    }
}

/// Test case as it travels in the submit body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTestCase {
    Keywords(Vec<String>),
    Case {
        #[serde(rename = "Value")]
        value: Vec<Value>,
        #[serde(rename = "Output")]
        output: String,
    },
}

/// Body of the judge's submit endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub code: String,
    #[serde(rename = "TestCases")]
    pub test_cases: Vec<WireTestCase>,
    #[serde(rename = "FunctionCall", default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<String>,
    pub language: Language,
    /// Seconds
    pub timeout: u64,
    /// Megabytes
    pub memory_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_encoding: Option<String>,
}

impl SubmitPayload {
    /// Replace the source text with its base64 form and tag the payload
    pub fn with_base64_source(mut self) -> Self {
        self.code = general_purpose::STANDARD.encode(self.code.as_bytes());
        self.code_encoding = Some("base64".to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub submission_id: String,
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub estimated_wait_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionStatus {
    Queued,
    Running,
    Completed,
    Other(String),
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Completed)
    }
}

impl From<String> for SubmissionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => SubmissionStatus::Queued,
            "running" => SubmissionStatus::Running,
            "completed" => SubmissionStatus::Completed,
            _ => SubmissionStatus::Other(s),
        }
    }
}

impl From<SubmissionStatus> for String {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Queued => "queued".to_string(),
            SubmissionStatus::Running => "running".to_string(),
            SubmissionStatus::Completed => "completed".to_string(),
            SubmissionStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

/// Response of the judge's status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub submission_id: String,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub result: Option<ExecutionResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub queue_position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default, deserialize_with = "null_as_false")]
    pub success: bool,
    #[serde(default)]
    pub parsed_results: Option<ParsedResults>,
    #[serde(default)]
    pub raw_output: Option<String>,
    #[serde(default)]
    pub actual_output: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Pass/fail flags aligned with the request's `n` test cases.
    ///
    /// Missing per-case entries count as failures and extra entries are
    /// dropped, so the result always has exactly `n` elements. Overall
    /// success only stands in for per-case verdicts when the judge sent
    /// none (keyword cases) or sent a summary; any other shape fails.
    pub fn per_case_results(&self, n: usize) -> Vec<bool> {
        match &self.parsed_results {
            Some(ParsedResults::Cases(cases)) => (0..n)
                .map(|i| cases.get(i).is_some_and(CaseVerdict::passed))
                .collect(),
            Some(ParsedResults::Summary(summary)) => vec![summary.success && self.success; n],
            Some(ParsedResults::Other(_)) => vec![false; n],
            None => vec![self.success; n],
        }
    }

    pub fn failure_message(&self) -> Option<String> {
        if let Some(error) = self.error.as_deref().filter(|e| !e.is_empty()) {
            return Some(error.to_string());
        }
        match &self.parsed_results {
            Some(ParsedResults::Summary(summary)) => {
                summary.error.clone().filter(|e| !e.is_empty())
            }
            _ => None,
        }
    }

    pub fn output_text(&self) -> String {
        self.actual_output
            .clone()
            .or_else(|| self.raw_output.clone())
            .or_else(|| match &self.parsed_results {
                Some(ParsedResults::Summary(summary)) => summary.output.clone(),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedResults {
    Cases(Vec<CaseVerdict>),
    Summary(ResultSummary),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSummary {
    pub success: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// One judge verdict inside `parsed_results`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseVerdict {
    Flag(bool),
    Text(String),
    Detail {
        #[serde(default)]
        passed: Option<bool>,
        #[serde(default)]
        success: Option<bool>,
    },
    Other(Value),
}

impl CaseVerdict {
    pub fn passed(&self) -> bool {
        match self {
            CaseVerdict::Flag(flag) => *flag,
            CaseVerdict::Text(text) => matches!(
                text.trim().to_lowercase().as_str(),
                "passed" | "pass" | "true"
            ),
            CaseVerdict::Detail { passed, success } => passed.or(*success).unwrap_or(false),
            CaseVerdict::Other(_) => false,
        }
    }
}
