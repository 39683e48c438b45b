//! Individual connectivity and functionality checks.

use crate::console::{Reporter, truncate_sample};
use probe_llm::{ChatCompletion, ChatMessage, CompletionRequest, LlmClient, LlmError, api_error_message};
use std::time::{Duration, Instant};

const SAMPLE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Passed,
    Partial,
    Failed,
}

impl ProbeOutcome {
    /// Partial results still count as passing in the run summary.
    pub fn is_pass(self) -> bool {
        !matches!(self, ProbeOutcome::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            ProbeOutcome::Passed => "PASSED",
            ProbeOutcome::Partial => "PARTIAL",
            ProbeOutcome::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub name: String,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
    pub detail: Option<String>,
}

/// Fixed conversation plus sampling limits used by a probe.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
}

impl Prompt {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            messages,
            max_tokens,
            top_p: None,
        }
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    fn request(&self, model: &str) -> CompletionRequest {
        let req = CompletionRequest::new(model).max_tokens(self.max_tokens);
        match self.top_p {
            Some(top_p) => req.top_p(top_p),
            None => req,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Probe {
    /// Lists models; passes on a non-empty list.
    Connectivity,
    /// One completion; passes on at least one non-empty choice.
    Completion { prompt: Prompt, show_raw: bool },
    /// Passes whenever the call succeeds; vocabulary misses are only logged.
    DomainKnowledge {
        prompt: Prompt,
        terms: &'static [&'static str],
    },
    /// Sequential completions classified by success rate.
    RepeatedRequests { prompt: Prompt, attempts: u32 },
}

pub struct ProbeContext<'a> {
    pub client: &'a LlmClient,
    pub reporter: &'a dyn Reporter,
    /// Pause between sequential requests.
    pub pause: Duration,
}

impl Probe {
    pub fn name(&self) -> &'static str {
        match self {
            Probe::Connectivity => "API Connectivity",
            Probe::Completion { .. } => "Completion",
            Probe::DomainKnowledge { .. } => "Domain Knowledge",
            Probe::RepeatedRequests { .. } => "Rate Limits",
        }
    }

    pub async fn run(&self, ctx: &ProbeContext<'_>) -> ProbeResult {
        let started = Instant::now();
        let (outcome, detail) = match self {
            Probe::Connectivity => connectivity(ctx).await,
            Probe::Completion { prompt, show_raw } => completion(ctx, prompt, *show_raw).await,
            Probe::DomainKnowledge { prompt, terms } => domain_knowledge(ctx, prompt, terms).await,
            Probe::RepeatedRequests { prompt, attempts } => {
                repeated_requests(ctx, prompt, *attempts).await
            }
        };
        ProbeResult {
            name: self.name().to_string(),
            outcome,
            elapsed: started.elapsed(),
            detail,
        }
    }
}

type Verdict = (ProbeOutcome, Option<String>);

async fn connectivity(ctx: &ProbeContext<'_>) -> Verdict {
    let r = ctx.reporter;
    r.info("Testing API connectivity...");
    let started = Instant::now();
    match ctx.client.list_models().await {
        Ok(models) if !models.is_empty() => {
            r.success(&format!(
                "API connection successful ({:.2}s)",
                started.elapsed().as_secs_f64()
            ));
            r.info(&format!("Available models: {}", models.ids.join(", ")));
            (ProbeOutcome::Passed, None)
        }
        Ok(models) => {
            r.error("API returned unexpected format: empty model list");
            r.error(&format!("Response: {}", pretty(&models.raw)));
            (
                ProbeOutcome::Failed,
                Some("empty model list".to_string()),
            )
        }
        Err(e) => {
            let detail = report_failure(r, "API connectivity test", &e);
            (ProbeOutcome::Failed, Some(detail))
        }
    }
}

async fn completion(ctx: &ProbeContext<'_>, prompt: &Prompt, show_raw: bool) -> Verdict {
    let r = ctx.reporter;
    let model = ctx.client.model();
    r.info(&format!("Testing completion with model '{model}'..."));

    let started = Instant::now();
    let completion = match send(ctx, prompt).await {
        Ok(c) => c,
        Err(e) => {
            let detail = report_failure(r, "Completion test", &e);
            return (ProbeOutcome::Failed, Some(detail));
        }
    };

    if show_raw {
        r.info(&pretty(&completion.raw));
    }

    if !completion.has_content() {
        r.error("Completion test failed: response contained no non-empty choices");
        r.debug(&format!("Response: {}", pretty(&completion.raw)));
        return (
            ProbeOutcome::Failed,
            Some("no non-empty choices".to_string()),
        );
    }

    r.success(&format!(
        "Completion test successful ({:.2}s)",
        started.elapsed().as_secs_f64()
    ));
    log_sample(r, completion.first_content());
    (ProbeOutcome::Passed, None)
}

async fn domain_knowledge(
    ctx: &ProbeContext<'_>,
    prompt: &Prompt,
    terms: &[&str],
) -> Verdict {
    let r = ctx.reporter;
    r.info("Testing domain-specific knowledge...");

    let started = Instant::now();
    let completion = match send(ctx, prompt).await {
        Ok(c) => c,
        Err(e) => {
            let detail = report_failure(r, "Domain knowledge test", &e);
            return (ProbeOutcome::Failed, Some(detail));
        }
    };
    if completion.choices.is_empty() {
        r.error("Domain knowledge test failed: unexpected response format");
        return (ProbeOutcome::Failed, Some("no choices".to_string()));
    }

    let matched = matched_terms(completion.first_content(), terms);
    if matched.is_empty() {
        r.warning(&format!(
            "Domain knowledge test partial: matched 0 of {} expected terms",
            terms.len()
        ));
        log_sample(r, completion.first_content());
        return (
            ProbeOutcome::Passed,
            Some("matched 0 domain terms".to_string()),
        );
    }

    r.success(&format!(
        "Domain knowledge test successful ({:.2}s)",
        started.elapsed().as_secs_f64()
    ));
    r.info(&format!(
        "Matched {} domain terms: {}",
        matched.len(),
        matched.join(", ")
    ));
    (ProbeOutcome::Passed, None)
}

async fn repeated_requests(ctx: &ProbeContext<'_>, prompt: &Prompt, attempts: u32) -> Verdict {
    let r = ctx.reporter;
    r.info("Testing API rate limits with sequential requests...");

    let mut successful = 0u32;
    for i in 1..=attempts {
        r.info(&format!("Making request {i}/{attempts}..."));
        let started = Instant::now();
        match send(ctx, prompt).await {
            Ok(c) if !c.choices.is_empty() => {
                r.success(&format!(
                    "Request {i} successful ({:.2}s)",
                    started.elapsed().as_secs_f64()
                ));
                successful += 1;
            }
            Ok(_) => r.warning(&format!("Request {i} returned unexpected format")),
            Err(e) => {
                report_failure(r, &format!("Request {i}"), &e);
            }
        }
        if i < attempts && !ctx.pause.is_zero() {
            tokio::time::sleep(ctx.pause).await;
        }
    }

    let rate = success_rate(successful, attempts);
    let outcome = classify_success_rate(successful, attempts);
    match outcome {
        ProbeOutcome::Passed => {
            r.success("Rate limit test passed: all requests were successful");
        }
        ProbeOutcome::Partial => r.warning(&format!(
            "Rate limit test partially successful: {rate:.1}% of requests succeeded"
        )),
        ProbeOutcome::Failed => r.error(&format!(
            "Rate limit test failed: only {rate:.1}% of requests succeeded"
        )),
    }
    let detail = (outcome != ProbeOutcome::Passed)
        .then(|| format!("{successful}/{attempts} requests succeeded ({rate:.1}%)"));
    (outcome, detail)
}

async fn send(ctx: &ProbeContext<'_>, prompt: &Prompt) -> probe_llm::Result<ChatCompletion> {
    let client = ctx.client;
    let req = prompt.request(client.model());
    ctx.reporter
        .debug(&format!("Request URL: {}", client.endpoint().chat_url()));
    if let Ok(body) = client.request_body(&prompt.messages, &req) {
        ctx.reporter.debug(&format!("Request data: {}", pretty(&body)));
    }
    let result = client.complete(&prompt.messages, &req).await;
    if let Ok(completion) = &result {
        ctx.reporter
            .debug(&format!("Response status: {}", completion.status));
        ctx.reporter
            .debug(&format!("Response content: {}", completion.raw));
        if let Some(usage) = &completion.usage {
            ctx.reporter.debug(&format!(
                "Token usage: {} prompt + {} completion = {}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total()
            ));
        }
    }
    result
}

/// Report a failed call and return a one-line diagnostic for the summary.
pub fn report_failure(r: &dyn Reporter, what: &str, err: &LlmError) -> String {
    match err {
        LlmError::Status { status: 401, body } => {
            r.error(&format!(
                "{what} failed: authentication failed, invalid API key (HTTP 401)"
            ));
            r.error(&format!("Response body: {}", api_error_message(body)));
            format!("HTTP 401: {}", api_error_message(body))
        }
        LlmError::Status { status: 429, body } => {
            r.warning(&format!(
                "{what} failed: rate limit exceeded, too many requests (HTTP 429)"
            ));
            r.warning(&format!("Response body: {}", api_error_message(body)));
            format!("HTTP 429: {}", api_error_message(body))
        }
        LlmError::Status { status, body } => {
            r.error(&format!(
                "{what} failed: API request failed with status code {status}"
            ));
            if !body.trim().is_empty() {
                r.error(&format!("Error details: {}", api_error_message(body)));
            }
            format!("HTTP {status}: {}", api_error_message(body))
        }
        LlmError::ResponseFormat(msg) => {
            r.error(&format!("{what} failed: could not parse API response: {msg}"));
            format!("bad response: {msg}")
        }
        other => {
            r.error(&format!("{what} failed: {other}"));
            other.to_string()
        }
    }
}

/// Expected terms found in `text`, compared case-insensitively, in `terms` order.
pub fn matched_terms<'t>(text: &str, terms: &[&'t str]) -> Vec<&'t str> {
    let haystack = text.to_lowercase();
    terms
        .iter()
        .copied()
        .filter(|t| haystack.contains(&t.to_lowercase()))
        .collect()
}

pub fn success_rate(successful: u32, attempts: u32) -> f64 {
    if attempts == 0 {
        return 0.0;
    }
    f64::from(successful) * 100.0 / f64::from(attempts)
}

/// 100% passes, at least 50% is partial, anything lower fails.
pub fn classify_success_rate(successful: u32, attempts: u32) -> ProbeOutcome {
    if attempts == 0 {
        return ProbeOutcome::Failed;
    }
    if successful >= attempts {
        ProbeOutcome::Passed
    } else if successful * 2 >= attempts {
        ProbeOutcome::Partial
    } else {
        ProbeOutcome::Failed
    }
}

fn log_sample(r: &dyn Reporter, content: &str) {
    let rule = "-".repeat(40);
    r.info("Sample response:");
    r.info(&rule);
    r.info(&truncate_sample(content, SAMPLE_CHARS));
    r.info(&rule);
}

fn pretty(v: &serde_json::Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}
