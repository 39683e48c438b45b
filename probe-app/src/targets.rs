//! The three probed endpoints and their fixed prompts.

use crate::probes::{Probe, Prompt};
use crate::suite::ExitPolicy;
use probe_llm::{ChatMessage, EndpointConfig};

pub const DOMAIN_TERMS: &[&str] = &[
    "risk-adjusted",
    "return",
    "volatility",
    "standard deviation",
    "excess return",
];

const REPEATED_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    DeepSeek,
    Qwen,
    QwenNative,
}

impl Target {
    pub fn display_name(self) -> &'static str {
        match self {
            Target::DeepSeek => "DeepSeek",
            Target::Qwen => "DashScope (Qwen3)",
            Target::QwenNative => "DashScope (Qwen3-235B-A22B)",
        }
    }

    /// Key of this target's `[targets.*]` table in the config file.
    pub fn config_key(self) -> &'static str {
        match self {
            Target::DeepSeek => "deepseek",
            Target::Qwen => "qwen",
            Target::QwenNative => "qwen_native",
        }
    }

    pub fn endpoint(self) -> EndpointConfig {
        match self {
            Target::DeepSeek => EndpointConfig::deepseek(),
            Target::Qwen => EndpointConfig::dashscope_chat(),
            Target::QwenNative => EndpointConfig::dashscope_generation(),
        }
    }

    pub fn exit_policy(self) -> ExitPolicy {
        match self {
            Target::DeepSeek => ExitPolicy::Graded,
            Target::Qwen | Target::QwenNative => ExitPolicy::Binary,
        }
    }

    pub fn probes(self, skip_rate_limits: bool) -> Vec<Probe> {
        match self {
            Target::DeepSeek => {
                let mut probes = vec![
                    Probe::Connectivity,
                    Probe::Completion {
                        prompt: Prompt::new(
                            vec![
                                ChatMessage::system("You are DeepSeek, a helpful AI assistant."),
                                ChatMessage::user(
                                    "What are the applications of quantitative investment in cryptocurrency markets?",
                                ),
                            ],
                            200,
                        ),
                        show_raw: false,
                    },
                    Probe::DomainKnowledge {
                        prompt: Prompt::new(
                            vec![
                                ChatMessage::system(
                                    "You are DeepSeek, a helpful AI assistant specializing in quantitative investment.",
                                ),
                                ChatMessage::user(
                                    "Explain how to calculate the Sharpe ratio for a cryptocurrency portfolio and why it's important.",
                                ),
                            ],
                            300,
                        ),
                        terms: DOMAIN_TERMS,
                    },
                ];
                if !skip_rate_limits {
                    probes.push(Probe::RepeatedRequests {
                        prompt: Prompt::new(
                            vec![
                                ChatMessage::system("You are DeepSeek, a helpful AI assistant."),
                                ChatMessage::user("Hello, how are you today?"),
                            ],
                            50,
                        ),
                        attempts: REPEATED_ATTEMPTS,
                    });
                }
                probes
            }
            Target::Qwen => vec![Probe::Completion {
                prompt: Prompt::new(vec![ChatMessage::user("Say hello in 5 words or less.")], 50),
                show_raw: false,
            }],
            Target::QwenNative => vec![Probe::Completion {
                prompt: Prompt::new(
                    vec![ChatMessage::user("Explain quantum computing in 50 words")],
                    500,
                )
                .with_top_p(0.9),
                show_raw: true,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Target;
    use crate::probes::Probe;
    use crate::suite::ExitPolicy;

    #[test]
    fn deepseek_runs_four_probes_unless_rate_limits_skipped() {
        let names: Vec<_> = Target::DeepSeek.probes(false).iter().map(Probe::name).collect();
        assert_eq!(
            names,
            vec!["API Connectivity", "Completion", "Domain Knowledge", "Rate Limits"]
        );
        assert_eq!(Target::DeepSeek.probes(true).len(), 3);
    }

    #[test]
    fn dashscope_targets_run_a_single_completion() {
        for target in [Target::Qwen, Target::QwenNative] {
            let probes = target.probes(false);
            assert_eq!(probes.len(), 1);
            assert!(matches!(probes[0], Probe::Completion { .. }));
            assert_eq!(target.exit_policy(), ExitPolicy::Binary);
        }
    }

    #[test]
    fn native_target_prints_raw_response_with_top_p() {
        let probes = Target::QwenNative.probes(false);
        let Probe::Completion { prompt, show_raw } = &probes[0] else {
            panic!("expected completion probe");
        };
        assert!(*show_raw);
        assert_eq!(prompt.top_p, Some(0.9));
        assert_eq!(prompt.max_tokens, 500);
    }
}
