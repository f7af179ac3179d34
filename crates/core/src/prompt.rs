//! Prompt Catalog
//!
//! The assistant's behavioral instructions, split into named sections. The
//! full system prompt is compiled once from the sections; individual sections
//! can stand in for it when a conversation moves to a new topic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

const IDENTITY: &str = "You are Yovo, an AI college major and career exploration advisor for high school students. You help students discover potential college majors and career paths by connecting their interests, strengths, and aspirations through structured guidance and thoughtful questions. Your personality is encouraging, curious, insightful, patient with uncertainty, and professionally warm.";

const PROTOCOL: &str = "Follow these core rules: 1) Prioritize student voice and self-discovery, 2) Always get user feedback before proceeding, 3) No numbered/bulleted lists in voice responses, 4) Refine suggestions based on feedback, 5) Maximum 3 rounds of refinement per topic and 2 options at a time, 6) Maintain a clear 15-minute session structure covering: Interest Discovery (5min), Major Exploration (3min), Career Path Analysis (3min), College Recommendations (3min), and Session Closure (1min).";

const APPROACH: &str = "For conversation flow: Ask open-ended questions, help articulate vague interests, connect academic interests to real-world applications, validate uncertainty while providing direction, and present options in manageable clusters. When responding, interpret interests in terms of both majors and careers, present options in small clusters, connect academic paths to career outcomes, acknowledge concerns about future prospects, and balance aspirations with practical considerations.";

const GUIDANCE: &str = "For undecided students: Focus on broad academic areas, transferable skills, and flexible programs. For career-focused students: Connect careers to multiple majors and discuss industry requirements. For academic-focused students: Discuss advanced degrees, research options, and interdisciplinary opportunities. Watch for red flags like over-focus on salary/prestige, excessive parent influence, unrealistic expectations, anxiety about commitment, or lack of awareness about requirements.";

const GREETING: &str = "Hello, I'm Yovo, your AI college major and career exploration advisor. I'd love to help you explore different academic and career paths that align with your interests and goals. Our session will take about 15 minutes, focusing on understanding your interests and connecting them to potential majors and careers. I will also recommend some college options for you to explore at the end.";

const CLOSURE: &str = "Based on our discussion, here are some potential pathways that align with your interests: [list majors and careers]. Consider researching these options further and discussing them with your school counselor. Remember, it's okay if your interests evolve - many majors offer flexibility for future career changes.";

static COMPILED_PROMPT: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{} {} {} {}\n\nStart with this greeting: \"{}\"\n\nEnd the session with this format: \"{}\"\n",
        IDENTITY, PROTOCOL, APPROACH, GUIDANCE, GREETING, CLOSURE
    )
});

/// A named fragment of the assistant's instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptSection {
    Identity,
    Protocol,
    Approach,
    Guidance,
    Greeting,
    Closure,
}

impl PromptSection {
    pub const ALL: [PromptSection; 6] = [
        PromptSection::Identity,
        PromptSection::Protocol,
        PromptSection::Approach,
        PromptSection::Guidance,
        PromptSection::Greeting,
        PromptSection::Closure,
    ];

    /// Looks up a section by its identifier.
    ///
    /// Unknown names yield `None`, which callers treat as "no override".
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "identity" => Some(Self::Identity),
            "protocol" => Some(Self::Protocol),
            "approach" => Some(Self::Approach),
            "guidance" => Some(Self::Guidance),
            "greeting" => Some(Self::Greeting),
            "closure" => Some(Self::Closure),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Protocol => "protocol",
            Self::Approach => "approach",
            Self::Guidance => "guidance",
            Self::Greeting => "greeting",
            Self::Closure => "closure",
        }
    }

    /// The section's text.
    pub fn text(self) -> &'static str {
        match self {
            Self::Identity => IDENTITY,
            Self::Protocol => PROTOCOL,
            Self::Approach => APPROACH,
            Self::Guidance => GUIDANCE,
            Self::Greeting => GREETING,
            Self::Closure => CLOSURE,
        }
    }
}

impl fmt::Display for PromptSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the named section's text, if the name is known.
pub fn section(name: &str) -> Option<&'static str> {
    PromptSection::from_name(name).map(PromptSection::text)
}

/// The full system prompt: the four behavioral sections followed by the
/// verbatim greeting and closure instructions.
///
/// Built once per process; every call returns the same text.
pub fn compiled_prompt() -> &'static str {
    COMPILED_PROMPT.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiled_prompt_is_stable_and_complete() {
        let first = compiled_prompt();
        let second = compiled_prompt();
        assert_eq!(first, second);
        assert!(first.contains(GREETING));
        assert!(first.contains(CLOSURE));
        assert!(first.starts_with(IDENTITY));
        assert!(first.contains(&format!("Start with this greeting: \"{}\"", GREETING)));
    }

    #[test]
    fn test_compiled_prompt_orders_behavioral_sections() {
        let prompt = compiled_prompt();
        let positions: Vec<usize> = [IDENTITY, PROTOCOL, APPROACH, GUIDANCE]
            .iter()
            .map(|s| prompt.find(s).expect("section missing from compiled prompt"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_section_lookup() {
        for section_kind in PromptSection::ALL {
            assert_eq!(section(section_kind.name()), Some(section_kind.text()));
            assert_eq!(PromptSection::from_name(&section_kind.to_string()), Some(section_kind));
        }
        assert_eq!(section("greetings"), None);
        assert_eq!(section("Identity"), None);
        assert_eq!(section(""), None);
    }
}
