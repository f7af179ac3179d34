use crate::prompt::PromptSection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Phrases that signal the user wants to leave the current topic.
pub const MOVE_ON_KEYWORDS: [&str; 4] = ["next topic", "move on", "continue", "next section"];

/// One stage of the fixed session curriculum, in conversation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    InterestDiscovery,
    MajorExploration,
    CareerPath,
    CollegeRecommendations,
    SessionClosure,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown topic: '{0}'")]
pub struct UnknownTopic(pub String);

impl Topic {
    pub const SEQUENCE: [Topic; 5] = [
        Topic::InterestDiscovery,
        Topic::MajorExploration,
        Topic::CareerPath,
        Topic::CollegeRecommendations,
        Topic::SessionClosure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::InterestDiscovery => "interest-discovery",
            Topic::MajorExploration => "major-exploration",
            Topic::CareerPath => "career-path",
            Topic::CollegeRecommendations => "college-recommendations",
            Topic::SessionClosure => "session-closure",
        }
    }

    /// Number of rounds after which the conversation moves past this topic.
    pub fn max_rounds(self) -> u32 {
        match self {
            Topic::InterestDiscovery => 5,
            Topic::MajorExploration => 3,
            Topic::CareerPath => 3,
            Topic::CollegeRecommendations => 3,
            Topic::SessionClosure => 1,
        }
    }

    /// The prompt section that replaces the full prompt right after a jump to
    /// this topic.
    pub fn prompt_section(self) -> PromptSection {
        match self {
            Topic::InterestDiscovery | Topic::MajorExploration => PromptSection::Approach,
            Topic::CareerPath | Topic::CollegeRecommendations => PromptSection::Guidance,
            Topic::SessionClosure => PromptSection::Closure,
        }
    }

    /// The following topic, or `None` at the end of the session.
    pub fn next(self) -> Option<Topic> {
        match self {
            Topic::InterestDiscovery => Some(Topic::MajorExploration),
            Topic::MajorExploration => Some(Topic::CareerPath),
            Topic::CareerPath => Some(Topic::CollegeRecommendations),
            Topic::CollegeRecommendations => Some(Topic::SessionClosure),
            Topic::SessionClosure => None,
        }
    }
}

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::SEQUENCE
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spoken form of a topic identifier, e.g. `career path`.
pub fn humanize(topic: &str) -> String {
    topic.replace('-', " ")
}

/// Prompt override for a raw topic string; unknown topics get none.
pub fn section_for(topic: &str) -> Option<PromptSection> {
    topic.parse::<Topic>().ok().map(Topic::prompt_section)
}

/// Where a session stands in the curriculum.
#[derive(Debug, Clone)]
pub struct TopicProgress {
    current_topic: Topic,
    rounds_in_topic: u32,
    started_at: Instant,
    duration_secs: u64,
}

impl TopicProgress {
    /// A fresh session at the first topic.
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// A fresh session whose clock started at `started_at`.
    pub fn started_at(started_at: Instant) -> Self {
        Self {
            current_topic: Topic::InterestDiscovery,
            rounds_in_topic: 0,
            started_at,
            duration_secs: 0,
        }
    }

    pub fn current_topic(&self) -> Topic {
        self.current_topic
    }

    pub fn rounds_in_topic(&self) -> u32 {
        self.rounds_in_topic
    }

    /// Elapsed seconds as of the last round or refresh.
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Counts one completed question/answer round.
    pub fn record_round(&mut self) {
        self.rounds_in_topic += 1;
        self.refresh_duration();
    }

    pub fn refresh_duration(&mut self) {
        self.duration_secs = self.elapsed().as_secs();
    }

    fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started_at)
    }

    /// Whether the round budget is spent or the user asked to move on.
    pub fn should_advance(&self, user_message: &str) -> bool {
        let lowered = user_message.to_lowercase();
        let wants_to_move_on = MOVE_ON_KEYWORDS.iter().any(|k| lowered.contains(k));
        self.rounds_in_topic >= self.current_topic.max_rounds() || wants_to_move_on
    }

    /// Steps to the next topic. Returns `false` at the final topic, where
    /// nothing changes.
    pub fn advance(&mut self) -> bool {
        match self.current_topic.next() {
            Some(next) => {
                self.current_topic = next;
                self.rounds_in_topic = 0;
                true
            }
            None => false,
        }
    }

    /// Explicit override to any topic, including earlier ones.
    pub fn jump_to(&mut self, topic: Topic) {
        self.current_topic = topic;
        self.reset_rounds();
    }

    /// Starts the round budget of the current topic over.
    pub fn reset_rounds(&mut self) {
        self.rounds_in_topic = 0;
    }
}

impl Default for TopicProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_at(topic: Topic, rounds: u32) -> TopicProgress {
        let mut progress = TopicProgress::new();
        progress.jump_to(topic);
        for _ in 0..rounds {
            progress.record_round();
        }
        progress
    }

    #[test]
    fn test_initial_state() {
        let progress = TopicProgress::new();
        assert_eq!(progress.current_topic(), Topic::InterestDiscovery);
        assert_eq!(progress.rounds_in_topic(), 0);
        assert_eq!(progress.duration_secs(), 0);
    }

    #[test]
    fn test_should_advance_when_round_budget_is_spent() {
        for topic in Topic::SEQUENCE {
            let progress = progress_at(topic, topic.max_rounds());
            assert!(progress.should_advance("tell me more"), "{topic}");
            assert!(progress.should_advance(""), "{topic}");

            let progress = progress_at(topic, topic.max_rounds() - 1);
            assert!(!progress.should_advance("tell me more"), "{topic}");
        }
    }

    #[test]
    fn test_should_advance_on_keywords_in_any_case() {
        let progress = TopicProgress::new();
        assert!(progress.should_advance("MOVE ON please"));
        assert!(progress.should_advance("Can we go to the Next Topic?"));
        assert!(progress.should_advance("let's continue"));
        assert!(progress.should_advance("NEXT SECTION"));
        assert!(!progress.should_advance("I like biology and chemistry"));
    }

    #[test]
    fn test_advance_walks_the_sequence() {
        let mut progress = TopicProgress::new();
        for expected in &Topic::SEQUENCE[1..] {
            progress.record_round();
            assert!(progress.advance());
            assert_eq!(progress.current_topic(), *expected);
            assert_eq!(progress.rounds_in_topic(), 0);
        }
    }

    #[test]
    fn test_advance_at_session_closure_is_noop() {
        let mut progress = progress_at(Topic::SessionClosure, 2);
        assert!(!progress.advance());
        assert_eq!(progress.current_topic(), Topic::SessionClosure);
        assert_eq!(progress.rounds_in_topic(), 2);
    }

    #[test]
    fn test_jump_to_resets_rounds_even_backward() {
        let mut progress = progress_at(Topic::CareerPath, 2);
        progress.jump_to(Topic::InterestDiscovery);
        assert_eq!(progress.current_topic(), Topic::InterestDiscovery);
        assert_eq!(progress.rounds_in_topic(), 0);
    }

    #[test]
    fn test_reset_rounds_keeps_topic() {
        let mut progress = progress_at(Topic::MajorExploration, 2);
        progress.reset_rounds();
        assert_eq!(progress.current_topic(), Topic::MajorExploration);
        assert_eq!(progress.rounds_in_topic(), 0);
        assert!(!progress.should_advance("tell me about biology"));
    }

    #[test]
    fn test_jump_then_round_keeps_topic() {
        let mut progress = TopicProgress::new();
        progress.jump_to("college-recommendations".parse().unwrap());
        progress.record_round();
        assert_eq!(progress.current_topic(), Topic::CollegeRecommendations);
        assert_eq!(progress.rounds_in_topic(), 1);
        assert!(!progress.should_advance("what about state schools?"));
    }

    #[test]
    fn test_record_round_measures_elapsed_time() {
        let mut progress = TopicProgress::started_at(Instant::now() - Duration::from_secs(5));
        progress.record_round();
        assert!(progress.duration_secs() >= 5);
    }

    #[test]
    fn test_topic_parsing_and_mapping() {
        for topic in Topic::SEQUENCE {
            assert_eq!(topic.as_str().parse::<Topic>(), Ok(topic));
        }
        assert_eq!(
            "astronomy".parse::<Topic>(),
            Err(UnknownTopic("astronomy".to_string()))
        );
        assert_eq!(section_for("interest-discovery"), Some(PromptSection::Approach));
        assert_eq!(section_for("major-exploration"), Some(PromptSection::Approach));
        assert_eq!(section_for("career-path"), Some(PromptSection::Guidance));
        assert_eq!(section_for("college-recommendations"), Some(PromptSection::Guidance));
        assert_eq!(section_for("session-closure"), Some(PromptSection::Closure));
        assert_eq!(section_for("astronomy"), None);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("college-recommendations"), "college recommendations");
        assert_eq!(humanize("plain"), "plain");
    }

    #[test]
    fn test_topic_serializes_as_wire_name() {
        assert_eq!(
            serde_json::to_string(&Topic::CareerPath).unwrap(),
            "\"career-path\""
        );
    }
}
